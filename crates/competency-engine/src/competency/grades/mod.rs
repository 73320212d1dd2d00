//! Grade tables: ordered raw-value to score mappings plus their edit and import paths.

mod edit;
mod import;

pub use edit::{GradeEdit, GradeEditError, GradeEditMode};
pub use import::{GradeImportError, GradeTableImporter};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw value or threshold a grade mapping is keyed on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MappingValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl MappingValue {
    /// Numeric reading: numbers as-is, text when it parses as a finite number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            MappingValue::Number(value) => Some(*value).filter(|value| value.is_finite()),
            MappingValue::Text(text) => parse_number(text),
            MappingValue::Flag(_) => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            MappingValue::Flag(flag) => Some(*flag),
            MappingValue::Text(text) => parse_flag(text),
            MappingValue::Number(value) if *value == 1.0 => Some(true),
            MappingValue::Number(value) if *value == 0.0 => Some(false),
            MappingValue::Number(_) => None,
        }
    }

    /// Key used to detect duplicate mappings regardless of numeric formatting.
    pub(crate) fn identity(&self) -> String {
        match self {
            MappingValue::Flag(flag) => format!("flag:{flag}"),
            MappingValue::Number(value) => format!("number:{}", format_number(*value)),
            MappingValue::Text(text) => format!("text:{text}"),
        }
    }
}

impl fmt::Display for MappingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingValue::Flag(flag) => write!(f, "{flag}"),
            MappingValue::Number(value) => f.write_str(&format_number(*value)),
            MappingValue::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for MappingValue {
    fn from(value: &str) -> Self {
        MappingValue::Text(value.to_string())
    }
}

impl From<String> for MappingValue {
    fn from(value: String) -> Self {
        MappingValue::Text(value)
    }
}

impl From<f64> for MappingValue {
    fn from(value: f64) -> Self {
        MappingValue::Number(value)
    }
}

impl From<i64> for MappingValue {
    fn from(value: i64) -> Self {
        MappingValue::Number(value as f64)
    }
}

impl From<bool> for MappingValue {
    fn from(value: bool) -> Self {
        MappingValue::Flag(value)
    }
}

/// A single row of a grade table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeMapping {
    pub raw_value: MappingValue,
    pub score: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Pinned rows keep their raw value and cannot be removed.
    #[serde(default)]
    pub fixed: bool,
}

impl GradeMapping {
    pub fn new(raw_value: impl Into<MappingValue>, score: i32) -> Self {
        Self {
            raw_value: raw_value.into(),
            score,
            label: None,
            fixed: false,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn pinned(mut self) -> Self {
        self.fixed = true;
        self
    }
}

/// Ordered grade mappings. Table order is the tie-breaker for every matching strategy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GradeTable {
    mappings: Vec<GradeMapping>,
}

impl GradeTable {
    pub fn new(mappings: Vec<GradeMapping>) -> Self {
        Self { mappings }
    }

    pub fn mappings(&self) -> &[GradeMapping] {
        &self.mappings
    }

    pub fn iter(&self) -> impl Iterator<Item = &GradeMapping> {
        self.mappings.iter()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Raw values that occur more than once, reported once each in table order.
    pub fn duplicate_values(&self) -> Vec<&MappingValue> {
        let mut seen = Vec::new();
        let mut duplicates: Vec<&MappingValue> = Vec::new();
        for mapping in &self.mappings {
            let identity = mapping.raw_value.identity();
            if seen.contains(&identity) {
                if !duplicates
                    .iter()
                    .any(|known| known.identity() == identity)
                {
                    duplicates.push(&mapping.raw_value);
                }
            } else {
                seen.push(identity);
            }
        }
        duplicates
    }

    /// Raw values that cannot serve as range thresholds.
    pub fn non_numeric_values(&self) -> Vec<&MappingValue> {
        self.mappings
            .iter()
            .map(|mapping| &mapping.raw_value)
            .filter(|value| value.as_number().is_none())
            .collect()
    }

    pub(crate) fn mappings_mut(&mut self) -> &mut Vec<GradeMapping> {
        &mut self.mappings
    }
}

impl FromIterator<GradeMapping> for GradeTable {
    fn from_iter<T: IntoIterator<Item = GradeMapping>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

pub(crate) fn parse_number(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

pub(crate) fn parse_flag(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

/// Integral values print without a fractional part so `5.0` and `"5"` compare equal as text.
pub(crate) fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
