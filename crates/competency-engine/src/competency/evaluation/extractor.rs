use std::collections::{BTreeMap, HashMap};

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::EvaluationError;
use crate::competency::grades::{format_number, parse_flag, parse_number};
use crate::competency::schema::{FieldValue, SubmissionEntry};
use crate::competency::template::{GradeKind, ScoringConfig, ValueSource};

/// Profile accessor supplied by the host for `user_field` sources.
///
/// Implementations may be slow; the engine calls them once per entry and applies no timeout or
/// caching of its own.
pub trait ExternalLookups {
    fn user_field(&self, name: &str) -> Option<Value>;
}

/// Accessor for callers without a profile store.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLookups;

impl ExternalLookups for NoLookups {
    fn user_field(&self, _name: &str) -> Option<Value> {
        None
    }
}

impl ExternalLookups for BTreeMap<String, Value> {
    fn user_field(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl ExternalLookups for HashMap<String, Value> {
    fn user_field(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

/// Comparison value produced by extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Flag(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl RawValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            RawValue::Number(value) => Some(*value).filter(|value| value.is_finite()),
            RawValue::Text(text) => parse_number(text),
            RawValue::Flag(_) | RawValue::List(_) => None,
        }
    }

    /// Presence reading used by file-existence grading.
    pub fn is_present(&self) -> bool {
        match self {
            RawValue::Flag(flag) => *flag,
            RawValue::Number(value) => *value != 0.0,
            RawValue::Text(text) => !text.trim().is_empty() && parse_flag(text) != Some(false),
            RawValue::List(items) => !items.is_empty(),
        }
    }

    pub fn to_text(&self) -> String {
        match self {
            RawValue::Flag(flag) => flag.to_string(),
            RawValue::Number(value) => format_number(*value),
            RawValue::Text(text) => text.clone(),
            RawValue::List(items) => items.join(", "),
        }
    }

    pub(crate) fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(flag) => Some(RawValue::Flag(*flag)),
            Value::Number(number) => number.as_f64().map(RawValue::Number),
            Value::String(text) => Some(RawValue::Text(text.clone())),
            Value::Array(items) => Some(RawValue::List(
                items
                    .iter()
                    .filter(|item| !item.is_null())
                    .map(|item| match item {
                        Value::String(text) => text.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            )),
            Value::Object(_) => Some(RawValue::Text(value.to_string())),
        }
    }

    pub(crate) fn from_field(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Flag(flag) => Some(RawValue::Flag(*flag)),
            FieldValue::Number(number) => Some(RawValue::Number(*number)),
            FieldValue::Text(text) => Some(RawValue::Text(text.clone())),
            FieldValue::List(items) => Some(RawValue::List(items.clone())),
            FieldValue::Document(document) => Self::from_json(document),
        }
    }
}

/// Resolves the raw comparison value of an entry according to the value-source policy.
#[derive(Debug, Clone)]
pub struct ValueExtractor {
    value_source: ValueSource,
    source_field: Option<String>,
    grade_kind: GradeKind,
    pattern: Option<Regex>,
}

impl ValueExtractor {
    pub fn from_config(config: &ScoringConfig) -> Result<Self, EvaluationError> {
        let pattern = match (&config.extract_pattern, config.value_source) {
            (Some(pattern), ValueSource::JsonField) if config.grade_kind != GradeKind::Numeric => {
                let compiled = Regex::new(pattern).map_err(|source| {
                    warn!(%pattern, error = %source, "extract pattern does not compile");
                    EvaluationError::InvalidPattern {
                        pattern: pattern.clone(),
                        source,
                    }
                })?;
                Some(compiled)
            }
            _ => None,
        };

        Ok(Self {
            value_source: config.value_source,
            source_field: config.source_field.clone(),
            grade_kind: config.grade_kind,
            pattern,
        })
    }

    /// `None` means the entry contributes nothing. File-existence grading always yields a flag.
    pub fn extract(
        &self,
        entry: &SubmissionEntry,
        lookups: &dyn ExternalLookups,
    ) -> Option<RawValue> {
        let value = match self.value_source {
            ValueSource::Submitted => self.submitted(entry),
            ValueSource::UserField => self.user_field(lookups),
            ValueSource::JsonField => self.json_field(entry),
        };

        if self.grade_kind != GradeKind::FileExists {
            return value;
        }

        let attached = self.value_source == ValueSource::Submitted && entry.attachment.is_some();
        let present = value.map(|raw| raw.is_present()).unwrap_or(false);
        Some(RawValue::Flag(present || attached))
    }

    fn submitted(&self, entry: &SubmissionEntry) -> Option<RawValue> {
        let value = match self.source_field.as_deref() {
            Some(name) => entry.value(name)?,
            None => entry.sole_value()?,
        };
        RawValue::from_field(value)
    }

    fn user_field(&self, lookups: &dyn ExternalLookups) -> Option<RawValue> {
        let name = self.source_field.as_deref()?;
        let value = lookups.user_field(name)?;
        RawValue::from_json(&value)
    }

    fn json_field(&self, entry: &SubmissionEntry) -> Option<RawValue> {
        let path = self.source_field.as_deref()?;
        let mut segments = path.split('.');
        let root = segments.next()?;

        let raw = match entry.value(root)? {
            FieldValue::Document(document) => {
                let mut current = document;
                for segment in segments {
                    current = descend(current, segment)?;
                }
                RawValue::from_json(current)?
            }
            other => {
                if segments.next().is_some() {
                    return None;
                }
                RawValue::from_field(other)?
            }
        };

        match &self.pattern {
            Some(pattern) => {
                let text = raw.to_text();
                let captures = pattern.captures(&text)?;
                // patterns without groups use the whole match
                let group = usize::from(pattern.captures_len() > 1);
                let matched = captures.get(group)?;
                Some(RawValue::Text(matched.as_str().to_string()))
            }
            None => Some(raw),
        }
    }
}

fn descend<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => items.get(segment.parse::<usize>().ok()?),
        _ => None,
    }
}
