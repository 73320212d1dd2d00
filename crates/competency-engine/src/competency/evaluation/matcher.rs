use super::extractor::RawValue;
use crate::competency::grades::{GradeMapping, GradeTable, MappingValue};
use crate::competency::template::{GradeKind, MatchKind, ScoringConfig};

/// Raw value of the wrong shape for the configured strategy. Fatal for one entry only.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MatchError {
    #[error("{strategy} matching needs a {expected} value, got `{found}`")]
    TypeMismatch {
        strategy: MatchKind,
        expected: &'static str,
        found: String,
    },
}

/// Selects the grade mapping a raw value earns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradeMatcher {
    match_kind: MatchKind,
    grade_kind: GradeKind,
}

impl GradeMatcher {
    pub fn new(match_kind: MatchKind, grade_kind: GradeKind) -> Self {
        Self {
            match_kind,
            grade_kind,
        }
    }

    pub fn for_config(config: &ScoringConfig) -> Self {
        Self::new(config.effective_match_kind(), config.grade_kind)
    }

    pub fn match_kind(&self) -> MatchKind {
        self.match_kind
    }

    pub fn select<'t>(
        &self,
        raw: &RawValue,
        table: &'t GradeTable,
    ) -> Result<Option<&'t GradeMapping>, MatchError> {
        match self.match_kind {
            MatchKind::Exact => Ok(exact(raw, table)),
            MatchKind::Contains => contains(raw, table),
            MatchKind::Range => {
                let value = raw
                    .as_number()
                    .ok_or_else(|| mismatch(MatchKind::Range, "numeric", raw))?;
                Ok(range_match(value, table))
            }
            MatchKind::Grade if self.grade_kind == GradeKind::FileExists => {
                Ok(presence(raw, table))
            }
            MatchKind::Grade => Ok(exact(raw, table)),
        }
    }
}

/// Mapping with the greatest numeric threshold not above `value`; first in table order on ties.
pub fn range_match(value: f64, table: &GradeTable) -> Option<&GradeMapping> {
    let mut best: Option<(f64, &GradeMapping)> = None;

    for mapping in table.iter() {
        let Some(threshold) = mapping.raw_value.as_number() else {
            continue;
        };
        if threshold > value {
            continue;
        }
        if best.map_or(true, |(current, _)| threshold > current) {
            best = Some((threshold, mapping));
        }
    }

    best.map(|(_, mapping)| mapping)
}

fn exact<'t>(raw: &RawValue, table: &'t GradeTable) -> Option<&'t GradeMapping> {
    match raw {
        RawValue::List(items) => table.iter().find(|mapping| {
            items
                .iter()
                .any(|item| equals_text(&mapping.raw_value, item))
        }),
        _ => table
            .iter()
            .find(|mapping| equals_raw(&mapping.raw_value, raw)),
    }
}

fn equals_raw(expected: &MappingValue, raw: &RawValue) -> bool {
    match expected {
        MappingValue::Number(number) => raw.as_number() == Some(*number),
        MappingValue::Text(text) => raw.to_text() == *text,
        MappingValue::Flag(flag) => match raw {
            RawValue::Flag(value) => value == flag,
            RawValue::Text(text) => crate::competency::grades::parse_flag(text) == Some(*flag),
            RawValue::Number(_) | RawValue::List(_) => false,
        },
    }
}

fn equals_text(expected: &MappingValue, item: &str) -> bool {
    equals_raw(expected, &RawValue::Text(item.to_string()))
}

fn contains<'t>(
    raw: &RawValue,
    table: &'t GradeTable,
) -> Result<Option<&'t GradeMapping>, MatchError> {
    let haystacks: Vec<String> = match raw {
        RawValue::Text(text) => vec![text.to_lowercase()],
        RawValue::List(items) => items.iter().map(|item| item.to_lowercase()).collect(),
        RawValue::Number(_) | RawValue::Flag(_) => {
            return Err(mismatch(MatchKind::Contains, "string", raw))
        }
    };

    Ok(table.iter().find(|mapping| {
        let needle = mapping.raw_value.to_string().to_lowercase();
        // an empty needle would match every value
        !needle.is_empty() && haystacks.iter().any(|haystack| haystack.contains(&needle))
    }))
}

fn presence<'t>(raw: &RawValue, table: &'t GradeTable) -> Option<&'t GradeMapping> {
    let present = raw.is_present();
    table
        .iter()
        .find(|mapping| mapping.raw_value.as_flag() == Some(present))
}

fn mismatch(strategy: MatchKind, expected: &'static str, raw: &RawValue) -> MatchError {
    MatchError::TypeMismatch {
        strategy,
        expected,
        found: raw.to_text(),
    }
}
