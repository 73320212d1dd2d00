use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::extractor::{ExternalLookups, RawValue, ValueExtractor};
use super::matcher::{range_match, GradeMatcher};
use super::EvaluationError;
use crate::competency::grades::{GradeMapping, GradeTable};
use crate::competency::schema::SubmissionEntry;
use crate::competency::template::{Aggregation, ScoringConfig};

/// Why an entry earned nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum EntryMiss {
    NoValue,
    NoMatchingGrade,
    TypeMismatch { detail: String },
}

/// Result of scoring one submission entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryEvaluation {
    pub index: usize,
    pub raw_value: Option<RawValue>,
    pub matched_mapping: Option<GradeMapping>,
    pub score: i32,
    /// Whether the entry matched a grade; only matched entries count towards `count`.
    pub qualifies: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub miss: Option<EntryMiss>,
}

/// Result of scoring every entry of an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemEvaluation {
    pub aggregation: Aggregation,
    pub score: i32,
    /// Mapping that decided the score; `None` for sums and for misses.
    pub matched_mapping: Option<GradeMapping>,
    pub qualifying_entries: usize,
    pub entries: Vec<EntryEvaluation>,
}

/// Extraction, matching, and aggregation for one scoring configuration.
#[derive(Debug, Clone)]
pub struct AggregationEngine {
    extractor: ValueExtractor,
    matcher: GradeMatcher,
    aggregation: Aggregation,
    grade_table: GradeTable,
}

impl AggregationEngine {
    pub fn new(config: &ScoringConfig) -> Result<Self, EvaluationError> {
        Ok(Self {
            extractor: ValueExtractor::from_config(config)?,
            matcher: GradeMatcher::for_config(config),
            aggregation: config.aggregation,
            grade_table: config.grade_table.clone(),
        })
    }

    pub fn evaluate_entry(
        &self,
        index: usize,
        entry: &SubmissionEntry,
        lookups: &dyn ExternalLookups,
    ) -> EntryEvaluation {
        let raw_value = self.extractor.extract(entry, lookups);

        let Some(raw) = raw_value.as_ref() else {
            debug!(index, "entry has no value to score");
            return EntryEvaluation {
                index,
                raw_value,
                matched_mapping: None,
                score: 0,
                qualifies: false,
                miss: Some(EntryMiss::NoValue),
            };
        };

        match self.matcher.select(raw, &self.grade_table) {
            Ok(Some(mapping)) => {
                debug!(index, score = mapping.score, "entry matched grade");
                EntryEvaluation {
                    index,
                    score: mapping.score,
                    matched_mapping: Some(mapping.clone()),
                    raw_value,
                    qualifies: true,
                    miss: None,
                }
            }
            Ok(None) => {
                debug!(index, "entry matched no grade");
                EntryEvaluation {
                    index,
                    raw_value,
                    matched_mapping: None,
                    score: 0,
                    qualifies: false,
                    miss: Some(EntryMiss::NoMatchingGrade),
                }
            }
            Err(err) => {
                warn!(index, error = %err, "entry skipped after type mismatch");
                EntryEvaluation {
                    index,
                    raw_value,
                    matched_mapping: None,
                    score: 0,
                    qualifies: false,
                    miss: Some(EntryMiss::TypeMismatch {
                        detail: err.to_string(),
                    }),
                }
            }
        }
    }

    /// Score every entry and combine them. Never fails; misses score zero.
    pub fn aggregate(
        &self,
        entries: &[SubmissionEntry],
        lookups: &dyn ExternalLookups,
    ) -> ItemEvaluation {
        let evaluations: Vec<EntryEvaluation> = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| self.evaluate_entry(index, entry, lookups))
            .collect();

        let qualifying_entries = evaluations.iter().filter(|entry| entry.qualifies).count();

        let (score, matched_mapping) = match self.aggregation {
            Aggregation::First => evaluations
                .first()
                .map(|entry| (entry.score, entry.matched_mapping.clone()))
                .unwrap_or((0, None)),
            Aggregation::Sum => (
                evaluations
                    .iter()
                    .fold(0i32, |total, entry| total.saturating_add(entry.score)),
                None,
            ),
            Aggregation::Max | Aggregation::BestMatch => best_entry(&evaluations)
                .map(|entry| (entry.score, entry.matched_mapping.clone()))
                .unwrap_or((0, None)),
            Aggregation::Count => {
                match range_match(qualifying_entries as f64, &self.grade_table) {
                    Some(mapping) => (mapping.score, Some(mapping.clone())),
                    None => (0, None),
                }
            }
            Aggregation::AnyMatch => evaluations
                .iter()
                .find(|entry| entry.matched_mapping.is_some())
                .map(|entry| (entry.score, entry.matched_mapping.clone()))
                .unwrap_or((0, None)),
        };

        debug!(
            aggregation = %self.aggregation,
            match_kind = %self.matcher.match_kind(),
            entries = evaluations.len(),
            qualifying_entries,
            score,
            "item aggregated"
        );

        ItemEvaluation {
            aggregation: self.aggregation,
            score,
            matched_mapping,
            qualifying_entries,
            entries: evaluations,
        }
    }
}

/// Highest-scoring matched entry; the earliest wins ties.
fn best_entry(evaluations: &[EntryEvaluation]) -> Option<&EntryEvaluation> {
    evaluations
        .iter()
        .filter(|entry| entry.matched_mapping.is_some())
        .fold(None, |best: Option<&EntryEvaluation>, entry| match best {
            Some(current) if current.score >= entry.score => Some(current),
            _ => Some(entry),
        })
}
