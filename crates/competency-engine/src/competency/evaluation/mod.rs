mod aggregation;
mod extractor;
mod matcher;

pub use aggregation::{AggregationEngine, EntryEvaluation, EntryMiss, ItemEvaluation};
pub use extractor::{ExternalLookups, NoLookups, RawValue, ValueExtractor};
pub use matcher::{range_match, GradeMatcher, MatchError};

use super::schema::SubmissionEntry;
use super::template::{Template, TemplateId};

/// Malformed configuration discovered while preparing or running an evaluation.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("template `{template}` is input only and cannot be scored")]
    NoScoring { template: TemplateId },
    #[error("extract pattern `{pattern}` does not compile")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("template `{template}` is not repeatable but received {found} entries")]
    TooManyEntries { template: TemplateId, found: usize },
}

/// Stateless evaluator bound to one saved template.
#[derive(Debug, Clone)]
pub struct EvaluationEngine {
    template_id: TemplateId,
    repeatable: bool,
    aggregator: AggregationEngine,
}

impl EvaluationEngine {
    pub fn new(template: &Template) -> Result<Self, EvaluationError> {
        let config = template
            .scoring()
            .ok_or_else(|| EvaluationError::NoScoring {
                template: template.id().clone(),
            })?;

        Ok(Self {
            template_id: template.id().clone(),
            repeatable: template.repeatable(),
            aggregator: AggregationEngine::new(config)?,
        })
    }

    pub fn template_id(&self) -> &TemplateId {
        &self.template_id
    }

    pub fn evaluate_entry(
        &self,
        entry: &SubmissionEntry,
        lookups: &dyn ExternalLookups,
    ) -> EntryEvaluation {
        self.aggregator.evaluate_entry(0, entry, lookups)
    }

    /// Score all entries of an item. Non-repeatable items accept at most one entry.
    pub fn evaluate(
        &self,
        entries: &[SubmissionEntry],
        lookups: &dyn ExternalLookups,
    ) -> Result<ItemEvaluation, EvaluationError> {
        if !self.repeatable && entries.len() > 1 {
            return Err(EvaluationError::TooManyEntries {
                template: self.template_id.clone(),
                found: entries.len(),
            });
        }

        Ok(self.aggregator.aggregate(entries, lookups))
    }
}
