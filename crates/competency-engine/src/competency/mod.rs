//! Competency item templates and the engine that scores submissions against them.
//!
//! A template bundles a field schema (what to collect) with an optional scoring
//! configuration (how to grade it). Saving goes through [`TemplateDraft::commit`], which runs
//! the [`TemplateValidator`]; scoring goes through [`EvaluationEngine`], which extracts a raw
//! value per entry, matches it against the grade table, and aggregates repeatable entries.

pub mod evaluation;
pub mod grades;
pub mod schema;
pub mod storage;
pub mod template;
pub mod validator;

#[cfg(test)]
mod tests;

pub use evaluation::{
    AggregationEngine, EntryEvaluation, EntryMiss, EvaluationEngine, EvaluationError,
    ExternalLookups, GradeMatcher, ItemEvaluation, MatchError, NoLookups, RawValue,
    ValueExtractor,
};
pub use grades::{
    GradeEdit, GradeEditError, GradeEditMode, GradeImportError, GradeMapping, GradeTable,
    GradeTableImporter, MappingValue,
};
pub use schema::{
    DataSource, EntryIssue, FieldDefinition, FieldKind, FieldSchema, FieldValue, FileReference,
    SubmissionEntry,
};
pub use storage::{StorageError, StoredTemplate};
pub use template::{
    Aggregation, GradeKind, MatchKind, ProofRequirement, ScoringConfig, Template, TemplateDraft,
    TemplateId, TemplateRejected, ValueSource,
};
pub use validator::{TemplateIssue, TemplateValidator, ValidationReport};
