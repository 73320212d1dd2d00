//! Static consistency checks between a template's field schema and its scoring setup.
//!
//! Findings are returned as data so callers can show every problem at once. Errors block a
//! save; warnings need an explicit confirmation.

use regex::Regex;
use serde::Serialize;

use super::schema::{DataSource, FieldDefinition, FieldKind, FieldSchema};
use super::template::{Aggregation, GradeKind, MatchKind, ScoringConfig, ValueSource};

/// Finding produced by [`TemplateValidator`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum TemplateIssue {
    #[error("field `{field}` is declared more than once")]
    DuplicateField { field: String },
    #[error("field `{field}` has no options")]
    MissingOptions { field: String },
    #[error("{data_source} templates cannot declare form fields")]
    FieldsOutsideFormInput { data_source: DataSource },
    #[error("source field `{field}` is not in the field schema")]
    UnknownSourceField { field: String },
    #[error("{grade_kind} grading cannot read {field_kind} field `{field}`")]
    FieldKindMismatch {
        field: String,
        grade_kind: GradeKind,
        field_kind: FieldKind,
    },
    #[error("{aggregation} aggregation requires numeric grading, found {grade_kind}")]
    AggregationRequiresNumeric {
        aggregation: Aggregation,
        grade_kind: GradeKind,
    },
    #[error("contains matching cannot be used with numeric grading")]
    ContainsOnNumeric,
    #[error("range thresholds must be numeric, found `{value}`")]
    NonNumericThreshold { value: String },
    #[error("extract pattern `{pattern}` does not compile: {reason}")]
    InvalidExtractPattern { pattern: String, reason: String },
    #[error("{grade_kind} grading on {field_kind} field `{field}` relies on string coercion")]
    LooseStringField {
        field: String,
        grade_kind: GradeKind,
        field_kind: FieldKind,
    },
    #[error("source field `{field}` is set but the grade table is empty")]
    EmptyGradeTable { field: String },
    #[error("scoring field `{field}` is optional")]
    OptionalScoringField { field: String },
    #[error("{grade_kind} grading has no match kind; {fallback} is assumed")]
    MissingMatchKind {
        grade_kind: GradeKind,
        fallback: MatchKind,
    },
    #[error("grade table maps `{value}` more than once")]
    DuplicateMappingValue { value: String },
    #[error("extract pattern is ignored for {value_source} sources with {grade_kind} grading")]
    IgnoredExtractPattern {
        value_source: ValueSource,
        grade_kind: GradeKind,
    },
}

/// Outcome of a validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<TemplateIssue>,
    pub warnings: Vec<TemplateIssue>,
}

impl ValidationReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    fn error(&mut self, issue: TemplateIssue) {
        self.errors.push(issue);
    }

    fn warn(&mut self, issue: TemplateIssue) {
        self.warnings.push(issue);
    }
}

/// Pure checker run before a template edit is persisted.
#[derive(Debug, Clone, Copy)]
pub struct TemplateValidator {
    data_source: DataSource,
}

impl TemplateValidator {
    pub fn new(data_source: DataSource) -> Self {
        Self { data_source }
    }

    pub fn validate(
        &self,
        fields: &FieldSchema,
        scoring: Option<&ScoringConfig>,
    ) -> ValidationReport {
        let mut report = ValidationReport::default();

        self.check_schema(fields, &mut report);
        if let Some(config) = scoring {
            self.check_scoring(fields, config, &mut report);
        }

        report
    }

    fn check_schema(&self, fields: &FieldSchema, report: &mut ValidationReport) {
        if self.data_source != DataSource::FormInput && !fields.is_empty() {
            report.error(TemplateIssue::FieldsOutsideFormInput {
                data_source: self.data_source,
            });
        }

        for name in fields.duplicate_names() {
            report.error(TemplateIssue::DuplicateField {
                field: name.to_string(),
            });
        }

        for field in fields.iter() {
            if field.kind.has_options() && field.options.is_empty() {
                report.error(TemplateIssue::MissingOptions {
                    field: field.name.clone(),
                });
            }
        }
    }

    fn check_scoring(
        &self,
        fields: &FieldSchema,
        config: &ScoringConfig,
        report: &mut ValidationReport,
    ) {
        let grade_kind = config.grade_kind;
        let match_kind = config.effective_match_kind();

        let scoring_field = self.scoring_field(fields, config, report);

        if let Some(field) = scoring_field {
            if config.value_source == ValueSource::Submitted {
                check_field_kind(field, grade_kind, report);
            }
            if !field.required {
                report.warn(TemplateIssue::OptionalScoringField {
                    field: field.name.clone(),
                });
            }
        }

        if config.aggregation.requires_numeric() && grade_kind != GradeKind::Numeric {
            report.error(TemplateIssue::AggregationRequiresNumeric {
                aggregation: config.aggregation,
                grade_kind,
            });
        }

        if match_kind == MatchKind::Contains && grade_kind == GradeKind::Numeric {
            report.error(TemplateIssue::ContainsOnNumeric);
        }

        // count aggregation re-matches entry counts with range semantics
        if match_kind == MatchKind::Range || config.aggregation == Aggregation::Count {
            for value in config.grade_table.non_numeric_values() {
                report.error(TemplateIssue::NonNumericThreshold {
                    value: value.to_string(),
                });
            }
        }

        if let Some(pattern) = &config.extract_pattern {
            if let Err(err) = Regex::new(pattern) {
                report.error(TemplateIssue::InvalidExtractPattern {
                    pattern: pattern.clone(),
                    reason: err.to_string(),
                });
            }
            if config.value_source != ValueSource::JsonField || grade_kind == GradeKind::Numeric {
                report.warn(TemplateIssue::IgnoredExtractPattern {
                    value_source: config.value_source,
                    grade_kind,
                });
            }
        }

        if let Some(field) = &config.source_field {
            if config.grade_table.is_empty() {
                report.warn(TemplateIssue::EmptyGradeTable {
                    field: field.clone(),
                });
            }
        }

        if config.match_kind.is_none() {
            report.warn(TemplateIssue::MissingMatchKind {
                grade_kind,
                fallback: match_kind,
            });
        }

        for value in config.grade_table.duplicate_values() {
            report.warn(TemplateIssue::DuplicateMappingValue {
                value: value.to_string(),
            });
        }
    }

    /// Resolve the schema field a config scores on, reporting unknown names for form templates.
    fn scoring_field<'a>(
        &self,
        fields: &'a FieldSchema,
        config: &ScoringConfig,
        report: &mut ValidationReport,
    ) -> Option<&'a FieldDefinition> {
        let name = match (config.value_source, config.source_field.as_deref()) {
            (ValueSource::UserField, _) => return None,
            (ValueSource::Submitted, Some(name)) => name,
            (ValueSource::JsonField, Some(path)) => path.split('.').next().unwrap_or(path),
            (_, None) if fields.len() == 1 => return fields.fields().first(),
            (_, None) => return None,
        };

        let field = fields.field(name);
        if field.is_none() && self.data_source == DataSource::FormInput {
            report.error(TemplateIssue::UnknownSourceField {
                field: name.to_string(),
            });
        }
        field
    }
}

fn check_field_kind(field: &FieldDefinition, grade_kind: GradeKind, report: &mut ValidationReport) {
    let compatible = match grade_kind {
        GradeKind::Numeric => field.kind == FieldKind::Number,
        GradeKind::FileExists => field.kind == FieldKind::File,
        GradeKind::MultiSelect => field.kind.has_options(),
        GradeKind::String => {
            // free-text areas and non-text kinds are coerced to strings
            if !matches!(field.kind, FieldKind::Text | FieldKind::Select) {
                report.warn(TemplateIssue::LooseStringField {
                    field: field.name.clone(),
                    grade_kind,
                    field_kind: field.kind,
                });
            }
            true
        }
    };

    if !compatible {
        report.error(TemplateIssue::FieldKindMismatch {
            field: field.name.clone(),
            grade_kind,
            field_kind: field.kind,
        });
    }
}
