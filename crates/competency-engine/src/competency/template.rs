use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::grades::{GradeEdit, GradeEditError, GradeEditMode, GradeTable};
use super::schema::{DataSource, FieldSchema};
use super::validator::{TemplateValidator, ValidationReport};

/// Identifier wrapper for templates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(pub String);

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shape of the value a scored item is graded on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeKind {
    String,
    Numeric,
    FileExists,
    MultiSelect,
}

impl GradeKind {
    pub const fn label(self) -> &'static str {
        match self {
            GradeKind::String => "string",
            GradeKind::Numeric => "numeric",
            GradeKind::FileExists => "file_exists",
            GradeKind::MultiSelect => "multi_select",
        }
    }

    /// Strategy used when a template leaves `match_kind` unset.
    pub const fn default_match_kind(self) -> MatchKind {
        match self {
            GradeKind::String => MatchKind::Exact,
            GradeKind::Numeric => MatchKind::Range,
            GradeKind::FileExists => MatchKind::Grade,
            GradeKind::MultiSelect => MatchKind::Contains,
        }
    }
}

impl fmt::Display for GradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Contains,
    Range,
    Grade,
}

impl MatchKind {
    pub const fn label(self) -> &'static str {
        match self {
            MatchKind::Exact => "exact",
            MatchKind::Contains => "contains",
            MatchKind::Range => "range",
            MatchKind::Grade => "grade",
        }
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    #[default]
    Submitted,
    UserField,
    JsonField,
}

impl ValueSource {
    pub const fn label(self) -> &'static str {
        match self {
            ValueSource::Submitted => "submitted",
            ValueSource::UserField => "user_field",
            ValueSource::JsonField => "json_field",
        }
    }
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How per-entry results of a repeatable item collapse into one score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    #[default]
    First,
    Sum,
    Max,
    Count,
    AnyMatch,
    BestMatch,
}

impl Aggregation {
    pub const fn label(self) -> &'static str {
        match self {
            Aggregation::First => "first",
            Aggregation::Sum => "sum",
            Aggregation::Max => "max",
            Aggregation::Count => "count",
            Aggregation::AnyMatch => "any_match",
            Aggregation::BestMatch => "best_match",
        }
    }

    pub const fn requires_numeric(self) -> bool {
        matches!(self, Aggregation::Sum | Aggregation::Max)
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofRequirement {
    #[default]
    NotRequired,
    Optional,
    Required,
}

/// Scoring half of a template: what to read, how to match it, how to combine entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub grade_kind: GradeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_kind: Option<MatchKind>,
    #[serde(default)]
    pub value_source: ValueSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract_pattern: Option<String>,
    #[serde(default)]
    pub aggregation: Aggregation,
    #[serde(default)]
    pub grade_table: GradeTable,
    #[serde(default)]
    pub fixed_grades: bool,
    #[serde(default)]
    pub grade_edit_mode: GradeEditMode,
    #[serde(default)]
    pub proof_required: ProofRequirement,
}

impl ScoringConfig {
    pub fn new(grade_kind: GradeKind, grade_table: GradeTable) -> Self {
        Self {
            grade_kind,
            match_kind: None,
            value_source: ValueSource::default(),
            source_field: None,
            extract_pattern: None,
            aggregation: Aggregation::default(),
            grade_table,
            fixed_grades: false,
            grade_edit_mode: GradeEditMode::default(),
            proof_required: ProofRequirement::default(),
        }
    }

    pub fn effective_match_kind(&self) -> MatchKind {
        self.match_kind
            .unwrap_or_else(|| self.grade_kind.default_match_kind())
    }

    /// `fixed_grades` is the legacy lock and overrides the edit mode.
    pub fn effective_edit_mode(&self) -> GradeEditMode {
        if self.fixed_grades {
            GradeEditMode::Fixed
        } else {
            self.grade_edit_mode
        }
    }
}

/// Editable form of a template. Only [`TemplateDraft::commit`] turns it into a [`Template`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDraft {
    pub id: TemplateId,
    pub name: String,
    #[serde(default)]
    pub data_source: DataSource,
    #[serde(default)]
    pub repeatable: bool,
    #[serde(default)]
    pub fields: FieldSchema,
    #[serde(default)]
    pub scoring: Option<ScoringConfig>,
}

impl TemplateDraft {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: TemplateId(id.into()),
            name: name.into(),
            data_source: DataSource::default(),
            repeatable: false,
            fields: FieldSchema::default(),
            scoring: None,
        }
    }

    pub fn validate(&self) -> ValidationReport {
        TemplateValidator::new(self.data_source).validate(&self.fields, self.scoring.as_ref())
    }

    /// Gate a save: errors always refuse, warnings refuse until `confirmed`.
    pub fn commit(self, confirmed: bool) -> Result<Template, TemplateRejected> {
        let report = self.validate();
        if report.has_errors() {
            return Err(TemplateRejected::Invalid(report));
        }
        if report.has_warnings() && !confirmed {
            return Err(TemplateRejected::Unconfirmed(report));
        }

        let template = Template::from(self);
        info!(
            template = %template.id,
            warnings = report.warnings.len(),
            "template committed"
        );
        Ok(template)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TemplateRejected {
    #[error("template has {} blocking issue(s)", .0.errors.len())]
    Invalid(ValidationReport),
    #[error("template has {} warning(s) awaiting confirmation", .0.warnings.len())]
    Unconfirmed(ValidationReport),
}

impl TemplateRejected {
    pub fn report(&self) -> &ValidationReport {
        match self {
            TemplateRejected::Invalid(report) | TemplateRejected::Unconfirmed(report) => report,
        }
    }
}

/// A saved template. Construction always applies the proof normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TemplateDraft")]
pub struct Template {
    id: TemplateId,
    name: String,
    data_source: DataSource,
    repeatable: bool,
    fields: FieldSchema,
    scoring: Option<ScoringConfig>,
}

impl From<TemplateDraft> for Template {
    fn from(draft: TemplateDraft) -> Self {
        let TemplateDraft {
            id,
            name,
            data_source,
            repeatable,
            fields,
            mut scoring,
        } = draft;

        if let Some(config) = scoring.as_mut() {
            if !fields.has_file_field() {
                config.proof_required = ProofRequirement::NotRequired;
            }
        }

        Self {
            id,
            name,
            data_source,
            repeatable,
            fields,
            scoring,
        }
    }
}

impl Template {
    pub fn id(&self) -> &TemplateId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_source(&self) -> DataSource {
        self.data_source
    }

    pub fn repeatable(&self) -> bool {
        self.repeatable
    }

    pub fn fields(&self) -> &FieldSchema {
        &self.fields
    }

    pub fn scoring(&self) -> Option<&ScoringConfig> {
        self.scoring.as_ref()
    }

    pub fn has_scoring(&self) -> bool {
        self.scoring.is_some()
    }

    pub fn proof_required(&self) -> ProofRequirement {
        self.scoring
            .as_ref()
            .map(|config| config.proof_required)
            .unwrap_or_default()
    }

    /// Change the grade table within the limits of the template's edit mode.
    pub fn edit_grades(&mut self, edit: GradeEdit) -> Result<(), GradeEditError> {
        let config = self.scoring.as_mut().ok_or(GradeEditError::NoScoring)?;
        let mode = config.effective_edit_mode();
        config.grade_table.apply(edit, mode)
    }

    pub fn into_draft(self) -> TemplateDraft {
        TemplateDraft {
            id: self.id,
            name: self.name,
            data_source: self.data_source,
            repeatable: self.repeatable,
            fields: self.fields,
            scoring: self.scoring,
        }
    }
}
