use crate::competency::grades::{GradeMapping, GradeTable};
use crate::competency::schema::{FieldDefinition, FieldKind, FieldSchema, SubmissionEntry};
use crate::competency::template::{
    Aggregation, GradeKind, MatchKind, ScoringConfig, Template, TemplateDraft,
};

pub(super) fn table(rows: &[(i64, i32)]) -> GradeTable {
    rows.iter()
        .map(|(raw, score)| GradeMapping::new(*raw, *score))
        .collect()
}

pub(super) fn text_table(rows: &[(&str, i32)]) -> GradeTable {
    rows.iter()
        .map(|(raw, score)| GradeMapping::new(*raw, *score))
        .collect()
}

pub(super) fn presence_table() -> GradeTable {
    GradeTable::new(vec![
        GradeMapping::new(true, 10).with_label("submitted").pinned(),
        GradeMapping::new(false, 0).with_label("missing").pinned(),
    ])
}

/// Numeric range scoring on the required `hours` field.
pub(super) fn hours_config(aggregation: Aggregation) -> ScoringConfig {
    ScoringConfig {
        match_kind: Some(MatchKind::Range),
        source_field: Some("hours".to_string()),
        aggregation,
        ..ScoringConfig::new(GradeKind::Numeric, table(&[(1000, 20), (500, 10), (0, 0)]))
    }
}

pub(super) fn hours_schema() -> FieldSchema {
    FieldSchema::new(vec![
        FieldDefinition::new("hours", FieldKind::Number)
            .with_label("Coaching hours")
            .required(),
        FieldDefinition::new("season", FieldKind::Text),
    ])
}

pub(super) fn hours_entry(hours: f64) -> SubmissionEntry {
    SubmissionEntry::new()
        .with_value("hours", hours)
        .with_value("season", "2024")
}

pub(super) fn hours_template(aggregation: Aggregation) -> Template {
    let mut draft = TemplateDraft::new("coaching-hours", "Coaching hours");
    draft.repeatable = true;
    draft.fields = hours_schema();
    draft.scoring = Some(hours_config(aggregation));
    draft.commit(true).expect("hours template is valid")
}
