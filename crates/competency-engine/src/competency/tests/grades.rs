use super::common::*;
use crate::competency::grades::{
    GradeEdit, GradeEditError, GradeEditMode, GradeImportError, GradeMapping, GradeTable,
    GradeTableImporter, MappingValue,
};
use crate::competency::schema::{FieldDefinition, FieldKind, FieldSchema};
use crate::competency::template::{Aggregation, GradeKind, ScoringConfig, TemplateDraft};

#[test]
fn fixed_mode_refuses_every_edit() {
    let mut grades = table(&[(10, 1)]);
    let before = grades.clone();

    let err = grades
        .apply(GradeEdit::SetScore { index: 0, score: 5 }, GradeEditMode::Fixed)
        .expect_err("locked");
    assert_eq!(err, GradeEditError::Locked);
    assert_eq!(grades, before);
}

#[test]
fn score_only_mode_allows_score_changes_only() {
    let mut grades = text_table(&[("A", 10), ("B", 5)]);

    grades
        .apply(GradeEdit::SetScore { index: 1, score: 6 }, GradeEditMode::ScoreOnly)
        .expect("score change allowed");
    assert_eq!(grades.mappings()[1].score, 6);

    let err = grades
        .apply(
            GradeEdit::SetRawValue {
                index: 1,
                raw_value: "C".into(),
            },
            GradeEditMode::ScoreOnly,
        )
        .expect_err("raw values locked");
    assert_eq!(err, GradeEditError::ScoresOnly);

    let err = grades
        .apply(GradeEdit::Remove { index: 0 }, GradeEditMode::ScoreOnly)
        .expect_err("rows locked");
    assert_eq!(err, GradeEditError::ScoresOnly);
}

#[test]
fn flexible_mode_edits_rows_but_respects_pinned_mappings() {
    let mut grades = presence_table();
    let mode = GradeEditMode::Flexible;

    grades
        .apply(
            GradeEdit::SetLabel {
                index: 0,
                label: Some("uploaded".to_string()),
            },
            mode,
        )
        .expect("labels are editable");
    grades
        .apply(GradeEdit::SetScore { index: 0, score: 12 }, mode)
        .expect("scores are editable");

    assert_eq!(
        grades.apply(GradeEdit::Remove { index: 1 }, mode),
        Err(GradeEditError::Pinned { index: 1 })
    );
    assert_eq!(
        grades.apply(
            GradeEdit::SetRawValue {
                index: 0,
                raw_value: MappingValue::Text("maybe".to_string()),
            },
            mode,
        ),
        Err(GradeEditError::Pinned { index: 0 })
    );

    grades
        .apply(
            GradeEdit::Insert {
                index: 2,
                mapping: GradeMapping::new("late", 4),
            },
            mode,
        )
        .expect("append allowed");
    grades
        .apply(GradeEdit::Remove { index: 2 }, mode)
        .expect("unpinned rows can go");

    assert_eq!(grades.len(), 2);
    assert_eq!(grades.mappings()[0].score, 12);
    assert_eq!(grades.mappings()[0].label.as_deref(), Some("uploaded"));
}

#[test]
fn edits_out_of_range_are_refused() {
    let mut grades = table(&[(0, 0)]);
    assert_eq!(
        grades.apply(GradeEdit::SetScore { index: 3, score: 1 }, GradeEditMode::Flexible),
        Err(GradeEditError::OutOfRange { index: 3, len: 1 })
    );
    assert_eq!(
        grades.apply(
            GradeEdit::Insert {
                index: 2,
                mapping: GradeMapping::new(1i64, 1),
            },
            GradeEditMode::Flexible,
        ),
        Err(GradeEditError::OutOfRange { index: 2, len: 1 })
    );
}

#[test]
fn template_edits_follow_configured_mode() {
    let mut template = hours_template(Aggregation::Max);
    template
        .edit_grades(GradeEdit::SetScore { index: 0, score: 25 })
        .expect("flexible by default");
    assert_eq!(
        template.scoring().map(|config| config.grade_table.mappings()[0].score),
        Some(25)
    );

    let mut draft = template.into_draft();
    if let Some(config) = draft.scoring.as_mut() {
        config.grade_edit_mode = GradeEditMode::Flexible;
        config.fixed_grades = true;
    }
    let mut locked = draft.commit(true).expect("still valid");
    assert_eq!(
        locked.edit_grades(GradeEdit::SetScore { index: 0, score: 30 }),
        Err(GradeEditError::Locked)
    );
}

#[test]
fn input_only_templates_have_no_grades_to_edit() {
    let mut draft = TemplateDraft::new("bio", "Coach biography");
    draft.fields = FieldSchema::new(vec![FieldDefinition::new("bio", FieldKind::Textarea)]);
    let mut template = draft.commit(false).expect("clean");

    assert_eq!(
        template.edit_grades(GradeEdit::Remove { index: 0 }),
        Err(GradeEditError::NoScoring)
    );
}

#[test]
fn csv_import_classifies_raw_values() {
    let csv = "raw_value,score,label,fixed\n\
               1000,20,Elite,\n\
               500.5,10,,yes\n\
               true,3,Uploaded,false\n\
               UEFA A,15,,\n";

    let grades = GradeTableImporter::from_reader(csv.as_bytes()).expect("valid CSV");
    let mappings = grades.mappings();

    assert_eq!(mappings.len(), 4);
    assert_eq!(mappings[0].raw_value, MappingValue::Number(1000.0));
    assert_eq!(mappings[0].label.as_deref(), Some("Elite"));
    assert_eq!(mappings[1].raw_value, MappingValue::Number(500.5));
    assert!(mappings[1].fixed);
    assert_eq!(mappings[1].label, None);
    assert_eq!(mappings[2].raw_value, MappingValue::Flag(true));
    assert!(!mappings[2].fixed);
    assert_eq!(mappings[3].raw_value, MappingValue::Text("UEFA A".to_string()));
}

#[test]
fn csv_import_reports_offending_line() {
    let csv = "raw_value,score,label,fixed\n10,1,,\n,2,,\n";
    match GradeTableImporter::from_reader(csv.as_bytes()) {
        Err(GradeImportError::EmptyRawValue { line }) => assert_eq!(line, 3),
        other => panic!("expected empty raw value, got {other:?}"),
    }

    let csv = "raw_value,score,label,fixed\n10,1,,sometimes\n";
    match GradeTableImporter::from_reader(csv.as_bytes()) {
        Err(GradeImportError::InvalidFlag { line, value }) => {
            assert_eq!(line, 2);
            assert_eq!(value, "sometimes");
        }
        other => panic!("expected invalid flag, got {other:?}"),
    }

    let csv = "raw_value,score\n10,lots\n";
    assert!(matches!(
        GradeTableImporter::from_reader(csv.as_bytes()),
        Err(GradeImportError::Csv(_))
    ));
}

#[test]
fn tables_and_schemas_survive_json() {
    let grades = presence_table();
    let encoded = serde_json::to_string(&grades).expect("encode");
    let decoded: GradeTable = serde_json::from_str(&encoded).expect("decode");
    assert_eq!(decoded, grades);

    let schema = hours_schema();
    let encoded = serde_json::to_value(&schema).expect("encode");
    assert_eq!(encoded[0]["kind"], "number");
    let decoded: FieldSchema = serde_json::from_value(encoded).expect("decode");
    assert_eq!(decoded, schema);
}

#[test]
fn duplicate_detection_ignores_number_formatting() {
    let grades = GradeTable::new(vec![
        GradeMapping::new(5i64, 1),
        GradeMapping::new(5.0, 2),
        GradeMapping::new("5", 3),
    ]);
    let duplicates = grades.duplicate_values();
    assert_eq!(duplicates, vec![&MappingValue::Number(5.0)]);

    let config = ScoringConfig::new(GradeKind::Numeric, grades);
    assert_eq!(config.grade_table.non_numeric_values().len(), 0);
}
