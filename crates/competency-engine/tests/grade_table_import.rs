use std::io::Write;

use competency_engine::competency::{
    EvaluationEngine, GradeEdit, GradeEditError, GradeImportError, GradeKind, GradeTableImporter,
    MappingValue, MatchKind, NoLookups, ScoringConfig, SubmissionEntry, TemplateDraft,
};
use tempfile::NamedTempFile;

#[test]
fn bundled_licence_table_imports() {
    let data = include_bytes!("../data/coaching_licence_grades.csv");
    let grades = GradeTableImporter::from_reader(&data[..]).expect("licence grades import");

    assert_eq!(grades.len(), 5);
    assert!(grades.mappings()[0].fixed);
    assert!(!grades.mappings()[2].fixed);
    assert_eq!(
        grades.mappings()[4].raw_value,
        MappingValue::Text("Grassroots".to_string())
    );
    assert!(grades.duplicate_values().is_empty());
}

#[test]
fn imported_table_drives_a_template() {
    let mut file = NamedTempFile::new().expect("temp file");
    writeln!(file, "raw_value,score,label,fixed").expect("write header");
    writeln!(file, "20,12,Twenty or more,").expect("write row");
    writeln!(file, "5,4,,").expect("write row");
    writeln!(file, "0,0,None,true").expect("write row");

    let grades = GradeTableImporter::from_path(file.path()).expect("temp CSV imports");

    let mut draft = TemplateDraft::new("clinics", "Clinics attended");
    draft.scoring = Some(ScoringConfig {
        match_kind: Some(MatchKind::Range),
        ..ScoringConfig::new(GradeKind::Numeric, grades)
    });
    let mut template = draft.commit(false).expect("clean template");

    let engine = EvaluationEngine::new(&template).expect("scored");
    let entry = SubmissionEntry::new().with_value("clinics", 9.0);
    assert_eq!(engine.evaluate_entry(&entry, &NoLookups).score, 4);

    assert_eq!(
        template.edit_grades(GradeEdit::Remove { index: 2 }),
        Err(GradeEditError::Pinned { index: 2 })
    );
    template
        .edit_grades(GradeEdit::SetScore { index: 1, score: 6 })
        .expect("score edit");
    let engine = EvaluationEngine::new(&template).expect("scored");
    assert_eq!(engine.evaluate_entry(&entry, &NoLookups).score, 6);
}

#[test]
fn missing_file_surfaces_io_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let missing = dir.path().join("absent.csv");

    assert!(matches!(
        GradeTableImporter::from_path(missing),
        Err(GradeImportError::Io(_))
    ));
}
