use super::common::*;
use crate::competency::evaluation::{
    AggregationEngine, EntryMiss, EvaluationEngine, EvaluationError, NoLookups,
};
use crate::competency::schema::{FieldDefinition, FieldKind, FieldSchema, SubmissionEntry};
use crate::competency::template::{
    Aggregation, GradeKind, MatchKind, ScoringConfig, TemplateDraft,
};

/// Exact numeric lookup on `level`, so each entry scores a known amount.
fn level_config(aggregation: Aggregation) -> ScoringConfig {
    ScoringConfig {
        match_kind: Some(MatchKind::Exact),
        source_field: Some("level".to_string()),
        aggregation,
        ..ScoringConfig::new(GradeKind::Numeric, table(&[(1, 5), (2, 10), (3, 0), (4, 7), (5, 3)]))
    }
}

fn level_entry(level: i64) -> SubmissionEntry {
    SubmissionEntry::new().with_value("level", level)
}

fn aggregate(config: &ScoringConfig, entries: &[SubmissionEntry]) -> (i32, usize) {
    let engine = AggregationEngine::new(config).expect("config compiles");
    let result = engine.aggregate(entries, &NoLookups);
    (result.score, result.qualifying_entries)
}

#[test]
fn sum_adds_every_entry_score() {
    let entries = [level_entry(1), level_entry(2), level_entry(3)];
    let (score, _) = aggregate(&level_config(Aggregation::Sum), &entries);
    assert_eq!(score, 15);
}

#[test]
fn sum_saturates_instead_of_overflowing() {
    let config = ScoringConfig {
        grade_table: table(&[(1, i32::MAX)]),
        ..level_config(Aggregation::Sum)
    };
    let (score, _) = aggregate(&config, &[level_entry(1), level_entry(1)]);
    assert_eq!(score, i32::MAX);
}

#[test]
fn any_match_takes_first_matched_entry() {
    let entries = [level_entry(9), level_entry(4), level_entry(5)];
    let engine = AggregationEngine::new(&level_config(Aggregation::AnyMatch)).expect("compiles");
    let result = engine.aggregate(&entries, &NoLookups);

    assert_eq!(result.score, 7);
    assert_eq!(result.entries[0].miss, Some(EntryMiss::NoMatchingGrade));
    assert_eq!(result.qualifying_entries, 2);
}

#[test]
fn first_uses_only_the_first_entry() {
    let (score, _) = aggregate(
        &level_config(Aggregation::First),
        &[level_entry(4), level_entry(2)],
    );
    assert_eq!(score, 7);

    let (score, _) = aggregate(&level_config(Aggregation::First), &[]);
    assert_eq!(score, 0);
}

#[test]
fn max_and_best_match_keep_highest_score() {
    let entries = [level_entry(1), level_entry(2), level_entry(4)];
    for aggregation in [Aggregation::Max, Aggregation::BestMatch] {
        let engine = AggregationEngine::new(&level_config(aggregation)).expect("compiles");
        let result = engine.aggregate(&entries, &NoLookups);
        assert_eq!(result.score, 10, "{aggregation}");
        let mapping = result.matched_mapping.expect("best mapping");
        assert_eq!(mapping.raw_value.as_number(), Some(2.0));
    }
}

fn count_config(bands: &[(i64, i32)]) -> ScoringConfig {
    ScoringConfig {
        match_kind: Some(MatchKind::Range),
        source_field: Some("hours".to_string()),
        aggregation: Aggregation::Count,
        ..ScoringConfig::new(GradeKind::Numeric, table(bands))
    }
}

#[test]
fn count_range_matches_number_of_matched_entries() {
    let config = count_config(&[(3, 15), (1, 5)]);
    let blank = SubmissionEntry::new().with_value("hours", "");

    let (score, qualifying) = aggregate(&config, &[hours_entry(10.0), blank.clone()]);
    assert_eq!((score, qualifying), (5, 1));

    let (score, qualifying) = aggregate(
        &config,
        &[hours_entry(1.0), hours_entry(2.0), hours_entry(3.0), blank],
    );
    assert_eq!((score, qualifying), (15, 3));

    let (score, qualifying) = aggregate(&config, &[]);
    assert_eq!((score, qualifying), (0, 0));
}

#[test]
fn count_excludes_entries_without_a_matching_band() {
    let config = count_config(&[(1, 5), (2, 10), (3, 15)]);
    let engine = AggregationEngine::new(&config).expect("config compiles");
    let entries = [hours_entry(0.0), hours_entry(0.5), hours_entry(2.0)];

    let result = engine.aggregate(&entries, &NoLookups);

    assert_eq!(result.qualifying_entries, 1);
    assert_eq!(result.score, 5);
    let per_entry: Vec<(i32, bool)> = result
        .entries
        .iter()
        .map(|entry| (entry.score, entry.qualifies))
        .collect();
    assert_eq!(per_entry, vec![(0, false), (0, false), (10, true)]);
    assert_eq!(result.entries[0].miss, Some(EntryMiss::NoMatchingGrade));
    assert_eq!(
        result.entries[2]
            .matched_mapping
            .as_ref()
            .and_then(|mapping| mapping.raw_value.as_number()),
        Some(2.0)
    );
}

#[test]
fn type_mismatch_scores_zero_and_evaluation_continues() {
    let config = ScoringConfig {
        match_kind: Some(MatchKind::Contains),
        source_field: Some("notes".to_string()),
        aggregation: Aggregation::AnyMatch,
        ..ScoringConfig::new(GradeKind::String, text_table(&[("national", 30)]))
    };
    let entries = [
        SubmissionEntry::new().with_value("notes", 42i64),
        SubmissionEntry::new().with_value("notes", "National squad"),
    ];

    let engine = AggregationEngine::new(&config).expect("compiles");
    let result = engine.aggregate(&entries, &NoLookups);

    assert_eq!(result.score, 30);
    match &result.entries[0].miss {
        Some(EntryMiss::TypeMismatch { detail }) => assert!(detail.contains("contains")),
        other => panic!("expected type mismatch, got {other:?}"),
    }
}

#[test]
fn max_over_hours_ranges() {
    let template = hours_template(Aggregation::Max);
    let engine = EvaluationEngine::new(&template).expect("scored template");
    let entries = [hours_entry(300.0), hours_entry(1200.0), hours_entry(600.0)];

    let result = engine.evaluate(&entries, &NoLookups).expect("repeatable");

    let scores: Vec<i32> = result.entries.iter().map(|entry| entry.score).collect();
    assert_eq!(scores, vec![0, 20, 10]);
    assert_eq!(result.score, 20);
}

#[test]
fn non_repeatable_item_rejects_extra_entries() {
    let mut draft = TemplateDraft::new("head-coach", "Head coach licence");
    draft.fields = hours_schema();
    draft.scoring = Some(hours_config(Aggregation::First));
    let template = draft.commit(true).expect("valid template");
    let engine = EvaluationEngine::new(&template).expect("scored template");

    assert!(engine.evaluate(&[hours_entry(700.0)], &NoLookups).is_ok());
    match engine.evaluate(&[hours_entry(700.0), hours_entry(100.0)], &NoLookups) {
        Err(EvaluationError::TooManyEntries { found, .. }) => assert_eq!(found, 2),
        other => panic!("expected too many entries, got {other:?}"),
    }
}

#[test]
fn input_only_templates_cannot_be_evaluated() {
    let mut draft = TemplateDraft::new("notes", "Coaching notes");
    draft.fields = FieldSchema::new(vec![FieldDefinition::new("notes", FieldKind::Textarea)]);
    let template = draft.commit(false).expect("clean template");

    match EvaluationEngine::new(&template) {
        Err(EvaluationError::NoScoring { template }) => assert_eq!(template.0, "notes"),
        other => panic!("expected no scoring, got {other:?}"),
    }
}

#[test]
fn single_entry_evaluation_reports_raw_value() {
    let engine = EvaluationEngine::new(&hours_template(Aggregation::First)).expect("scored");
    assert_eq!(engine.template_id().0, "coaching-hours");
    let result = engine.evaluate_entry(&hours_entry(512.0), &NoLookups);

    assert_eq!(result.score, 10);
    assert!(result.qualifies);
    assert_eq!(
        result.raw_value.and_then(|raw| raw.as_number()),
        Some(512.0)
    );
}
