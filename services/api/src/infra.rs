use competency_engine::competency::{
    EntryIssue, EvaluationEngine, ExternalLookups, ItemEvaluation, SubmissionEntry, TemplateDraft,
    TemplateId,
};
use competency_engine::error::AppError;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) max_entries: usize,
}

/// Schema problems found in one submitted entry.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct EntryConformance {
    pub(crate) index: usize,
    pub(crate) issues: Vec<EntryIssue>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct PreviewReport {
    pub(crate) template_id: TemplateId,
    pub(crate) evaluation: ItemEvaluation,
    pub(crate) conformance: Vec<EntryConformance>,
}

/// Commit a draft and score `entries` against it without persisting anything.
pub(crate) fn preview_item(
    draft: TemplateDraft,
    confirmed: bool,
    entries: &[SubmissionEntry],
    lookups: &dyn ExternalLookups,
    max_entries: usize,
) -> Result<PreviewReport, AppError> {
    if entries.len() > max_entries {
        return Err(AppError::EntryLimit {
            limit: max_entries,
            found: entries.len(),
        });
    }

    let template = draft.commit(confirmed)?;
    let engine = EvaluationEngine::new(&template)?;
    let evaluation = engine.evaluate(entries, lookups)?;

    let conformance = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| EntryConformance {
            index,
            issues: template.fields().check_entry(entry),
        })
        .filter(|entry| !entry.issues.is_empty())
        .collect::<Vec<_>>();

    debug!(
        template = %engine.template_id(),
        score = evaluation.score,
        nonconforming = conformance.len(),
        "preview evaluated"
    );

    Ok(PreviewReport {
        template_id: engine.template_id().clone(),
        evaluation,
        conformance,
    })
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
