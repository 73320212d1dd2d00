use crate::infra::{preview_item, read_json, PreviewReport};
use clap::Args;
use competency_engine::competency::{
    SubmissionEntry, TemplateDraft, TemplateRejected, ValidationReport,
};
use competency_engine::config::AppConfig;
use competency_engine::error::AppError;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct ValidateArgs {
    /// Template draft as JSON
    pub(crate) template: PathBuf,
}

#[derive(Args, Debug)]
pub(crate) struct PreviewArgs {
    /// Template draft as JSON
    pub(crate) template: PathBuf,
    /// JSON array of submission entries
    pub(crate) entries: PathBuf,
    /// JSON object of profile values for user_field sources
    #[arg(long)]
    pub(crate) user_fields: Option<PathBuf>,
    /// Accept a template that only has warnings
    #[arg(long)]
    pub(crate) confirm: bool,
}

pub(crate) fn run_validate(args: ValidateArgs) -> Result<(), AppError> {
    let draft: TemplateDraft = read_json(&args.template)?;
    let report = draft.validate();

    println!("Template {} ({})", draft.name, draft.id);
    render_validation(&report);

    if report.has_errors() {
        return Err(TemplateRejected::Invalid(report).into());
    }
    Ok(())
}

pub(crate) fn run_preview(args: PreviewArgs) -> Result<(), AppError> {
    let PreviewArgs {
        template,
        entries,
        user_fields,
        confirm,
    } = args;

    let config = AppConfig::load()?;
    let draft: TemplateDraft = read_json(&template)?;
    let entries: Vec<SubmissionEntry> = read_json(&entries)?;
    let profile: BTreeMap<String, serde_json::Value> = match user_fields {
        Some(path) => read_json(&path)?,
        None => BTreeMap::new(),
    };

    let report = preview_item(
        draft,
        confirm,
        &entries,
        &profile,
        config.engine.max_entries,
    )
    .inspect_err(|err| {
        if let Some(report) = err.report() {
            render_validation(report);
        }
    })?;

    render_preview(&report);
    Ok(())
}

fn render_validation(report: &ValidationReport) {
    if report.is_clean() {
        println!("  No issues found");
        return;
    }

    for issue in &report.errors {
        println!("  error: {}", issue);
    }
    for issue in &report.warnings {
        println!("  warning: {}", issue);
    }

    if !report.has_errors() {
        println!("  Saving requires confirmation (--confirm)");
    }
}

fn render_preview(report: &PreviewReport) {
    let evaluation = &report.evaluation;
    println!(
        "Template {}: {} aggregation over {} entr{}",
        report.template_id,
        evaluation.aggregation,
        evaluation.entries.len(),
        if evaluation.entries.len() == 1 { "y" } else { "ies" }
    );

    for entry in &evaluation.entries {
        let raw = entry
            .raw_value
            .as_ref()
            .map(|raw| raw.to_text())
            .unwrap_or_else(|| "-".to_string());
        match &entry.matched_mapping {
            Some(mapping) => println!(
                "  #{} {} -> {} ({})",
                entry.index,
                raw,
                entry.score,
                mapping.label.as_deref().unwrap_or("matched")
            ),
            None => println!(
                "  #{} {} -> {}{}",
                entry.index,
                raw,
                entry.score,
                entry
                    .miss
                    .as_ref()
                    .map(|miss| format!(" ({miss:?})"))
                    .unwrap_or_default()
            ),
        }
    }

    for entry in &report.conformance {
        for issue in &entry.issues {
            println!("  entry #{}: {}", entry.index, issue);
        }
    }

    println!(
        "Score: {} ({} qualifying entr{})",
        evaluation.score,
        evaluation.qualifying_entries,
        if evaluation.qualifying_entries == 1 { "y" } else { "ies" }
    );
}
