//! Post-analysis processing utilities.
//!
//! Builds the exported record, writes JSON/HTML exports and fetches the report PDF
//! after an analysis completes.

use crate::cli::Cli;
use crate::engine::{self, AnalysisBackend};
use crate::model::{AnalysisRecord, CompletedAnalysis, WorkflowConfig};
use crate::storage;
use crate::view;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Result of post-analysis processing, ready for presentation layers.
pub(crate) struct ProcessedAnalysis {
    pub record: AnalysisRecord,
    pub export_messages: Vec<String>,
}

pub(crate) fn build_record(cfg: &WorkflowConfig, done: &CompletedAnalysis) -> AnalysisRecord {
    AnalysisRecord {
        timestamp_utc: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "now".into()),
        base_url: cfg.base_url.clone(),
        file_name: done.file_name.clone(),
        message: done.report.message.clone(),
        report_path: done.report.report_path.clone(),
        report_url: engine::report_url(&cfg.base_url, &done.report.report_path),
        search_results: done.report.search_results.clone(),
        upload_elapsed: done.upload_elapsed,
        analysis_elapsed: done.analysis_elapsed,
    }
}

/// Build the record and run the exports requested on the command line.
///
/// Export failures come back as messages rather than errors.
pub(crate) fn process_analysis_completion(
    args: &Cli,
    cfg: &WorkflowConfig,
    done: &CompletedAnalysis,
) -> ProcessedAnalysis {
    let record = build_record(cfg, done);
    let html = view::render_result_html(&done.report);

    let mut export_messages = Vec::new();
    if let Some(export_path) = args.export_json.as_deref() {
        match storage::export_json(export_path, &record) {
            Ok(_) => export_messages.push(format!("Exported JSON: {}", export_path.display())),
            Err(e) => export_messages.push(format!("Export JSON failed: {e:#}")),
        }
    }
    if let Some(export_path) = args.export_html.as_deref() {
        match storage::export_html(export_path, &html) {
            Ok(_) => export_messages.push(format!("Exported HTML: {}", export_path.display())),
            Err(e) => export_messages.push(format!("Export HTML failed: {e:#}")),
        }
    }

    ProcessedAnalysis {
        record,
        export_messages,
    }
}

/// Fetch the report behind `report_path` and save it under `dir`.
pub(crate) async fn download_report(
    backend: &dyn AnalysisBackend,
    dir: &Path,
    report_path: &str,
) -> Result<PathBuf> {
    let bytes = backend
        .download_report(report_path)
        .await
        .with_context(|| format!("download report {report_path}"))?;
    let path = storage::save_report(dir, report_path, &bytes)?;
    info!(path = %path.display(), bytes = bytes.len(), "report saved");
    Ok(path)
}
