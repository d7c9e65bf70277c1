//! Text summary builder for CLI output.
//!
//! Formats the outcome of a one-shot run as human-readable lines for text mode.

use crate::model::RunSummary;
use crate::view;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Build a text summary from a finished run.
pub(crate) fn build_text_summary(summary: &RunSummary) -> TextSummary {
    let mut lines = Vec::new();

    lines.push(format!(
        "File: {}",
        summary.file_name.as_deref().unwrap_or("-")
    ));
    if let Some(msg) = summary.upload_message.as_deref() {
        lines.push(format!("Upload: {msg}"));
    }
    lines.push(format!("State: {:?}", summary.state));

    if let Some(record) = summary.analysis.as_ref() {
        lines.push(format!("Analysis: {}", record.message));
        lines.push(format!("Report: {}", record.report_url));

        let upload = record
            .upload_elapsed
            .map(|d| humantime::format_duration(d).to_string())
            .unwrap_or_else(|| "-".into());
        lines.push(format!(
            "Timings: upload {upload}, analysis {}",
            humantime::format_duration(record.analysis_elapsed)
        ));

        lines.push("Search results:".into());
        lines.extend(
            view::pretty_json(&record.search_results)
                .lines()
                .map(|l| format!("  {l}")),
        );
    }

    if let Some(path) = summary.saved_report.as_ref() {
        lines.push(format!("Saved report: {}", path.display()));
    }

    TextSummary { lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnalysisRecord, WorkflowState};
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn upload_only_run_has_no_analysis_lines() {
        let summary = RunSummary {
            state: WorkflowState::Uploaded,
            file_name: Some("a.pdf".into()),
            upload_message: Some("File uploaded".into()),
            analysis: None,
            saved_report: None,
        };
        let lines = build_text_summary(&summary).lines;
        assert_eq!(
            lines,
            vec!["File: a.pdf", "Upload: File uploaded", "State: Uploaded"]
        );
    }

    #[test]
    fn analysis_lines_include_link_timings_and_results() {
        let summary = RunSummary {
            state: WorkflowState::AnalysisComplete,
            file_name: Some("a.pdf".into()),
            upload_message: Some("ok".into()),
            analysis: Some(AnalysisRecord {
                timestamp_utc: "2024-05-01T10:00:00Z".into(),
                base_url: "http://localhost:8000".into(),
                file_name: "a.pdf".into(),
                message: "done".into(),
                report_path: "r1.pdf".into(),
                report_url: "http://localhost:8000/download-report/r1.pdf".into(),
                search_results: serde_json::json!({"hits": 1}),
                upload_elapsed: None,
                analysis_elapsed: Duration::from_secs(2),
            }),
            saved_report: Some(PathBuf::from("/tmp/r1.pdf")),
        };
        let lines = build_text_summary(&summary).lines;

        assert!(lines.contains(&"Report: http://localhost:8000/download-report/r1.pdf".to_string()));
        assert!(lines.contains(&"Timings: upload -, analysis 2s".to_string()));
        assert!(lines.contains(&"    \"hits\": 1".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("Saved report: /tmp/r1.pdf"));
    }
}
