//! Local file IO: reading the selected document and writing exports/reports.

use crate::error::WorkflowError;
use crate::model::{AnalysisRecord, SelectedFile};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const FALLBACK_REPORT_NAME: &str = "report.pdf";

/// Read a document chosen by the user. An unreadable path is a validation failure.
pub async fn read_selected_file(path: &Path) -> Result<SelectedFile, WorkflowError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| WorkflowError::Validation(format!("Cannot read {}: {e}", path.display())))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(SelectedFile::new(name, bytes))
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    Ok(())
}

pub fn export_json(path: &Path, record: &AnalysisRecord) -> Result<()> {
    ensure_parent(path)?;
    let data = serde_json::to_vec_pretty(record)?;
    std::fs::write(path, data).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn export_html(path: &Path, html: &str) -> Result<()> {
    ensure_parent(path)?;
    std::fs::write(path, html).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Local file name for a report: the last segment of the backend path.
pub fn report_file_name(report_path: &str) -> String {
    report_path
        .rsplit(['/', '\\'])
        .find(|s| !s.is_empty() && *s != "." && *s != "..")
        .unwrap_or(FALLBACK_REPORT_NAME)
        .to_string()
}

/// Write a downloaded report into `dir`, returning its path.
pub fn save_report(dir: &Path, report_path: &str, bytes: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("create directory {}", dir.display()))?;
    let path = dir.join(report_file_name(report_path));
    std::fs::write(&path, bytes).with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}

/// Where reports go when no directory was given.
pub fn default_report_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Default export name derived from the record timestamp.
pub fn default_record_name(timestamp_utc: &str) -> String {
    format!(
        "doc-analysis-{}.json",
        timestamp_utc.replace(':', "-").replace('T', "_")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn record() -> AnalysisRecord {
        AnalysisRecord {
            timestamp_utc: "2024-05-01T10:00:00Z".into(),
            base_url: "http://localhost:8000".into(),
            file_name: "a.pdf".into(),
            message: "done".into(),
            report_path: "r1.pdf".into(),
            report_url: "http://localhost:8000/download-report/r1.pdf".into(),
            search_results: serde_json::json!({"hits": 1}),
            upload_elapsed: Some(Duration::from_millis(1500)),
            analysis_elapsed: Duration::from_secs(3),
        }
    }

    #[tokio::test]
    async fn reads_selected_file_with_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.pdf");
        std::fs::write(&path, b"%PDF").unwrap();

        let file = read_selected_file(&path).await.unwrap();
        assert_eq!(file.name, "policy.pdf");
        assert_eq!(&file.bytes[..], b"%PDF");
    }

    #[tokio::test]
    async fn missing_file_is_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_selected_file(&dir.path().join("nope.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
        assert!(err.to_string().starts_with("Cannot read "));
    }

    #[test]
    fn export_json_writes_humantime_durations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("record.json");
        export_json(&path, &record()).unwrap();

        let v: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(v["report_path"], "r1.pdf");
        assert_eq!(v["upload_elapsed"], "1s 500ms");
        assert_eq!(v["analysis_elapsed"], "3s");
    }

    #[test]
    fn report_file_name_uses_last_segment() {
        assert_eq!(report_file_name("r1.pdf"), "r1.pdf");
        assert_eq!(report_file_name("reports/2024/r1.pdf"), "r1.pdf");
        assert_eq!(report_file_name("../../etc/passwd"), "passwd");
        assert_eq!(report_file_name("dir/"), "dir");
        assert_eq!(report_file_name(""), "report.pdf");
        assert_eq!(report_file_name(".."), "report.pdf");
    }

    #[test]
    fn save_report_stays_inside_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_report(dir.path(), "../x/r1.pdf", b"%PDF").unwrap();
        assert_eq!(path, dir.path().join("r1.pdf"));
        assert_eq!(std::fs::read(path).unwrap(), b"%PDF");
    }

    #[test]
    fn default_record_name_is_filesystem_safe() {
        assert_eq!(
            default_record_name("2024-05-01T10:00:00Z"),
            "doc-analysis-2024-05-01_10-00-00Z.json"
        );
    }
}
