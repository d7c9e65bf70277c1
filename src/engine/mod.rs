mod client;
mod payload;

pub use client::HttpBackend;

use crate::error::WorkflowError;
use crate::model::{AnalysisReport, SelectedFile, UploadReceipt};
use async_trait::async_trait;
use bytes::Bytes;

pub const UPLOAD_ROUTE: &str = "/upload/";
pub const ANALYZE_ROUTE: &str = "/analyze/";
pub const DOWNLOAD_ROUTE: &str = "/download-report/";
/// Multipart field carrying the document.
pub const FILE_FIELD: &str = "file";
/// Multipart field carrying the analysis query.
pub const QUERY_FIELD: &str = "query";
/// Sent with every analysis request; not user-configurable.
pub const ANALYSIS_QUERY: &str = "Comprehensive document analysis";

/// The document-analysis service as seen by the workflow.
///
/// One call is one request; implementations never retry.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn upload(&self, file: &SelectedFile) -> Result<UploadReceipt, WorkflowError>;

    async fn analyze(
        &self,
        file: &SelectedFile,
        query: &str,
    ) -> Result<AnalysisReport, WorkflowError>;

    async fn download_report(&self, report_path: &str) -> Result<Bytes, WorkflowError>;
}

/// Route to a report, relative to the backend root. The path is used as given.
pub fn report_link(report_path: &str) -> String {
    format!("{DOWNLOAD_ROUTE}{report_path}")
}

/// Absolute report URL under `base_url`.
pub fn report_url(base_url: &str, report_path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), report_link(report_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_link_is_plain_concatenation() {
        assert_eq!(report_link("r1.pdf"), "/download-report/r1.pdf");
        assert_eq!(
            report_link("reports/2024/a b.pdf"),
            "/download-report/reports/2024/a b.pdf"
        );
    }

    #[test]
    fn report_url_joins_base() {
        assert_eq!(
            report_url("http://localhost:8000/", "r1.pdf"),
            "http://localhost:8000/download-report/r1.pdf"
        );
        assert_eq!(
            report_url("http://host/api", "r1.pdf"),
            "http://host/api/download-report/r1.pdf"
        );
    }
}
