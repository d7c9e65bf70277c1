use crate::error::WorkflowError;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    pub base_url: String,
    pub user_agent: String,
    /// No bound when unset; a stalled request keeps its phase status.
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Upload,
    Analysis,
}

impl Phase {
    /// Status text while a request for this phase is in flight.
    pub fn pending_status(self) -> &'static str {
        match self {
            Phase::Upload => "Uploading...",
            Phase::Analysis => "Analyzing document...",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Upload => f.write_str("Upload"),
            Phase::Analysis => f.write_str("Analysis"),
        }
    }
}

/// Which phase most recently succeeded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowState {
    #[default]
    Idle,
    Uploaded,
    Analyzing,
    AnalysisComplete,
    /// A request task was lost before it could report back.
    Error,
}

/// A file chosen by the user, carried from a successful upload into analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub bytes: Bytes,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// MIME type guessed from the file extension.
    pub fn mime_type(&self) -> &'static str {
        let ext = self
            .name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => "application/pdf",
            "txt" => "text/plain",
            "md" => "text/markdown",
            "json" => "application/json",
            "csv" => "text/csv",
            "html" | "htm" => "text/html",
            "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            _ => "application/octet-stream",
        }
    }
}

/// Accepted upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub message: String,
}

/// Successful analysis reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub message: String,
    pub report_path: String,
    pub search_results: serde_json::Value,
}

pub type UploadOutcome = Result<UploadReceipt, WorkflowError>;
pub type AnalysisOutcome = Result<AnalysisReport, WorkflowError>;

/// An analysis together with what produced it, kept for download and export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedAnalysis {
    pub file_name: String,
    pub report: AnalysisReport,
    #[serde(default, with = "humantime_serde")]
    pub upload_elapsed: Option<Duration>,
    #[serde(with = "humantime_serde")]
    pub analysis_elapsed: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WorkflowEvent {
    /// Replace the status line of a phase.
    StatusChanged {
        phase: Phase,
        text: String,
    },
    AnalyzeTrigger {
        enabled: bool,
    },
    StateChanged {
        state: WorkflowState,
    },
    AnalysisCompleted {
        result: Box<CompletedAnalysis>,
    },
    Info(InfoEvent),
}

/// Structured info events for UI/CLI layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InfoEvent {
    Message(String),
    RequestSent { phase: Phase, file_name: String, bytes: usize },
    Busy { activity: String },
    ReportSaved { path: PathBuf },
}

impl InfoEvent {
    /// Render a human-readable message for UI/CLI layers.
    pub fn to_message(&self) -> String {
        match self {
            InfoEvent::Message(msg) => msg.clone(),
            InfoEvent::RequestSent {
                phase,
                file_name,
                bytes,
            } => format!("{phase}: sent {file_name} ({bytes} bytes)"),
            InfoEvent::Busy { activity } => {
                format!("{activity} already in progress, ignoring request")
            }
            InfoEvent::ReportSaved { path } => format!("Saved report: {}", path.display()),
        }
    }
}

/// Exported form of a completed analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub timestamp_utc: String,
    pub base_url: String,
    pub file_name: String,
    pub message: String,
    pub report_path: String,
    pub report_url: String,
    pub search_results: serde_json::Value,
    #[serde(default, with = "humantime_serde")]
    pub upload_elapsed: Option<Duration>,
    #[serde(with = "humantime_serde")]
    pub analysis_elapsed: Duration,
}

/// What a one-shot run did, printed in JSON mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub state: WorkflowState,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub upload_message: Option<String>,
    #[serde(default)]
    pub analysis: Option<AnalysisRecord>,
    #[serde(default)]
    pub saved_report: Option<PathBuf>,
}
