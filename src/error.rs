use crate::model::Phase;
use thiserror::Error;

/// Shown when the upload is submitted without a file.
pub const NO_FILE_SELECTED: &str = "Please select a file to upload.";
/// Shown when analysis is requested before any upload was accepted.
pub const NO_FILE_UPLOADED: &str = "Please upload a file first.";
/// Fallback when the backend rejects a request without a usable `detail`.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Failure of a single upload/analyze/download attempt.
///
/// `Display` renders exactly the text placed in the phase status line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// Local precondition failed; no request was sent.
    #[error("{0}")]
    Validation(String),
    /// The backend answered with a non-2xx status.
    #[error("Error: {detail}")]
    Application { status: u16, detail: String },
    /// The request could not be sent, or its response could not be read.
    #[error("Error: {0}")]
    Transport(String),
    /// A request is already in flight.
    #[error("{phase} already in progress.")]
    Busy { phase: Phase },
}

impl WorkflowError {
    pub fn transport(err: &(dyn std::error::Error + 'static)) -> Self {
        WorkflowError::Transport(error_chain(err))
    }

    /// Whether the attempt reached the backend at all.
    pub fn is_local(&self) -> bool {
        matches!(self, WorkflowError::Validation(_) | WorkflowError::Busy { .. })
    }
}

/// Join an error with its sources, e.g. `error sending request: connection refused`.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !msg.contains(&text) {
            msg.push_str(": ");
            msg.push_str(&text);
        }
        source = cause.source();
    }
    msg
}
