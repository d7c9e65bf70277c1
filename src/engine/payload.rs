//! Reply decoding at the HTTP boundary.
//!
//! Bodies are parsed as JSON before the status is inspected, so an unreadable
//! error page is a transport failure rather than an application one.

use crate::error::{WorkflowError, UNKNOWN_ERROR};
use crate::model::{AnalysisReport, UploadReceipt};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct UploadReply {
    message: String,
}

#[derive(Debug, Deserialize)]
struct AnalyzeReply {
    message: String,
    report_path: String,
    #[serde(default)]
    search_results: Value,
}

pub(crate) fn decode_upload(status: StatusCode, body: &[u8]) -> Result<UploadReceipt, WorkflowError> {
    let reply: UploadReply = decode_reply(status, body)?;
    Ok(UploadReceipt {
        message: reply.message,
    })
}

pub(crate) fn decode_analysis(
    status: StatusCode,
    body: &[u8],
) -> Result<AnalysisReport, WorkflowError> {
    let reply: AnalyzeReply = decode_reply(status, body)?;
    Ok(AnalysisReport {
        message: reply.message,
        report_path: reply.report_path,
        search_results: reply.search_results,
    })
}

/// Error for a non-2xx download; the body is a report, so JSON is optional here.
pub(crate) fn download_error(status: StatusCode, body: &[u8]) -> WorkflowError {
    let detail = serde_json::from_slice::<Value>(body)
        .map(|v| detail_of(&v))
        .unwrap_or_else(|_| UNKNOWN_ERROR.to_string());
    WorkflowError::Application {
        status: status.as_u16(),
        detail,
    }
}

fn decode_reply<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<T, WorkflowError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| WorkflowError::Transport(format!("invalid JSON in response: {e}")))?;

    if !status.is_success() {
        return Err(WorkflowError::Application {
            status: status.as_u16(),
            detail: detail_of(&value),
        });
    }

    serde_json::from_value(value)
        .map_err(|e| WorkflowError::Transport(format!("unexpected response shape: {e}")))
}

/// The `detail` of an error body. Empty or missing details fall back to a fixed text;
/// structured ones (validation error lists) are shown as compact JSON.
fn detail_of(body: &Value) -> String {
    match body.get("detail") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        None | Some(Value::Null) | Some(Value::String(_)) | Some(Value::Bool(false)) => {
            UNKNOWN_ERROR.to_string()
        }
        Some(other) => other.to_string(),
    }
}
