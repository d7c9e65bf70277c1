//! Presentation model shared by the text summary, the TUI and the HTML export.
//!
//! `StatusBoard` holds what the user sees: one status line per phase, the analyze
//! trigger, and a result container that each completed analysis replaces whole.

use crate::engine::report_link;
use crate::model::{AnalysisReport, Phase, WorkflowEvent, WorkflowState};

#[derive(Debug, Clone, PartialEq)]
pub struct ResultView {
    pub message: String,
    pub report_link: String,
    pub search_results: String,
    pub html: String,
}

impl ResultView {
    pub fn from_report(report: &AnalysisReport) -> Self {
        Self {
            message: report.message.clone(),
            report_link: report_link(&report.report_path),
            search_results: pretty_json(&report.search_results),
            html: render_result_html(report),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusBoard {
    pub upload_status: String,
    pub analyze_status: String,
    pub analyze_enabled: bool,
    pub state: WorkflowState,
    pub result: Option<ResultView>,
    pub info: String,
}

impl StatusBoard {
    pub fn apply(&mut self, ev: &WorkflowEvent) {
        match ev {
            WorkflowEvent::StatusChanged { phase, text } => match phase {
                Phase::Upload => self.upload_status = text.clone(),
                Phase::Analysis => self.analyze_status = text.clone(),
            },
            WorkflowEvent::AnalyzeTrigger { enabled } => self.analyze_enabled = *enabled,
            WorkflowEvent::StateChanged { state } => self.state = *state,
            WorkflowEvent::AnalysisCompleted { result } => {
                self.result = Some(ResultView::from_report(&result.report));
            }
            WorkflowEvent::Info(info) => self.info = info.to_message(),
        }
    }

    pub fn status(&self, phase: Phase) -> &str {
        match phase {
            Phase::Upload => &self.upload_status,
            Phase::Analysis => &self.analyze_status,
        }
    }
}

/// Two-space indented JSON, the way the result container shows search results.
pub fn pretty_json(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Result container markup: message, report link (new browsing context), JSON dump.
pub fn render_result_html(report: &AnalysisReport) -> String {
    format!(
        concat!(
            "<h3>Analysis Results</h3>\n",
            "<p>{message}</p>\n",
            "<p>Report generated: <a href=\"{href}\" target=\"_blank\">Download Report (PDF)</a></p>\n",
            "<h4>Search Results:</h4>\n",
            "<pre>{json}</pre>\n"
        ),
        message = escape_text(&report.message),
        href = report_link(&report.report_path),
        json = escape_text(&pretty_json(&report.search_results)),
    )
}

/// Escape markup characters in element content. Quotes are left alone.
fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
