//! Application-level orchestration.
//!
//! The interactive controller drives a `Workflow` from UI commands; post-processing
//! turns a completed analysis into records, exports and a downloaded report. CLI and
//! TUI layers call into this module rather than talking to the workflow directly.

mod controller;
mod post_process;

pub(crate) use controller::{run_controller, UiCommand};
pub(crate) use post_process::{build_record, download_report, process_analysis_completion};
