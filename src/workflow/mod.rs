//! Upload-then-analyze state holder.
//!
//! `Workflow` owns the session's `WorkflowState`, the accepted `SelectedFile` and the
//! in-flight marker. Each phase is split into `begin_*` (guards, pending status) and
//! `finish_*` (apply the network result) so callers can suspend on the request in
//! between. Every visible change is published as a `WorkflowEvent`.

mod analysis;
mod upload;

pub use analysis::submit_analysis;
pub use upload::submit_upload;

use crate::error::WorkflowError;
use crate::model::{
    CompletedAnalysis, InfoEvent, Phase, SelectedFile, WorkflowEvent, WorkflowState,
};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

/// Inputs to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    UploadSucceeded,
    UploadFailed,
    AnalysisStarted,
    AnalysisSucceeded,
    AnalysisFailed,
    TaskLost,
}

impl WorkflowState {
    /// Next state after `transition`. Failures never move backwards past `Uploaded`.
    pub fn apply(self, transition: Transition) -> WorkflowState {
        use Transition as T;
        use WorkflowState as S;
        match (self, transition) {
            (_, T::UploadSucceeded) => S::Uploaded,
            (state, T::UploadFailed) => state,
            (_, T::AnalysisStarted) => S::Analyzing,
            (S::Analyzing, T::AnalysisSucceeded) => S::AnalysisComplete,
            (S::Analyzing, T::AnalysisFailed) => S::Uploaded,
            (_, T::TaskLost) => S::Error,
            (state, _) => state,
        }
    }
}

struct InFlight {
    phase: Phase,
    started: Instant,
}

pub struct Workflow {
    state: WorkflowState,
    selected: Option<SelectedFile>,
    in_flight: Option<InFlight>,
    upload_elapsed: Option<Duration>,
    last_completed: Option<CompletedAnalysis>,
    events: UnboundedSender<WorkflowEvent>,
}

impl Workflow {
    pub fn new(events: UnboundedSender<WorkflowEvent>) -> Self {
        Self {
            state: WorkflowState::Idle,
            selected: None,
            in_flight: None,
            upload_elapsed: None,
            last_completed: None,
            events,
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn selected(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn in_flight(&self) -> Option<Phase> {
        self.in_flight.as_ref().map(|f| f.phase)
    }

    /// The analyze trigger: an accepted file and nothing in flight.
    pub fn analyze_enabled(&self) -> bool {
        self.selected.is_some() && self.in_flight.is_none()
    }

    pub fn last_completed(&self) -> Option<&CompletedAnalysis> {
        self.last_completed.as_ref()
    }

    /// Put a failed attempt into the phase status line without touching state.
    pub fn surface(&self, phase: Phase, err: &WorkflowError) {
        if err.is_local() {
            debug!(%phase, error = %err, "rejected before sending");
        }
        match err {
            WorkflowError::Busy { phase } => self.emit(WorkflowEvent::Info(InfoEvent::Busy {
                activity: phase.to_string(),
            })),
            _ => self.set_status(phase, err.to_string()),
        }
    }

    /// The task running `phase` died without a result. Keeps the accepted file.
    pub fn abandon(&mut self, phase: Phase, reason: &str) {
        if self.in_flight() != Some(phase) {
            return;
        }
        warn!(%phase, reason, "request task lost");
        self.in_flight = None;
        self.transition(Transition::TaskLost);
        self.set_status(phase, format!("Error: {reason}"));
        self.publish_trigger();
    }

    fn guard_idle(&self) -> Result<(), WorkflowError> {
        match self.in_flight() {
            Some(phase) => Err(WorkflowError::Busy { phase }),
            None => Ok(()),
        }
    }

    fn start(&mut self, phase: Phase) {
        self.in_flight = Some(InFlight {
            phase,
            started: Instant::now(),
        });
        self.set_status(phase, phase.pending_status());
        self.publish_trigger();
    }

    /// Clear the in-flight marker, returning how long the request took.
    fn settle(&mut self) -> Duration {
        self.in_flight
            .take()
            .map(|f| f.started.elapsed())
            .unwrap_or_default()
    }

    fn transition(&mut self, transition: Transition) {
        let next = self.state.apply(transition);
        if next != self.state {
            self.state = next;
            self.emit(WorkflowEvent::StateChanged { state: next });
        }
    }

    fn set_status(&self, phase: Phase, text: impl Into<String>) {
        self.emit(WorkflowEvent::StatusChanged {
            phase,
            text: text.into(),
        });
    }

    fn publish_trigger(&self) {
        self.emit(WorkflowEvent::AnalyzeTrigger {
            enabled: self.analyze_enabled(),
        });
    }

    fn emit(&self, ev: WorkflowEvent) {
        // Receiver gone means the presentation layer shut down; nothing left to render.
        let _ = self.events.send(ev);
    }
}

#[cfg(test)]
#[path = "../tests/workflow_tests.rs"]
mod tests;
