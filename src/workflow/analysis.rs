use super::{Transition, Workflow};
use crate::engine::{AnalysisBackend, ANALYSIS_QUERY};
use crate::error::{WorkflowError, NO_FILE_UPLOADED};
use crate::model::{
    AnalysisOutcome, CompletedAnalysis, InfoEvent, Phase, SelectedFile, WorkflowEvent,
};
use tracing::{debug, info, warn};

impl Workflow {
    /// Check that an upload was accepted and mark analysis in flight.
    ///
    /// Reads the retained file only; a path the user typed since does not count.
    pub fn begin_analysis(&mut self) -> Result<SelectedFile, WorkflowError> {
        let checked = self.guard_idle().and_then(|()| {
            self.selected
                .clone()
                .ok_or_else(|| WorkflowError::Validation(NO_FILE_UPLOADED.into()))
        });
        let file = match checked {
            Ok(file) => file,
            Err(e) => {
                self.surface(Phase::Analysis, &e);
                return Err(e);
            }
        };

        debug!(file = %file.name, "analysis started");
        self.transition(Transition::AnalysisStarted);
        self.start(Phase::Analysis);
        self.emit(WorkflowEvent::Info(InfoEvent::RequestSent {
            phase: Phase::Analysis,
            file_name: file.name.clone(),
            bytes: file.len(),
        }));
        Ok(file)
    }

    /// Apply the analysis response. A failure returns to `Uploaded` and keeps the file.
    pub fn finish_analysis(&mut self, outcome: AnalysisOutcome) -> AnalysisOutcome {
        let elapsed = self.settle();
        match &outcome {
            Ok(report) => {
                info!(report_path = %report.report_path, ?elapsed, "analysis complete");
                let completed = CompletedAnalysis {
                    file_name: self
                        .selected
                        .as_ref()
                        .map(|f| f.name.clone())
                        .unwrap_or_default(),
                    report: report.clone(),
                    upload_elapsed: self.upload_elapsed,
                    analysis_elapsed: elapsed,
                };
                self.transition(Transition::AnalysisSucceeded);
                self.set_status(Phase::Analysis, report.message.clone());
                self.emit(WorkflowEvent::AnalysisCompleted {
                    result: Box::new(completed.clone()),
                });
                self.last_completed = Some(completed);
            }
            Err(e) => {
                warn!(error = %e, "analysis failed");
                self.transition(Transition::AnalysisFailed);
                self.surface(Phase::Analysis, e);
            }
        }
        self.publish_trigger();
        outcome
    }
}

/// Analyze the previously accepted file with the fixed query.
pub async fn submit_analysis(
    workflow: &mut Workflow,
    backend: &dyn AnalysisBackend,
) -> AnalysisOutcome {
    let file = workflow.begin_analysis()?;
    let outcome = backend.analyze(&file, ANALYSIS_QUERY).await;
    workflow.finish_analysis(outcome)
}
