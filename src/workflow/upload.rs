use super::{Transition, Workflow};
use crate::engine::AnalysisBackend;
use crate::error::{WorkflowError, NO_FILE_SELECTED};
use crate::model::{InfoEvent, Phase, SelectedFile, UploadOutcome, WorkflowEvent};
use tracing::{debug, info, warn};

impl Workflow {
    /// Validate an upload submission and mark it in flight.
    ///
    /// Returns the file to send. On error nothing is sent and the status line
    /// already shows the reason.
    pub fn begin_upload(
        &mut self,
        file: Option<SelectedFile>,
    ) -> Result<SelectedFile, WorkflowError> {
        let checked = self.guard_idle().and_then(|()| {
            file.ok_or_else(|| WorkflowError::Validation(NO_FILE_SELECTED.into()))
        });
        let file = match checked {
            Ok(file) => file,
            Err(e) => {
                self.surface(Phase::Upload, &e);
                return Err(e);
            }
        };

        debug!(file = %file.name, bytes = file.len(), "upload started");
        self.start(Phase::Upload);
        self.emit(WorkflowEvent::Info(InfoEvent::RequestSent {
            phase: Phase::Upload,
            file_name: file.name.clone(),
            bytes: file.len(),
        }));
        Ok(file)
    }

    /// Apply the upload response. Only an accepted upload replaces the selected file.
    pub fn finish_upload(&mut self, file: SelectedFile, outcome: UploadOutcome) -> UploadOutcome {
        let elapsed = self.settle();
        match &outcome {
            Ok(receipt) => {
                info!(file = %file.name, ?elapsed, "upload accepted");
                self.selected = Some(file);
                self.upload_elapsed = Some(elapsed);
                self.transition(Transition::UploadSucceeded);
                self.set_status(Phase::Upload, receipt.message.clone());
            }
            Err(e) => {
                warn!(file = %file.name, error = %e, "upload failed");
                self.transition(Transition::UploadFailed);
                self.surface(Phase::Upload, e);
            }
        }
        self.publish_trigger();
        outcome
    }
}

/// Upload `file` and wait for the backend's answer.
pub async fn submit_upload(
    workflow: &mut Workflow,
    backend: &dyn AnalysisBackend,
    file: Option<SelectedFile>,
) -> UploadOutcome {
    let file = workflow.begin_upload(file)?;
    let outcome = backend.upload(&file).await;
    workflow.finish_upload(file, outcome)
}
