//! Interactive workflow controller.
//!
//! Owns the `Workflow` for the session, turns UI commands into requests and applies
//! their results. At most one request task exists at a time.

use crate::cli::Cli;
use crate::engine::AnalysisBackend;
use crate::model::{
    AnalysisOutcome, InfoEvent, Phase, SelectedFile, UploadOutcome, WorkflowConfig,
    WorkflowEvent,
};
use crate::orchestrator::post_process;
use crate::storage;
use crate::workflow::Workflow;
use anyhow::Result;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::debug;

/// Commands emitted by UI layers.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    /// Upload the file at the given path; `None` when no file was chosen.
    Upload(Option<PathBuf>),
    Analyze,
    DownloadReport,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskKind {
    Upload,
    Analysis,
    Download,
}

impl TaskKind {
    fn label(self) -> &'static str {
        match self {
            TaskKind::Upload => "Upload",
            TaskKind::Analysis => "Analysis",
            TaskKind::Download => "Download",
        }
    }

    fn phase(self) -> Option<Phase> {
        match self {
            TaskKind::Upload => Some(Phase::Upload),
            TaskKind::Analysis => Some(Phase::Analysis),
            TaskKind::Download => None,
        }
    }
}

enum TaskOutput {
    Upload {
        file: SelectedFile,
        outcome: UploadOutcome,
    },
    Analysis {
        outcome: AnalysisOutcome,
    },
    Download {
        result: Result<PathBuf>,
    },
}

/// The single in-flight request.
struct PendingTask {
    kind: TaskKind,
    handle: JoinHandle<TaskOutput>,
}

impl PendingTask {
    fn spawn<F>(kind: TaskKind, fut: F) -> Self
    where
        F: Future<Output = TaskOutput> + Send + 'static,
    {
        Self {
            kind,
            handle: tokio::spawn(fut),
        }
    }
}

fn emit_info(event_tx: &UnboundedSender<WorkflowEvent>, ev: InfoEvent) {
    let _ = event_tx.send(WorkflowEvent::Info(ev));
}

async fn start_upload(
    workflow: &mut Workflow,
    backend: &Arc<dyn AnalysisBackend>,
    path: Option<PathBuf>,
) -> Option<PendingTask> {
    let file = match path {
        Some(p) => match storage::read_selected_file(&p).await {
            Ok(f) => Some(f),
            Err(e) => {
                workflow.surface(Phase::Upload, &e);
                return None;
            }
        },
        None => None,
    };
    let file = workflow.begin_upload(file).ok()?;
    let backend = backend.clone();
    Some(PendingTask::spawn(TaskKind::Upload, async move {
        let outcome = backend.upload(&file).await;
        TaskOutput::Upload { file, outcome }
    }))
}

fn start_analysis(
    workflow: &mut Workflow,
    backend: &Arc<dyn AnalysisBackend>,
) -> Option<PendingTask> {
    let file = workflow.begin_analysis().ok()?;
    let backend = backend.clone();
    Some(PendingTask::spawn(TaskKind::Analysis, async move {
        let outcome = backend
            .analyze(&file, crate::engine::ANALYSIS_QUERY)
            .await;
        TaskOutput::Analysis { outcome }
    }))
}

fn start_download(
    args: &Cli,
    workflow: &Workflow,
    backend: &Arc<dyn AnalysisBackend>,
    event_tx: &UnboundedSender<WorkflowEvent>,
) -> Option<PendingTask> {
    let Some(done) = workflow.last_completed() else {
        emit_info(
            event_tx,
            InfoEvent::Message("No report to download yet.".into()),
        );
        return None;
    };
    let report_path = done.report.report_path.clone();
    let dir = args
        .download_report
        .clone()
        .unwrap_or_else(storage::default_report_dir);
    emit_info(
        event_tx,
        InfoEvent::Message(format!("Downloading report {report_path}…")),
    );
    let backend = backend.clone();
    Some(PendingTask::spawn(TaskKind::Download, async move {
        let result = post_process::download_report(backend.as_ref(), &dir, &report_path).await;
        TaskOutput::Download { result }
    }))
}

/// Drive the workflow from UI commands until quit, emitting events for presentation layers.
pub(crate) async fn run_controller(
    args: &Cli,
    cfg: &WorkflowConfig,
    backend: Arc<dyn AnalysisBackend>,
    event_tx: UnboundedSender<WorkflowEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut workflow = Workflow::new(event_tx.clone());
    let mut pending: Option<PendingTask> = None;

    let res = loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                let cmd = match cmd {
                    Some(UiCommand::Quit) | None => {
                        if let Some(task) = pending.take() {
                            debug!(kind = task.kind.label(), "aborting in-flight request");
                            task.handle.abort();
                        }
                        break Ok(());
                    }
                    Some(cmd) => cmd,
                };
                // One request at a time: later submissions are dropped, not queued.
                if let Some(task) = &pending {
                    emit_info(&event_tx, InfoEvent::Busy { activity: task.kind.label().to_string() });
                } else {
                    pending = match cmd {
                        UiCommand::Upload(path) => start_upload(&mut workflow, &backend, path).await,
                        UiCommand::Analyze => start_analysis(&mut workflow, &backend),
                        UiCommand::DownloadReport => start_download(args, &workflow, &backend, &event_tx),
                        UiCommand::Quit => None,
                    };
                }
            }
            // Do not take the task before this branch wins; otherwise its handle is
            // dropped when another branch is chosen and the result is never applied.
            maybe_done = async {
                if let Some(task) = &mut pending {
                    return Some((&mut task.handle).await);
                }
                futures::future::pending().await
            } => {
                if let Some(join_res) = maybe_done {
                    let kind = pending.take().map(|t| t.kind);
                    match join_res {
                        Ok(TaskOutput::Upload { file, outcome }) => {
                            let _ = workflow.finish_upload(file, outcome);
                        }
                        Ok(TaskOutput::Analysis { outcome }) => {
                            if workflow.finish_analysis(outcome).is_ok() {
                                if let Some(done) = workflow.last_completed() {
                                    let processed =
                                        post_process::process_analysis_completion(args, cfg, done);
                                    for msg in processed.export_messages {
                                        emit_info(&event_tx, InfoEvent::Message(msg));
                                    }
                                }
                                if args.download_report.is_some() {
                                    pending = start_download(args, &workflow, &backend, &event_tx);
                                }
                            }
                        }
                        Ok(TaskOutput::Download { result }) => match result {
                            Ok(path) => emit_info(&event_tx, InfoEvent::ReportSaved { path }),
                            Err(e) => emit_info(
                                &event_tx,
                                InfoEvent::Message(format!("Download failed: {e:#}")),
                            ),
                        },
                        Err(e) => match kind.and_then(TaskKind::phase) {
                            Some(phase) => {
                                workflow.abandon(phase, &format!("request task failed: {e}"))
                            }
                            None => emit_info(
                                &event_tx,
                                InfoEvent::Message(format!("Download task failed: {e}")),
                            ),
                        },
                    }
                }
            }
        }
    };

    res
}

#[cfg(test)]
#[path = "../tests/controller_tests.rs"]
mod tests;
