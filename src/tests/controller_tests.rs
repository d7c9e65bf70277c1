use super::*;
use crate::error::WorkflowError;
use crate::model::{AnalysisReport, UploadReceipt};
use async_trait::async_trait;
use bytes::Bytes;
use clap::Parser;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};

/// Backend whose uploads wait for a permit, so tests can hold a request in flight.
struct GatedBackend {
    gate: Semaphore,
    uploads: AtomicUsize,
    analyses: AtomicUsize,
}

impl GatedBackend {
    fn open() -> Arc<Self> {
        Arc::new(Self {
            gate: Semaphore::new(Semaphore::MAX_PERMITS),
            uploads: AtomicUsize::new(0),
            analyses: AtomicUsize::new(0),
        })
    }

    fn closed() -> Arc<Self> {
        Arc::new(Self {
            gate: Semaphore::new(0),
            uploads: AtomicUsize::new(0),
            analyses: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl AnalysisBackend for GatedBackend {
    async fn upload(&self, file: &SelectedFile) -> Result<UploadReceipt, WorkflowError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| WorkflowError::transport(&e))?;
        Ok(UploadReceipt {
            message: format!("File '{}' uploaded", file.name),
        })
    }

    async fn analyze(
        &self,
        _file: &SelectedFile,
        _query: &str,
    ) -> Result<AnalysisReport, WorkflowError> {
        self.analyses.fetch_add(1, Ordering::SeqCst);
        Ok(AnalysisReport {
            message: "done".into(),
            report_path: "reports/r1.pdf".into(),
            search_results: serde_json::json!({"hits": 1}),
        })
    }

    async fn download_report(&self, _report_path: &str) -> Result<Bytes, WorkflowError> {
        Ok(Bytes::from_static(b"%PDF-1.4"))
    }
}

struct Harness {
    cmd_tx: UnboundedSender<UiCommand>,
    event_rx: UnboundedReceiver<WorkflowEvent>,
    handle: JoinHandle<Result<()>>,
}

fn start(args: Cli, backend: Arc<dyn AnalysisBackend>) -> Harness {
    let cfg = crate::cli::build_config(&args);
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let handle =
        tokio::spawn(async move { run_controller(&args, &cfg, backend, event_tx, cmd_rx).await });
    Harness {
        cmd_tx,
        event_rx,
        handle,
    }
}

impl Harness {
    fn send(&self, cmd: UiCommand) {
        self.cmd_tx.send(cmd).expect("controller alive");
    }

    async fn wait_for(&mut self, pred: impl Fn(&WorkflowEvent) -> bool) -> WorkflowEvent {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let ev = self.event_rx.recv().await.expect("event stream open");
                if pred(&ev) {
                    return ev;
                }
            }
        })
        .await
        .expect("event in time")
    }

    async fn quit(self) {
        self.send(UiCommand::Quit);
        let res = tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("controller stops")
            .expect("controller task");
        assert!(res.is_ok());
    }
}

fn status_is(phase: Phase, text: &str) -> impl Fn(&WorkflowEvent) -> bool + '_ {
    move |ev| matches!(ev, WorkflowEvent::StatusChanged { phase: p, text: t } if *p == phase && t == text)
}

fn cli(extra: &[&str]) -> Cli {
    let mut argv = vec!["doc-analyzer", "--base-url", "http://127.0.0.1:9"];
    argv.extend_from_slice(extra);
    Cli::parse_from(argv)
}

fn document() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("policy.pdf");
    std::fs::write(&path, b"%PDF-1.4 doc").expect("write");
    (dir, path)
}

#[tokio::test]
async fn upload_then_analyze_through_commands() {
    let backend = GatedBackend::open();
    let (_dir, path) = document();
    let mut h = start(cli(&[]), backend.clone());

    h.send(UiCommand::Upload(Some(path)));
    h.wait_for(status_is(Phase::Upload, "File 'policy.pdf' uploaded"))
        .await;
    h.send(UiCommand::Analyze);
    let ev = h
        .wait_for(|ev| matches!(ev, WorkflowEvent::AnalysisCompleted { .. }))
        .await;

    match ev {
        WorkflowEvent::AnalysisCompleted { result } => {
            assert_eq!(result.file_name, "policy.pdf");
            assert_eq!(result.report.report_path, "reports/r1.pdf");
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(backend.analyses.load(Ordering::SeqCst), 1);
    h.quit().await;
}

#[tokio::test]
async fn resubmission_while_in_flight_is_dropped() {
    let backend = GatedBackend::closed();
    let (_dir, path) = document();
    let mut h = start(cli(&[]), backend.clone());

    h.send(UiCommand::Upload(Some(path.clone())));
    h.wait_for(status_is(Phase::Upload, "Uploading...")).await;
    h.send(UiCommand::Upload(Some(path)));
    h.send(UiCommand::Analyze);
    h.wait_for(|ev| {
        matches!(ev, WorkflowEvent::Info(InfoEvent::Busy { activity }) if activity == "Upload")
    })
    .await;

    backend.gate.add_permits(1);
    h.wait_for(status_is(Phase::Upload, "File 'policy.pdf' uploaded"))
        .await;
    assert_eq!(backend.uploads.load(Ordering::SeqCst), 1);
    assert_eq!(backend.analyses.load(Ordering::SeqCst), 0);
    h.quit().await;
}

#[tokio::test]
async fn unreadable_path_never_reaches_backend() {
    let backend = GatedBackend::open();
    let dir = tempfile::tempdir().expect("tempdir");
    let mut h = start(cli(&[]), backend.clone());

    h.send(UiCommand::Upload(Some(dir.path().join("missing.pdf"))));
    let ev = h
        .wait_for(|ev| matches!(ev, WorkflowEvent::StatusChanged { .. }))
        .await;

    match ev {
        WorkflowEvent::StatusChanged { phase, text } => {
            assert_eq!(phase, Phase::Upload);
            assert!(text.starts_with("Cannot read "), "{text}");
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(backend.uploads.load(Ordering::SeqCst), 0);
    h.quit().await;
}

#[tokio::test]
async fn upload_without_path_asks_for_a_file() {
    let backend = GatedBackend::open();
    let mut h = start(cli(&[]), backend.clone());

    h.send(UiCommand::Upload(None));
    h.wait_for(status_is(Phase::Upload, "Please select a file to upload."))
        .await;
    h.send(UiCommand::Analyze);
    h.wait_for(status_is(Phase::Analysis, "Please upload a file first."))
        .await;
    assert_eq!(backend.uploads.load(Ordering::SeqCst), 0);
    h.quit().await;
}

#[tokio::test]
async fn download_before_analysis_reports_nothing_to_fetch() {
    let mut h = start(cli(&[]), GatedBackend::open());

    h.send(UiCommand::DownloadReport);
    h.wait_for(|ev| {
        matches!(ev, WorkflowEvent::Info(InfoEvent::Message(m)) if m == "No report to download yet.")
    })
    .await;
    h.quit().await;
}

#[tokio::test]
async fn completed_analysis_downloads_and_exports() {
    let (dir, path) = document();
    let reports = dir.path().join("reports");
    let export = dir.path().join("out").join("record.json");
    let args = cli(&[
        "--download-report",
        reports.to_str().expect("utf8 path"),
        "--export-json",
        export.to_str().expect("utf8 path"),
    ]);
    let mut h = start(args, GatedBackend::open());

    h.send(UiCommand::Upload(Some(path)));
    h.wait_for(status_is(Phase::Upload, "File 'policy.pdf' uploaded"))
        .await;
    h.send(UiCommand::Analyze);
    let ev = h
        .wait_for(|ev| matches!(ev, WorkflowEvent::Info(InfoEvent::ReportSaved { .. })))
        .await;

    if let WorkflowEvent::Info(InfoEvent::ReportSaved { path }) = ev {
        assert_eq!(path, reports.join("r1.pdf"));
        assert_eq!(std::fs::read(&path).expect("report"), b"%PDF-1.4");
    }
    let record: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&export).expect("export")).expect("json");
    assert_eq!(record["report_url"], "http://127.0.0.1:9/download-report/reports/r1.pdf");
    assert_eq!(record["file_name"], "policy.pdf");
    h.quit().await;
}

#[tokio::test]
async fn quit_aborts_in_flight_request() {
    let backend = GatedBackend::closed();
    let (_dir, path) = document();
    let mut h = start(cli(&[]), backend);

    h.send(UiCommand::Upload(Some(path)));
    h.wait_for(status_is(Phase::Upload, "Uploading...")).await;
    h.quit().await;
}
