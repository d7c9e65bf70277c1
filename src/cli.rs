use crate::engine::HttpBackend;
use crate::model::{Phase, RunSummary, WorkflowConfig, WorkflowEvent, WorkflowState};
use crate::orchestrator;
use crate::storage;
use crate::workflow::{submit_analysis, submit_upload, Workflow};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let mut out = std::io::LineWriter::new(std::io::stdout().lock());
        let mut err = std::io::LineWriter::new(std::io::stderr().lock());

        while let Some(line) = rx.blocking_recv() {
            let _ = match line {
                OutputLine::Stdout(msg) => writeln!(out, "{msg}"),
                OutputLine::Stderr(msg) => writeln!(err, "{msg}"),
            };
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "doc-analyzer",
    version,
    about = "Upload a document to a document-analysis service and fetch its report, with optional TUI"
)]
pub struct Cli {
    /// Document to upload
    pub file: Option<PathBuf>,

    /// Base URL of the analysis service
    #[arg(long, env = "DOC_ANALYZER_URL", default_value = "http://127.0.0.1:8000")]
    pub base_url: String,

    /// Run the analysis after a successful upload (text/json modes)
    #[arg(long)]
    pub analyze: bool,

    /// Print JSON result and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Print text summary and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Run silently: suppress all output except errors (for scripts)
    #[arg(long)]
    pub silent: bool,

    /// Per-request timeout; requests wait indefinitely when unset
    #[arg(long)]
    pub timeout: Option<humantime::Duration>,

    /// Export the analysis record as JSON
    #[arg(long)]
    pub export_json: Option<PathBuf>,

    /// Export the rendered result fragment as HTML
    #[arg(long)]
    pub export_html: Option<PathBuf>,

    /// Directory to save the report PDF into once analysis completes
    #[arg(long)]
    pub download_report: Option<PathBuf>,

    /// Log filter for text/json modes (e.g. debug, doc_analyzer=trace)
    #[arg(long, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    pub fn is_non_tui(&self) -> bool {
        self.silent || self.json || self.text
    }
}

pub async fn run(args: Cli) -> Result<()> {
    // Validate that --silent can only be used with --json
    if args.silent && !args.json {
        return Err(anyhow::anyhow!(
            "--silent can only be used with --json. Use --silent --json together."
        ));
    }

    if !args.is_non_tui() {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_once(args).await;
        }
    }

    run_once(args).await
}

/// Build a `WorkflowConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> WorkflowConfig {
    WorkflowConfig {
        base_url: args.base_url.clone(),
        user_agent: format!("doc-analyzer-cli/{}", env!("CARGO_PKG_VERSION")),
        timeout: args.timeout.map(Duration::from),
    }
}

/// What the request task hands back to the printing side.
struct Finished {
    state: WorkflowState,
    file_name: Option<String>,
    upload_message: String,
    completed: Option<crate::model::CompletedAnalysis>,
}

/// Run the phases in order, stopping at the first failure.
async fn drive_workflow(
    backend: HttpBackend,
    file_path: Option<PathBuf>,
    analyze: bool,
    evt_tx: mpsc::UnboundedSender<WorkflowEvent>,
) -> Result<Finished> {
    let mut workflow = Workflow::new(evt_tx);
    let file = match file_path.as_deref() {
        Some(p) => match storage::read_selected_file(p).await {
            Ok(f) => Some(f),
            Err(e) => {
                workflow.surface(Phase::Upload, &e);
                return Err(e).context("upload failed");
            }
        },
        None => None,
    };
    let receipt = submit_upload(&mut workflow, &backend, file)
        .await
        .context("upload failed")?;
    if analyze {
        submit_analysis(&mut workflow, &backend)
            .await
            .context("analysis failed")?;
    }
    Ok(Finished {
        state: workflow.state(),
        file_name: workflow.selected().map(|f| f.name.clone()),
        upload_message: receipt.message,
        completed: workflow.last_completed().cloned(),
    })
}

/// Upload (and optionally analyze) once, print the outcome and exit.
async fn run_once(args: Cli) -> Result<()> {
    let cfg = build_config(&args);
    let backend = HttpBackend::new(&cfg)?;
    let (out_tx, out_handle) = spawn_output_writer();
    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel::<WorkflowEvent>();

    let handle = tokio::spawn(drive_workflow(
        backend.clone(),
        args.file.clone(),
        args.analyze,
        evt_tx,
    ));

    // Only text mode prints progress.
    while let Some(ev) = evt_rx.recv().await {
        if !args.text {
            continue;
        }
        match ev {
            WorkflowEvent::StatusChanged { phase, text } => {
                let _ = out_tx.send(OutputLine::Stderr(format!("[{phase}] {text}")));
            }
            WorkflowEvent::Info(info) => {
                let _ = out_tx.send(OutputLine::Stderr(info.to_message()));
            }
            WorkflowEvent::StateChanged { .. }
            | WorkflowEvent::AnalyzeTrigger { .. }
            | WorkflowEvent::AnalysisCompleted { .. } => {}
        }
    }

    let finished = handle.await.context("request task failed")??;

    let mut analysis = None;
    let mut saved_report = None;
    if let Some(done) = finished.completed.as_ref() {
        let processed = orchestrator::process_analysis_completion(&args, &cfg, done);
        for msg in processed.export_messages {
            if !args.silent {
                let _ = out_tx.send(OutputLine::Stderr(msg));
            }
        }
        if let Some(dir) = args.download_report.as_deref() {
            let path =
                orchestrator::download_report(&backend, dir, &done.report.report_path).await?;
            saved_report = Some(path);
        }
        analysis = Some(processed.record);
    }

    let summary = RunSummary {
        state: finished.state,
        file_name: finished.file_name,
        upload_message: Some(finished.upload_message),
        analysis,
        saved_report,
    };

    if args.json {
        if !args.silent {
            let out = serde_json::to_string_pretty(&summary)?;
            let _ = out_tx.send(OutputLine::Stdout(out));
        }
    } else {
        for line in crate::text_summary::build_text_summary(&summary).lines {
            let _ = out_tx.send(OutputLine::Stdout(line));
        }
    }

    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}
