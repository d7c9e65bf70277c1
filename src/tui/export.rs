use crate::engine;
use crate::orchestrator;
use crate::storage;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::mpsc as std_mpsc;
use std::sync::OnceLock;
use std::time::Duration;

use super::state::UiState;

// Global clipboard manager channel - initialized once on first use
static CLIPBOARD_SENDER: OnceLock<std_mpsc::Sender<String>> = OnceLock::new();

/// Export the last analysis record into the current directory.
/// Returns the absolute path of the exported file.
pub fn export_record_json(state: &UiState) -> Result<PathBuf> {
    let done = state
        .last_completed
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("no completed analysis"))?;
    let record = orchestrator::build_record(&state.cfg, done);

    let current_dir = std::env::current_dir().context("get current directory")?;
    let path = current_dir.join(storage::default_record_name(&record.timestamp_utc));
    storage::export_json(&path, &record)?;
    Ok(path)
}

/// Save the record and update state.info with the outcome.
pub fn save_and_show_path(state: &mut UiState) {
    if state.last_completed.is_none() {
        state.board.info = "No completed analysis to save yet.".into();
        return;
    }
    match export_record_json(state) {
        Ok(path) => {
            state.board.info = format!("Saved: {}", path.display());
            state.last_exported_path = Some(path);
        }
        Err(e) => {
            state.board.info = format!("Save failed: {e:#}");
        }
    }
}

/// Copy the absolute report URL of the last analysis.
pub fn copy_report_link(state: &mut UiState) {
    let Some(done) = state.last_completed.as_ref() else {
        state.board.info = "No report link to copy yet.".into();
        return;
    };
    let url = engine::report_url(&state.cfg.base_url, &done.report.report_path);
    state.board.info = match copy_to_clipboard(&url) {
        Ok(()) => format!("✓ Copied to clipboard: {url}"),
        Err(e) => format!("Clipboard copy failed: {e:#}"),
    };
}

/// Initialize the clipboard manager thread if not already initialized.
/// Operations run one after another, each clipboard instance kept alive long enough
/// for clipboard managers to read it.
fn init_clipboard_manager() -> Result<&'static std_mpsc::Sender<String>> {
    CLIPBOARD_SENDER.get_or_init(|| {
        let (tx, rx) = std_mpsc::channel::<String>();

        std::thread::spawn(move || {
            use arboard::Clipboard;

            for text in rx {
                if let Ok(mut clipboard) = Clipboard::new() {
                    if clipboard.set_text(&text).is_ok() {
                        // X11/Wayland serve the selection from this process; linger briefly.
                        std::thread::sleep(Duration::from_secs(2));
                    }
                }
            }
        });

        tx
    });

    CLIPBOARD_SENDER
        .get()
        .ok_or_else(|| anyhow::anyhow!("Failed to initialize clipboard manager"))
}

/// Queue `text` for the clipboard without blocking the UI thread.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let sender = init_clipboard_manager()?;
    sender
        .send(text.to_string())
        .map_err(|_| anyhow::anyhow!("Clipboard manager channel closed"))?;
    Ok(())
}
