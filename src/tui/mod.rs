mod export;
mod help;
mod state;

use crate::cli::{build_config, Cli};
use crate::engine::{AnalysisBackend, HttpBackend};
use crate::model::{InfoEvent, Phase, WorkflowEvent, WorkflowState};
use crate::orchestrator::{self, UiCommand};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
    Terminal,
};
use state::{push_wrapped_status_kv, UiState};
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

const TAB_COUNT: usize = 2;
const HELP_TAB: usize = 1;

pub async fn run(args: Cli) -> Result<()> {
    let cfg = build_config(&args);
    let backend: Arc<dyn AnalysisBackend> = Arc::new(HttpBackend::new(&cfg)?);

    let (event_tx, event_rx) = mpsc::unbounded_channel::<WorkflowEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_args = args.clone();
    let ui_cfg = cfg.clone();
    let ui_handle =
        std::thread::spawn(move || run_threaded(ui_args, ui_cfg, event_rx, cmd_tx));

    let res = orchestrator::run_controller(&args, &cfg, backend, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
pub fn run_threaded(
    args: Cli,
    cfg: crate::model::WorkflowConfig,
    mut event_rx: UnboundedReceiver<WorkflowEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only.
    let mut state = UiState::new(cfg, args.file.as_deref());
    state.board.info = format!("Backend: {}", state.cfg.base_url);

    // A file given on the command line is uploaded right away.
    if let Some(path) = state.selected_path() {
        let _ = cmd_tx.send(UiCommand::Upload(Some(path)));
    }

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        while let Ok(ev) = event_rx.try_recv() {
            apply_event(&mut state, ev);
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key(&mut state, k, &cmd_tx) == KeyOutcome::Quit {
                    let _ = cmd_tx.send(UiCommand::Quit);
                    break Ok(());
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

#[derive(Debug, PartialEq, Eq)]
enum KeyOutcome {
    Continue,
    Quit,
}

fn handle_key(state: &mut UiState, k: KeyEvent, cmd_tx: &UnboundedSender<UiCommand>) -> KeyOutcome {
    if k.modifiers.contains(KeyModifiers::CONTROL) && k.code == KeyCode::Char('c') {
        return KeyOutcome::Quit;
    }

    if state.editing_path {
        match k.code {
            KeyCode::Enter => {
                state.editing_path = false;
                let _ = cmd_tx.send(UiCommand::Upload(state.selected_path()));
            }
            KeyCode::Esc => {
                state.editing_path = false;
                state.board.info = "Edit cancelled".into();
            }
            KeyCode::Backspace => {
                state.path_input.pop();
            }
            KeyCode::Char(c) => state.path_input.push(c),
            _ => {}
        }
        return KeyOutcome::Continue;
    }

    match k.code {
        KeyCode::Char('q') => return KeyOutcome::Quit,
        KeyCode::Char('e') => {
            state.tab = 0;
            state.editing_path = true;
            state.board.info = "Editing path: Enter to upload, Esc to cancel".into();
        }
        KeyCode::Char('u') => {
            let _ = cmd_tx.send(UiCommand::Upload(state.selected_path()));
        }
        KeyCode::Char('a') => {
            let _ = cmd_tx.send(UiCommand::Analyze);
        }
        KeyCode::Char('d') => {
            let _ = cmd_tx.send(UiCommand::DownloadReport);
        }
        KeyCode::Char('s') => export::save_and_show_path(state),
        KeyCode::Char('y') => export::copy_report_link(state),
        KeyCode::Down | KeyCode::Char('j') => state.scroll_results(true),
        KeyCode::Up | KeyCode::Char('k') => state.scroll_results(false),
        KeyCode::Tab => state.tab = (state.tab + 1) % TAB_COUNT,
        KeyCode::Char('?') => state.tab = HELP_TAB,
        _ => {}
    }
    KeyOutcome::Continue
}

fn apply_event(state: &mut UiState, ev: WorkflowEvent) {
    state.board.apply(&ev);
    match ev {
        WorkflowEvent::AnalysisCompleted { result } => {
            state.last_completed = Some(*result);
            state.results_scroll = 0;
        }
        WorkflowEvent::Info(InfoEvent::ReportSaved { path }) => {
            state.saved_report = Some(path);
        }
        _ => {}
    }
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let tabs = Tabs::new(vec![Line::from("Dashboard"), Line::from("Help")])
        .select(state.tab)
        .block(Block::default().borders(Borders::ALL).title("doc-analyzer"))
        .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.tab {
        0 => draw_dashboard(chunks[1], f, state),
        _ => help::draw_help(chunks[1], f),
    }
}

fn state_color(s: WorkflowState) -> Color {
    match s {
        WorkflowState::Idle => Color::Gray,
        WorkflowState::Uploaded => Color::Cyan,
        WorkflowState::Analyzing => Color::Yellow,
        WorkflowState::AnalysisComplete => Color::Green,
        WorkflowState::Error => Color::Red,
    }
}

fn draw_dashboard(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(5), // Upload + Analyze side by side
                Constraint::Min(0),    // Results
                Constraint::Length(3), // Info
            ]
            .as_ref(),
        )
        .split(area);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)].as_ref())
        .split(main[0]);

    draw_upload_panel(top[0], f, state);
    draw_analyze_panel(top[1], f, state);
    draw_results(main[1], f, state);

    let info = Paragraph::new(state.board.info.as_str())
        .block(Block::default().borders(Borders::ALL).title("Info"));
    f.render_widget(info, main[2]);
}

fn draw_upload_panel(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let path_style = if state.editing_path {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let cursor = if state.editing_path { "_" } else { "" };
    let shown_path = if state.path_input.is_empty() && !state.editing_path {
        "(press e to enter a path)".to_string()
    } else {
        format!("{}{cursor}", state.path_input)
    };

    let mut lines = vec![Line::from(vec![
        Span::styled("File:", Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(shown_path, path_style),
    ])];
    push_wrapped_status_kv(&mut lines, "Status", state.board.status(Phase::Upload), area.width);

    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Upload"));
    f.render_widget(p, area);
}

fn draw_analyze_panel(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let (trigger, trigger_style) = if state.board.analyze_enabled {
        ("enabled (a)", Style::default().fg(Color::Green))
    } else {
        ("disabled", Style::default().fg(Color::DarkGray))
    };

    let mut lines = vec![Line::from(vec![
        Span::styled("Analyze:", Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(trigger, trigger_style),
        Span::raw("  "),
        Span::styled(
            format!("{:?}", state.board.state),
            Style::default().fg(state_color(state.board.state)),
        ),
    ])];
    push_wrapped_status_kv(
        &mut lines,
        "Status",
        state.board.status(Phase::Analysis),
        area.width,
    );

    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Analyze"));
    f.render_widget(p, area);
}

fn draw_results(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Analysis Results (j/k scroll, d download, s save, y copy link)");

    let Some(result) = state.board.result.as_ref() else {
        let p = Paragraph::new("No analysis yet. Upload a document, then press a.").block(block);
        f.render_widget(p, area);
        return;
    };

    let mut lines = vec![
        Line::from(result.message.clone()),
        Line::from(vec![
            Span::styled("Report:", Style::default().fg(Color::Gray)),
            Span::raw(" "),
            Span::styled(result.report_link.clone(), Style::default().fg(Color::Cyan)),
        ]),
    ];
    if let Some(path) = state.saved_report.as_ref() {
        lines.push(Line::from(vec![
            Span::styled("Saved:", Style::default().fg(Color::Gray)),
            Span::raw(" "),
            Span::raw(path.display().to_string()),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Search Results:",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.extend(
        result
            .search_results
            .lines()
            .map(|l| Line::from(l.to_string())),
    );

    let p = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((state.results_scroll, 0));
    f.render_widget(p, area);
}
