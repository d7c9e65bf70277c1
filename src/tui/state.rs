use crate::model::{CompletedAnalysis, WorkflowConfig};
use crate::view::StatusBoard;
use ratatui::{
    style::Color,
    style::Style,
    text::{Line, Span},
};
use std::path::PathBuf;

pub struct UiState {
    pub tab: usize,
    pub cfg: WorkflowConfig,
    /// Status lines, trigger and result container, driven by workflow events.
    pub board: StatusBoard,

    // Upload panel path input
    pub path_input: String,
    pub editing_path: bool,

    pub results_scroll: u16,
    pub last_completed: Option<CompletedAnalysis>,
    pub saved_report: Option<PathBuf>,
    pub last_exported_path: Option<PathBuf>,
}

impl UiState {
    pub fn new(cfg: WorkflowConfig, initial_path: Option<&std::path::Path>) -> Self {
        Self {
            tab: 0,
            cfg,
            board: StatusBoard::default(),
            path_input: initial_path
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            editing_path: false,
            results_scroll: 0,
            last_completed: None,
            saved_report: None,
            last_exported_path: None,
        }
    }

    /// The typed path, or `None` when nothing was entered.
    pub fn selected_path(&self) -> Option<PathBuf> {
        let trimmed = self.path_input.trim();
        (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
    }

    pub fn scroll_results(&mut self, down: bool) {
        self.results_scroll = if down {
            self.results_scroll.saturating_add(1)
        } else {
            self.results_scroll.saturating_sub(1)
        };
    }
}

pub fn push_wrapped_status_kv(
    out: &mut Vec<Line<'static>>,
    label: &str,
    value: &str,
    status_area_width: u16,
) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }

    // Borders take two columns on each side.
    let usable_width = status_area_width.saturating_sub(4).max(1);
    let label_text = format!("{label}:");
    let label_width = label_text.chars().count() as u16;

    let value_chars: Vec<char> = value.chars().collect();
    let mut remaining = value_chars.as_slice();
    let mut first = true;

    while !remaining.is_empty() {
        let line_width = if first {
            usable_width.saturating_sub(label_width + 1).max(1)
        } else {
            usable_width.saturating_sub(2).max(1)
        };

        let chars_to_take = (remaining.len() as u16).min(line_width) as usize;
        let (line_chars, rest) = remaining.split_at(chars_to_take);
        let line_text: String = line_chars.iter().collect();

        if first {
            out.push(Line::from(vec![
                Span::styled(label_text.clone(), Style::default().fg(Color::Gray)),
                Span::raw(" "),
                Span::raw(line_text),
            ]));
            first = false;
        } else {
            out.push(Line::from(vec![Span::raw("  "), Span::raw(line_text)]));
        }

        remaining = rest;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> WorkflowConfig {
        WorkflowConfig {
            base_url: "http://localhost:8000".into(),
            user_agent: "test".into(),
            timeout: None,
        }
    }

    #[test]
    fn blank_path_input_selects_nothing() {
        let mut state = UiState::new(cfg(), None);
        assert_eq!(state.selected_path(), None);
        state.path_input = "  ./doc.pdf ".into();
        assert_eq!(state.selected_path(), Some(PathBuf::from("./doc.pdf")));
    }

    #[test]
    fn long_values_wrap_with_indent() {
        let mut out = Vec::new();
        push_wrapped_status_kv(&mut out, "Status", "abcdefghij", 14);
        // 10 usable columns: 2 after "Status: ", then 8 per indented line.
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].spans[2].content, "ab");
        assert_eq!(out[1].spans[1].content, "cdefghij");
    }
}
