use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn keybind(key: &'static str, pad: usize, what: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(key, Style::default().fg(Color::Magenta)),
        Span::raw(" ".repeat(pad)),
        Span::raw(what),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("q", Style::default().fg(Color::Magenta)),
            Span::raw(" / "),
            Span::styled("Ctrl-C", Style::default().fg(Color::Magenta)),
            Span::raw("  Quit"),
        ]),
        keybind("e", 11, "Edit file path (Enter uploads, Esc cancels)"),
        keybind("u", 11, "Upload the file path"),
        keybind("a", 11, "Analyze the uploaded file"),
        keybind("d", 11, "Download report PDF"),
        keybind("s", 11, "Save analysis record as JSON"),
        keybind("y", 11, "Copy report link to clipboard"),
        keybind("j/k", 9, "Scroll results"),
        keybind("tab", 9, "Switch tabs"),
        keybind("?", 11, "Show this help"),
        Line::from(""),
        Line::from("Workflow:"),
        Line::from("  Upload a document first; analysis runs on the last accepted upload."),
        Line::from("  Only one request runs at a time; keys pressed meanwhile are ignored."),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
