use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn key_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("{key:<11}"), Style::default().fg(Color::Magenta)),
        Span::raw(desc),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        key_line("q / Ctrl-C", "Quit"),
        key_line("Enter / s", "Summarize (ignored while running)"),
        key_line("m", "Cycle mode: extractive, abstractive, compare"),
        key_line("l", "Cycle length: short, medium, long"),
        key_line("+ / -", "More / fewer sentences"),
        key_line("paste", "Replace the document with pasted text"),
        key_line("o", "Reload --file"),
        key_line("S", "Load sample document"),
        key_line("d", "Save summary to summary.txt"),
        key_line("y", "Copy summary to clipboard"),
        key_line("e / x", "Export history as JSON / CSV"),
        key_line("tab", "Switch tabs"),
        key_line("?", "Show this help"),
        Line::from(""),
        Line::from("Summary tab:"),
        key_line("↑/↓ or j/k", "Scroll summary"),
        Line::from(""),
        Line::from("History tab:"),
        key_line("↑/↓ or j/k", "Navigate"),
        key_line("c", "Clear history"),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
