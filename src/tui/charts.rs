use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use super::state::UiState;
use crate::views::ChartSeries;

const ORIGINAL_COLOR: Color = Color::Cyan;
const SUMMARY_COLOR: Color = Color::Green;

fn bar(label: &'static str, value: u64, color: Color) -> Bar<'static> {
    Bar::default()
        .label(Line::from(label))
        .value(value)
        .style(Style::default().fg(color))
}

/// Document analysis: words, sentences and paragraphs of the original.
fn draw_analysis(area: Rect, f: &mut Frame, charts: &ChartSeries) {
    let a = &charts.analysis;
    let bars = [
        bar("Words", a.words as u64, ORIGINAL_COLOR),
        bar("Sentences", a.sentences as u64, Color::Blue),
        bar("Paragraphs", a.paragraphs as u64, Color::Magenta),
    ];
    let bar_width = (area.width.saturating_sub(4) / 3).clamp(3, 12);
    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Document analysis"),
        )
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width)
        .bar_gap(1);
    f.render_widget(chart, area);
}

/// Original vs summary, one group per measure.
fn draw_comparison(area: Rect, f: &mut Frame, charts: &ChartSeries) {
    let (o, s) = (&charts.original, &charts.summary);
    let groups = [
        ("Words", o.words as u64, s.words as u64),
        ("Sentences", o.sentences as u64, s.sentences as u64),
        ("Minutes", o.minutes, s.minutes),
    ];

    let mut chart = BarChart::default()
        .block(
            Block::default().borders(Borders::ALL).title(Line::from(vec![
                Span::raw("Original "),
                Span::styled("■", Style::default().fg(ORIGINAL_COLOR)),
                Span::raw(" vs summary "),
                Span::styled("■", Style::default().fg(SUMMARY_COLOR)),
            ])),
        )
        .bar_width(((area.width.saturating_sub(8)) / 6).clamp(2, 8))
        .bar_gap(0)
        .group_gap(2);
    for (label, orig, summ) in groups {
        let bars = [
            Bar::default()
                .value(orig)
                .style(Style::default().fg(ORIGINAL_COLOR)),
            Bar::default()
                .value(summ)
                .style(Style::default().fg(SUMMARY_COLOR)),
        ];
        chart = chart.data(BarGroup::default().label(Line::from(label)).bars(&bars));
    }
    f.render_widget(chart, area);
}

/// The compression "donut": how much of the original the summary keeps.
fn draw_compression(area: Rect, f: &mut Frame, charts: &ChartSeries) {
    let c = charts.compression;
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Summary share"))
        .gauge_style(Style::default().fg(SUMMARY_COLOR).bg(Color::DarkGray))
        .percent(u16::from(c.summary_percent))
        .label(format!(
            "{}% kept / {}% removed",
            c.summary_percent, c.removed_percent
        ));
    f.render_widget(gauge, area);
}

fn draw_top_terms(area: Rect, f: &mut Frame, state: &UiState) {
    let block = Block::default().borders(Borders::ALL).title("Top terms");
    if state.snapshot.top_terms.is_empty() {
        f.render_widget(
            Paragraph::new("No terms yet").style(Style::default().fg(Color::Gray)).block(block),
            area,
        );
        return;
    }
    let bars: Vec<Bar> = state
        .snapshot
        .top_terms
        .iter()
        .map(|(word, n)| {
            Bar::default()
                .label(Line::from(word.clone()))
                .value(*n as u64)
                .style(Style::default().fg(Color::Yellow))
        })
        .collect();
    let chart = BarChart::default()
        .block(block)
        .direction(Direction::Horizontal)
        .data(BarGroup::default().bars(&bars))
        .bar_width(1)
        .bar_gap(0);
    f.render_widget(chart, area);
}

fn draw_analytics(area: Rect, f: &mut Frame, state: &UiState) {
    let stats = &state.snapshot.original_stats;
    let label = Style::default().fg(Color::Gray);
    let value = Style::default().add_modifier(Modifier::BOLD);
    let wordcloud = match &state.wordcloud {
        Some(p) => Span::styled(p.display().to_string(), Style::default().fg(Color::Cyan)),
        None => Span::styled("not rendered", label),
    };
    let lines = vec![
        Line::from(vec![
            Span::styled("Characters: ", label),
            Span::styled(stats.characters.to_string(), value),
        ]),
        Line::from(vec![
            Span::styled("Avg sentence: ", label),
            Span::styled(format!("{:.1} words", stats.avg_sentence_length), value),
        ]),
        Line::from(vec![
            Span::styled("Reading time: ", label),
            Span::styled(format!("{} min", stats.reading_minutes), value),
        ]),
        Line::from(vec![Span::styled("Word cloud: ", label), wordcloud]),
    ];
    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Text analytics"));
    f.render_widget(p, area);
}

pub fn draw_visuals(area: Rect, f: &mut Frame, state: &UiState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(50),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[0]);
    draw_analysis(top[0], f, &state.snapshot.charts);
    draw_comparison(top[1], f, &state.snapshot.charts);

    draw_compression(rows[1], f, &state.snapshot.charts);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[2]);
    draw_top_terms(bottom[0], f, state);
    draw_analytics(bottom[1], f, state);
}
