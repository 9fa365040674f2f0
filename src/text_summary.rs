//! Text report builder for CLI output.
//!
//! This module formats a finished run and the history log as human-readable lines.

use crate::model::Mode;
use crate::storage::HistoryRow;
use crate::views::ViewSnapshot;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Build the report for a completed run.
pub(crate) fn build_text_summary(snapshot: &ViewSnapshot, mode: Mode) -> TextSummary {
    let mut lines = Vec::new();
    let kpis = &snapshot.kpis;
    let charts = &snapshot.charts;
    let stats = &snapshot.original_stats;

    lines.push(format!("Source: {}", snapshot.source));
    lines.push(String::new());

    if mode == Mode::Compare {
        lines.push("== Extractive ==".into());
        lines.push(or_placeholder(&snapshot.views.extractive).to_string());
        lines.push(String::new());
        lines.push("== Abstractive ==".into());
        lines.push(or_placeholder(&snapshot.views.abstractive).to_string());
    } else {
        lines.push("== Summary ==".into());
        lines.push(or_placeholder(&snapshot.views.summary).to_string());
    }
    lines.push(String::new());

    lines.push(format!(
        "Words: {} -> {}  Compression: {}%  Reading time: {} min  Sentences: {}",
        kpis.original_words,
        kpis.summary_words,
        kpis.compression_percent,
        kpis.reading_minutes,
        kpis.original_sentences
    ));
    lines.push(format!(
        "Document: {} words, {} sentences, {} paragraphs, {} characters, avg {:.1} words/sentence",
        charts.analysis.words,
        charts.analysis.sentences,
        charts.analysis.paragraphs,
        stats.characters,
        stats.avg_sentence_length
    ));
    lines.push(format!(
        "Original vs summary: words {}/{}  sentences {}/{}  minutes {}/{}",
        charts.original.words,
        charts.summary.words,
        charts.original.sentences,
        charts.summary.sentences,
        charts.original.minutes,
        charts.summary.minutes
    ));
    lines.push(format!(
        "Summary share: {}% kept, {}% removed",
        charts.compression.summary_percent, charts.compression.removed_percent
    ));

    if !snapshot.top_terms.is_empty() {
        let terms: Vec<String> = snapshot
            .top_terms
            .iter()
            .map(|(w, n)| format!("{w} ({n})"))
            .collect();
        lines.push(format!("Top terms: {}", terms.join(", ")));
    }

    TextSummary { lines }
}

fn or_placeholder(text: &str) -> &str {
    if text.trim().is_empty() {
        "(empty)"
    } else {
        text
    }
}

/// Render the history log as an aligned table.
pub(crate) fn build_history_table(rows: &[HistoryRow]) -> TextSummary {
    if rows.is_empty() {
        return TextSummary {
            lines: vec!["No history yet.".into()],
        };
    }
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(format!(
        "{:<19}  {:<11}  {:<6}  {:>8}  {:>7}  {:>11}",
        "Timestamp", "Mode", "Length", "Original", "Summary", "Compression"
    ));
    for r in rows {
        lines.push(format!(
            "{:<19}  {:<11}  {:<6}  {:>8}  {:>7}  {:>10}%",
            r.timestamp, r.mode, r.length, r.original, r.summary, r.compression_percent
        ));
    }
    TextSummary { lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, DocumentSource};
    use crate::model::RunResult;

    #[test]
    fn compare_report_shows_both_variants() {
        let doc = Document::new("Hello world. This is a test!");
        let result = RunResult {
            extractive: Some("Hello world.".into()),
            abstractive: None,
        };
        let snap = ViewSnapshot::build(&doc, &DocumentSource::Sample, Some(&result));
        let report = build_text_summary(&snap, Mode::Compare);
        assert!(report.lines.contains(&"== Extractive ==".to_string()));
        assert!(report.lines.contains(&"(empty)".to_string()));
        assert!(report.lines.iter().any(|l| l.contains("Compression: 67%")));
        assert!(report.lines.iter().any(|l| l.starts_with("Top terms: hello (1)")));
    }

    #[test]
    fn history_table_has_header_and_rows() {
        let rows = vec![HistoryRow {
            timestamp: "2024-05-01 09:30:00".into(),
            mode: "abstractive".into(),
            length: "long".into(),
            original: 1000,
            summary: 250,
            compression_percent: 75,
        }];
        let table = build_history_table(&rows);
        assert_eq!(table.lines.len(), 2);
        assert!(table.lines[1].ends_with("75%"));
        assert_eq!(build_history_table(&[]).lines, vec!["No history yet."]);
    }
}
