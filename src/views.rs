//! View-models derived from the current document and the latest result.
//!
//! Nothing in here holds state of its own; `ViewSnapshot::build` recomputes
//! every figure from the two sources each time.

use crate::document::{Document, DocumentSource};
use crate::metrics::{self, TextStats};
use crate::model::RunResult;
use serde::Serialize;

/// Number of terms listed in the top-terms panel.
pub const TOP_TERMS: usize = 10;

/// Text shown in the summary and comparison panes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Views {
    pub summary: String,
    pub extractive: String,
    pub abstractive: String,
}

impl Views {
    pub fn from_result(result: &RunResult) -> Self {
        Self {
            summary: result.primary().to_string(),
            extractive: result.extractive.clone().unwrap_or_default(),
            abstractive: result.abstractive.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Kpis {
    pub original_words: usize,
    pub summary_words: usize,
    pub compression_percent: u8,
    pub reading_minutes: u64,
    pub original_sentences: usize,
}

impl Kpis {
    pub fn compute(original: &str, summary: &str) -> Self {
        let original_words = metrics::word_count(original);
        let summary_words = metrics::word_count(summary);
        Self {
            original_words,
            summary_words,
            compression_percent: metrics::compression_percent(original_words, summary_words),
            reading_minutes: metrics::reading_time_minutes(original_words),
            original_sentences: metrics::sentence_count(original),
        }
    }
}

/// `[words, sentences, paragraphs]` of the original.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisSeries {
    pub words: usize,
    pub sentences: usize,
    pub paragraphs: usize,
}

/// `[words, sentences, reading minutes]` for one side of the comparison chart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ComparisonBar {
    pub words: usize,
    pub sentences: usize,
    pub minutes: u64,
}

/// Donut slices; always sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompressionDonut {
    pub summary_percent: u8,
    pub removed_percent: u8,
}

impl Default for CompressionDonut {
    fn default() -> Self {
        Self {
            summary_percent: 0,
            removed_percent: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChartSeries {
    pub analysis: AnalysisSeries,
    pub original: ComparisonBar,
    pub summary: ComparisonBar,
    pub compression: CompressionDonut,
}

impl ChartSeries {
    pub fn compute(original: &str, summary: &str) -> Self {
        let orig = TextStats::of(original);
        let sum = TextStats::of(summary);
        let summary_percent = metrics::summary_percent(orig.words, sum.words);
        Self {
            analysis: AnalysisSeries {
                words: orig.words,
                sentences: orig.sentences,
                paragraphs: orig.paragraphs,
            },
            original: ComparisonBar {
                words: orig.words,
                sentences: orig.sentences,
                minutes: orig.reading_minutes,
            },
            summary: ComparisonBar {
                words: sum.words,
                sentences: sum.sentences,
                minutes: sum.reading_minutes,
            },
            compression: CompressionDonut {
                summary_percent,
                removed_percent: 100 - summary_percent,
            },
        }
    }
}

/// Everything a presentation layer needs to draw the current session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewSnapshot {
    pub source: DocumentSource,
    pub preview: String,
    pub views: Views,
    pub kpis: Kpis,
    pub charts: ChartSeries,
    pub original_stats: TextStats,
    pub top_terms: Vec<(String, usize)>,
}

impl ViewSnapshot {
    pub fn build(
        document: &Document,
        source: &DocumentSource,
        latest: Option<&RunResult>,
    ) -> Self {
        let views = latest.map(Views::from_result).unwrap_or_default();
        let original = document.as_str();
        Self {
            source: source.clone(),
            preview: document.preview().to_string(),
            kpis: Kpis::compute(original, &views.summary),
            charts: ChartSeries::compute(original, &views.summary),
            original_stats: TextStats::of(original),
            top_terms: metrics::top_words(original, TOP_TERMS),
            views,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[test]
    fn kpis_for_quarter_summary() {
        let kpis = Kpis::compute(&words(1000), &words(250));
        assert_eq!(kpis.original_words, 1000);
        assert_eq!(kpis.summary_words, 250);
        assert_eq!(kpis.compression_percent, 75);
        assert_eq!(kpis.reading_minutes, 5);
    }

    #[test]
    fn chart_series_pairs_original_and_summary() {
        let original = "One two three. Four five six.\n\nSeven eight nine ten.";
        let summary = "One two three.";
        let charts = ChartSeries::compute(original, summary);
        assert_eq!(
            charts.analysis,
            AnalysisSeries {
                words: 10,
                sentences: 3,
                paragraphs: 2
            }
        );
        assert_eq!(charts.original.minutes, 1);
        assert_eq!(charts.summary.words, 3);
        assert_eq!(charts.summary.sentences, 1);
        assert_eq!(charts.compression.summary_percent, 30);
        assert_eq!(charts.compression.removed_percent, 70);
    }

    #[test]
    fn donut_stays_whole_when_summary_is_longer() {
        let charts = ChartSeries::compute("short text", "a much longer summary than the text");
        assert_eq!(charts.compression.summary_percent, 100);
        assert_eq!(charts.compression.removed_percent, 0);
    }

    #[test]
    fn snapshot_without_result_has_empty_summary() {
        let doc = Document::new("Hello world. This is a test!");
        let snap = ViewSnapshot::build(&doc, &DocumentSource::Pasted, None);
        assert_eq!(snap.views, Views::default());
        assert_eq!(snap.kpis.original_words, 6);
        assert_eq!(snap.kpis.original_sentences, 2);
        assert_eq!(snap.kpis.summary_words, 0);
        assert_eq!(snap.kpis.compression_percent, 0);
        assert_eq!(snap.charts.compression, CompressionDonut::default());
    }

    #[test]
    fn snapshot_is_a_function_of_document_and_result() {
        let doc = Document::new("Alpha beta gamma delta. Epsilon zeta.");
        let result = RunResult {
            extractive: Some("Alpha beta.".into()),
            abstractive: None,
        };
        let a = ViewSnapshot::build(&doc, &DocumentSource::Sample, Some(&result));
        let b = ViewSnapshot::build(&doc.clone(), &DocumentSource::Sample, Some(&result.clone()));
        assert_eq!(a, b);
        assert_eq!(a.views.summary, "Alpha beta.");
        assert_eq!(a.views.abstractive, "");
    }
}
