//! Post-run processing.
//!
//! Applies one successful result to the session so every view derived from it
//! moves together: summary and comparison text, the history log, KPIs and
//! chart series, and the word-cloud input.

use super::session::Session;
use crate::model::{local_timestamp, RunRecord, RunRequest, RunResult};
use crate::storage::HistoryRow;
use crate::views::ViewSnapshot;

/// Result of post-run processing, ready for presentation layers.
pub(crate) struct ProcessedRun {
    pub snapshot: ViewSnapshot,
    pub history: Vec<HistoryRow>,
    /// Text for the word cloud, if there is any.
    pub wordcloud_text: Option<String>,
    pub persist_error: Option<String>,
}

/// Apply a completed run to the session.
pub(crate) fn process_run_completion(
    session: &mut Session,
    request: &RunRequest,
    result: RunResult,
) -> ProcessedRun {
    let primary = result.primary().to_string();

    // Summary and comparison panes read from the latest result.
    session.latest = Some(result);

    let record = RunRecord::new(local_timestamp(), request, &primary);
    let persist_error = match session.history.append(record) {
        Ok(()) => None,
        Err(e) => {
            tracing::warn!(error = %e, "failed to persist history");
            Some(e.to_string())
        }
    };

    let snapshot = session.snapshot();

    let wordcloud_text = if !primary.trim().is_empty() {
        Some(primary)
    } else if !request.text.is_blank() {
        Some(request.text.as_str().to_string())
    } else {
        None
    };

    ProcessedRun {
        snapshot,
        history: session.history_rows(),
        wordcloud_text,
        persist_error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, DocumentSource};
    use crate::model::{Mode, RunOptions, SummaryLength};
    use crate::storage::memory::MemoryStore;
    use crate::storage::{HistoryStore, HISTORY_KEY};

    fn session_with(text: &str, store: MemoryStore) -> Session {
        Session::new(
            Document::new(text),
            DocumentSource::Pasted,
            HistoryStore::open(Box::new(store)),
        )
    }

    #[test]
    fn fans_out_to_every_view() {
        let store = MemoryStore::default();
        let mut session = session_with("Hello world. This is a test!", store.clone());
        let request = RunRequest::new(
            &session.document,
            RunOptions::new(Mode::Compare, SummaryLength::Short, 2),
        );
        let result = RunResult {
            extractive: Some("Hello world.".into()),
            abstractive: Some("A greeting and a test.".into()),
        };

        let processed = process_run_completion(&mut session, &request, result);

        let views = &processed.snapshot.views;
        assert_eq!(views.summary, "A greeting and a test.");
        assert_eq!(views.extractive, "Hello world.");
        assert_eq!(views.abstractive, "A greeting and a test.");

        assert_eq!(processed.history.len(), 1);
        let row = &processed.history[0];
        assert_eq!((row.mode.as_str(), row.length.as_str()), ("compare", "short"));
        assert_eq!((row.original, row.summary), (6, 5));
        assert!(store.blob(HISTORY_KEY).is_some());

        assert_eq!(processed.snapshot.kpis.summary_words, 5);
        assert_eq!(processed.snapshot.charts.summary.words, 5);
        assert_eq!(processed.wordcloud_text.as_deref(), Some("A greeting and a test."));
        assert!(processed.persist_error.is_none());
    }

    #[test]
    fn empty_result_falls_back_to_document_for_wordcloud() {
        let mut session = session_with("Original text here.", MemoryStore::default());
        let request = RunRequest::new(&session.document, RunOptions::default());
        let processed = process_run_completion(&mut session, &request, RunResult::default());

        assert_eq!(processed.snapshot.views.summary, "");
        assert_eq!(processed.history[0].summary, 0);
        assert_eq!(processed.history[0].compression_percent, 0);
        assert_eq!(processed.wordcloud_text.as_deref(), Some("Original text here."));
    }

    #[test]
    fn persist_failure_is_reported_not_fatal() {
        let store = MemoryStore {
            fail_writes: true,
            ..Default::default()
        };
        let mut session = session_with("Some words here.", store);
        let request = RunRequest::new(&session.document, RunOptions::default());
        let result = RunResult {
            extractive: Some("Some.".into()),
            abstractive: None,
        };
        let processed = process_run_completion(&mut session, &request, result);
        assert!(processed.persist_error.is_some());
        assert_eq!(processed.history.len(), 1);
        assert_eq!(processed.snapshot.views.summary, "Some.");
    }
}
