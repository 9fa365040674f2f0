//! State owned by the controller: the current document, the latest result and
//! the history log. Presentation layers only ever see snapshots of it.

use crate::document::{Document, DocumentSource};
use crate::model::RunResult;
use crate::storage::{HistoryRow, HistoryStore};
use crate::views::ViewSnapshot;

pub(crate) struct Session {
    pub document: Document,
    pub source: DocumentSource,
    pub latest: Option<RunResult>,
    pub history: HistoryStore,
}

impl Session {
    pub fn new(document: Document, source: DocumentSource, history: HistoryStore) -> Self {
        Self {
            document,
            source,
            latest: None,
            history,
        }
    }

    /// Replace the document. The latest result stays, as it does on screen.
    pub fn set_document(&mut self, document: Document, source: DocumentSource) {
        self.document = document;
        self.source = source;
    }

    /// The primary summary of the latest result, or empty.
    pub fn primary_summary(&self) -> &str {
        self.latest.as_ref().map(RunResult::primary).unwrap_or("")
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot::build(&self.document, &self.source, self.latest.as_ref())
    }

    pub fn history_rows(&self) -> Vec<HistoryRow> {
        self.history.rows()
    }
}
