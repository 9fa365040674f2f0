//! Persisted run history.
//!
//! The whole log is one JSON blob under a fixed key in a small key-value
//! store. The default store keeps one file per key:
//!
//! ```text
//! <data dir>/store/
//!   docsum_history.json   # newest-first array of RunRecord, at most 100 entries
//! ```

use crate::metrics;
use crate::model::RunRecord;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Storage key of the history blob.
pub const HISTORY_KEY: &str = "docsum_history";

/// Maximum number of records kept.
pub const HISTORY_CAPACITY: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, StorageError>;

/// Durable string storage addressed by key.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// One `<key>.json` file per key inside a directory.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// The directory is created if it doesn't exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        // Write then rename so a crash never leaves a half-written blob.
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// One rendered history row, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRow {
    pub timestamp: String,
    pub mode: String,
    pub length: String,
    pub original: usize,
    pub summary: usize,
    pub compression_percent: u8,
}

/// Build table rows from a log. Compression is derived, never stored.
pub fn render(log: &[RunRecord]) -> Vec<HistoryRow> {
    log.iter()
        .map(|r| HistoryRow {
            timestamp: r.timestamp.clone(),
            mode: r.mode.clone(),
            length: r.length.clone(),
            original: r.original_word_count,
            summary: r.summary_word_count,
            compression_percent: metrics::compression_percent(
                r.original_word_count,
                r.summary_word_count,
            ),
        })
        .collect()
}

/// Newest-first log of runs, mirrored to a key-value store on every change.
pub struct HistoryStore {
    store: Box<dyn KeyValueStore>,
    log: Vec<RunRecord>,
}

impl HistoryStore {
    /// Open the store and read any persisted log.
    pub fn open(store: Box<dyn KeyValueStore>) -> Self {
        let log = Self::load(store.as_ref());
        Self { store, log }
    }

    /// Read the persisted log. Missing or unreadable blobs yield an empty log.
    pub fn load(store: &dyn KeyValueStore) -> Vec<RunRecord> {
        let raw = match store.get(HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "history storage unreadable, starting empty");
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<RunRecord>>(&raw) {
            Ok(mut log) => {
                log.truncate(HISTORY_CAPACITY);
                log
            }
            Err(e) => {
                tracing::warn!(error = %e, "history blob is corrupt, starting empty");
                Vec::new()
            }
        }
    }

    pub fn records(&self) -> &[RunRecord] {
        &self.log
    }

    pub fn rows(&self) -> Vec<HistoryRow> {
        render(&self.log)
    }

    /// Insert at the front, cap the log, persist it.
    ///
    /// The in-memory insert stands even if persisting fails.
    pub fn append(&mut self, record: RunRecord) -> Result<()> {
        self.log.insert(0, record);
        self.log.truncate(HISTORY_CAPACITY);
        self.persist()
    }

    pub fn clear(&mut self) -> Result<()> {
        self.log.clear();
        self.store.remove(HISTORY_KEY)
    }

    fn persist(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.log)?;
        self.store.set(HISTORY_KEY, &json)
    }
}

/// File format for history exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn write(self, path: &Path, log: &[RunRecord]) -> Result<()> {
        match self {
            ExportFormat::Json => export_json(path, log),
            ExportFormat::Csv => export_csv(path, log),
        }
    }
}

/// Export history as a JSON array.
pub fn export_json(path: &Path, log: &[RunRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(log)?;
    fs::write(path, json)?;
    Ok(())
}

/// Export history as CSV with a derived compression column.
pub fn export_csv(path: &Path, log: &[RunRecord]) -> Result<()> {
    let mut out = Vec::new();
    writeln!(out, "timestamp,mode,length,original_words,summary_words,compression_percent")?;
    for row in render(log) {
        writeln!(
            out,
            "{},{},{},{},{},{}",
            csv_field(&row.timestamp),
            csv_field(&row.mode),
            csv_field(&row.length),
            row.original,
            row.summary,
            row.compression_percent
        )?;
    }
    fs::write(path, out)?;
    Ok(())
}

fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use super::{KeyValueStore, Result};
    use std::collections::HashMap;
    use std::io;
    use std::sync::{Arc, Mutex};

    /// In-memory store whose contents survive across `HistoryStore` instances.
    #[derive(Clone, Default)]
    pub(crate) struct MemoryStore {
        pub entries: Arc<Mutex<HashMap<String, String>>>,
        pub fail_writes: bool,
    }

    impl MemoryStore {
        pub fn with_blob(key: &str, value: &str) -> Self {
            let store = Self::default();
            store
                .entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            store
        }

        pub fn blob(&self, key: &str) -> Option<String> {
            self.entries.lock().unwrap().get(key).cloned()
        }
    }

    impl KeyValueStore for MemoryStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        fn set(&mut self, key: &str, value: &str) -> Result<()> {
            if self.fail_writes {
                return Err(io::Error::new(io::ErrorKind::Other, "quota exceeded").into());
            }
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn remove(&mut self, key: &str) -> Result<()> {
            self.entries.lock().unwrap().remove(key);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryStore;
    use super::*;
    use tempfile::TempDir;

    fn record(i: usize) -> RunRecord {
        RunRecord {
            timestamp: format!("2024-05-01 10:{:02}:00", i % 60),
            mode: "extractive".into(),
            length: "medium".into(),
            original_word_count: 100 + i,
            summary_word_count: 10,
        }
    }

    #[test]
    fn append_inserts_newest_first() {
        let mut history = HistoryStore::open(Box::new(MemoryStore::default()));
        history.append(record(1)).unwrap();
        history.append(record(2)).unwrap();
        assert_eq!(history.records(), &[record(2), record(1)]);
    }

    #[test]
    fn capacity_drops_oldest() {
        let mut history = HistoryStore::open(Box::new(MemoryStore::default()));
        for i in 0..=HISTORY_CAPACITY {
            history.append(record(i)).unwrap();
        }
        let log = history.records();
        assert_eq!(log.len(), HISTORY_CAPACITY);
        assert_eq!(log[0], record(HISTORY_CAPACITY));
        assert_eq!(log[HISTORY_CAPACITY - 1], record(1));
        assert!(!log.contains(&record(0)));
    }

    #[test]
    fn reload_reproduces_log() {
        let store = MemoryStore::default();
        let mut history = HistoryStore::open(Box::new(store.clone()));
        for i in 0..5 {
            history.append(record(i)).unwrap();
        }
        let reopened = HistoryStore::open(Box::new(store));
        assert_eq!(reopened.records(), history.records());
    }

    #[test]
    fn corrupt_blob_loads_empty() {
        for blob in ["not json", "{\"a\":1}", "[{\"timestamp\": 3}]", ""] {
            let store = MemoryStore::with_blob(HISTORY_KEY, blob);
            assert!(HistoryStore::load(&store).is_empty(), "blob {blob:?}");
        }
    }

    #[test]
    fn oversized_blob_is_truncated() {
        let log: Vec<RunRecord> = (0..150).map(record).collect();
        let store = MemoryStore::with_blob(HISTORY_KEY, &serde_json::to_string(&log).unwrap());
        let loaded = HistoryStore::load(&store);
        assert_eq!(loaded.len(), HISTORY_CAPACITY);
        assert_eq!(loaded[0], record(0));
    }

    #[test]
    fn persist_failure_keeps_in_memory_insert() {
        let store = MemoryStore {
            fail_writes: true,
            ..Default::default()
        };
        let mut history = HistoryStore::open(Box::new(store.clone()));
        assert!(history.append(record(1)).is_err());
        assert_eq!(history.records().len(), 1);
        assert!(store.blob(HISTORY_KEY).is_none());
    }

    #[test]
    fn clear_removes_blob() {
        let store = MemoryStore::default();
        let mut history = HistoryStore::open(Box::new(store.clone()));
        history.append(record(1)).unwrap();
        assert!(store.blob(HISTORY_KEY).is_some());
        history.clear().unwrap();
        assert!(history.records().is_empty());
        assert!(store.blob(HISTORY_KEY).is_none());
        assert!(HistoryStore::open(Box::new(store)).records().is_empty());
    }

    #[test]
    fn render_derives_compression() {
        let rows = render(&[RunRecord {
            timestamp: "t".into(),
            mode: "abstractive".into(),
            length: "short".into(),
            original_word_count: 1000,
            summary_word_count: 250,
        }]);
        assert_eq!(rows[0].compression_percent, 75);
        assert_eq!(rows[0].original, 1000);
    }

    #[test]
    fn file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("store");
        {
            let mut history = HistoryStore::open(Box::new(FileStore::new(&root).unwrap()));
            history.append(record(7)).unwrap();
            history.append(record(8)).unwrap();
        }
        let reopened = HistoryStore::open(Box::new(FileStore::new(&root).unwrap()));
        assert_eq!(reopened.records(), &[record(8), record(7)]);
        assert!(!root.join("docsum_history.json.tmp").exists());
    }

    #[test]
    fn file_store_corrupt_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path()).unwrap();
        fs::write(dir.path().join("docsum_history.json"), "{broken").unwrap();
        assert!(HistoryStore::load(&store).is_empty());
    }

    #[test]
    fn exports_csv_with_quoting() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.csv");
        let mut r = record(1);
        r.timestamp = "May 1, 2024".into();
        export_csv(&path, &[r]).unwrap();
        let csv = fs::read_to_string(&path).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("timestamp,mode,length,original_words,summary_words,compression_percent")
        );
        assert_eq!(lines.next(), Some("\"May 1, 2024\",extractive,medium,101,10,90"));
    }

    #[test]
    fn exports_json_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        export_json(&path, &[record(2), record(1)]).unwrap();
        let back: Vec<RunRecord> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, vec![record(2), record(1)]);
    }
}
