use crate::document::Document;
use crate::error::RunError;
use crate::metrics;
use crate::storage::HistoryRow;
use crate::views::ViewSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
pub struct RunConfig {
    pub base_url: String,
    /// `None` waits for the service indefinitely.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Option<Duration>,
    #[serde(with = "humantime_serde")]
    pub progress_interval: Duration,
    /// How long the completed progress bar stays up after a successful run.
    #[serde(with = "humantime_serde")]
    pub progress_teardown: Duration,
    /// How long quitting waits for detached side tasks (word cloud).
    #[serde(with = "humantime_serde")]
    pub side_task_grace: Duration,
    /// Where rendered word clouds are written; `None` disables them.
    pub wordcloud_path: Option<PathBuf>,
    pub user_agent: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Extractive,
    Abstractive,
    /// Both variants side by side.
    Compare,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Extractive => "extractive",
            Mode::Abstractive => "abstractive",
            Mode::Compare => "compare",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Mode::Extractive => Mode::Abstractive,
            Mode::Abstractive => Mode::Compare,
            Mode::Compare => Mode::Extractive,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SummaryLength {
    Short,
    Medium,
    Long,
}

impl SummaryLength {
    pub fn as_str(self) -> &'static str {
        match self {
            SummaryLength::Short => "short",
            SummaryLength::Medium => "medium",
            SummaryLength::Long => "long",
        }
    }

    pub fn next(self) -> Self {
        match self {
            SummaryLength::Short => SummaryLength::Medium,
            SummaryLength::Medium => SummaryLength::Long,
            SummaryLength::Long => SummaryLength::Short,
        }
    }
}

impl fmt::Display for SummaryLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-selected settings for the next run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunOptions {
    pub mode: Mode,
    pub length: SummaryLength,
    pub num_sentences: u32,
}

impl RunOptions {
    pub fn new(mode: Mode, length: SummaryLength, num_sentences: u32) -> Self {
        Self {
            mode,
            length,
            num_sentences: num_sentences.max(1),
        }
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::new(Mode::Extractive, SummaryLength::Medium, 3)
    }
}

/// Body of `POST /api/summarize`. Built once per run and never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct RunRequest {
    pub text: Document,
    pub mode: Mode,
    pub length: SummaryLength,
    pub num_sentences: u32,
}

impl RunRequest {
    pub fn new(document: &Document, options: RunOptions) -> Self {
        Self {
            text: document.clone(),
            mode: options.mode,
            length: options.length,
            num_sentences: options.num_sentences.max(1),
        }
    }
}

/// Summaries returned by the service. Either may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    #[serde(default)]
    pub extractive: Option<String>,
    #[serde(default)]
    pub abstractive: Option<String>,
}

impl RunResult {
    /// Abstractive first, then extractive, else empty. Empty strings count as missing.
    pub fn primary(&self) -> &str {
        self.abstractive
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.extractive.as_deref().filter(|s| !s.is_empty()))
            .unwrap_or("")
    }
}

/// One persisted history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub timestamp: String,
    pub mode: String,
    pub length: String,
    pub original_word_count: usize,
    pub summary_word_count: usize,
}

impl RunRecord {
    pub fn new(timestamp: String, request: &RunRequest, primary_summary: &str) -> Self {
        Self {
            timestamp,
            mode: request.mode.to_string(),
            length: request.length.to_string(),
            original_word_count: metrics::word_count(request.text.as_str()),
            summary_word_count: metrics::word_count(primary_summary),
        }
    }
}

/// Local wall-clock time for history rows; UTC when the offset is unknown.
pub fn local_timestamp() -> String {
    let now = time::OffsetDateTime::now_local().unwrap_or_else(|_| time::OffsetDateTime::now_utc());
    now.format(time::macros::format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second]"
    ))
    .unwrap_or_else(|_| "now".into())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunState {
    Idle,
    Validating,
    InFlight,
    Succeeded,
    Failed,
}

impl RunState {
    /// The summarize trigger is only live outside a run.
    pub fn trigger_enabled(self) -> bool {
        !matches!(self, RunState::Validating | RunState::InFlight)
    }
}

#[derive(Debug, Clone)]
pub enum RunEvent {
    State(RunState),
    Progress {
        percent: u8,
    },
    ProgressCleared,
    DocumentChanged {
        // Boxed to keep RunEvent small.
        snapshot: Box<ViewSnapshot>,
    },
    RunCompleted {
        snapshot: Box<ViewSnapshot>,
    },
    HistoryChanged {
        rows: Vec<HistoryRow>,
    },
    WordcloudReady {
        path: PathBuf,
    },
    /// The single channel for user-facing failures.
    Notice(RunError),
    Info(InfoEvent),
}

/// Informational messages for the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfoEvent {
    Message(String),
    RunInFlight,
    DocumentLocked,
    SummarySaved(PathBuf),
    HistoryCleared,
    HistoryExported(PathBuf),
    ServiceHealthy(String),
}

impl InfoEvent {
    pub fn to_message(&self) -> String {
        match self {
            InfoEvent::Message(msg) => msg.clone(),
            InfoEvent::RunInFlight => "A summarization is already running".to_string(),
            InfoEvent::DocumentLocked => {
                "Document is locked while a summarization is running".to_string()
            }
            InfoEvent::SummarySaved(p) => format!("Saved summary: {}", p.display()),
            InfoEvent::HistoryCleared => "History cleared".to_string(),
            InfoEvent::HistoryExported(p) => format!("Exported history: {}", p.display()),
            InfoEvent::ServiceHealthy(url) => format!("Service reachable at {url}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_prefers_abstractive() {
        let both = RunResult {
            extractive: Some("ext".into()),
            abstractive: Some("abs".into()),
        };
        assert_eq!(both.primary(), "abs");

        let only_ext = RunResult {
            extractive: Some("ext".into()),
            abstractive: Some(String::new()),
        };
        assert_eq!(only_ext.primary(), "ext");

        assert_eq!(RunResult::default().primary(), "");
    }

    #[test]
    fn request_serializes_wire_shape() {
        let doc = Document::new("Some text.");
        let req = RunRequest::new(&doc, RunOptions::new(Mode::Abstractive, SummaryLength::Long, 0));
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "text": "Some text.",
                "mode": "abstractive",
                "length": "long",
                "num_sentences": 1
            })
        );
    }

    #[test]
    fn record_uses_camel_case_and_word_counts() {
        let doc = Document::new("one two three four");
        let req = RunRequest::new(&doc, RunOptions::default());
        let record = RunRecord::new("2024-01-01 10:00:00".into(), &req, "one two");
        assert_eq!(record.original_word_count, 4);
        assert_eq!(record.summary_word_count, 2);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["originalWordCount"], 4);
        assert_eq!(json["summaryWordCount"], 2);
        assert_eq!(json["mode"], "extractive");
        assert_eq!(json["length"], "medium");
    }

    #[test]
    fn trigger_disabled_only_during_run() {
        assert!(RunState::Idle.trigger_enabled());
        assert!(!RunState::Validating.trigger_enabled());
        assert!(!RunState::InFlight.trigger_enabled());
        assert!(RunState::Failed.trigger_enabled());
    }
}
