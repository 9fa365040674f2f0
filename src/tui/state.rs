use crate::model::{InfoEvent, RunEvent, RunOptions, RunState};
use crate::orchestrator::UiCommand;
use crate::storage::HistoryRow;
use crate::views::ViewSnapshot;
use ratatui::{style::Color, style::Style, text::Span};
use std::path::PathBuf;

pub const TAB_SUMMARY: usize = 0;
pub const TAB_VISUALS: usize = 1;
pub const TAB_COMPARE: usize = 2;
pub const TAB_HISTORY: usize = 3;
pub const TAB_HELP: usize = 4;
pub const TAB_COUNT: usize = 5;

/// Everything the UI thread renders. Owned by the UI thread only.
pub struct UiState {
    pub tab: usize,
    pub run_state: RunState,
    /// `None` while no progress bar is shown.
    pub progress: Option<u8>,
    pub info: String,
    pub options: RunOptions,
    pub snapshot: ViewSnapshot,
    pub history: Vec<HistoryRow>,
    pub history_selected: usize, // 0 = most recent
    pub history_scroll_offset: usize,
    pub summary_scroll: u16,
    pub wordcloud: Option<PathBuf>,
    pub data_dir: PathBuf,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            tab: TAB_SUMMARY,
            run_state: RunState::Idle,
            progress: None,
            info: String::new(),
            options: RunOptions::default(),
            snapshot: ViewSnapshot::default(),
            history: Vec::new(),
            history_selected: 0,
            history_scroll_offset: 0,
            summary_scroll: 0,
            wordcloud: None,
            data_dir: PathBuf::from("."),
        }
    }
}

impl UiState {
    /// Mirror one controller event.
    pub fn apply_event(&mut self, ev: RunEvent) {
        match ev {
            RunEvent::State(s) => {
                self.run_state = s;
                match s {
                    RunState::Validating => self.info = "Validating…".into(),
                    RunState::InFlight => {
                        self.info = format!(
                            "Summarizing ({}, {}, {} sentences)…",
                            self.options.mode, self.options.length, self.options.num_sentences
                        )
                    }
                    RunState::Succeeded => self.info = "Summary ready".into(),
                    // Failed and Idle keep whatever notice was just shown.
                    RunState::Failed | RunState::Idle => {}
                }
            }
            RunEvent::Progress { percent } => self.progress = Some(percent),
            RunEvent::ProgressCleared => self.progress = None,
            RunEvent::DocumentChanged { snapshot } => {
                if snapshot.kpis.original_words > 0 {
                    self.info = format!("Loaded {}", snapshot.source);
                }
                self.snapshot = *snapshot;
                self.summary_scroll = 0;
            }
            RunEvent::RunCompleted { snapshot } => {
                self.snapshot = *snapshot;
                self.summary_scroll = 0;
                self.wordcloud = None;
            }
            RunEvent::HistoryChanged { rows } => {
                self.history = rows;
                if self.history_selected >= self.history.len() {
                    self.history_selected = self.history.len().saturating_sub(1);
                }
                if self.history_scroll_offset > self.history_selected {
                    self.history_scroll_offset = self.history_selected;
                }
            }
            RunEvent::WordcloudReady { path } => {
                self.info = format!("Word cloud saved: {}", path.display());
                self.wordcloud = Some(path);
            }
            RunEvent::Notice(e) => {
                self.info = format!("Error ({}): {e}", e.kind());
            }
            RunEvent::Info(i) => self.info = i.to_message(),
        }
    }

    pub fn select_prev(&mut self) {
        if self.history_selected > 0 {
            self.history_selected -= 1;
            if self.history_selected < self.history_scroll_offset {
                self.history_scroll_offset = self.history_selected;
            }
        }
    }

    pub fn select_next(&mut self, visible_rows: usize) {
        if self.history_selected + 1 < self.history.len() {
            self.history_selected += 1;
            let visible = visible_rows.max(1);
            if self.history_selected >= self.history_scroll_offset + visible {
                self.history_scroll_offset = self.history_selected + 1 - visible;
            }
        }
    }

    /// Turn a bracketed paste into a document replacement. Pastes are
    /// dropped while a run is in flight.
    pub fn paste_command(&mut self, text: String) -> Option<UiCommand> {
        if !self.run_state.trigger_enabled() {
            self.info = InfoEvent::DocumentLocked.to_message();
            return None;
        }
        self.info = format!("Pasted {} characters", text.chars().count());
        Some(UiCommand::SetDocument(text))
    }

    /// Colored label for the run state.
    pub fn state_span(&self) -> Span<'static> {
        let (label, color) = match self.run_state {
            RunState::Idle => ("idle", Color::Gray),
            RunState::Validating => ("validating", Color::Yellow),
            RunState::InFlight => ("running", Color::Yellow),
            RunState::Succeeded => ("done", Color::Green),
            RunState::Failed => ("failed", Color::Red),
        };
        Span::styled(label, Style::default().fg(color))
    }
}
