//! User-facing failures of a run and of document loading.
//!
//! Every variant here is reported through the single notice channel
//! (`RunEvent::Notice`). Word-cloud and history-corruption failures are not
//! listed: they are logged and never reach the user.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    #[error("please paste or load a document first")]
    EmptyInput,

    #[error("unsupported file {0}; use .txt, .pdf or .docx")]
    UnsupportedFile(String),

    #[error("failed to read file: {0}")]
    FileRead(String),

    #[error("failed to convert file: {0}")]
    Conversion(String),

    #[error("summarization failed: {0}")]
    Orchestration(String),

    #[error("failed to load sample document: {0}")]
    SampleUnavailable(String),
}

impl RunError {
    /// Short label for status lines.
    pub fn kind(&self) -> &'static str {
        match self {
            RunError::EmptyInput => "empty input",
            RunError::UnsupportedFile(_) => "unsupported file",
            RunError::FileRead(_) => "file read",
            RunError::Conversion(_) => "conversion",
            RunError::Orchestration(_) => "summarization",
            RunError::SampleUnavailable(_) => "sample",
        }
    }
}
