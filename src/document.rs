//! Document handle and input loading (pasted text, files, the service sample).

use crate::error::RunError;
use crate::service::SummarizerService;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Number of characters shown in document previews.
pub const PREVIEW_CHARS: usize = 4000;

/// Raw input text. Clones share the same buffer.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Document(Arc<str>);

impl Document {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// The first `PREVIEW_CHARS` characters.
    pub fn preview(&self) -> &str {
        match self.0.char_indices().nth(PREVIEW_CHARS) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self(Arc::from(""))
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("chars", &self.0.chars().count())
            .finish()
    }
}

/// Where the current document came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "path")]
pub enum DocumentSource {
    #[default]
    Pasted,
    File(PathBuf),
    Sample,
}

impl fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentSource::Pasted => write!(f, "pasted text"),
            DocumentSource::File(p) => write!(f, "{}", p.display()),
            DocumentSource::Sample => write!(f, "sample document"),
        }
    }
}

/// How an uploaded file can be turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Read locally as UTF-8.
    Text,
    /// Sent to the conversion service.
    Convertible,
    Unsupported,
}

// Extensions whose guessed MIME type is text/*.
const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "text", "md", "markdown", "csv", "tsv", "log", "rst", "htm", "html", "xml",
];

impl FileKind {
    pub fn sniff(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("pdf") | Some("docx") => FileKind::Convertible,
            Some(e) if TEXT_EXTENSIONS.contains(&e) => FileKind::Text,
            _ => FileKind::Unsupported,
        }
    }
}

/// Load a file as a document, converting it through the service when needed.
pub async fn load_file(
    service: &dyn SummarizerService,
    path: &Path,
) -> Result<Document, RunError> {
    let shown = path.display().to_string();
    match FileKind::sniff(path) {
        FileKind::Unsupported => Err(RunError::UnsupportedFile(shown)),
        FileKind::Text => {
            let bytes = read_upload(path, &shown).await?;
            Ok(Document::new(String::from_utf8_lossy(&bytes).into_owned()))
        }
        FileKind::Convertible => {
            let bytes = read_upload(path, &shown).await?;
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("upload")
                .to_string();
            tracing::debug!(file = %shown, size = bytes.len(), "converting upload");
            let text = service
                .convert(&file_name, bytes)
                .await
                .map_err(|e| RunError::Conversion(e.to_string()))?;
            Ok(Document::new(text))
        }
    }
}

async fn read_upload(path: &Path, shown: &str) -> Result<Vec<u8>, RunError> {
    tokio::fs::read(path)
        .await
        .map_err(|e| RunError::FileRead(format!("{shown}: {e}")))
}

pub async fn load_sample(service: &dyn SummarizerService) -> Result<Document, RunError> {
    service
        .sample_document()
        .await
        .map(Document::new)
        .map_err(|e| RunError::SampleUnavailable(e.to_string()))
}
