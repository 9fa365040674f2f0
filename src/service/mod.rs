//! Contract with the summarization backend.
//!
//! The orchestrator only sees the `SummarizerService` trait; `HttpService`
//! speaks the backend's JSON-over-HTTP API.

mod http;

#[cfg(test)]
pub(crate) mod fake;

pub use http::HttpService;

use crate::model::{RunRequest, RunResult};
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned HTTP {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("service reported failure: {0}")]
    Rejected(String),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

#[async_trait]
pub trait SummarizerService: Send + Sync {
    /// `POST /api/summarize`
    async fn summarize(&self, request: &RunRequest) -> Result<RunResult, ServiceError>;

    /// `POST /api/convert`: extract text from a PDF or DOCX upload.
    async fn convert(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, ServiceError>;

    /// `POST /api/wordcloud`: PNG rendering of the most frequent terms.
    async fn wordcloud(&self, text: &str) -> Result<Bytes, ServiceError>;

    /// `GET /static/sample_document.txt`
    async fn sample_document(&self) -> Result<String, ServiceError>;

    /// `GET /api/health`
    async fn health(&self) -> Result<(), ServiceError>;
}
