//! Scripted in-process service for controller and loader tests.

use super::{ServiceError, SummarizerService};
use crate::model::{RunRequest, RunResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub(crate) struct FakeService {
    /// `Err(detail)` answers like `{ok: false, detail}`.
    pub summary: Result<RunResult, String>,
    pub converted: Result<String, String>,
    pub sample: Result<String, String>,
    pub wordcloud_ok: bool,
    /// When set, `summarize` waits for a permit before answering.
    pub gate: Option<Arc<Notify>>,
    pub summarize_calls: AtomicUsize,
    /// Text of every word-cloud request, in order.
    pub wordcloud_texts: Mutex<Vec<String>>,
    pub requests: Mutex<Vec<RunRequest>>,
}

impl FakeService {
    pub fn answering(result: RunResult) -> Self {
        Self {
            summary: Ok(result),
            converted: Err("no conversion scripted".into()),
            sample: Err("no sample scripted".into()),
            wordcloud_ok: true,
            gate: None,
            summarize_calls: AtomicUsize::new(0),
            wordcloud_texts: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting(detail: &str) -> Self {
        Self {
            summary: Err(detail.to_string()),
            ..Self::answering(RunResult::default())
        }
    }

    pub fn calls(&self) -> usize {
        self.summarize_calls.load(Ordering::SeqCst)
    }

    pub fn wordcloud_texts(&self) -> Vec<String> {
        self.wordcloud_texts.lock().unwrap().clone()
    }
}

#[async_trait]
impl SummarizerService for FakeService {
    async fn summarize(&self, request: &RunRequest) -> Result<RunResult, ServiceError> {
        self.summarize_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.summary.clone().map_err(ServiceError::Rejected)
    }

    async fn convert(&self, _file_name: &str, _bytes: Vec<u8>) -> Result<String, ServiceError> {
        self.converted.clone().map_err(ServiceError::Rejected)
    }

    async fn wordcloud(&self, text: &str) -> Result<Bytes, ServiceError> {
        self.wordcloud_texts.lock().unwrap().push(text.to_string());
        if self.wordcloud_ok {
            Ok(Bytes::from_static(b"\x89PNG fake"))
        } else {
            Err(ServiceError::Status {
                status: 500,
                detail: "wordcloud exploded".into(),
            })
        }
    }

    async fn sample_document(&self) -> Result<String, ServiceError> {
        self.sample.clone().map_err(ServiceError::Rejected)
    }

    async fn health(&self) -> Result<(), ServiceError> {
        Ok(())
    }
}
