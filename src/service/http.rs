use super::{ServiceError, SummarizerService};
use crate::model::{RunConfig, RunRequest, RunResult};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{multipart, Client, Response};
use serde::{Deserialize, Serialize};

/// Client for the backend's HTTP API.
pub struct HttpService {
    client: Client,
    base_url: String,
}

impl HttpService {
    pub fn new(cfg: &RunConfig) -> Result<Self, ServiceError> {
        // No client-wide timeout; the controller bounds summarize requests.
        let client = Client::builder().user_agent(&cfg.user_agent).build()?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[derive(Deserialize)]
struct SummarizeEnvelope {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    data: Option<RunResult>,
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct ConvertEnvelope {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct HealthEnvelope {
    #[serde(default)]
    ok: bool,
}

/// FastAPI error bodies look like `{"detail": ...}`.
#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

#[derive(Serialize)]
struct WordcloudBody<'a> {
    text: &'a str,
}

fn detail_text(detail: Option<serde_json::Value>, fallback: &str) -> String {
    match detail {
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
        None => fallback.to_string(),
    }
}

/// Fail on non-2xx, keeping the service's `detail` when it sent one.
async fn check_status(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&body)
        .map(|e| detail_text(Some(e.detail), ""))
        .unwrap_or(body);
    Err(ServiceError::Status {
        status: status.as_u16(),
        detail,
    })
}

#[async_trait]
impl SummarizerService for HttpService {
    async fn summarize(&self, request: &RunRequest) -> Result<RunResult, ServiceError> {
        let response = self
            .client
            .post(self.url("/api/summarize"))
            .json(request)
            .send()
            .await?;
        let body = check_status(response).await?.text().await?;
        let envelope: SummarizeEnvelope = serde_json::from_str(&body)?;
        if !envelope.ok {
            return Err(ServiceError::Rejected(detail_text(
                envelope.detail,
                "request failed",
            )));
        }
        Ok(envelope.data.unwrap_or_default())
    }

    async fn convert(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, ServiceError> {
        let part = multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = multipart::Form::new().part("file", part);
        let response = self
            .client
            .post(self.url("/api/convert"))
            .multipart(form)
            .send()
            .await?;
        let body = check_status(response).await?.text().await?;
        let envelope: ConvertEnvelope = serde_json::from_str(&body)?;
        if !envelope.ok {
            return Err(ServiceError::Rejected(detail_text(
                envelope.detail,
                "convert failed",
            )));
        }
        Ok(envelope.text.unwrap_or_default())
    }

    async fn wordcloud(&self, text: &str) -> Result<Bytes, ServiceError> {
        let response = self
            .client
            .post(self.url("/api/wordcloud"))
            .json(&WordcloudBody { text })
            .send()
            .await?;
        Ok(check_status(response).await?.bytes().await?)
    }

    async fn sample_document(&self) -> Result<String, ServiceError> {
        let response = self
            .client
            .get(self.url("/static/sample_document.txt"))
            .send()
            .await?;
        Ok(check_status(response).await?.text().await?)
    }

    async fn health(&self) -> Result<(), ServiceError> {
        let response = self.client.get(self.url("/api/health")).send().await?;
        let body = check_status(response).await?.text().await?;
        let envelope: HealthEnvelope = serde_json::from_str(&body)?;
        if envelope.ok {
            Ok(())
        } else {
            Err(ServiceError::Rejected("health check reported not ok".into()))
        }
    }
}
