//! HTTP client for the retrieval/generation backend.

use async_trait::async_trait;
use guideqa_types::{IndexStatus, IngestRequest, IngestResponse, QueryRequest, QueryResponse};
use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Request timeout used when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Error, Debug)]
pub enum BackendError {
    /// Non-success HTTP status; `body` is the raw response text.
    #[error("Backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Request failed: {0}")]
    Transport(String),

    /// Success status whose body did not match the expected shape.
    #[error("Failed to decode response (HTTP {status}): {message}")]
    Decode { status: u16, message: String },
}

impl BackendError {
    /// Text shown to the user: the raw body for HTTP errors, the error otherwise.
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Status { body, .. } if !body.trim().is_empty() => body.clone(),
            other => other.to_string(),
        }
    }

    pub fn http_status(&self) -> Option<u16> {
        match self {
            BackendError::Status { status, .. } | BackendError::Decode { status, .. } => {
                Some(*status)
            }
            BackendError::Transport(_) => None,
        }
    }
}

/// The three backend operations the client consumes.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Submit a query, returning the HTTP status alongside the answer.
    async fn query_with_status(
        &self,
        request: &QueryRequest,
    ) -> Result<(u16, QueryResponse), BackendError>;

    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, BackendError> {
        let (_, response) = self.query_with_status(request).await?;
        Ok(response)
    }

    async fn ingest(&self, request: &IngestRequest) -> Result<IngestResponse, BackendError>;

    async fn index_status(&self) -> Result<IndexStatus, BackendError>;
}

/// reqwest-based backend client.
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    /// Create a client for `base_url` (e.g. `http://localhost:8000`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let base_url: String = base_url.into();
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<(u16, R), BackendError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        debug!(target: "guideqa::backend", "POST {}", path);
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Self::decode(response).await
    }

    async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<(u16, R), BackendError> {
        debug!(target: "guideqa::backend", "GET {}", path);
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Self::decode(response).await
    }

    async fn decode<R: DeserializeOwned>(response: Response) -> Result<(u16, R), BackendError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        if !status.is_success() {
            warn!(target: "guideqa::backend", "Backend returned {}", status);
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let decoded = serde_json::from_str(&body).map_err(|e| BackendError::Decode {
            status: status.as_u16(),
            message: e.to_string(),
        })?;
        Ok((status.as_u16(), decoded))
    }
}

#[async_trait]
impl Backend for BackendClient {
    async fn query_with_status(
        &self,
        request: &QueryRequest,
    ) -> Result<(u16, QueryResponse), BackendError> {
        self.post_json("/api/query", request).await
    }

    async fn ingest(&self, request: &IngestRequest) -> Result<IngestResponse, BackendError> {
        let (_, response) = self.post_json("/api/ingest", request).await?;
        Ok(response)
    }

    async fn index_status(&self) -> Result<IndexStatus, BackendError> {
        let (_, status) = self.get_json("/api/status").await?;
        Ok(status)
    }
}
