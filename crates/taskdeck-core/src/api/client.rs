//! HTTP client for the taskdeck server.
//!
//! One-shot REST calls live here. Streaming endpoints are only built into
//! [`StreamRequest`] values here and driven by the stream transport.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use url::Url;

use crate::api::types::{
    Artifact, ArtifactList, ArtifactType, ClaimResponse, ExecutionLogList, Health,
    HeartbeatResponse, PauseResponse, Session, SessionDetail, SessionList, SessionStatus,
};
use crate::stream::StreamRequest;

/// Error from a REST call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    /// HTTP status code, when the server responded at all.
    pub status: Option<u16>,
    /// One-line summary suitable for display.
    pub message: String,
    /// Raw response body, kept for diagnostics.
    pub details: Option<String>,
}

impl ApiError {
    fn new(message: impl Into<String>) -> Self {
        ApiError {
            status: None,
            message: message.into(),
            details: None,
        }
    }

    /// Builds an error from a non-2xx response, preferring the server's
    /// own `detail` message over the raw body.
    fn http_status(status: u16, body: &str) -> Self {
        let mut message = format!("HTTP {status}");
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(body)
            && let Some(detail) = json.get("detail").and_then(|d| d.as_str())
        {
            message = format!("HTTP {status}: {detail}");
        }
        ApiError {
            status: Some(status),
            message,
            details: if body.is_empty() {
                None
            } else {
                Some(body.to_string())
            },
        }
    }

    fn request(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::new(format!("Request timed out: {err}"))
        } else if err.is_connect() {
            ApiError::new(format!("Connection failed: {err}"))
        } else {
            ApiError::new(format!("Request error: {err}"))
        }
    }

    fn decode(err: &reqwest::Error) -> Self {
        ApiError::new(format!("Invalid response body: {err}"))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// A downloaded artifact file.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactDownload {
    /// Filename suggested by the server, when provided.
    pub filename: Option<String>,
    pub content: String,
}

/// Client for the taskdeck server.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    /// Creates a client for the given server base URL.
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base = Url::parse(base_url.trim())
            .with_context(|| format!("Invalid server URL: {base_url}"))?;
        // Keep a trailing slash so joins append instead of replacing the
        // last path segment.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(ApiClient {
            http: reqwest::Client::new(),
            base,
        })
    }

    /// The underlying HTTP client, shared with stream transports.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> ApiResult<Url> {
        self.base
            .join(path)
            .map_err(|err| ApiError::new(format!("Invalid request URL: {err}")))
    }

    pub async fn list_sessions(
        &self,
        status: Option<SessionStatus>,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> ApiResult<SessionList> {
        let url = self.endpoint("sessions")?;
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(status) = status {
            query.push(("status", status.to_string()));
        }
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(offset) = offset {
            query.push(("offset", offset.to_string()));
        }
        let response = self
            .http
            .get(url)
            .query(&query)
            .send()
            .await
            .map_err(|err| ApiError::request(&err))?;
        decode_json(check_status(response).await?).await
    }

    pub async fn create_session(&self) -> ApiResult<Session> {
        let url = self.endpoint("sessions")?;
        let response = self
            .http
            .post(url)
            .send()
            .await
            .map_err(|err| ApiError::request(&err))?;
        decode_json(check_status(response).await?).await
    }

    pub async fn get_session(&self, session_id: &str) -> ApiResult<SessionDetail> {
        let url = self.endpoint(&format!("sessions/{session_id}"))?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| ApiError::request(&err))?;
        decode_json(check_status(response).await?).await
    }

    pub async fn delete_session(&self, session_id: &str) -> ApiResult<()> {
        let url = self.endpoint(&format!("sessions/{session_id}"))?;
        let response = self
            .http
            .delete(url)
            .send()
            .await
            .map_err(|err| ApiError::request(&err))?;
        check_status(response).await?;
        Ok(())
    }

    pub async fn execution_logs(
        &self,
        session_id: &str,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> ApiResult<ExecutionLogList> {
        let url = self.endpoint(&format!("sessions/{session_id}/execution-logs"))?;
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(offset) = offset {
            query.push(("offset", offset.to_string()));
        }
        let response = self
            .http
            .get(url)
            .query(&query)
            .send()
            .await
            .map_err(|err| ApiError::request(&err))?;
        decode_json(check_status(response).await?).await
    }

    /// Takes over a running execution, pausing it server-side and
    /// invalidating the previous streaming connection.
    pub async fn claim_execution(&self, session_id: &str) -> ApiResult<ClaimResponse> {
        let url = self.endpoint(&format!("sessions/{session_id}/claim-execution"))?;
        let response = self
            .http
            .post(url)
            .send()
            .await
            .map_err(|err| ApiError::request(&err))?;
        decode_json(check_status(response).await?).await
    }

    pub async fn execution_heartbeat(
        &self,
        session_id: &str,
        connection_id: &str,
    ) -> ApiResult<HeartbeatResponse> {
        let url = self.endpoint(&format!("sessions/{session_id}/execution-heartbeat"))?;
        let response = self
            .http
            .post(url)
            .json(&serde_json::json!({ "connection_id": connection_id }))
            .send()
            .await
            .map_err(|err| ApiError::request(&err))?;
        decode_json(check_status(response).await?).await
    }

    pub async fn pause_execution(&self, session_id: &str) -> ApiResult<PauseResponse> {
        let url = self.endpoint(&format!("sessions/{session_id}/pause-execution"))?;
        let response = self
            .http
            .post(url)
            .send()
            .await
            .map_err(|err| ApiError::request(&err))?;
        decode_json(check_status(response).await?).await
    }

    pub async fn list_artifacts(
        &self,
        session_id: &str,
        artifact_type: Option<ArtifactType>,
    ) -> ApiResult<ArtifactList> {
        let url = self.endpoint(&format!("sessions/{session_id}/artifacts"))?;
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(artifact_type) = artifact_type {
            query.push(("type", artifact_type.to_string()));
        }
        let response = self
            .http
            .get(url)
            .query(&query)
            .send()
            .await
            .map_err(|err| ApiError::request(&err))?;
        decode_json(check_status(response).await?).await
    }

    pub async fn get_artifact(
        &self,
        session_id: &str,
        artifact_id: &str,
    ) -> ApiResult<Artifact> {
        let url = self.endpoint(&format!("sessions/{session_id}/artifacts/{artifact_id}"))?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| ApiError::request(&err))?;
        decode_json(check_status(response).await?).await
    }

    /// Fetches an artifact as a plain-text file. The filename comes from
    /// the `Content-Disposition` header when the server sends one.
    pub async fn download_artifact(
        &self,
        session_id: &str,
        artifact_id: &str,
    ) -> ApiResult<ArtifactDownload> {
        let url = self.endpoint(&format!(
            "sessions/{session_id}/artifacts/{artifact_id}/download"
        ))?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| ApiError::request(&err))?;
        let response = check_status(response).await?;
        let filename = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(filename_from_content_disposition);
        let content = response
            .text()
            .await
            .map_err(|err| ApiError::decode(&err))?;
        Ok(ArtifactDownload { filename, content })
    }

    pub async fn delete_artifact(&self, session_id: &str, artifact_id: &str) -> ApiResult<()> {
        let url = self.endpoint(&format!("sessions/{session_id}/artifacts/{artifact_id}"))?;
        let response = self
            .http
            .delete(url)
            .send()
            .await
            .map_err(|err| ApiError::request(&err))?;
        check_status(response).await?;
        Ok(())
    }

    pub async fn health(&self) -> ApiResult<Health> {
        let url = self.endpoint("health")?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| ApiError::request(&err))?;
        decode_json(check_status(response).await?).await
    }

    /// Builds the streaming chat request for a session.
    pub fn chat_request(&self, session_id: &str, message: &str) -> ApiResult<StreamRequest> {
        let url = self.endpoint(&format!("sessions/{session_id}/chat"))?;
        Ok(StreamRequest::with_body(
            url,
            serde_json::json!({ "message": message }),
        ))
    }

    /// Builds the streaming execute request for a session.
    pub fn execute_request(&self, session_id: &str) -> ApiResult<StreamRequest> {
        let url = self.endpoint(&format!("sessions/{session_id}/execute"))?;
        Ok(StreamRequest::new(url))
    }

    /// Builds the streaming summarize request for a session.
    pub fn summarize_request(&self, session_id: &str) -> ApiResult<StreamRequest> {
        let url = self.endpoint(&format!("sessions/{session_id}/summarize"))?;
        Ok(StreamRequest::new(url))
    }
}

async fn check_status(response: reqwest::Response) -> ApiResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::http_status(status.as_u16(), &body))
}

async fn decode_json<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|err| ApiError::decode(&err))
}

fn filename_from_content_disposition(value: &str) -> Option<String> {
    let marker = "filename=";
    let idx = value.find(marker)?;
    let raw = value[idx + marker.len()..].trim();
    let raw = raw.split(';').next().unwrap_or(raw).trim();
    let name = raw.trim_matches('"').to_string();
    if name.is_empty() { None } else { Some(name) }
}
