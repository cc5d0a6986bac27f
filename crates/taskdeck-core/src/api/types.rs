//! Wire types for the taskdeck server REST API.
//!
//! Most response bodies use camelCase keys. The claim, heartbeat and pause
//! endpoints are the exception and stay snake_case, as do the task
//! snapshots embedded in chat `tasks_updated` events.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;

/// Session lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Planning,
    Executing,
    Paused,
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Planning => "planning",
            SessionStatus::Executing => "executing",
            SessionStatus::Paused => "paused",
            SessionStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "planning" => Ok(SessionStatus::Planning),
            "executing" => Ok(SessionStatus::Executing),
            "paused" => Ok(SessionStatus::Paused),
            "completed" => Ok(SessionStatus::Completed),
            _ => Err(format!("Unknown session status: {value}")),
        }
    }
}

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Done,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
            TaskStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Artifact content category, which also decides the download extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactType {
    Document,
    Note,
    Summary,
    Plan,
    Other,
}

impl ArtifactType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactType::Document => "document",
            ArtifactType::Note => "note",
            ArtifactType::Summary => "summary",
            ArtifactType::Plan => "plan",
            ArtifactType::Other => "other",
        }
    }

    /// File extension used when saving this artifact to disk.
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactType::Document | ArtifactType::Summary | ArtifactType::Plan => ".md",
            ArtifactType::Note | ArtifactType::Other => ".txt",
        }
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "document" => Ok(ArtifactType::Document),
            "note" => Ok(ArtifactType::Note),
            "summary" => Ok(ArtifactType::Summary),
            "plan" => Ok(ArtifactType::Plan),
            "other" => Ok(ArtifactType::Other),
            _ => Err(format!("Unknown artifact type: {value}")),
        }
    }
}

/// A session row as returned by the list and create endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub title: String,
    pub status: SessionStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Session detail: the session plus its related collections.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionDetail {
    #[serde(flatten)]
    pub session: Session,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactSummary>,
}

/// A task within a session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    #[serde(alias = "session_id")]
    pub session_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: TaskStatus,
    #[serde(default)]
    pub result: Option<String>,
    /// Agent's post-completion reflection, filled in from the stream.
    #[serde(default)]
    pub reflection: Option<String>,
    pub order: u32,
    #[serde(default, alias = "created_at")]
    pub created_at: Option<String>,
    #[serde(default, alias = "updated_at")]
    pub updated_at: Option<String>,
}

/// A conversation message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// A persisted execution event.
///
/// `event_type` stays a plain string so rows written by older server
/// versions never fail to decode.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionLog {
    pub id: String,
    pub session_id: String,
    #[serde(default)]
    pub task_id: Option<String>,
    pub event_type: String,
    #[serde(default)]
    pub event_data: Value,
    pub created_at: String,
}

/// Artifact metadata without content.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactSummary {
    pub id: String,
    pub session_id: String,
    #[serde(default)]
    pub task_id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub artifact_type: ArtifactType,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A full artifact with content.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Artifact {
    #[serde(flatten)]
    pub summary: ArtifactSummary,
    pub content: String,
}

/// Response of `GET /sessions`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionList {
    pub sessions: Vec<Session>,
    pub total: u64,
}

/// Response of `GET /sessions/{id}/execution-logs`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExecutionLogList {
    pub logs: Vec<ExecutionLog>,
    pub total: u64,
}

/// Response of `GET /sessions/{id}/artifacts`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArtifactList {
    pub artifacts: Vec<ArtifactSummary>,
}

/// Response of `POST /sessions/{id}/claim-execution`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClaimResponse {
    pub claimed: bool,
    pub status: String,
    #[serde(default)]
    pub connection_id: Option<String>,
}

/// Response of `POST /sessions/{id}/execution-heartbeat`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HeartbeatResponse {
    pub active: bool,
}

/// Response of `POST /sessions/{id}/pause-execution`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PauseResponse {
    pub paused: bool,
    pub status: String,
}

/// Response of `GET /health`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Health {
    pub status: String,
    pub timestamp: String,
}
