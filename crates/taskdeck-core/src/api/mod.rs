//! REST client and wire types for the taskdeck server.

pub mod client;
pub mod types;

pub use client::{ApiClient, ApiError, ApiResult, ArtifactDownload};
pub use types::{
    Artifact, ArtifactList, ArtifactSummary, ArtifactType, ChatMessage, ClaimResponse,
    ExecutionLog, ExecutionLogList, Health, HeartbeatResponse, PauseResponse, Session,
    SessionDetail, SessionList, SessionStatus, Task, TaskStatus,
};
