//! Typed stream events.
//!
//! The server tags every frame with a `type` field. Event payload keys are
//! camelCase, except the task snapshots carried by chat `tasks_updated`
//! frames which keep snake_case keys. Unrecognized kinds decode to
//! `Unknown` so newer servers never break the stream.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use crate::api::types::{ArtifactType, Task, TaskStatus};

/// Event on an execute or summarize stream.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExecutionEvent {
    /// First frame of an execute stream, naming the heartbeat connection.
    Connection {
        #[serde(rename = "connectionId")]
        connection_id: String,
    },
    TaskSelected {
        #[serde(rename = "taskId")]
        task_id: String,
    },
    Content {
        #[serde(rename = "taskId", default)]
        task_id: Option<String>,
        content: String,
    },
    ToolCall {
        #[serde(rename = "taskId")]
        task_id: String,
        tool: String,
        input: Value,
    },
    ToolResult {
        #[serde(rename = "taskId")]
        task_id: String,
        tool: String,
        output: String,
    },
    TaskCompleted {
        #[serde(rename = "taskId")]
        task_id: String,
        status: TaskStatus,
        #[serde(default)]
        result: Option<String>,
    },
    Reflection {
        #[serde(rename = "taskId")]
        task_id: String,
        text: String,
    },
    ArtifactCreated {
        #[serde(rename = "taskId", default)]
        task_id: Option<String>,
        #[serde(rename = "artifactId")]
        artifact_id: String,
        name: String,
        #[serde(rename = "artifactType")]
        artifact_type: ArtifactType,
    },
    Paused {
        reason: PauseReason,
    },
    Error {
        #[serde(rename = "taskId", default)]
        task_id: Option<String>,
        error: String,
    },
    /// Final frame. Summarize streams send it without a summary.
    Done {
        #[serde(default)]
        summary: Option<DoneSummary>,
    },
    #[serde(other)]
    Unknown,
}

impl ExecutionEvent {
    /// Wire name of this event's kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ExecutionEvent::Connection { .. } => "connection",
            ExecutionEvent::TaskSelected { .. } => "task_selected",
            ExecutionEvent::Content { .. } => "content",
            ExecutionEvent::ToolCall { .. } => "tool_call",
            ExecutionEvent::ToolResult { .. } => "tool_result",
            ExecutionEvent::TaskCompleted { .. } => "task_completed",
            ExecutionEvent::Reflection { .. } => "reflection",
            ExecutionEvent::ArtifactCreated { .. } => "artifact_created",
            ExecutionEvent::Paused { .. } => "paused",
            ExecutionEvent::Error { .. } => "error",
            ExecutionEvent::Done { .. } => "done",
            ExecutionEvent::Unknown => "unknown",
        }
    }

    /// The task this event belongs to, when it names one.
    pub fn task_id(&self) -> Option<&str> {
        match self {
            ExecutionEvent::TaskSelected { task_id } => Some(task_id),
            ExecutionEvent::Content { task_id, .. } => task_id.as_deref(),
            ExecutionEvent::ToolCall { task_id, .. } => Some(task_id),
            ExecutionEvent::ToolResult { task_id, .. } => Some(task_id),
            ExecutionEvent::TaskCompleted { task_id, .. } => Some(task_id),
            ExecutionEvent::Reflection { task_id, .. } => Some(task_id),
            ExecutionEvent::ArtifactCreated { task_id, .. } => task_id.as_deref(),
            ExecutionEvent::Error { task_id, .. } => task_id.as_deref(),
            _ => None,
        }
    }
}

/// Event on a chat stream.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    TasksExtracting,
    Content { content: String },
    TasksUpdated { tasks: Vec<Task> },
    Error { error: String },
    Done,
    #[serde(other)]
    Unknown,
}

/// Totals reported by the final frame of an execute stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DoneSummary {
    pub total: u32,
    pub completed: u32,
    pub failed: u32,
}

/// Why the server paused an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseReason {
    ClientDisconnected,
    HeartbeatTimeout,
    PauseRequested,
    #[serde(other)]
    Other,
}

impl PauseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            PauseReason::ClientDisconnected => "client_disconnected",
            PauseReason::HeartbeatTimeout => "heartbeat_timeout",
            PauseReason::PauseRequested => "pause_requested",
            PauseReason::Other => "unknown",
        }
    }
}

impl fmt::Display for PauseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_call_keeps_structured_input() {
        let json = r#"{"type":"tool_call","taskId":"t-1","tool":"web_search","input":{"query":"rust"}}"#;
        let event: ExecutionEvent = serde_json::from_str(json).unwrap();
        match event {
            ExecutionEvent::ToolCall { task_id, tool, input } => {
                assert_eq!(task_id, "t-1");
                assert_eq!(tool, "web_search");
                assert_eq!(input["query"], "rust");
            }
            other => panic!("Unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_artifact_created_without_task() {
        let json = r#"{"type":"artifact_created","taskId":null,"artifactId":"a-1","name":"Summary","artifactType":"summary"}"#;
        let event: ExecutionEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            ExecutionEvent::ArtifactCreated {
                task_id: None,
                artifact_id: "a-1".to_string(),
                name: "Summary".to_string(),
                artifact_type: ArtifactType::Summary,
            }
        );
        assert_eq!(event.task_id(), None);
    }

    #[test]
    fn test_done_with_and_without_summary() {
        let with: ExecutionEvent =
            serde_json::from_str(r#"{"type":"done","summary":{"total":3,"completed":2,"failed":1}}"#)
                .unwrap();
        assert_eq!(
            with,
            ExecutionEvent::Done {
                summary: Some(DoneSummary {
                    total: 3,
                    completed: 2,
                    failed: 1
                })
            }
        );

        // Summarize streams end with a bare done frame.
        let without: ExecutionEvent = serde_json::from_str(r#"{"type":"done"}"#).unwrap();
        assert_eq!(without, ExecutionEvent::Done { summary: None });
    }

    #[test]
    fn test_unknown_kind_decodes_to_unknown() {
        let event: ExecutionEvent =
            serde_json::from_str(r#"{"type":"telemetry","payload":{"x":1}}"#).unwrap();
        assert_eq!(event, ExecutionEvent::Unknown);
        assert_eq!(event.kind(), "unknown");
    }

    #[test]
    fn test_paused_with_unfamiliar_reason() {
        let known: ExecutionEvent =
            serde_json::from_str(r#"{"type":"paused","reason":"heartbeat_timeout"}"#).unwrap();
        assert_eq!(
            known,
            ExecutionEvent::Paused {
                reason: PauseReason::HeartbeatTimeout
            }
        );

        let novel: ExecutionEvent =
            serde_json::from_str(r#"{"type":"paused","reason":"operator_request"}"#).unwrap();
        assert_eq!(
            novel,
            ExecutionEvent::Paused {
                reason: PauseReason::Other
            }
        );
    }

    #[test]
    fn test_reflection_event() {
        let json = r#"{"type":"reflection","taskId":"t-2","text":"Next time, cache the results."}"#;
        let event: ExecutionEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            ExecutionEvent::Reflection {
                task_id: "t-2".to_string(),
                text: "Next time, cache the results.".to_string(),
            }
        );
    }

    #[test]
    fn test_chat_tasks_updated_uses_snake_case_tasks() {
        let json = r#"{
            "type": "tasks_updated",
            "tasks": [{
                "id": "t-1",
                "session_id": "s-1",
                "title": "Collect sources",
                "description": null,
                "status": "pending",
                "result": null,
                "order": 0,
                "created_at": "2025-01-01T00:00:00Z",
                "updated_at": "2025-01-01T00:00:00Z"
            }]
        }"#;
        let event: ChatEvent = serde_json::from_str(json).unwrap();
        match event {
            ChatEvent::TasksUpdated { tasks } => {
                assert_eq!(tasks.len(), 1);
                assert_eq!(tasks[0].session_id, "s-1");
                assert_eq!(tasks[0].status, TaskStatus::Pending);
            }
            other => panic!("Unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_chat_unit_frames() {
        let extracting: ChatEvent =
            serde_json::from_str(r#"{"type":"tasks_extracting"}"#).unwrap();
        assert_eq!(extracting, ChatEvent::TasksExtracting);

        let done: ChatEvent = serde_json::from_str(r#"{"type":"done"}"#).unwrap();
        assert_eq!(done, ChatEvent::Done);
    }
}
