//! Timeline entries and history replay.
//!
//! A session's timeline is persisted history followed by live entries, in
//! arrival order. History is authoritative for past entries and live events
//! are strictly newer, so nothing is re-sorted or deduplicated.

use serde_json::Value;

use crate::api::types::{ChatMessage, ExecutionLog, Task};
use crate::session::events::ExecutionEvent;

/// Label of the marker inserted before replayed execution history.
pub const EXECUTION_STARTED_MARKER: &str = "Execution started";

/// One display row in a session timeline.
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineEntry {
    /// A conversational message.
    Message { role: String, content: String },
    /// A synthetic divider.
    Marker { label: String },
    /// An execution event, enriched with the referenced task's title.
    Event {
        /// Wire kind, preserved verbatim for rows this client no longer
        /// decodes.
        kind: String,
        event: ExecutionEvent,
        task_title: Option<String>,
    },
}

impl TimelineEntry {
    pub fn message(role: impl Into<String>, content: impl Into<String>) -> Self {
        TimelineEntry::Message {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn marker(label: impl Into<String>) -> Self {
        TimelineEntry::Marker {
            label: label.into(),
        }
    }
}

/// Seeds a timeline from persisted history: chat messages first, then a
/// marker and the replayed execution events. `logs` is `None` when the
/// session never started executing.
pub fn seed_history(
    messages: &[ChatMessage],
    logs: Option<&[ExecutionLog]>,
    tasks: &[Task],
) -> Vec<TimelineEntry> {
    let mut entries: Vec<TimelineEntry> = messages
        .iter()
        .map(|message| TimelineEntry::message(message.role.clone(), message.content.clone()))
        .collect();
    if let Some(logs) = logs {
        entries.push(TimelineEntry::marker(EXECUTION_STARTED_MARKER));
        entries.extend(logs.iter().filter_map(|log| entry_from_log(log, tasks)));
    }
    entries
}

/// Builds the entry for a live event. Content deltas are intermediate
/// model tokens and connection frames are transport plumbing; neither is
/// a timeline entry, so both yield `None`.
pub fn entry_for_event(event: &ExecutionEvent, tasks: &[Task]) -> Option<TimelineEntry> {
    if matches!(
        event,
        ExecutionEvent::Content { .. } | ExecutionEvent::Connection { .. }
    ) {
        return None;
    }
    Some(TimelineEntry::Event {
        kind: event.kind().to_string(),
        event: event.clone(),
        task_title: resolve_task_title(event, tasks),
    })
}

/// Rebuilds the entry for a persisted log row, with the same content
/// exclusion and title enrichment as live events.
pub fn entry_from_log(log: &ExecutionLog, tasks: &[Task]) -> Option<TimelineEntry> {
    if log.event_type == "content" {
        return None;
    }
    let event = decode_log_event(log);
    let task_title = resolve_task_title(&event, tasks).or_else(|| {
        // Rows that decode to Unknown still carry their own task id column.
        let task_id = log.task_id.as_deref()?;
        title_of(tasks, task_id)
    });
    Some(TimelineEntry::Event {
        kind: log.event_type.clone(),
        event,
        task_title,
    })
}

/// Looks up the title of the task an event references.
pub fn resolve_task_title(event: &ExecutionEvent, tasks: &[Task]) -> Option<String> {
    let task_id = event.task_id()?;
    title_of(tasks, task_id)
}

fn title_of(tasks: &[Task], task_id: &str) -> Option<String> {
    tasks
        .iter()
        .find(|task| task.id == task_id)
        .map(|task| task.title.clone())
}

fn decode_log_event(log: &ExecutionLog) -> ExecutionEvent {
    let mut data = log.event_data.clone();
    match &mut data {
        Value::Object(map) => {
            map.entry("type")
                .or_insert_with(|| Value::String(log.event_type.clone()));
        }
        _ => {
            data = serde_json::json!({ "type": log.event_type });
        }
    }
    serde_json::from_value(data).unwrap_or(ExecutionEvent::Unknown)
}
