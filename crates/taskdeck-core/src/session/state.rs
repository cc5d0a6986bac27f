//! Session state and the event reducer.
//!
//! All stream events funnel through one reducer: `(state, event) -> effects`.
//! The reducer owns every state mutation; side effects that need I/O
//! (heartbeats, the follow-up summarize stream, busy-flag changes) are
//! returned as [`SessionEffect`] values for the stream driver to perform.

use std::fmt;

use crate::api::types::{
    ArtifactSummary, ArtifactType, ExecutionLog, Session, SessionDetail, SessionStatus, Task,
    TaskStatus,
};
use crate::session::events::{ChatEvent, ExecutionEvent};
use crate::session::timeline::{self, TimelineEntry};

/// Which of the three streams an update or failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Chat,
    Execution,
    Summarize,
}

impl StreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Chat => "chat",
            StreamKind::Execution => "execution",
            StreamKind::Summarize => "summarize",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Side effect requested by the reducer, performed by the stream driver.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEffect {
    /// Set this session's busy flag.
    SetBusy(bool),
    /// Begin posting heartbeats for the named server connection.
    StartHeartbeat { connection_id: String },
    StopHeartbeat,
    /// Execution finished; open the summarize stream. The busy flag stays
    /// set until the summarize stream completes.
    StartSummarize,
    /// The agent may have renamed the session; re-fetch its title.
    RefreshTitle,
}

/// Client-side view of one session.
#[derive(Debug)]
pub struct SessionState {
    pub session: Session,
    pub tasks: Vec<Task>,
    pub artifacts: Vec<ArtifactSummary>,
    pub timeline: Vec<TimelineEntry>,
    /// Assistant text accumulating during a chat turn.
    pub chat_buffer: String,
    /// Summary text accumulating during summarization.
    pub summary_buffer: String,
    /// The agent is currently extracting tasks from the conversation.
    pub extracting: bool,
    /// Heartbeat connection id from the execute stream's first frame.
    pub connection_id: Option<String>,
}

impl SessionState {
    /// Builds state from a loaded session, seeding the timeline from
    /// persisted history. `logs` is `None` for sessions that never started
    /// executing.
    pub fn from_detail(detail: SessionDetail, logs: Option<&[ExecutionLog]>) -> Self {
        let timeline = timeline::seed_history(&detail.messages, logs, &detail.tasks);
        SessionState {
            session: detail.session,
            tasks: detail.tasks,
            artifacts: detail.artifacts,
            timeline,
            chat_buffer: String::new(),
            summary_buffer: String::new(),
            extracting: false,
            connection_id: None,
        }
    }

    pub fn can_chat(&self) -> bool {
        self.session.status != SessionStatus::Completed
    }

    /// Checks whether an execute request would be accepted, with the same
    /// refusals the server reports.
    pub fn check_can_execute(&self) -> Result<(), String> {
        if self.session.status == SessionStatus::Completed {
            return Err("Session is already completed".to_string());
        }
        if self
            .tasks
            .iter()
            .any(|task| task.status != TaskStatus::Done)
        {
            Ok(())
        } else {
            Err("No tasks to execute".to_string())
        }
    }

    /// Records the outgoing user message before a chat stream opens.
    pub fn push_user_message(&mut self, content: &str) {
        self.timeline.push(TimelineEntry::message("user", content));
    }

    /// Routes one chat stream event.
    pub fn apply_chat(&mut self, event: ChatEvent) -> Vec<SessionEffect> {
        match event {
            ChatEvent::TasksExtracting => {
                self.extracting = true;
                Vec::new()
            }
            ChatEvent::Content { content } => {
                self.chat_buffer.push_str(&content);
                Vec::new()
            }
            ChatEvent::TasksUpdated { tasks } => {
                self.tasks = tasks;
                self.extracting = false;
                Vec::new()
            }
            ChatEvent::Done => {
                if !self.chat_buffer.is_empty() {
                    let content = std::mem::take(&mut self.chat_buffer);
                    self.timeline
                        .push(TimelineEntry::message("assistant", content));
                }
                self.extracting = false;
                vec![SessionEffect::SetBusy(false), SessionEffect::RefreshTitle]
            }
            ChatEvent::Error { .. } => {
                self.chat_buffer.clear();
                self.extracting = false;
                vec![SessionEffect::SetBusy(false)]
            }
            ChatEvent::Unknown => Vec::new(),
        }
    }

    /// Routes one execute stream event.
    ///
    /// Every event except content deltas becomes a timeline entry; most are
    /// also interpreted into task, artifact or status changes.
    pub fn apply_execution(&mut self, event: ExecutionEvent) -> Vec<SessionEffect> {
        let mut effects = Vec::new();
        match &event {
            ExecutionEvent::Connection { connection_id } => {
                self.connection_id = Some(connection_id.clone());
                effects.push(SessionEffect::StartHeartbeat {
                    connection_id: connection_id.clone(),
                });
            }
            ExecutionEvent::TaskSelected { task_id } => {
                self.set_task_status(task_id, TaskStatus::InProgress);
            }
            ExecutionEvent::Content { .. } => {}
            ExecutionEvent::ToolCall { .. } | ExecutionEvent::ToolResult { .. } => {}
            ExecutionEvent::TaskCompleted {
                task_id,
                status,
                result,
            } => {
                if let Some(task) = self.task_mut(task_id) {
                    task.status = *status;
                    task.result = result.clone();
                }
            }
            ExecutionEvent::Reflection { task_id, text } => {
                if let Some(task) = self.task_mut(task_id) {
                    task.reflection = Some(text.clone());
                }
            }
            ExecutionEvent::ArtifactCreated {
                task_id,
                artifact_id,
                name,
                artifact_type,
            } => {
                self.push_artifact(
                    artifact_id.clone(),
                    task_id.clone(),
                    name.clone(),
                    *artifact_type,
                );
            }
            ExecutionEvent::Paused { .. } => {
                // The in-progress task is left as-is so a resume sees it.
                self.session.status = SessionStatus::Paused;
                effects.push(SessionEffect::SetBusy(false));
                effects.push(SessionEffect::StopHeartbeat);
            }
            ExecutionEvent::Error { task_id, .. } => match task_id {
                // A task-scoped error fails that task; the run continues.
                Some(task_id) => self.set_task_status(task_id, TaskStatus::Failed),
                // Without a task reference the whole run is over.
                None => {
                    effects.push(SessionEffect::SetBusy(false));
                    effects.push(SessionEffect::StopHeartbeat);
                }
            },
            ExecutionEvent::Done { .. } => {
                self.session.status = SessionStatus::Completed;
                effects.push(SessionEffect::StopHeartbeat);
                effects.push(SessionEffect::StartSummarize);
            }
            ExecutionEvent::Unknown => {}
        }
        if let Some(entry) = timeline::entry_for_event(&event, &self.tasks) {
            self.timeline.push(entry);
        }
        effects
    }

    /// Routes one summarize stream event. Summarize events do not become
    /// timeline entries; the finished summary does, as a message.
    pub fn apply_summarize(&mut self, event: ExecutionEvent) -> Vec<SessionEffect> {
        match event {
            ExecutionEvent::Content { content, .. } => {
                self.summary_buffer.push_str(&content);
                Vec::new()
            }
            ExecutionEvent::ArtifactCreated {
                task_id,
                artifact_id,
                name,
                artifact_type,
            } => {
                self.push_artifact(artifact_id, task_id, name, artifact_type);
                Vec::new()
            }
            ExecutionEvent::Done { .. } => {
                if !self.summary_buffer.is_empty() {
                    let content = std::mem::take(&mut self.summary_buffer);
                    self.timeline
                        .push(TimelineEntry::message("assistant", content));
                }
                vec![SessionEffect::SetBusy(false)]
            }
            ExecutionEvent::Error { .. } => {
                self.summary_buffer.clear();
                vec![SessionEffect::SetBusy(false)]
            }
            _ => Vec::new(),
        }
    }

    /// Routes a transport-level failure: the in-progress buffer for that
    /// stream is dropped and the busy lock released.
    pub fn apply_stream_error(&mut self, kind: StreamKind) -> Vec<SessionEffect> {
        match kind {
            StreamKind::Chat => {
                self.chat_buffer.clear();
                self.extracting = false;
                vec![SessionEffect::SetBusy(false)]
            }
            StreamKind::Execution => {
                vec![SessionEffect::SetBusy(false), SessionEffect::StopHeartbeat]
            }
            StreamKind::Summarize => {
                self.summary_buffer.clear();
                vec![SessionEffect::SetBusy(false)]
            }
        }
    }

    fn task_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == task_id)
    }

    fn set_task_status(&mut self, task_id: &str, status: TaskStatus) {
        if let Some(task) = self.task_mut(task_id) {
            task.status = status;
        }
    }

    fn push_artifact(
        &mut self,
        artifact_id: String,
        task_id: Option<String>,
        name: String,
        artifact_type: ArtifactType,
    ) {
        self.artifacts.push(ArtifactSummary {
            id: artifact_id,
            session_id: self.session.id.clone(),
            task_id,
            name,
            artifact_type,
            created_at: None,
        });
    }
}

#[cfg(test)]
mod tests {
    use crate::session::events::{DoneSummary, PauseReason};

    use super::*;

    fn task(id: &str, title: &str, status: TaskStatus) -> Task {
        Task {
            id: id.to_string(),
            session_id: "s-1".to_string(),
            title: title.to_string(),
            description: None,
            status,
            result: None,
            reflection: None,
            order: 0,
            created_at: None,
            updated_at: None,
        }
    }

    fn state(status: SessionStatus, tasks: Vec<Task>) -> SessionState {
        SessionState {
            session: Session {
                id: "s-1".to_string(),
                title: "Research".to_string(),
                status,
                created_at: "2025-01-01T00:00:00Z".to_string(),
                updated_at: "2025-01-01T00:00:00Z".to_string(),
            },
            tasks,
            artifacts: Vec::new(),
            timeline: Vec::new(),
            chat_buffer: String::new(),
            summary_buffer: String::new(),
            extracting: false,
            connection_id: None,
        }
    }

    #[test]
    fn test_execution_run_updates_task_and_holds_lock() {
        let mut state = state(
            SessionStatus::Executing,
            vec![task("t-1", "First task", TaskStatus::Pending)],
        );

        let events = vec![
            ExecutionEvent::TaskSelected {
                task_id: "t-1".to_string(),
            },
            ExecutionEvent::ToolCall {
                task_id: "t-1".to_string(),
                tool: "web_search".to_string(),
                input: serde_json::json!({"query": "rust"}),
            },
            ExecutionEvent::ToolResult {
                task_id: "t-1".to_string(),
                tool: "web_search".to_string(),
                output: "results".to_string(),
            },
            ExecutionEvent::TaskCompleted {
                task_id: "t-1".to_string(),
                status: TaskStatus::Done,
                result: Some("ok".to_string()),
            },
        ];
        for event in events {
            assert!(state.apply_execution(event).is_empty());
        }

        let effects = state.apply_execution(ExecutionEvent::Done {
            summary: Some(DoneSummary {
                total: 1,
                completed: 1,
                failed: 0,
            }),
        });

        assert_eq!(state.tasks[0].status, TaskStatus::Done);
        assert_eq!(state.tasks[0].result.as_deref(), Some("ok"));
        assert_eq!(state.session.status, SessionStatus::Completed);
        assert_eq!(state.timeline.len(), 5);
        // The lock is not released here; it stays held through summarize.
        assert_eq!(
            effects,
            vec![SessionEffect::StopHeartbeat, SessionEffect::StartSummarize]
        );
    }

    #[test]
    fn test_paused_keeps_in_progress_task() {
        let mut state = state(
            SessionStatus::Executing,
            vec![task("t-1", "First task", TaskStatus::InProgress)],
        );

        let effects = state.apply_execution(ExecutionEvent::Paused {
            reason: PauseReason::HeartbeatTimeout,
        });

        assert_eq!(state.session.status, SessionStatus::Paused);
        assert_eq!(state.tasks[0].status, TaskStatus::InProgress);
        assert_eq!(
            effects,
            vec![SessionEffect::SetBusy(false), SessionEffect::StopHeartbeat]
        );
        assert_eq!(state.timeline.len(), 1);
    }

    #[test]
    fn test_task_error_fails_only_that_task() {
        let mut state = state(
            SessionStatus::Executing,
            vec![
                task("t-1", "First task", TaskStatus::InProgress),
                task("t-2", "Second task", TaskStatus::Pending),
            ],
        );

        let effects = state.apply_execution(ExecutionEvent::Error {
            task_id: Some("t-1".to_string()),
            error: "tool exploded".to_string(),
        });

        assert_eq!(state.tasks[0].status, TaskStatus::Failed);
        assert_eq!(state.tasks[1].status, TaskStatus::Pending);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_fatal_error_releases_lock() {
        let mut state = state(
            SessionStatus::Executing,
            vec![task("t-1", "First task", TaskStatus::InProgress)],
        );

        let effects = state.apply_execution(ExecutionEvent::Error {
            task_id: None,
            error: "model unavailable".to_string(),
        });

        assert_eq!(
            effects,
            vec![SessionEffect::SetBusy(false), SessionEffect::StopHeartbeat]
        );
        // Status is the server's to change; a fatal error does not complete
        // the session locally.
        assert_eq!(state.session.status, SessionStatus::Executing);
        assert_eq!(state.timeline.len(), 1);
    }

    #[test]
    fn test_task_completed_touches_exactly_one_task() {
        let mut state = state(
            SessionStatus::Executing,
            vec![
                task("t-1", "First task", TaskStatus::InProgress),
                task("t-2", "Second task", TaskStatus::Pending),
            ],
        );

        state.apply_execution(ExecutionEvent::TaskCompleted {
            task_id: "t-1".to_string(),
            status: TaskStatus::Done,
            result: Some("ok".to_string()),
        });

        assert_eq!(state.tasks[0].status, TaskStatus::Done);
        assert_eq!(state.tasks[1].status, TaskStatus::Pending);
        assert_eq!(state.tasks[1].result, None);
    }

    #[test]
    fn test_connection_starts_heartbeat() {
        let mut state = state(SessionStatus::Executing, Vec::new());

        let effects = state.apply_execution(ExecutionEvent::Connection {
            connection_id: "conn-1".to_string(),
        });

        assert_eq!(state.connection_id.as_deref(), Some("conn-1"));
        assert_eq!(
            effects,
            vec![SessionEffect::StartHeartbeat {
                connection_id: "conn-1".to_string()
            }]
        );
        // Connection frames are transport plumbing, not timeline rows.
        assert!(state.timeline.is_empty());
    }

    #[test]
    fn test_execution_content_is_discarded() {
        let mut state = state(SessionStatus::Executing, Vec::new());

        let effects = state.apply_execution(ExecutionEvent::Content {
            task_id: Some("t-1".to_string()),
            content: "token".to_string(),
        });

        assert!(effects.is_empty());
        assert!(state.timeline.is_empty());
        assert!(state.summary_buffer.is_empty());
    }

    #[test]
    fn test_chat_content_accumulates_buffer() {
        let mut state = state(SessionStatus::Planning, Vec::new());

        state.apply_chat(ChatEvent::Content {
            content: "a".to_string(),
        });
        assert_eq!(state.chat_buffer, "a");

        state.apply_chat(ChatEvent::Content {
            content: "b".to_string(),
        });
        assert_eq!(state.chat_buffer, "ab");
    }

    #[test]
    fn test_chat_done_finalizes_message() {
        let mut state = state(SessionStatus::Planning, Vec::new());
        state.apply_chat(ChatEvent::Content {
            content: "ab".to_string(),
        });

        let effects = state.apply_chat(ChatEvent::Done);

        assert!(state.chat_buffer.is_empty());
        assert_eq!(
            state.timeline.last(),
            Some(&TimelineEntry::message("assistant", "ab"))
        );
        assert_eq!(
            effects,
            vec![SessionEffect::SetBusy(false), SessionEffect::RefreshTitle]
        );
    }

    #[test]
    fn test_chat_error_drops_buffer_without_message() {
        let mut state = state(SessionStatus::Planning, Vec::new());
        state.apply_chat(ChatEvent::Content {
            content: "half a thou".to_string(),
        });

        let effects = state.apply_chat(ChatEvent::Error {
            error: "backend failure".to_string(),
        });

        assert!(state.chat_buffer.is_empty());
        assert!(state.timeline.is_empty());
        assert_eq!(effects, vec![SessionEffect::SetBusy(false)]);
    }

    #[test]
    fn test_tasks_updated_replaces_wholesale() {
        let mut state = state(
            SessionStatus::Planning,
            vec![task("old", "Old task", TaskStatus::Pending)],
        );
        state.apply_chat(ChatEvent::TasksExtracting);
        assert!(state.extracting);

        state.apply_chat(ChatEvent::TasksUpdated {
            tasks: vec![
                task("t-1", "New first", TaskStatus::Pending),
                task("t-2", "New second", TaskStatus::Pending),
            ],
        });

        assert_eq!(state.tasks.len(), 2);
        assert_eq!(state.tasks[0].id, "t-1");
        assert!(!state.extracting);
    }

    #[test]
    fn test_reflection_recorded_on_task() {
        let mut state = state(
            SessionStatus::Executing,
            vec![task("t-1", "First task", TaskStatus::Done)],
        );

        state.apply_execution(ExecutionEvent::Reflection {
            task_id: "t-1".to_string(),
            text: "Cache the lookups next time.".to_string(),
        });

        assert_eq!(
            state.tasks[0].reflection.as_deref(),
            Some("Cache the lookups next time.")
        );
    }

    #[test]
    fn test_artifact_created_appends_artifact_and_entry() {
        let mut state = state(SessionStatus::Executing, Vec::new());

        state.apply_execution(ExecutionEvent::ArtifactCreated {
            task_id: Some("t-1".to_string()),
            artifact_id: "a-1".to_string(),
            name: "Findings".to_string(),
            artifact_type: ArtifactType::Document,
        });

        assert_eq!(state.artifacts.len(), 1);
        assert_eq!(state.artifacts[0].id, "a-1");
        assert_eq!(state.artifacts[0].session_id, "s-1");
        assert_eq!(state.timeline.len(), 1);
    }

    #[test]
    fn test_summarize_flow() {
        let mut state = state(SessionStatus::Completed, Vec::new());

        state.apply_summarize(ExecutionEvent::Content {
            task_id: None,
            content: "All tasks ".to_string(),
        });
        state.apply_summarize(ExecutionEvent::Content {
            task_id: None,
            content: "finished.".to_string(),
        });
        state.apply_summarize(ExecutionEvent::ArtifactCreated {
            task_id: None,
            artifact_id: "a-9".to_string(),
            name: "Execution Summary".to_string(),
            artifact_type: ArtifactType::Summary,
        });

        // The artifact joins the list without a timeline entry.
        assert_eq!(state.artifacts.len(), 1);
        assert!(state.timeline.is_empty());

        let effects = state.apply_summarize(ExecutionEvent::Done { summary: None });

        assert_eq!(
            state.timeline.last(),
            Some(&TimelineEntry::message("assistant", "All tasks finished."))
        );
        assert!(state.summary_buffer.is_empty());
        assert_eq!(effects, vec![SessionEffect::SetBusy(false)]);
    }

    #[test]
    fn test_stream_error_clears_buffers() {
        let mut state = state(SessionStatus::Planning, Vec::new());
        state.apply_chat(ChatEvent::Content {
            content: "partial".to_string(),
        });

        let effects = state.apply_stream_error(StreamKind::Chat);
        assert!(state.chat_buffer.is_empty());
        assert_eq!(effects, vec![SessionEffect::SetBusy(false)]);

        let effects = state.apply_stream_error(StreamKind::Execution);
        assert_eq!(
            effects,
            vec![SessionEffect::SetBusy(false), SessionEffect::StopHeartbeat]
        );
    }

    #[test]
    fn test_check_can_execute() {
        let completed = state(SessionStatus::Completed, Vec::new());
        assert_eq!(
            completed.check_can_execute(),
            Err("Session is already completed".to_string())
        );

        let no_tasks = state(SessionStatus::Planning, Vec::new());
        assert_eq!(
            no_tasks.check_can_execute(),
            Err("No tasks to execute".to_string())
        );

        let all_done = state(
            SessionStatus::Planning,
            vec![task("t-1", "First task", TaskStatus::Done)],
        );
        assert_eq!(
            all_done.check_can_execute(),
            Err("No tasks to execute".to_string())
        );

        let pending = state(
            SessionStatus::Planning,
            vec![task("t-1", "First task", TaskStatus::Pending)],
        );
        assert_eq!(pending.check_can_execute(), Ok(()));

        // Failed and in-progress tasks are resumable.
        let paused = state(
            SessionStatus::Paused,
            vec![task("t-1", "First task", TaskStatus::Failed)],
        );
        assert_eq!(paused.check_can_execute(), Ok(()));
    }

    #[test]
    fn test_can_chat() {
        assert!(state(SessionStatus::Planning, Vec::new()).can_chat());
        assert!(state(SessionStatus::Paused, Vec::new()).can_chat());
        assert!(!state(SessionStatus::Completed, Vec::new()).can_chat());
    }
}
