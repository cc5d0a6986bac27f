//! Display updates pushed while a stream is driven.

use tokio::sync::mpsc;

use crate::api::types::{ArtifactSummary, Task};
use crate::session::state::StreamKind;
use crate::session::timeline::TimelineEntry;

/// Buffered channel pair for session updates.
pub fn update_channel() -> (mpsc::Sender<SessionUpdate>, mpsc::Receiver<SessionUpdate>) {
    mpsc::channel(128)
}

/// One display-facing update emitted by the stream driver.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    StreamOpened { kind: StreamKind },
    /// Chat assistant text delta.
    ChatDelta { text: String },
    /// The agent began extracting tasks from the conversation.
    TasksExtracting,
    /// The task list was replaced.
    TasksReplaced { tasks: Vec<Task> },
    /// A non-content execution event became a timeline entry.
    EntryAppended { entry: TimelineEntry },
    /// An artifact was created during summarization.
    ArtifactCreated { artifact: ArtifactSummary },
    /// Summary text delta.
    SummaryDelta { text: String },
    /// The agent renamed the session.
    TitleChanged { title: String },
    StreamFailed { kind: StreamKind, message: String },
    StreamClosed { kind: StreamKind },
    /// Ctrl-C received; the active stream was cancelled.
    Interrupted,
}
