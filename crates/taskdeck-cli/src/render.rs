//! Terminal rendering: tables, timeline lines and the live update printer.

use std::io::Write;

use comfy_table::{ContentArrangement, Table, presets};
use taskdeck_core::api::types::{ArtifactSummary, Session, Task};
use taskdeck_core::session::events::ExecutionEvent;
use taskdeck_core::session::state::StreamKind;
use taskdeck_core::session::timeline::TimelineEntry;
use taskdeck_core::session::updates::SessionUpdate;
use tokio::sync::mpsc;

fn table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_BORDERS_ONLY)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn session_table(sessions: &[Session]) -> Table {
    let mut t = table();
    t.set_header(vec!["ID", "Title", "Status", "Updated"]);
    for session in sessions {
        t.add_row(vec![
            session.id.as_str(),
            session.title.as_str(),
            session.status.as_str(),
            session.updated_at.as_str(),
        ]);
    }
    t
}

pub fn task_table(tasks: &[Task]) -> Table {
    let mut t = table();
    t.set_header(vec!["#", "Title", "Status", "Result"]);
    for task in tasks {
        t.add_row(vec![
            task.order.to_string(),
            task.title.clone(),
            task.status.to_string(),
            task.result.clone().unwrap_or_default(),
        ]);
    }
    t
}

pub fn artifact_table(artifacts: &[ArtifactSummary]) -> Table {
    let mut t = table();
    t.set_header(vec!["ID", "Name", "Type", "Created"]);
    for artifact in artifacts {
        t.add_row(vec![
            artifact.id.as_str(),
            artifact.name.as_str(),
            artifact.artifact_type.as_str(),
            artifact.created_at.as_deref().unwrap_or(""),
        ]);
    }
    t
}

/// Formats one timeline entry as a display line (or block, for messages).
pub fn entry_line(entry: &TimelineEntry) -> String {
    match entry {
        TimelineEntry::Message { role, content } => {
            let heading = match role.as_str() {
                "user" => "### You",
                "assistant" => "### Assistant",
                other => return format!("[{other}] {content}"),
            };
            format!("{heading}\n{content}")
        }
        TimelineEntry::Marker { label } => format!("-- {label} --"),
        TimelineEntry::Event {
            kind,
            event,
            task_title,
        } => event_line(kind, event, task_title.as_deref()),
    }
}

fn event_line(kind: &str, event: &ExecutionEvent, task_title: Option<&str>) -> String {
    let task = |id: &str| task_title.map_or_else(|| id.to_string(), str::to_string);
    match event {
        ExecutionEvent::TaskSelected { task_id } => {
            format!("> Task started: {}", task(task_id))
        }
        ExecutionEvent::ToolCall { tool, input, .. } => {
            format!("  {tool} {input}")
        }
        ExecutionEvent::ToolResult { tool, output, .. } => {
            format!("  {tool} -> {output}")
        }
        ExecutionEvent::TaskCompleted {
            task_id,
            status,
            result,
        } => {
            let mut line = format!("* Task {status}: {}", task(task_id));
            if let Some(result) = result {
                line.push_str(&format!(" ({result})"));
            }
            line
        }
        ExecutionEvent::Reflection { text, .. } => format!("  reflection: {text}"),
        ExecutionEvent::ArtifactCreated {
            name,
            artifact_type,
            ..
        } => format!("+ Artifact created: {name} ({artifact_type})"),
        ExecutionEvent::Paused { reason } => format!("|| Execution paused ({reason})"),
        ExecutionEvent::Error { task_id, error } => match task_id {
            Some(task_id) => format!("! Task failed: {} ({error})", task(task_id)),
            None => format!("! Execution error: {error}"),
        },
        ExecutionEvent::Done { summary } => match summary {
            Some(summary) => format!(
                "* Execution finished: {}/{} done, {} failed",
                summary.completed, summary.total, summary.failed
            ),
            None => "* Done".to_string(),
        },
        // Rows replayed from logs may carry kinds this client never
        // decodes; content deltas and connection frames never become
        // entries at all but the match must stay exhaustive.
        ExecutionEvent::Content { .. }
        | ExecutionEvent::Connection { .. }
        | ExecutionEvent::Unknown => format!("  [{kind}]"),
    }
}

/// Prints live updates until the stream driver drops its sender.
pub async fn print_updates(mut rx: mpsc::Receiver<SessionUpdate>) {
    // Deltas print without a newline; anything else must break the line
    // first.
    let mut midline = false;
    fn line_break(midline: &mut bool) {
        if *midline {
            println!();
            *midline = false;
        }
    }
    while let Some(update) = rx.recv().await {
        match update {
            SessionUpdate::ChatDelta { text } | SessionUpdate::SummaryDelta { text } => {
                print!("{text}");
                let _ = std::io::stdout().flush();
                midline = true;
            }
            SessionUpdate::TasksExtracting => {
                line_break(&mut midline);
                println!("(extracting tasks...)");
            }
            SessionUpdate::TasksReplaced { tasks } => {
                line_break(&mut midline);
                println!("Plan updated:");
                println!("{}", task_table(&tasks));
            }
            SessionUpdate::EntryAppended { entry } => {
                line_break(&mut midline);
                println!("{}", entry_line(&entry));
            }
            SessionUpdate::ArtifactCreated { artifact } => {
                line_break(&mut midline);
                println!(
                    "+ Artifact created: {} ({})",
                    artifact.name, artifact.artifact_type
                );
            }
            SessionUpdate::TitleChanged { title } => {
                line_break(&mut midline);
                println!("(session renamed to \"{title}\")");
            }
            SessionUpdate::StreamFailed { kind, message } => {
                line_break(&mut midline);
                eprintln!("{kind} stream failed: {message}");
            }
            SessionUpdate::Interrupted => {
                line_break(&mut midline);
                println!("Interrupted.");
            }
            SessionUpdate::StreamOpened { kind } => {
                if kind == StreamKind::Execution {
                    line_break(&mut midline);
                    println!("Connected to execution stream");
                }
            }
            SessionUpdate::StreamClosed { .. } => line_break(&mut midline),
        }
    }
    if midline {
        println!();
    }
}

#[cfg(test)]
mod tests {
    use taskdeck_core::api::types::{ArtifactType, TaskStatus};
    use taskdeck_core::session::events::{DoneSummary, PauseReason};

    use super::*;

    #[test]
    fn test_message_entries_use_role_headings() {
        let entry = TimelineEntry::message("user", "plan my trip");
        assert_eq!(entry_line(&entry), "### You\nplan my trip");

        let entry = TimelineEntry::message("assistant", "on it");
        assert_eq!(entry_line(&entry), "### Assistant\non it");

        let entry = TimelineEntry::message("system", "note");
        assert_eq!(entry_line(&entry), "[system] note");
    }

    #[test]
    fn test_task_events_prefer_resolved_title() {
        let entry = TimelineEntry::Event {
            kind: "task_selected".to_string(),
            event: ExecutionEvent::TaskSelected {
                task_id: "t-1".to_string(),
            },
            task_title: Some("Collect sources".to_string()),
        };
        assert_eq!(entry_line(&entry), "> Task started: Collect sources");

        // Without a title the raw id is shown.
        let entry = TimelineEntry::Event {
            kind: "task_selected".to_string(),
            event: ExecutionEvent::TaskSelected {
                task_id: "t-1".to_string(),
            },
            task_title: None,
        };
        assert_eq!(entry_line(&entry), "> Task started: t-1");
    }

    #[test]
    fn test_done_event_shows_totals() {
        let entry = TimelineEntry::Event {
            kind: "done".to_string(),
            event: ExecutionEvent::Done {
                summary: Some(DoneSummary {
                    total: 3,
                    completed: 2,
                    failed: 1,
                }),
            },
            task_title: None,
        };
        assert_eq!(
            entry_line(&entry),
            "* Execution finished: 2/3 done, 1 failed"
        );
    }

    #[test]
    fn test_completed_and_failed_task_lines() {
        let entry = TimelineEntry::Event {
            kind: "task_completed".to_string(),
            event: ExecutionEvent::TaskCompleted {
                task_id: "t-1".to_string(),
                status: TaskStatus::Done,
                result: Some("ok".to_string()),
            },
            task_title: Some("First task".to_string()),
        };
        assert_eq!(entry_line(&entry), "* Task done: First task (ok)");

        let entry = TimelineEntry::Event {
            kind: "error".to_string(),
            event: ExecutionEvent::Error {
                task_id: None,
                error: "model unavailable".to_string(),
            },
            task_title: None,
        };
        assert_eq!(entry_line(&entry), "! Execution error: model unavailable");
    }

    #[test]
    fn test_paused_and_unknown_lines() {
        let entry = TimelineEntry::Event {
            kind: "paused".to_string(),
            event: ExecutionEvent::Paused {
                reason: PauseReason::HeartbeatTimeout,
            },
            task_title: None,
        };
        assert_eq!(entry_line(&entry), "|| Execution paused (heartbeat_timeout)");

        let entry = TimelineEntry::Event {
            kind: "artifact_analysis_start".to_string(),
            event: ExecutionEvent::Unknown,
            task_title: None,
        };
        assert_eq!(entry_line(&entry), "  [artifact_analysis_start]");
    }

    #[test]
    fn test_artifact_line() {
        let entry = TimelineEntry::Event {
            kind: "artifact_created".to_string(),
            event: ExecutionEvent::ArtifactCreated {
                task_id: None,
                artifact_id: "a-1".to_string(),
                name: "Findings".to_string(),
                artifact_type: ArtifactType::Document,
            },
            task_title: None,
        };
        assert_eq!(entry_line(&entry), "+ Artifact created: Findings (document)");
    }

    #[test]
    fn test_tables_include_fields() {
        let tasks = vec![Task {
            id: "t-1".to_string(),
            session_id: "s-1".to_string(),
            title: "Collect sources".to_string(),
            description: None,
            status: TaskStatus::Pending,
            result: None,
            reflection: None,
            order: 0,
            created_at: None,
            updated_at: None,
        }];
        let rendered = task_table(&tasks).to_string();
        assert!(rendered.contains("Collect sources"));
        assert!(rendered.contains("pending"));
    }
}
