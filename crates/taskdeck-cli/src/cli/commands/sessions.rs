//! Session management commands.

use anyhow::{Context, Result};
use taskdeck_core::api::ApiClient;
use taskdeck_core::api::types::{SessionStatus, TaskStatus};
use taskdeck_core::session::timeline;

use crate::render;

pub async fn list(
    api: &ApiClient,
    status: Option<SessionStatus>,
    limit: Option<u32>,
    offset: Option<u32>,
) -> Result<()> {
    let list = api
        .list_sessions(status, limit, offset)
        .await
        .context("list sessions")?;
    if list.sessions.is_empty() {
        println!("No sessions found.");
        return Ok(());
    }
    println!("{}", render::session_table(&list.sessions));
    println!("{} of {} session(s)", list.sessions.len(), list.total);
    Ok(())
}

pub async fn create(api: &ApiClient) -> Result<()> {
    let session = api.create_session().await.context("create session")?;
    println!("Created session {} ({})", session.id, session.title);
    Ok(())
}

pub async fn show(api: &ApiClient, session_id: &str) -> Result<()> {
    let detail = api.get_session(session_id).await.context("show session")?;

    println!("{}  [{}]", detail.session.title, detail.session.status);
    println!("{}", detail.session.id);

    if !detail.tasks.is_empty() {
        let done = detail
            .tasks
            .iter()
            .filter(|task| task.status == TaskStatus::Done)
            .count();
        println!("\nTasks ({done}/{} done):", detail.tasks.len());
        println!("{}", render::task_table(&detail.tasks));
    }

    if !detail.artifacts.is_empty() {
        println!("\nArtifacts:");
        println!("{}", render::artifact_table(&detail.artifacts));
    }

    // Completed or in-flight sessions also have an execution history.
    let logs = match detail.session.status {
        SessionStatus::Executing | SessionStatus::Paused | SessionStatus::Completed => Some(
            api.execution_logs(session_id, None, None)
                .await
                .context("load execution history")?
                .logs,
        ),
        SessionStatus::Planning => None,
    };
    let entries = timeline::seed_history(&detail.messages, logs.as_deref(), &detail.tasks);
    if !entries.is_empty() {
        println!();
        for entry in &entries {
            println!("{}", render::entry_line(entry));
        }
    }
    Ok(())
}

pub async fn delete(api: &ApiClient, session_id: &str) -> Result<()> {
    api.delete_session(session_id)
        .await
        .context("delete session")?;
    println!("Deleted session {session_id}");
    Ok(())
}

pub async fn health(api: &ApiClient) -> Result<()> {
    let health = api.health().await.context("check server health")?;
    println!("{} ({})", health.status, health.timestamp);
    Ok(())
}
