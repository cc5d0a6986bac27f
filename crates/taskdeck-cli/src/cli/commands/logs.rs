//! Execution log replay.

use anyhow::{Context, Result};
use taskdeck_core::api::ApiClient;
use taskdeck_core::session::timeline;

use crate::render;

/// Replays persisted execution logs as timeline entries.
pub async fn run(api: &ApiClient, session_id: &str) -> Result<()> {
    let detail = api.get_session(session_id).await.context("load session")?;
    let logs = api
        .execution_logs(session_id, None, None)
        .await
        .context("load execution logs")?;

    if logs.logs.is_empty() {
        println!("No execution logs.");
        return Ok(());
    }

    for log in &logs.logs {
        // entry_from_log drops content rows, same as history seeding.
        if let Some(entry) = timeline::entry_from_log(log, &detail.tasks) {
            println!("{}", render::entry_line(&entry));
        }
    }
    println!("{} log row(s)", logs.total);
    Ok(())
}
