//! Execute and pause command handlers.

use anyhow::{Context, Result};
use taskdeck_core::api::ApiClient;
use taskdeck_core::session::client::SessionClient;
use taskdeck_core::session::updates::update_channel;

use crate::render;

/// Executes (or resumes) the session's tasks, streaming progress, then
/// follows completion with the summarize stream.
pub async fn run(api: ApiClient, session_id: &str) -> Result<()> {
    let (tx, rx) = update_channel();
    let mut client = SessionClient::load(api, session_id, tx)
        .await
        .context("load session")?;

    let printer = tokio::spawn(render::print_updates(rx));
    let result = client.execute().await;

    let tasks = client.state().tasks.clone();
    drop(client);
    let _ = printer.await;

    if result.is_ok() && !tasks.is_empty() {
        println!("{}", render::task_table(&tasks));
    }
    result
}

/// Asks the server to pause a running execution at the next safe point.
pub async fn pause(api: &ApiClient, session_id: &str) -> Result<()> {
    let response = api
        .pause_execution(session_id)
        .await
        .context("pause execution")?;
    if response.paused {
        println!("Pause requested (status: {})", response.status);
    } else {
        println!("Nothing to pause (status: {})", response.status);
    }
    Ok(())
}
