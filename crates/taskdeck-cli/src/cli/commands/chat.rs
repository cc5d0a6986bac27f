//! Chat command handler.

use anyhow::{Context, Result};
use taskdeck_core::api::ApiClient;
use taskdeck_core::session::client::SessionClient;
use taskdeck_core::session::updates::update_channel;

use crate::render;

/// Sends one message and streams the assistant reply to stdout.
pub async fn run(api: ApiClient, session_id: &str, message: &str) -> Result<()> {
    let (tx, rx) = update_channel();
    let mut client = SessionClient::load(api, session_id, tx)
        .await
        .context("load session")?;

    let printer = tokio::spawn(render::print_updates(rx));
    let result = client.chat(message).await;

    // Closing the update channel lets the printer drain and finish.
    drop(client);
    let _ = printer.await;

    result
}
