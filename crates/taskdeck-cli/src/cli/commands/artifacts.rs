//! Artifact commands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use taskdeck_core::api::ApiClient;
use taskdeck_core::api::types::ArtifactType;

use crate::render;

pub async fn list(
    api: &ApiClient,
    session_id: &str,
    artifact_type: Option<ArtifactType>,
) -> Result<()> {
    let list = api
        .list_artifacts(session_id, artifact_type)
        .await
        .context("list artifacts")?;
    if list.artifacts.is_empty() {
        println!("No artifacts found.");
        return Ok(());
    }
    println!("{}", render::artifact_table(&list.artifacts));
    Ok(())
}

pub async fn show(api: &ApiClient, session_id: &str, artifact_id: &str) -> Result<()> {
    let artifact = api
        .get_artifact(session_id, artifact_id)
        .await
        .context("fetch artifact")?;
    println!(
        "{} ({})\n",
        artifact.summary.name, artifact.summary.artifact_type
    );
    println!("{}", artifact.content);
    Ok(())
}

pub async fn download(
    api: &ApiClient,
    session_id: &str,
    artifact_id: &str,
    out: Option<&str>,
) -> Result<()> {
    let download = api
        .download_artifact(session_id, artifact_id)
        .await
        .context("download artifact")?;
    let path = match out {
        Some(out) => PathBuf::from(out),
        None => PathBuf::from(
            download
                .filename
                .unwrap_or_else(|| format!("{artifact_id}.txt")),
        ),
    };
    std::fs::write(&path, download.content)
        .with_context(|| format!("write artifact to {}", path.display()))?;
    println!("Saved {}", path.display());
    Ok(())
}

pub async fn delete(api: &ApiClient, session_id: &str, artifact_id: &str) -> Result<()> {
    api.delete_artifact(session_id, artifact_id)
        .await
        .context("delete artifact")?;
    println!("Deleted artifact {artifact_id}");
    Ok(())
}
