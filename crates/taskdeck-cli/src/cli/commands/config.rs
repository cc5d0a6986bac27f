//! Config commands.

use anyhow::{Context, Result};
use taskdeck_core::config::{Config, paths};

pub fn show(config: &Config, server_override: Option<&str>) -> Result<()> {
    println!("config file: {}", paths::config_path().display());
    match server_override {
        Some(url) => println!("server.base_url = \"{url}\" (from --server)"),
        None => println!("server.base_url = \"{}\"", config.server.base_url),
    }
    match &config.log.level {
        Some(level) => println!("log.level = \"{level}\""),
        None => println!("log.level = (default)"),
    }
    Ok(())
}

pub fn set_url(url: &str) -> Result<()> {
    // Validate before persisting.
    taskdeck_core::api::ApiClient::new(url)?;
    Config::save_base_url(url).context("save config")?;
    println!("Set server.base_url to {url}");
    Ok(())
}
