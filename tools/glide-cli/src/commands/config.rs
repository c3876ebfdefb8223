//! Show or write the effective configuration.

use std::path::PathBuf;

use glide_common::config::{config_file_path, AppConfig};
use glide_scroll_engine::ScrollParameters;

pub fn run(config: &AppConfig, path: Option<PathBuf>, write: bool) -> anyhow::Result<()> {
    // Reject overrides the controller would refuse before showing or saving them.
    ScrollParameters::from_map(&config.scroll.parameters)?;

    if write {
        let path = path.unwrap_or_else(config_file_path);
        config.save_to(&path)?;
        println!("Configuration written to: {}", path.display());
        return Ok(());
    }

    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
