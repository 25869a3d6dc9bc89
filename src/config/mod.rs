mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config = parse_config(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Locations searched, in order, when no config file is given.
pub const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "./homereel.toml",
    "./config.toml",
    "~/.config/homereel/config.toml",
    "/etc/homereel/config.toml",
];

/// First of `candidates` that exists, with `~` expanded.
pub fn locate_config(candidates: &[&str]) -> Option<PathBuf> {
    candidates
        .iter()
        .map(|c| PathBuf::from(shellexpand::tilde(c).as_ref()))
        .find(|path| path.exists())
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    match locate_config(DEFAULT_CONFIG_PATHS) {
        Some(path) => {
            tracing::debug!("Using config file {:?}", path);
            load_config(&path)
        }
        None => Ok(Config::default()),
    }
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.channels.tick_millis == 0 {
        anyhow::bail!("Channel tick interval cannot be 0");
    }

    for root in [&config.library.movies_dir, &config.library.series_dir] {
        if !root.exists() {
            tracing::warn!("Library root does not exist: {:?}", root);
        }
    }

    let mut seen = HashSet::new();
    for channel in &config.channels.definitions {
        if channel.id.trim().is_empty() {
            anyhow::bail!("Channel '{}' has an empty id", channel.name);
        }
        if !seen.insert(channel.id.as_str()) {
            anyhow::bail!("Duplicate channel id '{}'", channel.id);
        }
        if channel.active && channel.folders.is_empty() {
            tracing::warn!("Channel '{}' is active but has no folders", channel.id);
        }
    }

    Ok(())
}
