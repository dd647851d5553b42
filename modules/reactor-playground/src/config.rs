use anyhow::{Context, Result};
use reactor_core::LoggerConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// TOML-backed playground configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaygroundConfig {
    pub logger: LoggerConfig,
    pub counter: CounterConfig,
    /// How long the async resolver sleeps before producing its payload.
    pub resolver_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CounterConfig {
    pub initial: i64,
    pub step: i64,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            initial: 0,
            step: 5,
        }
    }
}

/// Config path from the first CLI arg, else `PLAYGROUND_CONFIG`.
pub fn config_path() -> Option<PathBuf> {
    std::env::args()
        .nth(1)
        .or_else(|| std::env::var("PLAYGROUND_CONFIG").ok())
        .map(PathBuf::from)
}

/// Load and parse a TOML config file.
pub fn load_config(path: &Path) -> Result<PlaygroundConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: PlaygroundConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(config)
}

/// Load from `path` when given and present, defaults otherwise.
pub fn load_or_default(path: Option<&Path>) -> Result<PlaygroundConfig> {
    match path {
        Some(path) if path.exists() => load_config(path),
        Some(path) => {
            tracing::warn!(path = %path.display(), "Config file not found, using defaults");
            Ok(PlaygroundConfig::default())
        }
        None => Ok(PlaygroundConfig::default()),
    }
}
