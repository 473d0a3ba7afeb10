//! Typed configuration for the cleaning pipeline.
//!
//! Loaded from a TOML file with `${VAR}` environment substitution in string
//! values, so credentials stay out of the file itself. A missing config
//! file yields defaults; CLI flags override on top.

pub mod env;
pub mod schema;

pub use schema::{CleanerBackend, Config, LlmConfig, RetryConfig};

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

/// Load and parse the config from disk, resolving `${VAR}` references.
///
/// Returns defaults if the file doesn't exist (first run).
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(Config::default());
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let resolved = env::resolve_env_vars(&raw)
        .with_context(|| format!("Failed to resolve env vars in: {}", path.display()))?;
    let config: Config = toml::from_str(&resolved)
        .with_context(|| format!("Failed to parse config TOML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(config)
}
