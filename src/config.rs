//! Configuration loading
//!
//! Layered: built-in defaults, then an optional TOML file (`strand.toml`, or
//! the path in `STRAND_CONFIG_PATH`), then `STRAND_`-prefixed environment
//! variables with `__` separating nested keys (e.g.
//! `STRAND_ENGINE__RESOLVE_DELAY_MS=5`). A `.env` file is applied first so
//! local overrides work in development.

use anyhow::{Context, Result};
use config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log: LogConfig,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default tracing filter when RUST_LOG is unset
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Milliseconds `resolve` defers a captured continuation
    pub resolve_delay_ms: u64,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { resolve_delay_ms: 1 }
    }
}

impl Config {
    /// Load configuration from defaults, file, and environment
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let path = std::env::var("STRAND_CONFIG_PATH")
            .unwrap_or_else(|_| "strand.toml".to_string());

        let source = config::Config::builder()
            .add_source(File::new(&path, FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix("STRAND")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration sources")?;

        let config: Config = source
            .try_deserialize()
            .context("Failed to parse configuration")?;
        Ok(config)
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to render configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.log.level, "info");
        assert_eq!(config.engine.resolve_delay_ms, 1);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str("[engine]\nresolve_delay_ms = 7\n").unwrap();
        assert_eq!(config.engine.resolve_delay_ms, 7);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_to_toml_round_trips() {
        let config = Config::default();
        let rendered = config.to_toml().unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.engine.resolve_delay_ms, config.engine.resolve_delay_ms);
        assert_eq!(parsed.log.level, config.log.level);
    }
}
