//! Configuration module for deckcast.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `DECKCAST_*` environment variables. Command-line flags are applied on top
//! by the binary.

mod encoding_config;
mod model_config;
mod split_config;

pub use encoding_config::EncodingEnvConfig;
pub use model_config::ModelEnvConfig;
pub use split_config::SplitEnvConfig;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::env;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Variable lookup used by the config loaders; `std::env` in production.
pub type VarLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Parses `key` from `vars` if it is set. An unparsable value is an error,
/// never a silent fallback to the default.
pub(crate) fn parse_var<T>(vars: VarLookup<'_>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    match vars(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow!("Invalid {}='{}': {}", key, raw, e)),
        None => Ok(None),
    }
}

/// Full training / inference pipeline configuration.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub encoding: EncodingEnvConfig,
    pub split: SplitEnvConfig,
    pub model: ModelEnvConfig,
}

impl PipelineConfig {
    /// Defaults overlaid with environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_vars(&|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML document; missing sections and keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse pipeline config TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` (if given) then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .context(format!("Failed to read pipeline config file: {:?}", path))?;
                info!("Loaded pipeline config from {:?}", path);
                toml::from_str(&content)
                    .context(format!("Failed to parse pipeline config TOML: {:?}", path))?
            }
            None => Self::default(),
        };
        config.apply_vars(&|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Overrides every field whose variable is present in `vars`.
    pub fn apply_vars(&mut self, vars: VarLookup<'_>) -> Result<()> {
        self.encoding
            .apply_vars(vars)
            .context("Failed to load encoding config")?;
        self.split
            .apply_vars(vars)
            .context("Failed to load split config")?;
        self.model
            .apply_vars(vars)
            .context("Failed to load model config")?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.encoding.validate()?;
        self.split.validate()?;
        self.model.validate()?;
        Ok(())
    }
}
