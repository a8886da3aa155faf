//! Engine configuration
//!
//! Settings come from defaults, an optional config file and `STENCIL_`
//! environment variables, later sources overriding earlier ones.
//! Nested keys use `__`, e.g. `STENCIL_CACHE__TTL_SECS=60`.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, TemplateError},
    templates::resolver::DEFAULT_CUSTOM_NAMESPACE,
};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "STENCIL";

/// Compilation cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entry lifetime in seconds; 0 expires entries immediately
    pub ttl_secs: u64,
    /// Chance that a `compile` call sweeps expired entries
    pub sweep_probability: f64,
    /// Optional cap on stored entries; the oldest entry is evicted first
    pub max_entries: Option<usize>,
}

impl CacheConfig {
    /// Entry lifetime
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            sweep_probability: 0.01,
            max_entries: None,
        }
    }
}

/// Template engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Ceiling on full render passes
    pub max_passes: usize,
    /// Variable-only passes run after the main passes settle
    pub cleanup_passes: usize,
    /// Path prefix routed to the custom-variable map
    pub custom_namespace: String,
    /// Compilation cache settings
    pub cache: CacheConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_passes: 10,
            cleanup_passes: 3,
            custom_namespace: DEFAULT_CUSTOM_NAMESPACE.to_string(),
            cache: CacheConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Default config file location
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("stencil")
            .join("config.toml")
    }

    /// Load from `path` (if it exists) and the environment, then validate
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let builder = Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: EngineConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded engine configuration");
        Ok(config)
    }

    /// Load from [`EngineConfig::default_path`]
    pub fn load_default() -> Result<Self> {
        Self::load(Self::default_path())
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_passes == 0 {
            return Err(TemplateError::Config(
                "max_passes must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.cache.sweep_probability) {
            return Err(TemplateError::Config(format!(
                "cache.sweep_probability must be within [0, 1], got {}",
                self.cache.sweep_probability
            )));
        }
        Ok(())
    }
}
