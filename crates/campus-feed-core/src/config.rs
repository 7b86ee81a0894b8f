//! Feed engine configuration.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

// Default configuration constants
const DEFAULT_PAGE_SIZE: usize = 10;
const DEFAULT_STATUS_BATCH_SIZE: usize = 10;
const DEFAULT_FETCH_TIMEOUT_MS: u64 = 15_000;
const DEFAULT_MUTATION_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_SCROLL_THRESHOLD_PX: f64 = 200.0;
const MAX_PAGE_SIZE: usize = 100;
// Upper bound of the remote store's IN-query
const MAX_STATUS_BATCH_SIZE: usize = 30;
const MIN_TIMEOUT_MS: u64 = 100;

/// Feed engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub page_size: usize,
    pub status_batch_size: usize,
    pub fetch_timeout_ms: u64,
    pub mutation_timeout_ms: u64,
    pub scroll_threshold_px: f64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            status_batch_size: DEFAULT_STATUS_BATCH_SIZE,
            fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            mutation_timeout_ms: DEFAULT_MUTATION_TIMEOUT_MS,
            scroll_threshold_px: DEFAULT_SCROLL_THRESHOLD_PX,
        }
    }
}

impl FeedConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(anyhow::anyhow!(
                "Page size must be between 1 and {}",
                MAX_PAGE_SIZE
            ));
        }

        if self.status_batch_size == 0 || self.status_batch_size > MAX_STATUS_BATCH_SIZE {
            return Err(anyhow::anyhow!(
                "Status batch size must be between 1 and {}",
                MAX_STATUS_BATCH_SIZE
            ));
        }

        if self.fetch_timeout_ms < MIN_TIMEOUT_MS {
            return Err(anyhow::anyhow!(
                "Fetch timeout must be at least {} ms",
                MIN_TIMEOUT_MS
            ));
        }

        if self.mutation_timeout_ms < MIN_TIMEOUT_MS {
            return Err(anyhow::anyhow!(
                "Mutation timeout must be at least {} ms",
                MIN_TIMEOUT_MS
            ));
        }

        if !self.scroll_threshold_px.is_finite() || self.scroll_threshold_px < 0.0 {
            return Err(anyhow::anyhow!(
                "Scroll threshold must be a non-negative number of pixels"
            ));
        }

        Ok(())
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: FeedConfig = toml::from_str(content).context("Failed to parse feed config")?;
        config.validate().context("Invalid feed configuration")?;
        Ok(config)
    }

    /// Load and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn mutation_timeout(&self) -> Duration {
        Duration::from_millis(self.mutation_timeout_ms)
    }
}
