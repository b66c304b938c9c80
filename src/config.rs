//! Runtime configuration
//!
//! Every field has a default matching the plain behaviour (no retries,
//! one transaction per relationship row, lookup-query resolution,
//! first match wins). Values can be overridden from a YAML file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{VidgraphError, VidgraphResult};

/// Bounded retry with exponential backoff for transient engine failures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one (1 = no retry)
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_backoff_ms: u64,
    /// Upper bound for any single delay
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff_ms: 100,
            max_backoff_ms: 2_000,
        }
    }
}

impl RetryPolicy {
    /// Delays between attempts, doubling from `initial_backoff_ms`
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        tokio_retry::strategy::ExponentialBackoff::from_millis(2)
            .factor((self.initial_backoff_ms / 2).max(1))
            .max_delay(Duration::from_millis(self.max_backoff_ms))
            .take(self.max_attempts.saturating_sub(1) as usize)
    }
}

/// How relationship endpoints are turned into uids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    /// One lookup query per endpoint per row
    Lookup,
    /// Natural-key map filled by the node loader; lookup query on a miss
    KeyIndex,
}

/// What to do when an endpoint matches more than one node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguityPolicy {
    /// Use the first match the engine returns
    FirstMatch,
    /// Skip the row
    Reject,
}

/// Loader behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub retry: RetryPolicy,
    /// Relationship rows written per transaction
    pub edge_batch_size: usize,
    pub resolution: ResolutionStrategy,
    pub ambiguity: AmbiguityPolicy,
    /// Declare the schema at the start of every full load
    pub declare_schema: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            edge_batch_size: 1,
            resolution: ResolutionStrategy::Lookup,
            ambiguity: AmbiguityPolicy::FirstMatch,
            declare_schema: true,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Dgraph alpha HTTP endpoint
    pub dgraph_url: String,
    /// Directory holding `nodes/` and `edges/`
    pub data_dir: PathBuf,
    pub loader: LoaderConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dgraph_url: "http://localhost:8080".to_string(),
            data_dir: PathBuf::from("data"),
            loader: LoaderConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_yaml_str(text: &str) -> VidgraphResult<Self> {
        let config: AppConfig =
            serde_yaml::from_str(text).map_err(|e| VidgraphError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> VidgraphResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| VidgraphError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> VidgraphResult<()> {
        if self.loader.edge_batch_size == 0 {
            return Err(VidgraphError::Config(
                "loader.edge_batch_size must be at least 1".to_string(),
            ));
        }
        if self.loader.retry.max_attempts == 0 {
            return Err(VidgraphError::Config(
                "loader.retry.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
