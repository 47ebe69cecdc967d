//! Engine configuration: resolution bounds, cache sizing, ranking floors.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};

pub const DEFAULT_MAX_DEPTH: usize = 2;
pub const DEFAULT_MAX_LINKED_DOCS: usize = 10;
pub const DEFAULT_TRUNCATION_BUDGET_CHARS: usize = 4000;
pub const DEFAULT_FULL_CONTENT_MAX_DEPTH: usize = 1;
pub const DEFAULT_RESOLVE_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 1000;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
pub const DEFAULT_CRITICAL_MIN_RELEVANCE: f64 = 0.5;
pub const DEFAULT_MAX_CONTEXT_RESULTS: usize = 20;

/// Top-level context-engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum BFS hops from the seed documents.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Upper bound on resolved references per resolution.
    #[serde(default = "default_max_linked_docs")]
    pub max_linked_docs: usize,
    /// Per-document character budget before truncation.
    #[serde(default = "default_truncation_budget")]
    pub truncation_budget_chars: usize,
    /// Deepest level that still carries full (truncated) content; deeper
    /// levels carry the summary only.
    #[serde(default = "default_full_content_max_depth")]
    pub full_content_max_depth: usize,
    #[serde(default = "default_resolve_timeout_ms")]
    pub resolve_timeout_ms: u64,
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Raw-score floor for mandatory surfacing of critical documents.
    #[serde(default = "default_critical_min_relevance")]
    pub critical_min_relevance: f64,
    #[serde(default = "default_max_context_results")]
    pub max_context_results: usize,
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}
fn default_max_linked_docs() -> usize {
    DEFAULT_MAX_LINKED_DOCS
}
fn default_truncation_budget() -> usize {
    DEFAULT_TRUNCATION_BUDGET_CHARS
}
fn default_full_content_max_depth() -> usize {
    DEFAULT_FULL_CONTENT_MAX_DEPTH
}
fn default_resolve_timeout_ms() -> u64 {
    DEFAULT_RESOLVE_TIMEOUT_MS
}
fn default_cache_max_entries() -> usize {
    DEFAULT_CACHE_MAX_ENTRIES
}
fn default_cache_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}
fn default_critical_min_relevance() -> f64 {
    DEFAULT_CRITICAL_MIN_RELEVANCE
}
fn default_max_context_results() -> usize {
    DEFAULT_MAX_CONTEXT_RESULTS
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_linked_docs: DEFAULT_MAX_LINKED_DOCS,
            truncation_budget_chars: DEFAULT_TRUNCATION_BUDGET_CHARS,
            full_content_max_depth: DEFAULT_FULL_CONTENT_MAX_DEPTH,
            resolve_timeout_ms: DEFAULT_RESOLVE_TIMEOUT_MS,
            cache_max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            critical_min_relevance: DEFAULT_CRITICAL_MIN_RELEVANCE,
            max_context_results: DEFAULT_MAX_CONTEXT_RESULTS,
        }
    }
}

impl EngineConfig {
    /// Create configuration from defaults overridden by `DOCWEAVE_*` env vars.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Load config from a JSON file, falling back to defaults for missing
    /// fields or a missing file.
    pub fn load(path: &Path) -> Result<Self> {
        let config: EngineConfig = match std::fs::read_to_string(path) {
            Ok(data) => serde_json::from_str(&data)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No engine config at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => return Err(Error::Io(e)),
        };
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        env_override("DOCWEAVE_MAX_DEPTH", &mut self.max_depth);
        env_override("DOCWEAVE_MAX_LINKED_DOCS", &mut self.max_linked_docs);
        env_override("DOCWEAVE_TRUNCATION_BUDGET", &mut self.truncation_budget_chars);
        env_override("DOCWEAVE_FULL_CONTENT_DEPTH", &mut self.full_content_max_depth);
        env_override("DOCWEAVE_RESOLVE_TIMEOUT_MS", &mut self.resolve_timeout_ms);
        env_override("DOCWEAVE_CACHE_MAX_ENTRIES", &mut self.cache_max_entries);
        env_override("DOCWEAVE_CACHE_TTL_SECS", &mut self.cache_ttl_secs);
        env_override("DOCWEAVE_CRITICAL_MIN_RELEVANCE", &mut self.critical_min_relevance);
        env_override("DOCWEAVE_MAX_CONTEXT_RESULTS", &mut self.max_context_results);
    }

    /// Reject settings that cannot produce a meaningful result.
    pub fn validate(&self) -> Result<()> {
        if !self.critical_min_relevance.is_finite() || self.critical_min_relevance < 0.0 {
            return Err(Error::Config(format!(
                "critical_min_relevance must be a non-negative number, got {}",
                self.critical_min_relevance
            )));
        }
        if self.truncation_budget_chars == 0 {
            return Err(Error::Config(
                "truncation_budget_chars must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_millis(self.resolve_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn env_override<T: std::str::FromStr>(key: &str, slot: &mut T) {
    if let Ok(raw) = std::env::var(key) {
        match raw.trim().parse() {
            Ok(value) => *slot = value,
            Err(_) => warn!("Ignoring invalid value for {}: {:?}", key, raw),
        }
    }
}
