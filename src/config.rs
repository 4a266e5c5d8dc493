//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! The market session cookie is referenced by env-var name in the
//! config and resolved at runtime into a `SecretString`, so the cookie
//! itself never appears in the file or in logs.

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;

use crate::catalog::CatalogOptions;
use crate::market::buff::BuffConfig;
use crate::search::{GeneticConfig, SearchRequest, Strategy};
use crate::types::{CardlineError, WearTier};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub market: MarketConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub genetic: GeneticConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    /// Path to the case/skin dataset JSON.
    pub path: String,
    /// Keep only these cases when non-empty.
    #[serde(default)]
    pub allowed_cases: Vec<String>,
    /// Drop cases whose name contains any of these substrings.
    #[serde(default)]
    pub exclude_name_contains: Vec<String>,
}

impl CatalogConfig {
    pub fn options(&self) -> CatalogOptions {
        CatalogOptions {
            allowed_cases: self.allowed_cases.clone(),
            exclude_name_contains: self.exclude_name_contains.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MarketConfig {
    pub base_url: String,
    /// Name of the env var holding the buff session cookie.
    pub session_cookie_env: String,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    /// Concurrent price fetches during preload.
    pub fetch_concurrency: usize,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            base_url: "https://buff.163.com".to_string(),
            session_cookie_env: "BUFF_SESSION".to_string(),
            request_timeout_secs: 20,
            max_retries: 5,
            retry_delay_ms: 1000,
            fetch_concurrency: 4,
        }
    }
}

impl MarketConfig {
    pub fn buff_config(&self) -> BuffConfig {
        BuffConfig {
            base_url: self.base_url.clone(),
            request_timeout_secs: self.request_timeout_secs,
            max_retries: self.max_retries,
            retry_delay_ms: self.retry_delay_ms,
        }
    }

    /// Resolve the session cookie from the environment. A missing
    /// variable means anonymous access, not an error.
    pub fn session_cookie(&self) -> Option<SecretString> {
        std::env::var(&self.session_cookie_env)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(SecretString::new)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    /// Wear tier the cardline should guarantee on the output.
    pub target_tier: String,
    pub tolerance: f64,
    /// "auto", "exhaustive", "genetic", or "mix".
    pub strategy: String,
    pub top_n: usize,
    /// Auto mode switches to the genetic engine above this many
    /// combinations per partition.
    pub max_exhaustive_combos: u64,
    /// Pin candidate floats to the target boundary instead of using
    /// tier midpoints.
    pub pin_to_boundary: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            target_tier: "Minimal Wear".to_string(),
            tolerance: 0.02,
            strategy: "auto".to_string(),
            top_n: 10,
            max_exhaustive_combos: 5_000_000,
            pin_to_boundary: false,
        }
    }
}

impl SearchConfig {
    /// Parse the string fields and assemble the engine request.
    pub fn to_request(&self, genetic: GeneticConfig) -> Result<SearchRequest> {
        let target_tier: WearTier = self.target_tier.parse()?;
        let strategy: Strategy = self.strategy.parse()?;
        Ok(SearchRequest {
            target_tier,
            tolerance: self.tolerance,
            strategy,
            top_n: self.top_n,
            max_exhaustive_combos: self.max_exhaustive_combos as u128,
            pin_to_boundary: self.pin_to_boundary,
            genetic,
        })
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReportConfig {
    pub output_dir: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: "results".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Assemble the search request from the `[search]` and `[genetic]`
    /// sections.
    pub fn search_request(&self) -> Result<SearchRequest> {
        self.search.to_request(self.genetic.clone())
    }

    /// Reject configurations the engines cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.catalog.path.trim().is_empty() {
            return Err(config_error("catalog.path must not be empty"));
        }
        self.search.target_tier.parse::<WearTier>()?;
        self.search.strategy.parse::<Strategy>()?;
        if self.search.tolerance <= 0.0 {
            return Err(config_error("search.tolerance must be positive"));
        }
        if self.search.top_n == 0 {
            return Err(config_error("search.top_n must be at least 1"));
        }
        if self.search.max_exhaustive_combos == 0 {
            return Err(config_error("search.max_exhaustive_combos must be at least 1"));
        }
        if self.market.fetch_concurrency == 0 {
            return Err(config_error("market.fetch_concurrency must be at least 1"));
        }
        if self.genetic.population < 10 {
            return Err(config_error("genetic.population must be at least 10"));
        }
        if self.genetic.generations == 0 {
            return Err(config_error("genetic.generations must be at least 1"));
        }
        if self.genetic.elite_count < 2 || self.genetic.elite_count > self.genetic.population {
            return Err(config_error(
                "genetic.elite_count must be between 2 and genetic.population",
            ));
        }
        if !(0.0..=1.0).contains(&self.genetic.mutation_rate) {
            return Err(config_error("genetic.mutation_rate must be within [0, 1]"));
        }
        if self.genetic.tolerance <= 0.0 {
            return Err(config_error("genetic.tolerance must be positive"));
        }
        Ok(())
    }
}

fn config_error(message: &str) -> anyhow::Error {
    CardlineError::Config(message.to_string()).into()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
