//! buff.163.com price source.
//!
//! Reads lowest sell-order prices from the buff JSON API. The API sits
//! behind a login wall: requests carry the session cookie exported from
//! a logged-in browser (referenced by env-var name in the config and
//! held as a secret). Retries with a fixed delay live here, inside the
//! collaborator; the search core never retries or sleeps.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use super::PriceSource;
use crate::types::WearTier;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const DEFAULT_BASE_URL: &str = "https://buff.163.com";
const SOURCE_NAME: &str = "buff";

/// buff client configuration.
#[derive(Debug, Clone)]
pub struct BuffConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    /// Attempts per goods id before giving up on it.
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for BuffConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 20,
            max_retries: 5,
            retry_delay_ms: 1000,
        }
    }
}

// ---------------------------------------------------------------------------
// API response types (buff JSON → Rust)
// ---------------------------------------------------------------------------

/// Envelope shared by buff API endpoints. `code` is "OK" on success;
/// anything else ("Login Required", rate-limit codes) is an error.
#[derive(Debug, Deserialize)]
struct BuffEnvelope {
    #[serde(default)]
    code: String,
    #[serde(default)]
    data: Option<BuffSellOrderData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BuffSellOrderData {
    #[serde(default)]
    items: Vec<BuffSellOrder>,
}

/// One sell listing. buff serializes prices as decimal strings.
#[derive(Debug, Deserialize)]
struct BuffSellOrder {
    #[serde(default)]
    price: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// buff.163.com price client.
pub struct BuffClient {
    http: Client,
    base_url: String,
    /// Session cookie from a logged-in browser export. Anonymous
    /// requests work for public listings but are rate limited hard.
    session_cookie: Option<SecretString>,
    max_retries: u32,
    retry_delay: Duration,
}

impl BuffClient {
    pub fn new(config: BuffConfig, session_cookie: Option<SecretString>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent("cardline/0.1.0 (trade-up-scanner)")
            .build()
            .context("Failed to build HTTP client for buff")?;

        if session_cookie.is_none() {
            warn!("No buff session cookie configured, anonymous requests may be throttled");
        }

        Ok(Self {
            http,
            base_url: config.base_url,
            session_cookie,
            max_retries: config.max_retries.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    // -- Internal helpers ------------------------------------------------

    /// Lowest listed sell price for one goods id, or `None` when nothing
    /// is listed. Retries transient failures with a fixed delay.
    async fn lowest_sell_price(&self, goods_id: u64) -> Result<Option<f64>> {
        let mut last_err: Option<anyhow::Error> = None;

        for attempt in 1..=self.max_retries {
            match self.fetch_sell_orders(goods_id).await {
                Ok(price) => return Ok(price),
                Err(e) => {
                    warn!(goods_id, attempt, error = %e, "buff request failed");
                    last_err = Some(e);
                    if attempt < self.max_retries {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| anyhow::anyhow!("buff request failed for goods {goods_id}")))
    }

    async fn fetch_sell_orders(&self, goods_id: u64) -> Result<Option<f64>> {
        let url = sell_order_url(&self.base_url, goods_id);
        debug!(url = %url, "Fetching buff sell orders");

        let mut request = self.http.get(&url);
        if let Some(cookie) = &self.session_cookie {
            request = request.header(reqwest::header::COOKIE, cookie.expose_secret());
        }

        let resp = request.send().await.context("buff API request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            anyhow::bail!("buff API error {status} for goods {goods_id}");
        }

        let envelope: BuffEnvelope = resp
            .json()
            .await
            .context("Failed to parse buff sell order response")?;

        if envelope.code != "OK" {
            let detail = envelope.error.unwrap_or_else(|| envelope.code.clone());
            anyhow::bail!("buff API rejected request: {detail}");
        }

        let items = envelope.data.map(|d| d.items).unwrap_or_default();
        Ok(items.first().and_then(|order| parse_price(&order.price)))
    }
}

#[async_trait]
impl PriceSource for BuffClient {
    async fn fetch_tier_prices(
        &self,
        ids: &HashMap<WearTier, u64>,
    ) -> Result<HashMap<WearTier, f64>> {
        // Deterministic order keeps logs and retry behavior readable.
        let mut sorted: Vec<(WearTier, u64)> = ids.iter().map(|(t, id)| (*t, *id)).collect();
        sorted.sort_by_key(|(t, _)| *t);

        let mut prices = HashMap::new();
        let mut last_err: Option<anyhow::Error> = None;

        for (tier, goods_id) in sorted {
            match self.lowest_sell_price(goods_id).await {
                Ok(Some(price)) => {
                    prices.insert(tier, price);
                }
                Ok(None) => {
                    debug!(goods_id, tier = %tier, "No listings");
                }
                Err(e) => {
                    warn!(goods_id, tier = %tier, error = %e, "Giving up on tier");
                    last_err = Some(e);
                }
            }
        }

        // Partial coverage is fine; only a wipeout surfaces as an error.
        if prices.is_empty() {
            if let Some(e) = last_err {
                return Err(e);
            }
        }
        Ok(prices)
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}

fn sell_order_url(base_url: &str, goods_id: u64) -> String {
    format!(
        "{base_url}/api/market/goods/sell_order?game=csgo&goods_id={goods_id}&page_num=1&sort_by=default"
    )
}

/// buff prices arrive as decimal strings; anything non-positive or
/// unparsable counts as "no price".
fn parse_price(raw: &str) -> Option<f64> {
    match raw.trim().parse::<f64>() {
        Ok(p) if p > 0.0 => Some(p),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
