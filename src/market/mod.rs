//! Market price acquisition.
//!
//! Defines the `PriceSource` trait and the immutable [`PriceCache`] the
//! search engines read from. The cache is populated exactly once per
//! run, before any search task starts; an absent entry means "price
//! unknown" and is never substituted with a default.

pub mod buff;

use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
#[cfg(test)]
use mockall::automock;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

use crate::catalog::pool::CandidatePool;
use crate::catalog::CatalogView;
use crate::types::{CardlineError, Rarity, WearTier};

/// Abstraction over market price providers.
///
/// Given a skin's per-wear market identifiers, implementors return the
/// lowest listed price per wear. Missing or unlisted wears are simply
/// absent from the result; a hard failure (network, auth) is an `Err`.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetch lowest sell prices for each wear of one skin.
    async fn fetch_tier_prices(
        &self,
        ids: &HashMap<WearTier, u64>,
    ) -> Result<HashMap<WearTier, f64>>;

    /// Source name for logging and identification.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Price cache
// ---------------------------------------------------------------------------

/// (skin, case, wear) → lowest market price.
///
/// Built by [`preload_prices`] and then shared read-only with every
/// search task. No component mutates it after construction.
#[derive(Debug, Clone, Default)]
pub struct PriceCache {
    entries: HashMap<(String, String), HashMap<WearTier, f64>>,
}

impl PriceCache {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, skin: &str, case: &str, tier: WearTier, price: f64) {
        self.entries
            .entry((skin.to_string(), case.to_string()))
            .or_default()
            .insert(tier, price);
    }

    pub fn price(&self, skin: &str, case: &str, tier: WearTier) -> Option<f64> {
        self.entries
            .get(&(skin.to_string(), case.to_string()))
            .and_then(|tiers| tiers.get(&tier))
            .copied()
    }

    /// Highest known price across all wears of one skin. Used as the
    /// optimistic bound when pruning.
    pub fn best_price(&self, skin: &str, case: &str) -> Option<f64> {
        self.entries
            .get(&(skin.to_string(), case.to_string()))
            .and_then(|tiers| {
                tiers
                    .values()
                    .copied()
                    .max_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            })
    }

    /// Whether any wear of this skin has a known price.
    pub fn has_any_price(&self, skin: &str, case: &str) -> bool {
        self.entries
            .get(&(skin.to_string(), case.to_string()))
            .map(|tiers| !tiers.is_empty())
            .unwrap_or(false)
    }

    /// Number of (skin, case) entries with at least one priced wear.
    pub fn len(&self) -> usize {
        self.entries.values().filter(|t| !t.is_empty()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Preloading
// ---------------------------------------------------------------------------

/// Populate the price cache for one run: every pooled skin plus every
/// potential output skin of the cases and rarities the pool can reach.
///
/// Individual fetch failures are logged and skipped; only an entirely
/// empty cache is fatal, since scoring would then be impossible.
pub async fn preload_prices(
    source: &dyn PriceSource,
    view: &CatalogView,
    pool: &CandidatePool,
    concurrency: usize,
) -> Result<PriceCache> {
    // Dedupe (skin, case) keys: inputs first, then reachable outputs.
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut keys: Vec<(String, String, HashMap<WearTier, u64>)> = Vec::new();

    let mut push_key = |skin: &str, case: &str, ids: &HashMap<WearTier, u64>| {
        if seen.insert((skin.to_string(), case.to_string())) {
            keys.push((skin.to_string(), case.to_string(), ids.clone()));
        }
    };

    for item in &pool.items {
        if let Some(case) = view.case(&item.case) {
            if let Some(skin) = case.skins.iter().find(|s| s.name == item.skin) {
                push_key(&skin.name, &case.name, &skin.market_ids);
            }
        }
    }

    let case_rarities: HashSet<(String, Rarity)> = pool
        .items
        .iter()
        .map(|it| (it.case.clone(), it.next_rarity))
        .collect();
    for (case, rarity) in &case_rarities {
        for skin in view.same_rarity_in_case(case, *rarity) {
            push_key(&skin.name, &skin.case, &skin.market_ids);
        }
    }

    info!(
        keys = keys.len(),
        source = source.name(),
        concurrency,
        "Preloading prices"
    );

    let mut cache = PriceCache::empty();
    let mut failed = 0usize;
    let batch_width = concurrency.max(1);

    for batch in keys.chunks(batch_width) {
        let fetches = batch
            .iter()
            .map(|(_, _, ids)| source.fetch_tier_prices(ids));
        let results = join_all(fetches).await;

        for ((skin, case, _), result) in batch.iter().zip(results) {
            match result {
                Ok(prices) => {
                    for (tier, price) in prices {
                        if price > 0.0 {
                            cache.insert(skin, case, tier, price);
                        }
                    }
                }
                Err(e) => {
                    failed += 1;
                    warn!(skin = %skin, case = %case, error = %e, "Price fetch failed");
                }
            }
        }
    }

    if cache.is_empty() {
        return Err(CardlineError::PriceSource {
            source_name: source.name().to_string(),
            message: format!("no prices loaded ({} keys, {} failures)", keys.len(), failed),
        }
        .into());
    }

    info!(
        priced = cache.len(),
        failed,
        "Price cache ready"
    );
    Ok(cache)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CaseRecord, CatalogOptions, SkinRecord};

    fn make_skin(name: &str, rarity: &str, tiers: &[(&str, u64)]) -> SkinRecord {
        SkinRecord {
            name: name.to_string(),
            rarity: rarity.to_string(),
            min_float: Some(0.0),
            max_float: Some(1.0),
            market_ids: tiers.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    fn make_view() -> CatalogView {
        let records = vec![CaseRecord {
            name: "Case".to_string(),
            skins: vec![
                make_skin("Input", "Mil-Spec", &[("Minimal Wear", 1), ("Field-Tested", 2)]),
                make_skin("Output", "Restricted", &[("Minimal Wear", 3)]),
            ],
        }];
        CatalogView::build(records, &CatalogOptions::default()).unwrap()
    }

    // -- cache --

    #[test]
    fn test_cache_lookup() {
        let mut cache = PriceCache::empty();
        cache.insert("A", "Case", WearTier::MinimalWear, 10.0);
        cache.insert("A", "Case", WearTier::FieldTested, 4.5);

        assert_eq!(cache.price("A", "Case", WearTier::MinimalWear), Some(10.0));
        assert_eq!(cache.price("A", "Case", WearTier::FactoryNew), None);
        assert_eq!(cache.price("B", "Case", WearTier::MinimalWear), None);
        assert_eq!(cache.best_price("A", "Case"), Some(10.0));
        assert!(cache.has_any_price("A", "Case"));
        assert!(!cache.has_any_price("B", "Case"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_empty() {
        let cache = PriceCache::empty();
        assert!(cache.is_empty());
        assert_eq!(cache.best_price("A", "Case"), None);
    }

    // -- preload --

    #[tokio::test]
    async fn test_preload_populates_inputs_and_outputs() {
        let view = make_view();
        let pool = CandidatePool::build(&view);

        let mut source = MockPriceSource::new();
        source.expect_name().return_const("mock".to_string());
        source.expect_fetch_tier_prices().returning(|ids| {
            // The Input skin carries two ids, the Output skin one.
            let mut prices = HashMap::new();
            if ids.len() == 2 {
                prices.insert(WearTier::MinimalWear, 5.0);
                prices.insert(WearTier::FieldTested, 2.0);
            } else {
                prices.insert(WearTier::MinimalWear, 100.0);
            }
            Ok(prices)
        });

        let cache = preload_prices(&source, &view, &pool, 4).await.unwrap();
        assert_eq!(cache.price("Input", "Case", WearTier::FieldTested), Some(2.0));
        assert_eq!(cache.price("Output", "Case", WearTier::MinimalWear), Some(100.0));
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_preload_skips_non_positive_prices() {
        let view = make_view();
        let pool = CandidatePool::build(&view);

        let mut source = MockPriceSource::new();
        source.expect_name().return_const("mock".to_string());
        source.expect_fetch_tier_prices().returning(|_| {
            let mut prices = HashMap::new();
            prices.insert(WearTier::MinimalWear, 0.0);
            prices.insert(WearTier::FieldTested, 3.0);
            Ok(prices)
        });

        let cache = preload_prices(&source, &view, &pool, 2).await.unwrap();
        assert_eq!(cache.price("Input", "Case", WearTier::MinimalWear), None);
        assert_eq!(cache.price("Input", "Case", WearTier::FieldTested), Some(3.0));
    }

    #[tokio::test]
    async fn test_preload_partial_failure_is_soft() {
        let view = make_view();
        let pool = CandidatePool::build(&view);

        let mut source = MockPriceSource::new();
        source.expect_name().return_const("mock".to_string());
        source.expect_fetch_tier_prices().returning(|ids| {
            if ids.len() == 2 {
                anyhow::bail!("timeout");
            }
            let mut prices = HashMap::new();
            prices.insert(WearTier::MinimalWear, 50.0);
            Ok(prices)
        });

        let cache = preload_prices(&source, &view, &pool, 1).await.unwrap();
        assert!(!cache.has_any_price("Input", "Case"));
        assert!(cache.has_any_price("Output", "Case"));
    }

    #[tokio::test]
    async fn test_preload_total_failure_is_fatal() {
        let view = make_view();
        let pool = CandidatePool::build(&view);

        let mut source = MockPriceSource::new();
        source.expect_name().return_const("mock".to_string());
        source
            .expect_fetch_tier_prices()
            .returning(|_| anyhow::bail!("connection refused"));

        let result = preload_prices(&source, &view, &pool, 4).await;
        assert!(result.is_err());
        let message = format!("{}", result.unwrap_err());
        assert!(message.contains("no prices loaded"));
    }
}
