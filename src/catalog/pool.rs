//! Candidate pool construction and rarity partitioning.
//!
//! A pool item is one (skin, wear) pair the search may place into an
//! input slot. Items at the top rarity never enter the pool; they have
//! nothing to trade up into. Partitioning groups items by the rarity
//! they produce, since a contract's ten inputs must share one output
//! rarity.

use std::collections::HashMap;
use tracing::{debug, info};

use super::CatalogView;
use crate::market::PriceCache;
use crate::types::{CandidateItem, Rarity, WearTier};

/// The full set of search-eligible items, before mode-specific filters.
#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    pub items: Vec<CandidateItem>,
}

impl CandidatePool {
    /// Build the pool from a validated catalog view.
    ///
    /// Exclusions here are data preconditions: no next rarity (top
    /// tier), or no market identifier for a wear. Both are normal
    /// dataset conditions, logged at debug level.
    pub fn build(view: &CatalogView) -> Self {
        let mut items = Vec::new();
        let mut top_rarity_skipped = 0usize;

        for case in &view.cases {
            for skin in &case.skins {
                let next_rarity = match skin.rarity.next() {
                    Some(r) => r,
                    None => {
                        top_rarity_skipped += 1;
                        continue;
                    }
                };
                let covered_tiers = skin.covered_tiers();

                // Deterministic item order: tiers ascending within a skin.
                let mut ids: Vec<(WearTier, u64)> =
                    skin.market_ids.iter().map(|(t, id)| (*t, *id)).collect();
                ids.sort_by_key(|(t, _)| *t);

                for (wear, market_id) in ids {
                    let covered_range = match skin.covered.get(&wear) {
                        Some(r) => *r,
                        None => {
                            debug!(skin = %skin.name, wear = %wear, "No coverage for priced wear");
                            continue;
                        }
                    };
                    let midpoint = (covered_range.0 + covered_range.1) / 2.0;
                    items.push(CandidateItem {
                        skin: skin.name.clone(),
                        case: case.name.clone(),
                        rarity: skin.rarity,
                        next_rarity,
                        wear,
                        min_float: skin.min_float,
                        max_float: skin.max_float,
                        covered_range,
                        covered_tiers: covered_tiers.clone(),
                        market_id,
                        float_value: Some(midpoint),
                        price: None,
                    });
                }
            }
        }

        info!(
            items = items.len(),
            top_rarity_skipped,
            "Candidate pool built"
        );
        CandidatePool { items }
    }

    /// Attach prices from the fully built cache. Called exactly once,
    /// before any search task starts; items without a cached price stay
    /// unknown and make their combinations unscoreable.
    pub fn attach_prices(&mut self, cache: &PriceCache) {
        let mut priced = 0usize;
        for item in &mut self.items {
            item.price = cache.price(&item.skin, &item.case, item.wear);
            if item.price.is_some() {
                priced += 1;
            }
        }
        info!(
            priced,
            unpriced = self.items.len() - priced,
            "Prices attached to pool"
        );
    }

    /// Group items by the rarity they consume into, ascending.
    pub fn partitions(&self) -> Vec<(Rarity, Vec<CandidateItem>)> {
        let mut by_rarity: HashMap<Rarity, Vec<CandidateItem>> = HashMap::new();
        for item in &self.items {
            by_rarity
                .entry(item.next_rarity)
                .or_default()
                .push(item.clone());
        }
        let mut partitions: Vec<(Rarity, Vec<CandidateItem>)> = by_rarity.into_iter().collect();
        partitions.sort_by_key(|(rarity, _)| *rarity);
        partitions
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Cardline-mode preparation: pin every item's float to the target
/// tier's boundary value and drop items whose own wear band cannot sit
/// at that value.
///
/// The boundary belongs to two wears at once: the target tier tops out
/// there and the next tier starts there, so both survive the filter.
/// Anything further away is an impossible purchase at that float.
pub fn pin_to_cardline(items: &[CandidateItem], tier: WearTier) -> Vec<CandidateItem> {
    let target = tier.upper();
    items
        .iter()
        .filter(|it| it.covered_range.0 <= target && target <= it.covered_range.1)
        .map(|it| {
            let mut pinned = it.clone();
            pinned.float_value = Some(target);
            pinned
        })
        .collect()
}

/// Keep items of skins whose coverage includes the target tier.
/// Representative floats stay at their covered-range midpoints.
pub fn eligible_for_tier(items: &[CandidateItem], tier: WearTier) -> Vec<CandidateItem> {
    items
        .iter()
        .filter(|it| it.covered_tiers.contains(&tier))
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
