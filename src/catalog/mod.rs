//! Catalog loading and projection.
//!
//! The external dataset describes cases and their skins (rarity, float
//! range, per-wear market identifiers). This module loads the raw JSON,
//! validates each entry, recomputes wear-tier coverage from the float
//! range, and projects everything into the read-only [`CatalogView`]
//! the search engines run against. Malformed entries are dropped with a
//! warning, never rejected wholesale.

pub mod pool;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use tracing::{debug, info, warn};

use crate::types::{CardlineError, Rarity, WearTier};

// ---------------------------------------------------------------------------
// Raw dataset records
// ---------------------------------------------------------------------------

/// One case as it appears in the dataset file.
#[derive(Debug, Clone, Deserialize)]
pub struct CaseRecord {
    #[serde(alias = "case_name")]
    pub name: String,
    #[serde(default)]
    pub skins: Vec<SkinRecord>,
}

/// One skin as it appears in the dataset file. Field names mirror the
/// upstream export; tier keys inside `market_ids` are free-form strings
/// and get parsed during projection.
#[derive(Debug, Clone, Deserialize)]
pub struct SkinRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rarity: String,
    pub min_float: Option<f64>,
    pub max_float: Option<f64>,
    #[serde(default, alias = "wear_goods_ids")]
    pub market_ids: HashMap<String, u64>,
}

/// Load the raw case records from a JSON dataset file.
pub fn load_catalog(path: &str) -> Result<Vec<CaseRecord>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog file: {path}"))?;
    let records: Vec<CaseRecord> = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse catalog file: {path}"))?;
    Ok(records)
}

// ---------------------------------------------------------------------------
// Projected view
// ---------------------------------------------------------------------------

/// Case-name filters applied while building the view.
#[derive(Debug, Clone, Default)]
pub struct CatalogOptions {
    /// Keep only these cases when non-empty.
    pub allowed_cases: Vec<String>,
    /// Drop cases whose name contains any of these substrings
    /// (souvenir packages and the like).
    pub exclude_name_contains: Vec<String>,
}

/// A validated skin, ready for search.
#[derive(Debug, Clone)]
pub struct SkinView {
    pub name: String,
    pub case: String,
    pub rarity: Rarity,
    pub min_float: f64,
    pub max_float: f64,
    /// Wear tiers the float range intersects, with the expressible
    /// sub-range per tier.
    pub covered: HashMap<WearTier, (f64, f64)>,
    /// Market identifier per wear tier, for price lookup.
    pub market_ids: HashMap<WearTier, u64>,
}

impl SkinView {
    /// Covered tiers in ascending band order.
    pub fn covered_tiers(&self) -> Vec<WearTier> {
        let mut tiers: Vec<WearTier> = self.covered.keys().copied().collect();
        tiers.sort();
        tiers
    }
}

/// A case and its surviving skins.
#[derive(Debug, Clone)]
pub struct CaseView {
    pub name: String,
    pub skins: Vec<SkinView>,
}

/// Read-only projection of the dataset. Built once per run, then shared
/// immutably with every search task.
#[derive(Debug, Clone)]
pub struct CatalogView {
    pub cases: Vec<CaseView>,
}

impl CatalogView {
    /// Project raw records into a validated view.
    ///
    /// Fails only when nothing survives validation; individual bad
    /// entries are logged and dropped.
    pub fn build(records: Vec<CaseRecord>, options: &CatalogOptions) -> Result<Self> {
        let mut cases = Vec::new();

        for record in records {
            if record.name.trim().is_empty() {
                warn!("Dropping case with empty name");
                continue;
            }
            if !options.allowed_cases.is_empty()
                && !options.allowed_cases.iter().any(|c| c == &record.name)
            {
                debug!(case = %record.name, "Case not in allow-list, skipping");
                continue;
            }
            if options
                .exclude_name_contains
                .iter()
                .any(|pat| !pat.is_empty() && record.name.contains(pat.as_str()))
            {
                debug!(case = %record.name, "Case excluded by name filter");
                continue;
            }

            let mut skins = Vec::new();
            for skin in record.skins {
                match project_skin(&record.name, skin) {
                    Some(view) => skins.push(view),
                    None => continue,
                }
            }

            if skins.is_empty() {
                warn!(case = %record.name, "Case has no valid skins, dropping");
                continue;
            }
            cases.push(CaseView {
                name: record.name,
                skins,
            });
        }

        let skin_count: usize = cases.iter().map(|c| c.skins.len()).sum();
        if cases.is_empty() || skin_count == 0 {
            return Err(CardlineError::Catalog(
                "catalog is empty after validation".to_string(),
            )
            .into());
        }

        info!(cases = cases.len(), skins = skin_count, "Catalog view built");
        Ok(CatalogView { cases })
    }

    pub fn case(&self, name: &str) -> Option<&CaseView> {
        self.cases.iter().find(|c| c.name == name)
    }

    pub fn skin_count(&self) -> usize {
        self.cases.iter().map(|c| c.skins.len()).sum()
    }

    /// Skins of a given rarity within one case that carry market
    /// identifiers: the equally-likely output bucket of a trade-up
    /// consuming items from that case.
    pub fn same_rarity_in_case(&self, case: &str, rarity: Rarity) -> Vec<&SkinView> {
        match self.case(case) {
            Some(c) => c
                .skins
                .iter()
                .filter(|s| s.rarity == rarity && !s.market_ids.is_empty())
                .collect(),
            None => Vec::new(),
        }
    }
}

/// Validate and project one skin record. Returns `None` (after logging)
/// for entries the search cannot use.
fn project_skin(case: &str, record: SkinRecord) -> Option<SkinView> {
    let name = record.name.trim().to_string();
    if name.is_empty() {
        warn!(case = %case, "Dropping skin with empty name");
        return None;
    }

    let rarity: Rarity = match record.rarity.parse() {
        Ok(r) => r,
        Err(_) => {
            warn!(case = %case, skin = %name, rarity = %record.rarity, "Unknown rarity, dropping skin");
            return None;
        }
    };

    let (min_float, max_float) = match (record.min_float, record.max_float) {
        (Some(lo), Some(hi)) if hi > lo => (lo, hi),
        _ => {
            warn!(
                case = %case,
                skin = %name,
                min = ?record.min_float,
                max = ?record.max_float,
                "Missing or degenerate float range, dropping skin"
            );
            return None;
        }
    };

    let covered = coverage(min_float, max_float);

    let mut market_ids = HashMap::new();
    for (key, id) in record.market_ids {
        let tier: WearTier = match key.parse() {
            Ok(t) => t,
            Err(_) => {
                // StatTrak and other special variants land here.
                debug!(skin = %name, key = %key, "Ignoring unparsable wear key");
                continue;
            }
        };
        if !covered.contains_key(&tier) {
            debug!(
                skin = %name,
                tier = %tier,
                "Market id for a wear outside the float range, ignoring"
            );
            continue;
        }
        market_ids.insert(tier, id);
    }

    if market_ids.is_empty() {
        warn!(case = %case, skin = %name, "No usable market identifiers, dropping skin");
        return None;
    }

    Some(SkinView {
        name,
        case: case.to_string(),
        rarity,
        min_float,
        max_float,
        covered,
        market_ids,
    })
}

/// Intersect a float range with the five fixed tier bands. A tier is
/// covered when the intersection is a real interval, not a single point.
pub fn coverage(min_float: f64, max_float: f64) -> HashMap<WearTier, (f64, f64)> {
    let mut covered = HashMap::new();
    for tier in WearTier::ALL {
        let (band_lo, band_hi) = tier.band();
        let lo = band_lo.max(min_float);
        let hi = band_hi.min(max_float);
        if lo < hi {
            covered.insert(*tier, (lo, hi));
        }
    }
    covered
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
