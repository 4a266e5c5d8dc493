//! Float arithmetic for trade-up contracts.
//!
//! The output of a trade-up rolls a float by remapping the ten inputs'
//! average float into the output skin's own range. Hitting a wear-tier
//! boundary exactly ("the cardline") therefore pins the output's tier.
//! Everything here is pure arithmetic over `f64`.

use crate::types::{CandidateItem, CardlineHit, WearTier};
use std::collections::HashMap;

/// Decimal places used when memoizing cardline lookups. Representative
/// floats are quantized, so many combinations share the same average.
const MATCH_CACHE_DECIMALS: i32 = 5;

/// Mean of the items' representative floats. `None` on an empty
/// sequence or when any item lacks a resolvable float; such a
/// combination is unscoreable, not an error.
pub fn average_float<'a, I>(items: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a CandidateItem>,
{
    let mut sum = 0.0;
    let mut count = 0usize;
    for item in items {
        sum += item.float_value?;
        count += 1;
    }
    if count == 0 {
        return None;
    }
    Some(sum / count as f64)
}

/// The unique tier whose half-open band contains `value`, or `None`
/// outside `[0, 1)`.
pub fn tier_of(value: f64) -> Option<WearTier> {
    WearTier::ALL
        .iter()
        .copied()
        .find(|tier| {
            let (lo, hi) = tier.band();
            value >= lo && value < hi
        })
}

/// Forward remap of an average float into an output skin's range:
/// `value * (max_f - min_f) + min_f`.
pub fn remap(value: f64, min_f: f64, max_f: f64) -> f64 {
    value * (max_f - min_f) + min_f
}

/// The average-float value that lands exactly on `tier`'s upper boundary
/// after remapping into `[min_f, max_f]`.
///
/// `None` when the range is degenerate (`max_f <= min_f`) or the result
/// falls outside `[0, 1]`; that skin/tier pair has no achievable
/// cardline.
pub fn cardline_target(min_f: f64, max_f: f64, tier: WearTier) -> Option<f64> {
    if max_f <= min_f {
        return None;
    }
    let target = (tier.upper() - min_f) / (max_f - min_f);
    if (0.0..=1.0).contains(&target) {
        Some(target)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Cardline matching
// ---------------------------------------------------------------------------

/// One output skin's cardline for the tier being targeted.
#[derive(Debug, Clone)]
pub struct CardlineLine {
    pub skin: String,
    pub case: String,
    pub tier: WearTier,
    pub target: f64,
}

/// Matches average floats against a partition's cardlines with an
/// absolute tolerance, memoized by the rounded average.
///
/// Ties are not resolved: every line within tolerance is a hit.
#[derive(Debug)]
pub struct CardlineMatcher {
    tolerance: f64,
    lines: Vec<CardlineLine>,
    cache: HashMap<i64, Vec<usize>>,
}

impl CardlineMatcher {
    pub fn new(tolerance: f64, lines: Vec<CardlineLine>) -> Self {
        Self {
            tolerance,
            lines,
            cache: HashMap::new(),
        }
    }

    /// Indices into the line list whose target is within tolerance of
    /// `average`. Empty means no cardline hit.
    pub fn matches(&mut self, average: f64) -> Vec<usize> {
        let key = cache_key(average);
        if let Some(hit) = self.cache.get(&key) {
            return hit.clone();
        }
        let hits: Vec<usize> = self
            .lines
            .iter()
            .enumerate()
            .filter(|(_, line)| (average - line.target).abs() <= self.tolerance)
            .map(|(i, _)| i)
            .collect();
        self.cache.insert(key, hits.clone());
        hits
    }

    /// Materialize hit indices into reportable hits.
    pub fn hits(&self, indices: &[usize]) -> Vec<CardlineHit> {
        indices
            .iter()
            .filter_map(|&i| self.lines.get(i))
            .map(|line| CardlineHit {
                skin: line.skin.clone(),
                case: line.case.clone(),
                tier: line.tier,
                target: line.target,
            })
            .collect()
    }
}

fn cache_key(average: f64) -> i64 {
    (average * 10f64.powi(MATCH_CACHE_DECIMALS)).round() as i64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Rarity, COMBO_SIZE};

    fn make_item(wear: WearTier, float_value: Option<f64>) -> CandidateItem {
        let (lo, hi) = wear.band();
        CandidateItem {
            skin: "Skin".to_string(),
            case: "Case".to_string(),
            rarity: Rarity::MilSpec,
            next_rarity: Rarity::Restricted,
            wear,
            min_float: 0.0,
            max_float: 1.0,
            covered_range: (lo, hi),
            covered_tiers: WearTier::ALL.to_vec(),
            market_id: 1,
            float_value,
            price: Some(1.0),
        }
    }

    // -- average_float --

    #[test]
    fn test_average_float_is_mean() {
        let items: Vec<CandidateItem> = (0..COMBO_SIZE)
            .map(|i| make_item(WearTier::FieldTested, Some(0.10 + i as f64 * 0.01)))
            .collect();
        let avg = average_float(&items).unwrap();
        assert!((avg - 0.145).abs() < 1e-12);
    }

    #[test]
    fn test_average_float_commutative() {
        let mut items: Vec<CandidateItem> = (0..COMBO_SIZE)
            .map(|i| make_item(WearTier::FieldTested, Some(0.05 + i as f64 * 0.03)))
            .collect();
        let forward = average_float(&items).unwrap();
        items.reverse();
        let reversed = average_float(&items).unwrap();
        items.swap(2, 7);
        let swapped = average_float(&items).unwrap();
        assert!((forward - reversed).abs() < 1e-12);
        assert!((forward - swapped).abs() < 1e-12);
    }

    #[test]
    fn test_average_float_unscoreable() {
        let mut items: Vec<CandidateItem> = (0..COMBO_SIZE)
            .map(|_| make_item(WearTier::FieldTested, Some(0.2)))
            .collect();
        items[4].float_value = None;
        assert!(average_float(&items).is_none());

        let empty: Vec<CandidateItem> = Vec::new();
        assert!(average_float(&empty).is_none());
    }

    // -- tier_of --

    #[test]
    fn test_tier_of_interior_points() {
        assert_eq!(tier_of(0.03), Some(WearTier::FactoryNew));
        assert_eq!(tier_of(0.10), Some(WearTier::MinimalWear));
        assert_eq!(tier_of(0.25), Some(WearTier::FieldTested));
        assert_eq!(tier_of(0.40), Some(WearTier::WellWorn));
        assert_eq!(tier_of(0.80), Some(WearTier::BattleScarred));
    }

    #[test]
    fn test_tier_of_boundaries_are_half_open() {
        assert_eq!(tier_of(0.0), Some(WearTier::FactoryNew));
        assert_eq!(tier_of(0.07), Some(WearTier::MinimalWear));
        assert_eq!(tier_of(0.15), Some(WearTier::FieldTested));
        assert_eq!(tier_of(0.45), Some(WearTier::BattleScarred));
    }

    #[test]
    fn test_tier_of_out_of_range() {
        assert_eq!(tier_of(1.0), None);
        assert_eq!(tier_of(-0.01), None);
        assert_eq!(tier_of(1.5), None);
    }

    // -- cardline_target / remap --

    #[test]
    fn test_cardline_round_trip() {
        // Remapping the target must reproduce the tier's upper boundary.
        let cases = [(0.0, 1.0), (0.06, 0.8), (0.1, 0.7), (0.0, 0.5)];
        for (min_f, max_f) in cases {
            for tier in WearTier::ALL {
                if let Some(target) = cardline_target(min_f, max_f, *tier) {
                    let out = remap(target, min_f, max_f);
                    assert!(
                        (out - tier.upper()).abs() < 1e-9,
                        "range [{min_f}, {max_f}] tier {tier}: got {out}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_cardline_full_range_equals_boundary() {
        let target = cardline_target(0.0, 1.0, WearTier::MinimalWear).unwrap();
        assert!((target - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_cardline_degenerate_range() {
        assert!(cardline_target(0.3, 0.3, WearTier::FieldTested).is_none());
        assert!(cardline_target(0.5, 0.2, WearTier::FieldTested).is_none());
    }

    #[test]
    fn test_cardline_unreachable_tier() {
        // Skin capped at 0.5 can never roll a Battle-Scarred boundary of 1.0.
        assert!(cardline_target(0.0, 0.5, WearTier::BattleScarred).is_none());
        // Skin starting at 0.1 can never land on the Factory New boundary.
        assert!(cardline_target(0.1, 0.6, WearTier::FactoryNew).is_none());
    }

    // -- CardlineMatcher --

    fn make_lines() -> Vec<CardlineLine> {
        vec![
            CardlineLine {
                skin: "A".to_string(),
                case: "Case".to_string(),
                tier: WearTier::MinimalWear,
                target: 0.15,
            },
            CardlineLine {
                skin: "B".to_string(),
                case: "Case".to_string(),
                tier: WearTier::MinimalWear,
                target: 0.149,
            },
            CardlineLine {
                skin: "C".to_string(),
                case: "Case".to_string(),
                tier: WearTier::MinimalWear,
                target: 0.30,
            },
        ]
    }

    #[test]
    fn test_matcher_reports_all_hits_within_tolerance() {
        let mut matcher = CardlineMatcher::new(0.002, make_lines());
        let hits = matcher.matches(0.1495);
        assert_eq!(hits, vec![0, 1]);
        let materialized = matcher.hits(&hits);
        assert_eq!(materialized.len(), 2);
        assert_eq!(materialized[0].skin, "A");
        assert_eq!(materialized[1].skin, "B");
    }

    #[test]
    fn test_matcher_no_hit() {
        let mut matcher = CardlineMatcher::new(0.002, make_lines());
        assert!(matcher.matches(0.20).is_empty());
    }

    #[test]
    fn test_matcher_cache_consistent() {
        let mut matcher = CardlineMatcher::new(0.002, make_lines());
        let first = matcher.matches(0.15);
        let second = matcher.matches(0.15);
        assert_eq!(first, second);
        assert_eq!(matcher.cache.len(), 1);
    }

    #[test]
    fn test_matcher_wide_tolerance() {
        let mut matcher = CardlineMatcher::new(0.02, make_lines());
        // 0.144 is within 0.02 of both 0.15 and 0.149, not of 0.30.
        assert_eq!(matcher.matches(0.144), vec![0, 1]);
    }
}
