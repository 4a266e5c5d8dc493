//! Exhaustive subset enumeration for one rarity partition.
//!
//! Walks every C(n, 10) index subset in lexicographic order, scores
//! each through the shared scorer, and keeps a local top list. The
//! caller is responsible for checking the combination count first;
//! this module never bails out on its own.

use std::cmp::Ordering;

use tracing::debug;

use super::{ScoreOutcome, Scorer};
use crate::types::{ScoredCandidate, COMBO_SIZE};

const PROGRESS_INTERVAL: u128 = 1_000_000;

/// Surviving candidates and counters for one partition.
#[derive(Debug)]
pub(crate) struct ExhaustiveOutcome {
    pub candidates: Vec<ScoredCandidate>,
    pub considered: u128,
    pub pruned: u128,
    pub hits: u64,
}

/// Enumerate and score the whole partition.
pub(crate) fn search(scorer: &mut Scorer<'_>, top_n: usize) -> ExhaustiveOutcome {
    let n = scorer.items().len();
    let mut top = TopList::new(top_n);
    let mut considered: u128 = 0;
    let mut pruned: u128 = 0;
    let mut off_cardline: u128 = 0;
    let mut unscoreable: u128 = 0;
    let mut hits: u64 = 0;

    let mut cursor = SubsetCursor::new(n, COMBO_SIZE);
    while let Some(subset) = cursor.advance() {
        considered += 1;
        match scorer.score(subset) {
            ScoreOutcome::Scored(candidate) => {
                hits += 1;
                top.push(candidate);
            }
            ScoreOutcome::Pruned => pruned += 1,
            ScoreOutcome::NoCardline => off_cardline += 1,
            ScoreOutcome::Unscoreable => unscoreable += 1,
        }
        if considered % PROGRESS_INTERVAL == 0 {
            debug!(considered = %considered, hits, "Enumeration progress");
        }
    }

    debug!(
        considered = %considered,
        pruned = %pruned,
        off_cardline = %off_cardline,
        unscoreable = %unscoreable,
        "Enumeration breakdown"
    );
    ExhaustiveOutcome {
        candidates: top.finish(),
        considered,
        pruned,
        hits,
    }
}

// ---------------------------------------------------------------------------
// Subset cursor
// ---------------------------------------------------------------------------

/// Yields every k-element index subset of `0..n` in lexicographic
/// order. Requires `k <= n`.
struct SubsetCursor {
    indices: Vec<usize>,
    n: usize,
    started: bool,
}

impl SubsetCursor {
    fn new(n: usize, k: usize) -> Self {
        Self {
            indices: (0..k).collect(),
            n,
            started: false,
        }
    }

    fn advance(&mut self) -> Option<&[usize]> {
        if !self.started {
            self.started = true;
            return Some(&self.indices);
        }
        let k = self.indices.len();
        let mut i = k;
        while i > 0 {
            i -= 1;
            // Rightmost index with room to move up; everything after it
            // resets to the tightest ascending run.
            if self.indices[i] < self.n - k + i {
                self.indices[i] += 1;
                for j in i + 1..k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
                return Some(&self.indices);
            }
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Local top list
// ---------------------------------------------------------------------------

/// Candidate list with a soft cap. Grows to four times the cap before
/// compacting, so the hot loop sorts rarely instead of per push.
struct TopList {
    cap: usize,
    entries: Vec<ScoredCandidate>,
}

impl TopList {
    fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            entries: Vec::new(),
        }
    }

    fn push(&mut self, candidate: ScoredCandidate) {
        self.entries.push(candidate);
        if self.entries.len() >= self.cap * 4 {
            self.compact();
        }
    }

    // Stable sort keeps discovery order among equal profits.
    fn compact(&mut self) {
        self.entries.sort_by(|a, b| {
            b.net_profit
                .partial_cmp(&a.net_profit)
                .unwrap_or(Ordering::Equal)
        });
        self.entries.truncate(self.cap);
    }

    fn finish(mut self) -> Vec<ScoredCandidate> {
        self.compact();
        self.entries
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CaseRecord, CatalogOptions, CatalogView, SkinRecord};
    use crate::floats::{CardlineLine, CardlineMatcher};
    use crate::market::PriceCache;
    use crate::types::{CandidateItem, Combination, Rarity, WearTier};

    fn make_skin(name: &str, rarity: &str, tiers: &[(&str, u64)]) -> SkinRecord {
        SkinRecord {
            name: name.to_string(),
            rarity: rarity.to_string(),
            min_float: Some(0.0),
            max_float: Some(1.0),
            market_ids: tiers.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    fn make_view(input_count: usize) -> CatalogView {
        let mut skins: Vec<SkinRecord> = (0..input_count)
            .map(|i| {
                make_skin(
                    &format!("Input {}", i),
                    "Classified",
                    &[("Minimal Wear", 100 + i as u64)],
                )
            })
            .collect();
        skins.push(make_skin("Reward", "Covert", &[("Minimal Wear", 200)]));
        CatalogView::build(
            vec![CaseRecord {
                name: "Gamma".to_string(),
                skins,
            }],
            &CatalogOptions::default(),
        )
        .unwrap()
    }

    fn make_items(count: usize, price: f64) -> Vec<CandidateItem> {
        (0..count)
            .map(|i| CandidateItem {
                skin: format!("Input {}", i),
                case: "Gamma".to_string(),
                rarity: Rarity::Classified,
                next_rarity: Rarity::Covert,
                wear: WearTier::MinimalWear,
                min_float: 0.0,
                max_float: 1.0,
                covered_range: (0.07, 0.15),
                covered_tiers: WearTier::ALL.to_vec(),
                market_id: 100 + i as u64,
                float_value: Some(0.15),
                price: Some(price),
            })
            .collect()
    }

    fn make_scorer<'a>(
        view: &'a CatalogView,
        cache: &'a PriceCache,
        items: &'a [CandidateItem],
        ceiling: f64,
    ) -> Scorer<'a> {
        let lines = vec![CardlineLine {
            skin: "Reward".to_string(),
            case: "Gamma".to_string(),
            tier: WearTier::MinimalWear,
            target: 0.15,
        }];
        Scorer::new(
            view,
            cache,
            items,
            CardlineMatcher::new(0.002, lines),
            Rarity::Covert,
            ceiling,
            true,
        )
    }

    fn make_candidate(net_profit: f64, cost: f64) -> ScoredCandidate {
        let items = make_items(1, cost);
        ScoredCandidate {
            combination: Combination::new(vec![items[0].clone(); 10]),
            average_float: 0.15,
            cost,
            expected_value: net_profit + cost,
            net_profit,
            matched_outputs: Vec::new(),
        }
    }

    #[test]
    fn test_cursor_lexicographic_order() {
        let mut cursor = SubsetCursor::new(4, 2);
        let mut seen = Vec::new();
        while let Some(subset) = cursor.advance() {
            seen.push(subset.to_vec());
        }
        assert_eq!(
            seen,
            vec![
                vec![0, 1],
                vec![0, 2],
                vec![0, 3],
                vec![1, 2],
                vec![1, 3],
                vec![2, 3],
            ]
        );
    }

    #[test]
    fn test_cursor_single_subset_when_k_equals_n() {
        let mut cursor = SubsetCursor::new(3, 3);
        assert_eq!(cursor.advance(), Some(&[0, 1, 2][..]));
        assert_eq!(cursor.advance(), None);
    }

    #[test]
    fn test_search_enumerates_full_partition() {
        let view = make_view(12);
        let mut cache = PriceCache::empty();
        cache.insert("Reward", "Gamma", WearTier::MinimalWear, 500.0);
        let items = make_items(12, 2.0);
        let mut scorer = make_scorer(&view, &cache, &items, 500.0);

        let outcome = search(&mut scorer, 5);
        assert_eq!(outcome.considered, 66);
        assert_eq!(outcome.hits, 66);
        assert_eq!(outcome.candidates.len(), 5);
        // Identical prices, so every survivor nets 500 - 20.
        assert!((outcome.candidates[0].net_profit - 480.0).abs() < 1e-9);
    }

    #[test]
    fn test_search_prunes_expensive_combinations() {
        let view = make_view(12);
        let mut cache = PriceCache::empty();
        cache.insert("Reward", "Gamma", WearTier::MinimalWear, 500.0);
        let items = make_items(12, 60.0);
        let mut scorer = make_scorer(&view, &cache, &items, 500.0);

        let outcome = search(&mut scorer, 5);
        assert_eq!(outcome.considered, 66);
        assert_eq!(outcome.pruned, 66);
        assert!(outcome.candidates.is_empty());
    }

    #[test]
    fn test_search_superset_never_worse_than_subset() {
        let view = make_view(12);
        let mut cache = PriceCache::empty();
        cache.insert("Reward", "Gamma", WearTier::MinimalWear, 500.0);
        let mut items = make_items(12, 0.0);
        for (i, item) in items.iter_mut().enumerate() {
            item.price = Some(10.0 + i as f64);
        }

        let mut scorer = make_scorer(&view, &cache, &items, 500.0);
        let full = search(&mut scorer, 1);

        let narrowed_items: Vec<CandidateItem> = items[2..].to_vec();
        let mut scorer = make_scorer(&view, &cache, &narrowed_items, 500.0);
        let narrowed = search(&mut scorer, 1);

        // Every cost here sits under the ceiling, so nothing is pruned
        // and the wider pool can only match or beat the narrow one.
        assert_eq!(full.pruned, 0);
        assert_eq!(narrowed.pruned, 0);
        assert!((full.candidates[0].net_profit - 355.0).abs() < 1e-9);
        assert!((narrowed.candidates[0].net_profit - 335.0).abs() < 1e-9);
        assert!(full.candidates[0].net_profit >= narrowed.candidates[0].net_profit);
    }

    #[test]
    fn test_top_list_caps_and_sorts() {
        let mut top = TopList::new(3);
        for i in 0..20 {
            top.push(make_candidate(i as f64, 1.0));
        }
        let out = top.finish();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].net_profit, 19.0);
        assert_eq!(out[1].net_profit, 18.0);
        assert_eq!(out[2].net_profit, 17.0);
    }

    #[test]
    fn test_top_list_ties_keep_discovery_order() {
        let mut top = TopList::new(2);
        top.push(make_candidate(5.0, 1.0));
        top.push(make_candidate(5.0, 2.0));
        top.push(make_candidate(1.0, 3.0));
        let out = top.finish();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].cost, 1.0);
        assert_eq!(out[1].cost, 2.0);
    }
}
