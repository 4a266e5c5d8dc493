//! Combination search across rarity partitions.
//!
//! The candidate pool splits into independent partitions by output
//! rarity. Each partition runs on its own blocking task against the
//! shared read-only catalog view and price cache, keeps a local
//! candidate list, and the lists are merged and ranked once every task
//! has finished. The strategy decides the engine per partition:
//! exhaustive enumeration while the combination count stays tractable,
//! the genetic engine beyond that, and the wear-mix optimizer for
//! single-skin composition tuning.

pub mod exhaustive;
pub mod genetic;
pub mod mix;

use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::catalog::pool::{self, CandidatePool};
use crate::catalog::CatalogView;
use crate::floats::{average_float, cardline_target, remap, tier_of, CardlineLine, CardlineMatcher};
use crate::market::PriceCache;
use crate::report;
use crate::resolver::OutputResolver;
use crate::types::{
    CandidateItem, CardlineError, CardlineHit, Combination, Rarity, ScoredCandidate,
    SearchSummary, WearTier, COMBO_SIZE,
};

pub use genetic::GeneticConfig;

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

/// Which engine handles a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Exhaustive when the combination count is below the configured
    /// cutoff, genetic otherwise, decided per partition.
    Auto,
    Exhaustive,
    Genetic,
    /// Wear-composition tuning per skin, no cardline requirement.
    Mix,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Strategy::Auto => "auto",
            Strategy::Exhaustive => "exhaustive",
            Strategy::Genetic => "genetic",
            Strategy::Mix => "mix",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for Strategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Strategy::Auto),
            "exhaustive" | "exh" | "brute" | "full" => Ok(Strategy::Exhaustive),
            "genetic" | "ga" | "evolution" => Ok(Strategy::Genetic),
            "mix" | "wear-mix" | "wearmix" => Ok(Strategy::Mix),
            other => anyhow::bail!("Unknown search strategy: {}", other),
        }
    }
}

/// One search invocation, carried unchanged into every partition task.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// The wear-tier boundary the search cards outputs onto.
    pub target_tier: WearTier,
    /// Absolute tolerance for cardline matching.
    pub tolerance: f64,
    pub strategy: Strategy,
    /// Global result cap after ranking.
    pub top_n: usize,
    /// Auto-strategy cutoff: partitions whose combination count exceeds
    /// this go to the genetic engine.
    pub max_exhaustive_combos: u128,
    /// Pin eligible floats to the exact boundary value instead of using
    /// tier midpoints (models buying at the cardline float itself).
    pub pin_to_boundary: bool,
    pub genetic: GeneticConfig,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            target_tier: WearTier::MinimalWear,
            tolerance: 0.02,
            strategy: Strategy::Auto,
            top_n: 10,
            max_exhaustive_combos: 5_000_000,
            pin_to_boundary: false,
            genetic: GeneticConfig::default(),
        }
    }
}

/// Binomial coefficient C(n, k), saturating at `u128::MAX`.
pub fn combination_count(n: usize, k: usize) -> u128 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut result: u128 = 1;
    for i in 0..k {
        // Exact at every step: C(n, i) * (n - i) is divisible by i + 1.
        result = match result.checked_mul((n - i) as u128) {
            Some(v) => v / (i as u128 + 1),
            None => return u128::MAX,
        };
    }
    result
}

// ---------------------------------------------------------------------------
// Shared scoring
// ---------------------------------------------------------------------------

/// What became of one candidate combination.
#[derive(Debug)]
pub(crate) enum ScoreOutcome {
    Scored(ScoredCandidate),
    /// Cost above the partition's best possible sale price.
    Pruned,
    /// No cardline hit among the combination's own outputs.
    NoCardline,
    /// Missing input price, missing float, or no priceable output tier.
    Unscoreable,
}

/// Scores combinations against one partition's output universe. Every
/// engine goes through here, so profit figures agree between them.
///
/// Combinations are slices of indices into the partition's item list,
/// which keeps the enumeration hot loop free of clones. Indices may
/// repeat; a slot is a purchase, not a unique listing.
pub(crate) struct Scorer<'a> {
    items: &'a [CandidateItem],
    resolver: OutputResolver<'a>,
    cache: &'a PriceCache,
    matcher: CardlineMatcher,
    output_rarity: Rarity,
    price_ceiling: f64,
    require_cardline: bool,
}

impl<'a> Scorer<'a> {
    pub(crate) fn new(
        view: &'a CatalogView,
        cache: &'a PriceCache,
        items: &'a [CandidateItem],
        matcher: CardlineMatcher,
        output_rarity: Rarity,
        price_ceiling: f64,
        require_cardline: bool,
    ) -> Self {
        Self {
            items,
            resolver: OutputResolver::new(view),
            cache,
            matcher,
            output_rarity,
            price_ceiling,
            require_cardline,
        }
    }

    pub(crate) fn items(&self) -> &'a [CandidateItem] {
        self.items
    }

    /// Score the combination at these partition indices.
    ///
    /// A hit output sells at its carded tier; every other output sells
    /// at the tier its remapped float lands in. Unpriced tiers drop out
    /// of the expectation, and a combination with no priceable output
    /// at all is unscoreable rather than worth zero.
    pub(crate) fn score(&mut self, indices: &[usize]) -> ScoreOutcome {
        let cost = match indices
            .iter()
            .map(|&i| self.items[i].price)
            .sum::<Option<f64>>()
        {
            Some(c) => c,
            None => return ScoreOutcome::Unscoreable,
        };
        if cost > self.price_ceiling {
            return ScoreOutcome::Pruned;
        }
        let average = match average_float(indices.iter().map(|&i| &self.items[i])) {
            Some(a) => a,
            None => return ScoreOutcome::Unscoreable,
        };

        let line_indices = self.matcher.matches(average);
        if self.require_cardline && line_indices.is_empty() {
            return ScoreOutcome::NoCardline;
        }

        let outputs = self
            .resolver
            .resolve(indices.iter().map(|&i| &self.items[i]), self.output_rarity);
        let matched: Vec<CardlineHit> = self
            .matcher
            .hits(&line_indices)
            .into_iter()
            .filter(|hit| outputs.iter().any(|o| o.skin == hit.skin && o.case == hit.case))
            .collect();
        if self.require_cardline && matched.is_empty() {
            return ScoreOutcome::NoCardline;
        }

        let mut expected = 0.0;
        let mut priced_outputs = 0usize;
        for output in &outputs {
            let tier = match matched
                .iter()
                .find(|h| h.skin == output.skin && h.case == output.case)
            {
                Some(hit) => Some(hit.tier),
                None => tier_of(remap(average, output.min_float, output.max_float)),
            };
            let tier = match tier {
                Some(t) => t,
                None => continue,
            };
            if let Some(price) = self.cache.price(&output.skin, &output.case, tier) {
                expected += output.probability * price;
                priced_outputs += 1;
            }
        }
        if priced_outputs == 0 {
            return ScoreOutcome::Unscoreable;
        }

        ScoreOutcome::Scored(ScoredCandidate {
            combination: Combination::new(
                indices.iter().map(|&i| self.items[i].clone()).collect(),
            ),
            average_float: average,
            cost,
            expected_value: expected,
            net_profit: expected - cost,
            matched_outputs: matched,
        })
    }
}

// ---------------------------------------------------------------------------
// Orchestration
// ---------------------------------------------------------------------------

/// Ranked candidates plus run counters.
#[derive(Debug)]
pub struct SearchOutcome {
    pub candidates: Vec<ScoredCandidate>,
    pub summary: SearchSummary,
}

/// Run the requested search across every rarity partition.
///
/// Partitions share nothing mutable, so each runs on its own blocking
/// task. The merged candidates are ranked here; callers see one global
/// top list.
pub async fn run_search(
    view: Arc<CatalogView>,
    cache: Arc<PriceCache>,
    pool: &CandidatePool,
    request: &SearchRequest,
) -> Result<SearchOutcome> {
    let partitions = pool.partitions();
    info!(
        partitions = partitions.len(),
        strategy = %request.strategy,
        target = %request.target_tier,
        tolerance = request.tolerance,
        "Search starting"
    );

    let mut tasks = Vec::with_capacity(partitions.len());
    for (output_rarity, items) in partitions {
        let view = Arc::clone(&view);
        let cache = Arc::clone(&cache);
        let request = request.clone();
        tasks.push(tokio::task::spawn_blocking(move || {
            search_partition(&view, &cache, output_rarity, items, &request)
        }));
    }

    let mut candidates = Vec::new();
    let mut summary = SearchSummary::default();
    for outcome in join_all(tasks).await {
        let (partition_candidates, partition_summary) = outcome
            .map_err(|e| CardlineError::Search(format!("partition task failed: {}", e)))?;
        candidates.extend(partition_candidates);
        summary.absorb(&partition_summary);
    }

    let ranked = report::rank(candidates, request.top_n);
    summary.candidates_ranked = ranked.len();
    info!(%summary, "Search finished");
    Ok(SearchOutcome {
        candidates: ranked,
        summary,
    })
}

enum Engine {
    Exhaustive,
    Genetic,
    Mix,
}

fn resolve_engine(request: &SearchRequest, pool_size: usize, rarity: Rarity) -> Engine {
    match request.strategy {
        Strategy::Exhaustive => Engine::Exhaustive,
        Strategy::Genetic => Engine::Genetic,
        Strategy::Mix => Engine::Mix,
        Strategy::Auto => {
            let estimate = combination_count(pool_size, COMBO_SIZE);
            if estimate <= request.max_exhaustive_combos {
                debug!(rarity = %rarity, combos = %estimate, "Auto strategy picked exhaustive");
                Engine::Exhaustive
            } else {
                info!(
                    rarity = %rarity,
                    combos = %estimate,
                    cutoff = %request.max_exhaustive_combos,
                    "Combination count too high for enumeration, using genetic engine"
                );
                Engine::Genetic
            }
        }
    }
}

/// Search one partition. Returns its candidates and counters.
fn search_partition(
    view: &CatalogView,
    cache: &PriceCache,
    output_rarity: Rarity,
    items: Vec<CandidateItem>,
    request: &SearchRequest,
) -> (Vec<ScoredCandidate>, SearchSummary) {
    let mut summary = SearchSummary {
        partitions_total: 1,
        ..SearchSummary::default()
    };

    // Mix tunes wear compositions and wants every listed wear; the tier
    // filter and boundary pinning only apply to the subset engines.
    let eligible = match request.strategy {
        Strategy::Mix => items,
        _ => {
            let filtered = pool::eligible_for_tier(&items, request.target_tier);
            if request.pin_to_boundary {
                pool::pin_to_cardline(&filtered, request.target_tier)
            } else {
                filtered
            }
        }
    };

    if eligible.is_empty() {
        info!(rarity = %output_rarity, "Partition empty after tier filter, skipped");
        summary.partitions_skipped = 1;
        return (Vec::new(), summary);
    }
    if request.strategy != Strategy::Mix && eligible.len() < COMBO_SIZE {
        info!(
            rarity = %output_rarity,
            items = eligible.len(),
            "Partition smaller than one contract, skipped"
        );
        summary.partitions_skipped = 1;
        return (Vec::new(), summary);
    }

    let resolver = OutputResolver::new(view);
    let universe = resolver.output_universe(&eligible, output_rarity);
    if universe.is_empty() {
        info!(rarity = %output_rarity, "Partition has no output candidates, skipped");
        summary.partitions_skipped = 1;
        return (Vec::new(), summary);
    }

    let mut price_ceiling: Option<f64> = None;
    for output in &universe {
        if let Some(p) = cache.best_price(&output.skin, &output.case) {
            price_ceiling = Some(price_ceiling.map_or(p, |c: f64| c.max(p)));
        }
    }
    let price_ceiling = match price_ceiling {
        Some(p) => p,
        None => {
            warn!(
                rarity = %output_rarity,
                outputs = universe.len(),
                "No priceable outputs, partition skipped"
            );
            summary.partitions_skipped = 1;
            return (Vec::new(), summary);
        }
    };

    let lines: Vec<CardlineLine> = universe
        .iter()
        .filter_map(|o| {
            cardline_target(o.min_float, o.max_float, request.target_tier).map(|target| {
                CardlineLine {
                    skin: o.skin.clone(),
                    case: o.case.clone(),
                    tier: request.target_tier,
                    target,
                }
            })
        })
        .collect();
    if request.strategy != Strategy::Mix && lines.is_empty() {
        info!(
            rarity = %output_rarity,
            tier = %request.target_tier,
            "No output reaches this tier's boundary, partition skipped"
        );
        summary.partitions_skipped = 1;
        return (Vec::new(), summary);
    }

    let ga_target = genetic::pick_target(&lines, cache);
    let engine = resolve_engine(request, eligible.len(), output_rarity);
    let matcher = CardlineMatcher::new(request.tolerance, lines);
    let mut scorer = Scorer::new(
        view,
        cache,
        &eligible,
        matcher,
        output_rarity,
        price_ceiling,
        matches!(engine, Engine::Exhaustive),
    );

    match engine {
        Engine::Exhaustive => {
            let estimate = combination_count(eligible.len(), COMBO_SIZE);
            info!(
                rarity = %output_rarity,
                items = eligible.len(),
                combos = %estimate,
                "Exhaustive search over partition"
            );
            let outcome = exhaustive::search(&mut scorer, request.top_n);
            summary.partitions_searched = 1;
            summary.combinations_considered = outcome.considered;
            summary.pruned = outcome.pruned;
            summary.hits = outcome.hits;
            info!(
                rarity = %output_rarity,
                candidates = outcome.candidates.len(),
                hits = outcome.hits,
                pruned = %outcome.pruned,
                "Partition search complete"
            );
            (outcome.candidates, summary)
        }
        Engine::Genetic => {
            let target = match ga_target {
                Some(t) => t,
                None => {
                    warn!(
                        rarity = %output_rarity,
                        "No priced cardline target for the genetic engine, partition skipped"
                    );
                    summary.partitions_skipped = 1;
                    return (Vec::new(), summary);
                }
            };
            let outcome = genetic::evolve(&mut scorer, &request.genetic, &target);
            summary.partitions_searched = 1;
            summary.combinations_considered = outcome.evaluations as u128;
            summary.hits = outcome.hits;
            let candidates = match outcome.best {
                Some(best) => {
                    info!(
                        rarity = %output_rarity,
                        fitness = outcome.best_fitness,
                        "Genetic search complete"
                    );
                    vec![best]
                }
                None => {
                    info!(
                        rarity = %output_rarity,
                        "Genetic search never produced a viable combination"
                    );
                    Vec::new()
                }
            };
            (candidates, summary)
        }
        Engine::Mix => {
            let outcome = mix::search(&mut scorer);
            summary.partitions_searched = 1;
            summary.combinations_considered = outcome.evaluated as u128;
            summary.hits = outcome.hits;
            info!(
                rarity = %output_rarity,
                skins = outcome.skins,
                candidates = outcome.candidates.len(),
                "Wear-mix search complete"
            );
            (outcome.candidates, summary)
        }
    }
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

    // Classified inputs and a Covert reward keep the pool to a single
    // partition: the reward itself has nothing to trade up into.
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
        let records = vec![CaseRecord {
            name: "Gamma".to_string(),
            skins,
        }];
        CatalogView::build(records, &CatalogOptions::default()).unwrap()
    }

    fn make_cache(input_count: usize, reward_priced: bool) -> PriceCache {
        let mut cache = PriceCache::empty();
        for i in 0..input_count {
            cache.insert(
                &format!("Input {}", i),
                "Gamma",
                WearTier::MinimalWear,
                10.0 + i as f64,
            );
        }
        if reward_priced {
            cache.insert("Reward", "Gamma", WearTier::MinimalWear, 500.0);
            cache.insert("Reward", "Gamma", WearTier::FieldTested, 100.0);
        }
        cache
    }

    fn make_input(float: f64, price: Option<f64>) -> CandidateItem {
        CandidateItem {
            skin: "Input 0".to_string(),
            case: "Gamma".to_string(),
            rarity: Rarity::Classified,
            next_rarity: Rarity::Covert,
            wear: WearTier::MinimalWear,
            min_float: 0.0,
            max_float: 1.0,
            covered_range: (0.07, 0.15),
            covered_tiers: WearTier::ALL.to_vec(),
            market_id: 100,
            float_value: Some(float),
            price,
        }
    }

    fn make_scorer<'a>(
        view: &'a CatalogView,
        cache: &'a PriceCache,
        items: &'a [CandidateItem],
        require_cardline: bool,
    ) -> Scorer<'a> {
        // One line: Reward cards Minimal Wear at average 0.15.
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
            500.0,
            require_cardline,
        )
    }

    fn all_indices(items: &[CandidateItem]) -> Vec<usize> {
        (0..items.len()).collect()
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("auto".parse::<Strategy>().unwrap(), Strategy::Auto);
        assert_eq!("GA".parse::<Strategy>().unwrap(), Strategy::Genetic);
        assert_eq!("brute".parse::<Strategy>().unwrap(), Strategy::Exhaustive);
        assert_eq!("wear-mix".parse::<Strategy>().unwrap(), Strategy::Mix);
        assert!("simulated-annealing".parse::<Strategy>().is_err());
    }

    #[test]
    fn test_strategy_display_roundtrip() {
        for s in [
            Strategy::Auto,
            Strategy::Exhaustive,
            Strategy::Genetic,
            Strategy::Mix,
        ] {
            assert_eq!(s.to_string().parse::<Strategy>().unwrap(), s);
        }
    }

    #[test]
    fn test_combination_count() {
        assert_eq!(combination_count(10, 10), 1);
        assert_eq!(combination_count(12, 10), 66);
        assert_eq!(combination_count(9, 10), 0);
        assert_eq!(combination_count(0, 0), 1);
        assert_eq!(combination_count(100, 10), 17_310_309_456_440);
    }

    #[test]
    fn test_combination_count_saturates() {
        assert_eq!(combination_count(40_000, 10), u128::MAX);
    }

    #[test]
    fn test_score_cardline_hit() {
        let view = make_view(3);
        let cache = make_cache(3, true);
        let items: Vec<CandidateItem> =
            (0..10).map(|_| make_input(0.15, Some(15.0))).collect();
        let mut scorer = make_scorer(&view, &cache, &items, true);

        match scorer.score(&all_indices(&items)) {
            ScoreOutcome::Scored(candidate) => {
                assert!((candidate.cost - 150.0).abs() < 1e-9);
                // Single output skin: probability 1, carded price 500.
                assert!((candidate.expected_value - 500.0).abs() < 1e-9);
                assert!((candidate.net_profit - 350.0).abs() < 1e-9);
                assert_eq!(candidate.matched_outputs.len(), 1);
                assert_eq!(candidate.matched_outputs[0].tier, WearTier::MinimalWear);
            }
            other => panic!("expected a scored candidate, got {:?}", other),
        }
    }

    #[test]
    fn test_score_off_cardline_discarded() {
        let view = make_view(3);
        let cache = make_cache(3, true);
        let items: Vec<CandidateItem> =
            (0..10).map(|_| make_input(0.20, Some(5.0))).collect();
        let mut scorer = make_scorer(&view, &cache, &items, true);

        assert!(matches!(
            scorer.score(&all_indices(&items)),
            ScoreOutcome::NoCardline
        ));
    }

    #[test]
    fn test_score_missing_input_price_unscoreable() {
        let view = make_view(3);
        let cache = make_cache(3, true);
        let mut items: Vec<CandidateItem> =
            (0..10).map(|_| make_input(0.15, Some(15.0))).collect();
        items[4].price = None;
        let mut scorer = make_scorer(&view, &cache, &items, true);

        assert!(matches!(
            scorer.score(&all_indices(&items)),
            ScoreOutcome::Unscoreable
        ));
    }

    #[test]
    fn test_score_cost_above_ceiling_pruned() {
        let view = make_view(3);
        let cache = make_cache(3, true);
        let items: Vec<CandidateItem> =
            (0..10).map(|_| make_input(0.15, Some(60.0))).collect();
        let mut scorer = make_scorer(&view, &cache, &items, true);

        assert!(matches!(
            scorer.score(&all_indices(&items)),
            ScoreOutcome::Pruned
        ));
    }

    #[test]
    fn test_score_off_cardline_prices_landed_tier() {
        let view = make_view(3);
        let cache = make_cache(3, true);
        let items: Vec<CandidateItem> =
            (0..10).map(|_| make_input(0.20, Some(5.0))).collect();
        let mut scorer = make_scorer(&view, &cache, &items, false);

        match scorer.score(&all_indices(&items)) {
            ScoreOutcome::Scored(candidate) => {
                // 0.20 remaps into Field-Tested, priced 100.
                assert!((candidate.expected_value - 100.0).abs() < 1e-9);
                assert!(candidate.matched_outputs.is_empty());
            }
            other => panic!("expected a scored candidate, got {:?}", other),
        }
    }

    #[test]
    fn test_score_hit_beats_landed_tier_at_boundary() {
        let view = make_view(3);
        let cache = make_cache(3, true);
        // 0.15 lands in Field-Tested by the half-open bands, but the
        // hit cards Minimal Wear and must price there.
        let items: Vec<CandidateItem> =
            (0..10).map(|_| make_input(0.15, Some(15.0))).collect();
        let mut scorer = make_scorer(&view, &cache, &items, false);

        match scorer.score(&all_indices(&items)) {
            ScoreOutcome::Scored(candidate) => {
                assert!((candidate.expected_value - 500.0).abs() < 1e-9);
            }
            other => panic!("expected a scored candidate, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_search_exhaustive_pinned() {
        let view = Arc::new(make_view(12));
        let cache = Arc::new(make_cache(12, true));
        let mut pool = CandidatePool::build(&view);
        pool.attach_prices(&cache);

        let request = SearchRequest {
            strategy: Strategy::Exhaustive,
            tolerance: 0.002,
            pin_to_boundary: true,
            top_n: 3,
            ..SearchRequest::default()
        };
        let outcome = run_search(Arc::clone(&view), Arc::clone(&cache), &pool, &request)
            .await
            .unwrap();

        assert_eq!(outcome.summary.partitions_searched, 1);
        assert_eq!(outcome.summary.combinations_considered, 66);
        assert_eq!(outcome.candidates.len(), 3);
        // Cheapest ten inputs cost 10 + 11 + ... + 19 = 145.
        let best = &outcome.candidates[0];
        assert!((best.cost - 145.0).abs() < 1e-9);
        assert!((best.net_profit - 355.0).abs() < 1e-9);
        assert!(outcome.candidates.windows(2).all(|w| w[0].net_profit >= w[1].net_profit));
    }

    #[tokio::test]
    async fn test_run_search_genetic_finds_viable_combination() {
        let view = Arc::new(make_view(12));
        let cache = Arc::new(make_cache(12, true));
        let mut pool = CandidatePool::build(&view);
        pool.attach_prices(&cache);

        let request = SearchRequest {
            strategy: Strategy::Genetic,
            pin_to_boundary: true,
            genetic: GeneticConfig {
                seed: Some(7),
                ..GeneticConfig::default()
            },
            ..SearchRequest::default()
        };
        let outcome = run_search(Arc::clone(&view), Arc::clone(&cache), &pool, &request)
            .await
            .unwrap();

        assert_eq!(outcome.summary.partitions_searched, 1);
        assert_eq!(outcome.candidates.len(), 1);
        // Worst possible pick costs 165, so any viable result clears 335.
        assert!(outcome.candidates[0].net_profit >= 335.0 - 1e-9);
    }

    #[tokio::test]
    async fn test_run_search_small_partition_skipped() {
        let view = Arc::new(make_view(9));
        let cache = Arc::new(make_cache(9, true));
        let mut pool = CandidatePool::build(&view);
        pool.attach_prices(&cache);

        let request = SearchRequest {
            strategy: Strategy::Exhaustive,
            pin_to_boundary: true,
            ..SearchRequest::default()
        };
        let outcome = run_search(Arc::clone(&view), Arc::clone(&cache), &pool, &request)
            .await
            .unwrap();

        assert!(outcome.candidates.is_empty());
        assert_eq!(outcome.summary.partitions_skipped, 1);
    }

    #[tokio::test]
    async fn test_run_search_unpriced_outputs_skipped() {
        let view = Arc::new(make_view(12));
        let cache = Arc::new(make_cache(12, false));
        let mut pool = CandidatePool::build(&view);
        pool.attach_prices(&cache);

        let request = SearchRequest {
            strategy: Strategy::Exhaustive,
            pin_to_boundary: true,
            ..SearchRequest::default()
        };
        let outcome = run_search(Arc::clone(&view), Arc::clone(&cache), &pool, &request)
            .await
            .unwrap();

        assert!(outcome.candidates.is_empty());
        assert_eq!(outcome.summary.partitions_skipped, 1);
    }
}
