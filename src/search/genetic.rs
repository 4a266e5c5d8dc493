//! Genetic search for partitions too large to enumerate.
//!
//! A population of index genomes evolves under elitism, single-cut
//! crossover, and slot mutation. The cardline constraint is enforced
//! through fitness: a combination whose average float misses the
//! partition's target line gets a large negative sentinel and never
//! survives selection. This is a heuristic; it can miss the global
//! optimum, and reproducing a run requires fixing the seed.

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing::{debug, info};

use super::{ScoreOutcome, Scorer};
use crate::floats::{average_float, CardlineLine};
use crate::market::PriceCache;
use crate::types::{CandidateItem, ScoredCandidate, WearTier, COMBO_SIZE};

/// Fitness for combinations that miss the target line or cannot be
/// scored. A final best at this value means no viable combination was
/// ever produced.
pub const FITNESS_SENTINEL: f64 = -9999.0;

/// Engine tunables. Deserializes from the `[genetic]` config section;
/// missing fields take the defaults below.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneticConfig {
    pub population: usize,   // genomes per generation
    pub generations: usize,  // fixed, no early stopping
    pub mutation_rate: f64,  // chance a child mutates one slot
    pub elite_count: usize,  // genomes kept unchanged each generation
    /// Gate width around the target cardline.
    pub tolerance: f64,
    /// Fixed RNG seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            population: 300,
            generations: 40,
            mutation_rate: 0.2,
            elite_count: 10,
            tolerance: 0.002,
            seed: None,
        }
    }
}

/// The single cardline the engine steers toward.
#[derive(Debug, Clone)]
pub(crate) struct GaTarget {
    pub skin: String,
    pub case: String,
    /// Average float that cards the target tier for this skin.
    pub average: f64,
    /// The skin's price at the carded tier.
    pub price: f64,
}

/// First line, in discovery order, whose skin has a price at the
/// carded tier. `None` means the partition has nothing to steer
/// toward and should be skipped.
pub(crate) fn pick_target(lines: &[CardlineLine], cache: &PriceCache) -> Option<GaTarget> {
    lines.iter().find_map(|line| {
        cache
            .price(&line.skin, &line.case, line.tier)
            .map(|price| GaTarget {
                skin: line.skin.clone(),
                case: line.case.clone(),
                average: line.target,
                price,
            })
    })
}

#[derive(Debug)]
pub(crate) struct GeneticOutcome {
    /// Best-ever viable combination; `None` when every evaluation hit
    /// the sentinel.
    pub best: Option<ScoredCandidate>,
    pub best_fitness: f64,
    pub evaluations: u64,
    pub hits: u64,
}

/// Evolve one partition toward its target cardline.
pub(crate) fn evolve(
    scorer: &mut Scorer<'_>,
    config: &GeneticConfig,
    target: &GaTarget,
) -> GeneticOutcome {
    let items = scorer.items();
    let pool_size = items.len();
    let elite_count = config.elite_count.max(2).min(config.population);
    let mutation_rate = config.mutation_rate.clamp(0.0, 1.0);
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    info!(
        target_skin = %target.skin,
        target_case = %target.case,
        target_average = target.average,
        target_price = target.price,
        population = config.population,
        generations = config.generations,
        "Genetic search starting"
    );

    let mut population: Vec<Vec<usize>> = (0..config.population)
        .map(|_| index::sample(&mut rng, pool_size, COMBO_SIZE).into_vec())
        .collect();

    let mut best_fitness = f64::NEG_INFINITY;
    let mut best_candidate: Option<ScoredCandidate> = None;
    let mut evaluations = 0u64;
    let mut hits = 0u64;

    for generation in 0..config.generations {
        let mut scored: Vec<(f64, Vec<usize>, Option<ScoredCandidate>)> = population
            .into_iter()
            .map(|genome| {
                let (fitness, candidate) =
                    evaluate(scorer, items, &genome, target.average, config.tolerance);
                evaluations += 1;
                if candidate.is_some() {
                    hits += 1;
                }
                (fitness, genome, candidate)
            })
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        // Best-so-far only moves up; ties keep the earlier discovery.
        if scored[0].0 > best_fitness {
            best_fitness = scored[0].0;
            best_candidate = scored[0].2.clone();
        }
        debug!(
            generation,
            generation_best = scored[0].0,
            best = best_fitness,
            "Generation complete"
        );

        let elites: Vec<Vec<usize>> = scored
            .iter()
            .take(elite_count)
            .map(|(_, genome, _)| genome.clone())
            .collect();
        let mut next = elites.clone();
        while next.len() < config.population {
            let parents = index::sample(&mut rng, elites.len(), 2);
            let mut child = crossover(
                &mut rng,
                &elites[parents.index(0)],
                &elites[parents.index(1)],
                items,
            );
            mutate(&mut rng, &mut child, pool_size, mutation_rate);
            next.push(child);
        }
        population = next;
    }

    GeneticOutcome {
        best: best_candidate,
        best_fitness,
        evaluations,
        hits,
    }
}

/// Hard cardline gate, then the shared scorer. Anything unscoreable
/// collapses to the sentinel.
fn evaluate(
    scorer: &mut Scorer<'_>,
    items: &[CandidateItem],
    genome: &[usize],
    target_average: f64,
    tolerance: f64,
) -> (f64, Option<ScoredCandidate>) {
    let average = match average_float(genome.iter().map(|&i| &items[i])) {
        Some(a) => a,
        None => return (FITNESS_SENTINEL, None),
    };
    if (average - target_average).abs() > tolerance {
        return (FITNESS_SENTINEL, None);
    }
    match scorer.score(genome) {
        ScoreOutcome::Scored(candidate) => {
            let fitness = candidate.net_profit;
            (fitness, Some(candidate))
        }
        _ => (FITNESS_SENTINEL, None),
    }
}

/// Single cut point, then dedup by (skin, wear) keeping first
/// occurrences, padded back to size from the first parent.
fn crossover(
    rng: &mut StdRng,
    a: &[usize],
    b: &[usize],
    items: &[CandidateItem],
) -> Vec<usize> {
    let cut = rng.gen_range(1..COMBO_SIZE - 1);
    let mut child: Vec<usize> = Vec::with_capacity(COMBO_SIZE);
    let mut seen: Vec<(&str, WearTier)> = Vec::with_capacity(COMBO_SIZE);
    for &idx in a[..cut].iter().chain(b[cut..].iter()) {
        let key = (items[idx].skin.as_str(), items[idx].wear);
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        child.push(idx);
        if child.len() == COMBO_SIZE {
            break;
        }
    }
    while child.len() < COMBO_SIZE {
        child.push(a[rng.gen_range(0..COMBO_SIZE)]);
    }
    child
}

/// Replace one random slot with a random pool item, at the configured
/// rate.
fn mutate(rng: &mut StdRng, genome: &mut [usize], pool_size: usize, rate: f64) {
    if rng.gen_bool(rate) {
        let slot = rng.gen_range(0..genome.len());
        genome[slot] = rng.gen_range(0..pool_size);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
