//! Wear-mix search: one skin, all ten slots, varied wear tiers.
//!
//! Instead of picking ten different skins, this engine fills the
//! combination with repeated copies of a single skin and asks which
//! split across its priced wear tiers maximizes expected profit. A
//! skin with g priced tiers has C(10+g-1, g-1) splits, at most 1001,
//! so full enumeration per skin is always cheap.

use tracing::debug;

use super::{ScoreOutcome, Scorer};
use crate::types::{ScoredCandidate, COMBO_SIZE};

#[derive(Debug)]
pub(crate) struct MixOutcome {
    /// Best split per skin, in pool order.
    pub candidates: Vec<ScoredCandidate>,
    pub evaluated: u64,
    pub hits: u64,
    pub skins: usize,
}

/// Enumerate wear splits for every skin in the partition and keep the
/// most profitable split of each.
pub(crate) fn search(scorer: &mut Scorer<'_>) -> MixOutcome {
    let items = scorer.items();

    // One group per (skin, case), members being that skin's wear
    // variants, in first-appearance order.
    let mut groups: Vec<((&str, &str), Vec<usize>)> = Vec::new();
    for (idx, item) in items.iter().enumerate() {
        let key = (item.skin.as_str(), item.case.as_str());
        match groups.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, members)) => members.push(idx),
            None => groups.push((key, vec![idx])),
        }
    }

    let mut candidates = Vec::new();
    let mut evaluated = 0u64;
    let mut hits = 0u64;

    for ((skin, _), members) in &groups {
        let mut best: Option<ScoredCandidate> = None;
        let mut genome: Vec<usize> = Vec::with_capacity(COMBO_SIZE);
        for_each_split(COMBO_SIZE, members.len(), &mut |counts| {
            genome.clear();
            for (&member, &count) in members.iter().zip(counts) {
                genome.extend(std::iter::repeat(member).take(count));
            }
            evaluated += 1;
            if let ScoreOutcome::Scored(candidate) = scorer.score(&genome) {
                if !candidate.matched_outputs.is_empty() {
                    hits += 1;
                }
                let improved = best
                    .as_ref()
                    .map(|current| candidate.net_profit > current.net_profit)
                    .unwrap_or(true);
                if improved {
                    best = Some(candidate);
                }
            }
        });
        if let Some(candidate) = best {
            debug!(
                skin = %skin,
                net_profit = candidate.net_profit,
                average_float = candidate.average_float,
                "Best wear split"
            );
            candidates.push(candidate);
        }
    }

    MixOutcome {
        candidates,
        evaluated,
        hits,
        skins: groups.len(),
    }
}

/// Visit every way of splitting `total` slots across `bins` counts.
/// Counts may be zero; each visit sees a slice summing to `total`.
fn for_each_split<F>(total: usize, bins: usize, visit: &mut F)
where
    F: FnMut(&[usize]),
{
    fn walk<F>(counts: &mut Vec<usize>, remaining: usize, bins_left: usize, visit: &mut F)
    where
        F: FnMut(&[usize]),
    {
        if bins_left == 1 {
            counts.push(remaining);
            visit(counts);
            counts.pop();
            return;
        }
        for take in 0..=remaining {
            counts.push(take);
            walk(counts, remaining - take, bins_left - 1, visit);
            counts.pop();
        }
    }

    if bins == 0 {
        return;
    }
    let mut counts = Vec::with_capacity(bins);
    walk(&mut counts, total, bins, visit);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
