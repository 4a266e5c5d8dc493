//! Output resolution for trade-up combinations.
//!
//! A contract's output is drawn from the same-rarity bucket of the
//! cases its inputs came from. The probability model here is the usual
//! community approximation, not a published drop table: each case's
//! weight is the share of the ten inputs it contributed, and within a
//! case every same-rarity skin is equally likely. Treat the numbers as
//! a modeling assumption, not ground truth.

use crate::catalog::CatalogView;
use crate::types::{CandidateItem, OutputCandidate, Rarity, COMBO_SIZE};

pub struct OutputResolver<'a> {
    view: &'a CatalogView,
}

impl<'a> OutputResolver<'a> {
    pub fn new(view: &'a CatalogView) -> Self {
        Self { view }
    }

    /// Possible outputs of one specific combination, with occurrence
    /// probabilities.
    ///
    /// Callers guarantee all items share `next_rarity`; mixed inputs
    /// cannot jointly define an output bucket. A case with no
    /// identifiable same-rarity skins contributes nothing.
    pub fn resolve<'b, I>(&self, items: I, next_rarity: Rarity) -> Vec<OutputCandidate>
    where
        I: IntoIterator<Item = &'b CandidateItem>,
    {
        let mut outputs = Vec::new();
        for (case, count) in case_counts(items) {
            let bucket = self.view.same_rarity_in_case(&case, next_rarity);
            if bucket.is_empty() {
                continue;
            }
            let share = count as f64 / COMBO_SIZE as f64;
            let each = share / bucket.len() as f64;
            for skin in bucket {
                outputs.push(OutputCandidate {
                    skin: skin.name.clone(),
                    case: case.clone(),
                    rarity: next_rarity,
                    probability: each,
                    min_float: skin.min_float,
                    max_float: skin.max_float,
                });
            }
        }
        outputs
    }

    /// Every output skin reachable from any subset of these items: the
    /// partition-wide universe, used for cardline targets, pruning
    /// bounds, and the priceability pre-check. Probabilities are left
    /// at zero; they only mean something for a concrete combination.
    pub fn output_universe<'b, I>(&self, items: I, next_rarity: Rarity) -> Vec<OutputCandidate>
    where
        I: IntoIterator<Item = &'b CandidateItem>,
    {
        let mut outputs = Vec::new();
        for (case, _) in case_counts(items) {
            for skin in self.view.same_rarity_in_case(&case, next_rarity) {
                outputs.push(OutputCandidate {
                    skin: skin.name.clone(),
                    case: case.clone(),
                    rarity: next_rarity,
                    probability: 0.0,
                    min_float: skin.min_float,
                    max_float: skin.max_float,
                });
            }
        }
        outputs
    }
}

/// Items per case, in first-appearance order for deterministic output.
fn case_counts<'a, I>(items: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a CandidateItem>,
{
    let mut counts: Vec<(String, usize)> = Vec::new();
    for item in items {
        match counts.iter_mut().find(|(case, _)| case == &item.case) {
            Some((_, count)) => *count += 1,
            None => counts.push((item.case.clone(), 1)),
        }
    }
    counts
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
