//! Shared types for the CARDLINE scanner.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that catalog, market, and
//! search modules can depend on them without circular references.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of input items consumed by one trade-up contract.
pub const COMBO_SIZE: usize = 10;

// ---------------------------------------------------------------------------
// Wear tiers
// ---------------------------------------------------------------------------

/// One of the five fixed wear bands over the float range `[0, 1)`.
///
/// The bands are half-open: a float of exactly 0.15 is Field-Tested,
/// not Minimal Wear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WearTier {
    #[serde(rename = "Factory New")]
    FactoryNew,
    #[serde(rename = "Minimal Wear")]
    MinimalWear,
    #[serde(rename = "Field-Tested")]
    FieldTested,
    #[serde(rename = "Well-Worn")]
    WellWorn,
    #[serde(rename = "Battle-Scarred")]
    BattleScarred,
}

impl WearTier {
    /// All tiers in ascending float order (useful for iteration).
    pub const ALL: &'static [WearTier] = &[
        WearTier::FactoryNew,
        WearTier::MinimalWear,
        WearTier::FieldTested,
        WearTier::WellWorn,
        WearTier::BattleScarred,
    ];

    /// The tier's float band `[lower, upper)`.
    pub fn band(&self) -> (f64, f64) {
        match self {
            WearTier::FactoryNew => (0.00, 0.07),
            WearTier::MinimalWear => (0.07, 0.15),
            WearTier::FieldTested => (0.15, 0.38),
            WearTier::WellWorn => (0.38, 0.45),
            WearTier::BattleScarred => (0.45, 1.00),
        }
    }

    /// Lower bound of the band (inclusive).
    pub fn lower(&self) -> f64 {
        self.band().0
    }

    /// Upper bound of the band (exclusive). This is the "cardline" value:
    /// an output float landing here is the best possible roll of the
    /// following tier, or equivalently the boundary of this one.
    pub fn upper(&self) -> f64 {
        self.band().1
    }

    /// Midpoint of the band, used as a representative float when no
    /// exact value is being targeted.
    pub fn midpoint(&self) -> f64 {
        let (lo, hi) = self.band();
        (lo + hi) / 2.0
    }

    /// Lowercase, underscore-separated form for file names.
    pub fn slug(&self) -> &'static str {
        match self {
            WearTier::FactoryNew => "factory_new",
            WearTier::MinimalWear => "minimal_wear",
            WearTier::FieldTested => "field_tested",
            WearTier::WellWorn => "well_worn",
            WearTier::BattleScarred => "battle_scarred",
        }
    }
}

impl fmt::Display for WearTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WearTier::FactoryNew => write!(f, "Factory New"),
            WearTier::MinimalWear => write!(f, "Minimal Wear"),
            WearTier::FieldTested => write!(f, "Field-Tested"),
            WearTier::WellWorn => write!(f, "Well-Worn"),
            WearTier::BattleScarred => write!(f, "Battle-Scarred"),
        }
    }
}

/// Attempt to parse a string into a WearTier.
///
/// Accepts the English tier names (case-insensitive, with or without
/// hyphens), the usual two-letter abbreviations, and the Chinese labels
/// used by the upstream dataset.
impl std::str::FromStr for WearTier {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', " ").as_str() {
            "factory new" | "fn" | "崭新出厂" => Ok(WearTier::FactoryNew),
            "minimal wear" | "mw" | "略有磨损" => Ok(WearTier::MinimalWear),
            "field tested" | "ft" | "久经沙场" => Ok(WearTier::FieldTested),
            "well worn" | "ww" | "破损不堪" => Ok(WearTier::WellWorn),
            "battle scarred" | "bs" | "战痕累累" => Ok(WearTier::BattleScarred),
            _ => Err(anyhow::anyhow!("Unknown wear tier: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Rarity
// ---------------------------------------------------------------------------

/// Rarity grade of a skin, in ascending order.
///
/// Trade-ups consume ten items of one rarity and produce one item of the
/// next. `Covert` has no next rarity and therefore never appears on the
/// input side of a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rarity {
    Consumer,
    Industrial,
    #[serde(rename = "Mil-Spec")]
    MilSpec,
    Restricted,
    Classified,
    Covert,
}

impl Rarity {
    /// All rarities in ascending order (useful for iteration).
    pub const ALL: &'static [Rarity] = &[
        Rarity::Consumer,
        Rarity::Industrial,
        Rarity::MilSpec,
        Rarity::Restricted,
        Rarity::Classified,
        Rarity::Covert,
    ];

    /// The rarity one grade above this one, or `None` at the top.
    pub fn next(&self) -> Option<Rarity> {
        match self {
            Rarity::Consumer => Some(Rarity::Industrial),
            Rarity::Industrial => Some(Rarity::MilSpec),
            Rarity::MilSpec => Some(Rarity::Restricted),
            Rarity::Restricted => Some(Rarity::Classified),
            Rarity::Classified => Some(Rarity::Covert),
            Rarity::Covert => None,
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rarity::Consumer => write!(f, "Consumer"),
            Rarity::Industrial => write!(f, "Industrial"),
            Rarity::MilSpec => write!(f, "Mil-Spec"),
            Rarity::Restricted => write!(f, "Restricted"),
            Rarity::Classified => write!(f, "Classified"),
            Rarity::Covert => write!(f, "Covert"),
        }
    }
}

/// Attempt to parse a string into a Rarity.
///
/// Accepts English grade names (case-insensitive) and the Chinese labels
/// used by the upstream dataset.
impl std::str::FromStr for Rarity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', " ").as_str() {
            "consumer" | "consumer grade" | "消费级" => Ok(Rarity::Consumer),
            "industrial" | "industrial grade" | "工业级" => Ok(Rarity::Industrial),
            "mil spec" | "milspec" | "mil spec grade" | "军规级" => Ok(Rarity::MilSpec),
            "restricted" | "受限" => Ok(Rarity::Restricted),
            "classified" | "保密" => Ok(Rarity::Classified),
            "covert" | "隐秘" => Ok(Rarity::Covert),
            _ => Err(anyhow::anyhow!("Unknown rarity: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Candidate items & combinations
// ---------------------------------------------------------------------------

/// A (skin, wear) pair usable as trade-up input.
///
/// Built once from the catalog and priced once from the price cache;
/// immutable during a search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateItem {
    pub skin: String,
    /// Case the skin belongs to (outputs are drawn from the same case).
    pub case: String,
    pub rarity: Rarity,
    /// Rarity this item produces when consumed. Always `rarity.next()`;
    /// items at the top rarity are excluded at pool construction.
    pub next_rarity: Rarity,
    pub wear: WearTier,
    /// Float range of the whole skin across all wears.
    pub min_float: f64,
    pub max_float: f64,
    /// Sub-range of `wear`'s band this skin can actually express.
    pub covered_range: (f64, f64),
    /// Wear tiers the skin covers at all (shared across the skin's items).
    pub covered_tiers: Vec<WearTier>,
    /// Market identifier for price lookup of this exact (skin, wear).
    pub market_id: u64,
    /// Representative float used when averaging. Midpoint of the covered
    /// sub-range by default, or an exact pinned value in cardline mode.
    pub float_value: Option<f64>,
    /// Lowest market price, attached after the price cache is built.
    /// `None` means unknown, never zero.
    pub price: Option<f64>,
}

impl fmt::Display for CandidateItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) [{}]", self.skin, self.wear, self.case)
    }
}

/// An ordered set of exactly [`COMBO_SIZE`] candidate items sharing one
/// next rarity. Items may repeat; each occupies one input slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Combination {
    pub items: Vec<CandidateItem>,
}

impl Combination {
    pub fn new(items: Vec<CandidateItem>) -> Self {
        debug_assert_eq!(items.len(), COMBO_SIZE);
        Combination { items }
    }

    /// Total acquisition cost, or `None` if any item is unpriced.
    pub fn total_cost(&self) -> Option<f64> {
        self.items.iter().map(|it| it.price).sum()
    }
}

// ---------------------------------------------------------------------------
// Outputs & scoring
// ---------------------------------------------------------------------------

/// A skin reachable as the result of consuming a combination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputCandidate {
    pub skin: String,
    pub case: String,
    pub rarity: Rarity,
    /// Occurrence probability under the case-share model. Zero when the
    /// candidate describes the partition-wide output universe rather than
    /// a specific combination's draw.
    pub probability: f64,
    pub min_float: f64,
    pub max_float: f64,
}

impl fmt::Display for OutputCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {} ({:.1}%)",
            self.skin,
            self.case,
            self.rarity,
            self.probability * 100.0,
        )
    }
}

/// A cardline hit: an output skin whose tier boundary the combination's
/// average float lands on (within tolerance).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardlineHit {
    pub skin: String,
    pub case: String,
    pub tier: WearTier,
    /// The exact average-float value that cards this output's tier.
    pub target: f64,
}

impl fmt::Display for CardlineHit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {} @ {:.5}", self.skin, self.case, self.tier, self.target)
    }
}

/// A fully scored combination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub combination: Combination,
    pub average_float: f64,
    /// Sum of the ten input prices.
    pub cost: f64,
    /// Probability-weighted value across reachable priced outputs.
    pub expected_value: f64,
    /// `expected_value - cost`.
    pub net_profit: f64,
    /// Every output whose cardline the average float hit. Empty only for
    /// non-cardline search modes.
    pub matched_outputs: Vec<CardlineHit>,
}

impl fmt::Display for ScoredCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "avg {:.5} | cost ¥{:.2} | ev ¥{:.2} | net ¥{:+.2} | {} hit(s)",
            self.average_float,
            self.cost,
            self.expected_value,
            self.net_profit,
            self.matched_outputs.len(),
        )
    }
}

// ---------------------------------------------------------------------------
// Run summary
// ---------------------------------------------------------------------------

/// Aggregate counters for one full scan, across all rarity partitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchSummary {
    pub partitions_total: usize,
    pub partitions_searched: usize,
    pub partitions_skipped: usize,
    /// Estimated or exact number of combinations considered.
    pub combinations_considered: u128,
    /// Combinations discarded by the cost bound before scoring.
    pub pruned: u128,
    /// Combinations that hit at least one cardline.
    pub hits: u64,
    pub candidates_ranked: usize,
}

impl SearchSummary {
    /// Fold a partition's counters into the run totals.
    pub fn absorb(&mut self, other: &SearchSummary) {
        self.partitions_total += other.partitions_total;
        self.partitions_searched += other.partitions_searched;
        self.partitions_skipped += other.partitions_skipped;
        self.combinations_considered += other.combinations_considered;
        self.pruned += other.pruned;
        self.hits += other.hits;
        self.candidates_ranked += other.candidates_ranked;
    }
}

impl fmt::Display for SearchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "partitions {}/{} searched ({} skipped) | {} combos considered | {} pruned | {} hits | {} ranked",
            self.partitions_searched,
            self.partitions_total,
            self.partitions_skipped,
            self.combinations_considered,
            self.pruned,
            self.hits,
            self.candidates_ranked,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for CARDLINE.
#[derive(Debug, thiserror::Error)]
pub enum CardlineError {
    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Price source error ({source_name}): {message}")]
    PriceSource { source_name: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Search error: {0}")]
    Search(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
