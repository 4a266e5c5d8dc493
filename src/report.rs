//! Result ranking and persistence.
//!
//! Ranks scored candidates by net profit, wraps the top of the list in
//! a run-stamped report, and saves it as a JSON file. An empty report
//! is a normal outcome ("ran fine, found nothing"), never an error.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::types::{CardlineHit, ScoredCandidate, SearchSummary, WearTier};

/// Sort descending by net profit and keep the first `top_n`. The sort
/// is stable, so candidates with equal profit stay in discovery order.
pub fn rank(mut candidates: Vec<ScoredCandidate>, top_n: usize) -> Vec<ScoredCandidate> {
    candidates.sort_by(|a, b| {
        b.net_profit
            .partial_cmp(&a.net_profit)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates.truncate(top_n);
    candidates
}

// ---------------------------------------------------------------------------
// Report model
// ---------------------------------------------------------------------------

/// One input slot of a persisted combination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportItem {
    pub skin: String,
    pub wear: WearTier,
    pub price: Option<f64>,
}

/// One ranked combination in persisted form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    pub items: Vec<ReportItem>,
    pub average_float: f64,
    pub cost: f64,
    pub expected_value: f64,
    pub net_profit: f64,
    pub matched_outputs: Vec<CardlineHit>,
}

impl From<&ScoredCandidate> for ReportEntry {
    fn from(candidate: &ScoredCandidate) -> Self {
        ReportEntry {
            items: candidate
                .combination
                .items
                .iter()
                .map(|item| ReportItem {
                    skin: item.skin.clone(),
                    wear: item.wear,
                    price: item.price,
                })
                .collect(),
            average_float: candidate.average_float,
            cost: candidate.cost,
            expected_value: candidate.expected_value,
            net_profit: candidate.net_profit,
            matched_outputs: candidate.matched_outputs.clone(),
        }
    }
}

/// A full run's ranked output plus the metadata needed to reproduce it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchReport {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub target_tier: WearTier,
    pub tolerance: f64,
    pub strategy: String,
    pub summary: SearchSummary,
    pub entries: Vec<ReportEntry>,
}

impl SearchReport {
    pub fn new(
        target_tier: WearTier,
        tolerance: f64,
        strategy: &str,
        summary: SearchSummary,
        candidates: &[ScoredCandidate],
    ) -> Self {
        SearchReport {
            run_id: uuid::Uuid::new_v4().to_string(),
            generated_at: Utc::now(),
            target_tier,
            tolerance,
            strategy: strategy.to_string(),
            summary,
            entries: candidates.iter().map(ReportEntry::from).collect(),
        }
    }

    /// File name the report saves under, derived from the target tier.
    pub fn file_name(&self) -> String {
        format!("cardline_{}.json", self.target_tier.slug())
    }
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// Save a report under `output_dir`, creating the directory if needed.
pub fn save_report(report: &SearchReport, output_dir: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .context(format!("Failed to create report directory {output_dir}"))?;

    let path = Path::new(output_dir).join(report.file_name());
    let json =
        serde_json::to_string_pretty(report).context("Failed to serialise search report")?;
    std::fs::write(&path, &json)
        .context(format!("Failed to write report to {}", path.display()))?;

    debug!(path = %path.display(), entries = report.entries.len(), "Report saved");
    Ok(path)
}

/// Load a previously saved report.
/// Returns None if the file doesn't exist.
pub fn load_report(path: &str) -> Result<Option<SearchReport>> {
    if !Path::new(path).exists() {
        info!(path, "No saved report found");
        return Ok(None);
    }

    let json =
        std::fs::read_to_string(path).context(format!("Failed to read report from {path}"))?;
    let report: SearchReport =
        serde_json::from_str(&json).context(format!("Failed to parse report from {path}"))?;

    info!(path, entries = report.entries.len(), "Report loaded from disk");
    Ok(Some(report))
}

// ---------------------------------------------------------------------------
// Console output
// ---------------------------------------------------------------------------

/// Log the ranked results.
pub fn print_report(report: &SearchReport) {
    if report.entries.is_empty() {
        info!(
            target = %report.target_tier,
            strategy = %report.strategy,
            "No qualifying combination found"
        );
        return;
    }

    info!(
        target = %report.target_tier,
        strategy = %report.strategy,
        entries = report.entries.len(),
        "Top combinations"
    );
    for (position, entry) in report.entries.iter().enumerate() {
        let outputs = entry
            .matched_outputs
            .iter()
            .map(|hit| format!("{} ({})", hit.skin, hit.tier))
            .collect::<Vec<_>>()
            .join(", ");
        info!(
            rank = position + 1,
            average_float = entry.average_float,
            cost = entry.cost,
            expected_value = entry.expected_value,
            net_profit = entry.net_profit,
            inputs = %summarize_items(&entry.items),
            outputs = %outputs,
            "Candidate"
        );
    }
}

/// Collapse repeated (skin, wear) slots into "name (wear) xN" groups,
/// first-appearance order.
fn summarize_items(items: &[ReportItem]) -> String {
    let mut counts: Vec<((&str, WearTier), usize)> = Vec::new();
    for item in items {
        let key = (item.skin.as_str(), item.wear);
        match counts.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, n)) => *n += 1,
            None => counts.push((key, 1)),
        }
    }
    counts
        .iter()
        .map(|((skin, wear), n)| format!("{skin} ({wear}) x{n}"))
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
