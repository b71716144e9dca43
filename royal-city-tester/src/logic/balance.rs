//! Acceptance gates over an autorun batch.

use anyhow::{Result, bail};
use serde::Serialize;

use super::autorun::AutorunSummary;

pub const MAX_CENSUS: f64 = 3_000_000.0;
pub const ENDGAME_MEDIAN_RANGE: (f64, f64) = (120_000.0, 280_000.0);
pub const MIN_SERVICES_BLOCK_MEAN: f64 = 0.5;

/// Outcome of one balance gate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateResult {
    pub name: &'static str,
    pub observed: f64,
    pub expected: String,
    pub passed: bool,
}

/// Evaluate every gate against `summary`.
#[must_use]
pub fn evaluate_gates(summary: &AutorunSummary) -> Vec<GateResult> {
    let max_census = summary.census.max;
    let endgame_median = summary
        .endgame_bonus
        .map_or(summary.endgame_bonus_applied.median, |dist| dist.median);
    let services_mean = summary.blocked_by_services.mean;
    let (low, high) = ENDGAME_MEDIAN_RANGE;

    vec![
        GateResult {
            name: "max census",
            observed: max_census,
            expected: format!("<= {MAX_CENSUS}"),
            passed: max_census <= MAX_CENSUS,
        },
        GateResult {
            name: "endgame bonus median",
            observed: endgame_median,
            expected: format!("{low}..={high}"),
            passed: (low..=high).contains(&endgame_median),
        },
        GateResult {
            name: "blocked by services mean",
            observed: services_mean,
            expected: format!(">= {MIN_SERVICES_BLOCK_MEAN}"),
            passed: services_mean >= MIN_SERVICES_BLOCK_MEAN,
        },
    ]
}

/// Fail when any gate did not pass.
///
/// # Errors
///
/// Returns an error naming the first failed gate.
pub fn validate_balance_gates(gates: &[GateResult]) -> Result<()> {
    if let Some(gate) = gates.iter().find(|gate| !gate.passed) {
        bail!(
            "Balance check failed: {} was {} (expected {})",
            gate.name,
            gate.observed,
            gate.expected
        );
    }
    Ok(())
}
