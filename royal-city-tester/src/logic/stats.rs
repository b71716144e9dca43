//! Distribution summaries for batch runs.

use serde::Serialize;

/// Spread of one metric across runs. Percentiles interpolate linearly
/// between the neighbouring order statistics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Distribution {
    pub mean: f64,
    pub median: f64,
    pub p10: f64,
    pub p25: f64,
    pub p75: f64,
    pub p90: f64,
    pub min: f64,
    pub max: f64,
}

impl Distribution {
    /// Summarize `values`; an empty slice yields all zeros.
    #[must_use]
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        #[allow(clippy::cast_precision_loss)]
        let mean = sorted.iter().sum::<f64>() / sorted.len() as f64;
        Self {
            mean: round2(mean),
            median: percentile(&sorted, 50.0),
            p10: percentile(&sorted, 10.0),
            p25: percentile(&sorted, 25.0),
            p75: percentile(&sorted, 75.0),
            p90: percentile(&sorted, 90.0),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
        }
    }
}

/// `pct` percentile of an ascending slice.
#[must_use]
pub fn percentile(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let pos = (sorted.len() - 1) as f64 * pct / 100.0;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let lower = pos.floor() as usize;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let upper = pos.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let weight = pos - pos.floor();
    round2(sorted[lower] * (1.0 - weight) + sorted[upper] * weight)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
