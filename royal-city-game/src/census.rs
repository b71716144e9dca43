//! Census estimate derived from population units.

use serde::{Deserialize, Serialize};

use crate::balance::Balance;
use crate::numbers::{floor_f64_to_i64, i64_to_f64, round_f64_to_i64};
use crate::rng::{Mulberry32, census_stream_seed};

/// Modifiers applied on top of the raw unit count.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CensusOptions {
    pub blight: u32,
    /// Non-positive or missing values mean `1.0`.
    pub census_multiplier: Option<f64>,
}

impl CensusOptions {
    #[must_use]
    pub const fn with_blight(blight: u32) -> Self {
        Self {
            blight,
            census_multiplier: None,
        }
    }

    #[must_use]
    pub fn multiplier(&self) -> f64 {
        self.census_multiplier
            .filter(|value| value.is_finite() && *value > 0.0)
            .unwrap_or(1.0)
    }
}

/// Each term of the estimate, kept for telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CensusBreakdown {
    pub adjusted_units: i64,
    pub linear: f64,
    pub epic: f64,
    pub jitter: i64,
    pub multiplier: f64,
    pub pre_blight: f64,
    pub blight_penalty: f64,
    pub total: i64,
}

/// Census for `population_units` with the locked balance.
#[must_use]
pub fn census_estimate(seed: u32, round: u32, population_units: i64, options: CensusOptions) -> i64 {
    census_breakdown(Balance::default_ref(), seed, round, population_units, options).total
}

/// Census for `population_units` under a specific balance.
#[must_use]
pub fn census_estimate_with(
    balance: &Balance,
    seed: u32,
    round: u32,
    population_units: i64,
    options: CensusOptions,
) -> i64 {
    census_breakdown(balance, seed, round, population_units, options).total
}

/// Full estimate: a linear body, a super-linear bonus past the epic threshold
/// and a small seeded jitter, all dragged down by blight.
///
/// Units past the diminishing threshold count at the diminishing rate.
#[must_use]
pub fn census_breakdown(
    balance: &Balance,
    seed: u32,
    round: u32,
    population_units: i64,
    options: CensusOptions,
) -> CensusBreakdown {
    let tuning = &balance.census;
    let adjusted_units = if population_units <= tuning.diminishing_threshold {
        population_units
    } else {
        tuning.diminishing_threshold
            + floor_f64_to_i64(
                i64_to_f64(population_units - tuning.diminishing_threshold)
                    * tuning.diminishing_rate,
            )
    };
    let linear = tuning.base + i64_to_f64(adjusted_units) * tuning.unit_to_people;
    let past_epic = i64_to_f64((adjusted_units - tuning.epic_threshold).max(0));
    let epic = tuning.unit_to_people * past_epic.powf(tuning.epic_exponent) * tuning.epic_strength;

    let mut rng = Mulberry32::new(census_stream_seed(seed, round));
    let jitter_factor = tuning.jitter_min + rng.next_f64() * (tuning.jitter_max - tuning.jitter_min);
    let jitter = floor_f64_to_i64(linear * jitter_factor);

    let multiplier = options.multiplier();
    let blight_penalty = balance.blight.penalty_for(options.blight);
    let pre_blight = (linear + epic + i64_to_f64(jitter)) * multiplier;
    let total = round_f64_to_i64(pre_blight * (1.0 - blight_penalty)).max(0);

    CensusBreakdown {
        adjusted_units,
        linear,
        epic,
        jitter,
        multiplier,
        pre_blight,
        blight_penalty,
        total,
    }
}
