//! Finale payoff: prestige blend, boom roll and the clamped census bonus.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::balance::Balance;
use crate::numbers::{clamp01, i64_to_f64, round_f64_to_i64, usize_to_f64, usize_to_i64};
use crate::report::Report;
use crate::rng::Mulberry32;
use crate::state::CampaignState;

const POPULATION_SPAN: (f64, f64) = (0.0, 80.0);
const ADJACENCY_SPAN: (f64, f64) = (8.0, 26.0);
const POLICY_SPAN: (f64, f64) = (0.0, 2.0);
const BLIGHT_SPAN: (f64, f64) = (0.0, 3.0);
const OPTIONAL_ROUND_WEIGHT: f64 = 1.5;

const BOOM_CHANCE_BASE: f64 = 0.005;
const BOOM_TIERS: [(i64, f64); 3] = [(95, 0.03), (85, 0.02), (70, 0.01)];
const BOOM_EPIC_SHARE: f64 = 0.25;
const BOOM_STRONG_SHARE: f64 = 0.6;

const HIGH_PRESTIGE: i64 = 70;
const MEDIUM_PRESTIGE: i64 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrestigeTier {
    Low,
    Medium,
    High,
}

impl PrestigeTier {
    #[must_use]
    pub const fn from_score(score: i64) -> Self {
        if score >= HIGH_PRESTIGE {
            Self::High
        } else if score >= MEDIUM_PRESTIGE {
            Self::Medium
        } else {
            Self::Low
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for PrestigeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Campaign totals the prestige blend reads.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrestigeInputs {
    pub population_units: i64,
    pub primary_successes: usize,
    pub optional_successes: usize,
    /// Sum of layout bonuses over every resolved round.
    pub adjacency_total: i64,
    pub policy_count: usize,
    pub blight: u32,
    pub services_health: f64,
    pub rounds: u32,
}

impl PrestigeInputs {
    #[must_use]
    pub fn gather(state: &CampaignState, balance: &Balance) -> Self {
        let history = &state.history;
        Self {
            population_units: state.stats.population_units,
            primary_successes: history
                .iter()
                .filter(|report| report.mission.primary_success)
                .count(),
            optional_successes: history
                .iter()
                .map(|report| report.mission.optional_completed())
                .sum(),
            adjacency_total: history.iter().map(|report| report.layout_bonus.total()).sum(),
            policy_count: balance
                .policies
                .counted(state.bonuses.active_policies.len()),
            blight: state.city.blight,
            services_health: services_health(history.last()),
            rounds: state.rounds,
        }
    }
}

/// Everything the finale computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndgameOutcome {
    pub prestige_score: i64,
    pub prestige_tier: PrestigeTier,
    pub prestige_mult: f64,
    pub boom_mult: f64,
    pub boom_roll: f64,
    pub endgame_base: i64,
    pub endgame_bonus: i64,
    pub final_census: i64,
    pub blight_penalty: f64,
    pub policy_note: String,
}

impl EndgameOutcome {
    #[must_use]
    pub fn boomed(&self) -> bool {
        self.boom_mult > 1.0
    }
}

/// Spare service capacity in the given round, as a share of resident demand.
#[must_use]
pub fn services_health(last: Option<&Report>) -> f64 {
    let Some(report) = last else {
        return 0.0;
    };
    let demand = match report.gating.potential_residents {
        0 => 1,
        value => value,
    };
    let slack = report.gating.services_capacity - demand;
    clamp01(i64_to_f64(slack) / i64_to_f64(demand.max(1)))
}

fn norm(value: f64, (min, max): (f64, f64)) -> f64 {
    clamp01((value - min) / (max - min).max(1.0))
}

/// Raw 0-100 prestige before the per-policy points.
#[must_use]
pub fn prestige_score(inputs: &PrestigeInputs, balance: &Balance) -> i64 {
    let weights = &balance.endgame.prestige_weights;
    let rounds = f64::from(inputs.rounds.max(1));
    let primary = (usize_to_f64(inputs.primary_successes) / rounds).sqrt();
    let optional =
        (usize_to_f64(inputs.optional_successes) / (rounds * OPTIONAL_ROUND_WEIGHT).max(1.0)).sqrt();
    let policies = usize_to_f64(inputs.policy_count);
    let services = if balance.services.use_prestige_contribution {
        balance.services.prestige_contribution * inputs.services_health
    } else {
        0.0
    };
    let blend = weights.pop_units * norm(i64_to_f64(inputs.population_units), POPULATION_SPAN)
        + weights.adjacency * norm(i64_to_f64(inputs.adjacency_total), ADJACENCY_SPAN)
        + weights.primary * primary
        + weights.optional * optional
        + weights.policy * norm(policies, POLICY_SPAN)
        - weights.blight_penalty * norm(f64::from(inputs.blight), BLIGHT_SPAN)
        + services
        + balance.policies.per_policy_prestige_bonus * policies;
    round_f64_to_i64(clamp01(blend) * 100.0)
}

/// Boom multiplier for a roll; chance grows with prestige.
#[must_use]
pub fn boom_multiplier(score: i64, roll: f64, balance: &Balance) -> f64 {
    let chance = BOOM_TIERS
        .iter()
        .find(|(threshold, _)| score >= *threshold)
        .map_or(BOOM_CHANCE_BASE, |(_, chance)| *chance);
    let boom = &balance.endgame.boom;
    if roll >= chance {
        1.0
    } else if roll < chance * BOOM_EPIC_SHARE {
        boom.epic
    } else if roll < chance * BOOM_STRONG_SHARE {
        boom.strong
    } else {
        boom.modest
    }
}

/// Finale bonus with the locked balance.
#[must_use]
pub fn compute_endgame_bonus(
    state: &CampaignState,
    base_census: i64,
    rng: &mut Mulberry32,
) -> EndgameOutcome {
    compute_endgame_bonus_with(Balance::default_ref(), state, base_census, rng)
}

/// Finale bonus for a campaign whose history already holds the last report.
///
/// Draws exactly once from `rng` for the boom roll.
#[must_use]
pub fn compute_endgame_bonus_with(
    balance: &Balance,
    state: &CampaignState,
    base_census: i64,
    rng: &mut Mulberry32,
) -> EndgameOutcome {
    let inputs = PrestigeInputs::gather(state, balance);
    let policy_points = usize_to_i64(inputs.policy_count) * balance.policies.prestige_points_per_policy;
    let score = (prestige_score(&inputs, balance) + policy_points).min(100);
    let share = i64_to_f64(score) / 100.0;

    let curve = &balance.endgame.curve;
    let prestige_mult = (curve.base_mult + curve.span * share.powf(curve.exponent)).min(curve.max_mult);

    let boom_roll = rng.next_f64();
    let boom_mult = boom_multiplier(score, boom_roll, balance);

    let census = i64_to_f64(base_census);
    let base_rate = balance.endgame.base_rate + state.bonuses.next_round.endgame_base_bonus;
    let base_boost = round_f64_to_i64(balance.endgame.prestige_base_boost * share);
    let endgame_base = round_f64_to_i64(census * base_rate + i64_to_f64(base_boost));
    let raw_bonus = round_f64_to_i64(i64_to_f64(endgame_base) * prestige_mult * boom_mult);
    let floor = balance
        .endgame_min_abs
        .max(round_f64_to_i64(census * balance.endgame_min_rate));
    let endgame_bonus = raw_bonus.min(balance.endgame_max_abs).max(floor);

    #[cfg(debug_assertions)]
    if !(0..=100).contains(&score) || boom_mult < 1.0 || boom_mult > balance.endgame.boom.epic {
        log::warn!(
            "[BalanceGuard] endgame out of bounds | prestige {score} boom {boom_mult:.2}"
        );
    }

    let policy_note = if inputs.policy_count > 0 {
        format!(
            "Policy active ({}): small growth and prestige boost applied.",
            inputs.policy_count
        )
    } else {
        String::new()
    };

    EndgameOutcome {
        prestige_score: score,
        prestige_tier: PrestigeTier::from_score(score),
        prestige_mult,
        boom_mult,
        boom_roll,
        endgame_base,
        endgame_bonus,
        final_census: base_census + endgame_bonus,
        blight_penalty: balance.blight.penalty_for(inputs.blight),
        policy_note,
    }
}
