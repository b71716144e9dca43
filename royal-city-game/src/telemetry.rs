//! Read-only telemetry for balance harnesses.
//!
//! Every resolution emits a [`RoundTelemetry`]. A [`TelemetryRun`] collects
//! them for a campaign and folds them into a [`TelemetrySummary`]. Nothing
//! here feeds back into gameplay.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::balance::Balance;
use crate::board::Board;
use crate::census::{CensusBreakdown, CensusOptions, census_breakdown};
use crate::constants::BOOM_GROWTH_THRESHOLD;
use crate::numbers::{i64_to_f64, round_f64_to_i64};
use crate::report::{FinaleMeta, LimitingFactor};
use crate::resolver::SuitCounts;
use crate::sector::AssetKind;
use crate::state::CampaignState;

/// Board bonus attributed to where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjacencySources {
    pub assets: i64,
    pub layout: i64,
    pub road: i64,
    pub policies: i64,
}

impl AdjacencySources {
    fn accumulate(&mut self, other: &Self) {
        self.assets += other.assets;
        self.layout += other.layout;
        self.road += other.road;
        self.policies += other.policies;
    }
}

/// Growth at each stage of one resolution plus the board afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundTelemetry {
    pub round: u32,
    pub primary_success: bool,
    pub optional_completed: usize,
    pub suit_totals: SuitCounts,
    /// Limit plus connectivity, before any multiplier.
    pub growth_attempted: i64,
    pub growth_after_suit_points: i64,
    pub growth_after_board_bonuses: i64,
    pub growth_after_gates: i64,
    pub growth_after_mission_gate: i64,
    pub growth_applied: i64,
    pub limiter: LimitingFactor,
    pub jobs_cap: i64,
    pub services_cap: i64,
    pub housing_cap: i64,
    pub assets_placed_this_round: usize,
    pub assets_placed_types: Vec<AssetKind>,
    pub total_assets: usize,
    pub max_stack_height: u32,
    pub adjacency_bonus_this_round: i64,
    pub adjacency_bonus_by_source: AdjacencySources,
    pub blight_level: u32,
    pub stack_sum_after: u32,
    pub population_units_after: i64,
    pub census_after: i64,
    pub policy_growth_delta: i64,
    pub rewards_earned: Vec<String>,
}

/// Earned rewards bucketed the way balance reports read them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct RewardTally {
    pub park: usize,
    pub market: usize,
    pub clinic: usize,
    pub transit: usize,
    pub policy: usize,
}

impl RewardTally {
    fn record(&mut self, id: &str) {
        match id.trim().to_ascii_uppercase().as_str() {
            "PARK" => self.park += 1,
            "MARKET" => self.market += 1,
            "CLINIC" => self.clinic += 1,
            "TRANSIT_STOP" | "TRANSIT" => self.transit += 1,
            "GRANT_FUNDING" | "ZONING_REFORM" | "UNLOCK_HIGHWAYS" => self.policy += 1,
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct AssetCounts {
    pub park: usize,
    pub market: usize,
    pub clinic: usize,
    pub transit: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSummary {
    pub total_placed: usize,
    pub by_type: AssetCounts,
    pub max_stack_height: u32,
    /// Developed tiles by level, with every level of 3 or more in bucket 3.
    pub stack_height_histogram: BTreeMap<u32, usize>,
    pub adjacency_bonus_total: i64,
}

impl AssetSummary {
    fn from_board(board: &Board, adjacency_bonus_total: i64, max_stack_hint: u32) -> Self {
        let mut histogram: BTreeMap<u32, usize> = (1..=3).map(|level| (level, 0)).collect();
        let mut by_type = AssetCounts::default();
        let mut max_stack_height = max_stack_hint;
        for cell in board.cells() {
            let level = cell.effective_level();
            max_stack_height = max_stack_height.max(level);
            if level >= 1 {
                *histogram.entry(level.min(3)).or_default() += 1;
            }
            match cell.asset_kind() {
                Some(AssetKind::Park) => by_type.park += 1,
                Some(AssetKind::Market) => by_type.market += 1,
                Some(AssetKind::Clinic) => by_type.clinic += 1,
                Some(AssetKind::TransitStop) => by_type.transit += 1,
                None => {}
            }
        }
        Self {
            total_placed: board.asset_count(),
            by_type,
            max_stack_height,
            stack_height_histogram: histogram,
            adjacency_bonus_total,
        }
    }
}

/// Finale figures copied from the last report.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndgameFigures {
    pub prestige_score: i64,
    pub prestige_mult: f64,
    pub boom_mult: f64,
    pub endgame_base: i64,
    pub endgame_bonus: i64,
    pub blight_penalty: f64,
}

impl From<&FinaleMeta> for EndgameFigures {
    fn from(meta: &FinaleMeta) -> Self {
        Self {
            prestige_score: meta.prestige_score,
            prestige_mult: meta.prestige_mult,
            boom_mult: meta.boom_mult,
            endgame_base: meta.endgame_base,
            endgame_bonus: meta.endgame_bonus,
            blight_penalty: meta.blight_penalty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySummary {
    pub primary_success_count: usize,
    pub optional_success_count: usize,
    pub longest_primary_streak: usize,
    pub longest_failure_streak: usize,
    pub mission_rewards_earned: RewardTally,
    pub assets: AssetSummary,
    pub policy_ids_active: Vec<String>,
    pub policy_count: usize,
    pub blight_start: u32,
    pub blight_end: u32,
    pub blight_cleared_count: usize,
    pub stack_sum: u32,
    pub total_stacks_above1: usize,
    pub top3_stack_heights: Vec<u32>,
    pub adjacency_bonus_total: i64,
    pub adjacency_bonus_by_source: AdjacencySources,
    pub census_breakdown: CensusBreakdown,
    pub final_census: i64,
    pub boom_round: Option<u32>,
    pub max_single_round_growth: i64,
    pub limiter_most_hit: Option<LimitingFactor>,
    /// Final census over the linear census of the final unit count.
    pub endgame_surge_ratio: f64,
    pub endgame: Option<EndgameFigures>,
    pub total_policy_growth: i64,
}

/// Telemetry collected over one campaign.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TelemetryRun {
    pub rounds: Vec<RoundTelemetry>,
    pub rewards_earned: Vec<String>,
    pub endgame: Option<EndgameFigures>,
}

impl TelemetryRun {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one resolution; finale figures are taken when present.
    pub fn record(&mut self, round: RoundTelemetry, finale: Option<&FinaleMeta>) {
        self.rewards_earned
            .extend(round.rewards_earned.iter().cloned());
        self.rounds.push(round);
        if let Some(meta) = finale {
            self.endgame = Some(EndgameFigures::from(meta));
        }
    }

    #[must_use]
    pub fn finalize(&self, state: &CampaignState, final_census: i64) -> TelemetrySummary {
        self.finalize_with(Balance::default_ref(), state, final_census)
    }

    /// Fold the collected rounds into a summary against the finished state.
    #[must_use]
    pub fn finalize_with(
        &self,
        balance: &Balance,
        state: &CampaignState,
        final_census: i64,
    ) -> TelemetrySummary {
        let rounds = &self.rounds;
        let primary: Vec<bool> = rounds.iter().map(|round| round.primary_success).collect();
        let failures: Vec<bool> = primary.iter().map(|success| !success).collect();

        let mut rewards = RewardTally::default();
        for id in &self.rewards_earned {
            rewards.record(id);
        }

        let adjacency_bonus_total = rounds
            .iter()
            .map(|round| round.adjacency_bonus_this_round)
            .sum();
        let mut by_source = AdjacencySources::default();
        for round in rounds {
            by_source.accumulate(&round.adjacency_bonus_by_source);
        }
        let max_stack_hint = rounds
            .iter()
            .map(|round| round.max_stack_height)
            .max()
            .unwrap_or_default();

        let levels = state.board.stack_levels();
        let policy_ids_active: Vec<String> = state
            .bonuses
            .active_policies
            .iter()
            .map(|policy| policy.kind.as_str().to_string())
            .collect();

        let breakdown = census_breakdown(
            balance,
            state.seed,
            state.round,
            state.stats.population_units,
            CensusOptions {
                blight: state.city.blight,
                census_multiplier: state.bonuses.next_round.census_multiplier,
            },
        );

        TelemetrySummary {
            primary_success_count: primary.iter().filter(|success| **success).count(),
            optional_success_count: rounds.iter().map(|round| round.optional_completed).sum(),
            longest_primary_streak: longest_streak(&primary),
            longest_failure_streak: longest_streak(&failures),
            mission_rewards_earned: rewards,
            assets: AssetSummary::from_board(&state.board, adjacency_bonus_total, max_stack_hint),
            policy_count: policy_ids_active.len(),
            policy_ids_active,
            blight_start: rounds.first().map_or_else(
                || {
                    state
                        .history
                        .first()
                        .map_or(0, |report| report.stats_before.blight)
                },
                |round| round.blight_level,
            ),
            blight_end: rounds
                .last()
                .map_or(state.city.blight, |round| round.blight_level),
            blight_cleared_count: rounds
                .windows(2)
                .filter(|pair| pair[1].blight_level < pair[0].blight_level)
                .count(),
            stack_sum: levels.iter().sum(),
            total_stacks_above1: levels.iter().filter(|level| **level > 1).count(),
            top3_stack_heights: levels.iter().take(3).copied().collect(),
            adjacency_bonus_total,
            adjacency_bonus_by_source: by_source,
            census_breakdown: breakdown,
            final_census,
            boom_round: rounds
                .iter()
                .find(|round| round.growth_applied >= BOOM_GROWTH_THRESHOLD)
                .map(|round| round.round),
            max_single_round_growth: rounds
                .iter()
                .map(|round| round.growth_applied)
                .max()
                .unwrap_or_default()
                .max(0),
            limiter_most_hit: most_common_limiter(rounds),
            endgame_surge_ratio: surge_ratio(balance, state.stats.population_units, final_census),
            endgame: self.endgame,
            total_policy_growth: rounds.iter().map(|round| round.policy_growth_delta).sum(),
        }
    }
}

fn longest_streak(flags: &[bool]) -> usize {
    let mut best = 0;
    let mut current = 0;
    for flag in flags {
        current = if *flag { current + 1 } else { 0 };
        best = best.max(current);
    }
    best
}

/// Most frequent limiter; ties go to the one seen first.
fn most_common_limiter(rounds: &[RoundTelemetry]) -> Option<LimitingFactor> {
    let mut counts: Vec<(LimitingFactor, usize)> = Vec::new();
    for round in rounds {
        match counts.iter_mut().find(|(factor, _)| *factor == round.limiter) {
            Some((_, count)) => *count += 1,
            None => counts.push((round.limiter, 1)),
        }
    }
    let best = counts.iter().map(|(_, count)| *count).max()?;
    counts
        .into_iter()
        .find(|(_, count)| *count == best)
        .map(|(factor, _)| factor)
}

fn surge_ratio(balance: &Balance, population_units: i64, final_census: i64) -> f64 {
    let linear =
        balance.census.base + i64_to_f64(population_units) * balance.census.unit_to_people;
    if linear <= 0.0 {
        return 1.0;
    }
    let census = if final_census > 0 {
        i64_to_f64(final_census)
    } else {
        linear
    };
    i64_to_f64(round_f64_to_i64(census / linear * 1000.0)) / 1000.0
}
