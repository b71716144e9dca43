//! Heuristic batch play: random tables, planned builds, telemetry roll-ups.

use anyhow::{Context, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use royal_city_game::rng::truncate_seed;
use royal_city_game::{
    CampaignEngine, CensusOptions, LimitingFactor, PlayersInput, Report, RoundInput,
    RoundTelemetry, StaticDataLoader, SuitCounts, TelemetrySummary, census_estimate_with,
};
use serde::Serialize;
use std::collections::BTreeMap;

use super::planner::plan_round;
use super::seeds::SeedInfo;
use super::stats::Distribution;

const TRICKS_PER_ROUND: usize = 13;
const OPTIONAL_ODDS: [f64; 2] = [0.6, 0.45];
/// Final census above this is logged as a spike.
pub const CENSUS_SPIKE: i64 = 3_000_000;

/// Uniform split of a hand's tricks across the four suits.
pub fn random_suit_split<R: Rng>(rng: &mut R) -> SuitCounts {
    let mut suits = [0_i64; 4];
    for _ in 0..TRICKS_PER_ROUND {
        suits[rng.gen_range(0..4)] += 1;
    }
    SuitCounts::new(suits[0], suits[1], suits[2], suits[3])
}

/// Primary mission roll; the opening round is easier.
pub fn random_mission_success<R: Rng>(rng: &mut R, round: u32) -> bool {
    let odds = if round == 1 { 0.85 } else { 0.75 };
    rng.gen_bool(odds)
}

/// Rounds attributed to what held them back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LimiterCounts {
    #[serde(rename = "Jobs")]
    pub jobs: usize,
    #[serde(rename = "Services")]
    pub services: usize,
    #[serde(rename = "Potential")]
    pub potential: usize,
    #[serde(rename = "None")]
    pub none: usize,
    #[serde(rename = "Mission fail")]
    pub mission_fail: usize,
}

impl LimiterCounts {
    /// A failed primary outranks whatever capacity capped the round.
    pub fn tally(&mut self, report: &Report) {
        if !report.mission.primary_success {
            self.mission_fail += 1;
            return;
        }
        match report.gating.limiting_factor {
            LimitingFactor::Jobs => self.jobs += 1,
            LimitingFactor::Services => self.services += 1,
            LimitingFactor::Potential => self.potential += 1,
            LimitingFactor::Balanced => self.none += 1,
        }
    }

    fn merge(&mut self, other: &Self) {
        self.jobs += other.jobs;
        self.services += other.services;
        self.potential += other.potential;
        self.none += other.none;
        self.mission_fail += other.mission_fail;
    }
}

/// Population units lost to each blocker over a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedGrowth {
    pub mission_fail: i64,
    pub jobs: i64,
    pub services: i64,
    pub potential: i64,
}

#[must_use]
pub fn compute_blocks(rounds: &[RoundTelemetry]) -> BlockedGrowth {
    let mut blocked = BlockedGrowth::default();
    for round in rounds {
        if !round.primary_success {
            blocked.mission_fail += (round.growth_after_gates - round.growth_after_mission_gate).max(0);
        }
        let shortfall = (round.housing_cap - round.growth_applied).max(0);
        match round.limiter {
            LimitingFactor::Jobs => blocked.jobs += shortfall,
            LimitingFactor::Services => blocked.services += shortfall,
            LimitingFactor::Potential => blocked.potential += shortfall,
            LimitingFactor::Balanced => {}
        }
    }
    blocked
}

/// Short label for the blocker of one round, empty when nothing blocked it.
#[must_use]
pub const fn blocked_by(round: &RoundTelemetry) -> &'static str {
    if !round.primary_success {
        return "mission";
    }
    match round.limiter {
        LimitingFactor::Jobs => "jobs",
        LimitingFactor::Services => "services",
        LimitingFactor::Potential => "potential",
        LimitingFactor::Balanced => "",
    }
}

/// One finished campaign.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub run_id: usize,
    pub seed: u64,
    pub final_census: i64,
    pub population_units: i64,
    pub primary_fails: usize,
    pub optional_attempts: usize,
    pub limiters: LimiterCounts,
    pub total_suit_growth: i64,
    pub total_adjacency_growth: i64,
    pub endgame_bonus_applied: i64,
    pub blocked: BlockedGrowth,
    pub asset_rewards_earned: usize,
    pub policy_rewards_earned: usize,
    pub rewards_wasted_or_capped: Vec<String>,
    pub summary: TelemetrySummary,
    #[serde(skip)]
    pub timeline: Vec<RoundTelemetry>,
}

impl RunRecord {
    #[must_use]
    pub fn top3_stack_heights(&self) -> String {
        self.summary
            .top3_stack_heights
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("|")
    }
}

/// Play one heuristic campaign seeded by `seed` with data from `loader`.
///
/// # Errors
///
/// Returns an error if the data fails to load or the engine refuses a round.
pub fn run_campaign(loader: &StaticDataLoader, run_id: usize, seed: u64) -> Result<RunRecord> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut engine = CampaignEngine::new(loader, truncate_seed(seed), &PlayersInput::default())
        .context("failed to load game data")?;

    let mut limiters = LimiterCounts::default();
    let mut primary_fails = 0;
    let mut optional_attempts = 0;

    while !engine.state().is_complete() {
        let round = engine.state().round;
        let suits = random_suit_split(&mut rng);
        let primary = random_mission_success(&mut rng, round);
        let optionals = OPTIONAL_ODDS.map(|odds| rng.gen_bool(odds));
        optional_attempts += optionals.len();

        let placed = engine.place_queued_assets();
        if !placed.is_empty() {
            log::debug!("run {run_id}: placed {} queued asset(s) before round {round}", placed.len());
        }
        let plan = plan_round(engine.state(), &suits, &mut rng);
        let input = RoundInput::new(suits, primary)
            .with_optionals(&optionals)
            .with_placements(plan.placements)
            .with_asset_placements(plan.asset_placements);

        let report = engine
            .resolve(&input)
            .with_context(|| format!("run {run_id} (seed {seed}) failed in round {round}"))?;
        limiters.tally(report);
        if !primary {
            primary_fails += 1;
        }
    }

    let state = engine.state();
    let final_census = census_estimate_with(
        engine.balance(),
        state.seed,
        state.round,
        state.stats.population_units,
        CensusOptions {
            blight: state.city.blight,
            census_multiplier: state.bonuses.next_round.census_multiplier,
        },
    );
    let summary = engine
        .telemetry()
        .finalize_with(engine.balance(), state, final_census);
    let timeline = engine.telemetry().rounds.clone();

    let rewards = summary.mission_rewards_earned;
    let asset_rewards_earned = rewards.park + rewards.market + rewards.clinic + rewards.transit;
    let mut rewards_wasted_or_capped = Vec::new();
    if asset_rewards_earned > summary.assets.total_placed {
        rewards_wasted_or_capped.push("Unplaced assets remaining".to_string());
    }
    if rewards.policy > summary.policy_count {
        rewards_wasted_or_capped.push("Policy rewards not active".to_string());
    }

    let endgame_bonus_applied = summary
        .endgame
        .map_or(0, |figures| figures.endgame_bonus);
    if final_census > CENSUS_SPIKE {
        log::warn!(
            "census spike: seed {seed} reached {final_census} with endgame bonus {endgame_bonus_applied}"
        );
    }

    Ok(RunRecord {
        run_id,
        seed,
        final_census,
        population_units: state.stats.population_units,
        primary_fails,
        optional_attempts,
        limiters,
        total_suit_growth: timeline.iter().map(|r| r.growth_after_suit_points).sum(),
        total_adjacency_growth: timeline.iter().map(|r| r.adjacency_bonus_this_round).sum(),
        endgame_bonus_applied,
        blocked: compute_blocks(&timeline),
        asset_rewards_earned,
        policy_rewards_earned: rewards.policy,
        rewards_wasted_or_capped,
        summary,
        timeline,
    })
}

/// Run `iterations` campaigns for every seed; run `i` of a seed plays
/// `seed + i`.
///
/// # Errors
///
/// Propagates the first failing run.
pub fn run_autorun(
    loader: &StaticDataLoader,
    seeds: &[SeedInfo],
    iterations: usize,
    verbose: bool,
) -> Result<Vec<RunRecord>> {
    let mut records = Vec::with_capacity(seeds.len() * iterations);
    for info in seeds {
        for i in 0..iterations {
            let seed = info.seed.wrapping_add(i as u64);
            let record = run_campaign(loader, records.len() + 1, seed)?;
            if verbose {
                println!(
                    "  run {:>4} seed {}+{i:<6} census {:>9} primaries {}/8",
                    record.run_id,
                    info.label(),
                    record.final_census,
                    record.summary.primary_success_count
                );
            }
            records.push(record);
        }
    }
    Ok(records)
}

/// Best run of a batch with its round-by-round timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopRun {
    pub seed: u64,
    pub final_census: i64,
    pub primary_success_count: usize,
    pub optional_success_count: usize,
    pub endgame_surge_ratio: f64,
    pub endgame_bonus_applied: i64,
    pub limiter_most_hit: Option<LimitingFactor>,
    pub timeline: Vec<RoundTelemetry>,
}

/// Distributions over a batch of runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutorunSummary {
    pub runs: usize,
    pub balance_version: String,
    pub population_units: Distribution,
    pub census: Distribution,
    pub limiter_counts: LimiterCounts,
    pub primary_fail_rate: f64,
    pub optional_success_rate: f64,
    pub primary_success_count: Distribution,
    pub optional_success_count: Distribution,
    pub max_stack_height: Distribution,
    pub total_assets: Distribution,
    pub adjacency_bonus_total: Distribution,
    pub policy_count: Distribution,
    pub blight_end: Distribution,
    pub blight_cleared_count: Distribution,
    pub stack_sum: Distribution,
    pub total_stacks_above1: Distribution,
    pub endgame_surge_ratio: Distribution,
    pub max_single_round_growth: Distribution,
    pub reward_counts_by_type: BTreeMap<&'static str, Distribution>,
    pub total_suit_growth: Distribution,
    pub total_adjacency_growth: Distribution,
    pub total_policy_growth: Distribution,
    pub endgame_bonus_applied: Distribution,
    pub blocked_by_mission_fail: Distribution,
    pub blocked_by_jobs: Distribution,
    pub blocked_by_services: Distribution,
    pub blocked_by_potential: Distribution,
    pub prestige_score: Option<Distribution>,
    pub prestige_mult: Option<Distribution>,
    pub boom_mult: Option<Distribution>,
    pub endgame_base: Option<Distribution>,
    pub endgame_bonus: Option<Distribution>,
    pub blight_penalty: Option<Distribution>,
    pub top_run: Option<TopRun>,
}

fn dist_of(records: &[RunRecord], field: impl Fn(&RunRecord) -> f64) -> Distribution {
    let values: Vec<f64> = records.iter().map(field).collect();
    Distribution::from_values(&values)
}

#[allow(clippy::cast_precision_loss)]
fn count(value: usize) -> f64 {
    value as f64
}

#[allow(clippy::cast_precision_loss)]
fn units(value: i64) -> f64 {
    value as f64
}

fn endgame_dist(
    records: &[RunRecord],
    field: impl Fn(&royal_city_game::telemetry::EndgameFigures) -> f64,
) -> Option<Distribution> {
    let values: Vec<f64> = records
        .iter()
        .filter_map(|record| record.summary.endgame.as_ref().map(&field))
        .collect();
    (!values.is_empty()).then(|| Distribution::from_values(&values))
}

fn ratio(part: usize, whole: usize) -> f64 {
    let value = count(part) / count(whole.max(1));
    (value * 1000.0).round() / 1000.0
}

/// Fold a batch into its distribution summary.
#[must_use]
pub fn summarize(records: &[RunRecord], balance_version: &str) -> AutorunSummary {
    let mut limiter_counts = LimiterCounts::default();
    for record in records {
        limiter_counts.merge(&record.limiters);
    }
    let rounds_played: usize = records.iter().map(|r| r.timeline.len()).sum();
    let primary_fails: usize = records.iter().map(|r| r.primary_fails).sum();
    let optional_attempts: usize = records.iter().map(|r| r.optional_attempts).sum();
    let optional_successes: usize = records
        .iter()
        .map(|r| r.summary.optional_success_count)
        .sum();

    let rewards = |pick: fn(&RunRecord) -> usize| dist_of(records, |r| count(pick(r)));
    let reward_counts_by_type = BTreeMap::from([
        ("PARK", rewards(|r| r.summary.mission_rewards_earned.park)),
        ("MARKET", rewards(|r| r.summary.mission_rewards_earned.market)),
        ("CLINIC", rewards(|r| r.summary.mission_rewards_earned.clinic)),
        ("TRANSIT", rewards(|r| r.summary.mission_rewards_earned.transit)),
        ("POLICY", rewards(|r| r.summary.mission_rewards_earned.policy)),
    ]);

    let top_run = records
        .iter()
        .max_by_key(|record| record.final_census)
        .map(|record| TopRun {
            seed: record.seed,
            final_census: record.final_census,
            primary_success_count: record.summary.primary_success_count,
            optional_success_count: record.summary.optional_success_count,
            endgame_surge_ratio: record.summary.endgame_surge_ratio,
            endgame_bonus_applied: record.endgame_bonus_applied,
            limiter_most_hit: record.summary.limiter_most_hit,
            timeline: record.timeline.clone(),
        });

    AutorunSummary {
        runs: records.len(),
        balance_version: balance_version.to_string(),
        population_units: dist_of(records, |r| units(r.population_units)),
        census: dist_of(records, |r| units(r.final_census)),
        limiter_counts,
        primary_fail_rate: ratio(primary_fails, rounds_played),
        optional_success_rate: ratio(optional_successes, optional_attempts),
        primary_success_count: dist_of(records, |r| count(r.summary.primary_success_count)),
        optional_success_count: dist_of(records, |r| count(r.summary.optional_success_count)),
        max_stack_height: dist_of(records, |r| f64::from(r.summary.assets.max_stack_height)),
        total_assets: dist_of(records, |r| count(r.summary.assets.total_placed)),
        adjacency_bonus_total: dist_of(records, |r| units(r.summary.adjacency_bonus_total)),
        policy_count: dist_of(records, |r| count(r.summary.policy_count)),
        blight_end: dist_of(records, |r| f64::from(r.summary.blight_end)),
        blight_cleared_count: dist_of(records, |r| count(r.summary.blight_cleared_count)),
        stack_sum: dist_of(records, |r| f64::from(r.summary.stack_sum)),
        total_stacks_above1: dist_of(records, |r| count(r.summary.total_stacks_above1)),
        endgame_surge_ratio: dist_of(records, |r| r.summary.endgame_surge_ratio),
        max_single_round_growth: dist_of(records, |r| units(r.summary.max_single_round_growth)),
        reward_counts_by_type,
        total_suit_growth: dist_of(records, |r| units(r.total_suit_growth)),
        total_adjacency_growth: dist_of(records, |r| units(r.total_adjacency_growth)),
        total_policy_growth: dist_of(records, |r| units(r.summary.total_policy_growth)),
        endgame_bonus_applied: dist_of(records, |r| units(r.endgame_bonus_applied)),
        blocked_by_mission_fail: dist_of(records, |r| units(r.blocked.mission_fail)),
        blocked_by_jobs: dist_of(records, |r| units(r.blocked.jobs)),
        blocked_by_services: dist_of(records, |r| units(r.blocked.services)),
        blocked_by_potential: dist_of(records, |r| units(r.blocked.potential)),
        prestige_score: endgame_dist(records, |e| units(e.prestige_score)),
        prestige_mult: endgame_dist(records, |e| e.prestige_mult),
        boom_mult: endgame_dist(records, |e| e.boom_mult),
        endgame_base: endgame_dist(records, |e| units(e.endgame_base)),
        endgame_bonus: endgame_dist(records, |e| units(e.endgame_bonus)),
        blight_penalty: endgame_dist(records, |e| e.blight_penalty),
        top_run,
    }
}
