//! Canned campaigns replayed round by round.

use anyhow::{Context, Result};
use royal_city_game::{
    CampaignEngine, CampaignState, LimitingFactor, PlayersInput, Report, RoundInput,
    StaticDataLoader, SuitCounts, history_digest,
};
use serde::Serialize;

/// One scripted round: suit totals in clubs, diamonds, hearts, spades order.
#[derive(Debug, Clone, Copy)]
pub struct ScriptedRound {
    pub suits: [i64; 4],
    pub primary: bool,
    pub optional: [bool; 2],
}

const fn r(suits: [i64; 4], primary: bool) -> ScriptedRound {
    ScriptedRound {
        suits,
        primary,
        optional: [false, false],
    }
}

const fn ro(suits: [i64; 4], primary: bool, optional: [bool; 2]) -> ScriptedRound {
    ScriptedRound {
        suits,
        primary,
        optional,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScriptedCampaign {
    pub key: &'static str,
    pub description: &'static str,
    pub seed: u32,
    pub rounds: [ScriptedRound; 8],
}

pub const SCRIPTED_CAMPAIGNS: [ScriptedCampaign; 5] = [
    ScriptedCampaign {
        key: "balanced-mix",
        description: "Even suits with two missed primaries",
        seed: 42,
        rounds: [
            ro([3, 4, 4, 2], true, [true, false]),
            r([2, 4, 4, 3], true),
            ro([3, 3, 4, 3], true, [false, true]),
            r([2, 5, 3, 3], false),
            r([4, 3, 4, 2], true),
            ro([3, 3, 5, 2], true, [true, false]),
            r([2, 4, 4, 3], true),
            ro([3, 3, 3, 4], false, [false, true]),
        ],
    },
    ScriptedCampaign {
        key: "services-light",
        description: "A single club every round starves services",
        seed: 77,
        rounds: [
            r([1, 6, 4, 2], true),
            r([1, 5, 5, 2], true),
            r([1, 4, 6, 2], false),
            ro([1, 4, 5, 3], true, [true, false]),
            r([1, 5, 4, 3], true),
            r([1, 4, 5, 3], true),
            r([1, 5, 4, 3], true),
            r([1, 6, 3, 3], true),
        ],
    },
    ScriptedCampaign {
        key: "infra-heavy",
        description: "Club-heavy tables with thin commerce",
        seed: 91,
        rounds: [
            r([5, 2, 4, 2], true),
            r([4, 2, 4, 3], true),
            r([5, 1, 5, 2], false),
            r([4, 3, 3, 3], true),
            r([4, 2, 4, 3], true),
            r([5, 2, 4, 2], true),
            r([4, 3, 3, 3], false),
            r([5, 2, 4, 2], true),
        ],
    },
    ScriptedCampaign {
        key: "mission-swing",
        description: "Primary failures early and mid campaign",
        seed: 123,
        rounds: [
            r([3, 3, 5, 2], false),
            r([2, 4, 4, 3], true),
            r([2, 5, 4, 2], true),
            ro([3, 3, 5, 2], true, [true, false]),
            r([4, 3, 4, 2], false),
            r([3, 4, 4, 2], true),
            ro([2, 5, 3, 3], true, [false, true]),
            r([3, 3, 4, 3], true),
        ],
    },
    ScriptedCampaign {
        key: "optional-boosts",
        description: "Optional missions cleared throughout",
        seed: 321,
        rounds: [
            ro([2, 4, 4, 3], true, [true, true]),
            r([2, 3, 5, 3], true),
            ro([3, 3, 4, 3], false, [true, false]),
            r([2, 4, 4, 3], true),
            r([3, 4, 4, 2], true),
            r([2, 4, 5, 2], true),
            r([3, 3, 4, 3], false),
            ro([2, 5, 3, 3], true, [false, true]),
        ],
    },
];

/// Keys and descriptions of every scripted campaign.
#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    SCRIPTED_CAMPAIGNS
        .iter()
        .map(|campaign| (campaign.key, campaign.description))
        .collect()
}

#[must_use]
pub fn get_scenario(key: &str) -> Option<&'static ScriptedCampaign> {
    SCRIPTED_CAMPAIGNS
        .iter()
        .find(|campaign| campaign.key.eq_ignore_ascii_case(key))
}

/// Per-round line of a scripted run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundLine {
    pub round: u32,
    pub suits: SuitCounts,
    pub primary_success: bool,
    pub optional_completed: usize,
    pub road_residential: i64,
    pub road_commerce: i64,
    pub road_services: i64,
    pub potential: i64,
    pub jobs_cap: i64,
    pub services_cap: i64,
    pub growth_allowed: i64,
    pub growth_applied: i64,
    pub limiter: String,
}

impl RoundLine {
    fn from_report(report: &Report) -> Self {
        let developed = &report.developed_summary;
        Self {
            round: report.round_resolved,
            suits: report.suits,
            primary_success: report.mission.primary_success,
            optional_completed: report.mission.optional_completed(),
            road_residential: developed.residential,
            road_commerce: developed.commerce,
            road_services: developed.infrastructure + developed.civic,
            potential: report.gating.potential_residents,
            jobs_cap: report.gating.jobs_capacity,
            services_cap: report.gating.services_capacity,
            growth_allowed: report.gating.growth_after_roads,
            growth_applied: report.changes.population_units,
            limiter: limiter_reasons(report),
        }
    }
}

/// Everything that held a round back, or `None`.
#[must_use]
pub fn limiter_reasons(report: &Report) -> String {
    let mut reasons = Vec::new();
    match report.gating.limiting_factor {
        LimitingFactor::Jobs => reasons.push("Jobs"),
        LimitingFactor::Services => reasons.push("Services"),
        LimitingFactor::Potential | LimitingFactor::Balanced => {}
    }
    if report.gating.road_factor < 1.0 {
        reasons.push("Roads");
    }
    if !report.mission.primary_success {
        reasons.push("Mission fail");
    }
    if reasons.is_empty() {
        reasons.push("None");
    }
    reasons.join(", ")
}

/// Outcome of one scripted campaign.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioRun {
    pub name: String,
    pub seed: u32,
    pub rounds: Vec<RoundLine>,
    pub population_units: i64,
    pub census: i64,
    pub developed: usize,
    pub upgrades: usize,
    pub grade: Option<String>,
    pub history_digest: u64,
    pub passed: bool,
    pub failures: Vec<String>,
}

fn round_input(round: &ScriptedRound) -> RoundInput {
    let [clubs, diamonds, hearts, spades] = round.suits;
    RoundInput::new(SuitCounts::new(clubs, diamonds, hearts, spades), round.primary)
        .with_optionals(&round.optional)
}

fn play(campaign: &ScriptedCampaign) -> Result<CampaignState> {
    let mut engine = CampaignEngine::new(
        &StaticDataLoader::new(),
        campaign.seed,
        &PlayersInput::default(),
    )
    .context("failed to load bundled game data")?;
    for round in &campaign.rounds {
        engine
            .resolve(&round_input(round))
            .with_context(|| format!("scenario {} overran its campaign", campaign.key))?;
    }
    Ok(engine.into_state())
}

fn check_invariants(state: &CampaignState, failures: &mut Vec<String>) {
    if !state.is_complete() {
        failures.push(format!("campaign stopped at round {}", state.round));
    }
    if state.city.blight > 3 {
        failures.push(format!("blight {} above cap", state.city.blight));
    }
    for report in &state.history {
        let stats = &report.stats_after.stats;
        if !(0..=5).contains(&stats.pressure) {
            failures.push(format!(
                "round {} pressure {} out of range",
                report.round_resolved, stats.pressure
            ));
        }
        if !report.mission.primary_success && !report.missions.reward_notes.is_empty() {
            failures.push(format!(
                "round {} granted rewards after a failed primary",
                report.round_resolved
            ));
        }
    }
    if state
        .history
        .last()
        .is_none_or(|report| report.final_grade.is_none())
    {
        failures.push("final round was not graded".to_string());
    }
}

/// Replay `campaign` twice and report its rounds and final city.
///
/// # Errors
///
/// Returns an error if the bundled data fails to load.
pub fn run_scenario(campaign: &ScriptedCampaign) -> Result<ScenarioRun> {
    let state = play(campaign)?;
    let replay = play(campaign)?;

    let mut failures = Vec::new();
    check_invariants(&state, &mut failures);
    let digest = history_digest(&state.history);
    if digest != history_digest(&replay.history) {
        failures.push("replay diverged from first run".to_string());
    }

    let developed = state.board.developed().count();
    let upgrades = state.board.developed().filter(|cell| cell.level > 1).count();
    log::debug!(
        "scenario {} finished with {} developed tiles",
        campaign.key,
        developed
    );

    Ok(ScenarioRun {
        name: campaign.key.to_string(),
        seed: campaign.seed,
        rounds: state.history.iter().map(RoundLine::from_report).collect(),
        population_units: state.stats.population_units,
        census: state.stats.census,
        developed,
        upgrades,
        grade: state
            .history
            .last()
            .and_then(|report| report.final_grade.as_ref())
            .map(|grade| grade.grade.to_string()),
        history_digest: digest,
        passed: failures.is_empty(),
        failures,
    })
}
