//! Final letter grade for a finished campaign.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::balance::Balance;
use crate::constants::{GRADE_CENSUS_CEILING, MAX_BLIGHT};
use crate::endgame::{EndgameOutcome, services_health};
use crate::numbers::{clamp01, i64_to_f64, round_f64_to_i64, usize_to_f64};
use crate::report::Report;
use crate::state::CampaignState;

const CENSUS_WEIGHT: f64 = 0.25;
const PRESTIGE_WEIGHT: f64 = 0.2;
const MISSION_WEIGHT: f64 = 0.15;
const BLIGHT_WEIGHT: f64 = 0.15;
const POLICY_WEIGHT: f64 = 0.15;
const SERVICES_WEIGHT: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LetterGrade {
    S,
    A,
    B,
    C,
    D,
    F,
}

impl LetterGrade {
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 90.0 => Self::S,
            s if s >= 75.0 => Self::A,
            s if s >= 60.0 => Self::B,
            s if s >= 45.0 => Self::C,
            s if s >= 30.0 => Self::D,
            _ => Self::F,
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::S => "Legendary City",
            Self::A => "Respected City",
            Self::B => "Growing City",
            Self::C => "Modest City",
            Self::D => "Struggling City",
            Self::F => "Faltering City",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::S => "S",
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        }
    }
}

impl fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Component scores, each on a 0-100 scale except the success rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeInputs {
    pub final_census_score: i64,
    pub prestige_score: i64,
    /// Primary successes over campaign rounds, `0..=1`.
    pub mission_success_rate: f64,
    pub blight_control: i64,
    pub policy_contribution: i64,
    pub services_stability: i64,
}

impl GradeInputs {
    #[must_use]
    pub fn weighted_score(&self) -> f64 {
        let score = i64_to_f64(self.final_census_score) * CENSUS_WEIGHT
            + i64_to_f64(self.prestige_score) * PRESTIGE_WEIGHT
            + self.mission_success_rate * 100.0 * MISSION_WEIGHT
            + i64_to_f64(self.blight_control) * BLIGHT_WEIGHT
            + i64_to_f64(self.policy_contribution) * POLICY_WEIGHT
            + i64_to_f64(self.services_stability) * SERVICES_WEIGHT;
        score.clamp(0.0, 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityGrade {
    pub grade: LetterGrade,
    pub title: String,
    pub city_score: i64,
    pub summary: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub inputs: GradeInputs,
}

/// Census mapped onto 0-100 against the grading ceiling.
#[must_use]
pub fn census_score(census: i64) -> i64 {
    round_f64_to_i64(clamp01(i64_to_f64(census) / GRADE_CENSUS_CEILING) * 100.0)
}

/// Grade with the locked balance.
#[must_use]
pub fn compute_final_city_grade(
    state: &CampaignState,
    report: &Report,
    endgame: &EndgameOutcome,
) -> CityGrade {
    compute_final_city_grade_with(Balance::default_ref(), state, report, endgame)
}

/// Grade the campaign in `state`, counting `report` once even when the
/// history already ends with it.
#[must_use]
pub fn compute_final_city_grade_with(
    balance: &Balance,
    state: &CampaignState,
    report: &Report,
    endgame: &EndgameOutcome,
) -> CityGrade {
    let already_logged = state
        .history
        .last()
        .is_some_and(|last| last.round_resolved == report.round_resolved);
    let extra = usize::from(!already_logged);
    let primary_successes = state
        .history
        .iter()
        .chain((!already_logged).then_some(report))
        .filter(|entry| entry.mission.primary_success)
        .count();
    let logged = state.history.len() + extra;
    let rounds = f64::from(state.rounds.max(1));
    let mission_success_rate = if logged == 0 {
        1.0
    } else {
        usize_to_f64(primary_successes) / rounds
    };

    let blight = report.stats_after.blight;
    let max_blight = f64::from(MAX_BLIGHT.max(1));
    let blight_control = round_f64_to_i64(clamp01(1.0 - f64::from(blight) / max_blight) * 100.0);
    let max_active = balance.policies.max_active.max(1);
    let policy_count = state.bonuses.active_policies.len().min(max_active);
    let policy_contribution =
        round_f64_to_i64(clamp01(usize_to_f64(policy_count) / usize_to_f64(max_active)) * 100.0);
    let services_stability = round_f64_to_i64(services_health(Some(report)) * 100.0);

    let inputs = GradeInputs {
        final_census_score: census_score(endgame.final_census),
        prestige_score: endgame.prestige_score.clamp(0, 100),
        mission_success_rate,
        blight_control,
        policy_contribution,
        services_stability,
    };
    let city_score = inputs.weighted_score();
    let grade = LetterGrade::from_score(city_score);
    let (strengths, weaknesses) = assess(&inputs, blight);

    CityGrade {
        grade,
        title: grade.title().to_string(),
        city_score: round_f64_to_i64(city_score),
        summary: summarize(&strengths, &weaknesses),
        strengths,
        weaknesses,
        inputs,
    }
}

fn assess(inputs: &GradeInputs, blight: u32) -> (Vec<String>, Vec<String>) {
    let mut strengths = Vec::new();
    let mut weaknesses = Vec::new();
    if inputs.mission_success_rate >= 0.7 {
        strengths.push("Mission reliability");
    } else {
        weaknesses.push("Missed missions");
    }
    if inputs.prestige_score >= 70 {
        strengths.push("High prestige");
    } else if inputs.prestige_score < 40 {
        weaknesses.push("Thin prestige");
    }
    if inputs.services_stability >= 60 {
        strengths.push("Stable services");
    } else {
        weaknesses.push("Services under strain");
    }
    if inputs.blight_control >= 70 {
        strengths.push("Blight contained");
    } else if blight > 0 {
        weaknesses.push("Late blight drag");
    }
    if inputs.policy_contribution >= 60 {
        strengths.push("Policy momentum");
    }
    if inputs.mission_success_rate < 0.5 && weaknesses.len() < 3 {
        weaknesses.push("Inconsistent execution");
    }
    (
        strengths.into_iter().map(String::from).collect(),
        weaknesses.into_iter().map(String::from).collect(),
    )
}

fn summarize(strengths: &[String], weaknesses: &[String]) -> String {
    let mut parts = Vec::new();
    if !strengths.is_empty() {
        parts.push(format!("Strengths: {}", top_two(strengths)));
    }
    if !weaknesses.is_empty() {
        parts.push(format!("Weaknesses: {}", top_two(weaknesses)));
    }
    parts.join(". ")
}

fn top_two(items: &[String]) -> String {
    items
        .iter()
        .take(2)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
