//! Round reports: the audit record appended to campaign history.
//!
//! Field names are camelCase on the wire; the same JSON is what replay
//! digests hash.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hasher;
use twox_hash::XxHash64;

use crate::board::BoardSnapshot;
use crate::constants::MOMENTUM_WINDOW;
use crate::endgame::PrestigeTier;
use crate::grade::CityGrade;
use crate::layout::{AssetBonuses, DevelopedSummary, LayoutBonuses};
use crate::missions::Mission;
use crate::numbers::{i64_to_f64, usize_to_f64};
use crate::resolver::{BuildAction, SuitCounts};
use crate::rewards::RewardResult;
use crate::sector::PlanningFocus;
use crate::state::Stats;

/// Suit tricks credited to each sector this round.
pub type SectorPoints = DevelopedSummary;

/// Mission toggles reported by the table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MissionFlags {
    pub primary_success: bool,
    pub optional_successes: Vec<bool>,
}

impl MissionFlags {
    #[must_use]
    pub fn optional_completed(&self) -> usize {
        self.optional_successes.iter().filter(|done| **done).count()
    }
}

/// Planning focus as it played out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusReport {
    pub selection: PlanningFocus,
    pub label: String,
    pub applied: bool,
    pub note: String,
    pub action_budget: u32,
}

/// A drafted mission with its outcome and whatever its reward did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedMission {
    #[serde(flatten)]
    pub mission: Mission,
    #[serde(default)]
    pub reward_result: Option<RewardResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MissionsReport {
    pub round: u32,
    pub primary: Option<ResolvedMission>,
    pub optional: Vec<ResolvedMission>,
    pub reward_notes: Vec<String>,
    pub rewards_blocked: bool,
}

impl MissionsReport {
    /// Ids of every mission offered in the round.
    pub fn offered_ids(&self) -> impl Iterator<Item = String> + '_ {
        self.primary
            .iter()
            .chain(self.optional.iter())
            .map(|resolved| resolved.mission.id.clone())
    }
}

/// The capacity that capped growth this round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LimitingFactor {
    #[default]
    Potential,
    Jobs,
    Services,
    /// Capacities within one of each other; the grace rule applied.
    #[serde(rename = "None")]
    Balanced,
}

impl LimitingFactor {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Potential => "Potential",
            Self::Jobs => "Jobs",
            Self::Services => "Services",
            Self::Balanced => "None",
        }
    }

    /// Jobs or services blocked growth.
    #[must_use]
    pub const fn is_capacity_block(self) -> bool {
        matches!(self, Self::Jobs | Self::Services)
    }
}

impl fmt::Display for LimitingFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Gating {
    pub potential_residents: i64,
    pub jobs_capacity: i64,
    pub services_capacity: i64,
    pub limiting_factor: LimitingFactor,
    pub grace_applied: bool,
    /// Limit plus connectivity, after the growth multiplier.
    pub growth_base: f64,
    pub road_factor: f64,
    pub road_connected: usize,
    pub road_developed: usize,
    pub growth_after_roads: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Changes {
    pub population_units: i64,
    pub population_decay: i64,
    pub attraction: i64,
    pub adjacency_attraction: i64,
    pub adjacency_pressure: i64,
    pub pressure_delta: i64,
    pub pressure_applied: i64,
    pub dormant_housing_delta: i64,
    pub dormant_housing_added: i64,
    pub dormant_housing_filled: i64,
    pub policy_growth_delta: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsBefore {
    pub census: i64,
    pub blight: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsAfter {
    #[serde(flatten)]
    pub stats: Stats,
    pub blight: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MomentumGrade {
    A,
    B,
    C,
    D,
    F,
}

impl MomentumGrade {
    #[must_use]
    pub fn from_index(index: f64) -> Self {
        match index {
            i if i >= 10.0 => Self::A,
            i if i >= 5.0 => Self::B,
            i if i >= 1.0 => Self::C,
            i if i >= -3.0 => Self::D,
            _ => Self::F,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::A => "Booming",
            Self::B => "Thriving",
            Self::C => "Stable",
            Self::D => "Stalled",
            Self::F => "Declining",
        }
    }

    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::A => "Strong, sustained growth over recent rounds.",
            Self::B => "Steady gains with momentum to build on.",
            Self::C => "Holding steady; unblock the next catalyst.",
            Self::D => "Growth has stalled; clear the blockers.",
            Self::F => "Declining; address blight and missed missions.",
        }
    }
}

/// Short-window trend across the latest reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthMomentum {
    pub grade: MomentumGrade,
    pub label: String,
    pub message: String,
    pub window: usize,
    pub avg_gain: f64,
    pub volatility: f64,
    pub index: f64,
}

impl GrowthMomentum {
    /// Momentum over the last two history entries plus `current`.
    #[must_use]
    pub fn compute(history: &[Report], current: &Report) -> Self {
        let start = history.len().saturating_sub(MOMENTUM_WINDOW);
        let window: Vec<&Report> = history[start..].iter().chain([current]).collect();
        let count = usize_to_f64(window.len());
        let gains: Vec<f64> = window
            .iter()
            .map(|report| i64_to_f64(report.changes.population_units))
            .collect();
        let avg_gain = gains.iter().sum::<f64>() / count;
        let variance = gains
            .iter()
            .map(|gain| (gain - avg_gain).powi(2))
            .sum::<f64>()
            / count;
        let volatility = variance.sqrt();
        let blight: u32 = window.iter().map(|report| report.stats_after.blight).sum();
        let fails = window
            .iter()
            .filter(|report| !report.mission.primary_success)
            .count();
        let breaks = window
            .iter()
            .filter(|report| report.gating.limiting_factor.is_capacity_block())
            .count();
        let index = (avg_gain
            - f64::from(blight) * 2.0
            - usize_to_f64(fails) * 1.5
            - usize_to_f64(breaks)
            - volatility * 0.5)
            .clamp(-10.0, 20.0);
        let grade = MomentumGrade::from_index(index);
        Self {
            grade,
            label: grade.label().to_string(),
            message: grade.message().to_string(),
            window: window.len(),
            avg_gain,
            volatility,
            index,
        }
    }
}

/// Finale figures merged into the last report's meta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinaleMeta {
    pub prestige_score: i64,
    pub prestige_tier: PrestigeTier,
    pub prestige_mult: f64,
    pub boom_mult: f64,
    pub endgame_base: i64,
    pub endgame_bonus: i64,
    pub blight_penalty: f64,
    pub city_grade: CityGrade,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportMeta {
    pub roads_expanded: bool,
    /// Empty when no district pattern stood out.
    pub synergy_hint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub growth_momentum: Option<GrowthMomentum>,
    #[serde(flatten)]
    pub finale: Option<FinaleMeta>,
}

/// Everything one resolution did, in the order it happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub round_resolved: u32,
    pub suits: SuitCounts,
    pub mission: MissionFlags,
    pub planning_focus: FocusReport,
    pub missions: MissionsReport,
    pub assets_bonus: AssetBonuses,
    pub layout_bonus: LayoutBonuses,
    pub blight: u32,
    pub sector_points: SectorPoints,
    pub builds: Vec<BuildAction>,
    pub developed_summary: DevelopedSummary,
    pub gating: Gating,
    pub changes: Changes,
    pub stats_before: StatsBefore,
    pub stats_after: StatsAfter,
    pub meta: ReportMeta,
    #[serde(default)]
    pub board: BoardSnapshot,
    pub notes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_grade: Option<CityGrade>,
}

/// XxHash64 of the canonical JSON of a history, for replay comparisons.
#[must_use]
pub fn history_digest(history: &[Report]) -> u64 {
    let bytes = serde_json::to_vec(history).unwrap_or_default();
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(&bytes);
    hasher.finish()
}
