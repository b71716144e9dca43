//! Player-facing notes attached to a report.

use crate::endgame::EndgameOutcome;
use crate::grade::CityGrade;
use crate::layout::{AdjacencyEffects, RoadFactor};
use crate::numbers::{group_thousands, round_f64_to_i64};
use crate::report::{FocusReport, LimitingFactor};
use crate::sector::PlanningFocus;

use super::placement::{BuildAction, BuildActionKind};

pub(crate) const FOUNDING_NOTE: &str = "Founding settlement established.";
pub(crate) const MANUAL_FOCUS_NOTE: &str = "Manual placement applied.";
const FOCUS_UNAVAILABLE: &str = "Focused development unavailable; standard planning rules applied.";

/// What happened this round, as the gated notes need it.
pub(crate) struct RoundFacts<'a> {
    pub success: bool,
    pub gain: i64,
    pub limiter: LimitingFactor,
    pub decay: i64,
    pub grace_applied: bool,
    pub road: &'a RoadFactor,
    pub actions: &'a [BuildAction],
    pub adjacency: &'a AdjacencyEffects,
    pub focus: &'a FocusReport,
    pub pressure_delta: i64,
    pub pressure_applied: i64,
}

pub(crate) fn gated_notes(facts: &RoundFacts<'_>) -> Vec<String> {
    let mut notes = Vec::new();
    if !facts.success {
        notes.push("Primary effort failed: no population growth this round.".to_string());
    }
    if facts.gain > 0 && facts.limiter != LimitingFactor::Balanced {
        notes.push(format!("Growth limited by {}.", facts.limiter));
    }
    if facts.decay > 0 {
        notes.push("Unaddressed blight caused residents to leave.".to_string());
    }
    if facts.grace_applied {
        notes.push("Balanced planning smoothed a small mismatch (+1 growth).".to_string());
    }
    if facts.road.factor < 1.0 {
        notes.push(format!(
            "Limited road access reduced growth (connected {}/{}, factor x{:.2}).",
            facts.road.connected, facts.road.developed, facts.road.factor
        ));
    }
    if facts.gain == 0 && facts.success {
        notes.push("No growth after civic constraints.".to_string());
    }
    if facts
        .actions
        .iter()
        .any(|action| action.action == BuildActionKind::Skip)
    {
        notes.push("Some builds were skipped (no road-adjacent tiles).".to_string());
    }
    if !facts.adjacency.is_neutral() {
        notes.push(format!(
            "Adjacency effects: attraction {:+}, pressure {:+}",
            facts.adjacency.attraction_delta, facts.adjacency.pressure_delta
        ));
    }
    if facts.focus.selection != PlanningFocus::Auto {
        if facts.focus.applied {
            notes.push(facts.focus.note.clone());
        } else {
            notes.push(FOCUS_UNAVAILABLE.to_string());
        }
    }
    if facts.pressure_delta > 0 {
        notes.push(format!(
            "Unmet demand carried forward: +{}.",
            facts.pressure_delta
        ));
    }
    if facts.pressure_applied > 0 {
        notes.push(format!(
            "Stored demand converted into growth: +{}.",
            facts.pressure_applied
        ));
    }
    notes
}

/// Inputs to the final-round recap.
pub(crate) struct RecapFacts<'a> {
    pub gain: i64,
    pub adjacency_attraction: i64,
    pub policy_growth_delta: i64,
    pub limiter: LimitingFactor,
    pub success: bool,
    pub blight_after: u32,
    pub grade: &'a CityGrade,
    pub endgame: &'a EndgameOutcome,
}

const fn prestige_label(score: i64) -> &'static str {
    if score < 40 {
        "Struggling"
    } else if score < 60 {
        "Stable"
    } else if score < 80 {
        "Respected"
    } else {
        "Legendary"
    }
}

fn problem(facts: &RecapFacts<'_>) -> Option<&'static str> {
    match facts.limiter {
        LimitingFactor::Services => Some("Needs services (Clinics/Parks)."),
        LimitingFactor::Jobs => Some("Needs jobs (Markets/commerce)."),
        LimitingFactor::Potential => Some("No room to grow (space/roads)."),
        LimitingFactor::Balanced if !facts.success => Some("Missed mission rewards."),
        LimitingFactor::Balanced => None,
    }
}

fn next_focus(facts: &RecapFacts<'_>) -> &'static str {
    if facts.blight_after > 0 {
        return "Clear blight (take the blight-removal mission).";
    }
    match facts.limiter {
        LimitingFactor::Services => "Win INF/CIV tricks to earn Clinics/Parks.",
        LimitingFactor::Jobs => "Win COM tricks to earn Markets (jobs).",
        LimitingFactor::Potential => "Prioritize Road Expansion / placement to unlock space.",
        LimitingFactor::Balanced if !facts.success => {
            "Play safer: secure the Primary mission first."
        }
        LimitingFactor::Balanced => "Chase optional missions for assets and stacking opportunities.",
    }
}

/// Notes that replace the round notes once the campaign is over.
pub(crate) fn recap_notes(facts: &RecapFacts<'_>) -> Vec<String> {
    let grade = facts.grade;
    let endgame = facts.endgame;
    let mut notes = vec![
        format!("Your city grew by +{} population.", facts.gain),
        format!("District growth: +{}", facts.gain),
        format!("Smart placement: +{}", facts.adjacency_attraction),
        format!("City policy effects: +{}", facts.policy_growth_delta),
        format!("Final City Grade: {} ({})", grade.grade, grade.title),
    ];
    if !grade.summary.is_empty() {
        notes.push(grade.summary.clone());
    }
    if let Some(problem) = problem(facts) {
        notes.push(format!("Problems holding you back: {problem}"));
    }
    notes.push(format!("Next round focus: {}", next_focus(facts)));
    let blight_drag = round_f64_to_i64(endgame.blight_penalty * 100.0);
    notes.push(format!(
        "Finale payoff: +{} (Prestige: {}, Boom: x{}, Blight drag: {blight_drag}%)",
        group_thousands(endgame.endgame_bonus),
        prestige_label(endgame.prestige_score),
        endgame.boom_mult,
    ));
    if endgame.prestige_score < 60 {
        notes.push("Complete more primary missions and build cohesive districts.".to_string());
    }
    if blight_drag > 0 {
        notes.push("Clear blight to protect your finale payoff.".to_string());
    }
    if (endgame.boom_mult - 1.0).abs() < f64::EPSILON {
        notes.push("Higher prestige unlocks a boom chance in the finale.".to_string());
    }
    notes
}
