//! Round resolution: one pure step from campaign state and table input to
//! the next state, a report and telemetry.
//!
//! The resolver never fails. Malformed requests become skipped build actions
//! and notes; the input state is never mutated.

pub mod capacity;
pub mod input;
pub mod notes;
pub mod placement;

use crate::balance::Balance;
use crate::census::{CensusOptions, census_estimate_with};
use crate::constants::{BASE_ACTION_BUDGET, MAX_BLIGHT, MAX_PRESSURE};
use crate::endgame::compute_endgame_bonus_with;
use crate::grade::compute_final_city_grade_with;
use crate::layout::{
    adjacency_effects, compute_asset_bonuses, compute_layout_bonuses, compute_road_factor,
    developed_for_city, synergy_hint,
};
use crate::missions::{DraftOptions, Mission, MissionCatalog, MissionSet, generate_missions_from};
use crate::numbers::{floor_f64_to_i64, i64_to_f64};
use crate::report::{
    Changes, FinaleMeta, FocusReport, Gating, GrowthMomentum, MissionFlags, MissionsReport, Report,
    ReportMeta, ResolvedMission, SectorPoints, StatsAfter, StatsBefore,
};
use crate::rewards::{RewardResult, apply_reward};
use crate::rng::Mulberry32;
use crate::sector::AssetKind;
use crate::state::{CampaignState, CapacityBonus};
use crate::telemetry::{AdjacencySources, RoundTelemetry};

pub use capacity::{
    Capacities, CapacityChannel, CapacitySources, DormantHousing, Limit, PressureSettlement,
    apply_capacity_buffer, compute_capacities, compute_limiting, policy_growth_delta,
    potential_residents, settle_dormant_housing, settle_pressure,
};
pub use input::{AssetPlacement, DevOverrides, Placement, RoundInput, SuitCounts};
pub use placement::{
    BuildAction, BuildActionKind, apply_asset_placements, apply_placements, max_level_for_round,
};

use notes::{FOUNDING_NOTE, MANUAL_FOCUS_NOTE, RecapFacts, RoundFacts, gated_notes, recap_notes};

#[cfg(debug_assertions)]
fn debug_log_enabled() -> bool {
    matches!(std::env::var(crate::constants::DEBUG_ENV_VAR), Ok(val) if val != "0")
}

#[cfg(not(debug_assertions))]
const fn debug_log_enabled() -> bool {
    false
}

/// Everything one resolution produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundResolution {
    pub next_state: CampaignState,
    pub report: Report,
    pub telemetry: RoundTelemetry,
}

/// Resolve a round with the locked balance and the bundled mission catalog.
#[must_use]
pub fn resolve_round(state: &CampaignState, input: &RoundInput) -> RoundResolution {
    resolve_round_with(
        state,
        input,
        Balance::default_ref(),
        MissionCatalog::default_catalog(),
    )
}

/// Missions the round is played against: the table's set when it was drafted
/// for this round, then the state's cached set, otherwise a fresh draft.
fn round_missions(
    state: &CampaignState,
    input: &RoundInput,
    catalog: &MissionCatalog,
) -> MissionSet {
    input
        .missions
        .as_ref()
        .filter(|set| set.round == state.round)
        .or_else(|| {
            state
                .current_missions
                .as_ref()
                .filter(|set| set.round == state.round)
        })
        .cloned()
        .unwrap_or_else(|| {
            generate_missions_from(
                catalog,
                state.seed,
                state.round,
                &state.players,
                &DraftOptions::for_state(state),
            )
        })
}

/// Grant rewards in draft order: the primary first, then each optional whose
/// toggle is set. Nothing is granted when the primary failed.
fn grant_rewards(
    state: &mut CampaignState,
    missions: &MissionSet,
    flags: &MissionFlags,
    balance: &Balance,
) -> (MissionsReport, Vec<String>) {
    let blocked = !flags.primary_success;
    let mut earned = Vec::new();
    let mut reward_notes = Vec::new();
    let mut settle = |state: &mut CampaignState, mission: &Mission, success: bool| {
        let reward_result = (!blocked && success).then(|| {
            let result: RewardResult = apply_reward(state, mission.reward.as_ref(), balance);
            if let Some(id) = &result.reward_id {
                earned.push(id.clone());
            }
            reward_notes.push(result.note.clone());
            result
        });
        ResolvedMission {
            mission: mission.with_outcome(success),
            reward_result,
        }
    };

    let primary = missions
        .primary
        .as_ref()
        .map(|mission| settle(state, mission, flags.primary_success));
    let optional = missions
        .optional
        .iter()
        .enumerate()
        .map(|(idx, mission)| {
            let success = flags.optional_successes.get(idx).copied().unwrap_or(false);
            settle(state, mission, success)
        })
        .collect();

    let report = MissionsReport {
        round: missions.round,
        primary,
        optional,
        reward_notes,
        rewards_blocked: blocked,
    };
    (report, earned)
}

/// Resolve a round against an explicit balance and catalog.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn resolve_round_with(
    state: &CampaignState,
    input: &RoundInput,
    balance: &Balance,
    catalog: &MissionCatalog,
) -> RoundResolution {
    let mut next = state.clone();
    next.prune_expired_policies();
    let mut rng = Mulberry32::for_round(state.seed, state.round);

    let suits = input.suits.normalized();
    let flags = MissionFlags {
        primary_success: input.primary_mission_success,
        optional_successes: input.optional_successes.clone(),
    };
    let success = flags.primary_success;
    let dev = input.dev;
    let census_options = |blight: u32| CensusOptions {
        blight,
        census_multiplier: dev.census_multiplier,
    };
    let census_before = census_estimate_with(
        balance,
        state.seed,
        state.round,
        state.stats.population_units,
        census_options(state.city.blight),
    );

    let missions = round_missions(state, input, catalog);

    if input.road_expansion_complete {
        next.city.highways_unlocked = true;
        next.city.roads_expanded = true;
    } else if next.city.highways_unlocked {
        next.city.roads_expanded = true;
    }

    let action_bonus = std::mem::take(&mut next.bonuses.next_round.action_bonus);
    let level_cap = dev
        .max_tile_level
        .unwrap_or_else(|| max_level_for_round(state.round));
    let mut builds = apply_placements(
        &mut next.board,
        &next.roads,
        &input.placements,
        next.city.roads_expanded,
        level_cap,
    );
    let placed_any = !builds.is_empty();
    let asset_actions =
        apply_asset_placements(&mut next.board, &mut next.unplaced_assets, &input.asset_placements);
    let placed_types: Vec<AssetKind> = asset_actions
        .iter()
        .filter(|action| action.action == BuildActionKind::Asset)
        .filter_map(|action| action.asset.as_deref().and_then(AssetKind::parse))
        .collect();
    builds.extend(asset_actions);

    let focus = FocusReport {
        selection: input.planning_focus,
        label: input.planning_focus.label().to_string(),
        applied: placed_any,
        note: MANUAL_FOCUS_NOTE.to_string(),
        action_budget: BASE_ACTION_BUDGET + action_bonus,
    };

    let (missions_report, rewards_earned) = grant_rewards(&mut next, &missions, &flags, balance);

    let developed = developed_for_city(&next.board, &next.roads, &next.city);
    let road_only = !next.city.roads_expanded;
    let assets_bonus = compute_asset_bonuses(&next.board, &next.roads, next.city.highways_unlocked);
    let layout_bonus = compute_layout_bonuses(&next.board, &next.roads, road_only);

    let capacity_bonus = std::mem::take(&mut next.bonuses.next_round.capacity_bonus);
    let capacity_buffer = std::mem::take(&mut next.bonuses.next_round.capacity_buffer);
    let raw = compute_capacities(
        &CapacitySources {
            suits: &suits,
            developed: &developed,
            assets: &assets_bonus,
            layout: &layout_bonus,
            bonus: &capacity_bonus,
            population_units: next.stats.population_units,
        },
        balance,
    );
    let (capacities, _) = apply_capacity_buffer(raw, capacity_buffer);
    let potential = potential_residents(capacities.residents, &layout_bonus, balance);
    let limit = compute_limiting(potential, capacities.jobs, capacities.services);

    let road = compute_road_factor(
        &next.board,
        &next.roads,
        assets_bonus.road_boost,
        dev.road_adjacency_bonus.unwrap_or(0.0),
    );
    let connectivity = i64::from(next.city.highways_unlocked && developed.any_positive());
    let growth_attempted = limit.value + connectivity;
    let growth_base =
        (i64_to_f64(growth_attempted) * dev.growth_multiplier.unwrap_or(1.0)).max(0.0);
    let growth_after_roads = floor_f64_to_i64(growth_base * road.factor);
    let growth_after_gate = if success {
        growth_after_roads
    } else {
        floor_f64_to_i64(i64_to_f64(growth_after_roads) * balance.salvage_on_primary_fail)
    };

    let blight = if success {
        next.city.blight.saturating_sub(1)
    } else {
        (next.city.blight + 1).min(MAX_BLIGHT)
    };
    next.city.blight = blight;

    let policy_delta = policy_growth_delta(
        growth_after_gate,
        next.bonuses.active_policies.len(),
        balance,
    );
    let mut gain = growth_after_gate + policy_delta.max(0);
    gain = (gain - i64::from(blight)).max(0);
    let founding = state.round == 1 && success && suits.total() > 0 && gain == 0;
    if founding {
        gain = 1;
    }

    let pressure_before = next.stats.pressure;
    let settled = settle_pressure(
        pressure_before,
        success,
        limit.factor,
        potential,
        gain,
        growth_after_roads,
    );
    gain = settled.gain;
    let pressure_delta = settled.pressure - pressure_before;

    next.stats.population_units += gain;
    let decay_rate = dev
        .blight_decay_rate
        .unwrap_or(balance.blight.decay_rate);
    let decay = if blight > 0 {
        floor_f64_to_i64(
            i64_to_f64(next.stats.population_units) * f64::from(blight) * decay_rate,
        )
        .max(0)
    } else {
        0
    };
    next.stats.population_units = (next.stats.population_units - decay).max(0);

    let attraction_gain = i64::try_from(flags.optional_completed()).unwrap_or(i64::MAX);
    next.stats.attraction += attraction_gain;
    let adjacency = adjacency_effects(&next.board);
    next.stats.attraction += adjacency.attraction_delta;
    next.stats.pressure =
        (settled.pressure + adjacency.pressure_delta).clamp(0, MAX_PRESSURE);

    let dormant_before = next.stats.dormant_housing;
    let housing = settle_dormant_housing(dormant_before, gain, potential);
    next.stats.dormant_housing = housing.dormant;

    next.round = (state.round + 1).min(state.rounds);
    let census_after = census_estimate_with(
        balance,
        next.seed,
        next.round,
        next.stats.population_units,
        census_options(blight),
    );
    next.stats.census = census_after;

    let mut notes: Vec<String> = Vec::new();
    if founding {
        notes.push(FOUNDING_NOTE.to_string());
    }
    notes.extend(input.placement_notes.iter().cloned());
    notes.extend(gated_notes(&RoundFacts {
        success,
        gain,
        limiter: limit.factor,
        decay,
        grace_applied: limit.grace_applied,
        road: &road,
        actions: &builds,
        adjacency: &adjacency,
        focus: &focus,
        pressure_delta,
        pressure_applied: settled.applied,
    }));

    let sector_points = SectorPoints {
        residential: suits.hearts,
        commerce: suits.diamonds,
        civic: suits.spades,
        infrastructure: suits.clubs,
    };

    let mut report = Report {
        round_resolved: state.round,
        suits,
        mission: flags,
        planning_focus: focus,
        missions: missions_report,
        assets_bonus,
        layout_bonus,
        blight,
        sector_points,
        builds,
        developed_summary: developed,
        gating: Gating {
            potential_residents: potential,
            jobs_capacity: capacities.jobs,
            services_capacity: capacities.services,
            limiting_factor: limit.factor,
            grace_applied: limit.grace_applied,
            growth_base,
            road_factor: road.factor,
            road_connected: road.connected,
            road_developed: road.developed,
            growth_after_roads,
        },
        changes: Changes {
            population_units: gain,
            population_decay: decay,
            attraction: attraction_gain,
            adjacency_attraction: adjacency.attraction_delta,
            adjacency_pressure: adjacency.pressure_delta,
            pressure_delta,
            pressure_applied: settled.applied,
            dormant_housing_delta: housing.dormant - dormant_before,
            dormant_housing_added: housing.vacant,
            dormant_housing_filled: housing.filled,
            policy_growth_delta: policy_delta,
        },
        stats_before: StatsBefore {
            census: census_before,
            blight: state.city.blight,
        },
        stats_after: StatsAfter {
            stats: next.stats.clone(),
            blight,
        },
        meta: ReportMeta {
            roads_expanded: next.city.roads_expanded,
            synergy_hint: synergy_hint(&next.board).unwrap_or_default().to_string(),
            growth_momentum: None,
            finale: None,
        },
        board: next.board.snapshot(),
        notes,
        final_grade: None,
    };
    report.meta.growth_momentum = Some(GrowthMomentum::compute(&state.history, &report));

    next.history.push(report.clone());
    next.current_missions = None;

    if state.round == state.rounds {
        let endgame = compute_endgame_bonus_with(balance, &next, census_after, &mut rng);
        let grade = compute_final_city_grade_with(balance, &next, &report, &endgame);
        report.notes = recap_notes(&RecapFacts {
            gain,
            adjacency_attraction: adjacency.attraction_delta,
            policy_growth_delta: policy_delta,
            limiter: limit.factor,
            success,
            blight_after: blight,
            grade: &grade,
            endgame: &endgame,
        });
        report.meta.finale = Some(FinaleMeta {
            prestige_score: endgame.prestige_score,
            prestige_tier: endgame.prestige_tier,
            prestige_mult: endgame.prestige_mult,
            boom_mult: endgame.boom_mult,
            endgame_base: endgame.endgame_base,
            endgame_bonus: endgame.endgame_bonus,
            blight_penalty: endgame.blight_penalty,
            city_grade: grade.clone(),
        });
        report.stats_after.stats.census = endgame.final_census;
        report.final_grade = Some(grade);
        next.stats.census = endgame.final_census;
        if let Some(last) = next.history.last_mut() {
            *last = report.clone();
        }
    }

    let telemetry = RoundTelemetry {
        round: state.round,
        primary_success: success,
        optional_completed: report.mission.optional_completed(),
        suit_totals: suits,
        growth_attempted,
        growth_after_suit_points: suits.hearts,
        growth_after_board_bonuses: potential,
        growth_after_gates: growth_after_roads,
        growth_after_mission_gate: growth_after_gate,
        growth_applied: gain,
        limiter: limit.factor,
        jobs_cap: capacities.jobs,
        services_cap: capacities.services,
        housing_cap: potential,
        assets_placed_this_round: placed_types.len(),
        assets_placed_types: placed_types,
        total_assets: next.board.asset_count(),
        max_stack_height: next.board.max_stack_height(),
        adjacency_bonus_this_round: assets_bonus.capacity_total() + layout_bonus.total(),
        adjacency_bonus_by_source: AdjacencySources {
            assets: assets_bonus.capacity_total(),
            layout: layout_bonus.total(),
            road: assets_bonus.road_boost,
            policies: 0,
        },
        blight_level: blight,
        stack_sum_after: report.board.stack_sum,
        population_units_after: next.stats.population_units,
        census_after: next.stats.census,
        policy_growth_delta: policy_delta,
        rewards_earned,
    };

    if debug_log_enabled() {
        log::debug!(
            "[resolve] round {} success={} limit={} ({}) roads x{:.2} gain {} decay {} blight {} pressure {} census {}",
            state.round,
            success,
            limit.value,
            limit.factor,
            road.factor,
            gain,
            decay,
            blight,
            next.stats.pressure,
            next.stats.census
        );
        if capacity_bonus != CapacityBonus::default() || capacity_buffer > 0 {
            log::debug!(
                "[resolve] consumed capacity bonus {capacity_bonus:?} buffer {capacity_buffer}"
            );
        }
    }

    RoundResolution {
        next_state: next,
        report,
        telemetry,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Asset, Roads};
    use crate::report::LimitingFactor;
    use crate::sector::{PlanningFocus, SectorCode};
    use crate::state::{PlayersInput, new_campaign};

    fn campaign(seed: u32) -> CampaignState {
        new_campaign(seed, &PlayersInput::default())
    }

    fn road_cell(roads: &Roads) -> (usize, usize) {
        (0, roads.variant.vertical_col)
    }

    fn solid_round() -> RoundInput {
        RoundInput::new(SuitCounts::new(3, 3, 4, 3), true)
    }

    #[test]
    fn resolution_leaves_input_state_untouched() {
        let state = campaign(42);
        let snapshot = state.clone();
        let resolution = resolve_round(&state, &solid_round());
        assert_eq!(state, snapshot);
        assert_eq!(resolution.next_state.round, 2);
        assert_eq!(resolution.next_state.history.len(), 1);
        assert_eq!(resolution.report.round_resolved, 1);
        assert!(resolution.next_state.current_missions.is_none());
    }

    #[test]
    fn same_inputs_same_outcome() {
        let state = campaign(7);
        let a = resolve_round(&state, &solid_round());
        let b = resolve_round(&state, &solid_round());
        assert_eq!(a, b);
    }

    #[test]
    fn failed_primary_blocks_rewards_and_adds_blight() {
        let state = campaign(11);
        let input = RoundInput::new(SuitCounts::new(3, 3, 4, 3), false).with_optionals(&[true, true]);
        let resolution = resolve_round(&state, &input);
        let report = &resolution.report;
        assert!(report.missions.rewards_blocked);
        assert!(report.missions.reward_notes.is_empty());
        assert_eq!(resolution.next_state.city.blight, 1);
        assert_eq!(report.stats_after.blight, 1);
        assert_eq!(
            report.notes.first().map(String::as_str),
            Some("Primary effort failed: no population growth this round.")
        );
        assert!(resolution.telemetry.rewards_earned.is_empty());
        let salvage = floor_f64_to_i64(i64_to_f64(report.gating.growth_after_roads) * 0.35);
        assert_eq!(resolution.telemetry.growth_after_mission_gate, salvage);
    }

    #[test]
    fn founding_round_always_grows() {
        let state = campaign(3);
        let input = RoundInput::new(SuitCounts::new(0, 0, 0, 1), true);
        let resolution = resolve_round(&state, &input);
        assert!(resolution.report.changes.population_units >= 1);
        assert!(resolution.next_state.stats.population_units >= 1);
    }

    #[test]
    fn zero_tricks_get_no_founding_boost() {
        let state = campaign(3);
        let input = RoundInput::new(SuitCounts::default(), true);
        let resolution = resolve_round(&state, &input);
        assert!(
            !resolution
                .report
                .notes
                .contains(&"Founding settlement established.".to_string())
        );
    }

    #[test]
    fn manual_build_lands_on_board() {
        let state = campaign(42);
        let (row, col) = road_cell(&state.roads);
        let input = solid_round()
            .with_placements(vec![Placement::new(row, col, SectorCode::Residential)])
            .with_focus(PlanningFocus::Residential);
        let resolution = resolve_round(&state, &input);
        let cell = resolution.next_state.board.get(row, col);
        assert_eq!(cell.and_then(|cell| cell.sector), Some(SectorCode::Residential));
        assert_eq!(resolution.report.builds[0].action, BuildActionKind::Build);
        assert!(resolution.report.planning_focus.applied);
        assert!(
            resolution
                .report
                .notes
                .contains(&"Manual placement applied.".to_string())
        );
        assert_eq!(resolution.report.board.developed_tiles, 1);
    }

    #[test]
    fn action_bonus_is_consumed_into_budget() {
        let mut state = campaign(42);
        state.bonuses.next_round.action_bonus = 1;
        let resolution = resolve_round(&state, &solid_round());
        assert_eq!(resolution.report.planning_focus.action_budget, 3);
        assert_eq!(resolution.next_state.bonuses.next_round.action_bonus, 0);
    }

    #[test]
    fn capacity_bonus_is_one_shot() {
        let mut state = campaign(42);
        state.bonuses.next_round.capacity_bonus.jobs = 4;
        state.bonuses.next_round.capacity_buffer = 2;
        let resolution = resolve_round(&state, &solid_round());
        let next_round = &resolution.next_state.bonuses.next_round;
        assert_eq!(next_round.capacity_bonus, CapacityBonus::default());
        assert_eq!(next_round.capacity_buffer, 0);
    }

    #[test]
    fn road_expansion_unlocks_both_flags() {
        let state = campaign(42);
        let mut input = solid_round();
        input.road_expansion_complete = true;
        let resolution = resolve_round(&state, &input);
        assert!(resolution.next_state.city.highways_unlocked);
        assert!(resolution.next_state.city.roads_expanded);
        assert!(resolution.report.meta.roads_expanded);
    }

    #[test]
    fn highway_reward_round_runs_at_half_weight() {
        let mut state = campaign(42);
        let (row, col) = road_cell(&state.roads);
        if let Some(cell) = state.board.get_mut(row, col) {
            cell.sector = Some(SectorCode::Civic);
            cell.level = 3;
        }
        let locked = resolve_round(&state, &solid_round());
        assert_eq!(locked.report.developed_summary.civic, 3);

        let mut input = solid_round();
        input.missions = Some(MissionSet {
            round: state.round,
            primary: MissionCatalog::default_catalog().highway.first().cloned(),
            optional: Vec::new(),
        });
        let unlocked = resolve_round(&state, &input);
        assert!(unlocked.next_state.city.highways_unlocked);
        assert!(!unlocked.next_state.city.roads_expanded);
        assert_eq!(unlocked.report.developed_summary.civic, 1);

        let after = resolve_round(&unlocked.next_state, &solid_round());
        assert!(after.next_state.city.roads_expanded);
        assert_eq!(after.report.developed_summary.civic, 3);
    }

    #[test]
    fn census_multiplier_comes_from_dev_overrides_only() {
        let plain = campaign(42);
        let mut queued = plain.clone();
        queued.bonuses.next_round.census_multiplier = Some(10.0);
        let base = resolve_round(&plain, &solid_round());
        let ignored = resolve_round(&queued, &solid_round());
        assert_eq!(base.next_state.stats.census, ignored.next_state.stats.census);

        let mut boosted = solid_round();
        boosted.dev.census_multiplier = Some(2.0);
        let doubled = resolve_round(&plain, &boosted);
        assert!(doubled.next_state.stats.census > base.next_state.stats.census);
    }

    #[test]
    fn pressure_and_dormant_housing_stay_in_bounds() {
        let mut state = campaign(9);
        state.stats.pressure = 5;
        state.stats.dormant_housing = 4;
        for suits in [SuitCounts::new(0, 0, 13, 0), SuitCounts::new(6, 6, 1, 0)] {
            let resolution = resolve_round(&state, &RoundInput::new(suits, true));
            let stats = &resolution.next_state.stats;
            assert!((0..=MAX_PRESSURE).contains(&stats.pressure));
            assert!(stats.dormant_housing >= 0);
            assert!(resolution.report.gating.services_capacity >= 0);
        }
    }

    #[test]
    fn placed_assets_leave_the_queue() {
        let mut state = campaign(42);
        state.unplaced_assets = vec![AssetKind::Park];
        // A missed primary keeps any ASSET reward from refilling the queue.
        let input = RoundInput::new(SuitCounts::new(3, 3, 4, 3), false)
            .with_asset_placements(vec![AssetPlacement::new(2, 2, AssetKind::Park)]);
        let resolution = resolve_round(&state, &input);
        assert!(resolution.report.missions.rewards_blocked);
        assert!(resolution.next_state.unplaced_assets.is_empty());
        assert_eq!(
            resolution.next_state.board.get(2, 2).and_then(|cell| cell.asset),
            Some(Asset {
                kind: AssetKind::Park
            })
        );
        assert_eq!(resolution.telemetry.assets_placed_types, vec![AssetKind::Park]);
        // An asset placement alone does not count as focused development.
        assert!(!resolution.report.planning_focus.applied);
    }

    #[test]
    fn final_round_replaces_notes_with_recap() {
        let mut state = campaign(42);
        state.round = state.rounds;
        let resolution = resolve_round(&state, &solid_round());
        let report = &resolution.report;
        assert_eq!(resolution.next_state.round, state.rounds);
        assert!(report.final_grade.is_some());
        let finale = report.meta.finale.as_ref();
        assert!(finale.is_some());
        assert!(report.notes[0].starts_with("Your city grew by +"));
        assert!(report.notes.iter().any(|note| note.starts_with("Finale payoff: +")));
        let final_census = resolution.next_state.stats.census;
        assert_eq!(report.stats_after.stats.census, final_census);
        assert!(final_census >= 40_000);
        assert_eq!(resolution.next_state.history.last(), Some(report));
    }

    #[test]
    fn cached_missions_are_reused_for_the_round() {
        let mut state = campaign(42);
        let drafted = crate::missions::missions_for_round(&state);
        state.current_missions = Some(drafted.clone());
        let resolution = resolve_round(&state, &solid_round());
        let offered: Vec<String> = resolution.report.missions.offered_ids().collect();
        let expected: Vec<String> = drafted.ids().map(str::to_string).collect();
        assert_eq!(offered, expected);
    }

    #[test]
    fn limiter_reported_consistently() {
        let state = campaign(5);
        let resolution = resolve_round(&state, &solid_round());
        let gating = &resolution.report.gating;
        let limit = compute_limiting(
            gating.potential_residents,
            gating.jobs_capacity,
            gating.services_capacity,
        );
        assert_eq!(limit.factor, gating.limiting_factor);
        assert_eq!(resolution.telemetry.limiter, gating.limiting_factor);
        if gating.limiting_factor == LimitingFactor::Balanced {
            assert!(gating.grace_applied);
        }
    }
}
