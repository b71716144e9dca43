//! Growth gate arithmetic: capacities, the limiting factor, policy uplift,
//! banked pressure and dormant housing.

use crate::balance::Balance;
use crate::constants::{MAX_PRESSURE, POLICY_FLAT_CAP};
use crate::layout::{AssetBonuses, DevelopedSummary, LayoutBonuses};
use crate::numbers::{floor_f64_to_i64, i64_to_f64, usize_to_f64, usize_to_i64};
use crate::report::LimitingFactor;
use crate::state::CapacityBonus;

use super::input::SuitCounts;

/// Raw capacities before the buffer and the residents' layout bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capacities {
    pub residents: i64,
    pub jobs: i64,
    pub services: i64,
}

/// Channel that received a capacity buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityChannel {
    Residents,
    Jobs,
    Services,
}

/// Board and hand contributions feeding the capacity formulas.
#[derive(Debug, Clone, Copy)]
pub struct CapacitySources<'a> {
    pub suits: &'a SuitCounts,
    pub developed: &'a DevelopedSummary,
    pub assets: &'a AssetBonuses,
    pub layout: &'a LayoutBonuses,
    pub bonus: &'a CapacityBonus,
    pub population_units: i64,
}

#[must_use]
pub fn compute_capacities(sources: &CapacitySources<'_>, balance: &Balance) -> Capacities {
    let CapacitySources {
        suits,
        developed,
        assets,
        layout,
        bonus,
        population_units,
    } = *sources;

    let residents =
        suits.hearts + developed.residential + assets.residents + layout.residents + bonus.residents;

    let jobs_balance = &balance.jobs;
    let jobs_supply = i64_to_f64(suits.diamonds + developed.commerce) * jobs_balance.tile_mult
        + i64_to_f64(assets.market_count) * jobs_balance.market_asset
        + i64_to_f64(assets.transit_count) * jobs_balance.transit_asset
        + i64_to_f64(layout.jobs + bonus.jobs);
    let jobs = floor_f64_to_i64(jobs_supply / jobs_balance.requirement_rate);

    let services_balance = &balance.services;
    let weights = &services_balance.weights;
    let services_supply = i64_to_f64(suits.clubs + developed.infrastructure) * weights.infrastructure
        + i64_to_f64(suits.spades + developed.civic) * weights.civic
        + i64_to_f64(assets.services + layout.services + bonus.services)
        + i64_to_f64(assets.clinic_count) * weights.clinic
        + i64_to_f64(assets.park_count) * weights.park;
    let upkeep = floor_f64_to_i64(i64_to_f64(population_units) * services_balance.upkeep_per_pop);
    let services = (floor_f64_to_i64(services_supply / services_balance.resident_requirement_rate)
        - upkeep)
        .max(0);

    Capacities {
        residents,
        jobs,
        services,
    }
}

/// Add a flat buffer to the smallest capacity, ties going to residents
/// then jobs.
#[must_use]
pub fn apply_capacity_buffer(
    capacities: Capacities,
    buffer: i64,
) -> (Capacities, Option<CapacityChannel>) {
    if buffer <= 0 {
        return (capacities, None);
    }
    let Capacities {
        residents,
        jobs,
        services,
    } = capacities;
    let mut buffered = capacities;
    let channel = if residents <= jobs && residents <= services {
        buffered.residents += buffer;
        CapacityChannel::Residents
    } else if jobs <= services {
        buffered.jobs += buffer;
        CapacityChannel::Jobs
    } else {
        buffered.services += buffer;
        CapacityChannel::Services
    };
    (buffered, Some(channel))
}

/// Residents the board can take this round.
#[must_use]
pub fn potential_residents(residents: i64, layout: &LayoutBonuses, balance: &Balance) -> i64 {
    let potential = &balance.potential;
    residents
        + floor_f64_to_i64(i64_to_f64(layout.residents) * potential.adj_bonus_factor)
        + potential.flat_bonus
}

/// The growth limit and what set it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    pub value: i64,
    pub factor: LimitingFactor,
    pub grace_applied: bool,
}

/// Smallest of the three capacities; when the runner-up is exactly one
/// higher the larger value is used and no single factor is blamed.
#[must_use]
pub fn compute_limiting(potential: i64, jobs: i64, services: i64) -> Limit {
    let mut ranked = [
        (potential, LimitingFactor::Potential),
        (jobs, LimitingFactor::Jobs),
        (services, LimitingFactor::Services),
    ];
    ranked.sort_by_key(|(value, _)| *value);
    let (smallest, factor) = ranked[0];
    let (second, _) = ranked[1];
    if second - smallest == 1 {
        Limit {
            value: second,
            factor: LimitingFactor::Balanced,
            grace_applied: true,
        }
    } else {
        Limit {
            value: smallest,
            factor,
            grace_applied: false,
        }
    }
}

/// Growth added by active policies: a capped multiplier plus a flat bump.
#[must_use]
pub fn policy_growth_delta(growth: i64, active_policies: usize, balance: &Balance) -> i64 {
    let policies = &balance.policies;
    let counted = policies.counted(active_policies);
    if counted == 0 {
        return 0;
    }
    let multiplier =
        1.0 + policies.cap_growth_bonus.min(policies.per_policy_growth_bonus * usize_to_f64(counted));
    let flat = usize_to_i64(counted).min(POLICY_FLAT_CAP);
    let delta = floor_f64_to_i64(i64_to_f64(growth) * multiplier) - growth + flat;

    #[cfg(debug_assertions)]
    {
        let ceiling = floor_f64_to_i64(i64_to_f64(growth) * policies.cap_growth_bonus) + flat + 1;
        if delta > ceiling {
            log::warn!("[BalanceGuard] policy uplift {delta} exceeds {ceiling} on growth {growth}");
        }
    }

    delta
}

/// Banked demand after this round's growth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PressureSettlement {
    pub pressure: i64,
    /// Banked demand released into growth.
    pub applied: i64,
    pub gain: i64,
}

/// Decay pressure by one, then bank unmet demand when jobs or services
/// blocked a successful round, or release banked demand into growth otherwise.
#[must_use]
pub fn settle_pressure(
    before: i64,
    success: bool,
    limiter: LimitingFactor,
    potential: i64,
    gain: i64,
    growth_after_roads: i64,
) -> PressureSettlement {
    let mut pressure = (before - 1).max(0);
    let mut applied = 0;
    let mut gain = gain;
    if success {
        if limiter.is_capacity_block() {
            pressure = (pressure + (potential - gain).max(0)).min(MAX_PRESSURE);
        } else {
            let room = if gain > 0 { gain } else { growth_after_roads };
            applied = pressure.min(room).max(0);
            gain += applied;
            pressure -= applied;
        }
    }
    PressureSettlement {
        pressure,
        applied,
        gain,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DormantHousing {
    pub filled: i64,
    pub vacant: i64,
    pub dormant: i64,
}

/// Vacant residential capacity carried into the next round.
#[must_use]
pub fn settle_dormant_housing(previous: i64, gain: i64, potential: i64) -> DormantHousing {
    let filled = previous.min(gain).max(0);
    let vacant = (potential - gain).max(0);
    DormantHousing {
        filled,
        vacant,
        dormant: (previous - filled + vacant).max(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capacities(residents: i64, jobs: i64, services: i64) -> Capacities {
        Capacities {
            residents,
            jobs,
            services,
        }
    }

    #[test]
    fn capacities_follow_hand_and_board() {
        let suits = SuitCounts::new(2, 3, 4, 4);
        let developed = DevelopedSummary::default();
        let sources = CapacitySources {
            suits: &suits,
            developed: &developed,
            assets: &AssetBonuses::default(),
            layout: &LayoutBonuses::default(),
            bonus: &CapacityBonus::default(),
            population_units: 0,
        };
        let caps = compute_capacities(&sources, Balance::default_ref());
        assert_eq!(caps.residents, 4);
        // 3 * 1.2 / 0.85 = 4.23
        assert_eq!(caps.jobs, 4);
        // (2 * 1.0 + 4 * 0.8) / 0.8 = 6.5
        assert_eq!(caps.services, 6);
    }

    #[test]
    fn upkeep_never_drives_services_negative() {
        let suits = SuitCounts::new(1, 0, 0, 0);
        let developed = DevelopedSummary::default();
        let sources = CapacitySources {
            suits: &suits,
            developed: &developed,
            assets: &AssetBonuses::default(),
            layout: &LayoutBonuses::default(),
            bonus: &CapacityBonus::default(),
            population_units: 200,
        };
        assert_eq!(compute_capacities(&sources, Balance::default_ref()).services, 0);
    }

    #[test]
    fn buffer_goes_to_smallest_with_resident_ties() {
        let (caps, channel) = apply_capacity_buffer(capacities(3, 3, 3), 1);
        assert_eq!(channel, Some(CapacityChannel::Residents));
        assert_eq!(caps, capacities(4, 3, 3));

        let (caps, channel) = apply_capacity_buffer(capacities(5, 2, 2), 1);
        assert_eq!(channel, Some(CapacityChannel::Jobs));
        assert_eq!(caps, capacities(5, 3, 2));

        let (caps, channel) = apply_capacity_buffer(capacities(5, 4, 1), 2);
        assert_eq!(channel, Some(CapacityChannel::Services));
        assert_eq!(caps, capacities(5, 4, 3));

        assert_eq!(apply_capacity_buffer(capacities(1, 2, 3), 0).1, None);
    }

    #[test]
    fn grace_rule_uses_larger_of_near_tie() {
        let limit = compute_limiting(5, 6, 9);
        assert_eq!(limit.value, 6);
        assert_eq!(limit.factor, LimitingFactor::Balanced);
        assert!(limit.grace_applied);

        let limit = compute_limiting(8, 3, 5);
        assert_eq!(limit.value, 3);
        assert_eq!(limit.factor, LimitingFactor::Jobs);
        assert!(!limit.grace_applied);
    }

    #[test]
    fn grace_rule_applies_from_an_empty_capacity() {
        let limit = compute_limiting(0, 1, 9);
        assert_eq!(limit.value, 1);
        assert_eq!(limit.factor, LimitingFactor::Balanced);
        assert!(limit.grace_applied);

        let limit = compute_limiting(7, 0, 2);
        assert_eq!(limit.value, 0);
        assert_eq!(limit.factor, LimitingFactor::Jobs);
        assert!(!limit.grace_applied);

        let limit = compute_limiting(0, 0, 1);
        assert_eq!(limit.value, 0);
        assert_eq!(limit.factor, LimitingFactor::Potential);
        assert!(!limit.grace_applied);
    }

    #[test]
    fn limiting_ties_keep_declaration_order() {
        let limit = compute_limiting(4, 4, 4);
        assert_eq!(limit.factor, LimitingFactor::Potential);
        let limit = compute_limiting(9, 2, 2);
        assert_eq!(limit.factor, LimitingFactor::Jobs);
    }

    #[test]
    fn policy_uplift_is_capped() {
        let balance = Balance::default_ref();
        assert_eq!(policy_growth_delta(10, 0, balance), 0);
        // floor(10 * 1.1) - 10 + 1
        assert_eq!(policy_growth_delta(10, 1, balance), 2);
        // only one policy counts by default
        assert_eq!(policy_growth_delta(10, 3, balance), 2);
        assert_eq!(policy_growth_delta(0, 1, balance), 1);
    }

    #[test]
    fn pressure_banks_when_capacity_blocks() {
        let settled = settle_pressure(2, true, LimitingFactor::Jobs, 9, 3, 3);
        assert_eq!(settled.pressure, 5);
        assert_eq!(settled.applied, 0);
        assert_eq!(settled.gain, 3);
    }

    #[test]
    fn pressure_releases_into_growth() {
        let settled = settle_pressure(4, true, LimitingFactor::Potential, 6, 2, 2);
        assert_eq!(settled.applied, 2);
        assert_eq!(settled.gain, 4);
        assert_eq!(settled.pressure, 1);

        let idle = settle_pressure(3, true, LimitingFactor::Balanced, 6, 0, 0);
        assert_eq!(idle.applied, 0);
        assert_eq!(idle.pressure, 2);
    }

    #[test]
    fn failed_round_only_decays_pressure() {
        let settled = settle_pressure(3, false, LimitingFactor::Services, 9, 1, 1);
        assert_eq!(settled.pressure, 2);
        assert_eq!(settled.gain, 1);
        assert_eq!(settle_pressure(0, false, LimitingFactor::Jobs, 9, 0, 0).pressure, 0);
    }

    #[test]
    fn dormant_housing_fills_then_banks_vacancy() {
        let housing = settle_dormant_housing(3, 2, 6);
        assert_eq!(housing.filled, 2);
        assert_eq!(housing.vacant, 4);
        assert_eq!(housing.dormant, 5);
        assert_eq!(settle_dormant_housing(0, 5, 3).dormant, 0);
    }
}
