//! Economy dials injected into every resolver formula.
//!
//! `Balance::default()` is the locked tuning the balance gates were run
//! against. Loading a JSON overlay only replaces the fields it names; the
//! rest keep their locked values.

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;

/// Errors raised when balance configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum BalanceError {
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("{field} must be at least {min:.2} (got {value:.2})")]
    MinViolation {
        field: &'static str,
        min: f64,
        value: f64,
    },
    #[error("endgame minimum {min} exceeds maximum {max}")]
    EndgameClampInverted { min: i64, max: i64 },
    #[error("census jitter minimum {min:.4} exceeds maximum {max:.4}")]
    JitterInverted { min: f64, max: f64 },
    #[error("balance config could not be parsed: {0}")]
    Parse(String),
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), BalanceError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(BalanceError::RangeViolation {
            field,
            min,
            max,
            value,
        })
    }
}

fn check_positive(field: &'static str, value: f64) -> Result<(), BalanceError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(BalanceError::MinViolation {
            field,
            min: f64::EPSILON,
            value,
        })
    }
}

/// Root balance configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    #[serde(rename = "VERSION", default = "Balance::default_version")]
    pub version: String,
    #[serde(rename = "ENDGAME_MIN_ABS", default = "Balance::default_endgame_min_abs")]
    pub endgame_min_abs: i64,
    #[serde(rename = "ENDGAME_MIN_RATE", default = "Balance::default_endgame_min_rate")]
    pub endgame_min_rate: f64,
    #[serde(rename = "ENDGAME_MAX_ABS", default = "Balance::default_endgame_max_abs")]
    pub endgame_max_abs: i64,
    #[serde(default)]
    pub endgame: EndgameBalance,
    #[serde(default)]
    pub blight: BlightBalance,
    #[serde(default)]
    pub services: ServicesBalance,
    #[serde(default)]
    pub policies: PolicyBalance,
    #[serde(default)]
    pub jobs: JobsBalance,
    #[serde(default = "Balance::default_salvage_on_primary_fail")]
    pub salvage_on_primary_fail: f64,
    #[serde(default)]
    pub census: CensusBalance,
    #[serde(default)]
    pub potential: PotentialBalance,
}

impl Balance {
    fn default_version() -> String {
        String::from("1.0.0-lock")
    }

    const fn default_endgame_min_abs() -> i64 {
        40_000
    }

    const fn default_endgame_min_rate() -> f64 {
        0.015
    }

    const fn default_endgame_max_abs() -> i64 {
        1_200_000
    }

    const fn default_salvage_on_primary_fail() -> f64 {
        0.35
    }

    /// Shared locked tuning.
    #[must_use]
    pub fn default_ref() -> &'static Self {
        static BALANCE: OnceLock<Balance> = OnceLock::new();
        BALANCE.get_or_init(Self::default)
    }

    /// Parse a JSON overlay and validate the result.
    ///
    /// # Errors
    ///
    /// Returns `BalanceError::Parse` when the JSON is malformed, or the first
    /// invariant violation reported by [`Balance::validate`].
    pub fn from_json(json: &str) -> Result<Self, BalanceError> {
        let balance: Self =
            serde_json::from_str(json).map_err(|err| BalanceError::Parse(err.to_string()))?;
        balance.validate()?;
        Ok(balance)
    }

    /// Validate the configuration against its documented bounds.
    ///
    /// # Errors
    ///
    /// Returns `BalanceError` when any dial sits outside its allowed range.
    pub fn validate(&self) -> Result<(), BalanceError> {
        if self.endgame_min_abs > self.endgame_max_abs {
            return Err(BalanceError::EndgameClampInverted {
                min: self.endgame_min_abs,
                max: self.endgame_max_abs,
            });
        }
        check_range("ENDGAME_MIN_RATE", self.endgame_min_rate, 0.0, 1.0)?;
        check_range(
            "salvageOnPrimaryFail",
            self.salvage_on_primary_fail,
            0.0,
            1.0,
        )?;
        self.endgame.validate()?;
        self.blight.validate()?;
        self.services.validate()?;
        self.policies.validate()?;
        self.jobs.validate()?;
        self.census.validate()?;
        self.potential.validate()
    }
}

impl Default for Balance {
    fn default() -> Self {
        Self {
            version: Self::default_version(),
            endgame_min_abs: Self::default_endgame_min_abs(),
            endgame_min_rate: Self::default_endgame_min_rate(),
            endgame_max_abs: Self::default_endgame_max_abs(),
            endgame: EndgameBalance::default(),
            blight: BlightBalance::default(),
            services: ServicesBalance::default(),
            policies: PolicyBalance::default(),
            jobs: JobsBalance::default(),
            salvage_on_primary_fail: Self::default_salvage_on_primary_fail(),
            census: CensusBalance::default(),
            potential: PotentialBalance::default(),
        }
    }
}

/// Finale payoff tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EndgameBalance {
    /// Share of the final census paid out before prestige.
    pub base_rate: f64,
    /// Flat boost reached at prestige 100.
    pub prestige_base_boost: f64,
    pub prestige_weights: PrestigeWeights,
    pub curve: PrestigeCurve,
    pub boom: BoomMultipliers,
}

impl EndgameBalance {
    fn validate(&self) -> Result<(), BalanceError> {
        check_range("endgame.baseRate", self.base_rate, 0.0, 1.0)?;
        if self.prestige_base_boost < 0.0 {
            return Err(BalanceError::MinViolation {
                field: "endgame.prestigeBaseBoost",
                min: 0.0,
                value: self.prestige_base_boost,
            });
        }
        if self.curve.max_mult < self.curve.base_mult {
            return Err(BalanceError::MinViolation {
                field: "endgame.curve.maxMult",
                min: self.curve.base_mult,
                value: self.curve.max_mult,
            });
        }
        check_positive("endgame.curve.exponent", self.curve.exponent)?;
        check_range("endgame.boom.modest", self.boom.modest, 1.0, 3.0)?;
        check_range("endgame.boom.strong", self.boom.strong, 1.0, 3.0)?;
        check_range("endgame.boom.epic", self.boom.epic, 1.0, 3.0)
    }
}

impl Default for EndgameBalance {
    fn default() -> Self {
        Self {
            base_rate: 0.08,
            prestige_base_boost: 60_000.0,
            prestige_weights: PrestigeWeights::default(),
            curve: PrestigeCurve::default(),
            boom: BoomMultipliers::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrestigeWeights {
    pub pop_units: f64,
    pub adjacency: f64,
    pub primary: f64,
    pub optional: f64,
    pub policy: f64,
    pub blight_penalty: f64,
}

impl Default for PrestigeWeights {
    fn default() -> Self {
        Self {
            pop_units: 0.3,
            adjacency: 0.2,
            primary: 0.2,
            optional: 0.1,
            policy: 0.1,
            blight_penalty: 0.22,
        }
    }
}

/// `min(max_mult, base_mult + span * (prestige / 100) ^ exponent)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrestigeCurve {
    pub base_mult: f64,
    pub max_mult: f64,
    pub exponent: f64,
    pub span: f64,
}

impl Default for PrestigeCurve {
    fn default() -> Self {
        Self {
            base_mult: 1.0,
            max_mult: 1.45,
            exponent: 0.85,
            span: 0.55,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoomMultipliers {
    pub modest: f64,
    pub strong: f64,
    pub epic: f64,
}

impl Default for BoomMultipliers {
    fn default() -> Self {
        Self {
            modest: 1.25,
            strong: 1.5,
            epic: 1.75,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlightBalance {
    /// Census penalty per blight point.
    pub penalty_rate: f64,
    pub max_penalty: f64,
    /// Share of population leaving per blight point each round.
    pub decay_rate: f64,
}

impl BlightBalance {
    /// Multiplicative census drag for a blight level.
    #[must_use]
    pub fn penalty_for(&self, blight: u32) -> f64 {
        (self.penalty_rate * f64::from(blight)).min(self.max_penalty)
    }

    fn validate(&self) -> Result<(), BalanceError> {
        check_range("blight.penaltyRate", self.penalty_rate, 0.0, 1.0)?;
        check_range("blight.maxPenalty", self.max_penalty, 0.0, 1.0)?;
        check_range("blight.decayRate", self.decay_rate, 0.0, 1.0)
    }
}

impl Default for BlightBalance {
    fn default() -> Self {
        Self {
            penalty_rate: 0.18,
            max_penalty: 0.7,
            decay_rate: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServicesBalance {
    pub use_prestige_contribution: bool,
    pub prestige_contribution: f64,
    pub resident_requirement_rate: f64,
    pub upkeep_per_pop: f64,
    pub weights: ServiceWeights,
}

impl ServicesBalance {
    fn validate(&self) -> Result<(), BalanceError> {
        check_range(
            "services.prestigeContribution",
            self.prestige_contribution,
            0.0,
            1.0,
        )?;
        check_positive(
            "services.residentRequirementRate",
            self.resident_requirement_rate,
        )?;
        check_range("services.upkeepPerPop", self.upkeep_per_pop, 0.0, 1.0)
    }
}

impl Default for ServicesBalance {
    fn default() -> Self {
        Self {
            use_prestige_contribution: true,
            prestige_contribution: 0.15,
            resident_requirement_rate: 0.8,
            upkeep_per_pop: 0.1,
            weights: ServiceWeights::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceWeights {
    #[serde(rename = "INF")]
    pub infrastructure: f64,
    #[serde(rename = "CIV")]
    pub civic: f64,
    #[serde(rename = "CLINIC")]
    pub clinic: f64,
    #[serde(rename = "PARK")]
    pub park: f64,
}

impl Default for ServiceWeights {
    fn default() -> Self {
        Self {
            infrastructure: 1.0,
            civic: 0.8,
            clinic: 1.1,
            park: 0.35,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyBalance {
    pub enabled: bool,
    pub max_active: usize,
    pub per_policy_growth_bonus: f64,
    pub per_policy_prestige_bonus: f64,
    pub cap_growth_bonus: f64,
    /// Prestige points added per active policy after the blend.
    pub prestige_points_per_policy: i64,
    pub grant_endgame_base_bonus: f64,
    pub grant_max_stacks: u32,
}

impl PolicyBalance {
    /// Policies counted toward uplift and prestige.
    #[must_use]
    pub fn counted(&self, active: usize) -> usize {
        if self.enabled {
            active.min(self.max_active)
        } else {
            0
        }
    }

    fn validate(&self) -> Result<(), BalanceError> {
        check_range(
            "policies.perPolicyGrowthBonus",
            self.per_policy_growth_bonus,
            0.0,
            1.0,
        )?;
        check_range(
            "policies.capGrowthBonus",
            self.cap_growth_bonus,
            0.0,
            1.0,
        )?;
        check_range(
            "policies.grantEndgameBaseBonus",
            self.grant_endgame_base_bonus,
            0.0,
            1.0,
        )
    }
}

impl Default for PolicyBalance {
    fn default() -> Self {
        Self {
            enabled: true,
            max_active: 1,
            per_policy_growth_bonus: 0.1,
            per_policy_prestige_bonus: 0.15,
            cap_growth_bonus: 0.15,
            prestige_points_per_policy: 6,
            grant_endgame_base_bonus: 0.1,
            grant_max_stacks: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobsBalance {
    pub tile_mult: f64,
    pub market_asset: f64,
    pub transit_asset: f64,
    pub requirement_rate: f64,
}

impl JobsBalance {
    fn validate(&self) -> Result<(), BalanceError> {
        check_positive("jobs.tileMult", self.tile_mult)?;
        check_positive("jobs.requirementRate", self.requirement_rate)
    }
}

impl Default for JobsBalance {
    fn default() -> Self {
        Self {
            tile_mult: 1.2,
            market_asset: 2.0,
            transit_asset: 0.5,
            requirement_rate: 0.85,
        }
    }
}

/// Census curve: linear head, halved tail past the threshold, convex epic bonus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CensusBalance {
    pub base: f64,
    pub unit_to_people: f64,
    pub diminishing_threshold: i64,
    pub diminishing_rate: f64,
    pub epic_threshold: i64,
    pub epic_exponent: f64,
    pub epic_strength: f64,
    pub jitter_min: f64,
    pub jitter_max: f64,
}

impl CensusBalance {
    fn validate(&self) -> Result<(), BalanceError> {
        check_positive("census.unitToPeople", self.unit_to_people)?;
        check_range(
            "census.diminishingRate",
            self.diminishing_rate,
            0.0,
            1.0,
        )?;
        if self.jitter_min > self.jitter_max {
            return Err(BalanceError::JitterInverted {
                min: self.jitter_min,
                max: self.jitter_max,
            });
        }
        check_range("census.jitterMax", self.jitter_max, 0.0, 0.1)
    }
}

impl Default for CensusBalance {
    fn default() -> Self {
        Self {
            base: 12_000.0,
            unit_to_people: 7_350.0,
            diminishing_threshold: 120,
            diminishing_rate: 0.5,
            epic_threshold: 55,
            epic_exponent: 1.6,
            epic_strength: 0.18,
            jitter_min: 0.002,
            jitter_max: 0.006,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PotentialBalance {
    pub adj_bonus_factor: f64,
    pub flat_bonus: i64,
}

impl PotentialBalance {
    fn validate(&self) -> Result<(), BalanceError> {
        check_range(
            "potential.adjBonusFactor",
            self.adj_bonus_factor,
            0.0,
            2.0,
        )
    }
}

impl Default for PotentialBalance {
    fn default() -> Self {
        Self {
            adj_bonus_factor: 0.5,
            flat_bonus: 1,
        }
    }
}
