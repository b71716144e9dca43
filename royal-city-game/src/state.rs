//! Campaign state carried between rounds.

use serde::{Deserialize, Serialize};

use crate::board::{Board, Roads, generate_two_corridor_roads};
use crate::constants::{DEFAULT_PLAYERS, GRID_SIZE, MAX_PLAYERS, MIN_PLAYERS, ROLES, ROUNDS};
use crate::missions::MissionSet;
use crate::report::Report;
use crate::rewards::PolicyKind;
use crate::sector::AssetKind;

/// Running totals.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Stats {
    /// Integer growth currency; census is derived from it.
    pub population_units: i64,
    pub attraction: i64,
    /// Banked unmet demand, always in `0..=MAX_PRESSURE`.
    pub pressure: i64,
    pub dormant_housing: i64,
    pub census: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CityState {
    pub blight: u32,
    pub roads_expanded: bool,
    pub highways_unlocked: bool,
}

/// Flat capacity granted for a single resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacityBonus {
    pub jobs: i64,
    pub services: i64,
    pub residents: i64,
}

impl CapacityBonus {
    #[must_use]
    pub const fn total(&self) -> i64 {
        self.jobs + self.services + self.residents
    }
}

/// One-shot bonuses queued for the next resolution.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NextRoundBonus {
    pub action_bonus: u32,
    pub capacity_bonus: CapacityBonus,
    pub capacity_buffer: i64,
    /// Never written by the engine. Only the telemetry census reads it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub census_multiplier: Option<f64>,
    /// Added to the endgame base rate; persists until the finale.
    pub endgame_base_bonus: f64,
    pub grant_stacks: u32,
}

/// A time-limited policy modifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub kind: PolicyKind,
    pub name: String,
    pub expires_after_round: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Bonuses {
    pub next_round: NextRoundBonus,
    pub active_policies: Vec<Policy>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub seat: usize,
    pub role: String,
    #[serde(default)]
    pub name: String,
}

impl Player {
    /// `Name (Role)` when a name was given, otherwise just the role.
    #[must_use]
    pub fn display_name(&self) -> String {
        let name = self.name.trim();
        if name.is_empty() {
            self.role.clone()
        } else {
            format!("{name} ({})", self.role)
        }
    }
}

/// Seat setup supplied when a campaign starts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayersInput {
    pub count: Option<usize>,
    pub names: Vec<String>,
}

impl PlayersInput {
    #[must_use]
    pub fn with_count(count: usize) -> Self {
        Self {
            count: Some(count),
            names: Vec::new(),
        }
    }

    /// Seats clamped to `MIN_PLAYERS..=MAX_PLAYERS`, roles assigned in table order.
    #[must_use]
    pub fn build(&self) -> Vec<Player> {
        let count = self
            .count
            .unwrap_or(DEFAULT_PLAYERS)
            .clamp(MIN_PLAYERS, MAX_PLAYERS);
        (0..count)
            .map(|idx| {
                let seat = idx + 1;
                let role = ROLES
                    .get(idx)
                    .map_or_else(|| format!("Role {seat}"), |role| (*role).to_string());
                Player {
                    seat,
                    role,
                    name: self.names.get(idx).cloned().unwrap_or_default(),
                }
            })
            .collect()
    }
}

/// Root aggregate threaded through every resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignState {
    pub seed: u32,
    pub round: u32,
    pub rounds: u32,
    pub grid_size: usize,
    pub board: Board,
    pub roads: Roads,
    #[serde(default)]
    pub stats: Stats,
    #[serde(default)]
    pub city: CityState,
    #[serde(default)]
    pub bonuses: Bonuses,
    #[serde(default)]
    pub unplaced_assets: Vec<AssetKind>,
    #[serde(default)]
    pub current_missions: Option<MissionSet>,
    #[serde(default)]
    pub history: Vec<Report>,
    #[serde(default)]
    pub players: Vec<Player>,
}

impl CampaignState {
    /// Whether the round about to be resolved is the last one.
    #[must_use]
    pub const fn is_final_round(&self) -> bool {
        self.round >= self.rounds
    }

    /// Campaign has resolved every round.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.history.len() >= usize::try_from(self.rounds).unwrap_or(usize::MAX)
    }

    /// Drop policies whose expiry round has passed.
    pub fn prune_expired_policies(&mut self) {
        let round = self.round;
        self.bonuses
            .active_policies
            .retain(|policy| policy.expires_after_round >= round);
    }
}

/// Fresh campaign: empty board, seeded corridors, round 1.
#[must_use]
pub fn new_campaign(seed: u32, players: &PlayersInput) -> CampaignState {
    CampaignState {
        seed,
        round: 1,
        rounds: ROUNDS,
        grid_size: GRID_SIZE,
        board: Board::new(GRID_SIZE),
        roads: generate_two_corridor_roads(GRID_SIZE, seed),
        stats: Stats::default(),
        city: CityState::default(),
        bonuses: Bonuses::default(),
        unplaced_assets: Vec::new(),
        current_missions: None,
        history: Vec::new(),
        players: players.build(),
    }
}
