//! Mission rewards and how they change a campaign.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::balance::Balance;
use crate::board::{Asset, Cell};
use crate::rng::Mulberry32;
use crate::sector::{AssetKind, SectorCode};
use crate::state::{CampaignState, Policy};

/// Time-limited modifiers a reward can activate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyKind {
    GrantFunding,
    ZoningReform,
}

impl PolicyKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GrantFunding => "GRANT_FUNDING",
            Self::ZoningReform => "ZONING_REFORM",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::GrantFunding => "Grant Funding",
            Self::ZoningReform => "Zoning Reform",
        }
    }
}

/// Campaign-wide switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemUnlock {
    UnlockHighways,
}

/// Closed set of mission payoffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Reward {
    Asset { kind: AssetKind },
    Policy { kind: PolicyKind },
    System { id: SystemUnlock },
    Blight { remove: u32 },
}

impl Reward {
    /// Every reward a mission can name by id.
    pub const CATALOG: [Self; 7] = [
        Self::Asset {
            kind: AssetKind::Park,
        },
        Self::Asset {
            kind: AssetKind::Market,
        },
        Self::Asset {
            kind: AssetKind::Clinic,
        },
        Self::Asset {
            kind: AssetKind::TransitStop,
        },
        Self::Policy {
            kind: PolicyKind::GrantFunding,
        },
        Self::Policy {
            kind: PolicyKind::ZoningReform,
        },
        Self::System {
            id: SystemUnlock::UnlockHighways,
        },
    ];

    #[must_use]
    pub const fn id(&self) -> &'static str {
        match self {
            Self::Asset { kind } => kind.as_str(),
            Self::Policy { kind } => kind.as_str(),
            Self::System {
                id: SystemUnlock::UnlockHighways,
            } => "UNLOCK_HIGHWAYS",
            Self::Blight { .. } => "BLIGHT_CLEANUP",
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Asset { kind } => kind.display_name(),
            Self::Policy { kind } => kind.display_name(),
            Self::System {
                id: SystemUnlock::UnlockHighways,
            } => "Highways Authorized",
            Self::Blight { .. } => "Blight Cleanup",
        }
    }

    /// Look up a catalogued reward by id.
    #[must_use]
    pub fn find_by_id(id: &str) -> Option<Self> {
        let wanted = id.trim();
        Self::CATALOG
            .iter()
            .copied()
            .find(|reward| reward.id() == wanted)
            .or_else(|| {
                AssetKind::parse(wanted).map(|kind| Self::Asset { kind })
            })
    }
}

impl fmt::Display for Reward {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What applying a reward did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardResult {
    pub granted: bool,
    pub note: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_id: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub queued: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<[usize; 2]>,
}

impl RewardResult {
    fn granted(reward: &Reward, note: String) -> Self {
        Self {
            granted: true,
            note,
            reward_id: Some(reward.id().to_string()),
            queued: false,
            position: None,
        }
    }

    #[must_use]
    pub fn none() -> Self {
        Self {
            granted: false,
            note: "No reward.".to_string(),
            reward_id: None,
            queued: false,
            position: None,
        }
    }
}

/// Apply a mission reward to the campaign.
///
/// A missing reward is not an error; it yields `granted: false` with the note
/// `"No reward."`.
pub fn apply_reward(
    state: &mut CampaignState,
    reward: Option<&Reward>,
    balance: &Balance,
) -> RewardResult {
    let Some(reward) = reward else {
        return RewardResult::none();
    };
    match *reward {
        Reward::Asset { kind } => {
            state.unplaced_assets.push(kind);
            let mut result =
                RewardResult::granted(reward, format!("{} queued for placement.", reward.name()));
            result.queued = true;
            result
        }
        Reward::Policy { kind } => {
            apply_policy(state, kind, balance);
            RewardResult::granted(reward, reward.name().to_string())
        }
        Reward::System {
            id: SystemUnlock::UnlockHighways,
        } => {
            state.city.highways_unlocked = true;
            RewardResult::granted(reward, reward.name().to_string())
        }
        Reward::Blight { remove } => {
            let before = state.city.blight;
            state.city.blight = before.saturating_sub(remove);
            let cleared = before - state.city.blight;
            let note = if cleared > 0 {
                format!("Blight reduced by {cleared}.")
            } else {
                "No blight left to clear.".to_string()
            };
            RewardResult::granted(reward, note)
        }
    }
}

/// Apply a reward referenced by catalog id, as older saves store them.
pub fn apply_reward_by_id(state: &mut CampaignState, id: &str, balance: &Balance) -> RewardResult {
    let reward = Reward::find_by_id(id);
    apply_reward(state, reward.as_ref(), balance)
}

fn apply_policy(state: &mut CampaignState, kind: PolicyKind, balance: &Balance) {
    let next_round = &mut state.bonuses.next_round;
    match kind {
        PolicyKind::GrantFunding => {
            next_round.action_bonus += 1;
            if next_round.grant_stacks < balance.policies.grant_max_stacks {
                next_round.grant_stacks += 1;
                next_round.endgame_base_bonus += balance.policies.grant_endgame_base_bonus;
            }
        }
        PolicyKind::ZoningReform => {
            next_round.capacity_buffer = next_round.capacity_buffer.max(1);
        }
    }

    let policies = &mut state.bonuses.active_policies;
    policies.push(Policy {
        kind,
        name: kind.display_name().to_string(),
        expires_after_round: state.round,
    });
    let excess = policies.len().saturating_sub(balance.policies.max_active);
    policies.drain(..excess);
}

/// An amenity moved from the queue onto the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedAsset {
    pub asset_type: AssetKind,
    pub position: [usize; 2],
}

/// Place queued amenities on their best road-adjacent free cells.
///
/// Amenities with no free road-adjacent cell stay queued.
pub fn place_queued_assets(state: &mut CampaignState, rng: &mut Mulberry32) -> Vec<PlacedAsset> {
    let queued = std::mem::take(&mut state.unplaced_assets);
    let mut placed = Vec::new();
    for kind in queued {
        match best_asset_slot(state, kind, rng) {
            Some((row, col)) => {
                if let Some(cell) = state.board.get_mut(row, col) {
                    cell.asset = Some(Asset { kind });
                }
                placed.push(PlacedAsset {
                    asset_type: kind,
                    position: [row, col],
                });
            }
            None => state.unplaced_assets.push(kind),
        }
    }
    placed
}

fn best_asset_slot(
    state: &CampaignState,
    kind: AssetKind,
    rng: &mut Mulberry32,
) -> Option<(usize, usize)> {
    let mut best: Option<(f64, (usize, usize))> = None;
    for cell in state.board.cells() {
        if cell.asset.is_some() || !state.roads.cell_is_road_adjacent(cell) {
            continue;
        }
        let score = score_asset_slot(state, cell, kind) + rng.next_f64() * 0.01;
        if best.is_none_or(|(top, _)| score > top) {
            best = Some((score, (cell.row, cell.col)));
        }
    }
    best.map(|(_, position)| position)
}

fn score_asset_slot(state: &CampaignState, cell: &Cell, kind: AssetKind) -> f64 {
    let mut score = 0.0;
    for neighbor in state.board.neighbors(cell.row, cell.col) {
        let Some(sector) = neighbor.sector else {
            continue;
        };
        score += match (kind, sector) {
            (AssetKind::Park, SectorCode::Residential)
            | (AssetKind::Market, SectorCode::Commerce)
            | (AssetKind::Clinic, SectorCode::Civic | SectorCode::Infrastructure) => 2.0,
            (AssetKind::TransitStop, _) => 1.0,
            _ => 0.0,
        };
    }
    if cell.is_developed() {
        score - 1.0
    } else {
        score + 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{PlayersInput, new_campaign};

    fn campaign() -> CampaignState {
        new_campaign(42, &PlayersInput::default())
    }

    #[test]
    fn asset_rewards_queue() {
        let mut state = campaign();
        let reward = Reward::Asset {
            kind: AssetKind::Park,
        };
        let result = apply_reward(&mut state, Some(&reward), Balance::default_ref());
        assert!(result.granted);
        assert!(result.queued);
        assert_eq!(result.note, "Park queued for placement.");
        assert_eq!(state.unplaced_assets, vec![AssetKind::Park]);
    }

    #[test]
    fn missing_reward_grants_nothing() {
        let mut state = campaign();
        let result = apply_reward(&mut state, None, Balance::default_ref());
        assert!(!result.granted);
        assert_eq!(result.note, "No reward.");
        let unknown = apply_reward_by_id(&mut state, "GOLDEN_STATUE", Balance::default_ref());
        assert_eq!(unknown, RewardResult::none());
    }

    #[test]
    fn grant_funding_stacks_twice() {
        let mut state = campaign();
        let reward = Reward::Policy {
            kind: PolicyKind::GrantFunding,
        };
        for _ in 0..3 {
            apply_reward(&mut state, Some(&reward), Balance::default_ref());
        }
        let next = &state.bonuses.next_round;
        assert_eq!(next.action_bonus, 3);
        assert_eq!(next.grant_stacks, 2);
        assert!((next.endgame_base_bonus - 0.2).abs() < 1e-12);
        assert_eq!(state.bonuses.active_policies.len(), 1);
        assert_eq!(state.bonuses.active_policies[0].expires_after_round, 1);
    }

    #[test]
    fn zoning_reform_sets_buffer_and_replaces_oldest_policy() {
        let mut state = campaign();
        apply_reward_by_id(&mut state, "GRANT_FUNDING", Balance::default_ref());
        let result = apply_reward_by_id(&mut state, "ZONING_REFORM", Balance::default_ref());
        assert_eq!(result.note, "Zoning Reform");
        assert_eq!(state.bonuses.next_round.capacity_buffer, 1);
        assert_eq!(state.bonuses.active_policies.len(), 1);
        assert_eq!(
            state.bonuses.active_policies[0].kind,
            PolicyKind::ZoningReform
        );
    }

    #[test]
    fn system_and_blight_rewards() {
        let mut state = campaign();
        state.city.blight = 1;
        let highways = apply_reward_by_id(&mut state, "UNLOCK_HIGHWAYS", Balance::default_ref());
        assert_eq!(highways.note, "Highways Authorized");
        assert!(state.city.highways_unlocked);
        let cleanup = Reward::Blight { remove: 2 };
        let result = apply_reward(&mut state, Some(&cleanup), Balance::default_ref());
        assert_eq!(state.city.blight, 0);
        assert_eq!(result.note, "Blight reduced by 1.");
    }

    #[test]
    fn queued_assets_land_on_road_adjacent_cells() {
        let mut state = campaign();
        state.unplaced_assets = vec![AssetKind::Clinic, AssetKind::TransitStop];
        let mut rng = Mulberry32::new(5);
        let placed = place_queued_assets(&mut state, &mut rng);
        assert_eq!(placed.len(), 2);
        assert!(state.unplaced_assets.is_empty());
        for entry in &placed {
            let [row, col] = entry.position;
            assert!(state.roads.is_road_adjacent(row, col));
            let cell = state.board.get(row, col).unwrap();
            assert_eq!(cell.asset_kind(), Some(entry.asset_type));
        }
        assert_ne!(placed[0].position, placed[1].position);
    }

    #[test]
    fn park_prefers_residential_neighbours() {
        let mut state = campaign();
        let col = state.roads.variant.vertical_col;
        if let Some(cell) = state.board.get_mut(0, col) {
            cell.sector = Some(SectorCode::Residential);
            cell.level = 1;
        }
        state.unplaced_assets = vec![AssetKind::Park];
        let mut rng = Mulberry32::new(9);
        let placed = place_queued_assets(&mut state, &mut rng);
        let [row, placed_col] = placed[0].position;
        let touches_home = state
            .board
            .neighbors(row, placed_col)
            .iter()
            .any(|cell| cell.sector == Some(SectorCode::Residential));
        assert!(touches_home);
    }

    #[test]
    fn reward_serializes_with_type_tag() {
        let json = serde_json::to_string(&Reward::Blight { remove: 2 }).unwrap();
        assert_eq!(json, r#"{"type":"BLIGHT","remove":2}"#);
        let parsed: Reward =
            serde_json::from_str(r#"{"type":"ASSET","kind":"TRANSIT"}"#).unwrap();
        assert_eq!(
            parsed,
            Reward::Asset {
                kind: AssetKind::TransitStop
            }
        );
    }
}
