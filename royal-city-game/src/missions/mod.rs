//! Mission templates, drafted mission sets and their check descriptors.
//!
//! Checks describe what the table has to achieve; they are never evaluated
//! against card play. Success is a toggle the table reports.

pub mod catalog;
pub mod conflict;
pub mod draft;

use serde::{Deserialize, Serialize};

use crate::rewards::Reward;
use crate::sector::Suit;
use crate::state::Player;

pub use catalog::{CatalogError, MissionCatalog};
pub use conflict::{MissionConstraints, SuitConstraint, missions_conflict};
pub use draft::{
    DraftOptions, generate_missions, generate_missions_from, missions_for_round,
    recent_mission_ids,
};

const ROLE_PLACEHOLDER: &str = "{ROLE:ANY}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissionTier {
    Primary,
    Optional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissionTag {
    Role,
    Trick,
    Rank,
    Suit,
    Count,
    Control,
    Restriction,
    Variety,
    Hard,
    Order,
    Deadline,
    Blight,
    Economy,
    Infrastructure,
    Civic,
}

/// Court cards and aces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Face {
    A,
    K,
    Q,
    J,
}

/// Card rank as written in check descriptors: a pip value or a face letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rank {
    Pip(u8),
    Face(Face),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LastTrick {
    #[serde(rename = "LAST")]
    Last,
}

/// 1-based trick position, or the final trick of the hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrickIndex {
    Number(u8),
    Last(LastTrick),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SuitRequirement {
    pub suit: Suit,
    pub n: u8,
}

/// Descriptor of what a mission asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissionCheck {
    RoleWinsTrickIndex { trick: TrickIndex },
    RoleWinsFirstTrick,
    AnyTrickWonWithRank { rank: Rank },
    TrickWonWithRank { rank: Rank },
    RoleWinsAnyTrickWithRank { rank: Rank },
    RoleWinsAtLeastTricksInSuit { suit: Suit, n: u8 },
    AtLeastTricksInSuit { suit: Suit, n: u8 },
    ExactTricksInSuit { suit: Suit, n: u8 },
    NoTricksWonWithRank { rank: Rank },
    WinATrickInSuit { suit: Suit },
    WithinFirstNTricksWinSuit { n: u8, suit: Suit },
    MultiExactTricks { req: Vec<SuitRequirement> },
    AllOf { checks: Vec<MissionCheck> },
    InOrder { checks: Vec<MissionCheck> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissionOutcome {
    #[default]
    Unknown,
    Success,
    Fail,
}

impl MissionOutcome {
    #[must_use]
    pub const fn from_success(success: bool) -> Self {
        if success { Self::Success } else { Self::Fail }
    }
}

/// Player bound to a `{ROLE:ANY}` slot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleBindings {
    pub any_role: Option<Player>,
}

/// A template from the catalog, or an instance drafted for a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mission {
    pub id: String,
    pub tier: MissionTier,
    pub difficulty: u8,
    #[serde(default)]
    pub tags: Vec<MissionTag>,
    pub text: String,
    pub check: MissionCheck,
    #[serde(default)]
    pub reward: Option<Reward>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_bindings: Option<RoleBindings>,
    #[serde(default)]
    pub outcome: MissionOutcome,
}

impl Mission {
    #[must_use]
    pub fn has_tag(&self, tag: MissionTag) -> bool {
        self.tags.contains(&tag)
    }

    #[must_use]
    pub fn is_blight_cleanup(&self) -> bool {
        self.has_tag(MissionTag::Blight)
    }

    /// Bind a player to the role slot and render the text.
    #[must_use]
    pub fn instantiate(&self, any_role: Option<&Player>) -> Self {
        let display = any_role.map_or_else(|| "A player".to_string(), Player::display_name);
        Self {
            text: self.text.replacen(ROLE_PLACEHOLDER, &display, 1),
            role_bindings: Some(RoleBindings {
                any_role: any_role.cloned(),
            }),
            outcome: MissionOutcome::Unknown,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_outcome(&self, success: bool) -> Self {
        Self {
            outcome: MissionOutcome::from_success(success),
            ..self.clone()
        }
    }
}

/// Missions offered for one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionSet {
    pub round: u32,
    #[serde(default)]
    pub primary: Option<Mission>,
    #[serde(default)]
    pub optional: Vec<Mission>,
}

impl MissionSet {
    /// Ids offered in this set, primary first.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.primary
            .iter()
            .chain(self.optional.iter())
            .map(|mission| mission.id.as_str())
    }

    pub fn missions(&self) -> impl Iterator<Item = &Mission> {
        self.primary.iter().chain(self.optional.iter())
    }
}
