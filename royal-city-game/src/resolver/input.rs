//! What the table reports for a round.
//!
//! Deserialisation is forgiving: the web table sends whatever its form fields
//! hold, so numbers may arrive as strings, booleans or nulls. Anything that is
//! not a number becomes zero rather than an error.

use serde::{Deserialize, Serialize};

use crate::missions::MissionSet;
use crate::sector::{PlanningFocus, SectorCode};

/// Tricks won per suit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SuitCounts {
    #[serde(deserialize_with = "lenient::count")]
    pub clubs: i64,
    #[serde(deserialize_with = "lenient::count")]
    pub diamonds: i64,
    #[serde(deserialize_with = "lenient::count")]
    pub hearts: i64,
    #[serde(deserialize_with = "lenient::count")]
    pub spades: i64,
}

impl SuitCounts {
    #[must_use]
    pub const fn new(clubs: i64, diamonds: i64, hearts: i64, spades: i64) -> Self {
        Self {
            clubs,
            diamonds,
            hearts,
            spades,
        }
    }

    #[must_use]
    pub const fn total(&self) -> i64 {
        self.clubs + self.diamonds + self.hearts + self.spades
    }

    #[must_use]
    pub const fn for_sector(&self, sector: SectorCode) -> i64 {
        match sector {
            SectorCode::Infrastructure => self.clubs,
            SectorCode::Commerce => self.diamonds,
            SectorCode::Residential => self.hearts,
            SectorCode::Civic => self.spades,
        }
    }

    /// Negative counts clamp to zero.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            clubs: self.clubs.max(0),
            diamonds: self.diamonds.max(0),
            hearts: self.hearts.max(0),
            spades: self.spades.max(0),
        }
    }
}

/// Request to build or upgrade a district tile.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Placement {
    #[serde(deserialize_with = "lenient::coordinate")]
    pub row: Option<i64>,
    #[serde(deserialize_with = "lenient::coordinate")]
    pub col: Option<i64>,
    /// Any accepted sector spelling; validated when applied.
    #[serde(deserialize_with = "lenient::text")]
    pub sector: String,
}

impl Placement {
    #[must_use]
    pub fn new(row: usize, col: usize, sector: SectorCode) -> Self {
        Self {
            row: i64::try_from(row).ok(),
            col: i64::try_from(col).ok(),
            sector: sector.as_str().to_string(),
        }
    }
}

/// Request to move a queued amenity onto a cell.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetPlacement {
    #[serde(deserialize_with = "lenient::coordinate")]
    pub row: Option<i64>,
    #[serde(deserialize_with = "lenient::coordinate")]
    pub col: Option<i64>,
    #[serde(rename = "type", deserialize_with = "lenient::text")]
    pub kind: String,
}

impl AssetPlacement {
    #[must_use]
    pub fn new(row: usize, col: usize, kind: crate::sector::AssetKind) -> Self {
        Self {
            row: i64::try_from(row).ok(),
            col: i64::try_from(col).ok(),
            kind: kind.as_str().to_string(),
        }
    }
}

/// Tuning overrides for playtests. Missing, zero or non-numeric values fall
/// back to the regular rules.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DevOverrides {
    #[serde(
        deserialize_with = "lenient::positive",
        skip_serializing_if = "Option::is_none"
    )]
    pub growth_multiplier: Option<f64>,
    #[serde(
        deserialize_with = "lenient::positive",
        skip_serializing_if = "Option::is_none"
    )]
    pub blight_decay_rate: Option<f64>,
    #[serde(
        deserialize_with = "lenient::level",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_tile_level: Option<u32>,
    #[serde(
        deserialize_with = "lenient::positive",
        skip_serializing_if = "Option::is_none"
    )]
    pub road_adjacency_bonus: Option<f64>,
    #[serde(
        deserialize_with = "lenient::positive",
        skip_serializing_if = "Option::is_none"
    )]
    pub census_multiplier: Option<f64>,
}

/// Everything reported for one round.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoundInput {
    pub suits: SuitCounts,
    #[serde(deserialize_with = "lenient::truthy")]
    pub primary_mission_success: bool,
    #[serde(deserialize_with = "lenient::truthy_list")]
    pub optional_successes: Vec<bool>,
    #[serde(deserialize_with = "lenient::focus")]
    pub planning_focus: PlanningFocus,
    /// Missions the table was shown; used when drafted for this round.
    pub missions: Option<MissionSet>,
    pub placements: Vec<Placement>,
    pub asset_placements: Vec<AssetPlacement>,
    #[serde(deserialize_with = "lenient::truthy")]
    pub road_expansion_complete: bool,
    pub placement_notes: Vec<String>,
    pub dev: DevOverrides,
}

impl RoundInput {
    #[must_use]
    pub fn new(suits: SuitCounts, primary_mission_success: bool) -> Self {
        Self {
            suits,
            primary_mission_success,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_optionals(mut self, successes: &[bool]) -> Self {
        self.optional_successes = successes.to_vec();
        self
    }

    #[must_use]
    pub fn with_placements(mut self, placements: Vec<Placement>) -> Self {
        self.placements = placements;
        self
    }

    #[must_use]
    pub fn with_asset_placements(mut self, placements: Vec<AssetPlacement>) -> Self {
        self.asset_placements = placements;
        self
    }

    #[must_use]
    pub const fn with_focus(mut self, focus: PlanningFocus) -> Self {
        self.planning_focus = focus;
        self
    }

    #[must_use]
    pub fn optional_completed(&self) -> usize {
        self.optional_successes.iter().filter(|done| **done).count()
    }
}

/// Coercions for hand-filled form values.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use crate::numbers::floor_f64_to_i64;
    use crate::sector::PlanningFocus;

    fn number(value: &Value) -> Option<f64> {
        let parsed = match value {
            Value::Null => Some(0.0),
            Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
            Value::Number(number) => number.as_f64(),
            Value::String(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    Some(0.0)
                } else {
                    trimmed.parse::<f64>().ok()
                }
            }
            Value::Array(_) | Value::Object(_) => None,
        };
        parsed.filter(|number| number.is_finite())
    }

    fn is_truthy(value: &Value) -> bool {
        match value {
            Value::Null => false,
            Value::Bool(flag) => *flag,
            Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
            Value::String(text) => !text.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }

    pub fn count<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(number(&value).map_or(0, floor_f64_to_i64).max(0))
    }

    pub fn coordinate<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Null => None,
            other => number(&other).map(floor_f64_to_i64),
        })
    }

    pub fn positive<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(number(&value).filter(|number| *number > 0.0))
    }

    pub fn level<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(number(&value)
            .map(floor_f64_to_i64)
            .and_then(|level| u32::try_from(level).ok())
            .filter(|level| *level > 0))
    }

    pub fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(is_truthy(&value))
    }

    pub fn truthy_list<'de, D>(deserializer: D) -> Result<Vec<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Array(items) => items.iter().map(is_truthy).collect(),
            _ => Vec::new(),
        })
    }

    pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(text) => text,
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }

    pub fn focus<'de, D>(deserializer: D) -> Result<PlanningFocus, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(text) => PlanningFocus::parse(&text),
            _ => PlanningFocus::Auto,
        })
    }
}
