//! Sector, amenity and planning-focus vocabulary.
//!
//! Every alias the table and older save files use (`ECO`, `GOV`, suit names,
//! suit glyphs) is folded into the canonical enums here and nowhere else.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// District type of a developed cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SectorCode {
    #[serde(rename = "INF")]
    Infrastructure,
    #[serde(rename = "COM", alias = "ECO")]
    Commerce,
    #[serde(rename = "RES")]
    Residential,
    #[serde(rename = "CIV", alias = "GOV")]
    Civic,
}

impl SectorCode {
    pub const ALL: [Self; 4] = [
        Self::Infrastructure,
        Self::Commerce,
        Self::Residential,
        Self::Civic,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Infrastructure => "INF",
            Self::Commerce => "COM",
            Self::Residential => "RES",
            Self::Civic => "CIV",
        }
    }

    /// Long-form key used in report summaries.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Infrastructure => "infrastructure",
            Self::Commerce => "commerce",
            Self::Residential => "residential",
            Self::Civic => "civic",
        }
    }

    /// Card suit that feeds this sector.
    #[must_use]
    pub const fn suit(self) -> Suit {
        match self {
            Self::Infrastructure => Suit::Clubs,
            Self::Commerce => Suit::Diamonds,
            Self::Residential => Suit::Hearts,
            Self::Civic => Suit::Spades,
        }
    }

    /// Whether the sector counts toward the services channel.
    #[must_use]
    pub const fn is_service(self) -> bool {
        matches!(self, Self::Infrastructure | Self::Civic)
    }

    /// Normalize any accepted spelling into a sector code.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        match trimmed {
            "♣" => return Some(Self::Infrastructure),
            "♦" => return Some(Self::Commerce),
            "♥" => return Some(Self::Residential),
            "♠" => return Some(Self::Civic),
            _ => {}
        }
        match trimmed.to_ascii_uppercase().as_str() {
            "INF" | "INFRASTRUCTURE" | "CLUBS" | "C" => Some(Self::Infrastructure),
            "COM" | "ECO" | "COMMERCE" | "ECONOMY" | "DIAMONDS" | "D" => Some(Self::Commerce),
            "RES" | "RESIDENTIAL" | "HEARTS" | "H" => Some(Self::Residential),
            "CIV" | "GOV" | "CIVIC" | "GOVERNMENT" | "SPADES" | "S" => Some(Self::Civic),
            _ => None,
        }
    }
}

impl fmt::Display for SectorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectorCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or(())
    }
}

/// Card suit as named by mission descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Suit {
    #[serde(rename = "C")]
    Clubs,
    #[serde(rename = "D")]
    Diamonds,
    #[serde(rename = "H")]
    Hearts,
    #[serde(rename = "S")]
    Spades,
}

impl Suit {
    #[must_use]
    pub const fn glyph(self) -> &'static str {
        match self {
            Self::Clubs => "♣",
            Self::Diamonds => "♦",
            Self::Hearts => "♥",
            Self::Spades => "♠",
        }
    }

    #[must_use]
    pub const fn sector(self) -> SectorCode {
        match self {
            Self::Clubs => SectorCode::Infrastructure,
            Self::Diamonds => SectorCode::Commerce,
            Self::Hearts => SectorCode::Residential,
            Self::Spades => SectorCode::Civic,
        }
    }
}

/// Amenity placed on a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetKind {
    Park,
    Market,
    Clinic,
    #[serde(alias = "TRANSIT")]
    TransitStop,
}

impl AssetKind {
    pub const ALL: [Self; 4] = [Self::Park, Self::Market, Self::Clinic, Self::TransitStop];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Park => "PARK",
            Self::Market => "MARKET",
            Self::Clinic => "CLINIC",
            Self::TransitStop => "TRANSIT_STOP",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Park => "Park",
            Self::Market => "Market",
            Self::Clinic => "Clinic",
            Self::TransitStop => "Transit Stop",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PARK" => Some(Self::Park),
            "MARKET" => Some(Self::Market),
            "CLINIC" => Some(Self::Clinic),
            "TRANSIT_STOP" | "TRANSIT" => Some(Self::TransitStop),
            _ => None,
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or(())
    }
}

/// Planning focus the table may declare for a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlanningFocus {
    #[default]
    #[serde(rename = "AUTO")]
    Auto,
    #[serde(rename = "RES")]
    Residential,
    #[serde(rename = "COM")]
    Commerce,
    #[serde(rename = "INF")]
    Infrastructure,
    #[serde(rename = "CIV")]
    Civic,
}

impl PlanningFocus {
    /// Unknown spellings fall back to `Auto`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("AUTO") {
            return Self::Auto;
        }
        match SectorCode::parse(raw) {
            Some(SectorCode::Residential) => Self::Residential,
            Some(SectorCode::Commerce) => Self::Commerce,
            Some(SectorCode::Infrastructure) => Self::Infrastructure,
            Some(SectorCode::Civic) => Self::Civic,
            None => Self::Auto,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Auto => "Auto",
            Self::Residential => "Residential",
            Self::Commerce => "Commerce",
            Self::Infrastructure => "Infrastructure",
            Self::Civic => "Civic",
        }
    }
}
