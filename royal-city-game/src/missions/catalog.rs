use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;
use thiserror::Error;

use super::{Mission, MissionTier};
use crate::constants::MAX_DIFFICULTY;

pub(crate) const DEFAULT_MISSION_DATA: &str = include_str!("../../assets/missions.json");

/// Errors raised while loading a mission catalog.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("mission catalog could not be parsed: {0}")]
    Parse(String),
    #[error("mission id {0} appears more than once")]
    DuplicateId(String),
    #[error("mission {id} has difficulty {difficulty}; expected 1..=5")]
    Difficulty { id: String, difficulty: u8 },
    #[error("mission {id} sits in the {section} section but is not {expected:?}")]
    TierMismatch {
        id: String,
        section: &'static str,
        expected: MissionTier,
    },
}

/// Static pool of mission templates.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MissionCatalog {
    #[serde(default)]
    pub version: String,
    /// Regular primaries and optionals.
    #[serde(default)]
    pub core: Vec<Mission>,
    /// Cleanup optionals offered only while the city has blight.
    #[serde(default)]
    pub blight: Vec<Mission>,
    /// Highway authorisation primaries offered while highways are locked.
    #[serde(default)]
    pub highway: Vec<Mission>,
}

impl MissionCatalog {
    #[must_use]
    pub fn load_from_static() -> Self {
        serde_json::from_str(DEFAULT_MISSION_DATA).unwrap_or_default()
    }

    #[must_use]
    pub fn default_catalog() -> &'static Self {
        static CATALOG: OnceLock<MissionCatalog> = OnceLock::new();
        CATALOG.get_or_init(Self::load_from_static)
    }

    /// Parse and validate a catalog.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` when the JSON is malformed, an id repeats, a
    /// difficulty falls outside `1..=5`, or a blight/highway entry has the
    /// wrong tier.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Self =
            serde_json::from_str(json).map_err(|err| CatalogError::Parse(err.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// # Errors
    ///
    /// See [`MissionCatalog::from_json`].
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for mission in self.all() {
            if !seen.insert(mission.id.as_str()) {
                return Err(CatalogError::DuplicateId(mission.id.clone()));
            }
            if !(1..=MAX_DIFFICULTY).contains(&mission.difficulty) {
                return Err(CatalogError::Difficulty {
                    id: mission.id.clone(),
                    difficulty: mission.difficulty,
                });
            }
        }
        check_section(&self.blight, "blight", MissionTier::Optional)?;
        check_section(&self.highway, "highway", MissionTier::Primary)
    }

    /// Every template, core first.
    pub fn all(&self) -> impl Iterator<Item = &Mission> {
        self.core
            .iter()
            .chain(self.blight.iter())
            .chain(self.highway.iter())
    }

    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Mission> {
        self.all().find(|mission| mission.id == id)
    }
}

fn check_section(
    missions: &[Mission],
    section: &'static str,
    expected: MissionTier,
) -> Result<(), CatalogError> {
    match missions.iter().find(|mission| mission.tier != expected) {
        Some(mission) => Err(CatalogError::TierMismatch {
            id: mission.id.clone(),
            section,
            expected,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::missions::MissionTag;
    use crate::rewards::{Reward, SystemUnlock};

    #[test]
    fn bundled_catalog_validates() {
        let catalog = MissionCatalog::from_json(DEFAULT_MISSION_DATA).expect("bundled data");
        assert_eq!(catalog.core.len(), 35);
        assert_eq!(catalog.blight.len(), 4);
        assert_eq!(catalog.highway.len(), 4);
        assert_eq!(MissionCatalog::default_catalog(), &catalog);
    }

    #[test]
    fn blight_and_highway_sections_are_shaped() {
        let catalog = MissionCatalog::default_catalog();
        assert!(catalog.blight.iter().all(|m| m.has_tag(MissionTag::Blight)));
        assert!(catalog.blight.iter().all(|m| matches!(m.reward, Some(Reward::Blight { .. }))));
        assert!(catalog.highway.iter().all(|m| m.reward
            == Some(Reward::System {
                id: SystemUnlock::UnlockHighways
            })));
        let sweep = catalog.find("B_H4_TARGETED_SWEEP").unwrap();
        assert_eq!(sweep.reward, Some(Reward::Blight { remove: 2 }));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let json = r#"{"core":[
            {"id":"X","tier":"PRIMARY","difficulty":1,"text":"a","check":{"kind":"ROLE_WINS_FIRST_TRICK"}},
            {"id":"X","tier":"OPTIONAL","difficulty":1,"text":"b","check":{"kind":"ROLE_WINS_FIRST_TRICK"}}
        ]}"#;
        assert_eq!(
            MissionCatalog::from_json(json),
            Err(CatalogError::DuplicateId("X".into()))
        );
    }

    #[test]
    fn out_of_range_difficulty_is_rejected() {
        let json = r#"{"core":[
            {"id":"Y","tier":"PRIMARY","difficulty":7,"text":"a","check":{"kind":"ROLE_WINS_FIRST_TRICK"}}
        ]}"#;
        assert!(matches!(
            MissionCatalog::from_json(json),
            Err(CatalogError::Difficulty { difficulty: 7, .. })
        ));
    }

    #[test]
    fn blight_section_must_be_optional() {
        let json = r#"{"blight":[
            {"id":"B","tier":"PRIMARY","difficulty":2,"text":"a","check":{"kind":"ROLE_WINS_FIRST_TRICK"}}
        ]}"#;
        assert!(matches!(
            MissionCatalog::from_json(json),
            Err(CatalogError::TierMismatch { section: "blight", .. })
        ));
    }
}
