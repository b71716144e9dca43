//! Manual district builds and amenity placements requested by the table.

use serde::{Deserialize, Serialize};

use crate::board::{Asset, Board, Roads};
use crate::constants::{
    EARLY_ROUND_LIMIT, LEVEL_CAP_EARLY, LEVEL_CAP_LATE, LEVEL_CAP_MID, MID_ROUND_LIMIT,
};
use crate::numbers::i64_to_index;
use crate::sector::{AssetKind, SectorCode};

use super::input::{AssetPlacement, Placement};

const OUT_OF_BOUNDS: &str = "Out of bounds";
const UNKNOWN_SECTOR: &str = "Unknown sector";
const UNKNOWN_ASSET: &str = "Unknown asset";
const NOT_ROAD_ADJACENT: &str = "Not road-adjacent";
const OCCUPIED: &str = "Occupied";
const MAX_LEVEL: &str = "Max level reached";
const ASSET_PRESENT: &str = "Asset already present";
const NO_ASSET: &str = "No asset available";
const MANUAL_UPGRADE: &str = "Manual upgrade";
const MANUAL_PLACEMENT: &str = "Manual placement";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildActionKind {
    Build,
    Upgrade,
    Skip,
    Asset,
    AssetSkip,
}

impl BuildActionKind {
    #[must_use]
    pub const fn is_skip(self) -> bool {
        matches!(self, Self::Skip | Self::AssetSkip)
    }
}

/// One line of the build log in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildAction {
    pub action: BuildActionKind,
    /// Long sector key (`residential`, ...) for district actions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
    /// `[row, col]` as requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<[i64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    pub reason: String,
}

impl BuildAction {
    fn district(action: BuildActionKind, position: Option<[i64; 2]>, reason: &str) -> Self {
        Self {
            action,
            sector: None,
            asset: None,
            position,
            level: None,
            reason: reason.to_string(),
        }
    }

    fn amenity(action: BuildActionKind, asset: String, position: Option<[i64; 2]>, reason: &str) -> Self {
        Self {
            action,
            sector: None,
            asset: Some(asset),
            position,
            level: None,
            reason: reason.to_string(),
        }
    }

    fn with_sector(mut self, sector: SectorCode) -> Self {
        self.sector = Some(sector.key().to_string());
        self
    }

    const fn with_level(mut self, level: u32) -> Self {
        self.level = Some(level);
        self
    }
}

/// Tallest level a tile may reach in `round`.
#[must_use]
pub const fn max_level_for_round(round: u32) -> u32 {
    if round <= EARLY_ROUND_LIMIT {
        LEVEL_CAP_EARLY
    } else if round <= MID_ROUND_LIMIT {
        LEVEL_CAP_MID
    } else {
        LEVEL_CAP_LATE
    }
}

fn requested_position(row: Option<i64>, col: Option<i64>) -> Option<[i64; 2]> {
    row.zip(col).map(|(row, col)| [row, col])
}

fn cell_index(board: &Board, row: Option<i64>, col: Option<i64>) -> Option<(usize, usize)> {
    let row = row.and_then(i64_to_index)?;
    let col = col.and_then(i64_to_index)?;
    board.get(row, col).map(|_| (row, col))
}

/// Apply build and upgrade requests in order.
///
/// Until roads are expanded only road-adjacent cells may be developed.
/// A request on a tile of the same sector upgrades it one level, up to
/// `level_cap`.
pub fn apply_placements(
    board: &mut Board,
    roads: &Roads,
    placements: &[Placement],
    roads_expanded: bool,
    level_cap: u32,
) -> Vec<BuildAction> {
    let mut actions = Vec::with_capacity(placements.len());
    for placement in placements {
        let position = requested_position(placement.row, placement.col);
        let Some((row, col)) = cell_index(board, placement.row, placement.col) else {
            actions.push(BuildAction::district(BuildActionKind::Skip, position, OUT_OF_BOUNDS));
            continue;
        };
        let Some(sector) = SectorCode::parse(&placement.sector) else {
            actions.push(BuildAction::district(BuildActionKind::Skip, position, UNKNOWN_SECTOR));
            continue;
        };
        if !roads_expanded && !roads.is_road_adjacent(row, col) {
            actions.push(
                BuildAction::district(BuildActionKind::Skip, position, NOT_ROAD_ADJACENT)
                    .with_sector(sector),
            );
            continue;
        }
        let Some(cell) = board.get_mut(row, col) else {
            continue;
        };
        let action = match cell.sector {
            Some(existing) if existing != sector => {
                BuildAction::district(BuildActionKind::Skip, position, OCCUPIED).with_sector(sector)
            }
            Some(_) if cell.effective_level() >= level_cap => {
                BuildAction::district(BuildActionKind::Skip, position, MAX_LEVEL)
                    .with_sector(sector)
                    .with_level(cell.effective_level())
            }
            Some(_) => {
                cell.level = (cell.effective_level() + 1).min(level_cap);
                BuildAction::district(BuildActionKind::Upgrade, position, MANUAL_UPGRADE)
                    .with_sector(sector)
                    .with_level(cell.level)
            }
            None => {
                cell.sector = Some(sector);
                cell.level = 1;
                BuildAction::district(BuildActionKind::Build, position, MANUAL_PLACEMENT)
                    .with_sector(sector)
                    .with_level(1)
            }
        };
        actions.push(action);
    }
    actions
}

/// Move queued amenities onto the requested cells.
///
/// Each successful placement consumes one matching entry from `queue`.
pub fn apply_asset_placements(
    board: &mut Board,
    queue: &mut Vec<AssetKind>,
    placements: &[AssetPlacement],
) -> Vec<BuildAction> {
    let mut actions = Vec::with_capacity(placements.len());
    for placement in placements {
        let position = requested_position(placement.row, placement.col);
        let Some((row, col)) = cell_index(board, placement.row, placement.col) else {
            actions.push(BuildAction::amenity(
                BuildActionKind::AssetSkip,
                placement.kind.clone(),
                position,
                OUT_OF_BOUNDS,
            ));
            continue;
        };
        let Some(kind) = AssetKind::parse(&placement.kind) else {
            actions.push(BuildAction::amenity(
                BuildActionKind::AssetSkip,
                placement.kind.clone(),
                position,
                UNKNOWN_ASSET,
            ));
            continue;
        };
        let label = kind.as_str().to_string();
        let Some(cell) = board.get_mut(row, col) else {
            continue;
        };
        if cell.asset.is_some() {
            actions.push(BuildAction::amenity(
                BuildActionKind::AssetSkip,
                label,
                position,
                ASSET_PRESENT,
            ));
            continue;
        }
        let Some(slot) = queue.iter().position(|queued| *queued == kind) else {
            actions.push(BuildAction::amenity(
                BuildActionKind::AssetSkip,
                label,
                position,
                NO_ASSET,
            ));
            continue;
        };
        queue.remove(slot);
        cell.asset = Some(Asset { kind });
        actions.push(BuildAction::amenity(
            BuildActionKind::Asset,
            label,
            position,
            MANUAL_PLACEMENT,
        ));
    }
    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::generate_two_corridor_roads;

    fn fixture() -> (Board, Roads) {
        (Board::new(5), generate_two_corridor_roads(5, 42))
    }

    fn adjacent_cell(roads: &Roads) -> (usize, usize) {
        (0, roads.variant.vertical_col)
    }

    fn remote_cell(roads: &Roads) -> Option<(usize, usize)> {
        (0..5)
            .flat_map(|row| (0..5).map(move |col| (row, col)))
            .find(|(row, col)| !roads.is_road_adjacent(*row, *col))
    }

    #[test]
    fn level_caps_step_up_by_round() {
        assert_eq!(max_level_for_round(1), 2);
        assert_eq!(max_level_for_round(3), 2);
        assert_eq!(max_level_for_round(4), 3);
        assert_eq!(max_level_for_round(6), 3);
        assert_eq!(max_level_for_round(7), 6);
    }

    #[test]
    fn build_then_upgrade_then_cap() {
        let (mut board, roads) = fixture();
        let (row, col) = adjacent_cell(&roads);
        let request = vec![Placement::new(row, col, SectorCode::Residential); 3];
        let actions = apply_placements(&mut board, &roads, &request, false, 2);
        let kinds: Vec<_> = actions.iter().map(|action| action.action).collect();
        assert_eq!(
            kinds,
            vec![
                BuildActionKind::Build,
                BuildActionKind::Upgrade,
                BuildActionKind::Skip
            ]
        );
        assert_eq!(actions[0].reason, "Manual placement");
        assert_eq!(actions[0].sector.as_deref(), Some("residential"));
        assert_eq!(actions[1].reason, "Manual upgrade");
        assert_eq!(actions[2].reason, "Max level reached");
        assert_eq!(board.get(row, col).map(|cell| cell.level), Some(2));
    }

    #[test]
    fn other_sector_is_occupied() {
        let (mut board, roads) = fixture();
        let (row, col) = adjacent_cell(&roads);
        let request = vec![
            Placement::new(row, col, SectorCode::Commerce),
            Placement::new(row, col, SectorCode::Civic),
        ];
        let actions = apply_placements(&mut board, &roads, &request, false, 3);
        assert_eq!(actions[1].action, BuildActionKind::Skip);
        assert_eq!(actions[1].reason, "Occupied");
        assert_eq!(
            board.get(row, col).and_then(|cell| cell.sector),
            Some(SectorCode::Commerce)
        );
    }

    #[test]
    fn remote_cells_need_expanded_roads() {
        let (mut board, roads) = fixture();
        let Some((row, col)) = remote_cell(&roads) else {
            return;
        };
        let request = vec![Placement::new(row, col, SectorCode::Civic)];
        let skipped = apply_placements(&mut board, &roads, &request, false, 2);
        assert_eq!(skipped[0].reason, "Not road-adjacent");
        let built = apply_placements(&mut board, &roads, &request, true, 2);
        assert_eq!(built[0].action, BuildActionKind::Build);
    }

    #[test]
    fn malformed_requests_become_skips() {
        let (mut board, roads) = fixture();
        let request = vec![
            Placement {
                row: Some(9),
                col: Some(0),
                sector: "RES".into(),
            },
            Placement {
                row: None,
                col: Some(1),
                sector: "RES".into(),
            },
            Placement {
                row: Some(0),
                col: Some(0),
                sector: "PLAZA".into(),
            },
        ];
        let actions = apply_placements(&mut board, &roads, &request, true, 2);
        let reasons: Vec<_> = actions.iter().map(|action| action.reason.as_str()).collect();
        assert_eq!(reasons, vec!["Out of bounds", "Out of bounds", "Unknown sector"]);
        assert_eq!(board.developed().count(), 0);
    }

    #[test]
    fn assets_consume_the_queue() {
        let mut board = Board::new(5);
        let mut queue = vec![AssetKind::Park, AssetKind::Clinic];
        let request = vec![
            AssetPlacement::new(1, 1, AssetKind::Park),
            AssetPlacement::new(1, 1, AssetKind::Clinic),
            AssetPlacement::new(2, 2, AssetKind::Market),
            AssetPlacement {
                row: Some(0),
                col: Some(0),
                kind: "FOUNTAIN".into(),
            },
            AssetPlacement::new(7, 7, AssetKind::Clinic),
        ];
        let actions = apply_asset_placements(&mut board, &mut queue, &request);
        let reasons: Vec<_> = actions.iter().map(|action| action.reason.as_str()).collect();
        assert_eq!(
            reasons,
            vec![
                "Manual placement",
                "Asset already present",
                "No asset available",
                "Unknown asset",
                "Out of bounds"
            ]
        );
        assert_eq!(actions[0].action, BuildActionKind::Asset);
        assert!(actions[1..].iter().all(|action| action.action.is_skip()));
        assert_eq!(queue, vec![AssetKind::Clinic]);
        assert_eq!(
            board.get(1, 1).and_then(|cell| cell.asset_kind()),
            Some(AssetKind::Park)
        );
    }

    #[test]
    fn actions_serialize_with_kebab_kinds() {
        let action = BuildAction::amenity(
            BuildActionKind::AssetSkip,
            "PARK".into(),
            Some([0, 1]),
            NO_ASSET,
        );
        let json = serde_json::to_string(&action).unwrap();
        assert!(json.contains("\"action\":\"asset-skip\""));
        assert!(json.contains("\"position\":[0,1]"));
        assert!(!json.contains("sector"));
    }
}
