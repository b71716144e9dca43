//! Board-derived inputs to the growth gate: developed totals, amenity and
//! layout bonuses, adjacency effects and road connectivity.

use serde::{Deserialize, Serialize};

use crate::board::{Board, Cell, Roads};
use crate::constants::{
    AMENITY_TRIGGER_CAP, CRITICAL_MASS_LEVEL, CRITICAL_MASS_TILES, PARTIAL_UNLOCK_FACTOR,
    ROAD_FACTOR_FLOOR, TRANSIT_ROAD_NUDGE,
};
use crate::numbers::{floor_f64_to_i64, i64_to_f64, usize_to_f64};
use crate::sector::{AssetKind, SectorCode};
use crate::state::CityState;

/// Sum of developed levels per sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DevelopedSummary {
    pub residential: i64,
    pub commerce: i64,
    pub civic: i64,
    pub infrastructure: i64,
}

impl DevelopedSummary {
    #[must_use]
    pub const fn get(&self, sector: SectorCode) -> i64 {
        match sector {
            SectorCode::Residential => self.residential,
            SectorCode::Commerce => self.commerce,
            SectorCode::Civic => self.civic,
            SectorCode::Infrastructure => self.infrastructure,
        }
    }

    fn slot(&mut self, sector: SectorCode) -> &mut i64 {
        match sector {
            SectorCode::Residential => &mut self.residential,
            SectorCode::Commerce => &mut self.commerce,
            SectorCode::Civic => &mut self.civic,
            SectorCode::Infrastructure => &mut self.infrastructure,
        }
    }

    #[must_use]
    pub const fn any_positive(&self) -> bool {
        self.residential > 0 || self.commerce > 0 || self.civic > 0 || self.infrastructure > 0
    }

    #[must_use]
    pub const fn total(&self) -> i64 {
        self.residential + self.commerce + self.civic + self.infrastructure
    }

    /// Floor every sector after scaling by `factor`.
    #[must_use]
    pub fn derated(self, factor: f64) -> Self {
        let scale = |value: i64| floor_f64_to_i64(i64_to_f64(value) * factor);
        Self {
            residential: scale(self.residential),
            commerce: scale(self.commerce),
            civic: scale(self.civic),
            infrastructure: scale(self.infrastructure),
        }
    }
}

/// Sum developed levels, optionally counting road-adjacent cells only.
#[must_use]
pub fn summarize_developed(board: &Board, roads: &Roads, road_only: bool) -> DevelopedSummary {
    let mut summary = DevelopedSummary::default();
    for cell in counted_cells(board, roads, road_only) {
        if let Some(sector) = cell.sector {
            *summary.slot(sector) += i64::from(cell.effective_level());
        }
    }
    summary
}

/// Developed summary as the growth gate sees it for this city.
///
/// Until the road network is expanded only road-adjacent cells count, and a
/// city whose highways are authorised but not yet built runs at half weight.
#[must_use]
pub fn developed_for_city(board: &Board, roads: &Roads, city: &CityState) -> DevelopedSummary {
    let road_only = !city.roads_expanded;
    let summary = summarize_developed(board, roads, road_only);
    if city.highways_unlocked && !city.roads_expanded {
        summary.derated(PARTIAL_UNLOCK_FACTOR)
    } else {
        summary
    }
}

/// Capacity granted by amenities touching developed tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssetBonuses {
    pub residents: i64,
    pub jobs: i64,
    pub services: i64,
    pub road_boost: i64,
    pub park_count: i64,
    pub clinic_count: i64,
    pub market_count: i64,
    pub transit_count: i64,
}

impl AssetBonuses {
    #[must_use]
    pub const fn capacity_total(&self) -> i64 {
        self.residents + self.jobs + self.services
    }
}

/// Amenity bonuses; all zero while highways are locked.
///
/// Each amenity type contributes at most three triggers city-wide.
#[must_use]
pub fn compute_asset_bonuses(board: &Board, roads: &Roads, highways_unlocked: bool) -> AssetBonuses {
    let mut bonus = AssetBonuses::default();
    if !highways_unlocked {
        return bonus;
    }
    for cell in board.cells() {
        let Some(kind) = cell.asset_kind() else {
            continue;
        };
        match kind {
            AssetKind::Park => bonus.park_count += 1,
            AssetKind::Clinic => bonus.clinic_count += 1,
            AssetKind::Market => bonus.market_count += 1,
            AssetKind::TransitStop => bonus.transit_count += 1,
        }
        for neighbor in board.neighbors(cell.row, cell.col) {
            let Some(sector) = neighbor.sector else {
                continue;
            };
            match (kind, sector) {
                (AssetKind::Park, SectorCode::Residential) if bonus.residents < AMENITY_TRIGGER_CAP => {
                    bonus.residents += 1;
                }
                (AssetKind::Market, SectorCode::Commerce) if bonus.jobs < AMENITY_TRIGGER_CAP => {
                    bonus.jobs += 1;
                }
                (AssetKind::Clinic, SectorCode::Civic | SectorCode::Infrastructure)
                    if bonus.services < AMENITY_TRIGGER_CAP =>
                {
                    bonus.services += 1;
                }
                _ => {}
            }
        }
        if kind == AssetKind::TransitStop
            && bonus.road_boost < AMENITY_TRIGGER_CAP
            && roads.cell_is_road_adjacent(cell)
        {
            bonus.road_boost += 1;
        }
    }
    bonus
}

/// Critical-mass and tall-building bonuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutBonuses {
    pub residents: i64,
    pub jobs: i64,
    pub services: i64,
}

impl LayoutBonuses {
    #[must_use]
    pub const fn total(&self) -> i64 {
        self.residents + self.jobs + self.services
    }
}

#[derive(Default)]
struct SectorTally {
    tiles: usize,
    max_level: u32,
}

impl SectorTally {
    fn add(&mut self, level: u32) {
        self.tiles += 1;
        self.max_level = self.max_level.max(level);
    }
}

/// +1 per channel at five tiles, +1 more when its tallest tile reaches level 5.
/// Civic and infrastructure share the services channel.
#[must_use]
pub fn compute_layout_bonuses(board: &Board, roads: &Roads, road_only: bool) -> LayoutBonuses {
    let mut residential = SectorTally::default();
    let mut commerce = SectorTally::default();
    let mut services = SectorTally::default();
    for cell in counted_cells(board, roads, road_only) {
        let level = cell.effective_level();
        match cell.sector {
            Some(SectorCode::Residential) => residential.add(level),
            Some(SectorCode::Commerce) => commerce.add(level),
            Some(SectorCode::Civic | SectorCode::Infrastructure) => services.add(level),
            None => {}
        }
    }
    let channel = |tally: &SectorTally| {
        i64::from(tally.tiles >= CRITICAL_MASS_TILES)
            + i64::from(tally.max_level >= CRITICAL_MASS_LEVEL)
    };
    LayoutBonuses {
        residents: channel(&residential),
        jobs: channel(&commerce),
        services: channel(&services),
    }
}

/// Attraction and pressure produced by neighbouring districts this round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjacencyEffects {
    pub attraction_delta: i64,
    pub pressure_delta: i64,
}

impl AdjacencyEffects {
    #[must_use]
    pub const fn is_neutral(&self) -> bool {
        self.attraction_delta == 0 && self.pressure_delta == 0
    }
}

/// Walk every ordered pair of developed orthogonal neighbours.
///
/// Homes beside civic buildings attract, homes beside commerce build
/// pressure, and any infrastructure contact relieves one pressure per round.
#[must_use]
pub fn adjacency_effects(board: &Board) -> AdjacencyEffects {
    let mut effects = AdjacencyEffects::default();
    let mut infrastructure_touch = false;
    for cell in board.developed() {
        let Some(sector) = cell.sector else {
            continue;
        };
        for neighbor in board.neighbors(cell.row, cell.col) {
            let Some(other) = neighbor.sector else {
                continue;
            };
            match (sector, other) {
                (SectorCode::Residential, SectorCode::Civic)
                | (SectorCode::Civic, SectorCode::Residential) => effects.attraction_delta += 1,
                (SectorCode::Residential, SectorCode::Commerce)
                | (SectorCode::Commerce, SectorCode::Residential) => effects.pressure_delta += 1,
                _ => {}
            }
            if sector == SectorCode::Infrastructure || other == SectorCode::Infrastructure {
                infrastructure_touch = true;
            }
        }
    }
    if infrastructure_touch {
        effects.pressure_delta -= 1;
    }
    effects
}

/// Share of developed cells with road access and the growth factor it yields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoadFactor {
    pub factor: f64,
    pub connected: usize,
    pub developed: usize,
}

/// `connected / developed` clamped to `[0.3, 1]`, nudged up by transit stops
/// and any tuning bonus, never above 1. An empty board runs at full speed.
#[must_use]
pub fn compute_road_factor(
    board: &Board,
    roads: &Roads,
    road_boost: i64,
    road_adjacency_bonus: f64,
) -> RoadFactor {
    let developed = board.developed().count();
    let connected = board
        .developed()
        .filter(|cell| roads.cell_is_road_adjacent(cell))
        .count();
    if developed == 0 {
        return RoadFactor {
            factor: 1.0,
            connected,
            developed,
        };
    }
    let ratio = usize_to_f64(connected) / usize_to_f64(developed);
    let mut factor = ratio.clamp(ROAD_FACTOR_FLOOR, 1.0);
    if road_boost > 0 {
        factor = (factor + TRANSIT_ROAD_NUDGE * i64_to_f64(road_boost)).min(1.0);
    }
    if road_adjacency_bonus > 0.0 {
        factor = (factor + road_adjacency_bonus).min(1.0);
    }
    RoadFactor {
        factor,
        connected,
        developed,
    }
}

/// One-line observation about how districts sit together, or `None`.
#[must_use]
pub fn synergy_hint(board: &Board) -> Option<&'static str> {
    let mut homes_near_jobs = 0;
    let mut homes_far_from_jobs = 0;
    let mut civic_cluster = 0;
    let mut civic_serving_homes = 0;
    let mut infrastructure_hubs = 0;
    let mut vertical = false;

    for cell in board.developed() {
        if cell.level > 1 {
            vertical = true;
        }
        let touching = |wanted: SectorCode| {
            board
                .neighbors(cell.row, cell.col)
                .iter()
                .any(|neighbor| neighbor.sector == Some(wanted))
        };
        match cell.sector {
            Some(SectorCode::Residential) => {
                if touching(SectorCode::Commerce) {
                    homes_near_jobs += 1;
                } else {
                    homes_far_from_jobs += 1;
                }
            }
            Some(SectorCode::Civic) => {
                civic_cluster += i32::from(touching(SectorCode::Civic));
                civic_serving_homes += i32::from(touching(SectorCode::Residential));
            }
            Some(SectorCode::Infrastructure) => {
                let kinds = [
                    SectorCode::Residential,
                    SectorCode::Commerce,
                    SectorCode::Civic,
                ]
                .into_iter()
                .filter(|kind| touching(*kind))
                .count();
                if kinds >= 2 {
                    infrastructure_hubs += 1;
                }
            }
            Some(SectorCode::Commerce) | None => {}
        }
    }

    if homes_far_from_jobs > homes_near_jobs {
        Some("Most residential growth occurred away from jobs.")
    } else if civic_cluster > civic_serving_homes {
        Some("Civic services are clustered but underutilized.")
    } else if infrastructure_hubs > 0 {
        Some("Road access is improving efficiency across districts.")
    } else if vertical {
        Some("Vertical growth is compensating for limited space.")
    } else {
        None
    }
}

fn counted_cells<'a>(
    board: &'a Board,
    roads: &'a Roads,
    road_only: bool,
) -> impl Iterator<Item = &'a Cell> {
    board
        .developed()
        .filter(move |cell| !road_only || roads.cell_is_road_adjacent(cell))
}
