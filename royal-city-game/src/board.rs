//! City grid and road corridors.
//!
//! Roads live on the edges between cells, never inside them:
//! `h[y][x]` joins `(x, y)` to `(x + 1, y)` and `v[y][x]` joins `(x, y)` to
//! `(x, y + 1)`.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::numbers::{floor_f64_to_i64, usize_to_f64};
use crate::rng::Mulberry32;
use crate::sector::{AssetKind, SectorCode};

/// Amenity sitting on a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    #[serde(rename = "type")]
    pub kind: AssetKind,
}

/// A single grid cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
    #[serde(default)]
    pub sector: Option<SectorCode>,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub asset: Option<Asset>,
}

impl Cell {
    #[must_use]
    pub const fn empty(row: usize, col: usize) -> Self {
        Self {
            row,
            col,
            sector: None,
            level: 0,
            asset: None,
        }
    }

    #[must_use]
    pub const fn is_developed(&self) -> bool {
        self.sector.is_some()
    }

    /// Level used for scoring; developed cells never count below 1.
    #[must_use]
    pub const fn effective_level(&self) -> u32 {
        if self.sector.is_none() {
            0
        } else if self.level == 0 {
            1
        } else {
            self.level
        }
    }

    #[must_use]
    pub fn asset_kind(&self) -> Option<AssetKind> {
        self.asset.map(|asset| asset.kind)
    }
}

/// Square grid of cells, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    rows: Vec<Vec<Cell>>,
}

impl Board {
    #[must_use]
    pub fn new(size: usize) -> Self {
        let rows = (0..size)
            .map(|row| (0..size).map(|col| Cell::empty(row, col)).collect())
            .collect();
        Self { rows }
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|cells| cells.get(col))
    }

    pub fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut Cell> {
        self.rows.get_mut(row).and_then(|cells| cells.get_mut(col))
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.rows.iter().flatten()
    }

    pub fn developed(&self) -> impl Iterator<Item = &Cell> {
        self.cells().filter(|cell| cell.is_developed())
    }

    /// Orthogonal in-grid neighbours, ordered right, left, down, up.
    #[must_use]
    pub fn neighbors(&self, row: usize, col: usize) -> SmallVec<[&Cell; 4]> {
        let mut found = SmallVec::new();
        let offsets: [(isize, isize); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
        for (dx, dy) in offsets {
            let (Some(nx), Some(ny)) = (col.checked_add_signed(dx), row.checked_add_signed(dy))
            else {
                continue;
            };
            if let Some(cell) = self.get(ny, nx) {
                found.push(cell);
            }
        }
        found
    }

    /// Number of placed amenities.
    #[must_use]
    pub fn asset_count(&self) -> usize {
        self.cells().filter(|cell| cell.asset.is_some()).count()
    }

    #[must_use]
    pub fn count_assets(&self, kind: AssetKind) -> usize {
        self.cells()
            .filter(|cell| cell.asset_kind() == Some(kind))
            .count()
    }

    #[must_use]
    pub fn max_stack_height(&self) -> u32 {
        self.cells()
            .map(Cell::effective_level)
            .max()
            .unwrap_or_default()
    }

    /// Levels of developed cells, tallest first.
    #[must_use]
    pub fn stack_levels(&self) -> Vec<u32> {
        let mut levels: Vec<u32> = self.developed().map(Cell::effective_level).collect();
        levels.sort_unstable_by(|a, b| b.cmp(a));
        levels
    }

    #[must_use]
    pub fn snapshot(&self) -> BoardSnapshot {
        let levels = self.stack_levels();
        BoardSnapshot {
            developed_tiles: levels.len(),
            upgraded_tiles: levels.iter().filter(|level| **level > 1).count(),
            total_assets: self.asset_count(),
            max_stack_height: levels.first().copied().unwrap_or_default(),
            stack_sum: levels.iter().sum(),
            top_stacks: levels.iter().take(3).copied().collect(),
        }
    }
}

/// Aggregate board shape echoed in round reports.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub developed_tiles: usize,
    pub upgraded_tiles: usize,
    pub total_assets: usize,
    pub max_stack_height: u32,
    pub stack_sum: u32,
    pub top_stacks: Vec<u32>,
}

/// Seams chosen by the corridor generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadVariant {
    pub vertical_col: usize,
    pub horizontal_row: usize,
}

/// Edge-indexed road presence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roads {
    pub h: Vec<Vec<bool>>,
    pub v: Vec<Vec<bool>>,
    pub variant: RoadVariant,
}

impl Roads {
    /// Whether any edge touching the cell carries a road.
    #[must_use]
    pub fn is_road_adjacent(&self, row: usize, col: usize) -> bool {
        let edge = |grid: &[Vec<bool>], y: usize, x: usize| {
            grid.get(y)
                .and_then(|cells| cells.get(x))
                .copied()
                .unwrap_or(false)
        };
        let left = col > 0 && edge(&self.h, row, col - 1);
        let right = edge(&self.h, row, col);
        let top = row > 0 && edge(&self.v, row - 1, col);
        let bottom = edge(&self.v, row, col);
        left || right || top || bottom
    }

    #[must_use]
    pub fn cell_is_road_adjacent(&self, cell: &Cell) -> bool {
        self.is_road_adjacent(cell.row, cell.col)
    }
}

/// One full-height vertical corridor and one full-width horizontal corridor,
/// each placed on a seed-chosen seam.
#[must_use]
pub fn generate_two_corridor_roads(size: usize, seed: u32) -> Roads {
    let seams = size.saturating_sub(1);
    let mut h = vec![vec![false; seams]; size];
    let mut v = vec![vec![false; size]; seams];

    let mut rng = Mulberry32::new(seed);
    let vertical_col = seam_index(rng.next_f64(), seams);
    let horizontal_row = seam_index(rng.next_f64(), seams);

    if seams > 0 {
        for row in &mut h {
            row[vertical_col] = true;
        }
        for cell in &mut v[horizontal_row] {
            *cell = true;
        }
    }

    Roads {
        h,
        v,
        variant: RoadVariant {
            vertical_col,
            horizontal_row,
        },
    }
}

fn seam_index(unit: f64, seams: usize) -> usize {
    let raw = floor_f64_to_i64(unit * usize_to_f64(seams));
    usize::try_from(raw)
        .unwrap_or(0)
        .min(seams.saturating_sub(1))
}
