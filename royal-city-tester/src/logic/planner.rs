//! Table heuristics used by autorun: where the tricks get built.

use rand::Rng;
use rand::seq::SliceRandom;
use royal_city_game::resolver::max_level_for_round;
use royal_city_game::{
    AssetKind, AssetPlacement, CampaignState, Cell, Placement, SectorCode, SuitCounts,
};
use std::collections::HashMap;

/// Placements a table would submit for one round.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoundPlan {
    pub placements: Vec<Placement>,
    pub asset_placements: Vec<AssetPlacement>,
}

/// Sectors in the order the table spends its tricks.
const BUILD_ORDER: [SectorCode; 4] = [
    SectorCode::Infrastructure,
    SectorCode::Commerce,
    SectorCode::Residential,
    SectorCode::Civic,
];

/// Spend each suit's tricks on its sector: upgrades first, then the best
/// scoring empty lots. Queued amenities go to their best free slot.
pub fn plan_round<R: Rng>(
    state: &CampaignState,
    suits: &SuitCounts,
    rng: &mut R,
) -> RoundPlan {
    let max_level = max_level_for_round(state.round);
    let roads_open = state.city.roads_expanded || state.city.highways_unlocked;
    let reachable = |cell: &Cell| roads_open || state.roads.cell_is_road_adjacent(cell);
    let mut pending: HashMap<(usize, usize), u32> = HashMap::new();
    let mut placements = Vec::new();

    for sector in BUILD_ORDER {
        let mut remaining = usize::try_from(suits.for_sector(sector).max(0)).unwrap_or(0);
        if remaining == 0 {
            continue;
        }

        let mut upgrades: Vec<&Cell> = state
            .board
            .cells()
            .filter(|cell| cell.sector == Some(sector) && reachable(*cell))
            .filter(|cell| current_level(cell, &pending) < max_level)
            .collect();
        upgrades.shuffle(rng);
        for cell in upgrades {
            if remaining == 0 {
                break;
            }
            if current_level(cell, &pending) + 1 > max_level {
                continue;
            }
            placements.push(Placement::new(cell.row, cell.col, sector));
            *pending.entry((cell.row, cell.col)).or_default() += 1;
            remaining -= 1;
        }
        if remaining == 0 {
            continue;
        }

        let mut scored: Vec<(f64, &Cell)> = state
            .board
            .cells()
            .filter(|cell| cell.sector.is_none() && reachable(*cell))
            .filter(|cell| !pending.contains_key(&(cell.row, cell.col)))
            .map(|cell| {
                let jitter: f64 = rng.r#gen();
                (score_build(state, cell, sector) + jitter * 0.01, cell)
            })
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        for (_, cell) in scored.into_iter().take(remaining) {
            placements.push(Placement::new(cell.row, cell.col, sector));
            *pending.entry((cell.row, cell.col)).or_default() += 1;
        }
    }

    let mut taken: Vec<(usize, usize)> = Vec::new();
    let mut asset_placements = Vec::new();
    for kind in &state.unplaced_assets {
        if let Some((row, col)) = pick_asset_slot(state, *kind, &taken, rng) {
            taken.push((row, col));
            asset_placements.push(AssetPlacement::new(row, col, *kind));
        }
    }

    RoundPlan {
        placements,
        asset_placements,
    }
}

fn current_level(cell: &Cell, pending: &HashMap<(usize, usize), u32>) -> u32 {
    cell.level + pending.get(&(cell.row, cell.col)).copied().unwrap_or(0)
}

/// Neighbour synergy for building `sector` on an empty `cell`.
#[must_use]
pub fn score_build(state: &CampaignState, cell: &Cell, sector: SectorCode) -> f64 {
    let mut score = 0.0;
    for neighbor in state.board.neighbors(cell.row, cell.col) {
        let Some(adjacent) = neighbor.sector else {
            continue;
        };
        score += match (sector, adjacent) {
            (SectorCode::Residential, SectorCode::Commerce)
            | (SectorCode::Commerce, SectorCode::Residential) => 2.0,
            (SectorCode::Civic, SectorCode::Residential) | (SectorCode::Infrastructure, _) => 1.0,
            _ => 0.0,
        };
    }
    if cell.sector.is_none() {
        score += 0.5;
    }
    score
}

#[must_use]
pub fn score_asset(state: &CampaignState, cell: &Cell, kind: AssetKind) -> f64 {
    let mut score = 0.0;
    for neighbor in state.board.neighbors(cell.row, cell.col) {
        score += match (kind, neighbor.sector) {
            (AssetKind::Park, Some(SectorCode::Residential))
            | (AssetKind::Market, Some(SectorCode::Commerce))
            | (AssetKind::Clinic, Some(SectorCode::Civic | SectorCode::Infrastructure)) => 2.0,
            _ => 0.0,
        };
    }
    if kind == AssetKind::TransitStop && state.roads.cell_is_road_adjacent(cell) {
        score += 2.0;
    }
    score
}

fn pick_asset_slot<R: Rng>(
    state: &CampaignState,
    kind: AssetKind,
    taken: &[(usize, usize)],
    rng: &mut R,
) -> Option<(usize, usize)> {
    let mut best: Option<(f64, (usize, usize))> = None;
    for cell in state.board.cells() {
        if cell.asset.is_some()
            || !state.roads.cell_is_road_adjacent(cell)
            || taken.contains(&(cell.row, cell.col))
        {
            continue;
        }
        let jitter: f64 = rng.r#gen();
        let score = score_asset(state, cell, kind) + jitter * 0.01;
        if best.is_none_or(|(top, _)| score > top) {
            best = Some((score, (cell.row, cell.col)));
        }
    }
    best.map(|(_, slot)| slot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use royal_city_game::{PlayersInput, new_campaign};

    #[test]
    fn spends_each_trick_on_a_reachable_lot() {
        let state = new_campaign(42, &PlayersInput::default());
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let suits = SuitCounts::new(2, 1, 3, 1);
        let plan = plan_round(&state, &suits, &mut rng);
        assert_eq!(plan.placements.len(), 7);
        for placement in &plan.placements {
            let row = usize::try_from(placement.row.unwrap()).unwrap();
            let col = usize::try_from(placement.col.unwrap()).unwrap();
            assert!(state.roads.is_road_adjacent(row, col));
        }
        let mut cells: Vec<_> = plan.placements.iter().map(|p| (p.row, p.col)).collect();
        cells.sort_unstable();
        cells.dedup();
        assert_eq!(cells.len(), 7);
        assert_eq!(plan.placements[0].sector, "INF");
    }

    #[test]
    fn upgrades_existing_tiles_before_new_lots() {
        let mut state = new_campaign(42, &PlayersInput::default());
        let (row, col) = state
            .board
            .cells()
            .find(|cell| state.roads.cell_is_road_adjacent(cell))
            .map(|cell| (cell.row, cell.col))
            .unwrap();
        let cell = state.board.get_mut(row, col).unwrap();
        cell.sector = Some(SectorCode::Residential);
        cell.level = 1;

        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let plan = plan_round(&state, &SuitCounts::new(0, 0, 2, 0), &mut rng);
        let first = &plan.placements[0];
        assert_eq!(
            (first.row, first.col),
            (Some(i64::try_from(row).unwrap()), Some(i64::try_from(col).unwrap()))
        );
        assert_ne!((plan.placements[1].row, plan.placements[1].col), (first.row, first.col));
    }

    #[test]
    fn queued_assets_get_distinct_slots() {
        let mut state = new_campaign(8, &PlayersInput::default());
        state.unplaced_assets = vec![AssetKind::Park, AssetKind::TransitStop];
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let plan = plan_round(&state, &SuitCounts::default(), &mut rng);
        assert!(plan.placements.is_empty());
        assert_eq!(plan.asset_placements.len(), 2);
        assert_ne!(
            (plan.asset_placements[0].row, plan.asset_placements[0].col),
            (plan.asset_placements[1].row, plan.asset_placements[1].col)
        );
    }

    #[test]
    fn residential_scores_commerce_neighbors() {
        let mut state = new_campaign(5, &PlayersInput::default());
        state.board.get_mut(2, 3).unwrap().sector = Some(SectorCode::Commerce);
        let empty = state.board.get(2, 2).unwrap().clone();
        let res = score_build(&state, &empty, SectorCode::Residential);
        let civ = score_build(&state, &empty, SectorCode::Civic);
        assert!((res - 2.5).abs() < f64::EPSILON);
        assert!((civ - 0.5).abs() < f64::EPSILON);
    }
}
