//! Per-round mission drafting.

use super::conflict::{Substitution, resolve_conflicts};
use super::{Mission, MissionCatalog, MissionSet, MissionTier};
use crate::constants::{
    DEFAULT_OPTIONAL_COUNT, HIGHWAY_OFFER_MIN_ROUND, MAX_DIFFICULTY, PICK_JITTER,
    RECENT_HISTORY_WINDOW,
};
use crate::numbers::{i64_to_f64, unit_to_index};
use crate::report::Report;
use crate::rng::{Mulberry32, mission_stream_seed};
use crate::state::{CampaignState, Player};

/// Knobs for a single draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftOptions {
    pub salt: u32,
    /// Ids offered in recent rounds; never offered again this round.
    pub recent_ids: Vec<String>,
    pub blight: u32,
    pub highways_unlocked: bool,
    pub primary_count: usize,
    pub optional_count: usize,
}

impl Default for DraftOptions {
    fn default() -> Self {
        Self {
            salt: 0,
            recent_ids: Vec::new(),
            blight: 0,
            highways_unlocked: false,
            primary_count: 1,
            optional_count: DEFAULT_OPTIONAL_COUNT,
        }
    }
}

impl DraftOptions {
    /// Options reflecting the campaign's blight, highway and recency state.
    #[must_use]
    pub fn for_state(state: &CampaignState) -> Self {
        Self {
            recent_ids: recent_mission_ids(&state.history),
            blight: state.city.blight,
            highways_unlocked: state.city.highways_unlocked,
            ..Self::default()
        }
    }
}

/// Ids offered in the last two resolved rounds.
#[must_use]
pub fn recent_mission_ids(history: &[Report]) -> Vec<String> {
    let start = history.len().saturating_sub(RECENT_HISTORY_WINDOW);
    history[start..]
        .iter()
        .flat_map(|report| report.missions.offered_ids())
        .collect()
}

/// The cached set when it belongs to the current round, a fresh draft otherwise.
#[must_use]
pub fn missions_for_round(state: &CampaignState) -> MissionSet {
    match &state.current_missions {
        Some(set) if set.round == state.round => set.clone(),
        _ => generate_missions(
            state.seed,
            state.round,
            &state.players,
            &DraftOptions::for_state(state),
        ),
    }
}

/// Draft from the bundled catalog.
#[must_use]
pub fn generate_missions(
    seed: u32,
    round: u32,
    players: &[Player],
    options: &DraftOptions,
) -> MissionSet {
    generate_missions_from(MissionCatalog::default_catalog(), seed, round, players, options)
}

/// Draft one round's missions from `catalog`.
///
/// Difficulty targets `min(5, 1 + round / 2)` for primaries and one less for
/// optionals. With blight on the board at least one cleanup mission is always
/// offered when the pool has one left.
#[must_use]
pub fn generate_missions_from(
    catalog: &MissionCatalog,
    seed: u32,
    round: u32,
    players: &[Player],
    options: &DraftOptions,
) -> MissionSet {
    let mut rng = Mulberry32::new(mission_stream_seed(seed, round, options.salt));
    let target = difficulty_target(round);
    let optional_target = target.saturating_sub(1).max(1);

    let offer_highways = !options.highways_unlocked && round >= HIGHWAY_OFFER_MIN_ROUND;
    let pool: Vec<&Mission> = catalog
        .core
        .iter()
        .chain(catalog.blight.iter().filter(|_| options.blight > 0))
        .chain(catalog.highway.iter().filter(|_| offer_highways))
        .filter(|mission| !options.recent_ids.contains(&mission.id))
        .collect();
    let primaries: Vec<&Mission> = pool
        .iter()
        .copied()
        .filter(|mission| mission.tier == MissionTier::Primary)
        .collect();
    let optionals: Vec<Mission> = pool
        .iter()
        .copied()
        .filter(|mission| mission.tier == MissionTier::Optional)
        .cloned()
        .collect();

    let chosen_primary = pick_missions(&mut rng, &primaries, target, options.primary_count, players);
    let optional_refs: Vec<&Mission> = optionals.iter().collect();
    let mut chosen_optional = pick_missions(
        &mut rng,
        &optional_refs,
        optional_target,
        options.optional_count,
        players,
    );

    if options.blight > 0 {
        let offered_cleanup = chosen_primary
            .iter()
            .chain(chosen_optional.iter())
            .any(Mission::is_blight_cleanup);
        let cleanup_pool: Vec<&Mission> = optionals
            .iter()
            .filter(|mission| mission.is_blight_cleanup())
            .collect();
        if !offered_cleanup && !cleanup_pool.is_empty() && !chosen_optional.is_empty() {
            if let Some(template) = shuffle_pick(&mut rng, &cleanup_pool) {
                chosen_optional[0] = bind_and_instantiate(template, players, &mut rng);
            }
        }
    }

    let primary = chosen_primary.into_iter().next();
    let ctx = Substitution {
        pool: &optionals,
        difficulty_target: optional_target,
        players,
    };
    let optional = resolve_conflicts(&mut rng, primary.as_ref(), chosen_optional, &ctx);

    MissionSet {
        round,
        primary,
        optional,
    }
}

#[must_use]
pub(crate) fn difficulty_target(round: u32) -> u8 {
    let raw = 1 + round / 2;
    u8::try_from(raw).unwrap_or(MAX_DIFFICULTY).min(MAX_DIFFICULTY)
}

/// `-|difficulty - target| + jitter`; draws once from `rng`.
pub(crate) fn difficulty_score(mission: &Mission, target: u8, rng: &mut Mulberry32) -> f64 {
    let distance = (i64::from(mission.difficulty) - i64::from(target)).abs();
    -i64_to_f64(distance) + rng.next_f64() * PICK_JITTER
}

/// Pick a player for the role slot (one draw when seats exist) and render.
pub(crate) fn bind_and_instantiate(
    template: &Mission,
    players: &[Player],
    rng: &mut Mulberry32,
) -> Mission {
    let any_role = if players.is_empty() {
        None
    } else {
        players.get(unit_to_index(rng.next_f64(), players.len()))
    };
    template.instantiate(any_role)
}

fn pick_missions(
    rng: &mut Mulberry32,
    pool: &[&Mission],
    target: u8,
    count: usize,
    players: &[Player],
) -> Vec<Mission> {
    let mut available: Vec<&Mission> = pool.to_vec();
    let mut picked = Vec::with_capacity(count);
    while picked.len() < count && !available.is_empty() {
        let mut best_idx = 0;
        let mut best_score = f64::NEG_INFINITY;
        for (idx, mission) in available.iter().enumerate() {
            let score = difficulty_score(mission, target, rng);
            if score > best_score {
                best_score = score;
                best_idx = idx;
            }
        }
        let template = available.remove(best_idx);
        picked.push(bind_and_instantiate(template, players, rng));
    }
    picked
}

/// Fisher-Yates over a copy, returning the first element.
fn shuffle_pick<'a>(rng: &mut Mulberry32, items: &[&'a Mission]) -> Option<&'a Mission> {
    let mut copy = items.to_vec();
    for i in (1..copy.len()).rev() {
        let j = unit_to_index(rng.next_f64(), i + 1);
        copy.swap(i, j);
    }
    copy.first().copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::missions::{MissionTag, missions_conflict};
    use crate::state::PlayersInput;

    fn players() -> Vec<Player> {
        PlayersInput::default().build()
    }

    #[test]
    fn difficulty_target_ramps_and_caps() {
        assert_eq!(difficulty_target(1), 1);
        assert_eq!(difficulty_target(2), 2);
        assert_eq!(difficulty_target(5), 3);
        assert_eq!(difficulty_target(8), 5);
        assert_eq!(difficulty_target(40), 5);
    }

    #[test]
    fn draft_is_deterministic() {
        let options = DraftOptions::default();
        let a = generate_missions(42, 3, &players(), &options);
        let b = generate_missions(42, 3, &players(), &options);
        assert_eq!(a, b);
        assert_eq!(a.round, 3);
        assert!(a.primary.is_some());
    }

    #[test]
    fn draft_offers_primary_and_compatible_optionals() {
        for seed in 0..50 {
            for round in 1..=8 {
                let set = generate_missions(seed, round, &players(), &DraftOptions::default());
                let primary = set.primary.as_ref().expect("primary drafted");
                assert_eq!(primary.tier, MissionTier::Primary);
                assert!(set.optional.len() <= DEFAULT_OPTIONAL_COUNT);
                for (idx, optional) in set.optional.iter().enumerate() {
                    assert_eq!(optional.tier, MissionTier::Optional);
                    assert!(!missions_conflict(primary, optional));
                    for other in &set.optional[idx + 1..] {
                        assert!(!missions_conflict(optional, other));
                        assert_ne!(optional.id, other.id);
                    }
                }
                assert!(!set.missions().any(|m| m.text.contains("{ROLE:ANY}")));
            }
        }
    }

    #[test]
    fn recent_ids_are_excluded() {
        let first = generate_missions(11, 2, &players(), &DraftOptions::default());
        let recent: Vec<String> = first.ids().map(str::to_string).collect();
        let options = DraftOptions {
            recent_ids: recent.clone(),
            ..DraftOptions::default()
        };
        let second = generate_missions(11, 2, &players(), &options);
        assert!(second.ids().all(|id| !recent.iter().any(|r| r == id)));
    }

    fn small_catalog() -> MissionCatalog {
        MissionCatalog::from_json(
            r#"{"core":[
                {"id":"P1","tier":"PRIMARY","difficulty":2,"text":"p","check":{"kind":"ROLE_WINS_FIRST_TRICK"}},
                {"id":"O1","tier":"OPTIONAL","difficulty":1,"text":"a","check":{"kind":"WIN_A_TRICK_IN_SUIT","suit":"H"}},
                {"id":"O2","tier":"OPTIONAL","difficulty":1,"text":"b","check":{"kind":"WIN_A_TRICK_IN_SUIT","suit":"S"}},
                {"id":"O3","tier":"OPTIONAL","difficulty":1,"text":"c","check":{"kind":"WIN_A_TRICK_IN_SUIT","suit":"C"}}
            ],"blight":[
                {"id":"B1","tier":"OPTIONAL","difficulty":5,"tags":["BLIGHT"],"text":"clean","check":{"kind":"ROLE_WINS_FIRST_TRICK"},"reward":{"type":"BLIGHT","remove":1}}
            ]}"#,
        )
        .expect("valid catalog")
    }

    #[test]
    fn blight_forces_a_cleanup_offer() {
        let catalog = small_catalog();
        let options = DraftOptions {
            blight: 2,
            ..DraftOptions::default()
        };
        for seed in 0..30 {
            let set = generate_missions_from(&catalog, seed, 2, &players(), &options);
            assert!(
                set.missions().any(|m| m.has_tag(MissionTag::Blight)),
                "seed {seed} offered no cleanup"
            );
        }
        let clean = generate_missions_from(&catalog, 1, 2, &players(), &DraftOptions::default());
        assert!(!clean.ids().any(|id| id == "B1"));
    }

    #[test]
    fn clean_city_never_sees_cleanup() {
        for seed in 0..30 {
            let set = generate_missions(seed, 5, &players(), &DraftOptions::default());
            assert!(!set.missions().any(Mission::is_blight_cleanup));
        }
    }

    #[test]
    fn highway_primaries_only_while_locked() {
        let catalog = MissionCatalog::default_catalog();
        let is_highway = |id: &str| catalog.highway.iter().any(|m| m.id == id);
        let unlocked = DraftOptions {
            highways_unlocked: true,
            ..DraftOptions::default()
        };
        for seed in 0..40 {
            for round in 1..=8 {
                let early = generate_missions(seed, round.min(2), &players(), &DraftOptions::default());
                assert!(!early.ids().any(is_highway));
                let open = generate_missions(seed, round, &players(), &unlocked);
                assert!(!open.ids().any(is_highway));
            }
        }
    }

    #[test]
    fn missions_for_round_reuses_matching_cache() {
        let mut state = crate::state::new_campaign(5, &PlayersInput::default());
        let mut cached = generate_missions(99, 1, &state.players, &DraftOptions::default());
        cached.round = 1;
        state.current_missions = Some(cached.clone());
        assert_eq!(missions_for_round(&state), cached);
        state.round = 2;
        let fresh = missions_for_round(&state);
        assert_eq!(fresh.round, 2);
    }
}
