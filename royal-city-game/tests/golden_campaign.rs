use rand::RngCore;
use royal_city_game::{
    CampaignState, CensusOptions, LimitingFactor, Mulberry32, PlayersInput, Report, RoundInput,
    SuitCounts, census_estimate, history_digest, new_campaign, resolve_round,
};

const SEED: u32 = 999;

struct Round {
    suits: (i64, i64, i64, i64),
    primary: bool,
    optionals: [bool; 2],
    primary_id: &'static str,
    optional_ids: [&'static str; 2],
    units: i64,
    limiter: LimitingFactor,
}

const ROUNDS: [Round; 8] = [
    Round {
        suits: (3, 4, 4, 2),
        primary: true,
        optionals: [true, false],
        primary_id: "P_E1_TRICK_RANK_2",
        optional_ids: ["O_E1_AT_LEAST_3_DIAMONDS", "O_E1_AT_LEAST_3_CLUBS"],
        units: 5,
        limiter: LimitingFactor::Potential,
    },
    Round {
        suits: (2, 4, 4, 3),
        primary: true,
        optionals: [false, false],
        primary_id: "P_E2_NO_ACES",
        optional_ids: ["O_E2_TWO_SMALL_TASKS", "O_E2_EXACT_2_SPADES"],
        units: 11,
        limiter: LimitingFactor::Jobs,
    },
    Round {
        suits: (3, 3, 4, 3),
        primary: true,
        optionals: [true, false],
        primary_id: "P_E2_ROLE_ANY_DIAMOND",
        optional_ids: ["O_E2_TRICK_RANK_4", "O_E2_ROLE_ANY_HEART"],
        units: 16,
        limiter: LimitingFactor::Balanced,
    },
    Round {
        suits: (2, 5, 3, 3),
        primary: false,
        optionals: [false, false],
        primary_id: "P_M3_TRICK_RANK_3",
        optional_ids: ["O_E1_AT_LEAST_3_DIAMONDS", "O_M3_EXACT_1_CLUB"],
        units: 16,
        limiter: LimitingFactor::Potential,
    },
    Round {
        suits: (4, 3, 4, 2),
        primary: true,
        optionals: [false, false],
        primary_id: "P_M3_AT_LEAST_3_SPADES",
        optional_ids: ["B_E2_DIAMOND_CLEANUP", "O_E2_TWO_SMALL_TASKS"],
        units: 21,
        limiter: LimitingFactor::Balanced,
    },
    Round {
        suits: (3, 3, 5, 2),
        primary: true,
        optionals: [true, false],
        primary_id: "P_H4_EXACT_1_DIAMOND",
        optional_ids: ["O_M3_BY_TRICK_3_SPADES", "O_M3_NO_QUEENS"],
        units: 26,
        limiter: LimitingFactor::Jobs,
    },
    Round {
        suits: (2, 4, 4, 3),
        primary: true,
        optionals: [false, false],
        primary_id: "P_H4_NO_KINGS",
        optional_ids: ["O_M3_EXACT_1_CLUB", "O_M3_ROLE_TRICK_RANK_3"],
        units: 29,
        limiter: LimitingFactor::Services,
    },
    Round {
        suits: (3, 3, 3, 4),
        primary: false,
        optionals: [false, true],
        primary_id: "P_H5_ORDERED_SUIT_SEQUENCE",
        optional_ids: ["O_H4_ROLE_LAST_TRICK", "O_H4_NO_JACKS"],
        units: 28,
        limiter: LimitingFactor::Potential,
    },
];

/// Census after rounds one through seven; the last round adds the finale bonus.
const CENSUS: [i64; 7] = [48_875, 93_196, 130_032, 106_559, 166_961, 203_792, 226_384];

fn input_for(round: &Round) -> RoundInput {
    let (clubs, diamonds, hearts, spades) = round.suits;
    RoundInput::new(SuitCounts::new(clubs, diamonds, hearts, spades), round.primary)
        .with_optionals(&round.optionals)
}

fn play() -> CampaignState {
    let mut state = new_campaign(SEED, &PlayersInput::default());
    for round in &ROUNDS {
        state = resolve_round(&state, &input_for(round)).next_state;
    }
    state
}

fn drafted_ids(report: &Report) -> (Option<&str>, Vec<&str>) {
    let primary = report
        .missions
        .primary
        .as_ref()
        .map(|resolved| resolved.mission.id.as_str());
    let optional = report
        .missions
        .optional
        .iter()
        .map(|resolved| resolved.mission.id.as_str())
        .collect();
    (primary, optional)
}

#[test]
fn seed_999_campaign_matches_recorded_rounds() {
    let state = play();
    assert!(state.is_complete());
    assert_eq!(state.history.len(), ROUNDS.len());

    for (index, (report, expected)) in state.history.iter().zip(&ROUNDS).enumerate() {
        let label = format!("round {}", index + 1);
        let (primary, optional) = drafted_ids(report);
        assert_eq!(primary, Some(expected.primary_id), "{label}");
        assert_eq!(optional, expected.optional_ids.to_vec(), "{label}");
        assert_eq!(report.stats_after.stats.population_units, expected.units, "{label}");
        assert_eq!(report.gating.limiting_factor, expected.limiter, "{label}");
        if let Some(census) = CENSUS.get(index) {
            assert_eq!(report.stats_after.stats.census, *census, "{label}");
        }
    }

    let last = state.history.last().expect("final report");
    let finale = last.meta.finale.as_ref().expect("finale on the last round");
    let before_bonus = census_estimate(SEED, 8, 28, CensusOptions::with_blight(1));
    assert_eq!(before_bonus, 179_575);
    assert!(finale.endgame_bonus >= 40_000);
    assert_eq!(last.stats_after.stats.census, before_bonus + finale.endgame_bonus);
    assert_eq!(state.stats.census, last.stats_after.stats.census);

    assert_eq!(state.city.blight, 1);
    assert!(!state.city.highways_unlocked);
    assert_eq!(state.stats.pressure, 1);
    assert_eq!(state.stats.dormant_housing, 6);
}

#[test]
fn seed_999_history_digest_is_stable() {
    let first = play();
    let second = play();
    let digest = history_digest(&first.history);
    assert_eq!(digest, history_digest(&second.history));

    let json = serde_json::to_string(&first.history).expect("serialize history");
    let restored: Vec<Report> = serde_json::from_str(&json).expect("deserialize history");
    assert_eq!(history_digest(&restored), digest);
}

#[test]
fn seed_999_streams_start_where_recorded() {
    // Round streams offset by 997 per round; the census stream by one.
    let pins: [(u32, [u32; 3]); 3] = [
        (1_996, [569_410_194, 1_332_406_554, 3_940_756_044]),
        (8_975, [984_974_813, 3_819_444_464, 1_905_510_947]),
        (1_000, [3_415_336_119, 3_554_892_520, 2_970_039_059]),
    ];
    for (seed, expected) in pins {
        let mut rng = Mulberry32::new(seed);
        let drawn = [rng.next_u32(), rng.next_u32(), rng.next_u32()];
        assert_eq!(drawn, expected, "seed {seed}");
    }
}
