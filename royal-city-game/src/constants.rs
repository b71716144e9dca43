//! Fixed rules of the Royal City board and round loop.
//!
//! Tunable economy dials live in [`crate::balance::Balance`]; the values here
//! describe the shape of the game itself and are not meant to be tuned.

// Logging ------------------------------------------------------------------
pub(crate) const DEBUG_ENV_VAR: &str = "ROYAL_CITY_DEBUG_LOGS";

// Board geometry -----------------------------------------------------------
/// Side length of the square city grid.
pub const GRID_SIZE: usize = 5;
/// Number of rounds in a standard campaign.
pub const ROUNDS: u32 = 8;
/// Upper bound of the city blight counter.
pub const MAX_BLIGHT: u32 = 3;
/// Upper bound of banked unmet demand.
pub const MAX_PRESSURE: i64 = 5;

// Players ------------------------------------------------------------------
pub const ROLES: [&str; 5] = ["Mayor", "Planner", "Builder", "Inspector", "Engineer"];
pub const MIN_PLAYERS: usize = 3;
pub const MAX_PLAYERS: usize = 5;
pub const DEFAULT_PLAYERS: usize = 4;

// Seed derivation ----------------------------------------------------------
pub(crate) const ROUND_SEED_STRIDE: u32 = 997;

// Tile levels --------------------------------------------------------------
pub(crate) const LEVEL_CAP_EARLY: u32 = 2;
pub(crate) const LEVEL_CAP_MID: u32 = 3;
pub(crate) const LEVEL_CAP_LATE: u32 = 6;
pub(crate) const EARLY_ROUND_LIMIT: u32 = 3;
pub(crate) const MID_ROUND_LIMIT: u32 = 6;

// Board bonuses ------------------------------------------------------------
pub(crate) const AMENITY_TRIGGER_CAP: i64 = 3;
pub(crate) const CRITICAL_MASS_TILES: usize = 5;
pub(crate) const CRITICAL_MASS_LEVEL: u32 = 5;
pub(crate) const PARTIAL_UNLOCK_FACTOR: f64 = 0.5;

// Road connectivity --------------------------------------------------------
pub(crate) const ROAD_FACTOR_FLOOR: f64 = 0.3;
pub(crate) const TRANSIT_ROAD_NUDGE: f64 = 0.05;

// Policies -----------------------------------------------------------------
pub(crate) const POLICY_FLAT_CAP: i64 = 8;
pub(crate) const BASE_ACTION_BUDGET: u32 = 2;

// Missions -----------------------------------------------------------------
pub(crate) const MAX_DIFFICULTY: u8 = 5;
pub(crate) const PICK_JITTER: f64 = 0.1;
pub(crate) const RECENT_HISTORY_WINDOW: usize = 2;
pub(crate) const HIGHWAY_OFFER_MIN_ROUND: u32 = 3;
pub(crate) const DEFAULT_OPTIONAL_COUNT: usize = 2;

// Momentum -----------------------------------------------------------------
pub(crate) const MOMENTUM_WINDOW: usize = 2;

// Telemetry ----------------------------------------------------------------
pub(crate) const BOOM_GROWTH_THRESHOLD: i64 = 20;

// Grade --------------------------------------------------------------------
pub(crate) const GRADE_CENSUS_CEILING: f64 = 600_000.0;
