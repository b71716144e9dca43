//! Royal City Game Engine
//!
//! Deterministic round resolution for the Royal City civic card game. Tables
//! report trick-taking results each round; the resolver turns them, the board
//! and the drafted missions into growth, census, blight and final scoring.
//! The crate has no UI or platform dependencies.

pub mod balance;
pub mod board;
pub mod census;
pub mod constants;
pub mod endgame;
pub mod grade;
pub mod layout;
pub mod missions;
pub mod numbers;
pub mod report;
pub mod resolver;
pub mod rewards;
pub mod rng;
pub mod sector;
pub mod state;
pub mod telemetry;

use thiserror::Error;

// Re-export commonly used types
pub use balance::{Balance, BalanceError};
pub use board::{Asset, Board, BoardSnapshot, Cell, RoadVariant, Roads, generate_two_corridor_roads};
pub use census::{CensusBreakdown, CensusOptions, census_breakdown, census_estimate, census_estimate_with};
pub use endgame::{EndgameOutcome, PrestigeTier, compute_endgame_bonus, compute_endgame_bonus_with};
pub use grade::{CityGrade, LetterGrade, compute_final_city_grade, compute_final_city_grade_with};
pub use layout::{AdjacencyEffects, AssetBonuses, DevelopedSummary, LayoutBonuses, RoadFactor};
pub use missions::{
    CatalogError, DraftOptions, Mission, MissionCatalog, MissionSet, MissionTier, generate_missions,
    generate_missions_from, missions_for_round,
};
pub use report::{GrowthMomentum, LimitingFactor, Report, history_digest};
pub use resolver::{
    AssetPlacement, BuildAction, BuildActionKind, DevOverrides, Placement, RoundInput,
    RoundResolution, SuitCounts, resolve_round, resolve_round_with,
};
pub use rewards::{PlacedAsset, PolicyKind, Reward, RewardResult, apply_reward, place_queued_assets};
pub use rng::Mulberry32;
pub use sector::{AssetKind, PlanningFocus, SectorCode, Suit};
pub use state::{CampaignState, Player, PlayersInput, Stats, new_campaign};
pub use telemetry::{RoundTelemetry, TelemetryRun, TelemetrySummary};

/// Trait for abstracting data loading operations
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the economy tuning.
    ///
    /// # Errors
    ///
    /// Returns an error if the balance cannot be read or fails validation.
    fn load_balance(&self) -> Result<Balance, Self::Error>;

    /// Load the mission template pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read or fails validation.
    fn load_catalog(&self) -> Result<MissionCatalog, Self::Error>;
}

/// Failure to load bundled or overlay data.
#[derive(Debug, Error, PartialEq)]
pub enum LoadError {
    #[error(transparent)]
    Balance(#[from] BalanceError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Loader backed by the compiled-in mission data, with an optional balance
/// overlay in JSON.
#[derive(Debug, Clone, Default)]
pub struct StaticDataLoader {
    balance_json: Option<String>,
}

impl StaticDataLoader {
    #[must_use]
    pub const fn new() -> Self {
        Self { balance_json: None }
    }

    /// Use `json` instead of the locked balance.
    #[must_use]
    pub fn with_balance_json(mut self, json: impl Into<String>) -> Self {
        self.balance_json = Some(json.into());
        self
    }
}

impl DataLoader for StaticDataLoader {
    type Error = LoadError;

    fn load_balance(&self) -> Result<Balance, Self::Error> {
        match &self.balance_json {
            Some(json) => Ok(Balance::from_json(json)?),
            None => Ok(Balance::default()),
        }
    }

    fn load_catalog(&self) -> Result<MissionCatalog, Self::Error> {
        Ok(MissionCatalog::from_json(
            missions::catalog::DEFAULT_MISSION_DATA,
        )?)
    }
}

/// Raised when a campaign is driven past its last round.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("campaign already resolved all {rounds} rounds")]
    CampaignComplete { rounds: u32 },
}

/// Owns one campaign together with the data it is resolved against.
#[derive(Debug, Clone)]
pub struct CampaignEngine {
    balance: Balance,
    catalog: MissionCatalog,
    state: CampaignState,
    telemetry: TelemetryRun,
}

impl CampaignEngine {
    /// Start a campaign with data from `loader`.
    ///
    /// # Errors
    ///
    /// Returns the loader's error if the balance or the catalog cannot be loaded.
    pub fn new<L: DataLoader>(
        loader: &L,
        seed: u32,
        players: &PlayersInput,
    ) -> Result<Self, L::Error> {
        Ok(Self::from_parts(
            loader.load_balance()?,
            loader.load_catalog()?,
            new_campaign(seed, players),
        ))
    }

    /// Resume from a saved state.
    #[must_use]
    pub fn from_parts(balance: Balance, catalog: MissionCatalog, state: CampaignState) -> Self {
        Self {
            balance,
            catalog,
            state,
            telemetry: TelemetryRun::new(),
        }
    }

    #[must_use]
    pub const fn state(&self) -> &CampaignState {
        &self.state
    }

    #[must_use]
    pub const fn balance(&self) -> &Balance {
        &self.balance
    }

    #[must_use]
    pub const fn telemetry(&self) -> &TelemetryRun {
        &self.telemetry
    }

    /// Missions for the current round, drafted once and cached on the state.
    pub fn missions(&mut self) -> &MissionSet {
        let state = &mut self.state;
        let drafted = match state.current_missions.take() {
            Some(set) if set.round == state.round => set,
            _ => generate_missions_from(
                &self.catalog,
                state.seed,
                state.round,
                &state.players,
                &DraftOptions::for_state(state),
            ),
        };
        state.current_missions.insert(drafted)
    }

    /// Drop queued amenities onto the best free road-adjacent cells.
    pub fn place_queued_assets(&mut self) -> Vec<PlacedAsset> {
        let mut rng = Mulberry32::for_round(self.state.seed, self.state.round);
        place_queued_assets(&mut self.state, &mut rng)
    }

    /// Resolve the current round and advance the campaign.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::CampaignComplete`] once every round is resolved.
    pub fn resolve(&mut self, input: &RoundInput) -> Result<&Report, EngineError> {
        if self.state.is_complete() {
            return Err(EngineError::CampaignComplete {
                rounds: self.state.rounds,
            });
        }
        if input.missions.is_none() {
            self.missions();
        }
        let RoundResolution {
            next_state,
            report,
            telemetry,
        } = resolve_round_with(&self.state, input, &self.balance, &self.catalog);
        self.telemetry
            .record(telemetry, report.meta.finale.as_ref());
        self.state = next_state;
        self.state
            .history
            .last()
            .ok_or(EngineError::CampaignComplete {
                rounds: self.state.rounds,
            })
    }

    /// Run-level statistics, available once the campaign is complete.
    #[must_use]
    pub fn summary(&self) -> Option<TelemetrySummary> {
        self.state.is_complete().then(|| {
            self.telemetry
                .finalize_with(&self.balance, &self.state, self.state.stats.census)
        })
    }

    #[must_use]
    pub fn into_state(self) -> CampaignState {
        self.state
    }
}
