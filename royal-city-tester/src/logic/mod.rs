pub mod autorun;
pub mod balance;
pub mod planner;
pub mod reports;
pub mod scenarios;
pub mod seeds;
pub mod stats;

pub use autorun::{AutorunSummary, RunRecord, run_autorun, summarize};
pub use balance::{GateResult, evaluate_gates, validate_balance_gates};
pub use scenarios::{ScenarioRun, get_scenario, list_scenarios, run_scenario};
pub use seeds::resolve_seed_inputs;
