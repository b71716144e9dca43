mod common;
mod logic;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use royal_city_game::{DataLoader, StaticDataLoader};
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use common::split_csv;
use logic::{
    AutorunSummary, GateResult, RunRecord, ScenarioRun, evaluate_gates, get_scenario,
    list_scenarios, reports, resolve_seed_inputs, run_autorun, run_scenario, summarize,
    validate_balance_gates,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TestMode {
    /// Replay the canned campaigns round by round
    Scripted,
    /// Play heuristic campaigns and summarize the spread
    Autorun,
    /// Autorun at scale, then enforce the balance gates
    BalanceCheck,
}

const BALANCE_CHECK_MIN_RUNS: usize = 100;

#[derive(Debug, Parser)]
#[command(name = "royal-city-tester", version = "0.1.0")]
#[command(about = "Batch simulation and balance checks for the Royal City engine")]
struct Args {
    /// Test mode: scripted campaigns, heuristic autorun or the balance gates
    #[arg(long, value_enum, default_value_t = TestMode::Scripted)]
    mode: TestMode,

    /// Scripted campaigns to run (comma-separated, or "all")
    #[arg(long, default_value = "all")]
    scenarios: String,

    /// List all scripted campaigns and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Base seeds for autorun (comma-separated decimal or 0x hex)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Campaigns per seed (autorun and balance-check)
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Balance overlay in JSON; missing fields keep the locked values
    #[arg(long)]
    balance: Option<PathBuf>,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console", "csv"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();
    let start_time = Instant::now();

    match args.mode {
        TestMode::Scripted => {
            let runs = run_scripted(&args)?;
            write_scripted_reports(&args, &runs, start_time.elapsed())?;
            if runs.iter().any(|run| !run.passed) {
                std::process::exit(1);
            }
        }
        TestMode::Autorun => {
            let (records, summary) = run_batch(&args, args.iterations)?;
            write_autorun_reports(&args, &records, &summary, None, start_time.elapsed())?;
        }
        TestMode::BalanceCheck => {
            let runs = compute_balance_iterations(&args);
            let (records, summary) = run_batch(&args, runs)?;
            let gates = evaluate_gates(&summary);
            write_autorun_reports(
                &args,
                &records,
                &summary,
                Some(gates.as_slice()),
                start_time.elapsed(),
            )?;
            validate_balance_gates(&gates)?;
            println!("{}", "✅ Balance check passed.".green().bold());
        }
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:25} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🏙️ Royal City Automated Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn compute_balance_iterations(args: &Args) -> usize {
    if args.iterations < BALANCE_CHECK_MIN_RUNS {
        println!(
            "🔁 Balance check: increasing runs per seed from {} to {BALANCE_CHECK_MIN_RUNS}",
            args.iterations
        );
    } else {
        println!(
            "🔁 Balance check: using {} runs per seed",
            args.iterations
        );
    }
    args.iterations.max(BALANCE_CHECK_MIN_RUNS)
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s == "all") {
        scenarios.retain(|s| s != "all");
        for (key, _) in list_scenarios() {
            if !scenarios.iter().any(|s| s == key) {
                scenarios.push(key.to_string());
            }
        }
    }
    scenarios
}

fn build_loader(args: &Args) -> Result<StaticDataLoader> {
    let loader = match &args.balance {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read balance overlay {}", path.display()))?;
            StaticDataLoader::new().with_balance_json(json)
        }
        None => StaticDataLoader::new(),
    };
    Ok(loader)
}

fn run_scripted(args: &Args) -> Result<Vec<ScenarioRun>> {
    println!("{}", "🃏 Running Scripted Campaigns".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let mut runs = Vec::new();
    for name in expand_scenarios(&args.scenarios) {
        let Some(campaign) = get_scenario(&name) else {
            eprintln!("⚠️  Unknown scenario: {}", name.yellow());
            continue;
        };
        let run = run_scenario(campaign)?;
        if args.verbose {
            println!(
                "  {} {} census {}",
                if run.passed { "✅" } else { "❌" },
                run.name,
                run.census
            );
        }
        runs.push(run);
    }
    if runs.is_empty() {
        bail!("No known scenarios in '{}'", args.scenarios);
    }
    Ok(runs)
}

fn run_batch(args: &Args, iterations: usize) -> Result<(Vec<RunRecord>, AutorunSummary)> {
    println!("{}", "🎲 Running Autorun Campaigns".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let loader = build_loader(args)?;
    let balance = loader
        .load_balance()
        .context("balance overlay failed validation")?;
    log::info!(
        "autorun: {} seed(s) x {iterations} run(s), balance {}",
        seeds.len(),
        balance.version
    );

    let records = run_autorun(&loader, &seeds, iterations, args.verbose)?;
    let summary = summarize(&records, &balance.version);
    Ok((records, summary))
}

fn write_scripted_reports(args: &Args, runs: &[ScenarioRun], duration: Duration) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => reports::generate_json_report(&mut output_target, runs)?,
        "markdown" => reports::generate_scripted_markdown(&mut output_target, runs)?,
        "csv" => reports::generate_scripted_csv(&mut output_target, runs)?,
        _ => reports::generate_scripted_console(&mut output_target, runs, duration)?,
    }

    output_target.flush_inner()?;
    Ok(())
}

fn write_autorun_reports(
    args: &Args,
    records: &[RunRecord],
    summary: &AutorunSummary,
    gates: Option<&[GateResult]>,
    duration: Duration,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => match gates {
            Some(gates) => reports::generate_json_report(
                &mut output_target,
                &serde_json::json!({ "summary": summary, "gates": gates }),
            )?,
            None => reports::generate_json_report(&mut output_target, summary)?,
        },
        "markdown" => {
            reports::generate_autorun_markdown(&mut output_target, summary)?;
            if let Some(gates) = gates {
                reports::generate_gate_markdown(&mut output_target, gates)?;
            }
        }
        "csv" => reports::generate_autorun_csv(&mut output_target, records)?,
        _ => {
            reports::generate_autorun_console(&mut output_target, summary, duration)?;
            if let Some(gates) = gates {
                reports::generate_gate_console(&mut output_target, gates)?;
            }
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            mode: TestMode::Scripted,
            scenarios: "all".to_string(),
            list_scenarios: false,
            seeds: "1337".to_string(),
            iterations: 1,
            balance: None,
            report: "json".to_string(),
            verbose: false,
            output: None,
        }
    }

    fn temp_file(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "royal-city-{label}-{}",
            std::process::id()
        ))
    }

    #[test]
    fn balance_check_raises_run_count() {
        let mut args = base_args();
        args.iterations = 10;
        assert_eq!(compute_balance_iterations(&args), 100);
        args.iterations = 150;
        assert_eq!(compute_balance_iterations(&args), 150);
    }

    #[test]
    fn expands_all_scenarios_keyword() {
        let expanded = expand_scenarios("infra-heavy,all");
        assert_eq!(expanded[0], "infra-heavy");
        assert_eq!(expanded.len(), 5);
        assert!(expanded.contains(&"optional-boosts".to_string()));
    }

    #[test]
    fn expand_scenarios_without_all_preserves_order() {
        let expanded = expand_scenarios("mission-swing,balanced-mix");
        assert_eq!(expanded, vec!["mission-swing", "balanced-mix"]);
    }

    #[test]
    fn unknown_scenarios_alone_are_an_error() {
        let args = Args {
            scenarios: "smoke".to_string(),
            ..base_args()
        };
        assert!(run_scripted(&args).is_err());
    }

    #[test]
    fn missing_balance_overlay_is_reported() {
        let args = Args {
            balance: Some(temp_file("missing-balance.json")),
            ..base_args()
        };
        let err = build_loader(&args).unwrap_err();
        assert!(format!("{err:#}").contains("balance overlay"));
    }

    #[test]
    fn write_scripted_reports_emits_json_output() {
        let temp = temp_file("scripted.json");
        let args = Args {
            scenarios: "services-light".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        let runs = run_scripted(&args).unwrap();
        write_scripted_reports(&args, &runs, Duration::ZERO).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value[0]["name"], "services-light");
        assert_eq!(value[0]["rounds"].as_array().map(Vec::len), Some(8));
    }

    #[test]
    fn maybe_list_scenarios_writes_output() {
        let temp = temp_file("scenarios.txt");
        let args = Args {
            list_scenarios: true,
            output: Some(temp.clone()),
            ..base_args()
        };
        assert!(maybe_list_scenarios(&args).unwrap());
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("Available scenarios:"));
        assert!(content.contains("balanced-mix"));
    }
}
