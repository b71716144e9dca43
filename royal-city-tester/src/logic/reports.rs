use anyhow::Result;
use colored::Colorize;
use royal_city_game::numbers::group_thousands;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

use super::autorun::{AutorunSummary, RunRecord, blocked_by};
use super::balance::GateResult;
use super::scenarios::{RoundLine, ScenarioRun};
use super::stats::Distribution;

fn status_label(passed: bool) -> colored::ColoredString {
    if passed {
        "✅ PASS".green()
    } else {
        "❌ FAIL".red()
    }
}

fn round_line(line: &RoundLine) -> String {
    let suits = &line.suits;
    [
        format!("Round {}", line.round),
        format!(
            "Suits ♣{} ♦{} ♥{} ♠{}",
            suits.clubs, suits.diamonds, suits.hearts, suits.spades
        ),
        format!(
            "Primary: {}",
            if line.primary_success { "Success" } else { "Fail" }
        ),
        format!("Optional: {}", line.optional_completed),
        format!(
            "Road RES/COM/SERV: {}/{}/{}",
            line.road_residential, line.road_commerce, line.road_services
        ),
        format!("Potential: {}", line.potential),
        format!("Jobs cap: {}", line.jobs_cap),
        format!("Services cap: {}", line.services_cap),
        format!("Growth allowed: {}", line.growth_allowed),
        format!("Growth applied: {}", line.growth_applied),
        format!("Limiter: {}", line.limiter),
    ]
    .join(" | ")
}

pub fn generate_scripted_console<W: Write + ?Sized>(
    out: &mut W,
    runs: &[ScenarioRun],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Scripted Campaign Results".bright_cyan().bold())?;
    writeln!(out, "{}", "============================".cyan())?;

    let passed = runs.iter().filter(|run| run.passed).count();
    writeln!(out, "Total campaigns: {}", runs.len())?;
    writeln!(out, "Passed: {}", passed.to_string().green())?;
    writeln!(out, "Failed: {}", (runs.len() - passed).to_string().red())?;
    writeln!(out, "Total time: {total_duration:?}")?;

    for run in runs {
        writeln!(out)?;
        writeln!(
            out,
            "{} {} (seed {})",
            status_label(run.passed),
            run.name.bold(),
            run.seed
        )?;
        for line in &run.rounds {
            writeln!(out, "   {}", round_line(line))?;
        }
        writeln!(
            out,
            "   Final: popUnits={}, census={}, developed={}, upgrades={}, grade={}",
            run.population_units,
            group_thousands(run.census),
            run.developed,
            run.upgrades,
            run.grade.as_deref().unwrap_or("-")
        )?;
        for failure in &run.failures {
            writeln!(out, "     • {}", failure.red())?;
        }
    }
    Ok(())
}

pub fn generate_json_report<W, T>(out: &mut W, value: &T) -> Result<()>
where
    W: Write + ?Sized,
    T: Serialize + ?Sized,
{
    let json_output = serde_json::to_string_pretty(value)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_scripted_markdown<W: Write + ?Sized>(out: &mut W, runs: &[ScenarioRun]) -> Result<()> {
    writeln!(out, "# Royal City Scripted Campaigns\n")?;
    let passed = runs.iter().filter(|run| run.passed).count();
    writeln!(out, "- **Campaigns**: {}", runs.len())?;
    writeln!(out, "- **Passed**: {passed}")?;
    writeln!(out, "- **Failed**: {}\n", runs.len() - passed)?;

    for run in runs {
        let status = if run.passed { "✅" } else { "❌" };
        writeln!(out, "## {status} {} (seed {})\n", run.name, run.seed)?;
        writeln!(
            out,
            "| Round | ♣ | ♦ | ♥ | ♠ | Primary | Optional | Potential | Jobs | Services | Allowed | Applied | Limiter |"
        )?;
        writeln!(out, "|---|---|---|---|---|---|---|---|---|---|---|---|---|")?;
        for line in &run.rounds {
            writeln!(
                out,
                "| {} | {} | {} | {} | {} | {} | {} | {} | {} | {} | {} | {} | {} |",
                line.round,
                line.suits.clubs,
                line.suits.diamonds,
                line.suits.hearts,
                line.suits.spades,
                if line.primary_success { "✓" } else { "✗" },
                line.optional_completed,
                line.potential,
                line.jobs_cap,
                line.services_cap,
                line.growth_allowed,
                line.growth_applied,
                line.limiter
            )?;
        }
        writeln!(
            out,
            "\n**Final**: {} units, census {}, {} developed, {} upgraded, grade {}\n",
            run.population_units,
            group_thousands(run.census),
            run.developed,
            run.upgrades,
            run.grade.as_deref().unwrap_or("-")
        )?;
        for failure in &run.failures {
            writeln!(out, "- {failure}")?;
        }
    }
    Ok(())
}

pub fn generate_scripted_csv<W: Write + ?Sized>(out: &mut W, runs: &[ScenarioRun]) -> Result<()> {
    writeln!(
        out,
        "scenario,seed,round,clubs,diamonds,hearts,spades,primary,optional,potential,jobsCap,servicesCap,growthAllowed,growthApplied,limiter"
    )?;
    for run in runs {
        for line in &run.rounds {
            writeln!(
                out,
                "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
                run.name,
                run.seed,
                line.round,
                line.suits.clubs,
                line.suits.diamonds,
                line.suits.hearts,
                line.suits.spades,
                line.primary_success,
                line.optional_completed,
                line.potential,
                line.jobs_cap,
                line.services_cap,
                line.growth_allowed,
                line.growth_applied,
                line.limiter.replace(", ", "|")
            )?;
        }
    }
    Ok(())
}

fn distribution_row(label: &str, dist: &Distribution) -> String {
    format!(
        "{label:<26} mean {:>11.2}  median {:>11.2}  p10 {:>11.2}  p90 {:>11.2}  min {:>11.2}  max {:>11.2}",
        dist.mean, dist.median, dist.p10, dist.p90, dist.min, dist.max
    )
}

fn summary_rows(summary: &AutorunSummary) -> Vec<(&'static str, &Distribution)> {
    let mut rows = vec![
        ("population units", &summary.population_units),
        ("census", &summary.census),
        ("primary successes", &summary.primary_success_count),
        ("optional successes", &summary.optional_success_count),
        ("max stack height", &summary.max_stack_height),
        ("assets placed", &summary.total_assets),
        ("adjacency bonus", &summary.adjacency_bonus_total),
        ("active policies", &summary.policy_count),
        ("blight at end", &summary.blight_end),
        ("blight cleared", &summary.blight_cleared_count),
        ("stack sum", &summary.stack_sum),
        ("stacks above 1", &summary.total_stacks_above1),
        ("endgame surge ratio", &summary.endgame_surge_ratio),
        ("max single round growth", &summary.max_single_round_growth),
        ("suit growth", &summary.total_suit_growth),
        ("adjacency growth", &summary.total_adjacency_growth),
        ("policy growth", &summary.total_policy_growth),
        ("endgame bonus applied", &summary.endgame_bonus_applied),
        ("blocked by mission fail", &summary.blocked_by_mission_fail),
        ("blocked by jobs", &summary.blocked_by_jobs),
        ("blocked by services", &summary.blocked_by_services),
        ("blocked by potential", &summary.blocked_by_potential),
    ];
    if let Some(prestige) = summary.prestige_score.as_ref() {
        rows.push(("prestige score", prestige));
    }
    if let Some(boom) = summary.boom_mult.as_ref() {
        rows.push(("boom multiplier", boom));
    }
    rows
}

pub fn generate_autorun_console<W: Write + ?Sized>(
    out: &mut W,
    summary: &AutorunSummary,
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📈 Autorun Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "==================".cyan())?;
    writeln!(out, "Runs: {}", summary.runs)?;
    writeln!(out, "Balance version: {}", summary.balance_version)?;
    writeln!(out, "Primary fail rate: {:.3}", summary.primary_fail_rate)?;
    writeln!(out, "Optional success rate: {:.3}", summary.optional_success_rate)?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for (label, dist) in summary_rows(summary) {
        writeln!(out, "{}", distribution_row(label, dist))?;
    }

    writeln!(out)?;
    writeln!(out, "{}", "🚧 Limiter Counts".bright_yellow().bold())?;
    let limits = &summary.limiter_counts;
    writeln!(
        out,
        "Jobs: {}  Services: {}  Potential: {}  None: {}  Mission fail: {}",
        limits.jobs, limits.services, limits.potential, limits.none, limits.mission_fail
    )?;

    if let Some(top) = summary.top_run.as_ref() {
        writeln!(out)?;
        writeln!(
            out,
            "🏆 Top run: census={} seed={} primary={} optional={} endgameSurge={:.3} limiterMostHit={}",
            group_thousands(top.final_census),
            top.seed,
            top.primary_success_count,
            top.optional_success_count,
            top.endgame_surge_ratio,
            top.limiter_most_hit
                .map_or_else(|| "-".to_string(), |limit| limit.to_string())
        )?;
    }
    Ok(())
}

pub fn generate_autorun_markdown<W: Write + ?Sized>(out: &mut W, summary: &AutorunSummary) -> Result<()> {
    writeln!(out, "# Royal City Autorun Summary\n")?;
    writeln!(out, "- **Runs**: {}", summary.runs)?;
    writeln!(out, "- **Balance version**: {}", summary.balance_version)?;
    writeln!(out, "- **Primary fail rate**: {:.3}", summary.primary_fail_rate)?;
    writeln!(
        out,
        "- **Optional success rate**: {:.3}\n",
        summary.optional_success_rate
    )?;

    writeln!(out, "| Metric | Mean | Median | P10 | P25 | P75 | P90 | Min | Max |")?;
    writeln!(out, "|---|---|---|---|---|---|---|---|---|")?;
    for (label, d) in summary_rows(summary) {
        writeln!(
            out,
            "| {label} | {:.2} | {:.2} | {:.2} | {:.2} | {:.2} | {:.2} | {:.2} | {:.2} |",
            d.mean, d.median, d.p10, d.p25, d.p75, d.p90, d.min, d.max
        )?;
    }

    if let Some(top) = summary.top_run.as_ref() {
        writeln!(
            out,
            "\n## Top run (seed {}, census {})\n",
            top.seed,
            group_thousands(top.final_census)
        )?;
        writeln!(out, "| Round | Primary | Attempted | Applied | Limiter | Blocked by | Census |")?;
        writeln!(out, "|---|---|---|---|---|---|---|")?;
        for round in &top.timeline {
            writeln!(
                out,
                "| {} | {} | {} | {} | {} | {} | {} |",
                round.round,
                if round.primary_success { "✓" } else { "✗" },
                round.growth_attempted,
                round.growth_applied,
                round.limiter,
                blocked_by(round),
                group_thousands(round.census_after)
            )?;
        }
    }
    Ok(())
}

const RUN_CSV_HEADER: [&str; 32] = [
    "runId",
    "finalCensus",
    "primarySuccessCount",
    "optionalSuccessCount",
    "maxStackHeight",
    "totalAssets",
    "adjacencyBonusTotal",
    "boomRound",
    "limiterMostHit",
    "seed",
    "policyCount",
    "blightStart",
    "blightEnd",
    "blightClearedCount",
    "stackSum",
    "stacksAbove1",
    "top3StackHeights",
    "endgameSurgeRatio",
    "maxSingleRoundGrowth",
    "rewardPark",
    "rewardMarket",
    "rewardClinic",
    "rewardTransit",
    "rewardPolicy",
    "totalSuitGrowth",
    "totalAdjacencyGrowth",
    "totalPolicyGrowth",
    "endgameBonusApplied",
    "blockedByMissionFail",
    "blockedByJobs",
    "blockedByServices",
    "blockedByPotential",
];

fn run_csv_row(record: &RunRecord) -> Vec<String> {
    let summary = &record.summary;
    let rewards = &summary.mission_rewards_earned;
    vec![
        record.run_id.to_string(),
        record.final_census.to_string(),
        summary.primary_success_count.to_string(),
        summary.optional_success_count.to_string(),
        summary.assets.max_stack_height.to_string(),
        summary.assets.total_placed.to_string(),
        summary.adjacency_bonus_total.to_string(),
        summary.boom_round.map(|round| round.to_string()).unwrap_or_default(),
        summary
            .limiter_most_hit
            .map(|limit| limit.to_string())
            .unwrap_or_default(),
        record.seed.to_string(),
        summary.policy_count.to_string(),
        summary.blight_start.to_string(),
        summary.blight_end.to_string(),
        summary.blight_cleared_count.to_string(),
        summary.stack_sum.to_string(),
        summary.total_stacks_above1.to_string(),
        record.top3_stack_heights(),
        format!("{:.3}", summary.endgame_surge_ratio),
        summary.max_single_round_growth.to_string(),
        rewards.park.to_string(),
        rewards.market.to_string(),
        rewards.clinic.to_string(),
        rewards.transit.to_string(),
        rewards.policy.to_string(),
        record.total_suit_growth.to_string(),
        record.total_adjacency_growth.to_string(),
        summary.total_policy_growth.to_string(),
        record.endgame_bonus_applied.to_string(),
        record.blocked.mission_fail.to_string(),
        record.blocked.jobs.to_string(),
        record.blocked.services.to_string(),
        record.blocked.potential.to_string(),
    ]
}

pub fn generate_autorun_csv<W: Write + ?Sized>(out: &mut W, records: &[RunRecord]) -> Result<()> {
    writeln!(out, "{}", RUN_CSV_HEADER.join(","))?;
    for record in records {
        let row: Vec<String> = run_csv_row(record)
            .into_iter()
            .map(|value| value.replace(',', ""))
            .collect();
        writeln!(out, "{}", row.join(","))?;
    }
    Ok(())
}

pub fn generate_gate_console<W: Write + ?Sized>(out: &mut W, gates: &[GateResult]) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "⚖️  Balance Gates".bright_magenta().bold())?;
    writeln!(out, "{}", "================".magenta())?;
    for gate in gates {
        writeln!(
            out,
            "{} {:<26} observed {:>12.2} expected {}",
            status_label(gate.passed),
            gate.name,
            gate.observed,
            gate.expected
        )?;
    }
    Ok(())
}

pub fn generate_gate_markdown<W: Write + ?Sized>(out: &mut W, gates: &[GateResult]) -> Result<()> {
    writeln!(out, "\n## Balance gates\n")?;
    writeln!(out, "| Gate | Observed | Expected | Result |")?;
    writeln!(out, "|---|---|---|---|")?;
    for gate in gates {
        writeln!(
            out,
            "| {} | {:.2} | {} | {} |",
            gate.name,
            gate.observed,
            gate.expected,
            if gate.passed { "✅" } else { "❌" }
        )?;
    }
    Ok(())
}
