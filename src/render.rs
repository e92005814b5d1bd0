// src/render.rs
use crate::checks;
use crate::models::{CheckResult, ItemResult, RunRecord, RunStatus};
use crate::poller::{RunHeader, RunObserver};
use crate::summary::{RunSummary, Tier, record_score};

const SEPARATOR_WIDTH: usize = 60;
const SYSTEM_PROMPT_PREVIEW_CHARS: usize = 80;

/// Stdout renderer for a tracked run. Items print as they arrive, so a slow
/// run reads as a live feed rather than a final dump.
pub struct Console;

impl RunObserver for Console {
    fn on_header(&mut self, header: &RunHeader) {
        print_header(header);
    }

    fn on_items(&mut self, items: &[ItemResult]) {
        for item in items {
            print_item(item);
        }
    }
}

pub fn print_header(header: &RunHeader) {
    let separator = "=".repeat(SEPARATOR_WIDTH);
    println!("\n{}", separator);
    if let Some(suite) = &header.suite_name {
        if header.is_update {
            println!("🎯 Suite: {} (updated)", suite);
        } else {
            println!("🎯 Suite: {}", suite);
        }
    }
    if let Some(model) = &header.model {
        println!("🤖 Model: {}", model);
    }
    if let Some(system_prompt) = &header.system_prompt {
        println!(
            "📝 System prompt: {}",
            checks::truncate(system_prompt, SYSTEM_PROMPT_PREVIEW_CHARS)
        );
    }
    println!("{}\n", separator);
}

pub fn print_item(item: &ItemResult) {
    let mark = if item.passed { "✅ PASS" } else { "❌ FAIL" };
    let mut line = format!("{}  {}", mark, item.name);
    if let Some(ms) = item.time_ms {
        line.push_str(&format!("  ({}ms)", ms));
    }
    if let Some(cost) = item.cost {
        line.push_str(&format!("  (${:.6})", cost));
    }
    println!("{}", line);

    for check in &item.checks {
        print_check(check, 1);
    }
}

fn print_check(check: &CheckResult, depth: usize) {
    let indent = "  ".repeat(depth + 1);
    let mark = if check.passed { "✅" } else { "❌" };
    println!("{}{} {}: {}", indent, mark, check.check_type, checks::detail(check));

    if let Some(children) = &check.children {
        for child in children {
            print_check(child, depth + 1);
        }
    }
}

/// Final block: per-item check tallies as mark runs, then the aggregate
/// rate, tier verdict and resource totals.
pub fn print_summary(summary: &RunSummary) {
    let separator = "=".repeat(SEPARATOR_WIDTH);
    println!("\n{}", separator);
    println!("📊 RESULTS");
    println!("{}", separator);

    for tally in &summary.item_tallies {
        let mark = if tally.passed { "✅" } else { "❌" };
        println!(
            "{} {}  {}{}",
            mark,
            tally.name,
            "✓".repeat(tally.checks_passed as usize),
            "✗".repeat(tally.checks_failed as usize)
        );
    }
    if !summary.item_tallies.is_empty() {
        println!();
    }

    println!(
        "🎯 Pass rate: {}/{} ({:.1}%)",
        summary.items_passed, summary.items_total, summary.pass_rate
    );
    println!(
        "⚖️  Checks: {} passed, {} failed",
        summary.checks_passed, summary.checks_failed
    );
    match summary.tier {
        Tier::Good => println!("✅ VERDICT: GOOD"),
        Tier::Sketchy => println!("⚠️  VERDICT: SKETCHY"),
        Tier::Bad => println!("❌ VERDICT: BAD"),
    }

    if let Some(ms) = summary.total_time_ms {
        println!("⏱️  Total time: {}ms", ms);
    }
    if let Some(cost) = summary.total_cost {
        println!("💰 Total cost: ${:.6}", cost);
    }
    if let Some(score) = summary.score {
        println!("🏆 Score: {:.2}", score);
    }
    println!("{}", separator);
}

/// The run finished, but some items never executed. Scores and rates below
/// cover only what ran.
pub fn print_partial_failure_notice() {
    println!("\n⚠️  Partial failure: some items did not execute; results cover the items that ran.");
}

/// The service gave up mid-run. Whatever completed before the cutoff is
/// still shown and summarized.
pub fn print_timeout_notice() {
    println!("\n⚠️  Timed out: the service stopped before finishing; results below are partial.");
}

/// One line per listed run, newest data the service gave us, no local sort.
pub fn print_run_records(runs: &[RunRecord]) {
    for run in runs {
        let mark = match run.status {
            RunStatus::Completed => "✅",
            RunStatus::Failed | RunStatus::Error => "❌",
            RunStatus::PartialFailure | RunStatus::TimedOut => "⚠️ ",
            _ => "⏳",
        };
        let score = record_score(run)
            .map(|s| format!("{:.2}", s))
            .unwrap_or_else(|| "N/A".to_string());
        println!(
            "{} {}  {}  {}/{} ({:.1}%)  score {}  {}",
            mark,
            run.id,
            run.suite_name.as_deref().unwrap_or("-"),
            run.evals_passed,
            run.total_evals,
            run.success_percentage,
            score,
            run.created_at.format("%Y-%m-%d %H:%M")
        );
    }
}
