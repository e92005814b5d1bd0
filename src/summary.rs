// src/summary.rs
use crate::checks;
use crate::models::{ItemResult, RunRecord, RunStatus};
use crate::poller::PollOutcome;

/// Pass rate at or above this is the top tier.
pub const TIER_GOOD_MIN: f64 = 100.0;
/// Pass rate at or above this (but below `TIER_GOOD_MIN`) is still
/// acceptable; below it the run gates red.
pub const TIER_OK_MIN: f64 = 80.0;

/// Quality band for a run's pass rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Good,
    Sketchy,
    Bad,
}

impl Tier {
    pub fn for_rate(rate: f64) -> Tier {
        if rate >= TIER_GOOD_MIN {
            Tier::Good
        } else if rate >= TIER_OK_MIN {
            Tier::Sketchy
        } else {
            Tier::Bad
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Tier::Good => "good",
            Tier::Sketchy => "sketchy",
            Tier::Bad => "bad",
        };
        write!(f, "{}", label)
    }
}

/// Percentage of passed items, rounded to one decimal place. An empty run is
/// 0.0, never a division error.
pub fn pass_rate(passed: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let rate = passed as f64 / total as f64 * 100.0;
    (rate * 10.0).round() / 10.0
}

/// Quality-per-resource score: success percentage divided by a blend of cost
/// (dollars, weighted x1000) and duration (seconds, weighted x0.1).
///
/// Undefined (`None`) when cost is absent or non-positive, or when the
/// percentage is outside 0..=100; an undefined score is shown as "N/A"
/// rather than 0, which would look like a terrible-but-valid run.
pub fn composite_score(success_pct: f64, cost_usd: Option<f64>, duration_secs: f64) -> Option<f64> {
    let cost = cost_usd?;
    if cost <= 0.0 || !(0.0..=100.0).contains(&success_pct) {
        return None;
    }
    Some(success_pct / (cost * 1000.0 + duration_secs * 0.1))
}

/// Only runs that actually produced results can carry a score.
pub fn score_eligible(status: RunStatus) -> bool {
    matches!(status, RunStatus::Completed | RunStatus::PartialFailure)
}

/// Score for a listed run, or `None` when the status or inputs rule one out.
pub fn record_score(record: &RunRecord) -> Option<f64> {
    if !score_eligible(record.status) {
        return None;
    }
    composite_score(
        record.success_percentage,
        record.cost_usd,
        record.duration_seconds.unwrap_or(0.0),
    )
}

/// Check tallies for one item, kept alongside its name for the summary's
/// per-item mark runs.
#[derive(Debug, Clone)]
pub struct ItemTally {
    pub name: String,
    pub passed: bool,
    pub checks_passed: u32,
    pub checks_failed: u32,
}

/// Aggregated view of a finished run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub status: RunStatus,
    pub suite_name: Option<String>,
    pub model: Option<String>,
    pub item_tallies: Vec<ItemTally>,
    pub items_passed: u32,
    pub items_total: u32,
    pub checks_passed: u32,
    pub checks_failed: u32,
    pub pass_rate: f64,
    pub tier: Tier,
    pub total_time_ms: Option<u64>,
    pub total_cost: Option<f64>,
    pub score: Option<f64>,
}

impl RunSummary {
    pub fn from_outcome(outcome: &PollOutcome) -> Self {
        let items_total = outcome.results.len() as u32;
        let items_passed = outcome.results.iter().filter(|item| item.passed).count() as u32;

        let item_tallies: Vec<ItemTally> = outcome
            .results
            .iter()
            .map(|item| {
                let (checks_passed, checks_failed) = checks::count_item(item);
                ItemTally {
                    name: item.name.clone(),
                    passed: item.passed,
                    checks_passed,
                    checks_failed,
                }
            })
            .collect();

        let checks_passed = item_tallies.iter().map(|t| t.checks_passed).sum();
        let checks_failed = item_tallies.iter().map(|t| t.checks_failed).sum();

        let rate = pass_rate(items_passed, items_total);
        let total_cost = total_cost(&outcome.results);
        let duration_secs = outcome.total_time_ms.map(|ms| ms as f64 / 1000.0);

        // The rounded rate is what the user sees, so it is also what the
        // score is computed from.
        let score = if score_eligible(outcome.status) {
            composite_score(rate, total_cost, duration_secs.unwrap_or(0.0))
        } else {
            None
        };

        RunSummary {
            status: outcome.status,
            suite_name: outcome.suite_name.clone(),
            model: outcome.model.clone(),
            item_tallies,
            items_passed,
            items_total,
            checks_passed,
            checks_failed,
            pass_rate: rate,
            tier: Tier::for_rate(rate),
            total_time_ms: outcome.total_time_ms,
            total_cost,
            score,
        }
    }

    /// Gate decision: `true` exits 0, `false` exits 1.
    pub fn is_acceptable(&self) -> bool {
        self.pass_rate >= TIER_OK_MIN
    }
}

/// Sum of the per-item costs, or `None` when no item reported one.
fn total_cost(items: &[ItemResult]) -> Option<f64> {
    let mut sum = 0.0;
    let mut any = false;
    for item in items {
        if let Some(cost) = item.cost {
            sum += cost;
            any = true;
        }
    }
    any.then_some(sum)
}
