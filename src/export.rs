// src/export.rs
use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use crate::errors::Result;
use crate::models::{RunListing, RunRecord};
use crate::summary::record_score;

/// Column order is fixed; downstream spreadsheets key on these names.
pub const CSV_HEADER: &str = "id,suite_name,model,status,evals_passed,total_evals,success_percentage,duration_seconds,cost_usd,score,created_at";

/// Paged access to the run listing. `FilteredRuns` is the real one; tests
/// script fakes.
///
/// Note: We're not using async_trait here, so implementers must handle async directly.
pub trait RunPages: Send + Sync {
    fn fetch_page(
        &self,
        limit: u32,
        offset: u64,
    ) -> impl std::future::Future<Output = Result<RunListing>> + Send;
}

/// Ordering applied to the complete collected set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SortKey {
    /// Newest first.
    Created,
    /// Highest success percentage first.
    Success,
    /// Cheapest first.
    Cost,
    /// Fastest first.
    Time,
    /// Highest composite score first; unscored runs last.
    Score,
}

/// Walks the listing from `start_offset` until the service reports no more
/// pages, then sorts the complete set once. Sorting per page and
/// concatenating would interleave wrongly at every page boundary, so the
/// sort waits for the full set. Any page failure discards everything
/// collected so far; a partial export is worse than none.
pub async fn collect_runs<P>(
    source: &P,
    page_size: u32,
    start_offset: u64,
    sort: SortKey,
) -> Result<Vec<RunRecord>>
where
    P: RunPages,
{
    let mut all = Vec::new();
    let mut offset = start_offset;

    loop {
        let listing = source.fetch_page(page_size, offset).await?;
        let count = listing.runs.len() as u64;
        log::debug!("fetched {} run(s) at offset {}", count, offset);
        all.extend(listing.runs);

        // An empty page with hasMore set would spin forever; stop on either.
        if !listing.pagination.has_more || count == 0 {
            break;
        }
        offset += count;
    }

    sort_runs(&mut all, sort);
    Ok(all)
}

/// One stable sort over the whole set.
pub fn sort_runs(runs: &mut [RunRecord], key: SortKey) {
    match key {
        SortKey::Created => runs.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortKey::Success => runs.sort_by(|a, b| {
            b.success_percentage
                .partial_cmp(&a.success_percentage)
                .unwrap_or(Ordering::Equal)
        }),
        SortKey::Cost => runs.sort_by(|a, b| cmp_option_asc(a.cost_usd, b.cost_usd)),
        SortKey::Time => {
            runs.sort_by(|a, b| cmp_option_asc(a.duration_seconds, b.duration_seconds))
        }
        SortKey::Score => runs.sort_by(|a, b| cmp_score_desc(record_score(a), record_score(b))),
    }
}

/// Ascending; missing values sort after present ones.
fn cmp_option_asc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Descending; undefined scores sort after defined ones, keeping their
/// incoming order (the sort is stable).
fn cmp_score_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Renders the collected runs as CSV, header included.
pub fn to_csv(runs: &[RunRecord]) -> String {
    let mut out = String::with_capacity(CSV_HEADER.len() + runs.len() * 96);
    out.push_str(CSV_HEADER);
    out.push('\n');

    for run in runs {
        let score = record_score(run)
            .map(|s| format!("{:.2}", s))
            .unwrap_or_default();
        let fields = [
            csv_field(&run.id),
            csv_field(run.suite_name.as_deref().unwrap_or("")),
            csv_field(run.model.as_deref().unwrap_or("")),
            run.status.as_str().to_string(),
            run.evals_passed.to_string(),
            run.total_evals.to_string(),
            format!("{:.1}", run.success_percentage),
            run.duration_seconds.map(|d| d.to_string()).unwrap_or_default(),
            run.cost_usd.map(|c| c.to_string()).unwrap_or_default(),
            score,
            csv_field(&run.created_at.to_rfc3339()),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

/// Collects, sorts and writes in one step. Nothing is written until the
/// whole listing is in hand.
pub async fn export_csv<P>(
    source: &P,
    page_size: u32,
    sort: SortKey,
    path: &Path,
) -> Result<usize>
where
    P: RunPages,
{
    let runs = collect_runs(source, page_size, 0, sort).await?;
    fs::write(path, to_csv(&runs))?;
    Ok(runs.len())
}

/// Quotes a field when it contains a delimiter, quote or line break;
/// embedded quotes are doubled.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RunStatus;
    use chrono::TimeZone;

    fn record(id: &str, success: f64, cost: Option<f64>, created_hour: u32) -> RunRecord {
        RunRecord {
            id: id.to_string(),
            suite_name: Some("smoke".to_string()),
            model: Some("gpt-4o-mini".to_string()),
            status: RunStatus::Completed,
            evals_passed: 9,
            total_evals: 10,
            success_percentage: success,
            duration_seconds: Some(4.2),
            cost_usd: cost,
            created_at: chrono::Utc
                .with_ymd_and_hms(2025, 6, 1, created_hour, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_csv_field_quotes_only_when_needed() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("has,comma"), "\"has,comma\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_csv_has_fixed_header_and_row_shape() {
        let runs = vec![record("run-1", 90.0, Some(0.00031), 12)];
        let csv = to_csv(&runs);
        let mut lines = csv.lines();

        assert_eq!(lines.next().unwrap(), CSV_HEADER);
        let row = lines.next().unwrap();
        assert!(row.starts_with("run-1,smoke,gpt-4o-mini,completed,9,10,90.0,4.2,0.00031,"));
        assert!(row.contains("2025-06-01T12:00:00"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_csv_score_column_is_empty_when_undefined() {
        let runs = vec![record("run-1", 90.0, None, 12)];
        let csv = to_csv(&runs);
        let row = csv.lines().nth(1).unwrap();

        // duration present, cost and score empty
        assert!(row.contains(",4.2,,,"));
    }

    #[test]
    fn test_csv_quotes_suite_names_with_commas() {
        let mut run = record("run-1", 90.0, None, 12);
        run.suite_name = Some("smoke, extended".to_string());
        let csv = to_csv(&[run]);

        assert!(csv.contains("\"smoke, extended\""));
    }

    #[test]
    fn test_sort_created_is_newest_first() {
        let mut runs = vec![
            record("old", 10.0, None, 1),
            record("new", 20.0, None, 9),
            record("mid", 30.0, None, 5),
        ];
        sort_runs(&mut runs, SortKey::Created);
        let ids: Vec<&str> = runs.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_sort_cost_puts_missing_last() {
        let mut runs = vec![
            record("pricey", 50.0, Some(0.9), 1),
            record("free", 50.0, None, 2),
            record("cheap", 50.0, Some(0.1), 3),
        ];
        sort_runs(&mut runs, SortKey::Cost);
        let ids: Vec<&str> = runs.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["cheap", "pricey", "free"]);
    }

    #[test]
    fn test_sort_score_keeps_unscored_in_incoming_order() {
        let mut unscored_a = record("no-score-a", 90.0, None, 1);
        unscored_a.status = RunStatus::TimedOut;
        let mut unscored_b = record("no-score-b", 90.0, None, 2);
        unscored_b.cost_usd = None;

        let mut runs = vec![
            unscored_a,
            record("low", 10.0, Some(0.001), 3),
            unscored_b,
            record("high", 99.0, Some(0.001), 4),
        ];
        sort_runs(&mut runs, SortKey::Score);
        let ids: Vec<&str> = runs.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["high", "low", "no-score-a", "no-score-b"]);
    }
}
