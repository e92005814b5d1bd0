// tests/export_tests.rs
//
// Full-listing collection: paging to exhaustion, the one late sort, and the
// all-or-nothing failure behavior.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::TimeZone;
use evalgate::errors::{EvalError, Result};
use evalgate::export::{self, RunPages, SortKey};
use evalgate::models::{Pagination, RunListing, RunRecord, RunStatus};

struct ScriptedPages {
    pages: Mutex<VecDeque<Result<RunListing>>>,
    offsets: Mutex<Vec<u64>>,
}

impl ScriptedPages {
    fn new(pages: Vec<Result<RunListing>>) -> Self {
        ScriptedPages {
            pages: Mutex::new(pages.into_iter().collect()),
            offsets: Mutex::new(Vec::new()),
        }
    }

    fn seen_offsets(&self) -> Vec<u64> {
        self.offsets.lock().unwrap().clone()
    }
}

impl RunPages for ScriptedPages {
    async fn fetch_page(&self, _limit: u32, offset: u64) -> Result<RunListing> {
        self.offsets.lock().unwrap().push(offset);
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .expect("collector asked for more pages than were scripted")
    }
}

fn record(id: &str, success: f64, created_hour: u32) -> RunRecord {
    RunRecord {
        id: id.to_string(),
        suite_name: Some("smoke".to_string()),
        model: Some("gpt-4o-mini".to_string()),
        status: RunStatus::Completed,
        evals_passed: 9,
        total_evals: 10,
        success_percentage: success,
        duration_seconds: Some(4.2),
        cost_usd: Some(0.0003),
        created_at: chrono::Utc
            .with_ymd_and_hms(2025, 6, 1, created_hour, 0, 0)
            .unwrap(),
    }
}

fn page(runs: Vec<RunRecord>, has_more: bool) -> Result<RunListing> {
    let total = runs.len() as u64;
    Ok(RunListing {
        runs,
        pagination: Pagination { total, has_more },
    })
}

#[tokio::test]
async fn test_collects_every_page_before_sorting() {
    // Success order interleaves across the page boundary: a per-page sort
    // would yield 90, 50, 70 instead.
    let source = ScriptedPages::new(vec![
        page(vec![record("r1", 90.0, 1), record("r2", 50.0, 2)], true),
        page(vec![record("r3", 70.0, 3)], false),
    ]);

    let runs = export::collect_runs(&source, 2, 0, SortKey::Success)
        .await
        .unwrap();

    let ids: Vec<&str> = runs.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["r1", "r3", "r2"]);
    assert_eq!(source.seen_offsets(), vec![0, 2]);
}

#[tokio::test]
async fn test_offset_advances_by_returned_count() {
    let source = ScriptedPages::new(vec![
        page(vec![record("r1", 10.0, 1), record("r2", 20.0, 2)], true),
        page(vec![record("r3", 30.0, 3), record("r4", 40.0, 4)], true),
        page(vec![record("r5", 50.0, 5)], false),
    ]);

    let runs = export::collect_runs(&source, 2, 0, SortKey::Created)
        .await
        .unwrap();

    assert_eq!(runs.len(), 5);
    assert_eq!(source.seen_offsets(), vec![0, 2, 4]);
}

#[tokio::test]
async fn test_page_failure_discards_the_whole_export() {
    let source = ScriptedPages::new(vec![
        page(vec![record("r1", 90.0, 1)], true),
        Err(EvalError::ApiError {
            status: 502,
            body: "bad gateway".to_string(),
        }),
    ]);

    let err = export::collect_runs(&source, 1, 0, SortKey::Created)
        .await
        .unwrap_err();

    match err {
        EvalError::ApiError { status, .. } => assert_eq!(status, 502),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_page_with_has_more_does_not_spin() {
    let source = ScriptedPages::new(vec![page(Vec::new(), true)]);

    let runs = export::collect_runs(&source, 10, 0, SortKey::Created)
        .await
        .unwrap();

    assert!(runs.is_empty());
    assert_eq!(source.seen_offsets(), vec![0]);
}

#[tokio::test]
async fn test_collection_starts_at_the_given_offset() {
    let source = ScriptedPages::new(vec![page(vec![record("r4", 40.0, 4)], false)]);

    let runs = export::collect_runs(&source, 10, 3, SortKey::Created)
        .await
        .unwrap();

    assert_eq!(runs.len(), 1);
    assert_eq!(source.seen_offsets(), vec![3]);
}

#[tokio::test]
async fn test_export_writes_header_and_sorted_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("runs.csv");

    let source = ScriptedPages::new(vec![
        page(vec![record("old", 90.0, 1)], true),
        page(vec![record("new", 50.0, 9)], false),
    ]);

    let count = export::export_csv(&source, 1, SortKey::Created, &path)
        .await
        .unwrap();
    assert_eq!(count, 2);

    let csv = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], export::CSV_HEADER);
    assert!(lines[1].starts_with("new,"));
    assert!(lines[2].starts_with("old,"));
}
