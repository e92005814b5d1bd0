// src/poller.rs
use std::time::Duration;

use crate::errors::{EvalError, RUN_FAILED_FALLBACK, Result};
use crate::models::{ItemResult, RunStatus, StatusResponse};

/// Transport seam for the poll loop: anything that can answer a status query
/// for a run identifier. `ApiClient` is the real one; tests script fakes.
///
/// Note: We're not using async_trait here, so implementers must handle async directly.
pub trait StatusSource: Send + Sync {
    fn fetch_status(
        &self,
        run_id: &str,
    ) -> impl std::future::Future<Output = Result<StatusResponse>> + Send;
}

/// Run metadata shown once at the top of the tracked output.
#[derive(Debug, Clone)]
pub struct RunHeader {
    pub suite_name: Option<String>,
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    pub is_update: bool,
}

impl RunHeader {
    fn from_response(resp: &StatusResponse) -> Self {
        RunHeader {
            suite_name: resp.suite_name.clone(),
            model: resp.model.clone(),
            system_prompt: resp.system_prompt.clone(),
            is_update: resp.is_update.unwrap_or(false),
        }
    }
}

/// Display callbacks driven by the poll loop as data arrives.
pub trait RunObserver {
    fn on_header(&mut self, header: &RunHeader);
    fn on_items(&mut self, items: &[ItemResult]);
}

/// Emits only the unseen suffix of a growing result sequence.
#[derive(Debug, Default)]
pub struct Accumulator {
    seen: usize,
}

impl Accumulator {
    pub fn new() -> Self {
        Accumulator { seen: 0 }
    }

    /// Returns `all[seen..]` and advances past it. An unchanged sequence
    /// yields an empty slice; a shrunken one (which the service contract
    /// rules out) yields an empty slice and leaves the mark untouched.
    pub fn take_new<'a>(&mut self, all: &'a [ItemResult]) -> &'a [ItemResult] {
        if all.len() <= self.seen {
            return &[];
        }
        let fresh = &all[self.seen..];
        self.seen = all.len();
        fresh
    }

    pub fn seen(&self) -> usize {
        self.seen
    }
}

/// Everything the summary needs from a run that reached a summarizable
/// terminal state (`completed`, `partial_failure` or `timed_out`).
#[derive(Debug, Clone)]
pub struct PollOutcome {
    pub status: RunStatus,
    pub results: Vec<ItemResult>,
    pub suite_name: Option<String>,
    pub model: Option<String>,
    pub total_time_ms: Option<u64>,
}

/// Tracks a run until the service reports a terminal status.
///
/// One status query per tick, strictly sequential: the next query is issued
/// only after the previous one resolved and the interval elapsed. The loop
/// owns exactly two pieces of state, the flushed-item count and the
/// header-shown flag. A transport or HTTP failure aborts immediately via the
/// source's error; there is no retry of a poll tick.
///
/// `failed`/`error` runs return `EvalError::RunFailed` carrying the attached
/// error message (or a fixed fallback) and produce no outcome.
pub async fn poll_run<S, O>(
    source: &S,
    run_id: &str,
    interval: Duration,
    observer: &mut O,
) -> Result<PollOutcome>
where
    S: StatusSource,
    O: RunObserver,
{
    let mut accumulator = Accumulator::new();
    let mut header_shown = false;

    loop {
        let resp = source.fetch_status(run_id).await?;

        log::debug!(
            "run {}: status {} with {} result(s)",
            run_id,
            resp.status,
            resp.results.len()
        );

        // The header rides on whichever response first carries it, whatever
        // that response's status is.
        if !header_shown && resp.has_header() {
            observer.on_header(&RunHeader::from_response(&resp));
            header_shown = true;
        }

        match resp.status {
            RunStatus::Failed | RunStatus::Error => {
                let message = resp
                    .error_message()
                    .unwrap_or(RUN_FAILED_FALLBACK)
                    .to_string();
                return Err(EvalError::RunFailed { message });
            }
            status if status.is_terminal() => {
                let fresh = accumulator.take_new(&resp.results);
                if !fresh.is_empty() {
                    observer.on_items(fresh);
                }
                return Ok(PollOutcome {
                    status,
                    results: resp.results,
                    suite_name: resp.suite_name,
                    model: resp.model,
                    total_time_ms: resp.total_time_ms,
                });
            }
            _ => {
                let fresh = accumulator.take_new(&resp.results);
                if !fresh.is_empty() {
                    observer.on_items(fresh);
                }
            }
        }

        tokio::time::sleep(interval).await;
    }
}
