// src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a submitted run, as reported by the scoring service.
///
/// Transitions only move forward along
/// `queued → running → {completed | failed | partial_failure | timed_out | error}`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    Running,
    Completed,
    Failed,
    PartialFailure,
    TimedOut,
    Error,
}

impl RunStatus {
    /// Whether the service will report any further results for this run.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Queued | RunStatus::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::PartialFailure => "partial_failure",
            RunStatus::TimedOut => "timed_out",
            RunStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error detail attached to a failed run. The service sends either a bare
/// string or a `{message: ...}` object depending on where the failure arose.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum ErrorDetail {
    Structured { message: String },
    Text(String),
}

impl ErrorDetail {
    pub fn message(&self) -> &str {
        match self {
            ErrorDetail::Structured { message } => message,
            ErrorDetail::Text(text) => text,
        }
    }
}

/// One check outcome. Combinator checks (`any_of`, `all_of`) carry children
/// of the same shape, so the whole thing forms a tree.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CheckResult {
    #[serde(rename = "type")]
    pub check_type: String,

    pub passed: bool,

    /// Human-readable explanation of the verdict.
    #[serde(default)]
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<CheckResult>>,
}

/// The outcome of evaluating one prompt within a run.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ItemResult {
    pub name: String,

    pub prompt: String,

    /// Raw model response text.
    pub response: String,

    /// Top-level checks for this item.
    #[serde(default)]
    pub checks: Vec<CheckResult>,

    /// Overall verdict as asserted by the service. Never recomputed
    /// client-side from the checks.
    pub passed: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_ms: Option<u64>,

    /// Monetary cost for this item in USD.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
}

/// Response of the run status endpoint. `results` grows monotonically while
/// the run is non-terminal; the aggregate fields show up only when the
/// service has them.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: RunStatus,

    #[serde(default)]
    pub results: Vec<ItemResult>,

    /// True when this run updates a previously saved suite.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_update: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suite_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_time_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

impl StatusResponse {
    /// Whether this response carries the one-shot run header.
    pub fn has_header(&self) -> bool {
        self.suite_name.is_some() || self.model.is_some()
    }

    /// The attached error message, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message())
    }
}

/// Response of the submission endpoint.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SubmitResponse {
    pub id: String,
}

/// One row of the run listing endpoint.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suite_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    pub status: RunStatus,

    pub evals_passed: u32,

    pub total_evals: u32,

    pub success_percentage: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub has_more: bool,
}

/// One page of the paginated run listing.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RunListing {
    pub runs: Vec<RunRecord>,
    pub pagination: Pagination,
}
