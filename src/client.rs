// src/client.rs
use chrono::{DateTime, Utc};
use reqwest::{Client, Response};

use crate::config::AppConfig;
use crate::errors::{EvalError, Result};
use crate::export::RunPages;
use crate::models::{ErrorDetail, RunListing, RunStatus, StatusResponse, SubmitResponse};
use crate::poller::StatusSource;

/// Optional server-side filters for the run listing endpoints.
#[derive(Debug, Clone, Default)]
pub struct ListFilters {
    pub status: Option<RunStatus>,
    pub min_success: Option<f64>,
    pub max_success: Option<f64>,
    pub max_cost: Option<f64>,
    pub max_duration: Option<f64>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl ListFilters {
    fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(min) = self.min_success {
            params.push(("minSuccess", min.to_string()));
        }
        if let Some(max) = self.max_success {
            params.push(("maxSuccess", max.to_string()));
        }
        if let Some(cost) = self.max_cost {
            params.push(("maxCost", cost.to_string()));
        }
        if let Some(duration) = self.max_duration {
            params.push(("maxDuration", duration.to_string()));
        }
        if let Some(from) = self.from {
            params.push(("from", from.to_rfc3339()));
        }
        if let Some(to) = self.to {
            params.push(("to", to.to_rfc3339()));
        }
        params
    }
}

/// HTTP client for the scoring service. All requests carry the configured
/// bearer key; auth and quota rejections map to their own error variants so
/// the CLI can explain them.
pub struct ApiClient {
    client: Client,
    config: AppConfig,
}

impl ApiClient {
    pub fn new(client: Client, config: AppConfig) -> Self {
        ApiClient { client, config }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base.trim_end_matches('/'), path)
    }

    /// Submits a suite definition and returns the new run's identifier.
    /// The body goes up verbatim; the service parses the YAML.
    pub async fn submit_suite(&self, suite_yaml: &str) -> Result<String> {
        let url = self.url("/api/v1/runs");
        log::debug!("POST {}", url);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .header("Content-Type", "text/yaml")
            .body(suite_yaml.to_string())
            .send()
            .await?;

        let value = Self::checked_json(resp).await?;
        let submit: SubmitResponse = serde_json::from_value(value)?;
        Ok(submit.id)
    }

    /// One poll tick: the service's current view of a run.
    pub async fn run_status(&self, run_id: &str) -> Result<StatusResponse> {
        let url = self.url(&format!("/api/v1/runs/{}/status", run_id));
        log::debug!("GET {}", url);

        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::error_for(resp).await);
        }

        // An `error` field here belongs to the run itself (it accompanies the
        // failed statuses), so the body is handed through unfiltered.
        let status_resp: StatusResponse = resp.json().await?;
        Ok(status_resp)
    }

    /// One page of the run listing, filtered server-side.
    pub async fn list_runs(
        &self,
        filters: &ListFilters,
        limit: u32,
        offset: u64,
    ) -> Result<RunListing> {
        let url = self.url("/api/v1/runs");
        let mut params = filters.query_params();
        params.push(("limit", limit.to_string()));
        params.push(("offset", offset.to_string()));
        log::debug!("GET {} (offset {})", url, offset);

        let resp = self
            .client
            .get(&url)
            .query(&params)
            .bearer_auth(&self.config.api_key)
            .send()
            .await?;

        let value = Self::checked_json(resp).await?;
        let listing: RunListing = serde_json::from_value(value)?;
        Ok(listing)
    }

    /// Asks the service to stop a queued or running run.
    pub async fn cancel_run(&self, run_id: &str) -> Result<()> {
        let url = self.url(&format!("/api/v1/runs/{}/cancel", run_id));
        log::debug!("POST {}", url);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::error_for(resp).await);
        }
        Ok(())
    }

    /// Pairs this client with a filter set so the export crawl can page
    /// through `GET /api/v1/runs` with a fixed query.
    pub fn runs_with(&self, filters: ListFilters) -> FilteredRuns<'_> {
        FilteredRuns {
            client: self,
            filters,
        }
    }

    /// Maps a non-2xx response to the matching error variant, consuming the
    /// body for the generic case.
    async fn error_for(resp: Response) -> EvalError {
        let status = resp.status().as_u16();
        match status {
            401 | 403 => EvalError::AuthFailed { status },
            402 | 429 => EvalError::QuotaExceeded { status },
            _ => {
                let body = resp
                    .text()
                    .await
                    .unwrap_or_else(|_| "Could not read error body".to_string());
                EvalError::ApiError { status, body }
            }
        }
    }

    /// Checks the HTTP status, then checks the 2xx body for a service-level
    /// `error` field before handing the JSON back.
    async fn checked_json(resp: Response) -> Result<serde_json::Value> {
        if !resp.status().is_success() {
            return Err(Self::error_for(resp).await);
        }

        let value: serde_json::Value = resp.json().await?;
        if let Some(error) = Self::body_error(&value) {
            return Err(error);
        }
        Ok(value)
    }

    fn body_error(value: &serde_json::Value) -> Option<EvalError> {
        let error = value.get("error")?;
        if error.is_null() {
            return None;
        }
        let message = serde_json::from_value::<ErrorDetail>(error.clone())
            .map(|detail| detail.message().to_string())
            .unwrap_or_else(|_| error.to_string());
        Some(EvalError::ServiceError(message))
    }
}

impl StatusSource for ApiClient {
    async fn fetch_status(&self, run_id: &str) -> Result<StatusResponse> {
        self.run_status(run_id).await
    }
}

/// An `ApiClient` bound to a filter set, viewed as a page source.
pub struct FilteredRuns<'a> {
    client: &'a ApiClient,
    filters: ListFilters,
}

impl RunPages for FilteredRuns<'_> {
    async fn fetch_page(&self, limit: u32, offset: u64) -> Result<RunListing> {
        self.client.list_runs(&self.filters, limit, offset).await
    }
}
