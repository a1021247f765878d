// src/api_client.rs
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::sources::{
    CreatedEntry, HolidayEntry, HolidaySource, LeaveDayEntry, LeaveSource, NewTimesheetEntry,
    SourceError, TimesheetEntry, TimesheetStore,
};

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 1000;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed")]
    Request(#[from] reqwest::Error),

    #[error("JSON processing error")]
    Json(#[from] serde_json::Error),

    #[error("URL parsing error")]
    UrlParse(#[from] url::ParseError),

    #[error("backend error: status={status}, message='{message}'")]
    Backend { status: StatusCode, message: String },

    #[error("backend rejected the call: {0}")]
    Rejected(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<ApiError> for SourceError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Rejected(message) => SourceError::Rejected(message),
            other => SourceError::Transport(other.to_string()),
        }
    }
}

/// Client configuration, read from `TIMEGRID_`-prefixed environment
/// variables (`TIMEGRID_BASE_URL`, `TIMEGRID_API_TOKEN`, ...).
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_token: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_settle_delay_ms() -> u64 {
    DEFAULT_SETTLE_DELAY_MS
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ApiError> {
        envy::prefixed("TIMEGRID_")
            .from_env::<ApiConfig>()
            .map_err(|e| ApiError::Config(e.to_string()))
    }
}

/// Uniform response wrapper used by every backend endpoint. `flag = false`
/// carries the failure message; the payload only matters when the flag is
/// set.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiEnvelope<T> {
    pub flag: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub response: Option<T>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRequest<'a> {
    timesheet_ids: &'a [String],
}

/// Thin typed client for the HR backend's timesheet, holiday, and leave
/// endpoints. Cloning is cheap; the HTTP client and config are shared.
#[derive(Clone)]
pub struct ApiClient {
    config: Arc<ApiConfig>,
    http: Client,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            config: Arc::new(config),
            http,
        })
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.config.settle_delay_ms)
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(Url::parse(&self.config.base_url)?.join(path)?)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<T, ApiError> {
        let response = request
            .bearer_auth(&self.config.api_token)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("{} failed: status={}, body={}", what, status, message);
            return Err(ApiError::Backend { status, message });
        }
        let envelope: ApiEnvelope<T> = response.json().await?;
        if !envelope.flag {
            let message = envelope
                .message
                .unwrap_or_else(|| "no message provided".to_string());
            return Err(ApiError::Rejected(message));
        }
        envelope
            .response
            .ok_or_else(|| ApiError::Rejected("backend returned an empty response".to_string()))
    }

    /// Like [`execute`](Self::execute) for endpoints that acknowledge
    /// without a payload.
    async fn execute_ack(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<(), ApiError> {
        let response = request
            .bearer_auth(&self.config.api_token)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("{} failed: status={}, body={}", what, status, message);
            return Err(ApiError::Backend { status, message });
        }
        let envelope: ApiEnvelope<serde_json::Value> = response.json().await?;
        if !envelope.flag {
            let message = envelope
                .message
                .unwrap_or_else(|| "no message provided".to_string());
            return Err(ApiError::Rejected(message));
        }
        Ok(())
    }

    pub async fn fetch_timesheets(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TimesheetEntry>, ApiError> {
        debug!("listing timesheet entries {}..{}", start, end);
        let url = self.endpoint("api/timesheets")?;
        let request = self.http.get(url).query(&[
            ("startDate", start.to_string()),
            ("endDate", end.to_string()),
        ]);
        self.execute(request, "timesheet list").await
    }

    pub async fn create_timesheets(
        &self,
        entries: &[NewTimesheetEntry],
    ) -> Result<Vec<CreatedEntry>, ApiError> {
        debug!("creating {} timesheet entries", entries.len());
        let url = self.endpoint("api/timesheets/batch")?;
        self.execute(self.http.post(url).json(entries), "timesheet create")
            .await
    }

    pub async fn update_timesheet(
        &self,
        timesheet_id: &str,
        entry: &NewTimesheetEntry,
    ) -> Result<(), ApiError> {
        debug!("updating timesheet entry {}", timesheet_id);
        let url = self.endpoint(&format!("api/timesheets/{}", timesheet_id))?;
        self.execute_ack(self.http.put(url).json(entry), "timesheet update")
            .await
    }

    pub async fn delete_timesheet(&self, timesheet_id: &str) -> Result<(), ApiError> {
        debug!("deleting timesheet entry {}", timesheet_id);
        let url = self.endpoint(&format!("api/timesheets/{}", timesheet_id))?;
        self.execute_ack(self.http.delete(url), "timesheet delete")
            .await
    }

    pub async fn submit_timesheets(&self, timesheet_ids: &[String]) -> Result<(), ApiError> {
        debug!("submitting {} timesheet entries", timesheet_ids.len());
        let url = self.endpoint("api/timesheets/submit")?;
        let body = SubmitRequest { timesheet_ids };
        self.execute_ack(self.http.post(url).json(&body), "timesheet submit")
            .await
    }

    pub async fn fetch_active_holidays(&self) -> Result<Vec<HolidayEntry>, ApiError> {
        debug!("listing active holidays");
        let url = self.endpoint("api/holidays/active")?;
        self.execute(self.http.get(url), "holiday list").await
    }

    pub async fn fetch_approved_leaves(&self, year: i32) -> Result<Vec<LeaveDayEntry>, ApiError> {
        debug!("listing approved leaves for {}", year);
        let url = self.endpoint("api/leaves/approved")?;
        let request = self.http.get(url).query(&[("year", year.to_string())]);
        self.execute(request, "leave list").await
    }
}

#[async_trait]
impl HolidaySource for ApiClient {
    async fn list_active_holidays(&self) -> Result<Vec<HolidayEntry>, SourceError> {
        Ok(self.fetch_active_holidays().await?)
    }
}

#[async_trait]
impl LeaveSource for ApiClient {
    async fn list_approved_leaves(&self, year: i32) -> Result<Vec<LeaveDayEntry>, SourceError> {
        Ok(self.fetch_approved_leaves(year).await?)
    }
}

#[async_trait]
impl TimesheetStore for ApiClient {
    async fn list(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TimesheetEntry>, SourceError> {
        Ok(self.fetch_timesheets(start, end).await?)
    }

    async fn create_batch(
        &self,
        entries: &[NewTimesheetEntry],
    ) -> Result<Vec<CreatedEntry>, SourceError> {
        Ok(self.create_timesheets(entries).await?)
    }

    async fn update(
        &self,
        timesheet_id: &str,
        entry: &NewTimesheetEntry,
    ) -> Result<(), SourceError> {
        Ok(self.update_timesheet(timesheet_id, entry).await?)
    }

    async fn delete(&self, timesheet_id: &str) -> Result<(), SourceError> {
        Ok(self.delete_timesheet(timesheet_id).await?)
    }

    async fn submit_for_approval(&self, timesheet_ids: &[String]) -> Result<(), SourceError> {
        Ok(self.submit_timesheets(timesheet_ids).await?)
    }
}
