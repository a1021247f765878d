// src/sources.rs
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Remote entry status that freezes the whole week once present.
pub const STATUS_SUBMITTED: &str = "Submitted";

/// Failure at a collaborator boundary. The engine treats a backend envelope
/// with `flag = false` the same way as a transport failure; the two variants
/// exist so log lines can tell them apart.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("backend rejected the call: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolidayEntry {
    pub date: NaiveDate,
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveDayEntry {
    pub date: NaiveDate,
    pub leave_category: String,
    /// `1` marks a full day, `0.5` a half day. Anything else still counts as
    /// a leave day but carries no hour cap of its own.
    pub duration: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetEntry {
    pub timesheet_id: String,
    pub work_date: NaiveDate,
    pub worked_hours: Decimal,
    #[serde(default)]
    pub task_name: Option<String>,
    pub status: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub task_description: Option<String>,
}

/// Payload for both create and update calls. The backend names the hours
/// field `hoursWorked` here but `workedHours` on the list side; that
/// asymmetry is part of the contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTimesheetEntry {
    pub work_date: NaiveDate,
    pub hours_worked: Decimal,
    pub task_name: String,
    pub task_description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedEntry {
    pub timesheet_id: String,
    pub work_date: NaiveDate,
    #[serde(default)]
    pub task_name: Option<String>,
}

#[async_trait]
pub trait HolidaySource: Send + Sync {
    /// All active holidays, independent of any week; callers filter by date.
    async fn list_active_holidays(&self) -> Result<Vec<HolidayEntry>, SourceError>;
}

#[async_trait]
pub trait LeaveSource: Send + Sync {
    /// Approved leave days for one calendar year.
    async fn list_approved_leaves(&self, year: i32) -> Result<Vec<LeaveDayEntry>, SourceError>;
}

#[async_trait]
pub trait TimesheetStore: Send + Sync {
    async fn list(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TimesheetEntry>, SourceError>;

    /// One request carrying every queued create.
    async fn create_batch(
        &self,
        entries: &[NewTimesheetEntry],
    ) -> Result<Vec<CreatedEntry>, SourceError>;

    async fn update(
        &self,
        timesheet_id: &str,
        entry: &NewTimesheetEntry,
    ) -> Result<(), SourceError>;

    async fn delete(&self, timesheet_id: &str) -> Result<(), SourceError>;

    async fn submit_for_approval(&self, timesheet_ids: &[String]) -> Result<(), SourceError>;
}
