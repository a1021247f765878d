// src/register.rs
use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::feedback::FeedbackQueue;
use crate::grid::{EditOutcome, GridState, LeaveDay};
use crate::sources::{
    HolidaySource, LeaveSource, NewTimesheetEntry, TimesheetStore, STATUS_SUBMITTED,
};
use crate::validation::{run_validation, validate_for_save, ValidationReport};
use crate::week::WeekWindow;

/// Pause between flushing drafts and collecting identifiers for submission,
/// tolerating eventual-consistency lag in the backend.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1000);

/// The one operation allowed to be in flight at a time. Every mutating entry
/// point requires `Idle`; anything else makes the call an informational
/// no-op rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpPhase {
    Idle,
    Loading,
    Saving,
    Confirming,
    Submitting,
    Deleting,
}

/// A queued create, remembered with its origin so returned identifiers can
/// be reconciled back into the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedCreate {
    pub row_idx: usize,
    pub entry: NewTimesheetEntry,
}

/// A queued update, keyed by the remote identifier it overwrites.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedUpdate {
    pub timesheet_id: String,
    pub row_idx: usize,
    pub date: NaiveDate,
    pub entry: NewTimesheetEntry,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SavePlan {
    pub creates: Vec<PlannedCreate>,
    pub updates: Vec<PlannedUpdate>,
}

impl SavePlan {
    pub fn is_empty(&self) -> bool {
        self.creates.is_empty() && self.updates.is_empty()
    }
}

/// Translates the grid's dirty state into the minimal set of remote calls.
///
/// A cell is saveable when its row was edited or already exists remotely,
/// the cell itself was edited or has a remote identifier, its value is
/// non-negative, and the row carries a task name. Cells without a remote
/// identifier become creates; cells with one become updates when the cell
/// or the row's name changed (the name is part of every remote entry).
/// The last write for a given identifier wins if one is somehow queued
/// twice.
pub fn build_save_plan(grid: &GridState) -> SavePlan {
    let mut plan = SavePlan::default();
    for (row_idx, row) in grid.rows.iter().enumerate() {
        if !(row.is_dirty() || row.has_remote_ids()) {
            continue;
        }
        if row.task_name.trim().is_empty() {
            continue;
        }
        for (&date, &hours) in &row.hours {
            if hours < Decimal::ZERO {
                continue;
            }
            let entry = NewTimesheetEntry {
                work_date: date,
                hours_worked: hours,
                task_name: row.task_name.clone(),
                task_description: row.task_name.clone(),
            };
            match row.remote_ids.get(&date) {
                None => {
                    if row.dirty_cells.contains(&date) {
                        plan.creates.push(PlannedCreate { row_idx, entry });
                    }
                }
                Some(timesheet_id) => {
                    if row.dirty_cells.contains(&date) || row.name_dirty {
                        if let Some(existing) = plan
                            .updates
                            .iter_mut()
                            .find(|update| update.timesheet_id == *timesheet_id)
                        {
                            existing.row_idx = row_idx;
                            existing.date = date;
                            existing.entry = entry;
                        } else {
                            plan.updates.push(PlannedUpdate {
                                timesheet_id: timesheet_id.clone(),
                                row_idx,
                                date,
                                entry,
                            });
                        }
                    }
                }
            }
        }
    }
    plan
}

/// The weekly timesheet register. Owns the grid, the operation phase, and
/// the feedback queue; everything remote goes through the three
/// collaborators. All methods take `&mut self`: the register belongs to a
/// single caller and interleaved async continuations are the only
/// "concurrency" it ever sees.
pub struct WeekRegister {
    holidays: Arc<dyn HolidaySource>,
    leaves: Arc<dyn LeaveSource>,
    timesheets: Arc<dyn TimesheetStore>,
    pub grid: GridState,
    pub feedback: FeedbackQueue,
    phase: OpPhase,
    settle_delay: Duration,
}

impl WeekRegister {
    pub fn new(
        holidays: Arc<dyn HolidaySource>,
        leaves: Arc<dyn LeaveSource>,
        timesheets: Arc<dyn TimesheetStore>,
        week: WeekWindow,
    ) -> Self {
        Self {
            holidays,
            leaves,
            timesheets,
            grid: GridState::new(week),
            feedback: FeedbackQueue::new(),
            phase: OpPhase::Idle,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn phase(&self) -> OpPhase {
        self.phase
    }

    pub fn is_locked(&self) -> bool {
        self.grid.locked
    }

    pub fn find_row(&self, task_name: &str) -> Option<usize> {
        self.grid
            .rows
            .iter()
            .position(|row| row.task_name == task_name)
    }

    /// Fetches the three collaborator datasets in parallel and materializes
    /// the row list for `week`. Holiday or leave failures degrade that
    /// dataset to empty, which relaxes validation but never tightens it; a
    /// timesheet failure leaves an unlocked, empty grid and surfaces the
    /// error. Reloads are deliberately not guarded against overlap; the
    /// later response wins.
    pub async fn load_week(&mut self, week: WeekWindow) {
        self.phase = OpPhase::Loading;
        info!("loading week starting {}", week.start());

        let year = week.start().year();
        let (holidays, leaves, entries) = tokio::join!(
            self.holidays.list_active_holidays(),
            self.leaves.list_approved_leaves(year),
            self.timesheets.list(week.start(), week.end()),
        );

        let mut grid = GridState::new(week);

        match holidays {
            Ok(list) => {
                grid.holiday_map = list
                    .into_iter()
                    .filter(|holiday| holiday.active)
                    .map(|holiday| (holiday.date, holiday.name))
                    .collect();
            }
            Err(e) => {
                warn!("holiday fetch failed, continuing without holidays: {}", e);
                self.feedback
                    .info(format!("holiday calendar unavailable: {}", e));
            }
        }

        match leaves {
            Ok(list) => {
                grid.leave_map = list
                    .into_iter()
                    .map(|leave| {
                        (
                            leave.date,
                            LeaveDay {
                                category: leave.leave_category,
                                duration: leave.duration,
                            },
                        )
                    })
                    .collect();
            }
            Err(e) => {
                warn!("leave fetch failed, continuing without leave days: {}", e);
                self.feedback
                    .info(format!("leave calendar unavailable: {}", e));
            }
        }

        match entries {
            Ok(list) => {
                let admitted: Vec<_> = list
                    .into_iter()
                    .filter(|entry| week.admits(entry.work_date))
                    .collect();
                grid.locked = admitted
                    .iter()
                    .any(|entry| entry.status == STATUS_SUBMITTED);
                grid.ingest_entries(admitted);
                if grid.rows.is_empty() {
                    grid.add_blank_row();
                }
            }
            Err(e) => {
                error!("timesheet fetch failed for week {}: {}", week.start(), e);
                self.feedback
                    .error(format!("failed to load timesheet entries: {}", e));
            }
        }

        debug!(
            "week {} loaded: {} rows, locked={}",
            week.start(),
            grid.rows.len(),
            grid.locked
        );
        self.grid = grid;
        self.phase = OpPhase::Idle;
    }

    async fn reload(&mut self) {
        let week = self.grid.week;
        self.load_week(week).await;
    }

    /// Returns true when the grid accepts remote-facing mutations right now;
    /// otherwise posts an informational message and returns false.
    fn ensure_mutable(&mut self, action: &str) -> bool {
        if self.grid.locked {
            self.feedback.info(format!(
                "the week is already submitted; {} ignored",
                action
            ));
            return false;
        }
        if self.phase != OpPhase::Idle {
            self.feedback.info(format!(
                "another operation is in progress; {} ignored",
                action
            ));
            return false;
        }
        true
    }

    /// Like [`ensure_mutable`](Self::ensure_mutable), but for purely local
    /// edits, which stay possible while a submit confirmation is pending;
    /// the confirmation path re-validates for exactly that reason.
    fn ensure_editable(&mut self, action: &str) -> bool {
        if self.grid.locked {
            self.feedback.info(format!(
                "the week is already submitted; {} ignored",
                action
            ));
            return false;
        }
        if !matches!(self.phase, OpPhase::Idle | OpPhase::Confirming) {
            self.feedback.info(format!(
                "another operation is in progress; {} ignored",
                action
            ));
            return false;
        }
        true
    }

    /// Applies one hour-value edit to a row/date cell, enforcing the
    /// per-cell and per-day caps. No remote call.
    pub fn edit_cell(&mut self, row_idx: usize, date: NaiveDate, proposed: Decimal) {
        if !self.ensure_editable("the edit") {
            return;
        }
        if row_idx >= self.grid.rows.len() {
            warn!("edit for unknown row index {} dropped", row_idx);
            return;
        }
        if !self.grid.week.contains(date) {
            warn!("edit for {} outside the displayed week dropped", date);
            return;
        }
        match self.grid.apply_hours(row_idx, date, proposed) {
            EditOutcome::Applied { .. } => {}
            EditOutcome::BlockedByHoliday { holiday_name } => {
                self.feedback.warning(format!(
                    "{} is the \"{}\" holiday; no hours can be reported",
                    date, holiday_name
                ));
            }
            EditOutcome::BlockedByLeave => {
                self.feedback.warning(format!(
                    "{} is an approved full-day leave; no hours can be reported",
                    date
                ));
            }
            EditOutcome::Capped { value, available } => {
                if available == Decimal::ZERO {
                    self.feedback.warning(format!(
                        "{}: no hours available, the day is already full",
                        date
                    ));
                } else {
                    self.feedback.warning(format!(
                        "{}: only {}h available; the entry was reduced to {}h",
                        date, available, value
                    ));
                }
            }
        }
    }

    pub fn rename_task(&mut self, row_idx: usize, task_name: &str) {
        if !self.ensure_editable("the rename") {
            return;
        }
        let Some(row) = self.grid.rows.get_mut(row_idx) else {
            warn!("rename for unknown row index {} dropped", row_idx);
            return;
        };
        if row.task_name != task_name {
            row.task_name = task_name.to_string();
            row.name_dirty = true;
        }
    }

    pub fn add_row(&mut self) -> Option<usize> {
        if !self.ensure_editable("adding a row") {
            return None;
        }
        Some(self.grid.add_blank_row())
    }

    /// Flushes dirty cells to the backend: one batched create plus one
    /// update call per touched identifier, then reconciles returned
    /// identifiers into the grid and reloads the week. Returns whether the
    /// save as a whole went through.
    pub async fn save_all(&mut self) -> bool {
        if !self.ensure_mutable("saving") {
            return false;
        }

        let report = validate_for_save(&self.grid);
        if !report.ok {
            self.surface(&report);
            return false;
        }

        let plan = build_save_plan(&self.grid);
        if plan.is_empty() {
            self.feedback.info("nothing to save");
            return true;
        }

        self.phase = OpPhase::Saving;
        info!(
            "saving week {}: {} creates, {} updates",
            self.grid.week.start(),
            plan.creates.len(),
            plan.updates.len()
        );

        if !plan.creates.is_empty() {
            let batch: Vec<NewTimesheetEntry> = plan
                .creates
                .iter()
                .map(|create| create.entry.clone())
                .collect();
            match self.timesheets.create_batch(&batch).await {
                Ok(created) => {
                    for record in created {
                        let matched = self.grid.rows.iter_mut().find(|row| {
                            record.task_name.as_deref() == Some(row.task_name.as_str())
                        });
                        match matched {
                            Some(row) => {
                                row.remote_ids
                                    .insert(record.work_date, record.timesheet_id);
                            }
                            None => warn!(
                                "created entry {} has no matching task row",
                                record.timesheet_id
                            ),
                        }
                    }
                }
                Err(e) => {
                    error!("batched create failed: {}", e);
                    self.feedback.error(format!("saving failed: {}", e));
                    self.phase = OpPhase::Idle;
                    return false;
                }
            }
        }

        // Best effort, no atomicity across the batch: one failed update does
        // not abort its siblings. Failed cells stay dirty so the next save
        // picks them up again.
        let mut failed: Vec<(String, NaiveDate, Decimal)> = Vec::new();
        for update in &plan.updates {
            if let Err(e) = self.timesheets.update(&update.timesheet_id, &update.entry).await {
                warn!("update of {} failed: {}", update.timesheet_id, e);
                failed.push((
                    update.entry.task_name.clone(),
                    update.date,
                    update.entry.hours_worked,
                ));
            }
        }

        for row in &mut self.grid.rows {
            row.clear_dirty();
        }

        self.phase = OpPhase::Idle;
        self.reload().await;

        if failed.is_empty() {
            self.feedback.success("changes saved");
        } else {
            // Carry the unsaved values across the reload and leave them
            // dirty, so the grid keeps showing what the user entered and the
            // next save retries exactly those cells.
            for (task_name, date, hours) in failed {
                let row_idx = match self.find_row(&task_name) {
                    Some(idx) => idx,
                    None => {
                        let idx = self.grid.add_blank_row();
                        self.grid.rows[idx].task_name = task_name.clone();
                        idx
                    }
                };
                let row = &mut self.grid.rows[row_idx];
                row.hours.insert(date, hours);
                row.dirty_cells.insert(date);
            }
            self.feedback.warning(
                "some entries could not be updated; they remain pending for the next save",
            );
        }
        true
    }

    /// First phase of submission: the exhaustive week validation. On success
    /// the register waits in `Confirming` for [`confirm_submit`] or
    /// [`cancel_submit`]; on failure every message is surfaced and nothing
    /// changes.
    ///
    /// [`confirm_submit`]: WeekRegister::confirm_submit
    /// [`cancel_submit`]: WeekRegister::cancel_submit
    pub fn begin_submit(&mut self) -> bool {
        if !self.ensure_mutable("submission") {
            return false;
        }
        let report = run_validation(&self.grid);
        if !report.ok {
            self.surface(&report);
            return false;
        }
        self.phase = OpPhase::Confirming;
        true
    }

    pub fn cancel_submit(&mut self) {
        if self.phase == OpPhase::Confirming {
            self.phase = OpPhase::Idle;
            self.feedback.info("submission cancelled");
        }
    }

    /// Second phase of submission, after the user confirmed: re-validate
    /// (the grid may have changed while the confirmation was pending), flush
    /// pending edits, wait out the backend's settle lag, then submit every
    /// identifier whose date carries hours. Partial progress is not rolled
    /// back on failure.
    pub async fn confirm_submit(&mut self) {
        if self.phase != OpPhase::Confirming {
            warn!("confirm_submit called outside the confirmation phase");
            return;
        }
        self.phase = OpPhase::Idle;

        let report = run_validation(&self.grid);
        if !report.ok {
            self.surface(&report);
            return;
        }

        if !self.save_all().await {
            self.feedback
                .error("submitting the timesheet failed; please try again");
            return;
        }

        sleep(self.settle_delay).await;
        self.reload().await;

        let timesheet_ids: Vec<String> = self
            .grid
            .rows
            .iter()
            .flat_map(|row| {
                row.remote_ids
                    .iter()
                    .filter(|(date, _)| row.hours_on(**date) > Decimal::ZERO)
                    .map(|(_, id)| id.clone())
            })
            .collect();

        if timesheet_ids.is_empty() {
            self.feedback.error("no valid entries to submit");
            return;
        }

        self.phase = OpPhase::Submitting;
        info!(
            "submitting {} entries for week {}",
            timesheet_ids.len(),
            self.grid.week.start()
        );
        match self.timesheets.submit_for_approval(&timesheet_ids).await {
            Ok(()) => {
                self.grid.locked = true;
                self.phase = OpPhase::Idle;
                self.feedback
                    .success("timesheet submitted for approval");
                self.reload().await;
                self.verify_lock_state().await;
            }
            Err(e) => {
                error!("submit failed: {}", e);
                self.phase = OpPhase::Idle;
                self.feedback
                    .error("submitting the timesheet failed; please try again");
            }
        }
    }

    /// The reload after a submit races the backend's status propagation, so
    /// re-fetch the list once more and lock if anything already reads as
    /// submitted.
    async fn verify_lock_state(&mut self) {
        let week = self.grid.week;
        match self.timesheets.list(week.start(), week.end()).await {
            Ok(entries) => {
                if entries
                    .iter()
                    .any(|entry| week.admits(entry.work_date) && entry.status == STATUS_SUBMITTED)
                {
                    self.grid.locked = true;
                }
            }
            Err(e) => warn!("lock-state verification fetch failed: {}", e),
        }
    }

    /// Removes a row and cascade-deletes every remote entry it references.
    /// The removal is staged first and rolled back if any remote delete
    /// fails; a purely local row commits without a reload so other unsaved
    /// rows survive.
    pub async fn delete_row(&mut self, row_idx: usize) {
        if !self.ensure_mutable("row deletion") {
            return;
        }
        if row_idx >= self.grid.rows.len() {
            warn!("delete for unknown row index {} dropped", row_idx);
            return;
        }

        self.phase = OpPhase::Deleting;
        let staged = self.grid.rows.remove(row_idx);
        let timesheet_ids: Vec<String> = staged.remote_ids.values().cloned().collect();
        info!(
            "deleting task {:?} with {} remote entries",
            staged.task_name,
            timesheet_ids.len()
        );

        for timesheet_id in &timesheet_ids {
            if let Err(e) = self.timesheets.delete(timesheet_id).await {
                error!("delete of {} failed: {}", timesheet_id, e);
                self.grid.rows.insert(row_idx, staged);
                self.phase = OpPhase::Idle;
                self.feedback
                    .error("deleting the task failed; the row was restored");
                return;
            }
        }

        self.phase = OpPhase::Idle;
        self.feedback.success("task removed");
        if !timesheet_ids.is_empty() {
            self.reload().await;
        }
    }

    fn surface(&mut self, report: &ValidationReport) {
        for message in &report.messages {
            self.feedback.error(message.clone());
        }
    }
}
