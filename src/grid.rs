// src/grid.rs
use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use crate::sources::TimesheetEntry;
use crate::week::WeekWindow;

/// Hard ceiling on the summed hours of one calendar day.
pub const DAY_CAP: Decimal = dec!(8);
/// Ceiling applied instead of [`DAY_CAP`] when the day carries a half-day leave.
pub const HALF_DAY_CAP: Decimal = dec!(4);
/// Safety clamp for a single cell, applied after the per-day arithmetic.
pub const CELL_MAX: Decimal = dec!(8);
/// Validator sanity bound; nothing above this is ever a plausible day entry.
pub const HOURS_SANITY_MAX: Decimal = dec!(24);

pub const FULL_DAY_LEAVE: Decimal = dec!(1);
pub const HALF_DAY_LEAVE: Decimal = dec!(0.5);

/// Label substituted for remote entries that arrive without a task name.
pub const UNTITLED_TASK: &str = "Untitled";

/// Approved leave on one date, as kept in the working set.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaveDay {
    pub category: String,
    pub duration: Decimal,
}

impl LeaveDay {
    pub fn is_full_day(&self) -> bool {
        self.duration == FULL_DAY_LEAVE
    }

    pub fn is_half_day(&self) -> bool {
        self.duration == HALF_DAY_LEAVE
    }
}

/// One task's hours across the displayed week. Dirtiness is tracked per
/// cell, with a separate flag for the task name, so save and validation can
/// scope themselves to exactly the cells that changed.
#[derive(Debug, Clone)]
pub struct TaskRow {
    pub id: u64,
    pub task_name: String,
    pub hours: BTreeMap<NaiveDate, Decimal>,
    pub remote_ids: BTreeMap<NaiveDate, String>,
    pub dirty_cells: BTreeSet<NaiveDate>,
    pub name_dirty: bool,
}

impl TaskRow {
    pub fn blank(id: u64, week: &WeekWindow) -> Self {
        Self {
            id,
            task_name: String::new(),
            hours: week.dates().map(|date| (date, Decimal::ZERO)).collect(),
            remote_ids: BTreeMap::new(),
            dirty_cells: BTreeSet::new(),
            name_dirty: false,
        }
    }

    pub fn hours_on(&self, date: NaiveDate) -> Decimal {
        self.hours.get(&date).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn has_remote_ids(&self) -> bool {
        !self.remote_ids.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.name_dirty || !self.dirty_cells.is_empty()
    }

    pub fn has_positive_hours(&self) -> bool {
        self.hours.values().any(|hours| *hours > Decimal::ZERO)
    }

    /// Empty name and no positive hour: validation and save skip the row.
    pub fn is_blank(&self) -> bool {
        self.task_name.trim().is_empty() && !self.has_positive_hours()
    }

    /// A cell belongs to the incremental save/validation scope when it was
    /// edited locally or already exists remotely.
    pub fn cell_in_save_scope(&self, date: NaiveDate) -> bool {
        self.dirty_cells.contains(&date) || self.remote_ids.contains_key(&date)
    }

    pub fn clear_dirty(&mut self) {
        self.dirty_cells.clear();
        self.name_dirty = false;
    }
}

/// What a single cell edit did to the grid.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    Applied {
        value: Decimal,
    },
    /// The date is an active holiday; the cell was forced to zero.
    BlockedByHoliday {
        holiday_name: String,
    },
    /// The date is an approved full-day leave; the cell was forced to zero.
    BlockedByLeave,
    /// The proposed value exceeded what the day still allows and was reduced.
    Capped {
        value: Decimal,
        available: Decimal,
    },
}

/// The in-memory week grid: rows, lock state, and the holiday/leave working
/// sets the validators consult.
#[derive(Debug, Clone)]
pub struct GridState {
    pub week: WeekWindow,
    pub rows: Vec<TaskRow>,
    pub locked: bool,
    pub holiday_map: HashMap<NaiveDate, String>,
    pub leave_map: HashMap<NaiveDate, LeaveDay>,
    next_row_id: u64,
}

impl GridState {
    pub fn new(week: WeekWindow) -> Self {
        Self {
            week,
            rows: Vec::new(),
            locked: false,
            holiday_map: HashMap::new(),
            leave_map: HashMap::new(),
            next_row_id: 1,
        }
    }

    pub fn add_blank_row(&mut self) -> usize {
        let id = self.next_row_id;
        self.next_row_id += 1;
        self.rows.push(TaskRow::blank(id, &self.week));
        self.rows.len() - 1
    }

    /// Groups remote entries into one row per distinct task name
    /// (case-sensitive; a missing name becomes [`UNTITLED_TASK`]), keeping
    /// first-seen order. Later entries for the same (task, date) overwrite
    /// earlier ones.
    pub fn ingest_entries(&mut self, entries: Vec<TimesheetEntry>) {
        let mut index_by_name: HashMap<String, usize> = HashMap::new();
        for entry in entries {
            let name = entry
                .task_name
                .clone()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| UNTITLED_TASK.to_string());
            let row_idx = match index_by_name.get(&name) {
                Some(idx) => *idx,
                None => {
                    let idx = self.add_blank_row();
                    self.rows[idx].task_name = name.clone();
                    index_by_name.insert(name, idx);
                    idx
                }
            };
            let row = &mut self.rows[row_idx];
            row.hours.insert(entry.work_date, entry.worked_hours);
            row.remote_ids.insert(entry.work_date, entry.timesheet_id);
        }
    }

    pub fn holiday_name(&self, date: NaiveDate) -> Option<&str> {
        self.holiday_map.get(&date).map(String::as_str)
    }

    pub fn leave_on(&self, date: NaiveDate) -> Option<&LeaveDay> {
        self.leave_map.get(&date)
    }

    pub fn is_full_day_leave(&self, date: NaiveDate) -> bool {
        self.leave_on(date).is_some_and(LeaveDay::is_full_day)
    }

    pub fn is_half_day_leave(&self, date: NaiveDate) -> bool {
        self.leave_on(date).is_some_and(LeaveDay::is_half_day)
    }

    pub fn day_total(&self, date: NaiveDate) -> Decimal {
        self.rows.iter().map(|row| row.hours_on(date)).sum()
    }

    pub fn other_rows_total(&self, skip_row_idx: usize, date: NaiveDate) -> Decimal {
        self.rows
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != skip_row_idx)
            .map(|(_, row)| row.hours_on(date))
            .sum()
    }

    /// Writes one hour value into a cell, enforcing the per-cell and per-day
    /// caps first. Holiday and full-day-leave dates force the value to zero
    /// before the cap arithmetic runs. The final value is clamped to
    /// `[0, CELL_MAX]` and the cell is marked dirty. Purely in-memory.
    pub fn apply_hours(
        &mut self,
        row_idx: usize,
        date: NaiveDate,
        proposed: Decimal,
    ) -> EditOutcome {
        if let Some(holiday_name) = self.holiday_map.get(&date).cloned() {
            self.write_cell(row_idx, date, Decimal::ZERO);
            return EditOutcome::BlockedByHoliday { holiday_name };
        }
        if self.is_full_day_leave(date) {
            self.write_cell(row_idx, date, Decimal::ZERO);
            return EditOutcome::BlockedByLeave;
        }

        let other_rows_total = self.other_rows_total(row_idx, date);
        let mut allowed = DAY_CAP - other_rows_total;
        if self.is_half_day_leave(date) {
            allowed = allowed.min(HALF_DAY_CAP);
        }
        let allowed = allowed.max(Decimal::ZERO);

        if proposed > allowed {
            let value = allowed.clamp(Decimal::ZERO, CELL_MAX);
            self.write_cell(row_idx, date, value);
            return EditOutcome::Capped {
                value,
                available: allowed,
            };
        }

        let value = proposed.clamp(Decimal::ZERO, CELL_MAX);
        self.write_cell(row_idx, date, value);
        EditOutcome::Applied { value }
    }

    fn write_cell(&mut self, row_idx: usize, date: NaiveDate, value: Decimal) {
        let row = &mut self.rows[row_idx];
        debug!(
            "cell write: task={:?} date={} value={}",
            row.task_name, date, value
        );
        row.hours.insert(date, value);
        row.dirty_cells.insert(date);
    }
}
