// src/validation.rs
use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::grid::{GridState, TaskRow, DAY_CAP, HALF_DAY_CAP, HOURS_SANITY_MAX};
use crate::week::WeekWindow;

/// Collected validation outcome. `ok` is true iff no message was recorded;
/// messages are human-readable and shown in full, never thrown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub ok: bool,
    pub messages: Vec<String>,
}

impl ValidationReport {
    fn from_messages(messages: Vec<String>) -> Self {
        Self {
            ok: messages.is_empty(),
            messages,
        }
    }
}

/// Incremental pre-save validation. Only rows that were edited or already
/// exist remotely are inspected, and within those rows only the cells that
/// were edited or have a remote identifier. Untouched days never block a
/// draft save.
pub fn validate_for_save(grid: &GridState) -> ValidationReport {
    let mut messages = Vec::new();
    let mut day_totals: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();

    for row in &grid.rows {
        if !(row.is_dirty() || row.has_remote_ids()) {
            continue;
        }
        check_task_name(&mut messages, row);
        for (&date, &hours) in &row.hours {
            if !row.cell_in_save_scope(date) {
                continue;
            }
            *day_totals.entry(date).or_insert(Decimal::ZERO) += hours;
            check_cell(grid, &mut messages, row, date, hours);
        }
    }

    for (&date, &total) in &day_totals {
        if total > DAY_CAP {
            messages.push(day_cap_message(date, total));
        }
    }

    ValidationReport::from_messages(messages)
}

/// Exhaustive full-week validation, the gate in front of submission. Every
/// row and every date of the window is checked, including days no row ever
/// touched.
pub fn run_validation(grid: &GridState) -> ValidationReport {
    let mut messages = Vec::new();
    let mut day_totals: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();

    for row in &grid.rows {
        check_task_name(&mut messages, row);
        for (&date, &hours) in &row.hours {
            *day_totals.entry(date).or_insert(Decimal::ZERO) += hours;
            check_cell(grid, &mut messages, row, date, hours);
        }
    }

    for date in grid.week.dates() {
        let total = day_totals.get(&date).copied().unwrap_or(Decimal::ZERO);
        let holiday = grid.holiday_name(date);
        let leave = grid.leave_on(date);

        if WeekWindow::is_weekday(date)
            && holiday.is_none()
            && leave.is_none()
            && total == Decimal::ZERO
        {
            messages.push(format!("{}: no hours entered for this workday", date));
        }
        if let Some(holiday_name) = holiday {
            if total > Decimal::ZERO {
                messages.push(format!(
                    "{}: {}h reported on the \"{}\" holiday",
                    date, total, holiday_name
                ));
            }
        }
        if grid.is_full_day_leave(date) && total > Decimal::ZERO {
            messages.push(format!(
                "{}: {}h reported on an approved full-day leave",
                date, total
            ));
        }
        if grid.is_half_day_leave(date) && total > HALF_DAY_CAP {
            messages.push(format!(
                "{}: {}h exceeds the {}h limit for a half-day leave",
                date, total, HALF_DAY_CAP
            ));
        }
        if total > DAY_CAP {
            messages.push(day_cap_message(date, total));
        }
    }

    ValidationReport::from_messages(messages)
}

fn check_task_name(messages: &mut Vec<String>, row: &TaskRow) {
    if row.has_positive_hours() && row.task_name.trim().is_empty() {
        messages.push(format!(
            "row {}: a task name is required when hours are reported",
            row.id
        ));
    }
}

fn check_cell(
    grid: &GridState,
    messages: &mut Vec<String>,
    row: &TaskRow,
    date: NaiveDate,
    hours: Decimal,
) {
    if hours < Decimal::ZERO || hours > HOURS_SANITY_MAX {
        messages.push(format!(
            "{}: {}h for \"{}\" is outside the allowed range",
            date, hours, row.task_name
        ));
    }
    if hours > Decimal::ZERO {
        if let Some(holiday_name) = grid.holiday_name(date) {
            messages.push(format!(
                "{}: hours reported on the \"{}\" holiday",
                date, holiday_name
            ));
        }
        if grid.is_full_day_leave(date) {
            messages.push(format!(
                "{}: hours reported on an approved full-day leave",
                date
            ));
        }
    }
}

fn day_cap_message(date: NaiveDate, total: Decimal) -> String {
    format!(
        "{}: {}h in total exceeds the {}h daily limit",
        date, total, DAY_CAP
    )
}
