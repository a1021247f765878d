// src/week.rs
use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// The 7 consecutive calendar dates (Monday through Sunday) a register
/// session operates on. Constructing a window from any date snaps to the
/// Monday of that date's ISO week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindow {
    start: NaiveDate,
}

impl WeekWindow {
    pub fn containing(date: NaiveDate) -> Self {
        let start = date - Duration::days(date.weekday().num_days_from_monday() as i64);
        Self { start }
    }

    /// Monday of the window.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Sunday of the window.
    pub fn end(&self) -> NaiveDate {
        self.start + Duration::days(6)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start;
        (0..7).map(move |offset| start + Duration::days(offset))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end()
    }

    /// Stricter membership test used when ingesting remote entries: the date
    /// must fall inside the window *and* share the window start's year and
    /// month. Backends have been observed returning entries just outside the
    /// requested boundary when their timezone handling drifts.
    pub fn admits(&self, date: NaiveDate) -> bool {
        self.contains(date)
            && date.year() == self.start.year()
            && date.month() == self.start.month()
    }

    pub fn prev(&self) -> Self {
        Self {
            start: self.start - Duration::days(7),
        }
    }

    pub fn next(&self) -> Self {
        Self {
            start: self.start + Duration::days(7),
        }
    }

    pub fn is_weekday(date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }
}
