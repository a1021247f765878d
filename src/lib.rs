// src/lib.rs
//! Weekly timesheet register: an in-memory task-hours grid validated against
//! holiday and leave calendars and reconciled against the HR backend's
//! timesheet store.

pub mod api_client;
pub mod export;
pub mod feedback;
pub mod grid;
pub mod register;
pub mod sources;
pub mod validation;
pub mod week;

mod register_tests;

pub use feedback::{Feedback, FeedbackQueue, Severity};
pub use grid::{EditOutcome, GridState, LeaveDay, TaskRow};
pub use register::{OpPhase, WeekRegister};
pub use sources::{HolidaySource, LeaveSource, SourceError, TimesheetStore};
pub use validation::{run_validation, validate_for_save, ValidationReport};
pub use week::WeekWindow;
