//! Appointment scheduling.
//!
//! Pipeline: AppointmentRequest → SeriesExpander → AppointmentStore::insert_many
//!
//! The expander is pure. Only the [`Scheduler`] touches the store.

pub mod calendar;
mod expander;
mod scheduler;

pub use calendar::{CalendarError, CalendarResult};
pub use expander::*;
pub use scheduler::*;

use thiserror::Error;

/// Series expansion errors. Terminal for the submission; never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Invalid recurrence: {0}")]
    InvalidRecurrence(String),

    #[error("Recurrence yields no occurrences")]
    EmptySeries,

    #[error("Calendar error: {0}")]
    Calendar(#[from] CalendarError),
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
