//! Submission of appointment requests to a store.

use thiserror::Error;

use super::expander::SeriesExpander;
use super::ScheduleError;
use crate::db::{AppointmentStore, DbError};
use crate::i18n::Translator;
use crate::models::{Appointment, AppointmentDraft, AppointmentRequest};

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("Database error: {0}")]
    Store(#[from] DbError),
}

pub type SubmitResult<T> = Result<T, SubmitError>;

/// Expands requests and writes the result to an [`AppointmentStore`].
pub struct Scheduler<'a, S: AppointmentStore + ?Sized, T> {
    store: &'a S,
    expander: SeriesExpander<T>,
}

impl<'a, S: AppointmentStore + ?Sized, T: Translator> Scheduler<'a, S, T> {
    pub fn new(store: &'a S, translator: T) -> Self {
        Self {
            store,
            expander: SeriesExpander::new(translator),
        }
    }

    /// Store a request.
    ///
    /// Without a recurrence pattern one appointment is inserted. Otherwise the
    /// whole series is inserted atomically, or nothing is.
    pub fn submit(&self, request: &AppointmentRequest) -> SubmitResult<Vec<Appointment>> {
        if request.recurrence.is_none() {
            let appointment = self.store.insert_one(AppointmentDraft::single(request))?;
            return Ok(vec![appointment]);
        }

        let drafts = self.expander.expand(request)?;
        Ok(self.store.insert_many(drafts)?)
    }

    /// Like [`Scheduler::submit`], but an invalid recurrence degrades to a
    /// single appointment at the requested start instead of failing.
    pub fn submit_or_single(&self, request: &AppointmentRequest) -> SubmitResult<Vec<Appointment>> {
        match self.submit(request) {
            Err(SubmitError::Schedule(err)) => {
                tracing::warn!(
                    error = %err,
                    kind = request.kind.as_str(),
                    "Recurrence rejected, storing a single appointment"
                );
                let appointment = self.store.insert_one(AppointmentDraft::single(request))?;
                Ok(vec![appointment])
            }
            other => other,
        }
    }

    pub fn expander(&self) -> &SeriesExpander<T> {
        &self.expander
    }
}
