//! Appointment database operations.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{format_timestamp, now_rfc3339, parse_timestamp, Database, DbError, DbResult};
use crate::models::{Appointment, AppointmentDraft, AppointmentStatus, Recurrence};
use crate::reminders::ReminderKind;

/// The appointment collection as seen by scheduling code.
///
/// `insert_many` is all-or-nothing: either every draft is stored or none is.
pub trait AppointmentStore {
    /// Store one draft with a fresh id and `Scheduled` status.
    fn insert_one(&self, draft: AppointmentDraft) -> DbResult<Appointment>;

    /// Store a batch of drafts atomically.
    fn insert_many(&self, drafts: Vec<AppointmentDraft>) -> DbResult<Vec<Appointment>>;

    /// Replace a stored appointment. Clears reminder bookkeeping.
    fn update(&self, appointment: &Appointment) -> DbResult<bool>;

    fn update_status(&self, id: &str, status: AppointmentStatus) -> DbResult<bool>;

    fn delete(&self, id: &str) -> DbResult<bool>;

    /// Delete several appointments; returns how many existed.
    fn delete_many(&self, ids: &[String]) -> DbResult<usize>;

    /// All appointments matching `predicate`, ordered by scheduled time.
    fn query(&self, predicate: &dyn Fn(&Appointment) -> bool) -> DbResult<Vec<Appointment>>;
}

const APPOINTMENT_COLUMNS: &str = r#"
    id, pet_id, pet_name, pet_photo_url, kind, scheduled_at, notes, status,
    recurrence, series_id, last_notified_day, last_notified_hour,
    created_at, updated_at
"#;

impl Database {
    /// Insert a new appointment from a draft.
    pub fn insert_appointment(&self, draft: AppointmentDraft) -> DbResult<Appointment> {
        let appointment = Appointment::from_draft(draft);
        insert_appointment_row(&self.conn, &appointment)?;
        tracing::debug!(id = %appointment.id, pet_id = %appointment.pet_id, "Inserted appointment");
        Ok(appointment)
    }

    /// Insert a batch of drafts in a single transaction.
    pub fn insert_appointments(&self, drafts: Vec<AppointmentDraft>) -> DbResult<Vec<Appointment>> {
        let appointments: Vec<Appointment> =
            drafts.into_iter().map(Appointment::from_draft).collect();

        let tx = self.conn.unchecked_transaction()?;
        for appointment in &appointments {
            insert_appointment_row(&tx, appointment)?;
        }
        tx.commit()?;

        tracing::info!(count = appointments.len(), "Inserted appointment batch");
        Ok(appointments)
    }

    /// Full replace of an appointment (id and created_at are kept).
    ///
    /// The schedule may have changed, so reminder markers are reset.
    pub fn update_appointment(&self, appointment: &Appointment) -> DbResult<bool> {
        let recurrence_json = serde_json::to_string(&appointment.recurrence)?;

        let rows_affected = self.conn.execute(
            r#"
            UPDATE appointments SET
                pet_id = ?2,
                pet_name = ?3,
                pet_photo_url = ?4,
                kind = ?5,
                scheduled_at = ?6,
                notes = ?7,
                status = ?8,
                recurrence = ?9,
                series_id = ?10,
                last_notified_day = NULL,
                last_notified_hour = NULL,
                updated_at = ?11
            WHERE id = ?1
            "#,
            params![
                appointment.id,
                appointment.pet_id,
                appointment.pet_name,
                appointment.pet_photo_url,
                appointment.kind.as_str(),
                format_timestamp(&appointment.scheduled_at),
                appointment.notes,
                appointment.status.as_str(),
                recurrence_json,
                appointment.series_id,
                now_rfc3339(),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Transition an appointment's status.
    pub fn update_appointment_status(&self, id: &str, status: AppointmentStatus) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE appointments SET status = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, status.as_str(), now_rfc3339()],
        )?;
        if rows_affected > 0 {
            tracing::debug!(%id, status = status.as_str(), "Appointment status changed");
        }
        Ok(rows_affected > 0)
    }

    /// Record that a reminder was delivered.
    pub fn mark_reminder_sent(&self, id: &str, kind: ReminderKind) -> DbResult<bool> {
        let sql = match kind {
            ReminderKind::DayBefore => {
                "UPDATE appointments SET last_notified_day = ?2 WHERE id = ?1"
            }
            ReminderKind::HourBefore => {
                "UPDATE appointments SET last_notified_hour = ?2 WHERE id = ?1"
            }
        };
        let rows_affected = self.conn.execute(sql, params![id, now_rfc3339()])?;
        Ok(rows_affected > 0)
    }

    /// Get an appointment by ID.
    pub fn get_appointment(&self, id: &str) -> DbResult<Option<Appointment>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM appointments WHERE id = ?", APPOINTMENT_COLUMNS),
                [id],
                AppointmentRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List all appointments, earliest first.
    pub fn list_appointments(&self) -> DbResult<Vec<Appointment>> {
        self.select_appointments("1 = 1 ORDER BY scheduled_at ASC", &[])
    }

    /// List all appointments of a pet, earliest first.
    pub fn list_appointments_for_pet(&self, pet_id: &str) -> DbResult<Vec<Appointment>> {
        self.select_appointments("pet_id = ?1 ORDER BY scheduled_at ASC", &[pet_id])
    }

    /// Scheduled appointments, earliest first, optionally for one pet.
    pub fn list_upcoming_appointments(&self, pet_id: Option<&str>) -> DbResult<Vec<Appointment>> {
        match pet_id {
            Some(pet_id) => self.select_appointments(
                "status = 'Scheduled' AND pet_id = ?1 ORDER BY scheduled_at ASC",
                &[pet_id],
            ),
            None => self.select_appointments("status = 'Scheduled' ORDER BY scheduled_at ASC", &[]),
        }
    }

    /// Completed and missed appointments, most recent first, optionally for one pet.
    pub fn list_appointment_history(&self, pet_id: Option<&str>) -> DbResult<Vec<Appointment>> {
        match pet_id {
            Some(pet_id) => self.select_appointments(
                "status != 'Scheduled' AND pet_id = ?1 ORDER BY scheduled_at DESC",
                &[pet_id],
            ),
            None => {
                self.select_appointments("status != 'Scheduled' ORDER BY scheduled_at DESC", &[])
            }
        }
    }

    /// All occurrences of a generated series, earliest first.
    pub fn list_series(&self, series_id: &str) -> DbResult<Vec<Appointment>> {
        self.select_appointments("series_id = ?1 ORDER BY scheduled_at ASC", &[series_id])
    }

    /// Delete an appointment.
    pub fn delete_appointment(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM appointments WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    /// Delete several appointments in one transaction.
    pub fn delete_appointments(&self, ids: &[String]) -> DbResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut deleted = 0;
        {
            let mut stmt = tx.prepare("DELETE FROM appointments WHERE id = ?")?;
            for id in ids {
                deleted += stmt.execute([id])?;
            }
        }
        tx.commit()?;
        tracing::info!(requested = ids.len(), deleted, "Deleted appointments");
        Ok(deleted)
    }

    /// Delete every occurrence of a series.
    pub fn delete_series(&self, series_id: &str) -> DbResult<usize> {
        let deleted = self
            .conn
            .execute("DELETE FROM appointments WHERE series_id = ?", [series_id])?;
        tracing::info!(%series_id, deleted, "Deleted appointment series");
        Ok(deleted)
    }

    fn select_appointments(&self, clause: &str, args: &[&str]) -> DbResult<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM appointments WHERE {}",
            APPOINTMENT_COLUMNS, clause
        ))?;
        let rows = stmt.query_map(rusqlite::params_from_iter(args.iter()), AppointmentRow::from_row)?;

        let mut appointments = Vec::new();
        for row in rows {
            appointments.push(row?.try_into()?);
        }
        Ok(appointments)
    }
}

impl AppointmentStore for Database {
    fn insert_one(&self, draft: AppointmentDraft) -> DbResult<Appointment> {
        self.insert_appointment(draft)
    }

    fn insert_many(&self, drafts: Vec<AppointmentDraft>) -> DbResult<Vec<Appointment>> {
        self.insert_appointments(drafts)
    }

    fn update(&self, appointment: &Appointment) -> DbResult<bool> {
        self.update_appointment(appointment)
    }

    fn update_status(&self, id: &str, status: AppointmentStatus) -> DbResult<bool> {
        self.update_appointment_status(id, status)
    }

    fn delete(&self, id: &str) -> DbResult<bool> {
        self.delete_appointment(id)
    }

    fn delete_many(&self, ids: &[String]) -> DbResult<usize> {
        self.delete_appointments(ids)
    }

    fn query(&self, predicate: &dyn Fn(&Appointment) -> bool) -> DbResult<Vec<Appointment>> {
        Ok(self
            .list_appointments()?
            .into_iter()
            .filter(|a| predicate(a))
            .collect())
    }
}

pub(crate) fn insert_appointment_row(conn: &Connection, appointment: &Appointment) -> DbResult<()> {
    let recurrence_json = serde_json::to_string(&appointment.recurrence)?;

    conn.execute(
        r#"
        INSERT INTO appointments (
            id, pet_id, pet_name, pet_photo_url, kind, scheduled_at, notes, status,
            recurrence, series_id, last_notified_day, last_notified_hour,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
        "#,
        params![
            appointment.id,
            appointment.pet_id,
            appointment.pet_name,
            appointment.pet_photo_url,
            appointment.kind.as_str(),
            format_timestamp(&appointment.scheduled_at),
            appointment.notes,
            appointment.status.as_str(),
            recurrence_json,
            appointment.series_id,
            appointment.last_notified_day,
            appointment.last_notified_hour,
            appointment.created_at,
            appointment.updated_at,
        ],
    )?;
    Ok(())
}

/// Intermediate row struct for database mapping.
struct AppointmentRow {
    id: String,
    pet_id: String,
    pet_name: String,
    pet_photo_url: String,
    kind: String,
    scheduled_at: String,
    notes: String,
    status: String,
    recurrence: String,
    series_id: Option<String>,
    last_notified_day: Option<String>,
    last_notified_hour: Option<String>,
    created_at: String,
    updated_at: String,
}

impl AppointmentRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            pet_id: row.get(1)?,
            pet_name: row.get(2)?,
            pet_photo_url: row.get(3)?,
            kind: row.get(4)?,
            scheduled_at: row.get(5)?,
            notes: row.get(6)?,
            status: row.get(7)?,
            recurrence: row.get(8)?,
            series_id: row.get(9)?,
            last_notified_day: row.get(10)?,
            last_notified_hour: row.get(11)?,
            created_at: row.get(12)?,
            updated_at: row.get(13)?,
        })
    }
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = DbError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        let recurrence: Recurrence = serde_json::from_str(&row.recurrence)?;

        Ok(Appointment {
            id: row.id,
            pet_id: row.pet_id,
            pet_name: row.pet_name,
            pet_photo_url: row.pet_photo_url,
            kind: row.kind.parse()?,
            scheduled_at: parse_timestamp(&row.scheduled_at)?,
            notes: row.notes,
            status: row.status.parse()?,
            recurrence,
            series_id: row.series_id,
            last_notified_day: row.last_notified_day,
            last_notified_hour: row.last_notified_hour,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
