//! VetConnect Core Library
//!
//! Local-first pet care records with recurring treatment scheduling.
//!
//! # Architecture
//!
//! ```text
//!          Appointment form (mobile shell)
//!                       │
//!               AppointmentRequest
//!                       │
//!        ┌──────────────▼──────────────┐
//!        │       SeriesExpander        │
//!        │  medication: every N hours  │
//!        │  baths: K per week, W weeks │
//!        │  "(Last dose)" marker       │
//!        └──────────────┬──────────────┘
//!                       │ Vec<AppointmentDraft>
//!                       ▼
//!         AppointmentStore::insert_many (atomic)
//!                       │
//!         ┌─────────────┼──────────────┐
//!         │             │              │
//!         ▼             ▼              ▼
//!     Reminders     Snapshot      Medical record
//!   (24h / 1h)    (JSON export)  (files, weight, notes)
//! ```
//!
//! # Modules
//!
//! - [`schedule`]: Calendar arithmetic, series expansion and submission
//! - [`db`]: SQLite persistence, including the [`db::AppointmentStore`] seam
//! - [`models`]: Domain types (Pet, Appointment, MedicalRecord, etc.)
//! - [`reminders`]: Day-before and hour-before alerts
//! - [`i18n`]: Marker and reminder phrases (en, pt)
//! - [`config`]: Runtime configuration
//! - [`logging`]: `tracing` subscriber setup

pub mod config;
pub mod db;
pub mod i18n;
pub mod logging;
pub mod models;
pub mod reminders;
pub mod schedule;

// Re-export commonly used types
pub use config::{CoreConfig, ReminderConfig};
pub use db::{AppointmentStore, Database, Snapshot};
pub use i18n::{Catalog, Language, Translator};
pub use models::{
    Appointment, AppointmentDraft, AppointmentRequest, AppointmentStatus, AppointmentType,
    BathFrequency, DurationUnit, MedicalRecord, MedicationFrequency, Pet, PetRef, Recurrence,
    SeriesDuration,
};
pub use reminders::{due_alerts, ReminderAlert, ReminderKind};
pub use schedule::{expand_series, ScheduleError, Scheduler, SeriesExpander, SubmitError};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;
use models::{
    Behavior, FileKind, Gender, MedicalFile, MedicalRecordCategory, OwnerInfo, Species, VetNote,
    WeightEntry,
};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum VetConnectError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid recurrence: {0}")]
    InvalidRecurrence(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Config error: {0}")]
    ConfigError(String),
}

impl From<db::DbError> for VetConnectError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => VetConnectError::NotFound(what),
            db::DbError::Json(e) => VetConnectError::SerializationError(e.to_string()),
            other => VetConnectError::DatabaseError(other.to_string()),
        }
    }
}

impl From<ScheduleError> for VetConnectError {
    fn from(e: ScheduleError) -> Self {
        VetConnectError::InvalidRecurrence(e.to_string())
    }
}

impl From<SubmitError> for VetConnectError {
    fn from(e: SubmitError) -> Self {
        match e {
            SubmitError::Schedule(e) => e.into(),
            SubmitError::Store(e) => e.into(),
        }
    }
}

impl From<models::ParseEnumError> for VetConnectError {
    fn from(e: models::ParseEnumError) -> Self {
        VetConnectError::InvalidInput(e.to_string())
    }
}

impl From<config::ConfigError> for VetConnectError {
    fn from(e: config::ConfigError) -> Self {
        VetConnectError::ConfigError(e.to_string())
    }
}

impl From<serde_json::Error> for VetConnectError {
    fn from(e: serde_json::Error) -> Self {
        VetConnectError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for VetConnectError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        VetConnectError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
///
/// `config_json` is a [`CoreConfig`] document; `None` uses the defaults.
#[uniffi::export]
pub fn open_database(
    path: String,
    config_json: Option<String>,
) -> Result<Arc<VetConnectCore>, VetConnectError> {
    let config = match config_json {
        Some(json) => CoreConfig::from_json_str(&json)?,
        None => CoreConfig::default(),
    };
    logging::init_logging(Some(&config.log_filter));
    let db = Database::open(&path)?;
    Ok(Arc::new(VetConnectCore::new(db, config)))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<VetConnectCore>, VetConnectError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(VetConnectCore::new(db, CoreConfig::default())))
}

/// Install the log subscriber. Returns false if one was already installed.
#[uniffi::export]
pub fn setup_logging(filter: Option<String>) -> bool {
    logging::init_logging(filter.as_deref())
}

/// Wire strings of every appointment type, in form order.
#[uniffi::export]
pub fn appointment_types() -> Vec<String> {
    AppointmentType::ALL
        .iter()
        .map(|t| t.as_str().to_string())
        .collect()
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct VetConnectCore {
    db: Arc<Mutex<Database>>,
    config: Mutex<CoreConfig>,
}

impl VetConnectCore {
    fn new(db: Database, config: CoreConfig) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            config: Mutex::new(config),
        }
    }

    fn catalog(&self) -> Result<Catalog, VetConnectError> {
        Ok(Catalog::new(self.config.lock()?.language))
    }

    fn build_request(
        &self,
        db: &Database,
        request: FfiAppointmentRequest,
    ) -> Result<AppointmentRequest, VetConnectError> {
        let pet = db
            .get_pet(&request.pet_id)?
            .ok_or_else(|| VetConnectError::NotFound(format!("pet {}", request.pet_id)))?;
        Ok(AppointmentRequest {
            pet: pet.pet_ref(),
            kind: request.kind.parse()?,
            start: parse_local(&request.start)?,
            notes: request.notes,
            recurrence: request.recurrence.try_into()?,
        })
    }
}

#[uniffi::export]
impl VetConnectCore {
    // =========================================================================
    // Settings
    // =========================================================================

    /// Active language code ("en" or "pt").
    pub fn language(&self) -> Result<String, VetConnectError> {
        let config = self.config.lock()?;
        Ok(match config.language {
            Language::En => "en".into(),
            Language::Pt => "pt".into(),
        })
    }

    pub fn set_language(&self, code: String) -> Result<(), VetConnectError> {
        let language = Language::from_code(&code)
            .ok_or_else(|| VetConnectError::InvalidInput(format!("unsupported language: {}", code)))?;
        self.config.lock()?.language = language;
        Ok(())
    }

    /// Localized label for an appointment type wire string.
    pub fn appointment_type_label(&self, kind: String) -> Result<String, VetConnectError> {
        let kind: AppointmentType = kind.parse()?;
        Ok(reminders::type_label(&self.catalog()?, kind))
    }

    // =========================================================================
    // Pet Operations
    // =========================================================================

    /// Register a new pet with an empty medical record.
    pub fn create_pet(
        &self,
        name: String,
        species: String,
        gender: String,
    ) -> Result<FfiPet, VetConnectError> {
        let db = self.db.lock()?;
        let pet = Pet::new(name, species.parse()?, gender.parse()?);
        db.insert_pet(&pet)?;
        Ok(pet.into())
    }

    pub fn get_pet(&self, id: String) -> Result<Option<FfiPet>, VetConnectError> {
        let db = self.db.lock()?;
        Ok(db.get_pet(&id)?.map(|p| p.into()))
    }

    pub fn list_pets(&self) -> Result<Vec<FfiPet>, VetConnectError> {
        let db = self.db.lock()?;
        Ok(db.list_pets()?.into_iter().map(|p| p.into()).collect())
    }

    /// Search pets by name prefix.
    pub fn search_pets(&self, query: String, limit: u32) -> Result<Vec<FfiPet>, VetConnectError> {
        let db = self.db.lock()?;
        let pets = db.search_pets(&query, limit as usize)?;
        Ok(pets.into_iter().map(|p| p.into()).collect())
    }

    pub fn update_pet(&self, pet: FfiPet) -> Result<bool, VetConnectError> {
        let db = self.db.lock()?;
        let pet: Pet = pet.try_into()?;
        Ok(db.update_pet(&pet)?)
    }

    /// Delete a pet together with its appointments and medical record.
    pub fn delete_pet(&self, id: String) -> Result<bool, VetConnectError> {
        let db = self.db.lock()?;
        Ok(db.delete_pet(&id)?)
    }

    // =========================================================================
    // Appointment Operations
    // =========================================================================

    /// Store a request, expanding recurring treatments into a series.
    ///
    /// Fails without storing anything if the recurrence is invalid.
    pub fn schedule_appointment(
        &self,
        request: FfiAppointmentRequest,
    ) -> Result<Vec<FfiAppointment>, VetConnectError> {
        let db = self.db.lock()?;
        let request = self.build_request(&db, request)?;
        let scheduler = Scheduler::new(&*db, self.catalog()?);
        let stored = scheduler.submit(&request)?;
        Ok(stored.into_iter().map(|a| a.into()).collect())
    }

    /// Like `schedule_appointment`, but an invalid recurrence stores a
    /// single appointment at the requested start instead.
    pub fn schedule_appointment_or_single(
        &self,
        request: FfiAppointmentRequest,
    ) -> Result<Vec<FfiAppointment>, VetConnectError> {
        let db = self.db.lock()?;
        let request = self.build_request(&db, request)?;
        let scheduler = Scheduler::new(&*db, self.catalog()?);
        let stored = scheduler.submit_or_single(&request)?;
        Ok(stored.into_iter().map(|a| a.into()).collect())
    }

    pub fn get_appointment(&self, id: String) -> Result<Option<FfiAppointment>, VetConnectError> {
        let db = self.db.lock()?;
        Ok(db.get_appointment(&id)?.map(|a| a.into()))
    }

    pub fn list_appointments(&self) -> Result<Vec<FfiAppointment>, VetConnectError> {
        let db = self.db.lock()?;
        Ok(db.list_appointments()?.into_iter().map(|a| a.into()).collect())
    }

    /// Scheduled appointments, earliest first.
    pub fn list_upcoming_appointments(
        &self,
        pet_id: Option<String>,
    ) -> Result<Vec<FfiAppointment>, VetConnectError> {
        let db = self.db.lock()?;
        let appointments = db.list_upcoming_appointments(pet_id.as_deref())?;
        Ok(appointments.into_iter().map(|a| a.into()).collect())
    }

    /// Completed and missed appointments, most recent first.
    pub fn list_appointment_history(
        &self,
        pet_id: Option<String>,
    ) -> Result<Vec<FfiAppointment>, VetConnectError> {
        let db = self.db.lock()?;
        let appointments = db.list_appointment_history(pet_id.as_deref())?;
        Ok(appointments.into_iter().map(|a| a.into()).collect())
    }

    pub fn list_series(&self, series_id: String) -> Result<Vec<FfiAppointment>, VetConnectError> {
        let db = self.db.lock()?;
        Ok(db.list_series(&series_id)?.into_iter().map(|a| a.into()).collect())
    }

    /// Replace an appointment. Reminder bookkeeping is reset.
    pub fn update_appointment(&self, appointment: FfiAppointment) -> Result<bool, VetConnectError> {
        let db = self.db.lock()?;
        let appointment: Appointment = appointment.try_into()?;
        Ok(db.update_appointment(&appointment)?)
    }

    pub fn set_appointment_status(
        &self,
        id: String,
        status: String,
    ) -> Result<bool, VetConnectError> {
        let db = self.db.lock()?;
        Ok(db.update_appointment_status(&id, status.parse()?)?)
    }

    pub fn delete_appointment(&self, id: String) -> Result<bool, VetConnectError> {
        let db = self.db.lock()?;
        Ok(db.delete_appointment(&id)?)
    }

    /// Delete several appointments; returns how many existed.
    pub fn delete_appointments(&self, ids: Vec<String>) -> Result<u32, VetConnectError> {
        let db = self.db.lock()?;
        Ok(db.delete_appointments(&ids)? as u32)
    }

    /// Delete every occurrence of a series.
    pub fn delete_series(&self, series_id: String) -> Result<u32, VetConnectError> {
        let db = self.db.lock()?;
        Ok(db.delete_series(&series_id)? as u32)
    }

    // =========================================================================
    // Reminder Operations
    // =========================================================================

    /// Alerts due at `now` (local wall-clock), with their spoken text.
    ///
    /// `dismissed` holds appointment ids the user silenced this session.
    pub fn due_reminders(
        &self,
        now: String,
        dismissed: Vec<String>,
    ) -> Result<Vec<FfiReminderAlert>, VetConnectError> {
        let now = parse_local(&now)?;
        let (catalog, reminder_config) = {
            let config = self.config.lock()?;
            (Catalog::new(config.language), config.reminders)
        };
        let db = self.db.lock()?;

        let appointments = db.list_upcoming_appointments(None)?;
        let dismissed: HashSet<String> = dismissed.into_iter().collect();
        let alerts = due_alerts(&appointments, now, &dismissed, &reminder_config);

        let by_id: HashMap<&str, &Appointment> =
            appointments.iter().map(|a| (a.id.as_str(), a)).collect();
        Ok(alerts
            .into_iter()
            .filter_map(|alert| {
                let appointment = by_id.get(alert.appointment_id.as_str())?;
                let message = alert.message(&catalog, appointment);
                Some(FfiReminderAlert::new(alert, message))
            })
            .collect())
    }

    /// Record that a reminder was delivered. `kind` is "24h" or "1h".
    pub fn mark_reminder_sent(
        &self,
        appointment_id: String,
        kind: String,
    ) -> Result<bool, VetConnectError> {
        let kind = parse_reminder_kind(&kind)?;
        let db = self.db.lock()?;
        Ok(db.mark_reminder_sent(&appointment_id, kind)?)
    }

    // =========================================================================
    // Medical Record Operations
    // =========================================================================

    pub fn get_medical_record(
        &self,
        pet_id: String,
    ) -> Result<Option<FfiMedicalRecord>, VetConnectError> {
        let db = self.db.lock()?;
        Ok(db.get_medical_record(&pet_id)?.map(|r| r.into()))
    }

    /// Attach a file to one of the pet's categories.
    pub fn add_medical_file(
        &self,
        pet_id: String,
        category: String,
        name: String,
        url: String,
        mime_type: String,
    ) -> Result<FfiMedicalFile, VetConnectError> {
        let db = self.db.lock()?;
        let file = MedicalFile::new(name, url, mime_type);
        db.add_medical_file(&pet_id, &category, &file)?;
        Ok(file.into())
    }

    pub fn rename_medical_file(&self, id: String, name: String) -> Result<bool, VetConnectError> {
        let db = self.db.lock()?;
        Ok(db.rename_medical_file(&id, &name)?)
    }

    pub fn update_medical_file_note(
        &self,
        id: String,
        note: Option<String>,
    ) -> Result<bool, VetConnectError> {
        let db = self.db.lock()?;
        Ok(db.update_medical_file_note(&id, note.as_deref())?)
    }

    pub fn delete_medical_file(&self, id: String) -> Result<bool, VetConnectError> {
        let db = self.db.lock()?;
        Ok(db.delete_medical_file(&id)?)
    }

    /// Reorder categories; `titles` must list each existing category once.
    pub fn update_category_order(
        &self,
        pet_id: String,
        titles: Vec<String>,
    ) -> Result<(), VetConnectError> {
        let db = self.db.lock()?;
        db.update_category_order(&pet_id, &titles)?;
        Ok(())
    }

    pub fn add_weight_entry(
        &self,
        pet_id: String,
        date: String,
        weight: f64,
        unit: String,
    ) -> Result<FfiWeightEntry, VetConnectError> {
        let db = self.db.lock()?;
        let entry = WeightEntry::new(date, weight, unit.parse()?);
        db.add_weight_entry(&pet_id, &entry)?;
        Ok(entry.into())
    }

    pub fn update_weight_entry(&self, entry: FfiWeightEntry) -> Result<bool, VetConnectError> {
        let db = self.db.lock()?;
        let entry: WeightEntry = entry.try_into()?;
        Ok(db.update_weight_entry(&entry)?)
    }

    pub fn delete_weight_entry(&self, id: String) -> Result<bool, VetConnectError> {
        let db = self.db.lock()?;
        Ok(db.delete_weight_entry(&id)?)
    }

    pub fn add_vet_note(
        &self,
        pet_id: String,
        title: String,
        content: String,
    ) -> Result<FfiVetNote, VetConnectError> {
        let db = self.db.lock()?;
        let note = VetNote::new(title, content);
        db.add_vet_note(&pet_id, &note)?;
        Ok(note.into())
    }

    pub fn update_vet_note(
        &self,
        id: String,
        title: Option<String>,
        content: Option<String>,
    ) -> Result<bool, VetConnectError> {
        let db = self.db.lock()?;
        Ok(db.update_vet_note(&id, title.as_deref(), content.as_deref())?)
    }

    pub fn delete_vet_note(&self, id: String) -> Result<bool, VetConnectError> {
        let db = self.db.lock()?;
        Ok(db.delete_vet_note(&id)?)
    }

    // =========================================================================
    // Snapshot Operations
    // =========================================================================

    /// Export the whole store as JSON.
    pub fn export_snapshot_json(&self) -> Result<String, VetConnectError> {
        let db = self.db.lock()?;
        Ok(db.save_snapshot()?.to_json()?)
    }

    /// Replace the whole store with a JSON snapshot.
    pub fn import_snapshot_json(&self, json: String) -> Result<(), VetConnectError> {
        let snapshot = Snapshot::from_json(&json)?;
        let db = self.db.lock()?;
        db.load_snapshot(&snapshot)?;
        Ok(())
    }
}

// =========================================================================
// Conversion Helpers
// =========================================================================

/// Parse a local wall-clock timestamp (`YYYY-MM-DDTHH:MM[:SS]`).
fn parse_local(s: &str) -> Result<NaiveDateTime, VetConnectError> {
    NaiveDateTime::parse_from_str(s, db::TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .map_err(|_| VetConnectError::InvalidInput(format!("invalid date/time: {}", s)))
}

fn format_local(ts: &NaiveDateTime) -> String {
    ts.format(db::TIMESTAMP_FORMAT).to_string()
}

fn parse_reminder_kind(s: &str) -> Result<ReminderKind, VetConnectError> {
    match s {
        "24h" => Ok(ReminderKind::DayBefore),
        "1h" => Ok(ReminderKind::HourBefore),
        _ => Err(VetConnectError::InvalidInput(format!(
            "unknown reminder kind: {}",
            s
        ))),
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe owner or foster contact.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiOwner {
    pub name: String,
    pub address: String,
    pub nif: String,
    pub phone: String,
    pub email: String,
}

impl From<OwnerInfo> for FfiOwner {
    fn from(owner: OwnerInfo) -> Self {
        Self {
            name: owner.name,
            address: owner.address,
            nif: owner.nif,
            phone: owner.phone,
            email: owner.email,
        }
    }
}

impl From<FfiOwner> for OwnerInfo {
    fn from(owner: FfiOwner) -> Self {
        OwnerInfo {
            name: owner.name,
            address: owner.address,
            nif: owner.nif,
            phone: owner.phone,
            email: owner.email,
        }
    }
}

/// FFI-safe pet.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPet {
    pub id: String,
    pub microchip: String,
    pub name: String,
    pub species: String,
    pub breed: String,
    pub gender: String,
    pub color: String,
    pub is_sterilized: bool,
    pub behavior_with_animals: String,
    pub behavior_with_people: String,
    pub photo_url: String,
    pub birth_date: Option<String>,
    pub owner: Option<FfiOwner>,
    pub foster: Option<FfiOwner>,
    pub is_fat: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Pet> for FfiPet {
    fn from(pet: Pet) -> Self {
        Self {
            id: pet.id,
            microchip: pet.microchip,
            name: pet.name,
            species: pet.species.as_str().into(),
            breed: pet.breed,
            gender: pet.gender.as_str().into(),
            color: pet.color,
            is_sterilized: pet.is_sterilized,
            behavior_with_animals: pet.behavior_with_animals.as_str().into(),
            behavior_with_people: pet.behavior_with_people.as_str().into(),
            photo_url: pet.photo_url,
            birth_date: pet.birth_date,
            owner: pet.owner.map(|o| o.into()),
            foster: pet.foster.map(|o| o.into()),
            is_fat: pet.is_fat,
            created_at: pet.created_at,
            updated_at: pet.updated_at,
        }
    }
}

impl TryFrom<FfiPet> for Pet {
    type Error = VetConnectError;

    fn try_from(pet: FfiPet) -> Result<Self, Self::Error> {
        Ok(Pet {
            id: pet.id,
            microchip: pet.microchip,
            name: pet.name,
            species: pet.species.parse::<Species>()?,
            breed: pet.breed,
            gender: pet.gender.parse::<Gender>()?,
            color: pet.color,
            is_sterilized: pet.is_sterilized,
            behavior_with_animals: pet.behavior_with_animals.parse::<Behavior>()?,
            behavior_with_people: pet.behavior_with_people.parse::<Behavior>()?,
            photo_url: pet.photo_url,
            birth_date: pet.birth_date,
            owner: pet.owner.map(|o| o.into()),
            foster: pet.foster.map(|o| o.into()),
            is_fat: pet.is_fat,
            created_at: pet.created_at,
            updated_at: pet.updated_at,
        })
    }
}

/// FFI-safe series duration. `unit` is "days", "weeks" or "months".
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSeriesDuration {
    pub value: i64,
    pub unit: String,
}

/// FFI-safe recurrence pattern.
#[derive(Debug, Clone, uniffi::Enum)]
pub enum FfiRecurrence {
    Once,
    Medication {
        frequency_hours: u32,
        duration: Option<FfiSeriesDuration>,
    },
    Bath {
        times_per_week: u32,
        duration: Option<FfiSeriesDuration>,
        weekdays: Vec<String>,
    },
}

impl From<Recurrence> for FfiRecurrence {
    fn from(recurrence: Recurrence) -> Self {
        let duration = |d: Option<SeriesDuration>| {
            d.map(|d| FfiSeriesDuration {
                value: d.value,
                unit: d.unit.as_str().into(),
            })
        };
        match recurrence {
            Recurrence::None => FfiRecurrence::Once,
            Recurrence::Medication {
                frequency,
                duration: d,
            } => FfiRecurrence::Medication {
                frequency_hours: frequency.hours(),
                duration: duration(d),
            },
            Recurrence::Bath {
                frequency,
                duration: d,
                weekdays,
            } => FfiRecurrence::Bath {
                times_per_week: frequency.per_week(),
                duration: duration(d),
                weekdays,
            },
        }
    }
}

impl TryFrom<FfiRecurrence> for Recurrence {
    type Error = VetConnectError;

    fn try_from(recurrence: FfiRecurrence) -> Result<Self, Self::Error> {
        fn duration(d: Option<FfiSeriesDuration>) -> Result<Option<SeriesDuration>, VetConnectError> {
            match d {
                Some(d) => Ok(Some(SeriesDuration::new(d.value, d.unit.parse::<DurationUnit>()?))),
                None => Ok(None),
            }
        }

        match recurrence {
            FfiRecurrence::Once => Ok(Recurrence::None),
            FfiRecurrence::Medication {
                frequency_hours,
                duration: d,
            } => Ok(Recurrence::Medication {
                frequency: MedicationFrequency::from_hours(frequency_hours).ok_or_else(|| {
                    VetConnectError::InvalidInput(format!(
                        "unsupported medication frequency: every {} hours",
                        frequency_hours
                    ))
                })?,
                duration: duration(d)?,
            }),
            FfiRecurrence::Bath {
                times_per_week,
                duration: d,
                weekdays,
            } => Ok(Recurrence::Bath {
                frequency: BathFrequency::from_per_week(times_per_week).ok_or_else(|| {
                    VetConnectError::InvalidInput(format!(
                        "unsupported bath frequency: {} per week",
                        times_per_week
                    ))
                })?,
                duration: duration(d)?,
                weekdays,
            }),
        }
    }
}

/// FFI-safe appointment request. `start` is local wall-clock time.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAppointmentRequest {
    pub pet_id: String,
    pub kind: String,
    pub start: String,
    pub notes: String,
    pub recurrence: FfiRecurrence,
}

/// FFI-safe appointment.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAppointment {
    pub id: String,
    pub pet_id: String,
    pub pet_name: String,
    pub pet_photo_url: String,
    pub kind: String,
    pub scheduled_at: String,
    pub notes: String,
    pub status: String,
    pub recurrence: FfiRecurrence,
    pub series_id: Option<String>,
    pub last_notified_day: Option<String>,
    pub last_notified_hour: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Appointment> for FfiAppointment {
    fn from(appointment: Appointment) -> Self {
        Self {
            scheduled_at: format_local(&appointment.scheduled_at),
            id: appointment.id,
            pet_id: appointment.pet_id,
            pet_name: appointment.pet_name,
            pet_photo_url: appointment.pet_photo_url,
            kind: appointment.kind.as_str().into(),
            notes: appointment.notes,
            status: appointment.status.as_str().into(),
            recurrence: appointment.recurrence.into(),
            series_id: appointment.series_id,
            last_notified_day: appointment.last_notified_day,
            last_notified_hour: appointment.last_notified_hour,
            created_at: appointment.created_at,
            updated_at: appointment.updated_at,
        }
    }
}

impl TryFrom<FfiAppointment> for Appointment {
    type Error = VetConnectError;

    fn try_from(appointment: FfiAppointment) -> Result<Self, Self::Error> {
        Ok(Appointment {
            scheduled_at: parse_local(&appointment.scheduled_at)?,
            kind: appointment.kind.parse()?,
            status: appointment.status.parse()?,
            recurrence: appointment.recurrence.try_into()?,
            id: appointment.id,
            pet_id: appointment.pet_id,
            pet_name: appointment.pet_name,
            pet_photo_url: appointment.pet_photo_url,
            notes: appointment.notes,
            series_id: appointment.series_id,
            last_notified_day: appointment.last_notified_day,
            last_notified_hour: appointment.last_notified_hour,
            created_at: appointment.created_at,
            updated_at: appointment.updated_at,
        })
    }
}

/// FFI-safe reminder alert. `kind` is "24h" or "1h".
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReminderAlert {
    pub id: String,
    pub appointment_id: String,
    pub kind: String,
    pub trigger_at: String,
    pub message: String,
}

impl FfiReminderAlert {
    fn new(alert: ReminderAlert, message: String) -> Self {
        Self {
            id: alert.id,
            appointment_id: alert.appointment_id,
            kind: alert.kind.suffix().into(),
            trigger_at: format_local(&alert.trigger_at),
            message,
        }
    }
}

/// FFI-safe medical file.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicalFile {
    pub id: String,
    pub name: String,
    pub url: String,
    pub kind: String,
    pub mime_type: String,
    pub created_at: String,
    pub note: Option<String>,
}

impl From<MedicalFile> for FfiMedicalFile {
    fn from(file: MedicalFile) -> Self {
        Self {
            id: file.id,
            name: file.name,
            url: file.url,
            kind: file.kind.as_str().into(),
            mime_type: file.mime_type,
            created_at: file.created_at,
            note: file.note,
        }
    }
}

/// FFI-safe medical record category.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicalCategory {
    pub title: String,
    pub files: Vec<FfiMedicalFile>,
}

impl From<MedicalRecordCategory> for FfiMedicalCategory {
    fn from(category: MedicalRecordCategory) -> Self {
        Self {
            title: category.title,
            files: category.files.into_iter().map(|f| f.into()).collect(),
        }
    }
}

/// FFI-safe weight entry. `unit` is "kg", "lb" or "g".
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiWeightEntry {
    pub id: String,
    pub date: String,
    pub weight: f64,
    pub unit: String,
    pub weight_kg: f64,
}

impl From<WeightEntry> for FfiWeightEntry {
    fn from(entry: WeightEntry) -> Self {
        Self {
            weight_kg: entry.in_kg(),
            id: entry.id,
            date: entry.date,
            weight: entry.weight,
            unit: entry.unit.as_str().into(),
        }
    }
}

impl TryFrom<FfiWeightEntry> for WeightEntry {
    type Error = VetConnectError;

    fn try_from(entry: FfiWeightEntry) -> Result<Self, Self::Error> {
        Ok(WeightEntry {
            id: entry.id,
            date: entry.date,
            weight: entry.weight,
            unit: entry.unit.parse()?,
        })
    }
}

/// FFI-safe vet note.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiVetNote {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: String,
}

impl From<VetNote> for FfiVetNote {
    fn from(note: VetNote) -> Self {
        Self {
            id: note.id,
            title: note.title,
            content: note.content,
            created_at: note.created_at,
        }
    }
}

/// FFI-safe medical record.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicalRecord {
    pub pet_id: String,
    pub categories: Vec<FfiMedicalCategory>,
    pub weight_history: Vec<FfiWeightEntry>,
    pub vet_history: Vec<FfiVetNote>,
    pub latest_weight_kg: Option<f64>,
}

impl From<MedicalRecord> for FfiMedicalRecord {
    fn from(record: MedicalRecord) -> Self {
        Self {
            latest_weight_kg: record.latest_weight_kg(),
            pet_id: record.pet_id,
            categories: record.categories.into_iter().map(|c| c.into()).collect(),
            weight_history: record.weight_history.into_iter().map(|w| w.into()).collect(),
            vet_history: record.vet_history.into_iter().map(|n| n.into()).collect(),
        }
    }
}

/// Kind of a medical file guessed from its MIME type.
#[uniffi::export]
pub fn file_kind_for_mime(mime_type: String) -> String {
    FileKind::from_mime(&mime_type).as_str().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core_with_pet() -> (Arc<VetConnectCore>, FfiPet) {
        let core = open_database_in_memory().unwrap();
        let pet = core
            .create_pet("Rex".into(), "Canine".into(), "Male".into())
            .unwrap();
        (core, pet)
    }

    fn medication_request(pet_id: &str) -> FfiAppointmentRequest {
        FfiAppointmentRequest {
            pet_id: pet_id.into(),
            kind: "Treatment/Medication".into(),
            start: "2024-01-01T08:00".into(),
            notes: String::new(),
            recurrence: FfiRecurrence::Medication {
                frequency_hours: 8,
                duration: Some(FfiSeriesDuration {
                    value: 2,
                    unit: "days".into(),
                }),
            },
        }
    }

    #[test]
    fn test_schedule_series_over_ffi() {
        let (core, pet) = core_with_pet();

        let stored = core.schedule_appointment(medication_request(&pet.id)).unwrap();
        assert_eq!(stored.len(), 6);
        assert_eq!(stored[0].scheduled_at, "2024-01-01T08:00:00");
        assert_eq!(stored[5].scheduled_at, "2024-01-03T00:00:00");
        assert_eq!(stored[5].notes, "(Last dose)");

        let series_id = stored[0].series_id.clone().unwrap();
        assert_eq!(core.delete_series(series_id).unwrap(), 6);
    }

    #[test]
    fn test_language_changes_marker() {
        let (core, pet) = core_with_pet();
        core.set_language("pt".into()).unwrap();

        let stored = core.schedule_appointment(medication_request(&pet.id)).unwrap();
        assert_eq!(stored.last().unwrap().notes, "(Última dose)");
        assert!(core.set_language("fr".into()).is_err());
    }

    #[test]
    fn test_unknown_pet_rejected() {
        let core = open_database_in_memory().unwrap();
        let result = core.schedule_appointment(medication_request("missing"));
        assert!(matches!(result, Err(VetConnectError::NotFound(_))));
    }

    #[test]
    fn test_invalid_frequency_rejected() {
        let (core, pet) = core_with_pet();
        let mut request = medication_request(&pet.id);
        request.recurrence = FfiRecurrence::Medication {
            frequency_hours: 5,
            duration: None,
        };
        assert!(matches!(
            core.schedule_appointment(request),
            Err(VetConnectError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_or_single_fallback_over_ffi() {
        let (core, pet) = core_with_pet();
        let mut request = medication_request(&pet.id);
        request.recurrence = FfiRecurrence::Medication {
            frequency_hours: 8,
            duration: None,
        };

        assert!(matches!(
            core.schedule_appointment(request.clone()),
            Err(VetConnectError::InvalidRecurrence(_))
        ));
        let stored = core.schedule_appointment_or_single(request).unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].series_id.is_none());
    }

    #[test]
    fn test_due_reminders_and_marking() {
        let (core, pet) = core_with_pet();
        let request = FfiAppointmentRequest {
            pet_id: pet.id.clone(),
            kind: "Surgery".into(),
            start: "2024-03-10T10:00:00".into(),
            notes: String::new(),
            recurrence: FfiRecurrence::Once,
        };
        let stored = core.schedule_appointment(request).unwrap();

        let alerts = core.due_reminders("2024-03-10T09:15".into(), vec![]).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, "1h");
        assert_eq!(alerts[0].message, "One hour left for Rex's Surgery.");

        assert!(core
            .mark_reminder_sent(stored[0].id.clone(), "1h".into())
            .unwrap());
        assert!(core
            .due_reminders("2024-03-10T09:20".into(), vec![])
            .unwrap()
            .is_empty());
        assert!(core.mark_reminder_sent(stored[0].id.clone(), "2h".into()).is_err());
    }

    #[test]
    fn test_snapshot_round_trip_over_ffi() {
        let (core, pet) = core_with_pet();
        core.add_weight_entry(pet.id.clone(), "2024-01-01".into(), 20.0, "lb".into())
            .unwrap();
        let json = core.export_snapshot_json().unwrap();

        let other = open_database_in_memory().unwrap();
        other.import_snapshot_json(json).unwrap();

        let record = other.get_medical_record(pet.id).unwrap().unwrap();
        assert_eq!(record.weight_history.len(), 1);
        assert!((record.latest_weight_kg.unwrap() - 9.07184).abs() < 1e-9);
    }

    #[test]
    fn test_type_label() {
        let core = open_database_in_memory().unwrap();
        assert_eq!(
            core.appointment_type_label("Imaging Exam".into()).unwrap(),
            "Imaging Exam"
        );
        core.set_language("pt".into()).unwrap();
        assert_eq!(
            core.appointment_type_label("Imaging Exam".into()).unwrap(),
            "Exame de Imagem"
        );
        assert_eq!(appointment_types().len(), 13);
    }
}
