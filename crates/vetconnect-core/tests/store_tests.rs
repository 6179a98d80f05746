//! Scheduler and store integration tests.

use std::cell::RefCell;
use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime};

use vetconnect_core::db::{AppointmentStore, Database, DbError, DbResult, Snapshot};
use vetconnect_core::i18n::{Catalog, Language};
use vetconnect_core::models::{
    Appointment, AppointmentDraft, AppointmentRequest, AppointmentStatus, AppointmentType,
    BathFrequency, Gender, MedicationFrequency, Pet, Recurrence, SeriesDuration, Species,
};
use vetconnect_core::reminders::{due_alerts, ReminderKind};
use vetconnect_core::schedule::{ScheduleError, Scheduler, SubmitError};
use vetconnect_core::ReminderConfig;

fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

fn setup() -> (Database, Pet) {
    let db = Database::open_in_memory().unwrap();
    let pet = Pet::new("Amora".into(), Species::Canine, Gender::Female);
    db.insert_pet(&pet).unwrap();
    (db, pet)
}

fn bath_request(pet: &Pet, weekdays: Vec<String>) -> AppointmentRequest {
    AppointmentRequest {
        pet: pet.pet_ref(),
        kind: AppointmentType::TherapeuticBath,
        start: at(2024, 1, 3, 9),
        notes: "Chlorhexidine shampoo".into(),
        recurrence: Recurrence::Bath {
            frequency: BathFrequency::TwicePerWeek,
            duration: Some(SeriesDuration::weeks(2)),
            weekdays,
        },
    }
}

/// In-memory store that records how it was called.
#[derive(Default)]
struct RecordingStore {
    appointments: RefCell<Vec<Appointment>>,
    batch_sizes: RefCell<Vec<usize>>,
}

impl AppointmentStore for RecordingStore {
    fn insert_one(&self, draft: AppointmentDraft) -> DbResult<Appointment> {
        let appointment = Appointment::from_draft(draft);
        self.appointments.borrow_mut().push(appointment.clone());
        Ok(appointment)
    }

    fn insert_many(&self, drafts: Vec<AppointmentDraft>) -> DbResult<Vec<Appointment>> {
        self.batch_sizes.borrow_mut().push(drafts.len());
        let stored: Vec<Appointment> = drafts.into_iter().map(Appointment::from_draft).collect();
        self.appointments.borrow_mut().extend(stored.iter().cloned());
        Ok(stored)
    }

    fn update(&self, appointment: &Appointment) -> DbResult<bool> {
        let mut appointments = self.appointments.borrow_mut();
        match appointments.iter_mut().find(|a| a.id == appointment.id) {
            Some(existing) => {
                *existing = appointment.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn update_status(&self, id: &str, status: AppointmentStatus) -> DbResult<bool> {
        let mut appointments = self.appointments.borrow_mut();
        match appointments.iter_mut().find(|a| a.id == id) {
            Some(existing) => {
                existing.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(&self, id: &str) -> DbResult<bool> {
        let mut appointments = self.appointments.borrow_mut();
        let before = appointments.len();
        appointments.retain(|a| a.id != id);
        Ok(appointments.len() < before)
    }

    fn delete_many(&self, ids: &[String]) -> DbResult<usize> {
        let mut appointments = self.appointments.borrow_mut();
        let before = appointments.len();
        appointments.retain(|a| !ids.contains(&a.id));
        Ok(before - appointments.len())
    }

    fn query(&self, predicate: &dyn Fn(&Appointment) -> bool) -> DbResult<Vec<Appointment>> {
        Ok(self
            .appointments
            .borrow()
            .iter()
            .filter(|a| predicate(a))
            .cloned()
            .collect())
    }
}

#[test]
fn test_series_is_written_in_one_batch() {
    let store = RecordingStore::default();
    let (_, pet) = setup();
    let scheduler = Scheduler::new(&store, Catalog::new(Language::En));

    let stored = scheduler
        .submit(&bath_request(&pet, vec!["monday".into(), "thursday".into()]))
        .unwrap();

    assert_eq!(stored.len(), 4);
    assert_eq!(*store.batch_sizes.borrow(), vec![4]);
    assert_eq!(stored[3].notes, "Chlorhexidine shampoo\n(Last bath)");
}

#[test]
fn test_rejected_series_never_reaches_store() {
    let store = RecordingStore::default();
    let (_, pet) = setup();
    let scheduler = Scheduler::new(&store, Catalog::default());

    let result = scheduler.submit(&bath_request(&pet, vec![]));

    assert!(matches!(
        result,
        Err(SubmitError::Schedule(ScheduleError::InvalidRecurrence(_)))
    ));
    assert!(store.batch_sizes.borrow().is_empty());
    assert!(store.query(&|_: &Appointment| true).unwrap().is_empty());
}

#[test]
fn test_scheduler_over_trait_object() {
    let (db, pet) = setup();
    let store: &dyn AppointmentStore = &db;
    let scheduler = Scheduler::new(store, Catalog::new(Language::Pt));

    let stored = scheduler
        .submit(&AppointmentRequest {
            pet: pet.pet_ref(),
            kind: AppointmentType::TreatmentMedication,
            start: at(2024, 2, 1, 20),
            notes: String::new(),
            recurrence: Recurrence::Medication {
                frequency: MedicationFrequency::Every6Hours,
                duration: Some(SeriesDuration::days(2)),
            },
        })
        .unwrap();

    assert_eq!(stored.len(), 8);
    let from_db = db.list_series(stored[0].series_id.as_deref().unwrap()).unwrap();
    assert_eq!(from_db, stored);
    assert_eq!(from_db[7].notes, "(Última dose)");
}

#[test]
fn test_series_lifecycle_in_database() {
    let (db, pet) = setup();
    let scheduler = Scheduler::new(&db, Catalog::default());
    let stored = scheduler
        .submit(&bath_request(&pet, vec!["monday".into(), "thursday".into()]))
        .unwrap();

    db.update_appointment_status(&stored[0].id, AppointmentStatus::Completed)
        .unwrap();
    db.update_appointment_status(&stored[1].id, AppointmentStatus::Missed)
        .unwrap();

    let upcoming = db.list_upcoming_appointments(Some(&pet.id)).unwrap();
    assert_eq!(upcoming.len(), 2);
    let history = db.list_appointment_history(None).unwrap();
    assert_eq!(history[0].id, stored[1].id);

    let series_id = stored[0].series_id.clone().unwrap();
    assert_eq!(db.delete_series(&series_id).unwrap(), 4);
    assert!(db.list_appointments().unwrap().is_empty());
}

#[test]
fn test_deleting_pet_removes_its_appointments() {
    let (db, pet) = setup();
    let other = Pet::new("Bidu".into(), Species::Canine, Gender::Male);
    db.insert_pet(&other).unwrap();

    let scheduler = Scheduler::new(&db, Catalog::default());
    scheduler
        .submit(&bath_request(&pet, vec!["tuesday".into(), "saturday".into()]))
        .unwrap();
    scheduler
        .submit(&AppointmentRequest {
            pet: other.pet_ref(),
            kind: AppointmentType::Consultation,
            start: at(2024, 1, 5, 14),
            notes: String::new(),
            recurrence: Recurrence::None,
        })
        .unwrap();

    db.delete_pet(&pet.id).unwrap();

    let remaining = db.list_appointments().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].pet_id, other.id);
}

#[test]
fn test_reminders_follow_bookkeeping() {
    let (db, pet) = setup();
    let scheduler = Scheduler::new(&db, Catalog::default());
    let stored = scheduler
        .submit(&AppointmentRequest {
            pet: pet.pet_ref(),
            kind: AppointmentType::Vaccination,
            start: at(2024, 6, 2, 10),
            notes: String::new(),
            recurrence: Recurrence::None,
        })
        .unwrap();
    let id = stored[0].id.clone();
    let config = ReminderConfig::default();
    let none = HashSet::new();

    let alerts = due_alerts(&db.list_appointments().unwrap(), at(2024, 6, 1, 10), &none, &config);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, ReminderKind::DayBefore);

    db.mark_reminder_sent(&id, ReminderKind::DayBefore).unwrap();
    let alerts = due_alerts(&db.list_appointments().unwrap(), at(2024, 6, 1, 10), &none, &config);
    assert!(alerts.is_empty());

    // rescheduling clears the bookkeeping
    let mut moved = db.get_appointment(&id).unwrap().unwrap();
    moved.scheduled_at = at(2024, 6, 3, 10);
    db.update_appointment(&moved).unwrap();
    let alerts = due_alerts(&db.list_appointments().unwrap(), at(2024, 6, 2, 10), &none, &config);
    assert_eq!(alerts.len(), 1);
}

#[test]
fn test_snapshot_survives_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot_path = dir.path().join("snapshot.json");

    {
        let db = Database::open(dir.path().join("first.db")).unwrap();
        let pet = Pet::new("Amora".into(), Species::Canine, Gender::Female);
        db.insert_pet(&pet).unwrap();
        Scheduler::new(&db, Catalog::default())
            .submit(&bath_request(&pet, vec!["monday".into(), "thursday".into()]))
            .unwrap();
        let json = db.save_snapshot().unwrap().to_json().unwrap();
        std::fs::write(&snapshot_path, json).unwrap();
    }

    let json = std::fs::read_to_string(&snapshot_path).unwrap();
    let snapshot = Snapshot::from_json(&json).unwrap();
    let db = Database::open(dir.path().join("second.db")).unwrap();
    db.load_snapshot(&snapshot).unwrap();

    assert_eq!(db.list_appointments().unwrap().len(), 4);
    assert_eq!(db.save_snapshot().unwrap(), snapshot);
}

#[test]
fn test_snapshot_with_dangling_appointment_is_rejected() {
    let (db, pet) = setup();
    let mut snapshot = db.save_snapshot().unwrap();
    let orphan = Appointment::from_draft(AppointmentDraft::single(&AppointmentRequest {
        pet: Pet::new("Ghost".into(), Species::Exotic, Gender::Male).pet_ref(),
        kind: AppointmentType::Others,
        start: at(2024, 1, 1, 9),
        notes: String::new(),
        recurrence: Recurrence::None,
    }));
    snapshot.appointments.push(orphan);

    let result = db.load_snapshot(&snapshot);
    assert!(matches!(result, Err(DbError::Sqlite(_))));
    assert!(db.get_pet(&pet.id).unwrap().is_some());
}
