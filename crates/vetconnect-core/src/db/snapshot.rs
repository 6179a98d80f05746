//! Whole-store export and import.
//!
//! A [`Snapshot`] is the JSON document the app persists between sessions:
//! every pet, every appointment and one medical record per pet.

use serde::{Deserialize, Serialize};

use super::appointments::insert_appointment_row;
use super::pets::insert_pet_row;
use super::records::{insert_categories, insert_record_rows};
use super::{Database, DbResult};
use crate::models::{Appointment, MedicalRecord, Pet, DEFAULT_CATEGORIES};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    #[serde(default)]
    pub pets: Vec<Pet>,
    #[serde(default)]
    pub appointments: Vec<Appointment>,
    #[serde(default)]
    pub records: Vec<MedicalRecord>,
}

impl Snapshot {
    pub fn to_json(&self) -> DbResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> DbResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Database {
    /// Capture the entire store.
    pub fn save_snapshot(&self) -> DbResult<Snapshot> {
        let pets = self.list_pets()?;
        let mut records = Vec::with_capacity(pets.len());
        for pet in &pets {
            if let Some(record) = self.get_medical_record(&pet.id)? {
                records.push(record);
            }
        }

        Ok(Snapshot {
            appointments: self.list_appointments()?,
            pets,
            records,
        })
    }

    /// Replace the entire store with `snapshot`.
    ///
    /// All-or-nothing: on error the previous contents are left untouched.
    /// Pets without a record in the snapshot get the default categories.
    pub fn load_snapshot(&self, snapshot: &Snapshot) -> DbResult<()> {
        let tx = self.conn.unchecked_transaction()?;

        tx.execute("DELETE FROM pets", [])?;

        for pet in &snapshot.pets {
            insert_pet_row(&tx, pet)?;
        }
        for record in &snapshot.records {
            insert_record_rows(&tx, record)?;
        }
        let default_titles: Vec<String> =
            DEFAULT_CATEGORIES.iter().map(|t| t.to_string()).collect();
        for pet in &snapshot.pets {
            if !snapshot.records.iter().any(|r| r.pet_id == pet.id) {
                insert_categories(&tx, &pet.id, &default_titles)?;
            }
        }
        for appointment in &snapshot.appointments {
            insert_appointment_row(&tx, appointment)?;
        }

        tx.commit()?;
        tracing::info!(
            pets = snapshot.pets.len(),
            appointments = snapshot.appointments.len(),
            records = snapshot.records.len(),
            "Loaded snapshot"
        );
        Ok(())
    }
}
