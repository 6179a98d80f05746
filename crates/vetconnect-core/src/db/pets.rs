//! Pet database operations.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::records::insert_categories;
use super::{now_rfc3339, Database, DbError, DbResult};
use crate::models::{OwnerInfo, Pet, DEFAULT_CATEGORIES};

const PET_COLUMNS: &str = r#"
    id, microchip, name, species, breed, gender, color, is_sterilized,
    behavior_with_animals, behavior_with_people, photo_url, birth_date,
    owner, foster, is_fat, created_at, updated_at
"#;

impl Database {
    /// Insert a new pet together with an empty medical record.
    pub fn insert_pet(&self, pet: &Pet) -> DbResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        insert_pet_row(&tx, pet)?;
        let titles: Vec<String> = DEFAULT_CATEGORIES.iter().map(|t| t.to_string()).collect();
        insert_categories(&tx, &pet.id, &titles)?;
        tx.commit()?;
        tracing::info!(pet_id = %pet.id, "Registered pet");
        Ok(())
    }

    /// Update an existing pet.
    ///
    /// Appointments keep the pet name and photo captured when they were created.
    pub fn update_pet(&self, pet: &Pet) -> DbResult<bool> {
        let owner_json = pet.owner.as_ref().map(serde_json::to_string).transpose()?;
        let foster_json = pet.foster.as_ref().map(serde_json::to_string).transpose()?;

        let rows_affected = self.conn.execute(
            r#"
            UPDATE pets SET
                microchip = ?2,
                name = ?3,
                species = ?4,
                breed = ?5,
                gender = ?6,
                color = ?7,
                is_sterilized = ?8,
                behavior_with_animals = ?9,
                behavior_with_people = ?10,
                photo_url = ?11,
                birth_date = ?12,
                owner = ?13,
                foster = ?14,
                is_fat = ?15,
                updated_at = ?16
            WHERE id = ?1
            "#,
            params![
                pet.id,
                pet.microchip,
                pet.name,
                pet.species.as_str(),
                pet.breed,
                pet.gender.as_str(),
                pet.color,
                pet.is_sterilized,
                pet.behavior_with_animals.as_str(),
                pet.behavior_with_people.as_str(),
                pet.photo_url,
                pet.birth_date,
                owner_json,
                foster_json,
                pet.is_fat,
                now_rfc3339(),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a pet by ID.
    pub fn get_pet(&self, id: &str) -> DbResult<Option<Pet>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM pets WHERE id = ?", PET_COLUMNS),
                [id],
                PetRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List all pets by name.
    pub fn list_pets(&self) -> DbResult<Vec<Pet>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM pets ORDER BY name", PET_COLUMNS))?;
        let rows = stmt.query_map([], PetRow::from_row)?;

        let mut pets = Vec::new();
        for row in rows {
            pets.push(row?.try_into()?);
        }
        Ok(pets)
    }

    /// Search pets by name (prefix match).
    pub fn search_pets(&self, query: &str, limit: usize) -> DbResult<Vec<Pet>> {
        let pattern = format!("{}%", query);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM pets WHERE name LIKE ? ORDER BY name LIMIT ?",
            PET_COLUMNS
        ))?;
        let rows = stmt.query_map(params![pattern, limit as i64], PetRow::from_row)?;

        let mut pets = Vec::new();
        for row in rows {
            pets.push(row?.try_into()?);
        }
        Ok(pets)
    }

    /// Delete a pet with its appointments and medical record.
    pub fn delete_pet(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM pets WHERE id = ?", [id])?;
        if rows_affected > 0 {
            tracing::info!(pet_id = %id, "Deleted pet and its records");
        }
        Ok(rows_affected > 0)
    }
}

pub(crate) fn insert_pet_row(conn: &Connection, pet: &Pet) -> DbResult<()> {
    let owner_json = pet.owner.as_ref().map(serde_json::to_string).transpose()?;
    let foster_json = pet.foster.as_ref().map(serde_json::to_string).transpose()?;

    conn.execute(
        r#"
        INSERT INTO pets (
            id, microchip, name, species, breed, gender, color, is_sterilized,
            behavior_with_animals, behavior_with_people, photo_url, birth_date,
            owner, foster, is_fat, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
        "#,
        params![
            pet.id,
            pet.microchip,
            pet.name,
            pet.species.as_str(),
            pet.breed,
            pet.gender.as_str(),
            pet.color,
            pet.is_sterilized,
            pet.behavior_with_animals.as_str(),
            pet.behavior_with_people.as_str(),
            pet.photo_url,
            pet.birth_date,
            owner_json,
            foster_json,
            pet.is_fat,
            pet.created_at,
            pet.updated_at,
        ],
    )?;
    Ok(())
}

/// Intermediate row struct for database mapping.
struct PetRow {
    id: String,
    microchip: String,
    name: String,
    species: String,
    breed: String,
    gender: String,
    color: String,
    is_sterilized: bool,
    behavior_with_animals: String,
    behavior_with_people: String,
    photo_url: String,
    birth_date: Option<String>,
    owner: Option<String>,
    foster: Option<String>,
    is_fat: bool,
    created_at: String,
    updated_at: String,
}

impl PetRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            microchip: row.get(1)?,
            name: row.get(2)?,
            species: row.get(3)?,
            breed: row.get(4)?,
            gender: row.get(5)?,
            color: row.get(6)?,
            is_sterilized: row.get(7)?,
            behavior_with_animals: row.get(8)?,
            behavior_with_people: row.get(9)?,
            photo_url: row.get(10)?,
            birth_date: row.get(11)?,
            owner: row.get(12)?,
            foster: row.get(13)?,
            is_fat: row.get(14)?,
            created_at: row.get(15)?,
            updated_at: row.get(16)?,
        })
    }
}

impl TryFrom<PetRow> for Pet {
    type Error = DbError;

    fn try_from(row: PetRow) -> Result<Self, Self::Error> {
        let owner: Option<OwnerInfo> = row.owner.as_deref().map(serde_json::from_str).transpose()?;
        let foster: Option<OwnerInfo> =
            row.foster.as_deref().map(serde_json::from_str).transpose()?;

        Ok(Pet {
            id: row.id,
            microchip: row.microchip,
            name: row.name,
            species: row.species.parse()?,
            breed: row.breed,
            gender: row.gender.parse()?,
            color: row.color,
            is_sterilized: row.is_sterilized,
            behavior_with_animals: row.behavior_with_animals.parse()?,
            behavior_with_people: row.behavior_with_people.parse()?,
            photo_url: row.photo_url,
            birth_date: row.birth_date,
            owner,
            foster,
            is_fat: row.is_fat,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Behavior, Gender, Species};

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let db = setup_db();

        let mut pet = Pet::new("Max".into(), Species::Canine, Gender::Male);
        pet.breed = "Golden Retriever".into();
        pet.microchip = "941000024680135".into();
        pet.owner = Some(OwnerInfo {
            name: "Ana".into(),
            phone: "+351 912 345 678".into(),
            ..Default::default()
        });

        db.insert_pet(&pet).unwrap();

        let retrieved = db.get_pet(&pet.id).unwrap().unwrap();
        assert_eq!(retrieved, pet);
    }

    #[test]
    fn test_insert_creates_medical_record() {
        let db = setup_db();
        let pet = Pet::new("Mia".into(), Species::Feline, Gender::Female);
        db.insert_pet(&pet).unwrap();

        let record = db.get_medical_record(&pet.id).unwrap().unwrap();
        assert_eq!(record.categories.len(), DEFAULT_CATEGORIES.len());
        assert_eq!(record.categories[0].title, DEFAULT_CATEGORIES[0]);
    }

    #[test]
    fn test_update_pet() {
        let db = setup_db();

        let mut pet = Pet::new("Max".into(), Species::Canine, Gender::Male);
        db.insert_pet(&pet).unwrap();

        pet.is_sterilized = true;
        pet.behavior_with_animals = Behavior::Aggressive;
        pet.is_fat = true;
        pet.foster = Some(OwnerInfo {
            name: "Rui".into(),
            ..Default::default()
        });
        assert!(db.update_pet(&pet).unwrap());

        let retrieved = db.get_pet(&pet.id).unwrap().unwrap();
        assert!(retrieved.is_sterilized);
        assert!(retrieved.is_fat);
        assert_eq!(retrieved.behavior_with_animals, Behavior::Aggressive);
        assert_eq!(retrieved.foster.unwrap().name, "Rui");
    }

    #[test]
    fn test_search_pets() {
        let db = setup_db();

        db.insert_pet(&Pet::new("Max".into(), Species::Canine, Gender::Male))
            .unwrap();
        db.insert_pet(&Pet::new("Maxine".into(), Species::Feline, Gender::Female))
            .unwrap();
        db.insert_pet(&Pet::new("Luna".into(), Species::Canine, Gender::Female))
            .unwrap();

        let results = db.search_pets("Max", 10).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().any(|p| p.name == "Max"));
        assert!(results.iter().any(|p| p.name == "Maxine"));

        let all = db.list_pets().unwrap();
        assert_eq!(all[0].name, "Luna");
    }

    #[test]
    fn test_delete_pet() {
        let db = setup_db();
        let pet = Pet::new("Max".into(), Species::Canine, Gender::Male);
        db.insert_pet(&pet).unwrap();

        assert!(db.delete_pet(&pet.id).unwrap());
        assert!(db.get_pet(&pet.id).unwrap().is_none());
        assert!(db.get_medical_record(&pet.id).unwrap().is_none());
        assert!(!db.delete_pet(&pet.id).unwrap());
    }
}
