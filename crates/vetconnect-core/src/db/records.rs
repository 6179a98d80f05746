//! Medical record database operations.

use std::collections::{HashMap, HashSet};

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{MedicalFile, MedicalRecord, MedicalRecordCategory, VetNote, WeightEntry};

impl Database {
    /// Load the full medical record of a pet, or `None` if the pet does not exist.
    pub fn get_medical_record(&self, pet_id: &str) -> DbResult<Option<MedicalRecord>> {
        let exists = self
            .conn
            .query_row("SELECT 1 FROM pets WHERE id = ?", [pet_id], |_| Ok(()))
            .optional()?
            .is_some();
        if !exists {
            return Ok(None);
        }

        let mut files_by_category: HashMap<String, Vec<MedicalFile>> = HashMap::new();
        {
            let mut stmt = self.conn.prepare(
                r#"
                SELECT category_title, id, name, url, kind, mime_type, created_at, note
                FROM medical_files
                WHERE pet_id = ?
                ORDER BY created_at, id
                "#,
            )?;
            let rows = stmt.query_map([pet_id], |row| {
                Ok((row.get::<_, String>(0)?, FileRow::from_row(row)?))
            })?;
            for row in rows {
                let (category, file) = row?;
                files_by_category
                    .entry(category)
                    .or_default()
                    .push(file.try_into()?);
            }
        }

        let mut stmt = self.conn.prepare(
            "SELECT title FROM medical_categories WHERE pet_id = ? ORDER BY position",
        )?;
        let titles = stmt.query_map([pet_id], |row| row.get::<_, String>(0))?;

        let mut categories = Vec::new();
        for title in titles {
            let title = title?;
            let files = files_by_category.remove(&title).unwrap_or_default();
            categories.push(MedicalRecordCategory { title, files });
        }

        Ok(Some(MedicalRecord {
            pet_id: pet_id.to_string(),
            categories,
            weight_history: self.list_weight_history(pet_id)?,
            vet_history: self.list_vet_notes(pet_id)?,
        }))
    }

    /// Attach a file to an existing category.
    pub fn add_medical_file(
        &self,
        pet_id: &str,
        category: &str,
        file: &MedicalFile,
    ) -> DbResult<()> {
        let exists = self
            .conn
            .query_row(
                "SELECT 1 FROM medical_categories WHERE pet_id = ?1 AND title = ?2",
                params![pet_id, category],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !exists {
            return Err(DbError::NotFound(format!(
                "category '{}' for pet {}",
                category, pet_id
            )));
        }

        insert_file_row(&self.conn, pet_id, category, file)?;
        tracing::debug!(pet_id, category, file_id = %file.id, "Attached medical file");
        Ok(())
    }

    pub fn rename_medical_file(&self, id: &str, name: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE medical_files SET name = ?2 WHERE id = ?1",
            params![id, name],
        )?;
        Ok(rows_affected > 0)
    }

    /// Set or clear the note attached to a file.
    pub fn update_medical_file_note(&self, id: &str, note: Option<&str>) -> DbResult<bool> {
        let note = note.filter(|n| !n.trim().is_empty());
        let rows_affected = self.conn.execute(
            "UPDATE medical_files SET note = ?2 WHERE id = ?1",
            params![id, note],
        )?;
        Ok(rows_affected > 0)
    }

    pub fn delete_medical_file(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM medical_files WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    /// Reorder a pet's categories.
    ///
    /// `titles` must list every existing category exactly once.
    pub fn update_category_order(&self, pet_id: &str, titles: &[String]) -> DbResult<()> {
        let current: HashSet<String> = {
            let mut stmt = self
                .conn
                .prepare("SELECT title FROM medical_categories WHERE pet_id = ?")?;
            let rows = stmt.query_map([pet_id], |row| row.get::<_, String>(0))?;
            let titles = rows.collect::<Result<HashSet<_>, _>>()?;
            titles
        };
        if current.is_empty() {
            return Err(DbError::NotFound(format!("medical record for pet {}", pet_id)));
        }

        let requested: HashSet<String> = titles.iter().cloned().collect();
        if requested.len() != titles.len() || requested != current {
            return Err(DbError::Constraint(
                "category order must list every category exactly once".into(),
            ));
        }

        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "UPDATE medical_categories SET position = ?3 WHERE pet_id = ?1 AND title = ?2",
            )?;
            for (position, title) in titles.iter().enumerate() {
                stmt.execute(params![pet_id, title, position as i64])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Weight history
    // ------------------------------------------------------------------

    pub fn add_weight_entry(&self, pet_id: &str, entry: &WeightEntry) -> DbResult<()> {
        check_weight(entry)?;
        insert_weight_row(&self.conn, pet_id, entry)
    }

    pub fn update_weight_entry(&self, entry: &WeightEntry) -> DbResult<bool> {
        check_weight(entry)?;
        let rows_affected = self.conn.execute(
            "UPDATE weight_entries SET date = ?2, weight = ?3, unit = ?4 WHERE id = ?1",
            params![entry.id, entry.date, entry.weight, entry.unit.as_str()],
        )?;
        Ok(rows_affected > 0)
    }

    pub fn delete_weight_entry(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM weight_entries WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    /// Weighings of a pet, oldest first.
    pub fn list_weight_history(&self, pet_id: &str) -> DbResult<Vec<WeightEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, weight, unit FROM weight_entries WHERE pet_id = ? ORDER BY date, id",
        )?;
        let rows = stmt.query_map([pet_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, date, weight, unit) = row?;
            entries.push(WeightEntry {
                id,
                date,
                weight,
                unit: unit.parse()?,
            });
        }
        Ok(entries)
    }

    // ------------------------------------------------------------------
    // Vet notes
    // ------------------------------------------------------------------

    pub fn add_vet_note(&self, pet_id: &str, note: &VetNote) -> DbResult<()> {
        insert_note_row(&self.conn, pet_id, note)
    }

    /// Patch a note. `None` leaves the field unchanged.
    pub fn update_vet_note(
        &self,
        id: &str,
        title: Option<&str>,
        content: Option<&str>,
    ) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE vet_notes SET
                title = COALESCE(?2, title),
                content = COALESCE(?3, content)
            WHERE id = ?1
            "#,
            params![id, title, content],
        )?;
        Ok(rows_affected > 0)
    }

    pub fn delete_vet_note(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM vet_notes WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    /// Notes of a pet, oldest first.
    pub fn list_vet_notes(&self, pet_id: &str) -> DbResult<Vec<VetNote>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, content, created_at FROM vet_notes WHERE pet_id = ? ORDER BY created_at, id",
        )?;
        let rows = stmt.query_map([pet_id], |row| {
            Ok(VetNote {
                id: row.get(0)?,
                title: row.get(1)?,
                content: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

fn check_weight(entry: &WeightEntry) -> DbResult<()> {
    if !entry.weight.is_finite() || entry.weight < 0.0 {
        return Err(DbError::Constraint(format!(
            "weight must be a non-negative number, got {}",
            entry.weight
        )));
    }
    Ok(())
}

pub(crate) fn insert_categories(conn: &Connection, pet_id: &str, titles: &[String]) -> DbResult<()> {
    let mut stmt = conn
        .prepare("INSERT INTO medical_categories (pet_id, title, position) VALUES (?1, ?2, ?3)")?;
    for (position, title) in titles.iter().enumerate() {
        stmt.execute(params![pet_id, title, position as i64])?;
    }
    Ok(())
}

/// Write a complete record for a pet that has no record rows yet.
pub(crate) fn insert_record_rows(conn: &Connection, record: &MedicalRecord) -> DbResult<()> {
    let titles: Vec<String> = record.categories.iter().map(|c| c.title.clone()).collect();
    insert_categories(conn, &record.pet_id, &titles)?;
    for category in &record.categories {
        for file in &category.files {
            insert_file_row(conn, &record.pet_id, &category.title, file)?;
        }
    }
    for entry in &record.weight_history {
        check_weight(entry)?;
        insert_weight_row(conn, &record.pet_id, entry)?;
    }
    for note in &record.vet_history {
        insert_note_row(conn, &record.pet_id, note)?;
    }
    Ok(())
}

fn insert_file_row(
    conn: &Connection,
    pet_id: &str,
    category: &str,
    file: &MedicalFile,
) -> DbResult<()> {
    conn.execute(
        r#"
        INSERT INTO medical_files (id, pet_id, category_title, name, url, kind, mime_type, note, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
        params![
            file.id,
            pet_id,
            category,
            file.name,
            file.url,
            file.kind.as_str(),
            file.mime_type,
            file.note,
            file.created_at,
        ],
    )?;
    Ok(())
}

fn insert_weight_row(conn: &Connection, pet_id: &str, entry: &WeightEntry) -> DbResult<()> {
    conn.execute(
        "INSERT INTO weight_entries (id, pet_id, date, weight, unit) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![entry.id, pet_id, entry.date, entry.weight, entry.unit.as_str()],
    )?;
    Ok(())
}

fn insert_note_row(conn: &Connection, pet_id: &str, note: &VetNote) -> DbResult<()> {
    conn.execute(
        "INSERT INTO vet_notes (id, pet_id, title, content, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![note.id, pet_id, note.title, note.content, note.created_at],
    )?;
    Ok(())
}

/// Intermediate row struct for database mapping.
struct FileRow {
    id: String,
    name: String,
    url: String,
    kind: String,
    mime_type: String,
    created_at: String,
    note: Option<String>,
}

impl FileRow {
    /// Columns start at index 1; index 0 is the category title.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(1)?,
            name: row.get(2)?,
            url: row.get(3)?,
            kind: row.get(4)?,
            mime_type: row.get(5)?,
            created_at: row.get(6)?,
            note: row.get(7)?,
        })
    }
}

impl TryFrom<FileRow> for MedicalFile {
    type Error = DbError;

    fn try_from(row: FileRow) -> Result<Self, Self::Error> {
        Ok(MedicalFile {
            id: row.id,
            name: row.name,
            url: row.url,
            kind: row.kind.parse()?,
            mime_type: row.mime_type,
            created_at: row.created_at,
            note: row.note,
        })
    }
}
