//! SQLite schema definition.

/// Complete database schema for vetconnect.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Pets
-- ============================================================================

CREATE TABLE IF NOT EXISTS pets (
    id TEXT PRIMARY KEY,
    microchip TEXT NOT NULL DEFAULT '',
    name TEXT NOT NULL,
    species TEXT NOT NULL,                       -- Canine, Feline, Exotic
    breed TEXT NOT NULL DEFAULT '',
    gender TEXT NOT NULL,                        -- Male, Female
    color TEXT NOT NULL DEFAULT '',
    is_sterilized INTEGER NOT NULL DEFAULT 0,
    behavior_with_animals TEXT NOT NULL,
    behavior_with_people TEXT NOT NULL,
    photo_url TEXT NOT NULL DEFAULT '',
    birth_date TEXT,
    owner TEXT,                                  -- JSON OwnerInfo
    foster TEXT,                                 -- JSON OwnerInfo
    is_fat INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_pets_name ON pets(name);

-- ============================================================================
-- Appointments
-- ============================================================================

CREATE TABLE IF NOT EXISTS appointments (
    id TEXT PRIMARY KEY,
    pet_id TEXT NOT NULL REFERENCES pets(id) ON DELETE CASCADE,
    pet_name TEXT NOT NULL,                      -- denormalized at creation
    pet_photo_url TEXT NOT NULL DEFAULT '',
    kind TEXT NOT NULL,
    scheduled_at TEXT NOT NULL,                  -- local wall-clock, YYYY-MM-DDTHH:MM:SS
    notes TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL DEFAULT 'Scheduled'
        CHECK (status IN ('Scheduled', 'Completed', 'Missed')),
    recurrence TEXT NOT NULL DEFAULT '{"kind":"none"}', -- JSON Recurrence
    series_id TEXT,                              -- shared by generated occurrences
    last_notified_day TEXT,
    last_notified_hour TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_appointments_pet ON appointments(pet_id);
CREATE INDEX IF NOT EXISTS idx_appointments_scheduled ON appointments(scheduled_at);
CREATE INDEX IF NOT EXISTS idx_appointments_status ON appointments(status);
CREATE INDEX IF NOT EXISTS idx_appointments_series ON appointments(series_id);

-- ============================================================================
-- Medical Records
-- ============================================================================

CREATE TABLE IF NOT EXISTS medical_categories (
    pet_id TEXT NOT NULL REFERENCES pets(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    position INTEGER NOT NULL,
    PRIMARY KEY (pet_id, title)
);

CREATE TABLE IF NOT EXISTS medical_files (
    id TEXT PRIMARY KEY,
    pet_id TEXT NOT NULL,
    category_title TEXT NOT NULL,
    name TEXT NOT NULL,
    url TEXT NOT NULL,
    kind TEXT NOT NULL CHECK (kind IN ('document', 'image', 'video', 'audio')),
    mime_type TEXT NOT NULL,
    note TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    FOREIGN KEY (pet_id, category_title)
        REFERENCES medical_categories(pet_id, title) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_medical_files_category ON medical_files(pet_id, category_title);

CREATE TABLE IF NOT EXISTS weight_entries (
    id TEXT PRIMARY KEY,
    pet_id TEXT NOT NULL REFERENCES pets(id) ON DELETE CASCADE,
    date TEXT NOT NULL,
    weight REAL NOT NULL CHECK (weight >= 0),
    unit TEXT NOT NULL CHECK (unit IN ('kg', 'lb', 'g'))
);

CREATE INDEX IF NOT EXISTS idx_weight_entries_pet ON weight_entries(pet_id, date);

CREATE TABLE IF NOT EXISTS vet_notes (
    id TEXT PRIMARY KEY,
    pet_id TEXT NOT NULL REFERENCES pets(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    content TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_vet_notes_pet ON vet_notes(pet_id);
"#;
