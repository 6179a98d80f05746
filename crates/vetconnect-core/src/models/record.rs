//! Medical record models: categorized files, weight history and vet notes.

use serde::{Deserialize, Serialize};

use super::ParseEnumError;

/// Pounds to kilograms.
pub const LB_TO_KG: f64 = 0.453592;
/// Grams to kilograms.
pub const GRAM_TO_KG: f64 = 0.001;

/// Categories every new medical record starts with (pt-BR collation order).
pub const DEFAULT_CATEGORIES: [&str; 16] = [
    "Alimentação",
    "Bioquímicos",
    "Citologia",
    "Cultura de ouvidos",
    "Cultura de pele e Outros",
    "Endoscopia",
    "Hemograma",
    "Histopatologia",
    "Hormônios",
    "Medicamentos",
    "PCR",
    "Raio – X",
    "Ressonância",
    "Sorologia",
    "Tomografia",
    "Urinálise/Cultura",
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Document,
    Image,
    Video,
    Audio,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Document => "document",
            FileKind::Image => "image",
            FileKind::Video => "video",
            FileKind::Audio => "audio",
        }
    }

    /// Guess the kind from a MIME type, defaulting to document.
    pub fn from_mime(mime_type: &str) -> Self {
        match mime_type.split('/').next().unwrap_or_default() {
            "image" => FileKind::Image,
            "video" => FileKind::Video,
            "audio" => FileKind::Audio,
            _ => FileKind::Document,
        }
    }
}

impl std::str::FromStr for FileKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "document" => Ok(FileKind::Document),
            "image" => Ok(FileKind::Image),
            "video" => Ok(FileKind::Video),
            "audio" => Ok(FileKind::Audio),
            _ => Err(ParseEnumError::new("file kind", s)),
        }
    }
}

/// A file attached to a medical record category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicalFile {
    pub id: String,
    pub name: String,
    /// Location of the stored file (device URI or data URL)
    pub url: String,
    pub kind: FileKind,
    pub mime_type: String,
    pub created_at: String,
    pub note: Option<String>,
}

impl MedicalFile {
    pub fn new(name: String, url: String, mime_type: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            url,
            kind: FileKind::from_mime(&mime_type),
            mime_type,
            created_at: chrono::Utc::now().to_rfc3339(),
            note: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicalRecordCategory {
    pub title: String,
    pub files: Vec<MedicalFile>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    Kg,
    Lb,
    G,
}

impl WeightUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeightUnit::Kg => "kg",
            WeightUnit::Lb => "lb",
            WeightUnit::G => "g",
        }
    }
}

impl std::str::FromStr for WeightUnit {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kg" => Ok(WeightUnit::Kg),
            "lb" => Ok(WeightUnit::Lb),
            "g" => Ok(WeightUnit::G),
            _ => Err(ParseEnumError::new("weight unit", s)),
        }
    }
}

/// One weighing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeightEntry {
    pub id: String,
    /// ISO date (YYYY-MM-DD)
    pub date: String,
    pub weight: f64,
    pub unit: WeightUnit,
}

impl WeightEntry {
    pub fn new(date: String, weight: f64, unit: WeightUnit) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            date,
            weight,
            unit,
        }
    }

    /// Weight normalized to kilograms.
    pub fn in_kg(&self) -> f64 {
        match self.unit {
            WeightUnit::Kg => self.weight,
            WeightUnit::Lb => self.weight * LB_TO_KG,
            WeightUnit::G => self.weight * GRAM_TO_KG,
        }
    }
}

/// Free-text note written by the veterinarian.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VetNote {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: String,
}

impl VetNote {
    pub fn new(title: String, content: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            content,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Everything recorded for one pet besides appointments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicalRecord {
    pub pet_id: String,
    pub categories: Vec<MedicalRecordCategory>,
    pub weight_history: Vec<WeightEntry>,
    pub vet_history: Vec<VetNote>,
}

impl MedicalRecord {
    /// Empty record with the default category list.
    pub fn new(pet_id: String) -> Self {
        Self {
            pet_id,
            categories: DEFAULT_CATEGORIES
                .iter()
                .map(|title| MedicalRecordCategory {
                    title: title.to_string(),
                    files: Vec::new(),
                })
                .collect(),
            weight_history: Vec::new(),
            vet_history: Vec::new(),
        }
    }

    pub fn category(&self, title: &str) -> Option<&MedicalRecordCategory> {
        self.categories.iter().find(|c| c.title == title)
    }

    /// Most recent weighing in kilograms.
    pub fn latest_weight_kg(&self) -> Option<f64> {
        self.weight_history
            .iter()
            .max_by(|a, b| a.date.cmp(&b.date))
            .map(WeightEntry::in_kg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_conversion() {
        let lb = WeightEntry::new("2024-01-01".into(), 10.0, WeightUnit::Lb);
        assert!((lb.in_kg() - 4.53592).abs() < 1e-9);

        let g = WeightEntry::new("2024-01-01".into(), 2500.0, WeightUnit::G);
        assert!((g.in_kg() - 2.5).abs() < 1e-9);

        let kg = WeightEntry::new("2024-01-01".into(), 7.2, WeightUnit::Kg);
        assert_eq!(kg.in_kg(), 7.2);
    }

    #[test]
    fn test_new_record_has_default_categories() {
        let record = MedicalRecord::new("pet-1".into());
        assert_eq!(record.categories.len(), DEFAULT_CATEGORIES.len());
        assert!(record.category("Hemograma").is_some());
        assert!(record.categories.iter().all(|c| c.files.is_empty()));
    }

    #[test]
    fn test_latest_weight() {
        let mut record = MedicalRecord::new("pet-1".into());
        assert_eq!(record.latest_weight_kg(), None);

        record
            .weight_history
            .push(WeightEntry::new("2024-03-01".into(), 12.0, WeightUnit::Kg));
        record
            .weight_history
            .push(WeightEntry::new("2024-01-01".into(), 10.0, WeightUnit::Kg));
        assert_eq!(record.latest_weight_kg(), Some(12.0));
    }

    #[test]
    fn test_file_kind_from_mime() {
        assert_eq!(FileKind::from_mime("image/jpeg"), FileKind::Image);
        assert_eq!(FileKind::from_mime("audio/mp4"), FileKind::Audio);
        assert_eq!(FileKind::from_mime("application/pdf"), FileKind::Document);
    }
}
