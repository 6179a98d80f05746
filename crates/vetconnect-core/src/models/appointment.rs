//! Appointment models: types, recurrence patterns, drafts and stored records.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::ParseEnumError;

/// Kind of appointment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AppointmentType {
    Consultation,
    Surgery,
    Vaccination,
    Application,
    Grooming,
    #[serde(rename = "Control Analysis")]
    ControlAnalysis,
    #[serde(rename = "Dental Treatment")]
    DentalTreatment,
    #[serde(rename = "Imaging Exam")]
    ImagingExam,
    #[serde(rename = "Follow-up")]
    FollowUp,
    #[serde(rename = "Treatment/Medication")]
    TreatmentMedication,
    TherapeuticBath,
    Chemotherapy,
    Others,
}

impl AppointmentType {
    pub const ALL: [AppointmentType; 13] = [
        AppointmentType::Consultation,
        AppointmentType::Surgery,
        AppointmentType::Vaccination,
        AppointmentType::Application,
        AppointmentType::Grooming,
        AppointmentType::ControlAnalysis,
        AppointmentType::DentalTreatment,
        AppointmentType::ImagingExam,
        AppointmentType::FollowUp,
        AppointmentType::TreatmentMedication,
        AppointmentType::TherapeuticBath,
        AppointmentType::Chemotherapy,
        AppointmentType::Others,
    ];

    /// Stable wire string (also the database representation).
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentType::Consultation => "Consultation",
            AppointmentType::Surgery => "Surgery",
            AppointmentType::Vaccination => "Vaccination",
            AppointmentType::Application => "Application",
            AppointmentType::Grooming => "Grooming",
            AppointmentType::ControlAnalysis => "Control Analysis",
            AppointmentType::DentalTreatment => "Dental Treatment",
            AppointmentType::ImagingExam => "Imaging Exam",
            AppointmentType::FollowUp => "Follow-up",
            AppointmentType::TreatmentMedication => "Treatment/Medication",
            AppointmentType::TherapeuticBath => "TherapeuticBath",
            AppointmentType::Chemotherapy => "Chemotherapy",
            AppointmentType::Others => "Others",
        }
    }

    /// Translation key: the wire string lowercased with non-alphanumerics removed.
    pub fn translation_key(&self) -> String {
        self.as_str()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect()
    }

    /// Whether this type can carry a recurrence pattern.
    pub fn is_recurring_kind(&self) -> bool {
        matches!(
            self,
            AppointmentType::TreatmentMedication | AppointmentType::TherapeuticBath
        )
    }
}

impl std::str::FromStr for AppointmentType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AppointmentType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("appointment type", s))
    }
}

/// Appointment status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Missed,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "Scheduled",
            AppointmentStatus::Completed => "Completed",
            AppointmentStatus::Missed => "Missed",
        }
    }
}

impl std::str::FromStr for AppointmentStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Scheduled" => Ok(AppointmentStatus::Scheduled),
            "Completed" => Ok(AppointmentStatus::Completed),
            "Missed" => Ok(AppointmentStatus::Missed),
            _ => Err(ParseEnumError::new("appointment status", s)),
        }
    }
}

/// Dosing interval for a medication series.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MedicationFrequency {
    #[serde(rename = "6h")]
    Every6Hours,
    #[serde(rename = "8h")]
    Every8Hours,
    #[serde(rename = "12h")]
    Every12Hours,
    #[serde(rename = "24h")]
    Every24Hours,
}

impl MedicationFrequency {
    pub fn hours(&self) -> u32 {
        match self {
            MedicationFrequency::Every6Hours => 6,
            MedicationFrequency::Every8Hours => 8,
            MedicationFrequency::Every12Hours => 12,
            MedicationFrequency::Every24Hours => 24,
        }
    }

    pub fn from_hours(hours: u32) -> Option<Self> {
        match hours {
            6 => Some(MedicationFrequency::Every6Hours),
            8 => Some(MedicationFrequency::Every8Hours),
            12 => Some(MedicationFrequency::Every12Hours),
            24 => Some(MedicationFrequency::Every24Hours),
            _ => None,
        }
    }
}

impl std::str::FromStr for MedicationFrequency {
    type Err = ParseEnumError;

    /// Accepts the form values `"6h"`, `"8h"`, `"12h"` and `"24h"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_suffix('h')
            .and_then(|n| n.parse::<u32>().ok())
            .and_then(MedicationFrequency::from_hours)
            .ok_or_else(|| ParseEnumError::new("medication frequency", s))
    }
}

/// Baths per week.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BathFrequency {
    #[serde(rename = "1")]
    OncePerWeek,
    #[serde(rename = "2")]
    TwicePerWeek,
    #[serde(rename = "3")]
    ThricePerWeek,
}

impl BathFrequency {
    pub fn per_week(&self) -> u32 {
        match self {
            BathFrequency::OncePerWeek => 1,
            BathFrequency::TwicePerWeek => 2,
            BathFrequency::ThricePerWeek => 3,
        }
    }

    pub fn from_per_week(n: u32) -> Option<Self> {
        match n {
            1 => Some(BathFrequency::OncePerWeek),
            2 => Some(BathFrequency::TwicePerWeek),
            3 => Some(BathFrequency::ThricePerWeek),
            _ => None,
        }
    }
}

/// Unit of a series duration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    Days,
    Weeks,
    Months,
}

impl DurationUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            DurationUnit::Days => "days",
            DurationUnit::Weeks => "weeks",
            DurationUnit::Months => "months",
        }
    }
}

impl std::str::FromStr for DurationUnit {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "days" => Ok(DurationUnit::Days),
            "weeks" => Ok(DurationUnit::Weeks),
            "months" => Ok(DurationUnit::Months),
            _ => Err(ParseEnumError::new("duration unit", s)),
        }
    }
}

/// How long a series runs. The value is kept signed so that malformed
/// form input survives until validation rejects it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SeriesDuration {
    pub value: i64,
    pub unit: DurationUnit,
}

impl SeriesDuration {
    pub fn new(value: i64, unit: DurationUnit) -> Self {
        Self { value, unit }
    }

    pub fn days(value: i64) -> Self {
        Self::new(value, DurationUnit::Days)
    }

    pub fn weeks(value: i64) -> Self {
        Self::new(value, DurationUnit::Weeks)
    }

    pub fn months(value: i64) -> Self {
        Self::new(value, DurationUnit::Months)
    }
}

/// Recurrence pattern attached to a request, and kept on every record of a series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recurrence {
    #[default]
    None,
    Medication {
        frequency: MedicationFrequency,
        duration: Option<SeriesDuration>,
    },
    Bath {
        frequency: BathFrequency,
        duration: Option<SeriesDuration>,
        /// Weekday names ("monday", ...). Only used when more than one bath per week.
        #[serde(default)]
        weekdays: Vec<String>,
    },
}

impl Recurrence {
    pub fn is_none(&self) -> bool {
        matches!(self, Recurrence::None)
    }
}

/// Reference to a pet, with the display fields captured at creation time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PetRef {
    pub id: String,
    pub name: String,
    pub photo_url: String,
}

/// User input for a new appointment. Consumed once.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentRequest {
    pub pet: PetRef,
    pub kind: AppointmentType,
    /// Local wall-clock start time
    pub start: NaiveDateTime,
    pub notes: String,
    pub recurrence: Recurrence,
}

/// An appointment not yet inserted into the store (no id, no status).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentDraft {
    pub pet_id: String,
    pub pet_name: String,
    pub pet_photo_url: String,
    pub kind: AppointmentType,
    pub scheduled_at: NaiveDateTime,
    pub notes: String,
    pub recurrence: Recurrence,
    /// Shared by every occurrence generated from one request
    pub series_id: Option<String>,
}

impl AppointmentDraft {
    /// Single (non-series) draft from a request. Recurrence parameters are kept as entered.
    pub fn single(request: &AppointmentRequest) -> Self {
        Self {
            pet_id: request.pet.id.clone(),
            pet_name: request.pet.name.clone(),
            pet_photo_url: request.pet.photo_url.clone(),
            kind: request.kind,
            scheduled_at: request.start,
            notes: request.notes.clone(),
            recurrence: request.recurrence.clone(),
            series_id: None,
        }
    }
}

/// A stored appointment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    /// Unique appointment ID (UUID v4)
    pub id: String,
    pub pet_id: String,
    pub pet_name: String,
    pub pet_photo_url: String,
    pub kind: AppointmentType,
    pub scheduled_at: NaiveDateTime,
    pub notes: String,
    pub status: AppointmentStatus,
    pub recurrence: Recurrence,
    pub series_id: Option<String>,
    /// When the day-before reminder was delivered
    pub last_notified_day: Option<String>,
    /// When the hour-before reminder was delivered
    pub last_notified_hour: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Appointment {
    /// Materialize a draft with a fresh id and `Scheduled` status.
    pub fn from_draft(draft: AppointmentDraft) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            pet_id: draft.pet_id,
            pet_name: draft.pet_name,
            pet_photo_url: draft.pet_photo_url,
            kind: draft.kind,
            scheduled_at: draft.scheduled_at,
            notes: draft.notes,
            status: AppointmentStatus::Scheduled,
            recurrence: draft.recurrence,
            series_id: draft.series_id,
            last_notified_day: None,
            last_notified_hour: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Occurrences that belong to a generated series are not edited individually.
    pub fn is_part_of_series(&self) -> bool {
        self.series_id.is_some()
    }

    pub fn is_scheduled(&self) -> bool {
        self.status == AppointmentStatus::Scheduled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_draft() -> AppointmentDraft {
        AppointmentDraft {
            pet_id: "pet-1".into(),
            pet_name: "Max".into(),
            pet_photo_url: String::new(),
            kind: AppointmentType::Consultation,
            scheduled_at: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            notes: String::new(),
            recurrence: Recurrence::None,
            series_id: None,
        }
    }

    #[test]
    fn test_type_wire_strings() {
        for kind in AppointmentType::ALL {
            let parsed: AppointmentType = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
        assert!("Haircut".parse::<AppointmentType>().is_err());
    }

    #[test]
    fn test_translation_key() {
        assert_eq!(
            AppointmentType::TreatmentMedication.translation_key(),
            "treatmentmedication"
        );
        assert_eq!(AppointmentType::FollowUp.translation_key(), "followup");
        assert_eq!(AppointmentType::ControlAnalysis.translation_key(), "controlanalysis");
    }

    #[test]
    fn test_medication_frequency_parse() {
        assert_eq!(
            "8h".parse::<MedicationFrequency>().unwrap(),
            MedicationFrequency::Every8Hours
        );
        assert!("7h".parse::<MedicationFrequency>().is_err());
        assert!("24".parse::<MedicationFrequency>().is_err());
    }

    #[test]
    fn test_recurrence_json_shape() {
        let recurrence = Recurrence::Bath {
            frequency: BathFrequency::TwicePerWeek,
            duration: Some(SeriesDuration::weeks(2)),
            weekdays: vec!["monday".into(), "thursday".into()],
        };
        let json = serde_json::to_value(&recurrence).unwrap();
        assert_eq!(json["kind"], "bath");
        assert_eq!(json["frequency"], "2");
        assert_eq!(json["duration"]["unit"], "weeks");

        let back: Recurrence = serde_json::from_value(json).unwrap();
        assert_eq!(back, recurrence);
    }

    #[test]
    fn test_from_draft_assigns_id_and_status() {
        let a = Appointment::from_draft(make_draft());
        let b = Appointment::from_draft(make_draft());
        assert_eq!(a.id.len(), 36);
        assert_ne!(a.id, b.id);
        assert!(a.is_scheduled());
        assert!(!a.is_part_of_series());
        assert!(a.last_notified_day.is_none());
    }
}
