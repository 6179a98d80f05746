//! Series expansion: one recurring request becomes an ordered list of drafts.

use chrono::NaiveDateTime;

use super::calendar::{
    advance_by_days, advance_by_hours, advance_by_weeks, days_until_next, weekday_index,
    weekday_of,
};
use super::{ScheduleError, ScheduleResult};
use crate::i18n::{Translator, LAST_BATH_KEY, LAST_DOSE_KEY};
use crate::models::{
    AppointmentDraft, AppointmentRequest, AppointmentType, BathFrequency, DurationUnit,
    MedicationFrequency, Recurrence, SeriesDuration,
};

/// Upper bound on the number of occurrences a single request may produce.
pub const MAX_SERIES_LEN: usize = 5_000;

/// Months are counted as four weeks.
pub const WEEKS_PER_MONTH: i64 = 4;

/// Multi-weekly bath walks stop after `target * SCAN_DAYS_PER_OCCURRENCE` days.
const SCAN_DAYS_PER_OCCURRENCE: i64 = 8;

/// Timestamps of a validated series plus the key of its terminal marker.
struct SeriesPlan {
    timestamps: Vec<NaiveDateTime>,
    marker_key: &'static str,
}

/// Expands recurring appointment requests.
#[derive(Debug, Clone)]
pub struct SeriesExpander<T> {
    translator: T,
}

impl<T: Translator> SeriesExpander<T> {
    pub fn new(translator: T) -> Self {
        Self { translator }
    }

    pub fn translator(&self) -> &T {
        &self.translator
    }

    /// Expand a request into a non-empty, chronologically ordered series.
    ///
    /// Every draft shares the pet, type, recurrence and a fresh `series_id`.
    /// Only the last one carries the "(Last dose)" / "(Last bath)" marker.
    pub fn expand(&self, request: &AppointmentRequest) -> ScheduleResult<Vec<AppointmentDraft>> {
        let plan = plan_series(request)?;
        let marker = format!("({})", self.translator.translate(plan.marker_key));
        let series_id = uuid::Uuid::new_v4().to_string();
        let last = plan.timestamps.len() - 1;

        let drafts: Vec<AppointmentDraft> = plan
            .timestamps
            .into_iter()
            .enumerate()
            .map(|(i, scheduled_at)| AppointmentDraft {
                pet_id: request.pet.id.clone(),
                pet_name: request.pet.name.clone(),
                pet_photo_url: request.pet.photo_url.clone(),
                kind: request.kind,
                scheduled_at,
                notes: if i == last {
                    append_marker(&request.notes, &marker)
                } else {
                    request.notes.clone()
                },
                recurrence: request.recurrence.clone(),
                series_id: Some(series_id.clone()),
            })
            .collect();

        tracing::debug!(
            kind = request.kind.as_str(),
            occurrences = drafts.len(),
            %series_id,
            "Expanded appointment series"
        );

        Ok(drafts)
    }
}

/// Expand with a borrowed translator.
pub fn expand_series(
    request: &AppointmentRequest,
    translator: &dyn Translator,
) -> ScheduleResult<Vec<AppointmentDraft>> {
    SeriesExpander::new(translator).expand(request)
}

/// Validate a request and compute its occurrence timestamps.
fn plan_series(request: &AppointmentRequest) -> ScheduleResult<SeriesPlan> {
    match (&request.recurrence, request.kind) {
        (Recurrence::None, _) => Err(invalid("request has no recurrence pattern")),
        (
            Recurrence::Medication {
                frequency,
                duration,
            },
            AppointmentType::TreatmentMedication,
        ) => Ok(SeriesPlan {
            timestamps: plan_medication(request.start, *frequency, *duration)?,
            marker_key: LAST_DOSE_KEY,
        }),
        (
            Recurrence::Bath {
                frequency,
                duration,
                weekdays,
            },
            AppointmentType::TherapeuticBath,
        ) => Ok(SeriesPlan {
            timestamps: plan_bath(request.start, *frequency, *duration, weekdays)?,
            marker_key: LAST_BATH_KEY,
        }),
        (recurrence, kind) => Err(invalid(format!(
            "{} recurrence does not apply to {} appointments",
            recurrence_name(recurrence),
            kind.as_str()
        ))),
    }
}

fn plan_medication(
    start: NaiveDateTime,
    frequency: MedicationFrequency,
    duration: Option<SeriesDuration>,
) -> ScheduleResult<Vec<NaiveDateTime>> {
    let duration = require_duration(duration)?;
    if duration.unit != DurationUnit::Days {
        return Err(invalid("medication duration must be given in days"));
    }
    let total_hours = duration
        .value
        .checked_mul(24)
        .ok_or_else(|| invalid("duration is too long"))?;
    medication_timestamps(start, frequency.hours(), total_hours)
}

/// `floor(total_hours / frequency_hours)` doses, `frequency_hours` apart.
fn medication_timestamps(
    start: NaiveDateTime,
    frequency_hours: u32,
    total_hours: i64,
) -> ScheduleResult<Vec<NaiveDateTime>> {
    let count = total_hours / i64::from(frequency_hours);
    if count <= 0 {
        return Err(ScheduleError::EmptySeries);
    }
    let count = check_len(count)?;
    (0..count)
        .map(|i| advance_by_hours(start, frequency_hours, i as u32).map_err(ScheduleError::from))
        .collect()
}

fn plan_bath(
    start: NaiveDateTime,
    frequency: BathFrequency,
    duration: Option<SeriesDuration>,
    weekdays: &[String],
) -> ScheduleResult<Vec<NaiveDateTime>> {
    let duration = require_duration(duration)?;
    let total_weeks = match duration.unit {
        DurationUnit::Weeks => duration.value,
        DurationUnit::Months => duration
            .value
            .checked_mul(WEEKS_PER_MONTH)
            .ok_or_else(|| invalid("duration is too long"))?,
        DurationUnit::Days => {
            return Err(invalid("bath duration must be given in weeks or months"))
        }
    };

    match frequency {
        BathFrequency::OncePerWeek => weekly_timestamps(start, total_weeks),
        BathFrequency::TwicePerWeek | BathFrequency::ThricePerWeek => {
            if weekdays.is_empty() {
                return Err(invalid(format!(
                    "{} baths per week need selected weekdays",
                    frequency.per_week()
                )));
            }
            let mut selected = weekdays
                .iter()
                .map(|name| weekday_index(name))
                .collect::<Result<Vec<u32>, _>>()?;
            selected.sort_unstable();
            selected.dedup();

            let target = total_weeks
                .checked_mul(i64::from(frequency.per_week()))
                .ok_or_else(|| invalid("duration is too long"))?;
            selected_weekday_timestamps(start, &selected, target)
        }
    }
}

/// One occurrence every 7 calendar days.
fn weekly_timestamps(start: NaiveDateTime, total_weeks: i64) -> ScheduleResult<Vec<NaiveDateTime>> {
    if total_weeks <= 0 {
        return Err(ScheduleError::EmptySeries);
    }
    let count = check_len(total_weeks)?;
    (0..count)
        .map(|i| advance_by_weeks(start, i as i64).map_err(ScheduleError::from))
        .collect()
}

/// The first `target` days on or after `start` whose weekday is in `selected`.
///
/// Jumps straight to the next matching weekday instead of stepping one day
/// at a time. The walk gives up after `target * 8` days.
fn selected_weekday_timestamps(
    start: NaiveDateTime,
    selected: &[u32],
    target: i64,
) -> ScheduleResult<Vec<NaiveDateTime>> {
    if target <= 0 {
        return Err(ScheduleError::EmptySeries);
    }
    let target = check_len(target)?;
    let scan_limit = target as i64 * SCAN_DAYS_PER_OCCURRENCE;

    let mut timestamps = Vec::with_capacity(target);
    let mut offset: i64 = 0;
    while timestamps.len() < target {
        let current = advance_by_days(start, offset)?;
        let skip = days_until_next(weekday_of(current.date()), selected)
            .ok_or_else(|| invalid("no weekdays selected"))?;
        offset += i64::from(skip);
        if offset >= scan_limit {
            return Err(invalid(format!(
                "weekday walk exceeded {} days",
                scan_limit
            )));
        }
        timestamps.push(advance_by_days(start, offset)?);
        offset += 1;
    }
    Ok(timestamps)
}

fn require_duration(duration: Option<SeriesDuration>) -> ScheduleResult<SeriesDuration> {
    let duration = duration.ok_or_else(|| invalid("missing duration"))?;
    if duration.value <= 0 {
        return Err(invalid(format!(
            "duration must be positive, got {}",
            duration.value
        )));
    }
    Ok(duration)
}

fn check_len(count: i64) -> ScheduleResult<usize> {
    match usize::try_from(count) {
        Ok(n) if n <= MAX_SERIES_LEN => Ok(n),
        _ => Err(invalid(format!(
            "series of {} occurrences exceeds the limit of {}",
            count, MAX_SERIES_LEN
        ))),
    }
}

fn append_marker(notes: &str, marker: &str) -> String {
    if notes.is_empty() {
        marker.to_string()
    } else {
        format!("{}\n{}", notes, marker)
    }
}

fn recurrence_name(recurrence: &Recurrence) -> &'static str {
    match recurrence {
        Recurrence::None => "no",
        Recurrence::Medication { .. } => "medication",
        Recurrence::Bath { .. } => "bath",
    }
}

fn invalid(reason: impl Into<String>) -> ScheduleError {
    ScheduleError::InvalidRecurrence(reason.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::{Catalog, Language};
    use crate::models::PetRef;
    use crate::schedule::CalendarError;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn request(kind: AppointmentType, recurrence: Recurrence) -> AppointmentRequest {
        AppointmentRequest {
            pet: PetRef {
                id: "pet-1".into(),
                name: "Luna".into(),
                photo_url: "file://luna.jpg".into(),
            },
            kind,
            start: at(2024, 1, 1, 8),
            notes: "With food".into(),
            recurrence,
        }
    }

    fn expander() -> SeriesExpander<Catalog> {
        SeriesExpander::new(Catalog::new(Language::En))
    }

    #[test]
    fn test_empty_medication_series() {
        // Half a day of a once-daily medication yields nothing
        let result = medication_timestamps(at(2024, 1, 1, 8), 24, 12);
        assert_eq!(result, Err(ScheduleError::EmptySeries));
    }

    #[test]
    fn test_medication_requires_days() {
        let req = request(
            AppointmentType::TreatmentMedication,
            Recurrence::Medication {
                frequency: MedicationFrequency::Every12Hours,
                duration: Some(SeriesDuration::weeks(1)),
            },
        );
        assert!(matches!(
            expander().expand(&req),
            Err(ScheduleError::InvalidRecurrence(_))
        ));
    }

    #[test]
    fn test_missing_and_non_positive_duration() {
        for duration in [None, Some(SeriesDuration::days(0)), Some(SeriesDuration::days(-2))] {
            let req = request(
                AppointmentType::TreatmentMedication,
                Recurrence::Medication {
                    frequency: MedicationFrequency::Every24Hours,
                    duration,
                },
            );
            assert!(matches!(
                expander().expand(&req),
                Err(ScheduleError::InvalidRecurrence(_))
            ));
        }
    }

    #[test]
    fn test_mismatched_type_is_rejected() {
        let req = request(
            AppointmentType::Grooming,
            Recurrence::Medication {
                frequency: MedicationFrequency::Every24Hours,
                duration: Some(SeriesDuration::days(3)),
            },
        );
        let err = expander().expand(&req).unwrap_err();
        assert!(err.to_string().contains("medication"));
    }

    #[test]
    fn test_no_recurrence_is_rejected() {
        let req = request(AppointmentType::TreatmentMedication, Recurrence::None);
        assert!(matches!(
            expander().expand(&req),
            Err(ScheduleError::InvalidRecurrence(_))
        ));
    }

    #[test]
    fn test_bath_months_count_four_weeks() {
        let req = request(
            AppointmentType::TherapeuticBath,
            Recurrence::Bath {
                frequency: BathFrequency::OncePerWeek,
                duration: Some(SeriesDuration::months(2)),
                weekdays: vec![],
            },
        );
        let drafts = expander().expand(&req).unwrap();
        assert_eq!(drafts.len(), 8);
        assert_eq!(drafts[7].scheduled_at, at(2024, 2, 19, 8));
    }

    #[test]
    fn test_bath_in_days_is_rejected() {
        let req = request(
            AppointmentType::TherapeuticBath,
            Recurrence::Bath {
                frequency: BathFrequency::OncePerWeek,
                duration: Some(SeriesDuration::days(14)),
                weekdays: vec![],
            },
        );
        assert!(matches!(
            expander().expand(&req),
            Err(ScheduleError::InvalidRecurrence(_))
        ));
    }

    #[test]
    fn test_unknown_weekday() {
        let req = request(
            AppointmentType::TherapeuticBath,
            Recurrence::Bath {
                frequency: BathFrequency::TwicePerWeek,
                duration: Some(SeriesDuration::weeks(1)),
                weekdays: vec!["monday".into(), "caturday".into()],
            },
        );
        assert_eq!(
            expander().expand(&req),
            Err(ScheduleError::Calendar(CalendarError::InvalidWeekday(
                "caturday".into()
            )))
        );
    }

    #[test]
    fn test_single_weekday_for_three_baths_walks_further() {
        // Only Mondays selected for 3x/week: 3 occurrences land on 3 consecutive Mondays
        let timestamps = selected_weekday_timestamps(at(2024, 1, 3, 8), &[1], 3).unwrap();
        assert_eq!(
            timestamps,
            vec![at(2024, 1, 8, 8), at(2024, 1, 15, 8), at(2024, 1, 22, 8)]
        );
    }

    #[test]
    fn test_series_too_long() {
        let req = request(
            AppointmentType::TreatmentMedication,
            Recurrence::Medication {
                frequency: MedicationFrequency::Every6Hours,
                duration: Some(SeriesDuration::days(10_000)),
            },
        );
        assert!(matches!(
            expander().expand(&req),
            Err(ScheduleError::InvalidRecurrence(_))
        ));
    }

    #[test]
    fn test_marker_on_empty_notes() {
        let mut req = request(
            AppointmentType::TreatmentMedication,
            Recurrence::Medication {
                frequency: MedicationFrequency::Every12Hours,
                duration: Some(SeriesDuration::days(1)),
            },
        );
        req.notes = String::new();
        let drafts = SeriesExpander::new(Catalog::new(Language::Pt))
            .expand(&req)
            .unwrap();
        assert_eq!(drafts[0].notes, "");
        assert_eq!(drafts[1].notes, "(Última dose)");
    }

    #[test]
    fn test_drafts_share_series_fields() {
        let req = request(
            AppointmentType::TreatmentMedication,
            Recurrence::Medication {
                frequency: MedicationFrequency::Every8Hours,
                duration: Some(SeriesDuration::days(2)),
            },
        );
        let drafts = expander().expand(&req).unwrap();
        let series_id = drafts[0].series_id.clone();
        assert!(series_id.is_some());
        for draft in &drafts {
            assert_eq!(draft.series_id, series_id);
            assert_eq!(draft.pet_id, "pet-1");
            assert_eq!(draft.pet_photo_url, "file://luna.jpg");
            assert_eq!(draft.recurrence, req.recurrence);
        }

        // A second expansion is a different series
        let again = expander().expand(&req).unwrap();
        assert_ne!(again[0].series_id, series_id);
    }
}
