//! Appointment reminders.
//!
//! The shell polls [`due_alerts`] with the current local time, speaks each
//! alert's [`ReminderAlert::message`], and records delivery with
//! `Database::mark_reminder_sent` so the alert is not raised again.

use std::collections::HashSet;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::config::ReminderConfig;
use crate::i18n::{Translator, VOICE_ALERT_DAY_KEY, VOICE_ALERT_HOUR_KEY};
use crate::models::{Appointment, AppointmentType};

/// Day-before window, in seconds before the appointment: [23h59m, 24h].
const DAY_WINDOW_SECS: (i64, i64) = (1439 * 60, 1440 * 60);
/// Hour-before window, in seconds before the appointment: (0, 60m].
const HOUR_WINDOW_SECS: i64 = 60 * 60;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    DayBefore,
    HourBefore,
}

impl ReminderKind {
    /// Suffix used in alert ids.
    pub fn suffix(&self) -> &'static str {
        match self {
            ReminderKind::DayBefore => "24h",
            ReminderKind::HourBefore => "1h",
        }
    }

    fn lead_time(&self) -> Duration {
        match self {
            ReminderKind::DayBefore => Duration::hours(24),
            ReminderKind::HourBefore => Duration::hours(1),
        }
    }

    fn message_key(&self) -> &'static str {
        match self {
            ReminderKind::DayBefore => VOICE_ALERT_DAY_KEY,
            ReminderKind::HourBefore => VOICE_ALERT_HOUR_KEY,
        }
    }
}

/// A reminder ready to be shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderAlert {
    /// `"{appointment_id}-24h"` or `"{appointment_id}-1h"`
    pub id: String,
    pub appointment_id: String,
    pub kind: ReminderKind,
    /// Nominal alert time: the appointment time minus the lead time.
    pub trigger_at: NaiveDateTime,
}

impl ReminderAlert {
    fn new(appointment: &Appointment, kind: ReminderKind) -> Self {
        Self {
            id: format!("{}-{}", appointment.id, kind.suffix()),
            appointment_id: appointment.id.clone(),
            kind,
            trigger_at: appointment
                .scheduled_at
                .checked_sub_signed(kind.lead_time())
                .unwrap_or(appointment.scheduled_at),
        }
    }

    /// Spoken text, e.g. "One hour left for Rex's Surgery."
    pub fn message<T: Translator + ?Sized>(&self, translator: &T, appointment: &Appointment) -> String {
        translator
            .translate(self.kind.message_key())
            .replace("{pet}", &appointment.pet_name)
            .replace("{type}", &type_label(translator, appointment.kind))
    }
}

/// Localized type label, or the wire string when the catalog has none.
pub fn type_label<T: Translator + ?Sized>(translator: &T, kind: AppointmentType) -> String {
    let key = kind.translation_key();
    let label = translator.translate(&key);
    if label == key {
        kind.as_str().to_string()
    } else {
        label
    }
}

/// Alerts due at `now`, sorted by trigger time.
///
/// Only scheduled appointments produce alerts. An alert is skipped when the
/// appointment's id is in `dismissed` or the matching bookkeeping field is set.
pub fn due_alerts(
    appointments: &[Appointment],
    now: NaiveDateTime,
    dismissed: &HashSet<String>,
    config: &ReminderConfig,
) -> Vec<ReminderAlert> {
    let mut alerts = Vec::new();

    for appointment in appointments {
        if !appointment.is_scheduled() || dismissed.contains(&appointment.id) {
            continue;
        }
        let secs_until = (appointment.scheduled_at - now).num_seconds();

        let day_allowed = config.day_before
            && (config.day_before_for_medication
                || appointment.kind != AppointmentType::TreatmentMedication);
        if day_allowed
            && appointment.last_notified_day.is_none()
            && (DAY_WINDOW_SECS.0..=DAY_WINDOW_SECS.1).contains(&secs_until)
        {
            alerts.push(ReminderAlert::new(appointment, ReminderKind::DayBefore));
        }

        if config.hour_before
            && appointment.last_notified_hour.is_none()
            && secs_until > 0
            && secs_until <= HOUR_WINDOW_SECS
        {
            alerts.push(ReminderAlert::new(appointment, ReminderKind::HourBefore));
        }
    }

    alerts.sort_by(|a, b| a.trigger_at.cmp(&b.trigger_at).then_with(|| a.id.cmp(&b.id)));
    if !alerts.is_empty() {
        tracing::debug!(count = alerts.len(), "Reminders due");
    }
    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::{Catalog, Language};
    use crate::models::{AppointmentDraft, AppointmentStatus, Recurrence};
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 10)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn appointment(kind: AppointmentType, scheduled_at: NaiveDateTime) -> Appointment {
        Appointment::from_draft(AppointmentDraft {
            pet_id: "p1".into(),
            pet_name: "Rex".into(),
            pet_photo_url: String::new(),
            kind,
            scheduled_at,
            notes: String::new(),
            recurrence: Recurrence::None,
            series_id: None,
        })
    }

    #[test]
    fn test_hour_before_window() {
        let appt = appointment(AppointmentType::Surgery, at(10, 0));
        let config = ReminderConfig::default();
        let none = HashSet::new();

        assert!(due_alerts(&[appt.clone()], at(8, 59), &none, &config).is_empty());

        let alerts = due_alerts(&[appt.clone()], at(9, 30), &none, &config);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id, format!("{}-1h", appt.id));
        assert_eq!(alerts[0].trigger_at, at(9, 0));

        // at the appointment time it is no longer upcoming
        assert!(due_alerts(&[appt], at(10, 0), &none, &config).is_empty());
    }

    #[test]
    fn test_day_before_window() {
        let scheduled = at(10, 0) + Duration::days(1);
        let appt = appointment(AppointmentType::Vaccination, scheduled);
        let config = ReminderConfig::default();
        let none = HashSet::new();

        let alerts = due_alerts(&[appt.clone()], at(10, 0), &none, &config);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, ReminderKind::DayBefore);
        assert_eq!(alerts[0].id, format!("{}-24h", appt.id));

        assert_eq!(due_alerts(&[appt.clone()], at(10, 1), &none, &config).len(), 1);
        assert!(due_alerts(&[appt], at(10, 2), &none, &config).is_empty());
    }

    #[test]
    fn test_medication_skips_day_before() {
        let scheduled = at(10, 0) + Duration::days(1);
        let appt = appointment(AppointmentType::TreatmentMedication, scheduled);
        let none = HashSet::new();

        assert!(due_alerts(&[appt.clone()], at(10, 0), &none, &ReminderConfig::default()).is_empty());

        let config = ReminderConfig {
            day_before_for_medication: true,
            ..Default::default()
        };
        assert_eq!(due_alerts(&[appt], at(10, 0), &none, &config).len(), 1);
    }

    #[test]
    fn test_skips_dismissed_notified_and_closed() {
        let config = ReminderConfig::default();
        let now = at(9, 30);

        let dismissed_appt = appointment(AppointmentType::Surgery, at(10, 0));
        let mut notified = appointment(AppointmentType::Surgery, at(10, 0));
        notified.last_notified_hour = Some("2024-05-10T09:00:00Z".into());
        let mut completed = appointment(AppointmentType::Surgery, at(10, 0));
        completed.status = AppointmentStatus::Completed;

        let dismissed: HashSet<String> = [dismissed_appt.id.clone()].into_iter().collect();
        let alerts = due_alerts(&[dismissed_appt, notified, completed], now, &dismissed, &config);
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_sorted_by_trigger_time() {
        let config = ReminderConfig::default();
        let late = appointment(AppointmentType::Grooming, at(10, 45));
        let early = appointment(AppointmentType::Grooming, at(10, 15));

        let alerts = due_alerts(&[late.clone(), early.clone()], at(10, 0), &HashSet::new(), &config);
        let ids: Vec<&str> = alerts.iter().map(|a| a.appointment_id.as_str()).collect();
        assert_eq!(ids, vec![early.id.as_str(), late.id.as_str()]);
    }

    #[test]
    fn test_message_localized() {
        let appt = appointment(AppointmentType::Surgery, at(10, 0));
        let alert = ReminderAlert::new(&appt, ReminderKind::HourBefore);

        assert_eq!(
            alert.message(&Catalog::new(Language::En), &appt),
            "One hour left for Rex's Surgery."
        );
        assert_eq!(
            alert.message(&Catalog::new(Language::Pt), &appt),
            "Falta uma hora para Cirurgia de Rex."
        );
    }

    #[test]
    fn test_type_label_falls_back_to_wire_string() {
        let en = Catalog::new(Language::En);
        assert_eq!(type_label(&en, AppointmentType::ControlAnalysis), "Control Analysis");
        assert_eq!(type_label(&en, AppointmentType::Grooming), "Grooming");
    }
}
