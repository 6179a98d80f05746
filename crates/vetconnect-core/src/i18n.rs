//! Translation lookup for the few phrases the core emits itself.

use serde::{Deserialize, Serialize};

/// Key for the marker appended to the last medication dose.
pub const LAST_DOSE_KEY: &str = "lastDose";
/// Key for the marker appended to the last therapeutic bath.
pub const LAST_BATH_KEY: &str = "lastBath";
/// Voice text for the day-before reminder (`{pet}`, `{type}` placeholders).
pub const VOICE_ALERT_DAY_KEY: &str = "voiceAlertDay";
/// Voice text for the hour-before reminder (`{pet}`, `{type}` placeholders).
pub const VOICE_ALERT_HOUR_KEY: &str = "voiceAlertHour";

/// Resolves a translation key to text in the active language.
pub trait Translator {
    fn translate(&self, key: &str) -> String;
}

/// Supported UI languages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Pt,
}

impl Language {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_lowercase().as_str() {
            "en" => Some(Language::En),
            "pt" => Some(Language::Pt),
            _ => None,
        }
    }
}

const EN: &[(&str, &str)] = &[
    (LAST_DOSE_KEY, "Last dose"),
    (LAST_BATH_KEY, "Last bath"),
    (VOICE_ALERT_DAY_KEY, "One day left for {pet}'s {type}."),
    (VOICE_ALERT_HOUR_KEY, "One hour left for {pet}'s {type}."),
    ("consultation", "Consultation"),
    ("surgery", "Surgery"),
    ("grooming", "Grooming"),
    ("others", "Others"),
];

const PT: &[(&str, &str)] = &[
    (LAST_DOSE_KEY, "Última dose"),
    (LAST_BATH_KEY, "Último banho"),
    (VOICE_ALERT_DAY_KEY, "Falta um dia para {type} de {pet}."),
    (VOICE_ALERT_HOUR_KEY, "Falta uma hora para {type} de {pet}."),
    ("consultation", "Consulta"),
    ("surgery", "Cirurgia"),
    ("vaccination", "Vacinação"),
    ("application", "Aplicação"),
    ("grooming", "Banho e tosquia"),
    ("controlanalysis", "Análise de Controle"),
    ("dentaltreatment", "Tratamento Dentário"),
    ("imagingexam", "Exame de Imagem"),
    ("followup", "Fisioterapia"),
    ("treatmentmedication", "Medicação"),
    ("therapeuticbath", "Banho Terapêutico"),
    ("chemotherapy", "Quimioterapia"),
    ("others", "Acupuntura"),
];

/// Built-in phrase table.
#[derive(Debug, Clone, Copy, Default)]
pub struct Catalog {
    language: Language,
}

impl Catalog {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    fn lookup(&self, key: &str) -> Option<&'static str> {
        let table = match self.language {
            Language::En => EN,
            Language::Pt => PT,
        };
        table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }
}

impl Translator for Catalog {
    /// Falls back to English, then to the key itself.
    fn translate(&self, key: &str) -> String {
        self.lookup(key)
            .or_else(|| Catalog::new(Language::En).lookup(key))
            .unwrap_or(key)
            .to_string()
    }
}

impl<T: Translator + ?Sized> Translator for &T {
    fn translate(&self, key: &str) -> String {
        (**self).translate(key)
    }
}
