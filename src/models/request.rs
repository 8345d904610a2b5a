use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A slot the parser could not fill.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MissingField {
    #[serde(rename = "nome")]
    Name,
    #[serde(rename = "data")]
    Date,
    #[serde(rename = "horário")]
    Time,
}

impl MissingField {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissingField::Name => "nome",
            MissingField::Date => "data",
            MissingField::Time => "horário",
        }
    }
}

/// Structured reading of one chat message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedAppointmentRequest {
    pub has_appointment_intent: bool,
    pub name: Option<String>,
    pub date: Option<NaiveDate>,
    /// "HH:MM"
    pub time: Option<String>,
    pub class_type: Option<String>,
    /// Additive and uncapped; only meaningful for relative ranking.
    pub confidence: f64,
    pub missing_info: Vec<MissingField>,
    /// The time came from the 09:00 fallback, not from the message.
    pub time_is_default: bool,
    /// The class type came from the "Musculação" fallback.
    pub class_type_is_default: bool,
}

impl ParsedAppointmentRequest {
    pub fn no_intent() -> Self {
        Self {
            has_appointment_intent: false,
            name: None,
            date: None,
            time: None,
            class_type: None,
            confidence: 0.0,
            missing_info: Vec::new(),
            time_is_default: false,
            class_type_is_default: false,
        }
    }

    pub fn is_missing(&self, field: MissingField) -> bool {
        self.missing_info.contains(&field)
    }

    /// True when the message named a day or an explicit time.
    pub fn carries_slot(&self) -> bool {
        self.date.is_some() || (self.time.is_some() && !self.time_is_default)
    }
}
