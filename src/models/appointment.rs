use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub class_type: String,
    pub scheduled_date: NaiveDate,
    /// "HH:MM"
    pub scheduled_time: String,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Everything the chat collects before a booking can be written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppointment {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub class_type: String,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    /// Statuses that hold a slot.
    pub const ACTIVE: [AppointmentStatus; 2] =
        [AppointmentStatus::Pending, AppointmentStatus::Confirmed];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "PENDING",
            AppointmentStatus::Confirmed => "CONFIRMED",
            AppointmentStatus::Cancelled => "CANCELLED",
            AppointmentStatus::Completed => "COMPLETED",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "CONFIRMED" => AppointmentStatus::Confirmed,
            "CANCELLED" => AppointmentStatus::Cancelled,
            "COMPLETED" => AppointmentStatus::Completed,
            _ => AppointmentStatus::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!(AppointmentStatus::parse("confirmed"), AppointmentStatus::Confirmed);
        assert_eq!(AppointmentStatus::parse("CANCELLED"), AppointmentStatus::Cancelled);
        assert_eq!(AppointmentStatus::parse("whatever"), AppointmentStatus::Pending);
    }
}
