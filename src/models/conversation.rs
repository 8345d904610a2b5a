use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::request::ParsedAppointmentRequest;

/// Where a session stands in the booking dialogue.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DialogueState {
    #[default]
    Idle,
    AwaitingName,
    AwaitingDate,
    AwaitingTime,
    SlotTaken,
    AwaitingPhone,
    AwaitingEmail,
    Submitting,
}

impl DialogueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogueState::Idle => "idle",
            DialogueState::AwaitingName => "awaiting_name",
            DialogueState::AwaitingDate => "awaiting_date",
            DialogueState::AwaitingTime => "awaiting_time",
            DialogueState::SlotTaken => "slot_taken",
            DialogueState::AwaitingPhone => "awaiting_phone",
            DialogueState::AwaitingEmail => "awaiting_email",
            DialogueState::Submitting => "submitting",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "awaiting_name" => DialogueState::AwaitingName,
            "awaiting_date" => DialogueState::AwaitingDate,
            "awaiting_time" => DialogueState::AwaitingTime,
            "slot_taken" => DialogueState::SlotTaken,
            "awaiting_phone" => DialogueState::AwaitingPhone,
            "awaiting_email" => DialogueState::AwaitingEmail,
            "submitting" => DialogueState::Submitting,
            _ => DialogueState::Idle,
        }
    }

    pub fn is_idle(&self) -> bool {
        *self == DialogueState::Idle
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserInfo {
    pub name: Option<String>,
    /// Set when the name came from "meu nome é", "eu sou" or "chamo" rather
    /// than a looser "pra X" / "sou X" match.
    #[serde(default)]
    pub name_is_stated: bool,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl UserInfo {
    /// Fills fields that are still unknown. Known fields are never replaced,
    /// except that a stated name supersedes a guessed one.
    pub fn absorb(&mut self, other: UserInfo) {
        let upgrades_guess = other.name_is_stated && !self.name_is_stated;
        if other.name.is_some() && (self.name.is_none() || upgrades_guess) {
            self.name = other.name;
            self.name_is_stated = other.name_is_stated;
        }
        if self.phone.is_none() {
            self.phone = other.phone;
        }
        if self.email.is_none() {
            self.email = other.email;
        }
    }
}

/// The booking draft carried between turns.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppointmentIntent {
    pub class_type: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub confidence: f64,
    #[serde(default)]
    pub time_is_default: bool,
    #[serde(default)]
    pub class_type_is_default: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationContext {
    pub session_id: String,
    pub user_info: UserInfo,
    pub appointment_intent: Option<AppointmentIntent>,
    pub state: DialogueState,
    pub last_activity: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

impl ConversationContext {
    pub fn new(session_id: &str, now: NaiveDateTime, ttl: chrono::Duration) -> Self {
        Self {
            session_id: session_id.to_string(),
            user_info: UserInfo::default(),
            appointment_intent: None,
            state: DialogueState::Idle,
            last_activity: now,
            expires_at: now + ttl,
        }
    }

    pub fn known_name(&self) -> Option<&str> {
        self.user_info.name.as_deref()
    }

    /// Folds one parsed message into the draft.
    ///
    /// The user's name is first-wins. Date and explicit time/class values
    /// replace earlier ones so the user can correct a slot; parser defaults
    /// only fill blanks or other defaults.
    pub fn absorb(&mut self, parsed: &ParsedAppointmentRequest) {
        if self.user_info.name.is_none() {
            self.user_info.name = parsed.name.clone();
        }

        let draft = self.appointment_intent.get_or_insert_with(Default::default);

        if parsed.date.is_some() {
            draft.date = parsed.date;
        }

        if let Some(time) = &parsed.time {
            if !parsed.time_is_default || draft.time.is_none() || draft.time_is_default {
                draft.time = Some(time.clone());
                draft.time_is_default = parsed.time_is_default;
            }
        }

        if let Some(class_type) = &parsed.class_type {
            if !parsed.class_type_is_default
                || draft.class_type.is_none()
                || draft.class_type_is_default
            {
                draft.class_type = Some(class_type.clone());
                draft.class_type_is_default = parsed.class_type_is_default;
            }
        }

        if parsed.confidence > draft.confidence {
            draft.confidence = parsed.confidence;
        }
    }

    /// Drops the booking draft but keeps what we know about the user.
    pub fn reset_booking(&mut self) {
        self.appointment_intent = None;
        self.state = DialogueState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MissingField;

    fn ctx() -> ConversationContext {
        let now = chrono::Utc::now().naive_utc();
        ConversationContext::new("s1", now, chrono::Duration::minutes(30))
    }

    fn parsed(time: &str, time_is_default: bool) -> ParsedAppointmentRequest {
        ParsedAppointmentRequest {
            has_appointment_intent: true,
            name: None,
            date: None,
            time: Some(time.to_string()),
            class_type: Some("Musculação".to_string()),
            confidence: 0.6,
            missing_info: vec![MissingField::Name, MissingField::Date],
            time_is_default,
            class_type_is_default: true,
        }
    }

    #[test]
    fn test_user_info_is_first_wins() {
        let mut info = UserInfo {
            name: Some("Carlos".to_string()),
            ..Default::default()
        };
        info.absorb(UserInfo {
            name: Some("Outro".to_string()),
            phone: Some("85999990000".to_string()),
            ..Default::default()
        });
        assert_eq!(info.name.as_deref(), Some("Carlos"));
        assert_eq!(info.phone.as_deref(), Some("85999990000"));
    }

    #[test]
    fn test_stated_name_replaces_guessed_name_once() {
        let mut info = UserInfo {
            name: Some("sábado às".to_string()),
            ..Default::default()
        };
        info.absorb(UserInfo {
            name: Some("Carlos".to_string()),
            name_is_stated: true,
            ..Default::default()
        });
        assert_eq!(info.name.as_deref(), Some("Carlos"));
        assert!(info.name_is_stated);

        info.absorb(UserInfo {
            name: Some("Pedro".to_string()),
            name_is_stated: true,
            ..Default::default()
        });
        info.absorb(UserInfo {
            name: Some("amanhã".to_string()),
            ..Default::default()
        });
        assert_eq!(info.name.as_deref(), Some("Carlos"));
    }

    #[test]
    fn test_explicit_time_replaces_default() {
        let mut c = ctx();
        c.absorb(&parsed("09:00", true));
        c.absorb(&parsed("14:00", false));
        let draft = c.appointment_intent.unwrap();
        assert_eq!(draft.time.as_deref(), Some("14:00"));
        assert!(!draft.time_is_default);
    }

    #[test]
    fn test_default_time_does_not_replace_explicit() {
        let mut c = ctx();
        c.absorb(&parsed("14:00", false));
        c.absorb(&parsed("09:00", true));
        assert_eq!(c.appointment_intent.unwrap().time.as_deref(), Some("14:00"));
    }

    #[test]
    fn test_reset_keeps_user_info() {
        let mut c = ctx();
        c.user_info.name = Some("Ana".to_string());
        c.absorb(&parsed("10:00", false));
        c.state = DialogueState::AwaitingPhone;
        c.reset_booking();
        assert!(c.appointment_intent.is_none());
        assert!(c.state.is_idle());
        assert_eq!(c.known_name(), Some("Ana"));
    }

    #[test]
    fn test_state_round_trips_through_str() {
        for state in [
            DialogueState::Idle,
            DialogueState::AwaitingName,
            DialogueState::SlotTaken,
            DialogueState::Submitting,
        ] {
            assert_eq!(DialogueState::parse(state.as_str()), state);
        }
    }
}
