pub mod extractors;

use chrono::NaiveDate;

use crate::models::{ConversationContext, MissingField, ParsedAppointmentRequest, UserInfo};

use self::extractors::{
    extract_class_type, extract_date, extract_email, extract_name, extract_phone,
    extract_stated_name, extract_time, DATE_KEYWORDS,
};

/// Any of these as a substring of the lower-cased message counts as a wish to book.
pub const INTENT_KEYWORDS: &[&str] = &[
    "agendar",
    "marcar",
    "agendamento",
    "aula",
    "experimental",
    "teste",
    "avaliação",
    "quero",
    "gostaria",
    "preciso",
    "vou",
    "vamos",
    "reservar",
    "agende",
    "marque",
    "experimentar",
    "conhecer",
    "começar",
    "iniciar",
    "treinar",
    "academia",
    "musculação",
];

pub const DEFAULT_TIME: &str = "09:00";
pub const DEFAULT_CLASS_TYPE: &str = "Musculação";

const BASE_CONFIDENCE: f64 = 0.4;
const NAME_WEIGHT: f64 = 0.2;
const DATE_WEIGHT: f64 = 0.3;
const TIME_WEIGHT: f64 = 0.2;
const CLASS_TYPE_WEIGHT: f64 = 0.2;

pub fn has_appointment_intent(message: &str) -> bool {
    let lower = message.to_lowercase();
    INTENT_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

pub fn parse(message: &str, context: Option<&ConversationContext>) -> ParsedAppointmentRequest {
    parse_on(message, context, chrono::Local::now().date_naive())
}

pub fn parse_on(
    message: &str,
    context: Option<&ConversationContext>,
    today: NaiveDate,
) -> ParsedAppointmentRequest {
    if !has_appointment_intent(message) {
        return ParsedAppointmentRequest::no_intent();
    }
    extract_on(message, context, today)
}

/// Runs every slot extractor regardless of intent keywords. Used for
/// follow-up turns of a booking already in progress.
pub fn extract_on(
    message: &str,
    context: Option<&ConversationContext>,
    today: NaiveDate,
) -> ParsedAppointmentRequest {
    let lower = message.to_lowercase();
    let has_intent = has_appointment_intent(message);
    let mut confidence = if has_intent { BASE_CONFIDENCE } else { 0.0 };

    let known_name = context.and_then(|c| c.known_name()).map(str::to_string);
    let name = match known_name {
        Some(name) => Some(name),
        None => {
            let found = extract_name(message);
            if found.is_some() {
                confidence += NAME_WEIGHT;
            }
            found
        }
    };

    let date = extract_date(&lower, today);
    if date.is_some() {
        confidence += DATE_WEIGHT;
    }

    let (time, time_is_default) = match extract_time(&lower) {
        Some(time) => (time, false),
        None => (DEFAULT_TIME.to_string(), true),
    };
    // The fallback is scored like a match.
    confidence += TIME_WEIGHT;

    let (class_type, class_type_is_default) = match extract_class_type(&lower) {
        Some(class_type) => {
            confidence += CLASS_TYPE_WEIGHT;
            (class_type, false)
        }
        None => (DEFAULT_CLASS_TYPE.to_string(), true),
    };

    let mut missing_info = Vec::new();
    if name.is_none() {
        missing_info.push(MissingField::Name);
    }
    if date.is_none() {
        missing_info.push(MissingField::Date);
    }

    ParsedAppointmentRequest {
        has_appointment_intent: has_intent,
        name,
        date,
        time: Some(time),
        class_type: Some(class_type),
        confidence,
        missing_info,
        time_is_default,
        class_type_is_default,
    }
}

pub fn extract_user_info(message: &str) -> UserInfo {
    let stated = extract_stated_name(message);
    UserInfo {
        name_is_stated: stated.is_some(),
        name: stated.or_else(|| extract_name(message)),
        phone: extract_phone(message),
        email: extract_email(message),
    }
}

pub fn mentions_slot(message: &str) -> bool {
    let lower = message.to_lowercase();
    DATE_KEYWORDS.iter().any(|(keyword, _)| lower.contains(keyword))
        || extract_time(&lower).is_some()
}
