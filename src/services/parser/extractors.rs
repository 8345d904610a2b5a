//! Single-purpose extractors over chat text.
//!
//! Each extractor is a pure function returning `None` when its pattern does
//! not apply. Ordered slices of them are combined with [`first_match`].

use std::sync::LazyLock;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use regex::Regex;

pub type Extractor<T> = fn(&str) -> Option<T>;

pub fn first_match<T>(strategies: &[Extractor<T>], text: &str) -> Option<T> {
    strategies.iter().find_map(|extract| extract(text))
}

// ── Name ──

static NAME_INTRO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:meu nome é|eu sou|chamo|nome) ([A-Za-zÀ-ÿ\s]+)").unwrap()
});

static NAME_FOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:pra|para) ([A-Za-zÀ-ÿ\s]+)(?:\s|$)").unwrap());

static NAME_SOU_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:sou) ([A-Za-zÀ-ÿ\s]+)(?:\s|$)").unwrap());

fn capture_name(re: &Regex, text: &str) -> Option<String> {
    let caps = re.captures(text)?;
    let name = caps.get(1)?.as_str().trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn name_intro(text: &str) -> Option<String> {
    capture_name(&NAME_INTRO_RE, text)
}

fn name_for(text: &str) -> Option<String> {
    capture_name(&NAME_FOR_RE, text)
}

fn name_sou(text: &str) -> Option<String> {
    capture_name(&NAME_SOU_RE, text)
}

/// "meu nome é X", "pra X", "sou X". The capture is greedy and may swallow
/// trailing words ("sou Ana e quero treinar").
pub const NAME_EXTRACTORS: [Extractor<String>; 3] = [name_intro, name_for, name_sou];

pub fn extract_name(text: &str) -> Option<String> {
    first_match(&NAME_EXTRACTORS, text)
}

// Only the explicit introduction counts as the user stating their name.
pub fn extract_stated_name(text: &str) -> Option<String> {
    name_intro(text)
}

// ── Date ──

#[derive(Debug, Clone, Copy)]
pub enum DateRule {
    DaysFromToday(i64),
    // next occurrence strictly after today, plus `weeks_ahead` weeks
    Weekday { day: Weekday, weeks_ahead: i64 },
}

impl DateRule {
    pub fn resolve(&self, today: NaiveDate) -> NaiveDate {
        match *self {
            DateRule::DaysFromToday(days) => today + Duration::days(days),
            DateRule::Weekday { day, weeks_ahead } => {
                let mut delta = day.num_days_from_sunday() as i64
                    - today.weekday().num_days_from_sunday() as i64;
                if delta <= 0 {
                    delta += 7;
                }
                today + Duration::days(delta + 7 * weeks_ahead)
            }
        }
    }
}

const fn weekday(day: Weekday) -> DateRule {
    DateRule::Weekday { day, weeks_ahead: 0 }
}

const fn following(day: Weekday) -> DateRule {
    DateRule::Weekday { day, weeks_ahead: 1 }
}

/// Checked in order against the lower-cased message. Qualified weekdays come
/// first because every one of them also contains the plain weekday name.
pub const DATE_KEYWORDS: &[(&str, DateRule)] = &[
    ("próxima segunda", following(Weekday::Mon)),
    ("próxima terça", following(Weekday::Tue)),
    ("próxima quarta", following(Weekday::Wed)),
    ("próxima quinta", following(Weekday::Thu)),
    ("próxima sexta", following(Weekday::Fri)),
    ("próximo sábado", following(Weekday::Sat)),
    ("próximo domingo", following(Weekday::Sun)),
    ("amanhã", DateRule::DaysFromToday(1)),
    ("hoje", DateRule::DaysFromToday(0)),
    ("segunda", weekday(Weekday::Mon)),
    ("terça", weekday(Weekday::Tue)),
    ("quarta", weekday(Weekday::Wed)),
    ("quinta", weekday(Weekday::Thu)),
    ("sexta", weekday(Weekday::Fri)),
    ("sábado", weekday(Weekday::Sat)),
    ("domingo", weekday(Weekday::Sun)),
];

pub fn extract_date(lower: &str, today: NaiveDate) -> Option<NaiveDate> {
    DATE_KEYWORDS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, rule)| rule.resolve(today))
}

// ── Time ──

static CLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})[h:](\d{2})?").unwrap());

static HOURS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})\s*h(?:oras?)?").unwrap());

static HOUR_OF_PERIOD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,2})\s*da\s*(?:manhã|manha|tardinha|tarde|noite)").unwrap()
});

static PERIOD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(manhã|manha|tardinha|tarde|noite|cedo)\b").unwrap());

// Word-bounded so "amanhã" does not read as "manhã".
static MORNING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bmanh[ãa]\b").unwrap());

static LATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:tardinha|tarde|noite)\b").unwrap());

fn hour_minute(hour: &str, minute: Option<&str>) -> Option<(u32, u32)> {
    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = match minute {
        Some(m) => m.parse().ok()?,
        None => 0,
    };
    (hour <= 23 && minute <= 59).then_some((hour, minute))
}

fn clock_time(lower: &str) -> Option<(u32, u32)> {
    let caps = CLOCK_RE.captures(lower)?;
    hour_minute(caps.get(1)?.as_str(), caps.get(2).map(|m| m.as_str()))
}

fn hours_time(lower: &str) -> Option<(u32, u32)> {
    let caps = HOURS_RE.captures(lower)?;
    hour_minute(caps.get(1)?.as_str(), None)
}

fn hour_of_period(lower: &str) -> Option<(u32, u32)> {
    let caps = HOUR_OF_PERIOD_RE.captures(lower)?;
    hour_minute(caps.get(1)?.as_str(), None)
}

pub const NUMERIC_TIME_EXTRACTORS: [Extractor<(u32, u32)>; 3] =
    [clock_time, hours_time, hour_of_period];

// A period word anywhere in the message settles 12-hour ambiguity.
pub fn adjust_for_period(hour: u32, lower: &str) -> u32 {
    if hour < 12 && LATE_RE.is_match(lower) {
        hour + 12
    } else if hour > 12 && MORNING_RE.is_match(lower) {
        hour - 12
    } else {
        hour
    }
}

pub fn period_default(lower: &str) -> Option<String> {
    let caps = PERIOD_RE.captures(lower)?;
    let time = match caps.get(1)?.as_str() {
        "manhã" | "manha" => "09:00",
        "tarde" => "14:00",
        "tardinha" => "16:00",
        "noite" => "19:00",
        "cedo" => "06:00",
        _ => return None,
    };
    Some(time.to_string())
}

pub fn extract_time(lower: &str) -> Option<String> {
    if let Some((hour, minute)) = first_match(&NUMERIC_TIME_EXTRACTORS, lower) {
        let hour = adjust_for_period(hour, lower);
        return Some(format!("{hour:02}:{minute:02}"));
    }
    period_default(lower)
}

// ── Class type ──

pub const CLASS_TYPES: &[&str] = &[
    "musculação",
    "crossfit",
    "spinning",
    "pilates",
    "yoga",
    "funcional",
    "dança",
    "jump",
    "zumba",
    "alongamento",
    "avaliação física",
    "personal",
    "treino funcional",
];

pub fn extract_class_type(lower: &str) -> Option<String> {
    CLASS_TYPES
        .iter()
        .find(|class_type| lower.contains(*class_type))
        .map(|class_type| capitalize(class_type))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ── Contact ──

static PHONE_LABELED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:telefone|celular|fone|whatsapp)[\s:]*(\(?\d{2}\)?\s?\d{4,5}-?\d{4})")
        .unwrap()
});

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\(?\d{2}\)?\s?\d{4,5}-?\d{4})").unwrap());

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,})").unwrap()
});

fn digits_of(re: &Regex, text: &str) -> Option<String> {
    let raw = re.captures(text)?.get(1)?.as_str();
    Some(raw.chars().filter(|c| c.is_ascii_digit()).collect())
}

fn labeled_phone(text: &str) -> Option<String> {
    digits_of(&PHONE_LABELED_RE, text)
}

fn bare_phone(text: &str) -> Option<String> {
    digits_of(&PHONE_RE, text)
}

pub const PHONE_EXTRACTORS: [Extractor<String>; 2] = [labeled_phone, bare_phone];

pub fn extract_phone(text: &str) -> Option<String> {
    first_match(&PHONE_EXTRACTORS, text)
}

pub fn extract_email(text: &str) -> Option<String> {
    EMAIL_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
}
