use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use rand::{Rng, distributions::Alphanumeric, thread_rng};
use serde::{Deserialize, Serialize};

const ID_LEN: usize = 8;

pub const MAX_MOOD_INDEX: u8 = 9;
pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringEvent {
    pub id: String,
    /// Month-day key in `MM-DD` form; the event recurs every year.
    pub month_day: String,
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub date: NaiveDate,
    pub mood: Option<u8>,
    pub rating: Option<u8>,
    pub sleep_hours: Option<f32>,
    pub spend: Option<f64>,
    pub note: Option<String>,
    pub long_note: Option<String>,
    #[serde(default)]
    pub shopping: Vec<String>,
    #[serde(default)]
    pub habits: Vec<String>,
}

impl LogRecord {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            mood: None,
            rating: None,
            sleep_hours: None,
            spend: None,
            note: None,
            long_note: None,
            shopping: Vec::new(),
            habits: Vec::new(),
        }
    }

    pub fn short_note(&self) -> Option<&str> {
        self.note.as_deref().map(str::trim).filter(|note| !note.is_empty())
    }

    pub fn has_shopping(&self) -> bool {
        self.shopping.iter().any(|item| !item.trim().is_empty())
    }
}

/// Fields to merge into a day's record; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default)]
pub struct LogPatch {
    pub mood: Option<u8>,
    pub rating: Option<u8>,
    pub sleep_hours: Option<f32>,
    pub spend: Option<f64>,
    pub note: Option<String>,
    pub long_note: Option<String>,
    pub shopping: Option<Vec<String>>,
    pub habits: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalHeader {
    pub schema_version: u32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub events: Vec<RecurringEvent>,
}

impl JournalHeader {
    pub fn new() -> Self {
        Self {
            schema_version: 1,
            created_at: chrono::Utc::now(),
            events: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Journal {
    pub header: JournalHeader,
    pub logs: BTreeMap<NaiveDate, LogRecord>,
}

impl Journal {
    pub fn new() -> Self {
        Self {
            header: JournalHeader::new(),
            logs: BTreeMap::new(),
        }
    }

    pub fn log_for(&self, day: NaiveDate) -> Option<&LogRecord> {
        self.logs.get(&day)
    }

    pub fn upsert_log(&mut self, day: NaiveDate, patch: LogPatch) -> Result<&LogRecord, String> {
        if let Some(mood) = patch.mood {
            if mood > MAX_MOOD_INDEX {
                return Err(format!("mood index must be 0-{MAX_MOOD_INDEX}, got {mood}"));
            }
        }
        if let Some(rating) = patch.rating {
            if !(MIN_RATING..=MAX_RATING).contains(&rating) {
                return Err(format!("rating must be {MIN_RATING}-{MAX_RATING}, got {rating}"));
            }
        }
        if let Some(sleep) = patch.sleep_hours {
            if !(0.0..=24.0).contains(&sleep) {
                return Err(format!("sleep hours must be 0-24, got {sleep}"));
            }
        }
        if let Some(spend) = patch.spend {
            if spend < 0.0 {
                return Err(format!("spend cannot be negative, got {spend}"));
            }
        }

        let record = self.logs.entry(day).or_insert_with(|| LogRecord::new(day));
        if patch.mood.is_some() {
            record.mood = patch.mood;
        }
        if patch.rating.is_some() {
            record.rating = patch.rating;
        }
        if patch.sleep_hours.is_some() {
            record.sleep_hours = patch.sleep_hours;
        }
        if patch.spend.is_some() {
            record.spend = patch.spend;
        }
        if patch.note.is_some() {
            record.note = patch.note;
        }
        if patch.long_note.is_some() {
            record.long_note = patch.long_note;
        }
        if let Some(shopping) = patch.shopping {
            record.shopping = shopping;
        }
        if let Some(habits) = patch.habits {
            record.habits = habits;
        }

        Ok(record)
    }

    pub fn add_event(
        &mut self,
        month_day: &str,
        title: String,
        description: Option<String>,
    ) -> Result<String, String> {
        let month_day = normalize_month_day(month_day)?;
        if title.trim().is_empty() {
            return Err("event title is required".to_string());
        }

        let id = generate_id();
        self.header.events.push(RecurringEvent {
            id: id.clone(),
            month_day,
            title,
            description,
        });
        Ok(id)
    }

    pub fn events_for_month_day(&self, month_day: &str) -> Vec<&RecurringEvent> {
        self.header
            .events
            .iter()
            .filter(|event| event.month_day == month_day)
            .collect()
    }

    /// Sum of recorded spend over the Monday-start week containing `day`.
    pub fn week_spend(&self, day: NaiveDate) -> f64 {
        let week_start = start_of_week(day);
        (0..7)
            .filter_map(|offset| self.logs.get(&(week_start + Duration::days(offset))))
            .filter_map(|record| record.spend)
            .sum()
    }

    pub fn logged_days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.logs.keys().copied()
    }
}

pub fn month_day_key(day: NaiveDate) -> String {
    day.format("%m-%d").to_string()
}

pub fn normalize_month_day(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    let (month_text, day_text) = trimmed
        .split_once('-')
        .ok_or_else(|| format!("invalid month-day '{trimmed}', expected MM-DD"))?;
    let month = month_text
        .parse::<u32>()
        .map_err(|_| format!("invalid month in '{trimmed}'"))?;
    let day = day_text
        .parse::<u32>()
        .map_err(|_| format!("invalid day in '{trimmed}'"))?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return Err(format!("month-day '{trimmed}' is out of range"));
    }
    Ok(format!("{month:02}-{day:02}"))
}

pub fn start_of_week(day: NaiveDate) -> NaiveDate {
    let days_from_monday = day.weekday().number_from_monday() as i64 - 1;
    day - Duration::days(days_from_monday)
}

pub fn generate_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LEN)
        .map(char::from)
        .collect()
}

pub fn format_spend(amount: f64) -> String {
    format!("{amount:.2}")
}

pub const MOOD_LABELS: [&str; 10] = [
    "awful", "low", "down", "meh", "okay", "fine", "good", "great", "excellent", "radiant",
];

pub fn mood_label(mood: u8) -> &'static str {
    MOOD_LABELS.get(mood as usize).copied().unwrap_or("unknown")
}
