use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::NaiveDate;

use crate::domain::{LogRecord, RecurringEvent};

pub const Z_DATE_STATE: i32 = 50;
pub const Z_EVENT: i32 = 40;
pub const Z_STATS: i32 = 20;
pub const Z_SHOPPING: i32 = 10;
pub const Z_NOTE: i32 = 5;

const MAX_INDICATOR_DOTS: usize = 3;

/// One unit of the dashboard stack. The payload carries everything a render
/// function needs so drawing never reaches back into the journal.
#[derive(Debug, Clone, PartialEq)]
pub enum CardKind {
    Prompt,
    Missed,
    Future,
    Event {
        title: String,
        description: Option<String>,
    },
    Stats {
        mood: Option<u8>,
        rating: Option<u8>,
        sleep_hours: Option<f32>,
        highlight: Option<String>,
        week_spend: f64,
    },
    Shopping {
        items: Vec<String>,
    },
    Note {
        text: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardCandidate {
    pub id: String,
    pub z_index: i32,
    pub kind: CardKind,
}

impl CardCandidate {
    fn new(id: impl Into<String>, z_index: i32, kind: CardKind) -> Self {
        Self {
            id: id.into(),
            z_index,
            kind,
        }
    }
}

/// Builds the full candidate stack for a selected day, ordered from highest
/// to lowest z-index. Pure: identical inputs always yield the identical list.
///
/// Exactly one of Prompt/Missed/Future can appear, chosen by the relation of
/// `selected_day` to `today`; Prompt and Missed additionally require the day
/// to have no record. A future day keeps its Future card even when a record
/// exists (records may be written ahead for planning).
///
/// `week_spend` is the host-computed weekly aggregate for the stats card; it
/// cannot be derived from the single record.
pub fn generate(
    selected_day: NaiveDate,
    today: NaiveDate,
    log: Option<&LogRecord>,
    events: &[&RecurringEvent],
    week_spend: f64,
) -> Vec<CardCandidate> {
    let mut cards = Vec::new();

    match selected_day.cmp(&today) {
        Ordering::Greater => {
            cards.push(CardCandidate::new("future", Z_DATE_STATE, CardKind::Future));
        }
        Ordering::Equal if log.is_none() => {
            cards.push(CardCandidate::new("prompt", Z_DATE_STATE, CardKind::Prompt));
        }
        Ordering::Less if log.is_none() => {
            cards.push(CardCandidate::new("missed", Z_DATE_STATE, CardKind::Missed));
        }
        _ => {}
    }

    for event in events {
        cards.push(CardCandidate::new(
            format!("event-{}", event.id),
            Z_EVENT,
            CardKind::Event {
                title: event.title.clone(),
                description: event.description.clone(),
            },
        ));
    }

    if let Some(record) = log {
        cards.push(CardCandidate::new(
            "stats",
            Z_STATS,
            CardKind::Stats {
                mood: record.mood,
                rating: record.rating,
                sleep_hours: record.sleep_hours,
                highlight: record
                    .long_note
                    .clone()
                    .or_else(|| record.short_note().map(str::to_string)),
                week_spend,
            },
        ));

        if record.has_shopping() {
            cards.push(CardCandidate::new(
                "shopping",
                Z_SHOPPING,
                CardKind::Shopping {
                    items: record.shopping.clone(),
                },
            ));
        }

        // Fallback note card. The days with no record are already covered by
        // Missed/Future, so this fires only when a short note exists.
        if let Some(note) = record.short_note() {
            cards.push(CardCandidate::new(
                "note",
                Z_NOTE,
                CardKind::Note {
                    text: note.to_string(),
                },
            ));
        }
    }

    cards
}

/// Card ids swiped away for one selected day. Switching the day always
/// starts from an empty set; nothing here is ever persisted.
#[derive(Debug, Clone)]
pub struct DismissedCards {
    day: NaiveDate,
    ids: HashSet<String>,
}

impl DismissedCards {
    pub fn new(day: NaiveDate) -> Self {
        Self {
            day,
            ids: HashSet::new(),
        }
    }

    pub fn add(&mut self, id: &str) {
        self.ids.insert(id.to_string());
    }

    pub fn has(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The one sanctioned clear path: moving to another day drops every
    /// dismissal recorded for the previous one.
    pub fn sync_day(&mut self, day: NaiveDate) {
        if self.day != day {
            self.day = day;
            self.ids.clear();
        }
    }
}

/// Drops dismissed candidates without disturbing the remaining order.
pub fn visible<'a>(cards: &'a [CardCandidate], dismissed: &DismissedCards) -> Vec<&'a CardCandidate> {
    cards.iter().filter(|card| !dismissed.has(&card.id)).collect()
}

/// Per-index visual transform for a card in the filtered stack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardTransform {
    pub scale: f32,
    pub translate_y: f32,
    pub rotate_deg: f32,
    pub opacity: f32,
}

pub fn card_transform(index: usize) -> CardTransform {
    let depth = index as f32;
    let rotate_deg = if index == 0 {
        0.0
    } else if index % 2 == 1 {
        3.0
    } else {
        -3.0
    };

    CardTransform {
        scale: (1.0 - 0.05 * depth).max(0.0),
        translate_y: 12.0 * depth,
        rotate_deg,
        opacity: (1.0 - 0.15 * depth).max(0.0),
    }
}

/// Dot count for the indicator under the top card: one per remaining card,
/// capped at three. A single visible card shows no indicator.
pub fn stack_indicator_dots(visible_count: usize) -> usize {
    if visible_count > 1 {
        (visible_count - 1).min(MAX_INDICATOR_DOTS)
    } else {
        0
    }
}

/// Lifecycle of the stack for one selected day. No terminal state: a date
/// change or a reset action always restarts the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackState {
    Unresolved,
    HasCandidates,
    Dismissing,
    Empty,
}

impl StackState {
    pub fn resolved(visible_count: usize) -> Self {
        if visible_count == 0 {
            StackState::Empty
        } else {
            StackState::HasCandidates
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};

    use crate::domain::{LogPatch, LogRecord, RecurringEvent};

    use super::{
        CardKind, DismissedCards, StackState, card_transform, generate, stack_indicator_dots,
        visible,
    };

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("test date should be valid")
    }

    fn record(date: NaiveDate, patch: LogPatch) -> LogRecord {
        let mut journal = crate::domain::Journal::new();
        journal
            .upsert_log(date, patch)
            .expect("record should be valid")
            .clone()
    }

    fn event(id: &str, title: &str) -> RecurringEvent {
        RecurringEvent {
            id: id.to_string(),
            month_day: "03-10".to_string(),
            title: title.to_string(),
            description: None,
        }
    }

    fn ids(cards: &[super::CardCandidate]) -> Vec<&str> {
        cards.iter().map(|card| card.id.as_str()).collect()
    }

    #[test]
    fn log_absent_days_yield_exactly_one_date_state_card() {
        let today = day(2026, 3, 10);
        for offset in -400..=400 {
            let selected = today + Duration::days(offset);
            let cards = generate(selected, today, None, &[], 0.0);
            let expected = match offset {
                0 => CardKind::Prompt,
                _ if offset < 0 => CardKind::Missed,
                _ => CardKind::Future,
            };
            assert_eq!(cards.len(), 1, "one card for offset {offset}");
            assert_eq!(cards[0].kind, expected, "kind for offset {offset}");
        }
    }

    #[test]
    fn generate_is_deterministic() {
        let today = day(2026, 3, 10);
        let selected = day(2026, 3, 9);
        let log = record(
            selected,
            LogPatch {
                mood: Some(4),
                note: Some("ran 5k".to_string()),
                shopping: Some(vec!["Milk".to_string()]),
                ..LogPatch::default()
            },
        );
        let events = [event("abc123", "Launch day")];
        let refs = events.iter().collect::<Vec<_>>();

        let first = generate(selected, today, Some(&log), &refs, 12.5);
        let second = generate(selected, today, Some(&log), &refs, 12.5);
        assert_eq!(first, second);
        assert_eq!(ids(&first), vec!["event-abc123", "stats", "shopping", "note"]);
    }

    #[test]
    fn z_order_is_descending() {
        let today = day(2026, 3, 10);
        let log = record(
            today,
            LogPatch {
                mood: Some(1),
                rating: Some(4),
                note: Some("quick note".to_string()),
                shopping: Some(vec!["Milk".to_string()]),
                ..LogPatch::default()
            },
        );
        let events = [event("e1", "Birthday")];
        let refs = events.iter().collect::<Vec<_>>();

        let cards = generate(today, today, Some(&log), &refs, 0.0);
        let z = cards.iter().map(|card| card.z_index).collect::<Vec<_>>();
        let mut sorted = z.clone();
        sorted.sort_by(|left, right| right.cmp(left));
        assert_eq!(z, sorted);
    }

    #[test]
    fn today_without_log_is_a_lone_prompt() {
        let today = day(2026, 3, 10);
        let cards = generate(today, today, None, &[], 0.0);
        assert_eq!(ids(&cards), vec!["prompt"]);

        let mut dismissed = DismissedCards::new(today);
        dismissed.add("prompt");
        assert!(visible(&cards, &dismissed).is_empty());
        assert_eq!(StackState::resolved(0), StackState::Empty);
    }

    #[test]
    fn missed_becomes_stats_once_logged() {
        let today = day(2026, 3, 10);
        let yesterday = day(2026, 3, 9);

        let before = generate(yesterday, today, None, &[], 0.0);
        assert_eq!(ids(&before), vec!["missed"]);

        let log = record(
            yesterday,
            LogPatch {
                mood: Some(5),
                ..LogPatch::default()
            },
        );
        let after = generate(yesterday, today, Some(&log), &[], 0.0);
        assert_eq!(ids(&after), vec!["stats"]);
    }

    #[test]
    fn future_day_always_carries_future_card() {
        let today = day(2026, 3, 10);
        let tomorrow = day(2026, 3, 11);

        let bare = generate(tomorrow, today, None, &[], 0.0);
        assert_eq!(ids(&bare), vec!["future"]);

        // Pre-planned record: Future stays on top of the stats.
        let log = record(
            tomorrow,
            LogPatch {
                shopping: Some(vec!["Cake".to_string()]),
                ..LogPatch::default()
            },
        );
        let planned = generate(tomorrow, today, Some(&log), &[], 0.0);
        assert_eq!(ids(&planned), vec!["future", "stats", "shopping"]);
    }

    #[test]
    fn stats_precede_shopping() {
        let today = day(2026, 3, 10);
        let log = record(
            today,
            LogPatch {
                mood: Some(1),
                rating: Some(4),
                shopping: Some(vec!["Milk".to_string()]),
                ..LogPatch::default()
            },
        );
        let cards = generate(today, today, Some(&log), &[], 0.0);
        assert_eq!(ids(&cards), vec!["stats", "shopping"]);
    }

    #[test]
    fn blank_shopping_items_emit_no_card() {
        let today = day(2026, 3, 10);
        let log = record(
            today,
            LogPatch {
                mood: Some(3),
                shopping: Some(vec!["  ".to_string(), String::new()]),
                ..LogPatch::default()
            },
        );
        let cards = generate(today, today, Some(&log), &[], 0.0);
        assert_eq!(ids(&cards), vec!["stats"]);
    }

    #[test]
    fn each_matching_event_emits_a_card() {
        let today = day(2026, 3, 10);
        let events = [event("a", "Birthday"), event("b", "Anniversary")];
        let refs = events.iter().collect::<Vec<_>>();
        let cards = generate(today, today, None, &refs, 0.0);
        assert_eq!(ids(&cards), vec!["prompt", "event-a", "event-b"]);
    }

    #[test]
    fn dismissal_preserves_remaining_order() {
        let today = day(2026, 3, 10);
        let log = record(
            today,
            LogPatch {
                mood: Some(2),
                note: Some("note".to_string()),
                shopping: Some(vec!["Milk".to_string()]),
                ..LogPatch::default()
            },
        );
        let events = [event("a", "Birthday")];
        let refs = events.iter().collect::<Vec<_>>();
        let cards = generate(today, today, Some(&log), &refs, 0.0);
        assert_eq!(ids_of(&visible(&cards, &DismissedCards::new(today))), vec![
            "event-a", "stats", "shopping", "note"
        ]);

        let mut dismissed = DismissedCards::new(today);
        dismissed.add("stats");
        assert_eq!(ids_of(&visible(&cards, &dismissed)), vec![
            "event-a", "shopping", "note"
        ]);
    }

    #[test]
    fn n_top_dismissals_reach_empty_exactly_on_the_nth() {
        let today = day(2026, 3, 10);
        let log = record(
            today,
            LogPatch {
                mood: Some(2),
                note: Some("note".to_string()),
                shopping: Some(vec!["Milk".to_string()]),
                ..LogPatch::default()
            },
        );
        let cards = generate(today, today, Some(&log), &[], 0.0);
        let total = cards.len();
        assert_eq!(total, 3);

        let mut dismissed = DismissedCards::new(today);
        for step in 1..=total {
            let remaining = visible(&cards, &dismissed);
            assert_eq!(StackState::resolved(remaining.len()), StackState::HasCandidates);
            dismissed.add(&remaining[0].id);
            let after = visible(&cards, &dismissed);
            if step == total {
                assert_eq!(StackState::resolved(after.len()), StackState::Empty);
            } else {
                assert_eq!(after.len(), total - step);
            }
        }
    }

    #[test]
    fn dismiss_is_idempotent_and_day_scoped() {
        let mut dismissed = DismissedCards::new(day(2026, 3, 10));
        dismissed.add("prompt");
        dismissed.add("prompt");
        assert!(dismissed.has("prompt"));

        dismissed.sync_day(day(2026, 3, 10));
        assert!(dismissed.has("prompt"), "same day keeps dismissals");

        dismissed.sync_day(day(2026, 3, 11));
        assert!(!dismissed.has("prompt"), "day change clears dismissals");

        dismissed.add("prompt");
        dismissed.sync_day(day(2026, 3, 11));
        assert!(dismissed.has("prompt"), "re-sync to the new day keeps dismissals");
    }

    #[test]
    fn transform_follows_stack_depth() {
        let top = card_transform(0);
        assert_eq!(top.scale, 1.0);
        assert_eq!(top.translate_y, 0.0);
        assert_eq!(top.rotate_deg, 0.0);
        assert_eq!(top.opacity, 1.0);

        let second = card_transform(1);
        assert!((second.scale - 0.95).abs() < 1e-6);
        assert_eq!(second.translate_y, 12.0);
        assert_eq!(second.rotate_deg, 3.0);
        assert!((second.opacity - 0.85).abs() < 1e-6);

        let third = card_transform(2);
        assert_eq!(third.rotate_deg, -3.0);
        assert_eq!(third.translate_y, 24.0);
    }

    #[test]
    fn indicator_caps_at_three_dots() {
        assert_eq!(stack_indicator_dots(0), 0);
        assert_eq!(stack_indicator_dots(1), 0);
        assert_eq!(stack_indicator_dots(2), 1);
        assert_eq!(stack_indicator_dots(4), 3);
        assert_eq!(stack_indicator_dots(9), 3);
    }

    fn ids_of<'a>(cards: &[&'a super::CardCandidate]) -> Vec<&'a str> {
        cards.iter().map(|card| card.id.as_str()).collect()
    }
}
