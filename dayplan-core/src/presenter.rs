//! Derives render-ready events from the store's records.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::warn;

use crate::model::{Category, DEFAULT_COLOR, EventId, EventRecord};
use crate::time::{Timestamp, parse_timestamp};

pub const UNTITLED: &str = "Untitled Event";

/// An event with parsed times and every display fallback resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub id: Option<EventId>,
    pub title: String,
    pub start: Timestamp,
    pub end: Timestamp,
    pub category: Category,
    pub color: String,
}

impl CalendarEvent {
    /// `"09:00 - Standup"`, as shown inside a calendar cell.
    pub fn label(&self) -> String {
        format!("{} - {}", self.start.format("%H:%M"), self.title)
    }

    /// `"09:00 - 09:30"`
    pub fn time_range(&self) -> String {
        format!("{} - {}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }

    /// `"Jun 10, 2024"`
    pub fn date_line(&self) -> String {
        self.start.format("%b %-d, %Y").to_string()
    }

    /// `"9:00 am - 9:30 am"`
    pub fn clock_range(&self) -> String {
        format!(
            "{} - {}",
            self.start.format("%-I:%M %P"),
            self.end.format("%-I:%M %P")
        )
    }
}

/// Explicit color, then the category's color, then gray.
pub fn resolve_color(color: Option<&str>, category: Option<Category>) -> String {
    if let Some(color) = color.map(str::trim).filter(|c| !c.is_empty()) {
        return color.to_string();
    }
    category
        .map(|c| c.color())
        .unwrap_or(DEFAULT_COLOR)
        .to_string()
}

pub fn resolve_title(title: Option<&str>) -> String {
    match title.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => UNTITLED.to_string(),
    }
}

/// Present one record. Records whose start or end cannot be parsed are
/// logged and yield `None`.
pub fn present_event(record: &EventRecord) -> Option<CalendarEvent> {
    let (Some(start), Some(end)) = (parse_timestamp(&record.start), parse_timestamp(&record.end))
    else {
        warn!(
            id = record.id.as_ref().map(EventId::as_str),
            start = %record.start,
            end = %record.end,
            "skipping event with invalid dates"
        );
        return None;
    };

    Some(CalendarEvent {
        id: record.id.clone(),
        title: resolve_title(record.title.as_deref()),
        start,
        end,
        category: record.category.unwrap_or_default(),
        color: resolve_color(record.color.as_deref(), record.category),
    })
}

/// Present every displayable record, in source order.
pub fn present(records: &[EventRecord]) -> Vec<CalendarEvent> {
    records.iter().filter_map(present_event).collect()
}

/// Events of one calendar day, ordered by start.
#[derive(Debug, Clone, PartialEq)]
pub struct AgendaDay {
    pub date: NaiveDate,
    pub events: Vec<CalendarEvent>,
}

/// Group presented events by the day they start on.
pub fn present_agenda(records: &[EventRecord]) -> Vec<AgendaDay> {
    let mut days: BTreeMap<NaiveDate, Vec<CalendarEvent>> = BTreeMap::new();
    for event in present(records) {
        days.entry(event.start.date()).or_default().push(event);
    }

    days.into_iter()
        .map(|(date, mut events)| {
            events.sort_by_key(|e| e.start);
            AgendaDay { date, events }
        })
        .collect()
}
