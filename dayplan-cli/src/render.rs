//! Terminal rendering for dayplan types.
//!
//! Extension traits that add colored output to dayplan-core types using
//! owo_colors.

use chrono::{Local, NaiveDate};
use dayplan_core::presenter::{AgendaDay, CalendarEvent};
use dayplan_core::{Goal, Task};
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

/// Parse `#rrggbb` into its channels.
fn hex_rgb(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// A dot in the event's color, or a plain one if the color isn't hex.
fn swatch(color: &str) -> String {
    match hex_rgb(color) {
        Some((r, g, b)) => "●".truecolor(r, g, b).to_string(),
        None => "●".to_string(),
    }
}

/// "Today", "Tomorrow", or e.g. "Wed Feb 25".
pub fn day_label(date: NaiveDate) -> String {
    let today = Local::now().date_naive();
    match (date - today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        _ => date.format("%a %b %-d, %Y").to_string(),
    }
}

impl Render for CalendarEvent {
    fn render(&self) -> String {
        let id = self
            .id
            .as_ref()
            .map(|id| format!("[{id}]"))
            .unwrap_or_else(|| "[no id]".to_string());

        format!(
            "{} {} {} {} {}",
            swatch(&self.color),
            self.time_range(),
            self.title,
            self.category.dimmed(),
            id.dimmed()
        )
    }
}

impl Render for AgendaDay {
    fn render(&self) -> String {
        let mut lines = vec![day_label(self.date).bold().to_string()];
        lines.extend(self.events.iter().map(|e| format!("  {}", e.render())));
        lines.join("\n")
    }
}

impl Render for Goal {
    fn render(&self) -> String {
        let name = if self.name.is_empty() {
            "(unnamed)"
        } else {
            &self.name
        };
        format!("{} {}", name, format!("[{}]", self.id).dimmed())
    }
}

impl Render for Task {
    fn render(&self) -> String {
        format!("  - {}", self.name)
    }
}

/// Confirmation line for a saved event, e.g. the sidebar's date and time.
pub fn render_saved(verb: &str, event: &CalendarEvent) -> String {
    format!(
        "{} {} {}",
        format!("{verb}:").green(),
        event.title,
        format!("{} {}", event.date_line(), event.clock_range()).dimmed()
    )
}
