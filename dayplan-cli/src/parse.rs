//! Parsing of user-typed dates, times and categories.

use anyhow::{Result, anyhow, bail};
use chrono::{NaiveDate, NaiveDateTime};
use dayplan_core::Category;
use dayplan_core::time::parse_timestamp;

/// Expand abbreviations fuzzydate doesn't know, e.g. "fri" or "sept".
fn expand_abbreviations(input: &str) -> String {
    const ABBREVIATIONS: &[(&str, &str)] = &[
        ("mon", "monday"),
        ("tue", "tuesday"),
        ("tues", "tuesday"),
        ("wed", "wednesday"),
        ("thu", "thursday"),
        ("thur", "thursday"),
        ("thurs", "thursday"),
        ("fri", "friday"),
        ("sat", "saturday"),
        ("sun", "sunday"),
        ("jan", "january"),
        ("feb", "february"),
        ("mar", "march"),
        ("apr", "april"),
        ("jun", "june"),
        ("jul", "july"),
        ("aug", "august"),
        ("sep", "september"),
        ("sept", "september"),
        ("oct", "october"),
        ("nov", "november"),
        ("dec", "december"),
    ];

    input
        .to_lowercase()
        .split_whitespace()
        .map(|word| {
            ABBREVIATIONS
                .iter()
                .find(|(abbr, _)| *abbr == word)
                .map_or(word, |(_, full)| *full)
                .to_string()
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// A calendar day: ISO `YYYY-MM-DD` or natural language ("tomorrow").
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d") {
        return Ok(date);
    }

    fuzzydate::parse(&expand_abbreviations(input))
        .map(|dt| dt.date())
        .map_err(|_| anyhow!("Could not parse date: \"{}\"", input))
}

/// A date and time: ISO 8601 or natural language ("fri 3pm").
pub fn parse_datetime(input: &str) -> Result<NaiveDateTime> {
    if let Some(ts) = parse_timestamp(input) {
        return Ok(ts);
    }

    fuzzydate::parse(&expand_abbreviations(input))
        .map_err(|_| anyhow!("Could not parse date/time: \"{}\"", input))
}

/// A category name. Unlike the lenient wire decoding, a typo here is an error.
pub fn parse_category(input: &str) -> Result<Category> {
    let category = Category::parse(input);
    if category == Category::Default {
        let names: Vec<_> = Category::SELECTABLE.iter().map(Category::as_str).collect();
        bail!(
            "Unknown category \"{}\". Choose one of: {}",
            input,
            names.join(", ")
        );
    }
    Ok(category)
}
