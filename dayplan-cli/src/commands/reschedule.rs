//! Drag and resize from the command line.

use anyhow::{Result, bail};
use dayplan_core::{DayplanClient, EventRecord};
use dayplan_core::api::Backend;
use dayplan_core::presenter::present_event;
use owo_colors::OwoColorize;

use super::find_event;
use crate::parse::parse_datetime;
use crate::render::render_saved;
use crate::utils::tui::with_spinner;

pub async fn run_move<B: Backend>(
    client: &DayplanClient<B>,
    id: &str,
    start: &str,
    end: &str,
) -> Result<()> {
    let start = parse_datetime(start)?;
    let end = parse_datetime(end)?;
    if end < start {
        bail!("End must not be before start");
    }

    let event = find_event(client, id).await?;
    let controller = client.controller();
    let result = with_spinner("Moving event", controller.drag(&event, start, end)).await?;
    report("Moved", result)
}

pub async fn run_resize<B: Backend>(client: &DayplanClient<B>, id: &str, end: &str) -> Result<()> {
    let end = parse_datetime(end)?;

    let event = find_event(client, id).await?;
    if end < event.start {
        bail!("End must not be before the event starts");
    }

    let controller = client.controller();
    let start = event.start;
    let result = with_spinner("Resizing event", controller.resize(&event, start, end)).await?;
    report("Resized", result)
}

fn report(verb: &str, result: Option<EventRecord>) -> Result<()> {
    match result.as_ref().and_then(present_event) {
        Some(event) => println!("{}", render_saved(verb, &event)),
        None => println!("{}", "Nothing changed".dimmed()),
    }
    Ok(())
}
