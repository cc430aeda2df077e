pub mod add;
pub mod delete;
pub mod edit;
pub mod events;
pub mod goals;
pub mod reschedule;
pub mod tasks;

use anyhow::{Result, anyhow};
use dayplan_core::api::Backend;
use dayplan_core::presenter::{CalendarEvent, present_event};
use dayplan_core::{DayplanClient, EventId};

use crate::utils::tui::with_spinner;

/// Load the events and pick out the one with identity `id`.
pub async fn find_event<B: Backend>(
    client: &DayplanClient<B>,
    id: &str,
) -> Result<CalendarEvent> {
    with_spinner("Loading events", client.events().fetch()).await?;
    let id = EventId::from(id);

    let record = client
        .events()
        .find(&id)
        .ok_or_else(|| anyhow!("No event with id \"{}\"", id))?;
    present_event(&record).ok_or_else(|| anyhow!("Event \"{}\" has invalid dates", id))
}
