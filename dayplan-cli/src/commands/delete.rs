use anyhow::Result;
use dayplan_core::DayplanClient;
use dayplan_core::api::Backend;
use owo_colors::OwoColorize;

use super::find_event;
use crate::utils::tui::with_spinner;

pub async fn run<B: Backend>(client: &DayplanClient<B>, id: &str) -> Result<()> {
    let event = find_event(client, id).await?;
    let title = event.title.clone();

    let mut controller = client.controller();
    controller.select_event(event);
    with_spinner("Deleting event", controller.delete()).await?;

    println!("{}", format!("Deleted: {title}").red());
    Ok(())
}
