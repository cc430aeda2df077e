use anyhow::Result;
use dayplan_core::DayplanClient;
use dayplan_core::api::Backend;
use dayplan_core::presenter::present_agenda;
use owo_colors::OwoColorize;

use crate::render::Render;
use crate::utils::tui::with_spinner;

pub async fn run<B: Backend>(client: &DayplanClient<B>) -> Result<()> {
    let records = with_spinner("Loading events", client.events().fetch()).await?;
    let agenda = present_agenda(&records);

    if agenda.is_empty() {
        println!("{}", "No events found".dimmed());
        return Ok(());
    }

    let days: Vec<String> = agenda.iter().map(Render::render).collect();
    println!("{}", days.join("\n\n"));

    let hidden = records.len() - agenda.iter().map(|d| d.events.len()).sum::<usize>();
    if hidden > 0 {
        println!(
            "\n{}",
            format!("{hidden} event(s) with invalid dates not shown").yellow()
        );
    }

    Ok(())
}
