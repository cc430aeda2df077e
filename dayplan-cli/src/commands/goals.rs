use anyhow::Result;
use dayplan_core::DayplanClient;
use dayplan_core::api::Backend;
use owo_colors::OwoColorize;

use crate::render::Render;
use crate::utils::tui::with_spinner;

pub async fn run<B: Backend>(client: &DayplanClient<B>) -> Result<()> {
    let goals = with_spinner("Loading goals", client.goals().fetch_goals()).await?;

    if goals.is_empty() {
        println!("{}", "No goals yet".dimmed());
        return Ok(());
    }

    println!("{}", "Goals".bold());
    for goal in &goals {
        println!("  {}", goal.render());
    }
    Ok(())
}
