use anyhow::Result;
use dayplan_core::api::Backend;
use dayplan_core::{DayplanClient, EntityId, Goal};
use owo_colors::OwoColorize;

use crate::render::Render;
use crate::utils::tui::with_spinner;

pub async fn run<B: Backend>(client: &DayplanClient<B>, goal_id: &str) -> Result<()> {
    let goals = client.goals();
    let known = with_spinner("Loading goals", goals.fetch_goals()).await?;

    let id = EntityId::from(goal_id);
    let goal = match known.into_iter().find(|g| g.id == id) {
        Some(goal) => goal,
        None => Goal {
            id,
            name: String::new(),
        },
    };

    with_spinner("Loading tasks", goals.select_goal(goal)).await?;

    let state = goals.snapshot();
    if let Some(heading) = state.tasks_heading() {
        println!("{}", heading.bold());
    }
    if state.tasks().is_empty() {
        println!("{}", "  No tasks".dimmed());
    }
    for task in state.tasks() {
        println!("{}", task.render());
    }
    Ok(())
}
