use anyhow::Result;
use dayplan_core::DayplanClient;
use dayplan_core::api::Backend;
use dayplan_core::controller::Slot;
use dayplan_core::presenter::present_event;
use dayplan_core::time::combine;
use dialoguer::Input;

use crate::parse::{parse_category, parse_date};
use crate::render::render_saved;
use crate::utils::tui::with_spinner;

pub async fn run<B: Backend>(
    client: &DayplanClient<B>,
    date: &str,
    start: &str,
    end: &str,
    title: Option<String>,
    category: Option<String>,
) -> Result<()> {
    let day = parse_date(date)?;
    let slot = Slot {
        start: combine(day, start)?,
        end: combine(day, end)?,
    };

    let title = match title {
        Some(t) => t,
        None => Input::<String>::new()
            .with_prompt("  Title")
            .allow_empty(true)
            .interact_text()?,
    };
    let category = category.as_deref().map(parse_category).transpose()?;

    let mut controller = client.controller();
    let modal = controller.select_slot(slot);
    modal.form.title = title;
    if let Some(category) = category {
        modal.form.category = category;
    }

    let record = with_spinner("Adding event", controller.submit()).await?;
    if let Some(event) = present_event(&record) {
        println!("{}", render_saved("Added", &event));
    }

    Ok(())
}
