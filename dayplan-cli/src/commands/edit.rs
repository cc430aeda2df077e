use anyhow::Result;
use dayplan_core::DayplanClient;
use dayplan_core::api::Backend;
use dayplan_core::presenter::present_event;

use super::find_event;
use crate::parse::parse_category;
use crate::render::render_saved;
use crate::utils::tui::with_spinner;

pub async fn run<B: Backend>(
    client: &DayplanClient<B>,
    id: &str,
    title: Option<String>,
    category: Option<String>,
    start: Option<String>,
    end: Option<String>,
) -> Result<()> {
    let event = find_event(client, id).await?;
    let category = category.as_deref().map(parse_category).transpose()?;

    let mut controller = client.controller();
    let modal = controller.select_event(event);
    if let Some(title) = title {
        modal.form.title = title;
    }
    if let Some(category) = category {
        modal.form.category = category;
    }
    if let Some(start) = start {
        modal.form.start_time = start;
    }
    if let Some(end) = end {
        modal.form.end_time = end;
    }

    let record = with_spinner("Saving event", controller.submit()).await?;
    if let Some(event) = present_event(&record) {
        println!("{}", render_saved("Updated", &event));
    }

    Ok(())
}
