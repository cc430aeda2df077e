mod commands;
mod parse;
mod render;
mod utils;

use std::io::IsTerminal;

use anyhow::{Result, anyhow};
use clap::{ArgAction, Parser, Subcommand};
use dayplan_core::{ClientConfig, DayplanClient};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dayplan")]
#[command(about = "Plan your day: events, goals and tasks from the dayplan backend")]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Less log output (-q warn, -qq error)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    quiet: u8,

    /// Backend base URL (overrides config and DAYPLAN_API_BASE_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show all events grouped by day
    Events,
    /// Add an event in a time slot
    Add {
        /// Day of the event (e.g. "2024-06-10", "tomorrow", "next fri")
        #[arg(short, long)]
        date: String,

        /// Start time (HH:mm)
        #[arg(short, long)]
        start: String,

        /// End time (HH:mm). Earlier than start means the next day
        #[arg(short, long)]
        end: String,

        #[arg(short, long)]
        title: Option<String>,

        /// One of exercise, eating, work, relax, family, social
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Change an existing event
    Edit {
        id: String,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        category: Option<String>,

        /// New start time (HH:mm), same day
        #[arg(short, long)]
        start: Option<String>,

        /// New end time (HH:mm)
        #[arg(short, long)]
        end: Option<String>,
    },
    /// Move an event to a new start and end
    Move {
        id: String,

        /// New start (e.g. "2024-06-11T09:00", "tomorrow 9am")
        #[arg(short, long)]
        start: String,

        #[arg(short, long)]
        end: String,
    },
    /// Change when an event ends
    Resize {
        id: String,

        #[arg(short, long)]
        end: String,
    },
    /// Delete an event
    Delete { id: String },
    /// List goals
    Goals,
    /// List the tasks of a goal
    Tasks { goal_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet)?;

    let client = connect(cli.api_url.as_deref())?;

    match cli.command {
        Commands::Events => commands::events::run(&client).await,
        Commands::Add {
            date,
            start,
            end,
            title,
            category,
        } => commands::add::run(&client, &date, &start, &end, title, category).await,
        Commands::Edit {
            id,
            title,
            category,
            start,
            end,
        } => commands::edit::run(&client, &id, title, category, start, end).await,
        Commands::Move { id, start, end } => {
            commands::reschedule::run_move(&client, &id, &start, &end).await
        }
        Commands::Resize { id, end } => commands::reschedule::run_resize(&client, &id, &end).await,
        Commands::Delete { id } => commands::delete::run(&client, &id).await,
        Commands::Goals => commands::goals::run(&client).await,
        Commands::Tasks { goal_id } => commands::tasks::run(&client, &goal_id).await,
    }
}

fn connect(api_url: Option<&str>) -> Result<DayplanClient<dayplan_core::api::HttpBackend>> {
    let mut config = ClientConfig::load()?;
    if let Some(url) = api_url {
        config = config.with_api_base_url(url)?;
    }
    debug!(api_base_url = %config.api_base_url, "connecting");

    Ok(DayplanClient::connect(config)?)
}

fn init_tracing(verbose: u8, quiet: u8) -> Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}
