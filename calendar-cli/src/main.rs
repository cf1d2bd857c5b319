mod commands;
mod store;

use std::path::PathBuf;

use anyhow::Result;
use calendar_core::{
    RecurrenceKind,
    planner::Planner,
    query::DEFAULT_LIST_LIMIT,
    recurrence::{DEFAULT_HORIZON_MONTHS, DEFAULT_MAX_INSTANCES, ExpansionOptions},
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{commands::EventFields, store::JsonFileStore};

#[derive(Parser)]
#[command(name = "event-calendar")]
#[command(about = "Manage calendar events and catch overlapping bookings")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Event store file (defaults to the platform data directory)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// How many months ahead recurring events are expanded
    #[arg(long, global = true, default_value_t = DEFAULT_HORIZON_MONTHS)]
    horizon_months: u32,

    /// Maximum generated instances per recurring event
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_INSTANCES)]
    max_instances: usize,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an event, refusing it if it overlaps another one
    Add {
        #[command(flatten)]
        event: EventArgs,
    },

    /// Change fields of a stored event
    Edit {
        /// Id of the base event
        id: String,

        #[command(flatten)]
        event: EventArgs,
    },

    /// Move an event to another day, keeping its times
    Move {
        /// Id of the base event
        id: String,

        /// New date (YYYY-MM-DD)
        date: String,
    },

    /// Delete an event together with all of its repetitions
    Delete {
        /// Id of the base event
        id: String,
    },

    /// Report what a prospective event would overlap, without saving
    Check {
        #[command(flatten)]
        event: EventArgs,

        /// Leave this event and its repetitions out of the comparison
        #[arg(long)]
        exclude: Option<String>,
    },

    /// List events, including repetitions, in date order
    List {
        /// Match against title and description
        #[arg(short, long)]
        search: Option<String>,

        /// Only this category
        #[arg(short, long)]
        category: Option<String>,

        /// Only this day (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Events from today on
    Upcoming {
        #[arg(short, long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: usize,
    },

    /// Events before today, most recent first
    Past {
        #[arg(short, long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: usize,
    },

    /// Month overview with event counts per day
    Month {
        /// Month to show (YYYY-MM), defaults to the current month
        month: Option<String>,
    },

    /// Categories used by stored events
    Categories,
}

#[derive(Args)]
struct EventArgs {
    /// Event title
    #[arg(short, long)]
    title: Option<String>,

    /// Longer description
    #[arg(long)]
    description: Option<String>,

    /// Day of the event (YYYY-MM-DD)
    #[arg(short, long)]
    date: Option<String>,

    /// Start time (HH:MM)
    #[arg(short, long)]
    start: Option<String>,

    /// End time (HH:MM)
    #[arg(short, long)]
    end: Option<String>,

    /// Category (work, personal, health, social, other)
    #[arg(short, long)]
    category: Option<String>,

    /// Recurrence type
    #[arg(short, long, value_enum)]
    repeat: Option<RepeatArg>,

    /// Repeat every N days, weeks or months
    #[arg(short, long, allow_negative_numbers = true)]
    interval: Option<i64>,

    /// Weekdays for weekly repetition, 0 = Sunday (e.g. 1,3,5)
    #[arg(long, value_delimiter = ',')]
    days: Option<Vec<i64>>,

    /// Last day a repetition may fall on (YYYY-MM-DD, empty to clear)
    #[arg(short, long)]
    until: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum RepeatArg {
    None,
    Daily,
    Weekly,
    Monthly,
    Custom,
}

impl From<RepeatArg> for RecurrenceKind {
    fn from(value: RepeatArg) -> Self {
        match value {
            RepeatArg::None => RecurrenceKind::None,
            RepeatArg::Daily => RecurrenceKind::Daily,
            RepeatArg::Weekly => RecurrenceKind::Weekly,
            RepeatArg::Monthly => RecurrenceKind::Monthly,
            RepeatArg::Custom => RecurrenceKind::Custom,
        }
    }
}

impl From<EventArgs> for EventFields {
    fn from(args: EventArgs) -> Self {
        Self {
            title: args.title,
            description: args.description,
            date: args.date,
            start: args.start,
            end: args.end,
            category: args.category,
            repeat: args.repeat.map(Into::into),
            interval: args.interval,
            days: args.days,
            until: args.until,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set log level
    let log_level = if cli.verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("event_calendar={0},calendar_core={0}", log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store = match cli.store {
        Some(path) => JsonFileStore::new(path)?,
        None => JsonFileStore::with_default_path("event-calendar")?,
    };
    tracing::debug!("Using event store {}", store.path().display());

    let options = ExpansionOptions {
        horizon_months: cli.horizon_months,
        max_instances: cli.max_instances,
    };
    let planner = Planner::new(store, options);

    match cli.command {
        Commands::Add { event } => commands::add_command(&planner, event.into()).await,
        Commands::Edit { id, event } => commands::edit_command(&planner, id, event.into()).await,
        Commands::Move { id, date } => commands::move_command(&planner, id, date).await,
        Commands::Delete { id } => commands::delete_command(&planner, id).await,
        Commands::Check { event, exclude } => {
            commands::check_command(&planner, event.into(), exclude).await
        }
        Commands::List {
            search,
            category,
            date,
        } => commands::list_command(&planner, search, category, date).await,
        Commands::Upcoming { limit } => commands::upcoming_command(&planner, limit).await,
        Commands::Past { limit } => commands::past_command(&planner, limit).await,
        Commands::Month { month } => commands::month_command(&planner, month).await,
        Commands::Categories => commands::categories_command(&planner).await,
    }
}
