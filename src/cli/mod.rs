pub mod calendar;
pub mod dates;
pub mod days;
pub mod output;
pub mod session;

use std::path::PathBuf;

use anyhow::Result;
use calendar::{process_calendar_command, CalendarCommand};
use clap::{Parser, Subcommand};
use dates::DateStyle;
use days::{process_days_command, process_set_minutes, process_status, process_toggle};
use session::{process_session_command, SessionCommand};
use tracing::level_filters::LevelFilter;

use crate::{
    storage::{day_store::DayStore, key_value::StorageBackend},
    timer::session::SessionLength,
    utils::clock::DefaultClock,
};

pub type Store = DayStore<StorageBackend>;

#[derive(Parser, Debug)]
#[command(name = "medit-streak", version, long_about = None)]
#[command(about = "Meditation timer that keeps track of your daily streak", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default uses $XDG_STATE_HOME or $HOME/.local/state"
    )]
    pub dir: Option<PathBuf>,
    #[arg(long = "log-filter", global = true, help = "Log level, overrides RUST_LOG")]
    pub log: Option<LevelFilter>,
    /// This option is for debugging purposes only.
    #[arg(long = "log-console", global = true)]
    pub log_console: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Show the current streak and this month's progress")]
    Status,
    #[command(about = "Show a month with its completed days")]
    Calendar {
        #[command(flatten)]
        command: CalendarCommand,
    },
    #[command(about = "List every recorded day")]
    Days {
        #[arg(long, help = "Print the records as json")]
        json: bool,
    },
    #[command(about = "Run a meditation timer. Finishing it marks today as done")]
    Session {
        #[command(flatten)]
        command: SessionCommand,
    },
    #[command(about = "Flip whether a day counts as done")]
    Toggle {
        #[arg(help = "Day to change. YYYY-MM-DD or expressions like \"yesterday\". Defaults to today")]
        day: Option<String>,
        #[arg(long, help = "Minutes recorded when the day had no record yet. Defaults to 10")]
        minutes: Option<SessionLength>,
        #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing")]
        date_style: DateStyle,
    },
    #[command(about = "Change the minutes recorded for a day")]
    SetMinutes {
        #[arg(help = "Session length in minutes, at least 1")]
        minutes: SessionLength,
        #[arg(long, help = "Day to change. YYYY-MM-DD or expressions like \"yesterday\". Defaults to today")]
        day: Option<String>,
        #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing")]
        date_style: DateStyle,
    },
}

/// Runs the parsed command. `app_dir` is where records are kept, [None] when no usable directory
/// was found, in which case nothing is persisted.
pub async fn run_cli(args: Args, app_dir: Option<PathBuf>) -> Result<()> {
    let store = DayStore::new(StorageBackend::open(app_dir), Box::new(DefaultClock));

    match args.commands {
        Commands::Status => process_status(&store).await,
        Commands::Calendar { command } => process_calendar_command(command, &store).await,
        Commands::Days { json } => process_days_command(&store, json).await,
        Commands::Session { command } => process_session_command(command, &store).await,
        Commands::Toggle {
            day,
            minutes,
            date_style,
        } => {
            process_toggle(
                &store,
                day.as_deref(),
                minutes.unwrap_or_default(),
                date_style,
            )
            .await
        }
        Commands::SetMinutes {
            minutes,
            day,
            date_style,
        } => process_set_minutes(&store, day.as_deref(), minutes, date_style).await,
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::{Args, Commands};

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_minutes_are_clamped_at_parse_time() {
        let args = Args::try_parse_from(["medit-streak", "set-minutes", "0"]).unwrap();
        let Commands::SetMinutes { minutes, .. } = args.commands else {
            panic!("Expected set-minutes");
        };
        assert_eq!(minutes.minutes(), 1);
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let args =
            Args::try_parse_from(["medit-streak", "status", "--dir", "/tmp/x", "--log-console"])
                .unwrap();
        assert_eq!(args.dir.as_deref(), Some(std::path::Path::new("/tmp/x")));
        assert!(args.log_console);
    }
}
