pub mod bookmarks;
pub mod checklists;
pub mod habits;
pub mod journal;
pub mod meetings;
pub mod password;
pub mod rename;
pub mod retro;
pub mod scaffold;
pub mod tasks;
pub mod time;
pub mod today;

use std::path::{Path, PathBuf};

use anyhow::Result;
use bookmarks::{process_bookmarks_command, BookmarksCommand};
use checklists::{process_checklists_command, ChecklistsCommand};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use habits::{process_habits_command, HabitsCommand};
use journal::{process_journal_command, JournalCommand};
use meetings::{process_meetings_command, MeetingsCommand};
use password::{process_password_command, PasswordCommand};
use rename::{process_rename_command, RenameCommand};
use retro::{process_retro_command, RetroCommand};
use scaffold::{process_scaffold_command, ScaffoldCommand};
use tasks::{process_tasks_command, TasksCommand};
use time::{process_time_command, TimeCommand};
use today::process_today_command;
use tracing::{debug, level_filters::LevelFilter};

use crate::{
    error::TrackerError,
    storage::document_store::JsonDocumentStore,
    utils::{
        clock::{self, Clock, DefaultClock},
        dir::{default_application_path, ensure_dir},
        logging::{enable_logging, CLI_PREFIX},
        time::{parse_day, DateStyle},
    },
};

const DATA_DIR: &str = "data";
const LOGS_DIR: &str = "logs";

#[derive(Parser, Debug)]
#[command(name = "daybook", version, long_about = None)]
#[command(about = "Habits, tasks, time and notes tracking from the terminal", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(
        long,
        global = true,
        env = "DAYBOOK_DIR",
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(long, global = true, help = "Print logs to stderr")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Log level (error, warn, info, debug, trace). Defaults to RUST_LOG or info"
    )]
    log_filter: Option<LevelFilter>,
    #[arg(long, global = true, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Daily habits and streaks", visible_alias = "habit")]
    Habits {
        #[command(subcommand)]
        command: HabitsCommand,
    },
    #[command(about = "To-do list", visible_alias = "todo")]
    Tasks {
        #[command(subcommand)]
        command: TasksCommand,
    },
    #[command(about = "Timers and time log per project")]
    Time {
        #[command(subcommand)]
        command: TimeCommand,
    },
    #[command(about = "Dated journal entries with mood and tags")]
    Journal {
        #[command(subcommand)]
        command: JournalCommand,
    },
    #[command(about = "Tagged bookmarks", visible_alias = "bm")]
    Bookmarks {
        #[command(subcommand)]
        command: BookmarksCommand,
    },
    #[command(about = "Meeting notes and action items", visible_alias = "meeting")]
    Meetings {
        #[command(subcommand)]
        command: MeetingsCommand,
    },
    #[command(about = "Retrospectives")]
    Retro {
        #[command(subcommand)]
        command: RetroCommand,
    },
    #[command(about = "Reusable checklists", visible_alias = "checklist")]
    Checklists {
        #[command(subcommand)]
        command: ChecklistsCommand,
    },
    #[command(about = "Password and passphrase generation", visible_alias = "pw")]
    Password {
        #[command(subcommand)]
        command: PasswordCommand,
    },
    #[command(about = "Rename files of a directory by rules")]
    Rename {
        #[command(flatten)]
        command: RenameCommand,
    },
    #[command(about = "Create a project skeleton")]
    Scaffold {
        #[command(flatten)]
        command: ScaffoldCommand,
    },
    #[command(about = "Overview of the day: habits, tasks, timer and open action items")]
    Today,
}

/// Everything a command needs besides its own arguments.
pub struct Context {
    pub store: JsonDocumentStore,
    pub clock: Box<dyn Clock>,
    pub date_style: DateStyle,
}

impl Context {
    pub fn new(app_dir: &Path, clock: Box<dyn Clock>, date_style: DateStyle) -> Result<Self> {
        let store = JsonDocumentStore::new(ensure_dir(app_dir.join(DATA_DIR))?)?;
        Ok(Self {
            store,
            clock,
            date_style,
        })
    }

    pub fn today(&self) -> NaiveDate {
        clock::today(self.clock.as_ref())
    }

    pub fn now_utc(&self) -> DateTime<Utc> {
        self.clock.now().with_timezone(&Utc)
    }

    /// Parses a user given day, missing means today.
    pub fn day_or_today(&self, input: Option<&str>) -> Result<NaiveDate, TrackerError> {
        match input {
            Some(v) => self.parse_day(v),
            None => Ok(self.today()),
        }
    }

    pub fn parse_day(&self, input: &str) -> Result<NaiveDate, TrackerError> {
        parse_day(input, self.date_style, self.clock.now())
    }
}

/// Value parser for names of habits and checklists, which are stored without surrounding
/// whitespace.
fn trimmed(input: &str) -> Result<String, String> {
    Ok(input.trim().to_string())
}

/// Joins words of a multi word positional argument.
fn join_words(words: &[String]) -> String {
    words.join(" ")
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = match args.dir {
        Some(v) => v,
        None => default_application_path()?,
    };
    let log_dir = ensure_dir(app_dir.join(LOGS_DIR))?;
    enable_logging(CLI_PREFIX, &log_dir, args.log_filter, args.log)?;
    debug!("Using application directory {app_dir:?}");

    let context = Context::new(&app_dir, Box::new(DefaultClock), args.date_style)?;
    execute(args.commands, &context).await
}

async fn execute(commands: Commands, context: &Context) -> Result<()> {
    match commands {
        Commands::Habits { command } => process_habits_command(command, context).await,
        Commands::Tasks { command } => process_tasks_command(command, context).await,
        Commands::Time { command } => process_time_command(command, context).await,
        Commands::Journal { command } => process_journal_command(command, context).await,
        Commands::Bookmarks { command } => process_bookmarks_command(command, context).await,
        Commands::Meetings { command } => process_meetings_command(command, context).await,
        Commands::Retro { command } => process_retro_command(command, context).await,
        Commands::Checklists { command } => process_checklists_command(command, context).await,
        Commands::Password { command } => process_password_command(command),
        Commands::Rename { command } => process_rename_command(command).await,
        Commands::Scaffold { command } => process_scaffold_command(command).await,
        Commands::Today => process_today_command(context).await,
    }
}
