use std::fmt::Display;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Subcommand, ValueEnum};
use now::DateTimeNow;
use tracing::{info, warn};

use crate::{
    error::TrackerError,
    storage::{document_store::DocumentStore, record_log::RecordLog},
    tracker::timelog::{build_report, EntryFilter, TimeEntry, TimerDocument, TIME_LOG_FILE},
    utils::time::{format_minutes, parse_minutes, parse_time, week_start},
};

use super::{join_words, Context};

#[derive(Debug, Subcommand)]
pub enum TimeCommand {
    #[command(about = "Start a timer for a project")]
    Start {
        project: String,
        description: Vec<String>,
        #[arg(long, short, help = "Mark the time as billable")]
        billable: bool,
    },
    #[command(about = "Stop the running timer and log its time")]
    Stop,
    #[command(about = "Discard the running timer")]
    Cancel,
    #[command(about = "Show the running timer")]
    Status,
    #[command(about = "Log time manually. Duration is minutes or a form like 1h30m")]
    Log {
        project: String,
        duration: String,
        description: Vec<String>,
        #[arg(long, short, help = "Day of the work, today by default")]
        date: Option<String>,
        #[arg(long, short, help = "Time the work started, as HH:MM")]
        start: Option<String>,
        #[arg(long, short, help = "Mark the time as billable")]
        billable: bool,
    },
    #[command(about = "List logged time", visible_alias = "ls")]
    List {
        #[arg(long, help = "First day to include")]
        from: Option<String>,
        #[arg(long, help = "Last day to include")]
        to: Option<String>,
        #[arg(long, short, help = "Only entries of this project")]
        project: Option<String>,
    },
    #[command(about = "Totals per project")]
    Report {
        #[arg(long, default_value_t = Period::Week)]
        period: Period,
        #[arg(long, short, help = "Only entries of this project")]
        project: Option<String>,
    },
    #[command(about = "Remove a logged entry", visible_aliases = ["rm", "delete"])]
    Remove { id: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Period {
    Today,
    Week,
    Month,
    All,
}

impl Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Period::Today => write!(f, "today"),
            Period::Week => write!(f, "week"),
            Period::Month => write!(f, "month"),
            Period::All => write!(f, "all"),
        }
    }
}

impl Period {
    /// First day of the period containing `context`'s today. [None] means no lower bound.
    fn start(&self, context: &Context) -> Option<NaiveDate> {
        let today = context.today();
        match self {
            Period::Today => Some(today),
            Period::Week => Some(week_start(today)),
            Period::Month => Some(context.clock.now().beginning_of_month().date_naive()),
            Period::All => None,
        }
    }
}

fn print_entry(entry: &TimeEntry) {
    let span = match (entry.start_time, entry.end_time) {
        (Some(start), Some(end)) => format!("{}-{}", start.format("%H:%M"), end.format("%H:%M")),
        _ => String::new(),
    };
    let billable = if entry.billable { "$" } else { "" };
    println!(
        "{}\t{}\t{}\t{}\t{span}\t{billable}\t{}",
        entry.id,
        entry.date,
        entry.project,
        format_minutes(entry.minutes as u64),
        entry.description
    );
}

/// Command to process `time` commands.
pub async fn process_time_command(command: TimeCommand, context: &Context) -> Result<()> {
    let store = &context.store;
    store.ensure::<TimerDocument>().await?;
    let log: RecordLog<TimeEntry> = store.record_log(TIME_LOG_FILE);

    match command {
        TimeCommand::Start {
            project,
            description,
            billable,
        } => {
            let now = context.now_utc();
            let timer = store
                .update(|d: &mut TimerDocument| {
                    Ok(d.start(&project, &join_words(&description), billable, now)?
                        .clone())
                })
                .await?;
            info!("Started timer for {}", timer.project);
            println!("Started timer for `{}`", timer.project);
        }
        TimeCommand::Stop => {
            let now = context.now_utc();
            let timer = store
                .update(|d: &mut TimerDocument| Ok(d.stop()?))
                .await?;
            let entry = match log.append(timer.clone().finish(now)).await {
                Ok(v) => v,
                Err(e) => {
                    warn!("Failed to log stopped timer, restoring it: {e:?}");
                    store
                        .update(|d: &mut TimerDocument| {
                            d.timer = Some(timer);
                            Ok(())
                        })
                        .await?;
                    return Err(e);
                }
            };
            println!(
                "Logged {} for `{}` as entry {}",
                format_minutes(entry.minutes as u64),
                entry.project,
                entry.id
            );
        }
        TimeCommand::Cancel => {
            let timer = store
                .update(|d: &mut TimerDocument| Ok(d.stop()?))
                .await?;
            println!("Discarded timer for `{}`", timer.project);
        }
        TimeCommand::Status => {
            let document = store.load::<TimerDocument>().await?;
            match document.timer {
                Some(timer) => println!(
                    "`{}` running for {}\t{}",
                    timer.project,
                    format_minutes(timer.elapsed_minutes(context.now_utc()) as u64),
                    timer.description
                ),
                None => println!("No timer is running"),
            }
        }
        TimeCommand::Log {
            project,
            duration,
            description,
            date,
            start,
            billable,
        } => {
            let date = context.day_or_today(date.as_deref())?;
            let minutes = parse_minutes(&duration)?;
            let start = start.as_deref().map(parse_time).transpose()?;
            let mut entry = TimeEntry::manual(
                date,
                &project,
                minutes,
                &join_words(&description),
                billable,
            )?;
            if let Some(start) = start {
                entry = entry.starting_at(start);
            }
            let entry = log.append(entry).await?;
            info!("Logged entry {}", entry.id);
            println!(
                "Logged {} for `{}` on {date} as entry {}",
                format_minutes(entry.minutes as u64),
                entry.project,
                entry.id
            );
        }
        TimeCommand::List { from, to, project } => {
            let filter = EntryFilter {
                from: from.as_deref().map(|v| context.parse_day(v)).transpose()?,
                to: to.as_deref().map(|v| context.parse_day(v)).transpose()?,
                project,
            };
            let entries = log.read_all().await?;
            let entries = filter.apply(&entries);
            if entries.is_empty() {
                println!("No entries");
            }
            for entry in entries {
                print_entry(entry);
            }
        }
        TimeCommand::Report { period, project } => {
            let filter = EntryFilter {
                from: period.start(context),
                to: (period != Period::All).then(|| context.today()),
                project,
            };
            let entries = log.read_all().await?;
            let report = build_report(filter.apply(&entries));
            for (project, total) in &report.projects {
                println!(
                    "{project}\t{}\tbillable {}\t{} entries",
                    format_minutes(total.minutes),
                    format_minutes(total.billable_minutes),
                    total.entries
                );
            }
            println!(
                "Total ({period})\t{}\tbillable {}",
                format_minutes(report.total_minutes),
                format_minutes(report.billable_minutes)
            );
        }
        TimeCommand::Remove { id } => match log.remove(id).await? {
            Some(entry) => println!("Removed entry {id} of `{}`", entry.project),
            None => return Err(TrackerError::not_found("Time entry", id).into()),
        },
    }
    Ok(())
}
