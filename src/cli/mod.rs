//! Command-line interface for tickler
//!
//! This module defines the CLI structure using clap derive macros.
//! Each group of subcommands is implemented in its own submodule.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use directories::ProjectDirs;

use crate::calendar::HolidayCalendar;
use crate::config::{Config, CONFIG_FILE_NAME};
use crate::date::parse_date;
use crate::error::{Error, Result};
use crate::output::OutputOptions;
use crate::recurrence::Frequency;
use crate::schedule::Scheduler;
use crate::store::TaskStore;
use crate::task::Method;

mod add;
mod agenda;
mod pause;
mod state;

/// tickler - recurring deadline tracker
///
/// Expands recurring filing and payment tasks into dated occurrences,
/// shifts them onto business days, and tracks done/cancelled state.
#[derive(Parser, Debug)]
#[command(name = "tickler")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a .tickler.toml config file
    #[arg(long, global = true, env = "TICKLER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to the task file (overrides the config)
    #[arg(long, global = true, env = "TICKLER_STORE")]
    pub store: Option<PathBuf>,

    /// Reference date (YYYY-MM-DD); defaults to the local date
    #[arg(long, global = true, env = "TICKLER_TODAY")]
    pub today: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List occurrences of all enabled tasks in a date window
    List {
        /// First day of the window (defaults to today)
        #[arg(long)]
        from: Option<String>,

        /// Last day of the window (overrides --days)
        #[arg(long)]
        to: Option<String>,

        /// Window length in days
        #[arg(long, default_value_t = 30)]
        days: i64,

        /// Only tasks of these companies (index or name, repeatable)
        #[arg(long = "company")]
        companies: Vec<String>,

        /// Include done and cancelled occurrences
        #[arg(long)]
        all: bool,
    },

    /// Show one task and its upcoming occurrences
    Show {
        /// Task ID
        id: String,

        /// First day of the window (defaults to today)
        #[arg(long)]
        from: Option<String>,

        /// Window length in days
        #[arg(long, default_value_t = 90)]
        days: i64,
    },

    /// Create a task
    Add {
        /// Task title
        title: String,

        /// Free-form tag (stored upper-case)
        #[arg(long, default_value = "")]
        kind: String,

        /// one-off | monthly | semi-monthly | weekly | biweekly | quarterly
        #[arg(long, default_value = "one-off")]
        freq: Frequency,

        /// Day of month
        #[arg(long)]
        dom: Option<u32>,

        /// Second day of month (semi-monthly)
        #[arg(long)]
        dom2: Option<u32>,

        /// Day of week (weekly, biweekly)
        #[arg(long)]
        weekday: Option<chrono::Weekday>,

        /// Anchor date for the weekly cadence
        #[arg(long)]
        anchor: Option<String>,

        /// Quarter months, comma separated (defaults to 1,4,7,10)
        #[arg(long, value_delimiter = ',')]
        months: Vec<u32>,

        /// Due date (one-off)
        #[arg(long)]
        due: Option<String>,

        /// First day occurrences may fall on
        #[arg(long)]
        start_on: Option<String>,

        /// Last day occurrences may fall on
        #[arg(long)]
        end_on: Option<String>,

        /// none | mail | direct_deposit
        #[arg(long, default_value = "none")]
        method: Method,

        /// Business days of submission lead time
        #[arg(long, default_value_t = 0)]
        lead_days: u32,

        /// Company index or name
        #[arg(long)]
        company: Option<String>,

        /// Explicit task ID (generated when omitted)
        #[arg(long)]
        id: Option<String>,
    },

    /// Toggle done for one occurrence (actual or display date)
    Done {
        /// Task ID
        id: String,
        /// Occurrence date
        date: String,
    },

    /// Toggle cancelled for one occurrence (actual or display date)
    Cancel {
        /// Task ID
        id: String,
        /// Occurrence date
        date: String,
    },

    /// Force an occurrence into todo, done or cancel
    SetState {
        /// Task ID
        id: String,
        /// Occurrence date
        date: String,
        /// todo | done | cancel
        state: crate::ledger::OccurrenceState,
    },

    /// Pause a recurring task from its first open occurrence
    Pause {
        /// Task ID
        id: String,
    },

    /// Resume a paused task as of today
    Resume {
        /// Task ID
        id: String,
    },

    /// End a task as of today (past occurrences stay)
    Stop {
        /// Task ID
        id: String,
    },

    /// Pause every recurring task of the given companies
    BatchPause {
        /// Company indexes or names
        #[arg(required = true)]
        companies: Vec<String>,
    },

    /// Resume every paused task of the given companies
    BatchResume {
        /// Company indexes or names
        #[arg(required = true)]
        companies: Vec<String>,
    },

    /// List US federal holidays observed by the business calendar
    Holidays {
        /// Calendar year (defaults to the year of today)
        year: Option<i32>,
    },
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let global = GlobalArgs {
            config: self.config,
            store: self.store,
            today: self.today,
            output: OutputOptions {
                json: self.json,
                quiet: self.quiet,
            },
        };

        match self.command {
            Commands::List {
                from,
                to,
                days,
                companies,
                all,
            } => agenda::run_list(agenda::ListOptions {
                from,
                to,
                days,
                companies,
                all,
                global,
            }),
            Commands::Show { id, from, days } => agenda::run_show(agenda::ShowOptions {
                id,
                from,
                days,
                global,
            }),
            Commands::Holidays { year } => agenda::run_holidays(agenda::HolidaysOptions { year, global }),
            Commands::Add {
                title,
                kind,
                freq,
                dom,
                dom2,
                weekday,
                anchor,
                months,
                due,
                start_on,
                end_on,
                method,
                lead_days,
                company,
                id,
            } => add::run(add::AddOptions {
                title,
                kind,
                freq,
                dom,
                dom2,
                weekday,
                anchor,
                months,
                due,
                start_on,
                end_on,
                method,
                lead_days,
                company,
                id,
                global,
            }),
            Commands::Done { id, date } => state::run(state::StateOptions {
                id,
                date,
                action: state::StateAction::ToggleDone,
                global,
            }),
            Commands::Cancel { id, date } => state::run(state::StateOptions {
                id,
                date,
                action: state::StateAction::ToggleCancel,
                global,
            }),
            Commands::SetState { id, date, state } => state::run(state::StateOptions {
                id,
                date,
                action: state::StateAction::Set(state),
                global,
            }),
            Commands::Pause { id } => pause::run_single(pause::SingleOptions {
                id,
                action: pause::PauseAction::Pause,
                global,
            }),
            Commands::Resume { id } => pause::run_single(pause::SingleOptions {
                id,
                action: pause::PauseAction::Resume,
                global,
            }),
            Commands::Stop { id } => pause::run_single(pause::SingleOptions {
                id,
                action: pause::PauseAction::Stop,
                global,
            }),
            Commands::BatchPause { companies } => pause::run_batch(pause::BatchOptions {
                companies,
                action: pause::BatchAction::Pause,
                global,
            }),
            Commands::BatchResume { companies } => pause::run_batch(pause::BatchOptions {
                companies,
                action: pause::BatchAction::Resume,
                global,
            }),
        }
    }
}

/// Options shared by every subcommand.
#[derive(Debug, Clone)]
pub(crate) struct GlobalArgs {
    pub config: Option<PathBuf>,
    pub store: Option<PathBuf>,
    pub today: Option<String>,
    pub output: OutputOptions,
}

/// Everything a command needs: config, loaded store, scheduler and today.
pub(crate) struct Context {
    pub config: Config,
    pub store: TaskStore,
    pub scheduler: Scheduler,
    pub today: NaiveDate,
    pub output: OutputOptions,
}

impl GlobalArgs {
    pub fn today(&self) -> Result<NaiveDate> {
        match self.today.as_deref() {
            Some(raw) => parse_date_arg(raw, "--today"),
            None => Ok(chrono::Local::now().date_naive()),
        }
    }

    /// Config plus the directory relative paths resolve against.
    fn config(&self) -> Result<(Config, PathBuf)> {
        if let Some(path) = &self.config {
            let config = Config::load(path)?;
            let base = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            return Ok((config, base));
        }

        let cwd = std::env::current_dir()?;
        if cwd.join(CONFIG_FILE_NAME).exists() {
            return Ok((Config::load_from_dir(&cwd), cwd));
        }
        let base = ProjectDirs::from("", "", "tickler")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or(cwd);
        Ok((Config::default(), base))
    }

    pub fn load(&self) -> Result<Context> {
        let today = self.today()?;
        let (config, base) = self.config()?;
        let path = match &self.store {
            Some(path) => path.clone(),
            None => config.store_path(&base),
        };
        tracing::debug!(store = %path.display(), %today, "loading task store");

        let store = TaskStore::open(path, &config.companies, config.submission.min_lead_days)
            .with_lock_timeout(config.store.lock_timeout_ms);
        let scheduler = Scheduler::new(HolidayCalendar::new(), config.schedule.buffer_days);
        Ok(Context {
            config,
            store,
            scheduler,
            today,
            output: self.output,
        })
    }
}

pub(crate) fn parse_date_arg(raw: &str, field: &str) -> Result<NaiveDate> {
    parse_date(raw).ok_or_else(|| {
        Error::InvalidArgument(format!("{field}: '{raw}' is not a date (expected YYYY-MM-DD)"))
    })
}

pub(crate) fn parse_opt_date_arg(raw: Option<&str>, field: &str) -> Result<Option<NaiveDate>> {
    raw.map(|raw| parse_date_arg(raw, field)).transpose()
}
