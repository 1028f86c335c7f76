//! tickler - recurring deadline engine
//!
//! This library expands task definitions (filing and payment deadlines of a
//! CPA practice) into dated occurrences and tracks their state.
//!
//! # Core Concepts
//!
//! - **Recurrence rules**: one-off, monthly, semi-monthly, weekly, biweekly
//!   and quarterly, with day-of-month clamping
//! - **Display dates**: occurrences rolled back onto US business days and
//!   pulled ahead by submission lead time for mail and ACH
//! - **Dual keys**: done/cancelled state recorded under both the actual and
//!   the display date so it survives rule edits
//! - **Pause windows**: `[pause_from, resume_from)` intervals suppressed for good
//!
//! Every entry point takes an explicit `today`; nothing reads the clock.
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `.tickler.toml`
//! - `error`: Error types and result aliases
//! - `date`: Lenient date parsing and serde helpers
//! - `calendar`: Federal holidays and business-day shifting
//! - `recurrence`: Recurrence rule families
//! - `task`: The persisted task record
//! - `schedule`: Occurrence gates and display-date resolution
//! - `occurrence`: Window generation, due tags and the agenda
//! - `ledger`: Per-occurrence done/cancel state
//! - `pause`: Pause, resume and stop transitions
//! - `company`: Company directory and filters
//! - `store`: Task list ownership and persistence
//! - `lock`: File locking and atomic writes
//! - `output`: CLI output envelopes

pub mod calendar;
pub mod cli;
pub mod company;
pub mod config;
pub mod date;
pub mod error;
pub mod ledger;
pub mod lock;
pub mod occurrence;
pub mod output;
pub mod pause;
pub mod recurrence;
pub mod schedule;
pub mod store;
pub mod task;

pub use calendar::{BusinessDays, HolidayCalendar};
pub use error::{Error, Result};
pub use occurrence::{filter_to_window, generate, iter_occurrences, DateWindow, Occurrence};
pub use recurrence::Recurrence;
pub use schedule::Scheduler;
pub use store::TaskStore;
pub use task::Task;
