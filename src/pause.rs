//! Task-level pause, resume and stop transitions.
//!
//! A task is either active or paused. Pausing suppresses every occurrence on
//! or after `pause_from`; resuming closes the interval `[pause_from,
//! resume_from)`, which then stays suppressed for good. Transitions that do
//! not apply are declined with a reason instead of failing.

use chrono::{Duration, NaiveDate};
use thiserror::Error;
use tracing::debug;

use crate::company::CompanyFilter;
use crate::schedule::next_on_or_after;
use crate::task::Task;

/// Why a transition was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Decline {
    #[error("one-off tasks cannot be paused")]
    OneOff,
    #[error("task has no valid recurrence")]
    NotRecurring,
    #[error("task is stopped")]
    Stopped,
    #[error("task is already paused")]
    AlreadyPaused,
    #[error("task is not paused")]
    NotPaused,
}

/// Outcome of a single-task transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    Declined(Decline),
}

impl Transition {
    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied)
    }
}

impl From<std::result::Result<(), Decline>> for Transition {
    fn from(value: std::result::Result<(), Decline>) -> Self {
        match value {
            Ok(()) => Transition::Applied,
            Err(reason) => Transition::Declined(reason),
        }
    }
}

fn check_pausable(task: &Task) -> std::result::Result<(), Decline> {
    if task.recurrence.is_one_off() {
        return Err(Decline::OneOff);
    }
    if !task.recurrence.is_recurring() {
        return Err(Decline::NotRecurring);
    }
    if task.is_stopped() {
        return Err(Decline::Stopped);
    }
    if task.is_paused {
        return Err(Decline::AlreadyPaused);
    }
    Ok(())
}

/// First occurrence the pause should start from.
///
/// Bookkeeping resumes after the latest done or cancelled occurrence on or
/// before `today`; without one, the search starts at `max(start_on, today)`.
pub fn compute_pause_start_date(task: &Task, today: NaiveDate) -> Option<NaiveDate> {
    let last_closed = task
        .completed
        .dates()
        .chain(task.cancelled.dates())
        .filter(|day| *day <= today)
        .max();

    match last_closed {
        Some(day) => next_on_or_after(task, day + Duration::days(1)),
        None => {
            let seed = task.start_on.map_or(today, |start| start.max(today));
            next_on_or_after(task, seed)
        }
    }
}

/// Pause `task` from its first open occurrence (or `today` if there is none).
pub fn pause(task: &mut Task, today: NaiveDate) -> Transition {
    if let Err(reason) = check_pausable(task) {
        return Transition::Declined(reason);
    }
    // Keep the previous closed window suppressed once its bounds are reused.
    if let Some(window) = task.closed_pause_window() {
        if !task.pause_history.contains(&window) {
            task.pause_history.push(window);
        }
    }
    task.resume_from = None;
    let from = compute_pause_start_date(task, today).unwrap_or(today);
    task.pause_from = Some(from);
    task.is_paused = true;
    debug!(task = %task.id, pause_from = %from, "task paused");
    Transition::Applied
}

/// Resume a paused task as of `today`.
pub fn resume(task: &mut Task, today: NaiveDate) -> Transition {
    if !task.is_paused {
        return Transition::Declined(Decline::NotPaused);
    }
    task.resume_from = Some(today);
    task.is_paused = false;
    debug!(task = %task.id, resume_from = %today, "task resumed");
    Transition::Applied
}

/// End generation after `today`. Past occurrences stay visible.
pub fn stop(task: &mut Task, today: NaiveDate) -> Transition {
    if task.is_stopped() {
        return Transition::Declined(Decline::Stopped);
    }
    task.end_on = Some(today);
    debug!(task = %task.id, end_on = %today, "task stopped");
    Transition::Applied
}

/// Whether a batch operation should consider `task` at all.
pub fn eligible_for_batch(task: &Task, filter: &CompanyFilter) -> bool {
    task.recurrence.is_recurring() && !task.is_stopped() && filter.matches(task)
}

/// Pause every eligible, active task matching `filter`. Returns the count changed.
pub fn batch_pause<'a>(
    tasks: impl IntoIterator<Item = &'a mut Task>,
    filter: &CompanyFilter,
    today: NaiveDate,
) -> usize {
    tasks
        .into_iter()
        .filter(|task| eligible_for_batch(task, filter) && !task.is_paused)
        .map(|task| pause(task, today))
        .filter(Transition::is_applied)
        .count()
}

/// Resume every eligible, paused task matching `filter`. Returns the count changed.
pub fn batch_resume<'a>(
    tasks: impl IntoIterator<Item = &'a mut Task>,
    filter: &CompanyFilter,
    today: NaiveDate,
) -> usize {
    tasks
        .into_iter()
        .filter(|task| eligible_for_batch(task, filter) && task.is_paused)
        .map(|task| resume(task, today))
        .filter(Transition::is_applied)
        .count()
}
