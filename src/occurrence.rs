//! Occurrence generation over a date window.
//!
//! Generation is two explicit steps. [`generate`] scans the window widened by
//! the task's scan buffer and returns every occurrence found, because an
//! actual date outside the window can have its display date pulled inside
//! it. [`filter_to_window`] then keeps the occurrences whose display date
//! lies in the window.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::ledger::{state_of, OccurrenceState};
use crate::schedule::{occurs_on, Scheduler};
use crate::task::{OccurrenceKey, Task};

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Build a window, swapping the bounds if given backwards.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// `days` days starting at `start` (inclusive).
    pub fn starting(start: NaiveDate, days: i64) -> Self {
        Self::new(start, start + Duration::days(days.max(1) - 1))
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// The window widened by `days` on both sides.
    pub fn widened(&self, days: i64) -> Self {
        let start = self
            .start
            .checked_sub_signed(Duration::days(days))
            .unwrap_or(self.start);
        let end = self
            .end
            .checked_add_signed(Duration::days(days))
            .unwrap_or(self.end);
        Self { start, end }
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }
}

/// One concrete occurrence of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    pub actual: NaiveDate,
    pub display: NaiveDate,
    pub is_done: bool,
}

impl Occurrence {
    pub fn key(&self) -> OccurrenceKey {
        OccurrenceKey::new(self.actual, self.display)
    }
}

/// Lazily yield every occurrence in the buffered scan range of `window`.
///
/// The result is a superset: callers must apply [`filter_to_window`].
pub fn iter_occurrences<'a>(
    scheduler: &'a Scheduler,
    task: &'a Task,
    window: DateWindow,
) -> impl Iterator<Item = Occurrence> + 'a {
    let scan = window.widened(scheduler.buffer_for(task));
    scan.days()
        .filter(move |day| occurs_on(task, *day))
        .map(move |actual| {
            let display = scheduler.display_date_for(task, actual);
            let key = OccurrenceKey::new(actual, display);
            Occurrence {
                actual,
                display,
                is_done: task.completed.contains(&key),
            }
        })
}

/// Step one: collect the buffered superset for `window`.
pub fn generate(scheduler: &Scheduler, task: &Task, window: DateWindow) -> Vec<Occurrence> {
    iter_occurrences(scheduler, task, window).collect()
}

/// Step two: keep occurrences whose display date falls inside `window`.
pub fn filter_to_window(occurrences: Vec<Occurrence>, window: DateWindow) -> Vec<Occurrence> {
    occurrences
        .into_iter()
        .filter(|occurrence| window.contains(occurrence.display))
        .collect()
}

/// Occurrences of `task` whose display date lies in `window`.
pub fn occurrences_in(scheduler: &Scheduler, task: &Task, window: DateWindow) -> Vec<Occurrence> {
    filter_to_window(generate(scheduler, task, window), window)
}

/// Where an occurrence sits relative to `today`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DueTag {
    Overdue,
    DueToday,
    DueSoon,
    Upcoming,
    Done,
    Cancelled,
}

impl DueTag {
    pub fn classify(display: NaiveDate, state: OccurrenceState, today: NaiveDate, soon_days: i64) -> Self {
        match state {
            OccurrenceState::Done => DueTag::Done,
            OccurrenceState::Cancelled => DueTag::Cancelled,
            OccurrenceState::Todo => {
                let days_until = (display - today).num_days();
                if days_until < 0 {
                    DueTag::Overdue
                } else if days_until == 0 {
                    DueTag::DueToday
                } else if days_until <= soon_days {
                    DueTag::DueSoon
                } else {
                    DueTag::Upcoming
                }
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DueTag::Overdue => "overdue",
            DueTag::DueToday => "due today",
            DueTag::DueSoon => "due soon",
            DueTag::Upcoming => "upcoming",
            DueTag::Done => "done",
            DueTag::Cancelled => "cancelled",
        }
    }
}

/// One line of an agenda across tasks.
#[derive(Debug, Clone, Serialize)]
pub struct AgendaEntry {
    pub task_id: String,
    pub title: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub actual: NaiveDate,
    pub display: NaiveDate,
    pub state: OccurrenceState,
    pub tag: DueTag,
}

/// Occurrences of every enabled task with a display date in `window`,
/// ordered by display date then title.
pub fn agenda<'a>(
    scheduler: &Scheduler,
    tasks: impl IntoIterator<Item = &'a Task>,
    window: DateWindow,
    today: NaiveDate,
    soon_days: i64,
) -> Vec<AgendaEntry> {
    let mut entries: Vec<AgendaEntry> = tasks
        .into_iter()
        .filter(|task| task.is_enabled)
        .flat_map(|task| {
            occurrences_in(scheduler, task, window)
                .into_iter()
                .map(move |occurrence| {
                    let state = state_of(task, &occurrence.key());
                    AgendaEntry {
                        task_id: task.id.clone(),
                        title: task.title.clone(),
                        kind: task.kind.clone(),
                        company: task.company_name.clone(),
                        actual: occurrence.actual,
                        display: occurrence.display,
                        state,
                        tag: DueTag::classify(occurrence.display, state, today, soon_days),
                    }
                })
        })
        .collect();
    entries.sort_by(|a, b| {
        a.display
            .cmp(&b.display)
            .then_with(|| a.title.cmp(&b.title))
            .then_with(|| a.actual.cmp(&b.actual))
    });
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::Recurrence;
    use crate::task::Method;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn window_bounds_are_ordered() {
        let window = DateWindow::new(ymd(2025, 3, 31), ymd(2025, 3, 1));
        assert_eq!(window.start, ymd(2025, 3, 1));
        assert_eq!(window.days().count(), 31);
        assert_eq!(DateWindow::starting(ymd(2025, 3, 1), 7).end, ymd(2025, 3, 7));
    }

    #[test]
    fn buffered_scan_catches_shifted_display_dates() {
        let scheduler = Scheduler::default();
        // Actual April 1st (Tue) with a 2-day lead displays on Fri March 28th.
        let task = Task::new("ACH", Recurrence::Monthly { dom: Some(1) })
            .with_method(Method::DirectDeposit, 2);
        let march = DateWindow::new(ymd(2025, 3, 1), ymd(2025, 3, 31));

        let superset = generate(&scheduler, &task, march);
        assert!(superset
            .iter()
            .any(|o| o.actual == ymd(2025, 4, 1) && o.display == ymd(2025, 3, 28)));

        let shown = filter_to_window(superset, march);
        let actuals: Vec<NaiveDate> = shown.iter().map(|o| o.actual).collect();
        // March 1st (Sat) displays Feb 26th and falls out; April 1st falls in.
        assert_eq!(actuals, vec![ymd(2025, 4, 1)]);
    }

    #[test]
    fn is_done_checks_both_keys() {
        let scheduler = Scheduler::default();
        let mut task = Task::new("mail", Recurrence::Monthly { dom: Some(15) })
            .with_method(Method::Mail, 2);
        let march = DateWindow::new(ymd(2025, 3, 1), ymd(2025, 3, 31));

        task.completed = ["2025-03-12"].into();
        let shown = occurrences_in(&scheduler, &task, march);
        assert_eq!(shown.len(), 1);
        assert!(shown[0].is_done);

        task.completed = ["2025-03-15"].into();
        assert!(occurrences_in(&scheduler, &task, march)[0].is_done);

        task.completed = ["2025-03-14"].into();
        assert!(!occurrences_in(&scheduler, &task, march)[0].is_done);
    }

    #[test]
    fn classify_due_windows() {
        let today = ymd(2025, 6, 10);
        let todo = OccurrenceState::Todo;
        assert_eq!(DueTag::classify(ymd(2025, 6, 9), todo, today, 7), DueTag::Overdue);
        assert_eq!(DueTag::classify(today, todo, today, 7), DueTag::DueToday);
        assert_eq!(DueTag::classify(ymd(2025, 6, 17), todo, today, 7), DueTag::DueSoon);
        assert_eq!(DueTag::classify(ymd(2025, 6, 18), todo, today, 7), DueTag::Upcoming);
        assert_eq!(
            DueTag::classify(ymd(2025, 6, 1), OccurrenceState::Done, today, 7),
            DueTag::Done
        );
    }

    #[test]
    fn agenda_sorts_and_skips_disabled() {
        let scheduler = Scheduler::default();
        let mut first = Task::new("B payroll", Recurrence::Monthly { dom: Some(20) }).with_id("b");
        first.kind = "PAYROLL".to_string();
        let second = Task::new("A sales tax", Recurrence::Monthly { dom: Some(5) }).with_id("a");
        let mut disabled = Task::new("C off", Recurrence::Monthly { dom: Some(5) }).with_id("c");
        disabled.is_enabled = false;
        let tasks = vec![first, second, disabled];

        let window = DateWindow::new(ymd(2025, 6, 1), ymd(2025, 6, 30));
        let entries = agenda(&scheduler, &tasks, window, ymd(2025, 6, 10), 7);
        let ids: Vec<&str> = entries.iter().map(|e| e.task_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(entries[0].tag, DueTag::Overdue);
        assert_eq!(entries[1].display, ymd(2025, 6, 20));
        assert_eq!(entries[1].tag, DueTag::Upcoming);
    }
}
