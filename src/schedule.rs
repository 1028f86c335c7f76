//! Occurrence evaluation for a single task.
//!
//! [`occurs_on`] answers "is `day` an occurrence of this task" and is a pure
//! function of the task and the day. Gates are applied before the rule's
//! pattern, in order: end bound, start bound, pause suppression.
//!
//! [`Scheduler`] adds the business calendar on top: it maps an actual
//! occurrence date to the deadline a user sees.

use chrono::{Duration, NaiveDate};

use crate::calendar::{BusinessDays, HolidayCalendar};
use crate::task::{Task, MAX_LEAD_DAYS};

/// Calendar days scanned beyond twice a task's lead time. Covers the first
/// roll back (a Monday holiday lands on Friday) plus holiday clusters inside
/// the shift itself.
pub const LEAD_BUFFER_SLACK: i64 = 7;

/// Default minimum scan buffer on both sides of a window.
pub const DEFAULT_BUFFER_DAYS: i64 = 10;

/// How far ahead [`next_on_or_after`] will look before giving up.
pub const NEXT_OCCURRENCE_HORIZON_DAYS: i64 = 3 * 366;

/// Whether `day` passes the task-level gates (bounds and pause windows).
pub fn passes_gates(task: &Task, day: NaiveDate) -> bool {
    if task.end_on.is_some_and(|end| day > end) {
        return false;
    }
    if task.start_on.is_some_and(|start| day < start) {
        return false;
    }
    if task.is_paused && task.pause_from.is_some_and(|from| day >= from) {
        return false;
    }
    // Closed windows suppress regardless of the current pause state.
    !task.closed_pause_windows().any(|window| window.contains(day))
}

/// Whether `day` is an occurrence of `task`.
pub fn occurs_on(task: &Task, day: NaiveDate) -> bool {
    passes_gates(task, day) && task.recurrence.matches(day, task.due, task.start_on)
}

/// First occurrence of `task` on or after `from`.
///
/// Returns `None` for malformed rules, rules exhausted by `end_on`, an open
/// pause covering everything ahead, or no match inside the horizon.
pub fn next_on_or_after(task: &Task, from: NaiveDate) -> Option<NaiveDate> {
    let limit = from.checked_add_signed(Duration::days(NEXT_OCCURRENCE_HORIZON_DAYS))?;
    let mut cursor = match task.start_on {
        Some(start) if start > from => start,
        _ => from,
    };

    while cursor <= limit {
        let candidate = task
            .recurrence
            .next_on_or_after(cursor, task.due, task.start_on)?;
        if candidate > limit || task.end_on.is_some_and(|end| candidate > end) {
            return None;
        }
        if occurs_on(task, candidate) {
            return Some(candidate);
        }
        if task.is_paused && task.pause_from.is_some_and(|from| candidate >= from) {
            return None;
        }
        // Jump past whichever closed window swallowed the candidate.
        cursor = task
            .closed_pause_windows()
            .filter(|window| window.contains(candidate))
            .map(|window| window.until)
            .max()
            .unwrap_or_else(|| candidate + Duration::days(1));
    }
    None
}

/// Business-calendar aware evaluation: display dates and scan buffers.
#[derive(Debug)]
pub struct Scheduler {
    calendar: HolidayCalendar,
    buffer_days: i64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(HolidayCalendar::new(), DEFAULT_BUFFER_DAYS)
    }
}

impl Scheduler {
    pub fn new(calendar: HolidayCalendar, buffer_days: i64) -> Self {
        Self {
            calendar,
            buffer_days: buffer_days.max(1),
        }
    }

    /// Scan buffer for `task`, in calendar days.
    ///
    /// Lead time counts business days, so `n` of them plus the initial roll
    /// back stay within `2n + 7` calendar days.
    pub fn buffer_for(&self, task: &Task) -> i64 {
        self.buffer_days
            .max(2 * i64::from(lead_days(task)) + LEAD_BUFFER_SLACK)
    }

    /// The deadline shown for an occurrence on `actual`.
    ///
    /// The actual date is first rolled back to a business day; lead days are
    /// counted from that adjusted date, and the result is rolled back again.
    pub fn display_date_for(&self, task: &Task, actual: NaiveDate) -> NaiveDate {
        let base = self.calendar.adjust_if_weekend_or_holiday(actual);
        let lead = lead_days(task);
        let shifted = if lead > 0 {
            self.calendar.shift_business_days(base, -(lead as i32))
        } else {
            base
        };
        self.calendar.adjust_if_weekend_or_holiday(shifted)
    }
}

/// Lead time in business days, capped for records that skipped normalization.
fn lead_days(task: &Task) -> u32 {
    task.action_lead_days.min(MAX_LEAD_DAYS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::{Recurrence, WeeklyRule};
    use crate::task::{Method, PauseWindow};
    use chrono::Weekday;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn monthly(dom: u32) -> Task {
        Task::new("monthly", Recurrence::Monthly { dom: Some(dom) })
    }

    fn all_families() -> Vec<Task> {
        let mut one_off = Task::one_off("one-off", ymd(2025, 8, 1));
        one_off.end_on = Some(ymd(2025, 6, 30));
        let rules = vec![
            Recurrence::Monthly { dom: Some(31) },
            Recurrence::SemiMonthly {
                dom: Some(1),
                dom2: Some(15),
            },
            Recurrence::Weekly(WeeklyRule {
                weekday: Some(Weekday::Mon),
                anchor_date: Some(ymd(2025, 1, 6)),
            }),
            Recurrence::Biweekly(WeeklyRule {
                weekday: None,
                anchor_date: Some(ymd(2025, 1, 2)),
            }),
            Recurrence::Quarterly {
                months: Vec::new(),
                dom: Some(15),
            },
        ];
        let mut tasks: Vec<Task> = rules
            .into_iter()
            .map(|rule| {
                let mut task = Task::new("t", rule);
                task.end_on = Some(ymd(2025, 6, 30));
                task
            })
            .collect();
        tasks.push(one_off);
        tasks
    }

    #[test]
    fn nothing_occurs_after_end_on() {
        for task in all_families() {
            let mut day = ymd(2025, 7, 1);
            while day <= ymd(2026, 12, 31) {
                assert!(!occurs_on(&task, day), "{:?} on {day}", task.recurrence);
                day = day.succ_opt().unwrap();
            }
        }
    }

    #[test]
    fn end_on_keeps_the_past() {
        let mut task = monthly(15);
        task.end_on = Some(ymd(2025, 6, 30));
        assert!(occurs_on(&task, ymd(2025, 6, 15)));
        assert!(occurs_on(&task, ymd(2024, 1, 15)));
    }

    #[test]
    fn start_on_hides_earlier_days() {
        let mut task = monthly(15);
        task.start_on = Some(ymd(2025, 6, 1));
        assert!(!occurs_on(&task, ymd(2025, 5, 15)));
        assert!(occurs_on(&task, ymd(2025, 6, 15)));
    }

    #[test]
    fn open_pause_suppresses_from_pause_date() {
        let mut task = monthly(1);
        task.is_paused = true;
        task.pause_from = Some(ymd(2025, 12, 1));
        assert!(occurs_on(&task, ymd(2025, 11, 1)));
        assert!(!occurs_on(&task, ymd(2025, 12, 1)));
        assert!(!occurs_on(&task, ymd(2027, 1, 1)));
    }

    #[test]
    fn closed_window_suppresses_even_when_active() {
        let mut task = monthly(1);
        task.pause_from = Some(ymd(2025, 12, 1));
        task.resume_from = Some(ymd(2026, 2, 1));
        assert!(!occurs_on(&task, ymd(2025, 12, 1)));
        assert!(!occurs_on(&task, ymd(2026, 1, 1)));
        assert!(occurs_on(&task, ymd(2026, 2, 1)));
    }

    #[test]
    fn historical_windows_stay_suppressed() {
        let mut task = monthly(1);
        task.pause_history.push(PauseWindow {
            from: ymd(2025, 3, 1),
            until: ymd(2025, 5, 1),
        });
        assert!(!occurs_on(&task, ymd(2025, 4, 1)));
        assert!(occurs_on(&task, ymd(2025, 5, 1)));
        assert_eq!(next_on_or_after(&task, ymd(2025, 2, 2)), Some(ymd(2025, 5, 1)));
    }

    #[test]
    fn next_skips_closed_window() {
        let mut task = monthly(1);
        task.pause_from = Some(ymd(2025, 12, 1));
        task.resume_from = Some(ymd(2026, 2, 15));
        assert_eq!(next_on_or_after(&task, ymd(2025, 11, 2)), Some(ymd(2026, 3, 1)));
    }

    #[test]
    fn next_respects_start_and_end() {
        let mut task = monthly(10);
        task.start_on = Some(ymd(2025, 5, 11));
        assert_eq!(next_on_or_after(&task, ymd(2025, 1, 1)), Some(ymd(2025, 6, 10)));
        task.end_on = Some(ymd(2025, 6, 9));
        assert_eq!(next_on_or_after(&task, ymd(2025, 1, 1)), None);
    }

    #[test]
    fn next_is_none_while_paused() {
        let mut task = monthly(10);
        task.is_paused = true;
        task.pause_from = Some(ymd(2025, 5, 1));
        assert_eq!(next_on_or_after(&task, ymd(2025, 4, 1)), Some(ymd(2025, 4, 10)));
        assert_eq!(next_on_or_after(&task, ymd(2025, 4, 11)), None);
    }

    #[test]
    fn quarterly_next_agrees_with_occurs_on() {
        let task = Task::new(
            "q",
            Recurrence::Quarterly {
                months: vec![1, 4, 7, 10],
                dom: Some(31),
            },
        );
        let mut start = ymd(2024, 12, 1);
        while start <= ymd(2026, 2, 1) {
            let next = next_on_or_after(&task, start).expect("next");
            assert!(occurs_on(&task, next));
            let mut between = start;
            while between < next {
                assert!(!occurs_on(&task, between));
                between = between.succ_opt().unwrap();
            }
            start = start.succ_opt().unwrap();
        }
    }

    #[test]
    fn mail_lead_days_on_saturday_due_date() {
        let scheduler = Scheduler::default();
        let task = monthly(15).with_method(Method::Mail, 2);
        // 2025-03-15 is a Saturday: adjust to Fri 14th, then back two business days.
        assert_eq!(scheduler.display_date_for(&task, ymd(2025, 3, 15)), ymd(2025, 3, 12));
    }

    #[test]
    fn display_without_lead_only_adjusts() {
        let scheduler = Scheduler::default();
        let task = monthly(1);
        // 2025-06-01 is a Sunday
        assert_eq!(scheduler.display_date_for(&task, ymd(2025, 6, 1)), ymd(2025, 5, 30));
        assert_eq!(scheduler.display_date_for(&task, ymd(2025, 6, 2)), ymd(2025, 6, 2));
    }

    #[test]
    fn display_lead_crosses_holiday() {
        let scheduler = Scheduler::default();
        let task = monthly(2).with_method(Method::DirectDeposit, 2);
        // Tue 2025-09-02 -> back over Labor Day Monday -> Thu 2025-08-28
        assert_eq!(scheduler.display_date_for(&task, ymd(2025, 9, 2)), ymd(2025, 8, 28));
    }

    #[test]
    fn buffer_grows_with_lead() {
        let scheduler = Scheduler::default();
        let short = monthly(1).with_method(Method::Mail, 2);
        let long = monthly(1).with_method(Method::Mail, 9);
        assert_eq!(scheduler.buffer_for(&short), 11);
        assert_eq!(scheduler.buffer_for(&long), 25);
    }

    #[test]
    fn long_lead_over_labor_day_stays_in_window() {
        use crate::occurrence::{filter_to_window, generate, DateWindow};

        let scheduler = Scheduler::default();
        let task = monthly(1).with_method(Method::Mail, 6);
        // Mon 2025-09-01 is Labor Day: roll to Fri 8/29, then six business days back.
        assert_eq!(scheduler.display_date_for(&task, ymd(2025, 9, 1)), ymd(2025, 8, 21));

        let window = DateWindow::new(ymd(2025, 8, 1), ymd(2025, 8, 21));
        let found = filter_to_window(generate(&scheduler, &task, window), window);
        let actuals: Vec<NaiveDate> = found.iter().map(|occurrence| occurrence.actual).collect();
        assert_eq!(actuals, vec![ymd(2025, 9, 1)]);
    }

    #[test]
    fn buffer_covers_every_display_shift() {
        let scheduler = Scheduler::default();
        for lead in [0, 1, 2, 5, 6, 10, 20, 40, MAX_LEAD_DAYS] {
            let task = monthly(1).with_method(Method::Mail, lead);
            let buffer = scheduler.buffer_for(&task);
            let mut day = ymd(2025, 1, 1);
            while day <= ymd(2026, 12, 31) {
                let shift = (day - scheduler.display_date_for(&task, day)).num_days();
                assert!(shift <= buffer, "lead {lead}: {day} shifts {shift} > {buffer}");
                day = day.succ_opt().unwrap();
            }
        }
    }

    #[test]
    fn oversized_lead_is_capped() {
        let scheduler = Scheduler::default();
        let mut task = monthly(1).with_method(Method::Mail, 2);
        task.action_lead_days = u32::MAX;
        assert_eq!(scheduler.buffer_for(&task), 2 * i64::from(MAX_LEAD_DAYS) + LEAD_BUFFER_SLACK);
        let display = scheduler.display_date_for(&task, ymd(2025, 6, 2));
        assert!(display > ymd(2025, 1, 1));
    }
}
