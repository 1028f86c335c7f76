//! tickler done / cancel / set-state
//!
//! The date argument may be either the actual occurrence date or the display
//! date the user saw in `tickler list`.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::ledger::OccurrenceState;
use crate::occurrence::{filter_to_window, generate, DateWindow};
use crate::output::{emit_success, HumanOutput};
use crate::schedule::{occurs_on, Scheduler};
use crate::task::Task;

use super::{parse_date_arg, GlobalArgs};

#[derive(Debug, Clone, Copy)]
pub enum StateAction {
    ToggleDone,
    ToggleCancel,
    Set(OccurrenceState),
}

impl StateAction {
    fn command(&self) -> &'static str {
        match self {
            StateAction::ToggleDone => "done",
            StateAction::ToggleCancel => "cancel",
            StateAction::Set(_) => "set-state",
        }
    }
}

pub struct StateOptions {
    pub id: String,
    pub date: String,
    pub action: StateAction,
    pub global: GlobalArgs,
}

#[derive(Serialize)]
struct StateOutput {
    task_id: String,
    title: String,
    actual: NaiveDate,
    display: NaiveDate,
    state: OccurrenceState,
}

/// Map a user-supplied date to the actual date of an occurrence of `task`.
fn resolve_actual(scheduler: &Scheduler, task: &Task, date: NaiveDate) -> Result<NaiveDate> {
    if occurs_on(task, date) {
        return Ok(date);
    }
    let window = DateWindow::new(date, date);
    filter_to_window(generate(scheduler, task, window), window)
        .first()
        .map(|occurrence| occurrence.actual)
        .ok_or_else(|| {
            Error::InvalidArgument(format!("{date} is not an occurrence of task {}", task.id))
        })
}

pub fn run(options: StateOptions) -> Result<()> {
    let mut ctx = options.global.load()?;
    let date = parse_date_arg(&options.date, "date")?;

    let task = ctx.store.task(&options.id)?;
    let actual = resolve_actual(&ctx.scheduler, task, date)?;
    let display = ctx.scheduler.display_date_for(task, actual);
    let title = task.title.clone();

    let state = match options.action {
        StateAction::ToggleDone => ctx.store.toggle_done_for_date(&options.id, actual, &ctx.scheduler)?,
        StateAction::ToggleCancel => {
            ctx.store
                .toggle_cancel_for_date(&options.id, actual, &ctx.scheduler)?
        }
        StateAction::Set(state) => {
            ctx.store
                .set_state_for_date(&options.id, actual, state, &ctx.scheduler)?;
            state
        }
    };

    let mut human = HumanOutput::new(format!("{title}: {state}"));
    human.push_summary("Task", options.id.clone());
    human.push_summary("Due", display.to_string());
    if display != actual {
        human.push_summary("Actual", actual.to_string());
    }

    let output = StateOutput {
        task_id: options.id,
        title,
        actual,
        display,
        state,
    };
    emit_success(ctx.output, options.action.command(), &output, Some(&human))
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
    fn resolves_actual_or_display_date() {
        let scheduler = Scheduler::default();
        let task = Task::new("941", Recurrence::Monthly { dom: Some(15) })
            .with_id("t1")
            .with_method(Method::Mail, 2);

        assert_eq!(resolve_actual(&scheduler, &task, ymd(2025, 3, 15)).unwrap(), ymd(2025, 3, 15));
        assert_eq!(resolve_actual(&scheduler, &task, ymd(2025, 3, 12)).unwrap(), ymd(2025, 3, 15));
        assert!(matches!(
            resolve_actual(&scheduler, &task, ymd(2025, 3, 13)),
            Err(Error::InvalidArgument(_))
        ));
    }
}
