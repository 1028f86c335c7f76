//! tickler list / show / holidays
//!
//! Read-only views: the cross-task agenda for a window, one task with its
//! occurrences, and the holiday calendar.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::calendar::{Holiday, HolidayCalendar};
use crate::company::CompanyFilter;
use crate::error::{Error, Result};
use crate::ledger::{state_of, OccurrenceState};
use crate::occurrence::{agenda, occurrences_in, AgendaEntry, DateWindow, DueTag};
use crate::output::{emit_success, HumanOutput};
use crate::schedule::next_on_or_after;

use super::{parse_opt_date_arg, GlobalArgs};

pub struct ListOptions {
    pub from: Option<String>,
    pub to: Option<String>,
    pub days: i64,
    pub companies: Vec<String>,
    pub all: bool,
    pub global: GlobalArgs,
}

pub struct ShowOptions {
    pub id: String,
    pub from: Option<String>,
    pub days: i64,
    pub global: GlobalArgs,
}

pub struct HolidaysOptions {
    pub year: Option<i32>,
    pub global: GlobalArgs,
}

#[derive(Serialize)]
struct ListOutput {
    today: NaiveDate,
    window: DateWindow,
    entries: Vec<AgendaEntry>,
}

fn window_from(from: Option<NaiveDate>, to: Option<NaiveDate>, days: i64, today: NaiveDate) -> Result<DateWindow> {
    if days < 1 {
        return Err(Error::InvalidArgument(format!("--days must be at least 1 (got {days})")));
    }
    let start = from.unwrap_or(today);
    Ok(match to {
        Some(end) => DateWindow::new(start, end),
        None => DateWindow::starting(start, days),
    })
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let ctx = options.global.load()?;
    let from = parse_opt_date_arg(options.from.as_deref(), "--from")?;
    let to = parse_opt_date_arg(options.to.as_deref(), "--to")?;
    let window = window_from(from, to, options.days, ctx.today)?;

    let filter = CompanyFilter::resolve(&options.companies, &ctx.config.companies);
    let tasks = ctx
        .store
        .tasks()
        .iter()
        .filter(|task| filter.is_empty() || filter.matches(task));

    let mut entries = agenda(
        &ctx.scheduler,
        tasks,
        window,
        ctx.today,
        ctx.config.schedule.due_soon_days,
    );
    if !options.all {
        entries.retain(|entry| entry.state == OccurrenceState::Todo);
    }

    let mut human = HumanOutput::new(format!("Occurrences {} .. {}", window.start, window.end));
    human.push_summary("Today", ctx.today.to_string());
    human.push_summary("Total", entries.len().to_string());
    for entry in &entries {
        human.push_detail(format_entry(entry));
    }
    if ctx.store.is_empty() {
        human.push_next_step("tickler add \"<title>\" --freq monthly --dom 15");
    }

    let output = ListOutput {
        today: ctx.today,
        window,
        entries,
    };
    emit_success(ctx.output, "list", &output, Some(&human))
}

fn format_entry(entry: &AgendaEntry) -> String {
    let shifted = if entry.display != entry.actual {
        format!(" (actual {})", entry.actual)
    } else {
        String::new()
    };
    let company = entry
        .company
        .as_deref()
        .map(|name| format!(" [{name}]"))
        .unwrap_or_default();
    format!(
        "{} {:<9} {}{}{} ({}){}",
        entry.display,
        entry.tag.as_str(),
        entry.title,
        company,
        if entry.kind.is_empty() { String::new() } else { format!(" {}", entry.kind) },
        entry.task_id,
        shifted
    )
}

#[derive(Serialize)]
struct ShowOccurrence {
    actual: NaiveDate,
    display: NaiveDate,
    state: OccurrenceState,
    tag: DueTag,
}

#[derive(Serialize)]
struct ShowOutput<'a> {
    task: &'a crate::task::Task,
    schedule: String,
    next: Option<NaiveDate>,
    window: DateWindow,
    occurrences: Vec<ShowOccurrence>,
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let ctx = options.global.load()?;
    let from = parse_opt_date_arg(options.from.as_deref(), "--from")?;
    let window = window_from(from, None, options.days, ctx.today)?;
    let task = ctx.store.task(&options.id)?;

    let occurrences: Vec<ShowOccurrence> = occurrences_in(&ctx.scheduler, task, window)
        .into_iter()
        .map(|occurrence| {
            let state = state_of(task, &occurrence.key());
            ShowOccurrence {
                actual: occurrence.actual,
                display: occurrence.display,
                state,
                tag: DueTag::classify(
                    occurrence.display,
                    state,
                    ctx.today,
                    ctx.config.schedule.due_soon_days,
                ),
            }
        })
        .collect();
    let next = next_on_or_after(task, ctx.today);

    let mut human = HumanOutput::new(format!("Task {}", task.id));
    human.push_summary("Title", task.title.clone());
    if !task.kind.is_empty() {
        human.push_summary("Kind", task.kind.clone());
    }
    if let Some(name) = &task.company_name {
        human.push_summary("Company", name.clone());
    }
    human.push_summary("Schedule", task.recurrence.describe());
    if task.recurrence.is_one_off() {
        human.push_summary(
            "Due",
            task.due.map(|due| due.to_string()).unwrap_or_else(|| "(none)".to_string()),
        );
    }
    if task.method.requires_lead_time() {
        human.push_summary(
            "Method",
            format!("{} ({} business days lead)", task.method.as_str(), task.action_lead_days),
        );
    }
    human.push_summary("Status", status_line(task));
    human.push_summary(
        "Next",
        next.map(|day| day.to_string()).unwrap_or_else(|| "(none)".to_string()),
    );
    for occurrence in &occurrences {
        human.push_detail(format!(
            "{} {} (actual {})",
            occurrence.display,
            occurrence.tag.as_str(),
            occurrence.actual
        ));
    }
    if !task.is_enabled {
        human.push_warning("task is disabled and hidden from the agenda");
    }
    if !task.recurrence.is_recurring() && !task.recurrence.is_one_off() {
        human.push_warning("recurrence rule is not recognised; no occurrences are generated");
    }

    let output = ShowOutput {
        task,
        schedule: task.recurrence.describe(),
        next,
        window,
        occurrences,
    };
    emit_success(ctx.output, "show", &output, Some(&human))
}

fn status_line(task: &crate::task::Task) -> String {
    if let Some(end) = task.end_on {
        return format!("stopped (ends {end})");
    }
    match (task.is_paused, task.pause_from) {
        (true, Some(from)) => format!("paused from {from}"),
        (true, None) => "paused".to_string(),
        _ => match task.resume_from {
            Some(resumed) => format!("active (resumed {resumed})"),
            None => "active".to_string(),
        },
    }
}

#[derive(Serialize)]
struct HolidaysOutput {
    year: i32,
    holidays: Vec<Holiday>,
}

pub fn run_holidays(options: HolidaysOptions) -> Result<()> {
    let year = match options.year {
        Some(year) => year,
        None => options.global.today()?.year(),
    };
    if !(1900..=2200).contains(&year) {
        return Err(Error::InvalidArgument(format!("year {year} is out of range")));
    }
    let calendar = HolidayCalendar::new();
    let holidays = calendar.named_holidays(year);

    let mut human = HumanOutput::new(format!("US federal holidays {year}"));
    for holiday in &holidays {
        human.push_detail(format!("{} {} {}", holiday.date, holiday.date.weekday(), holiday.name));
    }

    emit_success(
        options.global.output,
        "holidays",
        &HolidaysOutput { year, holidays },
        Some(&human),
    )
}
