//! tickler add
//!
//! Builds a task from flags. Each frequency requires its own fields; rules
//! that could never match are rejected here rather than stored.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

use crate::company::CompanyDirectory;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput};
use crate::recurrence::{Frequency, Recurrence, RecurrenceRecord};
use crate::schedule::next_on_or_after;
use crate::task::{Method, Task};

use super::{parse_opt_date_arg, GlobalArgs};

pub struct AddOptions {
    pub title: String,
    pub kind: String,
    pub freq: Frequency,
    pub dom: Option<u32>,
    pub dom2: Option<u32>,
    pub weekday: Option<Weekday>,
    pub anchor: Option<String>,
    pub months: Vec<u32>,
    pub due: Option<String>,
    pub start_on: Option<String>,
    pub end_on: Option<String>,
    pub method: Method,
    pub lead_days: u32,
    pub company: Option<String>,
    pub id: Option<String>,
    pub global: GlobalArgs,
}

#[derive(Serialize)]
struct AddOutput<'a> {
    task: &'a Task,
    schedule: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    next: Option<NaiveDate>,
}

fn require(present: bool, message: &str) -> Result<()> {
    if present {
        Ok(())
    } else {
        Err(Error::InvalidArgument(message.to_string()))
    }
}

fn check_dom(dom: Option<u32>, flag: &str) -> Result<()> {
    match dom {
        Some(day) if !(1..=31).contains(&day) => Err(Error::InvalidArgument(format!(
            "{flag} must be between 1 and 31 (got {day})"
        ))),
        _ => Ok(()),
    }
}

fn build_recurrence(options: &AddOptions, anchor: Option<NaiveDate>) -> Result<Recurrence> {
    check_dom(options.dom, "--dom")?;
    check_dom(options.dom2, "--dom2")?;
    if let Some(month) = options.months.iter().find(|m| !(1..=12).contains(*m)) {
        return Err(Error::InvalidArgument(format!("--months: {month} is not a month")));
    }

    match options.freq {
        Frequency::OneOff => require(options.due.is_some(), "one-off tasks need --due")?,
        Frequency::Monthly | Frequency::Quarterly => {
            require(options.dom.is_some(), "monthly and quarterly tasks need --dom")?
        }
        Frequency::SemiMonthly => require(
            options.dom.is_some() && options.dom2.is_some(),
            "semi-monthly tasks need --dom and --dom2",
        )?,
        Frequency::Weekly => require(
            options.weekday.is_some() || anchor.is_some(),
            "weekly tasks need --weekday or --anchor",
        )?,
        Frequency::Biweekly => require(
            anchor.is_some() || options.start_on.is_some(),
            "biweekly tasks need --anchor or --start-on",
        )?,
    }

    let record = RecurrenceRecord {
        freq: Some(options.freq.as_str().to_string()),
        dom: options.dom,
        dom2: options.dom2,
        weekday: options.weekday.map(|day| day.num_days_from_monday()),
        anchor_date: anchor,
        months: if options.months.is_empty() {
            None
        } else {
            Some(options.months.clone())
        },
    };
    Ok(record.into())
}

/// Reject a rule that yields no date from its own starting point onward,
/// such as a biweekly rule with nothing to count from or a weekday the
/// anchor does not fall on.
fn ensure_rule_matches(task: &Task, today: NaiveDate) -> Result<()> {
    let (Recurrence::Weekly(rule) | Recurrence::Biweekly(rule)) = &task.recurrence else {
        return Ok(());
    };
    let from = task.start_on.or(rule.anchor_date).unwrap_or(today);
    match task.recurrence.next_on_or_after(from, task.due, task.start_on) {
        Some(_) => Ok(()),
        None => Err(Error::InvalidArgument(format!(
            "{} rule never matches: {}",
            task.recurrence.describe(),
            match (rule.weekday, rule.anchor_date) {
                (Some(weekday), Some(anchor)) if anchor.weekday() != weekday => {
                    format!("--anchor {anchor} is a {}, not a {weekday}", anchor.weekday())
                }
                (Some(weekday), _) => format!("--start-on must fall on a {weekday}"),
                (None, _) => "give --anchor, or --weekday with --start-on".to_string(),
            }
        ))),
    }
}

pub fn run(options: AddOptions) -> Result<()> {
    let mut ctx = options.global.load()?;

    if options.title.trim().is_empty() {
        return Err(Error::InvalidArgument("title cannot be empty".to_string()));
    }
    let anchor = parse_opt_date_arg(options.anchor.as_deref(), "--anchor")?;
    let due = parse_opt_date_arg(options.due.as_deref(), "--due")?;
    let start_on = parse_opt_date_arg(options.start_on.as_deref(), "--start-on")?;
    let end_on = parse_opt_date_arg(options.end_on.as_deref(), "--end-on")?;
    if let (Some(start), Some(end)) = (start_on, end_on) {
        if end < start {
            return Err(Error::InvalidArgument(format!(
                "--end-on {end} is before --start-on {start}"
            )));
        }
    }
    let recurrence = build_recurrence(&options, anchor)?;

    let mut task = Task::new(options.title.clone(), recurrence)
        .with_method(options.method, options.lead_days);
    task.kind = options.kind.clone();
    task.due = due;
    task.start_on = start_on;
    task.end_on = end_on;
    if let Some(id) = &options.id {
        task.id = id.clone();
    }
    if let Some(company) = options.company.as_deref() {
        let directory = &ctx.config.companies;
        task = match company.trim().parse::<usize>() {
            Ok(index) => task.with_company(Some(index), directory.name_of(index)),
            Err(_) => task.with_company(directory.index_of(company), Some(company.trim())),
        };
    }

    let today = ctx.today;
    ensure_rule_matches(&task, today)?;
    let task = ctx.store.add(task)?;
    let schedule = task.recurrence.describe();
    let next = next_on_or_after(task, today);

    let mut human = HumanOutput::new("Task created");
    human.push_summary("ID", task.id.clone());
    human.push_summary("Title", task.title.clone());
    human.push_summary("Schedule", schedule.clone());
    if let Some(next) = next {
        human.push_summary("Next", format!("{next} ({})", next.weekday()));
    }
    if task.action_lead_days > options.lead_days {
        human.push_warning(format!(
            "lead time raised to {} business days for {}",
            task.action_lead_days,
            task.method.as_str()
        ));
    }
    human.push_next_step(format!("tickler show {}", task.id));

    let output = AddOutput {
        task,
        schedule,
        next,
    };
    emit_success(ctx.output, "add", &output, Some(&human))
}
