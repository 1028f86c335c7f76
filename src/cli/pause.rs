//! tickler pause / resume / stop / batch-pause / batch-resume
//!
//! A declined transition is reported, not treated as a failure: the command
//! succeeds with `applied: false` and the reason.

use chrono::NaiveDate;
use serde::Serialize;

use crate::company::CompanyFilter;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput};
use crate::pause::Transition;

use super::GlobalArgs;

#[derive(Debug, Clone, Copy)]
pub enum PauseAction {
    Pause,
    Resume,
    Stop,
}

impl PauseAction {
    fn verb(&self) -> &'static str {
        match self {
            PauseAction::Pause => "pause",
            PauseAction::Resume => "resume",
            PauseAction::Stop => "stop",
        }
    }

    fn past(&self) -> &'static str {
        match self {
            PauseAction::Pause => "paused",
            PauseAction::Resume => "resumed",
            PauseAction::Stop => "stopped",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum BatchAction {
    Pause,
    Resume,
}

pub struct SingleOptions {
    pub id: String,
    pub action: PauseAction,
    pub global: GlobalArgs,
}

pub struct BatchOptions {
    pub companies: Vec<String>,
    pub action: BatchAction,
    pub global: GlobalArgs,
}

#[derive(Serialize)]
struct SingleOutput {
    task_id: String,
    applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    is_paused: bool,
    #[serde(with = "crate::date::opt_date")]
    pause_from: Option<NaiveDate>,
    #[serde(with = "crate::date::opt_date")]
    resume_from: Option<NaiveDate>,
    #[serde(with = "crate::date::opt_date")]
    end_on: Option<NaiveDate>,
}

pub fn run_single(options: SingleOptions) -> Result<()> {
    let mut ctx = options.global.load()?;
    let today = ctx.today;
    let outcome = match options.action {
        PauseAction::Pause => ctx.store.pause(&options.id, today)?,
        PauseAction::Resume => ctx.store.resume(&options.id, today)?,
        PauseAction::Stop => ctx.store.stop(&options.id, today)?,
    };
    let task = ctx.store.task(&options.id)?;

    let mut human = match outcome {
        Transition::Applied => HumanOutput::new(format!("{}: {}", task.title, options.action.past())),
        Transition::Declined(_) => {
            HumanOutput::new(format!("{}: not {}", task.title, options.action.past()))
        }
    };
    human.push_summary("Task", task.id.clone());
    if let Transition::Declined(reason) = outcome {
        human.push_warning(reason.to_string());
    }
    if let Some(from) = task.pause_from {
        human.push_summary("Paused from", from.to_string());
    }
    if let Some(until) = task.resume_from {
        human.push_summary("Resumed", until.to_string());
    }
    if let Some(end) = task.end_on {
        human.push_summary("Ends", end.to_string());
    }

    let output = SingleOutput {
        task_id: task.id.clone(),
        applied: outcome.is_applied(),
        reason: match outcome {
            Transition::Declined(reason) => Some(reason.to_string()),
            Transition::Applied => None,
        },
        is_paused: task.is_paused,
        pause_from: task.pause_from,
        resume_from: task.resume_from,
        end_on: task.end_on,
    };
    emit_success(ctx.output, options.action.verb(), &output, Some(&human))
}

#[derive(Serialize)]
struct BatchOutput {
    companies: Vec<String>,
    changed: usize,
}

pub fn run_batch(options: BatchOptions) -> Result<()> {
    let mut ctx = options.global.load()?;
    let filter = CompanyFilter::resolve(&options.companies, &ctx.config.companies);
    if filter.is_empty() {
        return Err(Error::InvalidArgument(
            "at least one company index or name is required".to_string(),
        ));
    }

    let (command, past, changed) = match options.action {
        BatchAction::Pause => (
            "batch-pause",
            "paused",
            ctx.store.batch_pause_for_companies(&filter, ctx.today)?,
        ),
        BatchAction::Resume => (
            "batch-resume",
            "resumed",
            ctx.store.batch_resume_for_companies(&filter, ctx.today)?,
        ),
    };

    let mut human = HumanOutput::new(format!("{changed} task(s) {past}"));
    human.push_summary("Companies", options.companies.join(", "));

    let output = BatchOutput {
        companies: options.companies,
        changed,
    };
    emit_success(ctx.output, command, &output, Some(&human))
}
