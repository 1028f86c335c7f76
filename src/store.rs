//! Task Store: sole owner of the task list.
//!
//! The task file is a JSON array of task records. Loading never fails: a
//! missing file is an empty list, an unreadable or corrupt file is set aside
//! and replaced by an empty list, and records that are not objects are kept
//! aside and written back untouched. Every mutation goes through the store
//! and is persisted with a locked atomic overwrite; save errors propagate.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, info, warn};
use ulid::Ulid;

use crate::company::{CompanyDirectory, CompanyFilter};
use crate::error::{Error, Result};
use crate::ledger::{self, OccurrenceState};
use crate::lock::{self, DEFAULT_LOCK_TIMEOUT_MS};
use crate::pause::{self, Transition};
use crate::recurrence::Recurrence;
use crate::schedule::Scheduler;
use crate::task::{OccurrenceKey, Task};

/// Owns the id -> task map and its backing file.
#[derive(Debug)]
pub struct TaskStore {
    path: PathBuf,
    tasks: Vec<Task>,
    index: HashMap<String, usize>,
    /// Records that could not be read as tasks, written back verbatim.
    rejected: Vec<Value>,
    min_lead_days: u32,
    lock_timeout_ms: u64,
}

fn new_task_id() -> String {
    Ulid::new().to_string().to_lowercase()
}

impl TaskStore {
    /// An empty store backed by `path`. Nothing is read or written.
    pub fn new(path: impl Into<PathBuf>, min_lead_days: u32) -> Self {
        Self {
            path: path.into(),
            tasks: Vec::new(),
            index: HashMap::new(),
            rejected: Vec::new(),
            min_lead_days,
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }

    /// Load the task list at `path`, applying schema defaults.
    pub fn open<D>(path: impl Into<PathBuf>, directory: &D, min_lead_days: u32) -> Self
    where
        D: CompanyDirectory + ?Sized,
    {
        let mut store = Self::new(path, min_lead_days);
        for record in read_records(&store.path) {
            match serde_json::from_value::<Task>(record.clone()) {
                Ok(mut task) => {
                    backfill_company(&mut task, directory);
                    store.push(task);
                }
                Err(err) => {
                    warn!(path = %store.path.display(), error = %err, "keeping unreadable task record aside");
                    store.rejected.push(record);
                }
            }
        }
        debug!(path = %store.path.display(), tasks = store.tasks.len(), "task store loaded");
        store
    }

    pub fn with_lock_timeout(mut self, timeout_ms: u64) -> Self {
        self.lock_timeout_ms = timeout_ms;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.index.get(id).map(|&pos| &self.tasks[pos])
    }

    /// Like [`get`](Self::get), but an unknown id is an error.
    pub fn task(&self, id: &str) -> Result<&Task> {
        self.get(id)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))
    }

    fn task_mut(&mut self, id: &str) -> Result<&mut Task> {
        match self.index.get(id) {
            Some(&pos) => Ok(&mut self.tasks[pos]),
            None => Err(Error::TaskNotFound(id.to_string())),
        }
    }

    /// Normalize and index a task, assigning an id when missing or taken.
    fn push(&mut self, mut task: Task) -> usize {
        task.normalize(self.min_lead_days);
        task.id = task.id.trim().to_string();
        if task.id.is_empty() {
            task.id = new_task_id();
        } else if self.index.contains_key(&task.id) {
            let fresh = new_task_id();
            warn!(duplicate = %task.id, id = %fresh, "re-keying task with duplicate id");
            task.id = fresh;
        }
        let pos = self.tasks.len();
        self.index.insert(task.id.clone(), pos);
        self.tasks.push(task);
        pos
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .tasks
            .iter()
            .enumerate()
            .map(|(pos, task)| (task.id.clone(), pos))
            .collect();
    }

    /// Persist the whole list.
    pub fn save(&self) -> Result<()> {
        let mut records = Vec::with_capacity(self.tasks.len() + self.rejected.len());
        for task in &self.tasks {
            records.push(serde_json::to_value(task)?);
        }
        records.extend(self.rejected.iter().cloned());

        let json = serde_json::to_string_pretty(&records)?;
        lock::write_atomic_locked(&self.path, json.as_bytes(), self.lock_timeout_ms)?;
        debug!(path = %self.path.display(), tasks = self.tasks.len(), "task store saved");
        Ok(())
    }

    /// Add a task and save. Returns the stored task.
    pub fn add(&mut self, task: Task) -> Result<&Task> {
        if !task.id.trim().is_empty() && self.index.contains_key(task.id.trim()) {
            return Err(Error::InvalidArgument(format!(
                "task id '{}' already exists",
                task.id.trim()
            )));
        }
        let pos = self.push(task);
        self.save()?;
        Ok(&self.tasks[pos])
    }

    /// Delete a task and save.
    pub fn remove(&mut self, id: &str) -> Result<Task> {
        let pos = *self
            .index
            .get(id)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
        let task = self.tasks.remove(pos);
        self.rebuild_index();
        self.save()?;
        Ok(task)
    }

    /// Replace a task's rule and save. Recorded state stays keyed by date.
    pub fn update_recurrence(&mut self, id: &str, recurrence: Recurrence) -> Result<()> {
        self.task_mut(id)?.recurrence = recurrence;
        self.save()
    }

    fn occurrence_key(&self, id: &str, actual: NaiveDate, scheduler: &Scheduler) -> Result<OccurrenceKey> {
        let task = self.task(id)?;
        Ok(OccurrenceKey::new(actual, scheduler.display_date_for(task, actual)))
    }

    /// Flip done for the occurrence on `actual` and save. Returns the new state.
    pub fn toggle_done_for_date(
        &mut self,
        id: &str,
        actual: NaiveDate,
        scheduler: &Scheduler,
    ) -> Result<OccurrenceState> {
        let key = self.occurrence_key(id, actual, scheduler)?;
        let state = ledger::toggle_done(self.task_mut(id)?, &key);
        self.save()?;
        Ok(state)
    }

    /// Flip cancelled for the occurrence on `actual` and save.
    pub fn toggle_cancel_for_date(
        &mut self,
        id: &str,
        actual: NaiveDate,
        scheduler: &Scheduler,
    ) -> Result<OccurrenceState> {
        let key = self.occurrence_key(id, actual, scheduler)?;
        let state = ledger::toggle_cancel(self.task_mut(id)?, &key);
        self.save()?;
        Ok(state)
    }

    /// Force the occurrence on `actual` into `state` and save.
    pub fn set_state_for_date(
        &mut self,
        id: &str,
        actual: NaiveDate,
        state: OccurrenceState,
        scheduler: &Scheduler,
    ) -> Result<()> {
        let key = self.occurrence_key(id, actual, scheduler)?;
        ledger::set_state(self.task_mut(id)?, &key, state);
        self.save()
    }

    fn transition(
        &mut self,
        id: &str,
        today: NaiveDate,
        apply: fn(&mut Task, NaiveDate) -> Transition,
    ) -> Result<Transition> {
        let outcome = apply(self.task_mut(id)?, today);
        match outcome {
            Transition::Applied => self.save()?,
            Transition::Declined(reason) => debug!(task = %id, %reason, "transition declined"),
        }
        Ok(outcome)
    }

    pub fn pause(&mut self, id: &str, today: NaiveDate) -> Result<Transition> {
        self.transition(id, today, pause::pause)
    }

    pub fn resume(&mut self, id: &str, today: NaiveDate) -> Result<Transition> {
        self.transition(id, today, pause::resume)
    }

    pub fn stop(&mut self, id: &str, today: NaiveDate) -> Result<Transition> {
        self.transition(id, today, pause::stop)
    }

    /// Pause every matching recurring task; saves once. Returns the count changed.
    pub fn batch_pause_for_companies(&mut self, filter: &CompanyFilter, today: NaiveDate) -> Result<usize> {
        let changed = pause::batch_pause(self.tasks.iter_mut(), filter, today);
        info!(changed, "batch pause");
        if changed > 0 {
            self.save()?;
        }
        Ok(changed)
    }

    /// Resume every matching paused task; saves once. Returns the count changed.
    pub fn batch_resume_for_companies(&mut self, filter: &CompanyFilter, today: NaiveDate) -> Result<usize> {
        let changed = pause::batch_resume(self.tasks.iter_mut(), filter, today);
        info!(changed, "batch resume");
        if changed > 0 {
            self.save()?;
        }
        Ok(changed)
    }
}

fn backfill_company<D>(task: &mut Task, directory: &D)
where
    D: CompanyDirectory + ?Sized,
{
    if task.company_idx.is_none() {
        if let Some(name) = task.company_name.as_deref() {
            task.company_idx = directory.index_of(name);
        }
    }
}

/// Read the raw records, degrading every failure to an empty list.
fn read_records(path: &Path) -> Vec<Value> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no task file yet");
            return Vec::new();
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "task file unreadable; starting empty");
            return Vec::new();
        }
    };
    if content.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Array(records)) => records,
        Ok(_) | Err(_) => {
            set_aside(path);
            Vec::new()
        }
    }
}

/// Copy a corrupt task file to `<file>.corrupt` before it gets overwritten.
fn set_aside(path: &Path) {
    let backup = PathBuf::from(format!("{}.corrupt", path.display()));
    match fs::copy(path, &backup) {
        Ok(_) => warn!(path = %path.display(), backup = %backup.display(), "task file corrupt; starting empty"),
        Err(err) => warn!(path = %path.display(), error = %err, "task file corrupt and could not be backed up"),
    }
}
