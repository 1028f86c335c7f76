//! Company directory interface.
//!
//! The engine only needs `(index, name)` pairs: to backfill a task's
//! `company_idx` from its `company_name` at load, and to select tasks for
//! batch pause/resume. Names compare case-insensitively.

use serde::{Deserialize, Serialize};

use crate::task::Task;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub index: usize,
    pub name: String,
}

impl Company {
    pub fn new(index: usize, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
        }
    }
}

/// Resolves company indexes and names.
pub trait CompanyDirectory {
    fn index_of(&self, name: &str) -> Option<usize>;
    fn name_of(&self, index: usize) -> Option<&str>;
}

impl CompanyDirectory for [Company] {
    fn index_of(&self, name: &str) -> Option<usize> {
        let needle = name.trim();
        self.iter()
            .find(|company| company.name.eq_ignore_ascii_case(needle))
            .map(|company| company.index)
    }

    fn name_of(&self, index: usize) -> Option<&str> {
        self.iter()
            .find(|company| company.index == index)
            .map(|company| company.name.as_str())
    }
}

impl CompanyDirectory for Vec<Company> {
    fn index_of(&self, name: &str) -> Option<usize> {
        self.as_slice().index_of(name)
    }

    fn name_of(&self, index: usize) -> Option<&str> {
        self.as_slice().name_of(index)
    }
}

/// A set of companies, matched by index or case-insensitive name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyFilter {
    indexes: Vec<usize>,
    names: Vec<String>,
}

impl CompanyFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_index(mut self, index: usize) -> Self {
        if !self.indexes.contains(&index) {
            self.indexes.push(index);
        }
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        let name = name.trim().to_lowercase();
        if !name.is_empty() && !self.names.contains(&name) {
            self.names.push(name);
        }
        self
    }

    /// Build a filter from user selectors: numeric selectors are indexes,
    /// anything else is a name. Names known to `directory` also match by index.
    pub fn resolve<D>(selectors: &[String], directory: &D) -> Self
    where
        D: CompanyDirectory + ?Sized,
    {
        selectors.iter().fold(Self::new(), |filter, selector| {
            match selector.trim().parse::<usize>() {
                Ok(index) => filter.with_index(index),
                Err(_) => {
                    let filter = filter.with_name(selector);
                    match directory.index_of(selector) {
                        Some(index) => filter.with_index(index),
                        None => filter,
                    }
                }
            }
        })
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty() && self.names.is_empty()
    }

    pub fn matches(&self, task: &Task) -> bool {
        if task
            .company_idx
            .is_some_and(|idx| self.indexes.contains(&idx))
        {
            return true;
        }
        task.company_name
            .as_deref()
            .map(|name| self.names.contains(&name.trim().to_lowercase()))
            .unwrap_or(false)
    }
}
