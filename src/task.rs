//! Task records.
//!
//! A [`Task`] is the only persisted entity. Occurrences are derived from it on
//! demand and never stored; per-occurrence state lives in the dual-keyed
//! [`DateKeys`] sets.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::date::{self, opt_date, parse_date, LenientText};
use crate::recurrence::{RawNumber, Recurrence, RecurrenceRecord};

/// Minimum lead for methods that need submission time (mail, ACH).
pub const DEFAULT_MIN_LEAD_DAYS: u32 = 2;

/// Largest lead time kept on a task, in business days (about three months).
pub const MAX_LEAD_DAYS: u32 = 60;

/// How the deliverable is submitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    #[default]
    None,
    Mail,
    DirectDeposit,
}

impl Method {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "" | "none" => Some(Method::None),
            "mail" => Some(Method::Mail),
            "direct_deposit" | "ach" => Some(Method::DirectDeposit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::None => "none",
            Method::Mail => "mail",
            Method::DirectDeposit => "direct_deposit",
        }
    }

    /// Whether the display date must be pulled ahead by lead days.
    pub fn requires_lead_time(&self) -> bool {
        !matches!(self, Method::None)
    }
}

impl std::str::FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Method::parse(s).ok_or_else(|| format!("unknown method '{s}' (expected none|mail|direct_deposit)"))
    }
}

impl<'de> Deserialize<'de> for Method {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<LenientText>::deserialize(deserializer)?;
        Ok(raw
            .and_then(LenientText::into_text)
            .and_then(|text| Method::parse(&text))
            .unwrap_or_default())
    }
}

/// Identity of one occurrence: the rule's actual date plus the display date
/// it had when state was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct OccurrenceKey {
    pub actual: NaiveDate,
    pub display: NaiveDate,
}

impl OccurrenceKey {
    pub fn new(actual: NaiveDate, display: NaiveDate) -> Self {
        Self { actual, display }
    }
}

/// A set of ISO date keys recording completed or cancelled occurrences.
///
/// Each recorded occurrence contributes its actual date and, when different,
/// its display date. Lookups match on either, so state recorded before a rule
/// edit moved the display date is still found. Entries that do not parse as
/// dates are preserved verbatim but never match.
///
/// The keys form one pool, not pairs. When one occurrence's display date is
/// another occurrence's actual date (semi-monthly on the 1st and 3rd with a
/// two-day lead), marking the first also marks the second, and clearing the
/// second drops the key the first shares with it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DateKeys(BTreeSet<String>);

impl DateKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &OccurrenceKey) -> bool {
        self.0.contains(&date::iso(key.actual)) || self.0.contains(&date::iso(key.display))
    }

    pub fn contains_date(&self, day: NaiveDate) -> bool {
        self.0.contains(&date::iso(day))
    }

    /// Record both keys of an occurrence.
    pub fn insert(&mut self, key: &OccurrenceKey) {
        self.0.insert(date::iso(key.actual));
        if key.display != key.actual {
            self.0.insert(date::iso(key.display));
        }
    }

    /// Forget both keys of an occurrence. Returns whether anything was removed.
    pub fn remove(&mut self, key: &OccurrenceKey) -> bool {
        let actual = self.0.remove(&date::iso(key.actual));
        let display = self.0.remove(&date::iso(key.display));
        actual || display
    }

    /// Parsable keys as dates, ascending.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.0.iter().filter_map(|raw| parse_date(raw))
    }

    pub fn raw(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for DateKeys {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawKeys {
            List(Vec<LenientText>),
            Other(serde::de::IgnoredAny),
        }

        let entries = match Option::<RawKeys>::deserialize(deserializer)? {
            Some(RawKeys::List(entries)) => entries,
            _ => Vec::new(),
        };
        let keys = entries
            .into_iter()
            .filter_map(LenientText::into_text)
            .map(|text| match parse_date(&text) {
                Some(day) => date::iso(day),
                None => text,
            })
            .filter(|text| !text.trim().is_empty())
            .collect();
        Ok(DateKeys(keys))
    }
}

impl<const N: usize> From<[&str; N]> for DateKeys {
    fn from(keys: [&str; N]) -> Self {
        DateKeys(keys.iter().map(|k| k.to_string()).collect())
    }
}

/// A closed pause interval `[from, until)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseWindow {
    #[serde(with = "iso_date")]
    pub from: NaiveDate,
    #[serde(with = "iso_date")]
    pub until: NaiveDate,
}

impl PauseWindow {
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.from <= day && day < self.until
    }
}

mod iso_date {
    use chrono::NaiveDate;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&crate::date::iso(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        crate::date::parse_date(&raw).ok_or_else(|| D::Error::custom(format!("invalid date '{raw}'")))
    }
}

/// A recurring (or one-off) deadline definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Free-form tag, normalized upper-case on load.
    #[serde(default)]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient_index")]
    pub company_idx: Option<usize>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub company_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_recurrence")]
    pub recurrence: Recurrence,
    #[serde(default, with = "opt_date")]
    pub due: Option<NaiveDate>,
    #[serde(default, with = "opt_date")]
    pub start_on: Option<NaiveDate>,
    #[serde(default, with = "opt_date")]
    pub end_on: Option<NaiveDate>,
    #[serde(default = "default_true")]
    pub is_enabled: bool,
    #[serde(default)]
    pub is_paused: bool,
    #[serde(default, with = "opt_date")]
    pub pause_from: Option<NaiveDate>,
    #[serde(default, with = "opt_date")]
    pub resume_from: Option<NaiveDate>,
    /// Earlier closed pause windows, kept so a later pause cannot reopen them.
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "lenient_windows")]
    pub pause_history: Vec<PauseWindow>,
    #[serde(default)]
    pub completed: DateKeys,
    #[serde(default)]
    pub cancelled: DateKeys,
    #[serde(default)]
    pub method: Method,
    #[serde(default, deserialize_with = "lenient_lead_days")]
    pub action_lead_days: u32,
    /// Keys owned by other parts of the application, carried through saves.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_true() -> bool {
    true
}

impl Task {
    pub fn new(title: impl Into<String>, recurrence: Recurrence) -> Self {
        Self {
            id: String::new(),
            title: title.into(),
            kind: String::new(),
            company_idx: None,
            company_name: None,
            recurrence,
            due: None,
            start_on: None,
            end_on: None,
            is_enabled: true,
            is_paused: false,
            pause_from: None,
            resume_from: None,
            pause_history: Vec::new(),
            completed: DateKeys::new(),
            cancelled: DateKeys::new(),
            method: Method::None,
            action_lead_days: 0,
            extra: serde_json::Map::new(),
        }
    }

    /// A one-off task due on `due`.
    pub fn one_off(title: impl Into<String>, due: NaiveDate) -> Self {
        let mut task = Self::new(title, Recurrence::OneOff);
        task.due = Some(due);
        task
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_method(mut self, method: Method, lead_days: u32) -> Self {
        self.method = method;
        self.action_lead_days = lead_days;
        self
    }

    pub fn with_company(mut self, idx: Option<usize>, name: Option<&str>) -> Self {
        self.company_idx = idx;
        self.company_name = name.map(str::to_string);
        self
    }

    /// Stopped tasks have an end date and accept no pause transitions.
    pub fn is_stopped(&self) -> bool {
        self.end_on.is_some()
    }

    /// The current `[pause_from, resume_from)` interval, if closed.
    pub fn closed_pause_window(&self) -> Option<PauseWindow> {
        match (self.pause_from, self.resume_from) {
            (Some(from), Some(until)) if from < until => Some(PauseWindow { from, until }),
            _ => None,
        }
    }

    /// Every closed pause window, historical first.
    pub fn closed_pause_windows(&self) -> impl Iterator<Item = PauseWindow> + '_ {
        self.pause_history
            .iter()
            .copied()
            .chain(self.closed_pause_window())
    }

    /// Apply schema normalization: upper-case kind and the lead floor and cap.
    pub fn normalize(&mut self, min_lead_days: u32) {
        self.kind = self.kind.trim().to_ascii_uppercase();
        self.title = self.title.trim().to_string();
        if self.method.requires_lead_time() && self.action_lead_days < min_lead_days {
            self.action_lead_days = min_lead_days;
        }
        self.action_lead_days = self.action_lead_days.min(MAX_LEAD_DAYS);
        if let Some(name) = self.company_name.as_mut() {
            *name = name.trim().to_string();
        }
        if self.company_name.as_deref() == Some("") {
            self.company_name = None;
        }
    }
}

fn lenient_recurrence<'de, D>(deserializer: D) -> Result<Recurrence, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawRule {
        Rule(RecurrenceRecord),
        Tag(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Option::<RawRule>::deserialize(deserializer)? {
        None => Recurrence::OneOff,
        Some(RawRule::Rule(record)) => record.into(),
        Some(RawRule::Tag(freq)) => RecurrenceRecord {
            freq: Some(freq),
            ..RecurrenceRecord::default()
        }
        .into(),
        Some(RawRule::Other(_)) => Recurrence::Unknown {
            freq: "invalid".to_string(),
        },
    })
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<LenientText>::deserialize(deserializer)?;
    Ok(raw.and_then(LenientText::into_text))
}

fn lenient_index<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawNumber>::deserialize(deserializer)?;
    Ok(raw.and_then(|raw| raw.as_u32()).map(|n| n as usize))
}

fn lenient_lead_days<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawNumber>::deserialize(deserializer)?;
    Ok(raw.and_then(|raw| raw.as_u32()).unwrap_or(0))
}

fn lenient_windows<'de, D>(deserializer: D) -> Result<Vec<PauseWindow>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawWindow {
        Window(PauseWindow),
        Other(serde::de::IgnoredAny),
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawWindows {
        List(Vec<RawWindow>),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Option::<RawWindows>::deserialize(deserializer)? {
        Some(RawWindows::List(windows)) => windows
            .into_iter()
            .filter_map(|raw| match raw {
                RawWindow::Window(window) if window.from < window.until => Some(window),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}
