//! Recurrence rules.
//!
//! A rule is one of six families. On disk it is a loose record keyed by
//! `freq` with optional family fields; in memory it is the [`Recurrence`] sum
//! type. Conversion never fails: a missing `freq` means one-off, an unknown
//! one becomes [`Recurrence::Unknown`] (which never matches), and missing
//! family fields stay `None` so evaluation can decline instead of guessing.
//!
//! Everything here is pure pattern matching. Task-level gates (start/end
//! bounds, pause windows) live in [`crate::schedule`].

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use crate::date::{self, clamp_day, clamped_date, first_of_next_month};

/// Default quarter months when a quarterly rule names none.
pub const DEFAULT_QUARTER_MONTHS: [u32; 4] = [1, 4, 7, 10];

/// Upper bound on the months scanned looking for the next quarterly date.
const QUARTERLY_SCAN_MONTHS: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    #[serde(rename = "one-off")]
    OneOff,
    #[serde(rename = "monthly")]
    Monthly,
    #[serde(rename = "semi-monthly")]
    SemiMonthly,
    #[serde(rename = "weekly")]
    Weekly,
    #[serde(rename = "biweekly")]
    Biweekly,
    #[serde(rename = "quarterly")]
    Quarterly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::OneOff => "one-off",
            Frequency::Monthly => "monthly",
            Frequency::SemiMonthly => "semi-monthly",
            Frequency::Weekly => "weekly",
            Frequency::Biweekly => "biweekly",
            Frequency::Quarterly => "quarterly",
        }
    }

    /// Parse a frequency tag, tolerating case, `_` and missing hyphens.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "" | "one-off" | "oneoff" | "once" | "one-time" => Some(Frequency::OneOff),
            "monthly" => Some(Frequency::Monthly),
            "semi-monthly" | "semimonthly" | "twice-monthly" => Some(Frequency::SemiMonthly),
            "weekly" => Some(Frequency::Weekly),
            "biweekly" | "bi-weekly" | "fortnightly" => Some(Frequency::Biweekly),
            "quarterly" => Some(Frequency::Quarterly),
            _ => None,
        }
    }
}

impl std::str::FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Frequency::parse(s).ok_or_else(|| format!("unknown frequency '{s}'"))
    }
}

/// Weekly and biweekly parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WeeklyRule {
    pub weekday: Option<Weekday>,
    pub anchor_date: Option<NaiveDate>,
}

impl WeeklyRule {
    /// Base date the period is counted from. With a weekday, `start_on`
    /// wins over the anchor; without one only the anchor counts.
    fn base(&self, start_on: Option<NaiveDate>) -> Option<NaiveDate> {
        match self.weekday {
            Some(_) => start_on.or(self.anchor_date),
            None => self.anchor_date,
        }
    }

    fn matches(&self, day: NaiveDate, start_on: Option<NaiveDate>, period: i64) -> bool {
        match (self.weekday, self.base(start_on)) {
            (Some(weekday), Some(base)) => {
                day >= base
                    && day.weekday() == weekday
                    && (day - base).num_days() % period == 0
            }
            // No base to count a fortnight from: only plain weekly can match.
            (Some(weekday), None) => period == 7 && day.weekday() == weekday,
            (None, Some(anchor)) => day >= anchor && (day - anchor).num_days() % period == 0,
            (None, None) => false,
        }
    }

    fn next_on_or_after(
        &self,
        from: NaiveDate,
        start_on: Option<NaiveDate>,
        period: i64,
    ) -> Option<NaiveDate> {
        match (self.weekday, self.base(start_on)) {
            (weekday, Some(base)) => {
                let start = from.max(base);
                let rem = (start - base).num_days() % period;
                let candidate = start.checked_add_signed(Duration::days((period - rem) % period))?;
                match weekday {
                    Some(weekday) if candidate.weekday() != weekday => None,
                    _ => Some(candidate),
                }
            }
            (Some(weekday), None) if period == 7 => {
                let ahead = (7 + weekday.num_days_from_monday()
                    - from.weekday().num_days_from_monday())
                    % 7;
                from.checked_add_signed(Duration::days(ahead as i64))
            }
            _ => None,
        }
    }
}

/// A recurrence rule, one variant per family.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RecurrenceRecord", into = "RecurrenceRecord")]
pub enum Recurrence {
    /// Single occurrence on the task's `due` date.
    #[default]
    OneOff,
    Monthly {
        dom: Option<u32>,
    },
    SemiMonthly {
        dom: Option<u32>,
        dom2: Option<u32>,
    },
    Weekly(WeeklyRule),
    Biweekly(WeeklyRule),
    Quarterly {
        months: Vec<u32>,
        dom: Option<u32>,
    },
    /// A `freq` tag we do not understand; kept so it survives a save.
    Unknown {
        freq: String,
    },
}

impl Recurrence {
    pub fn frequency(&self) -> Option<Frequency> {
        match self {
            Recurrence::OneOff => Some(Frequency::OneOff),
            Recurrence::Monthly { .. } => Some(Frequency::Monthly),
            Recurrence::SemiMonthly { .. } => Some(Frequency::SemiMonthly),
            Recurrence::Weekly(_) => Some(Frequency::Weekly),
            Recurrence::Biweekly(_) => Some(Frequency::Biweekly),
            Recurrence::Quarterly { .. } => Some(Frequency::Quarterly),
            Recurrence::Unknown { .. } => None,
        }
    }

    pub fn is_one_off(&self) -> bool {
        matches!(self, Recurrence::OneOff)
    }

    /// Recurring rules are the ones that can be paused or batch-transitioned.
    pub fn is_recurring(&self) -> bool {
        !matches!(self, Recurrence::OneOff | Recurrence::Unknown { .. })
    }

    /// Short human description, e.g. `monthly on day 15`.
    pub fn describe(&self) -> String {
        fn dom_text(dom: Option<u32>) -> String {
            dom.map(|d| d.to_string()).unwrap_or_else(|| "?".to_string())
        }
        match self {
            Recurrence::OneOff => "one-off".to_string(),
            Recurrence::Monthly { dom } => format!("monthly on day {}", dom_text(*dom)),
            Recurrence::SemiMonthly { dom, dom2 } => {
                format!("semi-monthly on days {} and {}", dom_text(*dom), dom_text(*dom2))
            }
            Recurrence::Weekly(rule) | Recurrence::Biweekly(rule) => {
                let tag = if matches!(self, Recurrence::Weekly(_)) {
                    "weekly"
                } else {
                    "biweekly"
                };
                match (rule.weekday, rule.anchor_date) {
                    (Some(weekday), _) => format!("{tag} on {weekday}"),
                    (None, Some(anchor)) => format!("{tag} from {}", date::iso(anchor)),
                    (None, None) => tag.to_string(),
                }
            }
            Recurrence::Quarterly { months, dom } => {
                let months: Vec<String> = quarter_months(months).iter().map(u32::to_string).collect();
                format!("quarterly on day {} of months {}", dom_text(*dom), months.join(","))
            }
            Recurrence::Unknown { freq } => format!("unknown rule '{freq}'"),
        }
    }

    /// Whether `day` fits the rule's pattern, ignoring task-level gates.
    ///
    /// `due` is only consulted for one-off rules and `start_on` only as the
    /// weekly/biweekly base.
    pub fn matches(&self, day: NaiveDate, due: Option<NaiveDate>, start_on: Option<NaiveDate>) -> bool {
        match self {
            Recurrence::OneOff => due == Some(day),
            Recurrence::Monthly { dom } => dom.is_some_and(|dom| day_matches(day, dom)),
            Recurrence::SemiMonthly { dom, dom2 } => {
                if dom.is_none() && dom2.is_none() {
                    return false;
                }
                dom.is_some_and(|dom| day_matches(day, dom))
                    || dom2.is_some_and(|dom2| day_matches(day, dom2))
            }
            Recurrence::Weekly(rule) => rule.matches(day, start_on, 7),
            Recurrence::Biweekly(rule) => rule.matches(day, start_on, 14),
            Recurrence::Quarterly { months, dom } => {
                quarter_months(months).contains(&day.month())
                    && dom.is_some_and(|dom| day_matches(day, dom))
            }
            Recurrence::Unknown { .. } => false,
        }
    }

    /// Earliest date `>= from` that [`Recurrence::matches`], if any.
    pub fn next_on_or_after(
        &self,
        from: NaiveDate,
        due: Option<NaiveDate>,
        start_on: Option<NaiveDate>,
    ) -> Option<NaiveDate> {
        match self {
            Recurrence::OneOff => due.filter(|due| *due >= from),
            Recurrence::Monthly { dom } => {
                let dom = (*dom)?;
                next_monthly(from, &[dom])
            }
            Recurrence::SemiMonthly { dom, dom2 } => {
                let doms: Vec<u32> = [*dom, *dom2].into_iter().flatten().collect();
                if doms.is_empty() {
                    return None;
                }
                next_monthly(from, &doms)
            }
            Recurrence::Weekly(rule) => rule.next_on_or_after(from, start_on, 7),
            Recurrence::Biweekly(rule) => rule.next_on_or_after(from, start_on, 14),
            Recurrence::Quarterly { months, dom } => {
                let dom = (*dom)?;
                let months = quarter_months(months);
                let mut cursor = NaiveDate::from_ymd_opt(from.year(), from.month(), 1)?;
                for _ in 0..QUARTERLY_SCAN_MONTHS {
                    if months.contains(&cursor.month()) {
                        let candidate = clamped_date(cursor.year(), cursor.month(), dom)?;
                        if candidate >= from {
                            return Some(candidate);
                        }
                    }
                    cursor = first_of_next_month(cursor)?;
                }
                None
            }
            Recurrence::Unknown { .. } => None,
        }
    }
}

fn day_matches(day: NaiveDate, dom: u32) -> bool {
    day.day() == clamp_day(day.year(), day.month(), dom)
}

/// Valid quarter months, falling back to the default quarter when none given.
fn quarter_months(months: &[u32]) -> Vec<u32> {
    if months.is_empty() {
        return DEFAULT_QUARTER_MONTHS.to_vec();
    }
    months
        .iter()
        .copied()
        .filter(|month| (1..=12).contains(month))
        .collect()
}

/// Nearest clamped day-of-month candidate `>= from`, this month or next.
fn next_monthly(from: NaiveDate, doms: &[u32]) -> Option<NaiveDate> {
    let in_month = |anchor: NaiveDate| -> Option<NaiveDate> {
        doms.iter()
            .filter_map(|dom| clamped_date(anchor.year(), anchor.month(), *dom))
            .filter(|candidate| *candidate >= from)
            .min()
    };
    in_month(from).or_else(|| first_of_next_month(from).and_then(in_month))
}

// ---------------------------------------------------------------------------
// On-disk record
// ---------------------------------------------------------------------------

/// Loose persisted form of a rule. Every field is optional and tolerant of
/// junk values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecurrenceRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freq: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_u32")]
    pub dom: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_u32")]
    pub dom2: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_weekday")]
    pub weekday: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "date::opt_date")]
    pub anchor_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_months")]
    pub months: Option<Vec<u32>>,
}

impl From<RecurrenceRecord> for Recurrence {
    fn from(record: RecurrenceRecord) -> Self {
        let freq = match record.freq.as_deref() {
            None => Frequency::OneOff,
            Some(raw) => match Frequency::parse(raw) {
                Some(freq) => freq,
                None => {
                    return Recurrence::Unknown {
                        freq: raw.to_string(),
                    }
                }
            },
        };
        let weekly = || WeeklyRule {
            weekday: record.weekday.and_then(|n| Weekday::try_from(n as u8).ok()),
            anchor_date: record.anchor_date,
        };
        match freq {
            Frequency::OneOff => Recurrence::OneOff,
            Frequency::Monthly => Recurrence::Monthly { dom: record.dom },
            Frequency::SemiMonthly => Recurrence::SemiMonthly {
                dom: record.dom,
                dom2: record.dom2,
            },
            Frequency::Weekly => Recurrence::Weekly(weekly()),
            Frequency::Biweekly => Recurrence::Biweekly(weekly()),
            Frequency::Quarterly => Recurrence::Quarterly {
                months: record.months.clone().unwrap_or_default(),
                dom: record.dom,
            },
        }
    }
}

impl From<Recurrence> for RecurrenceRecord {
    fn from(rule: Recurrence) -> Self {
        let mut record = RecurrenceRecord {
            freq: rule.frequency().map(|f| f.as_str().to_string()),
            ..RecurrenceRecord::default()
        };
        match rule {
            Recurrence::OneOff => {}
            Recurrence::Monthly { dom } => record.dom = dom,
            Recurrence::SemiMonthly { dom, dom2 } => {
                record.dom = dom;
                record.dom2 = dom2;
            }
            Recurrence::Weekly(rule) | Recurrence::Biweekly(rule) => {
                record.weekday = rule.weekday.map(|w| w.num_days_from_monday());
                record.anchor_date = rule.anchor_date;
            }
            Recurrence::Quarterly { months, dom } => {
                record.dom = dom;
                if !months.is_empty() {
                    record.months = Some(months);
                }
            }
            Recurrence::Unknown { freq } => record.freq = Some(freq),
        }
        record
    }
}

/// Any JSON value a numeric field might hold on disk.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum RawNumber {
    Int(i64),
    Text(String),
    Other(IgnoredAny),
}

impl RawNumber {
    pub(crate) fn as_u32(&self) -> Option<u32> {
        match self {
            RawNumber::Int(value) => u32::try_from(*value).ok(),
            RawNumber::Text(text) => text.trim().parse().ok(),
            RawNumber::Other(_) => None,
        }
    }
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<RawNumber>::deserialize(deserializer)?;
    Ok(raw.and_then(|raw| raw.as_u32()).filter(|dom| *dom >= 1))
}

/// Weekday as 0 (Monday) ..= 6 (Sunday), or a weekday name.
fn lenient_weekday<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<RawNumber>::deserialize(deserializer)?;
    Ok(raw.and_then(|raw| match raw {
        RawNumber::Text(ref text) => text
            .trim()
            .parse::<Weekday>()
            .ok()
            .map(|w| w.num_days_from_monday())
            .or_else(|| raw.as_u32()),
        other => other.as_u32(),
    })
    .filter(|n| *n <= 6))
}

fn lenient_months<'de, D>(deserializer: D) -> Result<Option<Vec<u32>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawMonths {
        List(Vec<RawNumber>),
        Other(IgnoredAny),
    }

    Ok(match Option::<RawMonths>::deserialize(deserializer)? {
        Some(RawMonths::List(values)) => {
            Some(values.iter().filter_map(RawNumber::as_u32).collect())
        }
        _ => None,
    })
}
