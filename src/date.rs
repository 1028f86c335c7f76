//! Lenient calendar-date handling.
//!
//! Every date that reaches the engine from disk or from a caller goes through
//! [`parse_date`]. Accepted forms are ISO `YYYY-MM-DD` and compact `YYYYMMDD`;
//! anything else is treated as absent rather than as an error, so one bad
//! field never disables the rest of a task.

use chrono::{Datelike, NaiveDate};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serializer};

const ISO_FORMAT: &str = "%Y-%m-%d";
const COMPACT_FORMAT: &str = "%Y%m%d";

/// Parse an ISO or compact date, returning `None` for anything else.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.len() == 8 && raw.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveDate::parse_from_str(raw, COMPACT_FORMAT).ok();
    }
    if raw.len() == 10 {
        return NaiveDate::parse_from_str(raw, ISO_FORMAT).ok();
    }
    None
}

/// ISO form used for every persisted key.
pub fn iso(date: NaiveDate) -> String {
    date.format(ISO_FORMAT).to_string()
}

/// Last valid day of the given month (28..=31).
pub fn last_day_of_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

/// Clamp a configured day-of-month to the month's last valid day.
pub fn clamp_day(year: i32, month: u32, dom: u32) -> u32 {
    dom.clamp(1, last_day_of_month(year, month))
}

/// Date for `dom` in the given month, clamped.
pub fn clamped_date(year: i32, month: u32, dom: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, clamp_day(year, month, dom))
}

/// First day of the month after the one containing `date`.
pub fn first_of_next_month(date: NaiveDate) -> Option<NaiveDate> {
    if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    }
}

/// Anything a date or text field might contain on disk.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum LenientText {
    Text(String),
    Number(u64),
    Other(IgnoredAny),
}

impl LenientText {
    pub(crate) fn into_text(self) -> Option<String> {
        match self {
            LenientText::Text(text) => Some(text),
            LenientText::Number(value) => Some(value.to_string()),
            LenientText::Other(_) => None,
        }
    }
}

/// Serde adapter for optional dates persisted as strings, `""` meaning absent.
pub mod opt_date {
    use super::*;

    pub fn serialize<S>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_str(&iso(*date)),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<LenientText>::deserialize(deserializer)?;
        Ok(raw
            .and_then(LenientText::into_text)
            .and_then(|text| parse_date(&text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_iso_and_compact() {
        assert_eq!(parse_date("2025-03-15"), Some(ymd(2025, 3, 15)));
        assert_eq!(parse_date("20250315"), Some(ymd(2025, 3, 15)));
        assert_eq!(parse_date(" 2025-03-15 "), Some(ymd(2025, 3, 15)));
    }

    #[test]
    fn garbage_is_absent() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("03/15/2025"), None);
        assert_eq!(parse_date("2025-02-30"), None);
        assert_eq!(parse_date("2025315"), None);
        assert_eq!(parse_date("tomorrow"), None);
    }

    #[test]
    fn month_lengths() {
        assert_eq!(last_day_of_month(2024, 2), 29);
        assert_eq!(last_day_of_month(2025, 2), 28);
        assert_eq!(last_day_of_month(2025, 4), 30);
        assert_eq!(last_day_of_month(2025, 12), 31);
    }

    #[test]
    fn clamp_reduces_overflowing_day() {
        assert_eq!(clamped_date(2025, 4, 31), Some(ymd(2025, 4, 30)));
        assert_eq!(clamped_date(2025, 2, 30), Some(ymd(2025, 2, 28)));
        assert_eq!(clamped_date(2025, 1, 0), Some(ymd(2025, 1, 1)));
    }

    #[test]
    fn opt_date_tolerates_junk() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(default, with = "opt_date")]
            when: Option<NaiveDate>,
        }

        let ok: Holder = serde_json::from_str(r#"{"when": "2025-11-01"}"#).unwrap();
        assert_eq!(ok.when, Some(ymd(2025, 11, 1)));
        let compact: Holder = serde_json::from_str(r#"{"when": 20251101}"#).unwrap();
        assert_eq!(compact.when, Some(ymd(2025, 11, 1)));
        let empty: Holder = serde_json::from_str(r#"{"when": ""}"#).unwrap();
        assert_eq!(empty.when, None);
        let null: Holder = serde_json::from_str(r#"{"when": null}"#).unwrap();
        assert_eq!(null.when, None);
        let junk: Holder = serde_json::from_str(r#"{"when": {"nested": true}}"#).unwrap();
        assert_eq!(junk.when, None);
        let missing: Holder = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.when, None);
    }
}
