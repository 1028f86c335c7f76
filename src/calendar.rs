//! US federal holiday calendar and business-day arithmetic.
//!
//! A business day is a weekday that is not a federal holiday. Holidays are
//! the fixed-date and nth-weekday rules as written; no observed-day shifting
//! is applied (a Saturday July 4th does not move the Friday).
//!
//! Holiday sets are memoized per year inside each [`HolidayCalendar`], so two
//! calendars never share state.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Serialize;

use crate::date::last_day_of_month;

/// Date rolling over a business-day calendar.
pub trait BusinessDays {
    /// Whether `date` is a holiday (weekends are handled separately).
    fn is_holiday(&self, date: NaiveDate) -> bool;

    fn is_weekend(&self, date: NaiveDate) -> bool {
        matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    fn is_business_day(&self, date: NaiveDate) -> bool {
        !self.is_weekend(date) && !self.is_holiday(date)
    }

    /// Roll backward, one day at a time, until `date` is a business day.
    /// Never advances; a business day is returned unchanged.
    fn adjust_if_weekend_or_holiday(&self, date: NaiveDate) -> NaiveDate {
        let mut current = date;
        while !self.is_business_day(current) {
            match current.pred_opt() {
                Some(prev) => current = prev,
                None => break,
            }
        }
        current
    }

    /// Move `n` business days forward (`n > 0`) or backward (`n < 0`).
    /// Non-business days are stepped over without being counted.
    fn shift_business_days(&self, date: NaiveDate, n: i32) -> NaiveDate {
        let step = if n >= 0 { Duration::days(1) } else { Duration::days(-1) };
        let mut remaining = n.unsigned_abs();
        let mut current = date;
        while remaining > 0 {
            match current.checked_add_signed(step) {
                Some(next) => current = next,
                None => break,
            }
            if self.is_business_day(current) {
                remaining -= 1;
            }
        }
        current
    }
}

/// A named federal holiday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Holiday {
    pub date: NaiveDate,
    pub name: &'static str,
}

/// US federal holiday calendar with a per-instance year cache.
#[derive(Debug, Default)]
pub struct HolidayCalendar {
    cache: RefCell<HashMap<i32, BTreeSet<NaiveDate>>>,
}

impl HolidayCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Holiday dates for `year`, computed once and memoized.
    pub fn holidays_for_year(&self, year: i32) -> BTreeSet<NaiveDate> {
        self.cache
            .borrow_mut()
            .entry(year)
            .or_insert_with(|| federal_holidays(year).into_iter().map(|h| h.date).collect())
            .clone()
    }

    /// Holidays for `year` with their names, in date order.
    pub fn named_holidays(&self, year: i32) -> Vec<Holiday> {
        let mut holidays = federal_holidays(year);
        holidays.sort_by_key(|h| h.date);
        holidays
    }

    /// Number of years currently memoized.
    pub fn cached_years(&self) -> usize {
        self.cache.borrow().len()
    }
}

impl BusinessDays for HolidayCalendar {
    fn is_holiday(&self, date: NaiveDate) -> bool {
        self.cache
            .borrow_mut()
            .entry(date.year())
            .or_insert_with(|| {
                federal_holidays(date.year())
                    .into_iter()
                    .map(|h| h.date)
                    .collect()
            })
            .contains(&date)
    }
}

fn federal_holidays(year: i32) -> Vec<Holiday> {
    let fixed = [
        (1, 1, "New Year's Day"),
        (6, 19, "Juneteenth National Independence Day"),
        (7, 4, "Independence Day"),
        (11, 11, "Veterans Day"),
        (12, 25, "Christmas Day"),
    ];
    let floating = [
        (1, Weekday::Mon, 3, "Birthday of Martin Luther King, Jr."),
        (2, Weekday::Mon, 3, "Washington's Birthday"),
        (9, Weekday::Mon, 1, "Labor Day"),
        (10, Weekday::Mon, 2, "Columbus Day"),
        (11, Weekday::Thu, 4, "Thanksgiving Day"),
    ];

    let mut holidays: Vec<Holiday> = fixed
        .iter()
        .filter_map(|&(month, day, name)| {
            NaiveDate::from_ymd_opt(year, month, day).map(|date| Holiday { date, name })
        })
        .collect();
    holidays.extend(floating.iter().filter_map(|&(month, weekday, nth, name)| {
        nth_weekday(year, month, weekday, nth).map(|date| Holiday { date, name })
    }));
    if let Some(date) = last_weekday(year, 5, Weekday::Mon) {
        holidays.push(Holiday {
            date,
            name: "Memorial Day",
        });
    }
    holidays
}

/// The `nth` (1-based) occurrence of `weekday` in the month.
fn nth_weekday(year: i32, month: u32, weekday: Weekday, nth: u32) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, nth as u8)
}

fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let last = NaiveDate::from_ymd_opt(year, month, last_day_of_month(year, month))?;
    let back = (7 + last.weekday().num_days_from_monday() - weekday.num_days_from_monday()) % 7;
    last.checked_sub_signed(Duration::days(back as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn holidays_2025() {
        let cal = HolidayCalendar::new();
        let expected: BTreeSet<NaiveDate> = [
            ymd(2025, 1, 1),
            ymd(2025, 1, 20),
            ymd(2025, 2, 17),
            ymd(2025, 5, 26),
            ymd(2025, 6, 19),
            ymd(2025, 7, 4),
            ymd(2025, 9, 1),
            ymd(2025, 10, 13),
            ymd(2025, 11, 11),
            ymd(2025, 11, 27),
            ymd(2025, 12, 25),
        ]
        .into_iter()
        .collect();
        assert_eq!(cal.holidays_for_year(2025), expected);
    }

    #[test]
    fn memorial_day_when_may_ends_on_monday() {
        // May 31, 2027 is a Monday.
        let cal = HolidayCalendar::new();
        assert!(cal.is_holiday(ymd(2027, 5, 31)));
        assert!(!cal.is_holiday(ymd(2027, 5, 24)));
    }

    #[test]
    fn cache_is_per_instance() {
        let first = HolidayCalendar::new();
        let second = HolidayCalendar::new();
        first.holidays_for_year(2025);
        first.is_holiday(ymd(2026, 3, 3));
        assert_eq!(first.cached_years(), 2);
        assert_eq!(second.cached_years(), 0);
    }

    #[test]
    fn adjust_rolls_back_over_weekend() {
        let cal = HolidayCalendar::new();
        // Saturday 2025-03-15 -> Friday 2025-03-14
        assert_eq!(cal.adjust_if_weekend_or_holiday(ymd(2025, 3, 15)), ymd(2025, 3, 14));
        // Sunday too
        assert_eq!(cal.adjust_if_weekend_or_holiday(ymd(2025, 3, 16)), ymd(2025, 3, 14));
        // Business day untouched
        assert_eq!(cal.adjust_if_weekend_or_holiday(ymd(2025, 3, 12)), ymd(2025, 3, 12));
    }

    #[test]
    fn adjust_rolls_back_over_holiday_and_weekend() {
        let cal = HolidayCalendar::new();
        // Monday 2025-09-01 is Labor Day -> Friday 2025-08-29
        assert_eq!(cal.adjust_if_weekend_or_holiday(ymd(2025, 9, 1)), ymd(2025, 8, 29));
        // Thanksgiving Thursday -> Wednesday
        assert_eq!(cal.adjust_if_weekend_or_holiday(ymd(2025, 11, 27)), ymd(2025, 11, 26));
    }

    #[test]
    fn adjust_is_idempotent() {
        let cal = HolidayCalendar::new();
        let mut day = ymd(2024, 12, 1);
        while day <= ymd(2026, 1, 31) {
            let once = cal.adjust_if_weekend_or_holiday(day);
            assert!(once <= day);
            assert!(cal.is_business_day(once));
            assert_eq!(cal.adjust_if_weekend_or_holiday(once), once);
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn shift_counts_only_business_days() {
        let cal = HolidayCalendar::new();
        // Fri 2025-03-14 back two business days -> Wed 2025-03-12
        assert_eq!(cal.shift_business_days(ymd(2025, 3, 14), -2), ymd(2025, 3, 12));
        // Mon 2025-03-10 back one -> Fri 2025-03-07
        assert_eq!(cal.shift_business_days(ymd(2025, 3, 10), -1), ymd(2025, 3, 7));
        // Fri 2025-08-29 forward one skips weekend and Labor Day -> Tue 2025-09-02
        assert_eq!(cal.shift_business_days(ymd(2025, 8, 29), 1), ymd(2025, 9, 2));
        assert_eq!(cal.shift_business_days(ymd(2025, 3, 15), 0), ymd(2025, 3, 15));
    }

    #[test]
    fn named_holidays_are_sorted() {
        let cal = HolidayCalendar::new();
        let named = cal.named_holidays(2026);
        assert_eq!(named.len(), 11);
        assert_eq!(named[0].name, "New Year's Day");
        assert!(named.windows(2).all(|pair| pair[0].date < pair[1].date));
    }
}
