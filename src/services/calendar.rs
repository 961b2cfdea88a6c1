// src/services/calendar.rs
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use log::info;
use std::collections::BTreeSet;
use std::path::Path;

use crate::error::{DashboardError, Result};
use crate::models::DateRange;

/// Unscheduled full-day NYSE closures.
const SPECIAL_CLOSURES: &[(i32, u32, u32)] = &[
    (2001, 9, 11),
    (2001, 9, 12),
    (2001, 9, 13),
    (2001, 9, 14),
    (2004, 6, 11),
    (2007, 1, 2),
    (2012, 10, 29),
    (2012, 10, 30),
    (2018, 12, 5),
    (2025, 1, 9),
];

/// Trading-day calendar: weekends, NYSE holiday rules and any extra dates.
#[derive(Debug, Clone, Default)]
pub struct TradingCalendar {
    extra_holidays: BTreeSet<NaiveDate>,
}

impl TradingCalendar {
    pub fn nyse() -> Self {
        let extra_holidays = SPECIAL_CLOSURES
            .iter()
            .filter_map(|&(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
            .collect();
        TradingCalendar { extra_holidays }
    }

    pub fn with_holidays<I>(mut self, dates: I) -> Self
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        self.extra_holidays.extend(dates);
        self
    }

    /// Reads extra holidays from a CSV file whose first column is a
    /// `YYYY-MM-DD` date. A header row is expected.
    pub fn load_holidays_csv(self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut rdr = csv::Reader::from_path(path)
            .map_err(|e| DashboardError::Config(format!("{}: {}", path.display(), e)))?;

        let mut dates = Vec::new();
        for record in rdr.records() {
            let row = record.map_err(|e| DashboardError::Config(e.to_string()))?;
            let cell = row.get(0).unwrap_or("").trim();
            if cell.is_empty() {
                continue;
            }
            let date = NaiveDate::parse_from_str(cell, "%Y-%m-%d").map_err(|e| {
                DashboardError::Config(format!("bad holiday date '{}' in {}: {}", cell, path.display(), e))
            })?;
            dates.push(date);
        }

        info!("Loaded {} extra holidays from {}", dates.len(), path.display());
        Ok(self.with_holidays(dates))
    }

    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        !is_weekend(date) && !self.is_holiday(date)
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.extra_holidays.contains(&date) || is_nyse_holiday(date)
    }

    /// `date` itself when it trades, otherwise the next trading day.
    pub fn next_trading_day(&self, date: NaiveDate) -> NaiveDate {
        let mut day = date;
        while !self.is_trading_day(day) {
            day += Duration::days(1);
        }
        day
    }

    /// `date` itself when it trades, otherwise the previous trading day.
    pub fn previous_trading_day(&self, date: NaiveDate) -> NaiveDate {
        let mut day = date;
        while !self.is_trading_day(day) {
            day -= Duration::days(1);
        }
        day
    }

    /// Rolls the start forward and the end backward onto trading days.
    pub fn adjust_range(&self, start: NaiveDate, end: NaiveDate) -> Result<DateRange> {
        let requested = DateRange::new(start, end)?;
        let adjusted_start = self.next_trading_day(requested.start);
        let adjusted_end = self.previous_trading_day(requested.end);

        if adjusted_start > adjusted_end {
            return Err(DashboardError::InvalidRange { start, end });
        }
        Ok(DateRange {
            start: adjusted_start,
            end: adjusted_end,
        })
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn is_nyse_holiday(date: NaiveDate) -> bool {
    nyse_holidays(date.year()).contains(&date)
}

/// Scheduled NYSE full-day holidays observed within `year`.
pub fn nyse_holidays(year: i32) -> Vec<NaiveDate> {
    let ymd = |m, d| NaiveDate::from_ymd_opt(year, m, d);
    let mut days = Vec::with_capacity(10);

    // Saturday New Year's Day is not moved back into the previous year.
    if let Some(new_year) = ymd(1, 1) {
        match new_year.weekday() {
            Weekday::Sat => {}
            Weekday::Sun => days.push(new_year + Duration::days(1)),
            _ => days.push(new_year),
        }
    }

    if year >= 1998 {
        days.extend(nth_weekday(year, 1, Weekday::Mon, 3));
    }
    days.extend(nth_weekday(year, 2, Weekday::Mon, 3));
    days.extend(easter_sunday(year).map(|e| e - Duration::days(2)));
    days.extend(last_weekday(year, 5, Weekday::Mon));
    if year >= 2022 {
        days.extend(ymd(6, 19).map(observed));
    }
    days.extend(ymd(7, 4).map(observed));
    days.extend(nth_weekday(year, 9, Weekday::Mon, 1));
    days.extend(nth_weekday(year, 11, Weekday::Thu, 4));
    days.extend(ymd(12, 25).map(observed));

    days
}

fn observed(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date - Duration::days(1),
        Weekday::Sun => date + Duration::days(1),
        _ => date,
    }
}

fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u32) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, n as u8)
}

fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let mut day = NaiveDate::from_ymd_opt(next_year, next_month, 1)? - Duration::days(1);
    while day.weekday() != weekday {
        day -= Duration::days(1);
    }
    Some(day)
}

/// Gregorian Easter Sunday (anonymous computus).
fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}
