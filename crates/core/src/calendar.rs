//! Month grid for the progress calendar.
//!
//! The grid is laid out Sunday-first: a run of blank slots up to the weekday
//! of the 1st, then one slot per day. Each day rolls up every user's
//! `DailyProgress` for that date into a single rounded mean percentage and a
//! colour band.

use std::collections::HashMap;
use std::fmt;

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;
use thiserror::Error;

use crate::model::DailyProgress;
use crate::ratio;
use crate::time::date_key;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CalendarError {
    #[error("month index must be in 0..=11, got {0}")]
    MonthOutOfRange(i32),

    #[error("year {0} is outside the supported calendar range")]
    YearOutOfRange(i32),

    #[error("day {day} does not exist in {month}")]
    DayOutOfRange { day: u32, month: YearMonth },
}

pub const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// A calendar month addressed by year and zero-based month index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct YearMonth {
    year: i32,
    month: u32,
    #[serde(skip)]
    first_day: NaiveDate,
}

impl YearMonth {
    /// # Errors
    ///
    /// Returns `CalendarError::MonthOutOfRange` unless `month` is in 0..=11,
    /// or `CalendarError::YearOutOfRange` if the year cannot be represented.
    pub fn new(year: i32, month: i32) -> Result<Self, CalendarError> {
        let month0 = u32::try_from(month)
            .ok()
            .filter(|m| *m < 12)
            .ok_or(CalendarError::MonthOutOfRange(month))?;
        let first_day = NaiveDate::from_ymd_opt(year, month0 + 1, 1)
            .ok_or(CalendarError::YearOutOfRange(year))?;
        // The last day must be representable too.
        first_day
            .checked_add_months(Months::new(1))
            .ok_or(CalendarError::YearOutOfRange(year))?;
        Ok(Self {
            year,
            month: month0,
            first_day,
        })
    }

    /// The month containing `date`.
    #[must_use]
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month0(),
            first_day: date.with_day(1).unwrap_or(date),
        }
    }

    #[must_use]
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Zero-based month index (January is 0).
    #[must_use]
    pub fn month0(&self) -> u32 {
        self.month
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        MONTH_NAMES[self.month as usize]
    }

    #[must_use]
    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    #[must_use]
    pub fn last_day(&self) -> NaiveDate {
        self.first_day + chrono::Duration::days(i64::from(self.days_in_month()) - 1)
    }

    /// Number of days in the month (proleptic Gregorian).
    #[must_use]
    pub fn days_in_month(&self) -> u32 {
        match self.month + 1 {
            1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
            4 | 6 | 9 | 11 => 30,
            _ if self.first_day.leap_year() => 29,
            _ => 28,
        }
    }

    /// Blank cells before the 1st in a Sunday-first week.
    #[must_use]
    pub fn leading_blanks(&self) -> u32 {
        self.first_day.weekday().num_days_from_sunday()
    }

    /// Calendar date of `day` (1-based) in this month.
    ///
    /// # Errors
    ///
    /// Returns `CalendarError::DayOutOfRange` for day 0 or past month end.
    pub fn day(&self, day: u32) -> Result<NaiveDate, CalendarError> {
        if day == 0 || day > self.days_in_month() {
            return Err(CalendarError::DayOutOfRange { day, month: *self });
        }
        Ok(self.first_day + chrono::Duration::days(i64::from(day) - 1))
    }

    /// `YYYY-MM-DD` for `day` of this month; what a day selection resolves to.
    ///
    /// # Errors
    ///
    /// Returns `CalendarError::DayOutOfRange` for day 0 or past month end.
    pub fn day_key(&self, day: u32) -> Result<String, CalendarError> {
        self.day(day).map(date_key)
    }

    /// Iterate every date of the month in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.first_day.iter_days().take(self.days_in_month() as usize)
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month0() == self.month
    }

    #[must_use]
    pub fn previous(&self) -> Option<Self> {
        self.first_day
            .checked_sub_months(Months::new(1))
            .map(Self::of)
    }

    #[must_use]
    pub fn next(&self) -> Option<Self> {
        self.first_day
            .checked_add_months(Months::new(1))
            .map(Self::of)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name(), self.year)
    }
}

/// Completion colour band. The highest matching threshold wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorBand {
    /// Exactly 100%.
    Complete,
    /// 75..100
    High,
    /// 50..75
    MediumHigh,
    /// 25..50
    MediumLow,
    /// 1..25
    Low,
    /// 0%
    #[serde(rename = "none")]
    NoProgress,
}

impl ColorBand {
    #[must_use]
    pub fn from_percentage(percentage: u8) -> Self {
        match percentage {
            100.. => ColorBand::Complete,
            75..=99 => ColorBand::High,
            50..=74 => ColorBand::MediumHigh,
            25..=49 => ColorBand::MediumLow,
            1..=24 => ColorBand::Low,
            0 => ColorBand::NoProgress,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ColorBand::Complete => "complete",
            ColorBand::High => "high",
            ColorBand::MediumHigh => "medium-high",
            ColorBand::MediumLow => "medium-low",
            ColorBand::Low => "low",
            ColorBand::NoProgress => "none",
        }
    }
}

impl fmt::Display for ColorBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One day of the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayCell {
    pub day: u32,
    pub date: NaiveDate,
    /// Mean completion across every user with an entry that day.
    pub percentage: Option<u8>,
    pub band: Option<ColorBand>,
    pub entries: Vec<DailyProgress>,
    pub is_today: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CalendarSlot {
    Blank,
    Day(DayCell),
}

impl CalendarSlot {
    #[must_use]
    pub fn as_day(&self) -> Option<&DayCell> {
        match self {
            CalendarSlot::Blank => None,
            CalendarSlot::Day(cell) => Some(cell),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarGrid {
    pub month: YearMonth,
    pub title: String,
    /// Column headers, Sunday first, matching the slot order.
    pub weekdays: [&'static str; 7],
    pub slots: Vec<CalendarSlot>,
}

impl CalendarGrid {
    #[must_use]
    pub fn leading_blanks(&self) -> usize {
        self.slots
            .iter()
            .take_while(|slot| matches!(slot, CalendarSlot::Blank))
            .count()
    }

    pub fn days(&self) -> impl Iterator<Item = &DayCell> {
        self.slots.iter().filter_map(CalendarSlot::as_day)
    }

    #[must_use]
    pub fn day(&self, day: u32) -> Option<&DayCell> {
        self.days().find(|cell| cell.day == day)
    }

    /// Flag the cell for `today`, if it falls in this month.
    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        for slot in &mut self.slots {
            if let CalendarSlot::Day(cell) = slot {
                cell.is_today = cell.date == today;
            }
        }
        self
    }
}

/// Lay out `month` and roll up `progress` per day.
///
/// Entries outside the month are ignored.
#[must_use]
pub fn build_calendar_grid(month: YearMonth, progress: &[DailyProgress]) -> CalendarGrid {
    let mut by_date: HashMap<NaiveDate, Vec<&DailyProgress>> = HashMap::new();
    for entry in progress.iter().filter(|p| month.contains(p.date)) {
        by_date.entry(entry.date).or_default().push(entry);
    }

    let blanks = month.leading_blanks() as usize;
    let mut slots = Vec::with_capacity(blanks + month.days_in_month() as usize);
    slots.extend(std::iter::repeat_n(CalendarSlot::Blank, blanks));

    for (date, day) in month.days().zip(1_u32..) {
        let entries: Vec<DailyProgress> = by_date
            .remove(&date)
            .unwrap_or_default()
            .into_iter()
            .cloned()
            .collect();
        let percentage = ratio::rounded_mean(
            entries
                .iter()
                .map(|e| u64::from(e.completion_percentage)),
        )
        .map(|p| u8::try_from(p).unwrap_or(100));

        slots.push(CalendarSlot::Day(DayCell {
            day,
            date,
            percentage,
            band: percentage.map(ColorBand::from_percentage),
            entries,
            is_today: false,
        }));
    }

    CalendarGrid {
        month,
        title: month.to_string(),
        weekdays: WEEKDAY_LABELS,
        slots,
    }
}
