//! Calendar months used for budgets and reports

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use std::fmt;
use std::str::FromStr;

const MONTHS_EN: [&str; 12] = [
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

const MONTHS_RU: [&str; 12] = [
    "Январь",
    "Февраль",
    "Март",
    "Апрель",
    "Май",
    "Июнь",
    "Июль",
    "Август",
    "Сентябрь",
    "Октябрь",
    "Ноябрь",
    "Декабрь",
];

/// Years a [`Month`] can be built for
pub const YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

/// A calendar month. `month` is always in `1..=12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    /// Returns `None` when `month` is outside `1..=12` or `year` outside [`YEARS`]
    pub fn new(year: i32, month: u32) -> Option<Self> {
        ((1..=12).contains(&month) && YEARS.contains(&year)).then_some(Self { year, month })
    }

    pub fn of(now: NaiveDateTime) -> Self {
        Self::from_date(now.date())
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// `YYYY-MM`, the `budgets.month_year` key
    pub fn key(&self) -> String {
        format!("{}-{:02}", self.year, self.month)
    }

    /// `YYYY-MM-01`, inclusive lower bound for `transactions.date`
    pub fn start(&self) -> String {
        format!("{}-01", self.key())
    }

    /// Exclusive upper bound: first day of the following month
    pub fn end(&self) -> String {
        self.next().start()
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year.saturating_add(1),
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn prev(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year.saturating_sub(1),
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn english_name(&self) -> &'static str {
        MONTHS_EN[(self.month - 1) as usize]
    }

    pub fn russian_name(&self) -> &'static str {
        MONTHS_RU[(self.month - 1) as usize]
    }

    /// "October 2026", used in the chart payload
    pub fn english_title(&self) -> String {
        format!("{} {}", self.english_name(), self.year)
    }

    /// "Октябрь 2026"
    pub fn russian_title(&self) -> String {
        format!("{} {}", self.russian_name(), self.year)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl FromStr for Month {
    type Err = String;

    /// Parses `YYYY-MM`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| format!("Invalid month key: {}", s))?;
        let year: i32 = year.parse().map_err(|_| format!("Invalid year in: {}", s))?;
        let month: u32 = month.parse().map_err(|_| format!("Invalid month in: {}", s))?;
        Month::new(year, month).ok_or_else(|| format!("Month out of range: {}", s))
    }
}
