use chrono::DateTime;
use chrono::NaiveDate;
use chrono::Utc;
use framework::exception;
use framework::exception::CoreRsResult;
use framework::validation_error;

use super::error_code;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Month {
    January = 1,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    pub fn number(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }

    pub fn from_number(number: u32) -> Option<Month> {
        Month::ALL.into_iter().find(|month| month.number() == number)
    }

    pub fn from_name(name: &str) -> Option<Month> {
        Month::ALL
            .into_iter()
            .find(|month| month.name().eq_ignore_ascii_case(name))
    }

    fn next(self) -> Option<Month> {
        Month::from_number(self.number() + 1)
    }
}

/// A validated calendar month, always safe to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPeriod {
    pub month: Month,
    pub year: i32,
}

impl ResolvedPeriod {
    pub fn parse(month: &str, year: &str, min_year: i32, max_year: i32) -> CoreRsResult<Self> {
        let month = parse_month(month.trim())?;
        let year = parse_year(year.trim(), min_year, max_year)?;
        Ok(ResolvedPeriod { month, year })
    }

    /// Half open `[start, end)` in UTC.
    pub fn range(&self) -> CoreRsResult<(DateTime<Utc>, DateTime<Utc>)> {
        let start = first_day(self.year, self.month)?;
        let end = match self.month.next() {
            Some(month) => first_day(self.year, month)?,
            None => first_day(self.year + 1, Month::January)?,
        };
        Ok((start, end))
    }

    /// "February 2026", the prefix shared by every volume of this month.
    pub fn base_label(&self) -> String {
        format!("{} {}", self.month.name(), self.year)
    }
}

fn first_day(year: i32, month: Month) -> CoreRsResult<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month.number(), 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|time| time.and_utc())
        .ok_or_else(|| exception!(message = format!("date out of range, year={year}, month={}", month.number())))
}

fn parse_month(value: &str) -> CoreRsResult<Month> {
    if is_numeric(value) {
        let number: u32 = value.parse().unwrap_or(u32::MAX);
        return Month::from_number(number).ok_or_else(|| {
            validation_error!(code = error_code::INVALID_MONTH, message = "❌ Month must be between 1 and 12.")
        });
    }
    Month::from_name(value)
        .ok_or_else(|| validation_error!(code = error_code::INVALID_MONTH, message = "❌ Invalid month."))
}

fn parse_year(value: &str, min_year: i32, max_year: i32) -> CoreRsResult<i32> {
    let year = if is_numeric(value) { value.parse::<i32>().ok() } else { None };
    match year {
        Some(year) if (min_year..=max_year).contains(&year) => Ok(year),
        _ => Err(validation_error!(
            code = error_code::INVALID_YEAR,
            message = format!("❌ Invalid year, must be between {min_year} and {max_year}.")
        )),
    }
}

fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|byte| byte.is_ascii_digit())
}
