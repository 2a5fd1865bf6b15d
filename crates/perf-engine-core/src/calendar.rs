//! Calendar arithmetic shared by the calculators and the analyzer.
//!
//! All bounds are plain calendar dates. Year arithmetic goes through chrono's
//! month arithmetic, so a Feb-29 anniversary lands on Feb-28 in common years.

use chrono::{Datelike, Months, NaiveDate};

use crate::error::PerfEngineError;
use crate::PerfEngineResult;

/// Signed number of days from `from` to `to`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

pub fn next_day(date: NaiveDate) -> PerfEngineResult<NaiveDate> {
    date.succ_opt()
        .ok_or_else(|| PerfEngineError::DateError(format!("no day after {date}")))
}

pub fn previous_day(date: NaiveDate) -> PerfEngineResult<NaiveDate> {
    date.pred_opt()
        .ok_or_else(|| PerfEngineError::DateError(format!("no day before {date}")))
}

pub fn add_years(date: NaiveDate, years: u32) -> PerfEngineResult<NaiveDate> {
    add_months(date, years.saturating_mul(12))
}

pub fn add_months(date: NaiveDate, months: u32) -> PerfEngineResult<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| PerfEngineError::DateError(format!("{date} + {months} months overflows")))
}

/// Number of whole calendar years that fit into `[start, end_excl)`.
pub fn whole_years_between(start: NaiveDate, end_excl: NaiveDate) -> PerfEngineResult<u32> {
    if end_excl <= start {
        return Ok(0);
    }
    let mut years = (end_excl.year() - start.year()).max(0) as u32;
    while years > 0 && add_years(start, years)? > end_excl {
        years -= 1;
    }
    Ok(years)
}

pub fn end_of_month(date: NaiveDate) -> PerfEngineResult<NaiveDate> {
    period_end(date, 1)
}

/// Last day of the calendar-aligned period of `months_per_period` months that
/// contains `date` (1 = month, 3 = quarter, 6 = half year, 12 = year).
pub fn period_end(date: NaiveDate, months_per_period: u32) -> PerfEngineResult<NaiveDate> {
    let months_per_period = months_per_period.clamp(1, 12);
    let first_month = date.month0() / months_per_period * months_per_period + 1;
    let first_day = NaiveDate::from_ymd_opt(date.year(), first_month, 1).ok_or_else(|| {
        PerfEngineError::DateError(format!("invalid period start for {date}"))
    })?;
    previous_day(add_months(first_day, months_per_period)?)
}
