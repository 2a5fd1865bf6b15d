//! Conversion of a cumulative growth factor into an annual one.

use chrono::NaiveDate;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::calendar::{add_years, days_between, next_day, whole_years_between};
use crate::error::PerfEngineError;
use crate::PerfEngineResult;

use super::request::AnnualizationOption;

const DAYS_PER_YEAR: f64 = 365.0;

/// Annualize `growth_factor` (1 + return) earned over `[start_incl, end_incl]`.
pub fn annualize(
    option: AnnualizationOption,
    growth_factor: Decimal,
    start_incl: NaiveDate,
    end_incl: NaiveDate,
) -> PerfEngineResult<Decimal> {
    if option == AnnualizationOption::DoNotAnnualize || is_fixed_point(growth_factor) {
        return Ok(growth_factor);
    }
    check_factor(growth_factor)?;

    let end_excl = next_day(end_incl)?;
    let full_years = whole_years_between(start_incl, end_excl)?;
    let remainder_days = days_between(add_years(start_incl, full_years)?, end_excl);
    if full_years == 0 || (full_years == 1 && remainder_days == 0) {
        return Ok(growth_factor);
    }

    let years = full_years as f64 + remainder_days as f64 / DAYS_PER_YEAR;
    power(growth_factor, 1.0 / years)
}

/// Annualize a factor earned over an exact number of whole years.
pub fn annualize_years(
    option: AnnualizationOption,
    growth_factor: Decimal,
    years: u32,
) -> PerfEngineResult<Decimal> {
    if option == AnnualizationOption::DoNotAnnualize || is_fixed_point(growth_factor) {
        return Ok(growth_factor);
    }
    check_factor(growth_factor)?;
    if years <= 1 {
        return Ok(growth_factor);
    }
    power(growth_factor, 1.0 / years as f64)
}

// No growth and total loss stay what they are under any exponent.
fn is_fixed_point(growth_factor: Decimal) -> bool {
    growth_factor.is_zero() || growth_factor == Decimal::ONE
}

fn check_factor(growth_factor: Decimal) -> PerfEngineResult<()> {
    if growth_factor.is_sign_negative() {
        return Err(PerfEngineError::invalid(
            "growth_factor",
            format!("negative growth factor {growth_factor} cannot be annualized"),
        ));
    }
    Ok(())
}

fn power(growth_factor: Decimal, exponent: f64) -> PerfEngineResult<Decimal> {
    let base = growth_factor.to_f64().ok_or_else(|| {
        PerfEngineError::invalid("growth_factor", format!("{growth_factor} is out of range"))
    })?;
    let value = base.powf(exponent);
    Decimal::from_f64(value).ok_or_else(|| {
        PerfEngineError::invalid(
            "growth_factor",
            format!("{growth_factor}^{exponent} is not representable"),
        )
    })
}
