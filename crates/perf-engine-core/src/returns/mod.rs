//! Return calculators.
//!
//! Every calculator implements [`ReturnCalculator::raw_return`], which yields
//! the unannualized return as a fraction at the request's calculation scale.
//! [`finish_return`] is the single finishing pipeline (annualize, convert to
//! percent, round to the result scale) that `calculate_return` feeds into.

pub mod annualization;
pub mod linked_twr;
pub mod modified_dietz;
pub mod request;
pub mod simple;
pub mod true_twr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::Rate;
use crate::PerfEngineResult;

pub use annualization::{annualize, annualize_years};
pub use linked_twr::LinkedDietzTwrCalculator;
pub use modified_dietz::ModifiedDietzCalculator;
pub use request::{AnnualizationOption, CalcOutput, CalcRequest, FlowTiming, RoundingMode};
pub use simple::SimpleReturnCalculator;
pub use true_twr::TrueTwrCalculator;

pub trait ReturnCalculator {
    fn name(&self) -> &'static str;

    /// The algorithm itself: unannualized return as a fraction, at `calc_scale`.
    /// Assumes the request has been validated.
    fn raw_return(&self, request: &CalcRequest) -> PerfEngineResult<Rate>;

    fn calculate_return(&self, request: &CalcRequest) -> PerfEngineResult<Decimal> {
        request.validate()?;
        let raw = self.raw_return(request)?;
        let result = finish_return(raw, request)?;
        tracing::debug!(
            calculator = self.name(),
            start = %request.start_date_incl,
            end = %request.end_date_incl,
            raw = %raw,
            result = %result,
            "return calculated"
        );
        Ok(result)
    }
}

/// Shared finishing step: annualize per the request's policy, optionally
/// express as percent, and round to `result_scale`.
pub fn finish_return(raw: Rate, request: &CalcRequest) -> PerfEngineResult<Decimal> {
    let rate = match request.annualization {
        AnnualizationOption::DoNotAnnualize => raw,
        option => {
            annualize(
                option,
                Decimal::ONE + raw,
                request.start_date_incl,
                request.end_date_incl,
            )? - Decimal::ONE
        }
    };
    let rate = if request.result_in_percent {
        rate * dec!(100)
    } else {
        rate
    };
    Ok(request.rounding_mode.round(rate, request.result_scale))
}

/// Selects one of the concrete calculators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculatorKind {
    Simple,
    ModifiedDietz,
    TrueTwr,
    LinkedDietzTwr,
}

impl CalculatorKind {
    pub fn calculator(self) -> Box<dyn ReturnCalculator + Send + Sync> {
        match self {
            CalculatorKind::Simple => Box::new(SimpleReturnCalculator),
            CalculatorKind::ModifiedDietz => Box::new(ModifiedDietzCalculator),
            CalculatorKind::TrueTwr => Box::new(TrueTwrCalculator),
            CalculatorKind::LinkedDietzTwr => Box::new(LinkedDietzTwrCalculator),
        }
    }
}

impl fmt::Display for CalculatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.calculator().name())
    }
}

/// Run the calculator selected by `kind` over `request`.
pub fn calculate_return(kind: CalculatorKind, request: &CalcRequest) -> PerfEngineResult<Decimal> {
    kind.calculator().calculate_return(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_finish_percent_and_rounding() {
        let req = CalcRequest::new(d(2024, 1, 1), d(2024, 6, 30), dec!(1), dec!(1))
            .with_scales(10, 2)
            .in_percent(true);
        assert_eq!(finish_return(dec!(0.0484375), &req).unwrap(), dec!(4.84));
    }

    #[test]
    fn test_finish_annualizes_long_spans() {
        let req = CalcRequest::new(d(2022, 1, 1), d(2023, 12, 31), dec!(1), dec!(1))
            .with_annualization(AnnualizationOption::AnnualizeIfOverOneYear);
        assert_eq!(finish_return(dec!(0.21), &req).unwrap(), dec!(0.1));
    }

    #[test]
    fn test_kind_dispatch_names() {
        assert_eq!(CalculatorKind::TrueTwr.to_string(), "True Time-Weighted Return");
        assert_eq!(CalculatorKind::ModifiedDietz.to_string(), "Modified Dietz");
    }
}
