//! Linked Modified Dietz time-weighted return.
//!
//! Approximates the true TWR by chaining Modified Dietz returns over monthly
//! sub-periods (GIPS: value at least monthly, at month end, and on the date of
//! any large external flow).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::calendar::{end_of_month, next_day, previous_day};
use crate::error::PerfEngineError;
use crate::feeds::ValuationCurve;
use crate::types::{Money, Rate};
use crate::PerfEngineResult;

use super::modified_dietz::ModifiedDietzCalculator;
use super::request::{CalcRequest, FlowTiming};
use super::ReturnCalculator;

#[derive(Debug, Clone, Copy, Default)]
pub struct LinkedDietzTwrCalculator;

impl ReturnCalculator for LinkedDietzTwrCalculator {
    fn name(&self) -> &'static str {
        "Linked Modified Dietz TWR"
    }

    fn raw_return(&self, request: &CalcRequest) -> PerfEngineResult<Rate> {
        let flows = request.active_flows();
        let mut remaining: &[(NaiveDate, Money)] = &flows;
        let mut sub_start = request.start_date_incl;
        let mut sub_start_value = request.start_value_excl;
        let mut cumulative = Decimal::ONE;

        loop {
            let sub_end = sub_period_end(request, sub_start, sub_start_value, remaining)?;
            let sub_end_value = if sub_end == request.end_date_incl {
                request.end_value_incl
            } else {
                request.asset_values.require(sub_end, "asset_values")?
            };
            let split = remaining.iter().take_while(|(d, _)| *d <= sub_end).count();
            let sub_request = request.sub_period(
                sub_start,
                sub_end,
                sub_start_value,
                sub_end_value,
                &remaining[..split],
            );

            let factor = Decimal::ONE + ModifiedDietzCalculator.raw_return(&sub_request)?;
            if factor.is_sign_negative() {
                return Err(PerfEngineError::invalid(
                    "flows",
                    format!("sub-period {sub_start}..={sub_end} yields negative growth factor {factor}"),
                ));
            }
            cumulative = request.round_calc(cumulative * factor);
            tracing::trace!(%sub_start, %sub_end, %factor, %cumulative, "linked sub-period");
            if factor.is_zero() || sub_end >= request.end_date_incl {
                break;
            }

            remaining = &remaining[split..];
            sub_start = next_day(sub_end)?;
            sub_start_value = sub_end_value;
        }

        Ok(cumulative - Decimal::ONE)
    }
}

/// Month end (capped at the request end), or earlier if a large flow forces
/// an extra valuation point.
fn sub_period_end(
    request: &CalcRequest,
    sub_start: NaiveDate,
    sub_start_value: Money,
    remaining: &[(NaiveDate, Money)],
) -> PerfEngineResult<NaiveDate> {
    let month_end = end_of_month(sub_start)?.min(request.end_date_incl);
    // Without a start value there is no percentage to compare against.
    if sub_start_value.is_zero() {
        return Ok(month_end);
    }

    let large = remaining
        .iter()
        .take_while(|(d, _)| *d <= month_end)
        .filter(|(d, _)| request.flow_timing == FlowTiming::EndOfDay || *d > sub_start)
        .find(|(_, amount)| {
            amount.abs() / sub_start_value * dec!(100) > request.large_flow_level_pct
        });

    match (large, request.flow_timing) {
        (Some((date, _)), FlowTiming::EndOfDay) => Ok(*date),
        (Some((date, _)), FlowTiming::BeginningOfDay) => previous_day(*date),
        (None, _) => Ok(month_end),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::returns::TrueTwrCalculator;
    use std::collections::BTreeMap;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_month_ends_without_flows() {
        let req = CalcRequest::new(d(2024, 1, 1), d(2024, 3, 31), dec!(100), dec!(121))
            .with_asset_values(BTreeMap::from([
                (d(2024, 1, 31), dec!(110)),
                (d(2024, 2, 29), dec!(100)),
            ]));
        let r = LinkedDietzTwrCalculator.raw_return(&req).unwrap();
        // 1.1 * (100/110) * 1.21
        let expected = (dec!(1.1) * (dec!(100) / dec!(110)).round_dp(10)).round_dp(10);
        let expected = (expected * dec!(1.21)).round_dp(10) - Decimal::ONE;
        assert_eq!(r, expected);
    }

    #[test]
    fn test_large_flow_matches_true_twr() {
        let flows = BTreeMap::from([(d(2024, 1, 10), dec!(50))]);
        let values = BTreeMap::from([(d(2024, 1, 10), dec!(170))]);
        let req = CalcRequest::new(d(2024, 1, 1), d(2024, 1, 31), dec!(100), dec!(187))
            .with_flows(flows)
            .with_asset_values(values);
        let linked = LinkedDietzTwrCalculator.raw_return(&req).unwrap();
        let exact = TrueTwrCalculator.raw_return(&req).unwrap();
        assert_eq!(linked, exact);
        assert_eq!(linked, dec!(0.32));
    }

    #[test]
    fn test_small_flow_stays_in_month() {
        // 5% flow is below the 10% threshold, so no valuation at Jan 10 is needed.
        let flows = BTreeMap::from([(d(2024, 1, 10), dec!(5))]);
        let req = CalcRequest::new(d(2024, 1, 1), d(2024, 1, 31), dec!(100), dec!(110))
            .with_flows(flows);
        let linked = LinkedDietzTwrCalculator.raw_return(&req).unwrap();
        let dietz = ModifiedDietzCalculator.raw_return(&req).unwrap();
        assert_eq!(linked, dietz);
    }

    #[test]
    fn test_beginning_of_day_large_flow_splits_day_before() {
        let flows = BTreeMap::from([(d(2024, 1, 10), dec!(50))]);
        let values = BTreeMap::from([(d(2024, 1, 9), dec!(120))]);
        let req = CalcRequest::new(d(2024, 1, 1), d(2024, 1, 31), dec!(100), dec!(204))
            .with_flow_timing(FlowTiming::BeginningOfDay)
            .with_flows(flows)
            .with_asset_values(values);
        // 1.2 * 204/170
        assert_eq!(LinkedDietzTwrCalculator.raw_return(&req).unwrap(), dec!(0.44));
    }

    #[test]
    fn test_bankrupt_month_halts() {
        let req = CalcRequest::new(d(2024, 1, 1), d(2024, 3, 31), dec!(100), dec!(50))
            .with_asset_values(BTreeMap::from([(d(2024, 1, 31), dec!(0))]));
        assert_eq!(LinkedDietzTwrCalculator.raw_return(&req).unwrap(), dec!(-1));
    }

    #[test]
    fn test_negative_sub_period_factor_is_invalid() {
        // A large deposit on the last day that the end valuation does not reflect.
        let req = CalcRequest::new(d(2024, 1, 1), d(2024, 1, 31), dec!(100), dec!(1))
            .with_flows(BTreeMap::from([(d(2024, 1, 31), dec!(1000))]));
        let err = LinkedDietzTwrCalculator.raw_return(&req).unwrap_err();
        assert!(matches!(err, PerfEngineError::InvalidInput { .. }));
        assert!(err.to_string().contains("negative growth factor"));
    }
}
