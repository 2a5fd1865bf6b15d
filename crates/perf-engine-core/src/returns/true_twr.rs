//! True time-weighted return.
//!
//! The period is split at every flow date and each sub-period is priced from
//! point valuations on the asset curve. Sub-period factors are chained; once
//! the cumulative factor hits zero the position is wiped out and chaining stops.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::calendar::previous_day;
use crate::error::PerfEngineError;
use crate::feeds::ValuationCurve;
use crate::types::{Money, Rate};
use crate::PerfEngineResult;

use super::request::{CalcRequest, FlowTiming};
use super::ReturnCalculator;

#[derive(Debug, Clone, Copy, Default)]
pub struct TrueTwrCalculator;

impl ReturnCalculator for TrueTwrCalculator {
    fn name(&self) -> &'static str {
        "True Time-Weighted Return"
    }

    fn raw_return(&self, request: &CalcRequest) -> PerfEngineResult<Rate> {
        let factor = match request.flow_timing {
            FlowTiming::BeginningOfDay => chain_beginning_of_day(request)?,
            FlowTiming::EndOfDay => chain_end_of_day(request)?,
        };
        Ok(factor - Decimal::ONE)
    }
}

/// Growth factor of one sub-period, with the zero-capital and wipe-out rules.
fn sub_period_factor(
    request: &CalcRequest,
    end_value: Money,
    capital: Money,
    period_end: NaiveDate,
) -> PerfEngineResult<Decimal> {
    if capital.is_zero() {
        if end_value.is_zero() {
            return Ok(Decimal::ONE);
        }
        return Err(PerfEngineError::invalid(
            "asset_values",
            format!("sub-period ending {period_end} grows from zero capital to {end_value}"),
        ));
    }
    if capital < Decimal::ZERO {
        return Err(PerfEngineError::invalid(
            "asset_values",
            format!("sub-period ending {period_end} starts from negative capital {capital}"),
        ));
    }
    if end_value <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    Ok(request.round_calc(end_value / capital))
}

struct Chain<'a> {
    request: &'a CalcRequest,
    factor: Decimal,
}

impl<'a> Chain<'a> {
    fn new(request: &'a CalcRequest) -> Self {
        Chain {
            request,
            factor: Decimal::ONE,
        }
    }

    /// Multiply in one sub-period. Returns false once the chain is wiped out.
    ///
    /// Wipe-out is decided on the valuations, not on the rounded factor: a
    /// positive end value that rounds to a zero factor keeps the chain going.
    fn link(&mut self, end_value: Money, capital: Money, period_end: NaiveDate) -> PerfEngineResult<bool> {
        let factor = sub_period_factor(self.request, end_value, capital, period_end)?;
        self.factor = self.request.round_calc(self.factor * factor);
        tracing::trace!(%period_end, %end_value, %capital, %factor, cumulative = %self.factor, "twr sub-period");
        Ok(end_value > Decimal::ZERO || capital.is_zero())
    }
}

/// Flows are invested from the start of their day: a sub-period closes the
/// day before each flow, and the flow joins the next sub-period's capital.
fn chain_beginning_of_day(request: &CalcRequest) -> PerfEngineResult<Decimal> {
    let mut flows = request.active_flows();
    let mut start_value = request.start_value_excl;
    if let Some(&(date, amount)) = flows.first() {
        if date == request.start_date_incl {
            start_value += amount;
            flows.remove(0);
        }
    }

    let mut chain = Chain::new(request);
    let mut sub_start_value = start_value;
    let mut pending_flow = Decimal::ZERO;
    for (date, amount) in flows {
        let sub_end = previous_day(date)?;
        let sub_end_value = request.asset_values.require(sub_end, "asset_values")?;
        if !chain.link(sub_end_value, sub_start_value + pending_flow, sub_end)? {
            return Ok(Decimal::ZERO);
        }
        sub_start_value = sub_end_value;
        pending_flow = amount;
    }
    chain.link(
        request.end_value_incl,
        sub_start_value + pending_flow,
        request.end_date_incl,
    )?;
    Ok(chain.factor)
}

/// Flows arrive at the end of their day: a sub-period closes on each flow
/// date, and the flow is backed out of that day's valuation.
fn chain_end_of_day(request: &CalcRequest) -> PerfEngineResult<Decimal> {
    let mut flows = request.active_flows();
    let mut end_value = request.end_value_incl;
    if let Some(&(date, amount)) = flows.last() {
        if date == request.end_date_incl {
            end_value -= amount;
            flows.pop();
        }
    }

    let mut chain = Chain::new(request);
    let mut sub_start_value = request.start_value_excl;
    for (date, amount) in flows {
        let sub_end_value = request.asset_values.require(date, "asset_values")?;
        if !chain.link(sub_end_value - amount, sub_start_value, date)? {
            return Ok(Decimal::ZERO);
        }
        sub_start_value = sub_end_value;
    }
    chain.link(end_value, sub_start_value, request.end_date_incl)?;
    Ok(chain.factor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn base(start: Decimal, end: Decimal) -> CalcRequest {
        CalcRequest::new(d(2024, 1, 1), d(2024, 1, 31), start, end)
    }

    #[test]
    fn test_no_flows() {
        let r = TrueTwrCalculator.raw_return(&base(dec!(100), dec!(110))).unwrap();
        assert_eq!(r, dec!(0.1));
    }

    #[test]
    fn test_end_of_day_chain() {
        // 100 -> 120 on Jan 10 (before a 30 deposit, valued 150 after), then 150 -> 135.
        let req = base(dec!(100), dec!(135))
            .with_flows(BTreeMap::from([(d(2024, 1, 10), dec!(30))]))
            .with_asset_values(BTreeMap::from([(d(2024, 1, 10), dec!(150))]));
        let r = TrueTwrCalculator.raw_return(&req).unwrap();
        // 1.2 * 0.9 - 1
        assert_eq!(r, dec!(0.08));
    }

    #[test]
    fn test_beginning_of_day_chain() {
        // 100 -> 120 by Jan 9, then 30 deposited at the open of Jan 10: 150 -> 135.
        let req = base(dec!(100), dec!(135))
            .with_flow_timing(FlowTiming::BeginningOfDay)
            .with_flows(BTreeMap::from([(d(2024, 1, 10), dec!(30))]))
            .with_asset_values(BTreeMap::from([(d(2024, 1, 9), dec!(120))]));
        let r = TrueTwrCalculator.raw_return(&req).unwrap();
        assert_eq!(r, dec!(0.08));
    }

    #[test]
    fn test_flow_on_start_date_folds_into_start_value() {
        let req = base(dec!(0), dec!(110))
            .with_flow_timing(FlowTiming::BeginningOfDay)
            .with_flows(BTreeMap::from([(d(2024, 1, 1), dec!(100))]));
        assert_eq!(TrueTwrCalculator.raw_return(&req).unwrap(), dec!(0.1));
    }

    #[test]
    fn test_flow_on_end_date_folds_into_end_value() {
        let req = base(dec!(100), dec!(0))
            .with_flows(BTreeMap::from([(d(2024, 1, 31), dec!(-105))]));
        assert_eq!(TrueTwrCalculator.raw_return(&req).unwrap(), dec!(0.05));
    }

    #[test]
    fn test_zero_capital_without_activity_is_neutral() {
        // Empty until the first deposit at end of Jan 15.
        let req = base(dec!(0), dec!(220))
            .with_flows(BTreeMap::from([(d(2024, 1, 15), dec!(200))]))
            .with_asset_values(BTreeMap::from([(d(2024, 1, 15), dec!(200))]));
        assert_eq!(TrueTwrCalculator.raw_return(&req).unwrap(), dec!(0.1));
    }

    #[test]
    fn test_growth_from_zero_capital_is_invalid() {
        let req = base(dec!(0), dec!(220))
            .with_flows(BTreeMap::from([(d(2024, 1, 15), dec!(200))]))
            .with_asset_values(BTreeMap::from([(d(2024, 1, 15), dec!(210))]));
        assert!(TrueTwrCalculator.raw_return(&req).is_err());
    }

    #[test]
    fn test_missing_valuation_is_invalid() {
        let req = base(dec!(100), dec!(135))
            .with_flows(BTreeMap::from([(d(2024, 1, 10), dec!(30))]));
        let err = TrueTwrCalculator.raw_return(&req).unwrap_err();
        assert!(matches!(err, PerfEngineError::InvalidInput { .. }));
    }

    #[test]
    fn test_bankruptcy_stops_chain() {
        // Wiped out by Jan 10; later data (even missing valuations) is irrelevant.
        let req = base(dec!(100), dec!(500))
            .with_flows(BTreeMap::from([
                (d(2024, 1, 10), dec!(1000)),
                (d(2024, 1, 20), dec!(10)),
            ]))
            .with_asset_values(BTreeMap::from([(d(2024, 1, 10), dec!(1000))]));
        assert_eq!(TrueTwrCalculator.raw_return(&req).unwrap(), dec!(-1));
    }

    #[test]
    fn test_tiny_factor_keeps_full_precision_at_high_scale() {
        let req = base(dec!(1000000000000), dec!(5)).with_scales(20, 4);
        let r = TrueTwrCalculator.raw_return(&req).unwrap();
        assert_eq!(r, dec!(-0.999999999995));
    }

    #[test]
    fn test_factor_rounded_to_zero_is_not_wipe_out() {
        // 5 / 1e12 rounds to 0 at scale 10, yet the position still exists, so
        // the later flow still needs its valuation.
        let req = base(dec!(1000000000000), dec!(20))
            .with_flows(BTreeMap::from([
                (d(2024, 1, 10), dec!(10)),
                (d(2024, 1, 20), dec!(5)),
            ]))
            .with_asset_values(BTreeMap::from([(d(2024, 1, 10), dec!(15))]));
        let err = TrueTwrCalculator.raw_return(&req).unwrap_err();
        assert!(err.to_string().contains("2024-01-20"));
    }
}
