//! Modified Dietz money-weighted return.
//!
//! Each interior flow is weighted by the fraction of the period it was
//! invested: `weight = 1 - lag / total_days`. The weighted flow sum is kept
//! as a day-count numerator and divided once, so results that are exact
//! fractions stay exact.

use rust_decimal::Decimal;

use crate::calendar::{days_between, next_day, previous_day};
use crate::error::PerfEngineError;
use crate::types::Rate;
use crate::PerfEngineResult;

use super::request::{CalcRequest, FlowTiming};
use super::ReturnCalculator;

#[derive(Debug, Clone, Copy, Default)]
pub struct ModifiedDietzCalculator;

impl ReturnCalculator for ModifiedDietzCalculator {
    fn name(&self) -> &'static str {
        "Modified Dietz"
    }

    fn raw_return(&self, request: &CalcRequest) -> PerfEngineResult<Rate> {
        let timing = request.flow_timing;
        let mut flows = request.active_flows();
        let mut start_date = request.start_date_incl;
        let mut start_value = request.start_value_excl;
        let mut end_date = request.end_date_incl;
        let mut end_value = request.end_value_incl;

        // Nothing invested yet: the first flow funds the period.
        if start_value.is_zero() {
            if flows.is_empty() {
                if end_value.is_zero() {
                    return Ok(Decimal::ZERO);
                }
                return Err(PerfEngineError::invalid(
                    "start_value_excl",
                    format!("zero start value and no flows cannot end at {end_value}"),
                ));
            }
            let (first_date, first_amount) = flows.remove(0);
            start_value = first_amount;
            start_date = match timing {
                FlowTiming::BeginningOfDay => first_date,
                FlowTiming::EndOfDay => {
                    if first_date >= end_date {
                        return Ok(Decimal::ZERO);
                    }
                    next_day(first_date)?
                }
            };
        }

        // Fully liquidated: the last flow closes the period.
        if end_value.is_zero() {
            if let Some((last_date, last_amount)) = flows.pop() {
                end_value = -last_amount;
                end_date = match timing {
                    FlowTiming::EndOfDay => last_date,
                    FlowTiming::BeginningOfDay => {
                        if last_date <= start_date {
                            return Ok(Decimal::ZERO);
                        }
                        previous_day(last_date)?
                    }
                };
            }
        }

        if start_value <= Decimal::ZERO {
            return Err(PerfEngineError::invalid(
                "start_value_excl",
                format!("adjusted start value {start_value} must be positive"),
            ));
        }
        if end_value <= Decimal::ZERO {
            return Ok(-Decimal::ONE);
        }

        let total_days = days_between(start_date, end_date) + 1;
        let mut flow_sum = Decimal::ZERO;
        let mut weighted_days = Decimal::ZERO;
        for (date, amount) in &flows {
            let lag = days_between(start_date, *date) + timing.day_lag();
            flow_sum += amount;
            weighted_days += amount * Decimal::from(total_days - lag);
        }

        let total_days = Decimal::from(total_days);
        let capital_days = start_value * total_days + weighted_days;
        if capital_days <= Decimal::ZERO {
            return Err(PerfEngineError::UndefinedAverageCapital {
                start_value,
                weighted_flows: request.round_calc(weighted_days / total_days),
            });
        }

        let gain = end_value - start_value - flow_sum;
        let rate = request.round_calc(gain * total_days / capital_days);
        tracing::trace!(
            %start_date,
            %end_date,
            %start_value,
            %end_value,
            %flow_sum,
            %rate,
            "modified dietz period"
        );
        Ok(rate)
    }
}
