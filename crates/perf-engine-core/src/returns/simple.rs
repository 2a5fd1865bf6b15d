use rust_decimal::Decimal;

use crate::error::PerfEngineError;
use crate::types::Rate;
use crate::PerfEngineResult;

use super::request::CalcRequest;
use super::ReturnCalculator;

/// Point-to-point return, ignoring any intermediate flows.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleReturnCalculator;

impl ReturnCalculator for SimpleReturnCalculator {
    fn name(&self) -> &'static str {
        "Simple Return"
    }

    fn raw_return(&self, request: &CalcRequest) -> PerfEngineResult<Rate> {
        if request.start_value_excl.is_zero() {
            return Err(PerfEngineError::invalid(
                "start_value_excl",
                "simple return is undefined for a zero start value",
            ));
        }
        if request.end_value_incl.is_zero() {
            return Ok(-Decimal::ONE);
        }
        let gain = request.end_value_incl - request.start_value_excl;
        Ok(request.round_calc(gain / request.start_value_excl))
    }
}
