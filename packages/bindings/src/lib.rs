use napi::Result as NapiResult;
use napi_derive::napi;

use perf_engine_core::analysis::AnalysisRequest;
use perf_engine_core::returns::{CalcOutput, CalcRequest, CalculatorKind};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn run_calculator(kind: CalculatorKind, input_json: &str) -> NapiResult<String> {
    let request: CalcRequest = serde_json::from_str(input_json).map_err(to_napi_error)?;
    let value =
        perf_engine_core::returns::calculate_return(kind, &request).map_err(to_napi_error)?;
    let output = CalcOutput {
        method: kind.to_string(),
        return_value: value,
        in_percent: request.result_in_percent,
    };
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Returns
// ---------------------------------------------------------------------------

/// `kind` is one of `simple`, `modified_dietz`, `true_twr`, `linked_dietz_twr`.
#[napi]
pub fn calculate_return(kind: String, input_json: String) -> NapiResult<String> {
    let kind: CalculatorKind =
        serde_json::from_value(serde_json::Value::String(kind)).map_err(to_napi_error)?;
    run_calculator(kind, &input_json)
}

#[napi]
pub fn simple_return(input_json: String) -> NapiResult<String> {
    run_calculator(CalculatorKind::Simple, &input_json)
}

#[napi]
pub fn modified_dietz(input_json: String) -> NapiResult<String> {
    run_calculator(CalculatorKind::ModifiedDietz, &input_json)
}

#[napi]
pub fn true_twr(input_json: String) -> NapiResult<String> {
    run_calculator(CalculatorKind::TrueTwr, &input_json)
}

#[napi]
pub fn linked_dietz_twr(input_json: String) -> NapiResult<String> {
    run_calculator(CalculatorKind::LinkedDietzTwr, &input_json)
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_performance(input_json: String) -> NapiResult<String> {
    let request: AnalysisRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let records =
        perf_engine_core::analysis::analyze_performance(&request).map_err(to_napi_error)?;
    serde_json::to_string(&records).map_err(to_napi_error)
}
