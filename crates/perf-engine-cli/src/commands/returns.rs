use clap::Args;
use serde_json::Value;
use std::time::Instant;

use perf_engine_core::returns::{calculate_return, CalcOutput, CalcRequest, CalculatorKind};
use perf_engine_core::with_metadata;

use crate::input;

/// Arguments shared by the single-return calculators
#[derive(Args)]
pub struct CalcArgs {
    /// Path to a JSON or YAML CalcRequest (reads piped stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Express the result in percent
    #[arg(long)]
    pub result_in_percent: bool,

    /// Digits kept in the result (must not exceed the request's calc_scale)
    #[arg(long)]
    pub result_scale: Option<u32>,
}

fn methodology(kind: CalculatorKind) -> &'static str {
    match kind {
        CalculatorKind::Simple => "Simple return: (end - start) / start",
        CalculatorKind::ModifiedDietz => {
            "Modified Dietz: gain / (start value + day-weighted external flows)"
        }
        CalculatorKind::TrueTwr => {
            "True time-weighted return chained over sub-periods split at every flow date"
        }
        CalculatorKind::LinkedDietzTwr => {
            "Modified Dietz returns over monthly and large-flow sub-periods, geometrically linked"
        }
    }
}

fn warnings(kind: CalculatorKind, request: &CalcRequest) -> Vec<String> {
    let mut warnings = Vec::new();
    let flows = request.flows.values().filter(|v| !v.is_zero()).count();
    if kind == CalculatorKind::Simple && flows > 0 {
        warnings.push(format!("Simple return ignores {flows} intermediate flow(s)"));
    }
    if matches!(kind, CalculatorKind::TrueTwr | CalculatorKind::LinkedDietzTwr)
        && flows > 0
        && request.asset_values.is_empty()
    {
        warnings.push("No asset valuations supplied; sub-period boundaries cannot be priced".into());
    }
    warnings
}

pub fn run_calc(kind: CalculatorKind, args: CalcArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request: CalcRequest = input::load_request(args.input.as_deref())?;
    if args.result_in_percent {
        request.result_in_percent = true;
    }
    if let Some(scale) = args.result_scale {
        request.result_scale = scale;
    }

    let start = Instant::now();
    let value = calculate_return(kind, &request)?;
    let elapsed = start.elapsed().as_micros() as u64;

    let output = with_metadata(
        methodology(kind),
        &serde_json::json!({
            "period": format!("{}..={}", request.start_date_incl, request.end_date_incl),
            "flow_timing": request.flow_timing,
            "annualization": request.annualization,
            "flows": request.flows.len(),
            "calc_scale": request.calc_scale,
            "result_scale": request.result_scale,
            "rounding_mode": request.rounding_mode,
        }),
        warnings(kind, &request),
        elapsed,
        CalcOutput {
            method: kind.to_string(),
            return_value: value,
            in_percent: request.result_in_percent,
        },
    );
    Ok(serde_json::to_value(output)?)
}
