use clap::Args;
use serde_json::Value;
use std::time::Instant;

use perf_engine_core::analysis::{analyze_performance, AnalysisRequest, PeriodUnit};
use perf_engine_core::with_metadata;

use crate::input;

/// Arguments for a periodic performance report
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Path to a JSON or YAML AnalysisRequest (reads piped stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Reporting period: month, quarter, half-year, year
    #[arg(long)]
    pub period: Option<String>,

    /// Express rates in percent
    #[arg(long)]
    pub result_in_percent: bool,

    /// Digits kept in rates
    #[arg(long)]
    pub rate_scale: Option<u32>,

    /// Digits kept in amounts
    #[arg(long)]
    pub amount_scale: Option<u32>,
}

fn parse_period(period: &str) -> Result<PeriodUnit, Box<dyn std::error::Error>> {
    match period.to_lowercase().as_str() {
        "month" | "monthly" => Ok(PeriodUnit::Month),
        "quarter" | "quarterly" => Ok(PeriodUnit::Quarter),
        "half-year" | "half_year" | "semiannual" => Ok(PeriodUnit::HalfYear),
        "year" | "annual" | "yearly" => Ok(PeriodUnit::Year),
        _ => Err(format!(
            "Unknown period '{}'. Use: month, quarter, half-year, year",
            period
        )
        .into()),
    }
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request: AnalysisRequest = input::load_request(args.input.as_deref())?;
    if let Some(ref period) = args.period {
        request.period_unit = parse_period(period)?;
    }
    if args.result_in_percent {
        request.result_in_percent = true;
    }
    if let Some(scale) = args.rate_scale {
        request.result_rate_scale = scale;
    }
    if let Some(scale) = args.amount_scale {
        request.result_amount_scale = scale;
    }

    let start = Instant::now();
    let records = analyze_performance(&request)?;
    let elapsed = start.elapsed().as_micros() as u64;

    let mut warnings = Vec::new();
    if request.asset_values.is_empty() {
        warnings.push("No asset valuations supplied".to_string());
    }

    let output = with_metadata(
        "Periodic time-weighted and money-weighted performance report",
        &serde_json::json!({
            "analysis_window": format!(
                "{}..={}",
                request.analysis_start_date_incl, request.analysis_end_date_incl
            ),
            "investment_window": format!(
                "{}..={}",
                request.investment_start_date_incl, request.investment_end_date_incl
            ),
            "period_unit": request.period_unit,
            "twr_method": request.twr_method,
            "mwr_method": request.mwr_method,
            "flow_timing": request.flow_timing,
        }),
        warnings,
        elapsed,
        records,
    );
    Ok(serde_json::to_value(output)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_period() {
        assert_eq!(parse_period("Quarterly").unwrap(), PeriodUnit::Quarter);
        assert_eq!(parse_period("half-year").unwrap(), PeriodUnit::HalfYear);
        assert!(parse_period("weekly").is_err());
    }
}
