use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%) unless a request asks for percent output.
pub type Rate = Decimal;

/// A single external cash flow. Positive amounts are money flowing into the portfolio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlow {
    pub date: NaiveDate,
    pub amount: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// A series of cash flows, in any order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CashFlowSeries {
    pub flows: Vec<CashFlow>,
}

impl CashFlowSeries {
    /// Collapse the series into a date-sorted ledger, summing same-day flows.
    pub fn to_ledger(&self) -> BTreeMap<NaiveDate, Money> {
        let mut ledger = BTreeMap::new();
        for flow in &self.flows {
            *ledger.entry(flow.date).or_insert(Decimal::ZERO) += flow.amount;
        }
        ledger
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ledger_sums_same_day_flows() {
        let d1 = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let series = CashFlowSeries {
            flows: vec![
                CashFlow { date: d1, amount: dec!(100), label: None },
                CashFlow { date: d2, amount: dec!(-40), label: Some("fee".into()) },
                CashFlow { date: d1, amount: dec!(25), label: None },
            ],
        };
        let ledger = series.to_ledger();
        let entries: Vec<_> = ledger.into_iter().collect();
        assert_eq!(entries, vec![(d2, dec!(-40)), (d1, dec!(125))]);
    }
}
