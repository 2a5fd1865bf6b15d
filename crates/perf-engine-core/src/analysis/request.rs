use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::calendar::period_end;
use crate::error::PerfEngineError;
use crate::returns::request::MAX_SCALE;
use crate::returns::{CalculatorKind, FlowTiming, RoundingMode};
use crate::types::Money;
use crate::PerfEngineResult;

/// Length of one reporting period. Periods are calendar aligned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodUnit {
    #[default]
    Month,
    Quarter,
    HalfYear,
    Year,
}

impl PeriodUnit {
    pub fn months(self) -> u32 {
        match self {
            PeriodUnit::Month => 1,
            PeriodUnit::Quarter => 3,
            PeriodUnit::HalfYear => 6,
            PeriodUnit::Year => 12,
        }
    }

    pub fn periods_per_year(self) -> usize {
        (12 / self.months()) as usize
    }

    /// Last day of the period containing `date`.
    pub fn period_end(self, date: NaiveDate) -> PerfEngineResult<NaiveDate> {
        period_end(date, self.months())
    }

    pub fn caption(self, date: NaiveDate) -> String {
        let index = date.month0() / self.months() + 1;
        match self {
            PeriodUnit::Month => date.format("%Y-%m").to_string(),
            PeriodUnit::Quarter => format!("{}-Q{}", date.year(), index),
            PeriodUnit::HalfYear => format!("{}-H{}", date.year(), index),
            PeriodUnit::Year => date.year().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TwrMethod {
    #[default]
    TrueTwr,
    LinkedDietzTwr,
}

impl TwrMethod {
    pub fn kind(self) -> CalculatorKind {
        match self {
            TwrMethod::TrueTwr => CalculatorKind::TrueTwr,
            TwrMethod::LinkedDietzTwr => CalculatorKind::LinkedDietzTwr,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MwrMethod {
    #[default]
    ModifiedDietz,
}

impl MwrMethod {
    pub fn kind(self) -> CalculatorKind {
        match self {
            MwrMethod::ModifiedDietz => CalculatorKind::ModifiedDietz,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Feature switches. Each one gates both its output fields and its computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisFlags {
    #[serde(default = "default_true")]
    pub calculate_mwr: bool,
    #[serde(default)]
    pub calculate_period_income: bool,
    #[serde(default)]
    pub calculate_trailing_avg_profit_1y: bool,
    #[serde(default)]
    pub calculate_trailing_avg_flow_1y: bool,
    #[serde(default)]
    pub calculate_trailing_avg_income_1y: bool,
    #[serde(default)]
    pub calculate_trailing_twr_1y: bool,
    #[serde(default)]
    pub calculate_trailing_twr_2y: bool,
    #[serde(default)]
    pub calculate_trailing_twr_3y: bool,
    #[serde(default)]
    pub calculate_trailing_twr_5y: bool,
    #[serde(default)]
    pub calculate_trailing_twr_10y: bool,
}

impl Default for AnalysisFlags {
    fn default() -> Self {
        AnalysisFlags {
            calculate_mwr: true,
            calculate_period_income: false,
            calculate_trailing_avg_profit_1y: false,
            calculate_trailing_avg_flow_1y: false,
            calculate_trailing_avg_income_1y: false,
            calculate_trailing_twr_1y: false,
            calculate_trailing_twr_2y: false,
            calculate_trailing_twr_3y: false,
            calculate_trailing_twr_5y: false,
            calculate_trailing_twr_10y: false,
        }
    }
}

impl AnalysisFlags {
    /// Everything on.
    pub fn all() -> Self {
        AnalysisFlags {
            calculate_mwr: true,
            calculate_period_income: true,
            calculate_trailing_avg_profit_1y: true,
            calculate_trailing_avg_flow_1y: true,
            calculate_trailing_avg_income_1y: true,
            calculate_trailing_twr_1y: true,
            calculate_trailing_twr_2y: true,
            calculate_trailing_twr_3y: true,
            calculate_trailing_twr_5y: true,
            calculate_trailing_twr_10y: true,
        }
    }

    /// Trailing TWR switches in window order: 1, 2, 3, 5, 10 years.
    pub(crate) fn trailing_twr(&self) -> [bool; 5] {
        [
            self.calculate_trailing_twr_1y,
            self.calculate_trailing_twr_2y,
            self.calculate_trailing_twr_3y,
            self.calculate_trailing_twr_5y,
            self.calculate_trailing_twr_10y,
        ]
    }

    pub(crate) fn needs_income(&self) -> bool {
        self.calculate_period_income || self.calculate_trailing_avg_income_1y
    }
}

fn default_large_flow_level_pct() -> Decimal {
    dec!(10)
}

fn default_calc_scale() -> u32 {
    10
}

fn default_result_rate_scale() -> u32 {
    4
}

fn default_result_amount_scale() -> u32 {
    2
}

/// Input for a periodic performance report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub analysis_start_date_incl: NaiveDate,
    pub analysis_end_date_incl: NaiveDate,
    pub investment_start_date_incl: NaiveDate,
    pub investment_end_date_incl: NaiveDate,
    #[serde(default)]
    pub period_unit: PeriodUnit,
    #[serde(default)]
    pub twr_method: TwrMethod,
    #[serde(default)]
    pub mwr_method: MwrMethod,
    #[serde(default)]
    pub flags: AnalysisFlags,
    #[serde(default)]
    pub flow_timing: FlowTiming,
    #[serde(default = "default_large_flow_level_pct")]
    pub large_flow_level_pct: Decimal,
    #[serde(default = "default_calc_scale")]
    pub calc_scale: u32,
    #[serde(default)]
    pub result_in_percent: bool,
    #[serde(default = "default_result_rate_scale")]
    pub result_rate_scale: u32,
    #[serde(default = "default_result_amount_scale")]
    pub result_amount_scale: u32,
    #[serde(default)]
    pub rounding_mode: RoundingMode,
    #[serde(default)]
    pub flows: BTreeMap<NaiveDate, Money>,
    #[serde(default)]
    pub asset_values: BTreeMap<NaiveDate, Money>,
    #[serde(default)]
    pub incomes: BTreeMap<NaiveDate, Money>,
}

impl AnalysisRequest {
    /// A request with default policy whose analysis window equals the
    /// investment window.
    pub fn new(investment_start_date_incl: NaiveDate, investment_end_date_incl: NaiveDate) -> Self {
        AnalysisRequest {
            analysis_start_date_incl: investment_start_date_incl,
            analysis_end_date_incl: investment_end_date_incl,
            investment_start_date_incl,
            investment_end_date_incl,
            period_unit: PeriodUnit::default(),
            twr_method: TwrMethod::default(),
            mwr_method: MwrMethod::default(),
            flags: AnalysisFlags::default(),
            flow_timing: FlowTiming::default(),
            large_flow_level_pct: default_large_flow_level_pct(),
            calc_scale: default_calc_scale(),
            result_in_percent: false,
            result_rate_scale: default_result_rate_scale(),
            result_amount_scale: default_result_amount_scale(),
            rounding_mode: RoundingMode::default(),
            flows: BTreeMap::new(),
            asset_values: BTreeMap::new(),
            incomes: BTreeMap::new(),
        }
    }

    pub fn validate(&self) -> PerfEngineResult<()> {
        if self.analysis_start_date_incl > self.analysis_end_date_incl {
            return Err(PerfEngineError::invalid(
                "analysis_start_date_incl",
                format!(
                    "analysis start {} is after analysis end {}",
                    self.analysis_start_date_incl, self.analysis_end_date_incl
                ),
            ));
        }
        if self.investment_start_date_incl > self.investment_end_date_incl {
            return Err(PerfEngineError::invalid(
                "investment_start_date_incl",
                format!(
                    "investment start {} is after investment end {}",
                    self.investment_start_date_incl, self.investment_end_date_incl
                ),
            ));
        }
        if self.calc_scale > MAX_SCALE || self.result_amount_scale > MAX_SCALE {
            return Err(PerfEngineError::invalid(
                "calc_scale",
                format!("scales must not exceed {MAX_SCALE}"),
            ));
        }
        if self.result_rate_scale > self.calc_scale {
            return Err(PerfEngineError::invalid(
                "result_rate_scale",
                format!(
                    "result rate scale {} exceeds calculation scale {}",
                    self.result_rate_scale, self.calc_scale
                ),
            ));
        }
        if self.large_flow_level_pct.is_sign_negative() {
            return Err(PerfEngineError::invalid(
                "large_flow_level_pct",
                "threshold must not be negative",
            ));
        }
        Ok(())
    }

    pub(crate) fn format_rate(&self, rate: Decimal) -> Decimal {
        let rate = if self.result_in_percent {
            rate * dec!(100)
        } else {
            rate
        };
        self.rounding_mode.round(rate, self.result_rate_scale)
    }

    pub(crate) fn format_amount(&self, amount: Money) -> Money {
        self.rounding_mode.round(amount, self.result_amount_scale)
    }

    pub(crate) fn round_calc(&self, value: Decimal) -> Decimal {
        self.rounding_mode.round(value, self.calc_scale)
    }
}
