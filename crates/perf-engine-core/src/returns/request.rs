use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::PerfEngineError;
use crate::types::{Money, Rate};
use crate::PerfEngineResult;

/// Largest scale a `Decimal` can carry.
pub const MAX_SCALE: u32 = 28;

/// Whether a flow is invested from the start or from the end of its calendar day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowTiming {
    BeginningOfDay,
    #[default]
    EndOfDay,
}

impl FlowTiming {
    /// Days a flow sits outside the portfolio on its own date.
    pub(crate) fn day_lag(self) -> i64 {
        match self {
            FlowTiming::BeginningOfDay => 0,
            FlowTiming::EndOfDay => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnualizationOption {
    #[default]
    DoNotAnnualize,
    /// Annualize only spans strictly longer than one calendar year.
    AnnualizeIfOverOneYear,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    #[default]
    HalfUp,
    HalfEven,
    HalfDown,
    Up,
    Down,
    Ceiling,
    Floor,
}

impl RoundingMode {
    pub fn strategy(self) -> RoundingStrategy {
        match self {
            RoundingMode::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            RoundingMode::HalfEven => RoundingStrategy::MidpointNearestEven,
            RoundingMode::HalfDown => RoundingStrategy::MidpointTowardZero,
            RoundingMode::Up => RoundingStrategy::AwayFromZero,
            RoundingMode::Down => RoundingStrategy::ToZero,
            RoundingMode::Ceiling => RoundingStrategy::ToPositiveInfinity,
            RoundingMode::Floor => RoundingStrategy::ToNegativeInfinity,
        }
    }

    pub fn round(self, value: Decimal, scale: u32) -> Decimal {
        value.round_dp_with_strategy(scale, self.strategy())
    }
}

fn default_large_flow_level_pct() -> Decimal {
    dec!(10)
}

fn default_calc_scale() -> u32 {
    10
}

fn default_result_scale() -> u32 {
    4
}

/// Input for a single return calculation over `[start_date_incl, end_date_incl]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalcRequest {
    pub start_date_incl: NaiveDate,
    pub end_date_incl: NaiveDate,
    /// Portfolio value immediately before `start_date_incl`
    pub start_value_excl: Money,
    /// Portfolio value at `end_date_incl`
    pub end_value_incl: Money,
    /// External flows by date; positive = money in
    #[serde(default)]
    pub flows: BTreeMap<NaiveDate, Money>,
    /// Valuation curve used for sub-period boundaries
    #[serde(default)]
    pub asset_values: BTreeMap<NaiveDate, Money>,
    #[serde(default)]
    pub flow_timing: FlowTiming,
    #[serde(default)]
    pub annualization: AnnualizationOption,
    /// Large-flow threshold in percent of sub-period start value (linked TWR only)
    #[serde(default = "default_large_flow_level_pct")]
    pub large_flow_level_pct: Decimal,
    #[serde(default = "default_calc_scale")]
    pub calc_scale: u32,
    #[serde(default = "default_result_scale")]
    pub result_scale: u32,
    #[serde(default)]
    pub rounding_mode: RoundingMode,
    #[serde(default)]
    pub result_in_percent: bool,
}

impl CalcRequest {
    pub fn new(
        start_date_incl: NaiveDate,
        end_date_incl: NaiveDate,
        start_value_excl: Money,
        end_value_incl: Money,
    ) -> Self {
        CalcRequest {
            start_date_incl,
            end_date_incl,
            start_value_excl,
            end_value_incl,
            flows: BTreeMap::new(),
            asset_values: BTreeMap::new(),
            flow_timing: FlowTiming::default(),
            annualization: AnnualizationOption::default(),
            large_flow_level_pct: default_large_flow_level_pct(),
            calc_scale: default_calc_scale(),
            result_scale: default_result_scale(),
            rounding_mode: RoundingMode::default(),
            result_in_percent: false,
        }
    }

    pub fn with_flows(mut self, flows: BTreeMap<NaiveDate, Money>) -> Self {
        self.flows = flows;
        self
    }

    pub fn with_asset_values(mut self, asset_values: BTreeMap<NaiveDate, Money>) -> Self {
        self.asset_values = asset_values;
        self
    }

    pub fn with_flow_timing(mut self, flow_timing: FlowTiming) -> Self {
        self.flow_timing = flow_timing;
        self
    }

    pub fn with_annualization(mut self, annualization: AnnualizationOption) -> Self {
        self.annualization = annualization;
        self
    }

    pub fn with_large_flow_level_pct(mut self, pct: Decimal) -> Self {
        self.large_flow_level_pct = pct;
        self
    }

    pub fn with_scales(mut self, calc_scale: u32, result_scale: u32) -> Self {
        self.calc_scale = calc_scale;
        self.result_scale = result_scale;
        self
    }

    pub fn with_rounding_mode(mut self, rounding_mode: RoundingMode) -> Self {
        self.rounding_mode = rounding_mode;
        self
    }

    pub fn in_percent(mut self, result_in_percent: bool) -> Self {
        self.result_in_percent = result_in_percent;
        self
    }

    /// Check the caller-side invariants shared by every calculator.
    pub fn validate(&self) -> PerfEngineResult<()> {
        if self.start_date_incl > self.end_date_incl {
            return Err(PerfEngineError::invalid(
                "start_date_incl",
                format!(
                    "start date {} is after end date {}",
                    self.start_date_incl, self.end_date_incl
                ),
            ));
        }
        if let Some((date, _)) = self
            .flows
            .iter()
            .find(|(d, _)| **d < self.start_date_incl || **d > self.end_date_incl)
        {
            return Err(PerfEngineError::invalid(
                "flows",
                format!(
                    "flow dated {date} lies outside {}..={}",
                    self.start_date_incl, self.end_date_incl
                ),
            ));
        }
        if self.calc_scale > MAX_SCALE {
            return Err(PerfEngineError::invalid(
                "calc_scale",
                format!("must not exceed {MAX_SCALE}"),
            ));
        }
        if self.calc_scale < self.result_scale {
            return Err(PerfEngineError::invalid(
                "result_scale",
                format!(
                    "result scale {} exceeds calculation scale {}",
                    self.result_scale, self.calc_scale
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

    /// Round an intermediate figure to the calculation scale.
    pub(crate) fn round_calc(&self, value: Decimal) -> Decimal {
        self.rounding_mode.round(value, self.calc_scale)
    }

    /// Non-zero flows in ascending date order. Zero flows are no-ops.
    pub(crate) fn active_flows(&self) -> Vec<(NaiveDate, Money)> {
        self.flows
            .iter()
            .filter(|(_, amount)| !amount.is_zero())
            .map(|(date, amount)| (*date, *amount))
            .collect()
    }

    /// A request for a sub-period of this one, sharing its numeric policy and
    /// never annualized.
    pub(crate) fn sub_period(
        &self,
        start_date_incl: NaiveDate,
        end_date_incl: NaiveDate,
        start_value_excl: Money,
        end_value_incl: Money,
        flows: &[(NaiveDate, Money)],
    ) -> CalcRequest {
        CalcRequest {
            start_date_incl,
            end_date_incl,
            start_value_excl,
            end_value_incl,
            flows: flows.iter().copied().collect(),
            asset_values: BTreeMap::new(),
            flow_timing: self.flow_timing,
            annualization: AnnualizationOption::DoNotAnnualize,
            large_flow_level_pct: self.large_flow_level_pct,
            calc_scale: self.calc_scale,
            result_scale: self.result_scale,
            rounding_mode: self.rounding_mode,
            result_in_percent: false,
        }
    }
}

/// Output of a calculator run, as handed to the CLI and bindings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalcOutput {
    pub method: String,
    #[serde(rename = "return")]
    pub return_value: Rate,
    pub in_percent: bool,
}
