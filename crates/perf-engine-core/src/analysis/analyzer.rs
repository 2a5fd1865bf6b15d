use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::calendar::{next_day, previous_day};
use crate::error::PerfEngineError;
use crate::feeds::{total, CashFlowLedger, IncomeLedger, ValuationCurve};
use crate::returns::{annualize, AnnualizationOption, CalcRequest, FlowTiming, ReturnCalculator};
use crate::types::{Money, Rate};
use crate::PerfEngineResult;

use super::record::PeriodRecord;
use super::request::{AnalysisRequest, PeriodUnit};
use super::trailing::{MovingAverage, TrailingTwr};

/// The data feeds a report is computed from.
pub struct Feeds<'a> {
    pub flows: &'a dyn CashFlowLedger,
    pub values: &'a dyn ValuationCurve,
    pub incomes: Option<&'a dyn IncomeLedger>,
}

impl<'a> Feeds<'a> {
    /// Feeds carried inline by the request.
    pub fn from_request(request: &'a AnalysisRequest) -> Self {
        Feeds {
            flows: &request.flows,
            values: &request.asset_values,
            incomes: Some(&request.incomes),
        }
    }
}

type BoxedCalculator = Box<dyn ReturnCalculator + Send + Sync>;

/// Produces a periodic TWR/MWR report using the injected calculators.
pub struct PerformanceAnalyzer {
    twr: BoxedCalculator,
    mwr: BoxedCalculator,
}

/// Running totals carried from one investable period to the next.
struct RunningState {
    initial_value: Money,
    previous_end_value: Option<Money>,
    cumulative_twr: Decimal,
    total_contribution: Money,
    total_profit: Money,
    avg_profit: Option<MovingAverage>,
    avg_flow: Option<MovingAverage>,
    avg_income: Option<MovingAverage>,
    trailing: Option<TrailingTwr>,
}

impl RunningState {
    fn new(request: &AnalysisRequest, feeds: &Feeds<'_>) -> PerfEngineResult<Self> {
        let flags = &request.flags;
        let window = request.period_unit.periods_per_year();
        let average = |on: bool| on.then(|| MovingAverage::new(window));
        // An empty portfolio still needs an explicit zero valuation here.
        let before_start = previous_day(request.investment_start_date_incl)?;
        Ok(RunningState {
            initial_value: feeds.values.require(before_start, "asset_values")?,
            previous_end_value: None,
            cumulative_twr: Decimal::ONE,
            total_contribution: Decimal::ZERO,
            total_profit: Decimal::ZERO,
            avg_profit: average(flags.calculate_trailing_avg_profit_1y),
            avg_flow: average(flags.calculate_trailing_avg_flow_1y),
            avg_income: average(flags.calculate_trailing_avg_income_1y),
            trailing: TrailingTwr::new(
                window,
                flags.trailing_twr(),
                request.calc_scale,
                request.rounding_mode,
            ),
        })
    }
}

impl PerformanceAnalyzer {
    pub fn new(twr: BoxedCalculator, mwr: BoxedCalculator) -> Self {
        PerformanceAnalyzer { twr, mwr }
    }

    /// Analyzer wired with the calculators the request selects.
    pub fn for_request(request: &AnalysisRequest) -> Self {
        PerformanceAnalyzer::new(
            request.twr_method.kind().calculator(),
            request.mwr_method.kind().calculator(),
        )
    }

    pub fn analyze(
        &self,
        request: &AnalysisRequest,
        feeds: &Feeds<'_>,
    ) -> PerfEngineResult<Vec<PeriodRecord>> {
        request.validate()?;
        let investment_start = request.investment_start_date_incl;
        let investment_end = request.investment_end_date_incl;
        let periods = reporting_periods(
            request.period_unit,
            request.analysis_start_date_incl,
            request.analysis_end_date_incl,
        )?;
        let overlaps = request.analysis_start_date_incl <= investment_end
            && request.analysis_end_date_incl >= investment_start;
        let mut state = if overlaps {
            Some(self.seed_state(request, feeds)?)
        } else {
            None
        };
        let mut records = Vec::with_capacity(periods.len());

        for (start, end) in periods {
            let caption = request.period_unit.caption(start);
            let investable = end >= investment_start && start <= investment_end;
            match state.as_mut() {
                Some(running) if investable => {
                    records.push(self.analyze_period(request, feeds, running, start, end, caption)?);
                }
                _ => records.push(PeriodRecord::empty(start, end, caption)),
            }
        }

        tracing::debug!(
            periods = records.len(),
            twr = self.twr.name(),
            mwr = self.mwr.name(),
            "performance analysis complete"
        );
        Ok(records)
    }

    /// Running state as of the analysis start. Investable periods that precede
    /// the analysis window are computed and discarded so that cumulative,
    /// total and trailing figures include them.
    fn seed_state(
        &self,
        request: &AnalysisRequest,
        feeds: &Feeds<'_>,
    ) -> PerfEngineResult<RunningState> {
        let mut state = RunningState::new(request, feeds)?;
        let investment_start = request.investment_start_date_incl;
        if request.analysis_start_date_incl <= investment_start {
            return Ok(state);
        }

        let last_hidden = previous_day(request.analysis_start_date_incl)?;
        let hidden = reporting_periods(request.period_unit, investment_start, last_hidden)?;
        for &(start, end) in &hidden {
            let caption = request.period_unit.caption(start);
            self.analyze_period(request, feeds, &mut state, start, end, caption)?;
        }
        tracing::debug!(
            periods = hidden.len(),
            until = %last_hidden,
            "running state seeded before analysis window"
        );
        Ok(state)
    }

    fn analyze_period(
        &self,
        request: &AnalysisRequest,
        feeds: &Feeds<'_>,
        state: &mut RunningState,
        period_start: NaiveDate,
        period_end: NaiveDate,
        caption: String,
    ) -> PerfEngineResult<PeriodRecord> {
        let investment_start = request.investment_start_date_incl;
        let start = period_start.max(investment_start);
        let end = period_end.min(request.investment_end_date_incl);
        let flags = &request.flags;

        let start_value = state.previous_end_value.unwrap_or(state.initial_value);
        let end_value = feeds.values.require(end, "asset_values")?;
        let flows = feeds.flows.flows(start, end);
        let flow_sum = total(&flows);

        let period_twr = self.period_twr(request, feeds, start, end, start_value, end_value, &flows)?;
        let factor = Decimal::ONE + period_twr;
        if factor.is_sign_negative() {
            return Err(PerfEngineError::invalid(
                "asset_values",
                format!("period {start}..={end} yields negative growth factor {factor}"),
            ));
        }
        state.cumulative_twr = request.round_calc(state.cumulative_twr * factor);
        let annualized_twr = annualize(
            AnnualizationOption::AnnualizeIfOverOneYear,
            state.cumulative_twr,
            investment_start,
            end,
        )? - Decimal::ONE;

        let mut record = PeriodRecord::empty(period_start, period_end, caption);

        if flags.calculate_mwr {
            let cumulative_mwr = self.cumulative_mwr(request, feeds, state.initial_value, end, end_value)?;
            let annualized_mwr = annualize(
                AnnualizationOption::AnnualizeIfOverOneYear,
                Decimal::ONE + cumulative_mwr,
                investment_start,
                end,
            )? - Decimal::ONE;
            record.cumulative_mwr = Some(request.format_rate(cumulative_mwr));
            record.annualized_mwr = Some(request.format_rate(annualized_mwr));
        }

        let period_profit = end_value - start_value - flow_sum;
        state.total_contribution += flow_sum;
        state.total_profit += period_profit;
        state.previous_end_value = Some(end_value);

        let period_income = match (flags.needs_income(), feeds.incomes) {
            (true, Some(ledger)) => {
                Some(total(&ledger.incomes(previous_day(start)?, next_day(end)?)))
            }
            (true, None) => Some(Decimal::ZERO),
            (false, _) => None,
        };

        record.start_value = Some(request.format_amount(start_value));
        record.end_value = Some(request.format_amount(end_value));
        record.period_flow = Some(request.format_amount(flow_sum));
        record.period_twr = Some(request.format_rate(period_twr));
        record.cumulative_twr = Some(request.format_rate(state.cumulative_twr - Decimal::ONE));
        record.annualized_twr = Some(request.format_rate(annualized_twr));
        record.total_contribution = Some(request.format_amount(state.total_contribution));
        record.period_profit = Some(request.format_amount(period_profit));
        record.total_profit = Some(request.format_amount(state.total_profit));
        if flags.calculate_period_income {
            record.period_income = period_income.map(|v| request.format_amount(v));
        }

        let push = |avg: &mut Option<MovingAverage>, value: Money| {
            avg.as_mut()
                .and_then(|a| a.push(value))
                .map(|v| request.format_amount(v))
        };
        record.trailing_avg_profit_1y = push(&mut state.avg_profit, period_profit);
        record.trailing_avg_flow_1y = push(&mut state.avg_flow, flow_sum);
        if let Some(income) = period_income {
            record.trailing_avg_income_1y = push(&mut state.avg_income, income);
        }

        if let Some(trailing) = state.trailing.as_mut() {
            let windows = trailing.push(factor)?;
            record.set_trailing_twr(windows.map(|w| w.map(|r| request.format_rate(r))));
        }

        Ok(record)
    }

    /// TWR of one period. A period that starts with nothing invested begins
    /// at its first flow instead; with no flow at all it has no return.
    #[allow(clippy::too_many_arguments)]
    fn period_twr(
        &self,
        request: &AnalysisRequest,
        feeds: &Feeds<'_>,
        start: NaiveDate,
        end: NaiveDate,
        start_value: Money,
        end_value: Money,
        flows: &BTreeMap<NaiveDate, Money>,
    ) -> PerfEngineResult<Rate> {
        let mut sub_start = start;
        let mut sub_start_value = start_value;

        if start_value.is_zero() {
            let first = flows.iter().find(|(_, amount)| !amount.is_zero());
            match (first, request.flow_timing) {
                (None, _) => {
                    if end_value.is_zero() {
                        return Ok(Decimal::ZERO);
                    }
                    return Err(PerfEngineError::invalid(
                        "asset_values",
                        format!("period {start}..={end} grows from zero to {end_value} without flows"),
                    ));
                }
                (Some((date, _)), FlowTiming::BeginningOfDay) => sub_start = *date,
                (Some((date, _)), FlowTiming::EndOfDay) => {
                    if *date >= end {
                        return Ok(Decimal::ZERO);
                    }
                    sub_start = next_day(*date)?;
                    sub_start_value = feeds.values.require(*date, "asset_values")?;
                }
            }
        }

        let sub_flows: BTreeMap<NaiveDate, Money> = flows
            .range(sub_start..=end)
            .map(|(d, v)| (*d, *v))
            .collect();
        let sub_request = self
            .calc_request(request, sub_start, end, sub_start_value, end_value)
            .with_flows(sub_flows)
            .with_asset_values(feeds.values.values_between(sub_start, end));
        self.twr.raw_return(&sub_request)
    }

    /// Money-weighted return from the investment start to `end`.
    fn cumulative_mwr(
        &self,
        request: &AnalysisRequest,
        feeds: &Feeds<'_>,
        initial_value: Money,
        end: NaiveDate,
        end_value: Money,
    ) -> PerfEngineResult<Rate> {
        let start = request.investment_start_date_incl;
        let mwr_request = self
            .calc_request(request, start, end, initial_value, end_value)
            .with_flows(feeds.flows.flows(start, end))
            .with_asset_values(feeds.values.values_between(start, end));
        self.mwr.raw_return(&mwr_request)
    }

    fn calc_request(
        &self,
        request: &AnalysisRequest,
        start: NaiveDate,
        end: NaiveDate,
        start_value: Money,
        end_value: Money,
    ) -> CalcRequest {
        CalcRequest::new(start, end, start_value, end_value)
            .with_flow_timing(request.flow_timing)
            .with_large_flow_level_pct(request.large_flow_level_pct)
            .with_scales(request.calc_scale, request.result_rate_scale)
            .with_rounding_mode(request.rounding_mode)
    }
}

/// Calendar-aligned periods covering `[from, to]`, the first and last clipped.
fn reporting_periods(
    unit: PeriodUnit,
    from: NaiveDate,
    to: NaiveDate,
) -> PerfEngineResult<Vec<(NaiveDate, NaiveDate)>> {
    let mut periods = Vec::new();
    let mut start = from;
    loop {
        let end = unit.period_end(start)?.min(to);
        periods.push((start, end));
        if end >= to {
            break;
        }
        start = next_day(end)?;
    }
    Ok(periods)
}

/// Run the analysis with the calculators and feeds carried by `request`.
pub fn analyze_performance(request: &AnalysisRequest) -> PerfEngineResult<Vec<PeriodRecord>> {
    PerformanceAnalyzer::for_request(request).analyze(request, &Feeds::from_request(request))
}
