//! Rolling windows over the per-period history of a report.

use rust_decimal::Decimal;
use std::collections::VecDeque;

use crate::returns::{annualize_years, AnnualizationOption, RoundingMode};
use crate::types::{Money, Rate};
use crate::PerfEngineResult;

/// Trailing TWR window lengths in years.
pub const TRAILING_YEARS: [u32; 5] = [1, 2, 3, 5, 10];

/// Simple moving average over the last `window` values.
#[derive(Debug)]
pub(crate) struct MovingAverage {
    window: usize,
    values: VecDeque<Money>,
    sum: Money,
}

impl MovingAverage {
    pub(crate) fn new(window: usize) -> Self {
        MovingAverage {
            window: window.max(1),
            values: VecDeque::with_capacity(window + 1),
            sum: Decimal::ZERO,
        }
    }

    /// Add a value; yields the average once the window is full.
    pub(crate) fn push(&mut self, value: Money) -> Option<Money> {
        self.values.push_back(value);
        self.sum += value;
        if self.values.len() > self.window {
            if let Some(old) = self.values.pop_front() {
                self.sum -= old;
            }
        }
        (self.values.len() == self.window).then(|| self.sum / Decimal::from(self.window as u64))
    }
}

/// Annualized trailing TWR over 1/2/3/5/10 years.
///
/// Each longer window extends the factor cached for the next shorter one by
/// the periods it adds, so no window is multiplied out from scratch.
#[derive(Debug)]
pub(crate) struct TrailingTwr {
    periods_per_year: usize,
    enabled: [bool; 5],
    /// Index of the longest enabled window
    longest: usize,
    factors: VecDeque<Decimal>,
    calc_scale: u32,
    rounding_mode: RoundingMode,
}

impl TrailingTwr {
    /// `None` when no window is enabled.
    pub(crate) fn new(
        periods_per_year: usize,
        enabled: [bool; 5],
        calc_scale: u32,
        rounding_mode: RoundingMode,
    ) -> Option<Self> {
        let longest = enabled.iter().rposition(|on| *on)?;
        let capacity = periods_per_year * TRAILING_YEARS[longest] as usize;
        Some(TrailingTwr {
            periods_per_year,
            enabled,
            longest,
            factors: VecDeque::with_capacity(capacity + 1),
            calc_scale,
            rounding_mode,
        })
    }

    fn capacity(&self) -> usize {
        self.periods_per_year * TRAILING_YEARS[self.longest] as usize
    }

    /// Record one period's growth factor and return the annualized trailing
    /// returns, `None` for windows without enough history.
    pub(crate) fn push(&mut self, factor: Decimal) -> PerfEngineResult<[Option<Rate>; 5]> {
        self.factors.push_back(factor);
        if self.factors.len() > self.capacity() {
            self.factors.pop_front();
        }

        let mut windows = [None; 5];
        let mut cached = Decimal::ONE;
        let mut covered = 0usize;
        for (i, years) in TRAILING_YEARS.iter().enumerate().take(self.longest + 1) {
            let length = self.periods_per_year * *years as usize;
            if self.factors.len() < length {
                break;
            }
            for f in self.factors.iter().rev().skip(covered).take(length - covered) {
                cached = self.rounding_mode.round(cached * f, self.calc_scale);
            }
            covered = length;
            if self.enabled[i] {
                let annual = annualize_years(
                    AnnualizationOption::AnnualizeIfOverOneYear,
                    cached,
                    *years,
                )?;
                windows[i] = Some(annual - Decimal::ONE);
            }
        }
        Ok(windows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_moving_average_fills_then_rolls() {
        let mut avg = MovingAverage::new(3);
        assert_eq!(avg.push(dec!(3)), None);
        assert_eq!(avg.push(dec!(6)), None);
        assert_eq!(avg.push(dec!(9)), Some(dec!(6)));
        assert_eq!(avg.push(dec!(12)), Some(dec!(9)));
    }

    #[test]
    fn test_disabled_trailing_is_none() {
        assert!(TrailingTwr::new(12, [false; 5], 10, RoundingMode::HalfUp).is_none());
    }

    #[test]
    fn test_yearly_windows() {
        // Annual periods: 1y needs one period, 2y two.
        let mut t =
            TrailingTwr::new(1, [true, true, false, false, false], 10, RoundingMode::HalfUp)
                .unwrap();
        let w = t.push(dec!(1.1)).unwrap();
        assert_eq!(w[0], Some(dec!(0.1)));
        assert_eq!(w[1], None);

        let w = t.push(dec!(1.21) / dec!(1.1)).unwrap();
        assert_eq!(w[0], Some(dec!(0.1)));
        assert_eq!(w[1].map(|r| r.round_dp(8)), Some(dec!(0.1)));
        assert_eq!(w[2], None);
    }

    #[test]
    fn test_bankrupt_window_is_total_loss() {
        let mut t = TrailingTwr::new(1, [true; 5], 10, RoundingMode::HalfUp).unwrap();
        t.push(dec!(0)).unwrap();
        let w = t.push(dec!(1.5)).unwrap();
        assert_eq!(w[0], Some(dec!(0.5)));
        assert_eq!(w[1], Some(dec!(-1)));
    }
}
