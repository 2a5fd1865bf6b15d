use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

/// One row of a performance report.
///
/// Every figure is `None` when the period lies outside the investment window
/// or when the flag that enables it is off. Trailing figures stay `None` until
/// enough history has accumulated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodRecord {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub caption: String,
    pub start_value: Option<Money>,
    pub end_value: Option<Money>,
    pub period_flow: Option<Money>,
    pub period_twr: Option<Rate>,
    pub cumulative_twr: Option<Rate>,
    pub annualized_twr: Option<Rate>,
    pub cumulative_mwr: Option<Rate>,
    pub annualized_mwr: Option<Rate>,
    pub total_contribution: Option<Money>,
    pub period_profit: Option<Money>,
    pub total_profit: Option<Money>,
    pub trailing_avg_profit_1y: Option<Money>,
    pub trailing_avg_flow_1y: Option<Money>,
    pub trailing_avg_income_1y: Option<Money>,
    pub period_income: Option<Money>,
    pub trailing_twr_1y: Option<Rate>,
    pub trailing_twr_2y: Option<Rate>,
    pub trailing_twr_3y: Option<Rate>,
    pub trailing_twr_5y: Option<Rate>,
    pub trailing_twr_10y: Option<Rate>,
}

impl PeriodRecord {
    /// A record carrying only bounds and caption.
    pub fn empty(start_date: NaiveDate, end_date: NaiveDate, caption: String) -> Self {
        PeriodRecord {
            start_date,
            end_date,
            caption,
            ..Default::default()
        }
    }

    /// True when no figure at all is populated.
    pub fn is_empty(&self) -> bool {
        *self == PeriodRecord::empty(self.start_date, self.end_date, self.caption.clone())
    }

    pub(crate) fn set_trailing_twr(&mut self, windows: [Option<Rate>; 5]) {
        let [one, two, three, five, ten] = windows;
        self.trailing_twr_1y = one;
        self.trailing_twr_2y = two;
        self.trailing_twr_3y = three;
        self.trailing_twr_5y = five;
        self.trailing_twr_10y = ten;
    }
}
