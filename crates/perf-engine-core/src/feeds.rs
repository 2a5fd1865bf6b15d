//! Interfaces to the data feeds the engine consumes: the cash-flow ledger,
//! the asset-valuation curve and the optional income ledger.
//!
//! `BTreeMap<NaiveDate, Money>` implements all three, which is what the
//! serialisable request types carry inline.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::ops::Bound;

use crate::error::PerfEngineError;
use crate::types::Money;
use crate::PerfEngineResult;

/// External cash flows, signed, in the portfolio's base currency.
pub trait CashFlowLedger {
    /// Flows dated within `[from_incl, to_incl]`, sorted by date.
    fn flows(&self, from_incl: NaiveDate, to_incl: NaiveDate) -> BTreeMap<NaiveDate, Money>;
}

/// Point valuations of the portfolio. The engine never extrapolates.
pub trait ValuationCurve {
    fn value_at(&self, date: NaiveDate) -> Option<Money>;

    /// Valuations within `[from_incl, to_incl]`.
    fn values_between(&self, from_incl: NaiveDate, to_incl: NaiveDate)
        -> BTreeMap<NaiveDate, Money>;

    /// Valuation at `date`, or `InvalidInput` naming `field` when the curve has none.
    fn require(&self, date: NaiveDate, field: &str) -> PerfEngineResult<Money> {
        self.value_at(date).ok_or_else(|| {
            PerfEngineError::invalid(field, format!("no asset valuation available for {date}"))
        })
    }
}

/// Investment income (dividends, coupons, interest).
pub trait IncomeLedger {
    /// Income dated strictly between `from_excl` and `to_excl`, sorted by date.
    fn incomes(&self, from_excl: NaiveDate, to_excl: NaiveDate) -> BTreeMap<NaiveDate, Money>;
}

fn clone_range(
    map: &BTreeMap<NaiveDate, Money>,
    lower: Bound<NaiveDate>,
    upper: Bound<NaiveDate>,
) -> BTreeMap<NaiveDate, Money> {
    // BTreeMap::range panics on inverted or empty-excluded bounds.
    let empty = match (lower, upper) {
        (Bound::Included(a), Bound::Included(b)) => a > b,
        (Bound::Included(a), Bound::Excluded(b))
        | (Bound::Excluded(a), Bound::Included(b))
        | (Bound::Excluded(a), Bound::Excluded(b)) => a >= b,
        _ => false,
    };
    if empty {
        return BTreeMap::new();
    }
    map.range((lower, upper)).map(|(d, v)| (*d, *v)).collect()
}

impl CashFlowLedger for BTreeMap<NaiveDate, Money> {
    fn flows(&self, from_incl: NaiveDate, to_incl: NaiveDate) -> BTreeMap<NaiveDate, Money> {
        clone_range(self, Bound::Included(from_incl), Bound::Included(to_incl))
    }
}

impl ValuationCurve for BTreeMap<NaiveDate, Money> {
    fn value_at(&self, date: NaiveDate) -> Option<Money> {
        self.get(&date).copied()
    }

    fn values_between(
        &self,
        from_incl: NaiveDate,
        to_incl: NaiveDate,
    ) -> BTreeMap<NaiveDate, Money> {
        clone_range(self, Bound::Included(from_incl), Bound::Included(to_incl))
    }
}

impl IncomeLedger for BTreeMap<NaiveDate, Money> {
    fn incomes(&self, from_excl: NaiveDate, to_excl: NaiveDate) -> BTreeMap<NaiveDate, Money> {
        clone_range(self, Bound::Excluded(from_excl), Bound::Excluded(to_excl))
    }
}

/// Sum of all amounts in a dated mapping.
pub fn total(amounts: &BTreeMap<NaiveDate, Money>) -> Money {
    amounts.values().copied().sum::<Decimal>()
}
