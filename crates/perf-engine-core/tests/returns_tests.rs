use chrono::NaiveDate;
use perf_engine_core::returns::{
    calculate_return, AnnualizationOption, CalcRequest, CalculatorKind, FlowTiming,
    LinkedDietzTwrCalculator, ModifiedDietzCalculator, ReturnCalculator, SimpleReturnCalculator,
    TrueTwrCalculator,
};
use perf_engine_core::PerfEngineError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

// ---------------------------------------------------------------------------
// Simple return
// ---------------------------------------------------------------------------

#[test]
fn test_simple_return_zero_start_is_invalid() {
    let req = CalcRequest::new(d(2024, 1, 1), d(2024, 12, 31), dec!(0), dec!(100));
    let err = SimpleReturnCalculator.calculate_return(&req).unwrap_err();
    assert!(matches!(err, PerfEngineError::InvalidInput { .. }));
}

#[test]
fn test_simple_return_zero_end_is_total_loss() {
    let req = CalcRequest::new(d(2024, 1, 1), d(2024, 12, 31), dec!(250), dec!(0));
    assert_eq!(SimpleReturnCalculator.calculate_return(&req).unwrap(), dec!(-1));
}

// ---------------------------------------------------------------------------
// Modified Dietz
// ---------------------------------------------------------------------------

#[test]
fn test_modified_dietz_reference_example() {
    let req = CalcRequest::new(d(2024, 1, 1), d(2024, 1, 31), dec!(1000), dec!(1100))
        .with_flows(BTreeMap::from([(d(2024, 1, 11), dec!(50))]))
        .with_flow_timing(FlowTiming::EndOfDay)
        .with_scales(10, 8);
    let r = ModifiedDietzCalculator.calculate_return(&req).unwrap();
    assert_eq!(r, dec!(1550) / dec!(32000));
    assert_eq!(r, dec!(0.0484375));
}

#[test]
fn test_modified_dietz_in_percent() {
    let req = CalcRequest::new(d(2024, 1, 1), d(2024, 1, 31), dec!(1000), dec!(1100))
        .with_flows(BTreeMap::from([(d(2024, 1, 11), dec!(50))]))
        .with_scales(10, 5)
        .in_percent(true);
    let r = calculate_return(CalculatorKind::ModifiedDietz, &req).unwrap();
    assert_eq!(r, dec!(4.84375));
}

#[test]
fn test_undefined_average_capital_is_distinct() {
    let req = CalcRequest::new(d(2024, 1, 1), d(2024, 1, 31), dec!(100), dec!(10))
        .with_flows(BTreeMap::from([(d(2024, 1, 2), dec!(-500))]))
        .with_flow_timing(FlowTiming::BeginningOfDay);
    let err = ModifiedDietzCalculator.calculate_return(&req).unwrap_err();
    match err {
        PerfEngineError::UndefinedAverageCapital { start_value, .. } => {
            assert_eq!(start_value, dec!(100));
        }
        other => panic!("expected UndefinedAverageCapital, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Annualization
// ---------------------------------------------------------------------------

#[test]
fn test_two_year_return_annualizes_to_ten_percent() {
    let req = CalcRequest::new(d(2022, 1, 1), d(2023, 12, 31), dec!(100), dec!(121))
        .with_annualization(AnnualizationOption::AnnualizeIfOverOneYear);
    for kind in [
        CalculatorKind::Simple,
        CalculatorKind::ModifiedDietz,
        CalculatorKind::TrueTwr,
    ] {
        assert_eq!(calculate_return(kind, &req).unwrap(), dec!(0.10), "{kind}");
    }
}

#[test]
fn test_sub_year_span_is_not_annualized() {
    let req = CalcRequest::new(d(2024, 1, 1), d(2024, 6, 30), dec!(100), dec!(105))
        .with_annualization(AnnualizationOption::AnnualizeIfOverOneYear);
    assert_eq!(calculate_return(CalculatorKind::TrueTwr, &req).unwrap(), dec!(0.05));
}

// ---------------------------------------------------------------------------
// Bankruptcy propagation
// ---------------------------------------------------------------------------

#[test]
fn test_true_twr_bankruptcy_overrides_later_periods() {
    // Wiped out by Jan 14 (before a fresh deposit); the later recovery is ignored.
    let req = CalcRequest::new(d(2024, 1, 1), d(2024, 3, 31), dec!(1000), dec!(900))
        .with_flow_timing(FlowTiming::BeginningOfDay)
        .with_flows(BTreeMap::from([(d(2024, 1, 15), dec!(500))]))
        .with_asset_values(BTreeMap::from([(d(2024, 1, 14), dec!(0))]));
    assert_eq!(TrueTwrCalculator.calculate_return(&req).unwrap(), dec!(-1));
}

#[test]
fn test_linked_twr_bankruptcy_overrides_later_periods() {
    let req = CalcRequest::new(d(2024, 1, 1), d(2024, 3, 31), dec!(1000), dec!(900))
        .with_flows(BTreeMap::from([(d(2024, 2, 10), dec!(500))]))
        .with_asset_values(BTreeMap::from([
            (d(2024, 1, 31), dec!(0)),
            (d(2024, 2, 10), dec!(500)),
            (d(2024, 2, 29), dec!(800)),
        ]));
    assert_eq!(LinkedDietzTwrCalculator.calculate_return(&req).unwrap(), dec!(-1));
}

// ---------------------------------------------------------------------------
// Consistency between linked and true TWR
// ---------------------------------------------------------------------------

#[test]
fn test_split_at_flow_boundary_beginning_of_day() {
    let req = CalcRequest::new(d(2024, 1, 1), d(2024, 2, 29), dec!(100), dec!(330))
        .with_flow_timing(FlowTiming::BeginningOfDay)
        .with_flows(BTreeMap::from([(d(2024, 2, 1), dec!(200))]))
        .with_asset_values(BTreeMap::from([(d(2024, 1, 31), dec!(110))]))
        .with_scales(10, 10);
    let linked = LinkedDietzTwrCalculator.calculate_return(&req).unwrap();
    let exact = TrueTwrCalculator.calculate_return(&req).unwrap();
    assert_eq!(linked, exact);
}

#[test]
fn test_split_at_flow_boundary_end_of_day() {
    let req = CalcRequest::new(d(2024, 1, 1), d(2024, 2, 29), dec!(100), dec!(330))
        .with_flow_timing(FlowTiming::EndOfDay)
        .with_flows(BTreeMap::from([(d(2024, 1, 31), dec!(200))]))
        .with_asset_values(BTreeMap::from([(d(2024, 1, 31), dec!(310))]))
        .with_scales(10, 10);
    let linked = LinkedDietzTwrCalculator.calculate_return(&req).unwrap();
    let exact = TrueTwrCalculator.calculate_return(&req).unwrap();
    assert_eq!(linked, exact);
}

#[test]
fn test_split_without_flows_is_neutral() {
    // Valuation-only boundaries must not change the answer.
    let req = CalcRequest::new(d(2024, 1, 1), d(2024, 3, 31), dec!(100), dec!(125))
        .with_asset_values(BTreeMap::from([
            (d(2024, 1, 31), dec!(110)),
            (d(2024, 2, 29), dec!(125)),
        ]));
    let linked = LinkedDietzTwrCalculator.calculate_return(&req).unwrap();
    let exact = TrueTwrCalculator.calculate_return(&req).unwrap();
    assert_eq!(linked, exact);
    assert_eq!(exact, dec!(0.25));
}

// ---------------------------------------------------------------------------
// Idempotence and validation
// ---------------------------------------------------------------------------

#[test]
fn test_repeated_calls_are_identical() {
    let req = CalcRequest::new(d(2024, 1, 1), d(2024, 12, 31), dec!(1000), dec!(1234.56))
        .with_flows(BTreeMap::from([
            (d(2024, 3, 3), dec!(120)),
            (d(2024, 7, 19), dec!(-80)),
        ]))
        .with_asset_values(BTreeMap::from([
            (d(2024, 1, 31), dec!(1010)),
            (d(2024, 2, 29), dec!(1020)),
            (d(2024, 3, 3), dec!(1150)),
            (d(2024, 3, 31), dec!(1160)),
            (d(2024, 4, 30), dec!(1170)),
            (d(2024, 5, 31), dec!(1180)),
            (d(2024, 6, 30), dec!(1190)),
            (d(2024, 7, 19), dec!(1120)),
            (d(2024, 7, 31), dec!(1130)),
            (d(2024, 8, 31), dec!(1150)),
            (d(2024, 9, 30), dec!(1170)),
            (d(2024, 10, 31), dec!(1190)),
            (d(2024, 11, 30), dec!(1210)),
        ]));
    for kind in [
        CalculatorKind::Simple,
        CalculatorKind::ModifiedDietz,
        CalculatorKind::TrueTwr,
        CalculatorKind::LinkedDietzTwr,
    ] {
        let first = calculate_return(kind, &req).unwrap();
        let second = calculate_return(kind, &req).unwrap();
        assert_eq!(first.serialize(), second.serialize(), "{kind}");
    }
}

#[test]
fn test_flow_outside_bounds_is_rejected() {
    let req = CalcRequest::new(d(2024, 1, 1), d(2024, 1, 31), dec!(100), dec!(100))
        .with_flows(BTreeMap::from([(d(2023, 12, 31), dec!(5))]));
    for kind in [CalculatorKind::ModifiedDietz, CalculatorKind::TrueTwr] {
        assert!(calculate_return(kind, &req).unwrap_err().is_invalid_input());
    }
}

#[test]
fn test_zero_amount_flows_are_ignored() {
    let base = CalcRequest::new(d(2024, 1, 1), d(2024, 1, 31), dec!(100), dec!(104));
    let with_zero = base
        .clone()
        .with_flows(BTreeMap::from([(d(2024, 1, 15), Decimal::ZERO)]));
    for kind in [
        CalculatorKind::ModifiedDietz,
        CalculatorKind::TrueTwr,
        CalculatorKind::LinkedDietzTwr,
    ] {
        assert_eq!(
            calculate_return(kind, &base).unwrap(),
            calculate_return(kind, &with_zero).unwrap()
        );
    }
}
