//! Property tests for engine invariants.
//!
//! Uses proptest to verify:
//! 1. Crossing exclusivity: CrossingAbove and CrossingBelow never both fire
//! 2. Conflict resolution: LONG with SHORT always resolves to NO_ACTION
//! 3. Status consistency: STATUS is the running sum of action deltas
//! 4. Cash accounting: whenever flat, available cash equals capital
//! 5. No look-ahead: truncating the input never changes earlier rows

use chrono::{NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use barwise_core::criteria::{Above, BarsSinceAction, Below, CrossingAbove, CrossingBelow, Criterion};
use barwise_core::domain::Action;
use barwise_core::engine::{resolve_action, status_delta, ExecutionTiming, Strategy as Engine};
use barwise_core::group::CriteriaGroup;
use barwise_core::indicators::{Indicator, Sma};
use barwise_core::profile::{TradingAmount, TradingFee, TradingProfile};
use barwise_core::table::{BarTable, ColumnKey, Metric};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_price() -> impl Strategy<Value = f64> {
    (10.0..500.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

fn arb_prices(max: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(arb_price(), 2..max)
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop::sample::select(Action::ALL.to_vec())
}

fn arb_timing() -> impl Strategy<Value = ExecutionTiming> {
    prop_oneof![
        Just(ExecutionTiming::NextBarOpen),
        Just(ExecutionTiming::CloseOnSignal)
    ]
}

// ── Helpers ──────────────────────────────────────────────────────────

fn ts(i: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2020, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + chrono::Duration::days(i as i64)
}

/// Open is the previous close; the first open equals the first close.
fn price_table(closes: &[f64]) -> BarTable {
    let open = ColumnKey::open("TEST");
    let close = ColumnKey::close("TEST");
    let mut table = BarTable::new();
    for (i, &c) in closes.iter().enumerate() {
        let o = if i == 0 { c } else { closes[i - 1] };
        table.append_row(ts(i), [(&open, o), (&close, c)]).unwrap();
    }
    table
}

/// Long when close is above its 3-bar SMA, exit after `hold` bars; a
/// mirrored short side.
fn engine(hold: usize, fee: f64, slippage: f64, timing: ExecutionTiming) -> Engine {
    let close = ColumnKey::close("TEST");
    let sma: ColumnKey = "SMA_TEST_Close_3".into();
    let groups = vec![
        CriteriaGroup::new(
            vec![Box::new(Above::new(close.clone(), sma.clone()))],
            Action::Long,
            "TEST",
        )
        .unwrap(),
        CriteriaGroup::new(
            vec![Box::new(BarsSinceAction::long("TEST", hold))],
            Action::LongExit,
            "TEST",
        )
        .unwrap(),
        CriteriaGroup::new(vec![Box::new(Below::new(close, sma))], Action::Short, "TEST").unwrap(),
        CriteriaGroup::new(
            vec![Box::new(BarsSinceAction::short("TEST", hold))],
            Action::ShortExit,
            "TEST",
        )
        .unwrap(),
    ];
    let profile = TradingProfile::new(
        100_000.0,
        TradingAmount::capital_percentage(20.0),
        TradingFee::static_fee(fee),
    )
    .with_slippage(slippage);
    Engine::new(groups, profile).with_timing(timing)
}

fn with_sma(closes: &[f64]) -> BarTable {
    let mut table = price_table(closes);
    Sma::new("TEST_Close", 3).compute(&mut table).unwrap();
    table
}

// ── 1. Crossing exclusivity ──────────────────────────────────────────

proptest! {
    /// CrossingAbove and CrossingBelow are mutually exclusive on any bar.
    #[test]
    fn crossings_are_exclusive(a in arb_prices(20), b in arb_prices(20)) {
        let n = a.len().min(b.len());
        let ka = ColumnKey::close("A");
        let kb = ColumnKey::close("B");
        let mut table = BarTable::new();
        for i in 0..n {
            table.append_row(ts(i), [(&ka, a[i]), (&kb, b[i])]).unwrap();
        }
        let above = CrossingAbove::new(ka.clone(), kb.clone());
        let below = CrossingBelow::new(ka, kb);
        for rows in 1..=n {
            let prefix = table.head(rows);
            prop_assert!(!(above.evaluate(&prefix) && below.evaluate(&prefix)));
        }
    }
}

// ── 2. Conflict resolution ───────────────────────────────────────────

proptest! {
    /// LONG together with SHORT cancels, whatever else fired.
    #[test]
    fn long_with_short_is_no_action(mut others in prop::collection::vec(arb_action(), 0..6)) {
        others.push(Action::Long);
        others.push(Action::Short);
        prop_assert_eq!(resolve_action(&others), Action::NoAction);
    }

    /// A single result resolves to itself.
    #[test]
    fn single_result_passes_through(action in arb_action()) {
        prop_assert_eq!(resolve_action(&[action]), action);
    }
}

// ── 3–5. Engine invariants ───────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// STATUS equals the cumulative sum of per-bar action deltas.
    #[test]
    fn status_is_running_sum_of_actions(
        closes in arb_prices(40),
        hold in 1usize..4,
        timing in arb_timing(),
    ) {
        let mut engine = engine(hold, 0.0, 0.0, timing);
        engine.simulate(&with_sma(&closes)).unwrap();
        let table = engine.table();
        let actions = table.column(&ColumnKey::metric(Metric::Actions, "TEST")).unwrap();
        let status = table.column(&ColumnKey::metric(Metric::Status, "TEST")).unwrap();
        let mut running = 0.0;
        for (cell, s) in actions.iter().zip(status) {
            running += status_delta(Action::from_cell(*cell).unwrap());
            prop_assert_eq!(running, *s);
            prop_assert!((-1.0..=1.0).contains(s));
        }
    }

    /// Whenever no trade is open, available cash equals running capital.
    #[test]
    fn flat_cash_equals_capital(
        closes in arb_prices(40),
        hold in 1usize..4,
        fee in 0.0..10.0_f64,
        slippage in 0.0..1.0_f64,
        timing in arb_timing(),
    ) {
        let mut engine = engine(hold, fee, slippage, timing);
        let source = with_sma(&closes);
        for (row, &timestamp) in source.index().iter().enumerate() {
            engine.process_bar(timestamp, source.row(row)).unwrap();
            let ledger = engine.ledger();
            if ledger.open_trade("TEST").is_none() {
                prop_assert!((ledger.available_money() - ledger.capital()).abs() < 1e-6);
            }
        }
        let report = engine.report();
        prop_assert!((report.net_profit - (engine.ledger().capital() - 100_000.0)).abs() < 1e-6);
    }

    /// Derived columns for rows 0..k do not change when later bars exist.
    #[test]
    fn no_lookahead_in_derived_columns(
        closes in prop::collection::vec(arb_price(), 6..30),
        cut in 3usize..6,
        timing in arb_timing(),
    ) {
        let mut full = engine(2, 1.0, 0.0, timing);
        full.simulate(&with_sma(&closes)).unwrap();
        let mut truncated = engine(2, 1.0, 0.0, timing);
        truncated.simulate(&with_sma(&closes[..cut])).unwrap();

        for metric in [Metric::Actions, Metric::Status, Metric::Pl] {
            let key = ColumnKey::metric(metric, "TEST");
            let a = &full.table().column(&key).unwrap()[..cut];
            let b = truncated.table().column(&key).unwrap();
            for (x, y) in a.iter().zip(b) {
                prop_assert!((x.is_nan() && y.is_nan()) || x == y);
            }
        }
    }
}
