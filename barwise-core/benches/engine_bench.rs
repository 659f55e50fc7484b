//! Criterion benchmarks for barwise hot paths.
//!
//! Benchmarks:
//! 1. Bar loop (full simulation, both execution timings)
//! 2. Criteria group evaluation on a long table
//! 3. Indicator compute (SMA, Shift)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use barwise_core::criteria::{Above, BarsSinceAction, Below, CrossingAbove, StopLoss};
use barwise_core::domain::Action;
use barwise_core::engine::{ExecutionTiming, Strategy};
use barwise_core::group::CriteriaGroup;
use barwise_core::indicators::{Indicator, Shift, Sma};
use barwise_core::profile::{TradingAmount, TradingFee, TradingProfile};
use barwise_core::table::{BarTable, ColumnKey};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_table(n: usize, symbols: &[&str]) -> BarTable {
    let base = chrono::NaiveDate::from_ymd_opt(2020, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let keys: Vec<(ColumnKey, ColumnKey)> = symbols
        .iter()
        .map(|s| (ColumnKey::open(s), ColumnKey::close(s)))
        .collect();
    let mut table = BarTable::new();
    for i in 0..n {
        let mut cells = Vec::with_capacity(keys.len() * 2);
        for (j, (open, close)) in keys.iter().enumerate() {
            let c = 100.0 + ((i + j * 7) as f64 * 0.1).sin() * 10.0;
            cells.push((open, c - 0.3));
            cells.push((close, c));
        }
        table
            .append_row(base + chrono::Duration::days(i as i64), cells)
            .unwrap();
    }
    for symbol in symbols {
        Sma::new(ColumnKey::close(symbol), 20)
            .compute(&mut table)
            .unwrap();
    }
    table
}

fn groups(symbol: &str) -> Vec<CriteriaGroup> {
    let close = ColumnKey::close(symbol);
    let sma = ColumnKey::custom(format!("SMA_{close}_20"));
    vec![
        CriteriaGroup::new(
            vec![Box::new(CrossingAbove::new(close.clone(), sma.clone()))],
            Action::Long,
            symbol,
        )
        .unwrap(),
        CriteriaGroup::new(
            vec![Box::new(BarsSinceAction::long(symbol, 10))],
            Action::LongExit,
            symbol,
        )
        .unwrap(),
        CriteriaGroup::new(
            vec![Box::new(StopLoss::new(symbol, 2.0))],
            Action::LongExit,
            symbol,
        )
        .unwrap(),
        CriteriaGroup::new(
            vec![Box::new(Below::new(close, sma))],
            Action::Short,
            symbol,
        )
        .unwrap(),
        CriteriaGroup::new(
            vec![Box::new(BarsSinceAction::short(symbol, 5))],
            Action::ShortExit,
            symbol,
        )
        .unwrap(),
    ]
}

fn profile() -> TradingProfile {
    TradingProfile::new(
        100_000.0,
        TradingAmount::capital_percentage(10.0),
        TradingFee::static_fee(1.0),
    )
}

// ── 1. Bar Loop ──────────────────────────────────────────────────────

fn bench_bar_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("bar_loop");

    for &bar_count in &[252, 1260, 2520] {
        let table = make_table(bar_count, &["BENCH"]);
        for timing in [ExecutionTiming::NextBarOpen, ExecutionTiming::CloseOnSignal] {
            let mut strategy = Strategy::new(groups("BENCH"), profile()).with_timing(timing);
            group.bench_with_input(
                BenchmarkId::new(format!("{timing:?}"), bar_count),
                &bar_count,
                |b, _| b.iter(|| strategy.simulate(black_box(&table))),
            );
        }
    }

    // Multi-symbol benchmark (the realistic case)
    let symbols = ["S0", "S1", "S2", "S3", "S4", "S5", "S6", "S7", "S8", "S9"];
    let table = make_table(1260, &symbols);
    let all_groups = symbols.iter().flat_map(|s| groups(s)).collect();
    let mut strategy = Strategy::new(all_groups, profile());
    group.bench_function("10_symbols_1260_bars", |b| {
        b.iter(|| strategy.simulate(black_box(&table)))
    });

    group.finish();
}

// ── 2. Group Evaluation ──────────────────────────────────────────────

fn bench_group_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("group_evaluation");
    let table = make_table(2520, &["BENCH"]);
    let entry = CriteriaGroup::new(
        vec![
            Box::new(Above::new(ColumnKey::close("BENCH"), 95.0).lookback(5)),
            Box::new(CrossingAbove::new(
                ColumnKey::close("BENCH"),
                ColumnKey::custom("SMA_BENCH_Close_20"),
            )),
        ],
        Action::Long,
        "BENCH",
    )
    .unwrap();
    group.bench_function("entry_group_2520_rows", |b| {
        b.iter(|| entry.evaluate(black_box(&table)))
    });
    group.finish();
}

// ── 3. Indicators ────────────────────────────────────────────────────

fn bench_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicators");

    for &bar_count in &[252, 1260, 2520] {
        let table = make_table(bar_count, &["BENCH"]);
        let stack: Vec<Box<dyn Indicator>> = vec![
            Box::new(Sma::new("BENCH_Close", 20)),
            Box::new(Sma::new("BENCH_Close", 50)),
            Box::new(Sma::new("BENCH_Close", 200)),
            Box::new(Shift::new("BENCH_Close", 1)),
        ];
        group.bench_with_input(
            BenchmarkId::new("stack_4", bar_count),
            &bar_count,
            |b, _| {
                b.iter(|| {
                    let mut table = table.clone();
                    for indicator in &stack {
                        indicator.compute(black_box(&mut table)).unwrap();
                    }
                    table
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_bar_loop,
    bench_group_evaluation,
    bench_indicators,
);
criterion_main!(benches);
