use std::sync::{Arc, Mutex};

use super::*;
use crate::metrics::{MAX_DRAWDOWN, SHARPE, Series, TOTAL_RETURN};
use crate::strategy::{QuoteStrategy, Strategy, TradeStrategy};

fn get_ticks() -> Vec<Tick> {
    vec![
        Tick::from((0, 100.0, 1.0)),
        Tick::from((60_000, 110.0, 1.0)),
        Tick::from((120_000, 105.0, 1.0)),
        Tick::from((180_000, 120.0, 1.0)),
    ]
}

fn get_quotes() -> Vec<QuoteTick> {
    vec![
        QuoteTick::from((0, 101.0, 102.0, 1.0)),
        QuoteTick::from((60_000, 100.5, 101.5, 1.0)),
        QuoteTick::from((120_000, 100.0, 100.5, 1.0)),
    ]
}

/// Buys once on the first tick and sells on the tick at `exit_index`.
struct RoundTrip {
    seen: usize,
    exit_index: usize,
    hooks: Arc<Mutex<Vec<&'static str>>>,
}

impl RoundTrip {
    fn new(exit_index: usize) -> Self {
        Self {
            seen: 0,
            exit_index,
            hooks: Arc::default(),
        }
    }
}

impl Strategy for RoundTrip {
    fn on_start(&mut self, _ledger: &mut Ledger) {
        self.hooks.lock().unwrap().push("start");
    }

    fn on_end(&mut self, _ledger: &mut Ledger) {
        self.hooks.lock().unwrap().push("end");
    }
}

impl TradeStrategy for RoundTrip {
    fn on_tick(&mut self, tick: &Tick, ledger: &mut Ledger) {
        if self.seen == 0 {
            ledger.submit(Order::market(OrderSide::Buy, tick.timestamp(), 1.0, tick.price()));
        } else if self.seen == self.exit_index {
            ledger.submit(Order::market(OrderSide::Sell, tick.timestamp(), 1.0, tick.price()));
        }
        self.seen += 1;
    }
}

/// Rests one buy limit at `price` on the first quote.
struct BidOnce {
    price: f64,
    placed: bool,
}

impl Strategy for BidOnce {}

impl QuoteStrategy for BidOnce {
    fn on_quote(&mut self, quote: &QuoteTick, ledger: &mut Ledger) {
        if !self.placed {
            ledger.submit(Order::limit(OrderSide::Buy, quote.timestamp(), 1.0, self.price));
            self.placed = true;
        }
    }
}

/// Places a limit that the data never reaches.
struct NeverFilled;

impl Strategy for NeverFilled {}

impl TradeStrategy for NeverFilled {
    fn on_tick(&mut self, tick: &Tick, ledger: &mut Ledger) {
        ledger.submit(Order::limit(OrderSide::Buy, tick.timestamp(), 1.0, 1.0));
    }
}

#[test]
fn scenario_trade_round_trip() {
    let mut engine = BacktestEngine::new();
    engine.set_ticks(get_ticks());
    let strategy = RoundTrip::new(3);
    let hooks = strategy.hooks.clone();
    engine.add_strategy("RoundTrip", StrategyKind::trade(strategy), TimeFrame::Minute, 10_000.0).unwrap();

    let mut results = engine.run_all();
    assert_eq!(results.len(), 1);
    let report = results.remove(0).unwrap();

    assert_eq!(report.name, "RoundTrip");
    assert_eq!(report.kind, EventKind::Trade);
    assert_eq!(report.fills, 2);
    assert_eq!(report.position, 0.0);
    assert_eq!(report.cash, 10_020.0);
    assert_eq!(report.final_valuation, 10_020.0);
    // valuation marked after each tick: 10000, 10010, 10005, 10020
    assert_eq!(report.values, vec![10_000.0, 10_010.0, 10_005.0, 10_020.0]);
    assert!((report.metrics[TOTAL_RETURN] - 0.002).abs() < 1e-12);
    assert!(report.metrics[MAX_DRAWDOWN] < 0.0);
    assert_eq!(report.metrics.len(), 6);
    assert_eq!(*hooks.lock().unwrap(), vec!["start", "end"]);
}

#[test]
fn scenario_quote_limit_fill() {
    let mut engine = BacktestEngine::new();
    engine.set_quotes(get_quotes());
    engine.add_strategy(
        "Bid",
        StrategyKind::quote(BidOnce {
            price: 101.0,
            placed: false,
        }),
        TimeFrame::Minute,
        1_000.0,
    ).unwrap();

    let report = engine.run_all().remove(0).unwrap();
    // ask 102 does not fill, ask 101.5 does not fill, ask 100.5 fills at 101
    assert_eq!(report.kind, EventKind::Quote);
    assert_eq!(report.fills, 1);
    assert_eq!(report.position, 1.0);
    assert_eq!(report.cash, 899.0);
    assert_eq!(report.values[..2], [1_000.0, 1_000.0]);
    assert_eq!(report.final_valuation, 899.0 + 100.25);
}

#[test]
fn scenario_missing_data_fails_only_that_strategy() {
    let mut engine = BacktestEngine::new();
    engine.set_ticks(get_ticks());
    engine.add_strategy("Trades", StrategyKind::trade(RoundTrip::new(1)), TimeFrame::Minute, 100.0).unwrap();
    engine.add_strategy(
        "Quotes",
        StrategyKind::quote(BidOnce {
            price: 1.0,
            placed: false,
        }),
        TimeFrame::Minute,
        100.0,
    ).unwrap();

    let results = engine.run_all();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    match &results[1] {
        Err(Error::NoEventData { strategy, kind }) => {
            assert_eq!(strategy, "Quotes");
            assert_eq!(*kind, EventKind::Quote);
        }
        other => panic!("expected NoEventData, got {other:?}"),
    }
}

#[test]
fn scenario_no_data_at_all() {
    let mut engine = BacktestEngine::new();
    engine.add_strategy("Empty", StrategyKind::trade(RoundTrip::new(1)), TimeFrame::Day, 100.0).unwrap();
    assert!(matches!(engine.run_all()[0], Err(Error::NoEventData { .. })));
}

#[test]
fn scenario_unmatched_limits_are_discarded() {
    let mut engine = BacktestEngine::new();
    engine.set_ticks(get_ticks());
    engine.add_strategy("Never", StrategyKind::trade(NeverFilled), TimeFrame::Minute, 500.0).unwrap();

    let report = engine.run_all().remove(0).unwrap();
    assert_eq!(report.fills, 0);
    assert_eq!(report.discarded_orders, 4);
    assert_eq!(report.cash, 500.0);
    assert_eq!(report.final_valuation, 500.0);
}

#[test]
fn scenario_strategies_are_isolated() {
    let mut engine = BacktestEngine::new();
    engine.set_ticks(get_ticks());
    for i in 0..8 {
        engine.add_strategy(
            format!("RoundTrip_{i}"),
            StrategyKind::trade(RoundTrip::new(1 + i % 3)),
            TimeFrame::Minute,
            1_000.0 * (i + 1) as f64,
        ).unwrap();
    }
    assert_eq!(engine.strategies().count(), 8);

    let reports = engine.run_all().into_iter().collect::<Result<Vec<_>>>().unwrap();
    let exits = [110.0, 105.0, 120.0];
    for (i, report) in reports.iter().enumerate() {
        assert_eq!(report.name, format!("RoundTrip_{i}"));
        assert_eq!(report.initial_cash, 1_000.0 * (i + 1) as f64);
        assert_eq!(report.cash - report.initial_cash, exits[i % 3] - 100.0);
        assert_eq!(report.values.len(), 4);
    }
    assert_eq!(engine.strategies().count(), 0);
    assert!(engine.run_all().is_empty());
}

#[test]
fn scenario_custom_metric_first_write_wins() {
    let mut engine = BacktestEngine::new();
    engine.set_ticks(get_ticks());
    let context = engine.add_strategy("Custom", StrategyKind::trade(NeverFilled), TimeFrame::Minute, 1.0).unwrap();
    assert_eq!(context.name(), "Custom");
    assert_eq!(context.kind(), EventKind::Trade);
    assert_eq!(context.time_frame(), TimeFrame::Minute);
    assert_eq!(context.ledger().cash(), 1.0);

    let stats = context.statistics_mut();
    assert!(!stats.register_metric(SHARPE, |_: &Series<'_>| 99.0));
    assert!(stats.register_metric("Events", |s: &Series<'_>| s.values.len() as f64));

    let report = engine.run_all().remove(0).unwrap();
    assert_eq!(report.metrics["Events"], 4.0);
    assert_ne!(report.metrics[SHARPE], 99.0);
}

#[test]
fn scenario_single_event_has_no_metrics() {
    let mut engine = BacktestEngine::new();
    engine.set_ticks(vec![Tick::from((0, 100.0, 1.0))]);
    engine.add_strategy("One", StrategyKind::trade(NeverFilled), TimeFrame::Minute, 1_000.0).unwrap();

    let report = engine.run_all().remove(0).unwrap();
    assert!(report.metrics.is_empty());
    assert_eq!(report.values.len(), 1);
}

#[test]
fn scenario_reports_reach_sink_and_csv() {
    use std::io::Write;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let buffer = Buffer::default();
    let dir = tempfile::tempdir().unwrap();
    let mut engine = BacktestEngine::new()
        .with_sink(OutputSink::new(buffer.clone()))
        .with_csv_dir(dir.path());
    engine.set_ticks(get_ticks());
    engine.add_strategy("A", StrategyKind::trade(RoundTrip::new(3)), TimeFrame::Minute, 10_000.0).unwrap();
    engine.add_strategy("B", StrategyKind::trade(NeverFilled), TimeFrame::Minute, 10_000.0).unwrap();

    assert!(engine.run_all().iter().all(|r| r.is_ok()));

    let output = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
    assert!(output.lines().any(|l| l == "[A] Final valuation: 10020.00 (+0.20%)"));
    assert!(output.lines().any(|l| l == "[B] Final valuation: 10000.00 (+0.00%)"));
    assert_eq!(output.lines().count(), 14);

    for file in ["A_pnl.csv", "A_statistics.csv", "B_pnl.csv", "B_statistics.csv"] {
        assert!(dir.path().join(file).exists(), "{file} missing");
    }
}

#[test]
fn scenario_risk_free_rate_lowers_sharpe() {
    let run = |rate: f64| {
        let mut engine = BacktestEngine::new().with_risk_free_rate(rate);
        engine.set_ticks(get_ticks());
        engine.add_strategy("R", StrategyKind::trade(RoundTrip::new(3)), TimeFrame::Minute, 1_000.0).unwrap();
        engine.run_all().remove(0).unwrap().metrics[SHARPE]
    };
    assert!(run(0.01) < run(0.0));
}

#[test]
fn scenario_failed_export_keeps_report() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let mut engine = BacktestEngine::new().with_csv_dir(file.path());
    engine.set_ticks(get_ticks());
    engine.add_strategy("A", StrategyKind::trade(RoundTrip::new(3)), TimeFrame::Minute, 10_000.0).unwrap();

    let report = engine.run_all().remove(0).unwrap();
    assert_eq!(report.final_valuation, 10_020.0);
}

#[test]
fn scenario_failed_sink_keeps_report() {
    struct Broken;

    impl std::io::Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let mut engine = BacktestEngine::new().with_sink(OutputSink::new(Broken));
    engine.set_ticks(get_ticks());
    engine.add_strategy("A", StrategyKind::trade(RoundTrip::new(3)), TimeFrame::Minute, 10_000.0).unwrap();

    assert_eq!(engine.run_all().remove(0).unwrap().cash, 10_020.0);
}

#[test]
fn scenario_strategy_names_are_unique() {
    let mut engine = BacktestEngine::new();
    engine.add_strategy("A", StrategyKind::trade(NeverFilled), TimeFrame::Minute, 1.0).unwrap();

    let duplicate = engine.add_strategy("A", StrategyKind::trade(NeverFilled), TimeFrame::Minute, 1.0);
    assert!(matches!(duplicate, Err(Error::DuplicateStrategy(name)) if name == "A"));
    assert_eq!(engine.strategies().count(), 1);

    // the name is free again once the registered strategy has run
    engine.set_ticks(get_ticks());
    engine.run_all();
    assert!(engine.add_strategy("A", StrategyKind::trade(NeverFilled), TimeFrame::Minute, 1.0).is_ok());
}

#[test]
fn scenario_strategy_names_are_file_safe() {
    let mut engine = BacktestEngine::new();
    for name in ["", ".", "..", "../escape", "a/b", "a\\b"] {
        let result = engine.add_strategy(name, StrategyKind::trade(NeverFilled), TimeFrame::Minute, 1.0);
        assert!(matches!(result, Err(Error::InvalidStrategyName(_))), "{name:?} accepted");
    }
    assert_eq!(engine.strategies().count(), 0);
}
