//! Backtest engine scenarios: state machine, metrics and failure ordering.

mod common;

use common::{frame, Scripted};
use signalbot_core::domain::{Position, TradeAction};
use signalbot_runner::{BacktestError, BacktestSettings, Backtester};

fn closes(n: usize) -> Vec<f64> {
    (0..n).map(|i| 100.0 + i as f64).collect()
}

fn run(closes: &[f64], pairs: &[(bool, f64)]) -> signalbot_runner::BacktestResult {
    Backtester::default()
        .run(&frame(closes, 0), &Scripted::from_pairs(pairs))
        .unwrap()
}

#[test]
fn all_flat_run_keeps_capital() {
    let c = closes(60);
    let result = run(&c, &vec![(false, 0.9); 60]);
    assert!(result.trades.is_empty());
    assert_eq!(result.portfolio_curve, vec![10_000.0; 60]);
    assert_eq!(result.total_return, 0.0);
    assert_eq!(result.max_drawdown, 0.0);
    assert_eq!(result.sharpe_ratio, 0.0);
    assert_eq!(result.final_value, 10_000.0);
}

#[test]
fn sixty_bar_round_trip() {
    let c = closes(60);
    let mut pairs = vec![(true, 0.9); 30];
    pairs.extend(vec![(false, 0.9); 30]);
    let result = run(&c, &pairs);

    assert_eq!(result.trades.len(), 2);
    let (buy, sell) = (&result.trades[0], &result.trades[1]);
    assert_eq!(buy.action, TradeAction::Buy);
    assert_eq!(buy.bar_index, 0);
    assert_eq!(buy.price, c[0]);
    assert_eq!(sell.action, TradeAction::Sell);
    assert_eq!(sell.bar_index, 30);
    assert_eq!(sell.price, c[30]);

    let shares = 10_000.0 / c[0];
    assert!((buy.shares - shares).abs() < 1e-12);
    assert!((result.final_value - shares * c[30]).abs() < 1e-9);
    assert!((sell.pnl.unwrap() - (c[30] - c[0]) * shares).abs() < 1e-9);
    assert!((result.total_return - (c[30] - c[0]) / c[0]).abs() < 1e-12);
    assert_eq!(result.final_position, Position::Flat);
}

#[test]
fn one_buy_one_sell_return_is_price_ratio() {
    let c = vec![50.0; 55]
        .into_iter()
        .enumerate()
        .map(|(i, p)| if i >= 10 { 65.0 } else { p })
        .collect::<Vec<_>>();
    let mut pairs = vec![(false, 0.5); 55];
    pairs[3] = (true, 0.8);
    pairs[20] = (false, 0.8);
    let result = run(&c, &pairs);
    assert_eq!(result.trades.len(), 2);
    assert!((result.total_return - (65.0 - 50.0) / 50.0).abs() < 1e-12);
    assert_eq!(result.trade_summary().win_rate, 1.0);
}

#[test]
fn ending_long_is_marked_to_market() {
    let c = closes(50);
    // Flat until bar 10, then down calls at the threshold that must not sell.
    let mut pairs = vec![(false, 0.9); 10];
    pairs.push((true, 0.95));
    pairs.extend(vec![(false, 0.6); 39]);
    let result = run(&c, &pairs);

    assert_eq!(result.trades.len(), 1);
    let summary = result.trade_summary();
    assert_eq!(summary.buys, summary.sells + 1);
    let shares = 10_000.0 / c[10];
    assert!((result.final_value - shares * c[49]).abs() < 1e-9);
    assert!(matches!(result.final_position, Position::Long { .. }));
    assert!(result.trades.iter().all(|t| t.action == TradeAction::Buy));
}

#[test]
fn threshold_confidence_never_transitions() {
    let c = closes(50);
    let result = run(&c, &vec![(true, 0.6); 50]);
    assert!(result.trades.is_empty());

    let mut pairs = vec![(true, 0.6000001); 50];
    pairs[1] = (false, 0.6);
    let result = run(&c, &pairs);
    assert_eq!(result.trades.len(), 1);
}

#[test]
fn agreeing_predictions_are_no_ops() {
    let c = closes(50);
    let result = run(&c, &vec![(true, 0.99); 50]);
    assert_eq!(result.trades.len(), 1);
    assert_eq!(result.portfolio_curve.len(), 50);
}

#[test]
fn curve_and_returns_line_up() {
    let c = closes(60);
    let mut pairs = vec![(true, 0.9); 20];
    pairs.extend(vec![(false, 0.9); 40]);
    let result = run(&c, &pairs);
    assert_eq!(result.portfolio_curve.len(), 60);
    assert_eq!(result.timestamps.len(), 60);
    assert_eq!(result.returns.len(), 59);
    assert!(result.max_drawdown <= 0.0);
}

#[test]
fn warmup_bars_are_skipped() {
    let c = closes(80);
    let result = Backtester::default()
        .run(&frame(&c, 30), &Scripted::from_pairs(&vec![(true, 0.9); 50]))
        .unwrap();
    assert_eq!(result.input_bars, 80);
    assert_eq!(result.clean_bars, 50);
    assert_eq!(result.dropped_bars(), 30);
    assert_eq!(result.trades[0].bar_index, 30);
    assert_eq!(result.trades[0].price, c[30]);
}

// ── Failure ordering ──

#[test]
fn too_few_bars_fails_first() {
    let mut model = Scripted::from_pairs(&[(true, 0.9); 49]);
    model.trained = false;
    let err = Backtester::default().run(&frame(&closes(49), 0), &model).unwrap_err();
    assert!(matches!(
        err,
        BacktestError::InsufficientData { found: 49, required: 50, .. }
    ));
}

#[test]
fn too_few_clean_bars_fails_before_training_check() {
    let mut model = Scripted::from_pairs(&[(true, 0.9); 60]);
    model.trained = false;
    let err = Backtester::default().run(&frame(&closes(60), 31), &model).unwrap_err();
    assert!(matches!(
        err,
        BacktestError::InsufficientData { found: 29, required: 30, .. }
    ));
}

#[test]
fn untrained_model_is_rejected() {
    let mut model = Scripted::from_pairs(&[(true, 0.9); 60]);
    model.trained = false;
    let err = Backtester::default().run(&frame(&closes(60), 0), &model).unwrap_err();
    assert_eq!(err, BacktestError::NotTrained);
}

#[test]
fn short_prediction_batch_is_a_model_error() {
    let model = Scripted::from_pairs(&[(true, 0.9); 10]);
    let err = Backtester::default().run(&frame(&closes(60), 0), &model).unwrap_err();
    assert!(matches!(err, BacktestError::Model(_)));
}

#[test]
fn custom_settings_change_threshold_and_capital() {
    let settings = BacktestSettings {
        initial_capital: 1_000.0,
        confidence_threshold: 0.5,
        ..Default::default()
    };
    let c = closes(50);
    let result = Backtester::new(settings)
        .unwrap()
        .run(&frame(&c, 0), &Scripted::from_pairs(&vec![(true, 0.55); 50]))
        .unwrap();
    assert_eq!(result.trades.len(), 1);
    assert!((result.trades[0].shares - 1_000.0 / c[0]).abs() < 1e-12);
}
