//! Human-readable renderings of training, prediction and backtest results.
//!
//! Console summaries use aligned `Label:   value` lines; the Markdown report is
//! saved alongside exported artifacts.

use signalbot_core::domain::{Prediction, Signal};
use signalbot_core::model::TrainingReport;

use crate::backtest::BacktestResult;
use crate::monitor::SessionSummary;

/// Console summary of a backtest run.
pub fn backtest_summary(result: &BacktestResult) -> String {
    let t = result.trade_summary();
    let mut out = String::with_capacity(1024);

    out.push_str("=== Backtest Result ===\n");
    out.push_str(&format!("Symbol:         {}\n", result.symbol));
    if let (Some(start), Some(end)) = (result.start(), result.end()) {
        out.push_str(&format!("Period:         {} to {}\n", start.date(), end.date()));
    }
    out.push_str(&format!(
        "Bars:           {} ({} dropped for warm-up)\n",
        result.clean_bars,
        result.dropped_bars()
    ));
    out.push('\n');
    out.push_str("--- Performance ---\n");
    out.push_str(&format!("Initial Capital: ${:.2}\n", result.initial_capital));
    out.push_str(&format!("Final Value:    ${:.2}\n", result.final_value));
    out.push_str(&format!("Total Return:   {:+.2}%\n", result.total_return * 100.0));
    out.push_str(&format!("Sharpe:         {:.2}\n", result.sharpe_ratio));
    out.push_str(&format!("Max Drawdown:   {:.2}%\n", result.max_drawdown * 100.0));
    out.push('\n');
    out.push_str("--- Trades ---\n");
    out.push_str(&format!("Buys:           {}\n", t.buys));
    out.push_str(&format!("Sells:          {}\n", t.sells));
    if t.sells > 0 {
        out.push_str(&format!("Total PnL:      ${:+.2}\n", t.total_pnl));
        out.push_str(&format!("Average PnL:    ${:+.2}\n", t.avg_pnl));
        out.push_str(&format!("Win Rate:       {:.2}%\n", t.win_rate * 100.0));
    }
    if result.final_position.is_long() {
        out.push_str("Open Position:  LONG (marked to market)\n");
    }
    out
}

/// Console summary of a training run, including the per-class report.
pub fn training_summary(report: &TrainingReport) -> String {
    let mut out = String::with_capacity(1024);
    out.push_str("=== Model Training ===\n");
    out.push_str(&format!("Symbol:         {}\n", report.symbol));
    out.push_str(&format!("Features:       {}\n", report.columns.len()));
    out.push_str(&format!(
        "Samples:        {} train / {} test\n",
        report.train_samples, report.test_samples
    ));
    out.push_str(&format!("Train Accuracy: {:.2}%\n", report.train_accuracy * 100.0));
    out.push_str(&format!("Test Accuracy:  {:.2}%\n", report.test_accuracy * 100.0));
    out.push('\n');
    out.push_str(&format!(
        "{:>8} {:>10} {:>10} {:>10} {:>10}\n",
        "class", "precision", "recall", "f1", "support"
    ));
    for (name, m) in ["down", "up"].iter().zip(&report.classes) {
        out.push_str(&format!(
            "{:>8} {:>10.2} {:>10.2} {:>10.2} {:>10}\n",
            name, m.precision, m.recall, m.f1, m.support
        ));
    }
    if !report.feature_importances.is_empty() {
        out.push('\n');
        out.push_str("Top features:\n");
        for (column, importance) in report.feature_importances.iter().take(5) {
            out.push_str(&format!("  {column:<16}{importance:.3}\n"));
        }
    }
    out
}

/// Console rendering of a single prediction with its recommendation.
pub fn prediction_summary(symbol: &str, prediction: &Prediction, last_close: f64) -> String {
    let signal = prediction.signal();
    let recommendation = match signal {
        Signal::Buy => "BUY",
        Signal::Sell => "SELL",
    };
    let mut out = String::new();
    out.push_str(&format!("=== Signal: {symbol} ===\n"));
    out.push_str(&format!("Signal:         {signal}\n"));
    out.push_str(&format!("Confidence:     {:.2}%\n", prediction.confidence * 100.0));
    out.push_str(&format!("Last Close:     ${last_close:.2}\n"));
    out.push_str(&format!("Recommendation: {recommendation}\n"));
    out
}

/// End-of-session summary for the live monitor.
pub fn session_summary(summary: &SessionSummary) -> String {
    let total = summary.entries.len();
    let share = |n: usize| if total == 0 { 0.0 } else { n as f64 / total as f64 * 100.0 };
    let mut out = String::new();
    out.push_str(&format!("=== Session Summary: {} ===\n", summary.symbol));
    out.push_str(&format!(
        "Signals:        {total} ({} polls, {} failed)\n",
        summary.polls, summary.failures
    ));
    out.push_str(&format!("Buy Signals:    {} ({:.1}%)\n", summary.buys(), share(summary.buys())));
    out.push_str(&format!("Sell Signals:   {} ({:.1}%)\n", summary.sells(), share(summary.sells())));
    if let Some(last) = summary.last() {
        out.push_str(&format!("Last Signal:    {}\n", last.signal));
        out.push_str(&format!("Confidence:     {:.2}%\n", last.confidence * 100.0));
        out.push_str(&format!("Price:          ${:.2}\n", last.price));
    }
    out
}

/// Markdown report for a single backtest run.
pub fn markdown_report(result: &BacktestResult) -> String {
    let t = result.trade_summary();
    let mut md = String::with_capacity(2048);

    md.push_str("# Backtest Report\n\n");
    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Symbol | {} |\n", result.symbol));
    if let (Some(start), Some(end)) = (result.start(), result.end()) {
        md.push_str(&format!("| Period | {start} to {end} |\n"));
    }
    md.push_str(&format!("| Initial Capital | ${:.2} |\n", result.initial_capital));
    md.push_str(&format!(
        "| Bars | {} ({} dropped) |\n",
        result.clean_bars,
        result.dropped_bars()
    ));
    md.push_str(&format!(
        "| Confidence Threshold | {} |\n",
        result.settings.confidence_threshold
    ));
    md.push_str(&format!("| Dataset Hash | {} |\n", result.dataset_hash));
    md.push('\n');

    md.push_str("## Performance Summary\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Final Value | ${:.2} |\n", result.final_value));
    md.push_str(&format!("| Total Return | {:.2}% |\n", result.total_return * 100.0));
    md.push_str(&format!("| Sharpe | {:.3} |\n", result.sharpe_ratio));
    md.push_str(&format!("| Max Drawdown | {:.2}% |\n", result.max_drawdown * 100.0));
    md.push_str(&format!("| Buys / Sells | {} / {} |\n", t.buys, t.sells));
    md.push_str(&format!("| Total PnL | ${:.2} |\n", t.total_pnl));
    md.push_str(&format!("| Win Rate | {:.1}% |\n", t.win_rate * 100.0));
    md.push('\n');

    if !result.trades.is_empty() {
        md.push_str("## Trades\n\n");
        md.push_str("| Time | Action | Price | Shares | Confidence | PnL |\n");
        md.push_str("| --- | --- | --- | --- | --- | --- |\n");
        for trade in &result.trades {
            let pnl = trade.pnl.map(|p| format!("{p:.2}")).unwrap_or_default();
            md.push_str(&format!(
                "| {} | {} | {:.2} | {:.4} | {:.2} | {} |\n",
                trade.timestamp, trade.action, trade.price, trade.shares, trade.confidence, pnl
            ));
        }
        md.push('\n');
    }

    md
}
