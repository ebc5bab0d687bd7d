//! Performance metrics: pure functions that compute run statistics.
//!
//! Every metric is a pure function: portfolio curve and/or trade ledger in,
//! scalar out. No dependencies on the engine, data sources or the model.

use serde::{Deserialize, Serialize};
use signalbot_core::domain::Trade;

/// Ledger statistics reported alongside the curve metrics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TradeSummary {
    pub buys: usize,
    pub sells: usize,
    /// Sum of realised pnl over SELL trades.
    pub total_pnl: f64,
    /// Mean realised pnl per SELL, 0 without sells.
    pub avg_pnl: f64,
    /// Fraction of SELL trades with pnl > 0, 0 without sells.
    pub win_rate: f64,
}

impl TradeSummary {
    pub fn compute(trades: &[Trade]) -> Self {
        let buys = trades.iter().filter(|t| t.is_buy()).count();
        let sells = trades.iter().filter(|t| t.is_sell()).count();
        let total_pnl = realised_pnl(trades);
        Self {
            buys,
            sells,
            total_pnl,
            avg_pnl: if sells == 0 { 0.0 } else { total_pnl / sells as f64 },
            win_rate: win_rate(trades),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction of the starting capital.
///
/// The final value is the last curve point, or `initial_capital` for an empty curve.
pub fn total_return(curve: &[f64], initial_capital: f64) -> f64 {
    if initial_capital <= 0.0 {
        return 0.0;
    }
    let final_value = curve.last().copied().unwrap_or(initial_capital);
    (final_value - initial_capital) / initial_capital
}

/// Standard deviations below this are treated as zero.
pub const SHARPE_MIN_STD: f64 = 1e-15;

/// Annualised Sharpe ratio of step returns, zero risk-free rate.
///
/// Sharpe = mean(returns) / std(returns) * sqrt(periods_per_year).
/// Returns 0.0 if fewer than 2 returns or the deviation is below
/// [`SHARPE_MIN_STD`]. Returns that are equal up to rounding noise count as
/// constant, so they read 0 rather than a huge ratio driven by that noise.
pub fn sharpe_ratio(returns: &[f64], periods_per_year: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let std = std_dev(returns);
    if std < SHARPE_MIN_STD {
        return 0.0;
    }
    (mean_f64(returns) / std) * periods_per_year.sqrt()
}

/// Maximum drawdown as a non-positive fraction (e.g. -0.15 = 15% drawdown).
///
/// Returns 0.0 if the curve is empty, constant or non-decreasing.
pub fn max_drawdown(curve: &[f64]) -> f64 {
    let Some(&first) = curve.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;

    for &value in curve {
        if value > peak {
            peak = value;
        }
        if peak > 0.0 {
            let dd = (value - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Win rate over SELL trades: fraction with strictly positive pnl.
pub fn win_rate(trades: &[Trade]) -> f64 {
    let sells: Vec<&Trade> = trades.iter().filter(|t| t.is_sell()).collect();
    if sells.is_empty() {
        return 0.0;
    }
    let winners = sells.iter().filter(|t| t.is_winner()).count();
    winners as f64 / sells.len() as f64
}

pub fn realised_pnl(trades: &[Trade]) -> f64 {
    trades.iter().filter_map(|t| t.pnl).sum()
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Pairwise percentage change of the curve; the first step has no predecessor.
pub fn step_returns(curve: &[f64]) -> Vec<f64> {
    curve
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1).
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use signalbot_core::domain::TradeAction;

    fn trade(action: TradeAction, pnl: Option<f64>) -> Trade {
        Trade {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            bar_index: 0,
            action,
            price: 100.0,
            shares: 10.0,
            confidence: 0.8,
            pnl,
        }
    }

    // ── Total return ──

    #[test]
    fn total_return_uses_initial_capital() {
        assert!((total_return(&[10_000.0, 11_000.0], 10_000.0) - 0.1).abs() < 1e-12);
        assert!((total_return(&[9_000.0], 10_000.0) + 0.1).abs() < 1e-12);
    }

    #[test]
    fn total_return_empty_curve() {
        assert_eq!(total_return(&[], 10_000.0), 0.0);
    }

    // ── Sharpe ──

    #[test]
    fn sharpe_constant_returns_is_zero() {
        assert_eq!(sharpe_ratio(&[0.01, 0.01, 0.01], 252.0), 0.0);
    }

    #[test]
    fn sharpe_near_constant_returns_is_zero() {
        let r = [0.01, 0.01 + 1e-17, 0.01, 0.01 - 1e-17];
        assert!(std_dev(&r) < SHARPE_MIN_STD);
        assert_eq!(sharpe_ratio(&r, 252.0), 0.0);
        let r = [0.01, 0.0100001, 0.01];
        assert!(sharpe_ratio(&r, 252.0) > 0.0);
    }

    #[test]
    fn sharpe_needs_two_returns() {
        assert_eq!(sharpe_ratio(&[0.05], 252.0), 0.0);
        assert_eq!(sharpe_ratio(&[], 252.0), 0.0);
    }

    #[test]
    fn sharpe_known_value() {
        // mean 0.01, sample std 0.01 → 1 * sqrt(252)
        let r = [0.0, 0.01, 0.02];
        assert!((sharpe_ratio(&r, 252.0) - 252.0_f64.sqrt()).abs() < 1e-9);
    }

    // ── Max drawdown ──

    #[test]
    fn drawdown_of_monotonic_curve_is_zero() {
        assert_eq!(max_drawdown(&[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(max_drawdown(&[]), 0.0);
    }

    #[test]
    fn drawdown_known_value() {
        let dd = max_drawdown(&[100.0, 120.0, 90.0, 130.0, 110.0]);
        assert!((dd - (-0.25)).abs() < 1e-12);
    }

    // ── Ledger ──

    #[test]
    fn win_rate_counts_only_sells() {
        let trades = vec![
            trade(TradeAction::Buy, None),
            trade(TradeAction::Sell, Some(50.0)),
            trade(TradeAction::Buy, None),
            trade(TradeAction::Sell, Some(-20.0)),
            trade(TradeAction::Buy, None),
        ];
        assert!((win_rate(&trades) - 0.5).abs() < 1e-12);

        let summary = TradeSummary::compute(&trades);
        assert_eq!(summary.buys, 3);
        assert_eq!(summary.sells, 2);
        assert!((summary.total_pnl - 30.0).abs() < 1e-12);
        assert!((summary.avg_pnl - 15.0).abs() < 1e-12);
    }

    #[test]
    fn empty_ledger_summary_is_zero() {
        assert_eq!(TradeSummary::compute(&[]), TradeSummary::default());
    }

    #[test]
    fn step_returns_drop_first_point() {
        let r = step_returns(&[100.0, 110.0, 99.0]);
        assert_eq!(r.len(), 2);
        assert!((r[0] - 0.1).abs() < 1e-12);
        assert!((r[1] + 0.1).abs() < 1e-12);
    }
}
