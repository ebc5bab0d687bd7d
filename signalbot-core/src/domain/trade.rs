//! Trade: one entry in the append-only ledger produced by a backtest.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "BUY"),
            TradeAction::Sell => write!(f, "SELL"),
        }
    }
}

/// An immutable BUY or SELL record.
///
/// `pnl` is only present on SELL: `(exit_price - entry_price) * shares`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub timestamp: NaiveDateTime,
    pub bar_index: usize,
    pub action: TradeAction,
    pub price: f64,
    pub shares: f64,
    pub confidence: f64,
    pub pnl: Option<f64>,
}

impl Trade {
    pub fn is_buy(&self) -> bool {
        self.action == TradeAction::Buy
    }

    pub fn is_sell(&self) -> bool {
        self.action == TradeAction::Sell
    }

    /// A SELL that realized a strictly positive pnl.
    pub fn is_winner(&self) -> bool {
        self.pnl.is_some_and(|p| p > 0.0)
    }

    /// Notional value of the trade at its execution price.
    pub fn notional(&self) -> f64 {
        self.price * self.shares
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn trade(action: TradeAction, pnl: Option<f64>) -> Trade {
        Trade {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            bar_index: 0,
            action,
            price: 100.0,
            shares: 5.0,
            confidence: 0.9,
            pnl,
        }
    }

    #[test]
    fn winner_requires_positive_pnl() {
        assert!(trade(TradeAction::Sell, Some(1.0)).is_winner());
        assert!(!trade(TradeAction::Sell, Some(0.0)).is_winner());
        assert!(!trade(TradeAction::Buy, None).is_winner());
    }

    #[test]
    fn action_displays_upper_case() {
        assert_eq!(TradeAction::Buy.to_string(), "BUY");
        assert_eq!(TradeAction::Sell.to_string(), "SELL");
    }

    #[test]
    fn trade_serialization_roundtrip() {
        let t = trade(TradeAction::Sell, Some(12.5));
        let json = serde_json::to_string(&t).unwrap();
        assert!(json.contains("\"SELL\""));
        let back: Trade = serde_json::from_str(&json).unwrap();
        assert_eq!(t, back);
    }
}
