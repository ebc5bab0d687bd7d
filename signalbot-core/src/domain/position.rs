use serde::{Deserialize, Serialize};

/// Single-position state: either all cash or fully invested long.
///
/// Never short, never partial, at most one open position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Position {
    #[default]
    Flat,
    Long { entry_price: f64, shares: f64 },
}

impl Position {
    pub fn is_long(&self) -> bool {
        matches!(self, Position::Long { .. })
    }

    pub fn is_flat(&self) -> bool {
        matches!(self, Position::Flat)
    }

    /// Mark-to-market value of the position, or `cash` when flat.
    pub fn market_value(&self, cash: f64, current_price: f64) -> f64 {
        match *self {
            Position::Flat => cash,
            Position::Long { shares, .. } => shares * current_price,
        }
    }

    pub fn unrealized_pnl(&self, current_price: f64) -> f64 {
        match *self {
            Position::Flat => 0.0,
            Position::Long {
                entry_price,
                shares,
            } => (current_price - entry_price) * shares,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_values_at_cash() {
        let p = Position::Flat;
        assert_eq!(p.market_value(10_000.0, 123.0), 10_000.0);
        assert_eq!(p.unrealized_pnl(123.0), 0.0);
    }

    #[test]
    fn long_marks_to_market() {
        let p = Position::Long {
            entry_price: 100.0,
            shares: 10.0,
        };
        assert!(p.is_long());
        assert_eq!(p.market_value(0.0, 110.0), 1_100.0);
        assert_eq!(p.unrealized_pnl(110.0), 100.0);
    }
}
