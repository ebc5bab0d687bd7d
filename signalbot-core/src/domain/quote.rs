use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Latest single-point quote for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    /// Percent, e.g. `1.25` for +1.25%.
    pub change_percent: f64,
    pub timestamp: NaiveDateTime,
}
