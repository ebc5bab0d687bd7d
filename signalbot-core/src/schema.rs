//! Feature schema: the single definition of indicator columns shared by
//! training, backtesting and live prediction.
//!
//! `indicator_set()` lists every column the indicator engine produces.
//! `FEATURE_COLUMNS` is the ordered subset the signal model consumes. Column
//! order here is the column order of every feature matrix.

use crate::indicators::{
    Adx, Bollinger, Cci, Ema, Indicator, Macd, Returns, Rsi, Sma, Stochastic, Volatility,
    VolumeRatio, VolumeSma, WilliamsR,
};

/// Model input columns, in matrix order.
pub const FEATURE_COLUMNS: &[&str] = &[
    "rsi",
    "sma_20",
    "sma_50",
    "ema_12",
    "ema_26",
    "macd",
    "macd_signal",
    "macd_hist",
    "stoch_k",
    "stoch_d",
    "williams_r",
    "cci",
    "adx",
    "returns_1d",
    "returns_5d",
    "volatility_10d",
    "volume_ratio",
];

/// Minimum number of schema columns that must be present to build a feature matrix.
pub const MIN_FEATURE_COLUMNS: usize = 5;

/// Every indicator column the engine computes, keyed by column name.
pub fn indicator_set() -> Vec<(&'static str, Box<dyn Indicator>)> {
    vec![
        ("rsi", Box::new(Rsi::new(14))),
        ("sma_20", Box::new(Sma::new(20))),
        ("sma_50", Box::new(Sma::new(50))),
        ("ema_12", Box::new(Ema::new(12))),
        ("ema_26", Box::new(Ema::new(26))),
        ("macd", Box::new(Macd::line(12, 26, 9))),
        ("macd_signal", Box::new(Macd::signal(12, 26, 9))),
        ("macd_hist", Box::new(Macd::histogram(12, 26, 9))),
        ("bb_upper", Box::new(Bollinger::upper(20, 2.0))),
        ("bb_middle", Box::new(Bollinger::middle(20, 2.0))),
        ("bb_lower", Box::new(Bollinger::lower(20, 2.0))),
        ("stoch_k", Box::new(Stochastic::k(14, 3))),
        ("stoch_d", Box::new(Stochastic::d(14, 3))),
        ("williams_r", Box::new(WilliamsR::new(14))),
        ("cci", Box::new(Cci::new(20, 0.015))),
        ("adx", Box::new(Adx::new(14))),
        ("returns_1d", Box::new(Returns::new(1))),
        ("returns_5d", Box::new(Returns::new(5))),
        ("volatility_10d", Box::new(Volatility::new(10))),
        ("volume_sma", Box::new(VolumeSma::new(20))),
        ("volume_ratio", Box::new(VolumeRatio::new(20))),
    ]
}

/// Number of leading bars with at least one undefined model feature.
pub fn feature_warmup() -> usize {
    indicator_set()
        .iter()
        .filter(|(column, _)| FEATURE_COLUMNS.contains(column))
        .map(|(_, indicator)| indicator.lookback())
        .max()
        .unwrap_or(0)
}

/// Stable fingerprint of an ordered column list.
pub fn schema_hash(columns: &[String]) -> String {
    let mut hasher = blake3::Hasher::new();
    for column in columns {
        hasher.update(column.as_bytes());
        hasher.update(b"\n");
    }
    hasher.finalize().to_hex().to_string()
}

pub fn default_columns() -> Vec<String> {
    FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect()
}
