//! Domain types for signalbot

pub mod bar;
pub mod position;
pub mod prediction;
pub mod quote;
pub mod trade;

pub use bar::{Bar, Series, SeriesError};
pub use position::Position;
pub use prediction::{Direction, Prediction, Signal};
pub use quote::Quote;
pub use trade::{Trade, TradeAction};
