//! Signalbot core: domain types, quote sources, indicators and the signal model.
//!
//! This crate contains everything that runs before a backtest or monitor session:
//! - Domain types (bars, series, quotes, positions, trades, predictions)
//! - Quote sources (Alpha Vantage, synthetic) behind the `QuoteSource` trait
//! - Indicator engine and the shared feature schema
//! - Random-forest next-bar classifier with its scaler and on-disk store

pub mod data;
pub mod domain;
pub mod features;
pub mod indicators;
pub mod model;
pub mod schema;
