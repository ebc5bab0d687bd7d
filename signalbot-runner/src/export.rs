//! Backtest artifacts on disk: JSON manifest, CSV ledger and curve, Markdown report.
//!
//! Manifests carry `schema_version`; loading refuses versions newer than
//! [`SCHEMA_VERSION`].

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use signalbot_core::domain::Trade;

use crate::backtest::{BacktestResult, SCHEMA_VERSION};
use crate::report::markdown_report;

/// Pretty JSON for a result, as written to `manifest.json`.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("could not encode backtest result as JSON")
}

/// Parse a manifest. A version newer than this build understands is an error.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("could not decode backtest result JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (this build reads up to {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

/// Trade ledger CSV: timestamp, bar_index, action, price, shares, confidence, pnl.
///
/// `pnl` is left empty on BUY rows.
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let header = [
        "timestamp",
        "bar_index",
        "action",
        "price",
        "shares",
        "confidence",
        "pnl",
    ];
    let rows = trades.iter().map(|t| {
        vec![
            t.timestamp.to_string(),
            t.bar_index.to_string(),
            t.action.to_string(),
            format!("{:.6}", t.price),
            format!("{:.6}", t.shares),
            format!("{:.4}", t.confidence),
            t.pnl.map(|p| format!("{p:.2}")).unwrap_or_default(),
        ]
    });
    to_csv(&header, rows)
}

/// Portfolio curve CSV: timestamp, portfolio_value.
pub fn export_curve_csv(result: &BacktestResult) -> Result<String> {
    let rows = result
        .timestamps
        .iter()
        .zip(&result.portfolio_curve)
        .map(|(ts, value)| vec![ts.to_string(), format!("{value:.2}")]);
    to_csv(&["timestamp", "portfolio_value"], rows)
}

fn to_csv(header: &[&str], rows: impl Iterator<Item = Vec<String>>) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(header)?;
    for row in rows {
        wtr.write_record(&row)?;
    }
    let bytes = wtr.into_inner().context("could not flush CSV buffer")?;
    String::from_utf8(bytes).context("CSV buffer is not UTF-8")
}

/// Write `manifest.json`, `trades.csv`, `curve.csv` and `report.md` into a new
/// `{symbol}_{YYYYmmdd_HHMMSS}` directory under `output_dir` and return its path.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let run_dir = output_dir.join(format!("{}_{stamp}", result.symbol));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("could not create {}", run_dir.display()))?;

    let files = [
        ("manifest.json", export_json(result)?),
        ("trades.csv", export_trades_csv(&result.trades)?),
        ("curve.csv", export_curve_csv(result)?),
        ("report.md", markdown_report(result)),
    ];
    for (name, contents) in files {
        let path = run_dir.join(name);
        std::fs::write(&path, contents)
            .with_context(|| format!("could not write {}", path.display()))?;
    }

    tracing::info!(dir = %run_dir.display(), "saved backtest artifacts");
    Ok(run_dir)
}

/// Read the result back from a directory written by [`save_artifacts`].
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("could not read {}", path.display()))?;
    import_json(&json)
}
