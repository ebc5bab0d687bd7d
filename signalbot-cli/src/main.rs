//! Signalbot CLI: train, backtest, predict and realtime modes for one symbol.
//!
//! Modes:
//! - `--train`: fit the signal model on the fetched history and save it
//! - `--backtest`: replay the history through the model and report metrics
//! - `--predict`: signal for the latest complete bar
//! - `--realtime`: poll intraday bars and print one signal per poll
//!
//! Train, backtest and predict can be combined and run in that order on a
//! single fetch. Realtime runs on its own.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use signalbot_core::data::{Interval, Period, QuoteSource, RangeSpec};
use signalbot_core::features::FeatureFrame;
use signalbot_core::model::{ModelStore, SignalModel, SignalPredictor};
use signalbot_runner::config::API_KEY_ENV;
use signalbot_runner::export::save_artifacts;
use signalbot_runner::pipeline::{build_source, fetch_frame, train_and_save};
use signalbot_runner::report::{backtest_summary, prediction_summary, training_summary};
use signalbot_runner::{
    load_or_train, AppConfig, Backtester, LiveMonitor, ModelOrigin, StdoutMonitor, SystemClock,
};

#[derive(Parser)]
#[command(
    name = "signalbot",
    about = "Signalbot: next-bar signal model, backtester and live monitor"
)]
struct Cli {
    /// Ticker symbol.
    #[arg(long, default_value = "AAPL")]
    symbol: String,

    /// History window: 1mo, 3mo, 6mo, 1y, 2y, 5y. Defaults to the config value (1y).
    #[arg(long)]
    period: Option<Period>,

    /// Start date (YYYY-MM-DD). Overrides --period; requires --end.
    #[arg(long, requires = "end")]
    start: Option<String>,

    /// End date (YYYY-MM-DD).
    #[arg(long, requires = "start")]
    end: Option<String>,

    /// Train the model and save it to the model directory.
    #[arg(long, default_value_t = false)]
    train: bool,

    /// Backtest the model over the fetched history.
    #[arg(long, default_value_t = false)]
    backtest: bool,

    /// Print the signal for the latest bar.
    #[arg(long, default_value_t = false)]
    predict: bool,

    /// Run a live monitoring session on intraday bars.
    #[arg(long, default_value_t = false)]
    realtime: bool,

    /// Alpha Vantage API key.
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    api_key: Option<String>,

    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for saved models. Defaults to ./models.
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Save backtest artifacts (manifest.json, trades.csv, curve.csv, report.md) here.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Use deterministic synthetic data instead of Alpha Vantage.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Initial backtest capital.
    #[arg(long)]
    capital: Option<f64>,

    /// Realtime session length in minutes.
    #[arg(long)]
    duration_minutes: Option<u64>,

    /// Minutes between realtime polls.
    #[arg(long)]
    poll_minutes: Option<u64>,

    /// Intraday bar interval for realtime mode: 1min, 5min, 15min, 30min, 60min.
    #[arg(long)]
    interval: Option<Interval>,
}

impl Cli {
    fn any_mode(&self) -> bool {
        self.train || self.backtest || self.predict || self.realtime
    }

    /// Flags win over the config file.
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(period) = self.period {
            config.data.period = period;
        }
        if let Some(dir) = &self.model_dir {
            config.model.dir = dir.clone();
        }
        if let Some(capital) = self.capital {
            config.backtest.initial_capital = capital;
        }
        if let Some(minutes) = self.duration_minutes {
            config.monitor.duration_minutes = minutes;
        }
        if let Some(minutes) = self.poll_minutes {
            config.monitor.poll_minutes = minutes;
        }
        if let Some(interval) = self.interval {
            config.monitor.interval = interval;
        }
    }

    fn range(&self, period: Period) -> Result<RangeSpec> {
        match (&self.start, &self.end) {
            (Some(start), Some(end)) => {
                let start = NaiveDate::parse_from_str(start, "%Y-%m-%d")
                    .with_context(|| format!("invalid --start date '{start}'"))?;
                let end = NaiveDate::parse_from_str(end, "%Y-%m-%d")
                    .with_context(|| format!("invalid --end date '{end}'"))?;
                if start > end {
                    bail!("--start {start} is after --end {end}");
                }
                Ok(RangeSpec::Dates { start, end })
            }
            _ => Ok(RangeSpec::Period(period)),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if !cli.any_mode() {
        bail!("nothing to do: pass at least one of --train, --backtest, --predict, --realtime");
    }

    let mut config = AppConfig::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    let symbol = cli.symbol.trim().to_uppercase();
    if symbol.is_empty() {
        bail!("--symbol must not be empty");
    }
    let api_key = config.resolve_api_key(cli.api_key.as_deref());
    let source = build_source(&config.data, api_key, cli.synthetic)?;
    let store = ModelStore::new(&config.model.dir);

    if cli.realtime {
        if cli.train || cli.backtest || cli.predict {
            tracing::warn!("--realtime runs on its own; other modes are ignored");
        }
        return run_realtime(source.as_ref(), &store, &symbol, &config);
    }

    let range = cli.range(config.data.period)?;
    println!("Fetching {symbol} ({range}) from {}...", source.name());
    let frame = fetch_frame(source.as_ref(), &symbol, range)
        .with_context(|| format!("failed to fetch {symbol}"))?;
    println!("Fetched {} bars", frame.len());
    println!();

    let trained = if cli.train {
        let (model, report) = train_and_save(&frame, &store, &config.model.training)?;
        print!("{}", training_summary(&report));
        println!("Model saved to: {}", store.path_for(&symbol).display());
        println!();
        Some(model)
    } else {
        None
    };

    if !(cli.backtest || cli.predict) {
        return Ok(());
    }
    let model = match trained {
        Some(model) => model,
        None => store.load(&symbol).with_context(|| {
            format!("no usable model for {symbol}; run with --train first")
        })?,
    };

    if cli.backtest {
        run_backtest(&frame, &model, &config, cli.output_dir.as_deref())?;
    }
    if cli.predict {
        run_predict(&frame, &model)?;
    }

    Ok(())
}

fn run_backtest(
    frame: &FeatureFrame,
    model: &SignalModel,
    config: &AppConfig,
    output_dir: Option<&std::path::Path>,
) -> Result<()> {
    let backtester = Backtester::new(config.backtest.clone())?;
    let result = backtester
        .run(frame, model)
        .with_context(|| format!("backtest failed for {}", frame.symbol()))?;
    print!("{}", backtest_summary(&result));

    if let Some(dir) = output_dir {
        let run_dir = save_artifacts(&result, dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }
    println!();
    Ok(())
}

fn run_predict(frame: &FeatureFrame, model: &SignalModel) -> Result<()> {
    let (_, prediction) = model
        .predict_latest(frame)
        .with_context(|| format!("prediction failed for {}", frame.symbol()))?;
    let last_close = frame
        .series()
        .last()
        .map(|b| b.close)
        .context("series has no bars")?;
    print!("{}", prediction_summary(frame.symbol(), &prediction, last_close));
    Ok(())
}

fn run_realtime(
    source: &dyn QuoteSource,
    store: &ModelStore,
    symbol: &str,
    config: &AppConfig,
) -> Result<()> {
    let (model, origin) = load_or_train(source, store, symbol, &config.model.training)?;
    if let ModelOrigin::Trained(report) = &origin {
        print!("{}", training_summary(report));
        println!();
    }

    let settings = config.monitor.clone();
    println!(
        "Monitoring {symbol} for {} minutes, polling every {} minutes ({} bars)",
        settings.duration_minutes, settings.poll_minutes, settings.interval
    );
    println!();

    let clock = SystemClock;
    LiveMonitor::new(source, &model, &clock, settings).run(symbol, &mut StdoutMonitor);
    Ok(())
}
