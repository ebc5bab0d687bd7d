//! Alpha Vantage quote source.
//!
//! Daily and intraday OHLCV series plus the GLOBAL_QUOTE endpoint. Handles retries
//! with exponential backoff, quota notices, response parsing and the circuit breaker.
//!
//! Alpha Vantage reports most failures inside a 200 response body, so every body
//! is checked for `Error Message`, `Note` and `Information` before parsing.

use super::circuit_breaker::CircuitBreaker;
use super::provider::{
    apply_date_window, apply_period_window, DataError, Interval, Period, QuoteSource, RangeSpec,
};
use crate::domain::{Bar, Quote, Series};
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";

const DAILY_KEY: &str = "Time Series (Daily)";
const QUOTE_KEY: &str = "Global Quote";

/// Longest wait between two attempts.
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Alpha Vantage quote source.
pub struct AlphaVantageSource {
    client: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
    circuit_breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
}

impl AlphaVantageSource {
    pub fn new(
        api_key: impl Into<String>,
        circuit_breaker: Arc<CircuitBreaker>,
    ) -> Result<Self, DataError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(DataError::AuthenticationRequired(
                "an Alpha Vantage API key is required".into(),
            ));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("signalbot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            circuit_breaker,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.base_delay = base_delay;
        self
    }

    fn daily(&self, symbol: &str, full: bool) -> Result<Series, DataError> {
        let output_size = if full { "full" } else { "compact" };
        let body = self.query(
            symbol,
            &[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", symbol),
                ("outputsize", output_size),
            ],
        )?;
        parse_time_series(symbol, &body, DAILY_KEY)
    }

    fn intraday(&self, symbol: &str, interval: Interval) -> Result<Series, DataError> {
        let body = self.query(
            symbol,
            &[
                ("function", "TIME_SERIES_INTRADAY"),
                ("symbol", symbol),
                ("interval", interval.as_str()),
                ("outputsize", "compact"),
            ],
        )?;
        parse_time_series(symbol, &body, &intraday_key(interval))
    }

    /// Execute one API call with retry and circuit breaker logic.
    fn query(&self, symbol: &str, params: &[(&str, &str)]) -> Result<Value, DataError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }

        let mut last_error = None;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(self.base_delay, attempt);
                tracing::warn!(symbol, attempt, ?delay, "retrying Alpha Vantage request");
                std::thread::sleep(delay);
            }
            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            tracing::debug!(symbol, ?params, "Alpha Vantage request");
            let sent = self
                .client
                .get(&self.base_url)
                .query(params)
                .query(&[("apikey", self.api_key.as_str())])
                .send();

            let resp = match sent {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    self.circuit_breaker.record_failure();
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return Err(DataError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();
            if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
            {
                self.circuit_breaker.trip();
                return Err(DataError::AuthenticationRequired(format!("HTTP {status}")));
            }
            if !status.is_success() {
                self.circuit_breaker.record_failure();
                last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                continue;
            }

            let body: Value = resp.json().map_err(|e| {
                DataError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
            })?;

            match check_api_error(symbol, &body) {
                Ok(()) => {
                    self.circuit_breaker.record_success();
                    return Ok(body);
                }
                Err(err @ DataError::RateLimited(_)) => {
                    self.circuit_breaker.record_failure();
                    last_error = Some(err);
                }
                Err(err) => return Err(err),
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

impl QuoteSource for AlphaVantageSource {
    fn name(&self) -> &str {
        "alpha_vantage"
    }

    fn fetch_series(&self, symbol: &str, range: RangeSpec) -> Result<Series, DataError> {
        let now = chrono::Local::now().naive_local();
        let series = match range {
            RangeSpec::Period(period) => {
                let raw = self.daily(symbol, period.needs_full_history())?;
                apply_period_window(raw, period, now)
            }
            RangeSpec::Dates { start, end } => {
                let raw = self.daily(symbol, true)?;
                let raw = apply_period_window(raw, Period::FiveYears, now);
                apply_date_window(raw, start, end)?
            }
            // Intraday stamps are exchange-local; they are not compared against the local clock.
            RangeSpec::Intraday(interval) => self.intraday(symbol, interval)?,
        };
        tracing::info!(symbol, %range, bars = series.len(), "fetched series");
        Ok(series)
    }

    fn fetch_latest_quote(&self, symbol: &str) -> Result<Quote, DataError> {
        let body = self.query(symbol, &[("function", "GLOBAL_QUOTE"), ("symbol", symbol)])?;
        parse_global_quote(symbol, &body, chrono::Local::now().naive_local())
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

/// Wait before retry `attempt` (1-based): `base * 2^(attempt - 1)`, capped at [`MAX_BACKOFF`].
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.checked_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
        .map_or(MAX_BACKOFF, |d| d.min(MAX_BACKOFF))
}

pub fn intraday_key(interval: Interval) -> String {
    format!("Time Series ({interval})")
}

/// Map provider-level error bodies to typed errors.
pub fn check_api_error(symbol: &str, body: &Value) -> Result<(), DataError> {
    if let Some(msg) = body.get("Error Message").and_then(Value::as_str) {
        if msg.to_ascii_lowercase().contains("apikey") {
            return Err(DataError::AuthenticationRequired(msg.to_string()));
        }
        return Err(DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        });
    }
    for key in ["Note", "Information"] {
        if let Some(msg) = body.get(key).and_then(Value::as_str) {
            return Err(DataError::RateLimited(msg.to_string()));
        }
    }
    Ok(())
}

/// Parse a `Time Series (...)` object into an ascending series.
///
/// Alpha Vantage lists bars newest first; the result is sorted and de-duplicated.
pub fn parse_time_series(symbol: &str, body: &Value, key: &str) -> Result<Series, DataError> {
    check_api_error(symbol, body)?;
    let entries = body
        .get(key)
        .and_then(Value::as_object)
        .ok_or_else(|| DataError::ResponseFormatChanged(format!("missing '{key}' object")))?;

    let bars = entries
        .iter()
        .map(|(stamp, fields)| {
            let fields = fields.as_object().ok_or_else(|| {
                DataError::ResponseFormatChanged(format!("bar {stamp} is not an object"))
            })?;
            Ok(Bar {
                timestamp: parse_timestamp(stamp)?,
                open: numeric_field(fields, "1. open")?,
                high: numeric_field(fields, "2. high")?,
                low: numeric_field(fields, "3. low")?,
                close: numeric_field(fields, "4. close")?,
                volume: numeric_field(fields, "5. volume")?,
            })
        })
        .collect::<Result<Vec<_>, DataError>>()?;

    if bars.is_empty() {
        return Err(DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        });
    }
    Ok(Series::from_unsorted(symbol, bars)?)
}

/// Parse a `GLOBAL_QUOTE` body. The quote is stamped with `now`.
pub fn parse_global_quote(symbol: &str, body: &Value, now: NaiveDateTime) -> Result<Quote, DataError> {
    check_api_error(symbol, body)?;
    let fields = body
        .get(QUOTE_KEY)
        .and_then(Value::as_object)
        .ok_or_else(|| DataError::ResponseFormatChanged(format!("missing '{QUOTE_KEY}' object")))?;
    // Unknown symbols come back as an empty object.
    if fields.is_empty() {
        return Err(DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        });
    }

    let change_percent = text_field(fields, "10. change percent")?;
    Ok(Quote {
        symbol: symbol.to_string(),
        price: numeric_field(fields, "05. price")?,
        change: numeric_field(fields, "09. change")?,
        change_percent: parse_number("10. change percent", change_percent.trim_end_matches('%'))?,
        timestamp: now,
    })
}

fn parse_timestamp(stamp: &str) -> Result<NaiveDateTime, DataError> {
    NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| {
            NaiveDate::parse_from_str(stamp, "%Y-%m-%d").map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
        .map_err(|_| DataError::ResponseFormatChanged(format!("invalid timestamp: {stamp}")))
}

fn text_field<'a>(fields: &'a Map<String, Value>, name: &str) -> Result<&'a str, DataError> {
    fields
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| DataError::ResponseFormatChanged(format!("missing field '{name}'")))
}

fn numeric_field(fields: &Map<String, Value>, name: &str) -> Result<f64, DataError> {
    parse_number(name, text_field(fields, name)?)
}

fn parse_number(name: &str, text: &str) -> Result<f64, DataError> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| DataError::ResponseFormatChanged(format!("field '{name}' is not numeric: {text}")))
}
