//! Intraday minute-bar client for the quotes provider.
//!
//! The provider keys its time-series object by interval ("Time Series
//! (1min)"), so parsing scans for the prefix rather than hard-coding the
//! field name. Only the most recent trading date is kept per symbol; the
//! rest of the (large) payload is discarded.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Deserialize;
use tracing::warn;

use crate::domain::{IntradayRow, Symbol};
use crate::http_client::{HttpClient, HttpRequest};
use crate::providers::ProviderError;

/// Configuration for [`IntradayClient`].
#[derive(Debug, Clone)]
pub struct IntradayConfig {
    pub base_url: String,
    pub api_key: String,
    pub interval: String,
    pub output_size: String,
    pub timeout_ms: u64,
}

impl Default for IntradayConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("https://www.alphavantage.co/query"),
            api_key: String::from("demo"),
            interval: String::from("1min"),
            output_size: String::from("full"),
            timeout_ms: 20_000,
        }
    }
}

/// Client for the intraday time-series API.
#[derive(Clone)]
pub struct IntradayClient {
    http: Arc<dyn HttpClient>,
    config: IntradayConfig,
}

impl IntradayClient {
    pub fn new(http: Arc<dyn HttpClient>, config: IntradayConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &IntradayConfig {
        &self.config
    }

    /// Best-effort fetch: any failure is logged and yields no rows so the
    /// rest of the batch proceeds untouched.
    pub async fn fetch_intraday(&self, symbol: Symbol) -> Vec<IntradayRow> {
        match self.time_series(&symbol).await {
            Ok(rows) => rows,
            Err(error) => {
                warn!(symbol = %symbol, error = %error, "intraday fetch failed");
                Vec::new()
            }
        }
    }

    /// Fetch the intraday series and keep only the latest available date.
    pub async fn time_series(&self, symbol: &Symbol) -> Result<Vec<IntradayRow>, ProviderError> {
        let url = format!(
            "{}?function=TIME_SERIES_INTRADAY&symbol={}&interval={}&apikey={}&outputsize={}",
            self.config.base_url,
            urlencoding::encode(symbol.as_str()),
            self.config.interval,
            self.config.api_key,
            self.config.output_size,
        );

        let request = HttpRequest::get(url).with_timeout_ms(self.config.timeout_ms);

        let response = self.http.execute(request).await.map_err(|error| {
            ProviderError::unavailable(format!("intraday transport error: {}", error.message()))
        })?;

        if !response.is_success() {
            return Err(ProviderError::unavailable(format!(
                "intraday endpoint returned status {}",
                response.status
            )));
        }

        let envelope: TimeSeriesEnvelope = serde_json::from_str(&response.body).map_err(|error| {
            ProviderError::malformed(format!("intraday body did not parse: {error}"))
        })?;

        let series = envelope
            .time_series()
            .ok_or_else(|| ProviderError::malformed("no time series data for symbol"))?;

        let mut rows = Vec::with_capacity(series.len());
        for (timestamp, bar) in series {
            // Timestamps arrive as "YYYY-MM-DD HH:MM:SS".
            let Some((date, time)) = timestamp.split_once(' ') else {
                continue;
            };
            rows.push(IntradayRow {
                symbol: symbol.clone(),
                date: date.to_owned(),
                time: time.to_owned(),
                open: bar.open,
                high: bar.high,
                low: bar.low,
                volume: bar.volume,
            });
        }

        // ISO dates compare lexicographically, so max() is the latest day.
        let Some(last_date) = rows.iter().map(|row| row.date.clone()).max() else {
            return Err(ProviderError::malformed("time series contained no bars"));
        };
        rows.retain(|row| row.date == last_date);

        Ok(rows)
    }
}

/// The provider names its series field after the interval; deserialize the
/// whole object and scan for the prefix.
#[derive(Debug, Deserialize)]
struct TimeSeriesEnvelope {
    #[serde(flatten)]
    fields: HashMap<String, serde_json::Value>,
}

impl TimeSeriesEnvelope {
    fn time_series(&self) -> Option<BTreeMap<String, TimeSeriesBar>> {
        for (key, value) in &self.fields {
            if key.starts_with("Time Series") {
                if let Ok(series) = serde_json::from_value(value.clone()) {
                    return Some(series);
                }
            }
        }
        None
    }
}

#[derive(Debug, Clone, Deserialize)]
struct TimeSeriesBar {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "5. volume")]
    volume: String,
}
