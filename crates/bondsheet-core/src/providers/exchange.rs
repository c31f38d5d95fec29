//! Exchange reference-data and settlement-quote client.
//!
//! Each symbol triggers up to two calls: a best-effort reference lookup
//! (amortization schedule, interest terms, issue date) and a retried
//! settlement quote. The quote endpoint sheds load with a transient status,
//! so only that call carries the retry policy. A third, standalone call
//! pulls the bulk public-bonds listing without any symbol input.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::domain::{BondRecord, ListedBond, Symbol, TradeValue};
use crate::http_client::{HttpClient, HttpRequest};
use crate::providers::ProviderError;
use crate::retry::RetryConfig;

/// Configuration for [`ExchangeClient`].
#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    /// Base URL; `/general` and `/cotizacion` are appended.
    pub base_url: String,
    /// Bulk public-bonds listing endpoint. A sibling of `base_url`, not
    /// under it.
    pub listing_url: String,
    /// Settlement window selector sent with every quote request.
    pub settlement_type: String,
    /// Divisor applied to the raw trade value. The upstream reports prices
    /// scaled by 100.
    pub trade_scale: f64,
    pub retry: RetryConfig,
    pub timeout_ms: u64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: String::from(
                "https://open.bymadata.com.ar/vanoms-be-core/rest/api/bymadata/free/bnown/fichatecnica/especies",
            ),
            listing_url: String::from(
                "https://open.bymadata.com.ar/vanoms-be-core/rest/api/bymadata/free/public-bonds",
            ),
            settlement_type: String::from("2"),
            trade_scale: 100.0,
            retry: RetryConfig::default(),
            timeout_ms: 10_000,
        }
    }
}

/// Client for the exchange reference-data/quote API.
#[derive(Clone)]
pub struct ExchangeClient {
    http: Arc<dyn HttpClient>,
    config: ExchangeConfig,
}

impl ExchangeClient {
    pub fn new(http: Arc<dyn HttpClient>, config: ExchangeConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    /// Fetch everything the export needs for one symbol.
    ///
    /// Never fails: upstream trouble is logged and leaves the affected
    /// fields blank or the trade marked unavailable, so the batch always
    /// gets exactly one row per symbol.
    pub async fn fetch_bond(&self, symbol: Symbol) -> BondRecord {
        let mut record = BondRecord::placeholder(symbol.clone());

        match self.reference(&symbol).await {
            Ok(reference) => {
                record.amortization = reference.amortization;
                record.interest = reference.interest;
                record.issue_date = reference.issue_date;
            }
            Err(error) => {
                warn!(symbol = %symbol, error = %error, "reference data lookup failed");
            }
        }

        match self.settlement_quote(&symbol).await {
            Ok(trade) => record.trade = trade,
            Err(error) => {
                warn!(symbol = %symbol, error = %error, "settlement quote failed");
            }
        }

        record
    }

    /// Best-effort reference-data call. One attempt, no retry.
    pub async fn reference(&self, symbol: &Symbol) -> Result<ReferenceData, ProviderError> {
        let url = format!("{}/general", self.config.base_url);
        let body = json!({ "symbol": symbol.as_str() }).to_string();
        let request = HttpRequest::post_json(url, body).with_timeout_ms(self.config.timeout_ms);

        let response = self.http.execute(request).await.map_err(|error| {
            ProviderError::unavailable(format!("exchange transport error: {}", error.message()))
        })?;

        if !response.is_success() {
            return Err(ProviderError::unavailable(format!(
                "exchange reference endpoint returned status {}",
                response.status
            )));
        }

        let envelope: ExchangeEnvelope = serde_json::from_str(&response.body).map_err(|error| {
            ProviderError::malformed(format!("exchange reference body did not parse: {error}"))
        })?;

        let first = envelope
            .data
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::malformed("exchange reference data array is empty"))?;

        Ok(ReferenceData {
            amortization: field_text(&first, "formaAmortizacion"),
            interest: field_text(&first, "interes"),
            issue_date: field_text(&first, "fechaEmision"),
        })
    }

    /// Bulk listing of every public bond the exchange currently quotes.
    ///
    /// One attempt, no retry, no uploaded symbol list involved. Entries
    /// without a usable symbol are skipped; an empty listing is not an
    /// error here, the caller decides what an empty batch means.
    pub async fn list_public_bonds(&self) -> Result<Vec<ListedBond>, ProviderError> {
        // The listing expects the settlement-window flags in the body and
        // browser-looking headers; it refuses bare API traffic.
        let body = json!({
            "T1": true,
            "T0": false,
            "Content-Type": "application/json, text/plain",
        })
        .to_string();
        let request = HttpRequest::post_json(self.config.listing_url.clone(), body)
            .with_header("referer", "https://open.bymadata.com.ar/")
            .with_header("origin", "https://open.bymadata.com.ar")
            .with_timeout_ms(self.config.timeout_ms);

        let response = self.http.execute(request).await.map_err(|error| {
            ProviderError::unavailable(format!("exchange transport error: {}", error.message()))
        })?;

        if !response.is_success() {
            return Err(ProviderError::unavailable(format!(
                "exchange listing endpoint returned status {}",
                response.status
            )));
        }

        let envelope: ExchangeEnvelope = serde_json::from_str(&response.body).map_err(|error| {
            ProviderError::malformed(format!("exchange listing body did not parse: {error}"))
        })?;

        let mut bonds = Vec::with_capacity(envelope.data.len());
        for item in &envelope.data {
            match Symbol::parse(&field_text(item, "symbol")) {
                Ok(symbol) => bonds.push(ListedBond::new(symbol, field_text(item, "trade"))),
                Err(error) => {
                    warn!(error = %error, "listing entry without a usable symbol skipped");
                }
            }
        }

        Ok(bonds)
    }

    /// Settlement-quote call with bounded retry on the transient status.
    ///
    /// Any non-retryable status or transport error aborts immediately. A
    /// successful response with an absent or non-numeric trade field yields
    /// `TradeValue::Unavailable`; that is still a success.
    pub async fn settlement_quote(&self, symbol: &Symbol) -> Result<TradeValue, ProviderError> {
        let url = format!("{}/cotizacion", self.config.base_url);
        let body = json!({
            "symbol": symbol.as_str(),
            "settlementType": self.config.settlement_type,
        })
        .to_string();
        let request = HttpRequest::post_json(url, body).with_timeout_ms(self.config.timeout_ms);

        let mut attempt: u32 = 0;
        loop {
            let outcome = self.http.execute(request.clone()).await;

            let retry_reason = match outcome {
                Ok(response) if response.is_success() => {
                    return self.parse_trade(&response.body);
                }
                Ok(response) if self.config.retry.should_retry_status(response.status) => {
                    format!("quote endpoint returned status {}", response.status)
                }
                Ok(response) => {
                    return Err(ProviderError::unavailable(format!(
                        "quote endpoint returned status {}",
                        response.status
                    )));
                }
                Err(error) if error.retryable() && self.config.retry.retry_on_transport => {
                    format!("quote transport error: {}", error.message())
                }
                Err(error) => {
                    return Err(ProviderError::unavailable(format!(
                        "quote transport error: {}",
                        error.message()
                    )));
                }
            };

            if attempt >= self.config.retry.max_retries {
                return Err(ProviderError::unavailable(format!(
                    "{retry_reason}; gave up after {} attempts",
                    attempt + 1
                )));
            }

            let delay = self.config.retry.delay_for_attempt(attempt);
            warn!(
                symbol = %symbol,
                attempt = attempt + 1,
                max_retries = self.config.retry.max_retries,
                delay_ms = delay.as_millis() as u64,
                "{retry_reason}; retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    fn parse_trade(&self, body: &str) -> Result<TradeValue, ProviderError> {
        let envelope: ExchangeEnvelope = serde_json::from_str(body).map_err(|error| {
            ProviderError::malformed(format!("exchange quote body did not parse: {error}"))
        })?;

        let first = envelope
            .data
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::malformed("exchange quote data array is empty"))?;

        let raw = match first.get("trade") {
            None | Some(serde_json::Value::Null) => return Ok(TradeValue::Unavailable),
            Some(value) => value.clone(),
        };

        let numeric = match raw {
            // A literal zero marks an instrument with no trade printed.
            serde_json::Value::Number(number) => number.as_f64().filter(|value| *value != 0.0),
            serde_json::Value::String(text) if !text.trim().is_empty() => {
                text.trim().parse::<f64>().ok()
            }
            _ => None,
        };

        Ok(match numeric {
            Some(value) => TradeValue::Price(value / self.config.trade_scale),
            None => TradeValue::Unavailable,
        })
    }
}

/// Static per-instrument fields from the reference endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceData {
    pub amortization: String,
    pub interest: String,
    pub issue_date: String,
}

#[derive(Debug, Deserialize)]
struct ExchangeEnvelope {
    #[serde(default)]
    data: Vec<serde_json::Value>,
}

/// Stringify a reference field the way the upstream mixes types: missing or
/// null becomes blank, strings pass through, anything else is rendered.
fn field_text(value: &serde_json::Value, key: &str) -> String {
    match value.get(key) {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::{HttpResponse, ScriptedHttpClient};

    fn client_with(http: ScriptedHttpClient, retry: RetryConfig) -> (Arc<ScriptedHttpClient>, ExchangeClient) {
        let http = Arc::new(http);
        let config = ExchangeConfig {
            base_url: String::from("https://exchange.test/especies"),
            retry,
            ..ExchangeConfig::default()
        };
        (http.clone(), ExchangeClient::new(http, config))
    }

    fn reference_body() -> String {
        json!({
            "data": [{
                "formaAmortizacion": "Al vencimiento",
                "interes": "Fija 7.5%",
                "fechaEmision": "2020-09-07",
            }]
        })
        .to_string()
    }

    fn quote_body(trade: serde_json::Value) -> String {
        json!({ "data": [{ "trade": trade }] }).to_string()
    }

    #[tokio::test]
    async fn reference_call_parses_upstream_field_names() {
        let (_, client) = client_with(
            ScriptedHttpClient::new()
                .route("general", vec![Ok(HttpResponse::ok_json(reference_body()))]),
            RetryConfig::no_retry(),
        );

        let symbol = Symbol::parse("AL30").expect("valid symbol");
        let reference = client
            .reference(&symbol)
            .await
            .expect("reference should parse");

        assert_eq!(reference.amortization, "Al vencimiento");
        assert_eq!(reference.interest, "Fija 7.5%");
        assert_eq!(reference.issue_date, "2020-09-07");
    }

    #[tokio::test]
    async fn quote_rescales_numeric_trade() {
        let (_, client) = client_with(
            ScriptedHttpClient::new()
                .route("cotizacion", vec![Ok(HttpResponse::ok_json(quote_body(json!(64530.0))))]),
            RetryConfig::no_retry(),
        );

        let symbol = Symbol::parse("AL30").expect("valid symbol");
        let trade = client
            .settlement_quote(&symbol)
            .await
            .expect("quote should succeed");

        assert_eq!(trade, TradeValue::Price(645.3));
    }

    #[tokio::test]
    async fn quote_rescales_numeric_string_trade() {
        let (_, client) = client_with(
            ScriptedHttpClient::new()
                .route("cotizacion", vec![Ok(HttpResponse::ok_json(quote_body(json!("150.0"))))]),
            RetryConfig::no_retry(),
        );

        let symbol = Symbol::parse("GD35").expect("valid symbol");
        let trade = client
            .settlement_quote(&symbol)
            .await
            .expect("quote should succeed");

        assert_eq!(trade, TradeValue::Price(1.5));
    }

    #[tokio::test]
    async fn quote_without_trade_field_is_unavailable_not_an_error() {
        let (_, client) = client_with(
            ScriptedHttpClient::new().route(
                "cotizacion",
                vec![Ok(HttpResponse::ok_json(json!({ "data": [{}] }).to_string()))],
            ),
            RetryConfig::no_retry(),
        );

        let symbol = Symbol::parse("AE38").expect("valid symbol");
        let trade = client
            .settlement_quote(&symbol)
            .await
            .expect("quote should succeed");

        assert_eq!(trade, TradeValue::Unavailable);
    }

    #[tokio::test]
    async fn quote_with_zero_trade_is_unavailable() {
        let (_, client) = client_with(
            ScriptedHttpClient::new()
                .route("cotizacion", vec![Ok(HttpResponse::ok_json(quote_body(json!(0))))]),
            RetryConfig::no_retry(),
        );

        let symbol = Symbol::parse("AL30").expect("valid symbol");
        let trade = client
            .settlement_quote(&symbol)
            .await
            .expect("quote should succeed");

        // the upstream sends 0 for instruments with no trade printed
        assert_eq!(trade, TradeValue::Unavailable);
    }

    #[tokio::test]
    async fn quote_with_zero_string_trade_still_rescales() {
        let (_, client) = client_with(
            ScriptedHttpClient::new()
                .route("cotizacion", vec![Ok(HttpResponse::ok_json(quote_body(json!("0"))))]),
            RetryConfig::no_retry(),
        );

        let symbol = Symbol::parse("AL30").expect("valid symbol");
        let trade = client
            .settlement_quote(&symbol)
            .await
            .expect("quote should succeed");

        assert_eq!(trade, TradeValue::Price(0.0));
    }

    #[tokio::test]
    async fn listing_collects_symbols_and_raw_trades() {
        let (http, client) = client_with(
            ScriptedHttpClient::new().route(
                "public-bonds",
                vec![Ok(HttpResponse::ok_json(
                    json!({
                        "data": [
                            { "symbol": "AL30", "trade": 64530.0 },
                            { "symbol": "GD35", "trade": null },
                            { "trade": 12.0 },
                        ]
                    })
                    .to_string(),
                ))],
            ),
            RetryConfig::no_retry(),
        );

        let bonds = client
            .list_public_bonds()
            .await
            .expect("listing should succeed");

        // the entry without a symbol is skipped, the rest keep their raw trade
        assert_eq!(bonds.len(), 2);
        assert_eq!(bonds[0].symbol.as_str(), "AL30");
        assert_eq!(bonds[0].trade, "64530.0");
        assert_eq!(bonds[1].symbol.as_str(), "GD35");
        assert_eq!(bonds[1].trade, "");

        let requests = http.recorded_requests();
        let body = requests[0].body.as_deref().expect("listing body present");
        assert!(body.contains("\"T1\":true"));
        assert!(body.contains("\"T0\":false"));
    }

    #[tokio::test]
    async fn listing_fails_on_upstream_error_status() {
        let (http, client) = client_with(
            ScriptedHttpClient::new()
                .route("public-bonds", vec![Ok(HttpResponse::status_only(500))]),
            RetryConfig::no_retry(),
        );

        let error = client
            .list_public_bonds()
            .await
            .expect_err("error status should fail the listing");

        assert!(error.message().contains("status 500"));
        // one attempt, the listing carries no retry
        assert_eq!(http.request_count("public-bonds"), 1);
    }

    #[tokio::test]
    async fn listing_with_no_entries_is_empty_not_an_error() {
        let (_, client) = client_with(
            ScriptedHttpClient::new().route(
                "public-bonds",
                vec![Ok(HttpResponse::ok_json(json!({ "data": [] }).to_string()))],
            ),
            RetryConfig::no_retry(),
        );

        let bonds = client
            .list_public_bonds()
            .await
            .expect("empty listing should succeed");
        assert!(bonds.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn quote_retries_transient_status_then_succeeds() {
        let k = 3;
        let mut responses: Vec<_> = (0..k).map(|_| Ok(HttpResponse::status_only(503))).collect();
        responses.push(Ok(HttpResponse::ok_json(quote_body(json!(10_000.0)))));

        let (http, client) = client_with(
            ScriptedHttpClient::new().route("cotizacion", responses),
            RetryConfig::exponential(5),
        );

        let symbol = Symbol::parse("AL30").expect("valid symbol");
        let trade = client
            .settlement_quote(&symbol)
            .await
            .expect("quote should eventually succeed");

        assert_eq!(trade, TradeValue::Price(100.0));
        assert_eq!(http.request_count("cotizacion"), k + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn quote_gives_up_after_retry_cap() {
        let (http, client) = client_with(
            ScriptedHttpClient::new()
                .route("cotizacion", vec![Ok(HttpResponse::status_only(503))]),
            RetryConfig::exponential(4),
        );

        let symbol = Symbol::parse("AL30").expect("valid symbol");
        let error = client
            .settlement_quote(&symbol)
            .await
            .expect_err("exhausted retries should fail");

        assert!(error.message().contains("gave up after 5 attempts"));
        // max_retries + 1 attempts, no more
        assert_eq!(http.request_count("cotizacion"), 5);
    }

    #[tokio::test]
    async fn quote_aborts_immediately_on_non_retryable_status() {
        let (http, client) = client_with(
            ScriptedHttpClient::new()
                .route("cotizacion", vec![Ok(HttpResponse::status_only(500))]),
            RetryConfig::exponential(5),
        );

        let symbol = Symbol::parse("AL30").expect("valid symbol");
        let error = client
            .settlement_quote(&symbol)
            .await
            .expect_err("non-retryable status should abort");

        assert!(error.message().contains("status 500"));
        assert_eq!(http.request_count("cotizacion"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_bond_yields_partial_row_when_reference_fails() {
        let (_, client) = client_with(
            ScriptedHttpClient::new()
                .route("general", vec![Ok(HttpResponse::status_only(500))])
                .route("cotizacion", vec![Ok(HttpResponse::ok_json(quote_body(json!(20_000.0))))]),
            RetryConfig::no_retry(),
        );

        let symbol = Symbol::parse("AL30").expect("valid symbol");
        let record = client.fetch_bond(symbol.clone()).await;

        assert_eq!(record.symbol, symbol);
        assert!(record.amortization.is_empty());
        assert!(record.issue_date.is_empty());
        assert_eq!(record.trade, TradeValue::Price(200.0));
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_bond_yields_placeholder_trade_when_quote_never_succeeds() {
        let (_, client) = client_with(
            ScriptedHttpClient::new()
                .route("general", vec![Ok(HttpResponse::ok_json(reference_body()))])
                .route("cotizacion", vec![Ok(HttpResponse::status_only(503))]),
            RetryConfig::exponential(2),
        );

        let symbol = Symbol::parse("AL30").expect("valid symbol");
        let record = client.fetch_bond(symbol).await;

        assert_eq!(record.amortization, "Al vencimiento");
        assert_eq!(record.trade, TradeValue::Unavailable);
    }

    #[tokio::test]
    async fn quote_request_carries_settlement_type() {
        let (http, client) = client_with(
            ScriptedHttpClient::new()
                .route("cotizacion", vec![Ok(HttpResponse::ok_json(quote_body(json!(1.0))))]),
            RetryConfig::no_retry(),
        );

        let symbol = Symbol::parse("AL30").expect("valid symbol");
        let _ = client.settlement_quote(&symbol).await;

        let requests = http.recorded_requests();
        let body = requests[0].body.as_deref().expect("quote body present");
        assert!(body.contains("\"settlementType\":\"2\""));
        assert!(body.contains("\"symbol\":\"AL30\""));
    }
}
