//! # Bondsheet Core
//!
//! Domain types and the fetch pipeline behind the bondsheet exports.
//!
//! ## Overview
//!
//! An uploaded symbol list is deduplicated, fanned out to the external data
//! providers, and the collected rows are rendered as delimited text. This
//! crate holds everything except the inbound HTTP surface:
//!
//! - **Domain models** for symbols and export rows
//! - **Credential and token handling** for request authentication
//! - **Provider clients** for the exchange and intraday APIs
//! - **Fan-out coordinator** with bounded concurrency and rate quota
//! - **Retry policy** for the transient-failure quote endpoint
//! - **Extraction and serialization** of the delimited formats
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`auth`] | Credential store and token issue/verify |
//! | [`domain`] | Symbols and export row types |
//! | [`extract`] | Symbol-column extraction from uploads |
//! | [`fanout`] | Per-symbol fan-out coordinator |
//! | [`http_client`] | Outbound HTTP transport abstraction |
//! | [`providers`] | Exchange and intraday provider clients |
//! | [`retry`] | Backoff and retry configuration |
//! | [`tabular`] | Delimited-text rendering |
//!
//! ## Error Handling
//!
//! Per-symbol failures are isolated: a symbol whose upstream calls fail
//! still yields a row with placeholder fields. Only auth failures and an
//! entirely empty batch surface as request-level errors.

pub mod auth;
pub mod domain;
pub mod error;
pub mod extract;
pub mod fanout;
pub mod http_client;
pub mod providers;
pub mod retry;
pub mod tabular;

// Re-export commonly used types at crate root for convenience

pub use auth::{CredentialStore, TokenAuthority, DEFAULT_TOKEN_TTL};
pub use domain::{BondRecord, IntradayRow, ListedBond, Symbol, TradeValue};
pub use error::{AuthError, ExtractError, TabularError, ValidationError};
pub use extract::extract_symbols;
pub use fanout::{Coordinator, FanoutConfig, RateQuota};
pub use http_client::{
    HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient,
    ScriptedHttpClient,
};
pub use providers::{
    ExchangeClient, ExchangeConfig, IntradayClient, IntradayConfig, ProviderError,
    ProviderErrorKind,
};
pub use retry::{Backoff, RetryConfig};
pub use tabular::{
    render_bonds, render_intraday, render_listing, BOND_HEADER, INTRADAY_HEADER, LISTING_HEADER,
};
