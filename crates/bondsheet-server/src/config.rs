//! Environment-driven application configuration.
//!
//! Everything the process needs — credentials, signing key, provider
//! endpoints, fan-out and retry knobs — is read once at startup. Nothing is
//! baked into source.

use std::env;
use std::time::Duration;

use bondsheet_core::{
    Backoff, CredentialStore, ExchangeConfig, FanoutConfig, IntradayConfig, RateQuota, RetryConfig,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {name}")]
    MissingVar { name: &'static str },
    #[error("invalid value for {name}: {reason}")]
    InvalidVar { name: &'static str, reason: String },
}

/// Application configuration, loaded once in `main`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub credentials: Vec<(String, String)>,
    pub token_secret: String,
    pub token_ttl: time::Duration,
    pub exchange: ExchangeConfig,
    pub intraday: IntradayConfig,
    pub fanout: FanoutConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let credentials = parse_credentials(&require_var("BONDSHEET_USERS")?)?;
        let token_secret = require_var("BONDSHEET_TOKEN_SECRET")?;

        let token_ttl_minutes =
            parse_var("BONDSHEET_TOKEN_TTL_MINUTES", 60_i64, |raw| raw.parse().ok())?;

        let exchange = ExchangeConfig {
            base_url: var_or("BONDSHEET_EXCHANGE_BASE_URL", ExchangeConfig::default().base_url),
            listing_url: var_or("BONDSHEET_LISTING_URL", ExchangeConfig::default().listing_url),
            settlement_type: var_or("BONDSHEET_SETTLEMENT_TYPE", String::from("2")),
            trade_scale: parse_var("BONDSHEET_TRADE_SCALE", 100.0_f64, |raw| {
                raw.parse().ok().filter(|scale: &f64| *scale > 0.0)
            })?,
            retry: retry_from_env()?,
            timeout_ms: parse_var("BONDSHEET_EXCHANGE_TIMEOUT_MS", 10_000_u64, |raw| {
                raw.parse().ok()
            })?,
        };

        let intraday = IntradayConfig {
            base_url: var_or("BONDSHEET_INTRADAY_BASE_URL", IntradayConfig::default().base_url),
            api_key: var_or("BONDSHEET_INTRADAY_API_KEY", String::from("demo")),
            ..IntradayConfig::default()
        };

        Ok(Self {
            bind_addr: var_or("BONDSHEET_BIND", String::from("0.0.0.0:8000")),
            credentials,
            token_secret,
            token_ttl: time::Duration::minutes(token_ttl_minutes),
            exchange,
            intraday,
            fanout: fanout_from_env()?,
        })
    }

    pub fn credential_store(&self) -> CredentialStore {
        CredentialStore::from_pairs(self.credentials.iter().cloned())
    }
}

fn require_var(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar { name }),
    }
}

fn var_or(name: &str, default: String) -> String {
    env::var(name).ok().filter(|v| !v.trim().is_empty()).unwrap_or(default)
}

fn parse_var<T>(
    name: &'static str,
    default: T,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => parse(raw.trim()).ok_or_else(|| ConfigError::InvalidVar {
            name,
            reason: format!("could not parse '{}'", raw.trim()),
        }),
        Err(_) => Ok(default),
    }
}

/// `user:password` pairs separated by commas.
fn parse_credentials(raw: &str) -> Result<Vec<(String, String)>, ConfigError> {
    let mut pairs = Vec::new();
    for entry in raw.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let Some((user, password)) = entry.split_once(':') else {
            return Err(ConfigError::InvalidVar {
                name: "BONDSHEET_USERS",
                reason: format!("entry '{entry}' is not user:password"),
            });
        };
        if user.is_empty() || password.is_empty() {
            return Err(ConfigError::InvalidVar {
                name: "BONDSHEET_USERS",
                reason: format!("entry '{entry}' has an empty user or password"),
            });
        }
        pairs.push((user.to_owned(), password.to_owned()));
    }

    if pairs.is_empty() {
        return Err(ConfigError::MissingVar {
            name: "BONDSHEET_USERS",
        });
    }

    Ok(pairs)
}

fn retry_from_env() -> Result<RetryConfig, ConfigError> {
    let max_retries = parse_var("BONDSHEET_MAX_RETRIES", 5_u32, |raw| raw.parse().ok())?;
    let retry_on_status = parse_var("BONDSHEET_RETRY_STATUS", vec![503_u16], |raw| {
        raw.split(',')
            .map(|code| code.trim().parse::<u16>().ok())
            .collect::<Option<Vec<_>>>()
    })?;

    // An explicit fixed delay restores the historical serial-loop shape;
    // otherwise the exponential default applies.
    let backoff = match env::var("BONDSHEET_RETRY_FIXED_DELAY_SECS") {
        Ok(raw) => {
            let seconds: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidVar {
                name: "BONDSHEET_RETRY_FIXED_DELAY_SECS",
                reason: format!("could not parse '{}'", raw.trim()),
            })?;
            Backoff::Fixed {
                delay: Duration::from_secs(seconds),
            }
        }
        Err(_) => Backoff::default(),
    };

    Ok(RetryConfig {
        max_retries,
        backoff,
        retry_on_status,
        ..RetryConfig::default()
    })
}

fn fanout_from_env() -> Result<FanoutConfig, ConfigError> {
    let max_in_flight = parse_var("BONDSHEET_MAX_IN_FLIGHT", 8_usize, |raw| {
        raw.parse().ok().filter(|n: &usize| *n >= 1)
    })?;

    let quota = match env::var("BONDSHEET_QUOTA_LIMIT") {
        Ok(raw) => {
            let limit: u32 = raw.trim().parse().map_err(|_| ConfigError::InvalidVar {
                name: "BONDSHEET_QUOTA_LIMIT",
                reason: format!("could not parse '{}'", raw.trim()),
            })?;
            let window_secs =
                parse_var("BONDSHEET_QUOTA_WINDOW_SECS", 60_u64, |raw| raw.parse().ok())?;
            Some(RateQuota {
                limit,
                window: Duration::from_secs(window_secs),
            })
        }
        Err(_) => None,
    };

    Ok(FanoutConfig {
        max_in_flight,
        quota,
    })
}
