//! Outbound provider clients.
//!
//! Two external collaborators feed the exports: the exchange
//! reference-data/quote API (per-symbol static fields and a settlement trade
//! price) and the intraday quotes API (per-symbol minute bars).

use std::fmt::{Display, Formatter};

mod exchange;
mod intraday;

pub use exchange::{ExchangeClient, ExchangeConfig};
pub use intraday::{IntradayClient, IntradayConfig};

/// Provider-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Transport failure or an upstream error status.
    Unavailable,
    /// The upstream answered, but the body did not parse.
    Malformed,
}

/// Structured provider error.
///
/// Provider failures never escalate past the symbol they belong to; callers
/// log them and fill placeholder fields instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    kind: ProviderErrorKind,
    message: String,
    retryable: bool,
}

impl ProviderError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Malformed,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> ProviderErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            ProviderErrorKind::Unavailable => "provider.unavailable",
            ProviderErrorKind::Malformed => "provider.malformed",
        }
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for ProviderError {}
