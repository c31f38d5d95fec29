use std::sync::Arc;

use bondsheet_core::{
    Coordinator, CredentialStore, ExchangeClient, HttpClient, IntradayClient, TokenAuthority,
};

use crate::config::AppConfig;

/// Shared application state. Everything inside is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<CredentialStore>,
    pub tokens: Arc<TokenAuthority>,
    pub exchange: ExchangeClient,
    pub intraday: IntradayClient,
    pub coordinator: Coordinator,
}

impl AppState {
    /// Wire the state from configuration, injecting the outbound transport
    /// so tests can swap in a scripted client.
    pub fn from_config(config: &AppConfig, http: Arc<dyn HttpClient>) -> Self {
        Self {
            credentials: Arc::new(config.credential_store()),
            tokens: Arc::new(TokenAuthority::new(&config.token_secret, config.token_ttl)),
            exchange: ExchangeClient::new(http.clone(), config.exchange.clone()),
            intraday: IntradayClient::new(http, config.intraday.clone()),
            coordinator: Coordinator::new(config.fanout.clone()),
        }
    }
}
