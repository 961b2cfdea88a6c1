// src/services/source.rs
use async_trait::async_trait;
use log::info;
use reqwest::Client;
use std::sync::Arc;

use crate::config::{Config, Provider};
use crate::error::{DashboardError, Result};
use crate::models::{DateRange, TickerSeries};
use crate::services::alpha_vantage::AlphaVantageClient;
use crate::services::twelve_data::TwelveDataClient;
use crate::services::yahoo::YahooClient;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Market-data collaborator the dashboard pulls prices from.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Daily closes for `symbol` with dates inside `range`.
    ///
    /// Fails with `DashboardError::Fetch` on transport errors and for
    /// symbols the provider does not know.
    async fn history(&self, symbol: &str, range: DateRange) -> Result<TickerSeries>;

    /// Current regular-market price. `Ok(None)` means the provider knows the
    /// symbol but reports no price; unknown symbols fail with
    /// `DashboardError::UnknownTicker`.
    async fn latest_price(&self, symbol: &str) -> Result<Option<f64>>;
}

/// Builds the client for the configured provider.
pub fn from_config(config: &Config) -> Result<Arc<dyn PriceSource>> {
    info!("Using {} for market data", config.provider);
    let source: Arc<dyn PriceSource> = match config.provider {
        Provider::Yahoo => Arc::new(YahooClient::new(config)?),
        Provider::AlphaVantage => Arc::new(AlphaVantageClient::new(config)?),
        Provider::TwelveData => Arc::new(TwelveDataClient::new(config)?),
    };
    Ok(source)
}

pub(crate) fn http_client(config: &Config) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(config.request_timeout)
        .build()
        .map_err(|e| DashboardError::Config(format!("failed to build HTTP client: {}", e)))
}

/// History fetches report unknown symbols as fetch failures.
pub(crate) fn not_found_as_fetch(err: DashboardError) -> DashboardError {
    match err {
        DashboardError::UnknownTicker { symbol } => DashboardError::Fetch {
            symbol,
            message: "ticker not found".to_string(),
        },
        other => other,
    }
}

/// API key for a provider that needs one.
pub(crate) fn require_key(key: &Option<String>, var: &str) -> Result<String> {
    key.clone()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| DashboardError::Config(format!("{} must be set for this provider", var)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyed_providers_need_a_key() {
        let config = Config {
            provider: Provider::TwelveData,
            ..Config::default()
        };
        assert!(matches!(from_config(&config), Err(DashboardError::Config(_))));

        let config = Config {
            provider: Provider::AlphaVantage,
            alpha_vantage_key: Some("demo".into()),
            ..Config::default()
        };
        assert!(from_config(&config).is_ok());
        assert!(from_config(&Config::default()).is_ok());
    }

    #[test]
    fn unknown_symbols_become_fetch_errors() {
        let err = not_found_as_fetch(DashboardError::UnknownTicker { symbol: "NOPE".into() });
        assert_eq!(err, DashboardError::fetch("NOPE", "ticker not found"));
    }
}
