// src/services/twelve_data.rs
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use log::{debug, error, info};
use reqwest::Client;
use serde::Deserialize;

use crate::config::Config;
use crate::error::{DashboardError, Result};
use crate::models::{DateRange, PricePoint, TickerSeries};
use crate::services::live_patch::is_crypto;
use crate::services::source::{http_client, not_found_as_fetch, require_key, PriceSource};

/// Largest page the time_series endpoint serves.
const MAX_OUTPUT_SIZE: &str = "5000";

/// Twelve Data client. Crypto pairs use the `BASE/QUOTE` form.
pub struct TwelveDataClient {
    client: Client,
    base_url: String,
    api_key: String,
}

/// Error envelope shared by every endpoint.
#[derive(Debug, Default, Deserialize)]
struct Status {
    status: Option<String>,
    code: Option<u16>,
    message: Option<String>,
}

impl Status {
    fn check(&self, symbol: &str) -> Result<()> {
        if self.status.as_deref() != Some("error") {
            return Ok(());
        }
        let message = self.message.clone().unwrap_or_default();
        let lowered = message.to_ascii_lowercase();
        match self.code {
            Some(400) | Some(404) if lowered.contains("symbol") || lowered.contains("not found") => {
                Err(DashboardError::UnknownTicker {
                    symbol: symbol.to_string(),
                })
            }
            code => Err(DashboardError::fetch(
                symbol,
                format!("provider error {}: {}", code.unwrap_or_default(), message),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TimeSeriesResponse {
    #[serde(flatten)]
    status: Status,
    #[serde(default)]
    values: Vec<TimeSeriesValue>,
}

#[derive(Debug, Deserialize)]
struct TimeSeriesValue {
    datetime: String,
    close: String,
}

#[derive(Debug, Deserialize)]
struct PriceResponse {
    #[serde(flatten)]
    status: Status,
    price: Option<String>,
}

impl TwelveDataClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(TwelveDataClient {
            client: http_client(config)?,
            base_url: config.twelve_data_base_url.trim_end_matches('/').to_string(),
            api_key: require_key(&config.twelve_data_key, "TWELVE_DATA_API_KEY")?,
        })
    }

    async fn get(&self, endpoint: &str, symbol: &str, params: &[(&str, String)]) -> Result<String> {
        let url = format!("{}/{}", self.base_url, endpoint);
        info!("Fetching Twelve Data {} for {}", endpoint, symbol);
        debug!("Twelve Data query for {}: {:?}", symbol, params);

        let resp = self
            .client
            .get(&url)
            .query(&[("symbol", provider_symbol(symbol))])
            .query(params)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                error!("Twelve Data request for {} failed: {}", symbol, e);
                DashboardError::fetch(symbol, e.to_string())
            })?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| DashboardError::fetch(symbol, e.to_string()))?;
        // errors usually come back as 200 with an error envelope
        if !status.is_success() && !body.contains("\"status\"") {
            error!("Twelve Data returned {} for {}", status, symbol);
            return Err(DashboardError::fetch(symbol, format!("provider returned status {}", status)));
        }
        Ok(body)
    }
}

/// `BTC-USD` becomes `BTC/USD`; other symbols pass through.
pub fn provider_symbol(symbol: &str) -> String {
    match symbol.rsplit_once('-') {
        Some((base, quote)) if is_crypto(symbol) => format!("{}/{}", base, quote),
        _ => symbol.to_string(),
    }
}

pub(crate) fn parse_time_series(symbol: &str, body: &str, range: DateRange) -> Result<TickerSeries> {
    let parsed: TimeSeriesResponse = serde_json::from_str(body)
        .map_err(|e| DashboardError::fetch(symbol, format!("unreadable time series: {}", e)))?;
    parsed.status.check(symbol)?;

    let points = parsed
        .values
        .iter()
        .filter_map(|v| {
            // intraday stamps carry a time after the date
            let date = NaiveDate::parse_from_str(v.datetime.get(..10)?, "%Y-%m-%d").ok()?;
            let price: f64 = v.close.trim().parse().ok()?;
            range.contains(date).then(|| PricePoint::new(date, price))
        })
        .collect();

    Ok(TickerSeries::new(symbol, points))
}

pub(crate) fn parse_price(symbol: &str, body: &str) -> Result<Option<f64>> {
    let parsed: PriceResponse = serde_json::from_str(body)
        .map_err(|e| DashboardError::fetch(symbol, format!("unreadable price: {}", e)))?;
    parsed.status.check(symbol)?;
    Ok(parsed.price.and_then(|p| p.trim().parse().ok()))
}

#[async_trait]
impl PriceSource for TwelveDataClient {
    async fn history(&self, symbol: &str, range: DateRange) -> Result<TickerSeries> {
        // end_date is exclusive for daily bars
        let until = range
            .end
            .checked_add_signed(Duration::days(1))
            .unwrap_or(range.end);
        let params = [
            ("interval", "1day".to_string()),
            ("start_date", range.start.format("%Y-%m-%d").to_string()),
            ("end_date", until.format("%Y-%m-%d").to_string()),
            ("outputsize", MAX_OUTPUT_SIZE.to_string()),
        ];

        let body = self
            .get("time_series", symbol, &params)
            .await
            .map_err(not_found_as_fetch)?;
        let series = parse_time_series(symbol, &body, range).map_err(not_found_as_fetch)?;
        info!("Fetched {} daily closes for {}", series.len(), symbol);
        Ok(series)
    }

    async fn latest_price(&self, symbol: &str) -> Result<Option<f64>> {
        let body = self.get("price", symbol, &[]).await?;
        parse_price(symbol, &body)
    }
}
