// src/services/yahoo.rs
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use log::{debug, error, info};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::config::Config;
use crate::error::{DashboardError, Result};
use crate::models::{DateRange, PricePoint, TickerSeries};
use crate::services::source::{http_client, not_found_as_fetch, PriceSource};

/// Yahoo Finance v8 chart API client.
pub struct YahooClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChartResult {
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
    exchange_timezone_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteIndicator>,
}

#[derive(Debug, Deserialize)]
struct QuoteIndicator {
    close: Option<Vec<Option<f64>>>,
}

impl YahooClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(YahooClient {
            client: http_client(config)?,
            base_url: config.yahoo_base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn chart(&self, symbol: &str, query: &[(&str, String)]) -> Result<ChartResult> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        info!("Fetching Yahoo chart for {}", symbol);
        debug!("Yahoo chart query for {}: {:?}", symbol, query);

        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                error!("Yahoo request for {} failed: {}", symbol, e);
                DashboardError::fetch(symbol, e.to_string())
            })?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| DashboardError::fetch(symbol, e.to_string()))?;

        if status == StatusCode::NOT_FOUND {
            return Err(DashboardError::UnknownTicker {
                symbol: symbol.to_string(),
            });
        }
        if !status.is_success() && status != StatusCode::BAD_REQUEST {
            error!("Yahoo returned {} for {}", status, symbol);
            return Err(DashboardError::fetch(symbol, format!("provider returned status {}", status)));
        }

        parse_chart(symbol, &body)
    }
}

/// Extracts the first chart result, mapping provider-level errors.
pub(crate) fn parse_chart(symbol: &str, body: &str) -> Result<ChartResult> {
    let parsed: ChartResponse = serde_json::from_str(body)
        .map_err(|e| DashboardError::fetch(symbol, format!("unreadable chart payload: {}", e)))?;

    if let Some(err) = parsed.chart.error {
        let code = err.code.unwrap_or_default();
        let description = err.description.unwrap_or_default();
        if code.eq_ignore_ascii_case("Not Found") {
            return Err(DashboardError::UnknownTicker {
                symbol: symbol.to_string(),
            });
        }
        return Err(DashboardError::fetch(symbol, format!("{}: {}", code, description)));
    }

    parsed
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| DashboardError::fetch(symbol, "empty chart result"))
}

/// Daily closes of a chart result, dated in the exchange's time zone and
/// limited to `range`.
pub(crate) fn closes(symbol: &str, result: &ChartResult, range: DateRange) -> TickerSeries {
    let tz: Tz = result
        .meta
        .exchange_timezone_name
        .as_deref()
        .and_then(|name| name.parse().ok())
        .unwrap_or(Tz::UTC);

    let timestamps = result.timestamp.as_deref().unwrap_or(&[]);
    let closes = result
        .indicators
        .as_ref()
        .and_then(|i| i.quote.first())
        .and_then(|q| q.close.as_deref())
        .unwrap_or(&[]);

    let points = timestamps
        .iter()
        .zip(closes)
        .filter_map(|(&ts, close)| {
            let price = (*close)?;
            let date = DateTime::<Utc>::from_timestamp(ts, 0)?
                .with_timezone(&tz)
                .date_naive();
            range.contains(date).then(|| PricePoint::new(date, price))
        })
        .collect();

    TickerSeries::new(symbol, points)
}

fn unix_midnight(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

fn history_query(range: DateRange) -> [(&'static str, String); 3] {
    // period2 is exclusive; pad a day for exchanges west of UTC
    let until = range
        .end
        .checked_add_signed(Duration::days(2))
        .unwrap_or(NaiveDate::MAX);
    [
        ("period1", unix_midnight(range.start).to_string()),
        ("period2", unix_midnight(until).to_string()),
        ("interval", "1d".to_string()),
    ]
}

#[async_trait]
impl PriceSource for YahooClient {
    async fn history(&self, symbol: &str, range: DateRange) -> Result<TickerSeries> {
        let query = history_query(range);
        let result = self.chart(symbol, &query).await.map_err(not_found_as_fetch)?;

        let series = closes(symbol, &result, range);
        info!("Fetched {} daily closes for {}", series.len(), symbol);
        Ok(series)
    }

    async fn latest_price(&self, symbol: &str) -> Result<Option<f64>> {
        let query = [("range", "1d".to_string()), ("interval", "1d".to_string())];
        let result = self.chart(symbol, &query).await?;
        Ok(result.meta.regular_market_price)
    }
}
