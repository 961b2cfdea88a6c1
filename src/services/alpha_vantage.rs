// src/services/alpha_vantage.rs
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use log::{debug, error, info};
use reqwest::Client;
use serde_json::{Map, Value};

use crate::config::Config;
use crate::error::{DashboardError, Result};
use crate::models::{DateRange, PricePoint, TickerSeries};
use crate::services::live_patch::is_crypto;
use crate::services::source::{http_client, not_found_as_fetch, require_key, PriceSource};

/// `outputsize=compact` returns the latest 100 bars, about this many days.
const COMPACT_DAYS: i64 = 140;

const GLOBAL_QUOTE: (&str, &str) = ("Global Quote", "05. price");
const EXCHANGE_RATE: (&str, &str) = ("Realtime Currency Exchange Rate", "5. Exchange Rate");

/// Alpha Vantage client: daily equity series plus digital-currency daily
/// series for `BASE-MARKET` pairs.
pub struct AlphaVantageClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl AlphaVantageClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(AlphaVantageClient {
            client: http_client(config)?,
            base_url: config.alpha_vantage_base_url.trim_end_matches('/').to_string(),
            api_key: require_key(&config.alpha_vantage_key, "ALPHA_VANTAGE_API_KEY")?,
        })
    }

    async fn query(&self, symbol: &str, params: &[(&str, &str)]) -> Result<String> {
        let url = format!("{}/query", self.base_url);
        info!("Fetching Alpha Vantage data for {}", symbol);
        debug!("Alpha Vantage query for {}: {:?}", symbol, params);

        let resp = self
            .client
            .get(&url)
            .query(params)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                error!("Alpha Vantage request for {} failed: {}", symbol, e);
                DashboardError::fetch(symbol, e.to_string())
            })?;

        let status = resp.status();
        if !status.is_success() {
            error!("Alpha Vantage returned {} for {}", status, symbol);
            return Err(DashboardError::fetch(symbol, format!("provider returned status {}", status)));
        }

        resp.text()
            .await
            .map_err(|e| DashboardError::fetch(symbol, e.to_string()))
    }
}

/// `BTC-USD` becomes `("BTC", "USD")`; equities have no pair.
fn crypto_pair(symbol: &str) -> Option<(&str, &str)> {
    if is_crypto(symbol) {
        symbol.rsplit_once('-')
    } else {
        None
    }
}

fn output_size(range: DateRange, today: NaiveDate) -> &'static str {
    if today.signed_duration_since(range.start).num_days() <= COMPACT_DAYS {
        "compact"
    } else {
        "full"
    }
}

/// Parses a payload, turning the errors Alpha Vantage reports in-band into ours.
fn parse_body(symbol: &str, body: &str) -> Result<Map<String, Value>> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| DashboardError::fetch(symbol, format!("unreadable payload: {}", e)))?;
    let Value::Object(fields) = value else {
        return Err(DashboardError::fetch(symbol, "unexpected payload"));
    };

    if fields.contains_key("Error Message") {
        return Err(DashboardError::UnknownTicker {
            symbol: symbol.to_string(),
        });
    }
    // rate limits and key problems arrive as 200s with a note
    if let Some(note) = fields
        .get("Note")
        .or_else(|| fields.get("Information"))
        .and_then(Value::as_str)
    {
        return Err(DashboardError::fetch(symbol, note));
    }
    Ok(fields)
}

fn number(value: &Value) -> Option<f64> {
    value.as_str()?.trim().parse().ok()
}

/// Daily closes from a `Time Series ...` payload, limited to `range`.
pub(crate) fn daily_closes(symbol: &str, body: &str, range: DateRange) -> Result<TickerSeries> {
    let fields = parse_body(symbol, body)?;
    let bars = fields
        .iter()
        .find(|(key, _)| key.starts_with("Time Series"))
        .and_then(|(_, bars)| bars.as_object())
        .ok_or_else(|| DashboardError::fetch(symbol, "no daily series in payload"))?;

    let points = bars
        .iter()
        .filter_map(|(day, bar)| {
            let date = NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()?;
            if !range.contains(date) {
                return None;
            }
            // older digital-currency payloads say "4a. close (USD)"
            let price = bar
                .as_object()?
                .iter()
                .find(|(name, _)| name.as_str() == "4. close" || name.starts_with("4a. close"))
                .and_then(|(_, close)| number(close))?;
            Some(PricePoint::new(date, price))
        })
        .collect();

    Ok(TickerSeries::new(symbol, points))
}

/// Price field of a quote payload. An empty section means the symbol is unknown.
pub(crate) fn quoted_price(symbol: &str, body: &str, (section, field): (&str, &str)) -> Result<Option<f64>> {
    let fields = parse_body(symbol, body)?;
    match fields.get(section).and_then(Value::as_object) {
        Some(quote) if !quote.is_empty() => Ok(quote.get(field).and_then(number)),
        _ => Err(DashboardError::UnknownTicker {
            symbol: symbol.to_string(),
        }),
    }
}

#[async_trait]
impl PriceSource for AlphaVantageClient {
    async fn history(&self, symbol: &str, range: DateRange) -> Result<TickerSeries> {
        let body = match crypto_pair(symbol) {
            Some((base, market)) => {
                self.query(
                    symbol,
                    &[("function", "DIGITAL_CURRENCY_DAILY"), ("symbol", base), ("market", market)],
                )
                .await
            }
            None => {
                let size = output_size(range, Utc::now().date_naive());
                self.query(
                    symbol,
                    &[("function", "TIME_SERIES_DAILY"), ("symbol", symbol), ("outputsize", size)],
                )
                .await
            }
        }
        .map_err(not_found_as_fetch)?;

        let series = daily_closes(symbol, &body, range).map_err(not_found_as_fetch)?;
        info!("Fetched {} daily closes for {}", series.len(), symbol);
        Ok(series)
    }

    async fn latest_price(&self, symbol: &str) -> Result<Option<f64>> {
        match crypto_pair(symbol) {
            Some((base, market)) => {
                let params = [
                    ("function", "CURRENCY_EXCHANGE_RATE"),
                    ("from_currency", base),
                    ("to_currency", market),
                ];
                let body = self.query(symbol, &params).await?;
                quoted_price(symbol, &body, EXCHANGE_RATE)
            }
            None => {
                let body = self
                    .query(symbol, &[("function", "GLOBAL_QUOTE"), ("symbol", symbol)])
                    .await?;
                quoted_price(symbol, &body, GLOBAL_QUOTE)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPY_DAILY: &str = r#"{
        "Meta Data": {
            "1. Information": "Daily Prices (open, high, low, close) and Volumes",
            "2. Symbol": "SPY",
            "5. Time Zone": "US/Eastern"
        },
        "Time Series (Daily)": {
            "2024-01-05": {"1. open": "467.49", "4. close": "467.92", "5. volume": "86118913"},
            "2024-01-04": {"1. open": "468.30", "4. close": "467.28", "5. volume": "84232169"},
            "2024-01-03": {"1. open": "470.43", "4. close": "468.79", "5. volume": "103585849"},
            "2024-01-02": {"1. open": "476.25", "4. close": "472.65", "5. volume": "123623657"}
        }
    }"#;

    const BTC_DAILY: &str = r#"{
        "Meta Data": {"2. Digital Currency Code": "BTC", "4. Market Code": "USD"},
        "Time Series (Digital Currency Daily)": {
            "2024-01-07": {"1a. open (USD)": "43943.10", "4a. close (USD)": "43929.02"},
            "2024-01-06": {"1a. open (USD)": "44162.69", "4a. close (USD)": "43943.09"}
        }
    }"#;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn january() -> DateRange {
        DateRange::new(d(2024, 1, 1), d(2024, 1, 31)).unwrap()
    }

    #[test]
    fn parses_equity_closes_ascending() {
        let range = DateRange::new(d(2024, 1, 3), d(2024, 1, 5)).unwrap();
        let series = daily_closes("SPY", SPY_DAILY, range).unwrap();
        let closes: Vec<_> = series.points().iter().map(|p| (p.date, p.price)).collect();
        assert_eq!(
            closes,
            vec![(d(2024, 1, 3), 468.79), (d(2024, 1, 4), 467.28), (d(2024, 1, 5), 467.92)]
        );
    }

    #[test]
    fn parses_digital_currency_closes() {
        let series = daily_closes("BTC-USD", BTC_DAILY, january()).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.last().unwrap().price, 43929.02);
    }

    #[test]
    fn in_band_errors_are_mapped() {
        let unknown = r#"{"Error Message": "Invalid API call. Please retry or visit the documentation."}"#;
        assert_eq!(
            daily_closes("NOPE", unknown, january()).unwrap_err(),
            DashboardError::UnknownTicker { symbol: "NOPE".into() }
        );

        let throttled = r#"{"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute."}"#;
        assert!(matches!(
            daily_closes("SPY", throttled, january()),
            Err(DashboardError::Fetch { .. })
        ));
    }

    #[test]
    fn quotes() {
        let quote = r#"{"Global Quote": {"01. symbol": "SPY", "05. price": "472.6500"}}"#;
        assert_eq!(quoted_price("SPY", quote, GLOBAL_QUOTE).unwrap(), Some(472.65));

        let rate = r#"{"Realtime Currency Exchange Rate": {"1. From_Currency Code": "BTC", "5. Exchange Rate": "43001.50000000"}}"#;
        assert_eq!(quoted_price("BTC-USD", rate, EXCHANGE_RATE).unwrap(), Some(43001.5));

        let empty = r#"{"Global Quote": {}}"#;
        assert!(matches!(
            quoted_price("NOPE", empty, GLOBAL_QUOTE),
            Err(DashboardError::UnknownTicker { .. })
        ));
    }

    #[test]
    fn pairs_and_output_size() {
        assert_eq!(crypto_pair("ETH-USD"), Some(("ETH", "USD")));
        assert_eq!(crypto_pair("DX-Y.NYB"), None);
        assert_eq!(crypto_pair("SPY"), None);

        let today = d(2024, 6, 14);
        let recent = DateRange::new(d(2024, 5, 1), today).unwrap();
        let old = DateRange::new(d(2020, 1, 2), today).unwrap();
        assert_eq!(output_size(recent, today), "compact");
        assert_eq!(output_size(old, today), "full");
    }
}
