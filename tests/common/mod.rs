#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use asset_tracker::error::{DashboardError, Result};
use asset_tracker::models::{DateRange, PricePoint, TickerSeries};
use asset_tracker::services::source::PriceSource;

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[derive(Clone)]
struct MockTicker {
    history: Result<Vec<PricePoint>>,
    latest: Result<Option<f64>>,
}

/// In-memory provider; symbols it was not told about are unknown.
#[derive(Default)]
pub struct MockSource {
    tickers: HashMap<String, MockTicker>,
    pub history_calls: AtomicUsize,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Daily prices starting at `start`, one per calendar day, skipping
    /// weekends unless `weekends` is set.
    pub fn with_daily(self, symbol: &str, start: NaiveDate, prices: &[f64], weekends: bool) -> Self {
        let mut points = Vec::new();
        let mut date = start;
        for &price in prices {
            if !weekends {
                while chrono::Datelike::weekday(&date).number_from_monday() > 5 {
                    date += Duration::days(1);
                }
            }
            points.push(PricePoint::new(date, price));
            date += Duration::days(1);
        }
        let last = prices.last().copied();
        self.with_points(symbol, points, Ok(last))
    }

    pub fn with_points(mut self, symbol: &str, points: Vec<PricePoint>, latest: Result<Option<f64>>) -> Self {
        self.tickers.insert(
            symbol.to_string(),
            MockTicker {
                history: Ok(points),
                latest,
            },
        );
        self
    }

    pub fn with_latest(mut self, symbol: &str, latest: Result<Option<f64>>) -> Self {
        if let Some(ticker) = self.tickers.get_mut(symbol) {
            ticker.latest = latest;
        }
        self
    }

    pub fn with_history_error(mut self, symbol: &str, message: &str) -> Self {
        self.tickers.insert(
            symbol.to_string(),
            MockTicker {
                history: Err(DashboardError::fetch(symbol, message)),
                latest: Ok(Some(1.0)),
            },
        );
        self
    }
}

#[async_trait]
impl PriceSource for MockSource {
    async fn history(&self, symbol: &str, range: DateRange) -> Result<TickerSeries> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        let ticker = self
            .tickers
            .get(symbol)
            .ok_or_else(|| DashboardError::fetch(symbol, "ticker not found"))?;
        let points = ticker.history.clone()?;
        let points = points.into_iter().filter(|p| range.contains(p.date)).collect();
        Ok(TickerSeries::new(symbol, points))
    }

    async fn latest_price(&self, symbol: &str) -> Result<Option<f64>> {
        match self.tickers.get(symbol) {
            Some(ticker) => ticker.latest.clone(),
            None => Err(DashboardError::UnknownTicker {
                symbol: symbol.to_string(),
            }),
        }
    }
}
