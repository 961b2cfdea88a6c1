// src/models.rs
use chrono::{DateTime, Datelike, Duration, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{DashboardError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        PricePoint { date, price }
    }
}

/// Daily closing prices for one ticker, ascending by date with unique dates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

impl TickerSeries {
    /// Sorts by date, keeps the last price seen for a repeated date and drops
    /// non-finite prices.
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Self {
        let mut points: Vec<PricePoint> = points
            .into_iter()
            .filter(|p| p.price.is_finite())
            .collect();
        // stable sort keeps provider order within a date, so the later one wins
        points.sort_by_key(|p| p.date);
        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }

        TickerSeries {
            symbol: symbol.into(),
            points: deduped,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Returns a copy with `point` placed on its date: it replaces a close for
    /// the same date, otherwise it is inserted. Bars dated later are kept.
    pub fn with_latest(&self, point: PricePoint) -> Self {
        let mut points = self.points.clone();
        // pushed last so it wins the dedup in `new`
        points.push(point);
        TickerSeries::new(self.symbol.clone(), points)
    }
}

/// Inclusive calendar date range with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(DashboardError::InvalidRange { start, end });
        }
        Ok(DateRange { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Reference value given to the first observation of a normalized series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Baseline {
    /// First value is 100, later values are `p / p0 * 100`.
    Index100,
    /// First value is 0, later values are the percent change from `p0`.
    Percent,
}

impl Baseline {
    pub fn origin(self) -> f64 {
        match self {
            Baseline::Index100 => 100.0,
            Baseline::Percent => 0.0,
        }
    }

    /// Value of `price` relative to `base`. Multiplying before dividing keeps
    /// round figures exact.
    pub fn scale(self, price: f64, base: f64) -> f64 {
        match self {
            Baseline::Index100 => price * 100.0 / base,
            Baseline::Percent => (price - base) * 100.0 / base,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartView {
    Price,
    Normalized(Baseline),
}

impl Default for ChartView {
    fn default() -> Self {
        ChartView::Normalized(Baseline::Percent)
    }
}

impl FromStr for ChartView {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "price" => Ok(ChartView::Price),
            "percent" | "pct" | "normalized" => Ok(ChartView::Normalized(Baseline::Percent)),
            "index" | "index100" => Ok(ChartView::Normalized(Baseline::Index100)),
            other => Err(DashboardError::InvalidRequest(format!("unknown view '{}'", other))),
        }
    }
}

/// Lookback presets offered by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RangeOption {
    #[serde(rename = "1W")]
    OneWeek,
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "6M")]
    SixMonths,
    #[serde(rename = "YTD")]
    YearToDate,
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "3Y")]
    ThreeYears,
    #[serde(rename = "5Y")]
    FiveYears,
}

impl RangeOption {
    pub const ALL: [RangeOption; 8] = [
        RangeOption::OneWeek,
        RangeOption::OneMonth,
        RangeOption::ThreeMonths,
        RangeOption::SixMonths,
        RangeOption::YearToDate,
        RangeOption::OneYear,
        RangeOption::ThreeYears,
        RangeOption::FiveYears,
    ];

    pub fn code(self) -> &'static str {
        match self {
            RangeOption::OneWeek => "1W",
            RangeOption::OneMonth => "1M",
            RangeOption::ThreeMonths => "3M",
            RangeOption::SixMonths => "6M",
            RangeOption::YearToDate => "YTD",
            RangeOption::OneYear => "1Y",
            RangeOption::ThreeYears => "3Y",
            RangeOption::FiveYears => "5Y",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RangeOption::OneWeek => "1 Week",
            RangeOption::OneMonth => "1 Month",
            RangeOption::ThreeMonths => "3 Months",
            RangeOption::SixMonths => "6 Months",
            RangeOption::YearToDate => "YTD",
            RangeOption::OneYear => "1 Year",
            RangeOption::ThreeYears => "3 Years",
            RangeOption::FiveYears => "5 Years",
        }
    }

    /// Days back from `today`; YTD depends on the date itself.
    pub fn days_back(self, today: NaiveDate) -> i64 {
        match self {
            RangeOption::OneWeek => 7,
            RangeOption::OneMonth => 31,
            RangeOption::ThreeMonths => 93,
            RangeOption::SixMonths => 182,
            RangeOption::YearToDate => i64::from(today.ordinal0()),
            RangeOption::OneYear => 365,
            RangeOption::ThreeYears => 365 * 3,
            RangeOption::FiveYears => 365 * 5,
        }
    }

    /// Raw (unadjusted) range ending today.
    pub fn to_range(self, today: NaiveDate) -> DateRange {
        DateRange {
            start: today - Duration::days(self.days_back(today)),
            end: today,
        }
    }
}

impl FromStr for RangeOption {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_uppercase();
        RangeOption::ALL
            .into_iter()
            .find(|r| r.code() == wanted)
            .ok_or_else(|| DashboardError::InvalidRequest(format!("unknown range '{}'", s.trim())))
    }
}

impl fmt::Display for RangeOption {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedSeries {
    pub symbol: String,
    pub baseline: Baseline,
    pub points: Vec<SeriesPoint>,
}

impl NormalizedSeries {
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }
}

/// Real-time price for a 24/7 instrument, stamped in the viewer's time zone.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveQuote {
    pub symbol: String,
    pub price: f64,
    pub fetched_at: DateTime<Tz>,
}

/// Everything a single dashboard refresh needs. Built at the HTTP boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct CompareRequest {
    pub tickers: Vec<String>,
    pub range: DateRange,
    pub view: ChartView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub symbol: String,
    pub live_patched: bool,
    pub points: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Boundary {
    pub date: NaiveDate,
    pub label: String,
}

/// A ticker that was left out of the chart and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerNotice {
    pub symbol: String,
    pub kind: &'static str,
    pub message: String,
}

impl TickerNotice {
    pub fn from_error(symbol: impl Into<String>, err: &DashboardError) -> Self {
        TickerNotice {
            symbol: symbol.into(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompareResponse {
    pub view: ChartView,
    pub y_axis_title: &'static str,
    pub requested: DateRange,
    pub adjusted: DateRange,
    pub series: Vec<ChartSeries>,
    pub boundaries: Vec<Boundary>,
    pub baseline_rule: Option<f64>,
    pub notices: Vec<TickerNotice>,
    pub last_updated: String,
}
