// src/handlers/compare.rs
use chrono::{Datelike, NaiveDate};
use log::{error, info};
use serde::Deserialize;
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use super::error::ApiError;
use super::AppState;
use crate::config::{split_list, Config};
use crate::error::{DashboardError, Result};
use crate::models::{ChartView, CompareRequest, DateRange, RangeOption};
use crate::services::dashboard::refresh;

#[derive(Debug, Default, Deserialize)]
pub struct CompareQuery {
    pub tickers: Option<String>,
    pub range: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub view: Option<String>,
}

/// Years a request may name; providers have nothing outside them.
const YEARS: std::ops::RangeInclusive<i32> = 1900..=2999;

fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
    let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        DashboardError::InvalidRequest(format!("{} must be YYYY-MM-DD, got '{}'", field, value.trim()))
    })?;
    if !YEARS.contains(&date.year()) {
        return Err(DashboardError::InvalidRequest(format!(
            "{} must fall between {} and {}",
            field,
            YEARS.start(),
            YEARS.end()
        )));
    }
    Ok(date)
}

/// Turns query parameters into a request object. Explicit `start`/`end` win
/// over a `range` preset; without either the one-week preset is used.
pub fn build_request(query: &CompareQuery, config: &Config, today: NaiveDate) -> Result<CompareRequest> {
    let tickers = match &query.tickers {
        Some(list) => split_list(list),
        None => config.default_selection.clone(),
    };

    let range = match (&query.start, &query.end) {
        (Some(start), end) => {
            let start = parse_date("start", start)?;
            let end = match end {
                Some(end) => parse_date("end", end)?,
                None => today,
            };
            DateRange::new(start, end)?
        }
        (None, Some(_)) => {
            return Err(DashboardError::InvalidRequest(
                "end requires start".to_string(),
            ))
        }
        (None, None) => {
            let option = match &query.range {
                Some(code) => code.parse::<RangeOption>()?,
                None => RangeOption::OneWeek,
            };
            option.to_range(today)
        }
    };

    let view = match &query.view {
        Some(view) => view.parse::<ChartView>()?,
        None => ChartView::default(),
    };

    Ok(CompareRequest {
        tickers,
        range,
        view,
    })
}

pub async fn get_comparison(query: CompareQuery, state: Arc<AppState>) -> std::result::Result<Json, Rejection> {
    info!("Handling comparison request: {:?}", query);
    let now = state.now();

    let request = build_request(&query, &state.config, now.date_naive())
        .map_err(|e| warp::reject::custom(ApiError::from(e)))?;

    match refresh(
        state.source.as_ref(),
        &state.calendar,
        &request,
        now,
        state.config.fetch_delay,
    )
    .await
    {
        Ok(response) => Ok(warp::reply::json(&response)),
        Err(e) => {
            error!("Comparison failed: {}", e);
            Err(warp::reject::custom(ApiError::from(e)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Baseline;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()
    }

    #[test]
    fn defaults_come_from_config() {
        let request = build_request(&CompareQuery::default(), &Config::default(), today()).unwrap();
        assert_eq!(request.tickers, vec!["SPY", "BTC-USD", "EFA"]);
        assert_eq!(request.range.end, today());
        assert_eq!(request.range.start, NaiveDate::from_ymd_opt(2024, 6, 7).unwrap());
        assert_eq!(request.view, ChartView::Normalized(Baseline::Percent));
    }

    #[test]
    fn explicit_dates_win_over_range() {
        let query = CompareQuery {
            tickers: Some("qqq,eth-usd".into()),
            range: Some("5Y".into()),
            start: Some("2024-01-06".into()),
            end: Some("2024-01-31".into()),
            view: Some("price".into()),
        };
        let request = build_request(&query, &Config::default(), today()).unwrap();
        assert_eq!(request.tickers, vec!["QQQ", "ETH-USD"]);
        assert_eq!(request.range.start, NaiveDate::from_ymd_opt(2024, 1, 6).unwrap());
        assert_eq!(request.view, ChartView::Price);
    }

    #[test]
    fn rejects_bad_input() {
        let bad_date = CompareQuery {
            start: Some("06/01/2024".into()),
            ..Default::default()
        };
        assert!(build_request(&bad_date, &Config::default(), today()).is_err());

        let end_only = CompareQuery {
            end: Some("2024-01-31".into()),
            ..Default::default()
        };
        assert!(build_request(&end_only, &Config::default(), today()).is_err());

        let inverted = CompareQuery {
            start: Some("2024-02-01".into()),
            end: Some("2024-01-01".into()),
            ..Default::default()
        };
        assert!(matches!(
            build_request(&inverted, &Config::default(), today()),
            Err(DashboardError::InvalidRange { .. })
        ));
    }

    #[test]
    fn rejects_dates_outside_supported_years() {
        let far = CompareQuery {
            start: Some("2024-01-02".into()),
            end: Some("+262142-12-31".into()),
            ..Default::default()
        };
        assert!(matches!(
            build_request(&far, &Config::default(), today()),
            Err(DashboardError::InvalidRequest(_))
        ));

        let early = CompareQuery {
            start: Some("1899-12-29".into()),
            ..Default::default()
        };
        assert!(build_request(&early, &Config::default(), today()).is_err());
    }
}
