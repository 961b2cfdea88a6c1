// src/handlers/status.rs
use log::{error, info};
use serde::Serialize;
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use super::error::ApiError;
use super::AppState;
use crate::models::RangeOption;

/// Symbol used to check that the provider answers at all.
const PROBE_SYMBOL: &str = "SPY";

#[derive(Serialize)]
struct RangeEntry {
    code: &'static str,
    label: &'static str,
    days: i64,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    probe: &'static str,
    price: f64,
    checked_at: String,
}

pub async fn get_ranges(state: Arc<AppState>) -> Result<Json, Rejection> {
    let today = state.now().date_naive();
    let ranges: Vec<RangeEntry> = RangeOption::ALL
        .into_iter()
        .map(|r| RangeEntry {
            code: r.code(),
            label: r.label(),
            days: r.days_back(today),
        })
        .collect();
    Ok(warp::reply::json(&ranges))
}

pub async fn get_health(state: Arc<AppState>) -> Result<Json, Rejection> {
    info!("Checking provider connectivity with {}", PROBE_SYMBOL);
    let now = state.now();

    match state.source.latest_price(PROBE_SYMBOL).await {
        Ok(Some(price)) => Ok(warp::reply::json(&HealthResponse {
            status: "ok",
            probe: PROBE_SYMBOL,
            price,
            checked_at: now.format("%Y-%m-%d %H:%M:%S %Z").to_string(),
        })),
        Ok(None) => {
            error!("No data from provider for {}. Possible rate limiting.", PROBE_SYMBOL);
            Err(warp::reject::custom(ApiError::external_error(
                "No data from Yahoo Finance. Possible rate limiting. Please try again later.",
            )))
        }
        Err(e) => {
            error!("Data connection error: {}", e);
            Err(warp::reject::custom(ApiError::external_error(format!(
                "Data connection error: {}",
                e
            ))))
        }
    }
}
