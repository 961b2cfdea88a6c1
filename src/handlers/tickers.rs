// src/handlers/tickers.rs
use log::{error, info};
use serde::Serialize;
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use super::error::ApiError;
use super::AppState;
use crate::services::validator::validate_ticker;

#[derive(Serialize)]
struct TickerListResponse<'a> {
    tickers: &'a [String],
    default_selection: &'a [String],
}

#[derive(Serialize)]
struct ValidationResponse {
    symbol: String,
    valid: bool,
}

pub async fn list_tickers(state: Arc<AppState>) -> Result<Json, Rejection> {
    Ok(warp::reply::json(&TickerListResponse {
        tickers: &state.config.tickers,
        default_selection: &state.config.default_selection,
    }))
}

pub async fn validate(symbol: String, state: Arc<AppState>) -> Result<Json, Rejection> {
    info!("Handling request to validate ticker {}", symbol);

    match validate_ticker(state.source.as_ref(), &symbol).await {
        Ok(symbol) => Ok(warp::reply::json(&ValidationResponse { symbol, valid: true })),
        Err(e) => {
            error!("Ticker validation failed: {}", e);
            Err(warp::reject::custom(ApiError::from(e)))
        }
    }
}
