// src/routes.rs
use std::convert::Infallible;
use std::sync::Arc;
use log::info;
use warp::http::StatusCode;
use warp::reject::Rejection;
use warp::{Filter, Reply};

use crate::handlers::compare::{get_comparison, CompareQuery};
use crate::handlers::error::ApiError;
use crate::handlers::status::{get_health, get_ranges};
use crate::handlers::tickers::{list_tickers, validate};
use crate::handlers::AppState;

// Add recovery handling for our custom errors
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let code;
    let message;

    if err.is_not_found() {
        code = StatusCode::NOT_FOUND;
        message = "Not Found".to_string();
    } else if let Some(api_error) = err.find::<ApiError>() {
        code = api_error.status;
        message = api_error.message.clone();
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        code = StatusCode::BAD_REQUEST;
        message = e.to_string();
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        code = StatusCode::METHOD_NOT_ALLOWED;
        message = "Method Not Allowed".to_string();
    } else {
        code = StatusCode::INTERNAL_SERVER_ERROR;
        message = "Internal Server Error".to_string();
    }

    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({
            "error": message,
        })),
        code,
    ))
}

pub fn routes(state: Arc<AppState>) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    info!("Configuring routes...");

    let state_filter = warp::any().map(move || state.clone());

    let compare_route = warp::path!("api" / "v1" / "compare")
        .and(warp::get())
        .and(warp::query::<CompareQuery>())
        .and(state_filter.clone())
        .and_then(get_comparison);

    let tickers_route = warp::path!("api" / "v1" / "tickers")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(list_tickers);

    let validate_route = warp::path!("api" / "v1" / "tickers" / String / "validate")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(validate);

    let ranges_route = warp::path!("api" / "v1" / "ranges")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_ranges);

    let health_route = warp::path!("api" / "v1" / "health")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_health);

    info!("All routes configured successfully.");

    compare_route
        .or(tickers_route)
        .or(validate_route)
        .or(ranges_route)
        .or(health_route)
        .recover(handle_rejection)
}
