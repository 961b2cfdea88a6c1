// src/services/dashboard.rs
use chrono::DateTime;
use chrono_tz::Tz;
use log::{info, warn};
use std::time::Duration;

use crate::error::{DashboardError, Result};
use crate::models::{
    ChartSeries, ChartView, CompareRequest, CompareResponse, TickerNotice, TickerSeries,
};
use crate::services::calendar::TradingCalendar;
use crate::services::chart::{baseline_rule, month_boundaries, y_axis_title};
use crate::services::live_patch::patch_live_price;
use crate::services::normalizer::{align, normalize_column};
use crate::services::source::PriceSource;
use crate::services::validator::{is_valid_ticker, normalize_symbol};

/// Runs one dashboard refresh: validate, adjust dates, fetch, live-patch,
/// align and normalize. Ticker-level failures end up in `notices`; only an
/// unusable request or date range fails the whole refresh.
pub async fn refresh(
    source: &dyn PriceSource,
    calendar: &TradingCalendar,
    request: &CompareRequest,
    now: DateTime<Tz>,
    fetch_delay: Duration,
) -> Result<CompareResponse> {
    if request.tickers.is_empty() {
        return Err(DashboardError::InvalidRequest(
            "please select at least one ticker".to_string(),
        ));
    }

    let adjusted = calendar.adjust_range(request.range.start, request.range.end)?;
    let patch_live = request.range.end >= now.date_naive();
    info!(
        "Refreshing {:?} over {}..{} (requested {}..{})",
        request.tickers, adjusted.start, adjusted.end, request.range.start, request.range.end
    );

    let mut notices = Vec::new();
    let mut fetched: Vec<(TickerSeries, bool)> = Vec::new();

    for (i, raw) in request.tickers.iter().enumerate() {
        if i > 0 && !fetch_delay.is_zero() {
            tokio::time::sleep(fetch_delay).await;
        }

        let symbol = match normalize_symbol(raw) {
            Ok(symbol) => symbol,
            Err(e) => {
                warn!("Skipping '{}': {}", raw, e);
                notices.push(TickerNotice::from_error(raw.trim(), &e));
                continue;
            }
        };
        if fetched.iter().any(|(s, _)| s.symbol() == symbol) {
            continue;
        }

        // an inconclusive lookup still lets the history fetch decide
        if let Err(e) = is_valid_ticker(source, &symbol).await {
            warn!("Invalid Ticker: {}", symbol);
            notices.push(TickerNotice::from_error(&symbol, &e));
            continue;
        }

        let series = match source.history(&symbol, adjusted).await {
            Ok(series) => series,
            Err(e) => {
                warn!("Excluding {}: {}", symbol, e);
                notices.push(TickerNotice::from_error(&symbol, &e));
                continue;
            }
        };

        if patch_live {
            fetched.push(patch_live_price(source, series, now).await);
        } else {
            fetched.push((series, false));
        }
    }

    let all_series: Vec<TickerSeries> = fetched.iter().map(|(s, _)| s.clone()).collect();
    let frame = align(&all_series, adjusted.start);

    let mut series = Vec::with_capacity(frame.columns.len());
    for (column, (_, live_patched)) in frame.columns.iter().zip(&fetched) {
        let points = match request.view {
            ChartView::Price => {
                let points = frame.points(column);
                if points.is_empty() {
                    Err(DashboardError::InsufficientData {
                        symbol: column.symbol.clone(),
                        observations: 0,
                    })
                } else {
                    Ok(points)
                }
            }
            ChartView::Normalized(baseline) => {
                normalize_column(&frame.dates, column, baseline).map(|n| n.points)
            }
        };

        match points {
            Ok(points) => series.push(ChartSeries {
                symbol: column.symbol.clone(),
                live_patched: *live_patched,
                points,
            }),
            Err(e) => {
                warn!("Excluding {}: {}", column.symbol, e);
                notices.push(TickerNotice::from_error(&column.symbol, &e));
            }
        }
    }

    info!("Refresh done: {} series, {} notices", series.len(), notices.len());
    Ok(CompareResponse {
        view: request.view,
        y_axis_title: y_axis_title(request.view),
        requested: request.range,
        adjusted,
        boundaries: month_boundaries(&series),
        series,
        baseline_rule: baseline_rule(request.view),
        notices,
        last_updated: now.format("%Y-%m-%d %H:%M:%S %Z").to_string(),
    })
}
