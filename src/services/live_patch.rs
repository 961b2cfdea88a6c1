// src/services/live_patch.rs
use chrono::DateTime;
use chrono_tz::Tz;
use log::{info, warn};

use crate::error::{DashboardError, Result};
use crate::models::{LiveQuote, PricePoint, TickerSeries};
use crate::services::source::PriceSource;

/// Quote legs that mark a `BASE-QUOTE` crypto pair.
const CRYPTO_QUOTES: &[&str] = &["USD", "USDT", "USDC", "EUR", "GBP", "BTC", "ETH"];

/// Crypto pairs trade around the clock, so their last daily close lags.
pub fn is_crypto(symbol: &str) -> bool {
    match symbol.rsplit_once('-') {
        Some((base, quote)) => !base.is_empty() && CRYPTO_QUOTES.contains(&quote),
        None => false,
    }
}

pub async fn fetch_live_quote(
    source: &dyn PriceSource,
    symbol: &str,
    now: DateTime<Tz>,
) -> Result<LiveQuote> {
    match source.latest_price(symbol).await? {
        Some(price) if price.is_finite() => Ok(LiveQuote {
            symbol: symbol.to_string(),
            price,
            fetched_at: now,
        }),
        _ => Err(DashboardError::fetch(symbol, "no live price")),
    }
}

/// Puts the live quote on the quote's local date: replaces that day's close or
/// appends a new point.
pub fn apply_quote(series: &TickerSeries, quote: &LiveQuote) -> TickerSeries {
    series.with_latest(PricePoint::new(quote.fetched_at.date_naive(), quote.price))
}

/// Overlays a live price on a crypto series. Any failure leaves the series as
/// fetched; the boolean says whether a patch happened.
pub async fn patch_live_price(
    source: &dyn PriceSource,
    series: TickerSeries,
    now: DateTime<Tz>,
) -> (TickerSeries, bool) {
    if !is_crypto(series.symbol()) {
        return (series, false);
    }

    match fetch_live_quote(source, series.symbol(), now).await {
        Ok(quote) => {
            info!(
                "Patched {} with live price {} at {}",
                quote.symbol,
                quote.price,
                quote.fetched_at.format("%Y-%m-%d %H:%M:%S %Z")
            );
            (apply_quote(&series, &quote), true)
        }
        Err(e) => {
            warn!("Error updating {} with real-time price: {}", series.symbol(), e);
            (series, false)
        }
    }
}
