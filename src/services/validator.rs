// src/services/validator.rs
use log::{info, warn};
use regex::Regex;
use std::sync::OnceLock;

use crate::error::{DashboardError, Result};
use crate::services::source::PriceSource;

fn symbol_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // e.g. SPY, BRK.B, BTC-USD, GC=F, DX-Y.NYB, ^GSPC
    PATTERN.get_or_init(|| Regex::new(r"^\^?[A-Z0-9][A-Z0-9.\-=]{0,14}$").expect("static regex"))
}

/// Trims and upper-cases user input, rejecting malformed symbols without a
/// provider call.
pub fn normalize_symbol(input: &str) -> Result<String> {
    let symbol = input.trim().to_ascii_uppercase();
    if symbol.is_empty() || symbol.len() > 15 || !symbol_pattern().is_match(&symbol) {
        return Err(DashboardError::UnknownTicker { symbol });
    }
    Ok(symbol)
}

/// Confirms the provider knows `input` and quotes a price for it.
/// Returns the normalized symbol.
pub async fn validate_ticker(source: &dyn PriceSource, input: &str) -> Result<String> {
    let symbol = normalize_symbol(input)?;
    match source.latest_price(&symbol).await? {
        Some(price) => {
            info!("Ticker {} is valid (last price {})", symbol, price);
            Ok(symbol)
        }
        None => {
            warn!("Ticker {} has no market price", symbol);
            Err(DashboardError::UnknownTicker { symbol })
        }
    }
}

/// Advisory check run before a full fetch. `Ok(false)` means the lookup
/// itself failed, so the ticker is neither confirmed nor ruled out.
pub async fn is_valid_ticker(source: &dyn PriceSource, input: &str) -> Result<bool> {
    match validate_ticker(source, input).await {
        Ok(_) => Ok(true),
        Err(e @ DashboardError::UnknownTicker { .. }) => Err(e),
        Err(e) => {
            warn!("Could not validate '{}': {}", input.trim(), e);
            Ok(false)
        }
    }
}
