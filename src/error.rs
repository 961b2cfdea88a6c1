// src/error.rs
use chrono::NaiveDate;
use thiserror::Error;

/// Failures of the comparison pipeline. Everything except `InvalidRange`,
/// `InvalidRequest` and `Config` is scoped to a single ticker.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DashboardError {
    #[error("no trading days between {start} and {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("unknown ticker: {symbol}")]
    UnknownTicker { symbol: String },

    #[error("not enough price history for {symbol} ({observations} observation(s))")]
    InsufficientData { symbol: String, observations: usize },

    #[error("invalid baseline price for {symbol}")]
    InvalidBaseline { symbol: String },

    #[error("failed to fetch {symbol}: {message}")]
    Fetch { symbol: String, message: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl DashboardError {
    pub fn fetch(symbol: impl Into<String>, message: impl Into<String>) -> Self {
        DashboardError::Fetch {
            symbol: symbol.into(),
            message: message.into(),
        }
    }

    /// Short machine-readable tag used in notices and error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            DashboardError::InvalidRange { .. } => "invalid_range",
            DashboardError::UnknownTicker { .. } => "unknown_ticker",
            DashboardError::InsufficientData { .. } => "insufficient_data",
            DashboardError::InvalidBaseline { .. } => "invalid_baseline",
            DashboardError::Fetch { .. } => "fetch",
            DashboardError::InvalidRequest(_) => "invalid_request",
            DashboardError::Config(_) => "config",
        }
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_symbol() {
        let err = DashboardError::UnknownTicker { symbol: "ZZZZ".into() };
        assert_eq!(err.to_string(), "unknown ticker: ZZZZ");
        assert_eq!(err.kind(), "unknown_ticker");

        let err = DashboardError::fetch("SPY", "timeout");
        assert_eq!(err.to_string(), "failed to fetch SPY: timeout");
    }
}
