// src/handlers/mod.rs
use std::sync::Arc;

use crate::config::Config;
use crate::services::calendar::TradingCalendar;
use crate::services::source::PriceSource;

pub mod compare;
pub mod error;
pub mod status;
pub mod tickers;

/// Read-only pieces every handler needs. Nothing here changes between
/// refreshes.
pub struct AppState {
    pub config: Config,
    pub calendar: TradingCalendar,
    pub source: Arc<dyn PriceSource>,
}

impl AppState {
    pub fn new(config: Config, calendar: TradingCalendar, source: Arc<dyn PriceSource>) -> Self {
        AppState {
            config,
            calendar,
            source,
        }
    }

    pub fn now(&self) -> chrono::DateTime<chrono_tz::Tz> {
        chrono::Utc::now().with_timezone(&self.config.local_tz)
    }
}
