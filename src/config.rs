// src/config.rs
use anyhow::{Context, Result};
use chrono_tz::Tz;
use log::{info, warn};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::services::calendar::TradingCalendar;

pub const DEFAULT_TICKERS: &[&str] = &[
    "SPY", "BTC-USD", "ETH-USD", "DX-Y.NYB", "GC=F", "SOL-USD", "EFA", "QQQ", "STRK",
];
pub const DEFAULT_SELECTION: &[&str] = &["SPY", "BTC-USD", "EFA"];

/// Alpha Vantage's free tier allows about five calls a minute.
const ALPHA_VANTAGE_DELAY: Duration = Duration::from_secs(2);

/// Market-data backends the dashboard can pull from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    #[default]
    Yahoo,
    AlphaVantage,
    TwelveData,
}

impl FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "yahoo" | "yfinance" => Ok(Provider::Yahoo),
            "alpha_vantage" | "alphavantage" => Ok(Provider::AlphaVantage),
            "twelve_data" | "twelvedata" => Ok(Provider::TwelveData),
            other => Err(anyhow::anyhow!("unknown provider '{}'", other)),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Provider::Yahoo => "Yahoo Finance",
            Provider::AlphaVantage => "Alpha Vantage",
            Provider::TwelveData => "Twelve Data",
        };
        write!(f, "{}", name)
    }
}

/// Runtime settings, read from the environment (and `.env` via dotenv).
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub local_tz: Tz,
    pub provider: Provider,
    pub yahoo_base_url: String,
    pub alpha_vantage_base_url: String,
    pub alpha_vantage_key: Option<String>,
    pub twelve_data_base_url: String,
    pub twelve_data_key: Option<String>,
    pub request_timeout: Duration,
    pub fetch_delay: Duration,
    pub holidays_file: Option<PathBuf>,
    pub tickers: Vec<String>,
    pub default_selection: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 3030,
            local_tz: Tz::UTC,
            provider: Provider::Yahoo,
            yahoo_base_url: "https://query1.finance.yahoo.com".to_string(),
            alpha_vantage_base_url: "https://www.alphavantage.co".to_string(),
            alpha_vantage_key: None,
            twelve_data_base_url: "https://api.twelvedata.com".to_string(),
            twelve_data_key: None,
            request_timeout: Duration::from_secs(10),
            fetch_delay: Duration::ZERO,
            holidays_file: None,
            tickers: DEFAULT_TICKERS.iter().map(|s| s.to_string()).collect(),
            default_selection: DEFAULT_SELECTION.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        match lookup("PORT") {
            Some(port) => {
                config.port = port.trim().parse().context("PORT must be a number")?;
            }
            None => warn!("$PORT not set, defaulting to {}", config.port),
        }

        // The viewer's zone. TZ is only a hint since it may hold a POSIX value.
        if let Some(tz) = lookup("LOCAL_TZ") {
            config.local_tz = tz
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid time zone '{}': {}", tz.trim(), e))?;
        } else if let Some(tz) = lookup("TZ") {
            match tz.trim().parse() {
                Ok(zone) => config.local_tz = zone,
                Err(e) => warn!("Ignoring TZ '{}' ({}), using {}", tz.trim(), e, config.local_tz),
            }
        }

        if let Some(provider) = lookup("PROVIDER") {
            config.provider = provider.parse()?;
        }

        if let Some(url) = lookup("YAHOO_BASE_URL") {
            config.yahoo_base_url = url.trim().to_string();
        }
        if let Some(url) = lookup("ALPHA_VANTAGE_BASE_URL") {
            config.alpha_vantage_base_url = url.trim().to_string();
        }
        if let Some(url) = lookup("TWELVE_DATA_BASE_URL") {
            config.twelve_data_base_url = url.trim().to_string();
        }
        config.alpha_vantage_key = lookup("ALPHA_VANTAGE_API_KEY").map(|k| k.trim().to_string());
        config.twelve_data_key = lookup("TWELVE_DATA_API_KEY").map(|k| k.trim().to_string());

        if let Some(secs) = lookup("REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().context("REQUEST_TIMEOUT_SECS must be a number")?;
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Some(ms) = lookup("FETCH_DELAY_MS") {
            let ms: u64 = ms.trim().parse().context("FETCH_DELAY_MS must be a number")?;
            config.fetch_delay = Duration::from_millis(ms);
        } else if config.provider == Provider::AlphaVantage {
            config.fetch_delay = ALPHA_VANTAGE_DELAY;
        }

        config.holidays_file = lookup("HOLIDAYS_FILE")
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        if let Some(list) = lookup("TICKERS") {
            config.tickers = split_list(&list);
        }
        if let Some(list) = lookup("DEFAULT_TICKERS") {
            config.default_selection = split_list(&list);
        }

        info!(
            "Config: port={} tz={} provider={} timeout={:?} delay={:?}",
            config.port, config.local_tz, config.provider, config.request_timeout, config.fetch_delay
        );
        Ok(config)
    }

    pub fn calendar(&self) -> Result<TradingCalendar> {
        let calendar = TradingCalendar::nyse();
        match &self.holidays_file {
            Some(path) => calendar
                .load_holidays_csv(path)
                .with_context(|| format!("failed to load holidays from {}", path.display())),
            None => Ok(calendar),
        }
    }
}

pub fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_ascii_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 3030);
        assert_eq!(config.local_tz, Tz::UTC);
        assert_eq!(config.provider, Provider::Yahoo);
        assert_eq!(config.default_selection, vec!["SPY", "BTC-USD", "EFA"]);
        assert!(config.holidays_file.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("TZ", "America/Chicago"),
            ("FETCH_DELAY_MS", "250"),
            ("DEFAULT_TICKERS", "qqq, btc-usd ,"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.local_tz, chrono_tz::America::Chicago);
        assert_eq!(config.fetch_delay, Duration::from_millis(250));
        assert_eq!(config.default_selection, vec!["QQQ", "BTC-USD"]);
    }

    #[test]
    fn local_tz_wins_over_tz() {
        let config =
            Config::from_lookup(lookup(&[("TZ", "UTC"), ("LOCAL_TZ", "Europe/London")])).unwrap();
        assert_eq!(config.local_tz, chrono_tz::Europe::London);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Config::from_lookup(lookup(&[("PORT", "http")])).is_err());
        assert!(Config::from_lookup(lookup(&[("LOCAL_TZ", "Mars/Olympus")])).is_err());
    }

    #[test]
    fn provider_selection() {
        let config = Config::from_lookup(lookup(&[
            ("PROVIDER", "alpha-vantage"),
            ("ALPHA_VANTAGE_API_KEY", " demo "),
        ]))
        .unwrap();
        assert_eq!(config.provider, Provider::AlphaVantage);
        assert_eq!(config.alpha_vantage_key.as_deref(), Some("demo"));
        assert_eq!(config.fetch_delay, Duration::from_secs(2));

        let config = Config::from_lookup(lookup(&[
            ("PROVIDER", "twelvedata"),
            ("FETCH_DELAY_MS", "0"),
        ]))
        .unwrap();
        assert_eq!(config.provider, Provider::TwelveData);
        assert_eq!(config.fetch_delay, Duration::ZERO);

        assert!(Config::from_lookup(lookup(&[("PROVIDER", "bloomberg")])).is_err());
    }

    #[test]
    fn posix_tz_falls_back_to_utc() {
        let config = Config::from_lookup(lookup(&[("TZ", ":/etc/localtime")])).unwrap();
        assert_eq!(config.local_tz, Tz::UTC);
    }
}
