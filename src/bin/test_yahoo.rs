// src/bin/test_yahoo.rs
use asset_tracker::config::{split_list, Config};
use asset_tracker::models::{ChartView, CompareRequest, RangeOption};
use asset_tracker::services::dashboard::refresh;
use asset_tracker::services::yahoo::YahooClient;
use chrono::Utc;
use dotenv::dotenv;
use log::{error, info};
use std::env;

/// Usage: test_yahoo [TICKERS] [RANGE]
/// e.g. `test_yahoo SPY,BTC-USD,EFA 3M`
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;
    let calendar = config.calendar()?;
    let source = YahooClient::new(&config)?;

    let mut args = env::args().skip(1);
    let tickers = args
        .next()
        .map(|list| split_list(&list))
        .unwrap_or_else(|| config.default_selection.clone());
    let range: RangeOption = args.next().as_deref().unwrap_or("1M").parse()?;

    let now = Utc::now().with_timezone(&config.local_tz);
    let request = CompareRequest {
        tickers,
        range: range.to_range(now.date_naive()),
        view: ChartView::default(),
    };

    info!("Testing Yahoo Finance comparison for {:?} over {}...", request.tickers, range);

    match refresh(&source, &calendar, &request, now, config.fetch_delay).await {
        Ok(resp) => {
            println!("Adjusted range: {} .. {}", resp.adjusted.start, resp.adjusted.end);
            for series in &resp.series {
                if let Some(last) = series.points.last() {
                    println!(
                        "{:<10} {:>8.2}% on {}{}",
                        series.symbol,
                        last.value,
                        last.date,
                        if series.live_patched { " (live)" } else { "" }
                    );
                }
            }
            for notice in &resp.notices {
                println!("{:<10} skipped: {}", notice.symbol, notice.message);
            }
            println!("Last Updated: {}", resp.last_updated);
        }
        Err(e) => {
            error!("ERROR: comparison failed: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
