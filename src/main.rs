use anyhow::Context;
use asset_tracker::config::Config;
use asset_tracker::handlers::AppState;
use asset_tracker::routes;
use asset_tracker::services::source;
use dotenv::dotenv;
use log::info;
use std::net::SocketAddr;
use std::sync::Arc;
use warp::Filter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Initialize the logger
    env_logger::init();
    info!("Logger initialized. Starting the application...");

    let config = Config::from_env()?;
    let calendar = config.calendar()?;
    let source = source::from_config(&config).context("failed to set up price source")?;

    // Bind to 0.0.0.0 so the dashboard frontend can reach us from anywhere
    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    info!("Will bind to: {}", addr);

    // Set up CORS
    let cors = warp::cors()
        .allow_any_origin()
        .allow_header("content-type")
        .allow_methods(vec!["GET"]);

    let state = Arc::new(AppState::new(config, calendar, source));

    // Set up routes
    let api = routes::routes(state).with(cors);
    info!("Routes configured successfully with CORS.");

    // Start the server
    info!("Starting server on {}", addr);
    warp::serve(api).run(addr).await;

    Ok(())
}
