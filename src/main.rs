use crate::api::AppState;
use crate::config::{Config, PREFETCH_THRESHOLDS, REFRESH_INTERVAL};
use crate::domain::StrategyRegistry;
use crate::error::Result;
use crate::infrastructure::PageFetcher;
use crate::services::{Aggregator, RefreshScheduler, ResultCache, ScrapingService};
use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;
use tracing::info;

mod api;
mod config;
mod domain;
mod error;
mod infrastructure;
mod logging;
mod services;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::new()?;
    let _log_guard = logging::init(&config.args.log_level, &config.args.log_file)?;

    let registry = Arc::new(StrategyRegistry::new());
    info!("Loaded {} strategies", registry.len());

    let fetcher = Arc::new(PageFetcher::new(config.http_client.clone(), &config.fetch));
    let scraping = Arc::new(ScrapingService::new(
        registry.clone(),
        fetcher,
        config.fetch.page_delay,
    ));
    let aggregator = Aggregator::new(registry, scraping);
    let cache = Arc::new(ResultCache::new(aggregator, PREFETCH_THRESHOLDS.to_vec()));

    let scheduler = RefreshScheduler::start(cache.clone(), REFRESH_INTERVAL);
    let state = web::Data::new(AppState::new(cache, scheduler.handle()));

    let (host, port) = config.bind_address();
    info!("Starting API on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(api::json_config())
            .wrap(api::cors())
            .wrap(middleware::Logger::default())
            .configure(api::configure)
    })
    .bind((host, port))?
    .run()
    .await?;

    scheduler.shutdown();
    info!("Server stopped");
    Ok(())
}
