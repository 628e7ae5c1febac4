use anyhow::Result;
use std::time::Duration;

use emall_backend::services::{analytics, AnalyticsForwarder, RedisCache};
use emall_backend::{app, config, db, logging};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Logging first so configuration warnings are visible
    logging::init_logging(config::Environment::from_env());

    // Validate and load configuration
    let settings = config::Settings::from_env()?;

    tracing::info!(
        env = ?settings.env,
        server_addr = %settings.server_addr,
        "Starting E-Mall backend"
    );

    let pool = db::create_pool(&settings).await?;
    db::run_migrations(&pool).await?;

    // The cache is an optimisation; run without it rather than refuse to start
    let cache = match RedisCache::new(&settings.redis_url, settings.redis_cache_ttl_seconds).await {
        Ok(cache) => Some(cache),
        Err(e) => {
            tracing::warn!(error = %e, "Redis unavailable - serving without cache");
            None
        }
    };

    let http_client = analytics::build_http_client(Duration::from_secs(10))?;
    let forwarder = AnalyticsForwarder::from_settings(
        http_client,
        settings.ga_measurement_id.as_deref(),
        settings.ga_api_secret.as_deref(),
    );
    if forwarder.is_none() {
        tracing::info!("GA credentials not configured - analytics events will be logged only");
    }

    let state = app::AppState::new(pool, settings.clone(), cache, forwarder);
    let app = app::create_app(state);

    let listener = tokio::net::TcpListener::bind(&settings.server_addr).await?;
    tracing::info!("Listening on {}", settings.server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
