use axum::http::HeaderValue;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod aptos;
mod api;
mod bills;
mod config;
mod constants;
mod db;
mod error;
mod models;
mod services;
mod wallet;

use config::Config;
use constants::API_VERSION;
use db::Database;
use services::AutopayScheduler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pulse_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("Starting Pulse Backend Server");
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("API Version: {}", API_VERSION);
    if config.is_testnet() {
        tracing::info!("Aptos network: testnet ({})", config.aptos_node_url);
    }

    // Initialize database
    let db = Database::new(&config).await?;

    // Run migrations
    tracing::info!("Running database migrations...");
    db.run_migrations().await?;

    // Cron entry point: report today's AutoPay bills and exit.
    if services::is_env_flag_enabled("RUN_AUTOPAY_SCHEDULER_ONCE") {
        let scheduler = AutopayScheduler::new(db.clone());
        let scheduled = scheduler.run_once(chrono::Utc::now().date_naive()).await?;
        tracing::info!("AutoPay scheduler run complete ({} bills)", scheduled.len());
        return Ok(());
    }

    // Start background services
    let mut background = services::start_background_services(db.clone(), config.clone()).await?;

    let app_state = api::AppState {
        db: db.clone(),
        config: config.clone(),
        dashboard: background.dashboard.clone(),
    };

    // Build router
    let app = build_router(app_state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    background.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}

fn build_router(state: api::AppState) -> Router {
    // CORS configuration
    let cors = cors_from_config(&state.config);

    Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        // AutoPay store
        .route("/api/autopay", post(api::autopay::create_autopay_bill))
        .route(
            "/api/autopay/due/{user_address}",
            get(api::autopay::get_due_bills),
        )
        .route(
            "/api/autopay/reconcile",
            post(api::bills::reconcile_autopay),
        )
        .route(
            "/api/autopay/{user_address}",
            get(api::autopay::list_autopay_bills),
        )
        // Dashboard
        .route(
            "/api/bills",
            get(api::bills::list_bills).post(api::bills::add_bill),
        )
        .route("/api/bills/autopay", get(api::bills::autopay_bills))
        .route("/api/bills/pay-all", post(api::bills::pay_all))
        .route(
            "/api/bills/{bill_id}/autopay",
            post(api::bills::enable_autopay),
        )
        .route("/api/bills/{bill_id}/paid", post(api::bills::mark_paid))
        .route(
            "/api/bills/{bill_id}/transactions",
            get(api::bills::bill_transactions),
        )
        .route("/api/funds/lock", post(api::bills::lock_funds))
        .route("/api/profile", get(api::bills::profile))
        // Notifications
        .route(
            "/api/notifications",
            get(api::notifications::list).delete(api::notifications::clear),
        )
        .route(
            "/api/notifications/read-all",
            post(api::notifications::mark_all_read),
        )
        .route(
            "/api/notifications/{id}/read",
            post(api::notifications::mark_read),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_from_config(config: &Config) -> CorsLayer {
    let raw = config.cors_allowed_origins.trim();
    if raw.is_empty() || raw == "*" {
        return CorsLayer::very_permissive();
    }

    let allowed: Vec<HeaderValue> = raw
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    if allowed.is_empty() {
        tracing::warn!("No valid CORS origins parsed; falling back to permissive");
        return CorsLayer::very_permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

