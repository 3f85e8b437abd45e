//! equifund - Investment & Secondary-Market Transaction Engine
//!
//! Backend API for an equity-crowdfunding platform: campaign lifecycle,
//! primary investments with cooling-off cancellation, and a secondary
//! marketplace for resale of completed investments.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{middleware, Router};
use sqlx::postgres::PgPoolOptions;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use equifund::api::{self, AppState};
use equifund::domain::TracingPublisher;
use equifund::engine::{
    CampaignEngine, InvestmentEngine, MarketplaceEngine, StandardInvestmentValidator,
    StandardMarketplacePolicy,
};
use equifund::store::PgStore;
use equifund::Config;

/// Initialize tracing/logging
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "equifund=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wire the engines to the Postgres-backed stores
fn build_state(store: Arc<PgStore>, config: &Config) -> AppState {
    let publisher = Arc::new(TracingPublisher);

    let campaigns = Arc::new(CampaignEngine::new(store.clone(), publisher.clone()));

    let investments = Arc::new(InvestmentEngine::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        Arc::new(StandardInvestmentValidator),
        publisher.clone(),
        config.cooling_off_hours,
    ));

    let marketplace = Arc::new(MarketplaceEngine::new(
        store.clone(),
        store.clone(),
        store,
        Arc::new(StandardMarketplacePolicy::new(
            config.min_holding_days,
            config.seller_fee_basis_points,
        )),
        publisher,
        config.listing_duration_days,
    ));

    AppState {
        campaigns,
        investments,
        marketplace,
    }
}

/// Build the application router
fn build_router(state: AppState) -> Router {
    // Axum layers are applied in reverse order (last added = first executed)
    let api_router = api::create_router()
        .layer(middleware::from_fn(api::middleware::context_middleware))
        .layer(middleware::from_fn(api::middleware::logging_middleware));

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .nest("/api/v1", api_router)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("Starting equifund server");
    tracing::info!("Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;

    equifund::db::verify_connection(&pool).await?;

    if !equifund::db::check_schema(&pool).await? {
        tracing::error!("Database schema is not complete. Please run migrations.");
        return Err(anyhow::anyhow!("Database schema incomplete"));
    }

    tracing::info!("Database connected successfully");
    tracing::info!("Listening on http://{}", addr);

    let state = build_state(Arc::new(PgStore::new(pool.clone())), &config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutting down...");
    pool.close().await;
    tracing::info!("Database connections closed. Goodbye!");

    Ok(())
}

/// Shutdown signal handler for graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}
