use axum::http::HeaderValue;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod constants;
mod db;
mod error;
mod models;
mod pagination;
mod services;
mod utils;

use config::Config;
use constants::API_VERSION;
use db::Database;
use services::{InvitationService, SystemClock};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "church_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("Starting church backend server");
    tracing::info!("Environment: {}", config.environment);
    if config.is_development() {
        tracing::debug!(
            "Invitation limits: {} requests/day per tenant, {} retries/day per invitation (UTC{})",
            config.invitation_daily_request_limit,
            config.invitation_daily_retry_limit,
            config.rate_limit_utc_offset
        );
    }
    tracing::info!("API Version: {}", API_VERSION);

    // Initialize database
    let db = Database::new(&config).await?;

    if config.run_migrations {
        tracing::info!("Running database migrations...");
        db.run_migrations().await?;
    } else {
        tracing::warn!("Skipping database migrations (RUN_MIGRATIONS=false)");
    }

    if config.legacy_next_page_base_url.is_some() {
        tracing::info!("Legacy next-page URLs enabled for offset pagination");
    }

    let invitations = Arc::new(InvitationService::new(
        Arc::new(db.clone()),
        &config,
        Arc::new(SystemClock),
    ));
    let app_state = api::AppState {
        db,
        config: config.clone(),
        invitations,
    };

    let app = build_router(app_state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid listen address {}:{}: {}", config.host, config.port, e))?;

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: api::AppState) -> Router {
    let cors = cors_from_config(&state.config);

    Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        // Members
        .route("/api/v1/members", get(api::members::list_members))
        // Groups
        .route("/api/v1/groups", get(api::groups::list_groups))
        .route(
            "/api/v1/groups/{id}/children",
            get(api::groups::list_children),
        )
        // Invitations
        .route(
            "/api/v1/invitations",
            get(api::invitations::list_invitations).post(api::invitations::create_invitation),
        )
        .route(
            "/api/v1/invitations/{id}/retry",
            post(api::invitations::retry_invitation),
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
