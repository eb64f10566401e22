//! Dashboard REST API
//!
//! HTTP backend for the landscape dashboard, built with Axum. Every page is
//! served as a JSON view model; the client only draws.
//!
//! # Endpoints
//!
//! ## Session
//! - `POST /api/v1/login` - Log in (`{email, password, remember}`)
//! - `POST /api/v1/logout` - Log out and drop the dataset
//! - `GET /api/v1/session` - Login state, page, filters, selection
//! - `PUT /api/v1/session/page` - Switch pages (`{page}`)
//! - `POST /api/v1/session/back` - Leave a deep dive
//!
//! ## Pages
//! - `GET /api/v1/landscape/hcp` - HCP landscape
//! - `GET /api/v1/landscape/hco` - HCO landscape
//! - `GET /api/v1/map/accounts` - Account map (`?geojson=true` paints ZIP boundaries)
//! - `GET /api/v1/map/referrals` - Referral map
//! - `GET /api/v1/map/states` - State choropleth (`?geojson=true` paints boundaries)
//! - `GET /api/v1/hcp/:name` - HCP deep dive
//! - `GET /api/v1/hco/:mdm` - HCO deep dive
//!
//! Page endpoints take the filter query params `state`, `year`,
//! `territory`, `specialty` and `relationship` (`all|within|outside`), and
//! answer 401 until someone logs in.
//!
//! ## Cache
//! - `POST /api/v1/cache/refresh` - Refetch on the next request
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use sma_landscape::api::{serve, ApiConfig, AppState};
//! use sma_landscape::client::FileSource;
//! use sma_landscape::session::Credentials;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = Arc::new(FileSource::open(Path::new("dump.json"), None)?);
//!     let config = ApiConfig::default();
//!
//!     let state = AppState::in_memory(source, Credentials::default());
//!     serve(state, &config).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{
    http::HeaderValue,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Session routes
        .route("/login", post(routes::auth::login))
        .route("/logout", post(routes::auth::logout))
        .route("/session", get(routes::session::get_session))
        .route("/session/page", put(routes::session::set_page))
        .route("/session/back", post(routes::session::back))
        // Landscape routes
        .route("/landscape/hcp", get(routes::landscape::hcp_landscape))
        .route("/landscape/hco", get(routes::landscape::hco_landscape))
        // Map routes
        .route("/map/accounts", get(routes::maps::account_map))
        .route("/map/referrals", get(routes::maps::referral_map))
        .route("/map/states", get(routes::maps::state_map))
        // Deep dive routes
        .route("/hcp/:name", get(routes::deep_dive::hcp_deep_dive))
        .route("/hco/:mdm", get(routes::deep_dive::hco_deep_dive))
        // Cache routes
        .route("/cache/refresh", post(routes::cache::refresh));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let cors = cors_layer(&state.config.cors_origins);
    let timeout_secs = state.config.request_timeout_secs;

    // Create shared state
    let shared_state = Arc::new(state);

    let router = Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes);

    let router = if timeout_secs > 0 {
        router.layer(TimeoutLayer::new(Duration::from_secs(timeout_secs)))
    } else {
        router
    };

    router
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// Any origin when none are configured
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::permissive().allow_origin(AllowOrigin::list(allowed))
    }
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Landscape API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Landscape API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
