//! HTTP API.
//!
//! Exposes issue listing and migration over JSON. Every request carries its
//! own credentials; the server only holds shared tuning settings.

mod error;
mod handlers;

pub use error::{ApiError, ServerError};
pub use handlers::IssueView;

use crate::config::ServerConfig;
use crate::runner::RunnerConfig;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub runner: RunnerConfig,
    /// Cancelled when the server shuts down; running migrations stop starting new issues.
    pub shutdown: CancellationToken,
}

impl AppState {
    #[must_use]
    pub fn new(runner: RunnerConfig, shutdown: CancellationToken) -> Self {
        Self { runner, shutdown }
    }
}

/// Builds the API router.
///
/// # Errors
///
/// Returns [`ServerError::InvalidOrigin`] if a CORS origin is not a valid header value.
pub fn router(state: AppState, cors_origins: &[String]) -> Result<Router, ServerError> {
    Ok(Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/github/issues", post(handlers::list_github_issues))
        .route("/api/gitlab/issues", post(handlers::list_gitlab_issues))
        .route("/api/migrate", post(handlers::migrate))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins)?)
        .with_state(Arc::new(state)))
}

fn cors_layer(origins: &[String]) -> Result<CorsLayer, ServerError> {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let values = origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin)
                    .map_err(|_| ServerError::InvalidOrigin(origin.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(values)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ORIGIN]))
}

/// Serves the API until `shutdown` is cancelled.
///
/// # Errors
///
/// Returns [`ServerError`] if the address cannot be bound or serving fails.
pub async fn serve(config: &ServerConfig, shutdown: CancellationToken) -> Result<(), ServerError> {
    let state = AppState::new(RunnerConfig::from(config), shutdown.clone());
    let app = router(state, &config.cors_origins)?;

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .map_err(|e| ServerError::Bind {
            addr: config.bind.clone(),
            source: e,
        })?;
    info!(addr = %config.bind, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("Server stopped");
    Ok(())
}
