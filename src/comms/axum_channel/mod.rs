//! Axum HTTP channel serving the WallMatch JSON API.
//!
//! ```text
//! GET  /api/health
//! GET  /api/categories
//! GET  /api/colors
//! POST /api/match        (JSON or multipart)
//! ```
//!
//! The caller's [`CancellationToken`] is wired to axum's graceful shutdown.

mod api;
mod errors;

pub use errors::ApiError;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use crate::compositor::Compositor;
use crate::core::config::{HttpConfig, VocabularyConfig};
use crate::core::error::AppError;
use crate::matcher::Matcher;

const CORS_MAX_AGE: Duration = Duration::from_secs(3600);

// ── Shared request state ──────────────────────────────────────────────────────

/// Router state injected into every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub matcher: Arc<Matcher>,
    pub compositor: Arc<Compositor>,
    pub vocabulary: Arc<VocabularyConfig>,
}

// ── Server loop ───────────────────────────────────────────────────────────────

/// Bind `http.bind` and serve until `shutdown` is cancelled.
pub async fn serve(
    http: &HttpConfig,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let listener = TcpListener::bind(&http.bind)
        .await
        .map_err(|e| AppError::Server(format!("bind failed on {}: {e}", http.bind)))?;
    serve_on(listener, build_router(state, http), shutdown).await
}

/// Serve `router` on an already-bound listener.
pub async fn serve_on(
    listener: TcpListener,
    router: Router,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let addr = listener
        .local_addr()
        .map_err(|e| AppError::Server(format!("listener address unavailable: {e}")))?;
    info!(%addr, "http api listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| AppError::Server(format!("axum server error: {e}")))?;

    info!(%addr, "http api shut down");
    Ok(())
}

// ── Router ────────────────────────────────────────────────────────────────────

pub fn build_router(state: AppState, http: &HttpConfig) -> Router {
    Router::new()
        .route("/api/health",     get(api::health))
        .route("/api/categories", get(api::categories))
        .route("/api/colors",     get(api::colors))
        .route("/api/match",      post(api::match_artworks))
        .layer(DefaultBodyLimit::max(http.max_upload_bytes))
        .layer(cors_layer(&http.allowed_origins))
        .with_state(state)
}

/// CORS for the configured origins; an empty list allows any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(CORS_MAX_AGE);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}
