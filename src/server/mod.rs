//! # HTTP Server for Label Export
//!
//! JSON API the admin console calls to produce label PDFs.
//!
//! ## Usage
//!
//! ```bash
//! regalia-labels serve --listen 127.0.0.1:3001 --config labels.json
//! ```
//!
//! ## Routes
//!
//! | Method | Path | Response |
//! |--------|------|----------|
//! | GET | `/api/presets` | paper catalog |
//! | POST | `/api/export` | `application/pdf` attachment, 409 while another export runs |
//! | GET | `/api/export/status` | `{ "in_progress": bool, "state": {...}, "uptime_secs": n }` |

mod handlers;
mod state;

pub use state::{AppState, ServerConfig};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::LabelError;
use crate::export::Exporter;

/// Record lists for a full ceremony can be large.
const MAX_EXPORT_BODY: usize = 16 * 1024 * 1024;

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/presets", get(handlers::presets::list))
        .route(
            "/api/export",
            post(handlers::export::export).layer(DefaultBodyLimit::max(MAX_EXPORT_BODY)),
        )
        .route("/api/export/status", get(handlers::export::status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use regalia_labels::config::LabelConfig;
/// use regalia_labels::server::{serve, ServerConfig};
///
/// # async fn example() -> Result<(), regalia_labels::LabelError> {
/// let exporter = LabelConfig::default().build_exporter()?;
/// let config = ServerConfig {
///     listen_addr: "127.0.0.1:3001".to_string(),
/// };
///
/// serve(config, exporter).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig, exporter: Exporter) -> Result<(), LabelError> {
    let app = router(Arc::new(AppState::new(exporter)));

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| LabelError::Config(format!("Failed to bind to {}: {}", config.listen_addr, e)))?;

    info!(addr = %config.listen_addr, "label export server listening");

    axum::serve(listener, app).await?;
    Ok(())
}
