//! Server state and configuration.

use chrono::{DateTime, Utc};

use crate::export::Exporter;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "127.0.0.1:3001")
    pub listen_addr: String,
}

/// Application state shared across handlers.
pub struct AppState {
    /// The one exporter; it serializes jobs on its render surface.
    pub exporter: Exporter,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(exporter: Exporter) -> Self {
        Self {
            exporter,
            started_at: Utc::now(),
        }
    }

    /// Whole seconds since the server started.
    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
