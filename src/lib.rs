//! # regalia-labels - Address Label PDF Export
//!
//! Turns order, ceremony, institution and internal-form records from the
//! regalia rental admin console into print-ready label sheets. It provides:
//!
//! - **Paper presets**: a fixed catalog of sheet formats (A4, A5, small cards, worksheet)
//! - **Projection**: backend JSON shapes collapsed onto one label record
//! - **Layout**: fixed-capacity pagination and single-record replication
//! - **Rendering**: an off-screen surface, a sanitizing rasterizer and a PDF composer
//! - **Orchestration**: one export at a time, with observable status
//!
//! ## Quick Start
//!
//! ```no_run
//! use regalia_labels::config::LabelConfig;
//! use regalia_labels::export::{ExportOutcome, ExportRequest};
//! use regalia_labels::record::RecordKind;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), regalia_labels::LabelError> {
//! let exporter = LabelConfig::default().build_exporter()?;
//!
//! let request = ExportRequest::records(
//!     RecordKind::Order,
//!     "a4",
//!     vec![json!({"foreName": "Ada", "surname": "Lovelace", "town": "London"})],
//! );
//!
//! if let ExportOutcome::Document(doc) = exporter.export(request).await? {
//!     std::fs::write(&doc.filename, &doc.bytes)?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`preset`] | Paper preset catalog |
//! | [`record`] | Record kinds and field projection |
//! | [`layout`] | Pagination and replication |
//! | [`surface`] | Off-screen render surface, styles, fonts, images |
//! | [`raster`] | Style sanitation and bitmap capture |
//! | [`pdf`] | Bitmap-to-PDF composition |
//! | [`export`] | Export orchestration and status |
//! | [`config`] | JSON configuration |
//! | [`server`] | HTTP API |
//! | [`error`] | Error types |

pub mod config;
pub mod error;
pub mod export;
pub mod layout;
pub mod pdf;
pub mod preset;
pub mod raster;
pub mod record;
pub mod server;
pub mod surface;

// Re-exports for convenience
pub use error::{CaptureError, ComposeError, ExportError, LabelError};
pub use export::{ExportOutcome, ExportRequest, ExportStatus, Exporter};
pub use preset::PaperPreset;
pub use record::{LabelRecord, RecordKind};
