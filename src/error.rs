//! # Error Types
//!
//! This module defines error types used throughout the label export library.
//! Each pipeline stage has its own error enum; [`LabelError`] wraps them for
//! callers that only care that something went wrong.

use thiserror::Error;

/// Main error type for label export operations
#[derive(Debug, Error)]
pub enum LabelError {
    /// Invalid configuration file or value
    #[error("Config error: {0}")]
    Config(String),

    /// Resource loading or decoding error (logos, fonts)
    #[error("Image error: {0}")]
    Image(String),

    /// Malformed input records
    #[error("Input error: {0}")]
    Input(String),

    /// The export pipeline failed
    #[error(transparent)]
    Export(#[from] ExportError),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while turning a mounted page into a bitmap.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// A color the capture backend cannot paint reached the resolver.
    #[error("Unsupported color '{value}' on '{selector}'")]
    UnsupportedColor { selector: String, value: String },

    /// Capture was requested without a mounted page.
    #[error("Render surface is empty")]
    EmptySurface,

    /// The requested bitmap would have no pixels.
    #[error("Bitmap would be {width}x{height} pixels")]
    EmptyBitmap { width: u32, height: u32 },

    /// The scale factor is not a positive finite number within the maximum.
    #[error("Invalid capture scale {0}")]
    InvalidScale(f32),

    /// Backend-specific failure.
    #[error("Capture backend failed: {0}")]
    Backend(String),
}

/// Errors raised while assembling bitmaps into a PDF document.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("Cannot place an empty {width}x{height} bitmap")]
    EmptyBitmap { width: u32, height: u32 },

    #[error("Invalid page size {width_mm}x{height_mm} mm")]
    InvalidPageSize { width_mm: f32, height_mm: f32 },

    #[error("Document has no pages")]
    NoPages,

    #[error("Image compression failed: {0}")]
    Compression(#[from] std::io::Error),

    #[error("PDF write failed: {0}")]
    Pdf(#[from] lopdf::Error),
}

/// Errors surfaced by the export orchestrator.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Another export currently owns the render surface.
    #[error("An export is already in progress")]
    Busy,

    #[error("Page {page} capture failed: {source}")]
    Capture {
        page: usize,
        #[source]
        source: CaptureError,
    },

    #[error("Page {page} composition failed: {source}")]
    Compose {
        page: usize,
        #[source]
        source: ComposeError,
    },

    #[error("Finalizing document failed: {0}")]
    Finalize(#[source] ComposeError),
}

impl ExportError {
    /// Short message suitable for showing next to the export button.
    pub fn user_message(&self) -> String {
        match self {
            ExportError::Busy => "Another export is still running. Try again when it finishes.".to_string(),
            ExportError::Capture { page, .. } => {
                format!("Could not render page {} of the labels. No PDF was produced.", page)
            }
            ExportError::Compose { page, .. } => {
                format!("Could not add page {} to the PDF. No PDF was produced.", page)
            }
            ExportError::Finalize(_) => "Could not finish the PDF. No PDF was produced.".to_string(),
        }
    }
}
