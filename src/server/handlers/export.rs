//! Export API handlers.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::sync::Arc;

use crate::error::ExportError;
use crate::export::{ExportOutcome, ExportRequest, ExportStatus};

use super::super::state::AppState;

/// POST /api/export - Run an export and return the PDF.
///
/// Responds with the document as an attachment, a JSON
/// `{"status": "nothing_to_export"}` for empty input, or an error body.
pub async fn export(State(state): State<Arc<AppState>>, Json(req): Json<ExportRequest>) -> Response {
    match state.exporter.export(req).await {
        Ok(ExportOutcome::Document(doc)) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/pdf".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", doc.filename),
                ),
                (header::HeaderName::from_static("x-export-pages"), doc.page_count.to_string()),
                (header::HeaderName::from_static("x-export-cards"), doc.card_count.to_string()),
            ],
            doc.bytes,
        )
            .into_response(),
        Ok(ExportOutcome::NothingToExport) => {
            (StatusCode::OK, Json(ExportStatus::NothingToExport)).into_response()
        }
        Err(e) => error_response(&e),
    }
}

/// GET /api/export/status - Current exporter state.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "in_progress": state.exporter.in_progress(),
        "state": state.exporter.status(),
        "uptime_secs": state.uptime_secs(),
    }))
}

pub(crate) fn error_response(e: &ExportError) -> Response {
    let code = match e {
        ExportError::Busy => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (code, Json(json!({ "error": e.user_message() }))).into_response()
}
