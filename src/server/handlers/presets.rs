//! Paper preset API handlers.

use axum::Json;
use serde::Serialize;

use crate::preset::{ClampPolicy, Orientation, PaperKey, PaperPreset};

/// What the console needs to render the paper picker.
#[derive(Debug, Serialize)]
pub struct PresetSummary {
    pub key: PaperKey,
    pub name: &'static str,
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub orientation: Orientation,
    pub labels_per_page: usize,
    pub clamp: ClampPolicy,
    pub default: bool,
}

impl From<&PaperPreset> for PresetSummary {
    fn from(preset: &PaperPreset) -> Self {
        Self {
            key: preset.key,
            name: preset.name,
            page_width_mm: preset.page_width_mm,
            page_height_mm: preset.page_height_mm,
            orientation: preset.orientation(),
            labels_per_page: preset.labels_per_page(),
            clamp: preset.clamp,
            default: preset.key == PaperPreset::default().key,
        }
    }
}

/// GET /api/presets - List the paper catalog.
pub async fn list() -> Json<Vec<PresetSummary>> {
    Json(PaperPreset::catalog().iter().map(PresetSummary::from).collect())
}
