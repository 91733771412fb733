//! Exporter configuration.
//!
//! Loaded from an optional JSON file; every field has a default, so `{}` is
//! a valid config. CLI flags override individual values after loading.
//!
//! ```json
//! {
//!   "scale": 2.0,
//!   "default_paper": "a4",
//!   "logo": "assets/letterhead.png",
//!   "footer": "If undelivered return to Regalia Hire, Unit 4, Mill Lane",
//!   "font": null,
//!   "listen_addr": "127.0.0.1:3001"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::LabelError;
use crate::export::Exporter;
use crate::preset::PaperKey;
use crate::raster::{DEFAULT_SCALE, MAX_SCALE, Rasterizer};
use crate::surface::style::console_theme;
use crate::surface::{ImageSource, RenderSurface, ResourceLoader, StyleRule, Typeface};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// Capture scale applied to every preset.
    pub scale: f32,
    /// Paper key used when a request names none or an unknown one.
    pub default_paper: String,
    /// Letterhead logo, file path or http(s) URL.
    pub logo: Option<String>,
    /// Text printed at the bottom of every card.
    pub footer: String,
    /// Optional TTF/OTF font replacing the built-in bitmap face.
    pub font: Option<PathBuf>,
    /// Host stylesheet rules that cascade into the render surface.
    pub theme: Vec<StyleRule>,
    pub listen_addr: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            default_paper: PaperKey::A4.as_str().to_string(),
            logo: None,
            footer: String::new(),
            font: None,
            theme: console_theme(),
            listen_addr: "127.0.0.1:3001".to_string(),
        }
    }
}

impl LabelConfig {
    pub fn from_file(path: &Path) -> Result<Self, LabelError> {
        let text = std::fs::read_to_string(path)?;
        let config: LabelConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, otherwise use defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, LabelError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), LabelError> {
        if !self.scale.is_finite() || self.scale <= 0.0 || self.scale > MAX_SCALE {
            return Err(LabelError::Config(format!(
                "scale must be a positive number no larger than {}, got {}",
                MAX_SCALE, self.scale
            )));
        }
        if PaperKey::parse(&self.default_paper).is_none() {
            return Err(LabelError::Config(format!(
                "unknown default_paper '{}'",
                self.default_paper
            )));
        }
        Ok(())
    }

    pub fn default_paper_key(&self) -> PaperKey {
        PaperKey::parse(&self.default_paper).unwrap_or(PaperKey::A4)
    }

    /// Build the exporter this config describes.
    pub fn build_exporter(&self) -> Result<Exporter, LabelError> {
        self.validate()?;

        let typeface = match &self.font {
            Some(path) => Typeface::from_file(path)?,
            None => Typeface::default(),
        };

        let surface = RenderSurface::new(Arc::new(ResourceLoader::new()?))
            .with_typeface(typeface)
            .with_theme(self.theme.clone())
            .with_logo(self.logo.as_deref().map(ImageSource::parse))
            .with_footer(self.footer.clone());

        let rasterizer = Rasterizer::new(self.scale).map_err(|e| LabelError::Config(e.to_string()))?;

        Ok(Exporter::new(surface, rasterizer).with_default_paper(self.default_paper_key()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_object_is_default() {
        let config: LabelConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, LabelConfig::default());
        assert_eq!(config.scale, 2.0);
        assert_eq!(config.default_paper_key(), PaperKey::A4);
    }

    #[test]
    fn test_from_file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.json");
        std::fs::write(
            &path,
            r#"{"scale": 3, "default_paper": "Small_Card", "footer": "Regalia Hire", "theme": []}"#,
        )
        .unwrap();

        let config = LabelConfig::from_file(&path).unwrap();
        assert_eq!(config.scale, 3.0);
        assert_eq!(config.default_paper_key(), PaperKey::SmallCard);
        assert_eq!(config.footer, "Regalia Hire");
        assert!(config.theme.is_empty());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad_scale = LabelConfig {
            scale: -1.0,
            ..Default::default()
        };
        assert!(matches!(bad_scale.validate(), Err(LabelError::Config(_))));

        let huge_scale = LabelConfig {
            scale: 2000.0,
            ..Default::default()
        };
        assert!(matches!(huge_scale.validate(), Err(LabelError::Config(_))));

        let bad_paper = LabelConfig {
            default_paper: "tabloid".to_string(),
            ..Default::default()
        };
        assert!(matches!(bad_paper.validate(), Err(LabelError::Config(_))));
    }

    #[test]
    fn test_malformed_file_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(LabelConfig::from_file(&path), Err(LabelError::Json(_))));
    }

    #[test]
    fn test_load_without_path() {
        assert_eq!(LabelConfig::load(None).unwrap(), LabelConfig::default());
    }

    #[tokio::test]
    async fn test_build_exporter() {
        let config = LabelConfig {
            default_paper: "worksheet".to_string(),
            ..Default::default()
        };
        let exporter = config.build_exporter().unwrap();
        assert!(!exporter.in_progress());
        assert_eq!(exporter.preset_for(None).key, PaperKey::Worksheet);
    }
}
