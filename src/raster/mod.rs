//! # Rasterizer
//!
//! Turns a mounted page into a fixed-scale RGB bitmap.
//!
//! Every capture starts with a sanitation pass over the page's stylesheet:
//!
//! 1. inherited (host theme) rules are removed,
//! 2. scoped declarations with colors the backend cannot paint are dropped,
//! 3. a `*` rule forcing black ink, white fill and black borders is injected.
//!
//! Without it, an `oklch()` color from the console theme reaches the
//! backend and the page comes out wrong or fails outright.
//!
//! Painting runs on tokio's blocking pool so a large page does not stall
//! the runtime.

mod paint;

use image::RgbImage;
use std::sync::Arc;
use tracing::debug;

use crate::error::CaptureError;
use crate::surface::{MountedPage, Property, StyleRule, StyleSheet, SurfaceHandle};
use paint::Canvas;

/// Uniform multiplier from surface pixels to bitmap pixels.
pub const DEFAULT_SCALE: f32 = 2.0;

/// Largest accepted capture scale. A landscape A4 page at this scale is
/// roughly 9000 × 6400 device pixels.
pub const MAX_SCALE: f32 = 8.0;

/// A captured page.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    pixels: RgbImage,
    scale: f32,
}

impl Bitmap {
    pub fn new(pixels: RgbImage, scale: f32) -> Self {
        Self { pixels, scale }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }
}

/// Paints a sanitized page into pixels.
pub trait CaptureBackend: Send + Sync + 'static {
    fn paint(&self, page: &MountedPage, scale: f32) -> Result<RgbImage, CaptureError>;
}

/// Software backend painting with the page's typeface.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuBackend;

impl CaptureBackend for CpuBackend {
    fn paint(&self, page: &MountedPage, scale: f32) -> Result<RgbImage, CaptureError> {
        let (width, height) = device_size(page, scale);
        let styles = &page.styles;
        let mut canvas = Canvas::new(width, height, scale, styles.resolve("page", Property::Background)?);

        let card_fill = styles.resolve("card", Property::Background)?;
        let card_border = styles.resolve("card", Property::BorderColor)?;

        for card in &page.cards {
            canvas.fill_rounded_rect(card.x, card.y, card.width, card.height, card.border.radius, card_fill);
            canvas.stroke_rounded_rect(
                card.x,
                card.y,
                card.width,
                card.height,
                card.border.radius,
                card.border.width,
                card_border,
            );

            if let Some(logo) = &card.logo {
                if let Some(image) = logo.image.image() {
                    canvas.draw_image_fit(image, logo.x, logo.y, logo.width, logo.height);
                }
            }

            for block in &card.blocks {
                let ink = styles.resolve(block.class.css_class(), Property::Color)?;
                for (i, line) in block.lines.iter().enumerate() {
                    canvas.draw_text_line(
                        &page.typeface,
                        line,
                        block.x,
                        block.y + i as f32 * block.line_height,
                        block.font_px,
                        block.line_height,
                        block.bold,
                        ink,
                    );
                }
            }
        }

        Ok(canvas.into_image())
    }
}

/// Bitmap dimensions for a page at `scale`.
fn device_size(page: &MountedPage, scale: f32) -> (u32, u32) {
    (
        (page.width_px * scale).round().max(0.0) as u32,
        (page.height_px * scale).round().max(0.0) as u32,
    )
}

/// The rule injected by sanitation.
pub fn plain_color_override() -> StyleRule {
    StyleRule::new("*")
        .color("#000000")
        .background("#ffffff")
        .border_color("#000000")
}

/// Strip and neutralize everything the backend cannot paint.
pub fn sanitize(styles: &mut StyleSheet) {
    styles.strip_inherited();
    styles.retain_paintable();
    styles.inject_override(plain_color_override());
}

pub struct Rasterizer<B = CpuBackend> {
    scale: f32,
    backend: Arc<B>,
}

impl Rasterizer<CpuBackend> {
    pub fn new(scale: f32) -> Result<Self, CaptureError> {
        Self::with_backend(scale, CpuBackend)
    }
}

impl<B: CaptureBackend> Rasterizer<B> {
    pub fn with_backend(scale: f32, backend: B) -> Result<Self, CaptureError> {
        if !scale.is_finite() || scale <= 0.0 || scale > MAX_SCALE {
            return Err(CaptureError::InvalidScale(scale));
        }
        Ok(Self {
            scale,
            backend: Arc::new(backend),
        })
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Sanitize and capture the mounted page.
    pub async fn capture(&self, handle: &mut SurfaceHandle<'_>) -> Result<Bitmap, CaptureError> {
        if handle.cards.is_empty() {
            return Err(CaptureError::EmptySurface);
        }

        sanitize(&mut handle.styles);

        let expected = device_size(&**handle, self.scale);
        if expected.0 == 0 || expected.1 == 0 {
            return Err(CaptureError::EmptyBitmap {
                width: expected.0,
                height: expected.1,
            });
        }

        let page: MountedPage = (**handle).clone();
        let backend = Arc::clone(&self.backend);
        let scale = self.scale;
        let pixels = tokio::task::spawn_blocking(move || backend.paint(&page, scale))
            .await
            .map_err(|e| CaptureError::Backend(format!("capture task failed: {}", e)))??;

        if pixels.dimensions() != expected {
            return Err(CaptureError::EmptyBitmap {
                width: pixels.width(),
                height: pixels.height(),
            });
        }

        debug!(
            page = handle.page_index + 1,
            width = pixels.width(),
            height = pixels.height(),
            "captured page"
        );
        Ok(Bitmap::new(pixels, self.scale))
    }
}
