//! # Off-Screen Render Surface
//!
//! One reusable scratch area that builds the visual form of exactly one page
//! at a time. [`RenderSurface::mount`] lays out the card grid for a page and
//! returns a [`SurfaceHandle`]; dropping the handle (or calling
//! [`SurfaceHandle::unmount`]) detaches the page again.
//!
//! The handle mutably borrows the surface, so a second page can never be
//! mounted while one is attached, and teardown runs on every exit path,
//! including `?` and panics.
//!
//! ## Card Template
//!
//! ```text
//! ┌───────────────────────────┐
//! │ [logo]                    │  preset logo box (optional)
//! │ CODE                      │  only when the record has a code
//! │ Name (bold)               │  clamped to preset name lines
//! │ Address line 1            │  clamped to preset address lines
//! │ Address line 2            │
//! │ City, County, Postcode    │
//! │ FAO Attention             │
//! │ Phone                     │
//! │ footer                    │
//! └───────────────────────────┘
//! ```

pub mod font;
pub mod resources;
pub mod style;
pub mod text;

pub use font::Typeface;
pub use resources::{ImageLoader, ImageSource, ResourceLoader};
pub use style::{Color, Property, StyleRule, StyleSheet};

use image::DynamicImage;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::layout::{Card, Page};
use crate::preset::{PaperPreset, mm_to_px};
use text::{WrappedText, layout_text};

/// The template slot a text block occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldClass {
    Code,
    Name,
    Address,
    City,
    Attention,
    Phone,
    Footer,
}

impl FieldClass {
    /// Class name used for style resolution.
    pub fn css_class(self) -> &'static str {
        match self {
            FieldClass::Code => "card-code",
            FieldClass::Name => "card-name",
            FieldClass::Address => "card-address",
            FieldClass::City => "card-city",
            FieldClass::Attention => "card-attention",
            FieldClass::Phone => "card-phone",
            FieldClass::Footer => "card-footer",
        }
    }
}

/// Outcome of waiting on an embedded image.
#[derive(Debug, Clone)]
pub enum ImageState {
    Loaded(Arc<DynamicImage>),
    /// The image could not be loaded; the page renders without it.
    Failed(String),
}

impl ImageState {
    pub fn image(&self) -> Option<&DynamicImage> {
        match self {
            ImageState::Loaded(img) => Some(img),
            ImageState::Failed(_) => None,
        }
    }
}

/// Letterhead logo box, in surface pixels.
#[derive(Debug, Clone)]
pub struct LogoBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub image: ImageState,
}

/// One laid-out text field.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub class: FieldClass,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub font_px: f32,
    pub line_height: f32,
    pub bold: bool,
    pub lines: Vec<String>,
    pub truncated: bool,
}

impl TextBlock {
    pub fn height(&self) -> f32 {
        self.lines.len() as f32 * self.line_height
    }
}

/// Border geometry for one card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardBorder {
    pub width: f32,
    pub radius: f32,
}

/// One card as it sits on the mounted page.
#[derive(Debug, Clone)]
pub struct CardView {
    pub key: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub border: CardBorder,
    pub logo: Option<LogoBox>,
    pub blocks: Vec<TextBlock>,
}

impl CardView {
    pub fn block(&self, class: FieldClass) -> Option<&TextBlock> {
        self.blocks.iter().find(|b| b.class == class)
    }
}

/// The visual form of one page, ready for capture.
#[derive(Debug, Clone)]
pub struct MountedPage {
    pub page_index: usize,
    pub width_px: f32,
    pub height_px: f32,
    pub styles: StyleSheet,
    pub typeface: Arc<Typeface>,
    pub cards: Vec<CardView>,
}

/// The single reusable scratch area.
pub struct RenderSurface {
    typeface: Arc<Typeface>,
    theme: Vec<StyleRule>,
    logo: Option<ImageSource>,
    footer: String,
    loader: Arc<dyn ImageLoader>,
    attached: Option<usize>,
    mounts: u64,
}

impl RenderSurface {
    pub fn new(loader: Arc<dyn ImageLoader>) -> Self {
        Self {
            typeface: Arc::new(Typeface::default()),
            theme: style::console_theme(),
            logo: None,
            footer: String::new(),
            loader,
            attached: None,
            mounts: 0,
        }
    }

    pub fn with_typeface(mut self, typeface: Typeface) -> Self {
        self.typeface = Arc::new(typeface);
        self
    }

    /// Host stylesheet rules that cascade into every mounted page.
    pub fn with_theme(mut self, theme: Vec<StyleRule>) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_logo(mut self, logo: Option<ImageSource>) -> Self {
        self.logo = logo;
        self
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = footer.into();
        self
    }

    /// Whether a page is currently mounted.
    pub fn is_attached(&self) -> bool {
        self.attached.is_some()
    }

    /// Total pages mounted over the surface's lifetime.
    pub fn mount_count(&self) -> u64 {
        self.mounts
    }

    /// Lay out `page` and attach it.
    ///
    /// Awaits every embedded image before returning. A failed load is
    /// logged and the page renders without it.
    pub async fn mount(&mut self, page: &Page, preset: &PaperPreset) -> SurfaceHandle<'_> {
        let logo = self.await_logo(preset).await;
        let (width_px, height_px) = preset.page_size_px();

        let cards = page
            .cards
            .iter()
            .map(|card| self.layout_card(card, preset, logo.as_ref()))
            .collect();

        let mounted = MountedPage {
            page_index: page.index,
            width_px,
            height_px,
            styles: StyleSheet::new(style::preset_rules(preset), self.theme.clone()),
            typeface: Arc::clone(&self.typeface),
            cards,
        };

        self.attached = Some(page.index);
        self.mounts += 1;
        debug!(page = page.index + 1, cards = page.len(), preset = %preset.key, "mounted page");

        SurfaceHandle {
            surface: self,
            page: mounted,
        }
    }

    async fn await_logo(&self, preset: &PaperPreset) -> Option<ImageState> {
        if preset.logo_height_mm <= 0.0 {
            return None;
        }
        let source = self.logo.as_ref()?;

        Some(match self.loader.load(source).await {
            Ok(image) => ImageState::Loaded(Arc::new(image)),
            Err(e) => {
                warn!(%source, error = %e, "logo failed to load, rendering without it");
                ImageState::Failed(e.to_string())
            }
        })
    }

    fn layout_card(&self, card: &Card, preset: &PaperPreset, logo: Option<&ImageState>) -> CardView {
        let (x_mm, y_mm) = preset.card_origin_mm(card.slot);
        let (x, y) = (mm_to_px(x_mm), mm_to_px(y_mm));
        let width = mm_to_px(preset.card_width_mm);
        let height = mm_to_px(preset.card_height_mm);
        let padding = mm_to_px(preset.spacing.card_padding);
        let inner_x = x + padding;
        let inner_width = (width - 2.0 * padding).max(1.0);
        let mut cursor = y + padding;

        let logo = logo.map(|state| {
            let logo_height = mm_to_px(preset.logo_height_mm);
            let logo_box = LogoBox {
                x: inner_x,
                y: cursor,
                width: inner_width,
                height: logo_height,
                image: state.clone(),
            };
            cursor += logo_height + padding * 0.5;
            logo_box
        });

        let record = &card.record;
        let t = &preset.typography;
        let name_lines = preset.clamp.name_lines();
        let address_lines = preset.clamp.address_lines();

        let mut fields: Vec<(FieldClass, &str, f32, bool, Option<usize>)> = Vec::with_capacity(8);
        if !record.code.is_empty() {
            fields.push((FieldClass::Code, record.code.as_str(), t.code, false, None));
        }
        fields.extend([
            (FieldClass::Name, record.name.as_str(), t.name, t.name_bold, name_lines),
            (FieldClass::Address, record.address_line1.as_str(), t.address, false, address_lines),
            (FieldClass::Address, record.address_line2.as_str(), t.address, false, address_lines),
            (FieldClass::City, record.city.as_str(), t.city, false, None),
            (FieldClass::Attention, record.attention.as_str(), t.attention, false, None),
            (FieldClass::Phone, record.phone.as_str(), t.phone, false, None),
            (FieldClass::Footer, self.footer.as_str(), t.footer, false, None),
        ]);

        // Clamping presets keep every line inside the card border.
        let bottom = preset.clamp.is_clamped().then_some(y + height - preset.border.width_px);

        let blocks = fields
            .into_iter()
            .map(|(class, value, font_px, bold, max_lines)| {
                let line_height = font_px * preset.spacing.line_spacing;
                let max_lines = match bottom {
                    Some(bottom) => {
                        let room = ((bottom - cursor) / line_height).floor().max(0.0) as usize;
                        Some(max_lines.map_or(room, |limit| limit.min(room)))
                    }
                    None => max_lines,
                };
                let wrapped = match max_lines {
                    Some(0) => WrappedText {
                        lines: Vec::new(),
                        truncated: !value.trim().is_empty(),
                    },
                    _ => layout_text(value, inner_width, font_px, &self.typeface, max_lines),
                };
                if wrapped.truncated {
                    debug!(card = %card.key, class = class.css_class(), "field clamped");
                }
                let block = TextBlock {
                    class,
                    x: inner_x,
                    y: cursor,
                    width: inner_width,
                    font_px,
                    line_height,
                    bold,
                    lines: wrapped.lines,
                    truncated: wrapped.truncated,
                };
                cursor += block.height();
                block
            })
            .collect();

        CardView {
            key: card.key.clone(),
            x,
            y,
            width,
            height,
            border: CardBorder {
                width: preset.border.width_px,
                radius: preset.border.radius_px,
            },
            logo,
            blocks,
        }
    }
}

/// Scoped ownership of a mounted page.
///
/// Dereferences to the [`MountedPage`]; dropping it unmounts.
pub struct SurfaceHandle<'a> {
    surface: &'a mut RenderSurface,
    page: MountedPage,
}

impl SurfaceHandle<'_> {
    /// Detach the page explicitly.
    pub fn unmount(self) {}
}

impl Deref for SurfaceHandle<'_> {
    type Target = MountedPage;

    fn deref(&self) -> &MountedPage {
        &self.page
    }
}

impl DerefMut for SurfaceHandle<'_> {
    fn deref_mut(&mut self) -> &mut MountedPage {
        &mut self.page
    }
}

impl Drop for SurfaceHandle<'_> {
    fn drop(&mut self) {
        if let Some(index) = self.surface.attached.take() {
            debug!(page = index + 1, "unmounted page");
        }
    }
}
