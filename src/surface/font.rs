//! Typefaces for measuring and drawing card text.
//!
//! The default face is the embedded Spleen bitmap family, scaled
//! nearest-neighbour to the requested pixel size. An outline font (TTF/OTF)
//! can be loaded at start-up instead; it renders anti-aliased via ab_glyph.
//!
//! Measurement and drawing share the same advance widths so text wrapped
//! on the surface lands exactly where the rasterizer paints it.

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use spleen_font::{FONT_6X12, FONT_8X16, FONT_12X24, PSF2Font};
use std::path::Path;

use crate::error::LabelError;

/// Spleen cells are exactly twice as tall as they are wide.
const SPLEEN_ASPECT: f32 = 0.5;

/// A face used both for layout measurement and for painting.
#[derive(Clone)]
pub enum Typeface {
    /// Embedded Spleen bitmap fonts.
    Spleen,
    /// A user-supplied outline font.
    Outline(FontArc),
}

impl std::fmt::Debug for Typeface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Typeface::Spleen => f.write_str("Typeface::Spleen"),
            Typeface::Outline(_) => f.write_str("Typeface::Outline"),
        }
    }
}

impl Default for Typeface {
    fn default() -> Self {
        Typeface::Spleen
    }
}

impl Typeface {
    /// Load an outline font from disk.
    pub fn from_file(path: &Path) -> Result<Self, LabelError> {
        let bytes = std::fs::read(path)?;
        FontArc::try_from_vec(bytes)
            .map(Typeface::Outline)
            .map_err(|e| LabelError::Config(format!("Invalid font file {}: {}", path.display(), e)))
    }

    /// Horizontal advance of one character at `px` pixels tall.
    pub fn advance(&self, ch: char, px: f32) -> f32 {
        match self {
            Typeface::Spleen => px * SPLEEN_ASPECT,
            Typeface::Outline(font) => {
                let scaled = font.as_scaled(PxScale::from(px));
                scaled.h_advance(font.glyph_id(ch))
            }
        }
    }

    /// Width of a run of text.
    pub fn text_width(&self, text: &str, px: f32) -> f32 {
        text.chars().map(|ch| self.advance(ch, px)).sum()
    }

    /// Paint one line of text.
    ///
    /// `plot(x, y, coverage)` receives pixel offsets relative to the top-left
    /// of the line's `px`-tall box and a coverage value in `[0, 1]`.
    pub fn draw_line(&self, text: &str, px: f32, bold: bool, plot: &mut dyn FnMut(i32, i32, f32)) {
        if px <= 0.0 {
            return;
        }

        // Faux bold: strike each glyph twice, offset by a stroke width.
        let strike = if bold { (px / 16.0).round().max(1.0) as i32 } else { 0 };
        let mut caret = 0.0f32;

        for ch in text.chars() {
            let origin = caret.round() as i32;
            match self {
                Typeface::Spleen => draw_spleen_glyph(ch, px, origin, strike, plot),
                Typeface::Outline(font) => draw_outline_glyph(font, ch, px, caret, strike, plot),
            }
            caret += self.advance(ch, px);
        }
    }
}

fn draw_spleen_glyph(ch: char, px: f32, origin: i32, strike: i32, plot: &mut dyn FnMut(i32, i32, f32)) {
    let cell_w = (px * SPLEEN_ASPECT).round().max(1.0) as usize;
    let cell_h = px.round().max(1.0) as usize;
    let glyph = spleen_glyph(ch, cell_w, cell_h);

    for y in 0..cell_h {
        for x in 0..cell_w {
            if glyph[y * cell_w + x] == 0 {
                continue;
            }
            for dx in 0..=strike {
                plot(origin + x as i32 + dx, y as i32, 1.0);
            }
        }
    }
}

fn draw_outline_glyph(
    font: &FontArc,
    ch: char,
    px: f32,
    caret: f32,
    strike: i32,
    plot: &mut dyn FnMut(i32, i32, f32),
) {
    let scale = PxScale::from(px);
    let baseline = font.as_scaled(scale).ascent();
    let glyph = font
        .glyph_id(ch)
        .with_scale_and_position(scale, ab_glyph::point(caret, baseline));

    if let Some(outlined) = font.outline_glyph(glyph) {
        let bounds = outlined.px_bounds();
        outlined.draw(|gx, gy, coverage| {
            let x = gx as i32 + bounds.min.x as i32;
            let y = gy as i32 + bounds.min.y as i32;
            for dx in 0..=strike {
                plot(x + dx, y, coverage);
            }
        });
    }
}

/// Rasterize a character into a `width × height` 0/1 bitmap.
///
/// Picks the smallest Spleen size at least as tall as the target and scales
/// with nearest neighbour. Characters missing from Spleen become a box.
fn spleen_glyph(ch: char, width: usize, height: usize) -> Vec<u8> {
    let (source, src_w, src_h) = if height <= 12 {
        (FONT_6X12, 6, 12)
    } else if height <= 16 {
        (FONT_8X16, 8, 16)
    } else {
        (FONT_12X24, 12, 24)
    };

    let mut glyph = vec![0u8; width * height];
    let mut src_bitmap = vec![0u8; src_w * src_h];
    let mut found = false;

    if let Ok(mut font) = PSF2Font::new(source) {
        let utf8 = ch.to_string();
        if let Some(spleen_glyph) = font.glyph_for_utf8(utf8.as_bytes()) {
            found = true;
            for (row_y, row) in spleen_glyph.enumerate() {
                for (col_x, on) in row.enumerate() {
                    if row_y < src_h && col_x < src_w {
                        src_bitmap[row_y * src_w + col_x] = if on { 1 } else { 0 };
                    }
                }
            }
        }
    }

    if found {
        scale_bitmap(&src_bitmap, src_w, src_h, &mut glyph, width, height);
    } else if !ch.is_whitespace() {
        draw_box(&mut glyph, width, height);
    }

    glyph
}

/// Scale a bitmap from src dimensions to dst dimensions using nearest neighbor.
fn scale_bitmap(src: &[u8], src_w: usize, src_h: usize, dst: &mut [u8], dst_w: usize, dst_h: usize) {
    for dy in 0..dst_h {
        for dx in 0..dst_w {
            let sx = dx * src_w / dst_w;
            let sy = dy * src_h / dst_h;
            if let (Some(&value), Some(slot)) = (src.get(sy * src_w + sx), dst.get_mut(dy * dst_w + dx)) {
                *slot = value;
            }
        }
    }
}

/// Outline box for characters the font does not cover.
fn draw_box(glyph: &mut [u8], width: usize, height: usize) {
    if width < 3 || height < 3 {
        return;
    }
    // Inset so the box reads as a glyph, not a border.
    let (x0, x1) = (1, width - 2);
    let (y0, y1) = (height / 6, height - 2);
    for x in x0..=x1 {
        glyph[y0 * width + x] = 1;
        glyph[y1 * width + x] = 1;
    }
    for y in y0..=y1 {
        glyph[y * width + x0] = 1;
        glyph[y * width + x1] = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ink(face: &Typeface, text: &str, px: f32, bold: bool) -> Vec<(i32, i32)> {
        let mut hits = Vec::new();
        face.draw_line(text, px, bold, &mut |x, y, c| {
            if c > 0.0 {
                hits.push((x, y));
            }
        });
        hits
    }

    #[test]
    fn test_spleen_advance_is_half_height() {
        let face = Typeface::Spleen;
        assert_eq!(face.advance('W', 24.0), 12.0);
        assert_eq!(face.text_width("abcd", 20.0), 40.0);
    }

    #[test]
    fn test_spleen_draws_ink_within_line_box() {
        let face = Typeface::Spleen;
        let hits = ink(&face, "Hello", 24.0, false);
        assert!(!hits.is_empty());
        for (x, y) in hits {
            assert!((0..60).contains(&x), "x={}", x);
            assert!((0..24).contains(&y), "y={}", y);
        }
    }

    #[test]
    fn test_space_draws_nothing() {
        assert!(ink(&Typeface::Spleen, "   ", 16.0, false).is_empty());
    }

    #[test]
    fn test_bold_adds_ink() {
        let face = Typeface::Spleen;
        let regular = ink(&face, "Name", 18.0, false).len();
        let bold = ink(&face, "Name", 18.0, true).len();
        assert!(bold > regular);
    }

    #[test]
    fn test_unknown_glyph_falls_back_to_box() {
        let hits = ink(&Typeface::Spleen, "\u{4E2D}", 24.0, false);
        assert!(!hits.is_empty());
    }

    #[test]
    fn test_scale_bitmap_doubles() {
        let src = [1u8, 0, 0, 1];
        let mut dst = [0u8; 16];
        scale_bitmap(&src, 2, 2, &mut dst, 4, 4);
        assert_eq!(dst[0], 1);
        assert_eq!(dst[3], 0);
        assert_eq!(dst[15], 1);
    }

    #[test]
    fn test_missing_font_file_is_an_error() {
        let err = Typeface::from_file(Path::new("/nonexistent/font.ttf")).unwrap_err();
        assert!(matches!(err, LabelError::Io(_)));
    }

    #[test]
    fn test_garbage_font_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.ttf");
        std::fs::write(&path, b"not a font").unwrap();
        let err = Typeface::from_file(&path).unwrap_err();
        assert!(matches!(err, LabelError::Config(_)));
    }
}
