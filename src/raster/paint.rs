//! CPU painting primitives.
//!
//! All coordinates passed in are surface pixels; the canvas multiplies by
//! its scale. Anything outside the canvas is clipped.

use image::{DynamicImage, Rgb, RgbImage, imageops::FilterType};

use crate::surface::{Color, Typeface};

pub(crate) struct Canvas {
    img: RgbImage,
    scale: f32,
}

impl Canvas {
    pub fn new(width: u32, height: u32, scale: f32, background: Color) -> Self {
        Self {
            img: RgbImage::from_pixel(width, height, rgb(background)),
            scale,
        }
    }

    pub fn into_image(self) -> RgbImage {
        self.img
    }

    fn blend(&mut self, x: i64, y: i64, color: Color, coverage: f32) {
        if x < 0 || y < 0 || x >= self.img.width() as i64 || y >= self.img.height() as i64 {
            return;
        }
        let coverage = coverage.clamp(0.0, 1.0);
        if coverage <= 0.0 {
            return;
        }
        let px = self.img.get_pixel_mut(x as u32, y as u32);
        let under = Color::rgb(px[0], px[1], px[2]);
        *px = rgb(under.mix(color, coverage));
    }

    /// Device-pixel bounds of a surface rectangle, clipped to the canvas.
    fn device_bounds(&self, x: f32, y: f32, w: f32, h: f32) -> (u32, u32, u32, u32) {
        let clip = |v: f32, max: u32| (v.max(0.0) as u32).min(max);
        let x0 = clip((x * self.scale).floor(), self.img.width());
        let y0 = clip((y * self.scale).floor(), self.img.height());
        let x1 = clip(((x + w) * self.scale).ceil(), self.img.width());
        let y1 = clip(((y + h) * self.scale).ceil(), self.img.height());
        (x0, y0, x1, y1)
    }

    /// Fill a rounded rectangle. `radius` is clamped to half the short side.
    pub fn fill_rounded_rect(&mut self, x: f32, y: f32, w: f32, h: f32, radius: f32, color: Color) {
        let shape = RoundedRect::new(x, y, w, h, radius);
        let (x0, y0, x1, y1) = self.device_bounds(x, y, w, h);
        for dy in y0..y1 {
            for dx in x0..x1 {
                let (sx, sy) = self.sample(dx, dy);
                if shape.contains(sx, sy) {
                    self.img.put_pixel(dx, dy, rgb(color));
                }
            }
        }
    }

    /// Stroke the inside edge of a rounded rectangle.
    #[allow(clippy::too_many_arguments)]
    pub fn stroke_rounded_rect(
        &mut self,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        radius: f32,
        stroke: f32,
        color: Color,
    ) {
        if stroke <= 0.0 {
            return;
        }
        // Keep hairlines at least one device pixel wide.
        let stroke = stroke.max(1.0 / self.scale);
        let outer = RoundedRect::new(x, y, w, h, radius);
        let inner = RoundedRect::new(
            x + stroke,
            y + stroke,
            w - 2.0 * stroke,
            h - 2.0 * stroke,
            (radius - stroke).max(0.0),
        );
        let (x0, y0, x1, y1) = self.device_bounds(x, y, w, h);
        for dy in y0..y1 {
            for dx in x0..x1 {
                let (sx, sy) = self.sample(dx, dy);
                if outer.contains(sx, sy) && !inner.contains(sx, sy) {
                    self.img.put_pixel(dx, dy, rgb(color));
                }
            }
        }
    }

    /// Fit `image` inside the box preserving aspect ratio, left-aligned and
    /// vertically centred, alpha-composited over what is already painted.
    pub fn draw_image_fit(&mut self, image: &DynamicImage, x: f32, y: f32, w: f32, h: f32) {
        if image.width() == 0 || image.height() == 0 {
            return;
        }
        let box_w = (w * self.scale).floor();
        let box_h = (h * self.scale).floor();
        let fit = (box_w / image.width() as f32).min(box_h / image.height() as f32);
        let target_w = (image.width() as f32 * fit).floor() as u32;
        let target_h = (image.height() as f32 * fit).floor() as u32;
        if target_w == 0 || target_h == 0 {
            return;
        }

        let resized = image.resize_exact(target_w, target_h, FilterType::Triangle).to_rgba8();
        let left = (x * self.scale).round() as i64;
        let top = (y * self.scale + (box_h - target_h as f32) / 2.0).round() as i64;

        for (ix, iy, px) in resized.enumerate_pixels() {
            let alpha = px[3] as f32 / 255.0;
            self.blend(
                left + ix as i64,
                top + iy as i64,
                Color::rgb(px[0], px[1], px[2]),
                alpha,
            );
        }
    }

    /// Paint one line of text whose line box starts at `(x, y)`.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_text_line(
        &mut self,
        face: &Typeface,
        text: &str,
        x: f32,
        y: f32,
        font_px: f32,
        line_height: f32,
        bold: bool,
        color: Color,
    ) {
        if text.is_empty() {
            return;
        }
        let left = (x * self.scale).round() as i64;
        let top = ((y + (line_height - font_px) / 2.0) * self.scale).round() as i64;
        let device_px = font_px * self.scale;
        let mut plot = |gx: i32, gy: i32, coverage: f32| {
            self.blend(left + gx as i64, top + gy as i64, color, coverage);
        };
        face.draw_line(text, device_px, bold, &mut plot);
    }

    fn sample(&self, dx: u32, dy: u32) -> (f32, f32) {
        ((dx as f32 + 0.5) / self.scale, (dy as f32 + 0.5) / self.scale)
    }
}

fn rgb(c: Color) -> Rgb<u8> {
    Rgb([c.r, c.g, c.b])
}

struct RoundedRect {
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
    r: f32,
}

impl RoundedRect {
    fn new(x: f32, y: f32, w: f32, h: f32, radius: f32) -> Self {
        let (w, h) = (w.max(0.0), h.max(0.0));
        Self {
            x0: x,
            y0: y,
            x1: x + w,
            y1: y + h,
            r: radius.clamp(0.0, w.min(h) / 2.0),
        }
    }

    fn contains(&self, px: f32, py: f32) -> bool {
        if px < self.x0 || px > self.x1 || py < self.y0 || py > self.y1 {
            return false;
        }
        let dx = (self.x0 + self.r - px).max(px - (self.x1 - self.r)).max(0.0);
        let dy = (self.y0 + self.r - py).max(py - (self.y1 - self.r)).max(0.0);
        dx * dx + dy * dy <= self.r * self.r
    }
}
