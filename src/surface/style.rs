//! Style rules, color parsing and cascade resolution for the render surface.
//!
//! A mounted page carries two rule layers:
//!
//! - **scoped** rules generated from the paper preset, and
//! - **inherited** rules from the host console theme.
//!
//! Inherited rules follow scoped ones in source order, so at equal
//! specificity they win. That is how console styling leaks into a page, and
//! why the rasterizer strips them before every capture.

use serde::{Deserialize, Serialize};

use crate::error::CaptureError;
use crate::preset::PaperPreset;

/// An 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse the color syntaxes the capture backend can paint.
    ///
    /// Supports `#rgb`, `#rrggbb`, `rgb()`, `rgba()` (alpha flattened onto
    /// white) and a handful of names. Returns `None` for anything else,
    /// including `oklch()`, `color-mix()` and relative color syntax.
    pub fn parse(value: &str) -> Option<Color> {
        let v = value.trim().to_ascii_lowercase();

        if let Some(hex) = v.strip_prefix('#') {
            return parse_hex(hex);
        }

        if let Some(args) = v
            .strip_prefix("rgba(")
            .or_else(|| v.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return parse_rgb_args(args);
        }

        match v.as_str() {
            "black" => Some(Color::BLACK),
            "white" | "transparent" => Some(Color::WHITE),
            "gray" | "grey" => Some(Color::rgb(128, 128, 128)),
            _ => None,
        }
    }

    /// Linear blend towards `other` by `t` in `[0, 1]`.
    pub fn mix(self, other: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Color::rgb(lerp(self.r, other.r), lerp(self.g, other.g), lerp(self.b, other.b))
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    let digits: Vec<u8> = hex
        .chars()
        .map(|c| c.to_digit(16).map(|d| d as u8))
        .collect::<Option<_>>()?;

    match digits.as_slice() {
        [r, g, b] => Some(Color::rgb(r * 17, g * 17, b * 17)),
        [r1, r2, g1, g2, b1, b2] => Some(Color::rgb(r1 * 16 + r2, g1 * 16 + g2, b1 * 16 + b2)),
        _ => None,
    }
}

fn parse_rgb_args(args: &str) -> Option<Color> {
    if args.contains("from") || args.contains("var(") {
        return None;
    }

    let parts: Vec<&str> = args
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();

    let channel = |s: &str| -> Option<u8> {
        let n: f32 = s.parse().ok()?;
        (0.0..=255.0).contains(&n).then(|| n.round() as u8)
    };

    let (r, g, b) = match parts.as_slice() {
        [r, g, b] | [r, g, b, _] => (channel(r)?, channel(g)?, channel(b)?),
        _ => return None,
    };
    let color = Color::rgb(r, g, b);

    match parts.get(3) {
        None => Some(color),
        Some(a) => {
            let alpha = match a.strip_suffix('%') {
                Some(pct) => pct.parse::<f32>().ok()? / 100.0,
                None => a.parse::<f32>().ok()?,
            };
            Some(Color::WHITE.mix(color, alpha))
        }
    }
}

/// A paintable property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    Color,
    Background,
    BorderColor,
}

impl Property {
    pub fn name(self) -> &'static str {
        match self {
            Property::Color => "color",
            Property::Background => "background",
            Property::BorderColor => "border-color",
        }
    }
}

/// One rule: a selector plus optional color declarations.
///
/// Selectors are either `*` or a single class name (a leading `.` is
/// accepted and ignored).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleRule {
    pub selector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
}

impl StyleRule {
    pub fn new(selector: &str) -> Self {
        Self {
            selector: selector.to_string(),
            ..Default::default()
        }
    }

    pub fn color(mut self, value: &str) -> Self {
        self.color = Some(value.to_string());
        self
    }

    pub fn background(mut self, value: &str) -> Self {
        self.background = Some(value.to_string());
        self
    }

    pub fn border_color(mut self, value: &str) -> Self {
        self.border_color = Some(value.to_string());
        self
    }

    fn get(&self, property: Property) -> Option<&str> {
        match property {
            Property::Color => self.color.as_deref(),
            Property::Background => self.background.as_deref(),
            Property::BorderColor => self.border_color.as_deref(),
        }
    }

    /// Specificity against `class`: `Some(1)` for a class match, `Some(0)`
    /// for the universal selector, `None` if the rule does not apply.
    fn matches(&self, class: &str) -> Option<u8> {
        let selector = self.selector.trim();
        if selector == "*" {
            Some(0)
        } else if selector.trim_start_matches('.') == class {
            Some(1)
        } else {
            None
        }
    }

    /// Drop declarations the capture backend cannot paint.
    fn retain_paintable(&mut self) {
        for slot in [&mut self.color, &mut self.background, &mut self.border_color] {
            if slot.as_deref().is_some_and(|v| Color::parse(v).is_none()) {
                *slot = None;
            }
        }
    }

    fn is_empty(&self) -> bool {
        self.color.is_none() && self.background.is_none() && self.border_color.is_none()
    }
}

/// The stylesheet attached to one mounted page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleSheet {
    scoped: Vec<StyleRule>,
    inherited: Vec<StyleRule>,
    sanitized: bool,
}

impl StyleSheet {
    pub fn new(scoped: Vec<StyleRule>, inherited: Vec<StyleRule>) -> Self {
        Self {
            scoped,
            inherited,
            sanitized: false,
        }
    }

    pub fn scoped(&self) -> &[StyleRule] {
        &self.scoped
    }

    pub fn inherited(&self) -> &[StyleRule] {
        &self.inherited
    }

    pub fn is_sanitized(&self) -> bool {
        self.sanitized
    }

    /// Remove every inherited rule.
    pub fn strip_inherited(&mut self) {
        self.inherited.clear();
    }

    /// Drop unpaintable declarations from scoped rules.
    pub fn retain_paintable(&mut self) {
        for rule in &mut self.scoped {
            rule.retain_paintable();
        }
        self.scoped.retain(|rule| !rule.is_empty());
    }

    /// Prepend a universal rule so every property resolves to a plain color.
    pub fn inject_override(&mut self, rule: StyleRule) {
        self.scoped.insert(0, rule);
        self.sanitized = true;
    }

    /// Resolve `property` for an element with class `class`.
    ///
    /// Class rules beat `*`; at equal specificity the later rule wins.
    /// Unset properties default to black ink on white.
    pub fn resolve(&self, class: &str, property: Property) -> Result<Color, CaptureError> {
        let winner = self
            .scoped
            .iter()
            .chain(self.inherited.iter())
            .enumerate()
            .filter_map(|(order, rule)| {
                let specificity = rule.matches(class)?;
                let value = rule.get(property)?;
                Some(((specificity, order), rule, value))
            })
            .max_by_key(|(rank, _, _)| *rank);

        match winner {
            None => Ok(match property {
                Property::Background => Color::WHITE,
                Property::Color | Property::BorderColor => Color::BLACK,
            }),
            Some((_, rule, value)) => Color::parse(value).ok_or_else(|| CaptureError::UnsupportedColor {
                selector: format!("{} {{ {} }}", rule.selector, property.name()),
                value: value.to_string(),
            }),
        }
    }
}

/// Scoped rules for one preset's card template.
pub fn preset_rules(preset: &PaperPreset) -> Vec<StyleRule> {
    vec![
        StyleRule::new("page").background("#ffffff"),
        StyleRule::new("card")
            .background("#ffffff")
            .border_color(preset.border.color),
        StyleRule::new("card-code").color("#4b5563"),
        StyleRule::new("card-name").color("#111827"),
        StyleRule::new("card-address").color("#1f2937"),
        StyleRule::new("card-city").color("#1f2937"),
        StyleRule::new("card-attention").color("#374151"),
        StyleRule::new("card-phone").color("#374151"),
        StyleRule::new("card-footer").color("#6b7280"),
    ]
}

/// The admin console's global theme, as it would cascade into a page.
pub fn console_theme() -> Vec<StyleRule> {
    vec![
        StyleRule::new("*")
            .color("oklch(0.21 0.006 285.885)")
            .background("oklch(1 0 0)")
            .border_color("oklch(0.92 0.004 286.32)"),
        StyleRule::new(".card")
            .background("oklch(1 0 0)")
            .border_color("oklch(0.92 0.004 286.32)"),
    ]
}
