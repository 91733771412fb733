//! # Paper Presets
//!
//! This module defines the fixed catalog of paper formats labels can be
//! exported to.
//!
//! ## Supported Formats
//!
//! | Key | Sheet | Grid | Card | Per page |
//! |-----|-------|------|------|----------|
//! | `a4` | A4 portrait | 2 × 4 | 99.1 × 67.7 mm | 8 |
//! | `a5` | A5 portrait | 2 × 2 | 68 × 98 mm | 4 |
//! | `small-card` | A4 portrait | 3 × 3 (column-major) | 63.5 × 93 mm | 9 |
//! | `worksheet` | A4 landscape | 1 × 1 | 277 × 190 mm | 1 |
//!
//! ## Usage
//!
//! ```
//! use regalia_labels::preset::PaperPreset;
//!
//! let preset = PaperPreset::get("A5");
//! assert_eq!(preset.labels_per_page(), 4);
//!
//! // Unknown keys fall back to the default preset instead of failing
//! assert_eq!(PaperPreset::get("tabloid").key, PaperPreset::default().key);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// CSS reference resolution used by the render surface.
pub const SURFACE_DPI: f32 = 96.0;

/// Convert millimeters to surface pixels (96 dpi).
#[inline]
pub fn mm_to_px(mm: f32) -> f32 {
    mm * SURFACE_DPI / 25.4
}

/// Convert millimeters to PDF points (72 per inch).
#[inline]
pub fn mm_to_pt(mm: f32) -> f32 {
    mm * 72.0 / 25.4
}

/// Identifier of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaperKey {
    A4,
    A5,
    SmallCard,
    Worksheet,
}

impl PaperKey {
    pub const ALL: [PaperKey; 4] = [
        PaperKey::A4,
        PaperKey::A5,
        PaperKey::SmallCard,
        PaperKey::Worksheet,
    ];

    /// Stable slug used in filenames and APIs.
    pub fn as_str(self) -> &'static str {
        match self {
            PaperKey::A4 => "a4",
            PaperKey::A5 => "a5",
            PaperKey::SmallCard => "small-card",
            PaperKey::Worksheet => "worksheet",
        }
    }

    /// Parse a user-supplied key. Case, `_` and spaces are ignored.
    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| match c {
                '_' | ' ' => '-',
                c => c.to_ascii_lowercase(),
            })
            .collect();

        match normalized.as_str() {
            "a4" => Some(PaperKey::A4),
            "a5" => Some(PaperKey::A5),
            "small-card" | "smallcard" | "small" | "card" => Some(PaperKey::SmallCard),
            "worksheet" | "management" | "a4-worksheet" => Some(PaperKey::Worksheet),
            _ => None,
        }
    }
}

impl fmt::Display for PaperKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical sheet orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Order in which cards fill the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowDirection {
    /// Left to right, then top to bottom.
    RowMajor,
    /// Top to bottom, then left to right.
    ColumnMajor,
}

/// Grid shape of one sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Grid {
    pub columns: usize,
    pub rows: usize,
    pub flow: FlowDirection,
}

impl Grid {
    /// Map a slot index to its `(column, row)` cell.
    pub fn cell(&self, slot: usize) -> (usize, usize) {
        match self.flow {
            FlowDirection::RowMajor => (slot % self.columns, slot / self.columns),
            FlowDirection::ColumnMajor => (slot / self.rows, slot % self.rows),
        }
    }
}

/// Page margins, gutters between cards, and padding inside each card (all mm).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Spacing {
    pub margin_top: f32,
    pub margin_left: f32,
    pub gutter_x: f32,
    pub gutter_y: f32,
    pub card_padding: f32,
    /// Line height as a multiple of the font size.
    pub line_spacing: f32,
}

/// Card border styling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BorderStyle {
    /// Stroke width in surface pixels. Zero draws no border.
    pub width_px: f32,
    /// Corner radius in surface pixels.
    pub radius_px: f32,
    /// Border color (CSS syntax).
    pub color: &'static str,
}

/// Font sizes (surface pixels) for every text slot on a card.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Typography {
    pub name: f32,
    pub name_bold: bool,
    pub address: f32,
    pub city: f32,
    pub attention: f32,
    pub phone: f32,
    pub code: f32,
    pub footer: f32,
}

/// Maximum line counts for the fields that may overflow a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ClampPolicy {
    /// Truncate name and each address line to the given number of lines.
    Lines { name: usize, address: usize },
    /// Show full text; overflow past the card border is accepted.
    NoClamp,
}

impl ClampPolicy {
    /// Whether text must stay inside the card.
    pub fn is_clamped(&self) -> bool {
        !matches!(self, ClampPolicy::NoClamp)
    }

    pub fn name_lines(&self) -> Option<usize> {
        match self {
            ClampPolicy::Lines { name, .. } => Some(*name),
            ClampPolicy::NoClamp => None,
        }
    }

    pub fn address_lines(&self) -> Option<usize> {
        match self {
            ClampPolicy::Lines { address, .. } => Some(*address),
            ClampPolicy::NoClamp => None,
        }
    }
}

/// # Paper Preset
///
/// Immutable descriptor of one paper format. Presets are pure data; the
/// layout engine and render surface derive everything from these fields.
///
/// ## Geometry
///
/// ```text
/// ┌──────────────── page_width_mm ────────────────┐
/// │ margin_top                                    │
/// │ ┌──────┐ gutter_x ┌──────┐                    │
/// │ │ card │          │ card │   card_width_mm    │
/// │ └──────┘          └──────┘                    │
/// │ gutter_y                                      │
/// │ ┌──────┐          ┌──────┐                    │
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PaperPreset {
    pub key: PaperKey,
    /// Human-readable name
    pub name: &'static str,
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub grid: Grid,
    pub card_width_mm: f32,
    pub card_height_mm: f32,
    pub border: BorderStyle,
    pub typography: Typography,
    pub spacing: Spacing,
    /// Height of the letterhead logo box in mm. Zero disables the logo.
    pub logo_height_mm: f32,
    pub clamp: ClampPolicy,
}

impl PaperPreset {
    /// # A4, 8 address labels
    ///
    /// Standard 2 × 4 label sheet (99.1 × 67.7 mm labels).
    pub const A4: Self = Self {
        key: PaperKey::A4,
        name: "A4 address labels (8 per sheet)",
        page_width_mm: 210.0,
        page_height_mm: 297.0,
        grid: Grid {
            columns: 2,
            rows: 4,
            flow: FlowDirection::RowMajor,
        },
        card_width_mm: 99.1,
        card_height_mm: 67.7,
        border: BorderStyle {
            width_px: 1.0,
            radius_px: 8.0,
            color: "#9ca3af",
        },
        typography: Typography {
            name: 18.0,
            name_bold: true,
            address: 15.0,
            city: 15.0,
            attention: 13.0,
            phone: 13.0,
            code: 11.0,
            footer: 10.0,
        },
        spacing: Spacing {
            margin_top: 13.1,
            margin_left: 4.65,
            gutter_x: 2.5,
            gutter_y: 0.0,
            card_padding: 4.0,
            line_spacing: 1.2,
        },
        logo_height_mm: 8.0,
        clamp: ClampPolicy::Lines {
            name: 2,
            address: 2,
        },
    };

    /// # A5, 4 cards
    pub const A5: Self = Self {
        key: PaperKey::A5,
        name: "A5 cards (4 per sheet)",
        page_width_mm: 148.0,
        page_height_mm: 210.0,
        grid: Grid {
            columns: 2,
            rows: 2,
            flow: FlowDirection::RowMajor,
        },
        card_width_mm: 68.0,
        card_height_mm: 98.0,
        border: BorderStyle {
            width_px: 1.5,
            radius_px: 10.0,
            color: "#6b7280",
        },
        typography: Typography {
            name: 17.0,
            name_bold: true,
            address: 14.0,
            city: 14.0,
            attention: 13.0,
            phone: 13.0,
            code: 11.0,
            footer: 10.0,
        },
        spacing: Spacing {
            margin_top: 5.0,
            margin_left: 4.0,
            gutter_x: 4.0,
            gutter_y: 4.0,
            card_padding: 4.0,
            line_spacing: 1.25,
        },
        logo_height_mm: 12.0,
        clamp: ClampPolicy::Lines {
            name: 2,
            address: 3,
        },
    };

    /// # Small cards, 9 per A4 sheet
    ///
    /// Compact cards filled column by column.
    pub const SMALL_CARD: Self = Self {
        key: PaperKey::SmallCard,
        name: "Small cards (9 per A4 sheet)",
        page_width_mm: 210.0,
        page_height_mm: 297.0,
        grid: Grid {
            columns: 3,
            rows: 3,
            flow: FlowDirection::ColumnMajor,
        },
        card_width_mm: 63.5,
        card_height_mm: 93.0,
        border: BorderStyle {
            width_px: 1.0,
            radius_px: 6.0,
            color: "#9ca3af",
        },
        typography: Typography {
            name: 14.0,
            name_bold: true,
            address: 12.0,
            city: 12.0,
            attention: 11.0,
            phone: 11.0,
            code: 10.0,
            footer: 9.0,
        },
        spacing: Spacing {
            margin_top: 6.0,
            margin_left: 7.25,
            gutter_x: 2.5,
            gutter_y: 3.0,
            card_padding: 3.0,
            line_spacing: 1.2,
        },
        logo_height_mm: 0.0,
        clamp: ClampPolicy::Lines {
            name: 1,
            address: 1,
        },
    };

    /// # Worksheet, 1 oversized card per landscape A4 sheet
    ///
    /// Very large type for packing-room worksheets. Clamping is disabled:
    /// overflowing text beats hiding part of an address.
    pub const WORKSHEET: Self = Self {
        key: PaperKey::Worksheet,
        name: "Worksheet (1 per landscape A4 sheet)",
        page_width_mm: 297.0,
        page_height_mm: 210.0,
        grid: Grid {
            columns: 1,
            rows: 1,
            flow: FlowDirection::RowMajor,
        },
        card_width_mm: 277.0,
        card_height_mm: 190.0,
        border: BorderStyle {
            width_px: 3.0,
            radius_px: 16.0,
            color: "#111827",
        },
        typography: Typography {
            name: 64.0,
            name_bold: true,
            address: 48.0,
            city: 48.0,
            attention: 36.0,
            phone: 36.0,
            code: 28.0,
            footer: 18.0,
        },
        spacing: Spacing {
            margin_top: 10.0,
            margin_left: 10.0,
            gutter_x: 0.0,
            gutter_y: 0.0,
            card_padding: 10.0,
            line_spacing: 1.15,
        },
        logo_height_mm: 20.0,
        clamp: ClampPolicy::NoClamp,
    };

    /// Look up a preset by key, falling back to the default for unknown keys.
    pub fn get(key: &str) -> &'static PaperPreset {
        PaperKey::parse(key)
            .map(Self::by_key)
            .unwrap_or(&CATALOG[0])
    }

    /// Look up a preset by its typed key.
    pub fn by_key(key: PaperKey) -> &'static PaperPreset {
        match key {
            PaperKey::A4 => &CATALOG[0],
            PaperKey::A5 => &CATALOG[1],
            PaperKey::SmallCard => &CATALOG[2],
            PaperKey::Worksheet => &CATALOG[3],
        }
    }

    /// Every preset in the catalog, in key order.
    pub fn catalog() -> &'static [PaperPreset] {
        &CATALOG
    }

    /// Number of cards one sheet holds.
    #[inline]
    pub fn labels_per_page(&self) -> usize {
        self.grid.columns * self.grid.rows
    }

    pub fn orientation(&self) -> Orientation {
        if self.page_width_mm > self.page_height_mm {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }

    /// Top-left corner of the card in `slot`, in mm from the page's top-left.
    pub fn card_origin_mm(&self, slot: usize) -> (f32, f32) {
        let (col, row) = self.grid.cell(slot);
        let x = self.spacing.margin_left + col as f32 * (self.card_width_mm + self.spacing.gutter_x);
        let y = self.spacing.margin_top + row as f32 * (self.card_height_mm + self.spacing.gutter_y);
        (x, y)
    }

    /// Page size in surface pixels.
    pub fn page_size_px(&self) -> (f32, f32) {
        (mm_to_px(self.page_width_mm), mm_to_px(self.page_height_mm))
    }
}

/// The process-wide preset table. The first entry is the fallback.
static CATALOG: [PaperPreset; 4] = [
    PaperPreset::A4,
    PaperPreset::A5,
    PaperPreset::SMALL_CARD,
    PaperPreset::WORKSHEET,
];

impl Default for PaperPreset {
    fn default() -> Self {
        Self::A4
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_per_page() {
        assert_eq!(PaperPreset::A4.labels_per_page(), 8);
        assert_eq!(PaperPreset::A5.labels_per_page(), 4);
        assert_eq!(PaperPreset::SMALL_CARD.labels_per_page(), 9);
        assert_eq!(PaperPreset::WORKSHEET.labels_per_page(), 1);
    }

    #[test]
    fn test_unknown_key_falls_back_to_default() {
        assert_eq!(PaperPreset::get("letter").key, PaperKey::A4);
        assert_eq!(PaperPreset::get("").key, PaperKey::A4);
    }

    #[test]
    fn test_key_parsing_is_lenient() {
        assert_eq!(PaperPreset::get("A5").key, PaperKey::A5);
        assert_eq!(PaperPreset::get("Small_Card").key, PaperKey::SmallCard);
        assert_eq!(PaperPreset::get(" small card ").key, PaperKey::SmallCard);
        assert_eq!(PaperPreset::get("management").key, PaperKey::Worksheet);
    }

    #[test]
    fn test_key_round_trip() {
        for key in PaperKey::ALL {
            assert_eq!(PaperKey::parse(key.as_str()), Some(key));
            assert_eq!(PaperPreset::by_key(key).key, key);
        }
    }

    #[test]
    fn test_every_card_fits_on_its_page() {
        for preset in PaperPreset::catalog().iter() {
            for slot in 0..preset.labels_per_page() {
                let (x, y) = preset.card_origin_mm(slot);
                assert!(x >= 0.0 && y >= 0.0, "{} slot {}", preset.key, slot);
                assert!(
                    x + preset.card_width_mm <= preset.page_width_mm + 0.01,
                    "{} slot {} overflows horizontally",
                    preset.key,
                    slot
                );
                assert!(
                    y + preset.card_height_mm <= preset.page_height_mm + 0.01,
                    "{} slot {} overflows vertically",
                    preset.key,
                    slot
                );
            }
        }
    }

    #[test]
    fn test_column_major_flow() {
        let grid = PaperPreset::SMALL_CARD.grid;
        assert_eq!(grid.cell(0), (0, 0));
        assert_eq!(grid.cell(1), (0, 1));
        assert_eq!(grid.cell(3), (1, 0));
        assert_eq!(grid.cell(8), (2, 2));
    }

    #[test]
    fn test_row_major_flow() {
        let grid = PaperPreset::A4.grid;
        assert_eq!(grid.cell(1), (1, 0));
        assert_eq!(grid.cell(2), (0, 1));
    }

    #[test]
    fn test_orientation() {
        assert_eq!(PaperPreset::A4.orientation(), Orientation::Portrait);
        assert_eq!(PaperPreset::WORKSHEET.orientation(), Orientation::Landscape);
    }

    #[test]
    fn test_only_worksheet_disables_clamp() {
        for preset in PaperPreset::catalog().iter() {
            let expect_clamp = preset.key != PaperKey::Worksheet;
            assert_eq!(preset.clamp.name_lines().is_some(), expect_clamp, "{}", preset.key);
        }
    }

    #[test]
    fn test_mm_conversions() {
        assert!((mm_to_px(25.4) - 96.0).abs() < 1e-3);
        assert!((mm_to_pt(25.4) - 72.0).abs() < 1e-3);
    }
}
