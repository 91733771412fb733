//! # PDF Composer
//!
//! Assembles captured page bitmaps into one multi-page PDF.
//!
//! Each bitmap becomes a Flate-compressed RGB image XObject drawn on its own
//! page. The image is scaled to fit the physical sheet without cropping and
//! centred in the leftover margin:
//!
//! ```text
//! wide bitmap                tall bitmap
//! ┌──────────────┐           ┌──┬────────┬──┐
//! │   margin     │           │  │        │  │
//! ├──────────────┤           │  │ image  │  │
//! │    image     │           │  │        │  │
//! ├──────────────┤           │  │        │  │
//! │   margin     │           │  │        │  │
//! └──────────────┘           └──┴────────┴──┘
//! ```
//!
//! The composer knows nothing about presets beyond the page size handed to
//! [`PdfComposer::append_page`].

use flate2::Compression;
use flate2::write::ZlibEncoder;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use std::io::Write;

use crate::error::ComposeError;
use crate::preset::{Orientation, PaperPreset, mm_to_pt};
use crate::raster::Bitmap;

/// Physical sheet size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_mm: f32,
    pub height_mm: f32,
}

impl PageSize {
    pub fn of(preset: &PaperPreset) -> Self {
        Self {
            width_mm: preset.page_width_mm,
            height_mm: preset.page_height_mm,
        }
    }

    pub fn orientation(&self) -> Orientation {
        if self.width_mm > self.height_mm {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }

    pub fn width_pt(&self) -> f32 {
        mm_to_pt(self.width_mm)
    }

    pub fn height_pt(&self) -> f32 {
        mm_to_pt(self.height_mm)
    }

    fn validate(&self) -> Result<(), ComposeError> {
        let valid = |v: f32| v.is_finite() && v > 0.0;
        if valid(self.width_mm) && valid(self.height_mm) {
            Ok(())
        } else {
            Err(ComposeError::InvalidPageSize {
                width_mm: self.width_mm,
                height_mm: self.height_mm,
            })
        }
    }
}

/// Where an image lands on a page, in points from the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Fit a `width × height` bitmap inside `page`, preserving aspect ratio.
///
/// The limiting dimension fills the page; the other is centred.
pub fn fit_to_page(width: u32, height: u32, page: PageSize) -> Result<Placement, ComposeError> {
    if width == 0 || height == 0 {
        return Err(ComposeError::EmptyBitmap { width, height });
    }
    page.validate()?;

    let (page_w, page_h) = (page.width_pt(), page.height_pt());
    let scale = (page_w / width as f32).min(page_h / height as f32);
    let (w, h) = (width as f32 * scale, height as f32 * scale);

    Ok(Placement {
        x: (page_w - w) / 2.0,
        y: (page_h - h) / 2.0,
        width: w,
        height: h,
    })
}

/// Incrementally built PDF document.
pub struct PdfComposer {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
    title: String,
}

impl PdfComposer {
    pub fn new(title: impl Into<String>) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
            title: title.into(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Add a page of `size` showing `bitmap`.
    pub fn append_page(&mut self, bitmap: &Bitmap, size: PageSize) -> Result<(), ComposeError> {
        let placement = fit_to_page(bitmap.width(), bitmap.height(), size)?;

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bitmap.pixels().as_raw())?;
        let compressed = encoder.finish()?;

        let image_id = self.doc.add_object(
            Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => bitmap.width() as i64,
                    "Height" => bitmap.height() as i64,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                    "Filter" => "FlateDecode",
                },
                compressed,
            )
            .with_compression(false),
        );

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        placement.width.into(),
                        0.into(),
                        0.into(),
                        placement.height.into(),
                        placement.x.into(),
                        placement.y.into(),
                    ],
                ),
                Operation::new("Do", vec!["Im0".into()]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = self.doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let media_box: Vec<Object> = vec![0.into(), 0.into(), size.width_pt().into(), size.height_pt().into()];
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => media_box,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    "Im0" => image_id,
                },
            },
        });
        self.kids.push(page_id.into());
        Ok(())
    }

    /// Close the page tree and serialize the document.
    pub fn finish(mut self) -> Result<Vec<u8>, ComposeError> {
        if self.kids.is_empty() {
            return Err(ComposeError::NoPages);
        }

        let count = self.kids.len() as i64;
        self.doc.set_object(
            self.pages_id,
            dictionary! {
                "Type" => "Pages",
                "Count" => count,
                "Kids" => self.kids,
            },
        );

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let date = chrono::Utc::now().format("D:%Y%m%d%H%M%SZ").to_string();
        let info_id = self.doc.add_object(dictionary! {
            "Title" => Object::string_literal(self.title),
            "Creator" => Object::string_literal(concat!("regalia-labels ", env!("CARGO_PKG_VERSION"))),
            "CreationDate" => Object::string_literal(date.clone()),
            "ModDate" => Object::string_literal(date),
        });
        self.doc.trailer.set("Info", info_id);

        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| ComposeError::Pdf(e.into()))?;
        Ok(buffer)
    }
}
