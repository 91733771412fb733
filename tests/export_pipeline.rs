//! # Export Pipeline Tests
//!
//! End-to-end scenarios through the public API: JSON records in, PDF bytes
//! out. Documents are re-parsed with lopdf to check page counts and sizes.

use async_trait::async_trait;
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use lopdf::{Document, Object};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;

use regalia_labels::error::{CaptureError, ExportError, LabelError};
use regalia_labels::export::{ExportOutcome, ExportRequest, ExportStatus, Exporter};
use regalia_labels::layout::paginate;
use regalia_labels::preset::PaperPreset;
use regalia_labels::raster::{CaptureBackend, CpuBackend, Rasterizer};
use regalia_labels::record::{RecordKind, project};
use regalia_labels::surface::{
    FieldClass, ImageLoader, ImageSource, MountedPage, RenderSurface, ResourceLoader,
};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

struct NoImages;

#[async_trait]
impl ImageLoader for NoImages {
    async fn load(&self, source: &ImageSource) -> Result<DynamicImage, LabelError> {
        Err(LabelError::Image(format!("{} unavailable", source)))
    }
}

/// CPU painting that fails on one page index.
struct FailOnPage(usize);

impl CaptureBackend for FailOnPage {
    fn paint(&self, page: &MountedPage, scale: f32) -> Result<RgbImage, CaptureError> {
        if page.page_index == self.0 {
            return Err(CaptureError::Backend("canvas allocation failed".to_string()));
        }
        CpuBackend.paint(page, scale)
    }
}

fn exporter() -> Exporter {
    Exporter::new(RenderSurface::new(Arc::new(NoImages)), Rasterizer::new(0.5).unwrap())
}

fn orders(n: usize) -> Vec<Value> {
    (0..n)
        .map(|i| {
            json!({
                "id": 1000 + i,
                "title": "Ms",
                "foreName": "Graduate",
                "surname": format!("No. {}", i),
                "address1": "Flat 2, 14 Cathedral Walk",
                "town": "Canterbury",
                "postcode": "CT1 2EH",
                "phone": null
            })
        })
        .collect()
}

fn document(outcome: ExportOutcome) -> regalia_labels::export::ExportedDocument {
    match outcome {
        ExportOutcome::Document(doc) => doc,
        ExportOutcome::NothingToExport => panic!("expected a document"),
    }
}

fn media_boxes(bytes: &[u8]) -> Vec<(f32, f32)> {
    let pdf = Document::load_mem(bytes).unwrap();
    pdf.get_pages()
        .values()
        .map(|id| {
            let page = pdf.get_object(*id).unwrap().as_dict().unwrap();
            let mb = page.get(b"MediaBox").unwrap().as_array().unwrap();
            let num = |o: &Object| match o {
                Object::Integer(i) => *i as f32,
                Object::Real(r) => *r as f32,
                other => panic!("unexpected MediaBox entry {:?}", other),
            };
            (num(&mb[2]), num(&mb[3]))
        })
        .collect()
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[tokio::test]
async fn test_23_orders_on_small_cards() {
    let doc = document(
        exporter()
            .export(ExportRequest::records(RecordKind::Order, "small-card", orders(23)))
            .await
            .unwrap(),
    );

    assert_eq!(doc.page_count, 3);
    assert_eq!(doc.card_count, 23);
    assert_eq!(media_boxes(&doc.bytes).len(), 3);
}

#[tokio::test]
async fn test_replicate_ceremony_25_on_a5() {
    let doc = document(
        exporter()
            .export(ExportRequest::replicate(
                RecordKind::Ceremony,
                "a5",
                json!({"ceremonyCode": "DUR-SUMMER", "name": "Durham Cathedral", "toName": "Ceremonies Office"}),
                25,
            ))
            .await
            .unwrap(),
    );

    assert_eq!(doc.page_count, 7);
    assert_eq!(doc.card_count, 25);
    assert_eq!(doc.filename, "address-labels-ceremony-a5.pdf");
}

#[tokio::test]
async fn test_page_sizes_follow_preset_orientation() {
    let exporter = exporter();

    let portrait = document(
        exporter
            .export(ExportRequest::records(RecordKind::Order, "a4", orders(1)))
            .await
            .unwrap(),
    );
    let (w, h) = media_boxes(&portrait.bytes)[0];
    assert!((w - 595.28).abs() < 0.5 && (h - 841.89).abs() < 0.5, "{}x{}", w, h);

    let landscape = document(
        exporter
            .export(ExportRequest::records(RecordKind::Internal, "worksheet", orders(2)))
            .await
            .unwrap(),
    );
    let boxes = media_boxes(&landscape.bytes);
    assert_eq!(boxes.len(), 2);
    assert!(boxes.iter().all(|(w, h)| w > h));
}

#[tokio::test]
async fn test_empty_input_produces_no_document() {
    let exporter = exporter();
    let outcome = exporter
        .export(ExportRequest::records(RecordKind::Institution, "a4", Vec::new()))
        .await
        .unwrap();

    assert!(matches!(outcome, ExportOutcome::NothingToExport));
    assert_eq!(exporter.status(), ExportStatus::NothingToExport);
}

#[tokio::test]
async fn test_capture_failure_on_page_two_of_three() {
    let exporter = Exporter::new(
        RenderSurface::new(Arc::new(NoImages)),
        Rasterizer::with_backend(0.5, FailOnPage(1)).unwrap(),
    );

    let err = exporter
        .export(ExportRequest::records(RecordKind::Order, "a4", orders(20)))
        .await
        .unwrap_err();

    assert!(matches!(err, ExportError::Capture { page: 2, .. }));
    assert!(!exporter.surface_attached().await);
    assert!(!exporter.in_progress());
    match exporter.status() {
        ExportStatus::Failed { message } => assert!(message.contains("page 2")),
        other => panic!("unexpected status {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_phone_renders_blank_line() {
    let record = project(&orders(1)[0], RecordKind::Order);
    assert_eq!(record.phone, "");

    let pages = paginate(vec![record], &PaperPreset::A4);
    let mut surface = RenderSurface::new(Arc::new(NoImages));
    let handle = surface.mount(&pages[0], &PaperPreset::A4).await;

    let card = &handle.cards[0];
    assert_eq!(card.block(FieldClass::Phone).unwrap().lines, vec![String::new()]);
    assert_eq!(card.block(FieldClass::Name).unwrap().lines, vec!["Ms Graduate No. 0"]);
    assert_eq!(card.block(FieldClass::City).unwrap().lines, vec!["Canterbury, CT1 2EH"]);
}

#[tokio::test]
async fn test_logo_file_is_painted() {
    let dir = tempfile::tempdir().unwrap();
    let logo_path = dir.path().join("letterhead.png");
    RgbaImage::from_pixel(60, 20, Rgba([220, 20, 20, 255]))
        .save(&logo_path)
        .unwrap();

    let mut surface = RenderSurface::new(Arc::new(ResourceLoader::new().unwrap()))
        .with_logo(Some(ImageSource::Path(logo_path)));
    let rasterizer = Rasterizer::new(1.0).unwrap();

    let pages = paginate(vec![project(&orders(1)[0], RecordKind::Order)], &PaperPreset::A5);
    let mut handle = surface.mount(&pages[0], &PaperPreset::A5).await;
    let logo = handle.cards[0].logo.clone().unwrap();
    let bitmap = rasterizer.capture(&mut handle).await.unwrap();

    let Rgb([r, g, b]) = *bitmap.pixels().get_pixel(
        (logo.x + 5.0) as u32,
        (logo.y + logo.height / 2.0) as u32,
    );
    assert!(r > 200 && g < 40 && b < 40, "got {:?}", (r, g, b));
}
