//! # Export Orchestrator
//!
//! Drives one export from source records to a finished PDF:
//!
//! ```text
//! records ─► project ─► paginate ─┬─► mount ─► capture ─► unmount ─► append ─┐
//!                                 └──────────────── next page ◄──────────────┘
//!                                                                  finish ─► PDF
//! ```
//!
//! Pages run strictly in sequence through the single [`RenderSurface`]. The
//! surface sits behind a mutex; a request arriving while another export
//! holds it is rejected with [`ExportError::Busy`] rather than queued.
//!
//! Status moves `idle → running → done | failed | nothing_to_export` and is
//! published on a [`tokio::sync::watch`] channel. Cancellation and timeouts
//! are not supported: once started, a job runs until it completes or fails.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tokio::sync::{Mutex, watch};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::ExportError;
use crate::layout::{self, Page};
use crate::pdf::{PageSize, PdfComposer};
use crate::preset::{PaperKey, PaperPreset};
use crate::raster::{CaptureBackend, CpuBackend, Rasterizer};
use crate::record::{self, RecordKind};
use crate::surface::RenderSurface;

/// Where the cards of an export come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportSource {
    /// One card per source record.
    Records(Vec<Value>),
    /// `count` identical cards for a single source record.
    Replicate { record: Value, count: usize },
}

/// One export request as received from the console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub kind: RecordKind,
    /// Paper key; unknown or missing keys use the exporter's default.
    #[serde(default)]
    pub paper: Option<String>,
    #[serde(flatten)]
    pub source: ExportSource,
}

impl ExportRequest {
    pub fn records(kind: RecordKind, paper: &str, records: Vec<Value>) -> Self {
        Self {
            kind,
            paper: Some(paper.to_string()),
            source: ExportSource::Records(records),
        }
    }

    pub fn replicate(kind: RecordKind, paper: &str, record: Value, count: usize) -> Self {
        Self {
            kind,
            paper: Some(paper.to_string()),
            source: ExportSource::Replicate { record, count },
        }
    }
}

/// A finished document.
#[derive(Clone)]
pub struct ExportedDocument {
    pub job_id: Uuid,
    pub bytes: Vec<u8>,
    pub filename: String,
    pub page_count: usize,
    pub card_count: usize,
    pub generated_at: DateTime<Utc>,
}

impl fmt::Debug for ExportedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportedDocument")
            .field("job_id", &self.job_id)
            .field("bytes", &self.bytes.len())
            .field("filename", &self.filename)
            .field("page_count", &self.page_count)
            .field("card_count", &self.card_count)
            .field("generated_at", &self.generated_at)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum ExportOutcome {
    Document(ExportedDocument),
    /// The request produced zero pages. Not an error.
    NothingToExport,
}

/// Observable exporter state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExportStatus {
    Idle,
    Running { page: usize, total: usize },
    Done { pages: usize },
    Failed { message: String },
    NothingToExport,
}

/// Deterministic download name, e.g. `address-labels-order-a4.pdf`.
pub fn export_filename(kind: RecordKind, paper: PaperKey) -> String {
    format!("address-labels-{}-{}.pdf", kind.as_str(), paper.as_str())
}

/// Owns the render surface and runs exports one at a time.
pub struct Exporter<B = CpuBackend> {
    surface: Mutex<RenderSurface>,
    rasterizer: Rasterizer<B>,
    default_paper: PaperKey,
    status: watch::Sender<ExportStatus>,
}

impl<B: CaptureBackend> Exporter<B> {
    pub fn new(surface: RenderSurface, rasterizer: Rasterizer<B>) -> Self {
        let (status, _) = watch::channel(ExportStatus::Idle);
        Self {
            surface: Mutex::new(surface),
            rasterizer,
            default_paper: PaperKey::A4,
            status,
        }
    }

    pub fn with_default_paper(mut self, paper: PaperKey) -> Self {
        self.default_paper = paper;
        self
    }

    pub fn status(&self) -> ExportStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ExportStatus> {
        self.status.subscribe()
    }

    /// True while a job holds the render surface.
    pub fn in_progress(&self) -> bool {
        self.surface.try_lock().is_err()
    }

    /// Whether a page is still mounted. Waits for any running job.
    pub async fn surface_attached(&self) -> bool {
        self.surface.lock().await.is_attached()
    }

    /// Resolve the request's paper key, falling back to the default.
    pub fn preset_for(&self, paper: Option<&str>) -> &'static PaperPreset {
        match paper.map(|p| (p, PaperKey::parse(p))) {
            Some((_, Some(key))) => PaperPreset::by_key(key),
            Some((unknown, None)) => {
                warn!(paper = %unknown, fallback = self.default_paper.as_str(), "unknown paper preset");
                PaperPreset::by_key(self.default_paper)
            }
            None => PaperPreset::by_key(self.default_paper),
        }
    }

    /// Run one export to completion.
    pub async fn export(&self, request: ExportRequest) -> Result<ExportOutcome, ExportError> {
        let Ok(mut surface) = self.surface.try_lock() else {
            warn!(kind = %request.kind, "export rejected, another export is running");
            return Err(ExportError::Busy);
        };

        let job_id = Uuid::new_v4();
        let preset = self.preset_for(request.paper.as_deref());
        let pages = match request.source {
            ExportSource::Records(sources) => {
                let records = record::project_all(&sources, request.kind);
                let blank = records.iter().filter(|r| r.is_blank()).count();
                if blank > 0 {
                    warn!(job = %job_id, blank, "records with no printable fields");
                }
                layout::paginate(records, preset)
            }
            ExportSource::Replicate { record, count } => {
                layout::replicate(record::project(&record, request.kind), count, preset)
            }
        };

        if pages.is_empty() {
            info!(job = %job_id, kind = %request.kind, paper = %preset.key, "nothing to export");
            self.status.send_replace(ExportStatus::NothingToExport);
            return Ok(ExportOutcome::NothingToExport);
        }

        let card_count = layout::card_count(&pages);
        info!(
            job = %job_id,
            kind = %request.kind,
            paper = %preset.key,
            pages = pages.len(),
            cards = card_count,
            "export started"
        );

        let result = self.render_pages(&mut surface, &pages, preset, request.kind, job_id).await;
        debug_assert!(!surface.is_attached());

        match result {
            Ok(bytes) => {
                info!(job = %job_id, pages = pages.len(), bytes = bytes.len(), "export finished");
                self.status.send_replace(ExportStatus::Done { pages: pages.len() });
                Ok(ExportOutcome::Document(ExportedDocument {
                    job_id,
                    bytes,
                    filename: export_filename(request.kind, preset.key),
                    page_count: pages.len(),
                    card_count,
                    generated_at: Utc::now(),
                }))
            }
            Err(e) => {
                error!(job = %job_id, error = %e, "export failed");
                self.status.send_replace(ExportStatus::Failed {
                    message: e.user_message(),
                });
                Err(e)
            }
        }
    }

    async fn render_pages(
        &self,
        surface: &mut RenderSurface,
        pages: &[Page],
        preset: &PaperPreset,
        kind: RecordKind,
        job_id: Uuid,
    ) -> Result<Vec<u8>, ExportError> {
        let total = pages.len();
        let size = PageSize::of(preset);
        let mut composer = PdfComposer::new(format!("Address labels: {} ({})", kind, preset.name));

        for page in pages {
            let number = page.index + 1;
            self.status.send_replace(ExportStatus::Running { page: number, total });

            let bitmap = {
                let mut handle = surface.mount(page, preset).await;
                let captured = self.rasterizer.capture(&mut handle).await;
                handle.unmount();
                captured.map_err(|source| ExportError::Capture { page: number, source })?
            };

            composer
                .append_page(&bitmap, size)
                .map_err(|source| ExportError::Compose { page: number, source })?;
            tracing::debug!(job = %job_id, page = number, total, "page composed");
        }

        composer.finish().map_err(ExportError::Finalize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CaptureError, LabelError};
    use crate::surface::{ImageLoader, ImageSource, MountedPage};
    use async_trait::async_trait;
    use image::{DynamicImage, RgbImage};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct NoImages;

    #[async_trait]
    impl ImageLoader for NoImages {
        async fn load(&self, source: &ImageSource) -> Result<DynamicImage, LabelError> {
            Err(LabelError::Image(format!("{} unavailable", source)))
        }
    }

    /// Blank pages of the right size; optionally fails or stalls.
    #[derive(Default)]
    struct StubBackend {
        fail_on_page: Option<usize>,
        delay: Duration,
        painted: AtomicUsize,
    }

    impl CaptureBackend for StubBackend {
        fn paint(&self, page: &MountedPage, scale: f32) -> Result<RgbImage, CaptureError> {
            std::thread::sleep(self.delay);
            if self.fail_on_page == Some(page.page_index) {
                return Err(CaptureError::Backend("simulated rasterization failure".to_string()));
            }
            self.painted.fetch_add(1, Ordering::SeqCst);
            let w = (page.width_px * scale).round() as u32;
            let h = (page.height_px * scale).round() as u32;
            Ok(RgbImage::new(w, h))
        }
    }

    fn exporter(backend: StubBackend) -> Exporter<StubBackend> {
        let surface = RenderSurface::new(Arc::new(NoImages));
        Exporter::new(surface, Rasterizer::with_backend(0.25, backend).unwrap())
    }

    fn orders(n: usize) -> Vec<Value> {
        (0..n)
            .map(|i| json!({"id": i, "foreName": "Grad", "surname": format!("{}", i), "town": "York"}))
            .collect()
    }

    #[test]
    fn test_filename() {
        assert_eq!(
            export_filename(RecordKind::Ceremony, PaperKey::SmallCard),
            "address-labels-ceremony-small-card.pdf"
        );
    }

    #[test]
    fn test_request_deserializes() {
        let req: ExportRequest = serde_json::from_value(json!({
            "kind": "bulk",
            "paper": "a5",
            "replicate": {"record": {"name": "Hall"}, "count": 25}
        }))
        .unwrap();
        assert_eq!(req.kind, RecordKind::Ceremony);
        assert_eq!(
            req.source,
            ExportSource::Replicate {
                record: json!({"name": "Hall"}),
                count: 25
            }
        );

        let req: ExportRequest = serde_json::from_value(json!({"kind": "order", "records": []})).unwrap();
        assert_eq!(req.paper, None);
        assert_eq!(req.source, ExportSource::Records(Vec::new()));
    }

    #[test]
    fn test_status_serializes_tagged() {
        let value = serde_json::to_value(ExportStatus::Running { page: 2, total: 3 }).unwrap();
        assert_eq!(value, json!({"status": "running", "page": 2, "total": 3}));
        let value = serde_json::to_value(ExportStatus::NothingToExport).unwrap();
        assert_eq!(value, json!({"status": "nothing_to_export"}));
    }

    #[tokio::test]
    async fn test_zero_records_is_nothing_to_export() {
        let exporter = exporter(StubBackend::default());
        let outcome = exporter
            .export(ExportRequest::records(RecordKind::Order, "a4", Vec::new()))
            .await
            .unwrap();
        assert!(matches!(outcome, ExportOutcome::NothingToExport));
        assert_eq!(exporter.status(), ExportStatus::NothingToExport);
        assert_eq!(exporter.rasterizer.backend().painted.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_export_produces_document() {
        let exporter = exporter(StubBackend::default());
        let outcome = exporter
            .export(ExportRequest::records(RecordKind::Order, "small-card", orders(23)))
            .await
            .unwrap();

        let ExportOutcome::Document(doc) = outcome else {
            panic!("expected a document");
        };
        assert_eq!(doc.page_count, 3);
        assert_eq!(doc.card_count, 23);
        assert_eq!(doc.filename, "address-labels-order-small-card.pdf");
        assert!(doc.bytes.starts_with(b"%PDF"));
        assert_eq!(exporter.status(), ExportStatus::Done { pages: 3 });
        assert!(!exporter.surface_attached().await);
    }

    #[tokio::test]
    async fn test_unknown_paper_uses_default() {
        let exporter = exporter(StubBackend::default()).with_default_paper(PaperKey::A5);
        let outcome = exporter
            .export(ExportRequest::records(RecordKind::Order, "tabloid", orders(5)))
            .await
            .unwrap();
        let ExportOutcome::Document(doc) = outcome else {
            panic!("expected a document");
        };
        assert_eq!(doc.filename, "address-labels-order-a5.pdf");
        assert_eq!(doc.page_count, 2);
    }

    #[tokio::test]
    async fn test_failure_on_page_two_cleans_up() {
        let exporter = exporter(StubBackend {
            fail_on_page: Some(1),
            ..Default::default()
        });
        let err = exporter
            .export(ExportRequest::records(RecordKind::Order, "a5", orders(12)))
            .await
            .unwrap_err();

        assert!(matches!(err, ExportError::Capture { page: 2, .. }));
        assert!(!exporter.surface_attached().await);
        assert!(!exporter.in_progress());
        assert_eq!(exporter.rasterizer.backend().painted.load(Ordering::SeqCst), 1);
        assert!(matches!(exporter.status(), ExportStatus::Failed { .. }));

        // The surface is reusable after a failure.
        let outcome = exporter
            .export(ExportRequest::records(RecordKind::Order, "a5", orders(2)))
            .await
            .unwrap();
        assert!(matches!(outcome, ExportOutcome::Document(_)));
    }

    #[tokio::test]
    async fn test_second_export_while_running_is_busy() {
        let exporter = Arc::new(exporter(StubBackend {
            delay: Duration::from_millis(150),
            ..Default::default()
        }));
        let mut status = exporter.subscribe();

        let first = {
            let exporter = Arc::clone(&exporter);
            tokio::spawn(async move {
                exporter
                    .export(ExportRequest::records(RecordKind::Order, "a4", orders(16)))
                    .await
            })
        };

        status
            .wait_for(|s| matches!(s, ExportStatus::Running { .. }))
            .await
            .unwrap();
        assert!(exporter.in_progress());

        let second = exporter
            .export(ExportRequest::records(RecordKind::Order, "a4", orders(1)))
            .await;
        assert!(matches!(second, Err(ExportError::Busy)));

        let first = first.await.unwrap().unwrap();
        assert!(matches!(first, ExportOutcome::Document(_)));
        assert!(!exporter.in_progress());
    }

    #[tokio::test]
    async fn test_replicate_export() {
        let exporter = exporter(StubBackend::default());
        let outcome = exporter
            .export(ExportRequest::replicate(
                RecordKind::Ceremony,
                "a5",
                json!({"code": "CER-9", "name": "Great Hall"}),
                25,
            ))
            .await
            .unwrap();
        let ExportOutcome::Document(doc) = outcome else {
            panic!("expected a document");
        };
        assert_eq!(doc.page_count, 7);
        assert_eq!(doc.card_count, 25);
    }
}
