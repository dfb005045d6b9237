//! Document assembly
//!
//! A [`PdfExporter`] holds the loaded document with the label font and the
//! marker image already embedded. Every export draws into a fresh copy of that
//! base document, so a failed export leaves nothing half-written and repeated
//! exports of the same drawables produce the same operators.

use crate::backend::{AssetId, DocumentBackend, EngineError, LopdfBackend};
use image::{ImageFormat, Rgba, RgbaImage};
use pdfmark_core::{
    classify_all, Annotation, ClassifyError, ConfigError, ContentOp, Drawable, EmitError, Emitter, ExportConfig,
    FontAsset, FontMetrics, Helvetica, MarkerAsset, PageTransform, ResourceProvider, TransformError,
};
use std::io::Cursor;
use std::sync::Arc;

/// Pixel size of the default marker pin, twice the default icon size in points
const PIN_WIDTH: u32 = 50;
const PIN_HEIGHT: u32 = 82;
const PIN_FILL: Rgba<u8> = Rgba([51, 136, 255, 255]);
const PIN_OUTLINE: Rgba<u8> = Rgba([36, 90, 170, 255]);
const PIN_DOT: Rgba<u8> = Rgba([255, 255, 255, 255]);

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Classify(#[from] ClassifyError),
    #[error(transparent)]
    Emit(#[from] EmitError),
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type ExportResult<T> = Result<T, ExportError>;

/// Draws drawables into a PDF page and serializes the result
#[derive(Debug, Clone)]
pub struct PdfExporter<B = LopdfBackend> {
    source: B,
    base: B,
    font: AssetId,
    marker: AssetId,
    canvas_width: f64,
    config: ExportConfig,
}

impl PdfExporter<LopdfBackend> {
    pub fn new(pdf: &[u8], canvas_width: f64, config: ExportConfig) -> ExportResult<Self> {
        Self::with_backend(LopdfBackend::from_bytes(pdf)?, canvas_width, config)
    }
}

impl<B: DocumentBackend + Clone> PdfExporter<B> {
    pub fn with_backend(source: B, canvas_width: f64, config: ExportConfig) -> ExportResult<Self> {
        config.validate()?;
        if !(canvas_width.is_finite() && canvas_width > 0.0) {
            return Err(TransformError::InvalidCanvasWidth(canvas_width).into());
        }

        let (base, font, marker) = embed_assets(&source, &default_marker_png()?)?;
        Ok(Self { source, base, font, marker, canvas_width, config })
    }

    /// Use `png` as the marker icon instead of the built-in pin
    pub fn with_marker_png(self, png: &[u8]) -> ExportResult<Self> {
        let (base, font, marker) = embed_assets(&self.source, png)?;
        Ok(Self { base, font, marker, ..self })
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn canvas_width(&self) -> f64 {
        self.canvas_width
    }

    /// Draw `drawables` on the zero-based `page_index` and return the new PDF
    pub fn export(&self, drawables: &[Drawable], page_index: usize) -> ExportResult<Vec<u8>> {
        let mut doc = self.base.clone();
        let ops = self.draw(&mut doc, drawables, page_index)?;
        doc.push_operators(page_index, &ops)?;
        let bytes = doc.save()?;

        log::debug!("exported {} drawables to page {} ({} bytes)", drawables.len(), page_index, bytes.len());
        Ok(bytes)
    }

    /// The operators an export of `drawables` would append to the page
    pub fn operators(&self, drawables: &[Drawable], page_index: usize) -> ExportResult<Vec<ContentOp>> {
        let mut doc = self.base.clone();
        self.draw(&mut doc, drawables, page_index)
    }

    fn draw(&self, doc: &mut B, drawables: &[Drawable], page_index: usize) -> ExportResult<Vec<ContentOp>> {
        let size = doc.page_size(page_index)?;
        let transform = PageTransform::new(size.width_pt, size.height_pt, self.canvas_width)?;
        let annotations = classify_all(drawables, &transform, &self.config)?;
        let emitter = Emitter::new(self.config.clone(), size.height_pt)?;

        let mut resources = PageResources::new(doc, page_index);
        if annotations.iter().any(Annotation::needs_font) {
            resources.bind_font(self.font)?;
        }
        if annotations.iter().any(|a| matches!(a, Annotation::Marker { .. })) {
            resources.bind_marker(self.marker)?;
        }

        Ok(emitter.emit_all(&annotations, &mut resources)?)
    }
}

fn embed_assets<B: DocumentBackend + Clone>(source: &B, marker_png: &[u8]) -> ExportResult<(B, AssetId, AssetId)> {
    let mut base = source.clone();
    let font = base.embed_standard_font(Helvetica.base_font())?;
    let marker = base.embed_png(marker_png)?;
    Ok((base, font, marker))
}

/// Resources of the page being drawn, bound on demand
struct PageResources<'a, B> {
    doc: &'a mut B,
    page_index: usize,
    font: Option<FontAsset>,
    marker: Option<MarkerAsset>,
}

impl<'a, B: DocumentBackend> PageResources<'a, B> {
    fn new(doc: &'a mut B, page_index: usize) -> Self {
        Self { doc, page_index, font: None, marker: None }
    }

    fn bind_font(&mut self, font: AssetId) -> Result<(), EngineError> {
        let resource_name = self.doc.bind_font(self.page_index, font)?;
        self.font = Some(FontAsset { resource_name, metrics: Arc::new(Helvetica) });
        Ok(())
    }

    fn bind_marker(&mut self, marker: AssetId) -> Result<(), EngineError> {
        let resource_name = self.doc.bind_image(self.page_index, marker)?;
        self.marker = Some(MarkerAsset { resource_name });
        Ok(())
    }
}

impl<B: DocumentBackend> ResourceProvider for PageResources<'_, B> {
    fn opacity_state(&mut self, alpha: f64) -> Result<String, EmitError> {
        self.doc
            .add_opacity_state(self.page_index, alpha)
            .map_err(|err| EmitError::Resource(err.to_string()))
    }

    fn font(&self) -> Option<&FontAsset> {
        self.font.as_ref()
    }

    fn marker(&self) -> Option<&MarkerAsset> {
        self.marker.as_ref()
    }
}

/// PNG of the built-in marker: a round-headed pin whose tip is the bottom
/// center of the image
pub fn default_marker_png() -> Result<Vec<u8>, EngineError> {
    let mut png = Vec::new();
    marker_pin().write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}

fn marker_pin() -> RgbaImage {
    let w = f64::from(PIN_WIDTH);
    let h = f64::from(PIN_HEIGHT);
    let radius = w / 2.0 - 1.0;
    let (cx, cy) = (w / 2.0, w / 2.0);
    // Where the tail leaves the head
    let tail_y = cy + radius * 0.6;
    let tail_half = radius * 0.8;

    let inside = |x: f64, y: f64, grow: f64| {
        let in_head = (x - cx).powi(2) + (y - cy).powi(2) <= (radius + grow).powi(2);
        let in_tail = y >= tail_y && y <= h + grow && {
            let t = ((y - tail_y) / (h - tail_y)).min(1.0);
            (x - cx).abs() <= tail_half * (1.0 - t) + grow
        };
        in_head || in_tail
    };

    RgbaImage::from_fn(PIN_WIDTH, PIN_HEIGHT, |px, py| {
        let (x, y) = (f64::from(px) + 0.5, f64::from(py) + 0.5);
        if (x - cx).powi(2) + (y - cy).powi(2) <= (radius * 0.35).powi(2) {
            PIN_DOT
        } else if inside(x, y, -2.0) {
            PIN_FILL
        } else if inside(x, y, 0.0) {
            PIN_OUTLINE
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}
