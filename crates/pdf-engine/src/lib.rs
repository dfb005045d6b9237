//! PDF document backend for pdfmark
//!
//! Loads a PDF with `lopdf`, draws annotations from `pdfmark-core` onto a page
//! and writes the result back out. [`Session`] wraps the whole load, draw,
//! calibrate and export cycle for a viewer.

pub mod backend;
pub mod exporter;
pub mod raster;
pub mod session;

pub use backend::{AssetId, DocumentBackend, EngineError, LopdfBackend, PageSize};
pub use exporter::{default_marker_png, ExportError, ExportResult, PdfExporter};
pub use raster::{BlankRasterizer, RasterPage, Rasterizer, RgbaImage};
pub use session::{Session, SessionError, SessionResult};

pub fn default_backend(pdf: &[u8]) -> Result<LopdfBackend, EngineError> {
    LopdfBackend::from_bytes(pdf)
}
