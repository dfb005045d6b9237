use crate::backend::{DocumentBackend, EngineError, LopdfBackend};
use image::{ImageBuffer, Rgba};

pub type RgbaImage = ImageBuffer<Rgba<u8>, Vec<u8>>;

const PAPER: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// A rendered page and the size of the page it came from
#[derive(Debug, Clone)]
pub struct RasterPage {
    pub canvas: RgbaImage,
    pub page_width: f64,
    pub page_height: f64,
}

impl RasterPage {
    /// Width of the canvas in pixels, the unit drawables are recorded in
    pub fn canvas_width(&self) -> f64 {
        f64::from(self.canvas.width())
    }
}

/// Renders a PDF page to a bitmap the annotations are drawn over
pub trait Rasterizer {
    fn render(&self, pdf: &[u8], page_index: usize, scale: f64) -> Result<RasterPage, EngineError>;
}

/// Media-box sized white canvas; draws no page content
#[derive(Debug, Default, Clone, Copy)]
pub struct BlankRasterizer;

impl BlankRasterizer {
    pub fn new() -> Self {
        Self
    }
}

impl Rasterizer for BlankRasterizer {
    fn render(&self, pdf: &[u8], page_index: usize, scale: f64) -> Result<RasterPage, EngineError> {
        let size = LopdfBackend::from_bytes(pdf)?.page_size(page_index)?;
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };

        let width = (size.width_pt * scale).round().max(1.0) as u32;
        let height = (size.height_pt * scale).round().max(1.0) as u32;
        let canvas = RgbaImage::from_pixel(width, height, PAPER);

        Ok(RasterPage { canvas, page_width: size.width_pt, page_height: size.height_pt })
    }
}
