//! Canvas-to-page coordinate transform
//!
//! The editing surface works in canvas pixels of the rasterized page (origin
//! top-left, y grows downward). PDF content streams use page points (origin
//! bottom-left, y grows upward). Both spaces share the page aspect ratio, so a
//! single scale factor `page_width / canvas_width` plus a vertical flip maps
//! one onto the other.

use crate::point::Point;

/// Errors raised when building a transform or feeding it unsupported input
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransformError {
    #[error("canvas width must be positive and finite, got {0}")]
    InvalidCanvasWidth(f64),
    #[error("page size must be positive and finite, got {width}x{height}")]
    InvalidPageSize { width: f64, height: f64 },
    #[error("unimplemented geometry type {0}")]
    UnsupportedGeometry(&'static str),
}

/// Map a canvas point into page space
///
/// `canvas_width` must be positive; callers that cannot guarantee this should
/// go through [`PageTransform::new`], which rejects it.
pub fn to_page_coords(point: Point, page_width: f64, page_height: f64, canvas_width: f64) -> Point {
    let factor = page_width / canvas_width;
    Point::new(point.x * factor, page_height - point.y * factor)
}

/// Map a canvas length (e.g. a circle radius) into page points; no flip
pub fn to_page_radius(radius: f64, page_width: f64, canvas_width: f64) -> f64 {
    radius * (page_width / canvas_width)
}

/// Validated canvas/page transform for one page at one zoom level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageTransform {
    page_width: f64,
    page_height: f64,
    canvas_width: f64,
}

impl PageTransform {
    /// Create a transform, rejecting degenerate dimensions up front
    pub fn new(page_width: f64, page_height: f64, canvas_width: f64) -> Result<Self, TransformError> {
        if !(canvas_width.is_finite() && canvas_width > 0.0) {
            return Err(TransformError::InvalidCanvasWidth(canvas_width));
        }
        if !(page_width.is_finite() && page_width > 0.0 && page_height.is_finite() && page_height > 0.0) {
            return Err(TransformError::InvalidPageSize { width: page_width, height: page_height });
        }

        Ok(Self { page_width, page_height, canvas_width })
    }

    pub fn page_width(&self) -> f64 {
        self.page_width
    }

    pub fn page_height(&self) -> f64 {
        self.page_height
    }

    pub fn canvas_width(&self) -> f64 {
        self.canvas_width
    }

    /// Page points per canvas pixel
    pub fn factor(&self) -> f64 {
        self.page_width / self.canvas_width
    }

    pub fn to_page(&self, point: Point) -> Point {
        to_page_coords(point, self.page_width, self.page_height, self.canvas_width)
    }

    pub fn to_page_radius(&self, radius: f64) -> f64 {
        to_page_radius(radius, self.page_width, self.canvas_width)
    }

    /// Inverse of [`PageTransform::to_page`]
    pub fn to_canvas(&self, point: Point) -> Point {
        let factor = self.factor();
        Point::new(point.x / factor, (self.page_height - point.y) / factor)
    }

    /// Mirror a page-space point vertically (`y' = page_height - y`)
    ///
    /// Used by the path generators, which work in a top-down convention.
    pub fn flip_y(&self, point: Point) -> Point {
        Point::new(point.x, self.page_height - point.y)
    }
}
