//! Export annotation model
//!
//! One variant per exported shape kind. Annotations are produced by the
//! classifier from live drawables with their geometry still in canvas pixels,
//! then mapped to page space as a whole with [`Annotation::to_page_space`]
//! before they reach the emitter. Radii and area centroids are already in
//! page units when classified and are left alone by that mapping.

use crate::color::RgbColor;
use crate::point::Point;
use crate::transform::PageTransform;

/// Invariant violations in an annotation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("{kind} has no rings")]
    NoRings { kind: &'static str },
    #[error("{kind} ring {index} has {len} points, at least 3 required")]
    RingTooShort { kind: &'static str, index: usize, len: usize },
    #[error("{kind} has {len} points, at least 2 required")]
    TooFewPoints { kind: &'static str, len: usize },
    #[error("circle radius must be positive and finite, got {0}")]
    InvalidRadius(f64),
    #[error("{kind} has a non-finite coordinate")]
    NonFinite { kind: &'static str },
}

/// A classified shape ready to be emitted
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    Rectangle { rings: Vec<Vec<Point>>, color: RgbColor },
    Polygon { rings: Vec<Vec<Point>>, color: RgbColor },
    /// Center in geometry units, radius in page points
    Circle { center: Point, radius: f64, color: RgbColor },
    Line { points: Vec<Point>, color: RgbColor },
    Marker { position: Point },
    Text { position: Point, text: String },
    /// Polygon outlined with cloud arcs; `invert` flips the arc sweep
    CloudPolygon { rings: Vec<Vec<Point>>, color: RgbColor, invert: bool },
    Ruler { points: Vec<Point>, label: String, color: RgbColor },
    /// Polygon with an area label at `centroid` (page points)
    Area { rings: Vec<Vec<Point>>, centroid: Point, label: String, color: RgbColor },
}

impl Annotation {
    pub fn kind(&self) -> &'static str {
        match self {
            Annotation::Rectangle { .. } => "Rectangle",
            Annotation::Polygon { .. } => "Polygon",
            Annotation::Circle { .. } => "Circle",
            Annotation::Line { .. } => "Line",
            Annotation::Marker { .. } => "Marker",
            Annotation::Text { .. } => "Text",
            Annotation::CloudPolygon { .. } => "CloudPolygon",
            Annotation::Ruler { .. } => "Ruler",
            Annotation::Area { .. } => "Area",
        }
    }

    /// Whether drawing this annotation needs the embedded font
    pub fn needs_font(&self) -> bool {
        matches!(self, Annotation::Text { .. } | Annotation::Ruler { .. } | Annotation::Area { .. })
    }

    /// Map every geometry point from canvas pixels to page points
    pub fn to_page_space(&self, transform: &PageTransform) -> Annotation {
        self.map_points(|p| transform.to_page(p))
    }

    /// Apply `f` to geometry points; radius and centroid are not touched
    pub fn map_points(&self, f: impl Fn(Point) -> Point) -> Annotation {
        let rings = |rings: &[Vec<Point>]| -> Vec<Vec<Point>> {
            rings.iter().map(|ring| ring.iter().map(|p| f(*p)).collect()).collect()
        };
        let points = |points: &[Point]| -> Vec<Point> { points.iter().map(|p| f(*p)).collect() };

        match self {
            Annotation::Rectangle { rings: r, color } => Annotation::Rectangle { rings: rings(r), color: *color },
            Annotation::Polygon { rings: r, color } => Annotation::Polygon { rings: rings(r), color: *color },
            Annotation::Circle { center, radius, color } => {
                Annotation::Circle { center: f(*center), radius: *radius, color: *color }
            }
            Annotation::Line { points: p, color } => Annotation::Line { points: points(p), color: *color },
            Annotation::Marker { position } => Annotation::Marker { position: f(*position) },
            Annotation::Text { position, text } => Annotation::Text { position: f(*position), text: text.clone() },
            Annotation::CloudPolygon { rings: r, color, invert } => {
                Annotation::CloudPolygon { rings: rings(r), color: *color, invert: *invert }
            }
            Annotation::Ruler { points: p, label, color } => {
                Annotation::Ruler { points: points(p), label: label.clone(), color: *color }
            }
            Annotation::Area { rings: r, centroid, label, color } => Annotation::Area {
                rings: rings(r),
                centroid: *centroid,
                label: label.clone(),
                color: *color,
            },
        }
    }

    /// Check the geometry invariants of this annotation's kind
    pub fn validate(&self) -> Result<(), ModelError> {
        let kind = self.kind();
        match self {
            Annotation::Rectangle { rings, .. }
            | Annotation::Polygon { rings, .. }
            | Annotation::CloudPolygon { rings, .. } => validate_rings(kind, rings),
            Annotation::Area { rings, centroid, .. } => {
                validate_rings(kind, rings)?;
                finite(kind, std::slice::from_ref(centroid))
            }
            Annotation::Circle { center, radius, .. } => {
                if !(radius.is_finite() && *radius > 0.0) {
                    return Err(ModelError::InvalidRadius(*radius));
                }
                finite(kind, std::slice::from_ref(center))
            }
            Annotation::Line { points, .. } | Annotation::Ruler { points, .. } => {
                if points.len() < 2 {
                    return Err(ModelError::TooFewPoints { kind, len: points.len() });
                }
                finite(kind, points)
            }
            Annotation::Marker { position } | Annotation::Text { position, .. } => {
                finite(kind, std::slice::from_ref(position))
            }
        }
    }
}

fn validate_rings(kind: &'static str, rings: &[Vec<Point>]) -> Result<(), ModelError> {
    if rings.is_empty() {
        return Err(ModelError::NoRings { kind });
    }
    for (index, ring) in rings.iter().enumerate() {
        if ring.len() < 3 {
            return Err(ModelError::RingTooShort { kind, index, len: ring.len() });
        }
        finite(kind, ring)?;
    }
    Ok(())
}

fn finite(kind: &'static str, points: &[Point]) -> Result<(), ModelError> {
    if points.iter().all(Point::is_finite) {
        Ok(())
    } else {
        Err(ModelError::NonFinite { kind })
    }
}
