//! Drawable to annotation classification
//!
//! A single match over the drawing tool's kind tag decides which annotation a
//! drawable exports as; the path strategy upgrades polygons to clouds and lines
//! to rulers. Point geometry stays in canvas pixels here. Circle radii and
//! area centroids are converted to page units because they do not go through
//! the per-point mapping later.

use crate::annotation::{Annotation, ModelError};
use crate::color::{ColorError, RgbColor};
use crate::config::ExportConfig;
use crate::drawable::{Drawable, Geometry, Primitive, ShapeTag};
use crate::measurement::{polygon_centroid, UNCALIBRATED};
use crate::paths::PathStrategy;
use crate::point::Point;
use crate::transform::{PageTransform, TransformError};

/// Errors turning a drawable into an annotation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassifyError {
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error(transparent)]
    Color(#[from] ColorError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("{tag:?} shape cannot have {geometry} geometry")]
    GeometryMismatch { tag: ShapeTag, geometry: &'static str },
    #[error("{0:?} shapes are not exported")]
    NotExportable(ShapeTag),
}

/// Classify one drawable, leaving its point geometry in canvas pixels
pub fn classify(drawable: &Drawable, transform: &PageTransform, config: &ExportConfig) -> Result<Annotation, ClassifyError> {
    let tag = drawable.tag;
    let geometry = drawable.boundary();
    let mismatch = ClassifyError::GeometryMismatch { tag, geometry: geometry.type_name() };

    if let Geometry::MultiLineString(_) = geometry {
        return Err(TransformError::UnsupportedGeometry("MultiLineString").into());
    }

    let annotation = match tag {
        ShapeTag::Rectangle | ShapeTag::Polygon | ShapeTag::CloudPolygon => {
            let Geometry::Polygon(rings) = geometry else {
                return Err(mismatch);
            };
            let color = outline_color(drawable, config)?;
            if tag == ShapeTag::CloudPolygon || drawable.strategy == PathStrategy::Cloud {
                Annotation::CloudPolygon { rings, color, invert: tag == ShapeTag::Rectangle }
            } else if tag == ShapeTag::Rectangle {
                Annotation::Rectangle { rings, color }
            } else {
                Annotation::Polygon { rings, color }
            }
        }
        ShapeTag::Area => {
            let Geometry::Polygon(rings) = geometry else {
                return Err(mismatch);
            };
            let outer = rings.first().map(Vec::as_slice).unwrap_or_default();
            let centroid = polygon_centroid(outer)
                .map(|c| transform.to_page(c))
                .unwrap_or_else(Point::zero);
            Annotation::Area { rings, centroid, label: label_or_placeholder(drawable), color: outline_color(drawable, config)? }
        }
        ShapeTag::Circle | ShapeTag::CircleMarker => {
            let radius = match drawable.primitive {
                Primitive::Circle { radius, .. } => radius,
                Primitive::CircleMarker { .. } => config.circle_marker_radius,
                _ => return Err(mismatch),
            };
            let Geometry::Point(center) = geometry else {
                return Err(mismatch);
            };
            Annotation::Circle { center, radius: transform.to_page_radius(radius), color: outline_color(drawable, config)? }
        }
        ShapeTag::Line | ShapeTag::Ruler => {
            let Geometry::LineString(points) = geometry else {
                return Err(mismatch);
            };
            let color = outline_color(drawable, config)?;
            if tag == ShapeTag::Ruler || drawable.strategy == PathStrategy::Arrow {
                Annotation::Ruler { points, label: label_or_placeholder(drawable), color }
            } else {
                Annotation::Line { points, color }
            }
        }
        ShapeTag::Marker | ShapeTag::Text => {
            let Geometry::Point(position) = geometry else {
                return Err(mismatch);
            };
            match (&drawable.primitive, tag) {
                (Primitive::Marker { text: Some(text), .. }, _) => Annotation::Text { position, text: text.trim().to_string() },
                (_, ShapeTag::Text) => Annotation::Text { position, text: String::new() },
                _ => Annotation::Marker { position },
            }
        }
        ShapeTag::Calibrate => return Err(ClassifyError::NotExportable(tag)),
    };

    Ok(annotation)
}

/// Classify every exportable drawable, map it to page space and validate it
///
/// Calibration lines are skipped. The first failing drawable aborts the
/// whole batch.
pub fn classify_all(drawables: &[Drawable], transform: &PageTransform, config: &ExportConfig) -> Result<Vec<Annotation>, ClassifyError> {
    let mut annotations = Vec::with_capacity(drawables.len());
    for drawable in drawables.iter().filter(|d| d.tag.is_exportable()) {
        let annotation = classify(drawable, transform, config)?.to_page_space(transform);
        annotation.validate()?;
        annotations.push(annotation);
    }

    log::debug!("classified {} of {} drawables", annotations.len(), drawables.len());
    Ok(annotations)
}

fn outline_color(drawable: &Drawable, config: &ExportConfig) -> Result<RgbColor, ColorError> {
    match drawable.options.color.as_deref() {
        Some(hex) => RgbColor::from_hex(hex),
        None => config.default_color(),
    }
}

fn label_or_placeholder(drawable: &Drawable) -> String {
    drawable.label.clone().unwrap_or_else(|| UNCALIBRATED.to_string())
}
