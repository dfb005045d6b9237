//! Scale calibration and measurement labels
//!
//! Rulers and areas are measured in page points and converted to real-world
//! units through a scale factor obtained by calibration: the user draws a line
//! of known length, the host reports its length in points, and
//! [`Calibration::adjust_scale`] turns `"20m"` into `20 / length` meters per
//! point. Until that happens every label reads [`UNCALIBRATED`].

use crate::drawable::{Drawable, Geometry, ShapeTag};
use crate::point::Point;
use crate::transform::{PageTransform, TransformError};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Placeholder label shown before a scale has been set
pub const UNCALIBRATED: &str = "Uncalibrated";

/// Errors from scale calibration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalibrationError {
    #[error("Invalid actual length {0}")]
    InvalidLength(String),
    #[error("measured length must be positive, got {0}")]
    InvalidMeasuredLength(f64),
}

/// Real-world units accepted by calibration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LengthUnit {
    Feet,
    Meters,
}

impl LengthUnit {
    pub fn suffix(&self) -> &'static str {
        match self {
            LengthUnit::Feet => "ft",
            LengthUnit::Meters => "m",
        }
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

static LENGTH_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

fn length_regex() -> Option<&'static Regex> {
    LENGTH_REGEX.get_or_init(|| Regex::new(r"^(\d+)(ft|m)$").ok()).as_ref()
}

/// Parse an actual-length string such as `23ft` or `8m`
///
/// No whitespace, sign or fraction is accepted.
pub fn parse_actual_length(input: &str) -> Result<(f64, LengthUnit), CalibrationError> {
    let invalid = || CalibrationError::InvalidLength(input.to_string());
    let caps = length_regex().and_then(|re| re.captures(input)).ok_or_else(invalid)?;

    let amount: f64 = caps[1].parse().map_err(|_| invalid())?;
    let unit = match &caps[2] {
        "ft" => LengthUnit::Feet,
        "m" => LengthUnit::Meters,
        _ => return Err(invalid()),
    };
    Ok((amount, unit))
}

/// Scale from page points to real-world units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    scale_factor: f64,
    unit: Option<LengthUnit>,
}

impl Default for Calibration {
    fn default() -> Self {
        Self { scale_factor: 1.0, unit: None }
    }
}

impl Calibration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the scale from a measured length in points and the user's
    /// actual length
    ///
    /// On error the previous scale is left untouched.
    pub fn adjust_scale(&mut self, measured_length: f64, actual_length: &str) -> Result<(), CalibrationError> {
        let (amount, unit) = parse_actual_length(actual_length)?;
        if !(measured_length.is_finite() && measured_length > 0.0) {
            return Err(CalibrationError::InvalidMeasuredLength(measured_length));
        }

        self.scale_factor = amount / measured_length;
        self.unit = Some(unit);
        log::debug!("calibrated scale to {} {} per point", self.scale_factor, unit);
        Ok(())
    }

    /// Real-world units per page point
    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    pub fn unit(&self) -> Option<LengthUnit> {
        self.unit
    }

    pub fn is_calibrated(&self) -> bool {
        self.unit.is_some()
    }

    /// `"{distance:.1} {unit}"` for a length in page points
    pub fn format_distance(&self, points: f64) -> String {
        match self.unit {
            Some(unit) => format!("{:.1} {}", points * self.scale_factor, unit),
            None => UNCALIBRATED.to_string(),
        }
    }

    /// `"{area:.1} {unit}²"` for an area in square page points
    pub fn format_area(&self, square_points: f64) -> String {
        match self.unit {
            Some(unit) => format!("{:.1} {}²", square_points * self.scale_factor * self.scale_factor, unit),
            None => UNCALIBRATED.to_string(),
        }
    }
}

/// Unsigned shoelace area of a ring
pub fn polygon_area(ring: &[Point]) -> f64 {
    signed_area(ring).abs()
}

fn signed_area(ring: &[Point]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }

    let mut sum = 0.0;
    for (i, p) in ring.iter().enumerate() {
        let q = ring[(i + 1) % ring.len()];
        sum += p.x * q.y - q.x * p.y;
    }
    sum / 2.0
}

/// Area-weighted centroid of a ring
///
/// Degenerate (zero-area) rings fall back to the mean of their vertices.
pub fn polygon_centroid(ring: &[Point]) -> Option<Point> {
    if ring.is_empty() {
        return None;
    }

    let area = signed_area(ring);
    if area.abs() < f64::EPSILON {
        let n = ring.len() as f64;
        let sum = ring.iter().fold(Point::zero(), |acc, p| acc.add(p));
        return Some(sum.scale(1.0 / n));
    }

    let (mut cx, mut cy) = (0.0, 0.0);
    for (i, p) in ring.iter().enumerate() {
        let q = ring[(i + 1) % ring.len()];
        let cross = p.x * q.y - q.x * p.y;
        cx += (p.x + q.x) * cross;
        cy += (p.y + q.y) * cross;
    }
    Some(Point::new(cx / (6.0 * area), cy / (6.0 * area)))
}

/// Ruler, area and calibration measurements for the current page
#[derive(Debug, Clone, Default)]
pub struct Measurements {
    transform: Option<PageTransform>,
    calibration: Calibration,
}

impl Measurements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page and canvas dimensions measurements are computed against
    pub fn update_dimensions(&mut self, page_width: f64, page_height: f64, canvas_width: f64) -> Result<(), TransformError> {
        self.transform = Some(PageTransform::new(page_width, page_height, canvas_width)?);
        Ok(())
    }

    pub fn transform(&self) -> Option<&PageTransform> {
        self.transform.as_ref()
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn adjust_scale(&mut self, measured_length: f64, actual_length: &str) -> Result<(), CalibrationError> {
        self.calibration.adjust_scale(measured_length, actual_length)
    }

    /// Page-space length of a ruler given in canvas points
    ///
    /// Anything other than exactly two points measures 0, as does a ruler
    /// measured before the page dimensions are known.
    pub fn ruler_distance(&self, points: &[Point]) -> f64 {
        let (Some(t), [p, q]) = (self.transform.as_ref(), points) else {
            return 0.0;
        };
        t.to_page(*p).distance(&t.to_page(*q))
    }

    /// Length in points of a calibration line, reported to the host
    pub fn calibration_length(&self, points: &[Point]) -> f64 {
        self.ruler_distance(points)
    }

    pub fn format_distance(&self, points: &[Point]) -> String {
        self.calibration.format_distance(self.ruler_distance(points))
    }

    /// Page-space area of the outer ring given in canvas points
    pub fn area(&self, ring: &[Point]) -> f64 {
        let Some(t) = self.transform.as_ref() else {
            return 0.0;
        };
        let page: Vec<Point> = ring.iter().map(|p| t.to_page(*p)).collect();
        polygon_area(&page)
    }

    pub fn format_area(&self, ring: &[Point]) -> String {
        self.calibration.format_area(self.area(ring))
    }

    /// Label for a ruler or area drawable, `None` for other shapes
    pub fn label_for(&self, drawable: &Drawable) -> Option<String> {
        match (drawable.tag, drawable.boundary()) {
            (ShapeTag::Ruler, Geometry::LineString(points)) => Some(self.format_distance(&points)),
            (ShapeTag::Area, Geometry::Polygon(rings)) => {
                Some(self.format_area(rings.first().map(Vec::as_slice).unwrap_or_default()))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Vec<Point> {
        vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(1.0, 1.0), Point::new(0.0, 1.0)]
    }

    #[test]
    fn test_shoelace_unit_square() {
        assert_eq!(polygon_area(&unit_square()), 1.0);
        let mut reversed = unit_square();
        reversed.reverse();
        assert_eq!(polygon_area(&reversed), 1.0);
        assert_eq!(polygon_area(&unit_square()[..2]), 0.0);
    }

    #[test]
    fn test_centroid() {
        assert_eq!(polygon_centroid(&unit_square()), Some(Point::new(0.5, 0.5)));
        let flat = [Point::new(0.0, 0.0), Point::new(2.0, 0.0), Point::new(4.0, 0.0)];
        assert_eq!(polygon_centroid(&flat), Some(Point::new(2.0, 0.0)));
        assert_eq!(polygon_centroid(&[]), None);
    }

    #[test]
    fn test_uncalibrated_label() {
        let calibration = Calibration::new();
        assert_eq!(calibration.format_area(1.0), UNCALIBRATED);
        assert_eq!(calibration.format_distance(50.0), "Uncalibrated");
    }

    #[test]
    fn test_calibration_scale() {
        let mut calibration = Calibration::new();
        calibration.adjust_scale(100.0, "20m").unwrap();
        assert!((calibration.scale_factor() - 0.2).abs() < 1e-12);
        assert_eq!(calibration.unit(), Some(LengthUnit::Meters));
        assert_eq!(calibration.format_distance(50.0), "10.0 m");
        assert_eq!(calibration.format_area(100.0), "4.0 m²");
    }

    #[test]
    fn test_invalid_length_keeps_previous_state() {
        let mut calibration = Calibration::new();
        calibration.adjust_scale(10.0, "5ft").unwrap();
        let before = calibration;

        for bad in ["", "5", "m", "5 m", "5.5m", "-5m", "5km", "5M"] {
            assert_eq!(
                calibration.adjust_scale(10.0, bad),
                Err(CalibrationError::InvalidLength(bad.to_string()))
            );
        }
        assert!(calibration.adjust_scale(0.0, "5m").is_err());
        assert_eq!(calibration, before);
    }

    #[test]
    fn test_ruler_distance_in_page_points() {
        let mut m = Measurements::new();
        // Canvas twice the page size
        m.update_dimensions(500.0, 500.0, 1000.0).unwrap();
        let pts = [Point::new(0.0, 0.0), Point::new(200.0, 0.0)];
        assert_eq!(m.ruler_distance(&pts), 100.0);
        assert_eq!(m.ruler_distance(&pts[..1]), 0.0);

        m.adjust_scale(100.0, "20m").unwrap();
        assert_eq!(m.format_distance(&[Point::new(0.0, 0.0), Point::new(100.0, 0.0)]), "10.0 m");
    }

    #[test]
    fn test_label_for_measurement_drawables() {
        let mut m = Measurements::new();
        m.update_dimensions(100.0, 100.0, 100.0).unwrap();
        let ruler = Drawable::ruler(Point::new(0.0, 0.0), Point::new(3.0, 4.0));
        let area = Drawable::area(vec![Point::new(0.0, 0.0), Point::new(2.0, 0.0), Point::new(2.0, 2.0)]);
        let line = Drawable::line(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]);

        assert_eq!(m.label_for(&ruler).as_deref(), Some(UNCALIBRATED));
        m.adjust_scale(5.0, "5ft").unwrap();
        assert_eq!(m.label_for(&ruler).as_deref(), Some("5.0 ft"));
        assert_eq!(m.label_for(&area).as_deref(), Some("2.0 ft²"));
        assert_eq!(m.label_for(&line), None);
    }
}
