//! Content-stream emitter
//!
//! Turns page-space annotations into a flat list of typed PDF drawing
//! operators. The emitter knows nothing about the document it draws into;
//! resource names for the font, the marker image and per-shape opacity states
//! come from a [`ResourceProvider`] implemented by the PDF backend.
//!
//! Cloud polygons and rulers are generated by the path generators, which work
//! top-down. Their points are flipped (`y' = page_height - y`) before
//! generation and the result is drawn under a `[1 0 0 -1 0 page_height]`
//! matrix that flips them back.

use crate::annotation::Annotation;
use crate::color::{ColorError, RgbColor};
use crate::config::ExportConfig;
use crate::font::{encode_win_ansi, FontMetrics};
use crate::paths::{arrow_path, cloud_path, Path, PathCommand};
use crate::point::{Affine, Point};
use std::f64::consts::{FRAC_PI_2, PI};
use std::sync::Arc;

/// Bézier handle length for a quarter circle
const KAPPA: f64 = 0.552_284_749_831;

/// Errors while emitting operators
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EmitError {
    #[error("{0} has not been loaded")]
    AssetNotLoaded(&'static str),
    #[error("invalid color: {0}")]
    Color(#[from] ColorError),
    #[error("failed to allocate resource: {0}")]
    Resource(String),
    #[error("page height must be positive and finite, got {0}")]
    InvalidPageHeight(f64),
}

/// Line cap style for the `J` operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCap {
    Butt = 0,
    Round = 1,
    Square = 2,
}

/// Operand of a content-stream operator
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Number(f64),
    Integer(i64),
    Name(String),
    /// Literal string bytes, already encoded for the font
    Bytes(Vec<u8>),
}

/// A single PDF content-stream operator with its operands
#[derive(Debug, Clone, PartialEq)]
pub enum ContentOp {
    /// `q`
    Save,
    /// `Q`
    Restore,
    /// `gs`
    SetGraphicsState(String),
    /// `cm`
    Transform(Affine),
    /// `m`
    MoveTo(Point),
    /// `l`
    LineTo(Point),
    /// `c`
    CurveTo(Point, Point, Point),
    /// `h`
    ClosePath,
    /// `re`
    Rectangle { x: f64, y: f64, width: f64, height: f64 },
    /// `f`
    Fill,
    /// `S`
    Stroke,
    /// `B`
    FillStroke,
    /// `b`
    CloseFillStroke,
    /// `w`
    LineWidth(f64),
    /// `J`
    LineCap(LineCap),
    /// `rg`
    FillColor(RgbColor),
    /// `RG`
    StrokeColor(RgbColor),
    /// `BT`
    BeginText,
    /// `ET`
    EndText,
    /// `Tf`
    SetFont { name: String, size: f64 },
    /// `Td`
    TextPosition(Point),
    /// `Tj`
    ShowText(Vec<u8>),
    /// `Do`
    DrawXObject(String),
}

impl ContentOp {
    pub fn operator(&self) -> &'static str {
        match self {
            ContentOp::Save => "q",
            ContentOp::Restore => "Q",
            ContentOp::SetGraphicsState(_) => "gs",
            ContentOp::Transform(_) => "cm",
            ContentOp::MoveTo(_) => "m",
            ContentOp::LineTo(_) => "l",
            ContentOp::CurveTo(..) => "c",
            ContentOp::ClosePath => "h",
            ContentOp::Rectangle { .. } => "re",
            ContentOp::Fill => "f",
            ContentOp::Stroke => "S",
            ContentOp::FillStroke => "B",
            ContentOp::CloseFillStroke => "b",
            ContentOp::LineWidth(_) => "w",
            ContentOp::LineCap(_) => "J",
            ContentOp::FillColor(_) => "rg",
            ContentOp::StrokeColor(_) => "RG",
            ContentOp::BeginText => "BT",
            ContentOp::EndText => "ET",
            ContentOp::SetFont { .. } => "Tf",
            ContentOp::TextPosition(_) => "Td",
            ContentOp::ShowText(_) => "Tj",
            ContentOp::DrawXObject(_) => "Do",
        }
    }

    pub fn operands(&self) -> Vec<Operand> {
        let numbers = |values: &[f64]| -> Vec<Operand> { values.iter().map(|v| Operand::Number(*v)).collect() };
        match self {
            ContentOp::SetGraphicsState(name) | ContentOp::DrawXObject(name) => vec![Operand::Name(name.clone())],
            ContentOp::Transform(m) => numbers(&m.to_array()),
            ContentOp::MoveTo(p) | ContentOp::LineTo(p) | ContentOp::TextPosition(p) => numbers(&[p.x, p.y]),
            ContentOp::CurveTo(c1, c2, to) => numbers(&[c1.x, c1.y, c2.x, c2.y, to.x, to.y]),
            ContentOp::Rectangle { x, y, width, height } => numbers(&[*x, *y, *width, *height]),
            ContentOp::LineWidth(w) => numbers(&[*w]),
            ContentOp::LineCap(cap) => vec![Operand::Integer(*cap as i64)],
            ContentOp::FillColor(c) | ContentOp::StrokeColor(c) => numbers(&c.components()),
            ContentOp::SetFont { name, size } => vec![Operand::Name(name.clone()), Operand::Number(*size)],
            ContentOp::ShowText(bytes) => vec![Operand::Bytes(bytes.clone())],
            ContentOp::Save
            | ContentOp::Restore
            | ContentOp::ClosePath
            | ContentOp::Fill
            | ContentOp::Stroke
            | ContentOp::FillStroke
            | ContentOp::CloseFillStroke
            | ContentOp::BeginText
            | ContentOp::EndText => Vec::new(),
        }
    }
}

/// An embedded font: resource name on the page plus its metrics
#[derive(Clone)]
pub struct FontAsset {
    pub resource_name: String,
    pub metrics: Arc<dyn FontMetrics + Send + Sync>,
}

impl std::fmt::Debug for FontAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontAsset")
            .field("resource_name", &self.resource_name)
            .field("base_font", &self.metrics.base_font())
            .finish()
    }
}

/// An embedded marker image XObject
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerAsset {
    pub resource_name: String,
}

/// Resources the emitter needs from the document it draws into
pub trait ResourceProvider {
    /// Register a graphics state with fill alpha `alpha`, returning its name
    fn opacity_state(&mut self, alpha: f64) -> Result<String, EmitError>;

    fn font(&self) -> Option<&FontAsset>;

    fn marker(&self) -> Option<&MarkerAsset>;
}

/// Where a text box is anchored
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextPlacement {
    /// Anchor is the top-left corner of the box
    TopLeft,
    /// Box centered on the anchor, rotated by `angle` radians around it and
    /// shifted by `offset` along the rotated vertical axis
    Centered { angle: f64, offset: f64 },
}

/// Emits operators for annotations with a fixed configuration
#[derive(Debug, Clone)]
pub struct Emitter {
    config: ExportConfig,
    page_height: f64,
    background: RgbColor,
    text_color: RgbColor,
}

impl Emitter {
    pub fn new(config: ExportConfig, page_height: f64) -> Result<Self, EmitError> {
        if !(page_height.is_finite() && page_height > 0.0) {
            return Err(EmitError::InvalidPageHeight(page_height));
        }
        let background = config.text_background()?;
        let text_color = config.text_color()?;
        Ok(Self { config, page_height, background, text_color })
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Operators for every annotation, in order
    ///
    /// Fails on the first annotation whose assets are missing; nothing is
    /// returned in that case.
    pub fn emit_all(&self, annotations: &[Annotation], resources: &mut dyn ResourceProvider) -> Result<Vec<ContentOp>, EmitError> {
        let mut ops = Vec::new();
        for annotation in annotations {
            ops.extend(self.emit(annotation, resources)?);
        }
        log::debug!("emitted {} operators for {} annotations", ops.len(), annotations.len());
        Ok(ops)
    }

    /// Operators for one page-space annotation
    pub fn emit(&self, annotation: &Annotation, resources: &mut dyn ResourceProvider) -> Result<Vec<ContentOp>, EmitError> {
        if annotation.needs_font() && resources.font().is_none() {
            return Err(EmitError::AssetNotLoaded("font"));
        }

        match annotation {
            Annotation::Rectangle { rings, color } | Annotation::Polygon { rings, color } => {
                self.polygon(rings, *color, resources)
            }
            Annotation::Circle { center, radius, color } => self.circle(*center, *radius, *color, resources),
            Annotation::Line { points, color } => Ok(self.line(points, *color)),
            Annotation::Marker { position } => self.marker(*position, resources),
            Annotation::Text { position, text } => self.text(text, *position, TextPlacement::TopLeft, resources),
            Annotation::CloudPolygon { rings, color, invert } => self.cloud(rings, *color, *invert, resources),
            Annotation::Ruler { points, label, color } => self.ruler(points, label, *color, resources),
            Annotation::Area { rings, centroid, label, color } => {
                let mut ops = self.polygon(rings, *color, resources)?;
                let placement = TextPlacement::Centered { angle: 0.0, offset: 0.0 };
                ops.extend(self.text(label, *centroid, placement, resources)?);
                Ok(ops)
            }
        }
    }

    fn polygon(&self, rings: &[Vec<Point>], color: RgbColor, resources: &mut dyn ResourceProvider) -> Result<Vec<ContentOp>, EmitError> {
        let mut path = Path::new();
        for ring in rings {
            path.extend(Path::polyline(ring, true));
        }
        self.translucent_shape(&path, color, None, resources)
    }

    fn circle(&self, center: Point, radius: f64, color: RgbColor, resources: &mut dyn ResourceProvider) -> Result<Vec<ContentOp>, EmitError> {
        self.translucent_shape(&circle_path(center, radius), color, None, resources)
    }

    fn cloud(&self, rings: &[Vec<Point>], color: RgbColor, invert: bool, resources: &mut dyn ResourceProvider) -> Result<Vec<ContentOp>, EmitError> {
        let mut path = Path::new();
        for ring in rings {
            let mut flipped: Vec<Point> = ring.iter().map(|p| self.flip(*p)).collect();
            if let Some(first) = flipped.first().copied() {
                flipped.push(first);
            }
            path.extend(cloud_path(&flipped, self.config.cloud_radius, invert));
            path.close();
        }
        self.translucent_shape(&path.to_cubics(), color, Some(self.flip_matrix()), resources)
    }

    /// Filled and stroked path wrapped in its own opacity state
    fn translucent_shape(
        &self,
        path: &Path,
        color: RgbColor,
        matrix: Option<Affine>,
        resources: &mut dyn ResourceProvider,
    ) -> Result<Vec<ContentOp>, EmitError> {
        let state = resources.opacity_state(self.config.shape_opacity)?;

        let mut ops = vec![ContentOp::Save, ContentOp::SetGraphicsState(state)];
        if let Some(m) = matrix {
            ops.push(ContentOp::Transform(m));
        }
        ops.extend([
            ContentOp::FillColor(color),
            ContentOp::StrokeColor(color),
            ContentOp::LineWidth(self.config.stroke_width),
        ]);
        if matrix.is_some() {
            ops.push(ContentOp::LineCap(LineCap::Round));
        }
        ops.extend(path_ops(path));
        ops.extend([ContentOp::FillStroke, ContentOp::Restore]);
        Ok(ops)
    }

    fn line(&self, points: &[Point], color: RgbColor) -> Vec<ContentOp> {
        let mut ops = vec![
            ContentOp::Save,
            ContentOp::StrokeColor(color),
            ContentOp::LineWidth(self.config.stroke_width),
            ContentOp::LineCap(LineCap::Round),
        ];
        ops.extend(path_ops(&Path::polyline(points, false)));
        ops.extend([ContentOp::Stroke, ContentOp::Restore]);
        ops
    }

    fn marker(&self, position: Point, resources: &dyn ResourceProvider) -> Result<Vec<ContentOp>, EmitError> {
        let marker = resources.marker().ok_or(EmitError::AssetNotLoaded("marker image"))?;
        let (w, h) = (self.config.marker_width, self.config.marker_height);

        Ok(vec![
            ContentOp::Save,
            ContentOp::Transform(Affine { a: w, b: 0.0, c: 0.0, d: h, e: position.x - w / 2.0, f: position.y }),
            ContentOp::DrawXObject(marker.resource_name.clone()),
            ContentOp::Restore,
        ])
    }

    fn ruler(&self, points: &[Point], label: &str, color: RgbColor, resources: &dyn ResourceProvider) -> Result<Vec<ContentOp>, EmitError> {
        let (Some(first), Some(last)) = (points.first().copied(), points.last().copied()) else {
            return Ok(Vec::new());
        };
        if points.len() != 2 {
            log::warn!("ruler has {} points, labelling its end-to-end span", points.len());
        }

        let flipped: Vec<Point> = points.iter().map(|p| self.flip(*p)).collect();
        let path = arrow_path(&flipped, self.config.arrowhead_length, true);

        let mut ops = vec![
            ContentOp::Save,
            ContentOp::Transform(self.flip_matrix()),
            ContentOp::StrokeColor(color),
            ContentOp::LineWidth(self.config.stroke_width),
            ContentOp::LineCap(LineCap::Round),
        ];
        ops.extend(path_ops(&path));
        ops.extend([ContentOp::Stroke, ContentOp::Restore]);

        let font_height = self.font_height(resources)?;
        let placement = TextPlacement::Centered { angle: label_angle(first, last), offset: font_height };
        ops.extend(self.text(label, first.midpoint(&last), placement, resources)?);
        Ok(ops)
    }

    /// Text on an opaque background box
    pub fn text(&self, text: &str, anchor: Point, placement: TextPlacement, resources: &dyn ResourceProvider) -> Result<Vec<ContentOp>, EmitError> {
        let font = resources.font().ok_or(EmitError::AssetNotLoaded("font"))?;
        let size = self.config.font_size;
        let encoded = encode_win_ansi(text);
        let width = font.metrics.width_of_encoded(&encoded, size);
        let height = font.metrics.height_at_size(size);
        let descent = -font.metrics.descender() * size / 1000.0;

        let mut ops = vec![ContentOp::Save];
        let origin = match placement {
            TextPlacement::TopLeft => Point::new(anchor.x, anchor.y - height),
            TextPlacement::Centered { angle, offset } => {
                if angle != 0.0 {
                    ops.push(ContentOp::Transform(Affine::rotate_about(anchor, angle)));
                }
                Point::new(anchor.x - width / 2.0, anchor.y - height / 2.0 + offset)
            }
        };

        ops.extend([
            ContentOp::FillColor(self.background),
            ContentOp::Rectangle { x: origin.x, y: origin.y, width, height },
            ContentOp::Fill,
            ContentOp::BeginText,
            ContentOp::SetFont { name: font.resource_name.clone(), size },
            ContentOp::FillColor(self.text_color),
            ContentOp::TextPosition(Point::new(origin.x, origin.y + descent)),
            ContentOp::ShowText(encoded),
            ContentOp::EndText,
            ContentOp::Restore,
        ]);
        Ok(ops)
    }

    fn font_height(&self, resources: &dyn ResourceProvider) -> Result<f64, EmitError> {
        let font = resources.font().ok_or(EmitError::AssetNotLoaded("font"))?;
        Ok(font.metrics.height_at_size(self.config.font_size))
    }

    fn flip(&self, p: Point) -> Point {
        Point::new(p.x, self.page_height - p.y)
    }

    fn flip_matrix(&self) -> Affine {
        Affine { a: 1.0, b: 0.0, c: 0.0, d: -1.0, e: 0.0, f: self.page_height }
    }
}

/// Rotation of a label along the segment `from -> to`, kept within
/// (-90°, 90°] so the text never reads upside down
pub fn label_angle(from: Point, to: Point) -> f64 {
    let angle = (to.y - from.y).atan2(to.x - from.x);
    if angle > FRAC_PI_2 {
        angle - PI
    } else if angle <= -FRAC_PI_2 {
        angle + PI
    } else {
        angle
    }
}

/// Four-segment Bézier approximation of a circle
pub fn circle_path(center: Point, radius: f64) -> Path {
    let k = radius * KAPPA;
    let (cx, cy, r) = (center.x, center.y, radius);
    let curve = |c1: (f64, f64), c2: (f64, f64), to: (f64, f64)| PathCommand::CurveTo {
        c1: Point::from(c1),
        c2: Point::from(c2),
        to: Point::from(to),
    };

    let mut path = Path::new();
    path.move_to(Point::new(cx + r, cy))
        .push(curve((cx + r, cy + k), (cx + k, cy + r), (cx, cy + r)))
        .push(curve((cx - k, cy + r), (cx - r, cy + k), (cx - r, cy)))
        .push(curve((cx - r, cy - k), (cx - k, cy - r), (cx, cy - r)))
        .push(curve((cx + k, cy - r), (cx + r, cy - k), (cx + r, cy)))
        .close();
    path
}

/// Path construction operators for an arc-free path
///
/// Arcs are skipped; flatten them with [`Path::to_cubics`] first.
pub fn path_ops(path: &Path) -> Vec<ContentOp> {
    path.commands()
        .iter()
        .filter_map(|cmd| match *cmd {
            PathCommand::MoveTo(p) => Some(ContentOp::MoveTo(p)),
            PathCommand::LineTo(p) => Some(ContentOp::LineTo(p)),
            PathCommand::CurveTo { c1, c2, to } => Some(ContentOp::CurveTo(c1, c2, to)),
            PathCommand::Close => Some(ContentOp::ClosePath),
            PathCommand::Arc { .. } => None,
        })
        .collect()
}
