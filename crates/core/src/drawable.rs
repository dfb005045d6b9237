//! Live, user-editable shapes
//!
//! A [`Drawable`] is what the editing surface holds while the user draws:
//! geometry in canvas pixels, the drawing tool's kind tag, style options and
//! the path strategy that tells the renderer whether straight edges should be
//! reinterpreted as cloud arcs or arrows. Export-only kinds (ruler, area,
//! cloud polygon) are derived from these by the classifier.

use crate::paths::PathStrategy;
use crate::point::Point;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// Unique identifier for drawables on a surface
pub type DrawableId = uuid::Uuid;

/// Kind tag set by the drawing tool that created a shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeTag {
    Rectangle,
    Polygon,
    Circle,
    CircleMarker,
    Line,
    Marker,
    Text,
    CloudPolygon,
    Ruler,
    Area,
    /// Temporary line drawn to calibrate the scale; never exported
    Calibrate,
}

impl ShapeTag {
    /// Measurement tools keep their own colors when the user picks a new one
    pub fn is_measurement(&self) -> bool {
        matches!(self, ShapeTag::Ruler | ShapeTag::Area | ShapeTag::Calibrate)
    }

    pub fn is_exportable(&self) -> bool {
        !matches!(self, ShapeTag::Calibrate)
    }
}

/// Editable geometry in canvas pixel units
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// Circle with a radius in canvas pixels
    Circle { center: Point, radius: f64 },
    /// Fixed-size dot
    CircleMarker { center: Point },
    Polyline { points: Vec<Point> },
    /// Outer ring first; rings are open (last point differs from the first)
    Polygon { rings: Vec<Vec<Point>> },
    /// Multi-part polyline; editable but not exportable
    MultiPolyline { lines: Vec<Vec<Point>> },
    /// Icon marker, or a text box when `text` is set
    Marker { position: Point, text: Option<String> },
}

/// Boundary geometry of a drawable, shaped like GeoJSON geometries
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Point),
    LineString(Vec<Point>),
    Polygon(Vec<Vec<Point>>),
    MultiLineString(Vec<Vec<Point>>),
}

impl Geometry {
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::LineString(_) => "LineString",
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiLineString(_) => "MultiLineString",
        }
    }
}

/// Style options of a drawable
///
/// Unknown options are preserved in `extra` so that they survive a JSON
/// round-trip untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeOptions {
    /// Outline color as `#rrggbb`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    /// Stroke width in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    /// Circle radius in canvas pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ShapeOptions {
    pub fn with_color(color: impl Into<String>) -> Self {
        Self { color: Some(color.into()), ..Self::default() }
    }
}

/// A shape on the editing surface
#[derive(Debug, Clone, PartialEq)]
pub struct Drawable {
    id: DrawableId,
    pub primitive: Primitive,
    pub tag: ShapeTag,
    pub options: ShapeOptions,
    pub strategy: PathStrategy,
    /// Bound label text: ruler distance, area value or tooltip
    pub label: Option<String>,
}

impl Drawable {
    /// Create a drawable with a fresh identity and default styling
    pub fn new(primitive: Primitive, tag: ShapeTag) -> Self {
        Self {
            id: DrawableId::new_v4(),
            primitive,
            tag,
            options: ShapeOptions::default(),
            strategy: PathStrategy::default(),
            label: None,
        }
    }

    pub fn rectangle(top_left: Point, bottom_right: Point) -> Self {
        let ring = vec![
            top_left,
            Point::new(bottom_right.x, top_left.y),
            bottom_right,
            Point::new(top_left.x, bottom_right.y),
        ];
        Self::new(Primitive::Polygon { rings: vec![ring] }, ShapeTag::Rectangle)
    }

    pub fn polygon(ring: Vec<Point>) -> Self {
        Self::new(Primitive::Polygon { rings: vec![ring] }, ShapeTag::Polygon)
    }

    pub fn circle(center: Point, radius: f64) -> Self {
        Self::new(Primitive::Circle { center, radius }, ShapeTag::Circle)
    }

    pub fn line(points: Vec<Point>) -> Self {
        Self::new(Primitive::Polyline { points }, ShapeTag::Line)
    }

    pub fn marker(position: Point) -> Self {
        Self::new(Primitive::Marker { position, text: None }, ShapeTag::Marker)
    }

    pub fn text(position: Point, text: impl Into<String>) -> Self {
        Self::new(Primitive::Marker { position, text: Some(text.into()) }, ShapeTag::Text)
    }

    /// A polygon drawn with the cloud tool
    pub fn cloud(ring: Vec<Point>) -> Self {
        Self::new(Primitive::Polygon { rings: vec![ring] }, ShapeTag::CloudPolygon)
            .with_strategy(PathStrategy::Cloud)
    }

    /// A two-point line drawn with the ruler tool
    pub fn ruler(start: Point, end: Point) -> Self {
        Self::new(Primitive::Polyline { points: vec![start, end] }, ShapeTag::Ruler)
            .with_strategy(PathStrategy::Arrow)
    }

    pub fn area(ring: Vec<Point>) -> Self {
        Self::new(Primitive::Polygon { rings: vec![ring] }, ShapeTag::Area)
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.options.color = Some(color.into());
        self
    }

    pub fn with_strategy(mut self, strategy: PathStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_options(mut self, options: ShapeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn id(&self) -> DrawableId {
        self.id
    }

    /// Boundary geometry as reported by the editing surface
    pub fn boundary(&self) -> Geometry {
        match &self.primitive {
            Primitive::Circle { center, .. } | Primitive::CircleMarker { center } => Geometry::Point(*center),
            Primitive::Marker { position, .. } => Geometry::Point(*position),
            Primitive::Polyline { points } => Geometry::LineString(points.clone()),
            Primitive::Polygon { rings } => Geometry::Polygon(rings.clone()),
            Primitive::MultiPolyline { lines } => Geometry::MultiLineString(lines.clone()),
        }
    }
}

/// Edit lifecycle notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    Added(DrawableId),
    Removed(DrawableId),
    Changed(DrawableId),
}

impl SurfaceEvent {
    pub fn id(&self) -> DrawableId {
        match *self {
            SurfaceEvent::Added(id) | SurfaceEvent::Removed(id) | SurfaceEvent::Changed(id) => id,
        }
    }
}

/// Receives edit notifications from a surface
pub trait SurfaceListener {
    fn on_event(&mut self, event: &SurfaceEvent);
}

/// Source of drawables for export and serialization
pub trait EditableSurface {
    /// Point-in-time snapshot of every drawable, in drawing order
    fn drawables(&self) -> Vec<Drawable>;
}

/// In-memory editing surface
#[derive(Default)]
pub struct Surface {
    drawables: Vec<Drawable>,
    listeners: Vec<Rc<RefCell<dyn SurfaceListener>>>,
}

impl Surface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for add/remove/change events
    pub fn subscribe(&mut self, listener: Rc<RefCell<dyn SurfaceListener>>) {
        self.listeners.push(listener);
    }

    pub fn add(&mut self, drawable: Drawable) -> DrawableId {
        let id = drawable.id();
        self.drawables.push(drawable);
        self.notify(SurfaceEvent::Added(id));
        id
    }

    pub fn remove(&mut self, id: DrawableId) -> Option<Drawable> {
        let index = self.drawables.iter().position(|d| d.id() == id)?;
        let removed = self.drawables.remove(index);
        self.notify(SurfaceEvent::Removed(id));
        Some(removed)
    }

    /// Edit a drawable in place; returns false if it does not exist
    pub fn update(&mut self, id: DrawableId, edit: impl FnOnce(&mut Drawable)) -> bool {
        let Some(drawable) = self.drawables.iter_mut().find(|d| d.id() == id) else {
            return false;
        };
        edit(drawable);
        self.notify(SurfaceEvent::Changed(id));
        true
    }

    pub fn get(&self, id: DrawableId) -> Option<&Drawable> {
        self.drawables.iter().find(|d| d.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Drawable> {
        self.drawables.iter()
    }

    pub fn len(&self) -> usize {
        self.drawables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawables.is_empty()
    }

    /// Apply `color` to every drawable except measurement shapes
    pub fn set_color(&mut self, color: &str) {
        let mut changed = Vec::new();
        for drawable in self.drawables.iter_mut().filter(|d| !d.tag.is_measurement()) {
            if drawable.options.color.as_deref() != Some(color) {
                drawable.options.color = Some(color.to_string());
                changed.push(drawable.id());
            }
        }
        for id in changed {
            self.notify(SurfaceEvent::Changed(id));
        }
    }

    /// Relabel every drawable for which `label` returns a value
    pub fn relabel(&mut self, label: impl Fn(&Drawable) -> Option<String>) {
        let mut changed = Vec::new();
        for drawable in &mut self.drawables {
            if let Some(text) = label(drawable) {
                if drawable.label.as_deref() != Some(text.as_str()) {
                    drawable.label = Some(text);
                    changed.push(drawable.id());
                }
            }
        }
        for id in changed {
            self.notify(SurfaceEvent::Changed(id));
        }
    }

    pub fn clear(&mut self) {
        let removed: Vec<DrawableId> = self.drawables.drain(..).map(|d| d.id()).collect();
        for id in removed {
            self.notify(SurfaceEvent::Removed(id));
        }
    }

    fn notify(&self, event: SurfaceEvent) {
        for listener in &self.listeners {
            listener.borrow_mut().on_event(&event);
        }
    }
}

impl EditableSurface for Surface {
    fn drawables(&self) -> Vec<Drawable> {
        self.drawables.clone()
    }
}
