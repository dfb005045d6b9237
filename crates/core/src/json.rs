//! JSON save/restore of editable drawables
//!
//! The wire format is an array of layer objects:
//!
//! ```json
//! [{"type": "Polyline", "options": {"color": "red"}, "renderer": "ArrowRenderer",
//!   "shape": {"type": "ArrowLine", "tooltip": "10.0 m"},
//!   "latLngs": [{"lat": 0, "lng": 0}, {"lat": 10, "lng": 20}]}]
//! ```
//!
//! `lat` is the canvas y coordinate and `lng` the x coordinate. `renderer`
//! names the path strategy (`CloudPolylineRenderer`, `ArrowRenderer` or null),
//! `shape.type` distinguishes measurement shapes, and `textMarker` holds the
//! text of a text box. Unknown fields are ignored and unknown style options
//! are carried through unchanged. The format has no version field.

use crate::drawable::{Drawable, Primitive, ShapeOptions, ShapeTag};
use crate::paths::PathStrategy;
use crate::point::Point;
use serde::{Deserialize, Serialize};

const CLOUD_RENDERER: &str = "CloudPolylineRenderer";
const ARROW_RENDERER: &str = "ArrowRenderer";
const SHAPE_AREA: &str = "Area";
const SHAPE_ARROW_LINE: &str = "ArrowLine";
const SHAPE_RECTANGLE: &str = "Rectangle";

/// Errors reading or writing the JSON format
#[derive(Debug, thiserror::Error)]
pub enum JsonError {
    #[error("invalid annotation JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("entry {index}: {kind} cannot be built from {reason}")]
    InvalidGeometry { index: usize, kind: String, reason: &'static str },
}

/// A point in map coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl From<Point> for LatLng {
    fn from(p: Point) -> Self {
        Self { lat: p.y, lng: p.x }
    }
}

impl From<LatLng> for Point {
    fn from(ll: LatLng) -> Self {
        Point::new(ll.lng, ll.lat)
    }
}

/// Point, point list or nested point lists
///
/// Any other shape, such as multi-polygon rings nested three deep, lands in
/// `Other` so one unreadable entry does not fail the whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LatLngs {
    Single(LatLng),
    Line(Vec<LatLng>),
    Nested(Vec<Vec<LatLng>>),
    Other(serde_json::Value),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonShape {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
}

/// One serialized drawable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonLayer {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub options: ShapeOptions,
    #[serde(default)]
    pub renderer: Option<String>,
    #[serde(default)]
    pub shape: JsonShape,
    #[serde(rename = "latLngs", default, skip_serializing_if = "Option::is_none")]
    pub lat_lngs: Option<LatLngs>,
    #[serde(rename = "textMarker", default, skip_serializing_if = "Option::is_none")]
    pub text_marker: Option<String>,
}

/// Serialize drawables to the JSON wire format
///
/// Calibration lines are transient and left out.
pub fn encode(drawables: &[Drawable]) -> Result<String, JsonError> {
    let layers: Vec<JsonLayer> = drawables.iter().filter(|d| d.tag.is_exportable()).map(to_layer).collect();
    Ok(serde_json::to_string(&layers)?)
}

/// Parse the JSON wire format back into drawables with fresh identities
///
/// Entries without geometry, with a null type or with an unknown type are
/// skipped.
pub fn decode(json: &str) -> Result<Vec<Drawable>, JsonError> {
    let layers: Vec<JsonLayer> = serde_json::from_str(json)?;
    let mut drawables = Vec::with_capacity(layers.len());

    for (index, layer) in layers.into_iter().enumerate() {
        if let Some(drawable) = from_layer(index, layer)? {
            drawables.push(drawable);
        }
    }
    Ok(drawables)
}

pub fn to_layer(drawable: &Drawable) -> JsonLayer {
    let mut options = drawable.options.clone();
    options.extra.remove("renderer");

    let renderer = match (drawable.strategy, drawable.tag) {
        (PathStrategy::Cloud, _) | (_, ShapeTag::CloudPolygon) => Some(CLOUD_RENDERER.to_string()),
        (PathStrategy::Arrow, _) | (_, ShapeTag::Ruler) => Some(ARROW_RENDERER.to_string()),
        _ => None,
    };
    let shape = JsonShape {
        kind: match drawable.tag {
            ShapeTag::Area => Some(SHAPE_AREA.to_string()),
            ShapeTag::Ruler => Some(SHAPE_ARROW_LINE.to_string()),
            ShapeTag::Rectangle => Some(SHAPE_RECTANGLE.to_string()),
            _ => None,
        },
        tooltip: drawable.label.clone(),
    };

    let line = |points: &[Point]| points.iter().map(|p| LatLng::from(*p)).collect::<Vec<_>>();
    let nested = |lines: &[Vec<Point>]| lines.iter().map(|l| line(l)).collect::<Vec<_>>();

    let (kind, lat_lngs, text_marker) = match &drawable.primitive {
        Primitive::Circle { center, radius } => {
            options.radius = Some(*radius);
            ("Circle", LatLngs::Single((*center).into()), None)
        }
        Primitive::CircleMarker { center } => ("Circlemarker", LatLngs::Single((*center).into()), None),
        Primitive::Polyline { points } => ("Polyline", LatLngs::Line(line(points)), None),
        Primitive::MultiPolyline { lines } => ("Polyline", LatLngs::Nested(nested(lines)), None),
        Primitive::Polygon { rings } => ("Polygon", LatLngs::Nested(nested(rings)), None),
        Primitive::Marker { position, text } => ("Marker", LatLngs::Single((*position).into()), text.clone()),
    };

    JsonLayer {
        kind: Some(kind.to_string()),
        options,
        renderer,
        shape,
        lat_lngs: Some(lat_lngs),
        text_marker,
    }
}

pub fn from_layer(index: usize, layer: JsonLayer) -> Result<Option<Drawable>, JsonError> {
    let Some(kind) = layer.kind else {
        log::warn!("skipping entry {} without a type", index);
        return Ok(None);
    };
    let Some(lat_lngs) = layer.lat_lngs else {
        log::warn!("skipping {} entry {} without geometry", kind, index);
        return Ok(None);
    };
    if let LatLngs::Other(_) = lat_lngs {
        log::warn!("skipping {} entry {} with unsupported geometry", kind, index);
        return Ok(None);
    }
    let invalid = |reason| JsonError::InvalidGeometry { index, kind: kind.clone(), reason };

    let mut options = layer.options;
    options.extra.remove("renderer");

    let strategy = match layer.renderer.as_deref() {
        Some(CLOUD_RENDERER) => PathStrategy::Cloud,
        Some(ARROW_RENDERER) => PathStrategy::Arrow,
        Some(other) => {
            log::warn!("entry {} has unknown renderer {:?}, drawing straight", index, other);
            PathStrategy::Straight
        }
        None => PathStrategy::Straight,
    };
    let shape_kind = layer.shape.kind.as_deref();

    let (primitive, tag) = match kind.as_str() {
        "Circle" => {
            let LatLngs::Single(center) = lat_lngs else {
                return Err(invalid("a point list"));
            };
            let radius = options.radius.ok_or_else(|| invalid("options without a radius"))?;
            (Primitive::Circle { center: center.into(), radius }, ShapeTag::Circle)
        }
        "Circlemarker" => {
            let LatLngs::Single(center) = lat_lngs else {
                return Err(invalid("a point list"));
            };
            (Primitive::CircleMarker { center: center.into() }, ShapeTag::CircleMarker)
        }
        "Marker" => {
            let LatLngs::Single(position) = lat_lngs else {
                return Err(invalid("a point list"));
            };
            options.extra.insert("draggable".to_string(), serde_json::Value::Bool(true));
            let tag = if layer.text_marker.is_some() { ShapeTag::Text } else { ShapeTag::Marker };
            (Primitive::Marker { position: position.into(), text: layer.text_marker }, tag)
        }
        "Polyline" => {
            let primitive = match lat_lngs {
                LatLngs::Line(points) => Primitive::Polyline { points: to_points(points) },
                LatLngs::Nested(lines) => Primitive::MultiPolyline { lines: lines.into_iter().map(to_points).collect() },
                LatLngs::Single(_) | LatLngs::Other(_) => return Err(invalid("a single point")),
            };
            let tag = if strategy == PathStrategy::Arrow || shape_kind == Some(SHAPE_ARROW_LINE) {
                ShapeTag::Ruler
            } else {
                ShapeTag::Line
            };
            (primitive, tag)
        }
        "Polygon" => {
            let rings = match lat_lngs {
                LatLngs::Line(ring) => vec![open_ring(to_points(ring))],
                LatLngs::Nested(rings) => rings.into_iter().map(|r| open_ring(to_points(r))).collect(),
                LatLngs::Single(_) | LatLngs::Other(_) => return Err(invalid("a single point")),
            };
            let tag = match shape_kind {
                Some(SHAPE_AREA) => ShapeTag::Area,
                Some(SHAPE_RECTANGLE) => ShapeTag::Rectangle,
                _ if strategy == PathStrategy::Cloud => ShapeTag::CloudPolygon,
                _ => ShapeTag::Polygon,
            };
            (Primitive::Polygon { rings }, tag)
        }
        other => {
            log::warn!("skipping entry {} with unknown type {:?}", index, other);
            return Ok(None);
        }
    };

    let mut drawable = Drawable::new(primitive, tag).with_options(options).with_strategy(strategy);
    drawable.label = layer.shape.tooltip;
    Ok(Some(drawable))
}

fn to_points(lat_lngs: Vec<LatLng>) -> Vec<Point> {
    lat_lngs.into_iter().map(Point::from).collect()
}

/// Drop a repeated closing point so rings stay implicitly closed
fn open_ring(mut ring: Vec<Point>) -> Vec<Point> {
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    ring
}

#[cfg(test)]
mod tests {
    use super::*;

    /// What a round-trip must preserve, ignoring identity
    fn observable(d: &Drawable) -> (Primitive, ShapeTag, Option<String>, PathStrategy, Option<String>) {
        (d.primitive.clone(), d.tag, d.options.color.clone(), d.strategy, d.label.clone())
    }

    fn sample() -> Vec<Drawable> {
        vec![
            Drawable::circle(Point::new(10.0, 20.0), 5.0).with_color("#ff0000"),
            Drawable::new(Primitive::CircleMarker { center: Point::new(1.0, 2.0) }, ShapeTag::CircleMarker),
            Drawable::line(vec![Point::new(0.0, 0.0), Point::new(3.0, 4.0), Point::new(6.0, 0.0)]).with_color("#00ff00"),
            Drawable::ruler(Point::new(0.0, 0.0), Point::new(100.0, 0.0)).with_color("red").with_label("10.0 m"),
            Drawable::marker(Point::new(7.0, 8.0)),
            Drawable::text(Point::new(9.0, 9.0), "Check this"),
            Drawable::polygon(vec![Point::new(0.0, 0.0), Point::new(5.0, 0.0), Point::new(5.0, 5.0)]),
            Drawable::cloud(vec![Point::new(0.0, 0.0), Point::new(50.0, 0.0), Point::new(50.0, 50.0)]).with_color("#3388ff"),
            Drawable::rectangle(Point::new(0.0, 0.0), Point::new(20.0, 10.0)).with_strategy(PathStrategy::Cloud),
            Drawable::area(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(1.0, 1.0), Point::new(0.0, 1.0)])
                .with_label("1.0 m²"),
        ]
    }

    #[test]
    fn test_round_trip_preserves_observable_state() {
        let drawables = sample();
        let decoded = decode(&encode(&drawables).unwrap()).unwrap();

        assert_eq!(decoded.len(), drawables.len());
        for (a, b) in drawables.iter().zip(&decoded) {
            assert_eq!(observable(a), observable(b));
            assert_ne!(a.id(), b.id());
        }

        // A second round-trip is stable
        let again = decode(&encode(&decoded).unwrap()).unwrap();
        let first: Vec<_> = decoded.iter().map(observable).collect();
        let second: Vec<_> = again.iter().map(observable).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_wire_format_fields() {
        let ruler = Drawable::ruler(Point::new(1.0, 2.0), Point::new(3.0, 4.0)).with_label("5.0 ft");
        let value: serde_json::Value = serde_json::from_str(&encode(&[ruler]).unwrap()).unwrap();
        let layer = &value[0];

        assert_eq!(layer["type"], "Polyline");
        assert_eq!(layer["renderer"], "ArrowRenderer");
        assert_eq!(layer["shape"]["type"], "ArrowLine");
        assert_eq!(layer["shape"]["tooltip"], "5.0 ft");
        assert_eq!(layer["latLngs"][0]["lat"], 2.0);
        assert_eq!(layer["latLngs"][0]["lng"], 1.0);
        assert!(layer.get("textMarker").is_none());
    }

    #[test]
    fn test_renderer_option_is_stripped() {
        let mut options = ShapeOptions::with_color("#000000");
        options.extra.insert("renderer".into(), serde_json::json!({"_leaflet_id": 12}));
        options.extra.insert("dashArray".into(), serde_json::json!("4 4"));
        let line = Drawable::line(vec![Point::zero(), Point::new(1.0, 1.0)]).with_options(options);

        let json = encode(&[line]).unwrap();
        assert!(!json.contains("_leaflet_id"));

        let decoded = decode(&json).unwrap();
        assert_eq!(decoded[0].options.extra.get("dashArray"), Some(&serde_json::json!("4 4")));
    }

    #[test]
    fn test_decode_skips_incomplete_entries() {
        let json = r#"[
            {"type": "Marker", "options": {}, "renderer": null, "shape": {}},
            {"type": null, "options": {}, "renderer": null, "shape": {}, "latLngs": {"lat": 1, "lng": 1}},
            {"type": "Rectangle2", "options": {}, "renderer": null, "shape": {}, "latLngs": {"lat": 1, "lng": 1}},
            {"type": "Marker", "options": {}, "renderer": null, "shape": {}, "latLngs": {"lat": 1, "lng": 2}, "textMarker": "hi"}
        ]"#;
        let drawables = decode(json).unwrap();
        assert_eq!(drawables.len(), 1);
        assert_eq!(drawables[0].tag, ShapeTag::Text);
        assert_eq!(
            drawables[0].primitive,
            Primitive::Marker { position: Point::new(2.0, 1.0), text: Some("hi".into()) }
        );
        assert_eq!(drawables[0].options.extra.get("draggable"), Some(&serde_json::Value::Bool(true)));
    }

    #[test]
    fn test_decode_closed_ring_and_nested_polyline() {
        let json = r#"[
            {"type": "Polygon", "options": {}, "renderer": null, "shape": {},
             "latLngs": [{"lat": 0, "lng": 0}, {"lat": 0, "lng": 1}, {"lat": 1, "lng": 1}, {"lat": 0, "lng": 0}]},
            {"type": "Polyline", "options": {}, "renderer": null, "shape": {},
             "latLngs": [[{"lat": 0, "lng": 0}, {"lat": 1, "lng": 1}], [{"lat": 2, "lng": 2}, {"lat": 3, "lng": 3}]]}
        ]"#;
        let drawables = decode(json).unwrap();
        let Primitive::Polygon { rings } = &drawables[0].primitive else {
            panic!("expected polygon");
        };
        assert_eq!(rings[0].len(), 3);
        assert!(matches!(drawables[1].primitive, Primitive::MultiPolyline { ref lines } if lines.len() == 2));
    }

    #[test]
    fn test_decode_skips_multi_polygon_geometry() {
        let json = r#"[
            {"type": "Polygon", "options": {}, "renderer": null, "shape": {},
             "latLngs": [[[{"lat": 0, "lng": 0}, {"lat": 0, "lng": 1}, {"lat": 1, "lng": 1}]]]},
            {"type": "Circlemarker", "options": {}, "renderer": null, "shape": {}, "latLngs": {"lat": 4, "lng": 5}}
        ]"#;
        let drawables = decode(json).unwrap();
        assert_eq!(drawables.len(), 1);
        assert_eq!(drawables[0].primitive, Primitive::CircleMarker { center: Point::new(5.0, 4.0) });
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(decode("{"), Err(JsonError::Parse(_))));
        let no_radius = r#"[{"type": "Circle", "options": {}, "renderer": null, "shape": {}, "latLngs": {"lat": 1, "lng": 1}}]"#;
        assert!(matches!(decode(no_radius), Err(JsonError::InvalidGeometry { index: 0, .. })));
    }

    #[test]
    fn test_calibration_lines_are_not_encoded() {
        let calibrate = Drawable::new(
            Primitive::Polyline { points: vec![Point::zero(), Point::new(1.0, 0.0)] },
            ShapeTag::Calibrate,
        );
        assert_eq!(encode(&[calibrate]).unwrap(), "[]");
    }
}
