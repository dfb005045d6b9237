mod common;

use common::{create_test_pdf, init_logging, resource_names};
use pdfmark_core::{Drawable, ExportConfig, Point, Primitive, ShapeTag, UNCALIBRATED};
use pdfmark_engine::{RasterPage, Session, SessionError};
use std::cell::Cell;
use std::rc::Rc;

/// Session over a 612x792 page rendered at scale 1, so canvas pixels are points
fn loaded_session() -> Session {
    init_logging();
    let mut session = Session::new(ExportConfig::default()).expect("session").with_render_scale(1.0);
    session.load_file(create_test_pdf(1, 612, 792), "plan.pdf").expect("load should succeed");
    session
}

#[test]
fn saving_before_loading_is_an_error() {
    let mut session = Session::new(ExportConfig::default()).expect("session");
    let err = session.save_pdf().expect_err("nothing loaded");
    assert!(matches!(err, SessionError::NotLoaded));
    assert_eq!(err.to_string(), "Cannot save PDF before PDF has been loaded");
}

#[test]
fn load_renders_the_page_canvas() {
    let session = loaded_session();
    let page: &RasterPage = session.page().expect("page should be rendered");
    assert_eq!(page.canvas.dimensions(), (612, 792));
    assert_eq!(session.canvas_width(), 612.0);
    assert_eq!(session.file_name(), Some("plan.pdf"));
    assert_eq!(session.page_number(), 1);
}

#[test]
fn render_scale_sets_the_canvas_resolution() {
    let mut session = Session::new(ExportConfig::default()).expect("session").with_render_scale(2.0);
    session.load_file(create_test_pdf(1, 300, 400), "small.pdf").expect("load should succeed");
    assert_eq!(session.canvas_width(), 600.0);
    // Two canvas pixels per point
    assert!((session.calibration_length(Point::new(0.0, 0.0), Point::new(200.0, 0.0)) - 100.0).abs() < 1e-9);
}

#[test]
fn page_number_zero_is_rejected() {
    let err = Session::new(ExportConfig::default())
        .expect("session")
        .with_page_number(0)
        .err()
        .expect("page numbers start at 1");
    assert!(matches!(err, SessionError::InvalidPageNumber(0)));
}

#[test]
fn calibration_relabels_rulers_and_areas() {
    let mut session = loaded_session();
    let ruler = session.add(Drawable::ruler(Point::new(0.0, 0.0), Point::new(100.0, 0.0)));
    let area = session.add(Drawable::area(vec![
        Point::new(0.0, 0.0),
        Point::new(10.0, 0.0),
        Point::new(10.0, 10.0),
        Point::new(0.0, 10.0),
    ]));
    assert_eq!(session.surface().get(ruler).and_then(|d| d.label.clone()).as_deref(), Some(UNCALIBRATED));

    let measured = session.calibration_length(Point::new(0.0, 0.0), Point::new(50.0, 0.0));
    assert!((measured - 50.0).abs() < 1e-9);
    session.adjust_scale(measured, "10ft").expect("calibration should succeed");

    assert_eq!(session.surface().get(ruler).and_then(|d| d.label.clone()).as_deref(), Some("20.0 ft"));
    assert_eq!(session.surface().get(area).and_then(|d| d.label.clone()).as_deref(), Some("4.0 ft²"));
}

#[test]
fn invalid_calibration_keeps_previous_labels() {
    let mut session = loaded_session();
    let ruler = session.add(Drawable::ruler(Point::new(0.0, 0.0), Point::new(100.0, 0.0)));
    session.adjust_scale(100.0, "5m").expect("calibration should succeed");

    assert!(matches!(session.adjust_scale(100.0, "5 yards"), Err(SessionError::Calibration(_))));
    assert_eq!(session.surface().get(ruler).and_then(|d| d.label.clone()).as_deref(), Some("5.0 m"));
}

#[test]
fn set_color_skips_measurements() {
    let mut session = loaded_session();
    let line = session.add(Drawable::line(vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0)]));
    let ruler = session.add(Drawable::ruler(Point::new(0.0, 0.0), Point::new(5.0, 5.0)));

    session.set_color("#ff0000").expect("valid color");
    assert_eq!(session.surface().get(line).and_then(|d| d.options.color.clone()).as_deref(), Some("#ff0000"));
    assert_ne!(session.surface().get(ruler).and_then(|d| d.options.color.clone()).as_deref(), Some("#ff0000"));

    assert!(matches!(session.set_color("red"), Err(SessionError::Color(_))));
}

#[test]
fn json_round_trip_restores_drawables() {
    let mut session = loaded_session();
    session.add(Drawable::polygon(vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(5.0, 8.0)]));
    session.add(Drawable::text(Point::new(20.0, 20.0), "Check"));
    let json = session.to_json().expect("encode should succeed");

    let mut restored = loaded_session();
    assert_eq!(restored.import_json(&json).expect("decode should succeed"), 2);
    let tags: Vec<ShapeTag> = restored.surface().iter().map(|d| d.tag).collect();
    assert_eq!(tags, vec![ShapeTag::Polygon, ShapeTag::Text]);
    let text = restored.surface().iter().find(|d| d.tag == ShapeTag::Text).expect("text restored");
    assert!(matches!(&text.primitive, Primitive::Marker { text: Some(t), .. } if t == "Check"));
}

#[test]
fn json_import_keeps_saved_measurement_labels() {
    let mut session = loaded_session();
    session.adjust_scale(100.0, "20m").expect("calibration should succeed");
    session.add(Drawable::ruler(Point::new(0.0, 0.0), Point::new(50.0, 0.0)));
    let json = session.to_json().expect("encode should succeed");
    assert!(json.contains("10.0 m"));

    let mut restored = loaded_session();
    restored.import_json(&json).expect("decode should succeed");
    let ruler = restored.surface().iter().find(|d| d.tag == ShapeTag::Ruler).expect("ruler restored");
    assert_eq!(ruler.label.as_deref(), Some("10.0 m"));

    let unlabelled = r#"[{"type": "Polyline", "options": {}, "renderer": "ArrowRenderer", "shape": {"type": "ArrowLine"},
        "latLngs": [{"lat": 0, "lng": 0}, {"lat": 0, "lng": 30}]}]"#;
    restored.import_json(unlabelled).expect("decode should succeed");
    assert!(restored.surface().iter().any(|d| d.label.as_deref() == Some(UNCALIBRATED)));
}

#[test]
fn change_callback_fires_once_per_refresh_and_resets_on_save() {
    let mut session = loaded_session();
    let fired = Rc::new(Cell::new(0));
    let counter = fired.clone();
    session.on_change(move || counter.set(counter.get() + 1));

    let id = session.add(Drawable::marker(Point::new(1.0, 1.0)));
    session.update(id, |d| d.label = Some("pin".into()));
    assert!(session.refresh_changed().expect("refresh"));
    assert!(!session.refresh_changed().expect("refresh"));
    assert_eq!(fired.get(), 1);
    assert!(session.has_unsaved_changes());

    let pdf = session.save_pdf().expect("save should succeed");
    assert!(!session.has_unsaved_changes());
    assert_eq!(resource_names(&pdf, 1, b"XObject"), vec!["Im1"]);
}

#[test]
fn loading_a_new_file_clears_the_surface() {
    let mut session = loaded_session();
    session.add(Drawable::marker(Point::new(1.0, 1.0)));
    session.load_file(create_test_pdf(1, 612, 792), "other.pdf").expect("load should succeed");

    assert!(session.surface().is_empty());
    assert!(!session.refresh_changed().expect("refresh"));
    assert_eq!(session.file_name(), Some("other.pdf"));
}
