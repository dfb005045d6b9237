//! Double-headed arrow paths
//!
//! Used by the ruler: an open chevron is drawn at each end of a polyline,
//! optionally together with the polyline itself.

use super::{svg, Path};
use crate::point::Point;
use std::f64::consts::FRAC_PI_4;

/// Wing and tip points of an arrowhead at `tip`, coming from `from`
///
/// The segment normal is rotated by 45° and 135° to get the two wing
/// directions, each resized to `length`. Returns `[left_wing, tip, right_wing]`.
pub fn arrowhead(from: Point, tip: Point, length: f64) -> [Point; 3] {
    let normal = from.segment_normal(&tip);
    let left = normal.rotate(FRAC_PI_4).resize(length);
    let right = normal.rotate(FRAC_PI_4 * 3.0).resize(length);

    [tip.add(&left), tip, tip.add(&right)]
}

/// Arrowheads at both ends of `points`
///
/// With `include_line` the polyline itself is emitted first. Fewer than two
/// points is not an error and yields an empty path.
pub fn arrow_path(points: &[Point], length: f64, include_line: bool) -> Path {
    let n = points.len();
    if n < 2 {
        return Path::new();
    }

    let mut path = if include_line { Path::polyline(points, false) } else { Path::new() };
    push_chevron(&mut path, arrowhead(points[1], points[0], length));
    push_chevron(&mut path, arrowhead(points[n - 2], points[n - 1], length));
    path
}

fn push_chevron(path: &mut Path, [left, tip, right]: [Point; 3]) {
    path.move_to(left).line_to(tip).line_to(right);
}

/// Arrowheads for an existing straight-edge path
///
/// Paths with fewer than two commands, or fewer than two move/line vertices,
/// produce an empty path.
pub fn arrow_path_from_path(path: &Path, length: f64, include_line: bool) -> Path {
    if path.len() < 2 {
        return Path::new();
    }

    arrow_path(&path.vertices(false), length, include_line)
}

/// String boundary variant of [`arrow_path_from_path`]
pub fn arrow_path_from_svg(d: &str, length: f64, include_line: bool) -> Result<String, svg::SvgPathError> {
    let path = svg::parse(d)?;
    Ok(svg::to_svg(&arrow_path_from_path(&path, length, include_line)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::PathCommand;
    use proptest::prelude::*;

    #[test]
    fn test_arrowhead_wings_point_backwards() {
        let [left, tip, right] = arrowhead(Point::new(0.0, 0.0), Point::new(100.0, 0.0), 10.0);
        assert_eq!(tip, Point::new(100.0, 0.0));
        assert!(left.x < tip.x && right.x < tip.x);
        assert!((left.y + right.y).abs() < 1e-9);
    }

    #[test]
    fn test_chevrons_only() {
        let pts = [Point::new(0.0, 0.0), Point::new(50.0, 0.0)];
        let path = arrow_path(&pts, 10.0, false);
        assert_eq!(path.len(), 6);
        assert!(matches!(path.commands()[0], PathCommand::MoveTo(_)));
        assert!(matches!(path.commands()[3], PathCommand::MoveTo(_)));
        assert_eq!(path.commands()[1], PathCommand::LineTo(pts[0]));
        assert_eq!(path.commands()[4], PathCommand::LineTo(pts[1]));
    }

    #[test]
    fn test_include_line() {
        let pts = [Point::new(0.0, 0.0), Point::new(10.0, 10.0), Point::new(50.0, 0.0)];
        let path = arrow_path(&pts, 10.0, true);
        assert_eq!(path.len(), 3 + 6);
        assert_eq!(path.commands()[0], PathCommand::MoveTo(pts[0]));
        assert_eq!(path.commands()[2], PathCommand::LineTo(pts[2]));
    }

    #[test]
    fn test_svg_line_with_arrowheads() {
        let d = arrow_path_from_svg("M0 0 L60 0 L100 30", 10.0, true).unwrap();
        let path = svg::parse(&d).unwrap();
        let cmds = path.commands();
        assert_eq!(cmds.len(), 3 + 6);
        assert_eq!(cmds[0], PathCommand::MoveTo(Point::new(0.0, 0.0)));
        assert_eq!(cmds[2], PathCommand::LineTo(Point::new(100.0, 30.0)));

        let PathCommand::MoveTo(start_wing) = cmds[3] else {
            panic!("chevron must start with a move-to");
        };
        assert_eq!(cmds[4], PathCommand::LineTo(Point::new(0.0, 0.0)));
        assert!((start_wing.distance(&Point::new(0.0, 0.0)) - 10.0).abs() < 1e-3);
        assert!(start_wing.x > 0.0);
        assert_eq!(cmds[7], PathCommand::LineTo(Point::new(100.0, 30.0)));
    }

    #[test]
    fn test_degenerate_inputs_are_empty() {
        assert!(arrow_path(&[], 10.0, true).is_empty());
        assert!(arrow_path(&[Point::new(1.0, 1.0)], 10.0, true).is_empty());
        assert_eq!(arrow_path_from_svg("M0 0", 10.0, false).unwrap(), "");
    }

    proptest! {
        #[test]
        fn prop_wings_are_equidistant_from_tip(
            coords in prop::collection::vec((-1000.0f64..1000.0, -1000.0f64..1000.0), 2..8),
            length in 1.0f64..50.0,
        ) {
            let pts: Vec<Point> = coords.into_iter().map(Point::from).collect();
            prop_assume!(pts[0].distance(&pts[1]) > 1.0);
            prop_assume!(pts[pts.len() - 2].distance(&pts[pts.len() - 1]) > 1.0);

            let path = arrow_path(&pts, length, false);
            prop_assert_eq!(path.len(), 6);

            for chevron in path.commands().chunks(3) {
                let [PathCommand::MoveTo(left), PathCommand::LineTo(tip), PathCommand::LineTo(right)] = chevron else {
                    return Err(TestCaseError::fail("chevron must be move/line/line"));
                };
                prop_assert!((left.distance(tip) - length).abs() < 1e-3);
                prop_assert!((right.distance(tip) - length).abs() < 1e-3);
            }
        }
    }
}
