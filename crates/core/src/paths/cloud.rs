//! Revision-cloud outlines
//!
//! Each straight edge of a polyline is split into chords of one arc diameter
//! (`2 * radius`) and every chord is drawn as a small circular arc, which gives
//! the scalloped "cloud" look used to mark revised regions of a drawing.

use super::{svg, Path, PathCommand};
use crate::point::Point;

/// Points between which cloud arcs are drawn
///
/// The first point of `points` is kept, then every edge contributes its
/// intermediate points spaced `2 * radius` apart followed by the edge's end
/// point. The final chord of an edge is shorter when the edge length is not a
/// multiple of the arc diameter, so no gap is left at the corner.
pub fn cloud_points(points: &[Point], radius: f64) -> Vec<Point> {
    let Some(first) = points.first() else {
        return Vec::new();
    };

    if !(radius.is_finite() && radius > 0.0) {
        return points.to_vec();
    }

    let mut out = vec![*first];
    for pair in points.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        let length = start.distance(&end);
        if length == 0.0 {
            continue;
        }

        let step = 2.0 * radius / length;
        let mut t = step;
        // Tolerance keeps a chord that lands on the endpoint from being
        // emitted twice due to accumulated rounding.
        while t < 1.0 - 1e-9 {
            out.push(start.lerp(&end, t));
            t += step;
        }
        out.push(end);
    }

    out
}

/// Cloud path through `points` with arcs of the given radius
///
/// Arcs bulge to the left of the direction of travel in a y-down coordinate
/// system. Set `invert` to flip the sweep, which is needed for rectangles whose
/// vertices are wound the other way.
pub fn cloud_path(points: &[Point], radius: f64, invert: bool) -> Path {
    let Some(first) = points.first() else {
        return Path::new();
    };

    let mut path = Path::new();
    path.move_to(*first);
    for to in cloud_points(points, radius).into_iter().skip(1) {
        path.push(PathCommand::Arc {
            radius_x: radius,
            radius_y: radius,
            rotation: 0.0,
            large_arc: false,
            sweep: !invert,
            to,
        });
    }

    path
}

/// Rebuild an existing straight-edge path as a cloud
///
/// Only move-to and line-to vertices are used. A trailing close command is
/// replayed as a final line back to the first vertex so closed rings get a
/// cloud edge on their closing side too.
pub fn cloud_path_from_path(path: &Path, radius: f64, invert: bool) -> Path {
    if path.is_empty() {
        return Path::new();
    }

    cloud_path(&path.vertices(true), radius, invert)
}

/// String boundary variant of [`cloud_path_from_path`]
pub fn cloud_path_from_svg(d: &str, radius: f64, invert: bool) -> Result<String, svg::SvgPathError> {
    let path = svg::parse(d)?;
    Ok(svg::to_svg(&cloud_path_from_path(&path, radius, invert)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_even_split() {
        let pts = [Point::new(0.0, 0.0), Point::new(40.0, 0.0)];
        let cloud = cloud_points(&pts, 10.0);
        assert_eq!(cloud, vec![Point::new(0.0, 0.0), Point::new(20.0, 0.0), Point::new(40.0, 0.0)]);
    }

    #[test]
    fn test_uneven_split_appends_endpoint() {
        let pts = [Point::new(0.0, 0.0), Point::new(50.0, 0.0)];
        let cloud = cloud_points(&pts, 10.0);
        let xs: Vec<f64> = cloud.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 20.0, 40.0, 50.0]);
    }

    #[test]
    fn test_shared_corners_not_duplicated() {
        let pts = [Point::new(0.0, 0.0), Point::new(20.0, 0.0), Point::new(20.0, 20.0)];
        let cloud = cloud_points(&pts, 10.0);
        assert_eq!(cloud.len(), 3);
    }

    #[test]
    fn test_path_shape() {
        let pts = [Point::new(0.0, 0.0), Point::new(50.0, 0.0)];
        let path = cloud_path(&pts, 10.0, false);
        assert_eq!(path.commands()[0], PathCommand::MoveTo(pts[0]));
        assert_eq!(path.len(), 4);
        assert!(path.commands()[1..].iter().all(|c| matches!(
            c,
            PathCommand::Arc { sweep: true, large_arc: false, radius_x, radius_y, .. }
                if *radius_x == 10.0 && *radius_y == 10.0
        )));

        let inverted = cloud_path(&pts, 10.0, true);
        assert!(matches!(inverted.commands()[1], PathCommand::Arc { sweep: false, .. }));
    }

    #[test]
    fn test_from_path_replays_close() {
        let ring = [Point::new(0.0, 0.0), Point::new(20.0, 0.0), Point::new(20.0, 20.0)];
        let path = Path::polyline(&ring, true);
        let cloud = cloud_path_from_path(&path, 10.0, false);
        assert_eq!(cloud.commands().last().and_then(|c| c.end_point()), Some(ring[0]));
    }

    #[test]
    fn test_empty_inputs() {
        assert!(cloud_path(&[], 10.0, false).is_empty());
        assert!(cloud_path_from_path(&Path::new(), 10.0, false).is_empty());
        assert_eq!(cloud_path_from_svg("", 10.0, false).unwrap(), "");
    }

    #[test]
    fn test_two_point_line_produces_arcs() {
        let d = cloud_path_from_svg("M0 0L30 0", 10.0, false).unwrap();
        assert_eq!(d, "M0 0A10 10 0 0 1 20 0A10 10 0 0 1 30 0");
    }

    proptest! {
        #[test]
        fn prop_cloud_starts_and_ends_on_segment(
            px in -500.0f64..500.0, py in -500.0f64..500.0,
            qx in -500.0f64..500.0, qy in -500.0f64..500.0,
            r in 0.5f64..50.0,
        ) {
            let p = Point::new(px, py);
            let q = Point::new(qx, qy);
            prop_assume!(p.distance(&q) > 1e-6);

            let cloud = cloud_points(&[p, q], r);
            prop_assert_eq!(cloud[0], p);
            prop_assert_eq!(*cloud.last().unwrap(), q);

            let length = p.distance(&q);
            for (i, chord) in cloud.windows(2).enumerate() {
                let d = chord[0].distance(&chord[1]);
                let last = i + 2 == cloud.len();
                if last {
                    prop_assert!(d <= 2.0 * r + 1e-6 * (1.0 + length));
                } else {
                    prop_assert!((d - 2.0 * r).abs() < 1e-6 * (1.0 + length));
                }
            }

            // Every cloud point lies on the segment at its parameter value
            for (k, point) in cloud.iter().enumerate().take(cloud.len() - 1) {
                let ideal = p.lerp(&q, (k as f64 * 2.0 * r / length).min(1.0));
                prop_assert!(point.distance(&ideal) <= r);
            }
        }
    }
}
