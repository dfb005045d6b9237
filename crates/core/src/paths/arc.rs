//! Elliptical arc flattening into cubic Béziers
//!
//! Converts SVG endpoint-parameterized arcs to center parameterization and
//! approximates each quarter-turn (or smaller) slice with one cubic curve.

use super::PathCommand;
use crate::point::Point;
use std::f64::consts::{FRAC_PI_2, PI};

/// An arc from `from` to `to` in SVG endpoint form
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndpointArc {
    pub from: Point,
    pub radius_x: f64,
    pub radius_y: f64,
    /// x-axis rotation in degrees
    pub rotation: f64,
    pub large_arc: bool,
    pub sweep: bool,
    pub to: Point,
}

/// Approximate `arc` with cubic curve commands
///
/// Coincident endpoints produce no segments; a zero radius produces a straight
/// line, matching how SVG renderers treat out-of-range parameters. The final
/// segment always ends exactly at `arc.to`.
pub fn arc_to_cubics(arc: &EndpointArc) -> Vec<PathCommand> {
    let EndpointArc { from, to, .. } = *arc;
    if from == to {
        return Vec::new();
    }

    let mut rx = arc.radius_x.abs();
    let mut ry = arc.radius_y.abs();
    if rx == 0.0 || ry == 0.0 {
        return vec![PathCommand::LineTo(to)];
    }

    let phi = arc.rotation.to_radians();
    let (sin_phi, cos_phi) = phi.sin_cos();

    // Step 1: compute (x1', y1')
    let dx2 = (from.x - to.x) / 2.0;
    let dy2 = (from.y - to.y) / 2.0;
    let x1p = cos_phi * dx2 + sin_phi * dy2;
    let y1p = -sin_phi * dx2 + cos_phi * dy2;

    // Scale radii up if they cannot span the endpoints
    let lambda = (x1p * x1p) / (rx * rx) + (y1p * y1p) / (ry * ry);
    if lambda > 1.0 {
        let s = lambda.sqrt();
        rx *= s;
        ry *= s;
    }

    // Step 2: compute (cx', cy')
    let rx2 = rx * rx;
    let ry2 = ry * ry;
    let num = rx2 * ry2 - rx2 * y1p * y1p - ry2 * x1p * x1p;
    let den = rx2 * y1p * y1p + ry2 * x1p * x1p;
    let mut coef = if den == 0.0 { 0.0 } else { (num / den).max(0.0).sqrt() };
    if arc.large_arc == arc.sweep {
        coef = -coef;
    }
    let cxp = coef * (rx * y1p / ry);
    let cyp = coef * -(ry * x1p / rx);

    // Step 3: compute (cx, cy)
    let cx = cos_phi * cxp - sin_phi * cyp + (from.x + to.x) / 2.0;
    let cy = sin_phi * cxp + cos_phi * cyp + (from.y + to.y) / 2.0;

    // Step 4: start angle and sweep extent
    let u = Point::new((x1p - cxp) / rx, (y1p - cyp) / ry);
    let v = Point::new((-x1p - cxp) / rx, (-y1p - cyp) / ry);
    let theta1 = vector_angle(Point::new(1.0, 0.0), u);
    let mut delta = vector_angle(u, v);
    if !arc.sweep && delta > 0.0 {
        delta -= 2.0 * PI;
    } else if arc.sweep && delta < 0.0 {
        delta += 2.0 * PI;
    }

    let segments = (delta.abs() / FRAC_PI_2).ceil().max(1.0) as usize;
    let step = delta / segments as f64;
    let handle = 4.0 / 3.0 * (step / 4.0).tan();

    let map = |ux: f64, uy: f64| {
        let x = rx * ux;
        let y = ry * uy;
        Point::new(cos_phi * x - sin_phi * y + cx, sin_phi * x + cos_phi * y + cy)
    };

    let mut out = Vec::with_capacity(segments);
    let mut angle = theta1;
    for i in 0..segments {
        let next = angle + step;
        let (s1, c1) = angle.sin_cos();
        let (s2, c2) = next.sin_cos();

        let cp1 = map(c1 - handle * s1, s1 + handle * c1);
        let cp2 = map(c2 + handle * s2, s2 - handle * c2);
        let end = if i + 1 == segments { to } else { map(c2, s2) };

        out.push(PathCommand::CurveTo { c1: cp1, c2: cp2, to: end });
        angle = next;
    }

    out
}

/// Signed angle from `u` to `v`
fn vector_angle(u: Point, v: Point) -> f64 {
    let dot = u.x * v.x + u.y * v.y;
    let len = (u.x * u.x + u.y * u.y).sqrt() * (v.x * v.x + v.y * v.y).sqrt();
    let mut angle = (dot / len).clamp(-1.0, 1.0).acos();
    if u.x * v.y - u.y * v.x < 0.0 {
        angle = -angle;
    }
    angle
}
