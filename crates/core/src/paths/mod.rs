//! Procedural path generation
//!
//! Paths are typed command lists. The generators in this module never produce
//! or consume path strings internally; [`svg`] is the adapter used only at the
//! boundary with a string-based preview renderer.

pub mod arc;
pub mod arrow;
pub mod cloud;
pub mod svg;

use crate::point::Point;
use serde::{Deserialize, Serialize};

pub use arrow::{arrow_path, arrow_path_from_path, arrow_path_from_svg, arrowhead};
pub use cloud::{cloud_path, cloud_path_from_path, cloud_path_from_svg, cloud_points};

/// A single path construction command with absolute coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    /// Cubic Bézier from the current point through two control points
    CurveTo { c1: Point, c2: Point, to: Point },
    /// SVG-style elliptical arc in endpoint parameterization
    Arc {
        radius_x: f64,
        radius_y: f64,
        /// x-axis rotation in degrees
        rotation: f64,
        large_arc: bool,
        sweep: bool,
        to: Point,
    },
    Close,
}

impl PathCommand {
    /// Endpoint of the command, if it has one
    pub fn end_point(&self) -> Option<Point> {
        match *self {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => Some(p),
            PathCommand::CurveTo { to, .. } | PathCommand::Arc { to, .. } => Some(to),
            PathCommand::Close => None,
        }
    }
}

/// Ordered list of path commands
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    commands: Vec<PathCommand>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_commands(commands: Vec<PathCommand>) -> Self {
        Self { commands }
    }

    /// Straight polyline through `points`; closed when `close` is set
    pub fn polyline(points: &[Point], close: bool) -> Self {
        let mut path = Self::new();
        if let Some((first, rest)) = points.split_first() {
            path.move_to(*first);
            for p in rest {
                path.line_to(*p);
            }
            if close {
                path.close();
            }
        }
        path
    }

    pub fn move_to(&mut self, p: Point) -> &mut Self {
        self.commands.push(PathCommand::MoveTo(p));
        self
    }

    pub fn line_to(&mut self, p: Point) -> &mut Self {
        self.commands.push(PathCommand::LineTo(p));
        self
    }

    pub fn close(&mut self) -> &mut Self {
        self.commands.push(PathCommand::Close);
        self
    }

    pub fn push(&mut self, command: PathCommand) -> &mut Self {
        self.commands.push(command);
        self
    }

    pub fn extend(&mut self, other: Path) -> &mut Self {
        self.commands.extend(other.commands);
        self
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Apply `f` to every coordinate in the path, including control points
    pub fn map_points(&self, f: impl Fn(Point) -> Point) -> Path {
        let commands = self
            .commands
            .iter()
            .map(|cmd| match *cmd {
                PathCommand::MoveTo(p) => PathCommand::MoveTo(f(p)),
                PathCommand::LineTo(p) => PathCommand::LineTo(f(p)),
                PathCommand::CurveTo { c1, c2, to } => PathCommand::CurveTo { c1: f(c1), c2: f(c2), to: f(to) },
                PathCommand::Arc { radius_x, radius_y, rotation, large_arc, sweep, to } => {
                    PathCommand::Arc { radius_x, radius_y, rotation, large_arc, sweep, to: f(to) }
                }
                PathCommand::Close => PathCommand::Close,
            })
            .collect();
        Path { commands }
    }

    /// Points of the move-to and line-to commands only, in order
    ///
    /// This is how a straight-edge polyline path is read back into its vertex
    /// list. When the path ends with a close command the first point is
    /// repeated at the end if `replay_close` is set.
    pub fn vertices(&self, replay_close: bool) -> Vec<Point> {
        let mut points: Vec<Point> = self
            .commands
            .iter()
            .filter_map(|cmd| match *cmd {
                PathCommand::MoveTo(p) | PathCommand::LineTo(p) => Some(p),
                _ => None,
            })
            .collect();

        if replay_close && matches!(self.commands.last(), Some(PathCommand::Close)) {
            if let Some(first) = points.first().copied() {
                points.push(first);
            }
        }

        points
    }

    /// Replace every arc with cubic Bézier segments
    ///
    /// PDF content streams have no arc operator, so arcs are flattened before
    /// the path is turned into operators.
    pub fn to_cubics(&self) -> Path {
        let mut out = Path::new();
        let mut current = Point::zero();
        let mut subpath_start = Point::zero();

        for cmd in &self.commands {
            match *cmd {
                PathCommand::MoveTo(p) => {
                    current = p;
                    subpath_start = p;
                    out.push(*cmd);
                }
                PathCommand::Arc { radius_x, radius_y, rotation, large_arc, sweep, to } => {
                    let arc = arc::EndpointArc { from: current, radius_x, radius_y, rotation, large_arc, sweep, to };
                    for segment in arc::arc_to_cubics(&arc) {
                        out.push(segment);
                    }
                    current = to;
                }
                PathCommand::Close => {
                    current = subpath_start;
                    out.push(*cmd);
                }
                PathCommand::LineTo(p) | PathCommand::CurveTo { to: p, .. } => {
                    current = p;
                    out.push(*cmd);
                }
            }
        }

        out
    }
}

impl From<Vec<PathCommand>> for Path {
    fn from(commands: Vec<PathCommand>) -> Self {
        Self::from_commands(commands)
    }
}

/// Which procedural generator reinterprets a drawable's straight geometry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathStrategy {
    /// Straight segments as drawn
    #[default]
    Straight,
    /// Revision-cloud arcs
    Cloud,
    /// Arrowheads at both ends
    Arrow,
}
