//! SVG path-data adapter
//!
//! Converts between [`Path`] and the `d` attribute syntax used by string-based
//! preview renderers. Output is compact (`M0 0L10 0A5 5 0 0 1 20 0`) and uses
//! absolute commands only. Input accepts absolute and relative `M L H V C A Z`
//! with implicit command repetition.

use super::{Path, PathCommand};
use crate::point::Point;
use std::fmt::Write;

/// Error parsing SVG path data
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SvgPathError {
    #[error("unsupported path command '{command}' at offset {offset}")]
    UnsupportedCommand { command: char, offset: usize },
    #[error("expected a number at offset {0}")]
    ExpectedNumber(usize),
    #[error("expected an arc flag (0 or 1) at offset {0}")]
    ExpectedFlag(usize),
    #[error("path data must start with a move-to command")]
    MissingMoveTo,
}

/// Serialize a path as SVG path data
pub fn to_svg(path: &Path) -> String {
    let mut out = String::new();
    for cmd in path.commands() {
        // Writing into a String cannot fail
        let _ = match *cmd {
            PathCommand::MoveTo(p) => write!(out, "M{} {}", p.x, p.y),
            PathCommand::LineTo(p) => write!(out, "L{} {}", p.x, p.y),
            PathCommand::CurveTo { c1, c2, to } => {
                write!(out, "C{} {} {} {} {} {}", c1.x, c1.y, c2.x, c2.y, to.x, to.y)
            }
            PathCommand::Arc { radius_x, radius_y, rotation, large_arc, sweep, to } => write!(
                out,
                "A{} {} {} {} {} {} {}",
                radius_x,
                radius_y,
                rotation,
                u8::from(large_arc),
                u8::from(sweep),
                to.x,
                to.y
            ),
            PathCommand::Close => write!(out, "Z"),
        };
    }
    out
}

/// Parse SVG path data into absolute path commands
///
/// Empty or whitespace-only input yields an empty path.
pub fn parse(d: &str) -> Result<Path, SvgPathError> {
    let mut lexer = Lexer::new(d);
    let mut path = Path::new();
    let mut current = Point::zero();
    let mut subpath_start = Point::zero();
    let mut command: Option<char> = None;

    loop {
        lexer.skip_separators();
        let Some(c) = lexer.peek() else {
            break;
        };

        if c.is_ascii_alphabetic() {
            lexer.bump();
            command = Some(c);
        }

        let Some(cmd) = command else {
            return Err(SvgPathError::MissingMoveTo);
        };
        if path.is_empty() && !matches!(cmd, 'M' | 'm') {
            return Err(SvgPathError::MissingMoveTo);
        }

        let relative = cmd.is_ascii_lowercase();
        let base = if relative { current } else { Point::zero() };

        match cmd.to_ascii_uppercase() {
            'M' => {
                let p = lexer.point()?.add(&base);
                path.move_to(p);
                current = p;
                subpath_start = p;
                // Coordinates following a move-to are implicit line-tos
                command = Some(if relative { 'l' } else { 'L' });
            }
            'L' => {
                let p = lexer.point()?.add(&base);
                path.line_to(p);
                current = p;
            }
            'H' => {
                let x = lexer.number()? + base.x;
                current = Point::new(x, current.y);
                path.line_to(current);
            }
            'V' => {
                let y = lexer.number()? + base.y;
                current = Point::new(current.x, y);
                path.line_to(current);
            }
            'C' => {
                let c1 = lexer.point()?.add(&base);
                let c2 = lexer.point()?.add(&base);
                let to = lexer.point()?.add(&base);
                path.push(PathCommand::CurveTo { c1, c2, to });
                current = to;
            }
            'A' => {
                let radius_x = lexer.number()?;
                let radius_y = lexer.number()?;
                let rotation = lexer.number()?;
                let large_arc = lexer.flag()?;
                let sweep = lexer.flag()?;
                let to = lexer.point()?.add(&base);
                path.push(PathCommand::Arc { radius_x, radius_y, rotation, large_arc, sweep, to });
                current = to;
            }
            'Z' => {
                path.close();
                current = subpath_start;
                command = None;
            }
            _ => {
                return Err(SvgPathError::UnsupportedCommand { command: cmd, offset: lexer.pos.saturating_sub(1) });
            }
        }
    }

    Ok(path)
}

struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self { src: src.as_bytes(), pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src.get(self.pos).map(|b| *b as char)
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn skip_separators(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_ascii_whitespace() || c == ',') {
            self.bump();
        }
    }

    fn point(&mut self) -> Result<Point, SvgPathError> {
        let x = self.number()?;
        let y = self.number()?;
        Ok(Point::new(x, y))
    }

    fn flag(&mut self) -> Result<bool, SvgPathError> {
        self.skip_separators();
        let flag = match self.peek() {
            Some('0') => false,
            Some('1') => true,
            _ => return Err(SvgPathError::ExpectedFlag(self.pos)),
        };
        self.bump();
        Ok(flag)
    }

    fn number(&mut self) -> Result<f64, SvgPathError> {
        self.skip_separators();
        let start = self.pos;

        if matches!(self.peek(), Some('+' | '-')) {
            self.bump();
        }
        let int_digits = self.digits();
        let mut frac_digits = 0;
        if self.peek() == Some('.') {
            self.bump();
            frac_digits = self.digits();
        }
        if int_digits + frac_digits == 0 {
            return Err(SvgPathError::ExpectedNumber(start));
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            let mark = self.pos;
            self.bump();
            if matches!(self.peek(), Some('+' | '-')) {
                self.bump();
            }
            if self.digits() == 0 {
                self.pos = mark;
            }
        }

        std::str::from_utf8(&self.src[start..self.pos])
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or(SvgPathError::ExpectedNumber(start))
    }

    fn digits(&mut self) -> usize {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
        self.pos - start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_svg_compact_format() {
        let mut path = Path::new();
        path.move_to(Point::new(0.0, 0.0))
            .line_to(Point::new(10.5, 0.0))
            .push(PathCommand::Arc {
                radius_x: 5.0,
                radius_y: 5.0,
                rotation: 0.0,
                large_arc: false,
                sweep: true,
                to: Point::new(20.0, 0.0),
            })
            .close();
        assert_eq!(to_svg(&path), "M0 0L10.5 0A5 5 0 0 1 20 0Z");
    }

    #[test]
    fn test_parse_absolute() {
        let path = parse("M0 0 L 10,0 L10 10 Z").unwrap();
        assert_eq!(path.vertices(false), vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
        ]);
        assert_eq!(path.commands().last(), Some(&PathCommand::Close));
    }

    #[test]
    fn test_parse_relative_and_implicit() {
        let path = parse("m10 10 5 0 0 5h-5v-5").unwrap();
        assert_eq!(path.vertices(false), vec![
            Point::new(10.0, 10.0),
            Point::new(15.0, 10.0),
            Point::new(15.0, 15.0),
            Point::new(10.0, 15.0),
            Point::new(10.0, 10.0),
        ]);
    }

    #[test]
    fn test_parse_compact_numbers_and_flags() {
        let path = parse("M0-1.5e1A5 5 0 01 20 0C1 2 3 4 5 6").unwrap();
        assert_eq!(path.commands()[0], PathCommand::MoveTo(Point::new(0.0, -15.0)));
        assert!(matches!(
            path.commands()[1],
            PathCommand::Arc { large_arc: false, sweep: true, to, .. } if to == Point::new(20.0, 0.0)
        ));
        assert!(matches!(path.commands()[2], PathCommand::CurveTo { .. }));
    }

    #[test]
    fn test_round_trip_through_string() {
        let d = "M0 0A10 10 0 0 1 20 0A10 10 0 0 1 30 0";
        assert_eq!(to_svg(&parse(d).unwrap()), d);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("").unwrap().is_empty());
        assert_eq!(parse("L1 1"), Err(SvgPathError::MissingMoveTo));
        assert_eq!(parse("10 10"), Err(SvgPathError::MissingMoveTo));
        assert!(matches!(parse("M0 0Q1 1 2 2"), Err(SvgPathError::UnsupportedCommand { command: 'Q', .. })));
        assert!(matches!(parse("M0 0L1"), Err(SvgPathError::ExpectedNumber(_))));
        assert!(matches!(parse("M0 0A5 5 0 2 1 3 3"), Err(SvgPathError::ExpectedFlag(_))));
    }
}
