// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! SVG path data parser using nom
//!
//! Staircase and door cut-out shapes are stored as SVG path data in a unit
//! square. Supported commands are `M L H V C S Q T Z`, absolute and
//! relative, with implicit repetition. Curves are flattened into segments.

use nalgebra::{Point2, Vector2};
use nom::{
    branch::alt,
    bytes::complete::take_while,
    character::complete::{char, digit1, one_of},
    combinator::{map_res, opt, recognize},
    multi::many0,
    sequence::{pair, preceded, tuple},
    IResult,
};

use crate::error::{Error, Result};

/// Segments used to flatten each curve
const CURVE_SEGMENTS: usize = 16;

/// Closed polygon, without repeated end point
pub type Contour = Vec<Point2<f64>>;

/// Parse whitespace and comma separators
fn separator(input: &str) -> IResult<&str, &str> {
    take_while(|c: char| c.is_ascii_whitespace() || c == ',')(input)
}

/// Parse number: 1, -1.5, .5, 2., 1e-3
fn number(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize(tuple((
            opt(one_of("+-")),
            alt((
                recognize(pair(digit1, opt(pair(char('.'), opt(digit1))))),
                recognize(pair(char('.'), digit1)),
            )),
            opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
        ))),
        |s: &str| s.parse::<f64>(),
    )(input)
}

/// Parse a command letter followed by its numbers
fn command(input: &str) -> IResult<&str, (char, Vec<f64>)> {
    pair(
        preceded(separator, one_of("MmLlHhVvCcSsQqTtZz")),
        many0(preceded(separator, number)),
    )(input)
}

/// Parses SVG path data into closed contours.
///
/// Every sub-path is considered closed, whether it ends with `Z` or not.
/// Sub-paths with less than 3 points are kept, callers filter them out.
pub fn parse_svg_path(path: &str) -> Result<Vec<Contour>> {
    let mut builder = PathBuilder::new();
    let mut rest = path;
    loop {
        let (next, _) = separator(rest).map_err(|_| invalid(path, rest, "unexpected input"))?;
        if next.is_empty() {
            return Ok(builder.finish());
        }
        let (after, (letter, arguments)) =
            command(next).map_err(|_| invalid(path, next, "expected a path command"))?;
        builder
            .apply(letter, &arguments)
            .map_err(|message| invalid(path, next, &format!("command '{letter}' {message}")))?;
        rest = after;
    }
}

fn invalid(path: &str, rest: &str, message: &str) -> Error {
    Error::InvalidSvgPath {
        offset: path.len() - rest.len(),
        message: message.to_string(),
    }
}

struct PathBuilder {
    contours: Vec<Contour>,
    current: Contour,
    position: Point2<f64>,
    start: Point2<f64>,
    /// Last control point of a cubic (`C`, `S`) or quadratic (`Q`, `T`) curve
    last_cubic_control: Option<Point2<f64>>,
    last_quadratic_control: Option<Point2<f64>>,
}

impl PathBuilder {
    fn new() -> Self {
        Self {
            contours: Vec::new(),
            current: Vec::new(),
            position: Point2::origin(),
            start: Point2::origin(),
            last_cubic_control: None,
            last_quadratic_control: None,
        }
    }

    fn apply(&mut self, letter: char, arguments: &[f64]) -> std::result::Result<(), String> {
        let relative = letter.is_ascii_lowercase();
        let arity = match letter.to_ascii_uppercase() {
            'Z' => 0,
            'H' | 'V' => 1,
            'M' | 'L' | 'T' => 2,
            'S' | 'Q' => 4,
            _ => 6,
        };
        if arity == 0 {
            if !arguments.is_empty() {
                return Err("takes no argument".to_string());
            }
            self.close();
            return Ok(());
        }
        if arguments.is_empty() || arguments.len() % arity != 0 {
            return Err(format!("expects a multiple of {arity} numbers, got {}", arguments.len()));
        }

        for (repeat, values) in arguments.chunks_exact(arity).enumerate() {
            let origin = if relative { self.position.coords } else { Vector2::zeros() };
            let point = |x: f64, y: f64| Point2::new(x, y) + origin;
            let mut cubic_control = None;
            let mut quadratic_control = None;
            match letter.to_ascii_uppercase() {
                // Pairs following a move are implicit lines
                'M' if repeat == 0 => self.move_to(point(values[0], values[1])),
                'M' | 'L' => self.line_to(point(values[0], values[1])),
                'H' => {
                    let x = if relative { self.position.x + values[0] } else { values[0] };
                    self.line_to(Point2::new(x, self.position.y));
                }
                'V' => {
                    let y = if relative { self.position.y + values[0] } else { values[0] };
                    self.line_to(Point2::new(self.position.x, y));
                }
                'C' => {
                    let control2 = point(values[2], values[3]);
                    self.cubic_to(point(values[0], values[1]), control2, point(values[4], values[5]));
                    cubic_control = Some(control2);
                }
                'S' => {
                    let control1 = self.reflected(self.last_cubic_control);
                    let control2 = point(values[0], values[1]);
                    self.cubic_to(control1, control2, point(values[2], values[3]));
                    cubic_control = Some(control2);
                }
                'Q' => {
                    let control = point(values[0], values[1]);
                    self.quadratic_to(control, point(values[2], values[3]));
                    quadratic_control = Some(control);
                }
                _ => {
                    let control = self.reflected(self.last_quadratic_control);
                    self.quadratic_to(control, point(values[0], values[1]));
                    quadratic_control = Some(control);
                }
            }
            self.last_cubic_control = cubic_control;
            self.last_quadratic_control = quadratic_control;
        }
        Ok(())
    }

    fn reflected(&self, control: Option<Point2<f64>>) -> Point2<f64> {
        match control {
            Some(control) => self.position + (self.position - control),
            None => self.position,
        }
    }

    fn move_to(&mut self, point: Point2<f64>) {
        self.end_contour();
        self.current.push(point);
        self.position = point;
        self.start = point;
    }

    fn line_to(&mut self, point: Point2<f64>) {
        if self.current.is_empty() {
            self.current.push(self.position);
        }
        if self.current.last() != Some(&point) {
            self.current.push(point);
        }
        self.position = point;
    }

    fn cubic_to(&mut self, control1: Point2<f64>, control2: Point2<f64>, end: Point2<f64>) {
        let start = self.position;
        for step in 1..=CURVE_SEGMENTS {
            let t = step as f64 / CURVE_SEGMENTS as f64;
            let u = 1.0 - t;
            let coords = start.coords * (u * u * u)
                + control1.coords * (3.0 * u * u * t)
                + control2.coords * (3.0 * u * t * t)
                + end.coords * (t * t * t);
            self.line_to(Point2::from(coords));
        }
    }

    fn quadratic_to(&mut self, control: Point2<f64>, end: Point2<f64>) {
        let start = self.position;
        for step in 1..=CURVE_SEGMENTS {
            let t = step as f64 / CURVE_SEGMENTS as f64;
            let u = 1.0 - t;
            let coords = start.coords * (u * u) + control.coords * (2.0 * u * t) + end.coords * (t * t);
            self.line_to(Point2::from(coords));
        }
    }

    fn close(&mut self) {
        self.end_contour();
        self.position = self.start;
    }

    fn end_contour(&mut self) {
        let mut contour = std::mem::take(&mut self.current);
        if contour.len() > 1 && contour.first() == contour.last() {
            contour.pop();
        }
        if !contour.is_empty() {
            self.contours.push(contour);
        }
    }

    fn finish(mut self) -> Vec<Contour> {
        self.end_contour();
        self.contours
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_number() {
        assert_eq!(number("1.5e2,"), Ok((",", 150.0)));
        assert_eq!(number("-.5 "), Ok((" ", -0.5)));
        assert_eq!(number("2."), Ok(("", 2.0)));
        assert!(number("abc").is_err());
    }

    #[test]
    fn test_absolute_square() {
        let contours = parse_svg_path("M0,0 L1,0 L1,1 L0,1 Z").unwrap();
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].len(), 4);
        assert_eq!(contours[0][2], Point2::new(1.0, 1.0));
    }

    #[test]
    fn test_relative_and_implicit_commands() {
        let contours = parse_svg_path("m 0.5 0 h .5 v 1 h -0.5z M2 2 3 2 3 3").unwrap();
        assert_eq!(contours.len(), 2);
        assert_eq!(
            contours[0],
            vec![Point2::new(0.5, 0.0), Point2::new(1.0, 0.0), Point2::new(1.0, 1.0), Point2::new(0.5, 1.0)]
        );
        assert_eq!(contours[1].len(), 3);
    }

    #[test]
    fn test_curves_are_flattened() {
        let contours = parse_svg_path("M0 0 Q0.5 1 1 0 T2 0 Z").unwrap();
        let contour = &contours[0];
        assert_eq!(contour.len(), 1 + 2 * CURVE_SEGMENTS);
        assert_relative_eq!(contour[CURVE_SEGMENTS / 2].y, 0.5, epsilon = 1e-9);
        // The smooth quadratic mirrors the previous control point
        assert_relative_eq!(contour[CURVE_SEGMENTS + CURVE_SEGMENTS / 2].y, -0.5, epsilon = 1e-9);

        let cubic = parse_svg_path("M0 0 C0 1 1 1 1 0 S2 -1 2 0").unwrap();
        assert_eq!(cubic[0].len(), 1 + 2 * CURVE_SEGMENTS);
    }

    #[test]
    fn test_invalid_paths() {
        assert!(matches!(
            parse_svg_path("M0 0 L1"),
            Err(Error::InvalidSvgPath { .. })
        ));
        assert!(matches!(
            parse_svg_path("M0 0 X1 1"),
            Err(Error::InvalidSvgPath { offset: 4, .. })
        ));
        assert!(parse_svg_path("").unwrap().is_empty());
    }
}
