// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D areas built with polygon boolean operations
//!
//! An [`Area`] is a set of polygons with holes, produced by the i_overlay
//! crate. Overlapping input contours are merged with the non-zero fill
//! rule, so a union of triangles gives the silhouette they cover.

use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use nalgebra::{Matrix3, Point2};

use crate::error::Result;
use crate::svg_path::{parse_svg_path, Contour};

/// Axis-aligned 2D rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Point2<f64>,
    pub max: Point2<f64>,
}

impl Rect {
    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn center(&self) -> Point2<f64> {
        nalgebra::center(&self.min, &self.max)
    }
}

/// Union of polygons, each one made of an outer contour followed by its holes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Area {
    polygons: Vec<Vec<Contour>>,
}

impl Area {
    /// Creates an empty area
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the area covered by the given closed contours.
    ///
    /// Contours with less than 3 points are ignored.
    pub fn from_contours(contours: &[Contour]) -> Self {
        let subject: Vec<Vec<[f64; 2]>> = contours
            .iter()
            .filter(|contour| contour.len() >= 3)
            .map(|contour| contour_to_path(contour))
            .collect();
        Self::from_paths(subject)
    }

    /// Merges paths given in i_overlay format
    pub(crate) fn from_paths(subject: Vec<Vec<[f64; 2]>>) -> Self {
        if subject.is_empty() {
            return Self::new();
        }
        let clip: Vec<Vec<[f64; 2]>> = Vec::new();
        let shapes = subject.overlay(&clip, OverlayRule::Union, FillRule::NonZero);
        Self::from_shapes(shapes)
    }

    fn from_shapes(shapes: Vec<Vec<Vec<[f64; 2]>>>) -> Self {
        let polygons = shapes
            .into_iter()
            .map(|shape| {
                shape
                    .into_iter()
                    .map(|path| path.into_iter().map(|p| Point2::new(p[0], p[1])).collect::<Contour>())
                    .filter(|contour| contour.len() >= 3)
                    .collect::<Vec<_>>()
            })
            .filter(|polygon| !polygon.is_empty())
            .collect();
        Self { polygons }
    }

    /// Creates a rectangular area
    pub fn rectangle(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::from_contours(&[vec![
            Point2::new(x, y),
            Point2::new(x + width, y),
            Point2::new(x + width, y + height),
            Point2::new(x, y + height),
        ]])
    }

    /// Creates the area filled by SVG path data
    pub fn from_svg_path(path: &str) -> Result<Self> {
        Ok(Self::from_contours(&parse_svg_path(path)?))
    }

    /// Polygons of this area, outer contour first
    #[inline]
    pub fn polygons(&self) -> &[Vec<Contour>] {
        &self.polygons
    }

    /// Outer contour of each polygon
    pub fn outer_contours(&self) -> impl Iterator<Item = &Contour> + '_ {
        self.polygons.iter().filter_map(|polygon| polygon.first())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Adds `other` to this area
    pub fn add(&mut self, other: &Area) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            self.polygons = other.polygons.clone();
            return;
        }
        let subject = self.paths();
        let clip = other.paths();
        *self = Self::from_shapes(subject.overlay(&clip, OverlayRule::Union, FillRule::NonZero));
    }

    /// Returns the area without its holes
    pub fn without_holes(&self) -> Area {
        Self::from_contours(&self.outer_contours().cloned().collect::<Vec<_>>())
    }

    fn paths(&self) -> Vec<Vec<[f64; 2]>> {
        self.polygons
            .iter()
            .flat_map(|polygon| polygon.iter().map(|contour| contour_to_path(contour)))
            .collect()
    }

    /// Surface covered by this area
    pub fn area(&self) -> f64 {
        self.polygons
            .iter()
            .map(|polygon| {
                let mut contours = polygon.iter();
                let outer = contours.next().map_or(0.0, |c| signed_area(c).abs());
                outer - contours.map(|c| signed_area(c).abs()).sum::<f64>()
            })
            .sum()
    }

    /// Bounding rectangle, `None` for an empty area
    pub fn bounds(&self) -> Option<Rect> {
        let mut points = self.outer_contours().flatten();
        let first = *points.next()?;
        Some(points.fold(Rect { min: first, max: first }, |rect, point| Rect {
            min: rect.min.inf(point),
            max: rect.max.sup(point),
        }))
    }

    /// Applies an affine 2D transform (homogeneous 3x3 matrix) to this area
    pub fn transform(&mut self, transform: &Matrix3<f64>) {
        for point in self.polygons.iter_mut().flatten().flatten() {
            *point = transform.transform_point(point);
        }
    }

    pub fn transformed(mut self, transform: &Matrix3<f64>) -> Self {
        self.transform(transform);
        self
    }

    /// Returns true if `point` is inside a polygon and outside its holes
    pub fn contains_point(&self, point: &Point2<f64>) -> bool {
        self.polygons.iter().any(|polygon| {
            let mut contours = polygon.iter();
            contours.next().is_some_and(|outer| contour_contains(outer, point))
                && !contours.any(|hole| contour_contains(hole, point))
        })
    }
}

fn contour_to_path(contour: &[Point2<f64>]) -> Vec<[f64; 2]> {
    contour.iter().map(|p| [p.x, p.y]).collect()
}

/// Signed area of a contour, positive when counter-clockwise
pub fn signed_area(contour: &[Point2<f64>]) -> f64 {
    if contour.len() < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for (i, current) in contour.iter().enumerate() {
        let next = &contour[(i + 1) % contour.len()];
        area += current.x * next.y - next.x * current.y;
    }
    area * 0.5
}

/// Even-odd crossing test
fn contour_contains(contour: &[Point2<f64>], point: &Point2<f64>) -> bool {
    let mut inside = false;
    let mut previous = match contour.last() {
        Some(last) => last,
        None => return false,
    };
    for current in contour {
        if (current.y > point.y) != (previous.y > point.y) {
            let x = previous.x + (point.y - previous.y) * (current.x - previous.x) / (current.y - previous.y);
            if point.x < x {
                inside = !inside;
            }
        }
        previous = current;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector2;

    #[test]
    fn test_union_of_overlapping_squares() {
        let mut area = Area::rectangle(0.0, 0.0, 2.0, 2.0);
        area.add(&Area::rectangle(1.0, 1.0, 2.0, 2.0));
        assert_eq!(area.polygons().len(), 1);
        assert_relative_eq!(area.area(), 7.0, epsilon = 1e-9);
        let bounds = area.bounds().unwrap();
        assert_relative_eq!(bounds.width(), 3.0);
        assert!(area.contains_point(&Point2::new(2.5, 2.5)));
        assert!(!area.contains_point(&Point2::new(2.5, 0.5)));
    }

    #[test]
    fn test_triangles_merge_into_square() {
        let area = Area::from_contours(&[
            vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(1.0, 1.0)],
            vec![Point2::new(0.0, 0.0), Point2::new(1.0, 1.0), Point2::new(0.0, 1.0)],
        ]);
        assert_eq!(area.polygons().len(), 1);
        assert_relative_eq!(area.area(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_hole_is_kept_then_removed() {
        let ring = Area::from_svg_path("M0 0 H4 V4 H0 Z M1 1 V3 H3 V1 Z").unwrap();
        // Opposite windings leave a hole with the non-zero rule
        assert_relative_eq!(ring.area(), 12.0, epsilon = 1e-9);
        assert!(!ring.contains_point(&Point2::new(2.0, 2.0)));
        let filled = ring.without_holes();
        assert_relative_eq!(filled.area(), 16.0, epsilon = 1e-9);
    }

    #[test]
    fn test_transform() {
        let area = Area::rectangle(0.0, 0.0, 1.0, 1.0)
            .transformed(&(Matrix3::new_translation(&Vector2::new(-0.5, -0.5)) * Matrix3::new_nonuniform_scaling(&Vector2::new(4.0, 2.0))));
        let bounds = area.bounds().unwrap();
        assert_relative_eq!(bounds.min, Point2::new(-0.5, -0.5));
        assert_relative_eq!(bounds.max, Point2::new(3.5, 1.5));
        assert_relative_eq!(area.area(), 8.0, epsilon = 1e-9);
    }

    #[test]
    fn test_empty_area() {
        let area = Area::from_contours(&[vec![Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)]]);
        assert!(area.is_empty());
        assert!(area.bounds().is_none());
        assert_eq!(area.area(), 0.0);
    }
}
