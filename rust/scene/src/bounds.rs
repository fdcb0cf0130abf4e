// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Axis-aligned bounding boxes.

use nalgebra::{Matrix4, Point3, Vector3};

/// Axis-aligned box defined by its lower and upper corners.
///
/// A box is empty when `lower > upper` on any axis. [`BoundingBox::empty`]
/// starts at `+inf`/`-inf` so that the first combined point or box defines it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    lower: Point3<f64>,
    upper: Point3<f64>,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl BoundingBox {
    /// Create an empty box
    pub fn empty() -> Self {
        Self {
            lower: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            upper: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn new(lower: Point3<f64>, upper: Point3<f64>) -> Self {
        Self { lower, upper }
    }

    #[inline]
    pub fn lower(&self) -> Point3<f64> {
        self.lower
    }

    #[inline]
    pub fn upper(&self) -> Point3<f64> {
        self.upper
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lower.x > self.upper.x || self.lower.y > self.upper.y || self.lower.z > self.upper.z
    }

    /// Extend this box to enclose `other`
    pub fn combine(&mut self, other: &BoundingBox) {
        if other.is_empty() {
            return;
        }
        self.lower = self.lower.inf(&other.lower);
        self.upper = self.upper.sup(&other.upper);
    }

    /// Extend this box to enclose `point`
    pub fn combine_point(&mut self, point: &Point3<f64>) {
        self.lower = self.lower.inf(point);
        self.upper = self.upper.sup(point);
    }

    /// Returns the box enclosing the 8 transformed corners of this box
    pub fn transformed(&self, transform: &Matrix4<f64>) -> BoundingBox {
        if self.is_empty() {
            return *self;
        }
        let mut result = BoundingBox::empty();
        for i in 0..8 {
            let corner = Point3::new(
                if i & 1 == 0 { self.lower.x } else { self.upper.x },
                if i & 2 == 0 { self.lower.y } else { self.upper.y },
                if i & 4 == 0 { self.lower.z } else { self.upper.z },
            );
            result.combine_point(&transform.transform_point(&corner));
        }
        result
    }

    /// Replace this box by its transformed version
    pub fn transform(&mut self, transform: &Matrix4<f64>) {
        *self = self.transformed(transform);
    }

    /// Extent along each axis (negative on the axes of an empty box)
    #[inline]
    pub fn size(&self) -> Vector3<f64> {
        self.upper - self.lower
    }

    #[inline]
    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.lower, &self.upper)
    }

    /// Returns true if `other` lies inside this box (an empty box is inside any box)
    pub fn contains(&self, other: &BoundingBox) -> bool {
        other.is_empty()
            || (self.lower.x <= other.lower.x
                && self.lower.y <= other.lower.y
                && self.lower.z <= other.lower.z
                && self.upper.x >= other.upper.x
                && self.upper.y >= other.upper.y
                && self.upper.z >= other.upper.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_box() {
        let bounds = BoundingBox::empty();
        assert!(bounds.is_empty());
        let mut other = BoundingBox::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        other.combine(&bounds);
        assert_eq!(other.lower(), Point3::new(0.0, 0.0, 0.0));
        assert_eq!(other.upper(), Point3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_combine_never_shrinks() {
        let mut bounds = BoundingBox::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
        let before = bounds;
        for point in [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(5.0, -3.0, 0.5),
            Point3::new(-0.5, 0.5, -8.0),
        ] {
            bounds.combine_point(&point);
            assert!(bounds.contains(&before));
        }
        assert_eq!(bounds.lower(), Point3::new(-1.0, -3.0, -8.0));
        assert_eq!(bounds.upper(), Point3::new(5.0, 1.0, 1.0));
    }

    #[test]
    fn test_transform_corners() {
        let bounds = BoundingBox::new(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0));
        let rotation = Matrix4::from_axis_angle(&Vector3::y_axis(), std::f64::consts::FRAC_PI_2);
        let rotated = bounds.transformed(&rotation);
        assert_relative_eq!(rotated.size().x, 1.0, epsilon = 1e-9);
        assert_relative_eq!(rotated.size().z, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_transform_empty_stays_empty() {
        let bounds = BoundingBox::empty().transformed(&Matrix4::new_scaling(2.0));
        assert!(bounds.is_empty());
    }
}
