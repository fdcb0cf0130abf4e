// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! SH3D Geometry
//!
//! Measurement and normalization helpers for model scene graphs: bounding
//! boxes, centering transforms, piece placement, geometry baking, convex
//! hulls and 2D areas projected on the floor or on the front side of a
//! model. Areas use i_overlay boolean operations, SVG cut-out shapes are
//! parsed with nom.

pub mod area;
pub mod bounds;
pub mod error;
pub mod hull;
pub mod placement;
pub mod projection;
pub mod svg_path;
pub mod transform;

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix3, Matrix4, Point2, Point3, Vector2, Vector3};

pub use area::{Area, Rect};
pub use bounds::{bounds, center, is_orthogonal_rotation, minimum_size, model_bounds, size, MINIMUM_SIZE};
pub use error::{Error, Result};
pub use hull::surrounding_polygon;
pub use placement::{piece_normalized_model_transformation, PiecePlacement};
pub use projection::{area_on_floor, front_area, AreaOptions, FloorAreaSource, StaircasePlacement};
pub use svg_path::{parse_svg_path, Contour};
pub use transform::{normalized_transform, rotation_transformation, transformed_geometry, ModelRotation};
