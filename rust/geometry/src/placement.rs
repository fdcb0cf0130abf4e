// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Placement of normalized furniture models in a home.

use nalgebra::{Matrix4, Vector3};
use sh3d_scene::{NodeKey, SceneGraph};

use crate::bounds::{bounds, MINIMUM_SIZE};
use crate::transform::translation_to_center;

/// Location, orientation and size of a piece of furniture.
///
/// Angles are in radians. `x` and `y` are plan coordinates, mapped to the
/// x and z axes of the 3D scene.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PiecePlacement {
    pub x: f64,
    pub y: f64,
    pub elevation: f64,
    /// Elevation of the level the piece belongs to
    pub level_elevation: f64,
    pub angle: f64,
    pub pitch: f64,
    pub roll: f64,
    pub width: f64,
    pub depth: f64,
    pub height: f64,
    pub model_mirrored: bool,
}

impl PiecePlacement {
    #[inline]
    pub fn is_horizontally_rotated(&self) -> bool {
        self.pitch != 0.0 || self.roll != 0.0
    }
}

/// Returns a transformation placing the normalized model of `piece` in the scene.
///
/// `normalized_model` is only needed for pieces rotated around horizontal
/// axes: their rotated model is recentered and its rotated height is used to
/// lift it above its elevation.
pub fn piece_normalized_model_transformation(
    piece: &PiecePlacement,
    normalized_model: Option<(&SceneGraph, NodeKey)>,
) -> Matrix4<f64> {
    let width = if piece.model_mirrored { -piece.width } else { piece.width };
    let scale = Matrix4::new_nonuniform_scaling(&Vector3::new(width, piece.height, piece.depth));

    let (model_transform, height) = match normalized_model {
        Some((graph, node)) if piece.is_horizontally_rotated() => {
            let mut horizontal_rotation = Matrix4::identity();
            if piece.pitch != 0.0 {
                horizontal_rotation = Matrix4::from_axis_angle(&Vector3::x_axis(), -piece.pitch);
            }
            if piece.roll != 0.0 {
                horizontal_rotation =
                    Matrix4::from_axis_angle(&Vector3::z_axis(), -piece.roll) * horizontal_rotation;
            }
            let horizontal_rotation_and_scale = horizontal_rotation * scale;

            let rotated_bounds = bounds(graph, node, &horizontal_rotation_and_scale);
            let height = if rotated_bounds.is_empty() {
                MINIMUM_SIZE
            } else {
                rotated_bounds.size().y.max(MINIMUM_SIZE)
            };
            (
                translation_to_center(&rotated_bounds) * horizontal_rotation_and_scale,
                height,
            )
        }
        _ => (scale, piece.height),
    };

    let vertical_rotation = Matrix4::from_axis_angle(&Vector3::y_axis(), -piece.angle);
    let translation = Matrix4::new_translation(&Vector3::new(
        piece.x,
        piece.elevation + height / 2.0 + piece.level_elevation,
        piece.y,
    ));
    translation * vertical_rotation * model_transform
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::normalized_transform;
    use approx::assert_relative_eq;
    use nalgebra::Point3;
    use sh3d_scene::{GeometryArray, Shape};
    use std::f64::consts::FRAC_PI_2;

    fn piece() -> PiecePlacement {
        PiecePlacement {
            x: 100.0,
            y: 50.0,
            elevation: 10.0,
            level_elevation: 250.0,
            width: 80.0,
            depth: 40.0,
            height: 60.0,
            ..PiecePlacement::default()
        }
    }

    #[test]
    fn test_unrotated_piece() {
        let transform = piece_normalized_model_transformation(&piece(), None);
        let corner = transform.transform_point(&Point3::new(0.5, -0.5, 0.5));
        assert_relative_eq!(corner, Point3::new(140.0, 260.0, 70.0), epsilon = 1e-9);
    }

    #[test]
    fn test_mirrored_piece() {
        let mirrored = PiecePlacement {
            model_mirrored: true,
            ..piece()
        };
        let transform = piece_normalized_model_transformation(&mirrored, None);
        let corner = transform.transform_point(&Point3::new(0.5, 0.0, 0.0));
        assert_relative_eq!(corner.x, 60.0, epsilon = 1e-9);
    }

    #[test]
    fn test_yaw_turns_clockwise_in_plan() {
        let turned = PiecePlacement {
            angle: FRAC_PI_2,
            ..piece()
        };
        let transform = piece_normalized_model_transformation(&turned, None);
        // Model x axis maps to plan y axis after a quarter turn
        let end = transform.transform_point(&Point3::new(0.5, 0.0, 0.0));
        assert_relative_eq!(end.x, 100.0, epsilon = 1e-9);
        assert_relative_eq!(end.z, 90.0, epsilon = 1e-9);
    }

    #[test]
    fn test_pitched_piece_uses_rotated_height() {
        let mut graph = SceneGraph::new();
        let geometry = GeometryArray::triangles(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(2.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 4.0),
            ],
            vec![0, 1, 2],
        )
        .unwrap();
        let shape = graph.add_shape(Shape::new(geometry));
        let root = graph.root();
        graph.append_child(root, shape).unwrap();
        let normalized = graph.add_transform_group(normalized_transform(&graph, root, None, 1.0, true));
        graph.detach(shape).unwrap();
        graph.append_child(normalized, shape).unwrap();
        graph.append_child(root, normalized).unwrap();

        let pitched = PiecePlacement {
            pitch: FRAC_PI_2,
            ..piece()
        };
        let transform = piece_normalized_model_transformation(&pitched, Some((&graph, root)));
        let placed = bounds(&graph, root, &transform);
        // Depth becomes height once pitched by a quarter turn
        assert_relative_eq!(placed.size().y, 40.0, epsilon = 1e-6);
        assert_relative_eq!(placed.lower().y, 260.0, epsilon = 1e-6);
        assert_relative_eq!(placed.center().x, 100.0, epsilon = 1e-6);
    }
}
