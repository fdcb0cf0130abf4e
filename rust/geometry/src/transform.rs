// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model normalization and geometry baking.
//!
//! Furniture models come in any size and location. They are normalized into
//! a box of a given width centered on the origin, then placed in the home by
//! [`piece_normalized_model_transformation`](crate::placement::piece_normalized_model_transformation).

use nalgebra::{Matrix3, Matrix4, Vector3};
use sh3d_scene::{BoundingBox, GeometryArray, NodeKey, SceneGraph};

use crate::bounds::{bounds, model_bounds, MINIMUM_SIZE};
use crate::error::{Error, Result};

/// 3x3 model rotation, given row by row
pub type ModelRotation = [[f64; 3]; 3];

/// Returns a transformation matching the given rotation.
pub fn rotation_transformation(rotation: &ModelRotation) -> Matrix4<f64> {
    let mut transform = Matrix4::identity();
    for (row, values) in rotation.iter().enumerate() {
        for (column, value) in values.iter().enumerate() {
            transform[(row, column)] = *value;
        }
    }
    transform
}

/// Translation moving the center of `bounds` to the origin
pub(crate) fn translation_to_center(bounds: &BoundingBox) -> Matrix4<f64> {
    if bounds.is_empty() {
        return Matrix4::identity();
    }
    Matrix4::new_translation(&-bounds.center().coords)
}

/// Returns a transformation that makes the model under `node` fill a box of
/// the given `width` centered on the origin.
///
/// When a `rotation` is given, it's applied to the recentered model, and
/// `centered_at_origin` tells whether the rotated model should be moved back
/// to the origin. Each axis is then scaled independently so that the model
/// extent matches `width`, degenerate extents being clamped to
/// [`MINIMUM_SIZE`].
pub fn normalized_transform(
    graph: &SceneGraph,
    node: NodeKey,
    rotation: Option<&ModelRotation>,
    width: f64,
    centered_at_origin: bool,
) -> Matrix4<f64> {
    let model_bounds = model_bounds(graph, node);
    let translation = translation_to_center(&model_bounds);

    let (model_transform, measured_bounds) = match rotation {
        Some(rotation) => {
            let rotation = rotation_transformation(rotation) * translation;
            let rotated_bounds = bounds(graph, node, &rotation);
            let model_transform = if centered_at_origin {
                translation_to_center(&rotated_bounds) * rotation
            } else {
                rotation
            };
            (model_transform, rotated_bounds)
        }
        None => (translation, model_bounds),
    };

    let extent = if measured_bounds.is_empty() {
        Vector3::repeat(MINIMUM_SIZE)
    } else {
        measured_bounds.size()
    };
    let scale = extent.map(|e| width / e.max(MINIMUM_SIZE));
    Matrix4::new_nonuniform_scaling(&scale) * model_transform
}

/// Fails unless every element of `copies` buffers of `count` elements
/// can be addressed by a `u32` index.
fn check_index_range(buffer: &'static str, copies: usize, count: usize) -> Result<()> {
    copies
        .checked_mul(count)
        .and_then(|total| u32::try_from(total).ok())
        .map(|_| ())
        .ok_or(Error::IndexOverflow { buffer, copies, count })
}

/// Returns a geometry made of one copy of `geometry` per transform.
///
/// Vertices are transformed as points and normals as directions, then
/// renormalized. Vertex and normal indices are offset for each copy while
/// texture coordinates are kept once and reused by every copy.
pub fn transformed_geometry(geometry: &GeometryArray, transforms: &[Matrix4<f64>]) -> Result<GeometryArray> {
    let copies = transforms.len();
    let vertex_count = geometry.vertices().len();
    let normal_count = geometry.normals().len();
    check_index_range("vertices", copies, vertex_count)?;
    check_index_range("normals", copies, normal_count)?;

    let mut vertices = Vec::with_capacity(copies * vertex_count);
    let mut vertex_indices = Vec::with_capacity(copies * geometry.vertex_indices().len());
    let mut normals = Vec::with_capacity(copies * normal_count);
    let mut normal_indices = Vec::with_capacity(copies * geometry.normal_indices().len());
    let mut texture_coordinate_indices =
        Vec::with_capacity(copies * geometry.texture_coordinate_indices().len());

    for (copy, transform) in transforms.iter().enumerate() {
        let vertex_offset = (copy * vertex_count) as u32;
        vertices.extend(geometry.vertices().iter().map(|vertex| {
            transform
                .transform_point(&vertex.cast::<f64>())
                .cast::<f32>()
        }));
        vertex_indices.extend(geometry.vertex_indices().iter().map(|index| index + vertex_offset));

        if geometry.has_normals() {
            let normal_transform = normal_matrix(transform);
            let normal_offset = (copy * normal_count) as u32;
            normals.extend(geometry.normals().iter().map(|normal| {
                let transformed = normal_transform * normal.cast::<f64>();
                transformed
                    .try_normalize(f64::EPSILON)
                    .unwrap_or(transformed)
                    .cast::<f32>()
            }));
            normal_indices.extend(geometry.normal_indices().iter().map(|index| index + normal_offset));
        }
        texture_coordinate_indices.extend_from_slice(geometry.texture_coordinate_indices());
    }

    let mut baked = GeometryArray::from_parts(geometry.kind(), vertices, vertex_indices)?;
    if geometry.has_normals() {
        baked = baked.with_normals(normals, normal_indices)?;
    }
    if geometry.has_texture_coordinates() {
        baked = baked.with_texture_coordinates(geometry.texture_coordinates().to_vec(), texture_coordinate_indices)?;
    }
    Ok(baked)
}

/// Matrix transforming normals, the inverse transpose of the linear part
fn normal_matrix(transform: &Matrix4<f64>) -> Matrix3<f64> {
    let linear: Matrix3<f64> = transform.fixed_view::<3, 3>(0, 0).into_owned();
    linear
        .try_inverse()
        .map(|inverse| inverse.transpose())
        .unwrap_or(linear)
}
