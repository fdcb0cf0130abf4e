// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model bounds and size.
//!
//! Bounds of a shape are usually computed by transforming the 8 corners of
//! its untransformed bounds, which is exact for rotations by multiples of
//! 90°. Under any other rotation, or inside a deformed joint, every indexed
//! vertex is transformed instead to avoid over-large boxes.

use nalgebra::{Matrix4, Point3, Vector3};
use sh3d_scene::{BoundingBox, NodeKey, NodeKind, SceneGraph, Shape};

/// Smallest extent given to a model on each axis
pub const MINIMUM_SIZE: f64 = 0.001;

/// Returns the minimum size of a model.
#[inline]
pub fn minimum_size() -> f64 {
    MINIMUM_SIZE
}

/// Returns true if the rotation part of `transform` only rotates by
/// multiples of 90° around the x, y or z axis.
pub fn is_orthogonal_rotation(transform: &Matrix4<f64>) -> bool {
    const EPSILON: f64 = 1e-6;
    (0..3).all(|row| {
        (0..3).all(|column| {
            let value = transform[(row, column)];
            value.abs() <= EPSILON || (value - 1.0).abs() <= EPSILON || (value + 1.0).abs() <= EPSILON
        })
    })
}

/// Bounds of the shapes under `node`, untransformed.
pub fn model_bounds(graph: &SceneGraph, node: NodeKey) -> BoundingBox {
    bounds(graph, node, &Matrix4::identity())
}

/// Bounds of the shapes under `node` after `transform`.
///
/// Returns an empty box when the subtree contains no geometry.
pub fn bounds(graph: &SceneGraph, node: NodeKey, transform: &Matrix4<f64>) -> BoundingBox {
    let mut bounds = BoundingBox::empty();
    let mode = BoundsMode {
        transform_geometry: !is_orthogonal_rotation(transform),
        deformed: graph.is_deformed(node),
    };
    compute_bounds(graph, node, &mut bounds, transform, mode);
    bounds
}

#[derive(Clone, Copy)]
struct BoundsMode {
    transform_geometry: bool,
    deformed: bool,
}

fn compute_bounds(
    graph: &SceneGraph,
    node: NodeKey,
    bounds: &mut BoundingBox,
    parent_transform: &Matrix4<f64>,
    mode: BoundsMode,
) {
    let Some(kind) = graph.node(node).map(|n| n.kind()) else {
        return;
    };
    match kind {
        NodeKind::TransformGroup {
            transform, children, ..
        } => {
            let transform = parent_transform * transform;
            for &child in children {
                compute_bounds(graph, child, bounds, &transform, mode);
            }
        }
        NodeKind::Group { children } | NodeKind::SharedGroup { children } => {
            for &child in children {
                compute_bounds(graph, child, bounds, parent_transform, mode);
            }
        }
        NodeKind::Link { .. } => {
            if let Some(shared_group) = graph.shared_group(node) {
                compute_bounds(graph, shared_group, bounds, parent_transform, mode);
            }
        }
        NodeKind::Shape(shape) => {
            let shape_bounds = if mode.transform_geometry
                || (mode.deformed && !is_orthogonal_rotation(parent_transform))
            {
                transformed_shape_bounds(shape, parent_transform)
            } else {
                shape_bounds(shape).transformed(parent_transform)
            };
            bounds.combine(&shape_bounds);
        }
    }
}

fn shape_bounds(shape: &Shape) -> BoundingBox {
    let mut bounds = BoundingBox::empty();
    for geometry in &shape.geometries {
        bounds.combine(&geometry.bounds());
    }
    bounds
}

fn transformed_shape_bounds(shape: &Shape, transform: &Matrix4<f64>) -> BoundingBox {
    let mut bounds = BoundingBox::empty();
    for geometry in &shape.geometries {
        let vertices = geometry.vertices();
        for &index in geometry.vertex_indices() {
            let vertex = vertices[index as usize].cast::<f64>();
            bounds.combine_point(&transform.transform_point(&vertex));
        }
    }
    bounds
}

/// Size of the shapes under `node` after `transform`, at least
/// [`MINIMUM_SIZE`] on each axis.
pub fn size(graph: &SceneGraph, node: NodeKey, transform: &Matrix4<f64>) -> Vector3<f64> {
    let bounds = bounds(graph, node, transform);
    if bounds.is_empty() {
        return Vector3::repeat(MINIMUM_SIZE);
    }
    bounds.size().map(|extent| extent.max(MINIMUM_SIZE))
}

/// Center of the bounds of the shapes under `node`.
pub fn center(graph: &SceneGraph, node: NodeKey) -> Point3<f64> {
    model_bounds(graph, node).center()
}
