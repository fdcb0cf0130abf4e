// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Built-in shapes.

use nalgebra::{Point3, Vector3};

use crate::appearance::Appearance;
use crate::error::Result;
use crate::geometry::GeometryArray;
use crate::node::Shape;

/// Box centered at the origin, with one normal per face.
///
/// Used in place of a model that couldn't be loaded.
pub fn box_shape(width: f32, height: f32, depth: f32, appearance: Appearance) -> Result<Shape> {
    let (x, y, z) = (width / 2.0, height / 2.0, depth / 2.0);
    let faces: [(Vector3<f32>, [Point3<f32>; 4]); 6] = [
        (Vector3::z(), [p(-x, -y, z), p(x, -y, z), p(x, y, z), p(-x, y, z)]),
        (-Vector3::z(), [p(x, -y, -z), p(-x, -y, -z), p(-x, y, -z), p(x, y, -z)]),
        (Vector3::x(), [p(x, -y, z), p(x, -y, -z), p(x, y, -z), p(x, y, z)]),
        (-Vector3::x(), [p(-x, -y, -z), p(-x, -y, z), p(-x, y, z), p(-x, y, -z)]),
        (Vector3::y(), [p(-x, y, z), p(x, y, z), p(x, y, -z), p(-x, y, -z)]),
        (-Vector3::y(), [p(-x, -y, -z), p(x, -y, -z), p(x, -y, z), p(-x, -y, z)]),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut normals = Vec::with_capacity(6);
    let mut vertex_indices = Vec::with_capacity(36);
    let mut normal_indices = Vec::with_capacity(36);
    for (face, (normal, corners)) in faces.iter().enumerate() {
        let base = vertices.len() as u32;
        vertices.extend_from_slice(corners);
        normals.push(*normal);
        for offset in [0, 1, 2, 0, 2, 3] {
            vertex_indices.push(base + offset);
            normal_indices.push(face as u32);
        }
    }

    let geometry = GeometryArray::triangles(vertices, vertex_indices)?.with_normals(normals, normal_indices)?;
    Ok(Shape::new(geometry).with_appearance(appearance))
}

#[inline]
fn p(x: f32, y: f32, z: f32) -> Point3<f32> {
    Point3::new(x, y, z)
}
