// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Indexed geometry buffers.
//!
//! A [`GeometryArray`] is immutable once built: every constructor validates
//! that all indices reference existing elements, so consumers can index the
//! buffers without bound checks failing.

use crate::bounds::BoundingBox;
use crate::error::{Error, Result};
use nalgebra::{Point2, Point3, Vector3};

/// Primitive assembled from consecutive indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Triangles,
    Lines,
}

impl PrimitiveKind {
    /// Number of indices per primitive
    #[inline]
    pub fn stride(self) -> usize {
        match self {
            PrimitiveKind::Triangles => 3,
            PrimitiveKind::Lines => 2,
        }
    }
}

/// Indexed vertex data with optional normals and texture coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryArray {
    kind: PrimitiveKind,
    vertices: Vec<Point3<f32>>,
    vertex_indices: Vec<u32>,
    normals: Vec<Vector3<f32>>,
    normal_indices: Vec<u32>,
    texture_coordinates: Vec<Point2<f32>>,
    texture_coordinate_indices: Vec<u32>,
}

impl GeometryArray {
    /// Create a triangle array
    pub fn triangles(vertices: Vec<Point3<f32>>, vertex_indices: Vec<u32>) -> Result<Self> {
        Self::from_parts(PrimitiveKind::Triangles, vertices, vertex_indices)
    }

    /// Create a line array
    pub fn lines(vertices: Vec<Point3<f32>>, vertex_indices: Vec<u32>) -> Result<Self> {
        Self::from_parts(PrimitiveKind::Lines, vertices, vertex_indices)
    }

    pub fn from_parts(
        kind: PrimitiveKind,
        vertices: Vec<Point3<f32>>,
        vertex_indices: Vec<u32>,
    ) -> Result<Self> {
        if vertex_indices.len() % kind.stride() != 0 {
            return Err(Error::IndexStride {
                buffer: "vertex index",
                count: vertex_indices.len(),
                stride: kind.stride(),
            });
        }
        check_indices("vertex", &vertex_indices, vertices.len())?;
        Ok(Self {
            kind,
            vertices,
            vertex_indices,
            normals: Vec::new(),
            normal_indices: Vec::new(),
            texture_coordinates: Vec::new(),
            texture_coordinate_indices: Vec::new(),
        })
    }

    /// Attach normals, one normal index per vertex index.
    ///
    /// Lines don't carry normals, the call fails on a line array.
    pub fn with_normals(mut self, normals: Vec<Vector3<f32>>, normal_indices: Vec<u32>) -> Result<Self> {
        if self.kind == PrimitiveKind::Lines {
            return Err(Error::NormalsOnLines);
        }
        check_attribute_indices("normal", &normal_indices, normals.len(), self.vertex_indices.len())?;
        self.normals = normals;
        self.normal_indices = normal_indices;
        Ok(self)
    }

    /// Attach texture coordinates, one index per vertex index
    pub fn with_texture_coordinates(
        mut self,
        texture_coordinates: Vec<Point2<f32>>,
        texture_coordinate_indices: Vec<u32>,
    ) -> Result<Self> {
        check_attribute_indices(
            "texture coordinate",
            &texture_coordinate_indices,
            texture_coordinates.len(),
            self.vertex_indices.len(),
        )?;
        self.texture_coordinates = texture_coordinates;
        self.texture_coordinate_indices = texture_coordinate_indices;
        Ok(self)
    }

    #[inline]
    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    #[inline]
    pub fn vertices(&self) -> &[Point3<f32>] {
        &self.vertices
    }

    #[inline]
    pub fn vertex_indices(&self) -> &[u32] {
        &self.vertex_indices
    }

    #[inline]
    pub fn normals(&self) -> &[Vector3<f32>] {
        &self.normals
    }

    #[inline]
    pub fn normal_indices(&self) -> &[u32] {
        &self.normal_indices
    }

    #[inline]
    pub fn texture_coordinates(&self) -> &[Point2<f32>] {
        &self.texture_coordinates
    }

    #[inline]
    pub fn texture_coordinate_indices(&self) -> &[u32] {
        &self.texture_coordinate_indices
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn has_normals(&self) -> bool {
        !self.normal_indices.is_empty()
    }

    #[inline]
    pub fn has_texture_coordinates(&self) -> bool {
        !self.texture_coordinate_indices.is_empty()
    }

    /// Iterate over the vertex triples of each triangle (nothing for lines)
    pub fn triangles_iter(&self) -> impl Iterator<Item = [Point3<f32>; 3]> + '_ {
        let indices: &[u32] = match self.kind {
            PrimitiveKind::Triangles => &self.vertex_indices,
            PrimitiveKind::Lines => &[],
        };
        indices.chunks_exact(3).map(move |triangle| {
            [
                self.vertices[triangle[0] as usize],
                self.vertices[triangle[1] as usize],
                self.vertices[triangle[2] as usize],
            ]
        })
    }

    /// Bounds of the indexed vertices
    pub fn bounds(&self) -> BoundingBox {
        let mut bounds = BoundingBox::empty();
        for &index in &self.vertex_indices {
            bounds.combine_point(&self.vertices[index as usize].cast::<f64>());
        }
        bounds
    }
}

fn check_indices(buffer: &'static str, indices: &[u32], len: usize) -> Result<()> {
    match indices.iter().find(|&&index| index as usize >= len) {
        Some(&index) => Err(Error::IndexOutOfBounds { buffer, index, len }),
        None => Ok(()),
    }
}

fn check_attribute_indices(
    buffer: &'static str,
    indices: &[u32],
    len: usize,
    vertex_index_count: usize,
) -> Result<()> {
    if indices.len() != vertex_index_count {
        return Err(Error::IndexCountMismatch {
            buffer,
            count: indices.len(),
            expected: vertex_index_count,
        });
    }
    check_indices(buffer, indices, len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Vec<Point3<f32>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ]
    }

    #[test]
    fn test_valid_triangles() {
        let geometry = GeometryArray::triangles(triangle(), vec![0, 1, 2]).unwrap();
        assert_eq!(geometry.triangles_iter().count(), 1);
        let bounds = geometry.bounds();
        assert_eq!(bounds.upper(), Point3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_index_out_of_bounds() {
        let result = GeometryArray::triangles(triangle(), vec![0, 1, 3]);
        assert_eq!(
            result.unwrap_err(),
            Error::IndexOutOfBounds {
                buffer: "vertex",
                index: 3,
                len: 3
            }
        );
    }

    #[test]
    fn test_incomplete_primitive() {
        assert!(matches!(
            GeometryArray::lines(triangle(), vec![0, 1, 2]),
            Err(Error::IndexStride { stride: 2, .. })
        ));
    }

    #[test]
    fn test_normal_indices_must_match() {
        let geometry = GeometryArray::triangles(triangle(), vec![0, 1, 2]).unwrap();
        let result = geometry.with_normals(vec![Vector3::z()], vec![0, 0]);
        assert!(matches!(result, Err(Error::IndexCountMismatch { expected: 3, .. })));
    }

    #[test]
    fn test_lines_have_no_triangles() {
        let geometry = GeometryArray::lines(triangle(), vec![0, 1, 1, 2]).unwrap();
        assert_eq!(geometry.triangles_iter().count(), 0);
        assert!(!geometry.bounds().is_empty());
    }
}
