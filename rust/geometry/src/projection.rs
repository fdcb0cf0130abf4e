// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Projection of models on the floor and on their front side.
//!
//! Below a vertex count threshold, areas are the exact union of the
//! projected triangles that face the projection plane. Dense models fall
//! back to a convex hull (floor) or to the unit square (front).

use nalgebra::{Matrix3, Matrix4, Point2, Vector2};
use sh3d_scene::{NodeKey, NodeKind, SceneGraph};

use crate::area::Area;
use crate::error::{Error, Result};
use crate::hull::surrounding_polygon;

/// Vertex count thresholds choosing between exact and approximate areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AreaOptions {
    /// Models with at least this many visible vertices get a convex hull on floor
    pub floor_vertex_threshold: usize,
    /// Models with at least this many visible vertices get a square front area
    pub front_vertex_threshold: usize,
}

impl Default for AreaOptions {
    fn default() -> Self {
        Self {
            floor_vertex_threshold: 10_000,
            front_vertex_threshold: 1_000_000,
        }
    }
}

/// Footprint of a staircase and the SVG shape cut out of the floors above it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StaircasePlacement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub depth: f64,
    /// Rotation angle in plan, in radians
    pub angle: f64,
    pub model_mirrored: bool,
    /// SVG path data drawn in a unit square
    pub cut_out_shape: Option<String>,
}

/// What to project on the floor.
#[derive(Debug, Clone, Copy)]
pub enum FloorAreaSource<'a> {
    /// Visible and not fully transparent shapes under a node
    Model { graph: &'a SceneGraph, node: NodeKey },
    /// Cut-out shape of a staircase, placed at its location in plan
    Staircase(&'a StaircasePlacement),
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Plane {
    /// Plan (x, z)
    Floor,
    /// Front view (x, y)
    Front,
}

impl Plane {
    #[inline]
    fn project(self, x: f64, y: f64, z: f64) -> [f64; 2] {
        match self {
            Plane::Floor => [x, z],
            Plane::Front => [x, y],
        }
    }
}

/// Returns the area on floor of a model or of a staircase cut-out.
///
/// A staircase without cut-out shape is a caller error.
pub fn area_on_floor(source: FloorAreaSource<'_>, options: &AreaOptions) -> Result<Area> {
    match source {
        FloorAreaSource::Model { graph, node } => Ok(model_area_on_floor(graph, node, options)),
        FloorAreaSource::Staircase(staircase) => staircase_area_on_floor(staircase),
    }
}

fn model_area_on_floor(graph: &SceneGraph, node: NodeKey, options: &AreaOptions) -> Area {
    if graph.vertex_count(node) < options.floor_vertex_threshold {
        let mut triangles = Vec::new();
        collect_triangles(graph, node, &Matrix4::identity(), true, Plane::Floor, &mut triangles);
        Area::from_paths(triangles)
    } else {
        let mut vertices = Vec::new();
        collect_floor_vertices(graph, node, &Matrix4::identity(), &mut vertices);
        let hull = surrounding_polygon(&vertices);
        Area::from_contours(&[hull])
    }
}

fn staircase_area_on_floor(staircase: &StaircasePlacement) -> Result<Area> {
    let cut_out_shape = staircase
        .cut_out_shape
        .as_deref()
        .ok_or_else(|| Error::InvalidArgument("No cut out shape associated to piece".to_string()))?;
    let mut area = Area::from_svg_path(cut_out_shape)?;
    if staircase.model_mirrored {
        // x -> 1 - x in the unit square
        area.transform(&Matrix3::new(-1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0));
    }
    let half_size = Vector2::new(staircase.width / 2.0, staircase.depth / 2.0);
    let transform = Matrix3::new_translation(&Vector2::new(staircase.x, staircase.y))
        * Matrix3::new_rotation(staircase.angle)
        * Matrix3::new_translation(&-half_size)
        * Matrix3::new_nonuniform_scaling(&Vector2::new(staircase.width, staircase.depth));
    Ok(area.transformed(&transform))
}

/// Returns the front area of a model, in a unit square centered on the origin.
///
/// When `cut_out_shape` is given, that SVG shape is used instead of the
/// model geometry, flipped vertically since SVG y axis points down.
/// Holes of the model silhouette are filled.
pub fn front_area(
    cut_out_shape: Option<&str>,
    graph: &SceneGraph,
    node: NodeKey,
    options: &AreaOptions,
) -> Result<Area> {
    if let Some(cut_out_shape) = cut_out_shape {
        let transform = Matrix3::new_translation(&Vector2::new(-0.5, 0.5))
            * Matrix3::new_nonuniform_scaling(&Vector2::new(1.0, -1.0));
        return Ok(Area::from_svg_path(cut_out_shape)?.transformed(&transform));
    }
    if graph.vertex_count(node) >= options.front_vertex_threshold {
        return Ok(Area::rectangle(-0.5, -0.5, 1.0, 1.0));
    }

    let mut triangles = Vec::new();
    collect_triangles(graph, node, &Matrix4::identity(), false, Plane::Front, &mut triangles);
    let area_with_holes = Area::from_paths(triangles);
    let Some(bounds) = area_with_holes.bounds() else {
        return Ok(Area::new());
    };
    if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
        return Ok(Area::new());
    }
    let transform = Matrix3::new_nonuniform_scaling(&Vector2::new(1.0 / bounds.width(), 1.0 / bounds.height()))
        * Matrix3::new_translation(&-bounds.center().coords);
    Ok(area_with_holes.without_holes().transformed(&transform))
}

/// Collects the projected triangles facing the plane, in i_overlay path format
fn collect_triangles(
    graph: &SceneGraph,
    node: NodeKey,
    parent_transform: &Matrix4<f64>,
    ignore_transparent_shapes: bool,
    plane: Plane,
    triangles: &mut Vec<Vec<[f64; 2]>>,
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
                collect_triangles(graph, child, &transform, ignore_transparent_shapes, plane, triangles);
            }
        }
        NodeKind::Group { children } | NodeKind::SharedGroup { children } => {
            for &child in children {
                collect_triangles(graph, child, parent_transform, ignore_transparent_shapes, plane, triangles);
            }
        }
        NodeKind::Link { .. } => {
            if let Some(shared_group) = graph.shared_group(node) {
                collect_triangles(graph, shared_group, parent_transform, ignore_transparent_shapes, plane, triangles);
            }
        }
        NodeKind::Shape(shape) => {
            if !shape.is_visible() || (ignore_transparent_shapes && shape.is_fully_transparent()) {
                return;
            }
            for geometry in &shape.geometries {
                let projected: Vec<[f64; 2]> = geometry
                    .vertices()
                    .iter()
                    .map(|vertex| {
                        let v = parent_transform.transform_point(&vertex.cast::<f64>());
                        plane.project(v.x, v.y, v.z)
                    })
                    .collect();
                if geometry.kind() != sh3d_scene::PrimitiveKind::Triangles {
                    continue;
                }
                for triangle in geometry.vertex_indices().chunks_exact(3) {
                    let [a, b, c] = [
                        projected[triangle[0] as usize],
                        projected[triangle[1] as usize],
                        projected[triangle[2] as usize],
                    ];
                    if (b[0] - a[0]) * (c[1] - b[1]) - (b[1] - a[1]) * (c[0] - b[0]) > 0.0 {
                        triangles.push(vec![a, b, c]);
                    }
                }
            }
        }
    }
}

fn collect_floor_vertices(
    graph: &SceneGraph,
    node: NodeKey,
    parent_transform: &Matrix4<f64>,
    vertices: &mut Vec<Point2<f64>>,
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
                collect_floor_vertices(graph, child, &transform, vertices);
            }
        }
        NodeKind::Group { children } | NodeKind::SharedGroup { children } => {
            for &child in children {
                collect_floor_vertices(graph, child, parent_transform, vertices);
            }
        }
        NodeKind::Link { .. } => {
            if let Some(shared_group) = graph.shared_group(node) {
                collect_floor_vertices(graph, shared_group, parent_transform, vertices);
            }
        }
        NodeKind::Shape(shape) => {
            if !shape.is_visible() || shape.is_fully_transparent() {
                return;
            }
            for geometry in &shape.geometries {
                vertices.extend(geometry.vertices().iter().map(|vertex| {
                    let v = parent_transform.transform_point(&vertex.cast::<f64>());
                    Point2::new(v.x, v.z)
                }));
            }
        }
    }
}
