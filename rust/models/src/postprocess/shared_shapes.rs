// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Flattening of shapes instanced many times through links.
//!
//! Drawing one shape per link costs a draw call each time. A shape reached
//! through more than one link is replaced by a single shape at the root whose
//! geometries hold one transformed copy per occurrence.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use sh3d_geometry::transformed_geometry;
use sh3d_scene::{Matrix4, NodeKey, NodeKind, SceneGraph, Shape};

use crate::error::Result;

#[derive(Default)]
struct Occurrences {
    transforms: Vec<Matrix4<f64>>,
    shared: usize,
    deformed: bool,
}

/// Replaces the shapes drawn several times through links by baked copies.
///
/// Shapes with an occurrence under a turned joint stay instanced, so that
/// the joint keeps moving them. Shared groups left without link are deleted.
/// Returns the number of replaced shapes.
pub fn replace_multiple_shared_shapes(graph: &mut SceneGraph) -> Result<usize> {
    let mut occurrences: FxHashMap<NodeKey, Occurrences> = FxHashMap::default();
    let mut order = Vec::new();
    collect_occurrences(
        graph,
        graph.root(),
        &Matrix4::identity(),
        false,
        false,
        &mut occurrences,
        &mut order,
    );

    let root = graph.root();
    let mut replaced = 0;
    for shape_key in order {
        let Some(found) = occurrences.get(&shape_key) else {
            continue;
        };
        if found.shared < 2 || found.deformed {
            continue;
        }
        let Some(shape) = graph.shape(shape_key) else {
            continue;
        };

        let mut baked_geometries = Vec::with_capacity(shape.geometries.len());
        for geometry in &shape.geometries {
            baked_geometries.push(Arc::new(transformed_geometry(geometry, &found.transforms)?));
        }
        let mut baked_geometries = baked_geometries.into_iter();
        let Some(first) = baked_geometries.next() else {
            continue;
        };
        let mut baked = Shape::from_shared(first);
        baked.geometries.extend(baked_geometries);
        baked.appearance = shape.appearance.clone();
        let name = graph.name(shape_key).map(str::to_string);

        tracing::debug!(
            shape = ?shape_key,
            copies = found.transforms.len(),
            "Flattening shared shape"
        );
        remove_shared_shape(graph, shape_key)?;
        let baked_key = graph.add_shape(baked);
        if let Some(name) = name {
            graph.set_name(baked_key, name)?;
        }
        graph.append_child(root, baked_key)?;
        replaced += 1;
    }

    if replaced > 0 {
        graph.remove_unreferenced_shared_groups();
    }
    Ok(replaced)
}

#[allow(clippy::too_many_arguments)]
fn collect_occurrences(
    graph: &SceneGraph,
    node: NodeKey,
    parent_transform: &Matrix4<f64>,
    under_shared_group: bool,
    under_deformed_group: bool,
    occurrences: &mut FxHashMap<NodeKey, Occurrences>,
    order: &mut Vec<NodeKey>,
) {
    let Some(kind) = graph.node(node).map(|n| n.kind()) else {
        return;
    };
    match kind {
        NodeKind::Group { children } => {
            for &child in children {
                collect_occurrences(
                    graph,
                    child,
                    parent_transform,
                    under_shared_group,
                    under_deformed_group,
                    occurrences,
                    order,
                );
            }
        }
        NodeKind::SharedGroup { children } => {
            for &child in children {
                collect_occurrences(graph, child, parent_transform, true, under_deformed_group, occurrences, order);
            }
        }
        NodeKind::TransformGroup { transform, children, .. } => {
            let transform = parent_transform * transform;
            let deformed = under_deformed_group || graph.is_deformed(node);
            for &child in children {
                collect_occurrences(
                    graph,
                    child,
                    &transform,
                    under_shared_group,
                    deformed,
                    occurrences,
                    order,
                );
            }
        }
        NodeKind::Link { shared_group } => {
            collect_occurrences(
                graph,
                *shared_group,
                parent_transform,
                true,
                under_deformed_group,
                occurrences,
                order,
            );
        }
        NodeKind::Shape(_) => {
            let entry = occurrences.entry(node).or_insert_with(|| {
                order.push(node);
                Occurrences::default()
            });
            entry.transforms.push(*parent_transform);
            entry.deformed |= under_deformed_group;
            if under_shared_group {
                entry.shared += 1;
            }
        }
    }
}

/// Deletes `shape` then the groups and links its removal left empty.
fn remove_shared_shape(graph: &mut SceneGraph, shape: NodeKey) -> Result<()> {
    let parent = graph.parent(shape);
    graph.remove_subtree(shape)?;

    let root = graph.root();
    let mut emptied: Vec<NodeKey> = parent.into_iter().collect();
    while let Some(node) = emptied.pop() {
        if node == root || !graph.contains(node) || !graph.children(node).is_empty() {
            continue;
        }
        if graph.node(node).is_some_and(|n| n.is_shared_group()) {
            for link in graph.links_to(node) {
                emptied.extend(graph.parent(link));
                graph.remove_subtree(link)?;
            }
        } else if let Some(parent) = graph.parent(node) {
            graph.remove_subtree(node)?;
            emptied.push(parent);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sh3d_scene::{Appearance, GeometryArray, Point3, Vector3};

    fn triangle() -> GeometryArray {
        GeometryArray::triangles(
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
            vec![0, 1, 2],
        )
        .unwrap()
    }

    /// Root holding `count` translated links to a shared group with one named shape
    fn instanced_graph(count: usize) -> (SceneGraph, NodeKey, NodeKey) {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let shared = graph.add_shared_group();
        let shape = graph.add_shape(Shape::new(triangle()).with_appearance(Appearance::named("wood")));
        graph.set_name(shape, "leg").unwrap();
        graph.append_child(shared, shape).unwrap();
        for i in 0..count {
            let translation = Matrix4::new_translation(&Vector3::new(10.0 * i as f64, 0.0, 0.0));
            let group = graph.add_transform_group(translation);
            graph.append_child(root, group).unwrap();
            let link = graph.add_link(shared).unwrap();
            graph.append_child(group, link).unwrap();
        }
        (graph, shared, shape)
    }

    #[test]
    fn test_shared_shape_baked_once_per_link() {
        let (mut graph, shared, shape) = instanced_graph(4);
        let vertex_count = graph.vertex_count(graph.root());

        assert_eq!(replace_multiple_shared_shapes(&mut graph).unwrap(), 1);

        let root = graph.root();
        assert!(!graph.contains(shape));
        assert!(!graph.contains(shared));
        assert_eq!(graph.children(root).len(), 1);
        let baked_key = graph.children(root)[0];
        assert_eq!(graph.name(baked_key), Some("leg"));
        let baked = graph.shape(baked_key).unwrap();
        assert_eq!(baked.appearance.as_ref().unwrap().name.as_deref(), Some("wood"));
        assert_eq!(baked.vertex_count(), 12);
        assert_eq!(graph.vertex_count(root), vertex_count);
        assert_relative_eq!(baked.geometries[0].vertices()[9].x, 30.0);
    }

    #[test]
    fn test_single_link_kept() {
        let (mut graph, shared, shape) = instanced_graph(1);
        assert_eq!(replace_multiple_shared_shapes(&mut graph).unwrap(), 0);
        assert!(graph.contains(shape));
        assert!(graph.contains(shared));
    }

    #[test]
    fn test_turned_joint_keeps_instances() {
        let (mut graph, _, shape) = instanced_graph(2);
        let root = graph.root();
        let first_group = graph.children(root)[0];
        graph
            .set_name(first_group, "sweethome3d_hinge_1_transformation")
            .unwrap();
        graph
            .set_transform(first_group, Matrix4::new_rotation(Vector3::new(0.0, 1.0, 0.0)))
            .unwrap();

        assert_eq!(replace_multiple_shared_shapes(&mut graph).unwrap(), 0);
        assert!(graph.contains(shape));
    }

    #[test]
    fn test_every_shape_of_shared_group_flattened() {
        let (mut graph, shared, _) = instanced_graph(3);
        let lines = GeometryArray::lines(vec![Point3::origin(), Point3::new(0.0, 0.0, 1.0)], vec![0, 1]).unwrap();
        let second = graph.add_shape(Shape::new(lines));
        graph.append_child(shared, second).unwrap();

        // Both shapes of the group are flattened in turn
        assert_eq!(replace_multiple_shared_shapes(&mut graph).unwrap(), 2);
        assert!(!graph.contains(second));
        assert!(!graph.contains(shared));
        assert_eq!(graph.children(graph.root()).len(), 2);
    }
}
