// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Structural queries: name search, deformable groups and vertex counts.
//!
//! Name searches and deformation checks only walk owned children, links are
//! not followed. Vertex counts follow links since instanced geometry is
//! drawn once per link.

use crate::graph::SceneGraph;
use crate::keys::NodeKey;
use crate::names;
use crate::node::NodeKind;

impl SceneGraph {
    /// Returns true if `key` or one of its descendants has a name accepted by `matches`.
    pub fn contains_node_matching<F>(&self, key: NodeKey, matches: F) -> bool
    where
        F: Fn(&str) -> bool,
    {
        self.descendants(key)
            .into_iter()
            .any(|node| self.name(node).is_some_and(&matches))
    }

    /// Returns true if `key` or one of its descendants has a name starting with `prefix`.
    pub fn contains_node_with_prefix(&self, key: NodeKey, prefix: &str) -> bool {
        self.contains_node_matching(key, |name| name.starts_with(prefix))
    }

    /// Nodes under `key` (itself included) whose name is accepted by `matches`.
    ///
    /// Nodes are listed in depth-first order, visiting the children of each
    /// group from the last one to the first one. Descendants of a found node
    /// are searched too.
    pub fn find_nodes_matching<F>(&self, key: NodeKey, matches: F) -> Vec<NodeKey>
    where
        F: Fn(&str) -> bool,
    {
        let mut found = Vec::new();
        if !self.contains(key) {
            return found;
        }
        let mut stack = vec![key];
        while let Some(node) = stack.pop() {
            if self.name(node).is_some_and(&matches) {
                found.push(node);
            }
            stack.extend(self.children(node).iter().copied());
        }
        found
    }

    /// Returns true if `key` is a transform group built around a joint.
    pub fn is_deformable_group(&self, key: NodeKey) -> bool {
        self.node(key).is_some_and(|node| {
            node.is_transform_group() && node.name().is_some_and(names::is_deformable_group_name)
        })
    }

    /// Returns true if `key` or a node of its subtree is a deformable group.
    pub fn contains_deformable_node(&self, key: NodeKey) -> bool {
        self.descendants(key)
            .into_iter()
            .any(|node| self.is_deformable_group(node))
    }

    /// Returns true if a deformable group of the subtree has a non-identity transform.
    ///
    /// The search stops at the first deformable group of each branch: its
    /// own transform decides for the whole branch.
    pub fn is_deformed(&self, key: NodeKey) -> bool {
        if self.is_deformable_group(key) {
            return self
                .transform(key)
                .is_some_and(|transform| *transform != nalgebra::Matrix4::identity());
        }
        self.children(key).iter().any(|&child| self.is_deformed(child))
    }

    /// Vertex count of the visible shapes under `key`, links followed.
    pub fn vertex_count(&self, key: NodeKey) -> usize {
        match self.node(key).map(|node| node.kind()) {
            Some(NodeKind::Group { children })
            | Some(NodeKind::TransformGroup { children, .. })
            | Some(NodeKind::SharedGroup { children }) => {
                children.iter().map(|&child| self.vertex_count(child)).sum()
            }
            Some(NodeKind::Link { shared_group }) => self.vertex_count(*shared_group),
            Some(NodeKind::Shape(shape)) if shape.is_visible() => shape.vertex_count(),
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appearance::Appearance;
    use crate::geometry::GeometryArray;
    use crate::node::Shape;
    use nalgebra::{Matrix4, Point3, Vector3};

    fn named_shape(graph: &mut SceneGraph, parent: NodeKey, name: &str) -> NodeKey {
        let geometry = GeometryArray::triangles(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![0, 1, 2],
        )
        .unwrap();
        let shape = graph.add_shape(Shape::new(geometry));
        graph.set_name(shape, name).unwrap();
        graph.append_child(parent, shape).unwrap();
        shape
    }

    #[test]
    fn test_prefix_search() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let group = graph.add_group();
        graph.append_child(root, group).unwrap();
        let first = named_shape(&mut graph, group, "sweethome3d_hinge_1");
        let second = named_shape(&mut graph, root, "sweethome3d_hinge_2");

        assert!(graph.contains_node_with_prefix(root, "sweethome3d_hinge_"));
        assert!(!graph.contains_node_with_prefix(root, "sweethome3d_rail_"));
        assert_eq!(
            graph.find_nodes_matching(root, |name| name.starts_with("sweethome3d_hinge_")),
            vec![second, first]
        );
    }

    #[test]
    fn test_deformed_groups() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let joint = graph.add_transform_group(Matrix4::identity());
        graph.set_name(joint, "sweethome3d_hinge_1_transformation").unwrap();
        graph.append_child(root, joint).unwrap();

        assert!(graph.is_deformable_group(joint));
        assert!(graph.contains_deformable_node(root));
        assert!(!graph.is_deformed(root));

        graph
            .set_transform(joint, Matrix4::new_rotation(Vector3::new(0.0, 0.5, 0.0)))
            .unwrap();
        assert!(graph.is_deformed(root));

        let plain = graph.add_transform_group(Matrix4::new_scaling(2.0));
        let other = graph.add_group();
        graph.append_child(other, plain).unwrap();
        assert!(!graph.is_deformed(other));
        assert!(!graph.contains_deformable_node(other));
    }

    #[test]
    fn test_vertex_count_follows_links_and_skips_hidden_shapes() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let shared = graph.add_shared_group();
        named_shape(&mut graph, shared, "bolt");
        for _ in 0..3 {
            let link = graph.add_link(shared).unwrap();
            graph.append_child(root, link).unwrap();
        }
        let hidden = named_shape(&mut graph, root, "hidden");
        graph.shape_mut(hidden).unwrap().appearance = Some(Appearance::default().with_visible(false));

        assert_eq!(graph.vertex_count(root), 9);
    }
}
