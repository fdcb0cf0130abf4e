// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Arena-based scene graph.
//!
//! The [`SceneGraph`] owns every node of a model in a slot map. Groups keep
//! the ordered keys of their children and each attached node knows its
//! parent. Shared groups never have a parent: they are kept alive by the
//! arena and reached through `Link` nodes, so many links can instance the
//! same subtree.
//!
//! Cloning a graph clones the arena: node keys stay valid in the clone, each
//! shared group is copied exactly once whatever the number of links pointing
//! to it, and geometry buffers are shared through their `Arc`.

use std::sync::Arc;

use nalgebra::Matrix4;
use slotmap::SlotMap;

use crate::error::{Error, Result};
use crate::geometry::GeometryArray;
use crate::keys::NodeKey;
use crate::node::{Children, Node, NodeKind, Shape};

/// Scene graph of a model, rooted at a plain group.
///
/// # Example
///
/// ```
/// use sh3d_scene::{Matrix4, SceneGraph};
///
/// let mut graph = SceneGraph::new();
/// let joint = graph.add_transform_group(Matrix4::identity());
/// graph.set_name(joint, "sweethome3d_hinge_1_transformation").unwrap();
/// graph.append_child(graph.root(), joint).unwrap();
///
/// assert_eq!(graph.children(graph.root()), &[joint]);
/// assert_eq!(graph.parent(joint), Some(graph.root()));
/// ```
#[derive(Debug, Clone)]
pub struct SceneGraph {
    pub(crate) nodes: SlotMap<NodeKey, Node>,
    root: NodeKey,
    content_ref: Option<String>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Creates a graph made of an empty root group.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::new(NodeKind::Group {
            children: Children::new(),
        }));
        Self {
            nodes,
            root,
            content_ref: None,
        }
    }

    #[inline]
    pub fn root(&self) -> NodeKey {
        self.root
    }

    /// Returns the node for the given key, or `None` if not found.
    #[inline]
    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    fn node_ref(&self, key: NodeKey) -> Result<&Node> {
        self.nodes.get(key).ok_or(Error::NodeNotFound(key))
    }

    fn node_mut(&mut self, key: NodeKey) -> Result<&mut Node> {
        self.nodes.get_mut(key).ok_or(Error::NodeNotFound(key))
    }

    /// Returns the number of nodes in the arena, detached ones included.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    // --- Node creation ---
    //
    // New nodes are detached: attach them with `append_child` or
    // `insert_child`.

    pub fn add_group(&mut self) -> NodeKey {
        self.nodes.insert(Node::new(NodeKind::Group {
            children: Children::new(),
        }))
    }

    pub fn add_transform_group(&mut self, transform: Matrix4<f64>) -> NodeKey {
        self.nodes.insert(Node::new(NodeKind::TransformGroup {
            transform,
            children: Children::new(),
            transform_writable: false,
        }))
    }

    pub fn add_shared_group(&mut self) -> NodeKey {
        self.nodes.insert(Node::new(NodeKind::SharedGroup {
            children: Children::new(),
        }))
    }

    /// Adds a link instancing `shared_group`.
    pub fn add_link(&mut self, shared_group: NodeKey) -> Result<NodeKey> {
        if !self.node_ref(shared_group)?.is_shared_group() {
            return Err(Error::NotASharedGroup(shared_group));
        }
        Ok(self.nodes.insert(Node::new(NodeKind::Link { shared_group })))
    }

    pub fn add_shape(&mut self, shape: Shape) -> NodeKey {
        self.nodes.insert(Node::new(NodeKind::Shape(shape)))
    }

    // --- Names ---

    #[inline]
    pub fn name(&self, key: NodeKey) -> Option<&str> {
        self.nodes.get(key).and_then(Node::name)
    }

    pub fn set_name(&mut self, key: NodeKey, name: impl Into<String>) -> Result<()> {
        self.node_mut(key)?.name = Some(name.into());
        Ok(())
    }

    // --- Hierarchy ---

    /// Children of a group, empty for other nodes and missing keys.
    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.nodes.get(key).map_or(&[], Node::children)
    }

    #[inline]
    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.nodes.get(key).and_then(Node::parent)
    }

    /// Position of `child` among the children of `parent`.
    pub fn child_index(&self, parent: NodeKey, child: NodeKey) -> Option<usize> {
        self.children(parent).iter().position(|&c| c == child)
    }

    /// Returns true if `ancestor` is `key` or one of its owning ancestors.
    pub fn is_ancestor(&self, ancestor: NodeKey, key: NodeKey) -> bool {
        let mut current = Some(key);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Appends a detached node at the end of the children of `parent`.
    pub fn append_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<()> {
        let index = self.children(parent).len();
        self.insert_child(parent, index, child)
    }

    /// Inserts a detached node among the children of `parent`.
    ///
    /// `index` is clamped to the number of children.
    pub fn insert_child(&mut self, parent: NodeKey, index: usize, child: NodeKey) -> Result<()> {
        self.check_attachable(parent, child)?;
        let children = self
            .node_mut(parent)?
            .children_mut()
            .ok_or(Error::NotAGroup(parent))?;
        children.insert(index.min(children.len()), child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    fn check_attachable(&self, parent: NodeKey, child: NodeKey) -> Result<()> {
        if !self.node_ref(parent)?.is_group() {
            return Err(Error::NotAGroup(parent));
        }
        let child_node = self.node_ref(child)?;
        if child == self.root {
            return Err(Error::RootNode);
        }
        if child_node.is_shared_group() {
            return Err(Error::SharedGroupChild(child));
        }
        if child_node.parent.is_some() {
            return Err(Error::AlreadyAttached(child));
        }
        if self.is_ancestor(child, parent) {
            return Err(Error::Cycle { parent, child });
        }
        Ok(())
    }

    /// Removes a node from its parent, keeping it and its subtree in the arena.
    ///
    /// Detaching a node without parent does nothing.
    pub fn detach(&mut self, key: NodeKey) -> Result<()> {
        if key == self.root {
            return Err(Error::RootNode);
        }
        let Some(parent) = self.node_ref(key)?.parent else {
            return Ok(());
        };
        if let Some(children) = self.node_mut(parent)?.children_mut() {
            children.retain(|c| *c != key);
        }
        self.node_mut(key)?.parent = None;
        Ok(())
    }

    /// Detaches a node and deletes it with its owned descendants.
    ///
    /// Shared groups reached through links are not owned and stay alive.
    pub fn remove_subtree(&mut self, key: NodeKey) -> Result<()> {
        self.detach(key)?;
        for node in self.descendants(key) {
            self.nodes.remove(node);
        }
        Ok(())
    }

    /// `key` followed by its owned descendants in depth-first pre-order.
    ///
    /// Links are returned but not followed.
    pub fn descendants(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut result = Vec::new();
        if !self.contains(key) {
            return result;
        }
        let mut stack = vec![key];
        while let Some(node) = stack.pop() {
            result.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        result
    }

    // --- Transforms ---

    pub fn transform(&self, key: NodeKey) -> Option<&Matrix4<f64>> {
        self.nodes.get(key).and_then(Node::transform)
    }

    pub fn set_transform(&mut self, key: NodeKey, matrix: Matrix4<f64>) -> Result<()> {
        match &mut self.node_mut(key)?.kind {
            NodeKind::TransformGroup { transform, .. } => {
                *transform = matrix;
                Ok(())
            }
            _ => Err(Error::NotATransformGroup(key)),
        }
    }

    pub fn is_transform_writable(&self, key: NodeKey) -> bool {
        matches!(
            self.nodes.get(key).map(Node::kind),
            Some(NodeKind::TransformGroup {
                transform_writable: true,
                ..
            })
        )
    }

    pub fn set_transform_writable(&mut self, key: NodeKey, writable: bool) -> Result<()> {
        match &mut self.node_mut(key)?.kind {
            NodeKind::TransformGroup {
                transform_writable, ..
            } => {
                *transform_writable = writable;
                Ok(())
            }
            _ => Err(Error::NotATransformGroup(key)),
        }
    }

    // --- Shapes and links ---

    pub fn shape(&self, key: NodeKey) -> Option<&Shape> {
        self.nodes.get(key).and_then(Node::as_shape)
    }

    pub fn shape_mut(&mut self, key: NodeKey) -> Option<&mut Shape> {
        match self.nodes.get_mut(key).map(|n| &mut n.kind) {
            Some(NodeKind::Shape(shape)) => Some(shape),
            _ => None,
        }
    }

    /// Target of a link, if it's still in the arena.
    pub fn shared_group(&self, link: NodeKey) -> Option<NodeKey> {
        self.nodes
            .get(link)
            .and_then(Node::shared_group)
            .filter(|target| self.contains(*target))
    }

    /// Links of the arena referencing `shared_group`.
    pub fn links_to(&self, shared_group: NodeKey) -> Vec<NodeKey> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.shared_group() == Some(shared_group))
            .map(|(key, _)| key)
            .collect()
    }

    /// Keys of every shape stored in the arena.
    pub fn shape_keys(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.nodes
            .iter()
            .filter(|(_, node)| node.as_shape().is_some())
            .map(|(key, _)| key)
    }

    /// Every geometry buffer referenced by a shape of the arena.
    pub fn geometries(&self) -> impl Iterator<Item = &Arc<GeometryArray>> + '_ {
        self.nodes
            .values()
            .filter_map(Node::as_shape)
            .flat_map(|shape| shape.geometries.iter())
    }

    /// Deletes the shared groups that no link references anymore.
    ///
    /// Returns the number of deleted shared groups.
    pub fn remove_unreferenced_shared_groups(&mut self) -> usize {
        let mut removed = 0;
        loop {
            let referenced: rustc_hash::FxHashSet<NodeKey> = self
                .nodes
                .values()
                .filter_map(Node::shared_group)
                .collect();
            let orphans: Vec<NodeKey> = self
                .nodes
                .iter()
                .filter(|(key, node)| node.is_shared_group() && !referenced.contains(key))
                .map(|(key, _)| key)
                .collect();
            if orphans.is_empty() {
                return removed;
            }
            for orphan in orphans {
                for node in self.descendants(orphan) {
                    self.nodes.remove(node);
                }
                removed += 1;
            }
        }
    }

    // --- Content tag ---

    /// Content reference the model was loaded from.
    pub fn content_ref(&self) -> Option<&str> {
        self.content_ref.as_deref()
    }

    pub fn set_content_ref(&mut self, content_ref: impl Into<String>) {
        self.content_ref = Some(content_ref.into());
    }
}
