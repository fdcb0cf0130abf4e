// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scene node variants stored in a [`SceneGraph`](crate::SceneGraph).

use std::sync::Arc;

use nalgebra::Matrix4;
use smallvec::SmallVec;

use crate::appearance::Appearance;
use crate::geometry::GeometryArray;
use crate::keys::NodeKey;

/// Ordered child list of a group.
pub type Children = SmallVec<[NodeKey; 4]>;

/// Leaf node drawing one or more geometries with a single appearance.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    /// Geometry buffers, shared between clones of the model
    pub geometries: SmallVec<[Arc<GeometryArray>; 1]>,
    pub appearance: Option<Appearance>,
}

impl Shape {
    pub fn new(geometry: GeometryArray) -> Self {
        Self::from_shared(Arc::new(geometry))
    }

    pub fn from_shared(geometry: Arc<GeometryArray>) -> Self {
        let mut geometries = SmallVec::new();
        geometries.push(geometry);
        Self {
            geometries,
            appearance: None,
        }
    }

    pub fn with_appearance(mut self, appearance: Appearance) -> Self {
        self.appearance = Some(appearance);
        self
    }

    /// A shape without appearance is drawn with default attributes, so it's visible
    #[inline]
    pub fn is_visible(&self) -> bool {
        self.appearance.as_ref().map_or(true, |a| a.visible)
    }

    #[inline]
    pub fn is_fully_transparent(&self) -> bool {
        self.appearance.as_ref().is_some_and(Appearance::is_fully_transparent)
    }

    /// Total vertex count of the shape geometries
    pub fn vertex_count(&self) -> usize {
        self.geometries.iter().map(|g| g.vertex_count()).sum()
    }
}

/// Node variants.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Ordered list of owned children
    Group { children: Children },
    /// Group applying a transform to its subtree
    TransformGroup {
        transform: Matrix4<f64>,
        children: Children,
        /// Set on joints that can be articulated at run time
        transform_writable: bool,
    },
    /// Group without parent, reachable only through links
    SharedGroup { children: Children },
    /// Non-owning reference to a shared group
    Link { shared_group: NodeKey },
    Shape(Shape),
}

/// A node of a scene graph.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) name: Option<String>,
    pub(crate) parent: Option<NodeKey>,
    pub(crate) kind: NodeKind,
}

impl Node {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self {
            name: None,
            parent: None,
            kind,
        }
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    #[inline]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Children of a group, empty for links and shapes
    pub fn children(&self) -> &[NodeKey] {
        match &self.kind {
            NodeKind::Group { children }
            | NodeKind::TransformGroup { children, .. }
            | NodeKind::SharedGroup { children } => children,
            NodeKind::Link { .. } | NodeKind::Shape(_) => &[],
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Children> {
        match &mut self.kind {
            NodeKind::Group { children }
            | NodeKind::TransformGroup { children, .. }
            | NodeKind::SharedGroup { children } => Some(children),
            NodeKind::Link { .. } | NodeKind::Shape(_) => None,
        }
    }

    #[inline]
    pub fn is_group(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Group { .. } | NodeKind::TransformGroup { .. } | NodeKind::SharedGroup { .. }
        )
    }

    #[inline]
    pub fn is_transform_group(&self) -> bool {
        matches!(self.kind, NodeKind::TransformGroup { .. })
    }

    #[inline]
    pub fn is_shared_group(&self) -> bool {
        matches!(self.kind, NodeKind::SharedGroup { .. })
    }

    pub fn transform(&self) -> Option<&Matrix4<f64>> {
        match &self.kind {
            NodeKind::TransformGroup { transform, .. } => Some(transform),
            _ => None,
        }
    }

    pub fn as_shape(&self) -> Option<&Shape> {
        match &self.kind {
            NodeKind::Shape(shape) => Some(shape),
            _ => None,
        }
    }

    /// Target of a link
    pub fn shared_group(&self) -> Option<NodeKey> {
        match self.kind {
            NodeKind::Link { shared_group } => Some(shared_group),
            _ => None,
        }
    }
}
