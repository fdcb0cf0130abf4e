// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for scene-graph operations.

use crate::keys::NodeKey;

/// Result type alias for scene-graph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or editing a scene graph.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A referenced node was not found in the arena.
    #[error("scene node not found: {0:?}")]
    NodeNotFound(NodeKey),

    /// Children can only be added to groups.
    #[error("scene node {0:?} is not a group")]
    NotAGroup(NodeKey),

    /// The node was expected to be a transform group.
    #[error("scene node {0:?} is not a transform group")]
    NotATransformGroup(NodeKey),

    /// A link must target a shared group.
    #[error("scene node {0:?} is not a shared group")]
    NotASharedGroup(NodeKey),

    /// Shared groups are only reachable through links.
    #[error("shared group {0:?} can't be the child of another node")]
    SharedGroupChild(NodeKey),

    /// A node can only have one parent.
    #[error("scene node {0:?} already has a parent")]
    AlreadyAttached(NodeKey),

    /// The root of a graph can't be moved under another node.
    #[error("the root node can't be attached or removed")]
    RootNode,

    /// Attaching the node would make it its own ancestor.
    #[error("attaching {child:?} under {parent:?} would create a cycle")]
    Cycle { parent: NodeKey, child: NodeKey },

    /// An index of a geometry buffer references a missing element.
    #[error("{buffer} index {index} out of bounds (length {len})")]
    IndexOutOfBounds {
        buffer: &'static str,
        index: u32,
        len: usize,
    },

    /// Index arrays must describe whole primitives.
    #[error("{buffer} count {count} is not a multiple of {stride}")]
    IndexStride {
        buffer: &'static str,
        count: usize,
        stride: usize,
    },

    /// Normals are only supported by triangle arrays.
    #[error("line arrays can't carry normals")]
    NormalsOnLines,

    /// Per-vertex attribute indices must match vertex indices one to one.
    #[error("{buffer} count {count} doesn't match the {expected} vertex indices")]
    IndexCountMismatch {
        buffer: &'static str,
        count: usize,
        expected: usize,
    },
}
