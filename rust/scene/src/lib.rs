// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # SH3D Scene
//!
//! Scene-graph data model for furniture and home models.
//!
//! A loaded model is a [`SceneGraph`]: an arena of [`Node`]s addressed by
//! [`NodeKey`]s. Groups own their children through keys, a `Link` refers to a
//! `SharedGroup` that has no parent of its own, and shapes hold immutable
//! [`GeometryArray`] buffers behind an `Arc` so that cloning a model is cheap
//! and never duplicates vertex data.
//!
//! ## Naming convention
//!
//! Model files tag window panes, mirrors, lights, mannequin body parts and
//! articulation joints through node names. The recognised prefixes are listed
//! in [`names::SpecialPrefix`].
//!
//! ## Quick Start
//!
//! ```
//! use sh3d_scene::{GeometryArray, SceneGraph, Shape};
//! use nalgebra::Point3;
//!
//! let geometry = GeometryArray::triangles(
//!     vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
//!     vec![0, 1, 2],
//! )
//! .unwrap();
//!
//! let mut graph = SceneGraph::new();
//! let shape = graph.add_shape(Shape::new(geometry));
//! graph.append_child(graph.root(), shape).unwrap();
//!
//! assert_eq!(graph.vertex_count(graph.root()), 3);
//! ```

pub mod appearance;
pub mod bounds;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod keys;
pub mod names;
pub mod node;
pub mod primitives;
pub mod query;

pub use appearance::{Appearance, TextureImage};
pub use bounds::BoundingBox;
pub use error::{Error, Result};
pub use geometry::{GeometryArray, PrimitiveKind};
pub use graph::SceneGraph;
pub use keys::NodeKey;
pub use names::SpecialPrefix;
pub use node::{Children, Node, NodeKind, Shape};

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix4, Point2, Point3, Vector3};
