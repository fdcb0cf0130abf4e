// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model manager configuration loaded from environment variables.

use sh3d_geometry::AreaOptions;

/// Model manager configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelManagerConfig {
    /// Transparency given to window panes without explicit transparency.
    pub window_pane_transparency: f32,
    /// Vertex count from which floor areas are approximated by a convex hull.
    pub floor_area_vertex_threshold: usize,
    /// Vertex count from which front areas are approximated by a square.
    pub front_area_vertex_threshold: usize,
    /// Maximum number of sub transformations attached while rewriting deformable models.
    pub max_sub_transformation_passes: usize,
    /// Whether shapes shared by several links are baked into one shape.
    pub flatten_shared_shapes: bool,
}

impl ModelManagerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            window_pane_transparency: std::env::var("SH3D_WINDOW_PANE_TRANSPARENCY")
                .unwrap_or_else(|_| "0.5".into())
                .parse()
                .unwrap_or(0.5),
            floor_area_vertex_threshold: std::env::var("SH3D_FLOOR_AREA_VERTEX_THRESHOLD")
                .unwrap_or_else(|_| "10000".into())
                .parse()
                .unwrap_or(10_000),
            front_area_vertex_threshold: std::env::var("SH3D_FRONT_AREA_VERTEX_THRESHOLD")
                .unwrap_or_else(|_| "1000000".into())
                .parse()
                .unwrap_or(1_000_000),
            max_sub_transformation_passes: std::env::var("SH3D_MAX_SUB_TRANSFORMATION_PASSES")
                .unwrap_or_else(|_| "1024".into())
                .parse()
                .unwrap_or(1024),
            flatten_shared_shapes: std::env::var("SH3D_FLATTEN_SHARED_SHAPES")
                .map(|value| !matches!(value.trim(), "0" | "false" | "no" | "off"))
                .unwrap_or(true),
        }
    }

    pub fn with_window_pane_transparency(mut self, transparency: f32) -> Self {
        self.window_pane_transparency = transparency;
        self
    }

    pub fn with_floor_area_vertex_threshold(mut self, threshold: usize) -> Self {
        self.floor_area_vertex_threshold = threshold;
        self
    }

    pub fn with_front_area_vertex_threshold(mut self, threshold: usize) -> Self {
        self.front_area_vertex_threshold = threshold;
        self
    }

    pub fn with_max_sub_transformation_passes(mut self, passes: usize) -> Self {
        self.max_sub_transformation_passes = passes;
        self
    }

    pub fn with_flatten_shared_shapes(mut self, flatten: bool) -> Self {
        self.flatten_shared_shapes = flatten;
        self
    }

    /// Vertex thresholds used by area computations
    pub fn area_options(&self) -> AreaOptions {
        AreaOptions {
            floor_vertex_threshold: self.floor_area_vertex_threshold,
            front_vertex_threshold: self.front_area_vertex_threshold,
        }
    }
}

impl Default for ModelManagerConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
