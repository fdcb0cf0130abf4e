// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Passes applied to every loaded model before it's cached.

mod deformable;
mod shared_shapes;
mod transparency;

pub use deformable::update_deformable_model_hierarchy;
pub use shared_shapes::replace_multiple_shared_shapes;
pub use transparency::update_window_panes_transparency;

use sh3d_scene::SceneGraph;

use crate::config::ModelManagerConfig;
use crate::error::Result;

/// Runs the transparency, articulation and flattening passes in order.
pub fn post_process(graph: &mut SceneGraph, config: &ModelManagerConfig) -> Result<()> {
    update_window_panes_transparency(graph, config.window_pane_transparency);
    update_deformable_model_hierarchy(graph, config.max_sub_transformation_passes)?;
    if config.flatten_shared_shapes {
        replace_multiple_shared_shapes(graph)?;
    }
    Ok(())
}
