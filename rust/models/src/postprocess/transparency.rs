// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use rustc_hash::FxHashSet;
use sh3d_scene::{Appearance, NodeKey, NodeKind, SceneGraph, SpecialPrefix};

/// Gives `transparency` to window pane shapes that don't specify one.
///
/// Returns the number of updated shapes.
pub fn update_window_panes_transparency(graph: &mut SceneGraph, transparency: f32) -> usize {
    let mut panes = Vec::new();
    let mut visited = FxHashSet::default();
    collect_window_panes(graph, graph.root(), &mut visited, &mut panes);

    let mut updated = 0;
    for pane in panes {
        if let Some(shape) = graph.shape_mut(pane) {
            let appearance = shape.appearance.get_or_insert_with(Appearance::default);
            if appearance.transparency.is_none() {
                appearance.transparency = Some(transparency);
                updated += 1;
            }
        }
    }
    updated
}

fn collect_window_panes(
    graph: &SceneGraph,
    node: NodeKey,
    visited_shared_groups: &mut FxHashSet<NodeKey>,
    panes: &mut Vec<NodeKey>,
) {
    let Some(kind) = graph.node(node).map(|n| n.kind()) else {
        return;
    };
    match kind {
        NodeKind::Group { children }
        | NodeKind::TransformGroup { children, .. }
        | NodeKind::SharedGroup { children } => {
            for &child in children {
                collect_window_panes(graph, child, visited_shared_groups, panes);
            }
        }
        NodeKind::Link { shared_group } => {
            if visited_shared_groups.insert(*shared_group) {
                collect_window_panes(graph, *shared_group, visited_shared_groups, panes);
            }
        }
        NodeKind::Shape(_) => {
            if graph.name(node).is_some_and(|name| SpecialPrefix::WindowPane.matches(name)) {
                panes.push(node);
            }
        }
    }
}
