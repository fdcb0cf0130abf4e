// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hierarchies built for articulated models: doors on hinges and mannequins.

use sh3d_models::{post_process, update_deformable_model_hierarchy, ModelManagerConfig};
use sh3d_scene::{GeometryArray, NodeKey, Point3, SceneGraph, Shape, SpecialPrefix};

fn add_part(graph: &mut SceneGraph, name: &str) -> NodeKey {
    let geometry = GeometryArray::triangles(
        vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
        vec![0, 1, 2],
    )
    .unwrap();
    let key = graph.add_shape(Shape::new(geometry));
    graph.set_name(key, name).unwrap();
    let root = graph.root();
    graph.append_child(root, key).unwrap();
    key
}

/// Closest transform group above `key`
fn enclosing_transform_group(graph: &SceneGraph, key: NodeKey) -> Option<NodeKey> {
    let mut current = graph.parent(key);
    while let Some(node) = current {
        if graph.node(node).is_some_and(|n| n.is_transform_group()) {
            return Some(node);
        }
        current = graph.parent(node);
    }
    None
}

fn reachable_shapes(graph: &SceneGraph) -> usize {
    graph
        .descendants(graph.root())
        .into_iter()
        .filter(|&key| graph.shape(key).is_some())
        .count()
}

#[test]
fn test_hinges_paired_with_their_openings() {
    let mut graph = SceneGraph::new();
    let mut openings = Vec::new();
    for index in 1..=3 {
        add_part(&mut graph, &SpecialPrefix::Hinge.indexed(index));
        openings.push(add_part(&mut graph, &SpecialPrefix::OpeningOnHinge.indexed(index)));
    }
    add_part(&mut graph, "frame");

    update_deformable_model_hierarchy(&mut graph, 16).unwrap();

    let root = graph.root();
    let groups: Vec<NodeKey> = graph
        .children(root)
        .iter()
        .copied()
        .filter(|&key| graph.is_deformable_group(key))
        .collect();
    assert_eq!(groups.len(), 3);
    for (index, opening) in openings.into_iter().enumerate() {
        let group = enclosing_transform_group(&graph, opening).unwrap();
        let expected = format!("sweethome3d_hinge_{}_transformation", index + 1);
        assert_eq!(graph.name(group), Some(expected.as_str()));
        assert_eq!(graph.parent(group), Some(root));
        assert!(graph.is_transform_writable(group));
        assert_eq!(graph.vertex_count(group), 3);
    }
    assert_eq!(reachable_shapes(&graph), 7);
}

#[test]
fn test_double_digit_hinges_are_not_confused() {
    let mut graph = SceneGraph::new();
    let mut openings = Vec::new();
    for index in 1..=12 {
        add_part(&mut graph, &SpecialPrefix::Hinge.indexed(index));
        openings.push(add_part(&mut graph, &SpecialPrefix::OpeningOnHinge.indexed(index)));
    }

    update_deformable_model_hierarchy(&mut graph, 16).unwrap();

    let first = enclosing_transform_group(&graph, openings[0]).unwrap();
    assert_eq!(graph.name(first), Some("sweethome3d_hinge_1_transformation"));
    assert_eq!(graph.vertex_count(first), 3);
    let twelfth = enclosing_transform_group(&graph, openings[11]).unwrap();
    assert_eq!(graph.name(twelfth), Some("sweethome3d_hinge_12_transformation"));
}

#[test]
fn test_window_panes_follow_their_opening() {
    let mut graph = SceneGraph::new();
    add_part(&mut graph, "sweethome3d_hinge_1");
    let sash = add_part(&mut graph, "sweethome3d_opening_on_hinge_1");
    let pane = add_part(&mut graph, "sweethome3d_window_pane_on_hinge_1");
    let mirror = add_part(&mut graph, "sweethome3d_window_mirror_on_hinge_1");

    let config = ModelManagerConfig::from_env().with_window_pane_transparency(0.4);
    post_process(&mut graph, &config).unwrap();

    let group = enclosing_transform_group(&graph, sash).unwrap();
    assert_eq!(enclosing_transform_group(&graph, pane), Some(group));
    assert_eq!(enclosing_transform_group(&graph, mirror), Some(group));
    let appearance = graph.shape(pane).unwrap().appearance.as_ref().unwrap();
    assert_eq!(appearance.transparency, Some(0.4));
}

#[test]
fn test_ball_joint() {
    let mut graph = SceneGraph::new();
    let ball = add_part(&mut graph, "sweethome3d_ball_1");
    let arm = add_part(&mut graph, "sweethome3d_arm_on_ball_1");

    update_deformable_model_hierarchy(&mut graph, 16).unwrap();

    let group = enclosing_transform_group(&graph, arm).unwrap();
    assert_eq!(graph.name(group), Some("sweethome3d_ball_1_transformation"));
    assert_eq!(enclosing_transform_group(&graph, ball), None);
}

#[test]
fn test_mannequin_skeleton() {
    let mut graph = SceneGraph::new();
    let mut parts = Vec::new();
    for part in SpecialPrefix::MANNEQUIN_PARTS {
        parts.push((part, add_part(&mut graph, part.as_str())));
    }
    let part = |prefix: SpecialPrefix| parts.iter().find(|(p, _)| *p == prefix).map(|(_, key)| *key).unwrap();

    update_deformable_model_hierarchy(&mut graph, 16).unwrap();

    let root = graph.root();
    let top_level = graph.children(root).to_vec();
    assert_eq!(top_level.len(), 3);
    assert_eq!(graph.name(top_level[1]), Some("sweethome3d_mannequin_abdomen_chest_transformation"));
    assert_eq!(graph.name(top_level[2]), Some("sweethome3d_mannequin_abdomen_pelvis_transformation"));
    assert!(graph.is_ancestor(top_level[0], part(SpecialPrefix::MannequinAbdomen)));
    assert_eq!(reachable_shapes(&graph), SpecialPrefix::MANNEQUIN_PARTS.len());

    // Joint chain from the left hand up to the chest
    let mut chain = Vec::new();
    let mut current = enclosing_transform_group(&graph, part(SpecialPrefix::MannequinLeftHand));
    while let Some(group) = current {
        chain.push(graph.name(group).unwrap().to_string());
        current = enclosing_transform_group(&graph, group);
    }
    assert_eq!(
        chain,
        vec![
            "sweethome3d_mannequin_left_wrist_transformation",
            "sweethome3d_mannequin_left_elbow_transformation",
            "sweethome3d_mannequin_left_shoulder_transformation",
            "sweethome3d_mannequin_abdomen_chest_transformation",
        ]
    );

    let head_joint = enclosing_transform_group(&graph, part(SpecialPrefix::MannequinHead)).unwrap();
    assert_eq!(graph.name(head_joint), Some("sweethome3d_mannequin_neck_transformation"));
    let foot_joint = enclosing_transform_group(&graph, part(SpecialPrefix::MannequinRightFoot)).unwrap();
    assert_eq!(graph.name(foot_joint), Some("sweethome3d_mannequin_right_ankle_transformation"));
    let knee_joint = enclosing_transform_group(&graph, part(SpecialPrefix::MannequinRightKnee)).unwrap();
    assert_eq!(graph.name(knee_joint), Some("sweethome3d_mannequin_right_hip_transformation"));
}

#[test]
fn test_incomplete_mannequin_left_alone() {
    let mut graph = SceneGraph::new();
    for part in &SpecialPrefix::MANNEQUIN_PARTS[1..] {
        add_part(&mut graph, part.as_str());
    }
    update_deformable_model_hierarchy(&mut graph, 16).unwrap();
    assert_eq!(graph.children(graph.root()).len(), SpecialPrefix::MANNEQUIN_PARTS.len() - 1);
}
