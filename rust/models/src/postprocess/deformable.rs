// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Articulation of models tagged with joint names.
//!
//! Model files mark hinges, rails, balls and mannequin body parts through
//! node names only. This pass moves the tagged nodes under pickable
//! transform groups nested like the joints they stand for, so that turning
//! one group moves everything that hangs from it.

use rustc_hash::FxHashSet;
use sh3d_scene::names::{deformable_group_name, SUB_TRANSFORMATION_SEPARATOR};
use sh3d_scene::{Matrix4, NodeKey, SceneGraph, SpecialPrefix};

use crate::error::Result;

/// Joints that other joints may depend on
const REFERENCE_PREFIXES: [SpecialPrefix; 3] = [SpecialPrefix::Hinge, SpecialPrefix::Ball, SpecialPrefix::Rail];

/// Moving parts of each joint of [`REFERENCE_PREFIXES`], in the same order
const SUB_TRANSFORMATION_PREFIXES: [SpecialPrefix; 3] = [
    SpecialPrefix::OpeningOnHinge,
    SpecialPrefix::ArmOnBall,
    SpecialPrefix::OpeningOnRail,
];

/// Nests the nodes of a model under pickable transform groups.
///
/// A model containing every mannequin part is rebuilt as a human skeleton.
/// Otherwise hinges, balls and rails are grouped with their openings, then
/// joints depending on another joint are attached to its group, at most
/// `max_sub_transformation_passes` times.
pub fn update_deformable_model_hierarchy(graph: &mut SceneGraph, max_sub_transformation_passes: usize) -> Result<()> {
    let root = graph.root();
    if SpecialPrefix::MANNEQUIN_PARTS
        .iter()
        .all(|part| graph.contains_node_with_prefix(root, part.as_str()))
    {
        return update_mannequin_hierarchy(graph);
    }

    update_simple_hierarchy(
        graph,
        None,
        SpecialPrefix::Hinge,
        SpecialPrefix::OpeningOnHinge,
        Some(SpecialPrefix::WindowPaneOnHinge),
        Some(SpecialPrefix::WindowMirrorOnHinge),
    )?;
    update_simple_hierarchy(graph, None, SpecialPrefix::Ball, SpecialPrefix::ArmOnBall, None, None)?;
    update_simple_hierarchy(
        graph,
        Some(SpecialPrefix::UniqueRail),
        SpecialPrefix::Rail,
        SpecialPrefix::OpeningOnRail,
        Some(SpecialPrefix::WindowPaneOnRail),
        Some(SpecialPrefix::WindowMirrorOnRail),
    )?;

    let mut moved_nodes = FxHashSet::default();
    let mut passes = 0;
    loop {
        if passes == max_sub_transformation_passes {
            tracing::warn!(passes, "Stopped attaching sub transformations");
            break;
        }
        if !update_sub_transformed_hierarchy(graph, &mut moved_nodes)? {
            break;
        }
        passes += 1;
    }
    Ok(())
}

fn update_mannequin_hierarchy(graph: &mut SceneGraph) -> Result<()> {
    use SpecialPrefix::*;

    let head = extract(graph, MannequinHead)?;
    let head_group = pickable_group(graph, MannequinNeck, &[head])?;

    let left_arm_group = limb(
        graph,
        [
            MannequinLeftHand,
            MannequinLeftWrist,
            MannequinLeftForearm,
            MannequinLeftElbow,
            MannequinLeftArm,
            MannequinLeftShoulder,
        ],
    )?;
    let right_arm_group = limb(
        graph,
        [
            MannequinRightHand,
            MannequinRightWrist,
            MannequinRightForearm,
            MannequinRightElbow,
            MannequinRightArm,
            MannequinRightShoulder,
        ],
    )?;

    let chest = extract(graph, MannequinChest)?;
    let left_shoulder = extract(graph, MannequinLeftShoulder)?;
    let right_shoulder = extract(graph, MannequinRightShoulder)?;
    let neck = extract(graph, MannequinNeck)?;
    let chest_group = pickable_group(
        graph,
        MannequinAbdomenChest,
        &[
            chest,
            left_shoulder,
            Some(left_arm_group),
            right_shoulder,
            Some(right_arm_group),
            neck,
            Some(head_group),
        ],
    )?;

    let left_leg_group = limb(
        graph,
        [
            MannequinLeftFoot,
            MannequinLeftAnkle,
            MannequinLeftLeg,
            MannequinLeftKnee,
            MannequinLeftThigh,
            MannequinLeftHip,
        ],
    )?;
    let right_leg_group = limb(
        graph,
        [
            MannequinRightFoot,
            MannequinRightAnkle,
            MannequinRightLeg,
            MannequinRightKnee,
            MannequinRightThigh,
            MannequinRightHip,
        ],
    )?;

    let pelvis = extract(graph, MannequinPelvis)?;
    let left_hip = extract(graph, MannequinLeftHip)?;
    let right_hip = extract(graph, MannequinRightHip)?;
    let pelvis_group = pickable_group(
        graph,
        MannequinAbdomenPelvis,
        &[pelvis, left_hip, Some(left_leg_group), right_hip, Some(right_leg_group)],
    )?;

    let abdomen = extract(graph, MannequinAbdomen)?;
    let root = graph.root();
    if let Some(abdomen) = abdomen {
        graph.append_child(root, abdomen)?;
    }
    graph.append_child(root, chest_group)?;
    graph.append_child(root, pelvis_group)?;
    Ok(())
}

/// Builds the three nested groups of an arm or a leg.
///
/// `parts` lists, from the extremity up: the end part, its joint, the lower
/// part, the middle joint, the upper part and the joint the limb hangs from.
fn limb(graph: &mut SceneGraph, parts: [SpecialPrefix; 6]) -> Result<NodeKey> {
    let [end, end_joint, lower, middle_joint, upper, root_joint] = parts;

    let end_node = extract(graph, end)?;
    let end_group = pickable_group(graph, end_joint, &[end_node])?;

    let lower_node = extract(graph, lower)?;
    let end_joint_node = extract(graph, end_joint)?;
    let lower_group = pickable_group(graph, middle_joint, &[lower_node, end_joint_node, Some(end_group)])?;

    let upper_node = extract(graph, upper)?;
    let middle_joint_node = extract(graph, middle_joint)?;
    pickable_group(graph, root_joint, &[upper_node, middle_joint_node, Some(lower_group)])
}

/// Groups openings with their hinge, ball or rail.
///
/// Indexed openings go with the reference node of the same index. Without
/// indexed reference nodes, a unique reference node keeps all the openings.
fn update_simple_hierarchy(
    graph: &mut SceneGraph,
    unique_reference: Option<SpecialPrefix>,
    reference: SpecialPrefix,
    opening: SpecialPrefix,
    opening_pane: Option<SpecialPrefix>,
    opening_mirror: Option<SpecialPrefix>,
) -> Result<()> {
    let has_opening = |graph: &SceneGraph, index: usize| {
        contains_indexed(graph, opening, index)
            || opening_pane.is_some_and(|pane| contains_indexed(graph, pane, index))
            || opening_mirror.is_some_and(|mirror| contains_indexed(graph, mirror, index))
    };
    if !has_opening(&*graph, 1) {
        return Ok(());
    }

    let root = graph.root();
    if contains_indexed(graph, reference, 1) {
        let mut index = 1;
        loop {
            let reference_node = extract_indexed(graph, reference, index)?;
            let opening_group = opening_group(graph, reference, opening, opening_pane, opening_mirror, index)?;
            if let Some(reference_node) = reference_node {
                graph.append_child(root, reference_node)?;
            }
            graph.append_child(root, opening_group)?;
            index += 1;
            if !(contains_indexed(graph, reference, index) && has_opening(&*graph, index)) {
                break;
            }
        }
    } else if let Some(unique_reference) =
        unique_reference.filter(|prefix| graph.contains_node_with_prefix(root, prefix.as_str()))
    {
        if let Some(reference_node) = extract(graph, unique_reference)? {
            graph.append_child(root, reference_node)?;
        }
        let mut index = 1;
        loop {
            let opening_group = opening_group(graph, reference, opening, opening_pane, opening_mirror, index)?;
            graph.append_child(root, opening_group)?;
            index += 1;
            if !has_opening(&*graph, index) {
                break;
            }
        }
    }
    Ok(())
}

fn opening_group(
    graph: &mut SceneGraph,
    reference: SpecialPrefix,
    opening: SpecialPrefix,
    opening_pane: Option<SpecialPrefix>,
    opening_mirror: Option<SpecialPrefix>,
    index: usize,
) -> Result<NodeKey> {
    let opening_node = extract_indexed(graph, opening, index)?;
    let pane_node = match opening_pane {
        Some(pane) => extract_indexed(graph, pane, index)?,
        None => None,
    };
    let mirror_node = match opening_mirror {
        Some(mirror) => extract_indexed(graph, mirror, index)?,
        None => None,
    };
    create_pickable_transform_group(graph, &reference.indexed(index), &[opening_node, pane_node, mirror_node])
}

/// Attaches the first joint found that depends on another joint.
///
/// A node named like `sweethome3d_hinge_2_and_opening_on_hinge_1` is moved
/// with the pickable group that follows its parent under the pickable group
/// of `sweethome3d_hinge_1`. Returns true if a node was attached.
fn update_sub_transformed_hierarchy(graph: &mut SceneGraph, moved_nodes: &mut FxHashSet<NodeKey>) -> Result<bool> {
    let root = graph.root();
    let candidates = graph.find_nodes_matching(root, |name| {
        name.contains(SUB_TRANSFORMATION_SEPARATOR) && REFERENCE_PREFIXES.iter().any(|prefix| prefix.matches(name))
    });

    for node in candidates {
        if node == root || moved_nodes.contains(&node) {
            continue;
        }
        let Some(name) = graph.name(node).map(str::to_string) else {
            continue;
        };
        let Some(separator) = name.find(SUB_TRANSFORMATION_SEPARATOR).filter(|&index| index > 0) else {
            continue;
        };
        let sub_name_start = separator + SUB_TRANSFORMATION_SEPARATOR.len();

        for reference_prefix in REFERENCE_PREFIXES {
            if !reference_prefix.matches(&name) {
                continue;
            }
            for (reference_index, sub_prefix) in SUB_TRANSFORMATION_PREFIXES.iter().enumerate() {
                let Some(offset) = name[sub_name_start..].find(sub_prefix.as_str()) else {
                    continue;
                };
                moved_nodes.insert(node);

                let digits_start = sub_name_start + offset + sub_prefix.as_str().len();
                let digits: String = name[digits_start..]
                    .chars()
                    .take_while(char::is_ascii_digit)
                    .collect();
                let Some(reference_node) = graph.parent(node) else {
                    continue;
                };
                let Some(parent) = graph.parent(reference_node) else {
                    continue;
                };
                let Some(pickable_group) = next_transform_group_sibling(graph, parent, reference_node) else {
                    continue;
                };
                let group_name = deformable_group_name(&format!(
                    "{}{}",
                    REFERENCE_PREFIXES[reference_index].as_str(),
                    digits
                ));
                if attach_to_pickable_group(graph, &group_name, [reference_node, pickable_group])? {
                    return Ok(true);
                }
            }
        }
    }
    Ok(false)
}

fn next_transform_group_sibling(graph: &SceneGraph, parent: NodeKey, node: NodeKey) -> Option<NodeKey> {
    let siblings = graph.children(parent);
    let index = graph.child_index(parent, node)?;
    siblings[index + 1..]
        .iter()
        .copied()
        .find(|&sibling| graph.node(sibling).is_some_and(|n| n.is_transform_group()))
}

/// Moves `nodes` under the first transform group named `group_name`.
///
/// Nothing moves if that group is missing or lies under one of the nodes.
fn attach_to_pickable_group(graph: &mut SceneGraph, group_name: &str, nodes: [NodeKey; 2]) -> Result<bool> {
    let root = graph.root();
    let target = graph.descendants(root).into_iter().find(|&key| {
        graph
            .node(key)
            .is_some_and(|node| node.is_transform_group() && node.name() == Some(group_name))
    });
    let Some(target) = target else {
        return Ok(false);
    };
    if nodes.iter().any(|&node| graph.is_ancestor(node, target)) {
        return Ok(false);
    }
    for node in nodes {
        graph.detach(node)?;
        graph.append_child(target, node)?;
    }
    Ok(true)
}

fn contains_indexed(graph: &SceneGraph, prefix: SpecialPrefix, index: usize) -> bool {
    graph.contains_node_matching(graph.root(), |name| prefix.matches_indexed(name, index))
}

fn extract(graph: &mut SceneGraph, prefix: SpecialPrefix) -> Result<Option<NodeKey>> {
    extract_nodes(graph, |name| prefix.matches(name))
}

fn extract_indexed(graph: &mut SceneGraph, prefix: SpecialPrefix, index: usize) -> Result<Option<NodeKey>> {
    extract_nodes(graph, |name| prefix.matches_indexed(name, index))
}

/// Moves the nodes accepted by `matches` into a new detached group.
///
/// Returns `None` when no node matches.
fn extract_nodes<F>(graph: &mut SceneGraph, matches: F) -> Result<Option<NodeKey>>
where
    F: Fn(&str) -> bool,
{
    let root = graph.root();
    let found: Vec<NodeKey> = graph
        .find_nodes_matching(root, matches)
        .into_iter()
        .filter(|&node| node != root)
        .collect();
    if found.is_empty() {
        return Ok(None);
    }
    let group = graph.add_group();
    for node in found {
        graph.detach(node)?;
        graph.append_child(group, node)?;
    }
    Ok(Some(group))
}

fn pickable_group(graph: &mut SceneGraph, prefix: SpecialPrefix, children: &[Option<NodeKey>]) -> Result<NodeKey> {
    create_pickable_transform_group(graph, prefix.as_str(), children)
}

/// Creates a writable transform group named after `prefix` holding the given children.
fn create_pickable_transform_group(
    graph: &mut SceneGraph,
    prefix: &str,
    children: &[Option<NodeKey>],
) -> Result<NodeKey> {
    let group = graph.add_transform_group(Matrix4::identity());
    graph.set_name(group, deformable_group_name(prefix))?;
    graph.set_transform_writable(group, true)?;
    for &child in children.iter().flatten() {
        graph.append_child(group, child)?;
    }
    Ok(group)
}
