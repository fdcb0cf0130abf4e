// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cloned graphs are independent copies sharing geometry buffers.

use std::sync::Arc;

use sh3d_scene::{Appearance, GeometryArray, Matrix4, NodeKind, Point3, SceneGraph, Shape, TextureImage};

fn instanced_model() -> (SceneGraph, sh3d_scene::NodeKey, sh3d_scene::NodeKey) {
    let mut graph = SceneGraph::new();
    let root = graph.root();
    let texture = Arc::new(TextureImage::new("wood.png"));
    let geometry = GeometryArray::triangles(
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ],
        vec![0, 2, 1],
    )
    .unwrap();
    let shape = graph.add_shape(
        Shape::new(geometry).with_appearance(Appearance::named("wood").with_texture_image(texture)),
    );
    let shared = graph.add_shared_group();
    graph.append_child(shared, shape).unwrap();

    let joint = graph.add_transform_group(Matrix4::identity());
    graph.append_child(root, joint).unwrap();
    for _ in 0..4 {
        let link = graph.add_link(shared).unwrap();
        graph.append_child(joint, link).unwrap();
    }
    graph.set_content_ref("file:///models/table.obj");
    (graph, joint, shape)
}

#[test]
fn test_clone_transform_isolation() {
    let (original, joint, _) = instanced_model();
    let mut clone = original.clone();
    clone.set_transform(joint, Matrix4::new_scaling(3.0)).unwrap();

    assert_eq!(original.transform(joint), Some(&Matrix4::identity()));
    assert_eq!(clone.content_ref(), Some("file:///models/table.obj"));
}

#[test]
fn test_clone_copies_shared_group_once() {
    let (original, _, shape) = instanced_model();
    let clone = original.clone();

    let shared_groups = |graph: &SceneGraph| {
        graph
            .descendants(graph.root())
            .into_iter()
            .filter_map(|key| graph.shared_group(key))
            .collect::<std::collections::HashSet<_>>()
    };
    assert_eq!(shared_groups(&clone).len(), 1);
    assert_eq!(clone.node_count(), original.node_count());

    let original_shape = original.shape(shape).unwrap();
    let cloned_shape = clone.shape(shape).unwrap();
    assert!(Arc::ptr_eq(&original_shape.geometries[0], &cloned_shape.geometries[0]));
    let texture = |s: &Shape| s.appearance.as_ref().and_then(|a| a.texture_image.clone()).unwrap();
    assert!(Arc::ptr_eq(&texture(original_shape), &texture(cloned_shape)));
    assert!(matches!(clone.node(shape).unwrap().kind(), NodeKind::Shape(_)));
}

#[test]
fn test_clone_appearance_is_independent() {
    let (original, _, shape) = instanced_model();
    let mut clone = original.clone();
    clone.shape_mut(shape).unwrap().appearance.as_mut().unwrap().transparency = Some(0.5);

    let appearance = original.shape(shape).unwrap().appearance.as_ref().unwrap();
    assert_eq!(appearance.transparency, None);
}
