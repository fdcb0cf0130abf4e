// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Materials listed to users when they modify the look of a model.

use rustc_hash::FxHashSet;
use sh3d_scene::names::EDGE_COLOR_MATERIAL_PREFIX;
use sh3d_scene::{Appearance, NodeKey, NodeKind, SceneGraph};

/// Texture of a material, named after its image file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialTexture {
    /// Image file name without directories nor extension
    pub name: String,
    pub image_url: String,
    pub creator: Option<String>,
}

/// Material of a model shape, as a home piece stores it.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelMaterial {
    pub name: Option<String>,
    /// Opaque ARGB color computed from the diffuse color
    pub color: Option<u32>,
    /// Shininess in the 0..1 range, only given with a color
    pub shininess: Option<f32>,
    pub texture: Option<MaterialTexture>,
}

impl ModelMaterial {
    fn from_appearance(appearance: &Appearance, creator: Option<&str>) -> Self {
        let color = appearance.diffuse_color.map(argb);
        let shininess = appearance
            .diffuse_color
            .and(appearance.shininess)
            .map(|shininess| shininess / 128.0);
        let texture = appearance.texture_image.as_ref().map(|image| MaterialTexture {
            name: texture_name(&image.url).to_string(),
            image_url: image.url.clone(),
            creator: creator.map(str::to_string),
        });
        Self {
            name: appearance.name.clone(),
            color,
            shininess,
            texture,
        }
    }
}

/// Returns the materials of the shapes under `node`, links followed.
///
/// Materials are unique by name, the first appearance met wins. Unnamed
/// materials come first, then named ones in name order.
/// With `ignore_edge_color_material`, materials named `edge_color*` are skipped.
pub fn materials(
    graph: &SceneGraph,
    node: NodeKey,
    ignore_edge_color_material: bool,
    creator: Option<&str>,
) -> Vec<ModelMaterial> {
    let mut appearances = Vec::new();
    search_appearances(graph, node, ignore_edge_color_material, &mut appearances);

    let mut names = FxHashSet::default();
    let mut materials: Vec<ModelMaterial> = appearances
        .into_iter()
        .filter(|appearance| names.insert(appearance.name.as_deref()))
        .map(|appearance| ModelMaterial::from_appearance(appearance, creator))
        .collect();
    materials.sort_by(|first, second| first.name.cmp(&second.name));
    materials
}

fn search_appearances<'a>(
    graph: &'a SceneGraph,
    node: NodeKey,
    ignore_edge_color_material: bool,
    appearances: &mut Vec<&'a Appearance>,
) {
    match graph.node(node).map(|n| n.kind()) {
        Some(NodeKind::Group { children })
        | Some(NodeKind::TransformGroup { children, .. })
        | Some(NodeKind::SharedGroup { children }) => {
            for &child in children {
                search_appearances(graph, child, ignore_edge_color_material, appearances);
            }
        }
        Some(NodeKind::Link { shared_group }) => {
            search_appearances(graph, *shared_group, ignore_edge_color_material, appearances);
        }
        Some(NodeKind::Shape(shape)) => {
            let Some(appearance) = shape.appearance.as_ref() else {
                return;
            };
            let edge_color = appearance
                .name
                .as_deref()
                .is_some_and(|name| name.starts_with(EDGE_COLOR_MATERIAL_PREFIX));
            if (!ignore_edge_color_material || !edge_color) && !appearances.contains(&appearance) {
                appearances.push(appearance);
            }
        }
        None => {}
    }
}

fn argb(color: [f32; 3]) -> u32 {
    let channel = |value: f32| (value * 255.0).round().clamp(0.0, 255.0) as u32;
    0xFF00_0000 | (channel(color[0]) << 16) | (channel(color[1]) << 8) | channel(color[2])
}

/// File name of `url` without its extension
fn texture_name(url: &str) -> &str {
    let file_name = url.rsplit('/').next().unwrap_or(url);
    match file_name.rfind('.') {
        Some(dot) => &file_name[..dot],
        None => file_name,
    }
}
