// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shape appearance attributes.

use std::sync::Arc;

/// Image referenced by an appearance.
///
/// Images are shared between clones of a model through an `Arc`; only the
/// reference is copied when an appearance is cloned.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureImage {
    /// URL the image was read from
    pub url: String,
    /// Whether the image carries an alpha channel
    pub transparent: bool,
}

impl TextureImage {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            transparent: false,
        }
    }
}

/// Material and rendering attributes of a shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Appearance {
    /// Material name, as declared by the model file
    pub name: Option<String>,
    pub ambient_color: Option<[f32; 3]>,
    pub diffuse_color: Option<[f32; 3]>,
    pub specular_color: Option<[f32; 3]>,
    /// Phong exponent in the 0..128 range
    pub shininess: Option<f32>,
    /// 0 is opaque, 1 is fully transparent, `None` when the file doesn't say
    pub transparency: Option<f32>,
    pub texture_image: Option<Arc<TextureImage>>,
    pub visible: bool,
    /// Back faces are culled unless this is `false`
    pub cull_back_faces: bool,
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            name: None,
            ambient_color: None,
            diffuse_color: None,
            specular_color: None,
            shininess: None,
            transparency: None,
            texture_image: None,
            visible: true,
            cull_back_faces: true,
        }
    }
}

impl Appearance {
    /// Create a visible appearance with the given material name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_diffuse_color(mut self, color: [f32; 3]) -> Self {
        self.diffuse_color = Some(color);
        self
    }

    pub fn with_transparency(mut self, transparency: f32) -> Self {
        self.transparency = Some(transparency);
        self
    }

    pub fn with_texture_image(mut self, image: Arc<TextureImage>) -> Self {
        self.texture_image = Some(image);
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Returns true if nothing of a shape with this appearance can be seen
    #[inline]
    pub fn is_fully_transparent(&self) -> bool {
        self.transparency.is_some_and(|t| t >= 1.0)
    }
}
