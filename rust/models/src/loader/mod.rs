// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Format loaders and their completion handle.

mod obj;

pub use obj::{
    build_scene, parse_mtl, parse_obj, ObjFace, ObjGroup, ObjLoader, ObjMaterial, ObjModel, ObjParseError, ObjVertex,
};

use std::fmt;

use sh3d_scene::SceneGraph;

use crate::error::ModelError;
use crate::observer::LoadPhase;

/// Receiver of the outcome of one loader invocation.
pub trait LoadListener {
    fn model_loaded(self: Box<Self>, model: SceneGraph);

    fn model_error(self: Box<Self>, error: ModelError);

    fn progression(&mut self, _phase: LoadPhase, _info: &str, _percentage: f32) {}
}

/// Completion handle given to a [`ModelLoader`].
///
/// Reporting consumes the handle, so a loader reports at most once. A
/// handle dropped without reporting reports [`ModelError::Abandoned`].
pub struct LoadCallbacks {
    listener: Option<Box<dyn LoadListener>>,
}

impl LoadCallbacks {
    pub fn new(listener: Box<dyn LoadListener>) -> Self {
        Self {
            listener: Some(listener),
        }
    }

    pub fn progression(&mut self, phase: LoadPhase, info: &str, percentage: f32) {
        if let Some(listener) = self.listener.as_mut() {
            listener.progression(phase, info, percentage);
        }
    }

    pub fn model_loaded(mut self, model: SceneGraph) {
        if let Some(listener) = self.listener.take() {
            listener.model_loaded(model);
        }
    }

    pub fn model_error(mut self, error: ModelError) {
        if let Some(listener) = self.listener.take() {
            listener.model_error(error);
        }
    }
}

impl Drop for LoadCallbacks {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            tracing::warn!("Model loader dropped its callbacks without reporting");
            listener.model_error(ModelError::Abandoned);
        }
    }
}

impl fmt::Debug for LoadCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadCallbacks")
            .field("reported", &self.listener.is_none())
            .finish()
    }
}

/// A format loader.
///
/// Loaders are reentrant: one instance serves concurrent loads of different
/// contents. With `synchronous` set, the callbacks must be consumed before
/// `load` returns.
pub trait ModelLoader {
    /// Short name used in logs, like `obj`.
    fn name(&self) -> &str;

    fn load(&self, url: &str, synchronous: bool, callbacks: LoadCallbacks);

    /// Releases the caches of this loader.
    fn clear(&self) {}
}
