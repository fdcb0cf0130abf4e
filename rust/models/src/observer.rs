// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Observers notified when a requested model is available.

use std::fmt;

use sh3d_scene::SceneGraph;

use crate::error::ModelError;

/// Step of a model load reported to progress observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadPhase {
    Reading,
    Parsing,
    Building,
    Binding,
}

impl LoadPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            LoadPhase::Reading => "reading",
            LoadPhase::Parsing => "parsing",
            LoadPhase::Building => "building",
            LoadPhase::Binding => "binding",
        }
    }
}

impl fmt::Display for LoadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives the result of a [`ModelManager::load_model`](crate::ModelManager::load_model) request.
///
/// Exactly one of `model_updated` and `model_error` is called once per
/// request, unless the model is unloaded while loading. Every method is
/// optional.
pub trait ModelObserver {
    /// Called with a model copy the observer is free to modify.
    fn model_updated(&mut self, _model: SceneGraph) {}

    fn model_error(&mut self, _error: &ModelError) {}

    fn progression(&mut self, _phase: LoadPhase, _info: &str, _percentage: f32) {}
}

/// Observer built from closures.
pub struct CallbackObserver {
    updated: Option<Box<dyn FnMut(SceneGraph)>>,
    error: Option<Box<dyn FnMut(&ModelError)>>,
    progression: Option<Box<dyn FnMut(LoadPhase, &str, f32)>>,
}

impl CallbackObserver {
    pub fn new() -> Self {
        Self {
            updated: None,
            error: None,
            progression: None,
        }
    }

    pub fn on_updated(mut self, callback: impl FnMut(SceneGraph) + 'static) -> Self {
        self.updated = Some(Box::new(callback));
        self
    }

    pub fn on_error(mut self, callback: impl FnMut(&ModelError) + 'static) -> Self {
        self.error = Some(Box::new(callback));
        self
    }

    pub fn on_progression(mut self, callback: impl FnMut(LoadPhase, &str, f32) + 'static) -> Self {
        self.progression = Some(Box::new(callback));
        self
    }
}

impl Default for CallbackObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelObserver for CallbackObserver {
    fn model_updated(&mut self, model: SceneGraph) {
        if let Some(callback) = self.updated.as_mut() {
            callback(model);
        }
    }

    fn model_error(&mut self, error: &ModelError) {
        if let Some(callback) = self.error.as_mut() {
            callback(error);
        }
    }

    fn progression(&mut self, phase: LoadPhase, info: &str, percentage: f32) {
        if let Some(callback) = self.progression.as_mut() {
            callback(phase, info, percentage);
        }
    }
}

impl fmt::Debug for CallbackObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackObserver")
            .field("updated", &self.updated.is_some())
            .field("error", &self.error.is_some())
            .field("progression", &self.progression.is_some())
            .finish()
    }
}
