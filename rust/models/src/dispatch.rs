// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Trial of format loaders in turn until one recognises the content.

use std::fmt;
use std::rc::Rc;

use sh3d_geometry::model_bounds;
use sh3d_scene::SceneGraph;

use crate::config::ModelManagerConfig;
use crate::error::ModelError;
use crate::loader::{LoadCallbacks, LoadListener, ModelLoader};
use crate::observer::LoadPhase;
use crate::postprocess::post_process;

/// Ordered list of format loaders shared by every load.
///
/// A loader that reports a model without geometry or a [`ModelError::Format`]
/// error hands the content over to the next loader. The first model with
/// some geometry is post-processed, tagged with its URL and reported.
#[derive(Clone)]
pub struct LoaderDispatch {
    loaders: Rc<[Rc<dyn ModelLoader>]>,
    config: Rc<ModelManagerConfig>,
}

impl LoaderDispatch {
    pub fn new(loaders: Vec<Rc<dyn ModelLoader>>, config: ModelManagerConfig) -> Self {
        Self {
            loaders: loaders.into(),
            config: Rc::new(config),
        }
    }

    pub fn loaders(&self) -> &[Rc<dyn ModelLoader>] {
        &self.loaders
    }

    pub fn config(&self) -> &ModelManagerConfig {
        &self.config
    }

    /// Loads `url` with the first loader able to read it.
    pub fn load(&self, url: &str, synchronous: bool, listener: Box<dyn LoadListener>) {
        let attempt = Attempt {
            dispatch: self.clone(),
            url: Rc::from(url),
            synchronous,
        };
        attempt.try_loader(0, listener);
    }
}

impl fmt::Debug for LoaderDispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderDispatch")
            .field("loaders", &self.loaders.iter().map(|l| l.name()).collect::<Vec<_>>())
            .field("config", &self.config)
            .finish()
    }
}

struct Attempt {
    dispatch: LoaderDispatch,
    url: Rc<str>,
    synchronous: bool,
}

impl Attempt {
    fn try_loader(self, index: usize, listener: Box<dyn LoadListener>) {
        let Some(loader) = self.dispatch.loaders.get(index).cloned() else {
            tracing::debug!(url = %self.url, tried = index, "No loader recognised model");
            listener.model_error(ModelError::UnsupportedFormat);
            return;
        };
        tracing::debug!(url = %self.url, loader = loader.name(), "Loading model");
        let url = Rc::clone(&self.url);
        let synchronous = self.synchronous;
        let callbacks = LoadCallbacks::new(Box::new(DispatchListener {
            attempt: self,
            index,
            listener,
        }));
        loader.load(&url, synchronous, callbacks);
    }
}

struct DispatchListener {
    attempt: Attempt,
    index: usize,
    listener: Box<dyn LoadListener>,
}

impl LoadListener for DispatchListener {
    fn model_loaded(self: Box<Self>, mut model: SceneGraph) {
        let Self {
            attempt,
            index,
            listener,
        } = *self;
        if model_bounds(&model, model.root()).is_empty() {
            tracing::debug!(url = %attempt.url, index, "Loader produced an empty model, trying next loader");
            attempt.try_loader(index + 1, listener);
            return;
        }

        match post_process(&mut model, &attempt.dispatch.config) {
            Ok(()) => {
                model.set_content_ref(attempt.url.as_ref());
                listener.model_loaded(model);
            }
            Err(e) => listener.model_error(e),
        }
    }

    fn model_error(self: Box<Self>, error: ModelError) {
        let Self {
            attempt,
            index,
            listener,
        } = *self;
        if error.is_format_error() {
            tracing::debug!(url = %attempt.url, index, error = %error, "Trying next loader");
            attempt.try_loader(index + 1, listener);
        } else {
            listener.model_error(error);
        }
    }

    fn progression(&mut self, phase: LoadPhase, info: &str, percentage: f32) {
        self.listener.progression(phase, info, percentage);
    }
}
