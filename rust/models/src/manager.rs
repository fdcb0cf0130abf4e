// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cache of loaded models shared by all the views of a home.
//!
//! Each content is parsed once. The cache keeps the post-processed model
//! and every observer receives its own copy, so views may turn joints or
//! change appearances without affecting each other. Geometry buffers and
//! texture images are shared between copies.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use sh3d_geometry::{
    Area, AreaOptions, FloorAreaSource, ModelRotation, PiecePlacement, Point3, Vector3,
};
use sh3d_scene::{BoundingBox, GeometryArray, Matrix4, NodeKey, SceneGraph};

use crate::config::ModelManagerConfig;
use crate::content::{ContentReader, ContentRef};
use crate::dispatch::LoaderDispatch;
use crate::error::{ModelError, Result};
use crate::loader::{LoadListener, ModelLoader, ObjLoader};
use crate::materials::{self, ModelMaterial};
use crate::observer::{LoadPhase, ModelObserver};
use crate::tasks::TaskQueue;

/// Observers waiting for one load
struct PendingLoad {
    id: u64,
    observers: Vec<Box<dyn ModelObserver>>,
}

struct ManagerInner {
    dispatch: LoaderDispatch,
    loaded_models: RefCell<FxHashMap<String, SceneGraph>>,
    loading_models: RefCell<FxHashMap<String, PendingLoad>>,
    next_load_id: Cell<u64>,
}

/// What [`ModelManager::unload_model`] removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnloadReport {
    /// Whether a cached model or a pending load was removed
    pub removed: bool,
    /// Geometry buffers freed with the cached model
    pub released_geometries: usize,
    /// Geometry buffers still used by model copies
    pub retained_geometries: usize,
}

/// Loads, caches and hands out copies of 3D models.
///
/// Cloning the manager gives another handle on the same cache.
///
/// # Example
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use sh3d_models::{CallbackObserver, ContentRef, MemoryContentReader, ModelManager, ModelManagerConfig, TaskQueue};
///
/// let reader = Rc::new(MemoryContentReader::new());
/// reader.insert("box.obj", "v 0 0 0\nv 1 0 0\nv 0 1 1\nf 1 2 3\n");
/// let tasks = TaskQueue::new();
/// let manager = ModelManager::new(ModelManagerConfig::default(), reader, tasks.clone());
///
/// let vertices = Rc::new(RefCell::new(0));
/// let count = vertices.clone();
/// let observer = CallbackObserver::new().on_updated(move |model| {
///     *count.borrow_mut() = model.vertex_count(model.root());
/// });
/// manager.load_model(&ContentRef::new("box.obj"), false, observer);
/// tasks.run_until_idle();
///
/// assert_eq!(*vertices.borrow(), 3);
/// assert!(manager.is_loaded(&ContentRef::new("box.obj")));
/// ```
#[derive(Clone)]
pub struct ModelManager {
    inner: Rc<ManagerInner>,
}

impl ModelManager {
    /// Creates a manager reading OBJ models with `reader`.
    ///
    /// Asynchronous loads are run by `tasks`.
    pub fn new(config: ModelManagerConfig, reader: Rc<dyn ContentReader>, tasks: TaskQueue) -> Self {
        let obj_loader: Rc<dyn ModelLoader> = Rc::new(ObjLoader::new(reader, tasks));
        Self::with_loaders(config, vec![obj_loader])
    }

    /// Creates a manager trying the given loaders in order.
    pub fn with_loaders(config: ModelManagerConfig, loaders: Vec<Rc<dyn ModelLoader>>) -> Self {
        Self {
            inner: Rc::new(ManagerInner {
                dispatch: LoaderDispatch::new(loaders, config),
                loaded_models: RefCell::new(FxHashMap::default()),
                loading_models: RefCell::new(FxHashMap::default()),
                next_load_id: Cell::new(0),
            }),
        }
    }

    pub fn config(&self) -> &ModelManagerConfig {
        self.inner.dispatch.config()
    }

    /// Requests the model of `content` for `observer`.
    ///
    /// A cached model is given at once. Otherwise the observer waits for the
    /// load of that content in progress, or for a new load. Observers of one
    /// content are notified in request order. With `synchronous` set, the
    /// observer is notified before this method returns.
    ///
    /// A synchronous request for content already loading asynchronously
    /// can't wait for that load: it reads and parses the content again, and
    /// the outcome of the asynchronous load is dropped when it arrives.
    pub fn load_model(&self, content: &ContentRef, synchronous: bool, observer: impl ModelObserver + 'static) {
        let url = content.url();
        let cached = self.inner.loaded_models.borrow().get(url).cloned();
        if let Some(model) = cached {
            tracing::debug!(url = %url, "Model cache hit");
            let mut observer = observer;
            observer.model_updated(model);
            return;
        }

        let id = {
            let mut loading_models = self.inner.loading_models.borrow_mut();
            match loading_models.get_mut(url) {
                Some(pending) => {
                    pending.observers.push(Box::new(observer));
                    if !synchronous {
                        tracing::debug!(url = %url, waiting = pending.observers.len(), "Waiting for model in progress");
                        return;
                    }
                    pending.id
                }
                None => {
                    let id = self.inner.next_load_id.get();
                    self.inner.next_load_id.set(id + 1);
                    loading_models.insert(
                        url.to_string(),
                        PendingLoad {
                            id,
                            observers: vec![Box::new(observer)],
                        },
                    );
                    id
                }
            }
        };

        tracing::debug!(url = %url, id, synchronous, "Loading model");
        let listener = ManagerListener {
            manager: Rc::downgrade(&self.inner),
            url: url.to_string(),
            id,
        };
        self.inner.dispatch.load(url, synchronous, Box::new(listener));
    }

    /// Removes `content` from the cache and forgets the observers waiting for it.
    ///
    /// With `dispose_geometries`, the report counts the geometry buffers
    /// freed with the cached model and those still held by model copies.
    pub fn unload_model(&self, content: &ContentRef, dispose_geometries: bool) -> UnloadReport {
        let url = content.url();
        let model = self.inner.loaded_models.borrow_mut().remove(url);
        let pending = self.inner.loading_models.borrow_mut().remove(url);

        let mut report = UnloadReport {
            removed: model.is_some() || pending.is_some(),
            ..UnloadReport::default()
        };
        if let (Some(model), true) = (model.as_ref(), dispose_geometries) {
            let mut uses: FxHashMap<*const GeometryArray, (usize, &Arc<GeometryArray>)> = FxHashMap::default();
            for geometry in model.geometries() {
                uses.entry(Arc::as_ptr(geometry)).or_insert((0, geometry)).0 += 1;
            }
            for (count, geometry) in uses.into_values() {
                if Arc::strong_count(geometry) > count {
                    report.retained_geometries += 1;
                } else {
                    report.released_geometries += 1;
                }
            }
        }
        tracing::debug!(
            url = %url,
            removed = report.removed,
            released = report.released_geometries,
            retained = report.retained_geometries,
            "Unloaded model"
        );
        report
    }

    /// Empties the cache and the caches of the loaders.
    ///
    /// Observers waiting for a load in progress are never notified.
    pub fn clear(&self) {
        self.inner.loaded_models.borrow_mut().clear();
        self.inner.loading_models.borrow_mut().clear();
        for loader in self.inner.dispatch.loaders() {
            loader.clear();
        }
    }

    pub fn is_loaded(&self, content: &ContentRef) -> bool {
        self.inner.loaded_models.borrow().contains_key(content.url())
    }

    pub fn is_loading(&self, content: &ContentRef) -> bool {
        self.inner.loading_models.borrow().contains_key(content.url())
    }

    // --- Model queries ---

    /// Bounds of the shapes under `node`, transformed by `transform` if given.
    pub fn bounds(&self, graph: &SceneGraph, node: NodeKey, transform: Option<&Matrix4<f64>>) -> BoundingBox {
        match transform {
            Some(transform) => sh3d_geometry::bounds(graph, node, transform),
            None => sh3d_geometry::model_bounds(graph, node),
        }
    }

    /// Size of the shapes under `node`, transformed by `transform` if given.
    pub fn size(&self, graph: &SceneGraph, node: NodeKey, transform: Option<&Matrix4<f64>>) -> Vector3<f64> {
        sh3d_geometry::size(graph, node, transform.unwrap_or(&Matrix4::identity()))
    }

    pub fn center(&self, graph: &SceneGraph, node: NodeKey) -> Point3<f64> {
        sh3d_geometry::center(graph, node)
    }

    /// See [`sh3d_geometry::normalized_transform`].
    pub fn normalized_transform(
        &self,
        graph: &SceneGraph,
        node: NodeKey,
        rotation: Option<&ModelRotation>,
        width: f64,
        centered_at_origin: bool,
    ) -> Matrix4<f64> {
        sh3d_geometry::normalized_transform(graph, node, rotation, width, centered_at_origin)
    }

    pub fn piece_normalized_model_transformation(
        &self,
        piece: &PiecePlacement,
        normalized_model: Option<(&SceneGraph, NodeKey)>,
    ) -> Matrix4<f64> {
        sh3d_geometry::piece_normalized_model_transformation(piece, normalized_model)
    }

    pub fn minimum_size(&self) -> f64 {
        sh3d_geometry::minimum_size()
    }

    /// See [`materials::materials`].
    pub fn materials(
        &self,
        graph: &SceneGraph,
        node: NodeKey,
        ignore_edge_color_material: bool,
        creator: Option<&str>,
    ) -> Vec<ModelMaterial> {
        materials::materials(graph, node, ignore_edge_color_material, creator)
    }

    pub fn area_on_floor(&self, source: FloorAreaSource<'_>) -> Result<Area> {
        Ok(sh3d_geometry::area_on_floor(source, &self.area_options())?)
    }

    pub fn front_area(&self, cut_out_shape: Option<&str>, graph: &SceneGraph, node: NodeKey) -> Result<Area> {
        Ok(sh3d_geometry::front_area(cut_out_shape, graph, node, &self.area_options())?)
    }

    fn area_options(&self) -> AreaOptions {
        self.config().area_options()
    }
}

impl fmt::Debug for ModelManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelManager")
            .field("dispatch", &self.inner.dispatch)
            .field("loaded", &self.inner.loaded_models.borrow().len())
            .field("loading", &self.inner.loading_models.borrow().len())
            .finish()
    }
}

/// Delivers the outcome of one load to the observers waiting for it.
///
/// Outcomes of loads that were unloaded or cleared meanwhile are dropped.
struct ManagerListener {
    manager: Weak<ManagerInner>,
    url: String,
    id: u64,
}

impl ManagerListener {
    fn take_observers(&self, inner: &ManagerInner) -> Option<Vec<Box<dyn ModelObserver>>> {
        let mut loading_models = inner.loading_models.borrow_mut();
        if loading_models.get(&self.url)?.id != self.id {
            return None;
        }
        loading_models.remove(&self.url).map(|pending| pending.observers)
    }
}

impl LoadListener for ManagerListener {
    fn model_loaded(self: Box<Self>, model: SceneGraph) {
        let Some(inner) = self.manager.upgrade() else {
            return;
        };
        let Some(observers) = self.take_observers(&inner) else {
            tracing::debug!(url = %self.url, id = self.id, "Dropping model of a stale load");
            return;
        };
        inner
            .loaded_models
            .borrow_mut()
            .insert(self.url.clone(), model.clone());
        tracing::debug!(url = %self.url, observers = observers.len(), "Model loaded");
        for mut observer in observers {
            observer.model_updated(model.clone());
        }
    }

    fn model_error(self: Box<Self>, error: ModelError) {
        let Some(inner) = self.manager.upgrade() else {
            return;
        };
        let Some(observers) = self.take_observers(&inner) else {
            return;
        };
        tracing::warn!(url = %self.url, error = %error, "Failed to load model");
        for mut observer in observers {
            observer.model_error(&error);
        }
    }

    fn progression(&mut self, phase: LoadPhase, info: &str, percentage: f32) {
        let Some(inner) = self.manager.upgrade() else {
            return;
        };
        let mut observers = {
            let mut loading_models = inner.loading_models.borrow_mut();
            match loading_models.get_mut(&self.url) {
                Some(pending) if pending.id == self.id => std::mem::take(&mut pending.observers),
                _ => return,
            }
        };
        for observer in observers.iter_mut() {
            observer.progression(phase, info, percentage);
        }
        // Put the observers back ahead of those added meanwhile
        let mut loading_models = inner.loading_models.borrow_mut();
        if let Some(pending) = loading_models.get_mut(&self.url).filter(|pending| pending.id == self.id) {
            observers.append(&mut pending.observers);
            pending.observers = observers;
        }
    }
}
