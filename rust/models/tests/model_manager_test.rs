// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cache behavior of the model manager: load deduplication, copies handed
//! to observers, loader fallback and unloading.

use std::cell::RefCell;
use std::rc::Rc;

use sh3d_models::{
    box_model, ContentRef, LoadCallbacks, LoadPhase, MemoryContentReader, ModelError, ModelLoader, ModelManager,
    ModelManagerConfig, ModelObserver, ObjLoader, TaskQueue,
};
use sh3d_scene::{Matrix4, SceneGraph, Vector3};

const HINGED_DOOR: &str = "\
v 0 0 0
v 1 0 0
v 0 1 0
o sweethome3d_hinge_1
f 1 2 3
o sweethome3d_opening_on_hinge_1
f 1 2 3
";

#[derive(Default)]
struct Events {
    models: Vec<SceneGraph>,
    errors: Vec<ModelError>,
    progressions: Vec<LoadPhase>,
}

#[derive(Clone, Default)]
struct Recorder(Rc<RefCell<Events>>);

impl Recorder {
    fn model_count(&self) -> usize {
        self.0.borrow().models.len()
    }

    fn error_count(&self) -> usize {
        self.0.borrow().errors.len()
    }
}

impl ModelObserver for Recorder {
    fn model_updated(&mut self, model: SceneGraph) {
        self.0.borrow_mut().models.push(model);
    }

    fn model_error(&mut self, error: &ModelError) {
        self.0.borrow_mut().errors.push(error.clone());
    }

    fn progression(&mut self, phase: LoadPhase, _info: &str, _percentage: f32) {
        self.0.borrow_mut().progressions.push(phase);
    }
}

fn setup() -> (ModelManager, Rc<MemoryContentReader>, TaskQueue) {
    let reader = Rc::new(MemoryContentReader::new());
    reader.insert("door.obj", HINGED_DOOR);
    let tasks = TaskQueue::new();
    let manager = ModelManager::new(ModelManagerConfig::from_env(), reader.clone(), tasks.clone());
    (manager, reader, tasks)
}

fn door() -> ContentRef {
    ContentRef::new("door.obj")
}

fn door_transform_group(model: &SceneGraph) -> sh3d_scene::NodeKey {
    model
        .find_nodes_matching(model.root(), |name| name == "sweethome3d_hinge_1_transformation")
        .into_iter()
        .next()
        .unwrap()
}

#[test]
fn test_concurrent_requests_share_one_load() {
    let (manager, reader, tasks) = setup();
    let first = Recorder::default();
    let second = Recorder::default();

    manager.load_model(&door(), false, first.clone());
    manager.load_model(&door(), false, second.clone());
    assert!(manager.is_loading(&door()));
    assert_eq!(first.model_count(), 0);

    tasks.run_until_idle();

    assert_eq!(reader.read_count(), 1);
    assert_eq!(first.model_count(), 1);
    assert_eq!(second.model_count(), 1);
    assert!(manager.is_loaded(&door()));
    assert!(!manager.is_loading(&door()));
    // Both observers followed the load progress
    assert_eq!(first.0.borrow().progressions.first(), Some(&LoadPhase::Reading));
    assert_eq!(first.0.borrow().progressions, second.0.borrow().progressions);
}

#[test]
fn test_cache_hit_notifies_at_once() {
    let (manager, reader, tasks) = setup();
    manager.load_model(&door(), false, Recorder::default());
    tasks.run_until_idle();

    let later = Recorder::default();
    manager.load_model(&door(), false, later.clone());
    assert_eq!(later.model_count(), 1);
    assert_eq!(reader.read_count(), 1);
    assert!(tasks.is_idle());
    assert_eq!(later.0.borrow().models[0].content_ref(), Some("door.obj"));
}

#[test]
fn test_copies_are_isolated() {
    let (manager, _, _) = setup();
    let first = Recorder::default();
    let second = Recorder::default();
    manager.load_model(&door(), true, first.clone());
    manager.load_model(&door(), true, second.clone());

    let mut turned = first.0.borrow_mut().models.pop().unwrap();
    let joint = door_transform_group(&turned);
    turned
        .set_transform(joint, Matrix4::new_translation(&Vector3::new(5.0, 0.0, 0.0)))
        .unwrap();
    let turned_bounds = manager.bounds(&turned, turned.root(), None);
    assert_eq!(turned_bounds.upper().x, 6.0);

    let events = second.0.borrow();
    let untouched = &events.models[0];
    assert_eq!(manager.bounds(untouched, untouched.root(), None).upper().x, 1.0);
}

#[test]
fn test_failures_are_not_cached() {
    let (manager, reader, _) = setup();
    let missing = ContentRef::new("chair.obj");
    let observer = Recorder::default();
    manager.load_model(&missing, true, observer.clone());
    assert_eq!(observer.error_count(), 1);
    assert!(matches!(observer.0.borrow().errors[0], ModelError::Content { .. }));
    assert!(!manager.is_loaded(&missing));
    assert!(!manager.is_loading(&missing));

    reader.insert("chair.obj", HINGED_DOOR);
    manager.load_model(&missing, true, observer.clone());
    assert_eq!(observer.model_count(), 1);
}

#[test]
fn test_synchronous_request_joins_load_in_progress() {
    let (manager, reader, tasks) = setup();
    let waiting = Recorder::default();
    let blocking = Recorder::default();
    manager.load_model(&door(), false, waiting.clone());
    manager.load_model(&door(), true, blocking.clone());

    assert_eq!(blocking.model_count(), 1);
    assert_eq!(waiting.model_count(), 1);
    assert_eq!(reader.read_count(), 1);

    // The first load still parses the content, then its outcome is dropped
    tasks.run_until_idle();
    assert_eq!(reader.read_count(), 2);
    assert_eq!(waiting.model_count(), 1);
    assert!(manager.is_loaded(&door()));
}

#[test]
fn test_unload() {
    let (manager, reader, tasks) = setup();
    let holder = Recorder::default();
    manager.load_model(&door(), true, holder.clone());

    let report = manager.unload_model(&door(), true);
    assert!(report.removed);
    assert_eq!(report.released_geometries, 0);
    assert_eq!(report.retained_geometries, 2);
    assert!(!manager.is_loaded(&door()));

    manager.load_model(&door(), true, Recorder::default());
    let report = manager.unload_model(&door(), true);
    assert_eq!((report.released_geometries, report.retained_geometries), (2, 0));
    assert_eq!(reader.read_count(), 2);

    // Unloading while loading drops the waiting observers
    let dropped = Recorder::default();
    manager.load_model(&door(), false, dropped.clone());
    assert!(manager.unload_model(&door(), false).removed);
    tasks.run_until_idle();
    assert_eq!(dropped.model_count() + dropped.error_count(), 0);
    assert!(!manager.is_loaded(&door()));
    assert!(!manager.unload_model(&door(), false).removed);
}

/// Loader standing for another format, answering with a box
struct BoxLoader {
    calls: RefCell<usize>,
}

impl ModelLoader for BoxLoader {
    fn name(&self) -> &str {
        "box"
    }

    fn load(&self, _url: &str, _synchronous: bool, callbacks: LoadCallbacks) {
        *self.calls.borrow_mut() += 1;
        match box_model([0.5, 0.5, 0.5]) {
            Ok(model) => callbacks.model_loaded(model),
            Err(e) => callbacks.model_error(e),
        }
    }
}

#[test]
fn test_format_fallback() {
    let reader = Rc::new(MemoryContentReader::new());
    reader.insert("lamp.dae", "<?xml version=\"1.0\"?>\n<COLLADA version=\"1.4.1\"/>\n");
    let tasks = TaskQueue::new();
    let box_loader = Rc::new(BoxLoader { calls: RefCell::new(0) });
    let loaders: Vec<Rc<dyn ModelLoader>> = vec![
        Rc::new(ObjLoader::new(reader.clone(), tasks.clone())) as Rc<dyn ModelLoader>,
        box_loader.clone(),
    ];
    let manager = ModelManager::with_loaders(ModelManagerConfig::from_env(), loaders);

    let observer = Recorder::default();
    manager.load_model(&ContentRef::new("lamp.dae"), false, observer.clone());
    tasks.run_until_idle();

    assert_eq!(observer.model_count(), 1);
    assert_eq!(observer.error_count(), 0);
    assert_eq!(*box_loader.calls.borrow(), 1);
    let events = observer.0.borrow();
    let model = &events.models[0];
    let expected = box_model([0.0; 3]).unwrap();
    assert_eq!(model.vertex_count(model.root()), expected.vertex_count(expected.root()));
}

#[test]
fn test_unsupported_format() {
    let (manager, reader, _) = setup();
    reader.insert("notes.txt", "# nothing to draw\n");
    let observer = Recorder::default();
    manager.load_model(&ContentRef::new("notes.txt"), true, observer.clone());
    assert_eq!(observer.0.borrow().errors, vec![ModelError::UnsupportedFormat]);
}

#[test]
fn test_clear() {
    let (manager, _, _) = setup();
    manager.load_model(&door(), true, Recorder::default());
    manager.clear();
    assert!(!manager.is_loaded(&door()));
}
