// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model slot of a 3D object kept in sync with its piece.
//!
//! A piece may change model several times before the first one is loaded.
//! The slot remembers its latest request and ignores the outcome of older
//! ones, so that a slow load never replaces a more recent model.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use sh3d_scene::primitives::box_shape;
use sh3d_scene::{Appearance, SceneGraph};

use crate::content::ContentRef;
use crate::error::{ModelError, Result};
use crate::manager::ModelManager;
use crate::observer::{LoadPhase, ModelObserver};

const LOADING_BOX_COLOR: [f32; 3] = [1.0, 1.0, 1.0];
const ERROR_BOX_COLOR: [f32; 3] = [1.0, 0.0, 0.0];

/// State of a [`ModelSlot`].
#[derive(Debug, Clone, Default)]
pub enum SlotStatus {
    #[default]
    Empty,
    Loading {
        percentage: f32,
    },
    Loaded(SceneGraph),
    Failed(ModelError),
}

#[derive(Debug, Default)]
struct SlotState {
    generation: u64,
    content: Option<ContentRef>,
    status: SlotStatus,
}

/// Holder of the model most recently requested for one 3D object.
#[derive(Clone, Default)]
pub struct ModelSlot {
    state: Rc<RefCell<SlotState>>,
}

impl ModelSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the model of `content`, superseding previous requests.
    pub fn request(&self, manager: &ModelManager, content: &ContentRef, synchronous: bool) {
        let generation = {
            let mut state = self.state.borrow_mut();
            state.generation += 1;
            state.content = Some(content.clone());
            state.status = SlotStatus::Loading { percentage: 0.0 };
            state.generation
        };
        let observer = SlotObserver {
            state: Rc::downgrade(&self.state),
            generation,
        };
        manager.load_model(content, synchronous, observer);
    }

    /// Content of the latest request.
    pub fn content(&self) -> Option<ContentRef> {
        self.state.borrow().content.clone()
    }

    pub fn status(&self) -> Ref<'_, SlotStatus> {
        Ref::map(self.state.borrow(), |state| &state.status)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state.borrow().status, SlotStatus::Loading { .. })
    }

    /// The loaded model, if the latest request succeeded.
    pub fn model(&self) -> Option<Ref<'_, SceneGraph>> {
        Ref::filter_map(self.state.borrow(), |state| match &state.status {
            SlotStatus::Loaded(model) => Some(model),
            _ => None,
        })
        .ok()
    }

    /// Moves the loaded model out of the slot, leaving it empty.
    pub fn take_model(&self) -> Option<SceneGraph> {
        let mut state = self.state.borrow_mut();
        match std::mem::take(&mut state.status) {
            SlotStatus::Loaded(model) => Some(model),
            status => {
                state.status = status;
                None
            }
        }
    }

    pub fn error(&self) -> Option<ModelError> {
        match &self.state.borrow().status {
            SlotStatus::Failed(error) => Some(error.clone()),
            _ => None,
        }
    }

    /// Box displayed instead of the model: white while loading, red on failure.
    pub fn placeholder_model(&self) -> Result<SceneGraph> {
        let color = match self.state.borrow().status {
            SlotStatus::Failed(_) => ERROR_BOX_COLOR,
            _ => LOADING_BOX_COLOR,
        };
        box_model(color)
    }
}

impl fmt::Debug for ModelSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ModelSlot")
            .field("generation", &state.generation)
            .field("content", &state.content)
            .finish()
    }
}

/// Unit box centered at the origin, drawn with `color`
pub fn box_model(color: [f32; 3]) -> Result<SceneGraph> {
    let mut graph = SceneGraph::new();
    let shape = box_shape(1.0, 1.0, 1.0, Appearance::default().with_diffuse_color(color))?;
    let key = graph.add_shape(shape);
    let root = graph.root();
    graph.append_child(root, key)?;
    Ok(graph)
}

struct SlotObserver {
    state: Weak<RefCell<SlotState>>,
    generation: u64,
}

impl SlotObserver {
    fn update(&self, status: SlotStatus) {
        let Some(state) = self.state.upgrade() else {
            return;
        };
        let mut state = state.borrow_mut();
        if state.generation == self.generation {
            state.status = status;
        } else {
            tracing::trace!(
                generation = self.generation,
                current = state.generation,
                "Ignoring outcome of a superseded model request"
            );
        }
    }
}

impl ModelObserver for SlotObserver {
    fn model_updated(&mut self, model: SceneGraph) {
        self.update(SlotStatus::Loaded(model));
    }

    fn model_error(&mut self, error: &ModelError) {
        self.update(SlotStatus::Failed(error.clone()));
    }

    fn progression(&mut self, _phase: LoadPhase, _info: &str, percentage: f32) {
        self.update(SlotStatus::Loading { percentage });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelManagerConfig;
    use crate::content::MemoryContentReader;
    use crate::tasks::TaskQueue;

    const TRIANGLE: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
    const QUAD: &str = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";

    fn manager() -> (ModelManager, Rc<MemoryContentReader>, TaskQueue) {
        let reader = Rc::new(MemoryContentReader::new());
        reader.insert("triangle.obj", TRIANGLE);
        reader.insert("quad.obj", QUAD);
        let tasks = TaskQueue::new();
        let manager = ModelManager::new(ModelManagerConfig::from_env(), reader.clone(), tasks.clone());
        (manager, reader, tasks)
    }

    #[test]
    fn test_latest_request_wins() {
        let (manager, _, tasks) = manager();
        let slot = ModelSlot::new();
        slot.request(&manager, &ContentRef::new("triangle.obj"), false);
        slot.request(&manager, &ContentRef::new("quad.obj"), false);
        assert!(slot.is_loading());

        tasks.run_until_idle();
        let model = slot.model().unwrap();
        assert_eq!(model.content_ref(), Some("quad.obj"));
        assert_eq!(slot.content(), Some(ContentRef::new("quad.obj")));
    }

    #[test]
    fn test_failure_keeps_error_and_red_box() {
        let (manager, _, _) = manager();
        let slot = ModelSlot::new();
        slot.request(&manager, &ContentRef::new("missing.obj"), true);

        assert!(matches!(slot.error(), Some(ModelError::Content { .. })));
        assert!(slot.model().is_none());
        let placeholder = slot.placeholder_model().unwrap();
        let shape_key = placeholder.children(placeholder.root())[0];
        let appearance = placeholder.shape(shape_key).unwrap().appearance.as_ref().unwrap();
        assert_eq!(appearance.diffuse_color, Some(ERROR_BOX_COLOR));
    }

    #[test]
    fn test_take_model_empties_slot() {
        let (manager, _, _) = manager();
        let slot = ModelSlot::new();
        slot.request(&manager, &ContentRef::new("triangle.obj"), true);

        assert!(slot.take_model().is_some());
        assert!(matches!(*slot.status(), SlotStatus::Empty));
        assert!(slot.take_model().is_none());
    }
}
