// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # SH3D Models
//!
//! Loading pipeline of the 3D models displayed in a home.
//!
//! A [`ModelManager`] reads each content once through its format loaders,
//! post-processes the model and caches it. Every request then gets its own
//! copy of the cached [`SceneGraph`](sh3d_scene::SceneGraph).
//!
//! Post-processing, in order:
//! - window panes without transparency become half transparent,
//! - nodes named after joints are nested under pickable transform groups,
//! - shapes instanced through several links are baked into one shape.
//!
//! Loads run synchronously or through a [`TaskQueue`] drained by the
//! application event loop. Nothing here is `Send`: models are loaded and
//! modified on one thread.
//!
//! ## Quick Start
//!
//! ```
//! use std::rc::Rc;
//! use sh3d_models::{ContentRef, MemoryContentReader, ModelManager, ModelManagerConfig, ModelSlot, TaskQueue};
//!
//! let reader = Rc::new(MemoryContentReader::new());
//! reader.insert("models/table.obj", "v 0 0 0\nv 2 0 0\nv 0 1 1\nf 1 2 3\n");
//! let manager = ModelManager::new(ModelManagerConfig::default(), reader, TaskQueue::new());
//!
//! let slot = ModelSlot::new();
//! slot.request(&manager, &ContentRef::new("models/table.obj"), true);
//!
//! let model = slot.model().unwrap();
//! let size = manager.size(&model, model.root(), None);
//! assert_eq!(size.x, 2.0);
//! ```

pub mod config;
pub mod content;
pub mod dispatch;
pub mod error;
pub mod loader;
pub mod manager;
pub mod materials;
pub mod observer;
pub mod postprocess;
pub mod sync;
pub mod tasks;

pub use config::ModelManagerConfig;
pub use content::{resolve_url, ContentReader, ContentRef, FileContentReader, MemoryContentReader};
pub use dispatch::LoaderDispatch;
pub use error::{ModelError, Result};
pub use loader::{LoadCallbacks, LoadListener, ModelLoader, ObjLoader};
pub use manager::{ModelManager, UnloadReport};
pub use materials::{materials, MaterialTexture, ModelMaterial};
pub use observer::{CallbackObserver, LoadPhase, ModelObserver};
pub use postprocess::{
    post_process, replace_multiple_shared_shapes, update_deformable_model_hierarchy,
    update_window_panes_transparency,
};
pub use sync::{box_model, ModelSlot, SlotStatus};
pub use tasks::TaskQueue;
