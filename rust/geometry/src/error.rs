// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during geometry processing
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid SVG path at offset {offset}: {message}")]
    InvalidSvgPath { offset: usize, message: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{copies} copies of {count} {buffer} exceed the u32 index range")]
    IndexOverflow {
        buffer: &'static str,
        copies: usize,
        count: usize,
    },

    #[error("Scene error: {0}")]
    SceneError(#[from] sh3d_scene::Error),
}
