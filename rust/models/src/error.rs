// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModelError>;

/// Failure delivered to the observers of a model load.
///
/// Errors are `Clone` since one failure is reported to every observer
/// waiting for the same content.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// The content couldn't be read.
    #[error("can't read {url}: {message}")]
    Content { url: String, message: String },

    /// The content was read but the loader rejected it.
    #[error("invalid model in {url}: {message}")]
    Format { url: String, message: String },

    /// No loader produced a model with some geometry.
    #[error("Unsupported 3D format")]
    UnsupportedFormat,

    /// A loader dropped its completion handle without reporting.
    #[error("model loading abandoned")]
    Abandoned,

    #[error("scene error: {0}")]
    Scene(#[from] sh3d_scene::Error),

    #[error("geometry error: {0}")]
    Geometry(#[from] sh3d_geometry::Error),
}

impl ModelError {
    pub fn content(url: &str, message: impl Into<String>) -> Self {
        Self::Content {
            url: url.to_string(),
            message: message.into(),
        }
    }

    pub fn format(url: &str, message: impl Into<String>) -> Self {
        Self::Format {
            url: url.to_string(),
            message: message.into(),
        }
    }

    /// Returns true if another loader may succeed where this error occurred.
    pub fn is_format_error(&self) -> bool {
        matches!(self, Self::Format { .. })
    }
}
