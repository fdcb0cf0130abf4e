// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Content references and the readers that fetch their bytes.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::{ModelError, Result};

/// Reference to a model content, identified by its URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentRef {
    url: String,
}

impl ContentRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Resolves `relative` against the directory of this content.
    pub fn resolve(&self, relative: &str) -> String {
        resolve_url(&self.url, relative)
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

impl From<&str> for ContentRef {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

/// Resolves `relative` against the directory of `base`.
///
/// Absolute URLs and paths are returned unchanged.
pub fn resolve_url(base: &str, relative: &str) -> String {
    if relative.contains("://") || relative.starts_with('/') {
        return relative.to_string();
    }
    match base.rfind('/') {
        Some(slash) => format!("{}{}", &base[..=slash], relative),
        None => relative.to_string(),
    }
}

/// Source of model bytes.
pub trait ContentReader {
    fn read(&self, url: &str) -> Result<Arc<[u8]>>;
}

/// Reads plain paths and `file://` URLs from the file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileContentReader;

impl ContentReader for FileContentReader {
    fn read(&self, url: &str) -> Result<Arc<[u8]>> {
        let path = url.strip_prefix("file://").unwrap_or(url);
        std::fs::read(path)
            .map(Arc::from)
            .map_err(|e| ModelError::content(url, e.to_string()))
    }
}

/// In-memory contents, for embedded assets and tests.
#[derive(Debug, Default)]
pub struct MemoryContentReader {
    contents: RefCell<FxHashMap<String, Arc<[u8]>>>,
    reads: Cell<usize>,
}

impl MemoryContentReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, url: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.contents
            .borrow_mut()
            .insert(url.into(), Arc::from(bytes.into()));
    }

    pub fn remove(&self, url: &str) -> bool {
        self.contents.borrow_mut().remove(url).is_some()
    }

    /// Number of successful and failed reads so far.
    pub fn read_count(&self) -> usize {
        self.reads.get()
    }
}

impl ContentReader for MemoryContentReader {
    fn read(&self, url: &str) -> Result<Arc<[u8]>> {
        self.reads.set(self.reads.get() + 1);
        self.contents
            .borrow()
            .get(url)
            .cloned()
            .ok_or_else(|| ModelError::content(url, "no such content"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        let content = ContentRef::new("https://example.com/models/chair.obj");
        assert_eq!(content.resolve("chair.mtl"), "https://example.com/models/chair.mtl");
        assert_eq!(content.resolve("/abs/wood.png"), "/abs/wood.png");
        assert_eq!(content.resolve("jar:file://x.zip!/a.png"), "jar:file://x.zip!/a.png");
        assert_eq!(resolve_url("chair.obj", "chair.mtl"), "chair.mtl");
    }

    #[test]
    fn test_memory_reader() {
        let reader = MemoryContentReader::new();
        reader.insert("a.obj", "v 0 0 0");
        assert_eq!(&*reader.read("a.obj").unwrap(), b"v 0 0 0");
        assert!(matches!(reader.read("b.obj"), Err(ModelError::Content { .. })));
        assert_eq!(reader.read_count(), 2);
    }

    #[test]
    fn test_file_reader_missing_file() {
        let result = FileContentReader.read("file:///nonexistent/sh3d/model.obj");
        assert!(matches!(result, Err(ModelError::Content { url, .. }) if url == "file:///nonexistent/sh3d/model.obj"));
    }
}
