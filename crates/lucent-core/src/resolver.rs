//! Resource search paths.
//!
//! Scene configurations reference sibling assets by relative name. A
//! [`ResourceResolver`] is an explicit list of directories searched in order;
//! each render configuration owns its own copy so concurrent test cases never
//! see each other's paths.

use std::path::{Path, PathBuf};

/// Ordered list of directories used to resolve relative file names.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceResolver {
    paths: Vec<PathBuf>,
}

impl ResourceResolver {
    /// Create an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resolver with a single search path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        let mut resolver = Self::new();
        resolver.add_path(path);
        resolver
    }

    /// Remove every search path.
    pub fn clear(&mut self) {
        self.paths.clear();
    }

    /// Append a search path. Duplicates are ignored.
    pub fn add_path(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.paths.contains(&path) {
            self.paths.push(path);
        }
    }

    /// The registered search paths in lookup order.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Find an existing file for `name`.
    ///
    /// Absolute names and names that exist relative to the working directory
    /// are returned unchanged; otherwise the search paths are tried in order.
    pub fn find(&self, name: impl AsRef<Path>) -> Option<PathBuf> {
        let name = name.as_ref();
        if name.is_absolute() || name.exists() {
            return name.exists().then(|| name.to_path_buf());
        }
        self.paths
            .iter()
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.exists())
    }
}
