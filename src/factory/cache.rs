use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use crate::error::Result;
use crate::manifest::ManifestNode;

/// Cache key for a module manifest, compared by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ManifestIdentifier {
    pub manifest_file: PathBuf,
    pub res_dir: PathBuf,
    pub asset_dir: PathBuf,
    pub package_name: Option<String>,
    pub library_dirs: Vec<PathBuf>,
}

/// Module manifests already built in this run.
///
/// Library discovery is not part of the key: it is repeated on every
/// lookup and its result reattached to the cached node.
#[derive(Debug, Default)]
pub struct ManifestCache {
    manifests: Mutex<HashMap<ManifestIdentifier, ManifestNode>>,
}

impl ManifestCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up `key`, building the node on a miss, then recomputes its
    /// libraries with `libraries`. The whole sequence holds the cache lock.
    pub fn resolve<B, L>(&self, key: ManifestIdentifier, build: B, libraries: L) -> Result<ManifestNode>
    where
        B: FnOnce() -> Result<ManifestNode>,
        L: FnOnce(&ManifestNode) -> Result<Vec<ManifestNode>>,
    {
        let mut manifests = self.manifests.lock().unwrap_or_else(PoisonError::into_inner);
        let node = match manifests.entry(key) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(build()?),
        };
        let discovered = libraries(&*node)?;
        node.set_libraries(discovered);
        Ok(node.clone())
    }

    pub fn get(&self, key: &ManifestIdentifier) -> Option<ManifestNode> {
        self.manifests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.manifests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.manifests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
