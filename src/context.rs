use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::Environment;
use crate::error::Result;
use crate::factory::{ArchiveLocator, ManifestCache};

/// State shared by every resolution in a run: the environment snapshot,
/// the module manifest cache, and the archive locator once it is built.
#[derive(Debug, Default)]
pub struct ResolutionContext {
    environment: Environment,
    manifest_cache: ManifestCache,
    archive_locator: Mutex<Option<Arc<ArchiveLocator>>>,
}

impl ResolutionContext {
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            manifest_cache: ManifestCache::new(),
            archive_locator: Mutex::new(None),
        }
    }

    pub fn from_process() -> Self {
        Self::new(Environment::from_process())
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn manifest_cache(&self) -> &ManifestCache {
        &self.manifest_cache
    }

    /// The locator for this run's library tokens, built on first use.
    /// A failed build is not remembered.
    pub fn archive_locator(&self, working_dir: &Path, base_dir: &Path) -> Result<Arc<ArchiveLocator>> {
        let mut slot = self
            .archive_locator
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(locator) = slot.as_ref() {
            return Ok(Arc::clone(locator));
        }
        let locator = Arc::new(ArchiveLocator::from_args(
            &self.environment.args,
            working_dir,
            base_dir,
        )?);
        *slot = Some(Arc::clone(&locator));
        Ok(locator)
    }
}
