use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use super::{
    default_resolver, module_constants, DependencyResolver, FactoryKind, ManifestFactory,
    ManifestIdentifier, ResolverSlot,
};
use crate::config::{BuildConfiguration, Properties, DEFAULT_ASSET_FOLDER, DEFAULT_MANIFEST_NAME, DEFAULT_RES_FOLDER};
use crate::context::ResolutionContext;
use crate::error::{IoError, Result};
use crate::manifest::ManifestNode;
use crate::resources::{ResourceTable, SYMBOL_FILE_NAME};

pub const PROJECT_PROPERTIES: &str = "project.properties";
pub const TEST_PROJECT_PROPERTIES: &str = "test-project.properties";
pub const LIBRARY_REFERENCE_PREFIX: &str = "android.library.reference.";

const MAX_LIBRARY_DEPTH: usize = 50;

/// Resolves the module from conventional paths under the working directory
/// and discovers libraries through numbered properties-file references.
pub struct PathConventionFactory {
    config: BuildConfiguration,
    ctx: Arc<ResolutionContext>,
    resolver: ResolverSlot,
}

impl PathConventionFactory {
    pub fn new(config: BuildConfiguration, ctx: Arc<ResolutionContext>) -> Self {
        Self {
            config,
            ctx,
            resolver: ResolverSlot::default(),
        }
    }

    fn identifier(&self) -> ManifestIdentifier {
        let working_dir = self.ctx.environment().working_dir();
        let manifest_file = if self.config.is_manifest_default() {
            working_dir.join(DEFAULT_MANIFEST_NAME)
        } else {
            working_dir.join(&self.config.manifest)
        };
        let base_dir = manifest_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| working_dir.to_path_buf());

        ManifestIdentifier {
            res_dir: base_dir.join(&self.config.resource_dir),
            asset_dir: base_dir.join(&self.config.asset_dir),
            package_name: self.config.package_name().map(str::to_string),
            library_dirs: self
                .config
                .libraries
                .iter()
                .map(|lib| base_dir.join(lib))
                .collect(),
            manifest_file,
        }
    }

    fn build_module(&self, key: &ManifestIdentifier) -> Result<ManifestNode> {
        let manifest_dir = key
            .manifest_file
            .parent()
            .unwrap_or_else(|| Path::new(""));
        let constants = module_constants(
            &self.config,
            self.ctx.environment().working_dir(),
            manifest_dir,
        )?;
        debug!(
            "module manifest {} (res {}, assets {})",
            key.manifest_file.display(),
            key.res_dir.display(),
            key.asset_dir.display()
        );
        Ok(
            ManifestNode::new(&key.manifest_file, &key.res_dir, &key.asset_dir)
                .with_package_name(key.package_name.clone())
                .with_constants(constants),
        )
    }
}

impl ManifestFactory for PathConventionFactory {
    fn kind(&self) -> FactoryKind {
        FactoryKind::PathConvention
    }

    fn config(&self) -> &BuildConfiguration {
        &self.config
    }

    fn create_app_manifest(&self) -> Result<Option<ManifestNode>> {
        if self.config.is_manifest_none() {
            return Ok(None);
        }

        let key = self.identifier();
        if !key.manifest_file.is_file() {
            warn!(
                "No manifest file found at {}. Falling back to the platform's resources only.",
                key.manifest_file.display()
            );
            return Ok(None);
        }

        let library_dirs = key.library_dirs.clone();
        let manifest = self.ctx.manifest_cache().resolve(
            key.clone(),
            || self.build_module(&key),
            |node| {
                if library_dirs.is_empty() {
                    create_library_manifests(node.base_dir())
                } else {
                    library_dirs
                        .iter()
                        .map(|dir| library_manifest(dir, 1))
                        .collect()
                }
            },
        )?;
        Ok(Some(manifest))
    }

    fn dependency_resolver(&self) -> Result<Arc<dyn DependencyResolver>> {
        self.resolver
            .get_or_try_init(|| default_resolver(self.ctx.environment()))
    }
}

/// Library nodes referenced from the properties files in `base_dir`, each
/// with its own libraries discovered recursively.
pub fn create_library_manifests(base_dir: &Path) -> Result<Vec<ManifestNode>> {
    discover(base_dir, 0)
}

fn discover(base_dir: &Path, depth: usize) -> Result<Vec<ManifestNode>> {
    if depth >= MAX_LIBRARY_DEPTH {
        warn!(
            "library references nest deeper than {MAX_LIBRARY_DEPTH} levels at {}, ignoring the rest",
            base_dir.display()
        );
        return Ok(Vec::new());
    }
    find_libraries(base_dir)?
        .iter()
        .map(|dir| library_manifest(dir, depth + 1))
        .collect()
}

fn library_manifest(dir: &Path, depth: usize) -> Result<ManifestNode> {
    let node = ManifestNode::new(
        dir.join(DEFAULT_MANIFEST_NAME),
        dir.join(DEFAULT_RES_FOLDER),
        dir.join(DEFAULT_ASSET_FOLDER),
    )
    .with_constants(ResourceTable::load_optional(&dir.join(SYMBOL_FILE_NAME))?);
    let libraries = discover(node.base_dir(), depth)?;
    Ok(node.with_libraries(libraries))
}

/// Directories named by `android.library.reference.N`, in ascending `N`
/// from 1 until the first missing key. `test-project.properties`
/// overrides `project.properties` key by key.
pub fn find_libraries(base_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut properties = Properties::load(&base_dir.join(PROJECT_PROPERTIES))?;
    properties.extend(Properties::load(&base_dir.join(TEST_PROJECT_PROPERTIES))?);

    let mut libraries = Vec::new();
    for n in 1.. {
        let Some(reference) = properties.get(&format!("{LIBRARY_REFERENCE_PREFIX}{n}")) else {
            break;
        };
        let dir = base_dir.join(reference);
        if has_entries(&dir)? {
            libraries.push(dir);
        } else {
            debug!("skipping empty or missing library dir {}", dir.display());
        }
    }
    Ok(libraries)
}

fn has_entries(dir: &Path) -> Result<bool> {
    if !dir.is_dir() {
        return Ok(false);
    }
    let mut entries = fs::read_dir(dir).map_err(|e| IoError::read_error(dir, e))?;
    Ok(entries.next().is_some())
}
