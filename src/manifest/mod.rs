/// Manifest tree
///
/// A `ManifestNode` describes one module or library: where its manifest,
/// resources and assets live, its resource-constant table, and the
/// libraries it depends on. Resolvers build trees; everything downstream
/// reads them.
pub mod android;

pub use android::ManifestInfo;

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use tracing::warn;

use crate::resources::ResourceTable;

#[derive(Debug, Clone)]
pub struct ManifestNode {
    manifest_file: PathBuf,
    res_dir: PathBuf,
    assets_dir: PathBuf,
    package_name: Option<String>,
    info: OnceLock<Option<ManifestInfo>>,
    constants: Option<ResourceTable>,
    libraries: Vec<ManifestNode>,
}

/// Resource location of a single package, as consumed by resource loading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourcePath<'a> {
    pub package_name: Option<&'a str>,
    pub res_dir: &'a Path,
    pub assets_dir: &'a Path,
    pub constants: Option<&'a ResourceTable>,
}

impl ManifestNode {
    pub fn new(
        manifest_file: impl Into<PathBuf>,
        res_dir: impl Into<PathBuf>,
        assets_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            manifest_file: manifest_file.into(),
            res_dir: res_dir.into(),
            assets_dir: assets_dir.into(),
            package_name: None,
            info: OnceLock::new(),
            constants: None,
            libraries: Vec::new(),
        }
    }

    pub fn with_package_name(mut self, package_name: Option<String>) -> Self {
        self.package_name = package_name;
        self
    }

    pub fn with_constants(mut self, constants: Option<ResourceTable>) -> Self {
        self.constants = constants;
        self
    }

    pub fn with_libraries(mut self, libraries: Vec<ManifestNode>) -> Self {
        self.libraries = libraries;
        self
    }

    pub fn manifest_file(&self) -> &Path {
        &self.manifest_file
    }

    pub fn res_dir(&self) -> &Path {
        &self.res_dir
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    /// Directory holding the resource directory; library references are relative to it.
    pub fn base_dir(&self) -> &Path {
        self.res_dir.parent().unwrap_or(Path::new("."))
    }

    pub fn exists(&self) -> bool {
        self.manifest_file.is_file()
    }

    /// Explicit package name, else the `package` attribute of the manifest.
    pub fn package_name(&self) -> Option<&str> {
        self.package_name
            .as_deref()
            .or_else(|| self.info().and_then(|i| i.package.as_deref()))
    }

    pub fn set_package_name(&mut self, package_name: Option<String>) {
        self.package_name = package_name;
    }

    pub fn target_sdk_version(&self) -> Option<u32> {
        self.info().and_then(ManifestInfo::sdk_version)
    }

    fn info(&self) -> Option<&ManifestInfo> {
        self.info
            .get_or_init(|| {
                if !self.exists() {
                    return None;
                }
                match ManifestInfo::read(&self.manifest_file) {
                    Ok(info) => Some(info),
                    Err(e) => {
                        warn!("ignoring unreadable manifest: {e}");
                        None
                    }
                }
            })
            .as_ref()
    }

    pub fn constants(&self) -> Option<&ResourceTable> {
        self.constants.as_ref()
    }

    pub fn constants_mut(&mut self) -> Option<&mut ResourceTable> {
        self.constants.as_mut()
    }

    pub fn set_constants(&mut self, constants: Option<ResourceTable>) {
        self.constants = constants;
    }

    pub fn libraries(&self) -> &[ManifestNode] {
        &self.libraries
    }

    pub fn libraries_mut(&mut self) -> &mut [ManifestNode] {
        &mut self.libraries
    }

    pub fn set_libraries(&mut self, libraries: Vec<ManifestNode>) {
        self.libraries = libraries;
    }

    pub fn resource_path(&self) -> ResourcePath<'_> {
        ResourcePath {
            package_name: self.package_name(),
            res_dir: &self.res_dir,
            assets_dir: &self.assets_dir,
            constants: self.constants.as_ref(),
        }
    }

    /// Resource paths of this node and every library below it, depth first,
    /// each manifest listed once however it was reached.
    pub fn included_resource_paths(&self) -> Vec<ResourcePath<'_>> {
        let mut seen = HashSet::new();
        self.walk()
            .into_iter()
            .filter(|node| seen.insert(canonical_path(&node.manifest_file)))
            .map(ManifestNode::resource_path)
            .collect()
    }

    /// This node followed by its libraries in depth-first declaration order.
    pub fn walk(&self) -> Vec<&ManifestNode> {
        let mut nodes = vec![self];
        for library in &self.libraries {
            nodes.extend(library.walk());
        }
        nodes
    }
}

/// Resolved form of `path`: symlinks followed when it exists, `.` and
/// `..` folded lexically otherwise.
pub fn canonical_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| normalize(path))
}

fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(normalized.components().next_back(), Some(Component::Normal(_))) {
                    normalized.pop();
                } else {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

impl PartialEq for ManifestNode {
    fn eq(&self, other: &Self) -> bool {
        self.manifest_file == other.manifest_file
            && self.res_dir == other.res_dir
            && self.assets_dir == other.assets_dir
            && self.package_name == other.package_name
            && self.constants == other.constants
            && self.libraries == other.libraries
    }
}
