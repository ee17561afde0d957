pub mod environment;
pub mod properties;

pub use environment::Environment;
pub use properties::Properties;

use serde::Serialize;
use std::collections::HashSet;
use std::hash::Hash;
use std::path::{Path, PathBuf};

use crate::error::{ConfigurationError, Error, Result};

/// Manifest sentinel: the module has no manifest, use platform resources only.
pub const NONE: &str = "--none";
/// Manifest sentinel: use `AndroidManifest.xml` in the working directory.
pub const DEFAULT: &str = "--default";
pub const DEFAULT_MANIFEST_NAME: &str = "AndroidManifest.xml";
pub const DEFAULT_RES_FOLDER: &str = "res";
pub const DEFAULT_ASSET_FOLDER: &str = "assets";
pub const DEFAULT_BUILD_FOLDER: &str = "build";

/// Per-module build configuration.
///
/// Produced upstream (annotations, properties files, command line) and
/// treated as immutable once resolution starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildConfiguration {
    pub sdk: Vec<u32>,
    pub manifest: String,
    pub qualifiers: String,
    pub package_name: String,
    pub resource_dir: String,
    pub asset_dir: String,
    pub build_dir: String,
    pub shadows: Vec<String>,
    pub instrumented_packages: Vec<String>,
    pub libraries: Vec<String>,
    pub constants: Option<PathBuf>,
}

impl Default for BuildConfiguration {
    fn default() -> Self {
        Self {
            sdk: Vec::new(),
            manifest: DEFAULT.to_string(),
            qualifiers: String::new(),
            package_name: String::new(),
            resource_dir: DEFAULT_RES_FOLDER.to_string(),
            asset_dir: DEFAULT_ASSET_FOLDER.to_string(),
            build_dir: DEFAULT_BUILD_FOLDER.to_string(),
            shadows: Vec::new(),
            instrumented_packages: Vec::new(),
            libraries: Vec::new(),
            constants: None,
        }
    }
}

impl BuildConfiguration {
    pub fn with_manifest(manifest: impl Into<String>) -> Self {
        Self {
            manifest: manifest.into(),
            ..Self::default()
        }
    }

    /// Reads configuration keys from a properties set. Missing keys keep their defaults.
    pub fn from_properties(properties: &Properties) -> Result<Self> {
        let sdk = split_list(properties.get_or("sdk", ""))
            .into_iter()
            .map(|raw| {
                raw.parse::<u32>()
                    .map_err(|_| Error::from(ConfigurationError::invalid_value("sdk", raw.as_str())))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            sdk,
            manifest: properties.get_or("manifest", DEFAULT).to_string(),
            qualifiers: properties.get_or("qualifiers", "").to_string(),
            package_name: properties.get_or("packageName", "").to_string(),
            resource_dir: properties
                .get_or("resourceDir", DEFAULT_RES_FOLDER)
                .to_string(),
            asset_dir: properties
                .get_or("assetDir", DEFAULT_ASSET_FOLDER)
                .to_string(),
            build_dir: properties
                .get_or("buildDir", DEFAULT_BUILD_FOLDER)
                .to_string(),
            shadows: split_list(properties.get_or("shadows", "")),
            instrumented_packages: split_list(properties.get_or("instrumentedPackages", "")),
            libraries: split_list(properties.get_or("libraries", "")),
            constants: properties
                .get("constants")
                .filter(|c| !c.is_empty())
                .map(PathBuf::from),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_properties(&Properties::load(path)?)
    }

    /// Layers `overlay` on top of `base`.
    ///
    /// Scalars take the overlay's value unless it is that field's unset
    /// value; list settings are unioned.
    pub fn merge(base: &Self, overlay: &Self) -> Self {
        let unset = Self::default();
        Self {
            sdk: if overlay.sdk == unset.sdk {
                base.sdk.clone()
            } else {
                overlay.sdk.clone()
            },
            manifest: pick(&base.manifest, &overlay.manifest, &unset.manifest),
            qualifiers: pick(&base.qualifiers, &overlay.qualifiers, &unset.qualifiers),
            package_name: pick(&base.package_name, &overlay.package_name, &unset.package_name),
            resource_dir: pick(&base.resource_dir, &overlay.resource_dir, &unset.resource_dir),
            asset_dir: pick(&base.asset_dir, &overlay.asset_dir, &unset.asset_dir),
            build_dir: pick(&base.build_dir, &overlay.build_dir, &unset.build_dir),
            constants: pick(&base.constants, &overlay.constants, &unset.constants),
            shadows: union(&base.shadows, &overlay.shadows),
            instrumented_packages: union(
                &base.instrumented_packages,
                &overlay.instrumented_packages,
            ),
            libraries: union(&base.libraries, &overlay.libraries),
        }
    }

    pub fn is_manifest_none(&self) -> bool {
        self.manifest == NONE
    }

    pub fn is_manifest_default(&self) -> bool {
        self.manifest == DEFAULT
    }

    /// `None` when no explicit package name is configured.
    pub fn package_name(&self) -> Option<&str> {
        Some(self.package_name.as_str()).filter(|p| !p.is_empty())
    }
}

fn pick<T: Clone + PartialEq>(base: &T, overlay: &T, unset: &T) -> T {
    if overlay == unset {
        base.clone()
    } else {
        overlay.clone()
    }
}

/// Ordered union, first occurrence kept.
fn union<T: Clone + Eq + Hash>(base: &[T], overlay: &[T]) -> Vec<T> {
    let mut seen = HashSet::new();
    base.iter()
        .chain(overlay)
        .filter(|item| seen.insert(*item))
        .cloned()
        .collect()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split([',', ' ', '\t'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
