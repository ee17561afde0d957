use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use super::{default_resolver, DependencyResolver, FactoryKind, ManifestFactory, ResolverSlot};
use crate::config::{BuildConfiguration, DEFAULT_MANIFEST_NAME};
use crate::context::ResolutionContext;
use crate::error::{ConfigurationError, IoError, Result};
use crate::manifest::ManifestNode;
use crate::resources::{ResourceTable, SYMBOL_FILE_NAME};

/// Generated build-constants source that marks a build output layout.
pub const BUILD_CONFIG_FILE: &str = "BuildConfig.java";

const INTERMEDIATES: &str = "intermediates";

/// Whether `config` points at a build output layout rather than sources.
pub fn matches(config: &BuildConfiguration) -> bool {
    config
        .constants
        .as_deref()
        .and_then(Path::file_name)
        .is_some_and(|name| name == BUILD_CONFIG_FILE)
}

/// `String` constants of a generated `BuildConfig.java`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildConstants {
    pub build_type: Option<String>,
    pub flavor: Option<String>,
    pub application_id: Option<String>,
}

impl BuildConstants {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| IoError::read_error(path, e))?;
        Ok(Self::parse(&content))
    }

    pub fn parse(content: &str) -> Self {
        let mut constants = Self::default();
        for (name, value) in content.lines().filter_map(string_constant) {
            match name {
                "BUILD_TYPE" => constants.build_type = Some(value.to_string()),
                "FLAVOR" => constants.flavor = Some(value.to_string()),
                "APPLICATION_ID" => constants.application_id = Some(value.to_string()),
                _ => {}
            }
        }
        constants
    }
}

/// `... String NAME = "value";` → `(NAME, value)`.
fn string_constant(line: &str) -> Option<(&str, &str)> {
    let (_, declaration) = line.split_once("String ")?;
    let (name, value) = declaration.split_once('=')?;
    let value = value.trim().strip_suffix(';')?.trim();
    let value = value.strip_prefix('"')?.strip_suffix('"')?;
    Some((name.trim(), value))
}

/// Resolves a module from the intermediates directory of a build's output.
pub struct OutputLayoutFactory {
    config: BuildConfiguration,
    ctx: Arc<ResolutionContext>,
    resolver: ResolverSlot,
}

impl OutputLayoutFactory {
    pub fn new(config: BuildConfiguration, ctx: Arc<ResolutionContext>) -> Self {
        Self {
            config,
            ctx,
            resolver: ResolverSlot::default(),
        }
    }
}

impl ManifestFactory for OutputLayoutFactory {
    fn kind(&self) -> FactoryKind {
        FactoryKind::OutputLayout
    }

    fn config(&self) -> &BuildConfiguration {
        &self.config
    }

    fn create_app_manifest(&self) -> Result<Option<ManifestNode>> {
        let working_dir = self.ctx.environment().working_dir();
        let constants_file = self
            .config
            .constants
            .as_ref()
            .map(|c| working_dir.join(c))
            .ok_or_else(|| ConfigurationError::missing_setting("constants"))?;
        let build = BuildConstants::load(&constants_file)?;
        let flavor = build.flavor.as_deref().unwrap_or_default();
        let build_type = build.build_type.as_deref().unwrap_or_default();

        let intermediates = working_dir.join(&self.config.build_dir).join(INTERMEDIATES);
        let variant = [flavor, build_type];

        let res_dir = if intermediates.join("data-binding-layout-out").exists() {
            under(&intermediates, &["data-binding-layout-out"], &variant, &[])
        } else if intermediates.join("res").join("merged").exists() {
            under(&intermediates, &["res", "merged"], &variant, &[])
        } else if intermediates.join("res").exists() {
            under(&intermediates, &["res"], &variant, &[])
        } else {
            under(&intermediates, &["bundles"], &variant, &["res"])
        };

        let assets_dir = if intermediates.join("assets").exists() {
            under(&intermediates, &["assets"], &variant, &[])
        } else {
            under(&intermediates, &["bundles"], &variant, &["assets"])
        };

        let manifest_file = if intermediates.join("manifests").exists() {
            under(&intermediates, &["manifests", "full"], &variant, &[DEFAULT_MANIFEST_NAME])
        } else {
            under(&intermediates, &["bundles"], &variant, &[DEFAULT_MANIFEST_NAME])
        };

        let symbols = under(&intermediates, &["symbols"], &variant, &[SYMBOL_FILE_NAME]);
        let package_name = self
            .config
            .package_name()
            .map(str::to_string)
            .or(build.application_id);

        debug!("assets directory: {}", assets_dir.display());
        debug!("   res directory: {}", res_dir.display());
        debug!("   manifest path: {}", manifest_file.display());
        debug!("    package name: {}", package_name.as_deref().unwrap_or("<manifest>"));

        Ok(Some(
            ManifestNode::new(manifest_file, res_dir, assets_dir)
                .with_package_name(package_name)
                .with_constants(ResourceTable::load_optional(&symbols)?),
        ))
    }

    fn dependency_resolver(&self) -> Result<Arc<dyn DependencyResolver>> {
        self.resolver
            .get_or_try_init(|| default_resolver(self.ctx.environment()))
    }
}

/// Joins non-empty parts: `root/prefix../variant../suffix..`.
fn under(root: &Path, prefix: &[&str], variant: &[&str], suffix: &[&str]) -> PathBuf {
    let mut path = root.to_path_buf();
    path.extend(
        prefix
            .iter()
            .chain(variant)
            .chain(suffix)
            .filter(|part| !part.is_empty()),
    );
    path
}
