/// Manifest factories
///
/// Each build system leaves manifests, resources and library metadata in
/// a different place. `select` inspects the configuration and environment
/// and returns the factory that knows where to look.
pub mod archive;
pub mod cache;
pub mod dependency;
pub mod output_layout;
pub mod path_convention;
pub mod sandboxed;

pub use archive::ArchiveLocator;
pub use cache::{ManifestCache, ManifestIdentifier};
pub use dependency::{
    DependencyJar, DependencyResolver, LocalDependencyResolver, MavenRepositoryResolver,
};
pub use output_layout::OutputLayoutFactory;
pub use path_convention::PathConventionFactory;
pub use sandboxed::SandboxedFactory;

use std::path::Path;
use std::sync::{Arc, OnceLock};

use serde::Serialize;

use crate::config::{environment, BuildConfiguration, Environment};
use crate::context::ResolutionContext;
use crate::error::{ConfigurationError, MissingDependencyError, Result};
use crate::manifest::ManifestNode;
use crate::resources::{ResourceTable, SYMBOL_FILE_NAME};

/// Sdk level used when neither configuration nor manifest names one.
pub const FALLBACK_SDK_VERSION: u32 = 16;

/// Packages the sandbox always loads from the host instead of substituting.
pub const DEFAULT_EXCLUDED_PACKAGES: &[&str] = &[
    "java.",
    "javax.",
    "sun.",
    "org.junit.",
    "org.hamcrest.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FactoryKind {
    PathConvention,
    Sandboxed,
    OutputLayout,
}

impl FactoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FactoryKind::PathConvention => "path-convention",
            FactoryKind::Sandboxed => "sandboxed",
            FactoryKind::OutputLayout => "output-layout",
        }
    }
}

/// Settings handed to the runtime sandbox: which packages it must not substitute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SandboxConfiguration {
    pub excluded_packages: Vec<String>,
    pub instrumented_packages: Vec<String>,
    pub shadows: Vec<String>,
}

impl SandboxConfiguration {
    pub fn from_config(config: &BuildConfiguration) -> Self {
        Self {
            excluded_packages: DEFAULT_EXCLUDED_PACKAGES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            instrumented_packages: config.instrumented_packages.clone(),
            shadows: config.shadows.clone(),
        }
    }

    pub fn exclude(mut self, package: impl Into<String>) -> Self {
        let package = package.into();
        if !self.excluded_packages.contains(&package) {
            self.excluded_packages.push(package);
        }
        self
    }

    pub fn is_excluded(&self, class_name: &str) -> bool {
        self.excluded_packages
            .iter()
            .any(|p| class_name.starts_with(p.as_str()))
    }
}

pub trait ManifestFactory: Send + Sync {
    fn kind(&self) -> FactoryKind;

    fn config(&self) -> &BuildConfiguration;

    /// The module's manifest tree, or `None` when only platform resources apply.
    fn create_app_manifest(&self) -> Result<Option<ManifestNode>>;

    /// Memoized per factory.
    fn dependency_resolver(&self) -> Result<Arc<dyn DependencyResolver>>;

    fn pick_sdk_version(&self, manifest: Option<&ManifestNode>) -> Result<u32> {
        pick_sdk_version(self.config(), manifest)
    }

    fn create_sandbox_configuration(&self) -> SandboxConfiguration {
        SandboxConfiguration::from_config(self.config())
    }
}

/// Chooses the factory for `config`: output layout when the constants
/// reference follows that layout, sandboxed when its runfiles marker is
/// set, path conventions otherwise.
pub fn select(config: BuildConfiguration, ctx: Arc<ResolutionContext>) -> Box<dyn ManifestFactory> {
    if output_layout::matches(&config) {
        Box::new(OutputLayoutFactory::new(config, ctx))
    } else if ctx.environment().is_sandboxed() {
        Box::new(SandboxedFactory::new(config, ctx))
    } else {
        Box::new(PathConventionFactory::new(config, ctx))
    }
}

pub fn pick_sdk_version(config: &BuildConfiguration, manifest: Option<&ManifestNode>) -> Result<u32> {
    match config.sdk.as_slice() {
        [sdk] => Ok(*sdk),
        [] => Ok(manifest
            .and_then(ManifestNode::target_sdk_version)
            .unwrap_or(FALLBACK_SDK_VERSION)),
        many => Err(ConfigurationError::AmbiguousSdk {
            versions: many.to_vec(),
        }
        .into()),
    }
}

/// Resolver for factories that do not mandate a dependency directory.
pub(crate) fn default_resolver(env: &Environment) -> Result<Arc<dyn DependencyResolver>> {
    if let Some(dir) = &env.dependency_dir {
        return Ok(Arc::new(LocalDependencyResolver::new(dir)));
    }
    match &env.home_dir {
        Some(home) => Ok(Arc::new(MavenRepositoryResolver::in_home(home))),
        None => Err(ConfigurationError::missing_setting(environment::DEPENDENCY_DIR).into()),
    }
}

/// The module's own resource table: the configured symbol file, else
/// `R.txt` beside the manifest.
pub(crate) fn module_constants(
    config: &BuildConfiguration,
    working_dir: &Path,
    manifest_dir: &Path,
) -> Result<Option<ResourceTable>> {
    match &config.constants {
        Some(path) if !output_layout::matches(config) => {
            let path = working_dir.join(path);
            if !path.is_file() {
                return Err(MissingDependencyError::path(path).into());
            }
            ResourceTable::load(&path).map(Some)
        }
        _ => ResourceTable::load_optional(&manifest_dir.join(SYMBOL_FILE_NAME)),
    }
}

#[derive(Debug, Default)]
pub(crate) struct ResolverSlot {
    resolver: OnceLock<Arc<dyn DependencyResolver>>,
}

impl ResolverSlot {
    pub(crate) fn get_or_try_init<F>(&self, init: F) -> Result<Arc<dyn DependencyResolver>>
    where
        F: FnOnce() -> Result<Arc<dyn DependencyResolver>>,
    {
        if let Some(resolver) = self.resolver.get() {
            return Ok(Arc::clone(resolver));
        }
        let resolver = init()?;
        Ok(Arc::clone(self.resolver.get_or_init(|| resolver)))
    }
}
