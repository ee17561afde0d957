use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::warn;

use super::{
    module_constants, DependencyResolver, FactoryKind, LocalDependencyResolver, ManifestFactory,
    ResolverSlot, SandboxConfiguration,
};
use crate::config::{environment, BuildConfiguration, DEFAULT_MANIFEST_NAME};
use crate::context::ResolutionContext;
use crate::error::{ConfigurationError, Result};
use crate::manifest::ManifestNode;
use crate::resources::ResourceIdReconciler;

/// Sdk level assumed when a sandboxed run configures none.
pub const SANDBOXED_DEFAULT_SDK_VERSION: u32 = 19;

/// Coverage agent classes must never be substituted.
const COVERAGE_PACKAGE: &str = "org.jacoco";

/// Resolves modules inside a sandboxed build's runfiles tree, where
/// libraries arrive as `manifest:archive` tokens on the command line.
pub struct SandboxedFactory {
    config: BuildConfiguration,
    ctx: Arc<ResolutionContext>,
    resolver: ResolverSlot,
}

impl SandboxedFactory {
    pub fn new(config: BuildConfiguration, ctx: Arc<ResolutionContext>) -> Self {
        Self {
            config,
            ctx,
            resolver: ResolverSlot::default(),
        }
    }

    fn runfiles_dir(&self) -> Result<&Path> {
        self.ctx
            .environment()
            .test_srcdir
            .as_deref()
            .ok_or_else(|| ConfigurationError::missing_setting(environment::TEST_SRCDIR).into())
    }

    /// Configured manifest relative to the runfiles root.
    fn manifest_reference(&self) -> &str {
        if self.config.is_manifest_default() {
            return DEFAULT_MANIFEST_NAME;
        }
        let mut reference = self.config.manifest.as_str();
        loop {
            if let Some(rest) = reference.strip_prefix("./") {
                reference = rest;
            } else if let Some(rest) = reference.strip_prefix('/') {
                reference = rest;
            } else {
                return reference;
            }
        }
    }

    fn basic_manifest(&self, manifest_file: &Path) -> Result<Option<ManifestNode>> {
        if !manifest_file.is_file() {
            warn!(
                "No manifest file found at {}. Falling back to the platform's resources only.",
                manifest_file.display()
            );
            return Ok(None);
        }
        let base_dir = manifest_file.parent().unwrap_or_else(|| Path::new(""));
        let constants = module_constants(&self.config, self.runfiles_dir()?, base_dir)?;
        Ok(Some(
            ManifestNode::new(
                manifest_file,
                base_dir.join(&self.config.resource_dir),
                base_dir.join(&self.config.asset_dir),
            )
            .with_package_name(self.package_name())
            .with_constants(constants),
        ))
    }

    fn package_name(&self) -> Option<String> {
        self.config
            .package_name()
            .map(str::to_string)
            .or_else(|| self.ctx.environment().android_package.clone())
    }
}

impl ManifestFactory for SandboxedFactory {
    fn kind(&self) -> FactoryKind {
        FactoryKind::Sandboxed
    }

    fn config(&self) -> &BuildConfiguration {
        &self.config
    }

    fn create_app_manifest(&self) -> Result<Option<ManifestNode>> {
        let runfiles = self.runfiles_dir()?;
        let workspace_dir: PathBuf = match &self.ctx.environment().test_workspace {
            Some(workspace) => runfiles.join(workspace),
            None => runfiles.to_path_buf(),
        };
        let manifest_file = runfiles.join(self.manifest_reference());

        let locator = self.ctx.archive_locator(runfiles, &workspace_dir)?;
        let mut manifest = match locator.create_manifest(&manifest_file)? {
            Some(mut manifest) => {
                if let Some(package) = self.package_name() {
                    manifest.set_package_name(Some(package));
                }
                manifest
            }
            None => match self.basic_manifest(&manifest_file)? {
                Some(manifest) => manifest,
                None => return Ok(None),
            },
        };

        ResourceIdReconciler::new().reconcile(&mut manifest);
        Ok(Some(manifest))
    }

    fn dependency_resolver(&self) -> Result<Arc<dyn DependencyResolver>> {
        self.resolver.get_or_try_init(|| {
            let dir = self
                .ctx
                .environment()
                .dependency_dir
                .as_ref()
                .ok_or_else(|| ConfigurationError::missing_setting(environment::DEPENDENCY_DIR))?;
            let resolver: Arc<dyn DependencyResolver> = Arc::new(LocalDependencyResolver::new(dir));
            Ok(resolver)
        })
    }

    fn pick_sdk_version(&self, manifest: Option<&ManifestNode>) -> Result<u32> {
        if self.config.sdk.is_empty() {
            Ok(SANDBOXED_DEFAULT_SDK_VERSION)
        } else {
            super::pick_sdk_version(&self.config, manifest)
        }
    }

    fn create_sandbox_configuration(&self) -> SandboxConfiguration {
        SandboxConfiguration::from_config(&self.config).exclude(COVERAGE_PACKAGE)
    }
}
