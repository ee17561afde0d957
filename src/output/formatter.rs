use anyhow::Result;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::factory::{FactoryKind, ManifestFactory, SandboxConfiguration};
use crate::manifest::ManifestNode;

use super::{ManifestSummary, ResourcePathSummary};

#[derive(Debug, Serialize)]
pub struct ResolutionOutput {
    pub factory: FactoryKind,
    pub sdk_version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<ManifestSummary>,
    pub resource_paths: Vec<ResourcePathSummary>,
    pub sandbox: SandboxConfiguration,
}

pub struct OutputFormatter;

impl OutputFormatter {
    pub fn format(output: &ResolutionOutput, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(output)?),
            OutputFormat::Text => Ok(Self::format_text(output)),
        }
    }

    pub fn build_output(
        factory: &dyn ManifestFactory,
        manifest: Option<&ManifestNode>,
    ) -> Result<ResolutionOutput> {
        let sdk_version = factory.pick_sdk_version(manifest)?;
        let resource_paths = manifest
            .map(|m| {
                m.included_resource_paths()
                    .iter()
                    .map(ResourcePathSummary::from_path)
                    .collect()
            })
            .unwrap_or_default();

        Ok(ResolutionOutput {
            factory: factory.kind(),
            sdk_version,
            manifest: manifest.map(ManifestSummary::from_node),
            resource_paths,
            sandbox: factory.create_sandbox_configuration(),
        })
    }

    fn format_text(output: &ResolutionOutput) -> String {
        let mut lines = vec![
            format!("factory: {}", output.factory.as_str()),
            format!("sdk: {}", output.sdk_version),
        ];

        match &output.manifest {
            Some(manifest) => Self::push_manifest(&mut lines, manifest, 0),
            None => lines.push("manifest: none (platform resources only)".to_string()),
        }

        if !output.resource_paths.is_empty() {
            lines.push("resource paths:".to_string());
            for path in &output.resource_paths {
                lines.push(format!(
                    "  {} {}",
                    path.package_name.as_deref().unwrap_or("-"),
                    path.res_dir
                ));
            }
        }

        lines.push(format!(
            "excluded packages: {}",
            output.sandbox.excluded_packages.join(", ")
        ));
        lines.join("\n")
    }

    fn push_manifest(lines: &mut Vec<String>, manifest: &ManifestSummary, depth: usize) {
        let indent = "  ".repeat(depth);
        let label = if depth == 0 { "manifest" } else { "library" };
        let package = manifest.package_name.as_deref().unwrap_or("?");
        lines.push(format!(
            "{indent}{label}: {} ({package})",
            manifest.manifest_file
        ));
        lines.push(format!("{indent}  res: {}", manifest.res_dir));
        lines.push(format!("{indent}  assets: {}", manifest.assets_dir));
        if manifest.resource_count > 0 {
            lines.push(format!("{indent}  resources: {}", manifest.resource_count));
        }
        for library in &manifest.libraries {
            Self::push_manifest(lines, library, depth + 1);
        }
    }
}
