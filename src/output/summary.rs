use serde::Serialize;

use crate::manifest::{ManifestNode, ResourcePath};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestSummary {
    pub manifest_file: String,
    pub res_dir: String,
    pub assets_dir: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_sdk_version: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constants: Option<String>,
    pub resource_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub libraries: Vec<ManifestSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourcePathSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    pub res_dir: String,
    pub assets_dir: String,
}

impl ManifestSummary {
    pub fn from_node(node: &ManifestNode) -> Self {
        let constants = node.constants();
        ManifestSummary {
            manifest_file: node.manifest_file().display().to_string(),
            res_dir: node.res_dir().display().to_string(),
            assets_dir: node.assets_dir().display().to_string(),
            package_name: node.package_name().map(str::to_string),
            target_sdk_version: node.target_sdk_version(),
            constants: constants
                .and_then(|c| c.source.as_ref())
                .map(|p| p.display().to_string()),
            resource_count: constants.map_or(0, |c| c.len()),
            libraries: node.libraries().iter().map(Self::from_node).collect(),
        }
    }
}

impl ResourcePathSummary {
    pub fn from_path(path: &ResourcePath<'_>) -> Self {
        ResourcePathSummary {
            package_name: path.package_name.map(str::to_string),
            res_dir: path.res_dir.display().to_string(),
            assets_dir: path.assets_dir.display().to_string(),
        }
    }
}
