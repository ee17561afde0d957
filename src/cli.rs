use anyhow::{Context as AnyhowContext, Result};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

use crate::config::BuildConfiguration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "manifest-resolve")]
#[command(about = "Resolve a test module's manifest, library graph and resource ids", long_about = None)]
pub struct Args {
    /// Module directory; manifest and library paths resolve against it
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub module: PathBuf,

    /// Properties file with module configuration (sdk, manifest, libraries, ...)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Manifest path, or --none for platform resources only
    #[arg(long, value_name = "PATH", allow_hyphen_values = true)]
    pub manifest: Option<String>,

    /// Sdk level. Can be specified multiple times.
    #[arg(long, value_name = "LEVEL")]
    pub sdk: Vec<u32>,

    /// Package name override
    #[arg(long, value_name = "NAME")]
    pub package_name: Option<String>,

    /// Output format (text, json)
    #[arg(short = 'f', long, default_value = "text")]
    pub format: OutputFormat,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Test runner arguments, e.g. --strict_libraries manifest:archive
    #[arg(last = true, value_name = "RUNNER_ARGS")]
    pub runner_args: Vec<String>,
}

impl Args {
    pub fn validate(&self) -> Result<()> {
        validate_dir(&self.module)?;
        if let Some(ref config_path) = self.config {
            if !config_path.is_file() {
                anyhow::bail!("Config file does not exist: {}", config_path.display());
            }
        }
        Ok(())
    }

    /// The config file, if any, with command-line flags layered on top.
    pub fn build_configuration(&self) -> Result<BuildConfiguration> {
        let base = match &self.config {
            Some(path) => BuildConfiguration::load(path)
                .with_context(|| format!("Cannot load config: {}", path.display()))?,
            None => BuildConfiguration::default(),
        };

        let mut overlay = BuildConfiguration {
            sdk: self.sdk.clone(),
            ..BuildConfiguration::default()
        };
        if let Some(manifest) = &self.manifest {
            overlay.manifest = manifest.clone();
        }
        if let Some(package_name) = &self.package_name {
            overlay.package_name = package_name.clone();
        }
        Ok(BuildConfiguration::merge(&base, &overlay))
    }
}

pub fn validate_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("Module directory does not exist: {}", path.display());
    }
    if !path.is_dir() {
        anyhow::bail!("Module path is not a directory: {}", path.display());
    }
    std::fs::read_dir(path)
        .with_context(|| format!("Cannot read directory: {}", path.display()))?;
    Ok(())
}
