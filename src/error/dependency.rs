use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MissingDependencyError {
    #[error("{path} does not exist.")]
    Path { path: PathBuf },

    #[error("dependency jar {artifact} not found at {path}")]
    Jar { artifact: String, path: PathBuf },
}

impl MissingDependencyError {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path { path: path.into() }
    }
}

#[derive(Error, Debug)]
#[error("The manifest '{requested}' does not exist in the current test. Available manifests: {known:?}")]
pub struct UnknownLabelError {
    pub requested: String,
    pub known: Vec<String>,
}
