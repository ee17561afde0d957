use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("failed to read '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to open archive '{path}': {source}")]
    ArchiveError {
        path: PathBuf,
        source: zip::result::ZipError,
    },

    #[error("failed to parse manifest '{path}': {message}")]
    MalformedManifest { path: PathBuf, message: String },

    #[error("archive '{path}' contains an entry outside its root: {entry}")]
    UnsafeEntry { path: PathBuf, entry: String },

    #[error("failed to create extraction directory '{prefix}': {source}")]
    TempDirError {
        prefix: String,
        source: std::io::Error,
    },
}

impl IoError {
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    pub fn write_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::WriteError {
            path: path.into(),
            source,
        }
    }

    pub fn archive_error(path: impl Into<PathBuf>, source: zip::result::ZipError) -> Self {
        Self::ArchiveError {
            path: path.into(),
            source,
        }
    }
}
