use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("malformed symbol at {}:{line}: {message}", .path.display())]
pub struct SymbolTableError {
    pub path: PathBuf,
    pub line: usize,
    pub message: String,
}

impl SymbolTableError {
    pub fn new(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            line,
            message: message.into(),
        }
    }
}
