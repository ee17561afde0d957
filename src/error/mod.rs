mod config;
mod dependency;
mod io;
mod symbols;

pub use config::ConfigurationError;
pub use dependency::{MissingDependencyError, UnknownLabelError};
pub use io::IoError;
pub use symbols::SymbolTableError;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    MissingDependency(#[from] MissingDependencyError),

    #[error(transparent)]
    UnknownLabel(#[from] UnknownLabelError),

    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    SymbolTable(#[from] SymbolTableError),
}

pub type Result<T> = std::result::Result<T, Error>;
