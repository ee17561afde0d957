/// Manifest Resolver
///
/// Locates a test module's manifest, resource and asset directories under
/// whichever build system produced them, flattens its library graph and
/// reconciles the resource ids each library assigned independently.
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod factory;
pub mod logging;
pub mod manifest;
pub mod output;
pub mod resources;

pub use config::{BuildConfiguration, Environment};
pub use context::ResolutionContext;
pub use error::{Error, Result};
pub use factory::{select, ManifestFactory};
pub use manifest::ManifestNode;
pub use resources::ResourceIdReconciler;
