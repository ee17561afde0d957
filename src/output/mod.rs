mod formatter;
mod summary;

pub use formatter::{OutputFormatter, ResolutionOutput};
pub use summary::{ManifestSummary, ResourcePathSummary};
