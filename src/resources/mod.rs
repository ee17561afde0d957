pub mod reconciler;
pub mod symbols;

pub use reconciler::ResourceIdReconciler;
pub use symbols::{ResourceEntry, ResourceTable, ResourceType, ResourceValue, SYMBOL_FILE_NAME};
