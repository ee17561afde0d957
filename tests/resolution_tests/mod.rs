pub mod archive;
pub mod reconciliation;
pub mod sandboxed;
pub mod selector;
