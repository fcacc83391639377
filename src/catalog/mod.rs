//! Tool catalog
//!
//! Read-only lookup of tool definitions by name, plus a JSON-file backed
//! in-memory registry.

pub mod types;
pub mod registry;

// Re-export commonly used types
pub use types::{ExecutionKind, ToolDefinition, ToolRecord, ToolSummary, ToolTarget};
pub use registry::{ToolCatalog, ToolRegistry};
