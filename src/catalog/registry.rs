//! Tool catalog
//!
//! The pipeline only needs `lookup` and `list_all`. `ToolRegistry` is the
//! in-memory implementation, optionally loaded from / saved to a JSON file
//! holding an array of tool records.

use crate::catalog::types::{ToolDefinition, ToolSummary};
use crate::errors::{FlowError, Result};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// Read-only tool lookup used by the dispatcher and the planner
pub trait ToolCatalog: Send + Sync {
    /// Resolve a tool by name; `None` means not found
    fn lookup(&self, name: &str) -> Option<ToolDefinition>;

    /// Every tool the catalog knows
    fn list_all(&self) -> Vec<ToolDefinition>;

    /// Planner-facing snapshot of the catalog
    fn summaries(&self) -> Vec<ToolSummary> {
        self.list_all().iter().map(ToolDefinition::summary).collect()
    }

    fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }
}

/// In-memory tool registry
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    /// Map of tool name to definition
    tools: BTreeMap<String, ToolDefinition>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from definitions; later duplicates are ignored
    pub fn from_tools(tools: impl IntoIterator<Item = ToolDefinition>) -> Self {
        let mut registry = Self::new();
        for tool in tools {
            registry.register(tool);
        }
        registry
    }

    /// Register a tool. Returns false if the name is already taken.
    pub fn register(&mut self, tool: ToolDefinition) -> bool {
        if self.tools.contains_key(tool.name()) {
            warn!(tool = tool.name(), "tool already registered");
            return false;
        }
        self.tools.insert(tool.name().to_string(), tool);
        true
    }

    /// Load tools from a JSON file. A missing file yields an empty registry.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "no tool catalog file found");
            return Ok(Self::new());
        }

        let contents = std::fs::read_to_string(path)?;
        let tools: Vec<ToolDefinition> = serde_json::from_str(&contents).map_err(|e| {
            FlowError::Catalog(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        let registry = Self::from_tools(tools);
        info!(count = registry.len(), path = %path.display(), "loaded tool catalog");
        Ok(registry)
    }

    /// Save tools to a JSON file, creating parent directories
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tools: Vec<&ToolDefinition> = self.tools.values().collect();
        let contents = serde_json::to_string_pretty(&tools)?;
        std::fs::write(path, contents)?;
        info!(count = self.len(), path = %path.display(), "saved tool catalog");
        Ok(())
    }

    /// Get tool definition by name
    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    /// Get all tool names in sorted order
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl ToolCatalog for ToolRegistry {
    fn lookup(&self, name: &str) -> Option<ToolDefinition> {
        self.tools.get(name).cloned()
    }

    fn list_all(&self) -> Vec<ToolDefinition> {
        self.tools.values().cloned().collect()
    }

    fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }
}
