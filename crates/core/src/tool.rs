//! Capability trait and the name-keyed registry exposed to the model.

use crate::types::ToolDefinition;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error("access denied: {0}")]
    AccessDenied(String),
    #[error("invalid patch format: {0}")]
    PatchMalformed(String),
    #[error("{0}. The file may have been modified since you read it; re-read it and regenerate the patch")]
    PatchConflict(String),
    #[error("failed to create snapshot, aborting before any change: {0}")]
    Snapshot(String),
    #[error("{0}")]
    Execution(String),
}

/// A discrete capability: a schema for the model and an executable body.
/// Executions are stateless with respect to sibling calls in the same turn.
#[async_trait]
pub trait Tool: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    async fn execute(&self, args: serde_json::Value) -> Result<String, ToolError>;
}

/// Name → capability table, populated once at startup. Lookups are exact.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.definition().name, tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|tool| tool.definition()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
