use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tt_domain::tool::ToolDefinition;

use crate::error::ToolError;

/// A callable tool exposed to the agent loop.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// The definition advertised to the LLM.
    fn definition(&self) -> ToolDefinition;

    /// Execute with already-parsed JSON arguments. Implementations validate
    /// by deserializing into their typed request struct.
    async fn invoke(&self, arguments: &Value) -> Result<Value, ToolError>;
}

/// Registry of all available tools, keyed by tool name.
///
/// Agents bind to a (possibly empty) subset of the registry by name; a tool
/// outside an agent's subset is invisible to that agent's model.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.definition().name;
        if self.tools.insert(name.clone(), tool).is_some() {
            tracing::warn!(tool = %name, "tool registered twice, replacing");
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Definitions for the named subset, skipping unknown names.
    pub fn definitions_for(&self, names: &[String]) -> Vec<ToolDefinition> {
        names
            .iter()
            .filter_map(|n| self.tools.get(n))
            .map(|t| t.definition())
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }
}
