use super::call::ActionResult;
use super::error::{ToolError, ToolResult};
use super::traits::{Sensitivity, Tool, ToolDispatcher};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Registry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Per-invocation timeout in milliseconds
    pub tool_timeout_ms: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            tool_timeout_ms: 30_000,
        }
    }
}

/// Name and required parameters of a registered tool, used by the parser
/// to recognise loose calls and to map positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSignature {
    pub name: String,
    pub required: Vec<String>,
}

/// Static registry of available tools, populated at process start
#[derive(Clone)]
pub struct ToolRegistry {
    tools: Arc<DashMap<String, Arc<dyn Tool>>>,
    config: RegistryConfig,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            tools: Arc::new(DashMap::new()),
            config,
        }
    }

    /// Register a new tool, replacing any tool with the same name
    pub fn register(&self, tool: Arc<dyn Tool>) {
        let name = tool.name();
        info!(target: "tool_registry", tool = %name, sensitivity = ?tool.sensitivity(), "Registering tool");
        if self.tools.insert(name.clone(), tool).is_some() {
            warn!(target: "tool_registry", tool = %name, "Replaced previously registered tool");
        }
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).map(|t| t.clone())
    }

    /// List all registered tools, sorted by name
    pub fn list_tools(&self) -> Vec<Arc<dyn Tool>> {
        let mut tools: Vec<Arc<dyn Tool>> = self.tools.iter().map(|t| t.clone()).collect();
        tools.sort_by_key(|t| t.name());
        tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Signatures of every registered tool
    pub fn signatures(&self) -> Vec<ToolSignature> {
        self.list_tools()
            .into_iter()
            .map(|t| ToolSignature {
                name: t.name(),
                required: t.required(),
            })
            .collect()
    }

    /// Names of tools tagged as sensitive
    pub fn sensitive_tools(&self) -> Vec<String> {
        self.list_tools()
            .into_iter()
            .filter(|t| t.sensitivity() == Sensitivity::Sensitive)
            .map(|t| t.name())
            .collect()
    }

    /// Tool listing for the system prompt: `- name(required...): description`
    pub fn describe(&self) -> String {
        self.list_tools()
            .into_iter()
            .map(|t| format!("- {}({}): {}", t.name(), t.required().join(", "), t.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Function-calling schemas for backends with native tool support
    pub fn function_schemas(&self) -> Vec<serde_json::Value> {
        self.list_tools()
            .into_iter()
            .map(|t| crate::llm::function_schema(&t.name(), &t.description(), &t.parameters()))
            .collect()
    }

    /// Call a tool by name with timeout
    #[tracing::instrument(skip(self, arguments), fields(tool.name = %name))]
    pub async fn call(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> ToolResult<serde_json::Value> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        debug!(target: "tool_registry", tool = %name, "Invoking tool");

        let timeout_duration = Duration::from_millis(self.config.tool_timeout_ms);
        let result = match timeout(timeout_duration, tool.call(arguments)).await {
            Ok(res) => res,
            Err(_) => {
                warn!(target: "tool_registry", tool = %name, "Tool execution timed out");
                Err(ToolError::Timeout)
            }
        };

        if let Err(e) = &result {
            warn!(target: "tool_registry", tool = %name, error = %e, "Tool execution failed");
        }

        result
    }
}

#[async_trait]
impl ToolDispatcher for ToolRegistry {
    async fn dispatch(&self, name: &str, arguments: serde_json::Value) -> ActionResult {
        let started = Instant::now();
        let result = self.call(name, arguments).await;
        let latency_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(payload) => ActionResult::ok(name, payload, latency_ms),
            Err(e) => ActionResult::error(name, e.to_string(), latency_ms),
        }
    }
}
