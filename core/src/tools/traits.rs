use super::call::ActionResult;
use super::error::ToolResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Whether a tool may run without explicit user approval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    #[default]
    Safe,
    Sensitive,
}

/// The core trait for all tools
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of the tool (e.g., "open_application")
    fn name(&self) -> String;

    /// A human-readable description of what the tool does
    fn description(&self) -> String;

    /// The JSON Schema for the tool's arguments
    fn parameters(&self) -> Value;

    /// Sensitivity tag consulted by the confirmation gate
    fn sensitivity(&self) -> Sensitivity {
        Sensitivity::Safe
    }

    /// Names of required parameters, read from the schema
    fn required(&self) -> Vec<String> {
        self.parameters()
            .get("required")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(|n| n.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Execute the tool with the given arguments
    async fn call(&self, arguments: Value) -> ToolResult<Value>;
}

/// Boundary between the cognitive loop and the tool layer.
///
/// Dispatch never fails: unknown tools and execution errors come back as
/// `ActionResult` with `ActionStatus::Error`.
#[async_trait]
pub trait ToolDispatcher: Send + Sync {
    async fn dispatch(&self, name: &str, arguments: Value) -> ActionResult;
}
