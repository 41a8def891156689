use crate::memory::MemoryStore;
use crate::tools::{Sensitivity, Tool, ToolError, ToolResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

/// Erases every stored memory. Sensitive, so the gate asks first.
pub struct ClearMemoryTool {
    store: Arc<dyn MemoryStore>,
}

impl ClearMemoryTool {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ClearMemoryTool {
    fn name(&self) -> String {
        "clear_memory".into()
    }

    fn description(&self) -> String {
        "Forget everything the assistant has remembered".into()
    }

    fn parameters(&self) -> Value {
        json!({"type": "object", "properties": {}, "required": []})
    }

    fn sensitivity(&self) -> Sensitivity {
        Sensitivity::Sensitive
    }

    async fn call(&self, _arguments: Value) -> ToolResult<Value> {
        let removed = self
            .store
            .clear()
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        Ok(json!({
            "message": format!("Forgot {} memories", removed),
            "removed": removed
        }))
    }
}
