use crate::tools::{Tool, ToolResult};
use async_trait::async_trait;
use serde_json::{json, Value};

/// Reports the local date and time.
pub struct ClockTool;

#[async_trait]
impl Tool for ClockTool {
    fn name(&self) -> String {
        "get_time".to_string()
    }

    fn description(&self) -> String {
        "Get the current local date and time".to_string()
    }

    fn parameters(&self) -> Value {
        json!({"type": "object", "properties": {}, "required": []})
    }

    async fn call(&self, _arguments: Value) -> ToolResult<Value> {
        let now = chrono::Local::now();
        Ok(json!({
            "message": now.format("%A %d %B %Y, %H:%M").to_string(),
            "rfc3339": now.to_rfc3339()
        }))
    }
}
