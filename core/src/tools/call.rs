//! Tool invocation and result values shared by the parser, gate and dispatcher.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Named arguments of a tool invocation
pub type Arguments = Map<String, Value>;

/// A tool call extracted from a model completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the tool to invoke
    pub name: String,

    /// Arguments keyed by parameter name
    pub arguments: Arguments,

    /// The text span this call was parsed from
    pub raw_source: String,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(name: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            name: name.into(),
            arguments,
            raw_source: String::new(),
        }
    }

    /// Attach the source span
    pub fn with_source(mut self, raw: impl Into<String>) -> Self {
        self.raw_source = raw.into();
        self
    }

    /// Look up a string argument
    pub fn arg_str(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(Value::as_str)
    }

    /// Arguments as a JSON object value
    pub fn arguments_value(&self) -> Value {
        Value::Object(self.arguments.clone())
    }

    /// Compact `name(k="v", ...)` form used in prompts and summaries
    pub fn signature(&self) -> String {
        let args = self
            .arguments
            .iter()
            .map(|(k, v)| match v {
                Value::String(s) => format!("{}=\"{}\"", k, s),
                other => format!("{}={}", k, other),
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}({})", self.name, args)
    }
}

/// Outcome class of a tool action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Ok,
    Error,
    Denied,
    PendingConfirmation,
}

/// Result of routing one tool call through the gate and dispatcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    /// The tool that was called
    pub tool_name: String,

    pub status: ActionStatus,

    /// Tool output when the call succeeded
    pub payload: Option<Value>,

    /// Error or denial detail
    pub detail: Option<String>,

    /// Execution time in milliseconds
    pub latency_ms: u64,
}

impl ActionResult {
    pub fn ok(tool_name: impl Into<String>, payload: Value, latency_ms: u64) -> Self {
        Self {
            tool_name: tool_name.into(),
            status: ActionStatus::Ok,
            payload: Some(payload),
            detail: None,
            latency_ms,
        }
    }

    pub fn error(tool_name: impl Into<String>, detail: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            tool_name: tool_name.into(),
            status: ActionStatus::Error,
            payload: None,
            detail: Some(detail.into()),
            latency_ms,
        }
    }

    pub fn denied(tool_name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            status: ActionStatus::Denied,
            payload: None,
            detail: Some(detail.into()),
            latency_ms: 0,
        }
    }

    pub fn pending(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            status: ActionStatus::PendingConfirmation,
            payload: None,
            detail: None,
            latency_ms: 0,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ActionStatus::Ok
    }

    /// One-line natural language summary for the assistant reply
    pub fn summary(&self) -> String {
        match self.status {
            ActionStatus::Ok => match self.payload.as_ref().and_then(summarize_payload) {
                Some(text) => format!("✓ {}: {}", self.tool_name, text),
                None => format!("✓ {} done", self.tool_name),
            },
            ActionStatus::Error => format!(
                "✗ {} failed: {}",
                self.tool_name,
                self.detail.as_deref().unwrap_or("unknown error")
            ),
            ActionStatus::Denied => format!("Cancelled: {} was not confirmed", self.tool_name),
            ActionStatus::PendingConfirmation => {
                format!("Waiting for confirmation of {}", self.tool_name)
            }
        }
    }
}

fn summarize_payload(payload: &Value) -> Option<String> {
    let text = match payload {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        Value::Object(map) => match map.get("message").or_else(|| map.get("result")) {
            Some(Value::String(s)) => s.clone(),
            _ => payload.to_string(),
        },
        other => other.to_string(),
    };
    Some(truncate(&text, 160))
}

/// Truncate a string to max_len characters, adding ellipsis if needed
pub(crate) fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn signature_renders_string_and_scalar_args() {
        let mut args = Arguments::new();
        args.insert("name".into(), json!("notepad"));
        args.insert("count".into(), json!(2));
        let call = ToolCall::new("open_app", args);
        assert_eq!(call.signature(), r#"open_app(count=2, name="notepad")"#);
    }

    #[test]
    fn summary_prefers_message_field() {
        let result = ActionResult::ok("open_app", json!({"message": "Opened notepad"}), 3);
        assert_eq!(result.summary(), "✓ open_app: Opened notepad");

        let denied = ActionResult::denied("delete_file", "declined");
        assert!(denied.summary().starts_with("Cancelled: delete_file"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo wörld", 5), "héll…");
        assert_eq!(truncate("short", 10), "short");
    }
}
