use crate::tools::{Sensitivity, Tool, ToolError, ToolResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::process::Stdio;
use tokio::process::Command;

fn app_name(arguments: &Value) -> ToolResult<&str> {
    arguments["app_name"]
        .as_str()
        .or_else(|| arguments["name"].as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ToolError::InvalidArguments("Missing 'app_name' argument".to_string()))
}

/// Desktop applications `open_application` may launch unless configured
/// otherwise
pub const DEFAULT_ALLOWED_APPS: &[&str] = &[
    "notepad",
    "calc",
    "gedit",
    "gnome-calculator",
    "firefox",
    "chrome",
    "google-chrome",
    "code",
    "spotify",
    "discord",
];

/// Launches a desktop application by name.
///
/// Only names on the allow-list may be launched; an empty list launches
/// nothing.
pub struct OpenApplicationTool {
    allowed_apps: Vec<String>,
}

impl OpenApplicationTool {
    pub fn new(allowed_apps: Vec<String>) -> Self {
        Self { allowed_apps }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_ALLOWED_APPS.iter().map(|a| a.to_string()).collect())
    }

    pub fn is_allowed(&self, app: &str) -> bool {
        self.allowed_apps.iter().any(|a| a.eq_ignore_ascii_case(app))
    }
}

#[async_trait]
impl Tool for OpenApplicationTool {
    fn name(&self) -> String {
        "open_application".to_string()
    }

    fn description(&self) -> String {
        "Open an application by name".to_string()
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "app_name": {
                    "type": "string",
                    "description": "Executable or application name, e.g. notepad"
                }
            },
            "required": ["app_name"]
        })
    }

    async fn call(&self, arguments: Value) -> ToolResult<Value> {
        let app = app_name(&arguments)?;

        if !self.is_allowed(app) {
            return Err(ToolError::PermissionDenied(format!(
                "Application '{}' is not on the allow-list",
                app
            )));
        }

        let child = Command::new(app)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ToolError::ExecutionFailed(format!("Failed to launch {}: {}", app, e)))?;

        Ok(json!({
            "message": format!("Opened {}", app),
            "pid": child.id()
        }))
    }
}

/// Terminates running processes that match an application name.
pub struct CloseApplicationTool;

#[async_trait]
impl Tool for CloseApplicationTool {
    fn name(&self) -> String {
        "close_application".to_string()
    }

    fn description(&self) -> String {
        "Close a running application by name".to_string()
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "app_name": {
                    "type": "string",
                    "description": "Process name to close"
                }
            },
            "required": ["app_name"]
        })
    }

    fn sensitivity(&self) -> Sensitivity {
        Sensitivity::Sensitive
    }

    async fn call(&self, arguments: Value) -> ToolResult<Value> {
        let app = app_name(&arguments)?;

        let output = Command::new("pkill")
            .arg("-x")
            .arg(app)
            .output()
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("Failed to run pkill: {}", e)))?;

        // pkill exits 1 when nothing matched
        match output.status.code() {
            Some(0) => Ok(json!({ "message": format!("Closed {}", app) })),
            Some(1) => Err(ToolError::NotFound(format!("{} is not running", app))),
            _ => Err(ToolError::ExecutionFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            )),
        }
    }
}
