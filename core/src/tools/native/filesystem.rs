use crate::tools::{Sensitivity, Tool, ToolError, ToolResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Sandbox shared by the file tools. Every path argument is relative to
/// `root` and may not climb out of it.
#[derive(Debug, Clone)]
struct Workspace {
    root: PathBuf,
}

impl Workspace {
    fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn resolve(&self, relative: &str) -> ToolResult<PathBuf> {
        let candidate = Path::new(relative);
        let escapes = candidate
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
        if escapes {
            return Err(ToolError::PermissionDenied(format!(
                "'{}' is outside the workspace",
                relative
            )));
        }
        Ok(self.root.join(candidate))
    }

    /// Resolve and require that something exists there
    fn existing(&self, relative: &str) -> ToolResult<PathBuf> {
        let path = self.resolve(relative)?;
        if path.exists() {
            Ok(path)
        } else {
            Err(ToolError::NotFound(format!("No such path: {}", relative)))
        }
    }
}

fn str_arg<'a>(arguments: &'a Value, key: &str) -> ToolResult<&'a str> {
    arguments[key]
        .as_str()
        .ok_or_else(|| ToolError::InvalidArguments(format!("'{}' must be a string", key)))
}

fn io_failure(what: &'static str) -> impl Fn(std::io::Error) -> ToolError {
    move |e| ToolError::ExecutionFailed(format!("{}: {}", what, e))
}

/// JSON schema with string properties; `required` lists the mandatory ones
fn string_params(props: &[(&str, &str)], required: &[&str]) -> Value {
    let properties: serde_json::Map<String, Value> = props
        .iter()
        .map(|(name, desc)| {
            (
                name.to_string(),
                json!({"type": "string", "description": desc}),
            )
        })
        .collect();
    json!({"type": "object", "properties": properties, "required": required})
}

// read_file

pub struct ReadFileTool {
    workspace: Workspace,
}

impl ReadFileTool {
    pub fn new(workspace_root: PathBuf) -> Self {
        Self {
            workspace: Workspace::new(workspace_root),
        }
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> String {
        "read_file".into()
    }

    fn description(&self) -> String {
        "Read a text file from the workspace".into()
    }

    fn parameters(&self) -> Value {
        string_params(&[("path", "File path relative to the workspace")], &["path"])
    }

    async fn call(&self, arguments: Value) -> ToolResult<Value> {
        let relative = str_arg(&arguments, "path")?;
        let path = self.workspace.existing(relative)?;
        let content = fs::read_to_string(&path)
            .await
            .map_err(io_failure("could not read file"))?;

        Ok(json!({
            "message": format!("Read {} ({} bytes)", relative, content.len()),
            "path": relative,
            "content": content
        }))
    }
}

// write_file

pub struct WriteFileTool {
    workspace: Workspace,
}

impl WriteFileTool {
    pub fn new(workspace_root: PathBuf) -> Self {
        Self {
            workspace: Workspace::new(workspace_root),
        }
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> String {
        "write_file".into()
    }

    fn description(&self) -> String {
        "Save text to a file in the workspace, creating folders as needed".into()
    }

    fn parameters(&self) -> Value {
        string_params(
            &[
                ("path", "File path relative to the workspace"),
                ("content", "Text to save"),
            ],
            &["path", "content"],
        )
    }

    async fn call(&self, arguments: Value) -> ToolResult<Value> {
        let relative = str_arg(&arguments, "path")?;
        let content = str_arg(&arguments, "content")?;
        let path = self.workspace.resolve(relative)?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .await
                .map_err(io_failure("could not create folders"))?;
        }
        fs::write(&path, content)
            .await
            .map_err(io_failure("could not write file"))?;

        Ok(json!({
            "message": format!("Wrote {} bytes to {}", content.len(), relative),
            "path": relative,
            "bytes_written": content.len()
        }))
    }
}

// list_directory

pub struct ListDirTool {
    workspace: Workspace,
}

impl ListDirTool {
    pub fn new(workspace_root: PathBuf) -> Self {
        Self {
            workspace: Workspace::new(workspace_root),
        }
    }
}

#[async_trait]
impl Tool for ListDirTool {
    fn name(&self) -> String {
        "list_directory".into()
    }

    fn description(&self) -> String {
        "Show the files and folders inside a workspace folder".into()
    }

    fn parameters(&self) -> Value {
        string_params(
            &[("path", "Folder relative to the workspace; omit for the top level")],
            &[],
        )
    }

    async fn call(&self, arguments: Value) -> ToolResult<Value> {
        let relative = arguments["path"].as_str().unwrap_or(".");
        let dir = self.workspace.existing(relative)?;
        if !dir.is_dir() {
            return Err(ToolError::InvalidArguments(format!(
                "{} is not a folder",
                relative
            )));
        }

        let mut reader = fs::read_dir(&dir)
            .await
            .map_err(io_failure("could not open folder"))?;
        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(io_failure("could not read folder entry"))?
        {
            let meta = entry.metadata().await.ok();
            entries.push((
                entry.file_name().to_string_lossy().into_owned(),
                meta.as_ref().is_some_and(|m| m.is_dir()),
                meta.as_ref().map_or(0, |m| m.len()),
            ));
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let names: Vec<&str> = entries.iter().map(|(n, _, _)| n.as_str()).collect();
        Ok(json!({
            "message": if names.is_empty() {
                format!("{} is empty", relative)
            } else {
                format!("{} contains: {}", relative, names.join(", "))
            },
            "path": relative,
            "entries": entries
                .iter()
                .map(|(name, is_dir, size)| json!({"name": name, "is_dir": is_dir, "size": size}))
                .collect::<Vec<_>>()
        }))
    }
}

// delete_file

pub struct DeleteFileTool {
    workspace: Workspace,
}

impl DeleteFileTool {
    pub fn new(workspace_root: PathBuf) -> Self {
        Self {
            workspace: Workspace::new(workspace_root),
        }
    }
}

#[async_trait]
impl Tool for DeleteFileTool {
    fn name(&self) -> String {
        "delete_file".into()
    }

    fn description(&self) -> String {
        "Remove a file or an empty folder from the workspace".into()
    }

    fn parameters(&self) -> Value {
        string_params(&[("path", "Path relative to the workspace")], &["path"])
    }

    fn sensitivity(&self) -> Sensitivity {
        Sensitivity::Sensitive
    }

    async fn call(&self, arguments: Value) -> ToolResult<Value> {
        let relative = str_arg(&arguments, "path")?;
        let path = self.workspace.existing(relative)?;

        let was_directory = path.is_dir();
        if was_directory {
            fs::remove_dir(&path)
                .await
                .map_err(io_failure("could not remove folder"))?;
        } else {
            fs::remove_file(&path)
                .await
                .map_err(io_failure("could not remove file"))?;
        }

        Ok(json!({
            "message": format!("Deleted {}", relative),
            "path": relative,
            "was_directory": was_directory
        }))
    }
}
