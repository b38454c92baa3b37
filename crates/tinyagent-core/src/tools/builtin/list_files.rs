//! Directory listing tool.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use walkdir::WalkDir;

use crate::tools::handler::{opt_bool_arg, opt_str_arg, HandlerError, HandlerResult, ToolArgs, ToolHandler};
use crate::types::{ParamKind, ParamSpec, ToolSpec};

use super::resolve_path;

const MAX_ENTRIES: usize = 1000;

/// List the files in a workspace directory.
pub struct ListFiles {
    root: PathBuf,
}

impl ListFiles {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn spec() -> ToolSpec {
        ToolSpec::new(
            "list_files",
            "List files and directories. Directories end with '/'. Paths are relative to the workspace unless absolute.",
        )
        .with_param(ParamSpec::optional(
            "path",
            ParamKind::String,
            "Directory to list (default: workspace root)",
        ))
        .with_param(ParamSpec::optional(
            "recursive",
            ParamKind::Boolean,
            "Descend into subdirectories (default: false)",
        ))
    }
}

fn list_dir(dir: &Path, recursive: bool) -> Result<Vec<String>, HandlerError> {
    let max_depth = if recursive { usize::MAX } else { 1 };
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git");

    let mut entries = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| HandlerError::failed(e.to_string()))?;
        let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
        let mut name = relative.to_string_lossy().replace('\\', "/");
        if entry.file_type().is_dir() {
            name.push('/');
        }
        entries.push(name);
        if entries.len() > MAX_ENTRIES {
            break;
        }
    }
    Ok(entries)
}

#[async_trait]
impl ToolHandler for ListFiles {
    async fn call(&self, args: &ToolArgs) -> HandlerResult {
        let path = opt_str_arg(args, "path").unwrap_or(".");
        let recursive = opt_bool_arg(args, "recursive").unwrap_or(false);
        let dir = resolve_path(&self.root, path);

        if !dir.exists() {
            return Err(HandlerError::failed(format!("Path not found: {}", path)));
        }
        if !dir.is_dir() {
            return Err(HandlerError::invalid("path", format!("{} is not a directory", path)));
        }

        let entries = tokio::task::spawn_blocking(move || list_dir(&dir, recursive))
            .await
            .map_err(|e| HandlerError::failed(format!("listing task failed: {}", e)))??;

        if entries.is_empty() {
            return Ok("(empty directory)".to_string());
        }
        if entries.len() > MAX_ENTRIES {
            let shown = entries[..MAX_ENTRIES].join("\n");
            return Ok(format!("{}\n\n... (showing first {} entries)", shown, MAX_ENTRIES));
        }
        Ok(entries.join("\n"))
    }
}
