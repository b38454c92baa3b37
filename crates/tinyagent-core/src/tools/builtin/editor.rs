//! Text editor tool: view, create, replace, insert and undo.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::fs;

use crate::tools::handler::{
    opt_i64_arg, opt_str_arg, str_arg, HandlerError, HandlerResult, ToolArgs, ToolHandler,
};
use crate::types::{ParamKind, ParamSpec, ToolSpec};

use super::{resolve_path, truncate_output, MAX_OUTPUT_CHARS};

/// View and edit text files in the workspace.
///
/// The content of a file before its first edit is kept until `undo_edit`
/// restores it, so one undo reverts every edit since the previous undo.
pub struct StrReplaceEditor {
    root: PathBuf,
    backups: Mutex<HashMap<PathBuf, String>>,
}

impl StrReplaceEditor {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            backups: Mutex::new(HashMap::new()),
        }
    }

    pub fn spec() -> ToolSpec {
        ToolSpec::new(
            "str_replace_editor",
            "View and modify text files. Commands: view (path, optional view_range [start, end], end -1 for EOF), \
             create (path, file_text), str_replace (path, old_str, new_str; old_str must match exactly once), \
             insert (path, insert_line, new_str; 1-based line), undo_edit (path). Always view a file before editing it.",
        )
        .with_param(ParamSpec::required(
            "command",
            ParamKind::String,
            "One of: view, create, str_replace, insert, undo_edit",
        ))
        .with_param(ParamSpec::required("path", ParamKind::String, "File path"))
        .with_param(ParamSpec::optional(
            "view_range",
            ParamKind::Array,
            "Lines to show as [start, end], 1-based, end -1 means end of file",
        ))
        .with_param(ParamSpec::optional("file_text", ParamKind::String, "Content for create"))
        .with_param(ParamSpec::optional("old_str", ParamKind::String, "Exact text to replace"))
        .with_param(ParamSpec::optional("new_str", ParamKind::String, "Replacement or inserted text"))
        .with_param(ParamSpec::optional(
            "insert_line",
            ParamKind::Integer,
            "Line number the new text is inserted at",
        ))
    }

    fn backup(&self, path: &Path, content: &str) {
        self.backups
            .lock()
            .entry(path.to_path_buf())
            .or_insert_with(|| content.to_string());
    }

    async fn read_existing(&self, path: &Path, shown: &str) -> Result<String, HandlerError> {
        if !path.exists() {
            return Err(HandlerError::failed(format!("File not found: {}", shown)));
        }
        if path.is_dir() {
            return Err(HandlerError::invalid(
                "path",
                format!("{} is a directory, use list_files", shown),
            ));
        }
        Ok(fs::read_to_string(path).await?)
    }

    async fn view(&self, path: &Path, shown: &str, range: Option<&Value>) -> HandlerResult {
        let content = self.read_existing(path, shown).await?;
        let lines: Vec<&str> = content.split_inclusive('\n').collect();

        let (start, end) = match range {
            None => (1, lines.len()),
            Some(value) => parse_view_range(value, lines.len())?,
        };

        let mut out = String::new();
        for (offset, line) in lines.iter().skip(start - 1).take(end.saturating_sub(start - 1)).enumerate() {
            out.push_str(&format!("{}: {}", start + offset, line));
        }
        Ok(truncate_output(out, MAX_OUTPUT_CHARS))
    }

    async fn create(&self, path: &Path, shown: &str, text: &str) -> HandlerResult {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        if path.exists() {
            return Err(HandlerError::failed(format!("File already exists: {}", shown)));
        }
        fs::write(path, text).await?;
        Ok(format!("Successfully created file: {}", shown))
    }

    async fn str_replace(&self, path: &Path, shown: &str, old: &str, new: &str) -> HandlerResult {
        if old.is_empty() {
            return Err(HandlerError::invalid("old_str", "must not be empty"));
        }
        let content = self.read_existing(path, shown).await?;
        match content.matches(old).count() {
            0 => return Err(HandlerError::failed(format!("Text not found in {}", shown))),
            1 => {}
            n => {
                return Err(HandlerError::failed(format!(
                    "Multiple matches ({}) found in {}",
                    n, shown
                )))
            }
        }
        self.backup(path, &content);
        fs::write(path, content.replacen(old, new, 1)).await?;
        Ok("Successfully replaced text at exactly one location.".to_string())
    }

    async fn insert(&self, path: &Path, shown: &str, line: i64, text: &str) -> HandlerResult {
        let content = self.read_existing(path, shown).await?;
        let mut lines: Vec<String> = content.split_inclusive('\n').map(str::to_string).collect();

        if line < 1 {
            return Err(HandlerError::invalid("insert_line", "line numbers start at 1"));
        }
        let index = (line - 1) as usize;
        if index >= lines.len() {
            return Err(HandlerError::failed(format!(
                "Line number {} exceeds file length ({})",
                line,
                lines.len()
            )));
        }

        let mut inserted = text.to_string();
        if !inserted.ends_with('\n') {
            inserted.push('\n');
        }
        lines.insert(index, inserted);

        self.backup(path, &content);
        fs::write(path, lines.concat()).await?;
        Ok(format!("Successfully inserted text at line {}.", line))
    }

    async fn undo(&self, path: &Path, shown: &str) -> HandlerResult {
        let previous = self.backups.lock().remove(path);
        match previous {
            Some(content) => {
                fs::write(path, content).await?;
                Ok(format!("Successfully restored {} to previous state.", shown))
            }
            None => Err(HandlerError::failed(format!("No backup found for {}", shown))),
        }
    }
}

/// Parse `[start, end]` into an inclusive 1-based range
fn parse_view_range(value: &Value, line_count: usize) -> Result<(usize, usize), HandlerError> {
    let bad = || HandlerError::invalid("view_range", "expected [start, end] with integer bounds");
    let pair = value.as_array().filter(|a| a.len() == 2).ok_or_else(bad)?;
    let start = pair[0].as_i64().ok_or_else(bad)?;
    let end = pair[1].as_i64().ok_or_else(bad)?;

    if start < 1 {
        return Err(HandlerError::invalid("view_range", "start must be at least 1"));
    }
    let end = if end == -1 { line_count as i64 } else { end };
    if end < start {
        return Err(HandlerError::invalid(
            "view_range",
            format!("end ({}) is before start ({})", end, start),
        ));
    }
    Ok((start as usize, (end as usize).min(line_count)))
}

#[async_trait]
impl ToolHandler for StrReplaceEditor {
    async fn call(&self, args: &ToolArgs) -> HandlerResult {
        let command = str_arg(args, "command")?;
        let shown = str_arg(args, "path")?;
        let path = resolve_path(&self.root, shown);

        match command {
            "view" => self.view(&path, shown, args.get("view_range").filter(|v| !v.is_null())).await,
            "create" => {
                let text = opt_str_arg(args, "file_text").unwrap_or_default();
                self.create(&path, shown, text).await
            }
            "str_replace" => {
                let old = str_arg(args, "old_str")?;
                let new = opt_str_arg(args, "new_str").unwrap_or_default();
                self.str_replace(&path, shown, old, new).await
            }
            "insert" => {
                let line = opt_i64_arg(args, "insert_line")
                    .ok_or_else(|| HandlerError::invalid("insert_line", "required for insert"))?;
                let text = str_arg(args, "new_str")?;
                self.insert(&path, shown, line, text).await
            }
            "undo_edit" => self.undo(&path, shown).await,
            other => Err(HandlerError::invalid("command", format!("unknown command '{}'", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs as stdfs;
    use tempfile::tempdir;

    fn args(value: Value) -> ToolArgs {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_view_with_line_numbers() {
        let dir = tempdir().unwrap();
        stdfs::write(dir.path().join("a.txt"), "one\ntwo\nthree\n").unwrap();
        let editor = StrReplaceEditor::new(dir.path());

        let all = editor.call(&args(json!({ "command": "view", "path": "a.txt" }))).await.unwrap();
        assert_eq!(all, "1: one\n2: two\n3: three\n");

        let tail = editor
            .call(&args(json!({ "command": "view", "path": "a.txt", "view_range": [2, -1] })))
            .await
            .unwrap();
        assert_eq!(tail, "2: two\n3: three\n");

        let err = editor
            .call(&args(json!({ "command": "view", "path": "a.txt", "view_range": [3, 1] })))
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::InvalidArgument { .. }));

        let err = editor.call(&args(json!({ "command": "view", "path": "missing.txt" }))).await.unwrap_err();
        assert_eq!(err.to_string(), "File not found: missing.txt");
    }

    #[tokio::test]
    async fn test_create_refuses_existing() {
        let dir = tempdir().unwrap();
        let editor = StrReplaceEditor::new(dir.path());

        let out = editor
            .call(&args(json!({ "command": "create", "path": "nested/new.txt", "file_text": "hello" })))
            .await
            .unwrap();
        assert_eq!(out, "Successfully created file: nested/new.txt");
        assert_eq!(stdfs::read_to_string(dir.path().join("nested/new.txt")).unwrap(), "hello");

        let err = editor
            .call(&args(json!({ "command": "create", "path": "nested/new.txt", "file_text": "again" })))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn test_str_replace_requires_single_match() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("code.rs");
        stdfs::write(&file, "let a = 1;\nlet b = 1;\n").unwrap();
        let editor = StrReplaceEditor::new(dir.path());

        let err = editor
            .call(&args(json!({ "command": "str_replace", "path": "code.rs", "old_str": "= 1", "new_str": "= 2" })))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Multiple matches (2) found in code.rs");

        let err = editor
            .call(&args(json!({ "command": "str_replace", "path": "code.rs", "old_str": "let c", "new_str": "" })))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Text not found in code.rs");

        editor
            .call(&args(json!({ "command": "str_replace", "path": "code.rs", "old_str": "let b = 1", "new_str": "let b = 2" })))
            .await
            .unwrap();
        assert_eq!(stdfs::read_to_string(&file).unwrap(), "let a = 1;\nlet b = 2;\n");
    }

    #[tokio::test]
    async fn test_insert_and_undo() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("list.txt");
        stdfs::write(&file, "a\nc\n").unwrap();
        let editor = StrReplaceEditor::new(dir.path());

        editor
            .call(&args(json!({ "command": "insert", "path": "list.txt", "insert_line": 2, "new_str": "b" })))
            .await
            .unwrap();
        assert_eq!(stdfs::read_to_string(&file).unwrap(), "a\nb\nc\n");

        let err = editor
            .call(&args(json!({ "command": "insert", "path": "list.txt", "insert_line": 9, "new_str": "z" })))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Line number 9 exceeds file length (3)");

        editor
            .call(&args(json!({ "command": "str_replace", "path": "list.txt", "old_str": "c", "new_str": "d" })))
            .await
            .unwrap();

        // One undo reverts both edits
        editor.call(&args(json!({ "command": "undo_edit", "path": "list.txt" }))).await.unwrap();
        assert_eq!(stdfs::read_to_string(&file).unwrap(), "a\nc\n");

        let err = editor.call(&args(json!({ "command": "undo_edit", "path": "list.txt" }))).await.unwrap_err();
        assert_eq!(err.to_string(), "No backup found for list.txt");
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let dir = tempdir().unwrap();
        let editor = StrReplaceEditor::new(dir.path());
        let err = editor.call(&args(json!({ "command": "delete", "path": "x" }))).await.unwrap_err();
        assert!(matches!(err, HandlerError::InvalidArgument { .. }));
    }
}
