//! Built-in workspace tools
//!
//! - `list_files`: directory listing
//! - `str_replace_editor`: view, create and edit text files with undo
//! - `run_command`: shell commands in the workspace

mod list_files;
mod editor;
mod shell;

pub use list_files::ListFiles;
pub use editor::StrReplaceEditor;
pub use shell::RunCommand;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::ToolSettings;

use super::registry::{ToolRegistry, ToolRegistryResult};

/// Longest tool output handed back to the model
pub const MAX_OUTPUT_CHARS: usize = 10_000;

/// Resolve a tool path against the workspace root; absolute paths are kept
pub fn resolve_path(root: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Cut `text` to at most `max` bytes on a char boundary, marking the cut
pub fn truncate_output(mut text: String, max: usize) -> String {
    if text.len() <= max {
        return text;
    }
    let mut cut = max;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
    text.push_str("\n... [output truncated]");
    text
}

/// Register `list_files`, `str_replace_editor` and `run_command`
pub fn register_builtin_tools(registry: &ToolRegistry, settings: &ToolSettings) -> ToolRegistryResult<()> {
    let root = settings.workspace_root();
    registry.register(ListFiles::spec(), Arc::new(ListFiles::new(&root)))?;
    registry.register(StrReplaceEditor::spec(), Arc::new(StrReplaceEditor::new(&root)))?;
    registry.register(
        RunCommand::spec(),
        Arc::new(RunCommand::new(&root, settings.shell_timeout(), registry.logger())),
    )?;
    Ok(())
}
