//! File-based configuration (YAML)
//!
//! User-level `<config dir>/tinyagent/config.yaml` and workspace-level
//! `.tinyagent/config.yaml`. Later layers override earlier ones key by key.

use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::Value;

use super::error::{ConfigError, ConfigResult};
use super::settings::AgentConfig;

/// Config level (user or workspace)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLevel {
    /// User-level config (~/.config/tinyagent/config.yaml)
    User,
    /// Workspace-level config (.tinyagent/config.yaml in workspace root)
    Workspace,
}

impl ConfigLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigLevel::User => "user",
            ConfigLevel::Workspace => "workspace",
        }
    }
}

/// Reads and writes one configuration file
///
/// # Example
///
/// ```no_run
/// use tinyagent_core::config::{load_layered, ConfigLoader};
///
/// let config = load_layered(&[
///     ConfigLoader::user(),
///     ConfigLoader::workspace("/path/to/workspace"),
/// ])?;
/// # Ok::<(), tinyagent_core::config::ConfigError>(())
/// ```
pub struct ConfigLoader {
    path: PathBuf,
    level: ConfigLevel,
}

impl ConfigLoader {
    /// Create a loader for a specific path
    pub fn new(path: impl Into<PathBuf>, level: ConfigLevel) -> Self {
        Self {
            path: path.into(),
            level,
        }
    }

    /// User-level config (~/.config/tinyagent/config.yaml)
    pub fn user() -> Self {
        // XDG config directory on Linux, ~/Library/Application Support on macOS
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
        Self::new(config_dir.join("tinyagent").join("config.yaml"), ConfigLevel::User)
    }

    /// Workspace-level config (.tinyagent/config.yaml)
    pub fn workspace(workspace_root: impl AsRef<Path>) -> Self {
        let path = workspace_root.as_ref().join(".tinyagent").join("config.yaml");
        Self::new(path, ConfigLevel::Workspace)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn level(&self) -> ConfigLevel {
        self.level
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Raw YAML document, `None` when the file does not exist
    pub fn load_value(&self) -> ConfigResult<Option<Value>> {
        if !self.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        let value: Value = serde_yaml::from_str(&content)?;
        match value {
            Value::Mapping(_) => Ok(Some(value)),
            Value::Null => Ok(None),
            _ => Err(ConfigError::Invalid(format!(
                "{} must contain a YAML mapping",
                self.path.display()
            ))),
        }
    }

    /// Load this file alone, defaults filling the gaps
    pub fn load(&self) -> ConfigResult<AgentConfig> {
        match self.load_value()? {
            Some(value) => Ok(serde_yaml::from_value(value)?),
            None => Ok(AgentConfig::default()),
        }
    }

    /// Write a config to this file, creating parent directories
    pub fn save(&self, config: &AgentConfig) -> ConfigResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(config)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    /// Copy the current file next to itself, returns the backup path
    pub fn backup(&self) -> ConfigResult<Option<PathBuf>> {
        if !self.exists() {
            return Ok(None);
        }
        let backup_path = self.path.with_extension("yaml.backup");
        fs::copy(&self.path, &backup_path)?;
        Ok(Some(backup_path))
    }
}

impl std::fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigLoader")
            .field("path", &self.path)
            .field("level", &self.level)
            .field("exists", &self.exists())
            .finish()
    }
}

/// Merge `overlay` into `base`: mappings merge recursively, anything else replaces
fn merge_yaml(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_yaml(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Load and merge several config files in order, then validate
pub fn load_layered(loaders: &[ConfigLoader]) -> ConfigResult<AgentConfig> {
    let mut merged = Value::Mapping(Default::default());
    for loader in loaders {
        if let Some(value) = loader.load_value()? {
            merge_yaml(&mut merged, value);
        }
    }
    let config: AgentConfig = serde_yaml::from_value(merged)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let loader = ConfigLoader::new(dir.path().join("config.yaml"), ConfigLevel::User);
        assert!(!loader.exists());
        assert_eq!(loader.load().unwrap(), AgentConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let loader = ConfigLoader::new(dir.path().join("nested").join("config.yaml"), ConfigLevel::User);

        let mut config = AgentConfig::default();
        config.model.model = "openai/gpt-4o".to_string();
        config.session.parallel_tools = true;
        loader.save(&config).unwrap();

        assert!(loader.exists());
        assert_eq!(loader.load().unwrap(), config);
    }

    #[test]
    fn test_workspace_overrides_user() {
        let dir = tempdir().unwrap();
        let user_path = dir.path().join("user.yaml");
        fs::write(
            &user_path,
            "model:\n  provider: openai\n  model: gpt-4o\n  temperature: 0.2\nsession:\n  max_tool_rounds: 5\n",
        )
        .unwrap();
        let workspace = ConfigLoader::workspace(dir.path());
        fs::create_dir_all(workspace.path().parent().unwrap()).unwrap();
        fs::write(workspace.path(), "model:\n  model: gpt-4o-mini\ntools:\n  exclude: [run_command]\n").unwrap();

        let config = load_layered(&[ConfigLoader::new(&user_path, ConfigLevel::User), workspace]).unwrap();

        assert_eq!(config.model.provider, "openai");
        assert_eq!(config.model.model, "gpt-4o-mini");
        assert_eq!(config.model.temperature, Some(0.2));
        assert_eq!(config.session.max_tool_rounds, 5);
        assert_eq!(config.tools.exclude, vec!["run_command".to_string()]);
        // Untouched sections keep their defaults
        assert_eq!(config.tools.shell_timeout_secs, 60);
    }

    #[test]
    fn test_layered_validation_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "session:\n  max_tool_rounds: 0\n").unwrap();

        let result = load_layered(&[ConfigLoader::new(&path, ConfigLevel::User)]);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_non_mapping_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "- just\n- a list\n").unwrap();

        let loader = ConfigLoader::new(&path, ConfigLevel::Workspace);
        assert!(matches!(loader.load_value(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_backup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let loader = ConfigLoader::new(&path, ConfigLevel::User);

        assert!(loader.backup().unwrap().is_none());

        fs::write(&path, "model: {}").unwrap();
        let backup_path = loader.backup().unwrap().unwrap();
        assert!(backup_path.exists());
        assert!(backup_path.to_string_lossy().contains("backup"));
    }
}
