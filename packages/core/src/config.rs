//! Workspace configuration
//!
//! Loaded from a JSON file. Every field has a default so older files
//! missing newer fields still deserialize.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use tokio::fs;

/// Environment variable that overrides the data directory
pub const DATA_DIR_ENV: &str = "CONCEPT_TREE_DATA_DIR";

/// Upper bound for the autosave delay
const MAX_AUTOSAVE_DELAY_MS: u64 = 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Quiet period after the last mutation before the tree is persisted
    pub autosave_delay_ms: u64,

    pub tree_key: String,
    pub view_key: String,
    pub prompts_key: String,

    /// Directory for file-backed storage; `None` means the platform default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Root used when there is no saved tree, or the saved tree is unusable
    pub seed_root_name: String,
    pub seed_root_description: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            autosave_delay_ms: 1000,
            tree_key: "concept-tree".to_string(),
            view_key: "concept-tree-view".to_string(),
            prompts_key: "prompt-templates".to_string(),
            data_dir: None,
            seed_root_name: "Concepts".to_string(),
            seed_root_description: "Start organizing your ideas here".to_string(),
        }
    }
}

impl WorkspaceConfig {
    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }

    /// Data directory to use for file-backed storage
    ///
    /// Order: `CONCEPT_TREE_DATA_DIR`, then `data_dir`, then
    /// `~/.concept-tree`.
    pub fn resolve_data_dir(&self) -> anyhow::Result<PathBuf> {
        if let Ok(env_path) = std::env::var(DATA_DIR_ENV) {
            tracing::info!("Using data directory from {}: {}", DATA_DIR_ENV, env_path);
            return Ok(PathBuf::from(env_path));
        }
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }

        let home_dir = dirs::home_dir().context("Failed to get home directory")?;
        Ok(home_dir.join(".concept-tree"))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.autosave_delay_ms == 0 {
            bail!("autosave_delay_ms must be greater than zero");
        }
        if self.autosave_delay_ms > MAX_AUTOSAVE_DELAY_MS {
            bail!(
                "autosave_delay_ms must be at most {} (one hour)",
                MAX_AUTOSAVE_DELAY_MS
            );
        }

        let mut seen = HashSet::new();
        for (field, key) in [
            ("tree_key", &self.tree_key),
            ("view_key", &self.view_key),
            ("prompts_key", &self.prompts_key),
        ] {
            if key.trim().is_empty() {
                bail!("{} must not be empty", field);
            }
            if !seen.insert(key.as_str()) {
                bail!("{} '{}' is used for more than one value", field, key);
            }
        }

        Ok(())
    }
}

/// Load configuration from `path`, or defaults if the file does not exist
pub async fn load_config(path: &Path) -> anyhow::Result<WorkspaceConfig> {
    if !path.exists() {
        return Ok(WorkspaceConfig::default());
    }

    let contents = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: WorkspaceConfig = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

/// Save configuration to `path` (write to a temp file, then rename)
pub async fn save_config(path: &Path, config: &WorkspaceConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .context("Failed to create config directory")?;
    }

    let serialized = serde_json::to_string_pretty(config).context("Failed to serialize config")?;
    let temp_path = path.with_extension("json.tmp");

    fs::write(&temp_path, serialized)
        .await
        .context("Failed to write config")?;
    fs::rename(&temp_path, path)
        .await
        .context("Failed to save config")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = WorkspaceConfig::default();
        config.validate().unwrap();
        assert_eq!(config.autosave_delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: WorkspaceConfig = serde_json::from_str(r#"{"tree_key": "mine"}"#).unwrap();
        assert_eq!(config.tree_key, "mine");
        assert_eq!(config.view_key, "concept-tree-view");
        assert_eq!(config.autosave_delay_ms, 1000);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero = WorkspaceConfig {
            autosave_delay_ms: 0,
            ..Default::default()
        };
        assert!(zero.validate().is_err());

        let huge = WorkspaceConfig {
            autosave_delay_ms: MAX_AUTOSAVE_DELAY_MS + 1,
            ..Default::default()
        };
        assert!(huge.validate().is_err());

        let empty_key = WorkspaceConfig {
            prompts_key: " ".to_string(),
            ..Default::default()
        };
        assert!(empty_key.validate().is_err());

        let shared = WorkspaceConfig {
            view_key: "concept-tree".to_string(),
            ..Default::default()
        };
        let err = shared.validate().unwrap_err();
        assert!(err.to_string().contains("more than one"));
    }

    #[test]
    fn test_explicit_data_dir() {
        let config = WorkspaceConfig {
            data_dir: Some(PathBuf::from("/tmp/concepts")),
            ..Default::default()
        };
        if std::env::var(DATA_DIR_ENV).is_err() {
            assert_eq!(
                config.resolve_data_dir().unwrap(),
                PathBuf::from("/tmp/concepts")
            );
        }
    }

    #[tokio::test]
    async fn test_load_missing_returns_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config(&dir.path().join("absent.json")).await.unwrap();
        assert_eq!(config, WorkspaceConfig::default());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conf/workspace.json");
        let config = WorkspaceConfig {
            autosave_delay_ms: 250,
            seed_root_name: "Ideas".to_string(),
            ..Default::default()
        };

        save_config(&path, &config).await.unwrap();
        assert_eq!(load_config(&path).await.unwrap(), config);
        assert!(!dir.path().join("conf/workspace.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_load_rejects_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("workspace.json");
        tokio::fs::write(&path, r#"{"autosave_delay_ms": 0}"#)
            .await
            .unwrap();
        assert!(load_config(&path).await.is_err());
    }
}
