use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Which sibling tags count as duplicates when a tag is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagUniqueness {
    None,
    Name,
    NameAndIcon,
}

/// Which shortcuts count as duplicates when a shortcut is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortcutUniqueness {
    None,
    /// Same content and metadata
    Identity,
    /// Same content, metadata may differ
    Content,
}

/// What to do when a creation conflicts with an existing entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictAction {
    /// Ask the installed conflict resolver
    Ask,
    MergeExisting,
    MergeIncoming,
    CancelOne,
    CancelAll,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflictPolicy {
    pub tags: TagUniqueness,
    pub shortcuts: ShortcutUniqueness,
    pub action: ConflictAction,
}

impl Default for ConflictPolicy {
    fn default() -> Self {
        Self {
            tags: TagUniqueness::Name,
            shortcuts: ShortcutUniqueness::Identity,
            action: ConflictAction::MergeExisting,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub filter: String,
    /// Log file; stderr when absent
    pub file: Option<PathBuf>,
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            file: None,
            ansi: true,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PbsConfig {
    pub conflicts: ConflictPolicy,
    /// Delete shortcuts left without any tag when their last tag is deleted
    pub delete_orphans: bool,
    /// Maximum number of transactions kept for undo
    pub undo_depth: usize,
    /// Program used to open URL shortcuts
    pub url_opener: String,
    pub logging: LoggingConfig,
}

impl Default for PbsConfig {
    fn default() -> Self {
        Self {
            conflicts: ConflictPolicy::default(),
            delete_orphans: false,
            undo_depth: 100,
            url_opener: default_url_opener().to_string(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_url_opener() -> &'static str {
    if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(target_os = "windows") {
        "explorer"
    } else {
        "xdg-open"
    }
}

impl PbsConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file {}: {}", path.display(), e))?;

        Self::from_yaml(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config YAML {}: {}", path.display(), e))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: PbsConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Load `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)
            .map_err(|e| anyhow::anyhow!("Failed to write config file {}: {}", path.display(), e))
    }
}
