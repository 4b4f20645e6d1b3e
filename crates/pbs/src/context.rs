use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::config::PbsConfig;
use crate::registry::ShortcutTypeRegistry;

/// Everything a controller needs from its environment
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: PbsConfig,
    pub registry: ShortcutTypeRegistry,
    /// Directory holding the configuration and documents
    pub data_dir: PathBuf,
    /// Document last saved or loaded
    pub current_file: Option<PathBuf>,
}

impl AppContext {
    /// Context with the built-in shortcut types
    pub fn new(config: PbsConfig, data_dir: impl Into<PathBuf>) -> Self {
        let registry = ShortcutTypeRegistry::with_builtins(&config.url_opener);
        Self {
            config,
            registry,
            data_dir: data_dir.into(),
            current_file: None,
        }
    }

    /// Read `pbs.yaml` from `data_dir`, falling back to defaults when it is absent.
    pub fn load(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        let config = PbsConfig::load_or_default(&data_dir.join(Self::CONFIG_FILE))?;
        Ok(Self::new(config, data_dir))
    }

    pub const CONFIG_FILE: &'static str = "pbs.yaml";
    pub const DEFAULT_DOCUMENT: &'static str = "pbs.json";

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(Self::CONFIG_FILE)
    }

    /// Current document, or the default one in `data_dir`
    pub fn document_path(&self) -> PathBuf {
        self.current_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join(Self::DEFAULT_DOCUMENT))
    }

    pub fn set_current_file(&mut self, path: &Path) {
        self.current_file = Some(path.to_path_buf());
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new(PbsConfig::default(), ".")
    }
}
