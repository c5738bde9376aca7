use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::catalog::{GameOptions, PromptLength};
use crate::typing_policy::{InputMode, SessionPolicy};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub language: InputMode,
    pub length: PromptLength,
    pub theme_id: Option<String>,
    /// question catalog to use instead of the bundled one
    pub catalog_path: Option<PathBuf>,
    pub policy: SessionPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: InputMode::Japanese,
            length: PromptLength::Short,
            theme_id: None,
            catalog_path: None,
            policy: SessionPolicy::default(),
        }
    }
}

impl Config {
    /// Keeps the last selection so the next launch starts from it.
    pub fn remember(&mut self, options: &GameOptions) {
        self.language = options.language;
        self.length = options.length;
        self.theme_id = Some(options.theme_id.clone());
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!("ignoring unreadable config {}: {}", self.path.display(), err);
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let mut cfg = Config {
            catalog_path: Some(PathBuf::from("/tmp/questions.json")),
            policy: SessionPolicy::default().with_duration(60),
            ..Config::default()
        };
        cfg.remember(&GameOptions {
            language: InputMode::Copy,
            length: PromptLength::Long,
            theme_id: "rust".into(),
        });
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
        assert_eq!(loaded.theme_id.as_deref(), Some("rust"));
        assert_eq!(loaded.policy.duration_secs, 60);
    }

    #[test]
    fn missing_or_broken_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());

        fs::write(&path, b"{ nope").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{ "language": "english" }"#).unwrap();
        let loaded = FileConfigStore::with_path(&path).load();
        assert_eq!(loaded.language, InputMode::English);
        assert_eq!(loaded.policy, SessionPolicy::default());
    }
}
