use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const DEFAULT_API_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_API_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

const CONFIG_FILE_NAME: &str = ".termdiff.json";

/// Persisted user settings: last-used Crowdin export and the
/// correction-service credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub crowdin_file_path: Option<PathBuf>,
    pub api_endpoint: String,
    pub api_key: String,
    pub api_model: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            crowdin_file_path: None,
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            api_key: String::new(),
            api_model: DEFAULT_API_MODEL.to_string(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("cannot determine home directory")]
    NoHome,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub fn config_path() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(CONFIG_FILE_NAME))
        .ok_or(ConfigError::NoHome)
}

/// Load settings from the home directory. A missing or corrupt file yields
/// defaults; a remembered Crowdin path that no longer exists is dropped.
pub fn load_config() -> AppConfig {
    match config_path() {
        Ok(path) => load_config_from(&path),
        Err(_) => AppConfig::default(),
    }
}

pub fn load_config_from(path: &Path) -> AppConfig {
    let Ok(text) = std::fs::read_to_string(path) else {
        return AppConfig::default();
    };
    let mut cfg: AppConfig = match serde_json::from_str(&text) {
        Ok(cfg) => cfg,
        Err(_) => return AppConfig::default(),
    };
    if let Some(p) = cfg.crowdin_file_path.as_ref() {
        if !p.exists() {
            cfg.crowdin_file_path = None;
        }
    }
    cfg
}

pub fn save_config(cfg: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path()?)
}

pub fn save_config_to(cfg: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    let text = serde_json::to_string_pretty(cfg)?;
    std::fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let cfg = AppConfig {
            crowdin_file_path: None,
            api_endpoint: "https://example.test/v1/chat".to_string(),
            api_key: "secret".to_string(),
            api_model: "gpt-4o-mini".to_string(),
        };
        save_config_to(&cfg, &path).unwrap();
        let loaded = load_config_from(&path);
        assert_eq!(loaded.api_endpoint, cfg.api_endpoint);
        assert_eq!(loaded.api_key, "secret");
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "{not json").unwrap();
        let loaded = load_config_from(&path);
        assert_eq!(loaded.api_endpoint, DEFAULT_API_ENDPOINT);
        assert!(loaded.api_key.is_empty());
    }

    #[test]
    fn stale_crowdin_path_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let cfg = AppConfig {
            crowdin_file_path: Some(dir.path().join("gone.xliff")),
            ..AppConfig::default()
        };
        save_config_to(&cfg, &path).unwrap();
        assert!(load_config_from(&path).crowdin_file_path.is_none());
    }
}
