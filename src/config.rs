use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_API_URL: &str = "http://localhost:5215/api/tasks";
const DEFAULT_LOG_LEVEL: &str = "info";
const APP_DIR: &str = "taskboard";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub api_key: Option<String>,
    pub log_level: String,
    pub log_file: PathBuf,
}

// Shape of ~/.config/taskboard/config.toml; every key is optional
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    api_url: Option<String>,
    api_key: Option<String>,
    log_level: Option<String>,
    log_file: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl Config {
    /// Environment (including `.env`) wins over the config file, which wins
    /// over built-in defaults.
    pub fn load() -> Result<Config, ConfigError> {
        let file = match config_path() {
            Some(path) if path.exists() => read_file(&path)?,
            _ => FileConfig::default(),
        };
        Ok(Config::resolve(file, |key| env::var(key).ok()))
    }

    fn resolve(file: FileConfig, var: impl Fn(&str) -> Option<String>) -> Config {
        let var = |key: &str| var(key).filter(|v| !v.trim().is_empty());
        Config {
            api_url: var("TASKBOARD_API_URL")
                .or(file.api_url)
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_key: var("TASKBOARD_API_KEY").or(file.api_key),
            log_level: var("TASKBOARD_LOG")
                .or(file.log_level)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            log_file: var("TASKBOARD_LOG_FILE")
                .map(PathBuf::from)
                .or(file.log_file)
                .unwrap_or_else(default_log_file),
        }
    }
}

fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

fn default_log_file() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(env::temp_dir)
        .join(APP_DIR)
        .join("taskboard.log")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::resolve(FileConfig::default(), env_of(&[]));
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.api_key, None);
        assert_eq!(config.log_level, "info");
        assert!(config.log_file.ends_with("taskboard/taskboard.log"));
    }

    #[test]
    fn test_file_values_used() {
        let file: FileConfig = toml::from_str(
            r#"
            api_url = "http://tasks.internal/api/tasks"
            log_level = "debug"
            "#,
        )
        .unwrap();
        let config = Config::resolve(file, env_of(&[]));
        assert_eq!(config.api_url, "http://tasks.internal/api/tasks");
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_env_overrides_file() {
        let file = FileConfig {
            api_url: Some("http://from-file".to_string()),
            api_key: Some("file-key".to_string()),
            ..FileConfig::default()
        };
        let config = Config::resolve(
            file,
            env_of(&[
                ("TASKBOARD_API_URL", "http://from-env"),
                ("TASKBOARD_API_KEY", ""),
                ("TASKBOARD_LOG_FILE", "/tmp/tb.log"),
            ]),
        );
        assert_eq!(config.api_url, "http://from-env");
        assert_eq!(config.api_key.as_deref(), Some("file-key"));
        assert_eq!(config.log_file, PathBuf::from("/tmp/tb.log"));
    }

    #[test]
    fn test_bad_file_is_reported() {
        let dir = env::temp_dir().join(format!("taskboard-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        fs::write(&path, "api_url = [").unwrap();
        assert!(matches!(read_file(&path), Err(ConfigError::Parse { .. })));
        fs::remove_dir_all(&dir).unwrap();
    }
}
