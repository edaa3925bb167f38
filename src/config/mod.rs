use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::types::error::{Result, ShelfError};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address the API server binds to
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Path of the SQLite store file
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Optional shared credential protecting the whole API
    #[serde(default)]
    pub auth: Option<AuthConfig>,
}

/// Single shared basic-auth credential
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub user: String,
    pub password: String,
}

fn default_bind_addr() -> String {
    "127.0.0.1:3001".to_string()
}

fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("mailshelf").join("emails.db"))
        .unwrap_or_else(|| PathBuf::from("emails.db"))
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            db_path: default_db_path(),
            auth: None,
        }
    }
}

/// Get default config paths
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("mailshelf").join("config.toml"));
    }

    if let Some(home_dir) = dirs::home_dir() {
        paths.push(
            home_dir
                .join(".config")
                .join("mailshelf")
                .join("config.toml"),
        );
    }

    paths
}

/// Load configuration. An explicit path must exist; otherwise the
/// default locations are probed and a missing file simply means
/// defaults.
pub fn load(explicit_path: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit_path {
        if !path.exists() {
            return Err(ShelfError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        return load_from_path(path);
    }

    for path in default_config_paths() {
        if path.exists() {
            return load_from_path(&path);
        }
    }

    info!("No config file found, using defaults");
    Ok(AppConfig::default())
}

fn load_from_path(path: &Path) -> Result<AppConfig> {
    info!("Loading configuration from: {:?}", path);

    let content = fs::read_to_string(path)
        .map_err(|e| ShelfError::Config(format!("Failed to read config: {}", e)))?;

    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| ShelfError::Config(format!("Failed to parse config: {}", e)))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_no_file() {
        let config = AppConfig::default();
        assert_eq!(config.bind_addr, "127.0.0.1:3001");
        assert!(config.auth.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "bind_addr = \"0.0.0.0:8080\"\ndb_path = \"/tmp/test.db\"\n\n[auth]\nuser = \"admin\"\npassword = \"secret\"\n",
        )
        .unwrap();

        let config = load(Some(&path)).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.db_path, PathBuf::from("/tmp/test.db"));
        let auth = config.auth.unwrap();
        assert_eq!(auth.user, "admin");
        assert_eq!(auth.password, "secret");
    }

    #[test]
    fn test_missing_explicit_path_is_an_error() {
        let result = load(Some(Path::new("/nope/config.toml")));
        assert!(matches!(result, Err(ShelfError::Config(_))));
    }
}
