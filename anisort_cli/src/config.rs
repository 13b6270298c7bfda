//! Layered configuration: defaults, then the TOML file, then `ANISORT_*` variables

use anisort_core::{Credentials, PipelineConfig, ProtocolConfig};
use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_TEMPLATE: &str = "{{anime}}/{{anime}} - {{episode}} - {{episode_title}} [{{group}}]{{#if resolution}}[{{resolution}}]{{/if}}.{{extension}}";

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default)]
    pub anidb: AnidbConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub library: LibraryConfig,
}

/// Account and server settings
#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct AnidbConfig {
    #[serde(default, flatten)]
    pub credentials: Credentials,

    #[serde(default)]
    pub protocol: ProtocolConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LibraryConfig {
    /// Handlebars template for the destination, relative to the destination root
    pub template: String,
    /// Longest destination path the template may produce
    pub max_path_length: usize,
    /// SQLite database; files are tracked in memory only when unset
    pub database: Option<PathBuf>,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
            max_path_length: 240,
            database: dirs::data_dir().map(|dir| dir.join("anisort").join("anisort.db")),
        }
    }
}

pub struct ConfigManager {
    config_path: PathBuf,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("anisort")
            .join("config.toml")
    }

    pub fn load(&self) -> Result<AppConfig> {
        self.figment()
            .extract()
            .with_context(|| format!("Failed to load configuration from {}", self.config_path.display()))
    }

    fn figment(&self) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));

        if self.config_path.exists() {
            figment = figment.merge(Toml::file(&self.config_path));
        }

        figment.merge(Env::prefixed("ANISORT_").split("__"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anisort_core::TransferMode;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_file() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("missing.toml"));
        let config = manager.load().unwrap();

        assert_eq!(config.library.template, DEFAULT_TEMPLATE);
        assert_eq!(config.pipeline, PipelineConfig::default());
        assert_eq!(config.anidb.protocol, ProtocolConfig::default());
        assert!(!config.anidb.credentials.is_complete());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[anidb]
username = "spike"
password = "swordfish"

[anidb.protocol]
local_port = 4600

[pipeline]
transfer_mode = "copy"
destination_root = "/srv/anime"
max_search_retries = 2

[library]
max_path_length = 120
"#,
        )
        .unwrap();

        let config = ConfigManager::with_path(path).load().unwrap();
        assert_eq!(config.anidb.credentials.username, "spike");
        assert_eq!(config.anidb.credentials.password.to_str().unwrap(), "swordfish");
        assert_eq!(config.anidb.protocol.local_port, 4600);
        assert_eq!(config.anidb.protocol.server_port, ProtocolConfig::default().server_port);
        assert_eq!(config.pipeline.transfer_mode, TransferMode::Copy);
        assert_eq!(config.pipeline.destination_root, PathBuf::from("/srv/anime"));
        assert_eq!(config.pipeline.max_search_retries, 2);
        assert_eq!(config.library.max_path_length, 120);
        assert_eq!(config.library.template, DEFAULT_TEMPLATE);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[pipeline]\nmax_search_retries = \"many\"\n").unwrap();

        assert!(ConfigManager::with_path(path).load().is_err());
    }
}
