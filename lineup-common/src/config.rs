//! Configuration loading and root folder resolution
//!
//! Root folder resolution priority order:
//! 1. Command-line argument (highest priority)
//! 2. `LINEUP_ROOT_FOLDER` environment variable, then `LINEUP_ROOT`
//! 3. `root_folder` key of the module's TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or malformed config file never stops startup: it is logged and
//! the compiled defaults are used instead.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Primary root folder override
pub const ROOT_FOLDER_ENV: &str = "LINEUP_ROOT_FOLDER";

/// Secondary root folder override
pub const ROOT_ENV: &str = "LINEUP_ROOT";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "lineup.db";

/// Default HTTP port of the planner service
pub const DEFAULT_PORT: u16 = 5740;

/// Default HTTP bind address
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Values compiled into the binary, used when nothing else is configured
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
    pub host: String,
    pub port: u16,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            log_level: "info".to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\lineup
        dirs::data_local_dir()
            .map(|d| d.join("lineup"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\lineup"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/lineup
        dirs::data_dir()
            .map(|d| d.join("lineup"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/lineup"))
    } else {
        // ~/.local/share/lineup
        dirs::data_local_dir()
            .map(|d| d.join("lineup"))
            .unwrap_or_else(|| PathBuf::from("./lineup_data"))
    }
}

/// Logging section of the TOML config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

/// HTTP server section of the TOML config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

/// Contents of `<config_dir>/lineup/<module>.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl TomlConfig {
    /// Parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load the module's config file, falling back to defaults
    ///
    /// Never fails: a missing file is expected on first run, a malformed
    /// one is logged.
    pub fn load_or_default(module_name: &str) -> Self {
        let Some(path) = config_file_path(module_name) else {
            debug!("No config directory on this platform, using defaults");
            return Self::default();
        };

        if !path.exists() {
            debug!("Config file {} not found, using defaults", path.display());
            return Self::default();
        }

        match Self::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring unreadable config file: {}", e);
                Self::default()
            }
        }
    }
}

/// `<config_dir>/lineup/<module>.toml`
pub fn config_file_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("lineup").join(format!("{}.toml", module_name)))
}

/// Resolves the root folder for one module
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self { module_name: module_name.to_string(), cli_arg: None }
    }

    /// Command-line override (highest priority)
    pub fn with_cli_arg(mut self, cli_arg: Option<PathBuf>) -> Self {
        self.cli_arg = cli_arg;
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        for var in [ROOT_FOLDER_ENV, ROOT_ENV] {
            if let Ok(path) = std::env::var(var) {
                if !path.is_empty() {
                    return PathBuf::from(path);
                }
            }
        }

        if let Some(root_folder) = TomlConfig::load_or_default(&self.module_name).root_folder {
            return root_folder;
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Prepares the resolved root folder
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    /// Create the root folder (and parents) if missing; idempotent
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root_folder)?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }

    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_defaults_fill_missing_sections() {
        let config: TomlConfig = toml::from_str(r#"root_folder = "/srv/lineup""#).unwrap();

        assert_eq!(config.root_folder, Some(PathBuf::from("/srv/lineup")));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.server.host, DEFAULT_HOST);
    }

    #[test]
    fn test_toml_server_section() {
        let config: TomlConfig = toml::from_str(
            r#"
            [server]
            port = 6000
            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.root_folder, None);
        assert_eq!(config.server.port, 6000);
        assert_eq!(config.server.host, DEFAULT_HOST);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_cli_arg_wins() {
        let resolver = RootFolderResolver::new("lineup-planner")
            .with_cli_arg(Some(PathBuf::from("/tmp/lineup-cli")));
        assert_eq!(resolver.resolve(), PathBuf::from("/tmp/lineup-cli"));
    }
}
