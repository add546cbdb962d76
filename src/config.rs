//! Configuration management for legal-migrate using the prefer crate.
//!
//! Precedence, lowest first: built-in defaults, config file, command line
//! and environment. The service key only ever comes from the environment
//! (or the matching flag) and is never read from a config file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable holding the Supabase service role key.
pub const SERVICE_KEY_ENV: &str = "SUPABASE_SERVICE_KEY";

/// Project the migration was written against.
pub const DEFAULT_SUPABASE_URL: &str = "https://zyziolikudoczsthyoja.supabase.co";

/// Root of the server's legal folder tree.
pub const DEFAULT_BASE_DIR: &str = "/root/Robsonway-Research/Legal";

pub const DEFAULT_BUCKET: &str = "legal-documents";
pub const DEFAULT_DOCUMENTS_TABLE: &str = "legal_documents";
pub const DEFAULT_FOLDERS_TABLE: &str = "legal_case_folders";

/// Request timeout in seconds. Attachments can be large scans.
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("SUPABASE_SERVICE_KEY is not set. Get the service_role key from Supabase Dashboard > Settings > API and run:\n  SUPABASE_SERVICE_KEY=\"eyJ...\" legal-migrate [--dry-run]")]
    MissingCredential,
}

/// Check that a service key was supplied and is not blank.
pub fn require_service_key(value: Option<String>) -> Result<String, ConfigError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingCredential)
}

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Supabase project URL.
    pub supabase_url: String,
    /// Destination root for the migrated files.
    pub base_dir: PathBuf,
    /// Storage bucket holding the attachments.
    pub bucket: String,
    /// Table with the document records.
    pub documents_table: String,
    /// Table mapping cases to folders.
    pub folders_table: String,
    /// Request timeout in seconds.
    pub request_timeout: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            supabase_url: DEFAULT_SUPABASE_URL.to_string(),
            base_dir: PathBuf::from(DEFAULT_BASE_DIR),
            bucket: DEFAULT_BUCKET.to_string(),
            documents_table: DEFAULT_DOCUMENTS_TABLE.to_string(),
            folders_table: DEFAULT_FOLDERS_TABLE.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

/// Configuration file contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supabase_url: Option<String>,
    /// Destination root; `~` is expanded, relative paths resolve against the
    /// config file's directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents_table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folders_table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    /// File this config was loaded from.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Falls back to defaults when no legal-migrate config file exists.
    pub async fn load() -> Self {
        match prefer::load("legal-migrate").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("{}", e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Directory of the config file, if it came from one.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref url) = self.supabase_url {
            settings.supabase_url = url.clone();
        }
        if let Some(ref dir) = self.base_dir {
            settings.base_dir = self.resolve_path(dir, base_dir);
        }
        if let Some(ref bucket) = self.bucket {
            settings.bucket = bucket.clone();
        }
        if let Some(ref table) = self.documents_table {
            settings.documents_table = table.clone();
        }
        if let Some(ref table) = self.folders_table {
            settings.folders_table = table.clone();
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
    }
}

/// Options controlling how settings are loaded.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Use CWD for relative paths instead of config file directory.
    pub use_cwd: bool,
    /// Destination root override (--target).
    pub target: Option<PathBuf>,
    /// Supabase URL override (--url / SUPABASE_URL).
    pub supabase_url: Option<String>,
}

/// Load config from file sources.
async fn load_file_config(options: &LoadOptions) -> Config {
    if let Some(ref config_path) = options.config_path {
        return match Config::load_from_path(config_path).await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{}; using defaults", e);
                Config::default()
            }
        };
    }

    Config::load().await
}

/// Resolve settings from defaults, the config file and overrides.
pub async fn load_settings_with_options(options: LoadOptions) -> Settings {
    let config = load_file_config(&options).await;
    resolve_settings(&config, &options)
}

/// Merge a loaded config and command-line overrides into settings.
pub fn resolve_settings(config: &Config, options: &LoadOptions) -> Settings {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let base_dir = if options.use_cwd {
        cwd.clone()
    } else {
        config.base_dir().unwrap_or_else(|| cwd.clone())
    };

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings, &base_dir);

    if let Some(ref url) = options.supabase_url {
        settings.supabase_url = url.clone();
    }
    if let Some(ref target) = options.target {
        settings.base_dir = config.resolve_path(&target.to_string_lossy(), &cwd);
    }

    tracing::debug!(
        "Settings: url={}, base_dir={}, bucket={}",
        settings.supabase_url,
        settings.base_dir.display(),
        settings.bucket
    );
    settings
}
