//! Configuration management for `tix`.
//!
//! Configuration sources and precedence (highest wins):
//! 1. CLI overrides
//! 2. Environment variables (`TIX_*`)
//! 3. Project config (.tix/config.yaml)
//! 4. User config (~/.config/tix/config.yaml)
//! 5. Defaults

use crate::error::{Result, TrackerError};
use crate::model::Priority;
use crate::query::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use crate::storage::SqliteStorage;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Name of the workspace directory.
pub const TIX_DIR_NAME: &str = ".tix";

/// Default database filename inside the workspace.
pub const DEFAULT_DB_FILENAME: &str = "tix.db";

/// Busy timeout used when none is configured.
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 30_000;

pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";
pub const DEFAULT_SERVER_PORT: u16 = 8000;
pub const DEFAULT_CORS_ORIGINS: &[&str] = &["http://localhost:5173", "http://127.0.0.1:5173"];

const ENV_PREFIX: &str = "TIX_";

/// Discover the active `.tix` directory.
///
/// Honors `TIX_DIR` when set, otherwise walks up from `start` (or CWD).
///
/// # Errors
///
/// Returns `NotInitialized` if no workspace is found, or an I/O error if the
/// CWD cannot be read.
pub fn discover_tix_dir(start: Option<&Path>) -> Result<PathBuf> {
    let env_override = env::var("TIX_DIR")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from);
    discover_tix_dir_with_env(start, env_override.as_deref())
}

fn discover_tix_dir_with_env(start: Option<&Path>, env_override: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = env_override {
        if path.is_dir() {
            return Ok(path.to_path_buf());
        }
    }

    let mut current = match start {
        Some(path) => path.to_path_buf(),
        None => env::current_dir()?,
    };

    loop {
        let candidate = current.join(TIX_DIR_NAME);
        if candidate.is_dir() {
            return Ok(candidate);
        }

        if !current.pop() {
            break;
        }
    }

    Err(TrackerError::NotInitialized)
}

/// A flat configuration layer.
///
/// Keys are canonicalised to lowercase dotted form, so `lock-timeout`,
/// `lock_timeout` and `TIX_LOCK_TIMEOUT` all land on `lock.timeout`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub values: HashMap<String, String>,
}

impl ConfigLayer {
    /// Merge another layer on top of this one (higher precedence wins).
    pub fn merge_from(&mut self, other: &Self) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Merge multiple layers in precedence order (lowest to highest).
    #[must_use]
    pub fn merge_layers(layers: &[Self]) -> Self {
        let mut merged = Self::default();
        for layer in layers {
            merged.merge_from(layer);
        }
        merged
    }

    /// Build a layer from a YAML file path. Missing files return empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Build a layer from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid YAML.
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(contents)?;
        let mut flat = HashMap::new();
        flatten_yaml(&value, "", &mut flat);

        let mut layer = Self::default();
        for (key, value) in flat {
            layer.insert(&key, value);
        }
        Ok(layer)
    }

    /// Build a layer from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(env::vars())
    }

    /// Build a layer from `TIX_*` variables.
    #[must_use]
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut layer = Self::default();

        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                layer.insert(stripped, value);
            }
        }

        layer
    }

    fn insert(&mut self, key: &str, value: String) {
        self.values.insert(normalize_key(key), value);
    }

    /// First value found for any of `keys`.
    #[must_use]
    pub fn get(&self, keys: &[&str]) -> Option<&String> {
        keys.iter()
            .find_map(|key| self.values.get(&normalize_key(key)))
    }
}

/// CLI overrides for config loading (optional).
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub db: Option<PathBuf>,
    pub lock_timeout: Option<u64>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl CliOverrides {
    #[must_use]
    pub fn as_layer(&self) -> ConfigLayer {
        let mut layer = ConfigLayer::default();

        if let Some(path) = &self.db {
            layer.insert("db", path.to_string_lossy().to_string());
        }
        if let Some(lock_timeout) = self.lock_timeout {
            layer.insert("lock-timeout", lock_timeout.to_string());
        }
        if let Some(host) = &self.host {
            layer.insert("server.host", host.clone());
        }
        if let Some(port) = self.port {
            layer.insert("server.port", port.to_string());
        }

        layer
    }
}

/// Load project config (.tix/config.yaml).
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(tix_dir: &Path) -> Result<ConfigLayer> {
    ConfigLayer::from_yaml(&tix_dir.join("config.yaml"))
}

/// Load user config (~/.config/tix/config.yaml).
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<ConfigLayer> {
    let Ok(home) = env::var("HOME") else {
        return Ok(ConfigLayer::default());
    };
    let path = Path::new(&home)
        .join(".config")
        .join("tix")
        .join("config.yaml");
    ConfigLayer::from_yaml(&path)
}

/// Default config layer (lowest precedence).
#[must_use]
pub fn default_config_layer() -> ConfigLayer {
    let mut layer = ConfigLayer::default();
    layer.insert("lock-timeout", DEFAULT_LOCK_TIMEOUT_MS.to_string());
    layer.insert("default-priority", Priority::default().as_str().to_string());
    layer.insert("page-size", DEFAULT_PAGE_LIMIT.to_string());
    layer.insert("server.host", DEFAULT_SERVER_HOST.to_string());
    layer.insert("server.port", DEFAULT_SERVER_PORT.to_string());
    layer.insert("server.cors-origins", DEFAULT_CORS_ORIGINS.join(","));
    layer
}

/// Load configuration with the full precedence order.
///
/// `tix_dir` is optional so commands that run outside a workspace still see
/// user, env and CLI settings.
///
/// # Errors
///
/// Returns an error if any config file cannot be read or parsed.
pub fn load_config(tix_dir: Option<&Path>, cli: &CliOverrides) -> Result<ConfigLayer> {
    let defaults = default_config_layer();
    let user = load_user_config()?;
    let project = match tix_dir {
        Some(dir) => load_project_config(dir)?,
        None => ConfigLayer::default(),
    };
    let env_layer = ConfigLayer::from_env();
    let cli_layer = cli.as_layer();

    Ok(ConfigLayer::merge_layers(&[
        defaults, user, project, env_layer, cli_layer,
    ]))
}

/// Resolve the database path. Relative paths are taken from the workspace.
#[must_use]
pub fn db_path_from_layer(tix_dir: &Path, layer: &ConfigLayer) -> PathBuf {
    get_path(layer, &["db", "database"]).map_or_else(
        || tix_dir.join(DEFAULT_DB_FILENAME),
        |path| {
            if path.is_absolute() {
                path
            } else {
                tix_dir.join(path)
            }
        },
    )
}

/// Resolve the `SQLite` busy timeout in milliseconds.
#[must_use]
pub fn lock_timeout_from_layer(layer: &ConfigLayer) -> Option<u64> {
    layer
        .get(&["lock-timeout"])
        .and_then(|value| value.trim().parse::<u64>().ok())
}

/// Resolve default priority for new tickets from config.
///
/// # Errors
///
/// Returns an error if the configured value is not a valid priority.
pub fn default_priority_from_layer(layer: &ConfigLayer) -> Result<Priority> {
    layer
        .get(&["default-priority"])
        .map_or_else(|| Ok(Priority::default()), |value| Priority::from_str(value))
}

/// Resolve the default page size for listings.
///
/// # Errors
///
/// Returns a config error if the value is not a number in `1..=100`.
pub fn page_size_from_layer(layer: &ConfigLayer) -> Result<usize> {
    let Some(value) = layer.get(&["page-size"]) else {
        return Ok(DEFAULT_PAGE_LIMIT);
    };
    match value.trim().parse::<usize>() {
        Ok(size) if (1..=MAX_PAGE_LIMIT).contains(&size) => Ok(size),
        _ => Err(TrackerError::Config(format!(
            "page-size must be a number between 1 and {MAX_PAGE_LIMIT}, got '{value}'"
        ))),
    }
}

/// Settings for the HTTP API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SERVER_HOST.to_string(),
            port: DEFAULT_SERVER_PORT,
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl ServerConfig {
    /// Read server settings from a merged layer.
    ///
    /// # Errors
    ///
    /// Returns a config error if the port is not a valid `u16`.
    pub fn from_layer(layer: &ConfigLayer) -> Result<Self> {
        let defaults = Self::default();

        let host = layer
            .get(&["server.host"])
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or(defaults.host);

        let port = match layer.get(&["server.port"]) {
            Some(value) => value.trim().parse::<u16>().map_err(|_| {
                TrackerError::Config(format!("server.port must be a port number, got '{value}'"))
            })?,
            None => defaults.port,
        };

        let cors_origins = layer
            .get(&["server.cors-origins"])
            .map_or(defaults.cors_origins, |value| split_list(value));

        Ok(Self {
            host,
            port,
            cors_origins,
        })
    }

    /// `host:port` for binding.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Open the workspace database, honouring config overrides.
///
/// # Errors
///
/// Returns `DatabaseNotFound` when the database file is missing, or an
/// error if config cannot be read or the database cannot be opened.
pub fn open_storage(tix_dir: &Path, layer: &ConfigLayer) -> Result<SqliteStorage> {
    let db_path = db_path_from_layer(tix_dir, layer);
    if !db_path.is_file() {
        return Err(TrackerError::DatabaseNotFound { path: db_path });
    }
    let lock_timeout = lock_timeout_from_layer(layer).or(Some(DEFAULT_LOCK_TIMEOUT_MS));
    SqliteStorage::open_with_timeout(&db_path, lock_timeout)
}

fn get_path(layer: &ConfigLayer, keys: &[&str]) -> Option<PathBuf> {
    layer.get(keys).and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(PathBuf::from(trimmed))
        }
    })
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace(['_', '-'], ".")
}

fn flatten_yaml(value: &serde_yaml::Value, prefix: &str, out: &mut HashMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, value) in map {
                let Some(key_str) = key.as_str() else {
                    continue;
                };
                let next_prefix = if prefix.is_empty() {
                    key_str.to_string()
                } else {
                    format!("{prefix}.{key_str}")
                };
                flatten_yaml(value, &next_prefix, out);
            }
        }
        serde_yaml::Value::Sequence(values) => {
            let joined = values
                .iter()
                .filter_map(yaml_scalar_to_string)
                .collect::<Vec<_>>()
                .join(",");
            out.insert(prefix.to_string(), joined);
        }
        _ => {
            if let Some(value) = yaml_scalar_to_string(value) {
                out.insert(prefix.to_string(), value);
            }
        }
    }
}

fn yaml_scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Bool(v) => Some(v.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Null
        | serde_yaml::Value::Sequence(_)
        | serde_yaml::Value::Mapping(_) => None,
        serde_yaml::Value::Tagged(tagged) => yaml_scalar_to_string(&tagged.value),
    }
}
