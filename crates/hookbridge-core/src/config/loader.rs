//! Configuration file discovery, loading and environment overrides.
//!
//! Resolution precedence:
//! 1. An explicit file passed by the caller (must exist)
//! 2. The first of [`CONFIG_FILE_NAMES`] in the working directory
//! 3. `<user config dir>/hookbridge/config.yaml`
//! 4. Built-in defaults
//!
//! After loading, [`PYTHON_PATH_ENV`] (read from the supplied host
//! environment, never the live process) replaces `python.interpreter`.

use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};
use thiserror::Error;
use tracing::debug;

use super::{AppConfig, ConfigValidationError, validate_config};
use crate::host::HostEnvironment;

/// Environment variable overriding `python.interpreter`.
pub const PYTHON_PATH_ENV: &str = "HOOKBRIDGE_PYTHON_PATH";

/// File names probed in the working directory, in order.
pub const CONFIG_FILE_NAMES: [&str; 4] = [
    "config.yaml",
    "config.yml",
    "hookbridge.yaml",
    "hookbridge.yml",
];

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested file does not exist.
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Unsupported configuration format for {path} (expected .yaml or .yml)")]
    UnsupportedFormat { path: PathBuf },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The existing file is not a YAML mapping, so it cannot be updated.
    #[error("{path} does not contain a YAML mapping")]
    NotAMapping { path: PathBuf },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[source] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] ConfigValidationError),
}

/// Where a loaded configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Explicit(PathBuf),
    WorkingDir(PathBuf),
    UserConfigDir(PathBuf),
    Defaults,
}

impl ConfigSource {
    /// Backing file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(path) | Self::WorkingDir(path) | Self::UserConfigDir(path) => {
                Some(path)
            }
            Self::Defaults => None,
        }
    }
}

/// A validated configuration together with its origin.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub source: ConfigSource,
}

/// Load, override and validate the configuration.
pub fn load_config(
    explicit: Option<&Path>,
    host: &HostEnvironment,
) -> Result<LoadedConfig, ConfigError> {
    let source = locate_config(explicit, host)?;

    let mut config = match source.path() {
        Some(path) => read_config_file(path)?,
        None => AppConfig::default(),
    };
    debug!(source = ?source, "Loaded configuration");

    apply_env_overrides(&mut config, host);
    validate_config(&config.python)?;

    Ok(LoadedConfig { config, source })
}

/// Apply environment variable overrides from `host`.
pub fn apply_env_overrides(config: &mut AppConfig, host: &HostEnvironment) {
    if let Some(interpreter) = host.var(PYTHON_PATH_ENV).filter(|v| !v.trim().is_empty()) {
        debug!(interpreter, "Interpreter overridden by {PYTHON_PATH_ENV}");
        config.python.interpreter = interpreter.to_string();
    }
}

/// Write `config` to `path` as YAML.
///
/// The file is shared with the rest of the bridge: sections other than
/// those in [`AppConfig`] are kept as they are, and an existing `python`
/// section is replaced in place.
pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    let mut document = read_document(path)?;
    let rendered = serde_yaml::to_value(config).map_err(ConfigError::Serialize)?;
    if let Value::Mapping(sections) = rendered {
        for (key, value) in sections {
            document.insert(key, value);
        }
    }

    let yaml = serde_yaml::to_string(&document).map_err(ConfigError::Serialize)?;
    fs::write(path, yaml).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Top-level mapping of an existing file; empty when there is none yet.
fn read_document(path: &Path) -> Result<Mapping, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Mapping::new()),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    if content.trim().is_empty() {
        return Ok(Mapping::new());
    }

    let document: Value = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    match document {
        Value::Mapping(sections) => Ok(sections),
        Value::Null => Ok(Mapping::new()),
        _ => Err(ConfigError::NotAMapping {
            path: path.to_path_buf(),
        }),
    }
}

fn locate_config(
    explicit: Option<&Path>,
    host: &HostEnvironment,
) -> Result<ConfigSource, ConfigError> {
    if let Some(path) = explicit {
        let path = host.resolve(path);
        if !path.is_file() {
            return Err(ConfigError::NotFound { path });
        }
        if !has_yaml_extension(&path) {
            return Err(ConfigError::UnsupportedFormat { path });
        }
        return Ok(ConfigSource::Explicit(path));
    }

    if let Some(path) = CONFIG_FILE_NAMES
        .iter()
        .map(|name| host.current_dir().join(name))
        .find(|path| path.is_file())
    {
        return Ok(ConfigSource::WorkingDir(path));
    }

    if let Some(path) = dirs::config_dir()
        .map(|dir| dir.join("hookbridge").join("config.yaml"))
        .filter(|path| path.is_file())
    {
        return Ok(ConfigSource::UserConfigDir(path));
    }

    Ok(ConfigSource::Defaults)
}

fn read_config_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    // An empty file is a valid, all-default configuration.
    if content.trim().is_empty() {
        return Ok(AppConfig::default());
    }

    AppConfig::from_yaml_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn has_yaml_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}
