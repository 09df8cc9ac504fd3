//! Python runtime configuration.
//!
//! These types mirror the `python:` section of the bridge configuration
//! file. They are pure data: loading lives in [`loader`], and nothing here
//! touches processes or the live environment.

pub mod loader;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::PythonVersion;

pub use loader::{
    CONFIG_FILE_NAMES, ConfigError, ConfigSource, LoadedConfig, PYTHON_PATH_ENV,
    apply_env_overrides, load_config, save_config,
};

/// Interpreter setting that asks for automatic discovery.
pub const AUTO_INTERPRETER: &str = "auto";

/// Conventional virtual environment directory name.
pub const DEFAULT_VENV_NAME: &str = ".venv";

/// Oldest interpreter accepted by environment validation.
pub const DEFAULT_MIN_PYTHON_VERSION: &str = "3.8";

/// Freshness window of the analyzed-interpreter cache, in minutes.
pub const DEFAULT_CACHE_TIMEOUT_MINUTES: u64 = 5;

pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_PROVISION_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_INSTALL_TIMEOUT_SECS: u64 = 600;

/// Plugin directories used when none are configured.
pub const DEFAULT_PLUGIN_DIRS: [&str; 3] =
    ["./plugins", "./example_plugins", "./webhook_bridge/plugins"];

/// Packages the executor needs for its RPC transport.
pub const DEFAULT_REQUIRED_PACKAGES: [&str; 2] = ["grpcio", "grpcio-tools"];

/// Top-level configuration file.
///
/// Only the `python` section is interpreted here. Sections belonging to
/// other parts of the bridge are ignored on load and kept by
/// [`save_config`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub python: PythonConfig,
}

impl AppConfig {
    /// Parse a YAML document.
    pub fn from_yaml_str(source: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(source)
    }

    /// Render as a YAML document.
    pub fn to_yaml_string(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// Python runtime resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PythonConfig {
    /// Interpreter path, bare command name, or `"auto"`.
    pub interpreter: String,

    /// Managed environment location, overriding `uv.venv_name`. Relative
    /// paths resolve against the uv project directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venv_path: Option<PathBuf>,

    /// Install `required_packages` into freshly provisioned environments.
    pub auto_install: bool,

    /// Run uv's standalone installer when `uv` cannot be found.
    pub auto_download_uv: bool,

    pub required_packages: Vec<String>,

    /// Directories prepended to `PYTHONPATH` for the executor.
    pub plugin_dirs: Vec<PathBuf>,

    pub uv: UvConfig,

    pub validation: ValidationConfig,

    pub timeouts: TimeoutConfig,

    /// Named interpreters managed by the registry.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub interpreters: BTreeMap<String, InterpreterConfig>,

    /// Name of the registry's active interpreter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_interpreter: Option<String>,
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl PythonConfig {
    /// Create a configuration with the documented defaults.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            interpreter: AUTO_INTERPRETER.to_string(),
            venv_path: None,
            auto_install: false,
            auto_download_uv: false,
            required_packages: DEFAULT_REQUIRED_PACKAGES
                .iter()
                .map(ToString::to_string)
                .collect(),
            plugin_dirs: Vec::new(),
            uv: UvConfig::default(),
            validation: ValidationConfig::default(),
            timeouts: TimeoutConfig::default(),
            interpreters: BTreeMap::new(),
            active_interpreter: None,
        }
    }

    /// Whether the interpreter should be discovered automatically.
    #[must_use]
    pub fn is_auto(&self) -> bool {
        is_auto_interpreter(&self.interpreter)
    }

    /// Managed environment directory: `venv_path` when set, else `uv.venv_name`.
    #[must_use]
    pub fn managed_venv(&self) -> &Path {
        self.venv_path
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new(&self.uv.venv_name))
    }

    /// Configured plugin directories, or the defaults when none are set.
    #[must_use]
    pub fn effective_plugin_dirs(&self) -> Vec<PathBuf> {
        if self.plugin_dirs.is_empty() {
            DEFAULT_PLUGIN_DIRS.iter().map(PathBuf::from).collect()
        } else {
            self.plugin_dirs.clone()
        }
    }
}

/// Whether an interpreter setting means "discover automatically".
#[must_use]
pub fn is_auto_interpreter(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.eq_ignore_ascii_case(AUTO_INTERPRETER)
}

/// Managed virtual environment settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UvConfig {
    pub enabled: bool,
    /// Project directory holding the environment. Empty means the working directory.
    pub project_path: Option<PathBuf>,
    pub venv_name: String,
}

impl Default for UvConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            project_path: None,
            venv_name: DEFAULT_VENV_NAME.to_string(),
        }
    }
}

impl UvConfig {
    /// Configured project directory, treating an empty string as unset.
    #[must_use]
    pub fn project_dir(&self) -> Option<&Path> {
        self.project_path
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }
}

/// Environment validation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ValidationConfig {
    pub enabled: bool,
    pub min_python_version: String,
    /// Modules that must import, on top of `sys`, `os` and `json`.
    pub required_capabilities: Vec<String>,
    /// Treat a missing gRPC module as fatal.
    pub strict_mode: bool,
    /// Cache freshness window in minutes.
    pub cache_timeout: u64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_python_version: DEFAULT_MIN_PYTHON_VERSION.to_string(),
            required_capabilities: Vec::new(),
            strict_mode: false,
            cache_timeout: DEFAULT_CACHE_TIMEOUT_MINUTES,
        }
    }
}

impl ValidationConfig {
    #[must_use]
    pub const fn cache_window(&self) -> Duration {
        Duration::from_secs(self.cache_timeout.saturating_mul(60))
    }

    /// Parsed minimum version, `None` if unparseable (rejected by [`validate_config`]).
    #[must_use]
    pub fn min_version(&self) -> Option<PythonVersion> {
        self.min_python_version.parse().ok()
    }
}

/// Upper bounds for subprocess invocations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Validation, version and capability probes.
    pub probe_secs: u64,
    /// `uv venv` and the follow-up query.
    pub provision_secs: u64,
    /// Package installation.
    pub install_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            probe_secs: DEFAULT_PROBE_TIMEOUT_SECS,
            provision_secs: DEFAULT_PROVISION_TIMEOUT_SECS,
            install_secs: DEFAULT_INSTALL_TIMEOUT_SECS,
        }
    }
}

impl TimeoutConfig {
    #[must_use]
    pub const fn probe(&self) -> Duration {
        Duration::from_secs(self.probe_secs)
    }

    #[must_use]
    pub const fn provision(&self) -> Duration {
        Duration::from_secs(self.provision_secs)
    }

    #[must_use]
    pub const fn install(&self) -> Duration {
        Duration::from_secs(self.install_secs)
    }
}

/// Declarative configuration of one named interpreter.
///
/// Survives restarts through the configuration store. Validation only ever
/// writes the `validated`, `last_validated` and `validation_error` fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InterpreterConfig {
    pub name: String,
    /// Executable path, bare command name, or `"auto"`.
    pub path: String,
    /// Dedicated virtual environment for this interpreter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venv_path: Option<PathBuf>,
    pub use_uv: bool,
    pub required_packages: Vec<String>,
    /// Variables layered over the composed executor environment.
    pub environment: BTreeMap<String, String>,
    pub validated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_validated: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_error: Option<String>,
}

impl InterpreterConfig {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Record a successful validation.
    pub fn record_success(&mut self, at: DateTime<Utc>) {
        self.validated = true;
        self.last_validated = Some(at);
        self.validation_error = None;
    }

    /// Record a failed validation. The last success timestamp is kept.
    pub fn record_failure(&mut self, message: impl Into<String>) {
        self.validated = false;
        self.validation_error = Some(message.into());
    }
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    #[error("min_python_version must look like \"3.8\", got {0:?}")]
    InvalidMinVersion(String),

    #[error("validation.cache_timeout must be at least 1 minute")]
    ZeroCacheTimeout,

    #[error("timeouts.{0} must be at least 1 second")]
    ZeroTimeout(&'static str),

    #[error("uv.venv_name must not be empty")]
    EmptyVenvName,

    #[error("active_interpreter '{0}' is not listed under interpreters")]
    UnknownActiveInterpreter(String),
}

/// Validate a Python configuration.
pub fn validate_config(config: &PythonConfig) -> Result<(), ConfigValidationError> {
    if config.validation.min_version().is_none() {
        return Err(ConfigValidationError::InvalidMinVersion(
            config.validation.min_python_version.clone(),
        ));
    }

    if config.validation.cache_timeout == 0 {
        return Err(ConfigValidationError::ZeroCacheTimeout);
    }

    let timeouts = &config.timeouts;
    for (name, secs) in [
        ("probe_secs", timeouts.probe_secs),
        ("provision_secs", timeouts.provision_secs),
        ("install_secs", timeouts.install_secs),
    ] {
        if secs == 0 {
            return Err(ConfigValidationError::ZeroTimeout(name));
        }
    }

    if config.uv.venv_name.trim().is_empty() {
        return Err(ConfigValidationError::EmptyVenvName);
    }

    if let Some(active) = &config.active_interpreter {
        if !config.interpreters.contains_key(active) {
            return Err(ConfigValidationError::UnknownActiveInterpreter(
                active.clone(),
            ));
        }
    }

    Ok(())
}
