//! CLI bootstrap - the composition root.
//!
//! Loads configuration, captures the host environment once, and wires the
//! tokio process runner into the interpreter manager and registry.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use hookbridge_core::config::loader::CONFIG_FILE_NAMES;
use hookbridge_core::{
    AppConfig, ConfigSource, HostEnvironment, LoadedConfig, load_config, save_config,
};
use hookbridge_runtime::{CommandRunner, InterpreterRegistry, PythonManager, TokioCommandRunner};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Everything a command handler needs.
pub struct CliContext {
    pub config: AppConfig,
    pub source: ConfigSource,
    pub host: HostEnvironment,
    pub runner: Arc<dyn CommandRunner>,
    /// Cancelled on Ctrl-C.
    pub cancel: CancellationToken,
}

impl CliContext {
    /// Manager for the configured interpreter.
    pub fn manager(&self) -> PythonManager {
        PythonManager::new(
            self.config.python.clone(),
            Arc::clone(&self.runner),
            self.host.clone(),
        )
    }

    /// Registry loaded from the configured named interpreters.
    pub fn registry(&self) -> InterpreterRegistry {
        InterpreterRegistry::from_config(
            &self.config.python,
            Arc::clone(&self.runner),
            self.host.clone(),
        )
    }

    /// File registry changes are written to.
    pub fn config_path(&self) -> PathBuf {
        self.source.path().map_or_else(
            || self.host.current_dir().join(CONFIG_FILE_NAMES[0]),
            Path::to_path_buf,
        )
    }

    /// Write the registry into the configuration file.
    ///
    /// The file is re-read first so command-line and environment overrides
    /// are not persisted.
    pub async fn persist_registry(&self, registry: &InterpreterRegistry) -> Result<PathBuf> {
        let path = self.config_path();
        let mut stored = if path.is_file() {
            let plain = HostEnvironment::new(self.host.current_dir());
            load_config(Some(&path), &plain)
                .with_context(|| format!("Failed to re-read {}", path.display()))?
                .config
        } else {
            AppConfig::default()
        };

        stored.python = registry.to_config(&stored.python).await;
        save_config(&path, &stored)?;
        debug!(path = %path.display(), "Saved interpreter registry");
        Ok(path)
    }
}

/// Bootstrap against the live process environment.
pub fn bootstrap(config: Option<&Path>, interpreter: Option<String>) -> Result<CliContext> {
    bootstrap_with_host(config, interpreter, HostEnvironment::capture())
}

/// Bootstrap against an explicit host environment.
pub fn bootstrap_with_host(
    config: Option<&Path>,
    interpreter: Option<String>,
    host: HostEnvironment,
) -> Result<CliContext> {
    let LoadedConfig { mut config, source } =
        load_config(config, &host).context("Failed to load configuration")?;

    if let Some(interpreter) = interpreter {
        config.python.interpreter = interpreter;
    }
    debug!(source = ?source, interpreter = %config.python.interpreter, "CLI bootstrapped");

    Ok(CliContext {
        config,
        source,
        host,
        runner: Arc::new(TokioCommandRunner::new()),
        cancel: CancellationToken::new(),
    })
}
