//! Single-interpreter manager with a time-bounded analysis cache.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use hookbridge_core::{
    DiscoveryStrategy, HostEnvironment, InterpreterInfo, PythonConfig, PythonError, PythonResult,
};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::ProbeContext;
use super::analyze::{AnalysisRequest, analyze_interpreter};
use super::discovery::{ResolvedInterpreter, resolve_interpreter};
use super::install::{Installer, install_packages};
use super::probe::ProbeSet;
use super::venv::project_dir;
use crate::command::CommandRunner;

/// Capabilities every executor needs.
pub const REQUIRED_CAPABILITIES: [&str; 3] = ["sys", "os", "json"];

/// Either of these satisfies the gRPC check.
const GRPC_MODULES: [&str; 2] = ["grpc", "grpcio"];

struct CachedInfo {
    info: Arc<InterpreterInfo>,
    analyzed_at: Instant,
}

/// Resolves, analyzes and caches the interpreter for one configuration.
///
/// The cache lock is held for the whole read-analyze-write sequence, so
/// concurrent callers that find the cache stale trigger a single analysis.
pub struct PythonManager {
    ctx: ProbeContext,
    config: PythonConfig,
    probes: ProbeSet,
    cache: Mutex<Option<CachedInfo>>,
}

impl PythonManager {
    pub fn new(
        config: PythonConfig,
        runner: Arc<dyn CommandRunner>,
        host: HostEnvironment,
    ) -> Self {
        let ctx = ProbeContext::new(runner, host, config.timeouts);
        Self {
            ctx,
            probes: ProbeSet::for_config(&config),
            config,
            cache: Mutex::new(None),
        }
    }

    /// Replace the capability probes.
    #[must_use]
    pub fn with_probes(mut self, probes: ProbeSet) -> Self {
        self.probes = probes;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &PythonConfig {
        &self.config
    }

    /// Configured plugin directories, or the defaults.
    #[must_use]
    pub fn plugin_dirs(&self) -> Vec<PathBuf> {
        self.config.effective_plugin_dirs()
    }

    /// Run discovery without analysis. Never cached.
    pub async fn discover_interpreter(
        &self,
        cancel: &CancellationToken,
    ) -> PythonResult<ResolvedInterpreter> {
        resolve_interpreter(&self.ctx, &self.config, cancel).await
    }

    /// Analysis of the resolved interpreter, reused while younger than
    /// `validation.cache_timeout`.
    pub async fn interpreter_info(
        &self,
        cancel: &CancellationToken,
    ) -> PythonResult<Arc<InterpreterInfo>> {
        let window = self.config.validation.cache_window();
        let mut cache = self.cache.lock().await;

        if let Some(cached) = cache
            .as_ref()
            .filter(|cached| cached.analyzed_at.elapsed() < window)
        {
            debug!(path = %cached.info.path.display(), "Using cached interpreter analysis");
            return Ok(Arc::clone(&cached.info));
        }

        let resolved = self.discover_interpreter(cancel).await?;
        let plugin_dirs = self.plugin_dirs();
        let overrides = BTreeMap::new();
        let request = AnalysisRequest {
            resolved: &resolved,
            plugin_dirs: &plugin_dirs,
            overrides: &overrides,
            probes: &self.probes,
        };
        let info = Arc::new(analyze_interpreter(&self.ctx, request, cancel).await?);

        *cache = Some(CachedInfo {
            info: Arc::clone(&info),
            analyzed_at: Instant::now(),
        });
        Ok(info)
    }

    /// Drop the cached analysis.
    pub async fn invalidate(&self) {
        *self.cache.lock().await = None;
    }

    /// Check that the interpreter can run the executor.
    ///
    /// With validation disabled only resolution and analysis have to succeed.
    pub async fn validate_environment(
        &self,
        cancel: &CancellationToken,
    ) -> PythonResult<Arc<InterpreterInfo>> {
        let info = self.interpreter_info(cancel).await?;
        let validation = &self.config.validation;
        if !validation.enabled {
            return Ok(info);
        }

        if let Some(minimum) = validation.min_version().filter(|min| info.version < *min) {
            return Err(PythonError::UnsupportedVersion {
                path: info.path.clone(),
                found: info.version,
                minimum,
            });
        }

        let required = REQUIRED_CAPABILITIES
            .into_iter()
            .chain(validation.required_capabilities.iter().map(String::as_str));
        if let Some(capability) = info.missing_capabilities(required).into_iter().next() {
            return Err(PythonError::CapabilityMissing {
                path: info.path.clone(),
                capability,
            });
        }

        if !GRPC_MODULES.iter().any(|module| info.has_capability(module)) {
            if validation.strict_mode {
                return Err(PythonError::CapabilityMissing {
                    path: info.path.clone(),
                    capability: GRPC_MODULES[0].to_string(),
                });
            }
            warn!(
                path = %info.path.display(),
                "gRPC is not available; plugins that use it will fail"
            );
        }

        for dir in self.plugin_dirs() {
            let resolved = self.ctx.host.resolve(dir.strip_prefix(".").unwrap_or(&dir));
            if resolved.is_dir() {
                info!(dir = %resolved.display(), "Plugin directory found");
            } else {
                debug!(dir = %resolved.display(), "Plugin directory missing");
            }
        }

        info!(path = %info.path.display(), version = %info.version, "Python environment validated");
        Ok(info)
    }

    /// Install packages into the resolved interpreter.
    ///
    /// Uses `uv pip` for uv-managed environments and `pip` otherwise. The
    /// cached analysis is dropped afterwards so capabilities are re-probed.
    pub async fn install_dependencies(
        &self,
        packages: &[String],
        cancel: &CancellationToken,
    ) -> PythonResult<()> {
        let info = self.interpreter_info(cancel).await?;
        let installer = if self.config.uv.enabled && info.strategy == DiscoveryStrategy::Uv {
            Installer::Uv {
                project: project_dir(&self.config.uv, &self.ctx.host),
                venv: info.venv_path.clone(),
            }
        } else {
            Installer::Pip {
                python: info.path.clone(),
            }
        };

        install_packages(&self.ctx, &installer, packages, cancel).await?;
        self.invalidate().await;
        Ok(())
    }
}

impl std::fmt::Debug for PythonManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PythonManager")
            .field("interpreter", &self.config.interpreter)
            .field("probes", &self.probes.len())
            .finish_non_exhaustive()
    }
}
