//! Registry of named interpreters.
//!
//! Reads take the shared lock and mutations the exclusive one. Validation
//! never holds the lock while processes run: the entry is marked
//! `Validating`, the lock is released for resolution and analysis, and the
//! outcome is committed under a fresh lock only if the same entry is still
//! registered. Every insertion gets a new generation number, so an entry
//! that was removed (or removed and re-added) during validation is left
//! alone.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use futures_util::future::join_all;
use hookbridge_core::config::is_auto_interpreter;
use hookbridge_core::{
    DiscoveryStrategy, HostEnvironment, InterpreterConfig, InterpreterInfo, InterpreterSummary,
    ManagedInterpreter, PythonConfig, PythonError, PythonResult, PythonVersion, RegistryError,
};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::ProbeContext;
use super::analyze::{AnalysisRequest, analyze_interpreter};
use super::discovery::{ResolvedInterpreter, find_system_interpreter, resolve_custom};
use super::inspect::detect_version;
use super::probe::ProbeSet;
use super::validate::validate_interpreter;
use super::venv::venv_python;
use crate::command::{CommandRunner, find_executable};

/// Commands probed by [`InterpreterRegistry::auto_discover_interpreters`].
pub const DISCOVERY_COMMANDS: [&str; 8] = [
    "python3",
    "python",
    "python3.13",
    "python3.12",
    "python3.11",
    "python3.10",
    "python3.9",
    "python3.8",
];

struct Slot {
    generation: u64,
    entry: ManagedInterpreter,
}

#[derive(Default)]
struct RegistryState {
    entries: BTreeMap<String, Slot>,
    active: Option<String>,
    next_generation: u64,
}

impl RegistryState {
    fn insert(&mut self, config: InterpreterConfig) {
        let generation = self.next_generation;
        self.next_generation += 1;
        self.entries.insert(
            config.name.clone(),
            Slot {
                generation,
                entry: ManagedInterpreter::new(config),
            },
        );
    }

    fn slot(&self, name: &str) -> Result<&Slot, RegistryError> {
        self.entries
            .get(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }
}

/// Named interpreters, their validation status, and the active selection.
pub struct InterpreterRegistry {
    ctx: ProbeContext,
    plugin_dirs: Vec<PathBuf>,
    probes: ProbeSet,
    state: RwLock<RegistryState>,
}

impl InterpreterRegistry {
    /// Empty registry. Timeouts, plugin directories and probes come from `python`.
    pub fn new(
        python: &PythonConfig,
        runner: Arc<dyn CommandRunner>,
        host: HostEnvironment,
    ) -> Self {
        Self {
            ctx: ProbeContext::new(runner, host, python.timeouts),
            plugin_dirs: python.effective_plugin_dirs(),
            probes: ProbeSet::for_config(python),
            state: RwLock::new(RegistryState::default()),
        }
    }

    /// Registry populated from `python.interpreters` and `python.active_interpreter`.
    ///
    /// Every entry starts `Unknown`. Names are trimmed; when two keys trim to
    /// the same name the first in key order wins. An active name that is not
    /// registered is dropped.
    pub fn from_config(
        python: &PythonConfig,
        runner: Arc<dyn CommandRunner>,
        host: HostEnvironment,
    ) -> Self {
        let mut state = RegistryState::default();
        for (key, config) in &python.interpreters {
            let name = key.trim();
            if name.is_empty() {
                warn!("Skipping configured interpreter with an empty name");
                continue;
            }
            if state.entries.contains_key(name) {
                warn!(name, key = %key, "Skipping configured interpreter with a duplicate name");
                continue;
            }
            let mut config = config.clone();
            config.name = name.to_string();
            state.insert(config);
        }

        state.active = match python.active_interpreter.as_deref().map(str::trim) {
            Some(name) if state.entries.contains_key(name) => Some(name.to_string()),
            Some(name) => {
                warn!(name = %name, "Configured active interpreter is not registered; ignoring");
                None
            }
            None => None,
        };

        debug!(count = state.entries.len(), "Loaded interpreter registry");
        Self {
            state: RwLock::new(state),
            ..Self::new(python, runner, host)
        }
    }

    /// Register a new interpreter under `name`.
    pub async fn add_interpreter(
        &self,
        name: &str,
        mut config: InterpreterConfig,
    ) -> Result<(), RegistryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }

        let mut state = self.state.write().await;
        if state.entries.contains_key(name) {
            return Err(RegistryError::AlreadyExists(name.to_string()));
        }
        config.name = name.to_string();
        state.insert(config);
        info!(name, "Registered Python interpreter");
        Ok(())
    }

    /// Remove an interpreter. The active one cannot be removed.
    pub async fn remove_interpreter(&self, name: &str) -> Result<InterpreterConfig, RegistryError> {
        let mut state = self.state.write().await;
        if state.active.as_deref() == Some(name) {
            return Err(RegistryError::ActiveInterpreter(name.to_string()));
        }
        let slot = state
            .entries
            .remove(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        info!(name, "Removed Python interpreter");
        Ok(slot.entry.config)
    }

    /// Select the interpreter new executor processes use.
    pub async fn set_active_interpreter(&self, name: &str) -> Result<(), RegistryError> {
        let mut state = self.state.write().await;
        state.slot(name)?;
        state.active = Some(name.to_string());
        info!(name, "Active Python interpreter changed");
        Ok(())
    }

    pub async fn active_name(&self) -> Option<String> {
        self.state.read().await.active.clone()
    }

    /// Snapshot of the active interpreter.
    pub async fn active_interpreter(&self) -> Result<ManagedInterpreter, RegistryError> {
        let state = self.state.read().await;
        let name = state
            .active
            .as_deref()
            .ok_or(RegistryError::NoActiveInterpreter)?;
        Ok(state.slot(name)?.entry.clone())
    }

    /// Snapshot of one interpreter.
    pub async fn interpreter(&self, name: &str) -> Result<ManagedInterpreter, RegistryError> {
        Ok(self.state.read().await.slot(name)?.entry.clone())
    }

    /// Summaries of every interpreter, ordered by name.
    pub async fn list_interpreters(&self) -> Vec<InterpreterSummary> {
        self.state
            .read()
            .await
            .entries
            .values()
            .map(|slot| slot.entry.summary())
            .collect()
    }

    pub async fn interpreter_info(&self, name: &str) -> Result<InterpreterSummary, RegistryError> {
        Ok(self.state.read().await.slot(name)?.entry.summary())
    }

    /// Resolve and analyze one interpreter, recording the outcome on its entry.
    pub async fn validate_interpreter(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> PythonResult<Arc<InterpreterInfo>> {
        let (generation, config) = {
            let mut state = self.state.write().await;
            let slot = state
                .entries
                .get_mut(name)
                .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
            slot.entry.begin_validation(Utc::now());
            (slot.generation, slot.entry.config.clone())
        };

        debug!(name, "Validating Python interpreter");
        let outcome = self.analyze_entry(&config, cancel).await;

        let mut state = self.state.write().await;
        match state
            .entries
            .get_mut(name)
            .filter(|slot| slot.generation == generation)
        {
            Some(slot) => {
                let committed = outcome.as_ref().map(Arc::clone).map_err(ToString::to_string);
                slot.entry.complete_validation(committed);
            }
            None => debug!(name, "Interpreter changed during validation; result discarded"),
        }
        drop(state);

        match &outcome {
            Ok(info) => info!(name, version = %info.version, "Python interpreter ready"),
            Err(err) => warn!(name, error = %err, "Python interpreter validation failed"),
        }
        outcome
    }

    /// Validate every registered interpreter concurrently.
    pub async fn validate_all_interpreters(
        &self,
        cancel: &CancellationToken,
    ) -> BTreeMap<String, PythonResult<()>> {
        let names: Vec<String> = self.state.read().await.entries.keys().cloned().collect();
        let results = join_all(
            names
                .iter()
                .map(|name| self.validate_interpreter(name, cancel)),
        )
        .await;

        names
            .into_iter()
            .zip(results.into_iter().map(|result| result.map(|_| ())))
            .collect()
    }

    /// Find interpreters on the search path.
    ///
    /// Returns ready-to-register configurations, already marked validated.
    /// Candidates resolving to the same file are reported once. The registry
    /// itself is not modified.
    pub async fn auto_discover_interpreters(
        &self,
        cancel: &CancellationToken,
    ) -> PythonResult<Vec<InterpreterConfig>> {
        let mut seen = HashSet::new();
        let mut found = Vec::new();

        for command in DISCOVERY_COMMANDS {
            let Some(path) =
                find_executable(command, self.ctx.host.search_path(), self.ctx.host.current_dir())
            else {
                continue;
            };
            let canonical = std::fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
            if !seen.insert(canonical) {
                continue;
            }

            let version = match self.probe_candidate(&path, cancel).await {
                Ok(version) => version,
                Err(err) if err.is_cancelled() => return Err(err),
                Err(err) => {
                    debug!(command, error = %err, "Skipping discovered interpreter");
                    continue;
                }
            };

            let mut config = InterpreterConfig::new(
                format!("Python {version} ({command})"),
                path.to_string_lossy(),
            );
            config.record_success(Utc::now());
            found.push(config);
        }

        info!(count = found.len(), "Auto-discovered Python interpreters");
        Ok(found)
    }

    /// Write the registry back into a copy of `base`.
    pub async fn to_config(&self, base: &PythonConfig) -> PythonConfig {
        let state = self.state.read().await;
        let mut config = base.clone();
        config.interpreters = state
            .entries
            .iter()
            .map(|(name, slot)| (name.clone(), slot.entry.config.clone()))
            .collect();
        config.active_interpreter.clone_from(&state.active);
        config
    }

    async fn probe_candidate(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> PythonResult<PythonVersion> {
        validate_interpreter(&self.ctx, path, cancel).await?;
        detect_version(&self.ctx, path, cancel).await
    }

    async fn analyze_entry(
        &self,
        config: &InterpreterConfig,
        cancel: &CancellationToken,
    ) -> PythonResult<Arc<InterpreterInfo>> {
        let resolved = self.resolve_entry(config, cancel).await?;
        let request = AnalysisRequest {
            resolved: &resolved,
            plugin_dirs: &self.plugin_dirs,
            overrides: &config.environment,
            probes: &self.probes,
        };
        Ok(Arc::new(analyze_interpreter(&self.ctx, request, cancel).await?))
    }

    async fn resolve_entry(
        &self,
        config: &InterpreterConfig,
        cancel: &CancellationToken,
    ) -> PythonResult<ResolvedInterpreter> {
        if let Some(venv) = config.venv_path.as_deref().filter(|_| config.use_uv) {
            let root = self.ctx.host.resolve(venv);
            let python = venv_python(&root);
            validate_interpreter(&self.ctx, &python, cancel)
                .await
                .map_err(|source| PythonError::VenvInvalid {
                    venv: root,
                    source: Box::new(source),
                })?;
            return Ok(ResolvedInterpreter {
                path: python,
                strategy: DiscoveryStrategy::Uv,
            });
        }

        if is_auto_interpreter(&config.path) {
            let path = find_system_interpreter(&self.ctx, cancel).await?;
            return Ok(ResolvedInterpreter {
                path,
                strategy: DiscoveryStrategy::Path,
            });
        }

        let path = resolve_custom(&self.ctx, config.path.trim(), cancel).await?;
        Ok(ResolvedInterpreter {
            path,
            strategy: DiscoveryStrategy::Custom,
        })
    }
}

impl std::fmt::Debug for InterpreterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterpreterRegistry")
            .field("ctx", &self.ctx)
            .field("plugin_dirs", &self.plugin_dirs)
            .finish_non_exhaustive()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use async_trait::async_trait;
    use hookbridge_core::InterpreterStatus;
    use tempfile::tempdir;
    use tokio::sync::Semaphore;

    use super::*;
    use crate::command::{CommandError, CommandOutput, CommandSpec};
    use crate::test_support::{ScriptedRunner, fake_python_reply, host_with_bin, touch_executable};

    /// `python3.8` reports 3.8, everything else 3.11.
    fn versioned_runner() -> Arc<ScriptedRunner> {
        Arc::new(ScriptedRunner::new(|spec| {
            let version = if spec.display_name() == "python3.8" {
                "3.8.18"
            } else {
                "3.11.9"
            };
            Ok(fake_python_reply(spec, version, &[]))
        }))
    }

    fn registry(dir: &Path, runner: Arc<dyn CommandRunner>) -> InterpreterRegistry {
        InterpreterRegistry::new(&PythonConfig::default(), runner, host_with_bin(dir))
    }

    fn entry(path: &Path) -> InterpreterConfig {
        InterpreterConfig::new("", path.to_string_lossy())
    }

    #[tokio::test]
    async fn test_add_and_list() {
        let dir = tempdir().unwrap();
        let registry = registry(dir.path(), versioned_runner());

        registry
            .add_interpreter("py311", InterpreterConfig::new("ignored", "python3.11"))
            .await
            .unwrap();
        registry
            .add_interpreter("py38", InterpreterConfig::new("", "python3.8"))
            .await
            .unwrap();

        let list = registry.list_interpreters().await;
        let names: Vec<_> = list.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["py311", "py38"]);
        assert!(list.iter().all(|s| s.status == InterpreterStatus::Unknown));
        assert!(list.iter().all(|s| s.version.is_none()));
    }

    #[tokio::test]
    async fn test_duplicate_and_empty_names_are_rejected() {
        let dir = tempdir().unwrap();
        let registry = registry(dir.path(), versioned_runner());
        registry
            .add_interpreter("py311", InterpreterConfig::new("", "/usr/bin/python3.11"))
            .await
            .unwrap();

        assert_eq!(
            registry
                .add_interpreter("py311", InterpreterConfig::new("", "/opt/other/python3"))
                .await,
            Err(RegistryError::AlreadyExists("py311".to_string()))
        );
        let kept = registry.interpreter("py311").await.unwrap();
        assert_eq!(kept.config.path, "/usr/bin/python3.11");
        assert_eq!(registry.list_interpreters().await.len(), 1);
        assert_eq!(
            registry.add_interpreter("  ", InterpreterConfig::default()).await,
            Err(RegistryError::EmptyName)
        );
    }

    #[tokio::test]
    async fn test_active_interpreter_rules() {
        let dir = tempdir().unwrap();
        let registry = registry(dir.path(), versioned_runner());

        assert_eq!(
            registry.active_interpreter().await.unwrap_err(),
            RegistryError::NoActiveInterpreter
        );
        assert_eq!(
            registry.set_active_interpreter("py311").await,
            Err(RegistryError::NotFound("py311".to_string()))
        );

        registry
            .add_interpreter("py311", InterpreterConfig::default())
            .await
            .unwrap();
        registry.set_active_interpreter("py311").await.unwrap();
        assert_eq!(registry.active_name().await.as_deref(), Some("py311"));

        assert_eq!(
            registry.remove_interpreter("py311").await,
            Err(RegistryError::ActiveInterpreter("py311".to_string()))
        );
        assert_eq!(
            registry.remove_interpreter("py27").await,
            Err(RegistryError::NotFound("py27".to_string()))
        );
        assert_eq!(registry.list_interpreters().await.len(), 1);
    }

    #[tokio::test]
    async fn test_two_interpreters_scenario() {
        let dir = tempdir().unwrap();
        let py38 = touch_executable(&dir.path().join("opt/bin/python3.8"));
        let py311 = touch_executable(&dir.path().join("opt/bin/python3.11"));
        let registry = registry(dir.path(), versioned_runner());
        let cancel = CancellationToken::new();

        registry.add_interpreter("py38", entry(&py38)).await.unwrap();
        registry.add_interpreter("py311", entry(&py311)).await.unwrap();

        let results = registry.validate_all_interpreters(&cancel).await;
        assert_eq!(results.len(), 2);
        assert!(results.values().all(Result::is_ok));

        registry.set_active_interpreter("py311").await.unwrap();
        let active = registry.active_interpreter().await.unwrap();
        assert_eq!(active.status(), InterpreterStatus::Ready);
        assert_eq!(active.info().unwrap().version, PythonVersion::new(3, 11, 9));
        assert_eq!(active.info().unwrap().strategy, DiscoveryStrategy::Custom);

        let py38 = registry.interpreter_info("py38").await.unwrap();
        assert_eq!(py38.version.as_deref(), Some("3.8.18"));
        assert!(py38.validated);
        assert!(py38.last_validated.is_some());
        assert!(py38.last_check.is_some());

        let removed = registry.remove_interpreter("py38").await.unwrap();
        assert_eq!(removed.name, "py38");
        assert_eq!(registry.list_interpreters().await.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_validation_enters_error_state() {
        let dir = tempdir().unwrap();
        let registry = registry(dir.path(), versioned_runner());
        registry
            .add_interpreter("broken", entry(&dir.path().join("missing/python3")))
            .await
            .unwrap();

        let err = registry
            .validate_interpreter("broken", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PythonError::NotFound { .. }));

        let summary = registry.interpreter_info("broken").await.unwrap();
        assert_eq!(summary.status, InterpreterStatus::Error);
        assert!(!summary.validated);
        assert_eq!(summary.validation_error.as_deref(), Some(err.to_string().as_str()));
        assert_eq!(summary.last_error, summary.validation_error);
        assert!(summary.version.is_none());
    }

    #[tokio::test]
    async fn test_revalidation_after_failure() {
        let dir = tempdir().unwrap();
        let python = dir.path().join("opt/bin/python3.11");
        let registry = registry(dir.path(), versioned_runner());
        let cancel = CancellationToken::new();
        registry.add_interpreter("py311", entry(&python)).await.unwrap();

        assert!(registry.validate_interpreter("py311", &cancel).await.is_err());
        touch_executable(&python);
        registry.validate_interpreter("py311", &cancel).await.unwrap();

        let summary = registry.interpreter_info("py311").await.unwrap();
        assert_eq!(summary.status, InterpreterStatus::Ready);
        assert!(summary.validation_error.is_none());
    }

    #[tokio::test]
    async fn test_unknown_name_validation() {
        let dir = tempdir().unwrap();
        let registry = registry(dir.path(), versioned_runner());

        let err = registry
            .validate_interpreter("nope", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PythonError::Registry(RegistryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_venv_entry_uses_environment_interpreter() {
        let dir = tempdir().unwrap();
        let python = touch_executable(&venv_python(&dir.path().join("envs/bridge")));
        let registry = registry(dir.path(), versioned_runner());
        let mut config = InterpreterConfig::new("", "auto");
        config.use_uv = true;
        config.venv_path = Some(PathBuf::from("envs/bridge"));
        config
            .environment
            .insert("BRIDGE_MODE".to_string(), "plugins".to_string());
        registry.add_interpreter("bridge", config).await.unwrap();

        let info = registry
            .validate_interpreter("bridge", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(info.path, python);
        assert_eq!(info.strategy, DiscoveryStrategy::Uv);
        assert_eq!(info.environment["BRIDGE_MODE"], "plugins");
    }

    /// Holds every command until the test adds a permit.
    struct GatedRunner {
        gate: Semaphore,
        inner: Arc<ScriptedRunner>,
    }

    #[async_trait]
    impl CommandRunner for GatedRunner {
        async fn run(
            &self,
            spec: &CommandSpec,
            cancel: &CancellationToken,
        ) -> Result<CommandOutput, CommandError> {
            let _permit = self.gate.acquire().await.unwrap();
            self.inner.run(spec, cancel).await
        }
    }

    #[tokio::test]
    async fn test_removed_entry_is_not_resurrected() {
        let dir = tempdir().unwrap();
        let python = touch_executable(&dir.path().join("opt/bin/python3.11"));
        let runner = Arc::new(GatedRunner {
            gate: Semaphore::new(0),
            inner: versioned_runner(),
        });
        let shared: Arc<dyn CommandRunner> = runner.clone();
        let registry = Arc::new(registry(dir.path(), shared));
        registry.add_interpreter("py311", entry(&python)).await.unwrap();

        let task = tokio::spawn({
            let registry = Arc::clone(&registry);
            async move {
                registry
                    .validate_interpreter("py311", &CancellationToken::new())
                    .await
            }
        });

        while registry.interpreter_info("py311").await.unwrap().status
            != InterpreterStatus::Validating
        {
            tokio::task::yield_now().await;
        }

        registry.remove_interpreter("py311").await.unwrap();
        registry.add_interpreter("py311", entry(&python)).await.unwrap();
        runner.gate.add_permits(1);

        assert!(task.await.unwrap().is_ok());
        let summary = registry.interpreter_info("py311").await.unwrap();
        assert_eq!(summary.status, InterpreterStatus::Unknown);
        assert!(!summary.validated);
    }

    #[tokio::test]
    async fn test_cancelled_validation_is_recorded() {
        let dir = tempdir().unwrap();
        let python = touch_executable(&dir.path().join("opt/bin/python3.11"));
        let registry = registry(dir.path(), versioned_runner());
        registry.add_interpreter("py311", entry(&python)).await.unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = registry
            .validate_interpreter("py311", &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(
            registry.interpreter_info("py311").await.unwrap().status,
            InterpreterStatus::Error
        );
    }

    #[tokio::test]
    async fn test_auto_discovery_dedupes_by_resolved_path() {
        let dir = tempdir().unwrap();
        let python3 = touch_executable(&dir.path().join("bin/python3"));
        std::os::unix::fs::symlink(&python3, dir.path().join("bin/python")).unwrap();
        touch_executable(&dir.path().join("bin/python3.8"));
        let registry = registry(dir.path(), versioned_runner());

        let found = registry
            .auto_discover_interpreters(&CancellationToken::new())
            .await
            .unwrap();
        let names: Vec<_> = found.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Python 3.11.9 (python3)", "Python 3.8.18 (python3.8)"]
        );
        assert!(found.iter().all(|c| c.validated && c.last_validated.is_some()));
        assert!(registry.list_interpreters().await.is_empty());
    }

    #[tokio::test]
    async fn test_config_round_trip() {
        let dir = tempdir().unwrap();
        let mut python = PythonConfig::default();
        python
            .interpreters
            .insert("py311".to_string(), InterpreterConfig::new("", "python3.11"));
        python.active_interpreter = Some("py311".to_string());

        let host = host_with_bin(dir.path());
        let registry = InterpreterRegistry::from_config(&python, versioned_runner(), host);
        assert_eq!(registry.active_name().await.as_deref(), Some("py311"));
        assert_eq!(registry.interpreter("py311").await.unwrap().name(), "py311");

        registry
            .add_interpreter("py38", InterpreterConfig::new("", "python3.8"))
            .await
            .unwrap();
        let saved = registry.to_config(&python).await;
        assert_eq!(saved.interpreters.len(), 2);
        assert_eq!(saved.interpreters["py38"].name, "py38");
        assert_eq!(saved.active_interpreter.as_deref(), Some("py311"));
    }

    #[tokio::test]
    async fn test_names_colliding_after_trim_keep_first() {
        let dir = tempdir().unwrap();
        let mut python = PythonConfig::default();
        python
            .interpreters
            .insert(" py311".to_string(), InterpreterConfig::new("", "/opt/a/python3"));
        python
            .interpreters
            .insert("py311".to_string(), InterpreterConfig::new("", "/opt/b/python3"));
        python.active_interpreter = Some("py311 ".to_string());

        let host = host_with_bin(dir.path());
        let registry = InterpreterRegistry::from_config(&python, versioned_runner(), host);
        assert_eq!(registry.list_interpreters().await.len(), 1);
        let kept = registry.interpreter("py311").await.unwrap();
        assert_eq!(kept.config.path, "/opt/a/python3");
        assert_eq!(registry.active_name().await.as_deref(), Some("py311"));
    }

    #[tokio::test]
    async fn test_unknown_active_interpreter_is_dropped() {
        let dir = tempdir().unwrap();
        let python = PythonConfig {
            active_interpreter: Some("ghost".to_string()),
            ..PythonConfig::default()
        };

        let host = host_with_bin(dir.path());
        let registry = InterpreterRegistry::from_config(&python, versioned_runner(), host);
        assert!(registry.active_name().await.is_none());
    }
}
