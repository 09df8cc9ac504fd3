//! Full analysis of a resolved interpreter.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::Utc;
use hookbridge_core::{InterpreterInfo, PythonResult};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::ProbeContext;
use super::discovery::ResolvedInterpreter;
use super::environment::compose_environment;
use super::inspect::{detect_version, detect_virtual_env};
use super::probe::{ProbeSet, probe_capabilities};

/// Inputs for [`analyze_interpreter`].
#[derive(Debug, Clone, Copy)]
pub struct AnalysisRequest<'a> {
    pub resolved: &'a ResolvedInterpreter,
    pub plugin_dirs: &'a [PathBuf],
    /// Variables applied over the composed environment.
    pub overrides: &'a BTreeMap<String, String>,
    pub probes: &'a ProbeSet,
}

/// Version, isolation, capabilities and executor environment of an interpreter.
pub async fn analyze_interpreter(
    ctx: &ProbeContext,
    request: AnalysisRequest<'_>,
    cancel: &CancellationToken,
) -> PythonResult<InterpreterInfo> {
    let path = &request.resolved.path;

    let (version, capabilities) = tokio::try_join!(
        detect_version(ctx, path, cancel),
        probe_capabilities(ctx, path, request.probes, cancel),
    )?;
    let venv = detect_virtual_env(path, &ctx.host);
    let environment =
        compose_environment(path, request.plugin_dirs, &ctx.host, request.overrides)?;

    debug!(
        path = %path.display(),
        %version,
        is_virtual = venv.is_virtual,
        "Analyzed Python interpreter"
    );

    Ok(InterpreterInfo {
        path: path.clone(),
        version,
        strategy: request.resolved.strategy,
        venv_path: venv.root,
        is_virtual: venv.is_virtual,
        capabilities,
        environment,
        discovered_at: Utc::now(),
    })
}

#[cfg(all(test, unix))]
mod tests {
    use std::sync::Arc;

    use hookbridge_core::host::{PATH_VAR, PYTHONPATH_VAR};
    use hookbridge_core::{DiscoveryStrategy, PythonVersion};
    use tempfile::tempdir;

    use super::*;
    use crate::test_support::{ScriptedRunner, context, host_with_bin, touch_executable};

    #[tokio::test]
    async fn test_analysis_of_venv_interpreter() {
        let dir = tempdir().unwrap();
        let python = touch_executable(&dir.path().join(".venv/bin/python"));
        let runner = Arc::new(ScriptedRunner::python("3.11.9", &["grpc", "grpcio", "fastapi"]));
        let ctx = context(runner, host_with_bin(dir.path()));
        let resolved = ResolvedInterpreter {
            path: python.clone(),
            strategy: DiscoveryStrategy::Uv,
        };
        let overrides = BTreeMap::from([("PYTHONUNBUFFERED".to_string(), "1".to_string())]);

        let info = analyze_interpreter(
            &ctx,
            AnalysisRequest {
                resolved: &resolved,
                plugin_dirs: &[PathBuf::from("plugins")],
                overrides: &overrides,
                probes: &ProbeSet::default(),
            },
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(info.path, python);
        assert_eq!(info.version, PythonVersion::new(3, 11, 9));
        assert_eq!(info.strategy, DiscoveryStrategy::Uv);
        assert!(info.is_virtual);
        assert_eq!(info.venv_path, Some(dir.path().join(".venv")));
        assert!(info.has_capability("sys"));
        assert!(info.has_capability("dataclasses"));
        assert!(!info.has_capability("grpc"));
        let venv_bin = dir.path().join(".venv/bin");
        assert!(info.environment[PATH_VAR].starts_with(&*venv_bin.to_string_lossy()));
        assert_eq!(
            info.environment[PYTHONPATH_VAR],
            dir.path().join("plugins").to_string_lossy()
        );
        assert_eq!(info.environment["PYTHONUNBUFFERED"], "1");
    }

    #[tokio::test]
    async fn test_unparseable_version_fails_analysis() {
        let dir = tempdir().unwrap();
        let python = touch_executable(&dir.path().join("bin/python3"));
        let runner = Arc::new(ScriptedRunner::python("unknown", &[]));
        let ctx = context(runner, host_with_bin(dir.path()));
        let resolved = ResolvedInterpreter {
            path: python,
            strategy: DiscoveryStrategy::Path,
        };

        let err = analyze_interpreter(
            &ctx,
            AnalysisRequest {
                resolved: &resolved,
                plugin_dirs: &[],
                overrides: &BTreeMap::new(),
                probes: &ProbeSet::empty(),
            },
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, hookbridge_core::PythonError::VersionParse { .. }));
    }
}
