//! Ordered interpreter resolution.
//!
//! Strategies run in a fixed order and the first success wins:
//! 1. [`DiscoveryStrategy::Custom`]: the configured interpreter, when not `auto`
//! 2. [`DiscoveryStrategy::Uv`]: the managed virtual environment, when enabled
//! 3. [`DiscoveryStrategy::Path`]: `python3` / `python` on the host search path
//!
//! A failing strategy falls through to the next one. Only cancellation stops
//! the chain early. When nothing works the caller gets every reason at once.

use std::path::{Path, PathBuf};

use hookbridge_core::{
    DiscoveryAttempt, DiscoveryStrategy, PythonConfig, PythonError, PythonResult,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::ProbeContext;
use super::install::{Installer, install_packages};
use super::validate::validate_interpreter;
use super::venv::{project_dir, provision_venv};
use crate::command::find_executable;

/// Commands tried on the search path, in order.
#[cfg(windows)]
pub const PATH_CANDIDATES: [&str; 2] = ["python.exe", "python3.exe"];
#[cfg(not(windows))]
pub const PATH_CANDIDATES: [&str; 2] = ["python3", "python"];

/// A validated interpreter and the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInterpreter {
    pub path: PathBuf,
    pub strategy: DiscoveryStrategy,
}

/// Resolve a usable interpreter for `config`.
pub async fn resolve_interpreter(
    ctx: &ProbeContext,
    config: &PythonConfig,
    cancel: &CancellationToken,
) -> PythonResult<ResolvedInterpreter> {
    let mut attempts = Vec::new();

    if !config.is_auto() {
        let interpreter = config.interpreter.trim();
        match resolve_custom(ctx, interpreter, cancel).await {
            Ok(path) => return Ok(resolved(path, DiscoveryStrategy::Custom)),
            Err(err) => {
                if err.is_cancelled() {
                    return Err(err);
                }
                warn!(interpreter, error = %err, "Configured Python interpreter is not usable");
                attempts.push(DiscoveryAttempt::new(DiscoveryStrategy::Custom, err.to_string()));
            }
        }
    }

    if config.uv.enabled {
        match resolve_uv(ctx, config, cancel).await {
            Ok(path) => return Ok(resolved(path, DiscoveryStrategy::Uv)),
            Err(err) => {
                if err.is_cancelled() {
                    return Err(err);
                }
                debug!(error = %err, "uv-managed environment unavailable");
                attempts.push(DiscoveryAttempt::new(DiscoveryStrategy::Uv, err.to_string()));
            }
        }
    }

    match find_system_interpreter(ctx, cancel).await {
        Ok(path) => return Ok(resolved(path, DiscoveryStrategy::Path)),
        Err(PythonError::NoUsableRuntime { attempts: path_attempts }) => {
            attempts.extend(path_attempts);
        }
        Err(err) => return Err(err),
    }

    warn!(attempts = attempts.len(), "No usable Python interpreter found");
    Err(PythonError::NoUsableRuntime { attempts })
}

fn resolved(path: PathBuf, strategy: DiscoveryStrategy) -> ResolvedInterpreter {
    info!(path = %path.display(), %strategy, "Resolved Python interpreter");
    ResolvedInterpreter { path, strategy }
}

/// Validate a configured interpreter.
///
/// Paths (absolute, or containing a separator) are resolved against the host
/// working directory. Bare command names are looked up on the search path.
pub async fn resolve_custom(
    ctx: &ProbeContext,
    interpreter: &str,
    cancel: &CancellationToken,
) -> PythonResult<PathBuf> {
    let candidate = Path::new(interpreter);
    let path = if candidate.is_absolute() || candidate.components().count() > 1 {
        ctx.host.resolve(candidate)
    } else {
        find_executable(interpreter, ctx.host.search_path(), ctx.host.current_dir()).ok_or_else(
            || PythonError::NotOnPath {
                name: interpreter.to_string(),
            },
        )?
    };

    validate_interpreter(ctx, &path, cancel).await?;
    Ok(path)
}

async fn resolve_uv(
    ctx: &ProbeContext,
    config: &PythonConfig,
    cancel: &CancellationToken,
) -> PythonResult<PathBuf> {
    let project = project_dir(&config.uv, &ctx.host);
    let venv = provision_venv(
        ctx,
        &project,
        config.managed_venv(),
        config.auto_download_uv,
        cancel,
    )
    .await?;

    if venv.created && config.auto_install && !config.required_packages.is_empty() {
        let installer = Installer::Uv {
            project,
            venv: Some(venv.root.clone()),
        };
        if let Err(err) = install_packages(ctx, &installer, &config.required_packages, cancel).await
        {
            if err.is_cancelled() {
                return Err(err);
            }
            warn!(
                venv = %venv.root.display(),
                error = %err,
                "Automatic package installation failed"
            );
        }
    }

    Ok(venv.python)
}

/// First working interpreter among [`PATH_CANDIDATES`] on the host search path.
///
/// Fails with [`PythonError::NoUsableRuntime`] carrying a single
/// [`DiscoveryStrategy::Path`] attempt.
pub async fn find_system_interpreter(
    ctx: &ProbeContext,
    cancel: &CancellationToken,
) -> PythonResult<PathBuf> {
    let mut rejected = Vec::new();

    for name in PATH_CANDIDATES {
        let Some(path) = find_executable(name, ctx.host.search_path(), ctx.host.current_dir())
        else {
            continue;
        };

        match validate_interpreter(ctx, &path, cancel).await {
            Ok(()) => return Ok(path),
            Err(err) if err.is_cancelled() => return Err(err),
            Err(err) => {
                debug!(candidate = %path.display(), error = %err, "Rejected search path candidate");
                rejected.push(format!("{name}: {err}"));
            }
        }
    }

    let reason = if rejected.is_empty() {
        format!("none of {} found on the search path", PATH_CANDIDATES.join(", "))
    } else {
        rejected.join("; ")
    };
    Err(PythonError::NoUsableRuntime {
        attempts: vec![DiscoveryAttempt::new(DiscoveryStrategy::Path, reason)],
    })
}
