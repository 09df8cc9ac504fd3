//! Candidate interpreter validation.
//!
//! A candidate is usable when it exists, is executable, and reports a
//! Python 3 `version_info` when asked to run a one-line script.

use std::path::Path;

use hookbridge_core::{PythonError, PythonResult};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::ProbeContext;
use crate::command::CommandSpec;

/// Script whose output must be a `(3, N)` tuple.
pub const VALIDATION_SCRIPT: &str = "import sys; print(sys.version_info[:2])";

/// Check that `path` is a working Python 3 interpreter.
pub async fn validate_interpreter(
    ctx: &ProbeContext,
    path: &Path,
    cancel: &CancellationToken,
) -> PythonResult<()> {
    check_executable(path)?;

    let spec = CommandSpec::new(path, ctx.timeouts.probe()).args(["-c", VALIDATION_SCRIPT]);
    let output = ctx.runner.run(&spec, cancel).await?;

    if !output.success() {
        return Err(PythonError::InvalidRuntime {
            path: path.to_path_buf(),
            reason: format!("validation probe failed ({})", output.failure_reason()),
        });
    }

    match parse_version_tuple(&output.stdout) {
        Some((3, minor)) => {
            debug!(path = %path.display(), minor, "Validated Python interpreter");
            Ok(())
        }
        Some((major, minor)) => Err(PythonError::InvalidRuntime {
            path: path.to_path_buf(),
            reason: format!("Python {major}.{minor} is not Python 3"),
        }),
        None => Err(PythonError::InvalidRuntime {
            path: path.to_path_buf(),
            reason: format!("unexpected probe output {:?}", output.stdout.trim()),
        }),
    }
}

/// Parse `sys.version_info[:2]` output such as `(3, 11)`.
pub fn parse_version_tuple(output: &str) -> Option<(u32, u32)> {
    let inner = output
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())?
        .strip_prefix('(')?
        .strip_suffix(')')?;
    let (major, minor) = inner.split_once(',')?;
    Some((major.trim().parse().ok()?, minor.trim().parse().ok()?))
}

fn check_executable(path: &Path) -> PythonResult<()> {
    if !path.is_file() {
        return Err(PythonError::NotFound {
            path: path.to_path_buf(),
        });
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(path)
            .map_err(|_| PythonError::NotFound {
                path: path.to_path_buf(),
            })?
            .permissions()
            .mode();
        // Any execute bit (owner, group, or other)
        if mode & 0o111 == 0 {
            return Err(PythonError::NotExecutable {
                path: path.to_path_buf(),
            });
        }
    }

    Ok(())
}
