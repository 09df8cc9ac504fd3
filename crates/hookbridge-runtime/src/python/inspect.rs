//! Interpreter version and virtual environment detection.

use std::path::{Path, PathBuf};

use hookbridge_core::{HostEnvironment, PythonError, PythonResult, PythonVersion};
use tokio_util::sync::CancellationToken;

use super::ProbeContext;
use crate::command::CommandSpec;

/// Prints `major.minor.micro`.
pub const VERSION_SCRIPT: &str = "import sys; print(f'{sys.version_info.major}.{sys.version_info.minor}.{sys.version_info.micro}')";

/// Marker file written into every virtual environment root.
pub const VENV_MARKER: &str = "pyvenv.cfg";

/// Conventional virtual environment directory name.
pub const VENV_DIR_NAME: &str = ".venv";

/// Outcome of the virtual environment heuristic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VenvDetection {
    pub is_virtual: bool,
    pub root: Option<PathBuf>,
}

impl VenvDetection {
    fn found(root: PathBuf) -> Self {
        Self {
            is_virtual: true,
            root: Some(root),
        }
    }
}

/// Ask the interpreter for its version.
///
/// Unparseable output is a hard error: such an interpreter is not usable.
pub async fn detect_version(
    ctx: &ProbeContext,
    path: &Path,
    cancel: &CancellationToken,
) -> PythonResult<PythonVersion> {
    let spec = CommandSpec::new(path, ctx.timeouts.probe()).args(["-c", VERSION_SCRIPT]);
    let output = ctx.runner.run(&spec, cancel).await?;

    if !output.success() {
        return Err(PythonError::InvalidRuntime {
            path: path.to_path_buf(),
            reason: format!("version probe failed ({})", output.failure_reason()),
        });
    }

    let line = output.stdout.lines().map(str::trim).find(|l| !l.is_empty());
    line.and_then(|line| line.parse().ok())
        .ok_or_else(|| PythonError::VersionParse {
            path: path.to_path_buf(),
            output: output.stdout.trim().to_string(),
        })
}

/// Decide whether `executable` lives in a virtual environment.
///
/// Best-effort and ordered, first positive signal wins:
/// 1. a `pyvenv.cfg` marker in the executable's parent or grandparent
///    directory (checked per directory, together with 2.)
/// 2. that directory being named `.venv`
/// 3. `VIRTUAL_ENV` set in the host environment
///
/// The path is not canonicalized: venv interpreters are usually symlinks
/// into a base installation.
pub fn detect_virtual_env(executable: &Path, host: &HostEnvironment) -> VenvDetection {
    let executable = host.resolve(executable);
    let bin_dir = executable.parent();
    let candidates = [
        bin_dir.and_then(Path::parent),
        bin_dir.and_then(Path::parent).and_then(Path::parent),
    ];

    for dir in candidates.into_iter().flatten() {
        if dir.join(VENV_MARKER).is_file() {
            return VenvDetection::found(dir.to_path_buf());
        }
        if dir.file_name().is_some_and(|name| name == VENV_DIR_NAME) {
            return VenvDetection::found(dir.to_path_buf());
        }
    }

    host.active_virtual_env()
        .map_or_else(VenvDetection::default, VenvDetection::found)
}
