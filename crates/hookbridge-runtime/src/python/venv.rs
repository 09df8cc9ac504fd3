//! Virtual environment provisioning through `uv`.
//!
//! An existing environment directory is reused without running `uv` at
//! all. Otherwise `uv venv` creates it, `uv run` reports the interpreter it
//! resolves to, and that interpreter is validated before being returned.

use std::path::{Path, PathBuf};

use hookbridge_core::{HostEnvironment, PythonError, PythonResult, UvConfig};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::ProbeContext;
use super::uv::ensure_uv;
use super::validate::validate_interpreter;
use crate::command::CommandSpec;

/// Prints the running interpreter's real path.
pub const PRINT_EXECUTABLE_SCRIPT: &str = "import sys; print(sys.executable)";

/// A usable managed environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedVenv {
    /// Validated interpreter inside the environment.
    pub python: PathBuf,
    pub root: PathBuf,
    /// Whether this call created the environment.
    pub created: bool,
}

/// Interpreter location inside a virtual environment root.
pub fn venv_python(root: &Path) -> PathBuf {
    if cfg!(windows) {
        root.join("Scripts").join("python.exe")
    } else {
        root.join("bin").join("python")
    }
}

/// Project directory for managed environments: the configured path, or the
/// host working directory.
pub fn project_dir(uv: &UvConfig, host: &HostEnvironment) -> PathBuf {
    uv.project_dir().map_or_else(
        || host.current_dir().to_path_buf(),
        |path| host.resolve(path),
    )
}

/// Locate or create the environment `venv` inside `project`.
///
/// An absolute `venv` is used as is. When `uv` is missing and
/// `auto_download_uv` is set, its standalone installer runs first.
pub async fn provision_venv(
    ctx: &ProbeContext,
    project: &Path,
    venv: &Path,
    auto_download_uv: bool,
    cancel: &CancellationToken,
) -> PythonResult<ProvisionedVenv> {
    let project = ctx.host.resolve(project);
    let root = project.join(venv);

    if root.is_dir() {
        debug!(venv = %root.display(), "Reusing existing virtual environment");
        let python = venv_python(&root);
        validate_in_venv(ctx, &root, &python, cancel).await?;
        return Ok(ProvisionedVenv {
            python,
            root,
            created: false,
        });
    }

    let uv = ensure_uv(ctx, auto_download_uv, cancel).await?;

    info!(venv = %root.display(), uv = %uv.display(), "Creating virtual environment");
    let create = CommandSpec::new(&uv, ctx.timeouts.provision())
        .arg("venv")
        .arg(venv)
        .current_dir(&project);
    let output = ctx.runner.run(&create, cancel).await?;
    if !output.success() {
        return Err(PythonError::VenvCreateFailed {
            venv: root,
            reason: output.failure_reason(),
        });
    }

    let query = CommandSpec::new(&uv, ctx.timeouts.provision())
        .args(["run", "--no-project", "--python"])
        .arg(&root)
        .args(["python", "-c", PRINT_EXECUTABLE_SCRIPT])
        .current_dir(&project);
    let output = ctx.runner.run(&query, cancel).await?;
    if !output.success() {
        return Err(PythonError::VenvQueryFailed {
            venv: root,
            reason: output.failure_reason(),
        });
    }

    let Some(reported) = output.stdout.lines().map(str::trim).find(|l| !l.is_empty()) else {
        return Err(PythonError::VenvQueryFailed {
            venv: root,
            reason: "uv did not report an interpreter path".to_string(),
        });
    };
    let python = ctx.host.resolve(Path::new(reported));
    validate_in_venv(ctx, &root, &python, cancel).await?;

    info!(venv = %root.display(), python = %python.display(), "Virtual environment ready");
    Ok(ProvisionedVenv {
        python,
        root,
        created: true,
    })
}

async fn validate_in_venv(
    ctx: &ProbeContext,
    root: &Path,
    python: &Path,
    cancel: &CancellationToken,
) -> PythonResult<()> {
    validate_interpreter(ctx, python, cancel)
        .await
        .map_err(|source| PythonError::VenvInvalid {
            venv: root.to_path_buf(),
            source: Box::new(source),
        })
}
