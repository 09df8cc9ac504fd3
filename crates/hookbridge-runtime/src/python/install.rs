//! Package installation into a resolved interpreter.

use std::path::PathBuf;

use hookbridge_core::host::VIRTUAL_ENV_VAR;
use hookbridge_core::{PythonError, PythonResult};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::ProbeContext;
use super::uv::locate_uv;
use crate::command::CommandSpec;

/// How packages get installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Installer {
    /// `uv pip install` from the project directory, targeting `venv` when known.
    Uv {
        project: PathBuf,
        venv: Option<PathBuf>,
    },
    /// `<python> -m pip install`.
    Pip { python: PathBuf },
}

impl Installer {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Uv { .. } => "uv",
            Self::Pip { .. } => "pip",
        }
    }
}

/// Install `packages`. An empty list is a no-op.
pub async fn install_packages(
    ctx: &ProbeContext,
    installer: &Installer,
    packages: &[String],
    cancel: &CancellationToken,
) -> PythonResult<()> {
    if packages.is_empty() {
        return Ok(());
    }

    let spec = match installer {
        Installer::Uv { project, venv } => {
            let uv = locate_uv(&ctx.host).ok_or(PythonError::UvNotFound)?;
            let mut spec = CommandSpec::new(uv, ctx.timeouts.install())
                .args(["pip", "install"])
                .args(packages)
                .current_dir(project);
            if let Some(venv) = venv {
                spec = spec.env(VIRTUAL_ENV_VAR, venv.to_string_lossy());
            }
            spec
        }
        Installer::Pip { python } => CommandSpec::new(python, ctx.timeouts.install())
            .args(["-m", "pip", "install"])
            .args(packages),
    };

    info!(installer = installer.name(), ?packages, "Installing Python packages");
    let output = ctx.runner.run(&spec, cancel).await?;
    if !output.success() {
        return Err(PythonError::InstallFailed {
            installer: installer.name().to_string(),
            output: output.combined(),
        });
    }

    info!(installer = installer.name(), count = packages.len(), "Packages installed");
    Ok(())
}
