//! Locating, and optionally bootstrapping, the `uv` executable.
//!
//! `uv` is looked up on the host search path first, then in the directories
//! its official installer writes to, so a freshly bootstrapped `uv` is found
//! before the user's shell profile picks it up.

use std::path::PathBuf;

use hookbridge_core::{HostEnvironment, PythonError, PythonResult};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::ProbeContext;
use crate::command::{CommandSpec, find_executable};

#[cfg(windows)]
const UV_EXECUTABLE: &str = "uv.exe";
#[cfg(not(windows))]
const UV_EXECUTABLE: &str = "uv";

/// Official standalone installer.
#[cfg(windows)]
pub const UV_INSTALLER_URL: &str = "https://astral.sh/uv/install.ps1";
#[cfg(not(windows))]
pub const UV_INSTALLER_URL: &str = "https://astral.sh/uv/install.sh";

/// Keeps the installer from editing shell profiles.
const NO_MODIFY_PATH_VAR: &str = "UV_NO_MODIFY_PATH";

/// Find `uv` on the search path or in an installer target directory.
pub fn locate_uv(host: &HostEnvironment) -> Option<PathBuf> {
    find_executable(UV_EXECUTABLE, host.search_path(), host.current_dir()).or_else(|| {
        installer_bin_dirs(host)
            .into_iter()
            .map(|dir| dir.join(UV_EXECUTABLE))
            .find(|candidate| candidate.is_file())
    })
}

/// Directories the standalone installer may place `uv` in, most specific first.
fn installer_bin_dirs(host: &HostEnvironment) -> Vec<PathBuf> {
    let home_var = if cfg!(windows) { "USERPROFILE" } else { "HOME" };

    let mut dirs = Vec::new();
    if let Some(dir) = host.var("UV_INSTALL_DIR") {
        dirs.push(PathBuf::from(dir));
    }
    if let Some(dir) = host.var("XDG_BIN_HOME") {
        dirs.push(PathBuf::from(dir));
    }
    if let Some(home) = host.var(home_var) {
        dirs.push(PathBuf::from(home).join(".local").join("bin"));
    }
    if let Some(cargo) = host.var("CARGO_HOME") {
        dirs.push(PathBuf::from(cargo).join("bin"));
    }
    dirs.retain(|dir| !dir.as_os_str().is_empty());
    dirs
}

/// Locate `uv`, running the standalone installer first when allowed.
pub async fn ensure_uv(
    ctx: &ProbeContext,
    auto_download: bool,
    cancel: &CancellationToken,
) -> PythonResult<PathBuf> {
    if let Some(uv) = locate_uv(&ctx.host) {
        return Ok(uv);
    }
    if !auto_download {
        return Err(PythonError::UvNotFound);
    }

    warn!(url = UV_INSTALLER_URL, "uv not found, running its standalone installer");
    download_uv(ctx, cancel).await
}

/// Run the standalone `uv` installer and locate the result.
pub async fn download_uv(ctx: &ProbeContext, cancel: &CancellationToken) -> PythonResult<PathBuf> {
    let spec = installer_command(ctx)?;
    let output = ctx.runner.run(&spec, cancel).await?;
    if !output.success() {
        return Err(PythonError::InstallFailed {
            installer: "uv installer".to_string(),
            output: output.combined(),
        });
    }

    let uv = locate_uv(&ctx.host).ok_or(PythonError::UvNotFound)?;
    info!(uv = %uv.display(), "uv installed");
    Ok(uv)
}

#[cfg(windows)]
fn installer_command(ctx: &ProbeContext) -> PythonResult<CommandSpec> {
    let shell = shell_program(ctx, "powershell")?;
    Ok(CommandSpec::new(shell, ctx.timeouts.install())
        .args(["-ExecutionPolicy", "ByPass", "-Command"])
        .arg(format!("irm {UV_INSTALLER_URL} | iex"))
        .env(NO_MODIFY_PATH_VAR, "1"))
}

#[cfg(not(windows))]
fn installer_command(ctx: &ProbeContext) -> PythonResult<CommandSpec> {
    let shell = shell_program(ctx, "sh")?;
    Ok(CommandSpec::new(shell, ctx.timeouts.install())
        .arg("-c")
        .arg(format!("curl -LsSf {UV_INSTALLER_URL} | sh"))
        .env(NO_MODIFY_PATH_VAR, "1"))
}

fn shell_program(ctx: &ProbeContext, name: &str) -> PythonResult<PathBuf> {
    find_executable(name, ctx.host.search_path(), ctx.host.current_dir()).ok_or_else(|| {
        PythonError::NotOnPath {
            name: name.to_string(),
        }
    })
}
