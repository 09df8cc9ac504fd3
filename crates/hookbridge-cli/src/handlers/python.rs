//! `hookbridge python` handler.

use anyhow::{Context, Result};
use hookbridge_core::PythonError;

use crate::bootstrap::CliContext;
use crate::commands::PythonCommand;
use crate::handlers::interpreters;
use crate::presentation::capability_line;

/// Execute a `python` command. Without a subcommand, print a summary.
pub async fn execute(ctx: &CliContext, command: Option<PythonCommand>) -> Result<()> {
    match command {
        None => show_summary(ctx).await,
        Some(PythonCommand::Info) => show_info(ctx).await,
        Some(PythonCommand::Validate) => validate(ctx).await,
        Some(PythonCommand::Install { packages }) => install(ctx, packages).await,
        Some(PythonCommand::Interpreters { command }) => interpreters::execute(ctx, command).await,
    }
}

async fn show_summary(ctx: &CliContext) -> Result<()> {
    let manager = ctx.manager();
    let info = manager
        .interpreter_info(&ctx.cancel)
        .await
        .map_err(degraded)?;

    println!("Python Environment");
    println!("  Interpreter:  {}", info.path.display());
    println!("  Version:      {}", info.version);
    println!("  Found via:    {}", info.strategy);
    match &info.venv_path {
        Some(venv) => println!("  Virtual env:  {}", venv.display()),
        None if info.is_virtual => println!("  Virtual env:  yes"),
        None => println!("  Virtual env:  no"),
    }
    println!("  Capabilities: {}", capability_line(&info));

    let dirs = manager.plugin_dirs();
    let dirs: Vec<String> = dirs.iter().map(|dir| dir.display().to_string()).collect();
    println!("  Plugin dirs:  {}", dirs.join(", "));
    Ok(())
}

async fn show_info(ctx: &CliContext) -> Result<()> {
    let info = ctx
        .manager()
        .interpreter_info(&ctx.cancel)
        .await
        .map_err(degraded)?;
    println!("{}", serde_json::to_string_pretty(&*info)?);
    Ok(())
}

async fn validate(ctx: &CliContext) -> Result<()> {
    let info = ctx
        .manager()
        .validate_environment(&ctx.cancel)
        .await
        .map_err(degraded)
        .context("Python environment validation failed")?;

    println!("✓ Python {} at {} is ready", info.version, info.path.display());
    Ok(())
}

async fn install(ctx: &CliContext, packages: Vec<String>) -> Result<()> {
    let packages = if packages.is_empty() {
        ctx.config.python.required_packages.clone()
    } else {
        packages
    };
    if packages.is_empty() {
        println!("Nothing to install.");
        return Ok(());
    }

    ctx.manager()
        .install_dependencies(&packages, &ctx.cancel)
        .await
        .map_err(degraded)
        .context("Package installation failed")?;
    println!("✓ Installed {}", packages.join(", "));
    Ok(())
}

/// Explain that plugins are unavailable when no interpreter could be resolved.
fn degraded(err: PythonError) -> anyhow::Error {
    if err.is_total_resolution_failure() {
        anyhow::Error::new(err)
            .context("No usable Python interpreter; webhook plugins are disabled (API-only mode)")
    } else {
        err.into()
    }
}
