//! `hookbridge python interpreters` handler.
//!
//! Commands that change the registry write it back to the configuration file.

use std::path::PathBuf;

use anyhow::{Result, bail};
use hookbridge_core::{InterpreterConfig, RegistryError};
use hookbridge_runtime::InterpreterRegistry;

use crate::bootstrap::CliContext;
use crate::commands::InterpretersCommand;
use crate::presentation::summary_row;

pub async fn execute(ctx: &CliContext, command: InterpretersCommand) -> Result<()> {
    let registry = ctx.registry();
    match command {
        InterpretersCommand::List { validate } => {
            if validate {
                registry.validate_all_interpreters(&ctx.cancel).await;
                ctx.persist_registry(&registry).await?;
            }
            list(&registry).await;
            Ok(())
        }
        InterpretersCommand::Validate { name } => handle_validate(ctx, &registry, name).await,
        InterpretersCommand::Discover { save } => handle_discover(ctx, &registry, save).await,
        InterpretersCommand::Use { name } => {
            registry.set_active_interpreter(&name).await?;
            let path = ctx.persist_registry(&registry).await?;
            println!("✓ Active interpreter: {name} (saved to {})", path.display());
            Ok(())
        }
        InterpretersCommand::Add {
            name,
            path,
            venv,
            uv,
        } => handle_add(ctx, &registry, name, path, venv, uv).await,
        InterpretersCommand::Remove { name } => {
            registry.remove_interpreter(&name).await?;
            ctx.persist_registry(&registry).await?;
            println!("✓ Removed interpreter: {name}");
            Ok(())
        }
    }
}

async fn list(registry: &InterpreterRegistry) {
    let interpreters = registry.list_interpreters().await;
    if interpreters.is_empty() {
        println!(
            "No interpreters registered. Try `hookbridge python interpreters discover --save`."
        );
        return;
    }

    let active = registry.active_name().await;
    for summary in &interpreters {
        println!("{}", summary_row(summary, active.as_deref() == Some(summary.name.as_str())));
        if let Some(error) = &summary.validation_error {
            println!("      {error}");
        }
    }
}

async fn handle_validate(
    ctx: &CliContext,
    registry: &InterpreterRegistry,
    name: Option<String>,
) -> Result<()> {
    let results = match name {
        Some(name) => {
            let result = registry
                .validate_interpreter(&name, &ctx.cancel)
                .await
                .map(|_| ());
            vec![(name, result)]
        }
        None => registry
            .validate_all_interpreters(&ctx.cancel)
            .await
            .into_iter()
            .collect(),
    };
    ctx.persist_registry(registry).await?;

    let mut failed = 0;
    for (name, result) in &results {
        match result {
            Ok(()) => println!("✓ {name}"),
            Err(err) => {
                failed += 1;
                println!("✗ {name}: {err}");
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} interpreter(s) failed validation", results.len());
    }
    Ok(())
}

async fn handle_discover(
    ctx: &CliContext,
    registry: &InterpreterRegistry,
    save: bool,
) -> Result<()> {
    let found = registry.auto_discover_interpreters(&ctx.cancel).await?;
    if found.is_empty() {
        println!("No Python interpreters found on the search path.");
        return Ok(());
    }

    for config in &found {
        println!("  {:<32} {}", config.name, config.path);
    }
    if !save {
        return Ok(());
    }

    let mut added = 0;
    for config in found {
        let name = config.name.clone();
        match registry.add_interpreter(&name, config).await {
            Ok(()) => added += 1,
            Err(RegistryError::AlreadyExists(_)) => println!("  {name} is already registered"),
            Err(err) => return Err(err.into()),
        }
    }
    let path = ctx.persist_registry(registry).await?;
    println!("✓ Registered {added} interpreter(s) in {}", path.display());
    Ok(())
}

async fn handle_add(
    ctx: &CliContext,
    registry: &InterpreterRegistry,
    name: String,
    path: String,
    venv: Option<PathBuf>,
    uv: bool,
) -> Result<()> {
    let mut config = InterpreterConfig::new(name.as_str(), path);
    config.venv_path = venv;
    config.use_uv = uv;

    registry.add_interpreter(&name, config).await?;
    ctx.persist_registry(registry).await?;
    println!("✓ Added interpreter: {name}");
    Ok(())
}
