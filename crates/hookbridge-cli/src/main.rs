//! CLI entry point - the composition root.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use hookbridge_cli::{Cli, Commands, bootstrap, handlers};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before the host environment is captured
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Python {
            interpreter,
            command,
        } => {
            let ctx = bootstrap(cli.config.as_deref(), interpreter)?;

            let cancel = ctx.cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            });

            handlers::python::execute(&ctx, command).await
        }
    }
}

/// Log to stderr. `--verbose` forces debug, otherwise `RUST_LOG` or `warn`.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
