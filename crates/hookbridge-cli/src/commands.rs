//! Command enums.

use std::path::PathBuf;

use clap::Subcommand;

/// Top-level commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Inspect and manage the Python runtime (prints a summary without a subcommand)
    Python {
        /// Interpreter path or command name for this invocation only
        #[arg(long)]
        interpreter: Option<String>,

        #[command(subcommand)]
        command: Option<PythonCommand>,
    },
}

/// `python` subcommands.
#[derive(Subcommand)]
pub enum PythonCommand {
    /// Print the full interpreter analysis as JSON
    Info,
    /// Check that the interpreter can run plugins
    Validate,
    /// Install packages into the interpreter (defaults to python.required_packages)
    Install {
        /// Packages to install
        packages: Vec<String>,
    },
    /// Manage named interpreters
    Interpreters {
        #[command(subcommand)]
        command: InterpretersCommand,
    },
}

/// `python interpreters` subcommands.
#[derive(Subcommand)]
pub enum InterpretersCommand {
    /// List registered interpreters
    List {
        /// Validate every interpreter before listing
        #[arg(long)]
        validate: bool,
    },
    /// Validate one interpreter, or all of them
    Validate {
        /// Interpreter name (omit to validate all)
        name: Option<String>,
    },
    /// Find interpreters on the search path
    Discover {
        /// Register what was found
        #[arg(long)]
        save: bool,
    },
    /// Make an interpreter the active one
    Use {
        /// Interpreter name
        name: String,
    },
    /// Register an interpreter
    Add {
        /// Name to register under
        name: String,
        /// Executable path, command name, or "auto"
        path: String,
        /// Virtual environment used by this interpreter
        #[arg(long)]
        venv: Option<PathBuf>,
        /// Treat --venv as a uv-managed environment
        #[arg(long)]
        uv: bool,
    },
    /// Remove an interpreter
    Remove {
        /// Interpreter name
        name: String,
    },
}
