//! Command-line front end for the hookbridge Python runtime.
//!
//! `hookbridge python` reports which interpreter the webhook bridge would
//! use, validates it, installs packages into it, and administers the named
//! interpreter registry stored in the configuration file.
#![deny(unused_crate_dependencies)]

// Used by the binary only
use dotenvy as _;
use tokio as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod handlers;
pub mod parser;
pub mod presentation;

pub use bootstrap::{CliContext, bootstrap, bootstrap_with_host};
pub use commands::{Commands, InterpretersCommand, PythonCommand};
pub use parser::Cli;
