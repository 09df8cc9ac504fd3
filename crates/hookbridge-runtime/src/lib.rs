//! Process-level Python runtime resolution for hookbridge.
//!
//! Everything here that touches the operating system goes through
//! [`CommandRunner`]: validating candidates, probing capabilities,
//! provisioning `uv` environments and installing packages. Each call carries
//! a timeout and a cancellation token.
//!
//! Two entry points sit on top:
//! - [`PythonManager`] resolves and caches the interpreter for one configuration.
//! - [`InterpreterRegistry`] tracks named interpreters, their validation
//!   status, and which one is active.
#![deny(unused_crate_dependencies)]

pub mod command;
pub mod python;

#[cfg(test)]
mod test_support;

pub use command::{CommandError, CommandOutput, CommandRunner, CommandSpec, TokioCommandRunner};
pub use python::{
    AnalysisRequest, CapabilityProbe, Installer, InterpreterRegistry, ProbeContext, ProbeSet,
    ProvisionedVenv, PythonManager, ResolvedInterpreter, analyze_interpreter, compose_environment,
    ensure_uv, find_system_interpreter, install_packages, locate_uv, probe_capabilities,
    provision_venv, resolve_interpreter, validate_interpreter,
};
