//! Core domain types for the hookbridge Python runtime.
//!
//! This crate holds everything about interpreter resolution that does not
//! spawn a process: configuration and its loading, the analyzed-interpreter
//! snapshot, registry entry state, the host environment snapshot, and the
//! error taxonomy. Process-level work lives in `hookbridge-runtime`.
#![deny(unused_crate_dependencies)]

pub mod config;
pub mod domain;
pub mod error;
pub mod host;

pub use config::{
    AppConfig, ConfigError, ConfigSource, ConfigValidationError, InterpreterConfig, LoadedConfig,
    PythonConfig, TimeoutConfig, UvConfig, ValidationConfig, load_config, save_config,
    validate_config,
};
pub use domain::{
    DiscoveryStrategy, InterpreterInfo, InterpreterState, InterpreterStatus, InterpreterSummary,
    ManagedInterpreter, PythonVersion, VersionParseError,
};
pub use error::{DiscoveryAttempt, ErrorKind, PythonError, PythonResult, RegistryError};
pub use host::HostEnvironment;
