//! Error taxonomy for interpreter resolution and the interpreter registry.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::domain::{DiscoveryStrategy, PythonVersion};

/// Coarse classification of a [`PythonError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Configured path or search candidate does not exist or is not executable.
    NotFound,
    /// Executable runs but fails the version or feature check.
    InvalidRuntime,
    /// `uv` is missing or one of its subcommands failed.
    Provisioning,
    /// A required capability is absent.
    CapabilityGap,
    /// Duplicate name, removal of the active entry, or unknown name.
    RegistryConflict,
    Timeout,
    Cancelled,
    /// Spawning a process, composing its environment, or installing packages failed.
    Io,
}

/// One failed discovery strategy, kept for the aggregate error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryAttempt {
    pub strategy: DiscoveryStrategy,
    pub reason: String,
}

impl DiscoveryAttempt {
    pub fn new(strategy: DiscoveryStrategy, reason: impl Into<String>) -> Self {
        Self {
            strategy,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for DiscoveryAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.strategy, self.reason)
    }
}

fn format_attempts(attempts: &[DiscoveryAttempt]) -> String {
    if attempts.is_empty() {
        return "no discovery strategy was applicable".to_string();
    }
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors that can occur while resolving, analyzing or managing an interpreter.
#[derive(Debug, Error)]
pub enum PythonError {
    /// The candidate file does not exist.
    #[error("Python interpreter not found at: {path}")]
    NotFound { path: PathBuf },

    /// The candidate exists but has no execute permission.
    #[error("Python interpreter at {path} is not executable")]
    NotExecutable { path: PathBuf },

    /// A bare command name could not be found on the search path.
    #[error("'{name}' was not found on the search path")]
    NotOnPath { name: String },

    /// The candidate ran but did not behave like a Python 3 interpreter.
    #[error("Python interpreter at {path} is not usable: {reason}")]
    InvalidRuntime { path: PathBuf, reason: String },

    /// The version probe printed something unparseable.
    #[error("Could not determine Python version of {path} from output {output:?}")]
    VersionParse { path: PathBuf, output: String },

    #[error("Python {found} at {path} is older than the required minimum {minimum}")]
    UnsupportedVersion {
        path: PathBuf,
        found: PythonVersion,
        minimum: PythonVersion,
    },

    #[error("uv was not found on the search path (see https://docs.astral.sh/uv/)")]
    UvNotFound,

    #[error("Failed to create virtual environment {venv}: {reason}")]
    VenvCreateFailed { venv: PathBuf, reason: String },

    #[error("Failed to query virtual environment {venv}: {reason}")]
    VenvQueryFailed { venv: PathBuf, reason: String },

    /// The environment exists but its interpreter failed validation.
    #[error("Virtual environment {venv} has no usable interpreter: {source}")]
    VenvInvalid {
        venv: PathBuf,
        #[source]
        source: Box<PythonError>,
    },

    #[error("Required Python capability '{capability}' is not available in {path}")]
    CapabilityMissing { path: PathBuf, capability: String },

    /// Every discovery strategy failed.
    #[error("No usable Python interpreter found ({})", format_attempts(.attempts))]
    NoUsableRuntime { attempts: Vec<DiscoveryAttempt> },

    #[error("Package installation with {installer} failed: {output}")]
    InstallFailed { installer: String, output: String },

    #[error("{program} did not finish within {}s", .timeout.as_secs_f64())]
    Timeout { program: String, timeout: Duration },

    #[error("Cancelled while running {program}")]
    Cancelled { program: String },

    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to compose process environment: {0}")]
    Environment(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Result type for interpreter operations.
pub type PythonResult<T> = Result<T, PythonError>;

impl PythonError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. }
            | Self::NotExecutable { .. }
            | Self::NotOnPath { .. }
            | Self::NoUsableRuntime { .. } => ErrorKind::NotFound,
            Self::InvalidRuntime { .. }
            | Self::VersionParse { .. }
            | Self::UnsupportedVersion { .. } => ErrorKind::InvalidRuntime,
            Self::UvNotFound
            | Self::VenvCreateFailed { .. }
            | Self::VenvQueryFailed { .. }
            | Self::VenvInvalid { .. } => ErrorKind::Provisioning,
            Self::CapabilityMissing { .. } => ErrorKind::CapabilityGap,
            Self::Registry(_) => ErrorKind::RegistryConflict,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::InstallFailed { .. } | Self::Spawn { .. } | Self::Environment(_) => ErrorKind::Io,
        }
    }

    /// Whether no interpreter could be resolved by any strategy.
    ///
    /// A bootstrap uses this to choose a degraded mode instead of failing
    /// outright; single-candidate failures return `false`.
    #[must_use]
    pub const fn is_total_resolution_failure(&self) -> bool {
        matches!(self, Self::NoUsableRuntime { .. })
    }

    /// Whether the caller cancelled the operation, including a cancellation
    /// wrapped by a provisioning failure.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled { .. } => true,
            Self::VenvInvalid { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}

/// Registry misuse. These are caller errors, never system faults.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Interpreter '{0}' is already registered")]
    AlreadyExists(String),

    #[error("Interpreter '{0}' is not registered")]
    NotFound(String),

    #[error("Interpreter '{0}' is active and cannot be removed")]
    ActiveInterpreter(String),

    #[error("No active interpreter is set")]
    NoActiveInterpreter,

    #[error("Interpreter name must not be empty")]
    EmptyName,
}
