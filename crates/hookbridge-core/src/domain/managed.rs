//! Registry entry types and the interpreter status state machine.
//!
//! ```text
//! Unknown ──► Validating ──► Ready(info)
//!                 ▲    └───► Error(message)
//!                 └──────────────┘  (re-validation)
//! ```
//!
//! Nothing moves an entry into a failed state except an explicit
//! validation attempt.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DiscoveryStrategy, InterpreterInfo};
use crate::config::InterpreterConfig;

/// Externally visible status of a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpreterStatus {
    Unknown,
    Validating,
    Ready,
    Error,
}

impl InterpreterStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Validating => "validating",
            Self::Ready => "ready",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for InterpreterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of a registry entry. Analysis results only exist while `Ready`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum InterpreterState {
    #[default]
    Unknown,
    Validating,
    Ready(Arc<InterpreterInfo>),
    Error(String),
}

impl InterpreterState {
    #[must_use]
    pub const fn status(&self) -> InterpreterStatus {
        match self {
            Self::Unknown => InterpreterStatus::Unknown,
            Self::Validating => InterpreterStatus::Validating,
            Self::Ready(_) => InterpreterStatus::Ready,
            Self::Error(_) => InterpreterStatus::Error,
        }
    }
}

/// One named interpreter tracked by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedInterpreter {
    pub config: InterpreterConfig,
    state: InterpreterState,
    last_checked: Option<DateTime<Utc>>,
}

impl ManagedInterpreter {
    /// New entry in the `Unknown` state.
    #[must_use]
    pub fn new(config: InterpreterConfig) -> Self {
        Self {
            config,
            state: InterpreterState::Unknown,
            last_checked: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    #[must_use]
    pub const fn state(&self) -> &InterpreterState {
        &self.state
    }

    #[must_use]
    pub const fn status(&self) -> InterpreterStatus {
        self.state.status()
    }

    /// Analysis result, present only while `Ready`.
    #[must_use]
    pub const fn info(&self) -> Option<&Arc<InterpreterInfo>> {
        match &self.state {
            InterpreterState::Ready(info) => Some(info),
            _ => None,
        }
    }

    /// Error of the last failed validation, while in the `Error` state.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        match &self.state {
            InterpreterState::Error(message) => Some(message),
            _ => None,
        }
    }

    #[must_use]
    pub const fn last_checked(&self) -> Option<DateTime<Utc>> {
        self.last_checked
    }

    /// Enter `Validating`. Any previous analysis is dropped.
    pub fn begin_validation(&mut self, at: DateTime<Utc>) {
        self.state = InterpreterState::Validating;
        self.last_checked = Some(at);
    }

    /// Commit a validation outcome and mirror it into the config.
    pub fn complete_validation(&mut self, outcome: Result<Arc<InterpreterInfo>, String>) {
        match outcome {
            Ok(info) => {
                self.config.record_success(info.discovered_at);
                self.state = InterpreterState::Ready(info);
            }
            Err(message) => {
                self.config.record_failure(message.clone());
                self.state = InterpreterState::Error(message);
            }
        }
    }

    /// Plain descriptive record for admin surfaces.
    #[must_use]
    pub fn summary(&self) -> InterpreterSummary {
        let info = self.info();
        InterpreterSummary {
            name: self.config.name.clone(),
            path: self.config.path.clone(),
            status: self.status(),
            validated: self.config.validated,
            last_validated: self.config.last_validated,
            validation_error: self.config.validation_error.clone(),
            last_error: self.last_error().map(str::to_string),
            last_check: self.last_checked,
            use_uv: self.config.use_uv,
            venv_path: self.config.venv_path.clone(),
            required_packages: self.config.required_packages.clone(),
            environment: self.config.environment.clone(),
            version: info.map(|info| info.version.to_string()),
            executable: info.map(|info| info.path.clone()),
            is_virtual: info.map(|info| info.is_virtual),
            uv_managed: info.map(|info| info.strategy == DiscoveryStrategy::Uv),
        }
    }
}

/// Descriptive snapshot of a registry entry.
///
/// Contains only plain values so callers can render interpreter health
/// without depending on internal types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpreterSummary {
    pub name: String,
    pub path: String,
    pub status: InterpreterStatus,
    pub validated: bool,
    pub last_validated: Option<DateTime<Utc>>,
    pub validation_error: Option<String>,
    pub last_error: Option<String>,
    pub last_check: Option<DateTime<Utc>>,
    pub use_uv: bool,
    pub venv_path: Option<PathBuf>,
    pub required_packages: Vec<String>,
    pub environment: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executable: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_virtual: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uv_managed: Option<bool>,
}
