//! Python interpreter discovery, analysis and management.
//!
//! Leaf to root:
//! - [`probe`]: capability probing (one subprocess per module or feature)
//! - [`inspect`]: version and virtual environment detection
//! - [`environment`]: executor environment composition
//! - [`uv`]: locating and bootstrapping `uv`
//! - [`venv`]: `uv`-managed environment provisioning
//! - [`discovery`]: ordered resolution strategies
//! - [`manager`]: single cached interpreter
//! - [`registry`]: named interpreters with a validation state machine

pub mod analyze;
pub mod discovery;
pub mod environment;
pub mod inspect;
pub mod install;
pub mod manager;
pub mod probe;
pub mod registry;
pub mod uv;
pub mod validate;
pub mod venv;

use std::sync::Arc;

use hookbridge_core::{HostEnvironment, TimeoutConfig};

use crate::command::CommandRunner;

pub use analyze::{AnalysisRequest, analyze_interpreter};
pub use discovery::{ResolvedInterpreter, find_system_interpreter, resolve_interpreter};
pub use environment::compose_environment;
pub use inspect::{VenvDetection, detect_version, detect_virtual_env};
pub use install::{Installer, install_packages};
pub use manager::PythonManager;
pub use probe::{CapabilityProbe, ProbeSet, probe_capabilities};
pub use registry::InterpreterRegistry;
pub use uv::{ensure_uv, locate_uv};
pub use validate::validate_interpreter;
pub use venv::{ProvisionedVenv, project_dir, provision_venv, venv_python};

/// Shared inputs for everything that spawns a process.
#[derive(Clone)]
pub struct ProbeContext {
    pub runner: Arc<dyn CommandRunner>,
    pub host: Arc<HostEnvironment>,
    pub timeouts: TimeoutConfig,
}

impl ProbeContext {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        host: HostEnvironment,
        timeouts: TimeoutConfig,
    ) -> Self {
        Self {
            runner,
            host: Arc::new(host),
            timeouts,
        }
    }
}

impl std::fmt::Debug for ProbeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeContext")
            .field("current_dir", &self.host.current_dir())
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}
