//! Scripted command runner and filesystem fixtures for unit tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hookbridge_core::{HostEnvironment, TimeoutConfig};
use tokio_util::sync::CancellationToken;

use crate::command::{CommandError, CommandOutput, CommandRunner, CommandSpec};
use crate::python::ProbeContext;
use crate::python::inspect::VERSION_SCRIPT;
use crate::python::validate::VALIDATION_SCRIPT;

type Handler = dyn Fn(&CommandSpec) -> Result<CommandOutput, CommandError> + Send + Sync;

/// Runner that answers from a closure and records every call.
pub struct ScriptedRunner {
    handler: Box<Handler>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&CommandSpec) -> Result<CommandOutput, CommandError> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every program behaves like a healthy interpreter of `version`
    /// that cannot import the listed modules.
    pub fn python(version: &'static str, missing: &'static [&'static str]) -> Self {
        Self::new(move |spec| Ok(fake_python_reply(spec, version, missing)))
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count<P>(&self, predicate: P) -> usize
    where
        P: Fn(&CommandSpec) -> bool,
    {
        self.calls.lock().unwrap().iter().filter(|spec| predicate(spec)).count()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(
        &self,
        spec: &CommandSpec,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput, CommandError> {
        if cancel.is_cancelled() {
            return Err(CommandError::Cancelled {
                program: spec.display_name(),
            });
        }
        self.calls.lock().unwrap().push(spec.clone());
        (self.handler)(spec)
    }
}

/// The `-c` script of a Python invocation, if any.
pub fn script_of(spec: &CommandSpec) -> Option<String> {
    let args = spec.args_lossy();
    let position = args.iter().position(|arg| arg == "-c")?;
    args.get(position + 1).cloned()
}

/// Whether `spec` invokes `uv` with `subcommand`.
pub fn is_uv(spec: &CommandSpec, subcommand: &str) -> bool {
    spec.display_name().starts_with("uv")
        && spec.args_lossy().first().map(String::as_str) == Some(subcommand)
}

/// Reply the way a real interpreter would to the probes hookbridge sends.
pub fn fake_python_reply(spec: &CommandSpec, version: &str, missing: &[&str]) -> CommandOutput {
    let Some(script) = script_of(spec) else {
        return CommandOutput::ok("");
    };

    if script == VALIDATION_SCRIPT {
        let mut parts = version.split('.');
        let major = parts.next().unwrap_or("0");
        let minor = parts.next().unwrap_or("0");
        return CommandOutput::ok(format!("({major}, {minor})\n"));
    }
    if script == VERSION_SCRIPT {
        return CommandOutput::ok(format!("{version}\n"));
    }
    if let Some(module) = script.strip_prefix("import ") {
        if missing.contains(&module) {
            return CommandOutput::failed(
                1,
                format!("ModuleNotFoundError: No module named '{module}'"),
            );
        }
    }
    CommandOutput::ok("")
}

pub fn context(runner: Arc<ScriptedRunner>, host: HostEnvironment) -> ProbeContext {
    let timeouts = TimeoutConfig {
        probe_secs: 5,
        provision_secs: 5,
        install_secs: 5,
    };
    ProbeContext::new(runner, host, timeouts)
}

/// Host rooted at `dir` whose `PATH` is `dir/bin`.
pub fn host_with_bin(dir: &Path) -> HostEnvironment {
    let bin = dir.join("bin");
    fs::create_dir_all(&bin).unwrap();
    HostEnvironment::new(dir).with_var("PATH", bin.to_string_lossy())
}

/// Create an empty executable file (and its parents).
pub fn touch_executable(path: &Path) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, "#!/bin/sh\nexit 0\n").unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }
    path.to_path_buf()
}
