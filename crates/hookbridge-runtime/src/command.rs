//! Subprocess execution with bounded waits and cancellation.
//!
//! Every process spawned during interpreter discovery goes through
//! [`CommandRunner`], so probes can be scripted in tests and no call can
//! block longer than its [`CommandSpec::timeout`].

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use hookbridge_core::PythonError;
use thiserror::Error;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A single process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub current_dir: Option<PathBuf>,
    /// Variables added on top of the inherited environment.
    pub envs: BTreeMap<String, String>,
    pub timeout: Duration,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            envs: BTreeMap::new(),
            timeout,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|arg| arg.as_ref().to_os_string()));
        self
    }

    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.insert(key.into(), value.into());
        self
    }

    /// Short program name for logs and errors.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.program
            .file_name()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .into_owned()
    }

    /// Arguments as lossy UTF-8 strings.
    #[must_use]
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Successful output with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given exit code and stderr.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.code, Some(0))
    }

    /// Stdout and stderr joined, trimmed.
    #[must_use]
    pub fn combined(&self) -> String {
        let stdout = self.stdout.trim();
        let stderr = self.stderr.trim();
        match (stdout.is_empty(), stderr.is_empty()) {
            (false, false) => format!("{stdout}\n{stderr}"),
            (false, true) => stdout.to_string(),
            (true, _) => stderr.to_string(),
        }
    }

    /// Human-readable reason for a failed run.
    #[must_use]
    pub fn failure_reason(&self) -> String {
        let status = self
            .code
            .map_or_else(|| "terminated by signal".to_string(), |code| format!("exit code {code}"));

        // Some tools report errors on stdout; prefer stderr when present.
        let detail = if self.stderr.trim().is_empty() {
            self.stdout.trim()
        } else {
            self.stderr.trim()
        };
        match detail.lines().last() {
            Some(line) => format!("{status}: {line}"),
            None => status,
        }
    }
}

/// Errors from running a process.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Failed to run {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {timeout:?}")]
    TimedOut { program: String, timeout: Duration },

    #[error("{program} was cancelled")]
    Cancelled { program: String },
}

impl From<CommandError> for PythonError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Io { program, source } => Self::Spawn { program, source },
            CommandError::TimedOut { program, timeout } => Self::Timeout { program, timeout },
            CommandError::Cancelled { program } => Self::Cancelled { program },
        }
    }
}

/// Runs processes to completion.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `spec` and capture its output.
    ///
    /// A non-zero exit is not an error: callers inspect
    /// [`CommandOutput::success`]. Implementations must give up after
    /// `spec.timeout` and as soon as `cancel` fires.
    async fn run(
        &self,
        spec: &CommandSpec,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput, CommandError>;
}

/// [`CommandRunner`] backed by `tokio::process`.
///
/// The child is killed when the wait is abandoned, on timeout or cancellation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioCommandRunner;

impl TokioCommandRunner {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(
        &self,
        spec: &CommandSpec,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput, CommandError> {
        let program = spec.display_name();
        if cancel.is_cancelled() {
            return Err(CommandError::Cancelled { program });
        }

        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .envs(&spec.envs)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &spec.current_dir {
            command.current_dir(dir);
        }

        debug!(program = %spec.program.display(), args = ?spec.args, "Running command");

        let child = command.spawn().map_err(|source| CommandError::Io {
            program: program.clone(),
            source,
        })?;

        let output = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                return Err(CommandError::Cancelled { program });
            }
            result = tokio::time::timeout(spec.timeout, child.wait_with_output()) => match result {
                Ok(Ok(output)) => output,
                Ok(Err(source)) => return Err(CommandError::Io { program, source }),
                Err(_) => {
                    return Err(CommandError::TimedOut {
                        program,
                        timeout: spec.timeout,
                    });
                }
            },
        };

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Find `name` on the host search path.
///
/// Only the supplied `PATH` value is consulted, never the live process
/// environment.
pub fn find_executable(name: &str, search_path: Option<&str>, cwd: &Path) -> Option<PathBuf> {
    let search_path = search_path.filter(|path| !path.is_empty())?;
    which::which_in(name, Some(search_path), cwd).ok()
}
