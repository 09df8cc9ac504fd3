//! End-to-end interpreter resolution against fake `python` and `uv` scripts.
//!
//! The scripts answer the exact probes hookbridge sends, so these tests run
//! the real tokio process runner without a Python installation.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use hookbridge_core::{
    DiscoveryStrategy, HostEnvironment, InterpreterConfig, InterpreterStatus, PythonConfig,
    PythonError, TimeoutConfig,
};
use hookbridge_runtime::{
    CommandRunner, InterpreterRegistry, ProbeContext, PythonManager, TokioCommandRunner,
    validate_interpreter,
};
use tempfile::{TempDir, tempdir};
use tokio_util::sync::CancellationToken;

fn fake_python(version: &str) -> String {
    let (major, rest) = version.split_once('.').unwrap();
    let minor = rest.split('.').next().unwrap();
    format!(
        r#"#!/bin/sh
if [ "$1" = "-c" ]; then
  case "$2" in
    "import sys; print(sys.version_info[:2])") echo "({major}, {minor})" ;;
    *sys.version_info.major*) echo "{version}" ;;
    "import grpc"|"import grpcio"|"import fastapi")
      echo "ModuleNotFoundError: No module named '${{2#import }}'" >&2
      exit 1 ;;
  esac
fi
exit 0
"#
    )
}

const SLOW_PYTHON: &str = "#!/bin/sh\nexec sleep 5\n";

fn write_script(path: &Path, body: &str) -> PathBuf {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    path.to_path_buf()
}

/// `uv` that copies `template` into new environments and logs its arguments.
fn fake_uv(bin: &Path, template: &Path, log: &Path) {
    let body = format!(
        r#"#!/bin/sh
echo "$*" >> "{log}"
case "$1" in
  venv)
    mkdir -p "$2/bin"
    cp "{template}" "$2/bin/python"
    chmod 755 "$2/bin/python"
    echo "home = /usr/bin" > "$2/pyvenv.cfg"
    echo "Creating virtual environment at: $2" >&2 ;;
  run)
    echo "$4/bin/python" ;;
esac
exit 0
"#,
        log = log.display(),
        template = template.display(),
    );
    write_script(&bin.join("uv"), &body);
}

struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("bin")).unwrap();
        fs::create_dir_all(dir.path().join("project")).unwrap();
        Self { dir }
    }

    fn bin(&self) -> PathBuf {
        self.dir.path().join("bin")
    }

    fn project(&self) -> PathBuf {
        self.dir.path().join("project")
    }

    fn uv_log(&self) -> PathBuf {
        self.dir.path().join("uv.log")
    }

    fn host(&self) -> HostEnvironment {
        HostEnvironment::new(self.project())
            .with_var("PATH", self.bin().to_string_lossy())
            .without_var("VIRTUAL_ENV")
    }

    fn with_uv(&self) -> &Self {
        let template = write_script(
            &self.dir.path().join("template/python"),
            &fake_python("3.11.7"),
        );
        fake_uv(&self.bin(), &template, &self.uv_log());
        self
    }

    fn uv_calls(&self, subcommand: &str) -> usize {
        fs::read_to_string(self.uv_log())
            .unwrap_or_default()
            .lines()
            .filter(|line| line.split_whitespace().next() == Some(subcommand))
            .count()
    }

    fn manager(&self, config: PythonConfig) -> PythonManager {
        PythonManager::new(config, Arc::new(TokioCommandRunner::new()), self.host())
    }
}

fn quick_timeouts() -> TimeoutConfig {
    TimeoutConfig {
        probe_secs: 10,
        provision_secs: 10,
        install_secs: 10,
    }
}

#[tokio::test]
async fn test_cold_start_provisions_managed_environment() {
    let sandbox = Sandbox::new();
    sandbox.with_uv();
    let cancel = CancellationToken::new();

    let info = sandbox
        .manager(PythonConfig::default())
        .interpreter_info(&cancel)
        .await
        .unwrap();

    let venv = sandbox.project().join(".venv");
    assert_eq!(info.strategy, DiscoveryStrategy::Uv);
    assert_eq!(info.path, venv.join("bin/python"));
    assert_eq!(info.version.to_string(), "3.11.7");
    assert!(info.is_virtual);
    assert_eq!(info.venv_path.as_deref(), Some(venv.as_path()));
    for module in ["sys", "os", "json", "requests"] {
        assert!(info.has_capability(module), "{module} should import");
    }
    assert!(!info.has_capability("grpc"));
    assert!(info.environment["PATH"].starts_with(&*venv.join("bin").to_string_lossy()));
    assert_eq!(sandbox.uv_calls("venv"), 1);

    // A fresh manager reuses the environment instead of creating it again.
    let again = sandbox
        .manager(PythonConfig::default())
        .discover_interpreter(&cancel)
        .await
        .unwrap();
    assert_eq!(again.path, info.path);
    assert_eq!(sandbox.uv_calls("venv"), 1);
    assert_eq!(sandbox.uv_calls("run"), 1);
}

#[tokio::test]
async fn test_validate_environment_passes_without_grpc() {
    let sandbox = Sandbox::new();
    sandbox.with_uv();
    fs::create_dir_all(sandbox.project().join("plugins")).unwrap();

    let info = sandbox
        .manager(PythonConfig::default())
        .validate_environment(&CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(info.strategy, DiscoveryStrategy::Uv);
    let plugins = sandbox.project().join("plugins");
    assert!(info.environment["PYTHONPATH"].starts_with(&*plugins.to_string_lossy()));
}

#[tokio::test]
async fn test_bad_explicit_path_falls_back_to_search_path() {
    let sandbox = Sandbox::new();
    let system = write_script(&sandbox.bin().join("python3"), &fake_python("3.10.14"));

    let mut config = PythonConfig::default();
    config.interpreter = "/nonexistent/python3".to_string();
    config.uv.enabled = false;

    let resolved = sandbox
        .manager(config)
        .discover_interpreter(&CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(resolved.strategy, DiscoveryStrategy::Path);
    assert_eq!(resolved.path, system);
}

#[tokio::test]
async fn test_python2_only_host_is_a_total_failure() {
    let sandbox = Sandbox::new();
    write_script(&sandbox.bin().join("python"), &fake_python("2.7.18"));

    let err = sandbox
        .manager(PythonConfig::default())
        .interpreter_info(&CancellationToken::new())
        .await
        .unwrap_err();
    assert!(err.is_total_resolution_failure());

    let message = err.to_string();
    assert!(message.contains("uv:"));
    assert!(message.contains("path:"));
    assert!(message.contains("2.7"));
}

#[tokio::test]
async fn test_hanging_interpreter_times_out() {
    let sandbox = Sandbox::new();
    let slow = write_script(&sandbox.bin().join("python3"), SLOW_PYTHON);
    let timeouts = TimeoutConfig {
        probe_secs: 1,
        ..quick_timeouts()
    };
    let ctx = ProbeContext::new(Arc::new(TokioCommandRunner::new()), sandbox.host(), timeouts);

    let err = validate_interpreter(&ctx, &slow, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, PythonError::Timeout { .. }), "got {err}");
}

#[tokio::test]
async fn test_cancellation_interrupts_running_probe() {
    let sandbox = Sandbox::new();
    let slow = write_script(&sandbox.bin().join("python3"), SLOW_PYTHON);
    let ctx = ProbeContext::new(
        Arc::new(TokioCommandRunner::new()),
        sandbox.host(),
        quick_timeouts(),
    );
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let result = tokio::time::timeout(
        Duration::from_secs(3),
        validate_interpreter(&ctx, &slow, &cancel),
    )
    .await
    .expect("cancellation should end the probe promptly");
    assert!(result.unwrap_err().is_cancelled());
}

#[tokio::test]
async fn test_registry_tracks_two_interpreters() {
    let sandbox = Sandbox::new();
    let opt = sandbox.dir.path().join("opt");
    let py38 = write_script(&opt.join("py38/bin/python3"), &fake_python("3.8.18"));
    let py311 = write_script(&opt.join("py311/bin/python3"), &fake_python("3.11.9"));
    let old = write_script(&opt.join("py27/bin/python"), &fake_python("2.7.18"));

    let runner: Arc<dyn CommandRunner> = Arc::new(TokioCommandRunner::new());
    let mut config = PythonConfig::default();
    config.timeouts = quick_timeouts();
    let registry = InterpreterRegistry::new(&config, runner, sandbox.host());

    for (name, path) in [("py38", &py38), ("py311", &py311), ("py27", &old)] {
        registry
            .add_interpreter(name, InterpreterConfig::new(name, path.to_string_lossy()))
            .await
            .unwrap();
    }

    let results = registry
        .validate_all_interpreters(&CancellationToken::new())
        .await;
    assert!(results["py38"].is_ok());
    assert!(results["py311"].is_ok());
    assert!(results["py27"].is_err());

    registry.set_active_interpreter("py311").await.unwrap();
    let active = registry.active_interpreter().await.unwrap();
    assert_eq!(active.status(), InterpreterStatus::Ready);
    assert_eq!(active.info().unwrap().version.to_string(), "3.11.9");

    let py27 = registry.interpreter_info("py27").await.unwrap();
    assert_eq!(py27.status, InterpreterStatus::Error);
    assert!(py27.validation_error.unwrap().contains("not Python 3"));

    let saved = registry.to_config(&config).await;
    assert!(saved.interpreters["py38"].validated);
    assert!(!saved.interpreters["py27"].validated);
    assert_eq!(saved.active_interpreter.as_deref(), Some("py311"));
}
