//! Explicit snapshot of the host process environment.
//!
//! Discovery never reads `std::env` directly. Callers capture the host
//! environment once (or build one by hand in tests) and pass it down, so
//! resolution is a pure function of its inputs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Search-path variable.
pub const PATH_VAR: &str = "PATH";

/// Module search-path variable read by the interpreter.
pub const PYTHONPATH_VAR: &str = "PYTHONPATH";

/// Variable set by an activated virtual environment.
pub const VIRTUAL_ENV_VAR: &str = "VIRTUAL_ENV";

/// Environment variables and working directory of the host process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostEnvironment {
    vars: BTreeMap<String, String>,
    current_dir: PathBuf,
}

impl HostEnvironment {
    /// Empty environment rooted at `current_dir`.
    pub fn new(current_dir: impl Into<PathBuf>) -> Self {
        Self {
            vars: BTreeMap::new(),
            current_dir: current_dir.into(),
        }
    }

    /// Capture the live process environment.
    ///
    /// Variables whose name or value is not valid UTF-8 are skipped.
    #[must_use]
    pub fn capture() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect();
        let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

        Self { vars, current_dir }
    }

    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn without_var(mut self, key: &str) -> Self {
        if let Some(existing) = self.key_for(key) {
            self.vars.remove(&existing);
        }
        self
    }

    /// Look up a variable. Names are case-insensitive on Windows.
    #[must_use]
    pub fn var(&self, key: &str) -> Option<&str> {
        let key = self.key_for(key)?;
        self.vars.get(&key).map(String::as_str)
    }

    #[must_use]
    pub const fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    #[must_use]
    pub fn current_dir(&self) -> &Path {
        &self.current_dir
    }

    /// The `PATH` value, if set.
    #[must_use]
    pub fn search_path(&self) -> Option<&str> {
        self.var(PATH_VAR)
    }

    /// Root of the activated virtual environment, if any.
    #[must_use]
    pub fn active_virtual_env(&self) -> Option<PathBuf> {
        self.var(VIRTUAL_ENV_VAR)
            .filter(|value| !value.trim().is_empty())
            .map(|value| self.resolve(Path::new(value)))
    }

    /// Make `path` absolute against the working directory.
    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.current_dir.join(path)
        }
    }

    #[cfg(not(windows))]
    fn key_for(&self, key: &str) -> Option<String> {
        self.vars.contains_key(key).then(|| key.to_string())
    }

    #[cfg(windows)]
    fn key_for(&self, key: &str) -> Option<String> {
        self.vars
            .keys()
            .find(|existing| existing.eq_ignore_ascii_case(key))
            .cloned()
    }
}
