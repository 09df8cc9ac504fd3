//! Executor process environment composition.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use hookbridge_core::host::{PATH_VAR, PYTHONPATH_VAR};
use hookbridge_core::{HostEnvironment, PythonError, PythonResult};

/// Build the environment the executor subprocess is launched with.
///
/// Starts from a copy of the host environment, prepends the interpreter's
/// directory to `PATH` and the plugin directories to `PYTHONPATH`, then
/// applies `overrides`. Relative paths are resolved against the host
/// working directory. The live process environment is never touched.
pub fn compose_environment(
    executable: &Path,
    plugin_dirs: &[PathBuf],
    host: &HostEnvironment,
    overrides: &BTreeMap<String, String>,
) -> PythonResult<BTreeMap<String, String>> {
    let mut env = host.vars().clone();

    if let Some(bin_dir) = host.resolve(executable).parent() {
        prepend_paths(&mut env, PATH_VAR, vec![bin_dir.to_path_buf()])?;
    }

    let plugin_dirs: Vec<PathBuf> = plugin_dirs
        .iter()
        .map(|dir| host.resolve(dir.strip_prefix(".").unwrap_or(dir)))
        .collect();
    if !plugin_dirs.is_empty() {
        prepend_paths(&mut env, PYTHONPATH_VAR, plugin_dirs)?;
    }

    for (key, value) in overrides {
        let key = existing_key(&env, key);
        env.insert(key, value.clone());
    }

    Ok(env)
}

fn prepend_paths(
    env: &mut BTreeMap<String, String>,
    var: &str,
    mut entries: Vec<PathBuf>,
) -> PythonResult<()> {
    let key = existing_key(env, var);
    if let Some(current) = env.get(&key).filter(|value| !value.is_empty()) {
        entries.extend(std::env::split_paths(current));
    }

    let joined = std::env::join_paths(&entries)
        .map_err(|e| PythonError::Environment(format!("cannot build {var}: {e}")))?
        .into_string()
        .map_err(|_| PythonError::Environment(format!("{var} is not valid UTF-8")))?;
    env.insert(key, joined);
    Ok(())
}

// Windows variable names are case-insensitive; reuse the existing spelling.
#[cfg(windows)]
fn existing_key(env: &BTreeMap<String, String>, var: &str) -> String {
    env.keys()
        .find(|key| key.eq_ignore_ascii_case(var))
        .cloned()
        .unwrap_or_else(|| var.to_string())
}

#[cfg(not(windows))]
fn existing_key(_env: &BTreeMap<String, String>, var: &str) -> String {
    var.to_string()
}
