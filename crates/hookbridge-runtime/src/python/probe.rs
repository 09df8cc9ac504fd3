//! Capability probing.
//!
//! Each capability is a minimal script run in its own subprocess, so one
//! unsupported feature cannot mask the status of another. Probing is
//! best-effort: a probe that fails, times out or cannot start records
//! `false`. Only cancellation aborts the run.

use std::collections::BTreeMap;
use std::path::Path;

use futures_util::future::join_all;
use hookbridge_core::{PythonConfig, PythonError, PythonResult};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::ProbeContext;
use crate::command::{CommandError, CommandSpec};

/// Modules probed by default.
pub const DEFAULT_MODULES: [&str; 9] = [
    "sys", "os", "json", "urllib", "http", "grpc", "grpcio", "fastapi", "requests",
];

/// Language-feature probes run by default.
pub const DEFAULT_FEATURES: [(&str, &str); 5] = [
    ("async_support", "import asyncio"),
    ("type_hints", "from typing import Dict, List"),
    ("pathlib", "from pathlib import Path"),
    ("dataclasses", "from dataclasses import dataclass"),
    ("f_strings", "x = 1; f'{x}'"),
];

/// A named probe script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityProbe {
    pub name: String,
    pub script: String,
}

impl CapabilityProbe {
    /// Probe that imports `module`.
    pub fn module(module: impl Into<String>) -> Self {
        let name = module.into();
        let script = format!("import {name}");
        Self { name, script }
    }

    pub fn feature(name: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: script.into(),
        }
    }
}

/// Ordered, de-duplicated list of probes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSet {
    probes: Vec<CapabilityProbe>,
}

impl Default for ProbeSet {
    fn default() -> Self {
        let modules = DEFAULT_MODULES.into_iter().map(CapabilityProbe::module);
        let features = DEFAULT_FEATURES
            .into_iter()
            .map(|(name, script)| CapabilityProbe::feature(name, script));
        Self {
            probes: modules.chain(features).collect(),
        }
    }
}

impl ProbeSet {
    #[must_use]
    pub const fn empty() -> Self {
        Self { probes: Vec::new() }
    }

    /// Defaults plus every configured required capability.
    #[must_use]
    pub fn for_config(config: &PythonConfig) -> Self {
        config
            .validation
            .required_capabilities
            .iter()
            .fold(Self::default(), |set, module| set.with_module(module))
    }

    /// Add an import probe. Names that are not dotted identifiers are ignored.
    #[must_use]
    pub fn with_module(self, module: &str) -> Self {
        if !is_module_name(module) {
            warn!(module, "Ignoring capability that is not a module name");
            return self;
        }
        self.with_probe(CapabilityProbe::module(module))
    }

    /// Add a probe unless one with the same name exists.
    #[must_use]
    pub fn with_probe(mut self, probe: CapabilityProbe) -> Self {
        if !self.probes.iter().any(|p| p.name == probe.name) {
            self.probes.push(probe);
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &CapabilityProbe> {
        self.probes.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.probes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }
}

fn is_module_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|part| {
            let mut chars = part.chars();
            chars
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

/// Run every probe against `path` concurrently.
pub async fn probe_capabilities(
    ctx: &ProbeContext,
    path: &Path,
    probes: &ProbeSet,
    cancel: &CancellationToken,
) -> PythonResult<BTreeMap<String, bool>> {
    let runs = probes.iter().map(|probe| async move {
        let spec = CommandSpec::new(path, ctx.timeouts.probe()).args(["-c", probe.script.as_str()]);
        let supported = match ctx.runner.run(&spec, cancel).await {
            Ok(output) => output.success(),
            Err(err @ CommandError::Cancelled { .. }) => return Err(PythonError::from(err)),
            Err(err) => {
                debug!(capability = %probe.name, error = %err, "Capability probe did not complete");
                false
            }
        };
        Ok((probe.name.clone(), supported))
    });

    let capabilities = join_all(runs)
        .await
        .into_iter()
        .collect::<PythonResult<BTreeMap<_, _>>>()?;

    debug!(
        path = %path.display(),
        supported = capabilities.values().filter(|v| **v).count(),
        total = capabilities.len(),
        "Probed capabilities"
    );
    Ok(capabilities)
}
