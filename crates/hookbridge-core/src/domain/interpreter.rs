//! Analyzed interpreter snapshot and the types it is built from.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How an interpreter was located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryStrategy {
    /// Explicitly configured path or command name.
    Custom,
    /// Managed virtual environment provisioned through `uv`.
    Uv,
    /// First usable candidate on the system search path.
    Path,
}

impl DiscoveryStrategy {
    /// Stable lowercase name, as used in logs and serialized records.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Custom => "custom",
            Self::Uv => "uv",
            Self::Path => "path",
        }
    }
}

impl fmt::Display for DiscoveryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a version string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid Python version: {0:?}")]
pub struct VersionParseError(pub String);

/// A `major.minor.micro` Python version.
///
/// Ordering compares major, then minor, then micro. A missing micro
/// component (as in a configured minimum such as `"3.8"`) parses as `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PythonVersion {
    pub major: u32,
    pub minor: u32,
    pub micro: u32,
}

impl PythonVersion {
    #[must_use]
    pub const fn new(major: u32, minor: u32, micro: u32) -> Self {
        Self {
            major,
            minor,
            micro,
        }
    }
}

impl FromStr for PythonVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let err = || VersionParseError(trimmed.to_string());

        let mut parts = trimmed.split('.');
        let major = parts.next().and_then(|p| p.parse().ok()).ok_or_else(err)?;
        let minor = parts.next().and_then(|p| p.parse().ok()).ok_or_else(err)?;
        // Pre-release builds report e.g. "3.13.0rc1"; keep the numeric prefix.
        let micro = match parts.next() {
            Some(p) => {
                let digits: String = p.chars().take_while(char::is_ascii_digit).collect();
                digits.parse().map_err(|_| err())?
            }
            None => 0,
        };
        if parts.next().is_some() {
            return Err(err());
        }

        Ok(Self::new(major, minor, micro))
    }
}

impl TryFrom<String> for PythonVersion {
    type Error = VersionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PythonVersion> for String {
    fn from(version: PythonVersion) -> Self {
        version.to_string()
    }
}

impl fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)
    }
}

/// Fully analyzed interpreter.
///
/// This is an immutable snapshot: whoever caches it replaces it wholesale
/// on re-analysis and shares it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpreterInfo {
    /// Executable to launch.
    pub path: PathBuf,
    /// Interpreter version.
    pub version: PythonVersion,
    /// Strategy that produced `path`.
    pub strategy: DiscoveryStrategy,
    /// Root of the virtual environment the executable lives in, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venv_path: Option<PathBuf>,
    /// Whether the executable belongs to an isolated environment.
    pub is_virtual: bool,
    /// Probed module and language-feature availability.
    pub capabilities: BTreeMap<String, bool>,
    /// Environment the executor subprocess should be launched with.
    pub environment: BTreeMap<String, String>,
    pub discovered_at: DateTime<Utc>,
}

impl InterpreterInfo {
    /// Whether a probed capability is available. Unprobed names count as missing.
    #[must_use]
    pub fn has_capability(&self, name: &str) -> bool {
        self.capabilities.get(name).copied().unwrap_or(false)
    }

    /// Names from `required` that are not available, in input order.
    pub fn missing_capabilities<'a, I>(&self, required: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        required
            .into_iter()
            .filter(|name| !self.has_capability(name))
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_version() {
        let v: PythonVersion = "3.11.4".parse().unwrap();
        assert_eq!(v, PythonVersion::new(3, 11, 4));
        assert_eq!(v.to_string(), "3.11.4");
    }

    #[test]
    fn test_parse_short_and_prerelease_versions() {
        assert_eq!(
            "3.8".parse::<PythonVersion>().unwrap(),
            PythonVersion::new(3, 8, 0)
        );
        assert_eq!(
            "3.13.0rc1\n".parse::<PythonVersion>().unwrap(),
            PythonVersion::new(3, 13, 0)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<PythonVersion>().is_err());
        assert!("Python 3.11.4".parse::<PythonVersion>().is_err());
        assert!("3".parse::<PythonVersion>().is_err());
        assert!("3.11.4.1".parse::<PythonVersion>().is_err());
    }

    #[test]
    fn test_version_ordering() {
        let min: PythonVersion = "3.8".parse().unwrap();
        assert!(PythonVersion::new(3, 7, 17) < min);
        assert!(PythonVersion::new(3, 8, 0) >= min);
        assert!(PythonVersion::new(3, 10, 1) > PythonVersion::new(3, 9, 18));
    }

    #[test]
    fn test_missing_capabilities_keeps_order() {
        let info = InterpreterInfo {
            path: PathBuf::from("/usr/bin/python3"),
            version: PythonVersion::new(3, 11, 4),
            strategy: DiscoveryStrategy::Path,
            venv_path: None,
            is_virtual: false,
            capabilities: BTreeMap::from([
                ("sys".to_string(), true),
                ("json".to_string(), false),
            ]),
            environment: BTreeMap::new(),
            discovered_at: Utc::now(),
        };

        assert!(info.has_capability("sys"));
        assert_eq!(
            info.missing_capabilities(["os", "sys", "json"]),
            vec!["os".to_string(), "json".to_string()]
        );
    }

    #[test]
    fn test_info_serializes_version_and_strategy_as_strings() {
        let info = InterpreterInfo {
            path: PathBuf::from("/proj/.venv/bin/python"),
            version: PythonVersion::new(3, 12, 1),
            strategy: DiscoveryStrategy::Uv,
            venv_path: Some(PathBuf::from("/proj/.venv")),
            is_virtual: true,
            capabilities: BTreeMap::new(),
            environment: BTreeMap::new(),
            discovered_at: Utc::now(),
        };

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["version"], "3.12.1");
        assert_eq!(json["strategy"], "uv");
        assert_eq!(json["is_virtual"], true);
    }
}
