//! Requested Python language version.
//!
//! The version here is the *logical* version an analysis session runs
//! under. It is never conflated with the format/version tag a physical
//! database directory carries: a 2.7-format database loaded under a
//! nominal 3.x session still reports 3.x naming (see
//! [`PythonVersion::builtins_module_name`]).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from parsing a version string.
#[derive(Debug, Error)]
pub enum VersionError {
    /// Invalid Python version string.
    #[error("invalid Python version string: {version}")]
    Invalid { version: String },
}

/// Parsed Python language version (major.minor).
///
/// Patch-level releases never change the completion database layout or
/// builtin naming, so only major/minor are tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PythonVersion {
    /// Major version (e.g., 3).
    pub major: u32,
    /// Minor version (e.g., 11).
    pub minor: u32,
}

impl PythonVersion {
    /// Create a new Python version.
    pub fn new(major: u32, minor: u32) -> Self {
        PythonVersion { major, minor }
    }

    /// Parse a version string like "3.11", "3.11.4", or "Python 3.11.4".
    pub fn parse(version_str: &str) -> Result<Self, VersionError> {
        // Strip "Python " prefix if present
        let version_str = version_str
            .strip_prefix("Python ")
            .unwrap_or(version_str)
            .trim();

        let parts: Vec<&str> = version_str.split('.').collect();

        if parts.is_empty() || parts[0].is_empty() {
            return Err(VersionError::Invalid {
                version: version_str.to_string(),
            });
        }

        let major = parts[0]
            .parse::<u32>()
            .map_err(|_| VersionError::Invalid {
                version: version_str.to_string(),
            })?;

        // Minor might carry a suffix like "11rc1"; take leading digits
        let minor_str = parts.get(1).unwrap_or(&"0");
        let minor_digits: String = minor_str
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        let minor = minor_digits
            .parse::<u32>()
            .map_err(|_| VersionError::Invalid {
                version: version_str.to_string(),
            })?;

        Ok(PythonVersion { major, minor })
    }

    /// Whether this is a Python 3 (or later) version.
    pub fn is_python3(&self) -> bool {
        self.major >= 3
    }

    /// Name of the builtins module for this language version.
    ///
    /// Applied uniformly regardless of which physical database supplied
    /// the underlying data.
    pub fn builtins_module_name(&self) -> &'static str {
        if self.is_python3() {
            "builtins"
        } else {
            "__builtin__"
        }
    }
}

impl std::fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

// ============================================================================
// Tests
// ============================================================================
