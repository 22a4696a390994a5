//! Search-path entries and the on-disk path cache.
//!
//! Resolving an interpreter's search paths costs a subprocess launch,
//! so resolved paths are cached in a small text file: one entry per
//! line in the exact form produced by [`PathEntry`]'s `Display`, no
//! header, no trailing metadata.
//!
//! ```text
//! stdlib|/usr/lib/python3.11
//! stdlib|/usr/lib/python3.11/lib-dynload
//! other|/usr/lib/python3/dist-packages
//! ```
//!
//! A cache that cannot be fully parsed is treated as absent — partial
//! data never reaches callers; they re-resolve instead.

use std::fmt;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

/// Line prefix marking a standard-library path.
const STDLIB_TAG: &str = "stdlib";

/// Line prefix marking any other path.
const OTHER_TAG: &str = "other";

// ============================================================================
// Path Entry
// ============================================================================

/// Errors from parsing a serialized path entry.
#[derive(Debug, Error)]
pub enum PathEntryError {
    /// Line does not have the `<tag>|<path>` shape.
    #[error("invalid path cache line: {line}")]
    InvalidLine { line: String },
}

/// One filesystem search path with its standard-library flag.
///
/// `Display` and `FromStr` are exact mutual inverses; equality is
/// structural on both fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathEntry {
    /// Filesystem location.
    pub path: PathBuf,
    /// Whether this path belongs to the interpreter's bundled library.
    pub is_standard_library: bool,
}

impl PathEntry {
    /// Create an entry.
    pub fn new(path: impl Into<PathBuf>, is_standard_library: bool) -> Self {
        PathEntry {
            path: path.into(),
            is_standard_library,
        }
    }
}

impl fmt::Display for PathEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = if self.is_standard_library {
            STDLIB_TAG
        } else {
            OTHER_TAG
        };
        write!(f, "{}|{}", tag, self.path.display())
    }
}

impl FromStr for PathEntry {
    type Err = PathEntryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (tag, path) = s.split_once('|').ok_or_else(|| PathEntryError::InvalidLine {
            line: s.to_string(),
        })?;

        let is_standard_library = match tag {
            STDLIB_TAG => true,
            OTHER_TAG => false,
            _ => {
                return Err(PathEntryError::InvalidLine {
                    line: s.to_string(),
                })
            }
        };

        if path.is_empty() {
            return Err(PathEntryError::InvalidLine {
                line: s.to_string(),
            });
        }

        Ok(PathEntry {
            path: PathBuf::from(path),
            is_standard_library,
        })
    }
}

// ============================================================================
// Path Cache
// ============================================================================

/// Persisted search-path cache at a fixed file location.
#[derive(Debug, Clone)]
pub struct PathCache {
    path: PathBuf,
}

impl PathCache {
    /// Cache backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        PathCache { path: path.into() }
    }

    /// Conventional per-user cache file for an interpreter, keyed by
    /// its file stem (e.g. `~/.cache/pycompdb/python3.paths`).
    ///
    /// `None` when the platform has no cache directory or the
    /// interpreter path has no file stem.
    pub fn default_path(interpreter: &Path) -> Option<PathBuf> {
        let stem = interpreter.file_stem()?.to_str()?;
        Some(
            dirs::cache_dir()?
                .join("pycompdb")
                .join(format!("{}.paths", stem)),
        )
    }

    /// The backing file path.
    pub fn file_path(&self) -> &Path {
        &self.path
    }

    /// Serialize `entries` one per line, overwriting any existing file
    /// and creating parent directories as needed.
    pub fn write(&self, entries: &[PathEntry]) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = fs::File::create(&self.path)?;
        let mut writer = BufWriter::new(file);
        for entry in entries {
            writeln!(writer, "{}", entry)?;
        }
        writer.flush()?;

        debug!(
            "Wrote {} search paths to {}",
            entries.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Read the cached entries.
    ///
    /// Returns `None` when the file does not exist or any line fails
    /// to parse — partial corruption is a total miss. Trailing blank
    /// lines are tolerated.
    pub fn read(&self) -> Option<Vec<PathEntry>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    debug!(
                        "Failed to read path cache {}: {}",
                        self.path.display(),
                        e
                    );
                }
                return None;
            }
        };

        let mut entries = Vec::new();
        for line in content.trim_end().lines() {
            match line.parse::<PathEntry>() {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    debug!(
                        "Treating path cache {} as a miss: {}",
                        self.path.display(),
                        e
                    );
                    return None;
                }
            }
        }

        Some(entries)
    }
}

// ============================================================================
// Tests
// ============================================================================
