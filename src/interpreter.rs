//! Interpreter search-path resolution.
//!
//! The only wire contract with the interpreter is the embedded query
//! script: run it, read one JSON object from stdout. The script filters
//! nonexistent paths and computes the standard-library flag from the
//! live location of the `os` module, so this side never guesses
//! platform layout.
//!
//! The query child is waited on with an OS-level timeout (no polling);
//! a hung interpreter surfaces as [`ResolverError::InterpreterTimeout`],
//! distinct from a missing binary.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use wait_timeout::ChildExt;

use crate::search_paths::{PathCache, PathEntry};

/// Timeout for the query process.
const QUERY_TIMEOUT_SECS: u64 = 30;

/// Embedded query script.
const QUERY_SCRIPT: &str = include_str!("query_search_paths.py");

// ============================================================================
// Error Types
// ============================================================================

/// Errors from resolving an interpreter's search paths.
#[derive(Debug, Error)]
pub enum ResolverError {
    /// Interpreter binary missing or not locatable.
    #[error("interpreter not found: {path}")]
    InterpreterNotFound { path: PathBuf },

    /// Query process exceeded the timeout.
    #[error("interpreter {path} did not report search paths within {timeout_secs}s")]
    InterpreterTimeout { path: PathBuf, timeout_secs: u64 },

    /// Query process exited nonzero.
    #[error("interpreter {path} failed to report search paths: {reason}")]
    QueryFailed { path: PathBuf, reason: String },

    /// Query output was not a valid report.
    #[error("invalid search-path report from {path}: {reason}")]
    InvalidReport { path: PathBuf, reason: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for resolver operations.
pub type ResolverResult<T> = Result<T, ResolverError>;

// ============================================================================
// Report Types
// ============================================================================

/// JSON object printed by the query script.
#[derive(Debug, Deserialize)]
struct SearchPathReport {
    prefix: PathBuf,
    paths: Vec<ReportedPath>,
}

#[derive(Debug, Deserialize)]
struct ReportedPath {
    path: PathBuf,
    is_standard_library: bool,
}

/// Resolved search paths for one interpreter installation.
#[derive(Debug, Clone)]
pub struct ResolvedSearchPaths {
    /// The interpreter's installation prefix (`sys.prefix`).
    pub prefix: PathBuf,
    /// Ordered search paths; every path existed at resolution time.
    pub entries: Vec<PathEntry>,
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve search paths by invoking the interpreter, bypassing any
/// cache.
pub fn resolve_search_paths(interpreter: &Path) -> ResolverResult<ResolvedSearchPaths> {
    resolve_search_paths_with_timeout(interpreter, Duration::from_secs(QUERY_TIMEOUT_SECS))
}

/// Resolve search paths with a caller-chosen timeout on the query
/// process.
pub fn resolve_search_paths_with_timeout(
    interpreter: &Path,
    timeout: Duration,
) -> ResolverResult<ResolvedSearchPaths> {
    let program = locate_interpreter(interpreter)?;

    debug!("Querying {} for search paths", program.display());

    let mut child = Command::new(&program)
        .args(["-c", QUERY_SCRIPT])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ResolverError::InterpreterNotFound {
                    path: program.clone(),
                }
            } else {
                ResolverError::Io(e)
            }
        })?;

    // Wait with timeout using OS-level waiting (no polling)
    let status = match child.wait_timeout(timeout)? {
        Some(status) => status,
        None => {
            let _ = child.kill();
            let _ = child.wait(); // Reap the zombie
            warn!(
                "Search-path query of {} timed out after {:?}",
                program.display(),
                timeout
            );
            return Err(ResolverError::InterpreterTimeout {
                path: program,
                timeout_secs: timeout.as_secs(),
            });
        }
    };

    let stdout = read_pipe(child.stdout.take());
    let stderr = read_pipe(child.stderr.take());

    if !status.success() {
        return Err(ResolverError::QueryFailed {
            path: program,
            reason: String::from_utf8_lossy(&stderr).trim().to_string(),
        });
    }

    let report: SearchPathReport =
        serde_json::from_slice(&stdout).map_err(|e| ResolverError::InvalidReport {
            path: program.clone(),
            reason: e.to_string(),
        })?;

    // The script filters nonexistent paths already; keep the guarantee
    // even against stale or foreign output
    let mut entries = Vec::with_capacity(report.paths.len());
    for reported in report.paths {
        if !reported.path.exists() {
            warn!(
                "Dropping reported search path that does not exist: {}",
                reported.path.display()
            );
            continue;
        }
        entries.push(PathEntry::new(reported.path, reported.is_standard_library));
    }

    info!(
        "Resolved {} search paths for {} (prefix {})",
        entries.len(),
        program.display(),
        report.prefix.display()
    );

    Ok(ResolvedSearchPaths {
        prefix: report.prefix,
        entries,
    })
}

/// Resolve through a [`PathCache`]: cached entries are used while every
/// cached path still exists, otherwise the interpreter is re-queried
/// and the cache rewritten.
pub fn resolve_search_paths_cached(
    interpreter: &Path,
    cache: &PathCache,
) -> ResolverResult<Vec<PathEntry>> {
    if let Some(entries) = cache.read() {
        if entries.iter().all(|entry| entry.path.exists()) {
            debug!(
                "Using {} cached search paths from {}",
                entries.len(),
                cache.file_path().display()
            );
            return Ok(entries);
        }
        debug!(
            "Cached search paths in {} are stale, re-resolving",
            cache.file_path().display()
        );
    }

    let resolved = resolve_search_paths(interpreter)?;
    cache.write(&resolved.entries)?;
    Ok(resolved.entries)
}

/// Locate the interpreter binary: bare program names go through
/// `$PATH`, explicit paths must exist.
fn locate_interpreter(interpreter: &Path) -> ResolverResult<PathBuf> {
    let is_bare_name = interpreter.components().count() == 1 && !interpreter.is_absolute();

    if is_bare_name {
        which::which(interpreter).map_err(|_| ResolverError::InterpreterNotFound {
            path: interpreter.to_path_buf(),
        })
    } else if interpreter.exists() {
        Ok(interpreter.to_path_buf())
    } else {
        Err(ResolverError::InterpreterNotFound {
            path: interpreter.to_path_buf(),
        })
    }
}

/// Drain a captured stdio pipe.
fn read_pipe<R: Read>(pipe: Option<R>) -> Vec<u8> {
    pipe.map(|mut stream| {
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).ok();
        buf
    })
    .unwrap_or_default()
}

// ============================================================================
// Tests
// ============================================================================
