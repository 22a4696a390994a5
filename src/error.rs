//! Crate-level error type.
//!
//! Subsystems keep their own error enums; `CompletionError` bridges
//! them for hosts that funnel everything into a single result type.

use thiserror::Error;

use crate::analyzer::AnalyzerError;
use crate::database::DatabaseError;
use crate::interpreter::ResolverError;
use crate::search_paths::PathEntryError;
use crate::version::VersionError;

/// Unified error type covering every subsystem.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// Database loading error.
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// Analyzer bootstrap error.
    #[error("analyzer error: {0}")]
    Analyzer(#[from] AnalyzerError),

    /// Search-path resolution error.
    #[error("resolver error: {0}")]
    Resolver(#[from] ResolverError),

    /// Path entry parse error.
    #[error("path cache error: {0}")]
    PathEntry(#[from] PathEntryError),

    /// Version parse error.
    #[error("version error: {0}")]
    Version(#[from] VersionError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type using the unified error.
pub type CompletionResult<T> = Result<T, CompletionError>;
