//! Single-directory module database.
//!
//! A database directory holds one JSON descriptor file per module (see
//! [`crate::module`]). Loading is eager: every descriptor directly
//! under the directory is parsed up front, so lookups hand out stable
//! `Arc<ModuleRecord>` instances for the lifetime of the database.
//! Consumers rely on that stability for identity comparisons across
//! cloned views.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::module::{ModuleDescriptorFile, ModuleRecord};

/// File extension of module descriptor files.
const DESCRIPTOR_EXTENSION: &str = "json";

// ============================================================================
// Error Types
// ============================================================================

/// Errors from loading a database directory.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Directory missing or unreadable.
    #[error("database directory unreadable: {path}: {source}")]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Readable directory, but a descriptor file is malformed.
    #[error("corrupt module descriptor {path}: {reason}")]
    CorruptModule { path: PathBuf, reason: String },

    /// IO error reading a descriptor file.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type for database operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;

// ============================================================================
// Module Database
// ============================================================================

/// One directory's worth of loaded module records.
///
/// Immutable once loaded; layering on top of it happens in
/// [`crate::layered::LayeredDatabase`], never by mutating a loaded
/// database.
#[derive(Debug)]
pub struct ModuleDatabase {
    root: PathBuf,
    modules: HashMap<String, Arc<ModuleRecord>>,
}

impl ModuleDatabase {
    /// Load every module descriptor directly under `dir`.
    ///
    /// Files without the descriptor extension and subdirectories are
    /// skipped. A descriptor that fails to parse fails the whole load
    /// with [`DatabaseError::CorruptModule`] naming the file.
    pub fn load(dir: &Path) -> DatabaseResult<Self> {
        let entries = std::fs::read_dir(dir).map_err(|source| {
            DatabaseError::DirectoryUnreadable {
                path: dir.to_path_buf(),
                source,
            }
        })?;

        let mut modules: HashMap<String, Arc<ModuleRecord>> = HashMap::new();

        for entry in entries {
            let entry = entry.map_err(|source| DatabaseError::DirectoryUnreadable {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();

            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(DESCRIPTOR_EXTENSION) {
                continue;
            }

            let record = load_descriptor(&path)?;
            debug!(
                "Loaded module descriptor {} ({} members) from {}",
                record.full_name(),
                record.member_count(),
                path.display()
            );

            let name = record.full_name().to_string();
            if let Some(previous) = modules.insert(name, Arc::new(record)) {
                warn!(
                    "Duplicate descriptor for module {} in {}, keeping the last one",
                    previous.full_name(),
                    dir.display()
                );
            }
        }

        debug!("Loaded {} modules from {}", modules.len(), dir.display());

        Ok(ModuleDatabase {
            root: dir.to_path_buf(),
            modules,
        })
    }

    /// Build a database from already-constructed records (used for
    /// in-memory primary sources and embedded fallback data).
    pub fn from_records(root: impl Into<PathBuf>, records: Vec<ModuleRecord>) -> Self {
        let modules = records
            .into_iter()
            .map(|r| (r.full_name().to_string(), Arc::new(r)))
            .collect();
        ModuleDatabase {
            root: root.into(),
            modules,
        }
    }

    /// Directory this database was loaded from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Look up a module by dotted full name.
    ///
    /// Repeated lookups through the same database return the same
    /// record instance.
    pub fn get_module(&self, name: &str) -> Option<Arc<ModuleRecord>> {
        self.modules.get(name).cloned()
    }

    /// Whether a module with this name was loaded.
    pub fn contains_module(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Number of loaded modules.
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Iterate loaded module names.
    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }
}

/// Parse one descriptor file into a module record.
fn load_descriptor(path: &Path) -> DatabaseResult<ModuleRecord> {
    let content = std::fs::read_to_string(path).map_err(|source| DatabaseError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let file: ModuleDescriptorFile =
        serde_json::from_str(&content).map_err(|e| DatabaseError::CorruptModule {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    if file.module.is_empty() {
        return Err(DatabaseError::CorruptModule {
            path: path.to_path_buf(),
            reason: "empty module name".to_string(),
        });
    }

    Ok(ModuleRecord::from(file))
}

// ============================================================================
// Tests
// ============================================================================
