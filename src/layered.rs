//! Layered module database.
//!
//! A [`LayeredDatabase`] composes an ordered list of loaded
//! [`ModuleDatabase`] layers into one queryable namespace. Layers are
//! append-only per instance; cloning copies the layer list, so the
//! clone keeps resolving the same record instances while future
//! `load_database` calls on either side stay invisible to the other.
//!
//! Layer caching is per top-level database: constructing two
//! `LayeredDatabase` values over the same directories parses each
//! directory freshly, so content-equal modules resolved through the
//! two instances are never instance-identical.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::database::{DatabaseResult, ModuleDatabase};
use crate::module::ModuleRecord;

// ============================================================================
// Conflict Policy
// ============================================================================

/// Which layer wins when two layers define the same module name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Earliest-loaded layer wins (base layer priority).
    #[default]
    FirstLoaded,
    /// Latest-loaded layer wins.
    LastLoaded,
}

// ============================================================================
// Layered Database
// ============================================================================

/// Ordered layers of module databases resolved as one namespace.
///
/// `Clone` is the copy-on-write view operation: the clone shares every
/// already-loaded layer (and therefore every `Arc<ModuleRecord>`
/// instance), while each instance owns its layer list and grows it
/// independently.
#[derive(Debug, Clone)]
pub struct LayeredDatabase {
    layers: Vec<Arc<ModuleDatabase>>,
    conflict_policy: ConflictPolicy,
}

impl LayeredDatabase {
    /// Build the base layer from an in-memory database.
    pub fn new(base: ModuleDatabase) -> Self {
        LayeredDatabase {
            layers: vec![Arc::new(base)],
            conflict_policy: ConflictPolicy::default(),
        }
    }

    /// Build the base layer by loading one directory.
    pub fn open(dir: &Path) -> DatabaseResult<Self> {
        Ok(LayeredDatabase::new(ModuleDatabase::load(dir)?))
    }

    /// Load an explicit ordered list of directories as independent,
    /// freshly-parsed layers.
    pub fn open_all<P: AsRef<Path>>(dirs: &[P]) -> DatabaseResult<Self> {
        let mut layers = Vec::with_capacity(dirs.len());
        for dir in dirs {
            layers.push(Arc::new(ModuleDatabase::load(dir.as_ref())?));
        }
        Ok(LayeredDatabase {
            layers,
            conflict_policy: ConflictPolicy::default(),
        })
    }

    /// Select the conflict policy for same-name collisions across
    /// layers.
    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    /// Parse `dir` into a new layer appended to this instance only.
    ///
    /// A missing or unreadable directory fails with
    /// [`crate::database::DatabaseError::DirectoryUnreadable`]; it does
    /// not silently no-op.
    pub fn load_database(&mut self, dir: &Path) -> DatabaseResult<()> {
        let layer = ModuleDatabase::load(dir)?;
        debug!(
            "Layered {} ({} modules) as layer {}",
            dir.display(),
            layer.module_count(),
            self.layers.len()
        );
        self.layers.push(Arc::new(layer));
        Ok(())
    }

    /// Resolve a module name across layers.
    ///
    /// Layers are scanned in load order under
    /// [`ConflictPolicy::FirstLoaded`], newest-first under
    /// [`ConflictPolicy::LastLoaded`]. Returns `None` when the module
    /// is absent from every layer.
    pub fn get_module(&self, name: &str) -> Option<Arc<ModuleRecord>> {
        match self.conflict_policy {
            ConflictPolicy::FirstLoaded => {
                self.layers.iter().find_map(|layer| layer.get_module(name))
            }
            ConflictPolicy::LastLoaded => self
                .layers
                .iter()
                .rev()
                .find_map(|layer| layer.get_module(name)),
        }
    }

    /// Whether any layer defines this module.
    pub fn contains_module(&self, name: &str) -> bool {
        self.layers.iter().any(|layer| layer.contains_module(name))
    }

    /// Number of loaded layers.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Iterate the loaded layers in load order.
    pub fn layers(&self) -> impl Iterator<Item = &ModuleDatabase> {
        self.layers.iter().map(Arc::as_ref)
    }
}

// ============================================================================
// Tests
// ============================================================================
