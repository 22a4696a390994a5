//! Analyzer bootstrap.
//!
//! Before any user code can be analyzed, the engine needs the
//! language-intrinsic types (str, bytes, object, ...) resolved to
//! concrete records from the completion database. [`Analyzer::make`]
//! builds that fixed table.
//!
//! ## Naming vs. data
//!
//! The builtins module *name* follows the requested language version
//! ([`PythonVersion::builtins_module_name`]), never the format tag of
//! the physical database that supplied the data: a 2.7-format database
//! loaded under a nominal 3.x session still yields records owned by
//! `"builtins"`.
//!
//! ## Fallback
//!
//! A required symbol missing from the supplied database is overlaid
//! per-symbol from the embedded reference database. Present entries are
//! never replaced, and the bootstrap fails only when the reference set
//! lacks the symbol too.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::layered::LayeredDatabase;
use crate::module::{MemberDescriptor, ModuleDescriptorFile, ModuleRecord};
use crate::version::PythonVersion;

/// Embedded reference database (2.7-format superset of both families).
const FALLBACK_BUILTINS: &str = include_str!("data/builtins-fallback.json");

// ============================================================================
// Error Types
// ============================================================================

/// Errors from analyzer bootstrap.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// A required builtin symbol is absent from the supplied database
    /// and from the embedded reference set.
    #[error("missing critical builtin '{symbol}' in module {module} (reference set exhausted)")]
    MissingCriticalBuiltin { module: String, symbol: String },
}

/// Result type for analyzer operations.
pub type AnalyzerResult<T> = Result<T, AnalyzerError>;

// ============================================================================
// Builtin Types
// ============================================================================

/// The fixed set of language-intrinsic types the analyzer resolves
/// before reading any user code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinType {
    Object,
    Type,
    Str,
    Bytes,
    Unicode,
    Int,
    Float,
    Bool,
    NoneType,
    List,
    Tuple,
    Dict,
    Set,
}

impl BuiltinType {
    /// Every builtin type, in resolution order.
    pub const ALL: &'static [BuiltinType] = &[
        BuiltinType::Object,
        BuiltinType::Type,
        BuiltinType::Str,
        BuiltinType::Bytes,
        BuiltinType::Unicode,
        BuiltinType::Int,
        BuiltinType::Float,
        BuiltinType::Bool,
        BuiltinType::NoneType,
        BuiltinType::List,
        BuiltinType::Tuple,
        BuiltinType::Dict,
        BuiltinType::Set,
    ];

    /// Member name inside the builtins module for the given version.
    ///
    /// On 3.x the text string type is `str`, so `Unicode` aliases it;
    /// on 2.x the byte string type is `str`, so `Bytes` aliases it.
    fn member_name(self, version: PythonVersion) -> &'static str {
        match (self, version.is_python3()) {
            (BuiltinType::Object, _) => "object",
            (BuiltinType::Type, _) => "type",
            (BuiltinType::Str, _) => "str",
            (BuiltinType::Bytes, true) => "bytes",
            (BuiltinType::Bytes, false) => "str",
            (BuiltinType::Unicode, true) => "str",
            (BuiltinType::Unicode, false) => "unicode",
            (BuiltinType::Int, _) => "int",
            (BuiltinType::Float, _) => "float",
            (BuiltinType::Bool, _) => "bool",
            (BuiltinType::NoneType, _) => "NoneType",
            (BuiltinType::List, _) => "list",
            (BuiltinType::Tuple, _) => "tuple",
            (BuiltinType::Dict, _) => "dict",
            (BuiltinType::Set, _) => "set",
        }
    }
}

/// One resolved builtin type.
///
/// Records are shared behind `Arc`; aliased builtins (e.g. `Str` and
/// `Unicode` on 3.x) point at the same record instance.
#[derive(Debug)]
pub struct BuiltinTypeRecord {
    type_name: String,
    module_name: String,
    descriptor: MemberDescriptor,
    from_fallback: bool,
}

impl BuiltinTypeRecord {
    /// Member name inside the builtins module (e.g., "str").
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Logical owning-module name for the requested language version.
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// The underlying member descriptor.
    pub fn descriptor(&self) -> &MemberDescriptor {
        &self.descriptor
    }

    /// Whether this record was overlaid from the embedded reference
    /// set rather than the supplied database.
    pub fn is_from_fallback(&self) -> bool {
        self.from_fallback
    }
}

// ============================================================================
// Analyzer
// ============================================================================

/// A bootstrapped analysis session: the layered database plus the
/// resolved builtin type table.
#[derive(Debug)]
pub struct Analyzer {
    version: PythonVersion,
    database: LayeredDatabase,
    builtins: HashMap<BuiltinType, Arc<BuiltinTypeRecord>>,
}

impl Analyzer {
    /// Resolve the builtin type table through `database` and produce an
    /// analyzer for `version`.
    pub fn make(database: LayeredDatabase, version: PythonVersion) -> AnalyzerResult<Self> {
        let module_name = version.builtins_module_name();
        let primary = database.get_module(module_name);
        if primary.is_none() {
            debug!(
                "No {} module in the supplied database, resolving builtins from the reference set",
                module_name
            );
        }

        let mut fallback: Option<ModuleRecord> = None;
        let mut by_member: HashMap<&'static str, Arc<BuiltinTypeRecord>> = HashMap::new();
        let mut builtins = HashMap::new();

        for &builtin in BuiltinType::ALL {
            let member = builtin.member_name(version);

            // Aliased builtins share one record per member name
            if let Some(record) = by_member.get(member) {
                builtins.insert(builtin, Arc::clone(record));
                continue;
            }

            let resolved = primary
                .as_ref()
                .and_then(|module| module.get_member(member).cloned());

            let (descriptor, from_fallback) = match resolved {
                Some(descriptor) => (descriptor, false),
                None => {
                    let reference = fallback.get_or_insert_with(load_reference_database);
                    match reference.get_member(member) {
                        Some(descriptor) => {
                            warn!(
                                "Builtin '{}' missing from {}, overlaying from the reference set",
                                member, module_name
                            );
                            (descriptor.clone(), true)
                        }
                        None => {
                            return Err(AnalyzerError::MissingCriticalBuiltin {
                                module: module_name.to_string(),
                                symbol: member.to_string(),
                            });
                        }
                    }
                }
            };

            let record = Arc::new(BuiltinTypeRecord {
                type_name: member.to_string(),
                module_name: module_name.to_string(),
                descriptor,
                from_fallback,
            });
            by_member.insert(member, Arc::clone(&record));
            builtins.insert(builtin, record);
        }

        Ok(Analyzer {
            version,
            database,
            builtins,
        })
    }

    /// Requested language version.
    pub fn version(&self) -> PythonVersion {
        self.version
    }

    /// The layered database this analyzer resolves against.
    pub fn database(&self) -> &LayeredDatabase {
        &self.database
    }

    /// Look up a resolved builtin type. Always present after a
    /// successful [`Analyzer::make`].
    pub fn builtin_type(&self, builtin: BuiltinType) -> &Arc<BuiltinTypeRecord> {
        &self.builtins[&builtin]
    }
}

/// Parse the embedded reference database.
fn load_reference_database() -> ModuleRecord {
    let file: ModuleDescriptorFile = serde_json::from_str(FALLBACK_BUILTINS)
        .expect("embedded reference database is valid JSON");
    ModuleRecord::from(file)
}

// ============================================================================
// Tests
// ============================================================================
