//! Module records and member descriptors.
//!
//! A completion database stores one serialized descriptor file per
//! module. This module defines the on-disk schema
//! ([`ModuleDescriptorFile`]) and the in-memory form
//! ([`ModuleRecord`]) the rest of the crate resolves against.
//!
//! Descriptor files are JSON, one object per module:
//!
//! ```json
//! {
//!   "module": "os.path",
//!   "version": "3.3",
//!   "members": {
//!     "join": {"kind": "function", "signature": "join(path, *paths)"},
//!     "sep":  {"kind": "constant", "value_type": "str"}
//!   }
//! }
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Name of the universal base type every value falls back to.
pub const OBJECT_TYPE_NAME: &str = "object";

// ============================================================================
// Member Descriptors
// ============================================================================

/// One exported member of a module, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemberDescriptor {
    /// A class / type object.
    Type {
        /// Doc string, when the database recorded one.
        #[serde(skip_serializing_if = "Option::is_none")]
        doc: Option<String>,
    },
    /// A callable.
    Function {
        /// Signature text, when the database recorded one.
        #[serde(skip_serializing_if = "Option::is_none")]
        signature: Option<String>,
    },
    /// A data descriptor with an optionally-declared value type.
    Property {
        #[serde(skip_serializing_if = "Option::is_none")]
        value_type: Option<String>,
    },
    /// A plain value with an optionally-declared type.
    Constant {
        #[serde(skip_serializing_if = "Option::is_none")]
        value_type: Option<String>,
    },
}

impl MemberDescriptor {
    /// The declared value type, falling back to `object` when the
    /// database omitted type information. `None` for kinds that do not
    /// carry a value type.
    pub fn value_type(&self) -> Option<&str> {
        match self {
            MemberDescriptor::Property { value_type }
            | MemberDescriptor::Constant { value_type } => {
                Some(value_type.as_deref().unwrap_or(OBJECT_TYPE_NAME))
            }
            _ => None,
        }
    }

    /// Human-readable description of the member.
    pub fn description(&self) -> String {
        match self {
            MemberDescriptor::Type { .. } => "type".to_string(),
            MemberDescriptor::Function { signature } => signature
                .clone()
                .unwrap_or_else(|| "function".to_string()),
            MemberDescriptor::Property { value_type } => format!(
                "property of type {}",
                value_type.as_deref().unwrap_or(OBJECT_TYPE_NAME)
            ),
            MemberDescriptor::Constant { value_type } => format!(
                "constant of type {}",
                value_type.as_deref().unwrap_or(OBJECT_TYPE_NAME)
            ),
        }
    }
}

// ============================================================================
// On-Disk Schema
// ============================================================================

/// Serialized form of one module descriptor file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDescriptorFile {
    /// Dotted full module name (e.g., "os.path").
    pub module: String,
    /// Format/version tag of the database that produced this file
    /// (e.g., "2.7"). Informational only; never drives naming.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Exported members keyed by name.
    #[serde(default)]
    pub members: HashMap<String, MemberDescriptor>,
}

// ============================================================================
// In-Memory Record
// ============================================================================

/// A loaded module's member table.
///
/// Records are held behind `Arc` by their owning database, so object
/// identity (`Arc::ptr_eq`) distinguishes which database instance a
/// lookup came through.
#[derive(Debug)]
pub struct ModuleRecord {
    full_name: String,
    format_version: Option<String>,
    members: HashMap<String, MemberDescriptor>,
}

impl ModuleRecord {
    /// Build a record directly from parts.
    pub fn new(full_name: impl Into<String>, members: HashMap<String, MemberDescriptor>) -> Self {
        ModuleRecord {
            full_name: full_name.into(),
            format_version: None,
            members,
        }
    }

    /// Dotted full module name.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Format tag of the database file this record was loaded from.
    pub fn format_version(&self) -> Option<&str> {
        self.format_version.as_deref()
    }

    /// Look up one exported member by name.
    pub fn get_member(&self, name: &str) -> Option<&MemberDescriptor> {
        self.members.get(name)
    }

    /// Number of exported members.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Iterate exported member names.
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }
}

impl From<ModuleDescriptorFile> for ModuleRecord {
    fn from(file: ModuleDescriptorFile) -> Self {
        ModuleRecord {
            full_name: file.module,
            format_version: file.version,
            members: file.members,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
