//! Integration tests for database layering, cloning, and analyzer
//! bootstrap over realistic on-disk completion databases.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use pycompdb::{
    Analyzer, BuiltinType, LayeredDatabase, ModuleDatabase, PythonVersion,
};

// ============================================================================
// Fixture Helpers
// ============================================================================

fn write_module(dir: &Path, module: &str, version: &str, members_json: &str) {
    fs::create_dir_all(dir).unwrap();
    let content = format!(
        r#"{{"module": "{}", "version": "{}", "members": {}}}"#,
        module, version, members_json
    );
    fs::write(dir.join(format!("{}.json", module)), content).unwrap();
}

/// Database directory holding only the `os` module.
fn os_db(temp: &TempDir, name: &str) -> PathBuf {
    let dir = temp.path().join(name);
    write_module(
        &dir,
        "os",
        "3.3",
        r#"{
            "getcwd": {"kind": "function", "signature": "getcwd()"},
            "sep": {"kind": "constant", "value_type": "str"},
            "environ": {"kind": "constant"}
        }"#,
    );
    dir
}

/// Database directory holding only the `posixpath` module.
fn posixpath_db(temp: &TempDir, name: &str) -> PathBuf {
    let dir = temp.path().join(name);
    write_module(
        &dir,
        "posixpath",
        "3.3",
        r#"{
            "join": {"kind": "function", "signature": "join(a, *p)"},
            "supports_unicode_filenames": {"kind": "property"}
        }"#,
    );
    dir
}

/// 3.x-nominal builtins database, optionally with `str` knocked out.
fn builtins_v3_db(temp: &TempDir, name: &str, with_str: bool) -> PathBuf {
    let dir = temp.path().join(name);
    let mut members = vec![
        r#""object": {"kind": "type"}"#.to_string(),
        r#""type": {"kind": "type"}"#.to_string(),
        r#""bytes": {"kind": "type"}"#.to_string(),
        r#""int": {"kind": "type"}"#.to_string(),
        r#""float": {"kind": "type"}"#.to_string(),
        r#""bool": {"kind": "type"}"#.to_string(),
        r#""NoneType": {"kind": "type"}"#.to_string(),
        r#""list": {"kind": "type"}"#.to_string(),
        r#""tuple": {"kind": "type"}"#.to_string(),
        r#""dict": {"kind": "type"}"#.to_string(),
        r#""set": {"kind": "type"}"#.to_string(),
    ];
    if with_str {
        members.push(r#""str": {"kind": "type"}"#.to_string());
    }
    write_module(
        &dir,
        "builtins",
        "3.3",
        &format!("{{{}}}", members.join(", ")),
    );
    dir
}

// ============================================================================
// Layering and Cloning
// ============================================================================

#[test]
fn clone_then_load_isolates_the_original() {
    let temp = TempDir::new().unwrap();
    let os_dir = os_db(&temp, "os_db");
    let posix_dir = posixpath_db(&temp, "posix_db");

    let ptd1 = LayeredDatabase::open(&os_dir).unwrap();
    let mut ptd2 = ptd1.clone();
    ptd2.load_database(&posix_dir).unwrap();

    assert!(ptd1.get_module("posixpath").is_none());
    let posixpath = ptd2.get_module("posixpath").unwrap();
    assert!(posixpath.get_member("join").is_some());

    // The shared base resolves to the identical record through both views
    let os1 = ptd1.get_module("os").unwrap();
    let os2 = ptd2.get_module("os").unwrap();
    assert!(Arc::ptr_eq(&os1, &os2));
}

#[test]
fn reordered_directory_lists_resolve_with_distinct_identities() {
    let temp = TempDir::new().unwrap();
    let a = posixpath_db(&temp, "a");
    let b = temp.path().join("b");
    write_module(&b, "posixpath", "3.3", r#"{"join": {"kind": "function"}}"#);
    write_module(&b, "ntpath", "3.3", r#"{"join": {"kind": "function"}}"#);

    let forward = LayeredDatabase::open_all(&[&a, &b]).unwrap();
    let reversed = LayeredDatabase::open_all(&[&b, &a]).unwrap();

    let from_forward = forward.get_module("posixpath").unwrap();
    let from_reversed = reversed.get_module("posixpath").unwrap();
    assert!(!Arc::ptr_eq(&from_forward, &from_reversed));

    let standalone = ModuleDatabase::load(&a).unwrap();
    let from_standalone = standalone.get_module("posixpath").unwrap();
    assert!(!Arc::ptr_eq(&from_forward, &from_standalone));
    assert!(!Arc::ptr_eq(&from_reversed, &from_standalone));
}

#[test]
fn layers_accumulate_in_load_order() {
    let temp = TempDir::new().unwrap();
    let os_dir = os_db(&temp, "os_db");
    let posix_dir = posixpath_db(&temp, "posix_db");

    let mut db = LayeredDatabase::open(&os_dir).unwrap();
    db.load_database(&posix_dir).unwrap();

    assert_eq!(db.layer_count(), 2);
    assert!(db.contains_module("os"));
    assert!(db.contains_module("posixpath"));
}

// ============================================================================
// Analyzer Bootstrap
// ============================================================================

#[test]
fn v3_database_missing_str_falls_back_per_symbol() {
    let temp = TempDir::new().unwrap();
    let dir = builtins_v3_db(&temp, "v3_no_str", false);

    let db = LayeredDatabase::open(&dir).unwrap();
    let analyzer = Analyzer::make(db, PythonVersion::new(3, 3)).unwrap();

    let str_ty = analyzer.builtin_type(BuiltinType::Str);
    let bytes_ty = analyzer.builtin_type(BuiltinType::Bytes);
    let unicode_ty = analyzer.builtin_type(BuiltinType::Unicode);

    // str came from the bundled reference data, bytes from the database
    assert!(str_ty.is_from_fallback());
    assert!(!bytes_ty.is_from_fallback());

    // Aliasing: text strings are unicode on 3.x, distinct from bytes
    assert!(Arc::ptr_eq(str_ty, unicode_ty));
    assert!(!Arc::ptr_eq(str_ty, bytes_ty));

    // Naming follows the requested version even though the physical
    // fallback entry is 2.7-format data
    assert_eq!(str_ty.module_name(), "builtins");
    assert_eq!(str_ty.type_name(), "str");
}

#[test]
fn complete_v3_database_needs_no_fallback() {
    let temp = TempDir::new().unwrap();
    let dir = builtins_v3_db(&temp, "v3_full", true);

    let db = LayeredDatabase::open(&dir).unwrap();
    let analyzer = Analyzer::make(db, PythonVersion::new(3, 3)).unwrap();

    for &builtin in BuiltinType::ALL {
        assert!(
            !analyzer.builtin_type(builtin).is_from_fallback(),
            "{:?} should resolve from the database",
            builtin
        );
    }
}

#[test]
fn builtins_module_name_follows_requested_version_not_data() {
    // A 2.7-format database loaded under a nominal 3.x session: the
    // builtins module carries 3.x naming but 2.7-format descriptors
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("mixed");
    write_module(
        &dir,
        "builtins",
        "2.7",
        r#"{
            "object": {"kind": "type"}, "type": {"kind": "type"},
            "str": {"kind": "type"}, "bytes": {"kind": "type"},
            "int": {"kind": "type"}, "float": {"kind": "type"},
            "bool": {"kind": "type"}, "NoneType": {"kind": "type"},
            "list": {"kind": "type"}, "tuple": {"kind": "type"},
            "dict": {"kind": "type"}, "set": {"kind": "type"}
        }"#,
    );

    let db = LayeredDatabase::open(&dir).unwrap();
    let analyzer = Analyzer::make(db, PythonVersion::new(3, 4)).unwrap();

    let record = analyzer.builtin_type(BuiltinType::Str);
    assert!(!record.is_from_fallback());
    assert_eq!(record.module_name(), "builtins");
}

// ============================================================================
// Member Descriptions
// ============================================================================

#[test]
fn property_members_describe_their_value_type() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("props");
    write_module(
        &dir,
        "sys",
        "3.3",
        r#"{
            "maxsize": {"kind": "property", "value_type": "int"},
            "flags": {"kind": "property"}
        }"#,
    );

    let db = LayeredDatabase::open(&dir).unwrap();
    let sys = db.get_module("sys").unwrap();

    let typed = sys.get_member("maxsize").unwrap();
    assert_eq!(typed.description(), "property of type int");
    assert_eq!(typed.value_type(), Some("int"));

    let untyped = sys.get_member("flags").unwrap();
    assert_eq!(untyped.description(), "property of type object");
    assert_eq!(untyped.value_type(), Some("object"));
}
