use std::path::Path;

use pretty_assertions::assert_eq;

use super::*;

fn sample() -> SymbolTree {
    let mut b = SymbolTree::builder("stats");
    let root = b.root();
    let private = b.module(root, "_impl");
    let mean = b.function(private, "mean");
    b.doc(mean, ">>> mean([1, 2])\n1.5\n");
    b.reexport(root, mean).exports(root, ["mean"]);
    b.build()
}

// === Builder ===

#[test]
fn reexport_keeps_the_defining_owner() {
    let tree = sample();
    let mean = tree.lookup("stats._impl.mean").unwrap();
    assert_eq!(tree.lookup("stats.mean"), Some(mean));
    assert_eq!(tree.qualified_name(mean), "stats._impl.mean");
    assert_eq!(tree.kind(mean), SymbolKind::Function);
}

#[test]
fn export_membership_requires_an_export_list() {
    let tree = sample();
    let root = tree.root();
    let private = tree.lookup("stats._impl").unwrap();
    assert!(tree.export_list_membership(root, "mean"));
    assert!(!tree.export_list_membership(root, "_impl"));
    assert!(!tree.export_list_membership(private, "mean"));
}

#[test]
fn ids_past_the_u32_range_are_an_error() {
    assert_eq!(id_at(7).unwrap(), SymbolId::new(7));
    assert_eq!(id_at(u32::MAX as usize).unwrap(), SymbolId::new(u32::MAX));
    let past = u32::MAX as usize + 1;
    assert!(matches!(
        id_at(past),
        Err(SymbolError::TooManySymbols { count }) if count == past
    ));
}

#[test]
fn try_add_hands_out_sequential_ids() {
    let mut b = SymbolTree::builder("m");
    let root = b.root();
    let f = b.try_add(root, "f", SymbolKind::Function).unwrap();
    let g = b.try_add(root, "g", SymbolKind::Function).unwrap();
    assert_eq!((f, g), (SymbolId::new(1), SymbolId::new(2)));
    assert_eq!(b.build().children(root), &[f, g]);
}

#[test]
fn lookup_rejects_foreign_roots_and_missing_members() {
    let tree = sample();
    assert_eq!(tree.lookup("other.mean"), None);
    assert_eq!(tree.lookup("stats.median"), None);
    assert_eq!(tree.lookup("stats"), Some(tree.root()));
}

// === JSON dumps ===

const DUMP: &str = r#"{
    "name": "geo",
    "doc": "Geometry helpers.",
    "file": "geo/__init__.py",
    "exports": ["Point"],
    "reexports": ["geo._shapes.Point"],
    "members": [
        { "name": "_shapes", "file": "geo/_shapes.py", "members": [
            { "name": "_Base", "kind": "class", "members": [
                { "name": "norm", "kind": "method", "doc": ">>> 1\n1\n", "line": 12 }
            ]},
            { "name": "Point", "kind": "class", "bases": ["geo._shapes._Base"], "members": [
                { "name": "norm", "kind": "method" }
            ]}
        ]}
    ]
}"#;

#[test]
fn json_dump_resolves_references() {
    let tree = SymbolTree::from_json(DUMP).unwrap();
    let point = tree.lookup("geo._shapes.Point").unwrap();
    let base = tree.lookup("geo._shapes._Base").unwrap();
    assert_eq!(tree.bases(point), &[base]);
    assert_eq!(tree.lookup("geo.Point"), Some(point));
    assert_eq!(tree.documentation_text(tree.root()), Some("Geometry helpers."));
}

#[test]
fn members_inherit_the_container_file() {
    let tree = SymbolTree::from_json(DUMP).unwrap();
    let norm = tree.lookup("geo._shapes._Base.norm").unwrap();
    assert_eq!(tree.filename(norm), Some(Path::new("geo/_shapes.py")));
    assert_eq!(tree.line_number(norm), 12);
}

#[test]
fn load_resolves_files_against_the_dump_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("geo.json");
    std::fs::write(&path, DUMP).unwrap();
    let tree = SymbolTree::load(&path).unwrap();
    assert_eq!(
        tree.filename(tree.root()),
        Some(dir.path().join("geo/__init__.py").as_path())
    );
}

#[test]
fn unresolved_reference_is_an_error() {
    let err = SymbolTree::from_json(r#"{"name": "m", "reexports": ["m.nope"]}"#).unwrap_err();
    assert!(matches!(
        err,
        SymbolError::UnresolvedReference { ref target, .. } if target == "m.nope"
    ));
}

#[test]
fn unknown_fields_are_rejected() {
    let err = SymbolTree::from_json(r#"{"name": "m", "docs": "typo"}"#).unwrap_err();
    assert!(matches!(err, SymbolError::Json(_)));
}

#[test]
fn missing_dump_file_reports_the_path() {
    let err = SymbolTree::load(Path::new("/nonexistent/dump.json")).unwrap_err();
    assert!(err.to_string().contains("/nonexistent/dump.json"));
}
