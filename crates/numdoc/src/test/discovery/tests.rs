use numdoc_ir::Config;
use pretty_assertions::assert_eq;

use super::*;
use crate::symbols::SymbolTree;

const EXAMPLE: &str = ">>> 1 + 1\n2\n";

/// `stats` re-exports `mean`, defined in the private `stats._impl`.
fn reexporting_package() -> SymbolTree {
    let mut b = SymbolTree::builder("stats");
    let root = b.root();
    b.doc(root, "Statistics.\n\n>>> 2 * 3\n6\n");
    let private = b.module(root, "_impl");
    let mean = b.function(private, "mean");
    b.doc(mean, EXAMPLE);
    b.reexport(root, mean).exports(root, ["mean"]);
    b.build()
}

fn names(graph: &SymbolTree, config: &Config) -> Vec<String> {
    Discoverer::new(graph, config)
        .candidates()
        .into_iter()
        .map(|c| c.name)
        .collect()
}

fn config(strategy: Strategy) -> Config {
    Config::builder().strategy(strategy).build().unwrap()
}

// === Strategies ===

#[test]
fn all_yields_one_doctest_per_path() {
    let tree = reexporting_package();
    assert_eq!(
        names(&tree, &config(Strategy::All)),
        vec!["stats", "stats._impl.mean", "stats.mean"]
    );
}

#[test]
fn public_api_yields_the_reexport_once() {
    let tree = reexporting_package();
    assert_eq!(
        names(&tree, &config(Strategy::PublicApi)),
        vec!["stats", "stats.mean"]
    );
}

#[test]
fn public_api_needs_an_export_list() {
    let mut b = SymbolTree::builder("pkg");
    let root = b.root();
    let f = b.function(root, "f");
    b.doc(f, EXAMPLE);
    let tree = b.build();
    assert_eq!(names(&tree, &config(Strategy::PublicApi)), Vec::<String>::new());
    assert_eq!(names(&tree, &config(Strategy::All)), vec!["pkg.f"]);
}

#[test]
fn public_api_skips_underscore_and_deprecated_exports() {
    let mut b = SymbolTree::builder("pkg");
    let root = b.root();
    let hidden = b.function(root, "_hidden");
    let old = b.function(root, "old");
    let new = b.function(root, "new");
    for id in [hidden, old, new] {
        b.doc(id, EXAMPLE);
    }
    b.deprecated(old).exports(root, ["_hidden", "old", "new", "missing"]);
    let tree = b.build();
    assert_eq!(names(&tree, &config(Strategy::PublicApi)), vec!["pkg.new"]);
}

#[test]
fn public_api_does_not_enter_exported_submodules() {
    let mut b = SymbolTree::builder("pkg");
    let root = b.root();
    let sub = b.module(root, "linalg");
    b.doc(sub, EXAMPLE);
    let inner = b.function(sub, "solve");
    b.doc(inner, ">>> 3\n3\n");
    b.exports(root, ["linalg"]).exports(sub, ["solve"]);
    let tree = b.build();
    assert_eq!(names(&tree, &config(Strategy::PublicApi)), vec!["pkg.linalg"]);
}

#[test]
fn public_api_walks_class_members_and_bases() {
    let mut b = SymbolTree::builder("geo");
    let root = b.root();
    let base = b.class(root, "_Base");
    let norm = b.method(base, "norm");
    b.doc(norm, ">>> 5\n5\n");
    let private = b.method(base, "_check");
    b.doc(private, EXAMPLE);
    let point = b.class(root, "Point");
    b.doc(point, ">>> 0\n0\n");
    let shift = b.method(point, "shift");
    b.doc(shift, ">>> 1\n1\n");
    b.base(point, base).exports(root, ["Point"]);
    let tree = b.build();
    assert_eq!(
        names(&tree, &config(Strategy::PublicApi)),
        vec!["geo.Point", "geo.Point.shift", "geo.Point.norm"]
    );
}

// === Inheritance and cycles ===

#[test]
fn members_inherit_documentation_from_private_bases() {
    let mut b = SymbolTree::builder("geo");
    let root = b.root();
    let base = b.class(root, "_Base");
    let documented = b.method(base, "area");
    b.doc(documented, EXAMPLE);
    let shape = b.class(root, "Square");
    let area = b.method(shape, "area");
    b.base(shape, base);
    let tree = b.build();

    assert_eq!(effective_documentation(&tree, area), Some((documented, EXAMPLE)));
    let all = names(&tree, &config(Strategy::All));
    assert!(all.contains(&"geo.Square.area".to_string()));
    assert!(all.contains(&"geo._Base.area".to_string()));
}

#[test]
fn cycles_are_cut_on_the_current_path() {
    let mut b = SymbolTree::builder("loop");
    let root = b.root();
    let a = b.module(root, "a");
    b.doc(a, EXAMPLE);
    b.reexport(a, root);
    let tree = b.build();
    assert_eq!(names(&tree, &config(Strategy::All)), vec!["loop.a"]);
}

// === Skip list and collection ===

#[test]
fn skip_list_matches_path_or_defining_name() {
    let tree = reexporting_package();
    let by_path = Config::builder().skip("stats.mean").build().unwrap();
    assert_eq!(names(&tree, &by_path), vec!["stats", "stats._impl.mean"]);

    let by_definition = Config::builder().skip("stats._impl.mean").build().unwrap();
    assert_eq!(names(&tree, &by_definition), vec!["stats"]);
}

#[test]
fn parse_errors_abort_only_their_unit() {
    let mut b = SymbolTree::builder("pkg");
    let root = b.root();
    let broken = b.function(root, "broken");
    b.doc(broken, ">>>1\n");
    let fine = b.function(root, "fine");
    b.doc(fine, EXAMPLE);
    let tree = b.build();
    let config = Config::default();

    let results: Vec<_> = discover(&tree, &config).collect();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_ref().unwrap_err().name(), "pkg.broken");
    assert_eq!(results[1].as_ref().unwrap().name, "pkg.fine");
}

#[test]
fn units_without_examples_are_not_yielded() {
    let mut b = SymbolTree::builder("pkg");
    let root = b.root();
    b.doc(root, "Prose only.");
    let f = b.function(root, "f");
    b.doc(f, EXAMPLE).location(f, "pkg/f.py", 7);
    let tree = b.build();
    let config = Config::builder().global("x", "1").build().unwrap();

    let doctests: Vec<_> = discover(&tree, &config).map(Result::unwrap).collect();
    assert_eq!(doctests.len(), 1);
    let doctest = &doctests[0];
    assert_eq!(doctest.name, "pkg.f");
    assert_eq!(doctest.line_number, 7);
    assert_eq!(doctest.filename.as_deref(), Some(std::path::Path::new("pkg/f.py")));
    assert_eq!(doctest.globs, vec![("x".to_string(), "1".to_string())]);
}
