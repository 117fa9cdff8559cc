use numdoc_ir::{Config, RunResult, Strategy};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

use super::*;

const MEAN_DOCS: &str = "\
Mean of a sequence.

>>> sum([1, 2, 3]) / 3
2.0
>>> sum([1, 2]) / 2
1.5
";

// === testfile ===

#[test]
fn testfile_runs_the_file_as_one_doctest() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("guide.txt");
    std::fs::write(&path, "Intro.\n\n>>> x = [1, 2, 3]\n>>> len(x)\n3\n>>> x[0] + 1\n3\n").unwrap();

    let run = testfile(&path, &Config::default()).unwrap();
    assert_eq!(run.result(), RunResult::new(3, 1, 0));
    assert_eq!(run.history().names().collect::<Vec<_>>(), vec!["guide.txt"]);
    assert!(!run.succeeded());
}

#[test]
fn testfile_resources_come_from_the_file_directory() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("values.csv"), "1,2\n").unwrap();
    let path = dir.path().join("io.txt");
    std::fs::write(&path, ">>> read_text('values.csv')\n'1,2\\n'\n").unwrap();
    let config = Config::builder()
        .local_resource("io.txt", "values.csv")
        .build()
        .unwrap();

    let run = testfile(&path, &config).unwrap();
    assert_eq!(run.result(), RunResult::new(1, 0, 0));
}

#[test]
fn testfile_reports_parse_errors_as_collect_errors() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.txt");
    std::fs::write(&path, ">>>1\n").unwrap();

    let run = testfile(&path, &Config::default()).unwrap();
    assert_eq!(run.collect_errors.len(), 1);
    assert_eq!(run.collect_errors[0].name(), "bad.txt");
    assert!(!run.succeeded());
}

#[test]
fn testfile_missing_file_is_an_error() {
    let err = testfile(Path::new("/nonexistent/guide.txt"), &Config::default()).unwrap_err();
    assert!(matches!(err, FrontendError::Io { .. }));
}

#[test]
fn invalid_config_is_rejected_before_running() {
    let mut config = Config::default();
    config.atol = -1.0;
    let err = testfile(Path::new("/nonexistent/guide.txt"), &config).unwrap_err();
    assert!(matches!(err, FrontendError::Config(_)));
}

// === testmod ===

fn stats_tree() -> SymbolTree {
    let mut b = SymbolTree::builder("stats");
    let root = b.root();
    b.doc(root, ">>> 2 * 3\n6\n");
    let private = b.module(root, "_impl");
    let mean = b.function(private, "mean");
    b.doc(mean, MEAN_DOCS);
    b.reexport(root, mean).exports(root, ["mean"]);
    b.build()
}

#[test]
fn testmod_counts_depend_on_the_strategy() {
    let tree = stats_tree();
    let public = Config::builder().strategy(Strategy::PublicApi).build().unwrap();
    let all = Config::builder().strategy(Strategy::All).build().unwrap();

    let run = testmod(&tree, &public).unwrap();
    assert_eq!(run.history().names().collect::<Vec<_>>(), vec!["stats", "stats.mean"]);
    assert_eq!(run.result(), RunResult::new(3, 0, 0));

    let run = testmod(&tree, &all).unwrap();
    assert_eq!(
        run.history().names().collect::<Vec<_>>(),
        vec!["stats", "stats._impl.mean", "stats.mean"]
    );
    assert_eq!(run.result(), RunResult::new(5, 0, 0));
}

#[test]
fn testmod_keeps_going_after_a_collect_error() {
    let mut b = SymbolTree::builder("pkg");
    let root = b.root();
    let broken = b.function(root, "broken");
    b.doc(broken, ">>>1\n");
    let fine = b.function(root, "fine");
    b.doc(fine, ">>> 2 + 2\n4\n");
    let tree = b.build();

    let run = testmod(&tree, &Config::default()).unwrap();
    assert_eq!(run.result(), RunResult::new(1, 0, 0));
    assert_eq!(run.collect_errors.len(), 1);
    assert!(!run.succeeded());
}

#[test]
fn testmod_path_loads_a_dump() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pkg.json");
    std::fs::write(
        &path,
        r#"{"name": "pkg", "members": [{"name": "f", "kind": "function", "doc": ">>> 6 * 7\n42\n"}]}"#,
    )
    .unwrap();
    let run = testmod_path(&path, &Config::default()).unwrap();
    assert!(run.succeeded());
    assert_eq!(run.history().get("pkg.f"), Some(RunResult::new(1, 0, 0)));
}

// === Rendering ===

fn failing_run() -> TestRun {
    let mut b = SymbolTree::builder("pkg");
    let root = b.root();
    let f = b.function(root, "f");
    b.doc(f, ">>> y = missing\n>>> y\n1\n>>> 1\n1\n");
    let tree = b.build();
    testmod(&tree, &Config::default()).unwrap()
}

#[test]
fn quiet_render_shows_failures_and_summary() {
    let run = failing_run();
    let rendered = run.render(&Config::default());
    assert!(rendered.contains("Failed example:\n    y = missing\n"));
    assert!(!rendered.contains("Failed example:\n    y\n"));
    assert!(rendered.ends_with("1 doctests: attempted=3, failed=2, skipped=0\nFAILED\n"));
}

#[test]
fn verbose_render_lists_every_example() {
    let run = failing_run();
    let config = Config::builder()
        .verbosity(2)
        .report_cascade_errors(true)
        .build()
        .unwrap();
    let rendered = run.render(&config);
    assert!(rendered.contains("pkg.f: attempted=3, failed=2, skipped=0\n"));
    assert!(rendered.contains("    line 2: y ... FAILED (cascade)\n"));
    assert!(rendered.contains("    line 4: 1 ... ok\n"));
    assert!(rendered.contains("Failed example:\n    y\n"));
}

#[test]
fn empty_run_renders_no_tests_found() {
    let run = TestRun::default();
    assert!(run.succeeded());
    assert_eq!(run.render(&Config::default()), "0 doctests: attempted=0, failed=0, skipped=0\nNO TESTS FOUND\n");
}
