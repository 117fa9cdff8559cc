//! End-to-end behaviour through the public frontends.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use numdoc::symbols::SymbolTree;
use numdoc::test::{DocTestRunner, ExampleState};
use numdoc::{testmod, Config, Evaluator, ExampleParser, RunResult, Strategy};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn run_text(text: &str, config: &Config) -> numdoc::test::DoctestReport {
    let doctest = ExampleParser::new(config)
        .get_doctest(text, "doc", None, 0, config.default_globals.clone())
        .unwrap();
    DocTestRunner::new(&Evaluator::new(), config).run(&doctest).unwrap()
}

// -- Checking --

#[test]
fn a_third_fails_by_default_and_passes_when_loose() {
    let text = ">>> print(1 / 3)\n0.333\n";
    assert_eq!(run_text(text, &Config::default()).result, RunResult::new(1, 1, 0));

    let loose = Config::builder().tolerances(0.001, 0.01).build().unwrap();
    assert_eq!(run_text(text, &loose).result, RunResult::new(1, 0, 0));
}

#[test]
fn lists_and_tuples_are_different() {
    let report = run_text(">>> [1, 2]\n(1, 2)\n", &Config::default());
    assert_eq!(report.result.failed, 1);
    let report = run_text(">>> (1, 2)\n(1, 2)\n", &Config::default());
    assert_eq!(report.result.failed, 0);
}

#[test]
fn arrays_compare_within_tolerance() {
    let text = "\
>>> import numpy as np
>>> np.array([1.0, 2.0]) / 3
array([0.333333, 0.666667])
";
    let report = run_text(text, &Config::default());
    assert_eq!(report.result, RunResult::new(2, 0, 0));
}

#[test]
fn stopword_output_is_not_checked() {
    let config = Config::default();
    let text = ">>> import matplotlib.pyplot as plt\n>>> plt.show()\nanything at all\n";
    let report = run_text(text, &config);
    assert_eq!(report.result, RunResult::new(2, 0, 0));

    let report = run_text(">>> import matplotlib.pyplot as plt\n>>> plt.show(\n", &config);
    assert_eq!(report.result, RunResult::new(2, 1, 0));
}

#[test]
fn stopword_examples_keep_their_bindings() {
    let text = ">>> counts = [1, 2, 3]  # later: plt.bar(counts)\n>>> counts\n[1, 2, 3]\n";
    let report = run_text(text, &Config::default());
    assert_eq!(report.result, RunResult::new(2, 0, 0));
}

#[test]
fn one_block_skip_skips_three_examples() {
    let text = ">>> a = 1  # doctest: +SKIPBLOCK\n>>> b = 2\n>>> a + b\n3\n";
    let report = run_text(text, &Config::default());
    assert_eq!(report.result, RunResult::new(0, 0, 3));
    assert!(report
        .examples
        .iter()
        .all(|e| e.state == ExampleState::Skipped));
}

// -- Discovery --

#[test]
fn reexported_definition_counts_once_under_the_public_api() {
    let tree = SymbolTree::from_json(
        r#"{
            "name": "pkg",
            "exports": ["area"],
            "reexports": ["pkg._geometry.area"],
            "members": [
                { "name": "_geometry", "members": [
                    { "name": "area", "kind": "function", "doc": ">>> 2 * 2\n4\n" }
                ]}
            ]
        }"#,
    )
    .unwrap();

    let public = Config::builder().strategy(Strategy::PublicApi).build().unwrap();
    let run = testmod(&tree, &public).unwrap();
    assert_eq!(run.history().names().collect::<Vec<_>>(), vec!["pkg.area"]);

    let all = Config::builder().strategy(Strategy::All).build().unwrap();
    let run = testmod(&tree, &all).unwrap();
    assert_eq!(
        run.history().names().collect::<Vec<_>>(),
        vec!["pkg._geometry.area", "pkg.area"]
    );
    assert!(run.succeeded());
}

// -- Properties --

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        ..ProptestConfig::default()
    })]

    /// A printed float passes against any want within `atol + rtol * |want|`.
    #[test]
    fn printed_floats_pass_within_tolerance(want in -1.0e3f64..1.0e3, frac in -0.9f64..0.9) {
        let config = Config::builder().tolerances(1e-3, 1e-3).build().unwrap();
        let got = want + frac * (1e-3 + 1e-3 * want.abs());
        let report = run_text(&format!(">>> print({got:?})\n{want:?}\n"), &config);
        prop_assert_eq!(report.result, RunResult::new(1, 0, 0));
    }

    /// Twice the bound fails.
    #[test]
    fn printed_floats_fail_outside_tolerance(want in -1.0e3f64..1.0e3, sign in prop::bool::ANY) {
        let config = Config::builder().tolerances(1e-3, 1e-3).build().unwrap();
        let offset = 2.0 * (1e-3 + 1e-3 * want.abs());
        let got = if sign { want + offset } else { want - offset };
        let report = run_text(&format!(">>> print({got:?})\n{want:?}\n"), &config);
        prop_assert_eq!(report.result, RunResult::new(1, 1, 0));
    }
}
