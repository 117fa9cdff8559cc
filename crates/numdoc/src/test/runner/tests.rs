use numdoc_eval::Evaluator;
use numdoc_ir::{Config, Doctest, RunResult};
use numdoc_parse::ExampleParser;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

use super::*;

fn doctest(text: &str, config: &Config) -> Doctest {
    ExampleParser::new(config)
        .get_doctest(text, "unit", None, 0, config.default_globals.clone())
        .unwrap()
}

fn run(text: &str, config: &Config) -> DoctestReport {
    DocTestRunner::new(&Evaluator::new(), config)
        .run(&doctest(text, config))
        .unwrap()
}

fn states(report: &DoctestReport) -> Vec<&ExampleState> {
    report.examples.iter().map(|e| &e.state).collect()
}

// === Outcomes ===

#[test]
fn namespace_persists_between_examples() {
    let report = run(">>> x = 20\n>>> x * 2 + 2\n42\n", &Config::default());
    assert_eq!(report.result, RunResult::new(2, 0, 0));
}

#[test]
fn mismatch_keeps_the_output() {
    let report = run(">>> print('a')\nb\n", &Config::default());
    assert_eq!(report.result, RunResult::new(1, 1, 0));
    assert_eq!(
        states(&report),
        vec![&ExampleState::Failed(Failure::Mismatch {
            got: "a\n".to_string()
        })]
    );
}

#[test]
fn documented_errors_pass() {
    let text = "\
>>> 1 / 0
Traceback (most recent call last):
  ...
ZeroDivisionError: division by zero
>>> int('x')
Traceback (most recent call last):
ValueError: something else entirely
";
    let report = run(text, &Config::default());
    // IGNORE_EXCEPTION_DETAIL is on by default: only the kind is compared.
    assert_eq!(report.result, RunResult::new(2, 0, 0));
}

#[test]
fn tolerance_applies_to_printed_numbers() {
    let text = ">>> 1 / 3\n0.333\n";
    assert_eq!(run(text, &Config::default()).result.failed, 1);
    let loose = Config::builder().tolerances(0.001, 0.01).build().unwrap();
    assert_eq!(run(text, &loose).result.failed, 0);
}

// === Skips and unchecked examples ===

#[test]
fn block_skip_skips_the_whole_block() {
    let text = "\
>>> a = 1
>>> b = 2  # doctest: +SKIPBLOCK
>>> c = 3

Prose.

>>> 4
4
";
    let report = run(text, &Config::default());
    assert_eq!(report.result, RunResult::new(1, 0, 3));
    assert_eq!(
        states(&report),
        vec![
            &ExampleState::Skipped,
            &ExampleState::Skipped,
            &ExampleState::Skipped,
            &ExampleState::Passed
        ]
    );
}

#[test]
fn skipped_examples_can_count_as_attempted() {
    let config = Config::builder()
        .count_skipped_as_attempted(true)
        .build()
        .unwrap();
    let report = run(">>> 1  # doctest: +SKIP\n2\n>>> 1\n1\n", &config);
    assert_eq!(report.result, RunResult::new(2, 0, 1));
}

#[test]
fn stopword_examples_run_but_their_output_is_ignored() {
    let config = Config::default();
    let text = "\
>>> import matplotlib.pyplot as plt
>>> counts = [1, 2, 3]  # later: plt.bar(counts)
>>> plt.bar(counts)
<BarContainer object of 3 artists>
>>> counts
[1, 2, 3]
";
    let report = run(text, &config);
    assert_eq!(report.result, RunResult::new(4, 0, 0));
}

#[test]
fn stopword_examples_still_fail_on_errors() {
    let report = run(">>> 1 / 0  # .show( of nothing\n", &Config::default());
    assert!(matches!(
        states(&report)[0],
        ExampleState::Failed(Failure::UnexpectedError { .. })
    ));
}

#[test]
fn pseudocode_only_needs_valid_syntax() {
    let config = Config::builder()
        .pseudocode_markers(["# pseudo"])
        .build()
        .unwrap();
    let report = run(">>> solve(system)  # pseudo\n<solution>\n", &config);
    assert_eq!(report.result, RunResult::new(1, 0, 0));

    let report = run(">>> solve(system  # pseudo\n", &config);
    assert!(matches!(
        states(&report)[0],
        ExampleState::Failed(Failure::InvalidSyntax { .. })
    ));
}

#[test]
fn randomized_examples_still_fail_on_errors() {
    let config = Config::default();
    let report = run(">>> 1 / 0  # random\n0.5\n", &config);
    assert_eq!(report.result.failed, 1);
    let report = run(">>> 0.25  # random\n0.5\n", &config);
    assert_eq!(report.result.failed, 0);
}

#[test]
fn runaway_values_fail_the_example_not_the_run() {
    let text = "\
>>> [0] * 4611686018427387904
[0, ...]
>>> x = []
>>> for i in range(200000):
...     x = [x]
>>> len(x)
1
";
    let report = run(text, &Config::default());
    assert_eq!(report.result, RunResult::new(4, 2, 0));
    assert!(matches!(
        states(&report)[0],
        ExampleState::Failed(Failure::UnexpectedError { .. })
    ));
    assert!(matches!(
        states(&report)[2],
        ExampleState::Failed(Failure::UnexpectedError { .. })
    ));
    assert_eq!(states(&report)[3], &ExampleState::Passed);
}

// === Cascades and fail-fast ===

#[test]
fn name_errors_after_an_unexpected_error_are_cascades() {
    let text = "\
>>> y = undefined_thing
>>> y + 1
2
>>> 5
5
";
    let report = run(text, &Config::default());
    assert_eq!(report.result, RunResult::new(3, 2, 0));
    assert!(matches!(
        states(&report)[0],
        ExampleState::Failed(Failure::UnexpectedError { .. })
    ));
    assert!(matches!(
        states(&report)[1],
        ExampleState::Failed(Failure::Cascade { .. })
    ));
    assert_eq!(report.failures(false).count(), 1);
    assert_eq!(report.failures(true).count(), 2);
}

#[test]
fn fail_fast_leaves_the_rest_pending() {
    let config = Config::builder().stop_on_first_failure(true).build().unwrap();
    let report = run(">>> 1\n2\n>>> 3\n3\n", &config);
    assert_eq!(report.result, RunResult::new(1, 1, 0));
    assert_eq!(states(&report)[1], &ExampleState::Pending);
}

// === Fatal errors ===

#[test]
fn contradictory_directives_abort_the_run() {
    let config = Config::default();
    let doctest = doctest(">>> 1  # doctest: +ELLIPSIS, -ELLIPSIS\n1\n", &config);
    let err = DocTestRunner::new(&Evaluator::new(), &config)
        .run(&doctest)
        .unwrap_err();
    assert!(matches!(err, RunError::Config { .. }));
}

#[test]
fn broken_globals_abort_the_run() {
    let config = Config::builder().global("x", "def").build().unwrap();
    let doctest = doctest(">>> x\n", &config);
    let err = DocTestRunner::new(&Evaluator::new(), &config)
        .run(&doctest)
        .unwrap_err();
    assert!(matches!(err, RunError::Namespace { .. }));
}

// === Working directory ===

#[test]
fn local_resources_are_copied_into_the_workdir() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("data.txt"), "1 2 3").unwrap();
    let config = Config::builder()
        .local_resource("unit", "data.txt")
        .build()
        .unwrap();
    let mut doctest = doctest(">>> read_text('data.txt')\n'1 2 3'\n", &config);
    doctest.filename = Some(dir.path().join("module.py"));

    let report = DocTestRunner::new(&Evaluator::new(), &config)
        .run(&doctest)
        .unwrap();
    assert_eq!(report.result, RunResult::new(1, 0, 0));
}

#[test]
fn missing_resource_is_fatal() {
    let dir = tempdir().unwrap();
    let config = Config::builder()
        .local_resource("unit", "absent.txt")
        .build()
        .unwrap();
    let mut doctest = doctest(">>> 1\n1\n", &config);
    doctest.filename = Some(dir.path().join("module.py"));
    let err = DocTestRunner::new(&Evaluator::new(), &config)
        .run(&doctest)
        .unwrap_err();
    assert!(matches!(err, RunError::Resource { .. }));
}

#[test]
fn files_outside_the_workdir_are_unreachable() {
    let report = run(
        ">>> read_text('../secret.txt')\nTraceback (most recent call last):\nPermissionError: denied\n",
        &Config::default(),
    );
    assert_eq!(report.result, RunResult::new(1, 0, 0));
}

// === Many doctests ===

#[test]
fn run_all_merges_in_collection_order() {
    let config = Config::default();
    let mut doctests = Vec::new();
    for i in 0..8 {
        let mut doctest = doctest(&format!(">>> {i} * 2\n{}\n", i * 2), &config);
        doctest.name = format!("unit{i}");
        doctests.push(doctest);
    }
    doctests[3].examples[0].want = "0\n".to_string();

    let report = DocTestRunner::new(&Evaluator::new(), &config)
        .run_all(&doctests)
        .unwrap();
    let names: Vec<String> = (0..8).map(|i| format!("unit{i}")).collect();
    assert_eq!(report.history.names().collect::<Vec<_>>(), names);
    assert_eq!(report.totals(), RunResult::new(8, 1, 0));
}

#[test]
fn parallel_and_sequential_runs_agree() {
    let text = ">>> import numpy as np\n>>> np.arange(3) * 1.5\narray([0. , 1.5, 3. ])\n";
    let parallel = Config::default();
    let sequential = Config::builder().parallel(false).build().unwrap();
    let doctests = vec![doctest(text, &parallel), doctest(text, &parallel)];

    let a = DocTestRunner::new(&Evaluator::new(), &parallel)
        .run_all(&doctests)
        .unwrap();
    let b = DocTestRunner::new(&Evaluator::new(), &sequential)
        .run_all(&doctests)
        .unwrap();
    assert_eq!(a, b);
    assert_eq!(a.totals(), RunResult::new(4, 0, 0));
}
