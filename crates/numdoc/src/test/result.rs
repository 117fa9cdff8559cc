//! Per-example states and per-doctest reports.

use std::fmt::Write as _;
use std::path::PathBuf;

use numdoc_ir::{Example, ExecError, RunHistory, RunResult, TRACEBACK_HEADER};

/// Why an example failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Failure {
    /// The output did not match the transcript.
    Mismatch { got: String },
    /// An error the transcript does not document.
    UnexpectedError { output: String, error: ExecError },
    /// An undefined-name error after an earlier unexpected error in the same
    /// doctest, most likely caused by it.
    Cascade { error: ExecError },
    /// The source of an unchecked example does not parse.
    InvalidSyntax { error: ExecError },
}

impl Failure {
    pub fn is_cascade(&self) -> bool {
        matches!(self, Failure::Cascade { .. })
    }
}

/// Lifecycle of one example: `Pending` until reached, `Executing` while the
/// interpreter runs it, then one of the terminal states. Examples after a
/// fail-fast abort stay `Pending`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExampleState {
    Pending,
    Executing,
    Passed,
    Failed(Failure),
    Skipped,
}

impl ExampleState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExampleState::Pending | ExampleState::Executing)
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            ExampleState::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExampleReport {
    /// Zero-based line of the prompt within the documentation.
    pub line_number: usize,
    pub source: String,
    pub want: String,
    pub state: ExampleState,
}

impl ExampleReport {
    pub fn pending(example: &Example) -> Self {
        ExampleReport {
            line_number: example.line_number,
            source: example.source.clone(),
            want: example.want.clone(),
            state: ExampleState::Pending,
        }
    }
}

/// Everything the runner learned about one doctest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DoctestReport {
    pub name: String,
    pub filename: Option<PathBuf>,
    /// Line of the documentation within `filename`.
    pub line_number: usize,
    pub result: RunResult,
    pub examples: Vec<ExampleReport>,
}

impl DoctestReport {
    /// Failed examples worth showing. Cascade failures are included only
    /// when asked for.
    pub fn failures(&self, include_cascade: bool) -> impl Iterator<Item = (&ExampleReport, &Failure)> {
        self.examples.iter().filter_map(move |example| {
            let failure = example.state.failure()?;
            (include_cascade || !failure.is_cascade()).then_some((example, failure))
        })
    }

    /// Doctest-style failure report for every shown failure.
    pub fn render_failures(&self, include_cascade: bool) -> String {
        let mut out = String::new();
        for (example, failure) in self.failures(include_cascade) {
            out.push_str(&self.render_failure(example, failure));
        }
        out
    }

    fn render_failure(&self, example: &ExampleReport, failure: &Failure) -> String {
        let mut out = String::from(SEPARATOR);
        out.push('\n');
        let line = self.line_number + example.line_number + 1;
        match &self.filename {
            Some(file) => {
                let _ = writeln!(out, "File \"{}\", line {line}, in {}", file.display(), self.name);
            }
            None => {
                let _ = writeln!(out, "Line {line}, in {}", self.name);
            }
        }
        out.push_str("Failed example:\n");
        indent_into(&mut out, &example.source);
        match failure {
            Failure::Mismatch { got } => {
                if example.want.is_empty() {
                    out.push_str("Expected nothing\n");
                } else {
                    out.push_str("Expected:\n");
                    indent_into(&mut out, &example.want);
                }
                if got.is_empty() {
                    out.push_str("Got nothing\n");
                } else {
                    out.push_str("Got:\n");
                    indent_into(&mut out, got);
                }
            }
            Failure::UnexpectedError { error, .. } | Failure::Cascade { error } => {
                out.push_str("Exception raised:\n");
                indent_into(&mut out, &format!("{TRACEBACK_HEADER}\n...\n{}", error.report_line()));
            }
            Failure::InvalidSyntax { error } => {
                out.push_str("Invalid syntax:\n");
                indent_into(&mut out, &error.report_line());
            }
        }
        out
    }
}

const SEPARATOR: &str = "**********************************************************************";

fn indent_into(out: &mut String, text: &str) {
    for line in text.lines() {
        out.push_str("    ");
        out.push_str(line);
        out.push('\n');
    }
}

/// Reports of a collection pass, in collection order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    pub history: RunHistory,
    pub doctests: Vec<DoctestReport>,
}

impl RunReport {
    pub fn push(&mut self, report: DoctestReport) {
        self.history.record(&report.name, report.result);
        self.doctests.push(report);
    }

    /// Fold another pass in after this one.
    pub fn merge(&mut self, other: RunReport) {
        self.history.merge(other.history);
        self.doctests.extend(other.doctests);
    }

    pub fn totals(&self) -> RunResult {
        self.history.totals()
    }
}

#[cfg(test)]
mod tests {
    use numdoc_ir::ErrorCategory;
    use pretty_assertions::assert_eq;

    use super::*;

    fn report(state: ExampleState) -> DoctestReport {
        DoctestReport {
            name: "pkg.f".to_string(),
            filename: Some(PathBuf::from("pkg/f.py")),
            line_number: 10,
            result: RunResult::new(1, 1, 0),
            examples: vec![ExampleReport {
                line_number: 2,
                source: "x + 1".to_string(),
                want: "2\n".to_string(),
                state,
            }],
        }
    }

    #[test]
    fn mismatch_renders_expected_and_got() {
        let rendered = report(ExampleState::Failed(Failure::Mismatch {
            got: "3\n".to_string(),
        }))
        .render_failures(false);
        assert_eq!(
            rendered,
            format!(
                "{SEPARATOR}\nFile \"pkg/f.py\", line 13, in pkg.f\nFailed example:\n    x + 1\nExpected:\n    2\nGot:\n    3\n"
            )
        );
    }

    #[test]
    fn cascade_failures_are_hidden_unless_requested() {
        let error = ExecError::new(ErrorCategory::UndefinedName, "NameError", "name 'x' is not defined");
        let report = report(ExampleState::Failed(Failure::Cascade { error }));
        assert_eq!(report.failures(false).count(), 0);
        assert_eq!(report.failures(true).count(), 1);
        assert!(report
            .render_failures(true)
            .contains("    NameError: name 'x' is not defined\n"));
    }

    #[test]
    fn report_merge_keeps_collection_order() {
        let mut first = RunReport::default();
        first.push(report(ExampleState::Passed));
        let mut second = RunReport::default();
        let mut other = report(ExampleState::Skipped);
        other.name = "pkg.g".to_string();
        other.result = RunResult::new(0, 0, 1);
        second.push(other);

        first.merge(second);
        assert_eq!(first.history.names().collect::<Vec<_>>(), vec!["pkg.f", "pkg.g"]);
        assert_eq!(first.totals(), RunResult::new(1, 1, 1));
    }

    #[test]
    fn only_finished_states_are_terminal() {
        assert!(!ExampleState::Pending.is_terminal());
        assert!(!ExampleState::Executing.is_terminal());
        assert!(ExampleState::Skipped.is_terminal());
    }
}
