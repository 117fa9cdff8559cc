//! Entry points: test one text file, or every doctest in a symbol graph.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use numdoc_eval::Evaluator;
use numdoc_ir::{Config, ConfigError, Interpreter, RunHistory, RunResult};
use numdoc_parse::ExampleParser;

use crate::symbols::{SymbolError, SymbolGraph, SymbolTree};
use crate::test::{discover, CollectError, DocTestRunner, ExampleState, RunError, RunReport};

/// Failures that stop a frontend call before any result exists.
#[derive(Debug, thiserror::Error)]
pub enum FrontendError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Symbols(#[from] SymbolError),
    #[error(transparent)]
    Run(#[from] RunError),
}

/// Outcome of a frontend call.
#[derive(Clone, Debug, Default)]
pub struct TestRun {
    pub report: RunReport,
    /// Units whose documentation could not be parsed. They count as failures
    /// of the run but contribute nothing to the counts.
    pub collect_errors: Vec<CollectError>,
}

impl TestRun {
    pub fn result(&self) -> RunResult {
        self.report.totals()
    }

    pub fn history(&self) -> &RunHistory {
        &self.report.history
    }

    pub fn succeeded(&self) -> bool {
        !self.result().has_failures() && self.collect_errors.is_empty()
    }

    pub fn merge(&mut self, other: TestRun) {
        self.report.merge(other.report);
        self.collect_errors.extend(other.collect_errors);
    }

    /// Human-readable report at `config.verbosity`.
    ///
    /// Failures and collection errors are always shown; verbosity 1 adds one
    /// line per doctest and verbosity 2 one line per example.
    pub fn render(&self, config: &Config) -> String {
        let mut out = String::new();
        for error in &self.collect_errors {
            let _ = writeln!(out, "ERROR: {error}");
        }
        for doctest in &self.report.doctests {
            if config.verbosity >= 1 {
                let _ = writeln!(out, "{}: {}", doctest.name, doctest.result);
            }
            if config.verbosity >= 2 {
                for example in &doctest.examples {
                    let status = match &example.state {
                        ExampleState::Passed => "ok",
                        ExampleState::Failed(failure) if failure.is_cascade() => "FAILED (cascade)",
                        ExampleState::Failed(_) => "FAILED",
                        ExampleState::Skipped => "skipped",
                        ExampleState::Pending | ExampleState::Executing => "not run",
                    };
                    let first_line = example.source.lines().next().unwrap_or_default();
                    let _ = writeln!(out, "    line {}: {first_line} ... {status}", example.line_number + 1);
                }
            }
            out.push_str(&doctest.render_failures(config.report_cascade_errors));
        }

        let result = self.result();
        let _ = writeln!(out, "{} doctests: {result}", self.report.doctests.len());
        out.push_str(if !self.succeeded() {
            "FAILED\n"
        } else if self.report.doctests.is_empty() {
            "NO TESTS FOUND\n"
        } else {
            "OK\n"
        });
        out
    }
}

/// Run the examples of a text file as one doctest named after the file.
pub fn testfile(path: &Path, config: &Config) -> Result<TestRun, FrontendError> {
    testfile_with(path, config, &Evaluator::new())
}

#[tracing::instrument(level = "debug", skip(config, interpreter))]
pub fn testfile_with<I: Interpreter>(
    path: &Path,
    config: &Config,
    interpreter: &I,
) -> Result<TestRun, FrontendError> {
    config.validate()?;
    let text = std::fs::read_to_string(path).map_err(|source| FrontendError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

    let parsed = ExampleParser::new(config).get_doctest(
        &text,
        &name,
        Some(path.to_path_buf()),
        0,
        config.default_globals.clone(),
    );
    let doctest = match parsed {
        Ok(doctest) => doctest,
        Err(source) => {
            return Ok(TestRun {
                report: RunReport::default(),
                collect_errors: vec![CollectError::Parse { name, source }],
            })
        }
    };

    let mut report = RunReport::default();
    report.push(DocTestRunner::new(interpreter, config).run(&doctest)?);
    Ok(TestRun {
        report,
        collect_errors: Vec::new(),
    })
}

/// Discover and run every doctest in `graph`.
pub fn testmod<G: SymbolGraph>(graph: &G, config: &Config) -> Result<TestRun, FrontendError> {
    testmod_with(graph, config, &Evaluator::new())
}

#[tracing::instrument(level = "debug", skip_all, fields(root = graph.name(graph.root())))]
pub fn testmod_with<G: SymbolGraph, I: Interpreter>(
    graph: &G,
    config: &Config,
    interpreter: &I,
) -> Result<TestRun, FrontendError> {
    config.validate()?;
    let mut doctests = Vec::new();
    let mut collect_errors = Vec::new();
    for collected in discover(graph, config) {
        match collected {
            Ok(doctest) => doctests.push(doctest),
            Err(error) => collect_errors.push(error),
        }
    }
    tracing::debug!(doctests = doctests.len(), errors = collect_errors.len(), "collection finished");
    let report = DocTestRunner::new(interpreter, config).run_all(&doctests)?;
    Ok(TestRun {
        report,
        collect_errors,
    })
}

/// [`testmod`] over a JSON symbol dump.
pub fn testmod_path(path: &Path, config: &Config) -> Result<TestRun, FrontendError> {
    let tree = SymbolTree::load(path)?;
    testmod(&tree, config)
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
