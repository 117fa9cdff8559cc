//! The host-runtime seam.
//!
//! The runner never evaluates source itself. It asks an [`Interpreter`] for a
//! fresh namespace per doctest and then executes every example against that
//! namespace, in order, through `&mut`.

use std::fmt;
use std::path::Path;

/// Broad classification of an execution error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The source could not be parsed.
    Syntax,
    /// A name was used before being bound.
    UndefinedName,
    /// Anything raised while running valid source.
    Runtime,
}

/// An error raised by example source.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExecError {
    pub category: ErrorCategory,
    /// Error kind as it appears in a transcript, e.g. `ZeroDivisionError`.
    pub kind: String,
    pub message: String,
}

impl ExecError {
    pub fn new(category: ErrorCategory, kind: impl Into<String>, message: impl Into<String>) -> Self {
        ExecError {
            category,
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        ExecError::new(ErrorCategory::Syntax, "SyntaxError", message)
    }

    pub fn undefined_name(name: &str) -> Self {
        ExecError::new(
            ErrorCategory::UndefinedName,
            "NameError",
            format!("name '{name}' is not defined"),
        )
    }

    pub fn is_undefined_name(&self) -> bool {
        self.category == ErrorCategory::UndefinedName
    }

    /// The last line of a transcript for this error, with trailing newline.
    pub fn report_line(&self) -> String {
        if self.message.is_empty() {
            format!("{}\n", self.kind)
        } else {
            format!("{}: {}\n", self.kind, self.message)
        }
    }
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.report_line().trim_end())
    }
}

impl std::error::Error for ExecError {}

/// Output of one execution: what was printed, and the error if one was raised.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecOutcome {
    pub output: String,
    pub error: Option<ExecError>,
}

impl ExecOutcome {
    pub fn ok(output: String) -> Self {
        ExecOutcome {
            output,
            error: None,
        }
    }

    pub fn raised(output: String, error: ExecError) -> Self {
        ExecOutcome {
            output,
            error: Some(error),
        }
    }
}

/// A live evaluation environment.
///
/// Implementations must be shareable across worker threads; each doctest
/// gets its own `Namespace`, which never crosses threads mid-run.
pub trait Interpreter: Sync {
    type Namespace: Send;

    /// A namespace seeded with `globs`, with file access rooted at `workdir`.
    fn new_namespace(
        &self,
        globs: &[(String, String)],
        workdir: &Path,
    ) -> Result<Self::Namespace, ExecError>;

    /// Check that `source` parses, without running it.
    fn check_syntax(&self, source: &str) -> Result<(), ExecError>;

    /// Run `source`, mutating `namespace`, capturing printed and echoed output.
    fn execute(&self, source: &str, namespace: &mut Self::Namespace) -> ExecOutcome;
}
