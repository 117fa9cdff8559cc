//! Error constructors for the evaluator.
//!
//! Every error the evaluator raises is an [`ExecError`] whose kind and
//! message read like the transcript line a user would document.

use numdoc_ir::{ErrorCategory, ExecError};

pub type EvalResult<T> = Result<T, ExecError>;

fn runtime(kind: &str, message: impl Into<String>) -> ExecError {
    ExecError::new(ErrorCategory::Runtime, kind, message)
}

pub fn syntax_error(message: impl Into<String>) -> ExecError {
    ExecError::syntax(message)
}

pub fn undefined_variable(name: &str) -> ExecError {
    ExecError::undefined_name(name)
}

pub fn type_error(message: impl Into<String>) -> ExecError {
    runtime("TypeError", message)
}

pub fn value_error(message: impl Into<String>) -> ExecError {
    runtime("ValueError", message)
}

pub fn division_by_zero() -> ExecError {
    runtime("ZeroDivisionError", "division by zero")
}

pub fn modulo_by_zero() -> ExecError {
    runtime("ZeroDivisionError", "integer division or modulo by zero")
}

pub fn float_division_by_zero(op: &str) -> ExecError {
    runtime("ZeroDivisionError", format!("float {op} by zero"))
}

pub fn integer_overflow(op: &str) -> ExecError {
    runtime("OverflowError", format!("integer overflow in {op}"))
}

pub fn out_of_memory(what: &str) -> ExecError {
    runtime("MemoryError", format!("{what} too large to materialize"))
}

pub fn index_out_of_range(what: &str) -> ExecError {
    runtime("IndexError", format!("{what} index out of range"))
}

pub fn key_not_found(repr: &str) -> ExecError {
    runtime("KeyError", repr)
}

pub fn no_attribute(type_name: &str, attribute: &str) -> ExecError {
    runtime(
        "AttributeError",
        format!("'{type_name}' object has no attribute '{attribute}'"),
    )
}

pub fn not_callable(type_name: &str) -> ExecError {
    type_error(format!("'{type_name}' object is not callable"))
}

pub fn unsupported_operands(op: &str, left: &str, right: &str) -> ExecError {
    type_error(format!(
        "unsupported operand type(s) for {op}: '{left}' and '{right}'"
    ))
}

pub fn not_orderable(op: &str, left: &str, right: &str) -> ExecError {
    type_error(format!(
        "'{op}' not supported between instances of '{left}' and '{right}'"
    ))
}

pub fn wrong_arg_count(function: &str, expected: usize, got: usize) -> ExecError {
    type_error(format!(
        "{function}() takes {expected} positional argument{} but {got} {} given",
        if expected == 1 { "" } else { "s" },
        if got == 1 { "was" } else { "were" },
    ))
}

pub fn shape_mismatch(left: &[usize], right: &[usize]) -> ExecError {
    value_error(format!(
        "operands could not be broadcast together with shapes {} {}",
        compact_shape(left),
        compact_shape(right)
    ))
}

/// `(2,3)`, `(4,)`
fn compact_shape(shape: &[usize]) -> String {
    match shape {
        [single] => format!("({single},)"),
        _ => format!(
            "({})",
            shape
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",")
        ),
    }
}

pub fn assertion_failed(message: impl Into<String>) -> ExecError {
    runtime("AssertionError", message)
}

pub fn recursion_limit() -> ExecError {
    runtime("RecursionError", "maximum recursion depth exceeded")
}

pub fn nesting_too_deep() -> ExecError {
    runtime(
        "RecursionError",
        "maximum recursion depth exceeded while nesting containers",
    )
}

pub fn permission_denied(path: &str) -> ExecError {
    runtime(
        "PermissionError",
        format!("access to '{path}' is outside the working directory"),
    )
}

pub fn file_not_found(path: &str) -> ExecError {
    runtime(
        "FileNotFoundError",
        format!("No such file or directory: '{path}'"),
    )
}

/// An error raised explicitly by `raise Kind(message)`.
pub fn raised(kind: &str, message: impl Into<String>) -> ExecError {
    runtime(kind, message)
}
