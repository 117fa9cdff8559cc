//! Numdoc Eval - the embedded host runtime examples execute against.
//!
//! Documentation examples are written in a small interactive-session
//! language: assignments, calls, control flow, `def`, imports of the
//! built-in `math`, `random` and `numpy` modules, and n-dimensional numeric
//! arrays with broadcasting. [`Evaluator`] implements
//! [`numdoc_ir::Interpreter`] for it.
//!
//! # Architecture
//!
//! - `lexer` / `parser`: logos tokens with synthesized indentation, then a
//!   recursive-descent parser into the `ast`
//! - `interpreter`: tree-walking statement execution over an [`Environment`]
//! - `operators` / `builtins`: arithmetic, comparisons, built-in functions
//! - [`value`]: runtime values and their transcript-style reprs
//!
//! Values have value semantics: `b = a` copies, so mutating `a` afterwards
//! never shows through `b`.

mod ast;
mod builtins;
mod environment;
mod errors;
mod interpreter;
mod lexer;
mod operators;
mod parser;
mod print_handler;
pub mod value;

pub use builtins::Builtin;
pub use environment::Environment;
pub use interpreter::{Evaluator, Namespace, DEFAULT_RECURSION_LIMIT};
pub use print_handler::BufferPrintHandler;
pub use value::{float_repr, Array, DType, Function, Value};
