//! Doctest collection and execution.
//!
//! - Discovery: selecting documented symbols and parsing their examples
//! - Execution: running each doctest in an isolated namespace and directory
//! - Result tracking: per-example states and per-doctest counts
//! - Parallel execution: running doctests concurrently with rayon

mod discovery;
mod result;

pub use discovery::{discover, effective_documentation, Candidate, CollectError, Discoverer, Discovery};
pub use result::{DoctestReport, ExampleReport, ExampleState, Failure, RunReport};
pub use runner::{DocTestRunner, RunError};
