//! Numdoc IR - shared data model for documentation-example testing.
//!
//! Every other numdoc crate speaks in these types:
//! - [`Config`]: validated session settings
//! - [`Example`] / [`Doctest`]: what the parser and discoverer produce
//! - [`OptionFlags`] / [`ExampleOptions`]: comparison flags and directives
//! - [`RunResult`] / [`RunHistory`]: what the runner reports
//! - [`Interpreter`]: the seam to the live evaluation environment

mod config;
mod example;
mod exec;
mod flags;
mod history;

pub use config::{Config, ConfigBuilder, ConfigError, Strategy, MAX_VERBOSITY};
pub use example::{blocks_of, Block, Doctest, Example, TRACEBACK_HEADER};
pub use exec::{ErrorCategory, ExecError, ExecOutcome, Interpreter};
pub use flags::{ExampleOptions, OptionFlags};
pub use history::{RunHistory, RunResult};
