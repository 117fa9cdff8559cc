//! numdoc: tolerant documentation-example testing for numeric code.
//!
//! # Architecture
//!
//! ```text
//! SymbolGraph ──► Discoverer ──► Doctest ──► DocTestRunner ──► RunReport
//!                     │                           │
//!               ExampleParser            Interpreter + OutputChecker
//! ```
//!
//! The leaf crates carry the pieces: `numdoc_ir` the data model and
//! configuration, `numdoc_parse` the transcript parser, `numdoc_check` the
//! output checkers and `numdoc_eval` the shipped interpreter. This crate
//! adds discovery, execution and the frontends.

pub mod frontend;
pub mod symbols;
pub mod test;

use std::sync::Once;

pub use frontend::{testfile, testfile_with, testmod, testmod_path, testmod_with, FrontendError, TestRun};
pub use numdoc_check::{ExactChecker, OutputChecker, TolerantChecker};
pub use numdoc_eval::Evaluator;
pub use numdoc_ir::{Config, ConfigBuilder, ConfigError, Doctest, Example, RunHistory, RunResult, Strategy};
pub use numdoc_parse::ExampleParser;
pub use symbols::{SymbolGraph, SymbolTree};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Does nothing unless `RUST_LOG` is set, e.g.
/// `RUST_LOG=numdoc=debug`. With `NUMDOC_LOG_TREE=1` spans are drawn as a
/// tree instead of flat lines.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_err() {
            return;
        }
        let tree = std::env::var("NUMDOC_LOG_TREE").is_ok_and(|v| v == "1");
        let tree_layer = tree.then(|| {
            tracing_tree::HierarchicalLayer::new(2)
                .with_targets(true)
                .with_writer(std::io::stderr)
        });
        let flat_layer = (!tree).then(|| {
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_writer(std::io::stderr)
        });
        tracing_subscriber::registry()
            .with(tree_layer)
            .with(flat_layer)
            .with(EnvFilter::from_default_env())
            .init();
    });
}
