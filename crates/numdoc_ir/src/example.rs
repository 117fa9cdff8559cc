//! Examples and the doctest units that own them.

use std::path::PathBuf;

use crate::flags::ExampleOptions;

/// Header line of a documented error transcript.
pub const TRACEBACK_HEADER: &str = "Traceback (most recent call last):";

/// One interactive snippet extracted from documentation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Example {
    /// Executable text, continuation lines joined with `\n`. Never empty.
    pub source: String,
    /// Expected output; every line ends with `\n`. Empty when no output is expected.
    pub want: String,
    /// Expected error report (`Kind: message`), when `want` is an error transcript.
    pub exc_msg: Option<String>,
    /// Zero-based line of the prompt within the documentation text.
    pub line_number: usize,
    /// Column of the prompt.
    pub indent: usize,
    /// Per-example directive overrides.
    pub options: ExampleOptions,
    /// A randomized marker was found in the source or the expected output.
    pub is_randomized: bool,
    /// A pseudocode marker was found in the source.
    pub is_pseudocode: bool,
    /// A stopword was found in the source.
    pub has_stopword: bool,
    /// Index of the enclosing block.
    pub block: usize,
}

/// A maximal run of examples with no prose in between.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Block {
    /// Index of the first example of the block.
    pub start: usize,
    /// One past the last example of the block.
    pub end: usize,
}

impl Block {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A named documentation unit: a symbol's docstring or a whole text file.
#[derive(Clone, Debug, PartialEq)]
pub struct Doctest {
    /// Fully-qualified symbol name or file identifier. Unique per collection pass.
    pub name: String,
    /// File the documentation came from, if known.
    pub filename: Option<PathBuf>,
    /// Line of the documentation within `filename`.
    pub line_number: usize,
    /// The raw documentation text.
    pub docstring: String,
    /// Examples in text order.
    pub examples: Vec<Example>,
    /// Initial namespace bindings (name, source expression).
    pub globs: Vec<(String, String)>,
}

impl Doctest {
    /// Blocks of this doctest's examples, in order.
    pub fn blocks(&self) -> Vec<Block> {
        blocks_of(&self.examples)
    }

    /// Directory that relative resource paths are resolved against.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.filename
            .as_ref()
            .and_then(|f| f.parent())
            .map(std::path::Path::to_path_buf)
    }
}

/// Group consecutive examples sharing a block index.
pub fn blocks_of(examples: &[Example]) -> Vec<Block> {
    let mut blocks: Vec<Block> = Vec::new();
    for (index, example) in examples.iter().enumerate() {
        match blocks.last_mut() {
            Some(block) if examples[block.start].block == example.block => block.end = index + 1,
            _ => blocks.push(Block {
                start: index,
                end: index + 1,
            }),
        }
    }
    blocks
}
