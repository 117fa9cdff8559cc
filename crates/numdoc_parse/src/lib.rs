//! Numdoc Parse - extracts interactive examples from documentation text.
//!
//! # Transcript Format
//!
//! ```text
//! Prose is ignored.
//!
//! >>> x = [1.0, 2.0]
//! >>> total = (x[0] +
//! ...          x[1])
//! >>> print(total)
//! 3.0
//! ```
//!
//! A `>>> ` line starts an example, `... ` lines continue its source, and the
//! following non-blank, non-prompt lines are its expected output. Examples
//! with no prose between them form one block.
//!
//! Inline comments carry directives (`# doctest: +SKIP`, `+SKIPBLOCK`,
//! `+ELLIPSIS`, ...) and the marker tokens configured in [`Config`].

mod directives;

use std::path::PathBuf;

use numdoc_ir::{
    blocks_of, Block, Config, Doctest, Example, ExampleOptions, OptionFlags, TRACEBACK_HEADER,
};

use directives::{apply_directive, contains_any, find_directive};

const PRIMARY_PROMPT: &str = ">>>";
const CONTINUATION_PROMPT: &str = "...";

/// Malformed prompt sequences. Lines are zero-based in the value, one-based
/// in the message.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("line {}: prompt `{prompt}` must be followed by a space", .line + 1)]
    MissingSpaceAfterPrompt { line: usize, prompt: &'static str },
    #[error("line {}: inconsistent leading whitespace (expected at least {expected} columns)", .line + 1)]
    InconsistentIndentation { line: usize, expected: usize },
    #[error("line {}: source ends with a line continuation but has no continuation line", .line + 1)]
    UnterminatedContinuation { line: usize },
    #[error("line {}: unknown option directive `{directive}`", .line + 1)]
    UnknownDirective { line: usize, directive: String },
}

impl ParseError {
    /// Zero-based line of the problem.
    pub fn line(&self) -> usize {
        match self {
            ParseError::MissingSpaceAfterPrompt { line, .. }
            | ParseError::InconsistentIndentation { line, .. }
            | ParseError::UnterminatedContinuation { line }
            | ParseError::UnknownDirective { line, .. } => *line,
        }
    }
}

/// Examples of one documentation string, grouped into blocks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedDocs {
    pub examples: Vec<Example>,
    pub blocks: Vec<Block>,
}

/// Turns documentation text into examples, using the marker vocabulary of a
/// [`Config`].
#[derive(Clone, Copy, Debug)]
pub struct ExampleParser<'c> {
    config: &'c Config,
}

impl<'c> ExampleParser<'c> {
    pub fn new(config: &'c Config) -> Self {
        ExampleParser { config }
    }

    /// Parse `text` into examples. A pure function of `text` and the marker
    /// vocabulary.
    #[tracing::instrument(level = "trace", skip_all, fields(len = text.len()))]
    pub fn parse(&self, text: &str) -> Result<ParsedDocs, ParseError> {
        let lines: Vec<&str> = text.lines().collect();
        let mut examples: Vec<Example> = Vec::new();
        let mut block = 0usize;
        let mut prose_since_last = false;
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i];
            let indent = indentation(line);
            let stripped = &line[indent..];

            let Some(after_prompt) = stripped.strip_prefix(PRIMARY_PROMPT) else {
                if !line.trim().is_empty() {
                    prose_since_last = true;
                }
                i += 1;
                continue;
            };
            if !after_prompt.is_empty() && !after_prompt.starts_with(' ') {
                return Err(ParseError::MissingSpaceAfterPrompt {
                    line: i,
                    prompt: PRIMARY_PROMPT,
                });
            }
            if after_prompt.trim().is_empty() {
                // A bare prompt carries no source; it neither starts an
                // example nor breaks the current block.
                i += 1;
                continue;
            }

            let prompt_line = i;
            let mut source_lines = vec![strip_one_space(after_prompt)];
            i += 1;
            while i < lines.len() {
                let Some(rest) = continuation(lines[i], indent, i)? else {
                    break;
                };
                source_lines.push(rest);
                i += 1;
            }
            if source_lines
                .last()
                .is_some_and(|l| l.trim_end().ends_with('\\'))
            {
                return Err(ParseError::UnterminatedContinuation { line: i - 1 });
            }

            let mut want_lines: Vec<&str> = Vec::new();
            while i < lines.len() {
                let candidate = lines[i];
                if candidate.trim().is_empty() || candidate.trim_start().starts_with(PRIMARY_PROMPT) {
                    break;
                }
                if indentation(candidate) < indent {
                    return Err(ParseError::InconsistentIndentation {
                        line: i,
                        expected: indent,
                    });
                }
                want_lines.push(&candidate[indent..]);
                i += 1;
            }

            if prose_since_last && !examples.is_empty() {
                block += 1;
            }
            prose_since_last = false;

            let example = self.build_example(
                &source_lines,
                &want_lines,
                prompt_line,
                indent,
                block,
            )?;
            examples.push(example);
        }

        apply_block_skips(&mut examples);
        let blocks = blocks_of(&examples);
        tracing::debug!(
            examples = examples.len(),
            blocks = blocks.len(),
            "parsed documentation"
        );
        Ok(ParsedDocs { examples, blocks })
    }

    /// Parse `text` and wrap it in a [`Doctest`] unit.
    pub fn get_doctest(
        &self,
        text: &str,
        name: &str,
        filename: Option<PathBuf>,
        line_number: usize,
        globs: Vec<(String, String)>,
    ) -> Result<Doctest, ParseError> {
        let parsed = self.parse(text)?;
        Ok(Doctest {
            name: name.to_string(),
            filename,
            line_number,
            docstring: text.to_string(),
            examples: parsed.examples,
            globs,
        })
    }

    fn build_example(
        &self,
        source_lines: &[&str],
        want_lines: &[&str],
        prompt_line: usize,
        indent: usize,
        block: usize,
    ) -> Result<Example, ParseError> {
        let mut options = ExampleOptions::default();
        for (offset, source_line) in source_lines.iter().enumerate() {
            if let Some((_, body)) = find_directive(source_line) {
                apply_directive(body, prompt_line + offset, &mut options)?;
            }
        }

        let want_start = prompt_line + source_lines.len();
        let mut want = String::new();
        for (offset, want_line) in want_lines.iter().enumerate() {
            let kept = match find_directive(want_line) {
                Some((at, body)) => {
                    apply_directive(body, want_start + offset, &mut options)?;
                    want_line[..at].trim_end()
                }
                None => *want_line,
            };
            want.push_str(kept);
            want.push('\n');
        }

        let source = source_lines.join("\n");
        let markers = &self.config.randomized_markers;
        Ok(Example {
            is_randomized: contains_any(&source, markers) || contains_any(&want, markers),
            is_pseudocode: contains_any(&source, &self.config.pseudocode_markers),
            has_stopword: contains_any(&source, &self.config.stopwords),
            exc_msg: exception_message(&want),
            source,
            want,
            line_number: prompt_line,
            indent,
            options,
            block,
        })
    }
}

/// Shorthand for [`ExampleParser::parse`].
pub fn parse(text: &str, config: &Config) -> Result<ParsedDocs, ParseError> {
    ExampleParser::new(config).parse(text)
}

fn indentation(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t']).len()
}

fn strip_one_space(text: &str) -> &str {
    text.strip_prefix(' ').unwrap_or(text)
}

/// If `line` is a continuation line for a prompt at `indent`, return its source.
fn continuation(line: &str, indent: usize, index: usize) -> Result<Option<&str>, ParseError> {
    let line_indent = indentation(line);
    let stripped = &line[line_indent..];
    let Some(rest) = stripped.strip_prefix(CONTINUATION_PROMPT) else {
        return Ok(None);
    };
    if !rest.is_empty() && !rest.starts_with(' ') {
        // `...abc` is an ellipsis in the expected output, not source.
        return Ok(None);
    }
    if line_indent != indent {
        return Err(ParseError::InconsistentIndentation {
            line: index,
            expected: indent,
        });
    }
    Ok(Some(strip_one_space(rest)))
}

/// Extract `Kind: message` from an error transcript.
fn exception_message(want: &str) -> Option<String> {
    let mut lines = want.lines();
    if lines.next()?.trim_end() != TRACEBACK_HEADER {
        return None;
    }
    let message: Vec<&str> = lines
        .skip_while(|l| l.starts_with([' ', '\t']) || l.trim() == CONTINUATION_PROMPT)
        .collect();
    if message.is_empty() {
        return None;
    }
    let mut out = message.join("\n");
    out.push('\n');
    Some(out)
}

/// A `SKIPBLOCK` anywhere in a block skips every example of the block.
fn apply_block_skips(examples: &mut [Example]) {
    let skipped: Vec<usize> = examples
        .iter()
        .filter(|e| e.options.enable.contains(OptionFlags::SKIPBLOCK))
        .map(|e| e.block)
        .collect();
    for example in examples.iter_mut() {
        if skipped.contains(&example.block) {
            example.options.enable |= OptionFlags::SKIP;
        }
    }
}
