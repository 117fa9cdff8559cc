//! Numdoc Check - decides whether an example's output matches its transcript.
//!
//! Checking runs a fixed sequence of rules; the first that applies decides:
//!
//! 1. Illustrative examples (pseudocode marker or stopword) always pass.
//! 2. Randomized examples, comment-only transcripts and output containing
//!    object addresses always pass.
//! 3. Text comparison after normalization (`<BLANKLINE>`, whitespace,
//!    ellipsis) per the active [`OptionFlags`].
//! 4. Structural comparison: both sides are read back as literals and
//!    compared with the configured numeric tolerance.
//! 5. Otherwise the texts differ and the example fails.
//!
//! [`TolerantChecker`] applies all five rules; [`ExactChecker`] skips rule 4.

mod compare;
mod literal;
mod normalize;

use numdoc_ir::{Config, ConfigError, Example, OptionFlags};

pub use compare::{numbers_close, structurally_equal};
pub use literal::{parse_literal, ArrayLiteral, ArrayStyle, Literal, NumKind, Number};
pub use normalize::{
    ellipsis_match, exception_matches, text_matches, BLANKLINE_MARKER, ELLIPSIS_MARKER,
};

/// Which rule accepted an output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MatchKind {
    /// Pseudocode or stopword: output is never compared.
    Unchecked,
    Randomized,
    /// The transcript is a comment.
    Comment,
    /// The output shows an object address.
    ObjectAddress,
    Text,
    Structural,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Verdict {
    Pass(MatchKind),
    Fail,
}

impl Verdict {
    pub fn is_pass(self) -> bool {
        matches!(self, Verdict::Pass(_))
    }
}

/// Output comparison capability.
///
/// Implementors only decide how two transcripts compare; the marker rules
/// and option resolution are shared through the provided methods.
pub trait OutputChecker: Sync {
    /// Compare `got` against `want` under resolved `flags`.
    fn compare_output(&self, want: &str, got: &str, flags: OptionFlags, config: &Config) -> Verdict;

    /// Check the captured output of `example`.
    ///
    /// Fails with [`ConfigError`] when the example both enables and disables
    /// the same flag.
    fn check(&self, example: &Example, got: &str, config: &Config) -> Result<Verdict, ConfigError> {
        let flags = example.options.resolve(config.option_flags)?;
        if let Some(kind) = unconditional_pass(example, got) {
            return Ok(Verdict::Pass(kind));
        }
        let verdict = self.compare_output(&example.want, got, flags, config);
        tracing::trace!(line = example.line_number, ?verdict, "checked output");
        Ok(verdict)
    }

    /// Whether a raised error matches the example's documented error report.
    fn check_exception(
        &self,
        example: &Example,
        got_report: &str,
        config: &Config,
    ) -> Result<bool, ConfigError> {
        let flags = example.options.resolve(config.option_flags)?;
        Ok(example
            .exc_msg
            .as_deref()
            .is_some_and(|want| exception_matches(want, got_report, flags)))
    }
}

/// Text rules, then structural numeric comparison.
#[derive(Clone, Copy, Debug, Default)]
pub struct TolerantChecker;

impl OutputChecker for TolerantChecker {
    fn compare_output(&self, want: &str, got: &str, flags: OptionFlags, config: &Config) -> Verdict {
        if text_matches(want, got, flags) {
            return Verdict::Pass(MatchKind::Text);
        }
        let Some(want_value) = parse_literal(want, config.parse_named_tuples) else {
            return Verdict::Fail;
        };
        let Some(got_value) = parse_literal(got, config.parse_named_tuples) else {
            return Verdict::Fail;
        };
        if structurally_equal(&want_value, &got_value, config) {
            Verdict::Pass(MatchKind::Structural)
        } else {
            Verdict::Fail
        }
    }
}

/// Text rules only.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExactChecker;

impl OutputChecker for ExactChecker {
    fn compare_output(&self, want: &str, got: &str, flags: OptionFlags, _config: &Config) -> Verdict {
        if text_matches(want, got, flags) {
            Verdict::Pass(MatchKind::Text)
        } else {
            Verdict::Fail
        }
    }
}

fn unconditional_pass(example: &Example, got: &str) -> Option<MatchKind> {
    if example.is_pseudocode || example.has_stopword {
        Some(MatchKind::Unchecked)
    } else if example.is_randomized {
        Some(MatchKind::Randomized)
    } else if example.want.trim_start().starts_with('#') {
        Some(MatchKind::Comment)
    } else if has_object_address(got) {
        Some(MatchKind::ObjectAddress)
    } else {
        None
    }
}

/// Whether `text` contains `at 0x<hex>>`, as in default object reprs.
fn has_object_address(text: &str) -> bool {
    text.match_indices("at 0x").any(|(at, marker)| {
        let rest = &text[at + marker.len()..];
        let digits = rest.chars().take_while(char::is_ascii_hexdigit).count();
        digits > 0 && rest[digits..].starts_with('>')
    })
}
