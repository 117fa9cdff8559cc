//! Comparison and execution option flags.
//!
//! Flags come from two places: the session-wide defaults in
//! [`Config::option_flags`](crate::Config) and per-example directives such
//! as `# doctest: +ELLIPSIS, -NORMALIZE_WHITESPACE`. The per-example part is
//! kept as separate enable/disable sets so a contradictory directive can be
//! reported instead of silently resolved.

use std::fmt;

use bitflags::bitflags;

use crate::config::ConfigError;

bitflags! {
    /// Set of option flags.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct OptionFlags: u16 {
        /// Do not execute the example.
        const SKIP = 1 << 0;
        /// Skip this example and every other example of its block.
        const SKIPBLOCK = 1 << 1;
        /// `...` in the expected output matches any substring.
        const ELLIPSIS = 1 << 2;
        /// Runs of whitespace compare equal.
        const NORMALIZE_WHITESPACE = 1 << 3;
        /// Compare only the kind of an expected error, not its message.
        const IGNORE_EXCEPTION_DETAIL = 1 << 4;
        /// Do not treat `<BLANKLINE>` as an empty output line.
        const DONT_ACCEPT_BLANKLINE = 1 << 5;
    }
}

/// Directive names, in declaration order. They match the constant names, so
/// the generated `OptionFlags::from_name` parses directives.
const FLAG_NAMES: [(&str, OptionFlags); 6] = [
    ("SKIP", OptionFlags::SKIP),
    ("SKIPBLOCK", OptionFlags::SKIPBLOCK),
    ("ELLIPSIS", OptionFlags::ELLIPSIS),
    ("NORMALIZE_WHITESPACE", OptionFlags::NORMALIZE_WHITESPACE),
    ("IGNORE_EXCEPTION_DETAIL", OptionFlags::IGNORE_EXCEPTION_DETAIL),
    ("DONT_ACCEPT_BLANKLINE", OptionFlags::DONT_ACCEPT_BLANKLINE),
];

impl OptionFlags {
    /// Defaults used when the configuration does not override them.
    pub const DEFAULT_CHECK: OptionFlags = OptionFlags::NORMALIZE_WHITESPACE
        .union(OptionFlags::ELLIPSIS)
        .union(OptionFlags::IGNORE_EXCEPTION_DETAIL);

    /// Whether an example running under these flags is skipped, block-wide
    /// or alone.
    pub fn requests_skip(self) -> bool {
        self.intersects(OptionFlags::SKIP.union(OptionFlags::SKIPBLOCK))
    }

    /// Directive names of the flags in this set.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        FLAG_NAMES
            .iter()
            .filter(move |(_, flag)| self.contains(*flag))
            .map(|(name, _)| *name)
    }
}

impl fmt::Display for OptionFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.names().collect();
        if names.is_empty() {
            write!(f, "(none)")
        } else {
            write!(f, "{}", names.join(" | "))
        }
    }
}

/// Per-example flag overrides.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ExampleOptions {
    /// Flags switched on with `+NAME`.
    pub enable: OptionFlags,
    /// Flags switched off with `-NAME`.
    pub disable: OptionFlags,
}

impl ExampleOptions {
    pub fn is_empty(&self) -> bool {
        self.enable.is_empty() && self.disable.is_empty()
    }

    /// Apply these overrides on top of `defaults`.
    ///
    /// A flag that is both enabled and disabled is rejected.
    pub fn resolve(&self, defaults: OptionFlags) -> Result<OptionFlags, ConfigError> {
        let conflict = self.enable & self.disable;
        if !conflict.is_empty() {
            return Err(ConfigError::ContradictoryOptions {
                flags: conflict.to_string(),
            });
        }
        Ok((defaults | self.enable) - self.disable)
    }
}
