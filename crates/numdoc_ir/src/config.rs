//! Session configuration.
//!
//! A [`Config`] is built once per testing session, optionally tweaked by the
//! caller, validated, and then only read. It is `Sync`, so parallel doctest
//! workers share it by reference.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::str::FromStr;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::flags::OptionFlags;

/// Highest accepted verbosity level.
pub const MAX_VERBOSITY: u8 = 2;

/// Invalid or contradictory configuration. Fatal to the run.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("tolerance `{name}` must be non-negative, got {value}")]
    NegativeTolerance { name: &'static str, value: f64 },
    #[error("tolerance `{name}` must be finite, got {value}")]
    NonFiniteTolerance { name: &'static str, value: f64 },
    #[error("verbosity must be between 0 and 2, got {0}")]
    VerbosityOutOfRange(u8),
    #[error("empty token in `{set}`")]
    EmptyMarker { set: &'static str },
    #[error("option flags both enabled and disabled: {flags}")]
    ContradictoryOptions { flags: String },
    #[error("default option flags may not include {flags}")]
    SkipInDefaults { flags: String },
    #[error("unknown discovery strategy `{0}` (expected `all` or `api`)")]
    UnknownStrategy(String),
}

/// Which documented symbols are eligible for testing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Every reachable symbol with documentation.
    #[default]
    All,
    /// Exported, non-underscore symbols of non-underscore modules.
    PublicApi,
}

impl FromStr for Strategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Strategy::All),
            "api" | "public" => Ok(Strategy::PublicApi),
            other => Err(ConfigError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Testing session configuration.
#[derive(Clone, Debug)]
#[expect(
    clippy::struct_excessive_bools,
    reason = "Config struct: each bool controls an independent switch"
)]
pub struct Config {
    /// Absolute tolerance for numeric leaves.
    pub atol: f64,
    /// Relative tolerance for numeric leaves, scaled by `|want|`.
    pub rtol: f64,
    /// Require numeric kinds to match, not just values (`3` vs `3.0`).
    pub strict_types: bool,
    /// Flags active for every example unless overridden by a directive.
    pub option_flags: OptionFlags,
    /// Tokens marking output as non-deterministic.
    pub randomized_markers: BTreeSet<String>,
    /// Tokens marking a whole example as illustrative only.
    pub pseudocode_markers: BTreeSet<String>,
    /// Tokens in source that suppress output checking.
    pub stopwords: BTreeSet<String>,
    /// Fully-qualified names excluded from discovery.
    pub skip_list: FxHashSet<String>,
    /// Files a unit may read, relative to the unit's file.
    pub local_resources: FxHashMap<String, Vec<PathBuf>>,
    /// Discovery strategy.
    pub strategy: Strategy,
    /// Compare `Name(a=1, b=2)` as the tuple `(1, 2)`.
    pub parse_named_tuples: bool,
    /// Report undefined-name errors that follow an earlier unexpected error.
    pub report_cascade_errors: bool,
    /// Abandon a doctest after its first failing example.
    pub stop_on_first_failure: bool,
    /// Whether skipped examples also count as attempted.
    pub count_skipped_as_attempted: bool,
    /// Run independent doctests on a thread pool.
    pub parallel: bool,
    /// 0: failures only, 1: unit names, 2: every example.
    pub verbosity: u8,
    /// Bindings injected into every doctest namespace (name, source).
    pub default_globals: Vec<(String, String)>,
}

fn token_set(tokens: &[&str]) -> BTreeSet<String> {
    tokens.iter().map(|t| (*t).to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            atol: 1e-8,
            rtol: 1e-5,
            strict_types: false,
            option_flags: OptionFlags::DEFAULT_CHECK,
            randomized_markers: token_set(&[
                "# random",
                "# Random",
                "#random",
                "#Random",
                "# may vary",
            ]),
            pseudocode_markers: BTreeSet::new(),
            stopwords: token_set(&[
                "plt.", ".hist", ".show(", ".ylim", ".subplot(", "set_title", "imshow",
                ".axis(", ".plot(", ".bar(", ".title", ".ylabel", ".xlabel", "set_ylim",
                "set_xlim", "# reformatted", ".xlim(", ".text(",
            ]),
            skip_list: FxHashSet::default(),
            local_resources: FxHashMap::default(),
            strategy: Strategy::All,
            parse_named_tuples: true,
            report_cascade_errors: false,
            stop_on_first_failure: false,
            count_skipped_as_attempted: false,
            parallel: true,
            verbosity: 0,
            default_globals: Vec::new(),
        }
    }
}

impl Config {
    /// Start a builder from the defaults.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder {
            config: Config::default(),
        }
    }

    /// Check every field; the first problem found is returned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("atol", self.atol), ("rtol", self.rtol)] {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteTolerance { name, value });
            }
            if value < 0.0 {
                return Err(ConfigError::NegativeTolerance { name, value });
            }
        }
        if self.verbosity > MAX_VERBOSITY {
            return Err(ConfigError::VerbosityOutOfRange(self.verbosity));
        }
        let skip_flags = self.option_flags & (OptionFlags::SKIP | OptionFlags::SKIPBLOCK);
        if !skip_flags.is_empty() {
            return Err(ConfigError::SkipInDefaults {
                flags: skip_flags.to_string(),
            });
        }
        for (set, tokens) in [
            ("randomized_markers", &self.randomized_markers),
            ("pseudocode_markers", &self.pseudocode_markers),
            ("stopwords", &self.stopwords),
        ] {
            if tokens.iter().any(|t| t.trim().is_empty()) {
                return Err(ConfigError::EmptyMarker { set });
            }
        }
        Ok(())
    }

    /// Numeric tolerance bound for an expected value.
    #[inline]
    pub fn tolerance_for(&self, want: f64) -> f64 {
        self.atol + self.rtol * want.abs()
    }

    pub fn is_skipped(&self, name: &str) -> bool {
        self.skip_list.contains(name)
    }

    /// Local resources listed for a unit, if any.
    pub fn resources_for(&self, name: &str) -> &[PathBuf] {
        self.local_resources
            .get(name)
            .map_or(&[][..], Vec::as_slice)
    }
}

/// Fluent construction with a single validation step.
#[derive(Clone, Debug)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    #[must_use]
    pub fn tolerances(mut self, atol: f64, rtol: f64) -> Self {
        self.config.atol = atol;
        self.config.rtol = rtol;
        self
    }

    #[must_use]
    pub fn strict_types(mut self, strict: bool) -> Self {
        self.config.strict_types = strict;
        self
    }

    #[must_use]
    pub fn option_flags(mut self, flags: OptionFlags) -> Self {
        self.config.option_flags = flags;
        self
    }

    #[must_use]
    pub fn randomized_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.randomized_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn pseudocode_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.pseudocode_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn stopwords<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.stopwords = words.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn skip<S: Into<String>>(mut self, name: S) -> Self {
        self.config.skip_list.insert(name.into());
        self
    }

    #[must_use]
    pub fn local_resource<S: Into<String>, P: Into<PathBuf>>(mut self, unit: S, file: P) -> Self {
        self.config
            .local_resources
            .entry(unit.into())
            .or_default()
            .push(file.into());
        self
    }

    #[must_use]
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    #[must_use]
    pub fn parse_named_tuples(mut self, enabled: bool) -> Self {
        self.config.parse_named_tuples = enabled;
        self
    }

    #[must_use]
    pub fn report_cascade_errors(mut self, enabled: bool) -> Self {
        self.config.report_cascade_errors = enabled;
        self
    }

    #[must_use]
    pub fn stop_on_first_failure(mut self, enabled: bool) -> Self {
        self.config.stop_on_first_failure = enabled;
        self
    }

    #[must_use]
    pub fn count_skipped_as_attempted(mut self, enabled: bool) -> Self {
        self.config.count_skipped_as_attempted = enabled;
        self
    }

    #[must_use]
    pub fn parallel(mut self, enabled: bool) -> Self {
        self.config.parallel = enabled;
        self
    }

    #[must_use]
    pub fn verbosity(mut self, level: u8) -> Self {
        self.config.verbosity = level;
        self
    }

    #[must_use]
    pub fn global<N: Into<String>, S: Into<String>>(mut self, name: N, source: S) -> Self {
        self.config.default_globals.push((name.into(), source.into()));
        self
    }

    /// Validate and return the finished configuration.
    pub fn build(self) -> Result<Config, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
