//! Run counters and the per-unit history.

use std::fmt;

use rustc_hash::FxHashMap;

/// Counts for one run invocation or one doctest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RunResult {
    pub attempted: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RunResult {
    pub fn new(attempted: usize, failed: usize, skipped: usize) -> Self {
        debug_assert!(failed <= attempted, "failed must not exceed attempted");
        RunResult {
            attempted,
            failed,
            skipped,
        }
    }

    pub fn passed(&self) -> usize {
        self.attempted - self.failed
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    #[must_use]
    pub fn combine(self, other: RunResult) -> RunResult {
        RunResult {
            attempted: self.attempted + other.attempted,
            failed: self.failed + other.failed,
            skipped: self.skipped + other.skipped,
        }
    }
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "attempted={}, failed={}, skipped={}",
            self.attempted, self.failed, self.skipped
        )
    }
}

/// Unit name to result, ordered by first execution.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunHistory {
    entries: Vec<(String, RunResult)>,
    index: FxHashMap<String, usize>,
}

impl RunHistory {
    pub fn new() -> Self {
        RunHistory::default()
    }

    /// Record a result; a repeated name accumulates into its first entry.
    pub fn record(&mut self, name: &str, result: RunResult) {
        if let Some(&slot) = self.index.get(name) {
            let entry = &mut self.entries[slot].1;
            *entry = entry.combine(result);
        } else {
            self.index.insert(name.to_string(), self.entries.len());
            self.entries.push((name.to_string(), result));
        }
    }

    /// Fold another history in, keeping this history's order first.
    pub fn merge(&mut self, other: RunHistory) {
        for (name, result) in other.entries {
            self.record(&name, result);
        }
    }

    pub fn get(&self, name: &str) -> Option<RunResult> {
        self.index.get(name).map(|&slot| self.entries[slot].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, RunResult)> {
        self.entries.iter().map(|(name, result)| (name.as_str(), *result))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Sum over every unit.
    pub fn totals(&self) -> RunResult {
        self.entries
            .iter()
            .fold(RunResult::default(), |acc, (_, r)| acc.combine(*r))
    }
}
