//! Doctest discovery over a [`SymbolGraph`].
//!
//! Two strategies decide which documented symbols become doctests:
//!
//! - [`Strategy::All`] walks every reachable member and yields one doctest
//!   per path, so a definition re-exported elsewhere is tested under each
//!   name. Cycles are cut by never re-entering a symbol on the current path.
//! - [`Strategy::PublicApi`] yields the root's documentation and the
//!   non-underscore, non-deprecated names in the root's export list. Exported
//!   classes contribute their own and inherited members; exported submodules
//!   are not entered. A documentation source already yielded is not parsed
//!   again.
//!
//! Members with no documentation of their own inherit a base class's. Names in
//! the skip list are dropped before parsing, and units without examples are
//! not yielded. Parsing is lazy: a malformed unit yields a [`CollectError`]
//! and discovery moves on.

use std::collections::VecDeque;

use numdoc_ir::{Config, Doctest, Strategy};
use numdoc_parse::{ExampleParser, ParseError};
use rustc_hash::FxHashSet;

use crate::symbols::{SymbolGraph, SymbolId, SymbolKind};

/// A unit whose documentation could not be collected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CollectError {
    #[error("{name}: {source}")]
    Parse {
        name: String,
        #[source]
        source: ParseError,
    },
}

impl CollectError {
    pub fn name(&self) -> &str {
        match self {
            CollectError::Parse { name, .. } => name,
        }
    }
}

/// A documented symbol selected for testing, before parsing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    /// Name the unit is reported under: the path it was reached through.
    pub name: String,
    /// The symbol reached.
    pub symbol: SymbolId,
    /// The symbol whose documentation is used; differs from `symbol` when
    /// the documentation is inherited.
    pub source: SymbolId,
}

/// Discovers doctests in a symbol graph.
pub struct Discoverer<'a, G: SymbolGraph> {
    graph: &'a G,
    config: &'a Config,
    strategy: Strategy,
}

impl<'a, G: SymbolGraph> Discoverer<'a, G> {
    /// A discoverer using the strategy of `config`.
    pub fn new(graph: &'a G, config: &'a Config) -> Self {
        Discoverer {
            graph,
            config,
            strategy: config.strategy,
        }
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Lazily parse every selected unit.
    pub fn discover(&self) -> Discovery<'a, G> {
        tracing::debug!(strategy = ?self.strategy, "discovering doctests");
        let walker = match self.strategy {
            Strategy::All => Walker::All(vec![Frame {
                symbol: self.graph.root(),
                name: self.graph.name(self.graph.root()).to_string(),
                ancestors: Vec::new(),
            }]),
            Strategy::PublicApi => Walker::PublicApi(public_candidates(self.graph).into()),
        };
        Discovery {
            graph: self.graph,
            config: self.config,
            parser: ExampleParser::new(self.config),
            walker,
            seen: FxHashSet::default(),
        }
    }

    /// Selected units in discovery order, without parsing.
    pub fn candidates(&self) -> Vec<Candidate> {
        let mut discovery = self.discover();
        std::iter::from_fn(|| discovery.next_candidate()).collect()
    }
}

/// Shorthand for `Discoverer::new(graph, config).discover()`.
pub fn discover<'a, G: SymbolGraph>(graph: &'a G, config: &'a Config) -> Discovery<'a, G> {
    Discoverer::new(graph, config).discover()
}

struct Frame {
    symbol: SymbolId,
    name: String,
    ancestors: Vec<SymbolId>,
}

enum Walker {
    /// Depth-first stack of pending paths.
    All(Vec<Frame>),
    /// Precomputed (symbol, name) pairs.
    PublicApi(VecDeque<(SymbolId, String)>),
}

/// Lazy sequence of collected doctests.
pub struct Discovery<'a, G: SymbolGraph> {
    graph: &'a G,
    config: &'a Config,
    parser: ExampleParser<'a>,
    walker: Walker,
    /// Documentation sources already yielded, for the public-API strategy.
    seen: FxHashSet<(SymbolId, &'a str)>,
}

impl<'a, G: SymbolGraph> Discovery<'a, G> {
    fn next_candidate(&mut self) -> Option<Candidate> {
        loop {
            let (symbol, name) = match &mut self.walker {
                Walker::All(stack) => {
                    let frame = stack.pop()?;
                    push_children(self.graph, stack, &frame);
                    (frame.symbol, frame.name)
                }
                Walker::PublicApi(queue) => queue.pop_front()?,
            };
            if self.is_skipped(symbol, &name) {
                tracing::trace!(%name, "skip list");
                continue;
            }
            let Some((source, text)) = effective_documentation(self.graph, symbol) else {
                continue;
            };
            if matches!(self.walker, Walker::PublicApi(_)) && !self.seen.insert((source, text)) {
                tracing::trace!(%name, "documentation already collected");
                continue;
            }
            return Some(Candidate {
                name,
                symbol,
                source,
            });
        }
    }

    fn is_skipped(&self, symbol: SymbolId, name: &str) -> bool {
        self.config.is_skipped(name) || self.config.is_skipped(&self.graph.qualified_name(symbol))
    }

    fn collect_unit(&self, candidate: Candidate) -> Result<Doctest, CollectError> {
        let text = self
            .graph
            .documentation_text(candidate.source)
            .unwrap_or_default();
        self.parser
            .get_doctest(
                text,
                &candidate.name,
                self.graph.filename(candidate.source).map(Into::into),
                self.graph.line_number(candidate.source),
                self.config.default_globals.clone(),
            )
            .map_err(|source| CollectError::Parse {
                name: candidate.name,
                source,
            })
    }
}

impl<G: SymbolGraph> Iterator for Discovery<'_, G> {
    type Item = Result<Doctest, CollectError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let candidate = self.next_candidate()?;
            match self.collect_unit(candidate) {
                Ok(doctest) if doctest.examples.is_empty() => {}
                Ok(doctest) => {
                    tracing::debug!(name = %doctest.name, examples = doctest.examples.len(), "collected");
                    return Some(Ok(doctest));
                }
                Err(error) => {
                    tracing::warn!(%error, "failed to collect doctest");
                    return Some(Err(error));
                }
            }
        }
    }
}

fn push_children<G: SymbolGraph>(graph: &G, stack: &mut Vec<Frame>, frame: &Frame) {
    let mut ancestors = frame.ancestors.clone();
    ancestors.push(frame.symbol);
    // Reversed so that declaration order pops first.
    for &child in graph.children(frame.symbol).iter().rev() {
        if ancestors.contains(&child) {
            continue;
        }
        stack.push(Frame {
            symbol: child,
            name: format!("{}.{}", frame.name, graph.name(child)),
            ancestors: ancestors.clone(),
        });
    }
}

fn public_candidates<G: SymbolGraph>(graph: &G) -> Vec<(SymbolId, String)> {
    let root = graph.root();
    let root_name = graph.name(root);
    let mut out = vec![(root, root_name.to_string())];
    if graph.kind(root) != SymbolKind::Module || root_name.starts_with('_') {
        return out;
    }
    for export in graph.export_list(root).unwrap_or_default() {
        if export.starts_with('_') {
            continue;
        }
        let Some(member) = graph.child_named(root, export) else {
            tracing::debug!(%export, "exported name has no symbol");
            continue;
        };
        if graph.is_deprecated(member) {
            continue;
        }
        let name = format!("{root_name}.{export}");
        if graph.kind(member) == SymbolKind::Class {
            let members = class_members(graph, member, &name);
            out.push((member, name));
            out.extend(members);
        } else {
            out.push((member, name));
        }
    }
    out
}

/// Public members of `class`, its own first, then inherited ones by base
/// class in declaration order. An inherited name shadowed earlier is dropped.
fn class_members<G: SymbolGraph>(graph: &G, class: SymbolId, class_name: &str) -> Vec<(SymbolId, String)> {
    let mut names: FxHashSet<&str> = FxHashSet::default();
    let mut out = Vec::new();
    for owner in std::iter::once(class).chain(ancestry(graph, class)) {
        for &member in graph.children(owner) {
            let name = graph.name(member);
            if name.starts_with('_') || graph.is_deprecated(member) || !names.insert(name) {
                continue;
            }
            out.push((member, format!("{class_name}.{name}")));
        }
    }
    out
}

/// Base classes of `class`, depth-first in declaration order, each once.
fn ancestry<G: SymbolGraph>(graph: &G, class: SymbolId) -> Vec<SymbolId> {
    let mut order = Vec::new();
    let mut pending: Vec<SymbolId> = graph.bases(class).iter().rev().copied().collect();
    while let Some(base) = pending.pop() {
        if base == class || order.contains(&base) {
            continue;
        }
        order.push(base);
        pending.extend(graph.bases(base).iter().rev());
    }
    order
}

fn own_documentation<G: SymbolGraph>(graph: &G, symbol: SymbolId) -> Option<&str> {
    graph
        .documentation_text(symbol)
        .filter(|text| !text.trim().is_empty())
}

/// The documentation used for `symbol`, with the symbol it comes from.
///
/// A class without its own falls back to its bases; a class member falls
/// back to the same-named member of the owning class's bases.
pub fn effective_documentation<G: SymbolGraph>(graph: &G, symbol: SymbolId) -> Option<(SymbolId, &str)> {
    if let Some(text) = own_documentation(graph, symbol) {
        return Some((symbol, text));
    }
    if graph.kind(symbol) == SymbolKind::Class {
        return ancestry(graph, symbol)
            .into_iter()
            .find_map(|base| own_documentation(graph, base).map(|text| (base, text)));
    }
    let owner = graph
        .owning_container(symbol)
        .filter(|&owner| graph.kind(owner) == SymbolKind::Class)?;
    let name = graph.name(symbol);
    ancestry(graph, owner).into_iter().find_map(|base| {
        let inherited = graph.child_named(base, name)?;
        own_documentation(graph, inherited).map(|text| (inherited, text))
    })
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
