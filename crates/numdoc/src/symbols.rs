//! The symbol graph discovery walks.
//!
//! A documented body of code is a graph of containers (modules, classes) and
//! members (functions, methods, data attributes). A member can be reachable
//! from more than one container: a module re-exporting a definition lists it
//! as a child without owning it. [`SymbolGraph`] is the read-only view the
//! discoverer needs; [`SymbolTree`] is the shipped in-memory implementation,
//! built in code with [`SymbolTreeBuilder`] or loaded from a JSON dump.

mod dump;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use dump::{SymbolDump, SymbolError};

/// Index of a symbol in its graph.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(u32);

impl SymbolId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        SymbolId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolId({})", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Module,
    Class,
    Function,
    Method,
    /// A documented data attribute.
    Attribute,
}

/// Read-only view of a documented body of code.
pub trait SymbolGraph {
    fn root(&self) -> SymbolId;

    fn name(&self, id: SymbolId) -> &str;

    fn kind(&self, id: SymbolId) -> SymbolKind;

    /// The container that defines `id`, as opposed to ones re-exporting it.
    fn owning_container(&self, id: SymbolId) -> Option<SymbolId>;

    /// The explicit export list of a module, if it declares one.
    fn export_list(&self, module: SymbolId) -> Option<&[String]>;

    /// The symbol's own documentation, if any.
    fn documentation_text(&self, id: SymbolId) -> Option<&str>;

    /// Members reachable from `id`, in declaration order.
    fn children(&self, id: SymbolId) -> &[SymbolId];

    /// Base classes of a class, in declaration order.
    fn bases(&self, id: SymbolId) -> &[SymbolId];

    /// Source file of the symbol's documentation.
    fn filename(&self, id: SymbolId) -> Option<&Path>;

    fn line_number(&self, id: SymbolId) -> usize;

    fn is_deprecated(&self, id: SymbolId) -> bool;

    /// Whether `name` appears in the export list of `module`. A module without
    /// an export list exports nothing.
    fn export_list_membership(&self, module: SymbolId, name: &str) -> bool {
        self.export_list(module)
            .is_some_and(|exports| exports.iter().any(|e| e == name))
    }

    fn child_named(&self, container: SymbolId, name: &str) -> Option<SymbolId> {
        self.children(container)
            .iter()
            .copied()
            .find(|&child| self.name(child) == name)
    }

    /// Dotted name through the defining containers, e.g. `pkg._impl.mean`.
    fn qualified_name(&self, id: SymbolId) -> String {
        let mut parts = vec![self.name(id)];
        let mut current = id;
        while let Some(owner) = self.owning_container(current) {
            parts.push(self.name(owner));
            current = owner;
        }
        parts.reverse();
        parts.join(".")
    }
}

#[derive(Clone, Debug)]
struct SymbolNode {
    name: String,
    kind: SymbolKind,
    owner: Option<SymbolId>,
    doc: Option<String>,
    exports: Option<Vec<String>>,
    children: Vec<SymbolId>,
    bases: Vec<SymbolId>,
    filename: Option<PathBuf>,
    line: usize,
    deprecated: bool,
}

impl SymbolNode {
    fn new(name: String, kind: SymbolKind, owner: Option<SymbolId>) -> Self {
        SymbolNode {
            name,
            kind,
            owner,
            doc: None,
            exports: None,
            children: Vec::new(),
            bases: Vec::new(),
            filename: None,
            line: 0,
            deprecated: false,
        }
    }
}

/// Arena-backed symbol graph.
#[derive(Clone, Debug)]
pub struct SymbolTree {
    nodes: Vec<SymbolNode>,
}

impl SymbolTree {
    /// Start a tree whose root is the module `root`.
    pub fn builder(root: impl Into<String>) -> SymbolTreeBuilder {
        SymbolTreeBuilder {
            nodes: vec![SymbolNode::new(root.into(), SymbolKind::Module, None)],
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Find a symbol by its qualified name.
    pub fn lookup(&self, qualified: &str) -> Option<SymbolId> {
        let mut parts = qualified.split('.');
        let root = self.root();
        if parts.next()? != self.name(root) {
            return None;
        }
        parts.try_fold(root, |current, part| self.child_named(current, part))
    }

    fn node(&self, id: SymbolId) -> &SymbolNode {
        &self.nodes[id.index()]
    }
}

impl SymbolGraph for SymbolTree {
    fn root(&self) -> SymbolId {
        SymbolId::new(0)
    }

    fn name(&self, id: SymbolId) -> &str {
        &self.node(id).name
    }

    fn kind(&self, id: SymbolId) -> SymbolKind {
        self.node(id).kind
    }

    fn owning_container(&self, id: SymbolId) -> Option<SymbolId> {
        self.node(id).owner
    }

    fn export_list(&self, module: SymbolId) -> Option<&[String]> {
        self.node(module).exports.as_deref()
    }

    fn documentation_text(&self, id: SymbolId) -> Option<&str> {
        self.node(id).doc.as_deref()
    }

    fn children(&self, id: SymbolId) -> &[SymbolId] {
        &self.node(id).children
    }

    fn bases(&self, id: SymbolId) -> &[SymbolId] {
        &self.node(id).bases
    }

    fn filename(&self, id: SymbolId) -> Option<&Path> {
        self.node(id).filename.as_deref()
    }

    fn line_number(&self, id: SymbolId) -> usize {
        self.node(id).line
    }

    fn is_deprecated(&self, id: SymbolId) -> bool {
        self.node(id).deprecated
    }
}

/// The id of the symbol stored at arena slot `index`.
fn id_at(index: usize) -> Result<SymbolId, SymbolError> {
    u32::try_from(index)
        .map(SymbolId::new)
        .map_err(|_| SymbolError::TooManySymbols { count: index })
}

/// Incremental construction of a [`SymbolTree`].
///
/// Symbols are added under a parent, which becomes their owning container.
/// [`reexport`](Self::reexport) makes an existing symbol reachable from a
/// second container without changing its owner.
#[derive(Clone, Debug)]
pub struct SymbolTreeBuilder {
    nodes: Vec<SymbolNode>,
}

impl SymbolTreeBuilder {
    pub fn root(&self) -> SymbolId {
        SymbolId::new(0)
    }

    /// Add a symbol defined in `parent`, or fail once ids are exhausted.
    pub fn try_add(
        &mut self,
        parent: SymbolId,
        name: impl Into<String>,
        kind: SymbolKind,
    ) -> Result<SymbolId, SymbolError> {
        let id = id_at(self.nodes.len())?;
        self.nodes.push(SymbolNode::new(name.into(), kind, Some(parent)));
        self.nodes[parent.index()].children.push(id);
        Ok(id)
    }

    /// Add a symbol defined in `parent`.
    ///
    /// # Panics
    /// Panics if the tree already holds `u32::MAX + 1` symbols. Use
    /// [`try_add`](Self::try_add) for fallible construction.
    pub fn add(&mut self, parent: SymbolId, name: impl Into<String>, kind: SymbolKind) -> SymbolId {
        self.try_add(parent, name, kind).unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn module(&mut self, parent: SymbolId, name: impl Into<String>) -> SymbolId {
        self.add(parent, name, SymbolKind::Module)
    }

    pub fn class(&mut self, parent: SymbolId, name: impl Into<String>) -> SymbolId {
        self.add(parent, name, SymbolKind::Class)
    }

    pub fn function(&mut self, parent: SymbolId, name: impl Into<String>) -> SymbolId {
        self.add(parent, name, SymbolKind::Function)
    }

    pub fn method(&mut self, class: SymbolId, name: impl Into<String>) -> SymbolId {
        self.add(class, name, SymbolKind::Method)
    }

    pub fn attribute(&mut self, parent: SymbolId, name: impl Into<String>) -> SymbolId {
        self.add(parent, name, SymbolKind::Attribute)
    }

    pub fn doc(&mut self, id: SymbolId, text: impl Into<String>) -> &mut Self {
        self.nodes[id.index()].doc = Some(text.into());
        self
    }

    pub fn exports<I, S>(&mut self, module: SymbolId, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.nodes[module.index()].exports = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Make `symbol` reachable from `container` as well as from its owner.
    pub fn reexport(&mut self, container: SymbolId, symbol: SymbolId) -> &mut Self {
        self.nodes[container.index()].children.push(symbol);
        self
    }

    pub fn base(&mut self, class: SymbolId, base: SymbolId) -> &mut Self {
        self.nodes[class.index()].bases.push(base);
        self
    }

    pub fn location(&mut self, id: SymbolId, file: impl Into<PathBuf>, line: usize) -> &mut Self {
        let node = &mut self.nodes[id.index()];
        node.filename = Some(file.into());
        node.line = line;
        self
    }

    pub fn deprecated(&mut self, id: SymbolId) -> &mut Self {
        self.nodes[id.index()].deprecated = true;
        self
    }

    pub fn build(self) -> SymbolTree {
        SymbolTree { nodes: self.nodes }
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
