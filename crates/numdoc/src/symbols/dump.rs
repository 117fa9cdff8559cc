//! JSON symbol dumps.
//!
//! ```json
//! {
//!   "name": "stats",
//!   "doc": "Summary statistics.",
//!   "file": "stats/__init__.py",
//!   "exports": ["mean"],
//!   "reexports": ["stats._impl.mean"],
//!   "members": [
//!     { "name": "_impl", "members": [
//!       { "name": "mean", "kind": "function", "doc": ">>> mean([1, 2])\n1.5\n" }
//!     ]}
//!   ]
//! }
//! ```
//!
//! `kind` defaults to `module`. A member without `file` inherits its
//! container's. `reexports` and `bases` name symbols by qualified name and
//! are resolved once every member has been added.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::{SymbolId, SymbolKind, SymbolTree, SymbolTreeBuilder};

#[derive(Debug, thiserror::Error)]
pub enum SymbolError {
    #[error("cannot read symbol dump {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed symbol dump: {0}")]
    Json(#[from] serde_json::Error),
    #[error("`{from}` refers to unknown symbol `{target}`")]
    UnresolvedReference { from: String, target: String },
    #[error("symbol tree overflow: {count} symbols exceed the id space")]
    TooManySymbols { count: usize },
}

fn module_kind() -> SymbolKind {
    SymbolKind::Module
}

/// One symbol and its members, as serialized.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SymbolDump {
    pub name: String,
    #[serde(default = "module_kind")]
    pub kind: SymbolKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    #[serde(default)]
    pub line: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exports: Option<Vec<String>>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<SymbolDump>,
    /// Qualified names of symbols defined elsewhere and reachable from here.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reexports: Vec<String>,
    /// Qualified names of base classes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bases: Vec<String>,
}

/// References to resolve after every symbol exists.
struct Pending<'d> {
    id: SymbolId,
    qualified: String,
    dump: &'d SymbolDump,
}

impl SymbolTree {
    pub fn from_json(text: &str) -> Result<SymbolTree, SymbolError> {
        let dump: SymbolDump = serde_json::from_str(text)?;
        SymbolTree::from_dump(&dump, None)
    }

    /// Load a dump from disk; relative `file` entries resolve against the
    /// dump's directory.
    #[tracing::instrument(level = "debug", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<SymbolTree, SymbolError> {
        let text = std::fs::read_to_string(path).map_err(|source| SymbolError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let dump: SymbolDump = serde_json::from_str(&text)?;
        let tree = SymbolTree::from_dump(&dump, path.parent())?;
        tracing::debug!(symbols = tree.len(), "loaded symbol dump");
        Ok(tree)
    }

    pub fn from_dump(dump: &SymbolDump, base_dir: Option<&Path>) -> Result<SymbolTree, SymbolError> {
        let mut builder = SymbolTree::builder(dump.name.clone());
        let root = builder.root();
        let mut by_name: FxHashMap<String, SymbolId> = FxHashMap::default();
        let mut pending = Vec::new();
        let file = resolve_file(dump.file.as_deref(), base_dir);
        fill(&mut builder, root, dump, file.as_deref());
        by_name.insert(dump.name.clone(), root);
        pending.push(Pending {
            id: root,
            qualified: dump.name.clone(),
            dump,
        });
        add_members(
            &mut builder,
            root,
            &dump.name,
            dump,
            file.as_deref(),
            base_dir,
            &mut by_name,
            &mut pending,
        )?;

        for item in &pending {
            let resolve = |target: &String| {
                by_name
                    .get(target)
                    .copied()
                    .ok_or_else(|| SymbolError::UnresolvedReference {
                        from: item.qualified.clone(),
                        target: target.clone(),
                    })
            };
            for target in &item.dump.reexports {
                let symbol = resolve(target)?;
                builder.reexport(item.id, symbol);
            }
            for target in &item.dump.bases {
                let base = resolve(target)?;
                builder.base(item.id, base);
            }
        }
        Ok(builder.build())
    }
}

fn resolve_file(file: Option<&Path>, base_dir: Option<&Path>) -> Option<PathBuf> {
    let file = file?;
    match base_dir {
        Some(dir) if file.is_relative() => Some(dir.join(file)),
        _ => Some(file.to_path_buf()),
    }
}

fn fill(
    builder: &mut SymbolTreeBuilder,
    id: SymbolId,
    dump: &SymbolDump,
    file: Option<&Path>,
) {
    if let Some(doc) = &dump.doc {
        builder.doc(id, doc.clone());
    }
    if let Some(exports) = &dump.exports {
        builder.exports(id, exports.iter().cloned());
    }
    if let Some(file) = file {
        builder.location(id, file, dump.line);
    }
    if dump.deprecated {
        builder.deprecated(id);
    }
}

#[expect(
    clippy::too_many_arguments,
    reason = "recursive walk threads its accumulators explicitly"
)]
fn add_members<'d>(
    builder: &mut SymbolTreeBuilder,
    parent: SymbolId,
    parent_name: &str,
    dump: &'d SymbolDump,
    parent_file: Option<&Path>,
    base_dir: Option<&Path>,
    by_name: &mut FxHashMap<String, SymbolId>,
    pending: &mut Vec<Pending<'d>>,
) -> Result<(), SymbolError> {
    for member in &dump.members {
        let id = builder.try_add(parent, member.name.clone(), member.kind)?;
        let qualified = format!("{parent_name}.{}", member.name);
        let file = resolve_file(member.file.as_deref(), base_dir)
            .or_else(|| parent_file.map(Path::to_path_buf));
        fill(builder, id, member, file.as_deref());
        by_name.insert(qualified.clone(), id);
        add_members(
            builder,
            id,
            &qualified,
            member,
            file.as_deref(),
            base_dir,
            by_name,
            pending,
        )?;
        pending.push(Pending {
            id,
            qualified,
            dump: member,
        });
    }
    Ok(())
}
