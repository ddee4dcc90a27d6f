//! Module graph bookkeeping for hot module replacement
//!
//! Tracks one node per resolved module URL. A single file on disk can back
//! several nodes (query-suffixed variants), so lookups by file return a list
//! of URLs. The graph stores reverse `importers` edges alongside forward
//! edges; the HMR walk in [`crate::hmr`] only reads nodes and stamps their
//! `last_hmr_timestamp` / clears their `transform_result`.
//!
//! # Example
//! ```
//! use quickserve::graph::{ModuleGraph, ModuleId, ModuleKind};
//!
//! let mut graph = ModuleGraph::new();
//! let main = ModuleId::from("/main.js");
//! let dep = ModuleId::from("/util.js");
//! graph.ensure_module(main.clone(), Some("/srv/app/main.js".into()), ModuleKind::Js);
//! graph.ensure_module(dep.clone(), Some("/srv/app/util.js".into()), ModuleKind::Js);
//! graph.add_import(&main, &dep);
//! assert!(graph.get(&dep).unwrap().importers.contains(&main));
//! ```

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::hash_map::Entry;
use std::fmt;
use std::path::{Path, PathBuf};

/// Module identifier: the resolved, hot-update-tracked URL of a module.
///
/// Distinct from the backing file path - one file may serve several URLs.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModuleId(pub String);

impl ModuleId {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ModuleId {
    fn from(url: &str) -> Self {
        Self(url.to_string())
    }
}

impl From<String> for ModuleId {
    fn from(url: String) -> Self {
        Self(url)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Discrete module kind, used to label emitted update records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    /// Script module (ES module source)
    Js,
    /// Style module (stylesheet)
    Css,
}

impl ModuleKind {
    /// Wire name of the kind, as it appears in `"<kind>-update"` records
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleKind::Js => "js",
            ModuleKind::Css => "css",
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Cached compiled output for a module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformResult {
    /// Transformed source code
    pub code: String,
    /// Source map, if one was produced
    pub map: Option<String>,
}

impl TransformResult {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            map: None,
        }
    }
}

/// One resolved, hot-update-tracked module
#[derive(Debug, Clone)]
pub struct ModuleNode {
    /// Resolved URL (graph key)
    pub url: ModuleId,
    /// Backing file, if the module maps to one on disk
    pub file: Option<PathBuf>,
    /// Kind used to label update records for this node
    pub kind: ModuleKind,
    /// Module declared it can hot-swap itself without notifying importers
    pub is_self_accepting: bool,
    /// Dependencies this module explicitly handles hot updates for
    pub accepted_hmr_deps: FxHashSet<ModuleId>,
    /// Modules this node imports (forward edges)
    pub imported_modules: FxHashSet<ModuleId>,
    /// Reverse edges: modules importing this node, in insertion order
    pub importers: Vec<ModuleId>,
    /// Cache-busting stamp sent to clients on re-import
    pub last_hmr_timestamp: u64,
    /// Cached transform output; cleared whenever an update walk touches the node
    pub transform_result: Option<TransformResult>,
}

impl ModuleNode {
    pub fn new(url: ModuleId, file: Option<PathBuf>, kind: ModuleKind) -> Self {
        Self {
            url,
            file,
            kind,
            is_self_accepting: false,
            accepted_hmr_deps: FxHashSet::default(),
            imported_modules: FxHashSet::default(),
            importers: Vec::new(),
            last_hmr_timestamp: 0,
            transform_result: None,
        }
    }

    /// Record a reverse edge, preserving insertion order
    fn add_importer(&mut self, importer: ModuleId) {
        if !self.importers.contains(&importer) {
            self.importers.push(importer);
        }
    }

    fn remove_importer(&mut self, importer: &ModuleId) {
        self.importers.retain(|id| id != importer);
    }
}

/// Module graph: nodes keyed by URL, with a file-to-URLs index
#[derive(Debug, Default)]
pub struct ModuleGraph {
    url_to_module: FxHashMap<ModuleId, ModuleNode>,
    file_to_modules: FxHashMap<PathBuf, Vec<ModuleId>>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module, returning the (possibly existing) node.
    ///
    /// Registration is idempotent: an existing node keeps its edges,
    /// acceptance info, and cached transform.
    pub fn ensure_module(
        &mut self,
        url: ModuleId,
        file: Option<PathBuf>,
        kind: ModuleKind,
    ) -> &mut ModuleNode {
        match self.url_to_module.entry(url.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                if let Some(ref file) = file {
                    let entries = self.file_to_modules.entry(file.clone()).or_default();
                    if !entries.contains(&url) {
                        entries.push(url.clone());
                    }
                }
                entry.insert(ModuleNode::new(url, file, kind))
            }
        }
    }

    /// Get a module
    pub fn get(&self, url: &ModuleId) -> Option<&ModuleNode> {
        self.url_to_module.get(url)
    }

    /// Get a module mutably
    pub fn get_mut(&mut self, url: &ModuleId) -> Option<&mut ModuleNode> {
        self.url_to_module.get_mut(url)
    }

    /// URLs of all modules backed by `file`, in registration order
    pub fn modules_by_file(&self, file: &Path) -> Option<&[ModuleId]> {
        self.file_to_modules.get(file).map(Vec::as_slice)
    }

    /// Record an import edge: `importer` imports `imported`.
    ///
    /// Keeps the reverse invariant: `imported.importers` contains `importer`.
    /// Unknown endpoints are ignored; the resolver registers nodes first.
    pub fn add_import(&mut self, importer: &ModuleId, imported: &ModuleId) {
        if !self.url_to_module.contains_key(importer) || !self.url_to_module.contains_key(imported)
        {
            return;
        }
        if let Some(node) = self.url_to_module.get_mut(importer) {
            node.imported_modules.insert(imported.clone());
        }
        if let Some(node) = self.url_to_module.get_mut(imported) {
            node.add_importer(importer.clone());
        }
    }

    /// Replace a module's acceptance info after its source was re-scanned
    pub fn update_accepted_deps(
        &mut self,
        url: &ModuleId,
        accepted: FxHashSet<ModuleId>,
        is_self_accepting: bool,
    ) {
        if let Some(node) = self.url_to_module.get_mut(url) {
            node.accepted_hmr_deps = accepted;
            node.is_self_accepting = is_self_accepting;
        }
    }

    /// Store a module's transform output
    pub fn set_transform_result(&mut self, url: &ModuleId, result: TransformResult) {
        if let Some(node) = self.url_to_module.get_mut(url) {
            node.transform_result = Some(result);
        }
    }

    /// Invalidate a node touched by an update walk: clear its cached
    /// transform and stamp the timestamp. Repeated stamping with the same
    /// timestamp is idempotent.
    pub fn invalidate(&mut self, url: &ModuleId, timestamp: u64) {
        if let Some(node) = self.url_to_module.get_mut(url) {
            node.transform_result = None;
            node.last_hmr_timestamp = timestamp;
        }
    }

    /// Remove a module, cleaning up edges in both directions and the file
    /// index. Returns the removed node.
    pub fn remove(&mut self, url: &ModuleId) -> Option<ModuleNode> {
        let node = self.url_to_module.remove(url)?;
        for imported in &node.imported_modules {
            if let Some(dep) = self.url_to_module.get_mut(imported) {
                dep.remove_importer(url);
            }
        }
        for importer in &node.importers {
            if let Some(imp) = self.url_to_module.get_mut(importer) {
                imp.imported_modules.remove(url);
            }
        }
        if let Some(ref file) = node.file {
            if let Some(entries) = self.file_to_modules.get_mut(file) {
                entries.retain(|id| id != url);
                if entries.is_empty() {
                    self.file_to_modules.remove(file);
                }
            }
        }
        Some(node)
    }

    /// Iterate all modules
    pub fn modules(&self) -> impl Iterator<Item = &ModuleNode> {
        self.url_to_module.values()
    }

    /// Number of modules in the graph
    pub fn len(&self) -> usize {
        self.url_to_module.len()
    }

    /// Check if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.url_to_module.is_empty()
    }
}
