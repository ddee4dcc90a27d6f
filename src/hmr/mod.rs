//! Hot Module Replacement decision core
//!
//! Given one changed file, decide which already-loaded modules can absorb
//! the change in place, which force a full page reload, and emit the
//! minimal ordered set of update notifications to connected clients.
//!
//! The walk ascends reverse `importers` edges from each changed module. A
//! module that accepts its own updates, or an importer that explicitly
//! accepts the changed dependency, terminates a branch as an update
//! boundary. A branch reaching a module nobody imports (and that does not
//! accept itself) is a dead end: the whole batch collapses into a single
//! `full-reload`, superseding any boundaries already found.
//!
//! # Example
//! ```text
//! // main.js
//! import { render } from './view.js';
//!
//! if (import.meta.hot) {
//!   // main.js absorbs hot updates of view.js; edits to view.js reach the
//!   // client as one js-update record with main.js as the boundary
//!   import.meta.hot.accept('./view.js', (mod) => mod.render());
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::graph::{ModuleGraph, ModuleId};
use crate::plugins::{HmrPlugin, HotUpdateContext, PluginRegistry};
use crate::transport::{ClientTransport, HmrPayload, Update};

/// Dev-server configuration consulted by the orchestrator
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Project root; emitted reload paths are relative to it
    pub root: PathBuf,
    /// The live config file, if one is in use. Changes to it are traced
    /// and otherwise ignored: restart policy belongs to the host.
    pub config_file: Option<PathBuf>,
    /// Reserved client-runtime directory; changes under it always force a
    /// full reload
    pub client_dir: PathBuf,
}

impl ServerConfig {
    /// Create a config rooted at `root`, with the client runtime served
    /// from `<root>/.quickserve/client`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let client_dir = root.join(".quickserve").join("client");
        Self {
            root,
            config_file: None,
            client_dir,
        }
    }

    /// Set the active config file path
    pub fn with_config_file(mut self, config_file: impl Into<PathBuf>) -> Self {
        self.config_file = Some(config_file.into());
        self
    }

    /// Override the reserved client-runtime directory
    pub fn with_client_dir(mut self, client_dir: impl Into<PathBuf>) -> Self {
        self.client_dir = client_dir.into();
        self
    }

    /// Whether `file` is the active config file
    pub fn is_config_file(&self, file: &Path) -> bool {
        self.config_file.as_deref() == Some(file)
    }

    /// Whether `file` lies under the reserved client-runtime directory
    pub fn is_client_file(&self, file: &Path) -> bool {
        file.starts_with(&self.client_dir)
    }

    /// Root-relative display name for diagnostics
    pub fn short_name(&self, file: &Path) -> String {
        match file.strip_prefix(&self.root) {
            Ok(relative) => normalize_path(relative),
            Err(_) => normalize_path(file),
        }
    }

    /// Root-relative, slash-normalized URL for reload payloads. Files
    /// outside the root keep their full (normalized) path.
    pub fn root_relative_url(&self, file: &Path) -> String {
        match file.strip_prefix(&self.root) {
            Ok(relative) => format!("/{}", normalize_path(relative)),
            Err(_) => normalize_path(file),
        }
    }
}

/// Slash-normalized string form of a path
fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Whether `file` is an environment file (`.env`, `.env.local`, ...)
pub fn is_env_file(file: &Path) -> bool {
    match file.file_name().and_then(|name| name.to_str()) {
        Some(name) => name == ".env" || name.starts_with(".env."),
        None => false,
    }
}

/// Whether `file` is an HTML document
pub fn is_html_file(file: &Path) -> bool {
    matches!(
        file.extension().and_then(|ext| ext.to_str()),
        Some("html") | Some("htm")
    )
}

/// The module whose update must reach the client, and the dependency edge
/// through which it was absorbed.
///
/// Distinct pairs may share the same `boundary` (two acceptance paths into
/// one module) and are deliberately kept as separate records: collapsing
/// them would lose the causal edge the client needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateBoundary {
    pub boundary: ModuleId,
    pub accepted_via: ModuleId,
}

/// Upward depth-first walk from a changed module over `importers` edges.
///
/// Records update boundaries into `boundaries` and invalidates every node
/// on a successful path (stamp `timestamp`, clear the cached transform).
/// Returns `true` on a dead end: a branch ending at a module with no
/// importers and no self-acceptance. The first dead end anywhere aborts
/// the entire walk; the caller discards any boundaries collected so far.
///
/// `chain` is the current path, rooted at the changed module. Cycles back
/// onto the chain are skipped; a linear containment scan suffices because
/// import chains are short.
pub fn propagate_update(
    graph: &mut ModuleGraph,
    url: &ModuleId,
    timestamp: u64,
    boundaries: &mut Vec<UpdateBoundary>,
    chain: &mut Vec<ModuleId>,
) -> bool {
    let (is_self_accepting, importers) = match graph.get(url) {
        Some(node) => (node.is_self_accepting, node.importers.clone()),
        // An edge pointing at a node the graph no longer knows cannot be
        // analyzed; force a reload.
        None => return true,
    };

    if is_self_accepting {
        boundaries.push(UpdateBoundary {
            boundary: url.clone(),
            accepted_via: url.clone(),
        });
        invalidate_chain(graph, chain, timestamp);
        return false;
    }

    if importers.is_empty() {
        return true;
    }

    for importer in &importers {
        let accepts_this_dep = graph
            .get(importer)
            .is_some_and(|node| node.accepted_hmr_deps.contains(url));

        if accepts_this_dep {
            boundaries.push(UpdateBoundary {
                boundary: importer.clone(),
                accepted_via: url.clone(),
            });
            chain.push(importer.clone());
            invalidate_chain(graph, chain, timestamp);
            chain.pop();
            // the importer absorbed the update; do not ascend past it
            continue;
        }

        if chain.contains(importer) {
            // cycle back onto the current path
            continue;
        }

        chain.push(importer.clone());
        let has_dead_end = propagate_update(graph, importer, timestamp, boundaries, chain);
        chain.pop();
        if has_dead_end {
            return true;
        }
    }

    false
}

fn invalidate_chain(graph: &mut ModuleGraph, chain: &[ModuleId], timestamp: u64) {
    for url in chain {
        graph.invalidate(url, timestamp);
    }
}

/// Per-server HMR coordinator.
///
/// One engine instance serializes all update processing: every entry point
/// takes `&mut self`, so a consistent snapshot of `importers` and
/// `accepted_hmr_deps` is guaranteed for the duration of each walk. Hosts
/// dispatching file events from several threads must funnel them through
/// one engine.
pub struct HmrEngine {
    config: ServerConfig,
    graph: ModuleGraph,
    plugins: PluginRegistry,
    transport: Box<dyn ClientTransport>,
    last_timestamp: u64,
}

impl HmrEngine {
    pub fn new(config: ServerConfig, transport: Box<dyn ClientTransport>) -> Self {
        Self {
            config,
            graph: ModuleGraph::new(),
            plugins: PluginRegistry::new(),
            transport,
            last_timestamp: 0,
        }
    }

    /// Server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Read access to the module graph
    pub fn graph(&self) -> &ModuleGraph {
        &self.graph
    }

    /// Mutable access for the graph-maintenance side (resolver, transformer)
    pub fn graph_mut(&mut self) -> &mut ModuleGraph {
        &mut self.graph
    }

    /// Register a plugin; hooks run in registration order
    pub fn register_plugin(&mut self, plugin: Box<dyn HmrPlugin>) {
        self.plugins.register(plugin);
    }

    /// Fresh batch timestamp: wall-clock milliseconds, clamped strictly
    /// monotonic per engine so clients can key caches by it.
    fn next_timestamp(&mut self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        self.last_timestamp = now.max(self.last_timestamp + 1);
        self.last_timestamp
    }

    /// Top-level entry point for one file-change event.
    ///
    /// Classifies the change, lets plugins reshape the affected-module set,
    /// then drives propagation per module and emits the final client
    /// message. Decision table, first match wins:
    ///
    /// 1. active config file -> trace only, restart policy is external
    /// 2. environment file -> trace only
    /// 3. HTML document or client-runtime file -> `full-reload` with a
    ///    root-relative path, before any graph lookup
    /// 4. no graph nodes for the file -> trace, no-op
    /// 5. otherwise plugin reduction, then [`Self::update_modules`]
    pub fn handle_file_change(&mut self, file: &Path) -> Result<()> {
        let short_name = self.config.short_name(file);

        if self.config.is_config_file(file) {
            info!(file = %short_name, "config file changed; restart is handled by the host");
            return Ok(());
        }

        if is_env_file(file) {
            info!(file = %short_name, "env file changed; restart is handled by the host");
            return Ok(());
        }

        if is_html_file(file) || self.config.is_client_file(file) {
            let path = self.config.root_relative_url(file);
            info!(file = %short_name, "page reload");
            self.transport.send(&HmrPayload::full_reload_at(path))?;
            return Ok(());
        }

        let Some(matched) = self.graph.modules_by_file(file) else {
            debug!(file = %short_name, "no modules matched");
            return Ok(());
        };
        let mut modules: Vec<ModuleId> = matched.to_vec();
        let timestamp = self.next_timestamp();

        // Hooks run strictly in registration order, each seeing the prior
        // hook's output. An empty or absent result leaves the set unchanged.
        for plugin in self.plugins.iter() {
            let ctx = HotUpdateContext {
                file,
                timestamp,
                modules: &modules,
                graph: &self.graph,
            };
            if let Some(replacement) = plugin.handle_hot_update(&ctx)? {
                if !replacement.is_empty() {
                    debug!(
                        plugin = plugin.name(),
                        count = replacement.len(),
                        "plugin replaced affected module set"
                    );
                    modules = replacement;
                }
            }
        }

        self.update_modules(&short_name, &modules, timestamp)
    }

    /// A file disappeared from disk. Its nodes stay in the graph until the
    /// resolver prunes them, but clients holding the modules must update,
    /// so the removal runs through the same batch path as a modification.
    pub fn handle_file_removed(&mut self, file: &Path) -> Result<()> {
        let short_name = self.config.short_name(file);
        let Some(matched) = self.graph.modules_by_file(file) else {
            debug!(file = %short_name, "no modules matched removed file");
            return Ok(());
        };
        let modules = matched.to_vec();
        let timestamp = self.next_timestamp();
        self.update_modules(&short_name, &modules, timestamp)
    }

    /// Run propagation for a batch of changed modules under one shared
    /// timestamp and send the resulting client message.
    ///
    /// Any dead end sends exactly one bare `full-reload` and stops: a full
    /// reload supersedes partial updates, so boundaries already collected
    /// for earlier modules in the batch are discarded. Otherwise all
    /// boundary records concatenate, without dedup, into one `update`
    /// message.
    pub fn update_modules(
        &mut self,
        file: &str,
        modules: &[ModuleId],
        timestamp: u64,
    ) -> Result<()> {
        let mut updates: Vec<Update> = Vec::new();

        for url in modules {
            let mut boundaries: Vec<UpdateBoundary> = Vec::new();
            let mut chain = vec![url.clone()];
            let has_dead_end =
                propagate_update(&mut self.graph, url, timestamp, &mut boundaries, &mut chain);

            if has_dead_end {
                info!(file, module = %url, "dead end reached, falling back to full reload");
                self.transport.send(&HmrPayload::full_reload())?;
                return Ok(());
            }

            for found in boundaries {
                let kind = self
                    .graph
                    .get(&found.boundary)
                    .map(|node| node.kind)
                    .ok_or_else(|| {
                        Error::internal(format!(
                            "update boundary {} is not in the module graph",
                            found.boundary
                        ))
                    })?;
                updates.push(Update {
                    kind: format!("{}-update", kind.as_str()),
                    timestamp,
                    path: found.boundary.to_string(),
                    accepted_path: found.accepted_via.to_string(),
                });
            }
        }

        if updates.is_empty() {
            debug!(file, "no boundaries found, nothing to update");
        } else {
            debug!(file, count = updates.len(), "hot update");
        }
        self.transport.send(&HmrPayload::Update { updates })
    }

    /// Notify clients that `urls` were removed from the graph.
    ///
    /// Every node gets one fresh timestamp (so a later re-import of the
    /// same URL is not served from a stale client cache keyed by the old
    /// stamp), then a single `prune` message lists the URLs in input
    /// order. Graph edges are not touched.
    pub fn handle_pruned_modules(&mut self, urls: &[ModuleId]) -> Result<()> {
        let timestamp = self.next_timestamp();
        for url in urls {
            if let Some(node) = self.graph.get_mut(url) {
                node.last_hmr_timestamp = timestamp;
            }
        }
        debug!(count = urls.len(), "prune");
        self.transport.send(&HmrPayload::Prune {
            paths: urls.iter().map(ToString::to_string).collect(),
        })
    }
}
