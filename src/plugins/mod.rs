//! Hot-update plugin hooks
//!
//! Plugins get one chance to reshape the set of modules affected by a file
//! change before propagation runs. Hooks execute strictly in registration
//! order, each seeing the previous hook's output, never concurrently; a
//! hook error abandons the whole update. Returning `None` (or an empty
//! replacement) leaves the set unchanged.
//!
//! # Example
//! ```
//! use quickserve::graph::ModuleId;
//! use quickserve::plugins::{HmrPlugin, HotUpdateContext};
//!
//! /// Redirects updates of generated `.data.js` modules to their consumers
//! struct DataPlugin;
//!
//! impl HmrPlugin for DataPlugin {
//!     fn name(&self) -> &str {
//!         "data-modules"
//!     }
//!
//!     fn handle_hot_update(
//!         &self,
//!         ctx: &HotUpdateContext<'_>,
//!     ) -> quickserve::Result<Option<Vec<ModuleId>>> {
//!         let rerouted = ctx
//!             .modules
//!             .iter()
//!             .filter(|id| !id.as_str().ends_with(".data.js"))
//!             .cloned()
//!             .collect::<Vec<_>>();
//!         if rerouted.len() == ctx.modules.len() {
//!             Ok(None)
//!         } else {
//!             Ok(Some(rerouted))
//!         }
//!     }
//! }
//! ```

use std::fmt;
use std::path::Path;

use crate::error::Result;
use crate::graph::{ModuleGraph, ModuleId};

/// Context handed to every hot-update hook
pub struct HotUpdateContext<'a> {
    /// The changed file
    pub file: &'a Path,
    /// Shared timestamp of this update batch
    pub timestamp: u64,
    /// Current affected-module set (the previous hook's output)
    pub modules: &'a [ModuleId],
    /// Read access to the module graph
    pub graph: &'a ModuleGraph,
}

/// A dev-server plugin participating in hot updates
pub trait HmrPlugin {
    /// Unique plugin name, used in diagnostics and errors
    fn name(&self) -> &str;

    /// Optionally replace the affected-module set for this file change.
    ///
    /// `Ok(None)` and `Ok(Some(vec![]))` both mean "leave the set as is".
    /// An `Err` aborts the update and propagates to the orchestrator caller.
    fn handle_hot_update(&self, ctx: &HotUpdateContext<'_>) -> Result<Option<Vec<ModuleId>>> {
        let _ = ctx;
        Ok(None)
    }
}

/// Ordered plugin list. Registration order is execution order.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Box<dyn HmrPlugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plugin. Later registrations run after earlier ones.
    pub fn register(&mut self, plugin: Box<dyn HmrPlugin>) {
        self.plugins.push(plugin);
    }

    /// Iterate plugins in registration order
    pub fn iter(&self) -> impl Iterator<Item = &dyn HmrPlugin> {
        self.plugins.iter().map(Box::as_ref)
    }

    /// Number of registered plugins
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether no plugins are registered
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.plugins.iter().map(|p| p.name()).collect();
        f.debug_struct("PluginRegistry")
            .field("plugins", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    impl HmrPlugin for Named {
        fn name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_registration_order_is_iteration_order() {
        let mut registry = PluginRegistry::new();
        registry.register(Box::new(Named("first")));
        registry.register(Box::new(Named("second")));
        registry.register(Box::new(Named("third")));

        let names: Vec<&str> = registry.iter().map(|p| p.name()).collect();
        assert_eq!(names, ["first", "second", "third"]);
    }

    #[test]
    fn test_default_hook_leaves_set_unchanged() {
        let plugin = Named("noop");
        let graph = ModuleGraph::new();
        let modules = vec![ModuleId::from("/a.js")];
        let ctx = HotUpdateContext {
            file: Path::new("/srv/a.js"),
            timestamp: 1,
            modules: &modules,
            graph: &graph,
        };
        assert!(plugin.handle_hot_update(&ctx).unwrap().is_none());
    }
}
