//! Prelude module for convenient imports
//!
//! ```
//! use quickserve::prelude::*;
//!
//! let mut graph = ModuleGraph::new();
//! graph.ensure_module(ModuleId::from("/a.js"), None, ModuleKind::Js);
//! ```

// Error handling
pub use crate::error::{Error, Result, SourceLocation};

// Module graph
pub use crate::graph::{ModuleGraph, ModuleId, ModuleKind, ModuleNode, TransformResult};

// HMR engine
pub use crate::hmr::{propagate_update, HmrEngine, ServerConfig, UpdateBoundary};

// Accept-list lexer
pub use crate::lexer::{lex_accepted_hmr_deps, scan_accept_calls};

// Plugin hooks
pub use crate::plugins::{HmrPlugin, HotUpdateContext, PluginRegistry};

// Client transport
pub use crate::transport::{ClientTransport, HmrPayload, MemoryTransport, Update};

// Version constant
pub use crate::VERSION;
