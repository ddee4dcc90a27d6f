//! Quickserve: hot module replacement engine for an ES-module dev server
//!
//! Quickserve implements the decision core of a dev server's hot update
//! pipeline: given one changed file, it determines which already-loaded
//! modules can absorb the change in place, which must force a full page
//! reload, and emits the minimal ordered set of update notifications to
//! connected clients. A narrow incremental lexer extracts the literal
//! dependency list of a module's hot-accept declaration without a full
//! parse.
//!
//! Graph maintenance, file watching, source transforms, and the client
//! runtime are external collaborators: the engine reads the module graph,
//! stamps timestamps, clears cached transforms, and pushes payloads
//! through a [`transport::ClientTransport`].
//!
//! # Quick Start
//!
//! ```
//! use quickserve::graph::{ModuleId, ModuleKind};
//! use quickserve::hmr::{HmrEngine, ServerConfig};
//! use quickserve::transport::MemoryTransport;
//!
//! fn main() -> quickserve::Result<()> {
//!     let transport = MemoryTransport::new();
//!     let mut engine = HmrEngine::new(
//!         ServerConfig::new("/srv/app"),
//!         Box::new(transport.clone()),
//!     );
//!
//!     let node = engine.graph_mut().ensure_module(
//!         ModuleId::from("/app.js"),
//!         Some("/srv/app/app.js".into()),
//!         ModuleKind::Js,
//!     );
//!     node.is_self_accepting = true;
//!
//!     engine.handle_file_change("/srv/app/app.js".as_ref())?;
//!     println!("{:?}", transport.last());
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! | Category | Modules |
//! |----------|---------|
//! | **Core** | [`hmr`] (orchestrator, propagation, prune), [`graph`], [`error`](Error) |
//! | **Scanning** | [`lexer`] (accept dependency lists) |
//! | **Boundary** | [`plugins`] (hot-update hooks), [`transport`] (client payloads) |

pub mod graph;
pub mod hmr;
pub mod lexer;
pub mod plugins;
pub mod prelude;
pub mod transport;

mod error;

pub use error::{Error, Result, SourceLocation};
pub use hmr::{HmrEngine, ServerConfig};
pub use transport::HmrPayload;

/// Quickserve version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
