//! Shared test helpers for integration tests

use std::path::PathBuf;

use quickserve::graph::{ModuleGraph, ModuleId, ModuleKind, TransformResult};
use quickserve::hmr::{HmrEngine, ServerConfig};
use quickserve::transport::MemoryTransport;

/// Project root used by every integration scenario
pub const ROOT: &str = "/srv/app";

/// Engine rooted at [`ROOT`] with a recording transport and a config file
/// registered at `<ROOT>/quickserve.config.js`
pub fn engine() -> (HmrEngine, MemoryTransport) {
    let transport = MemoryTransport::new();
    let config =
        ServerConfig::new(ROOT).with_config_file(format!("{ROOT}/quickserve.config.js"));
    let engine = HmrEngine::new(config, Box::new(transport.clone()));
    (engine, transport)
}

/// Register a script module whose backing file mirrors its URL under ROOT.
/// Query-suffixed URLs map back to the same file, like the resolver does.
pub fn add_module(graph: &mut ModuleGraph, url: &str) -> ModuleId {
    let id = ModuleId::from(url);
    let path = url.split('?').next().unwrap_or(url);
    graph.ensure_module(id.clone(), Some(file_of(path)), ModuleKind::Js);
    graph.set_transform_result(&id, TransformResult::new("/* compiled */"));
    id
}

/// Absolute backing file for a root-relative URL
pub fn file_of(url: &str) -> PathBuf {
    PathBuf::from(format!("{ROOT}{url}"))
}
