//! Client transport and outbound HMR payloads
//!
//! Payloads are JSON on the wire. The transport itself is a collaborator
//! boundary: anything that can push a serialized message to connected
//! clients (a websocket fanout, a test recorder) implements
//! [`ClientTransport`]. Delivery semantics, reconnects, and timeouts all
//! live on the other side of that trait.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

use crate::error::Result;

/// One hot-update record inside an [`HmrPayload::Update`] message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    /// `"<kind>-update"`, e.g. `js-update` or `css-update`
    #[serde(rename = "type")]
    pub kind: String,
    /// Batch timestamp; clients use it to cache-bust re-imports
    pub timestamp: u64,
    /// URL of the boundary module whose update reaches the client
    pub path: String,
    /// URL of the dependency edge the update was absorbed through
    #[serde(rename = "acceptedPath")]
    pub accepted_path: String,
}

/// Outbound message to connected clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum HmrPayload {
    /// The page must reload; `path` narrows the reload to one document
    FullReload {
        #[serde(skip_serializing_if = "Option::is_none")]
        path: Option<String>,
    },
    /// Ordered hot-update records, one batch per file change
    Update { updates: Vec<Update> },
    /// Modules no longer reachable from the graph; clients drop them
    Prune { paths: Vec<String> },
}

impl HmrPayload {
    /// A `full-reload` without a path: reload whatever is open
    pub fn full_reload() -> Self {
        HmrPayload::FullReload { path: None }
    }

    /// A `full-reload` scoped to one document path
    pub fn full_reload_at(path: impl Into<String>) -> Self {
        HmrPayload::FullReload {
            path: Some(path.into()),
        }
    }
}

/// Persistent channel to connected clients
pub trait ClientTransport {
    /// Deliver one payload. Errors propagate to the orchestrator caller.
    fn send(&mut self, payload: &HmrPayload) -> Result<()>;
}

/// In-memory transport recording every payload it is handed.
///
/// Clones share the same buffer, so a host or test can keep one clone and
/// hand the other to the engine.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    sent: Rc<RefCell<Vec<HmrPayload>>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything sent so far
    pub fn sent(&self) -> Vec<HmrPayload> {
        self.sent.borrow().clone()
    }

    /// Drain the recorded payloads
    pub fn take(&self) -> Vec<HmrPayload> {
        std::mem::take(&mut *self.sent.borrow_mut())
    }

    /// The most recent payload, if any
    pub fn last(&self) -> Option<HmrPayload> {
        self.sent.borrow().last().cloned()
    }

    /// Number of payloads sent
    pub fn len(&self) -> usize {
        self.sent.borrow().len()
    }

    /// Whether nothing has been sent
    pub fn is_empty(&self) -> bool {
        self.sent.borrow().is_empty()
    }
}

impl ClientTransport for MemoryTransport {
    fn send(&mut self, payload: &HmrPayload) -> Result<()> {
        self.sent.borrow_mut().push(payload.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_reload_without_path_omits_field() {
        let payload = serde_json::to_value(HmrPayload::full_reload()).unwrap();
        assert_eq!(payload, json!({"type": "full-reload"}));
    }

    #[test]
    fn test_full_reload_with_path() {
        let payload = serde_json::to_value(HmrPayload::full_reload_at("/index.html")).unwrap();
        assert_eq!(payload, json!({"type": "full-reload", "path": "/index.html"}));
    }

    #[test]
    fn test_update_wire_shape() {
        let payload = HmrPayload::Update {
            updates: vec![Update {
                kind: "js-update".to_string(),
                timestamp: 1700000000123,
                path: "/app.js".to_string(),
                accepted_path: "/dep.js".to_string(),
            }],
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "type": "update",
                "updates": [{
                    "type": "js-update",
                    "timestamp": 1700000000123u64,
                    "path": "/app.js",
                    "acceptedPath": "/dep.js",
                }],
            })
        );
    }

    #[test]
    fn test_prune_wire_shape() {
        let payload = HmrPayload::Prune {
            paths: vec!["/gone.js".to_string()],
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"type": "prune", "paths": ["/gone.js"]})
        );
    }

    #[test]
    fn test_memory_transport_clones_share_buffer() {
        let recorder = MemoryTransport::new();
        let mut sender = recorder.clone();
        sender.send(&HmrPayload::full_reload()).unwrap();
        assert_eq!(recorder.len(), 1);
        assert_eq!(recorder.last(), Some(HmrPayload::full_reload()));
    }
}
