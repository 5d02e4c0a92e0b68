//! Backend access: the tree fetch and order persistence.

pub mod http;
pub mod writer;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::tree::Node;

/// Path of the tree endpoint, relative to the backend base URL.
pub const TREE_ENDPOINT: &str = "/api/editor/tree";
/// Path of the order endpoint, relative to the backend base URL.
pub const ORDER_ENDPOINT: &str = "/api/editor/tree/order";

/// Body of an order write: the full child-name sequence of one parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub parent_path: String,
    pub order: Vec<String>,
}

/// Storage the tree view talks to.
#[async_trait]
pub trait TreeBackend: Send + Sync {
    /// Fetch the whole tree.
    async fn fetch_tree(&self) -> Result<Node>;

    /// Persist the child order of one parent.
    async fn save_order(&self, request: &OrderRequest) -> Result<()>;
}

/// The editor backend wraps payloads as `{ success, data, error }`.
#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

fn envelope_error(error: Option<String>) -> AppError {
    AppError::Backend(error.unwrap_or_else(|| "request failed".to_string()))
}

/// Parse a tree response: either the envelope with `data.tree` or a bare node.
pub fn parse_tree_response(body: &str) -> Result<Node> {
    let value: Value = serde_json::from_str(body)?;

    if value.get("success").is_some() {
        let envelope: Envelope = serde_json::from_value(value)?;
        if !envelope.success {
            return Err(envelope_error(envelope.error));
        }
        let tree = envelope
            .data
            .as_ref()
            .and_then(|d| d.get("tree"))
            .ok_or_else(|| AppError::Backend("response has no tree".to_string()))?;
        return Ok(Node::from_json(tree));
    }

    Ok(Node::from_json(&value))
}

/// Interpret an order-write response body. Only an explicit
/// `success: false` counts as a failure; anything else is accepted.
pub fn parse_ack(body: &str) -> Result<()> {
    match serde_json::from_str::<Envelope>(body) {
        Ok(envelope) if !envelope.success => Err(envelope_error(envelope.error)),
        _ => Ok(()),
    }
}
