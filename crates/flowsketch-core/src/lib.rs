pub mod canvas;
pub mod geometry;
pub mod layout;
pub mod schema;
pub mod sync;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// --- Types (matching the generation schema contract) ---

/// A node as described by the generator. `id` may be empty when the
/// upstream entry had no usable id; such nodes are drawn but never
/// referenced by edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default, deserialize_with = "id_or_empty")]
    pub id: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub label: String,
}

impl Node {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// A directed edge between two node ids. The ids are references only and
/// are allowed to dangle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    #[serde(default, deserialize_with = "id_or_empty")]
    pub source: String,
    #[serde(default, deserialize_with = "id_or_empty")]
    pub target: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub label: String,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            label: String::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// The node/edge structure that fully determines a diagram's content.
///
/// Node order is the vertical stacking order; edge order is draw order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDescription {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl GraphDescription {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

// --- Lenient field readers ---

/// Accept strings and numbers as ids (generators often emit `"id": 1`),
/// anything else becomes an empty id.
fn id_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// Labels that are not strings are treated as absent.
fn string_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}
