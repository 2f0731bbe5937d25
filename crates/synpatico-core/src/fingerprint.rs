//! The structural fingerprinter — the hard part of this protocol. Maps any
//! value to a [`StructureId`], deterministically and statelessly, so two
//! peers that have never communicated derive the same id from the same
//! structure.
//!
//! Fingerprinting is defined over [`Graph`], an arena of [`Node`]s addressed
//! by [`NodeId`], rather than directly over [`Value`]. `Value` trees built
//! in this workspace are always acyclic — but cycle-safety is required as a
//! first-class guarantee for values built elsewhere, and a plain owned
//! Rust enum has no notion of object identity to hang that on. An arena
//! gives composite nodes identity for free (their `NodeId`), the standard
//! way to get object identity in a language without aliasing on owned data:
//! the cycle check becomes an index comparison, not pointer magic.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use synpatico_hash::key_bit;

use crate::value::{LeafKind, Value};

/// Index into [`Graph::nodes`]. Doubles as the cycle-detection identity.
pub type NodeId = usize;

/// A graph node. Composite nodes (`Object`/`Array`) reference children by
/// [`NodeId`]; a child id may point at an ancestor, producing a genuine
/// cycle — [`fingerprint`] is defined to handle that without recursing
/// forever.
#[derive(Debug, Clone)]
pub enum Node {
    Leaf(LeafKind),
    Array(Vec<NodeId>),
    /// Key order does not matter; [`fingerprint`] always re-sorts.
    Object(Vec<(String, NodeId)>),
}

/// Arena of nodes plus their kinds, built once per fingerprint call.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
}

impl Graph {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Builds an acyclic graph mirroring `value`, returning the graph and
    /// the root's [`NodeId`].
    pub fn from_value(value: &Value) -> (Graph, NodeId) {
        let mut graph = Graph::new();
        let root = Self::push_value(&mut graph, value);
        (graph, root)
    }

    fn push_value(graph: &mut Graph, value: &Value) -> NodeId {
        match value {
            Value::Array(items) => {
                let ids: Vec<NodeId> = items.iter().map(|v| Self::push_value(graph, v)).collect();
                graph.push(Node::Array(ids))
            }
            Value::Object(fields) => {
                let ids: Vec<(String, NodeId)> = fields
                    .iter()
                    .map(|(k, v)| (k.clone(), Self::push_value(graph, v)))
                    .collect();
                graph.push(Node::Object(ids))
            }
            other => graph.push(Node::Leaf(
                other
                    .leaf_kind()
                    .expect("Array/Object handled above; every other Value has a leaf kind"),
            )),
        }
    }
}

/// Deterministic type bits, one per value kind. Fixed across the lifetime
/// of the protocol — changing these would change every previously-agreed
/// `StructureId`.
mod type_bits {
    pub const NULL: u64 = 0x0000_0001;
    pub const UNDEFINED: u64 = 0x0000_0002;
    pub const BOOL: u64 = 0x0000_0004;
    pub const NUMBER: u64 = 0x0000_0008;
    pub const STRING: u64 = 0x0000_0010;
    pub const BIGINT: u64 = 0x0000_0020;
    pub const SYMBOL: u64 = 0x0000_0040;
    pub const SPECIAL_VALUE: u64 = 0x0000_0080;
    pub const OBJECT: u64 = 0x0000_0100;
    pub const ARRAY: u64 = 0x0000_0200;
}

fn leaf_type_bit(kind: LeafKind) -> u64 {
    match kind {
        LeafKind::Null => type_bits::NULL,
        LeafKind::Undefined => type_bits::UNDEFINED,
        LeafKind::Bool => type_bits::BOOL,
        LeafKind::Number => type_bits::NUMBER,
        LeafKind::String => type_bits::STRING,
        LeafKind::Bigint => type_bits::BIGINT,
        LeafKind::Symbol => type_bits::SYMBOL,
        LeafKind::SpecialValue => type_bits::SPECIAL_VALUE,
    }
}

fn node_type_bit(node: &Node) -> u64 {
    match node {
        Node::Leaf(kind) => leaf_type_bit(*kind),
        Node::Array(_) => type_bits::ARRAY,
        Node::Object(_) => type_bits::OBJECT,
    }
}

/// Reserved sigil separating array positional key-bits from object keys
/// that happen to be literally named `"[i]"`, so the two namespaces can
/// never collide.
const ARRAY_INDEX_SIGIL: &str = "\u{0}[i]";

/// Deterministic string identifier of a value's structural shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructureId(pub String);

impl fmt::Display for StructureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl StructureId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Shared, monotonic collision counter. Keyed by the L1+ structural
/// signature; only grows.
#[derive(Debug, Default)]
pub struct CollisionCounter(RwLock<HashMap<String, u64>>);

impl CollisionCounter {
    pub fn new() -> Self {
        Self(RwLock::new(HashMap::new()))
    }

    /// Returns the counter's current value for `signature` and increments
    /// it — the read-then-increment collision mode relies on.
    fn take_and_increment(&self, signature: &str) -> u64 {
        let mut map = self.0.write().expect("collision counter lock poisoned");
        let entry = map.entry(signature.to_string()).or_insert(0);
        let value = *entry;
        *entry += 1;
        value
    }
}

/// Result of fingerprinting a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintResult {
    pub id: StructureId,
    pub levels: usize,
    pub collision_count: u64,
}

/// Fingerprints `value`, ignoring the optional collision-id mode. This is
/// the common path and is a pure function of `value`'s structure: the
/// same structure always yields the same id, on any machine, in any
/// process.
pub fn fingerprint_value(value: &Value) -> FingerprintResult {
    let (graph, root) = Graph::from_value(value);
    fingerprint(&graph, root, None)
}

/// Fingerprints the graph rooted at `root`. When `collisions` is `Some`,
/// `H[0]` is replaced by the shared counter's current value for this
/// structure's signature and the counter is incremented — an opt-in
/// `newIdOnCollision` mode, and the only point at which fingerprinting has
/// a side effect.
pub fn fingerprint(
    graph: &Graph,
    root: NodeId,
    collisions: Option<&CollisionCounter>,
) -> FingerprintResult {
    match graph.node(root) {
        Node::Object(fields) if fields.is_empty() => {
            return FingerprintResult {
                id: StructureId("{}".to_string()),
                levels: 1,
                collision_count: 0,
            };
        }
        Node::Array(items) if items.is_empty() => {
            return FingerprintResult {
                id: StructureId("[]".to_string()),
                levels: 1,
                collision_count: 0,
            };
        }
        Node::Leaf(kind) => {
            let t = synpatico_hash::to_hex(leaf_type_bit(*kind) as u32);
            return FingerprintResult {
                id: StructureId(format!("L0:{t}-L1:{t}")),
                levels: 2,
                collision_count: 0,
            };
        }
        _ => {}
    }

    let mut levels: Vec<u64> = Vec::new();
    let mut visited: HashMap<NodeId, String> = HashMap::new();
    let mut max_depth = 0usize;

    process(graph, root, 0, &[], &mut levels, &mut visited, &mut max_depth);

    let h0 = levels[0];
    let signature = (1..=max_depth)
        .map(|d| format!("L{d}:{}", synpatico_hash::to_hex(level_hash(&levels, d))))
        .collect::<Vec<_>>()
        .join("-");

    let (final_h0, collision_count) = match collisions {
        Some(counter) => {
            let count = counter.take_and_increment(&signature);
            (count, count)
        }
        None => (h0, 0),
    };

    let h0_hex = synpatico_hash::to_hex(truncate_to_u32(final_h0));
    let id = if signature.is_empty() {
        format!("L0:{h0_hex}")
    } else {
        format!("L0:{h0_hex}-{signature}")
    };

    FingerprintResult {
        id: StructureId(id),
        levels: max_depth + 1,
        collision_count,
    }
}

fn level_hash(levels: &[u64], depth: usize) -> u32 {
    truncate_to_u32(levels.get(depth).copied().unwrap_or(0))
}

fn truncate_to_u32(value: u64) -> u32 {
    (value & 0xFFFF_FFFF) as u32
}

fn ensure_depth(levels: &mut Vec<u64>, depth: usize) {
    if depth >= levels.len() {
        let start = levels.len();
        levels.resize(depth + 1, 0);
        for (d, slot) in levels.iter_mut().enumerate().skip(start) {
            *slot = 1u64.checked_shl(d as u32).unwrap_or(0);
        }
    }
}

fn path_signature(path: &[String], node: &Node) -> String {
    let descriptor = match node {
        Node::Object(fields) => {
            let mut keys: Vec<&str> = fields.iter().map(|(k, _)| k.as_str()).collect();
            keys.sort_unstable();
            keys.join(",")
        }
        Node::Array(items) => format!("len:{}", items.len()),
        Node::Leaf(_) => String::new(),
    };
    format!("{}.{descriptor}", path.join("."))
}

#[allow(clippy::too_many_arguments)]
fn process(
    graph: &Graph,
    node_id: NodeId,
    depth: usize,
    path: &[String],
    levels: &mut Vec<u64>,
    visited: &mut HashMap<NodeId, String>,
    max_depth: &mut usize,
) {
    ensure_depth(levels, depth);
    *max_depth = (*max_depth).max(depth);

    match graph.node(node_id) {
        Node::Object(fields) => {
            levels[depth] = levels[depth].wrapping_add(type_bits::OBJECT);

            let mut sorted: Vec<&(String, NodeId)> = fields.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(&b.0));

            for (i, (key, child_id)) in sorted.into_iter().enumerate() {
                let m = (i as u64) + 1;
                let child_kind_bit = node_type_bit(graph.node(*child_id));
                levels[depth] = levels[depth]
                    .wrapping_add(key_bit(key) as u64 * m)
                    .wrapping_add(child_kind_bit * m);

                visit_child(graph, *child_id, depth, path, key.clone(), levels, visited, max_depth);
            }
        }
        Node::Array(items) => {
            levels[depth] = levels[depth].wrapping_add(type_bits::ARRAY);
            levels[depth] =
                levels[depth].wrapping_add(key_bit(&format!("length:{}", items.len())) as u64);

            for (i, child_id) in items.iter().enumerate() {
                let m = (i as u64) + 1;
                let child_kind_bit = node_type_bit(graph.node(*child_id));
                levels[depth] = levels[depth]
                    .wrapping_add(key_bit(ARRAY_INDEX_SIGIL) as u64 * m)
                    .wrapping_add(child_kind_bit * m);

                visit_child(
                    graph,
                    *child_id,
                    depth,
                    path,
                    ARRAY_INDEX_SIGIL.to_string(),
                    levels,
                    visited,
                    max_depth,
                );
            }
        }
        Node::Leaf(_) => {}
    }
}

#[allow(clippy::too_many_arguments)]
fn visit_child(
    graph: &Graph,
    child_id: NodeId,
    depth: usize,
    path: &[String],
    path_segment: String,
    levels: &mut Vec<u64>,
    visited: &mut HashMap<NodeId, String>,
    max_depth: &mut usize,
) {
    let child = graph.node(child_id);
    if matches!(child, Node::Leaf(_)) {
        return;
    }

    if let Some(sig) = visited.get(&child_id) {
        levels[depth] = levels[depth]
            .wrapping_add(key_bit(&format!("circular:{sig}")) as u64);
        return;
    }

    let mut child_path = path.to_vec();
    child_path.push(path_segment);
    visited.insert(child_id, path_signature(&child_path, child));

    process(graph, child_id, depth + 1, &child_path, levels, visited, max_depth);
}
