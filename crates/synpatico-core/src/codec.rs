//! The encoder/decoder. Composes the shape extractor, rich-type envelope,
//! and linearizer into the `Packet` ↔ `Value` round trip.

use serde::{Deserialize, Serialize};

use crate::engine::StructureDefinition;
use crate::envelope;
use crate::error::CoreResult;
use crate::fingerprint::StructureId;
use crate::linearize::{linearize, reconstruct};
use crate::value::Value;

/// Wire form of a values-only packet. Unknown fields are
/// ignored by readers — `serde(default)` on `metadata` and `#[serde(flatten)]`-free
/// struct fields give us that for free via `serde_json`'s default
/// deny-unknown-fields-off behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Packet {
    #[serde(rename = "type")]
    pub packet_type: String,
    #[serde(rename = "structureId")]
    pub structure_id: StructureId,
    pub values: Vec<serde_json::Value>,
    pub metadata: PacketMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PacketMetadata {
    #[serde(rename = "collisionCount")]
    pub collision_count: u64,
    pub levels: usize,
}

pub const PACKET_TYPE: &str = "values-only";

/// Encodes `value` as a values-only packet against the already-negotiated
/// `known_id`. The caller supplies `known_id` (rather than recomputing it
/// here) because by the time this runs the agent has already verified
/// upstream's fresh fingerprint matches it.
pub fn encode(
    value: &Value,
    known_id: StructureId,
    levels: usize,
    collision_count: u64,
) -> Packet {
    let wrapped: Vec<serde_json::Value> =
        linearize(value).iter().map(envelope::to_json).collect();

    Packet {
        packet_type: PACKET_TYPE.to_string(),
        structure_id: known_id,
        values: wrapped,
        metadata: PacketMetadata {
            collision_count,
            levels,
        },
    }
}

/// Decodes `packet` against `definition.shape`, reconstructing the
/// original value and unwrapping rich-scalar envelopes.
pub fn decode(packet: &Packet, definition: &StructureDefinition) -> CoreResult<Value> {
    let values: Vec<Value> = packet.values.iter().map(envelope::from_json).collect();
    reconstruct(&values, &definition.shape)
}

/// Size-safety check: encodes `value` and returns the packet only if its
/// serialized form is strictly smaller than `original_json_len` bytes.
/// This is the one point where a byte-level comparison belongs in this
/// protocol — everywhere else the decision is structural.
pub fn encode_if_smaller(
    value: &Value,
    known_id: StructureId,
    levels: usize,
    collision_count: u64,
    original_json_len: usize,
) -> Option<Packet> {
    let packet = encode(value, known_id, levels, collision_count);
    let packet_len = serde_json::to_vec(&packet).map(|b| b.len()).unwrap_or(usize::MAX);
    (packet_len < original_json_len).then_some(packet)
}
