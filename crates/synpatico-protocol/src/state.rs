//! The pure decision logic behind the agent's and client's negotiation
//! state machines, factored out from any HTTP framework so it can be
//! unit-tested without a server. `synpatico-agent` and `synpatico-client`
//! each supply the transport (axum / reqwest) and call straight into these
//! functions at the receive/learn/encode and client-side decode points.

use serde_json::Value as Json;

use synpatico_core::{encode_if_smaller, envelope, Engine, Packet, StructureId};

use crate::error::{ProtocolError, ProtocolResult};

/// What the agent should send back to the client for a given upstream
/// response, after learning its shape and deciding whether it still
/// matches what the client offered to accept.
#[derive(Debug, Clone)]
pub enum NegotiationOutcome {
    /// Optimized: send `packet` with `Content-Type: application/synpatico-packet+json`.
    Packet(Packet),
    /// Standard: send `body` with `Content-Type: application/json`.
    Json(Json),
}

/// Learns the shape of one upstream response, then decides whether to
/// encode it as a packet.
///
/// - Learns the shape only if `upstream_body` is a JSON object — not a
///   bare array or scalar.
/// - Builds a packet only if the client offered `accept_id`, the fresh
///   fingerprint still matches it (no drift), and the packet is strictly
///   smaller than the original body.
/// - Otherwise forwards the upstream body unchanged — covers cache miss,
///   drift, and non-object bodies uniformly.
pub fn negotiate_response(
    engine: &Engine,
    accept_id: Option<&StructureId>,
    upstream_body: &Json,
) -> NegotiationOutcome {
    if !upstream_body.is_object() {
        return NegotiationOutcome::Json(upstream_body.clone());
    }

    let value = envelope::from_json(upstream_body);
    let Ok(fp) = engine.learn(&value) else {
        return NegotiationOutcome::Json(upstream_body.clone());
    };

    let Some(accept_id) = accept_id else {
        return NegotiationOutcome::Json(upstream_body.clone());
    };

    if fp.id != *accept_id {
        return NegotiationOutcome::Json(upstream_body.clone());
    }

    let original_len = serde_json::to_vec(upstream_body).map(|b| b.len()).unwrap_or(usize::MAX);
    match encode_if_smaller(&value, fp.id, fp.levels, fp.collision_count, original_len) {
        Some(packet) => NegotiationOutcome::Packet(packet),
        None => NegotiationOutcome::Json(upstream_body.clone()),
    }
}

/// Client-side counterpart to [`negotiate_response`], for the optional
/// two-way (request-body) optimization path: encodes `body` as a packet
/// only if `engine` already has a `StructureDefinition` for its
/// fingerprint — i.e. the agent has previously agreed on this exact shape,
/// so it is safe to assume it can decode the packet back on receipt.
/// Returns `None` for any non-object body, an unrecognized shape, or a
/// packet that would not be smaller than the plain JSON encoding.
pub fn encode_request_if_known(engine: &Engine, body: &Json) -> Option<Packet> {
    if !body.is_object() {
        return None;
    }
    let value = envelope::from_json(body);
    let fp = engine.fingerprint(&value);
    engine.shape(&fp.id)?;
    let original_len = serde_json::to_vec(body).map(|b| b.len()).unwrap_or(usize::MAX);
    encode_if_smaller(&value, fp.id, fp.levels, fp.collision_count, original_len)
}

/// Receive-side handling for the (optional, off-by-default) two-way
/// request-body path: an inbound request declared an optimized body.
/// Returns the decoded JSON, or `StateConflict` if the referenced
/// structure is unknown.
pub fn decode_request_body(engine: &Engine, packet: &Packet) -> ProtocolResult<Json> {
    let Some(definition) = engine.shape(&packet.structure_id) else {
        return Err(ProtocolError::StateConflict(packet.structure_id.to_string()));
    };
    let value = synpatico_core::decode(packet, &definition)?;
    Ok(envelope::to_json(&value))
}

/// Client-side handling of an agent response.
/// `content_type` is the response's raw header value; `body` is whatever
/// that content type implies — either a parsed `Packet` re-serialized to
/// `Json`, or a standard JSON body.
pub fn handle_agent_response(
    engine: &Engine,
    content_type: &str,
    body: &Json,
) -> ProtocolResult<Json> {
    if content_type.starts_with(crate::headers::PACKET_CONTENT_TYPE) {
        let packet: Packet = serde_json::from_value(body.clone())
            .map_err(|_| ProtocolError::UnknownStructure("malformed packet".to_string()))?;
        let Some(definition) = engine.shape(&packet.structure_id) else {
            return Err(ProtocolError::UnknownStructure(packet.structure_id.to_string()));
        };
        let value = synpatico_core::decode(&packet, &definition)?;
        Ok(envelope::to_json(&value))
    } else {
        if body.is_object() {
            let value = envelope::from_json(body);
            let _ = engine.learn(&value);
        }
        Ok(body.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cold_response_learns_and_forwards_json() {
        let engine = Engine::default();
        let body = json!({"id": 2, "email": "janet.weaver@reqres.in"});
        let outcome = negotiate_response(&engine, None, &body);
        assert!(matches!(outcome, NegotiationOutcome::Json(_)));
        assert_eq!(engine.shape_count(), 1);
    }

    fn user_list_body(n: usize) -> Json {
        let users: Vec<Json> = (0..n)
            .map(|i| {
                json!({
                    "id": i,
                    "email": format!("user{i}@reqres.in"),
                    "first_name": "Janet",
                    "last_name": "Weaver",
                    "avatar": format!("https://reqres.in/img/faces/{i}-image.jpg"),
                })
            })
            .collect();
        json!({"page": 1, "data": users})
    }

    #[test]
    fn warm_response_with_matching_id_yields_packet_when_smaller() {
        let engine = Engine::default();
        // A single flat object rarely wins: the structureId text plus
        // packet envelope outweighs not repeating five short keys once.
        // Repeated-shape array entries are where values-only packets pay
        // off, since the field names are transmitted zero times instead
        // of once per entry.
        let body = user_list_body(10);
        let fp = engine.learn(&envelope::from_json(&body)).unwrap();

        let outcome = negotiate_response(&engine, Some(&fp.id), &body);
        match outcome {
            NegotiationOutcome::Packet(packet) => assert_eq!(packet.structure_id, fp.id),
            NegotiationOutcome::Json(_) => panic!("expected packet for a repeated-shape list"),
        }
    }

    #[test]
    fn drifted_structure_falls_back_to_json() {
        let engine = Engine::default();
        let r0 = json!({"id": 2, "email": "janet.weaver@reqres.in"});
        let fp0 = engine.learn(&envelope::from_json(&r0)).unwrap();

        let r1 = json!({"id": 2, "email": "janet.weaver@reqres.in", "extra": true});
        let outcome = negotiate_response(&engine, Some(&fp0.id), &r1);
        assert!(matches!(outcome, NegotiationOutcome::Json(ref v) if *v == r1));
    }

    #[test]
    fn conflict_on_unknown_request_structure() {
        let engine = Engine::default();
        let packet = Packet {
            packet_type: "values-only".to_string(),
            structure_id: StructureId("L0:deadbeef".to_string()),
            values: vec![],
            metadata: synpatico_core::PacketMetadata::default(),
        };
        let err = decode_request_body(&engine, &packet).unwrap_err();
        assert!(matches!(err, ProtocolError::StateConflict(_)));
    }

    #[test]
    fn request_body_is_not_encoded_until_the_shape_is_already_known() {
        let engine = Engine::default();
        let body = user_list_body(10);
        assert!(encode_request_if_known(&engine, &body).is_none());

        engine.learn(&envelope::from_json(&body)).unwrap();
        assert!(encode_request_if_known(&engine, &body).is_some());
    }

    #[test]
    fn request_body_encoding_ignores_non_object_bodies() {
        let engine = Engine::default();
        assert!(encode_request_if_known(&engine, &json!([1, 2, 3])).is_none());
    }
}
