//! The agent's request pipeline: `RECV` → `DECODE_REQ?` → `FETCH` → `LEARN`
//! → `ENCODE?` → `EMIT`, framework-agnostic so `http.rs` only has to
//! translate to and from axum's request/response types.

use std::sync::Arc;

use axum::http::{HeaderMap, Method, StatusCode};

use synpatico_core::{Engine, Packet, StructureId};
use synpatico_protocol::{
    decode_request_body, handle_agent_response, headers, negotiate_response, NegotiationOutcome,
    ProtocolError,
};

use crate::config::AgentConfig;
use crate::error::{AgentError, AgentResult};

/// Shared proxy state. Cheap to clone: both fields are reference-counted.
#[derive(Clone)]
pub struct ProxyState {
    pub config: Arc<AgentConfig>,
    pub engine: Arc<Engine>,
    http: reqwest::Client,
}

impl ProxyState {
    pub fn new(config: AgentConfig) -> Self {
        let engine = Engine::new(config.collision_mode);
        Self {
            config: Arc::new(config),
            engine: Arc::new(engine),
            http: reqwest::Client::new(),
        }
    }
}

pub struct ProxyRequest {
    pub method: Method,
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// What `http.rs` should write back to the client.
pub struct ProxyResponse {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub structure_id: Option<StructureId>,
    pub body: Vec<u8>,
}

fn is_hop_by_hop(name: &str) -> bool {
    headers::HOP_BY_HOP_HEADERS
        .iter()
        .any(|h| h.eq_ignore_ascii_case(name))
}

fn is_synpatico_header(name: &str) -> bool {
    name.eq_ignore_ascii_case(headers::ACCEPT_ID_HEADER)
        || name.eq_ignore_ascii_case(headers::STRUCTURE_ID_HEADER)
        || name.eq_ignore_ascii_case(headers::AGENT_HEADER)
}

fn accept_id_from(request_headers: &HeaderMap) -> Option<StructureId> {
    request_headers
        .get(headers::ACCEPT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| StructureId(s.to_string()))
}

/// Runs one request through the full state machine. Returns `Ok(None)` for
/// the `409` conflict case so the caller can respond without treating it
/// as an internal error.
pub async fn handle(state: &ProxyState, req: ProxyRequest) -> AgentResult<Option<ProxyResponse>> {
    let forwarded_body = match decode_request_if_needed(state, &req)? {
        DecodedRequest::Conflict => return Ok(None),
        DecodedRequest::Body(bytes) => bytes,
    };

    let accept_id = accept_id_from(&req.headers);

    let url = format!("{}{}", state.config.upstream_base_url, req.path_and_query);
    let mut upstream_req = state.http.request(req.method.clone(), &url);
    for (name, value) in req.headers.iter() {
        let name_str = name.as_str();
        if is_hop_by_hop(name_str) || is_synpatico_header(name_str) {
            continue;
        }
        if let Ok(value_str) = value.to_str() {
            upstream_req = upstream_req.header(name_str, value_str);
        }
    }
    let upstream_resp = upstream_req.body(forwarded_body).send().await?;
    let upstream_status = StatusCode::from_u16(upstream_resp.status().as_u16())
        .unwrap_or(StatusCode::BAD_GATEWAY);
    let raw_body = upstream_resp.bytes().await?;

    tracing::debug!(bytes = raw_body.len(), "RECV upstream response");

    let Ok(upstream_json) = serde_json::from_slice::<serde_json::Value>(&raw_body) else {
        return Ok(Some(ProxyResponse {
            status: upstream_status,
            content_type: headers::JSON_CONTENT_TYPE,
            structure_id: None,
            body: raw_body.to_vec(),
        }));
    };

    let outcome = negotiate_response(&state.engine, accept_id.as_ref(), &upstream_json);

    match outcome {
        NegotiationOutcome::Packet(packet) => {
            tracing::debug!(structure_id = %packet.structure_id, "EMIT packet");
            let id = packet.structure_id.clone();
            let body = serde_json::to_vec(&packet).unwrap_or_default();
            Ok(Some(ProxyResponse {
                status: upstream_status,
                content_type: headers::PACKET_CONTENT_TYPE,
                structure_id: Some(id),
                body,
            }))
        }
        NegotiationOutcome::Json(json) => {
            tracing::debug!("EMIT json");
            Ok(Some(ProxyResponse {
                status: upstream_status,
                content_type: headers::JSON_CONTENT_TYPE,
                structure_id: None,
                body: serde_json::to_vec(&json).unwrap_or_default(),
            }))
        }
    }
}

enum DecodedRequest {
    Body(Vec<u8>),
    Conflict,
}

fn decode_request_if_needed(
    state: &ProxyState,
    req: &ProxyRequest,
) -> AgentResult<DecodedRequest> {
    if !state.config.accept_optimized_requests {
        return Ok(DecodedRequest::Body(req.body.clone()));
    }
    let is_packet_body = req
        .headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with(headers::PACKET_CONTENT_TYPE));
    if !is_packet_body {
        return Ok(DecodedRequest::Body(req.body.clone()));
    }

    let Ok(packet) = serde_json::from_slice::<Packet>(&req.body) else {
        return Ok(DecodedRequest::Conflict);
    };

    match decode_request_body(&state.engine, &packet) {
        Ok(json) => Ok(DecodedRequest::Body(
            serde_json::to_vec(&json).unwrap_or_default(),
        )),
        Err(ProtocolError::StateConflict(_)) => Ok(DecodedRequest::Conflict),
        Err(other) => Err(AgentError::from(other)),
    }
}

/// Used by the stats endpoint, and available to a sibling client
/// implementation that wants to decode an agent-produced response without
/// going through the HTTP layer at all (e.g. in tests).
pub fn decode_response(
    engine: &Engine,
    content_type: &str,
    body: &serde_json::Value,
) -> AgentResult<serde_json::Value> {
    Ok(handle_agent_response(engine, content_type, body)?)
}
