//! Shared Synpatico negotiation vocabulary: header and content-type
//! constants plus the transport-agnostic decision logic both
//! `synpatico-agent` and `synpatico-client` drive their HTTP-bound state
//! machines from.

pub mod error;
pub mod headers;
pub mod state;

pub use error::{ProtocolError, ProtocolResult};
pub use headers::{
    ACCEPT_ID_HEADER, AGENT_HEADER, HOP_BY_HOP_HEADERS, JSON_CONTENT_TYPE, PACKET_CONTENT_TYPE,
    STRUCTURE_ID_HEADER,
};
pub use state::{
    decode_request_body, encode_request_if_known, handle_agent_response, negotiate_response,
    NegotiationOutcome,
};
