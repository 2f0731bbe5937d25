//! Negotiation-layer error taxonomy: the failure modes of the HTTP-facing
//! handshake that aren't already owned by `synpatico-core`.

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Agent received an optimized request body whose `structureId` is
    /// absent from the shape cache. HTTP 409, not retried internally.
    #[error("state conflict: unknown structure id {0}")]
    StateConflict(String),

    /// Client received an optimized response whose `structureId` is not in
    /// its own shape cache.
    #[error("unknown structure id: {0}")]
    UnknownStructure(String),

    /// A packet's inner shape mismatch, surfaced from the core codec.
    #[error(transparent)]
    Shape(#[from] synpatico_core::CoreError),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
