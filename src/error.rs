//! Agent-level error taxonomy. Composes the library errors from
//! `synpatico-core` and `synpatico-protocol` via `#[from]`; handlers convert
//! the final result to `anyhow::Result` at the HTTP boundary, keeping typed
//! errors in the libraries and `anyhow` at the binary's edges.

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error(transparent)]
    Protocol(#[from] synpatico_protocol::ProtocolError),

    #[error(transparent)]
    Core(#[from] synpatico_core::CoreError),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
}

pub type AgentResult<T> = Result<T, AgentError>;
