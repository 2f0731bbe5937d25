//! Client-side error taxonomy. Composes `synpatico-protocol`/`synpatico-core`
//! errors via `#[from]`, the same split `synpatico_agent::AgentError` draws
//! at the opposite end of the wire.

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Protocol(#[from] synpatico_protocol::ProtocolError),

    #[error(transparent)]
    Core(#[from] synpatico_core::CoreError),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("response body was not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;
