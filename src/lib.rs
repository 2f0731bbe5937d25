//! A transparent, structure-aware proxy that sits in front of a JSON-over-
//! HTTP API and, once it has seen a response shape often enough for a
//! client to have learned it too, starts shipping a values-only packet
//! instead of the repeated field names. See `synpatico-core` for the
//! fingerprinting and codec this is built on, and `synpatico-protocol` for
//! the header/content-type negotiation both this crate and `synpatico-client`
//! share.

pub mod config;
pub mod error;
pub mod http;
pub mod proxy;

pub use config::AgentConfig;
pub use error::{AgentError, AgentResult};
pub use http::build_router;
pub use proxy::ProxyState;
