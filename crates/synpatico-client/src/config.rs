//! Client-side configuration. Mirrors `synpatico_agent::AgentConfig`'s shape
//! (an explicit struct the caller builds and owns, no implicit environment
//! reads), since the client library may be embedded in a long-lived host
//! process that already owns its own config story.

/// Runtime configuration for a [`crate::SynpaticoClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// The documented-but-optional two-way path: offer a values-only
    /// packet for the outgoing request body when the client already knows
    /// the agent has agreed on that body's shape. Off by default.
    pub offer_request_optimization: bool,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self {
            offer_request_optimization: false,
        }
    }

    pub fn with_request_optimization(mut self, enabled: bool) -> Self {
        self.offer_request_optimization = enabled;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}
