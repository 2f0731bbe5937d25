//! Library-level configuration. `synpatico-agent` itself reads no
//! environment directly — the binary crate owns CLI/env parsing and builds
//! one of these, keeping the library an explicit struct independent of any
//! particular config-loading story.

/// Runtime configuration for a single proxied upstream.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Base URL the agent forwards requests to (scheme + host + optional port).
    pub upstream_base_url: String,

    /// `newIdOnCollision`: reassign a fresh id on hash collision instead
    /// of silently aliasing two distinct shapes. Off by default.
    pub collision_mode: bool,

    /// The documented-but-optional two-way path: decode optimized request
    /// bodies. Off by default — most APIs only need response-direction
    /// optimization.
    pub accept_optimized_requests: bool,
}

impl AgentConfig {
    pub fn new(upstream_base_url: impl Into<String>) -> Self {
        Self {
            upstream_base_url: upstream_base_url.into(),
            collision_mode: false,
            accept_optimized_requests: false,
        }
    }

    pub fn with_collision_mode(mut self, enabled: bool) -> Self {
        self.collision_mode = enabled;
        self
    }

    pub fn with_accept_optimized_requests(mut self, enabled: bool) -> Self {
        self.accept_optimized_requests = enabled;
        self
    }
}
