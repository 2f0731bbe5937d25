//! CLI configuration for the `synpatico-agent` binary.

use clap::{Parser, ValueEnum};

/// Transparent, structure-aware optimizing proxy for JSON-over-HTTP APIs.
///
/// Learns response shapes from normal JSON traffic and opportunistically
/// replaces repeated bodies with a values-only packet once the client has
/// signalled, via `X-Synpatico-Accept-ID`, that it already knows the shape.
#[derive(Parser, Debug)]
#[command(name = "synpatico-agent")]
#[command(about = "Structure-aware optimizing reverse proxy for JSON APIs", long_about = None)]
pub struct Config {
    /// Base URL of the upstream JSON API to forward requests to.
    #[arg(long, env = "SYNPATICO_UPSTREAM_URL")]
    pub upstream_url: String,

    /// Host to bind the proxy's listener to.
    #[arg(long, env = "SYNPATICO_BIND_HOST", default_value = "127.0.0.1")]
    pub bind_host: String,

    /// Port to bind the proxy's listener to.
    #[arg(long, env = "SYNPATICO_BIND_PORT", default_value = "4000")]
    pub bind_port: u16,

    /// Enable `newIdOnCollision` mode: reassign a fresh id on every call
    /// for a given structural signature instead of reusing the
    /// structure-derived one. Off by default.
    #[arg(long, env = "SYNPATICO_COLLISION_MODE")]
    pub collision_mode: bool,

    /// Accept and decode optimized request bodies (the optional two-way
    /// path). Off by default.
    #[arg(long, env = "SYNPATICO_ACCEPT_OPTIMIZED_REQUESTS")]
    pub accept_optimized_requests: bool,

    /// Log output format.
    #[arg(long, env = "SYNPATICO_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.bind_port)
    }
}
