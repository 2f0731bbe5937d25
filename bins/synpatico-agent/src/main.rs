//! `synpatico-agent`: binds the proxy's axum `Router` to a TCP listener.
//!
//! Owns no protocol logic of its own — argument parsing, logging setup,
//! and wiring are all this binary does; every structural decision lives in
//! `synpatico-core`/`synpatico-protocol`/`synpatico-agent` (the library).

mod config;

use anyhow::Result;
use clap::Parser;
use config::{Config, LogFormat};

use synpatico_agent::{build_router, AgentConfig, ProxyState};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    match config.log_format {
        LogFormat::Pretty => {
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .init();
        }
    }

    tracing::info!(upstream = %config.upstream_url, "starting synpatico-agent");
    tracing::info!(
        collision_mode = config.collision_mode,
        accept_optimized_requests = config.accept_optimized_requests,
        "negotiation settings"
    );

    let agent_config = AgentConfig::new(config.upstream_url.clone())
        .with_collision_mode(config.collision_mode)
        .with_accept_optimized_requests(config.accept_optimized_requests);

    let state = ProxyState::new(agent_config);
    let app = build_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app).await?;

    Ok(())
}
