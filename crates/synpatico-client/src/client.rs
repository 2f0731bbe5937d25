//! The client half of the negotiation protocol: a `reqwest`-based wrapper
//! that drives the client state machine around whatever request the
//! caller wants to make, the way `synpatico_agent::proxy` drives the agent
//! half around whatever request it forwards upstream.

use std::sync::Arc;

use reqwest::{Method, StatusCode, Url};
use serde_json::Value as Json;

use synpatico_core::{envelope, Engine};
use synpatico_protocol::{encode_request_if_known, handle_agent_response, headers};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::state::{endpoint_key, origin_of, OriginCapabilities};

/// A Synpatico-aware HTTP client. Cheap to clone: every field is either
/// reference-counted or `Copy`.
#[derive(Clone)]
pub struct SynpaticoClient {
    http: reqwest::Client,
    engine: Arc<Engine>,
    origins: Arc<OriginCapabilities>,
    config: Arc<ClientConfig>,
}

impl SynpaticoClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            engine: Arc::new(Engine::default()),
            origins: Arc::new(OriginCapabilities::new()),
            config: Arc::new(config),
        }
    }

    /// Read-only access to the structure cache, e.g. for a host application
    /// wanting to log how many shapes this client has learned. Callers must
    /// never mutate cache entries directly — there is no setter here, only
    /// [`SynpaticoClient::clear_cache`].
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Drops every learned shape, endpoint binding, and origin capability
    /// flag.
    pub fn clear_cache(&self) {
        self.engine.reset();
        self.origins.clear();
    }

    pub async fn get_json(&self, url: &str) -> ClientResult<Json> {
        self.request(Method::GET, url, None).await
    }

    pub async fn post_json(&self, url: &str, body: Json) -> ClientResult<Json> {
        self.request(Method::POST, url, Some(body)).await
    }

    /// Runs one request through the full client state machine: offer a
    /// negotiation header when the origin is known-capable and the
    /// endpoint's structure is known; retry once without it on `409`;
    /// decode a returned packet against the cached shape; learn from a
    /// plain JSON response that carries the capability header.
    pub async fn request(&self, method: Method, url: &str, body: Option<Json>) -> ClientResult<Json> {
        let parsed = Url::parse(url)?;
        let origin = origin_of(&parsed);
        let endpoint = endpoint_key(&method, &parsed);

        let accept_id = if self.origins.is_capable(&origin) {
            self.engine.endpoint_structure(&endpoint)
        } else {
            None
        };

        let response = self
            .send(method.clone(), &parsed, body.as_ref(), accept_id.as_ref())
            .await?;

        if response.status() == StatusCode::CONFLICT {
            tracing::warn!(%endpoint, "agent reported state conflict, retrying without negotiation");
            self.engine.forget_endpoint(&endpoint);
            let retry = self.send(method, &parsed, body.as_ref(), None).await?;
            let raw = retry.bytes().await?;
            return Ok(serde_json::from_slice(&raw)?);
        }

        let has_agent_header = response.headers().contains_key(headers::AGENT_HEADER);
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(headers::JSON_CONTENT_TYPE)
            .to_string();
        let raw = response.bytes().await?;
        let body_json: Json = serde_json::from_slice(&raw)?;

        if !has_agent_header {
            tracing::debug!(%endpoint, "origin not Synpatico-capable, passing through");
            return Ok(body_json);
        }
        self.origins.mark_capable(&origin);

        let decoded = handle_agent_response(&self.engine, &content_type, &body_json)?;

        // Re-derive the structure id to bind the endpoint for the next
        // request. `fingerprint` is a pure function of structure, so
        // re-running it over the value `handle_agent_response` just
        // reconstructed yields exactly the id it was decoded against
        // without needing that function to also expose it.
        if decoded.is_object() {
            let value = envelope::from_json(&decoded);
            let fp = self.engine.fingerprint(&value);
            self.engine.bind_endpoint(endpoint.clone(), fp.id);
        }

        Ok(decoded)
    }

    async fn send(
        &self,
        method: Method,
        url: &Url,
        body: Option<&Json>,
        accept_id: Option<&synpatico_core::StructureId>,
    ) -> ClientResult<reqwest::Response> {
        let mut req = self.http.request(method, url.clone());
        if let Some(id) = accept_id {
            req = req.header(headers::ACCEPT_ID_HEADER, id.as_str());
        }

        if let Some(body) = body {
            let packet = if self.config.offer_request_optimization {
                encode_request_if_known(&self.engine, body)
            } else {
                None
            };
            req = match packet {
                Some(packet) => req
                    .header(reqwest::header::CONTENT_TYPE, headers::PACKET_CONTENT_TYPE)
                    .json(&packet),
                None => req.json(body),
            };
        }

        Ok(req.send().await?)
    }
}
