//! Shared fixtures for the Synpatico workspace's test suites: an arbitrary
//! [`synpatico_core::Value`] generator for the quantified structural
//! invariants, and a tiny in-memory upstream used by the agent's
//! integration tests.

use axum::{extract::State, routing::get, Json, Router};
use proptest::prelude::*;
use std::sync::{Arc, Mutex};
use synpatico_core::{RichError, Value};

/// A `proptest` strategy producing arbitrary JSON-shaped [`Value`]s —
/// scalars, rich scalars, and nested arrays/objects — bounded in depth and
/// breadth so shrinking stays fast.
pub fn arbitrary_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| Value::Number(n.into())),
        "[a-zA-Z0-9]{0,12}".prop_map(Value::String),
        "[a-zA-Z0-9]{0,12}".prop_map(Value::Date),
    ];

    leaf.prop_recursive(4, 64, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec(("[a-z]{1,8}", inner.clone()), 0..6)
                .prop_map(|fields| Value::Object(dedup_keys(fields))),
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Set),
            prop::collection::vec((inner.clone(), inner.clone()), 0..4).prop_map(Value::Map),
            ("[a-zA-Z0-9 ]{0,24}", "[A-Za-z]{1,12}").prop_map(|(message, name)| {
                Value::Error(RichError {
                    message,
                    name,
                    stack: None,
                })
            }),
        ]
    })
}

fn dedup_keys(fields: Vec<(String, Value)>) -> Vec<(String, Value)> {
    let mut seen = std::collections::HashSet::new();
    fields
        .into_iter()
        .filter(|(k, _)| seen.insert(k.clone()))
        .collect()
}

/// State for [`upstream_router`]: the next response body to serve, and a
/// hit counter so integration tests can assert on request order.
#[derive(Clone)]
pub struct UpstreamState {
    inner: Arc<Mutex<UpstreamInner>>,
}

struct UpstreamInner {
    body: serde_json::Value,
    hits: u64,
}

impl UpstreamState {
    pub fn new(body: serde_json::Value) -> Self {
        Self {
            inner: Arc::new(Mutex::new(UpstreamInner { body, hits: 0 })),
        }
    }

    /// Swaps the body the next request will receive — used to simulate
    /// structural drift between consecutive responses from the same
    /// endpoint.
    pub fn set_body(&self, body: serde_json::Value) {
        self.inner.lock().expect("upstream lock poisoned").body = body;
    }

    pub fn hits(&self) -> u64 {
        self.inner.lock().expect("upstream lock poisoned").hits
    }
}

async fn respond(State(state): State<UpstreamState>) -> Json<serde_json::Value> {
    let mut inner = state.inner.lock().expect("upstream lock poisoned");
    inner.hits += 1;
    Json(inner.body.clone())
}

/// A minimal in-memory upstream JSON API: `GET /resource` returns whatever
/// body [`UpstreamState`] currently holds. Stands in for the "upstream"
/// leg of the agent's `FETCH` step in integration tests, the same role
/// `wiremock` would play for an out-of-process upstream.
pub fn upstream_router(state: UpstreamState) -> Router {
    Router::new()
        .route("/resource", get(respond))
        .with_state(state)
}
