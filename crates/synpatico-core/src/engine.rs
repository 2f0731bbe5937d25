//! Structure state: the process-scoped caches both peers keep. `Engine`
//! owns them explicitly — no process-global mutable statics — so `reset()`
//! can recreate the whole state in one call rather than requiring every
//! cache site to know how to clear itself.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::fingerprint::{fingerprint, fingerprint_value, CollisionCounter, FingerprintResult, StructureId};
use crate::shape::{self, Shape};
use crate::value::Value;
use crate::CoreResult;

/// A structure's `id` plus the `Shape` it was derived from. Owned by both
/// peers' caches; identical by construction, since both sides run the same
/// deterministic fingerprinter over structurally identical input.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureDefinition {
    pub id: StructureId,
    pub shape: Shape,
}

/// Process-scoped structure state: `ShapeCache`, `EndpointToStructureId`,
/// and (when enabled) the `CollisionCounter`. Single-writer/many-reader via
/// `std::sync::RwLock`.
///
/// `StructureId` and `Shape` never mutate after insertion; a
/// `StructureDefinition` enters `shapes` only after the id has been fully
/// computed, so no partially-learned entry is ever observable — there's no
/// in-between state a concurrent reader could see.
pub struct Engine {
    shapes: RwLock<HashMap<StructureId, StructureDefinition>>,
    endpoints: RwLock<HashMap<String, StructureId>>,
    collisions: CollisionCounter,
    collision_mode: bool,
    key_bits: RwLock<HashMap<String, u32>>,
}

impl Engine {
    pub fn new(collision_mode: bool) -> Self {
        Self {
            shapes: RwLock::new(HashMap::new()),
            endpoints: RwLock::new(HashMap::new()),
            collisions: CollisionCounter::new(),
            collision_mode,
            key_bits: RwLock::new(HashMap::new()),
        }
    }

    /// Clears all caches. Never called automatically — only on an explicit
    /// operator/test request to drop everything learned so far.
    pub fn reset(&self) {
        self.shapes.write().expect("shapes lock poisoned").clear();
        self.endpoints.write().expect("endpoints lock poisoned").clear();
        self.key_bits.write().expect("key_bits lock poisoned").clear();
    }

    /// Fingerprints `value`, routing through the shared collision counter
    /// when collision mode is enabled so repeated fingerprints of the same
    /// structure get distinguishable ids.
    pub fn fingerprint(&self, value: &Value) -> FingerprintResult {
        if self.collision_mode {
            let (graph, root) = crate::fingerprint::Graph::from_value(value);
            fingerprint(&graph, root, Some(&self.collisions))
        } else {
            fingerprint_value(value)
        }
    }

    /// Fingerprints and shape-extracts `value`, inserting the resulting
    /// `StructureDefinition` into the shape cache.
    /// Monotonic: learning the same id twice just overwrites with an
    /// equal definition, so concurrent learners racing on the same
    /// structure converge safely.
    pub fn learn(&self, value: &Value) -> CoreResult<FingerprintResult> {
        let fp = self.fingerprint(value);
        let shape = shape::extract(value)?;
        let definition = StructureDefinition {
            id: fp.id.clone(),
            shape,
        };
        self.shapes
            .write()
            .expect("shapes lock poisoned")
            .insert(fp.id.clone(), definition);
        Ok(fp)
    }

    pub fn shape(&self, id: &StructureId) -> Option<StructureDefinition> {
        self.shapes.read().expect("shapes lock poisoned").get(id).cloned()
    }

    pub fn bind_endpoint(&self, endpoint: impl Into<String>, id: StructureId) {
        self.endpoints
            .write()
            .expect("endpoints lock poisoned")
            .insert(endpoint.into(), id);
    }

    pub fn endpoint_structure(&self, endpoint: &str) -> Option<StructureId> {
        self.endpoints
            .read()
            .expect("endpoints lock poisoned")
            .get(endpoint)
            .cloned()
    }

    pub fn forget_endpoint(&self, endpoint: &str) {
        self.endpoints.write().expect("endpoints lock poisoned").remove(endpoint);
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.read().expect("shapes lock poisoned").len()
    }

    pub fn structure_ids(&self) -> Vec<StructureId> {
        self.shapes.read().expect("shapes lock poisoned").keys().cloned().collect()
    }

    /// `KeyBitMap`: a pure memoizing cache over `synpatico_hash::key_bit`,
    /// not a source of truth — it could be eliminated entirely without
    /// changing any observable behavior. Kept as a cache because the
    /// fingerprinter calls it once per object key per traversal and that's
    /// a measurable chunk of the CPU-bound hot path on large responses.
    pub fn key_bit(&self, key: &str) -> u32 {
        if let Some(bit) = self.key_bits.read().expect("key_bits lock poisoned").get(key) {
            return *bit;
        }
        let bit = synpatico_hash::key_bit(key);
        self.key_bits
            .write()
            .expect("key_bits lock poisoned")
            .insert(key.to_string(), bit);
        bit
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn learn_then_lookup() {
        let engine = Engine::default();
        let v = Value::Object(vec![("a".into(), Value::int(1))]);
        let fp = engine.learn(&v).unwrap();
        assert!(engine.shape(&fp.id).is_some());
        assert_eq!(engine.shape_count(), 1);
    }

    #[test]
    fn reset_clears_everything() {
        let engine = Engine::default();
        let v = Value::Object(vec![("a".into(), Value::int(1))]);
        let fp = engine.learn(&v).unwrap();
        engine.bind_endpoint("GET /users", fp.id.clone());
        engine.reset();
        assert_eq!(engine.shape_count(), 0);
        assert!(engine.endpoint_structure("GET /users").is_none());
    }

    #[test]
    fn collision_mode_is_off_by_default() {
        let engine = Engine::default();
        let v = Value::Object(vec![("a".into(), Value::int(1))]);
        let a = engine.fingerprint(&v);
        let b = engine.fingerprint(&v);
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn collision_mode_yields_increasing_ids() {
        let engine = Engine::new(true);
        let v = Value::Object(vec![("a".into(), Value::int(1))]);
        let a = engine.fingerprint(&v);
        let b = engine.fingerprint(&v);
        assert_ne!(a.id, b.id);
        assert_eq!(a.collision_count, 0);
        assert_eq!(b.collision_count, 1);
    }
}
