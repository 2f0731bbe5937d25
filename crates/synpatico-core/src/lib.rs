//! Synpatico core: structural fingerprinting, shape extraction, the
//! rich-type envelope, the value linearizer, and the values-only codec.
//!
//! This crate has no HTTP dependency of its own — every operation is
//! synchronous and CPU-bound, so it can be called from either side of the
//! wire without pulling in a transport.

pub mod codec;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod fingerprint;
pub mod linearize;
pub mod shape;
pub mod value;

pub use codec::{decode, encode, encode_if_smaller, Packet, PacketMetadata};
pub use engine::{Engine, StructureDefinition};
pub use error::{CoreError, CoreResult};
pub use fingerprint::{fingerprint_value, CollisionCounter, FingerprintResult, StructureId};
pub use linearize::{linearize, reconstruct};
pub use shape::{extract as extract_shape, Shape};
pub use value::{LeafKind, RichError, Value};
