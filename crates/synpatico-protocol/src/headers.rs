//! HTTP negotiation vocabulary: header names and content types, bit-exact
//! across the client and agent so neither side can silently drift from
//! the other's expectations.

/// Request direction: client offers to accept an optimized packet for this
/// structure id.
pub const ACCEPT_ID_HEADER: &str = "X-Synpatico-Accept-ID";

/// Response direction: structure id the packet body belongs to.
pub const STRUCTURE_ID_HEADER: &str = "X-Synpatico-ID";

/// Response direction: non-empty when the responding agent is
/// Synpatico-enabled. We emit the agent's semantic version — any non-empty
/// value satisfies the capability-discovery contract, and a version string
/// also gives the client something to log.
pub const AGENT_HEADER: &str = "X-Synpatico-Agent";

/// Content type identifying a `Packet` body.
pub const PACKET_CONTENT_TYPE: &str = "application/synpatico-packet+json";

/// Content type identifying a standard JSON body.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Hop-by-hop headers stripped before re-emitting a response.
pub const HOP_BY_HOP_HEADERS: &[&str] = &["content-encoding", "transfer-encoding", "connection"];
