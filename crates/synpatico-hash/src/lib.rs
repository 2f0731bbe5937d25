//! Deterministic, non-cryptographic 32-bit hashing over byte sequences.
//!
//! Every `KeyBit` used by the
//! structural fingerprinter is derived by hashing a key string through
//! [`fnv1a32`] and formatting the result as lowercase hex. The hash has no
//! shared state between calls and is stable across platforms and processes —
//! that statelessness is what lets two peers that have never communicated
//! agree on a structure id.

/// Selectable mixing schedule. Only [`HashAlgorithm::Fnv1a`] is used by the
/// structural fingerprinter; [`HashAlgorithm::OneAtATime`] exists as an
/// alternate flavor callers may select for other purposes, kept independent
/// so picking either never affects fingerprint reproducibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Fnv1a,
    OneAtATime,
}

/// Hashes `bytes` with the given algorithm, returning the raw 32-bit digest.
pub fn hash_bytes(algo: HashAlgorithm, bytes: &[u8]) -> u32 {
    match algo {
        HashAlgorithm::Fnv1a => fnv1a32(bytes),
        HashAlgorithm::OneAtATime => one_at_a_time32(bytes),
    }
}

/// FNV-1a, 32-bit variant. The empty slice is a defined input: it returns
/// the FNV offset basis unchanged.
pub fn fnv1a32(bytes: &[u8]) -> u32 {
    const OFFSET_BASIS: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;
    let mut hash = OFFSET_BASIS;
    for &b in bytes {
        hash ^= b as u32;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

/// Bob Jenkins' one-at-a-time hash, 32-bit. Secondary mixing schedule; not
/// used by the fingerprinter, available for callers that want a distinct
/// avalanche profile.
pub fn one_at_a_time32(bytes: &[u8]) -> u32 {
    let mut hash: u32 = 0;
    for &b in bytes {
        hash = hash.wrapping_add(b as u32);
        hash = hash.wrapping_add(hash << 10);
        hash ^= hash >> 6;
    }
    hash = hash.wrapping_add(hash << 3);
    hash ^= hash >> 11;
    hash = hash.wrapping_add(hash << 15);
    hash
}

/// Hashes a UTF-8 string. Convenience wrapper over [`fnv1a32`] for the
/// `KeyBit` use case (hashing object keys and synthesized path signatures).
pub fn key_bit(key: &str) -> u32 {
    fnv1a32(key.as_bytes())
}

/// Formats a 32-bit digest as lowercase hex, 1-8 digits, no leading zeros —
/// the textual form `StructureId` level hashes use on the wire.
pub fn to_hex(value: u32) -> String {
    format!("{value:x}")
}
