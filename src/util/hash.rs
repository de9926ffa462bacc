//! Canonical serialization and content hashing.
//!
//! Every hashed payload goes through the same pipeline: serialize to a
//! canonical JSON string (keys sorted lexicographically, no insignificant
//! whitespace, UTF-8 preserved), then SHA-256 over the UTF-8 bytes, rendered
//! as a `0x`-prefixed lowercase hex string. Identical field values always
//! canonicalize to byte-identical strings, so the hash doubles as a
//! deduplication key.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Serialize a payload to its canonical JSON form.
///
/// Round-trips through `serde_json::Value`, whose object representation is
/// a sorted map, so key order in the source struct is irrelevant. Absent
/// optional fields serialize as `null` and stay significant.
pub fn canonical_json<T: Serialize>(payload: &T) -> Result<String, serde_json::Error> {
    let value = serde_json::to_value(payload)?;
    serde_json::to_string(&value)
}

/// SHA-256 of a canonical string, as `0x` + 64 lowercase hex chars.
pub fn content_hash(canonical: &str) -> String {
    format!("0x{}", hex::encode(Sha256::digest(canonical.as_bytes())))
}

/// Canonicalize and hash in one step. Returns `(hash, canonical)`.
pub fn hash_payload<T: Serialize>(payload: &T) -> Result<(String, String), serde_json::Error> {
    let canonical = canonical_json(payload)?;
    Ok((content_hash(&canonical), canonical))
}
