//! Canonical JSON encoding for deterministic serialization.
//!
//! Receipts are hashed and signed over a canonical text form:
//! - Object keys sorted lexicographically, recursively at every depth
//! - Compact separators (no whitespace)
//! - Array element order preserved
//! - Absent fields are omitted entirely; a present `null` encodes as `null`
//!
//! The canonical form is critical: generator and verifier must produce
//! identical bytes for the same logical content, years apart and in
//! separate processes. A shallow (top-level-only) key sort desynchronizes
//! every identity, chain, and signature check.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::CoreError;

/// Encode a JSON value to its canonical string form.
///
/// Scalars encode as compact JSON. Arrays recurse in order. Objects sort
/// keys at the current level and recurse into each value.
pub fn canonicalize(value: &Value) -> String {
    match value {
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => value.to_string(),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(canonicalize).collect();
            format!("[{}]", parts.join(","))
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();

            let parts: Vec<String> = keys
                .into_iter()
                .map(|k| {
                    // Key is encoded as a JSON string (escaping included).
                    let key = Value::String(k.clone()).to_string();
                    format!("{}:{}", key, canonicalize(&map[k]))
                })
                .collect();
            format!("{{{}}}", parts.join(","))
        }
    }
}

/// Canonicalize any serializable value.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, CoreError> {
    let value = serde_json::to_value(value).map_err(|e| CoreError::Encoding(e.to_string()))?;
    Ok(canonicalize(&value))
}

/// SHA-256 of raw bytes, as a 64-character lowercase hex string.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Canonicalize a value and hash the canonical bytes.
pub fn canonical_hash<T: Serialize>(value: &T) -> Result<String, CoreError> {
    Ok(sha256_hex(canonical_json(value)?.as_bytes()))
}
