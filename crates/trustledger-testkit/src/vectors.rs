//! Golden test vectors for deterministic verification.
//!
//! These vectors pin the canonical JSON form and its SHA-256 digest so
//! that other implementations can cross-check byte-for-byte.

use serde_json::Value;
use trustledger_core::{canonicalize, sha256_hex};

/// A golden canonicalization vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Input document, in arbitrary key order.
    pub input: &'static str,
    /// Expected canonical form.
    pub canonical: &'static str,
    /// Expected SHA-256 of the canonical form (hex).
    pub sha256: &'static str,
}

/// Get all golden canonicalization vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "flat object, keys out of order",
            input: r#"{"b":1,"a":"x"}"#,
            canonical: r#"{"a":"x","b":1}"#,
            sha256: "cdab067e9f3beb32d1252cfd63e492592fecbf591b0d08cadb24bb17f3864246",
        },
        GoldenVector {
            name: "nested object with array order preserved and explicit null",
            input: r#"{"z":{"k":[3,1,2],"a":null},"m":"text with \"quotes\""}"#,
            canonical: r#"{"m":"text with \"quotes\"","z":{"a":null,"k":[3,1,2]}}"#,
            sha256: "73de58a4451a1e8d1d4e958680941f1fa54582564c706f6e09df94b53fb90f1a",
        },
        GoldenVector {
            name: "empty object",
            input: "{}",
            canonical: "{}",
            sha256: "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a",
        },
    ]
}

/// Check every vector against the canonicalizer. Returns the names of the
/// vectors that failed, empty on success.
pub fn verify_all_vectors() -> Vec<&'static str> {
    let mut failures = Vec::new();
    for vector in all_vectors() {
        let parsed: Value = match serde_json::from_str(vector.input) {
            Ok(v) => v,
            Err(_) => {
                failures.push(vector.name);
                continue;
            }
        };
        let canonical = canonicalize(&parsed);
        if canonical != vector.canonical || sha256_hex(canonical.as_bytes()) != vector.sha256 {
            failures.push(vector.name);
        }
    }
    failures
}
