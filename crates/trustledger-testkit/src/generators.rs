//! Proptest generators for property-based testing.

use proptest::prelude::*;
use serde_json::Value;

use trustledger::InteractionRecord;
use trustledger_core::SigningKeypair;

/// Generate a deterministic keypair from an arbitrary seed.
pub fn keypair() -> impl Strategy<Value = SigningKeypair> {
    any::<[u8; 32]>().prop_map(|seed| SigningKeypair::from_seed(&seed))
}

/// Generate a 64-char lowercase hex digest.
pub fn hex_digest() -> impl Strategy<Value = String> {
    any::<[u8; 32]>().prop_map(hex::encode)
}

/// Generate a session identifier.
pub fn session_id() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,31}".prop_map(String::from)
}

/// Generate a DID-shaped identifier.
pub fn did() -> impl Strategy<Value = String> {
    "[a-z0-9]{4,16}".prop_map(|tail| format!("did:example:{}", tail))
}

/// Generate a policy enforcement mode.
pub fn mode() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("advisory".to_string()),
        Just("enforcing".to_string()),
        Just("audit".to_string()),
    ]
}

/// Generate free text with quotes, unicode, and newlines mixed in, to
/// exercise canonical string escaping.
pub fn free_text() -> impl Strategy<Value = String> {
    "[ -~éß\\n]{0,64}".prop_map(String::from)
}

/// Generate an optional telemetry payload.
pub fn telemetry() -> impl Strategy<Value = Option<Value>> {
    proptest::option::of((0.0f64..=1.0, 0.0f64..=10.0, 0u32..10_000).prop_map(
        |(trust_score, cost_debt, latency_ms)| {
            serde_json::json!({
                "trust_score": trust_score,
                "cost_debt": cost_debt,
                "latency_ms": latency_ms,
            })
        },
    ))
}

/// Generate a full interaction record.
pub fn interaction_record() -> impl Strategy<Value = InteractionRecord> {
    (
        session_id(),
        did(),
        did(),
        "[a-z0-9.-]{1,16}",
        mode(),
        "[a-z0-9-]{1,24}",
        "[a-z]{2,12}",
        free_text(),
        free_text(),
        telemetry(),
    )
        .prop_map(
            |(
                session_id,
                agent_did,
                human_did,
                policy_version,
                mode,
                model,
                provider,
                prompt,
                response,
                telemetry,
            )| InteractionRecord {
                session_id,
                agent_did,
                human_did,
                policy_version,
                mode,
                model,
                provider,
                prompt,
                response,
                telemetry,
                policy_state: None,
                metadata: None,
            },
        )
}
