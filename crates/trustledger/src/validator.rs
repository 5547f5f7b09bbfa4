//! Independent receipt verification.
//!
//! The validator re-derives identity, chain hash, and signature from the
//! receipt alone — it shares no state with the generator beyond the
//! canonicalizer. Verification never mutates anything and never raises:
//! failures are structured results so a caller can tell a bad signature
//! from a chain mismatch from malformed input.

use trustledger_core::{validate_schema, PublicKey, SignatureBytes, TrustReceipt, GENESIS_HASH};

/// The outcome of verifying one receipt: an aggregate verdict plus the
/// four individual checks, itemized errors, and non-fatal warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    /// All four checks passed.
    pub valid: bool,
    /// Structural/type conformance. Gates the other checks: nothing
    /// downstream is well-typed without it.
    pub schema_valid: bool,
    /// Stored `id` matches the recomputed content identity.
    pub identity_valid: bool,
    /// Signature verifies under the supplied public key. Passes vacuously
    /// (with a warning) when no key is supplied.
    pub signature_valid: bool,
    /// Recomputed chain hash matches, and the supplied prior chain hash
    /// (if any) matches `chain.previous_hash`.
    pub chain_valid: bool,
    /// One entry per failed check, human-readable.
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl VerificationReport {
    fn failed() -> Self {
        Self {
            valid: false,
            schema_valid: false,
            identity_valid: false,
            signature_valid: false,
            chain_valid: false,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// Verify a receipt independently of the generator.
///
/// `public_key` is optional because the caller may be inspecting untrusted
/// third-party input without a known key; its absence downgrades the
/// signature check to a warning. `previous_chain_hash`, when supplied, is
/// cross-checked against the receipt's recorded predecessor link.
pub fn verify_receipt(
    receipt: &TrustReceipt,
    public_key: Option<&PublicKey>,
    previous_chain_hash: Option<&str>,
) -> VerificationReport {
    let mut report = VerificationReport::failed();

    // Schema first; the remaining checks assume a well-typed receipt.
    if let Err(e) = validate_schema(receipt) {
        report.errors.push(format!("schema: {}", e));
        return report;
    }
    report.schema_valid = true;

    // Identity: recompute the content hash the generator derived.
    match receipt.compute_id() {
        Ok(expected) if expected == receipt.id => report.identity_valid = true,
        Ok(expected) => report.errors.push(format!(
            "identity: stored id {} does not match recomputed {}",
            receipt.id, expected
        )),
        Err(e) => report.errors.push(format!("identity: {}", e)),
    }

    // Signature: only verifiable with a key.
    match public_key {
        Some(key) => match check_signature(receipt, key) {
            Ok(()) => report.signature_valid = true,
            Err(reason) => report.errors.push(format!("signature: {}", reason)),
        },
        None => {
            report.signature_valid = true;
            report
                .warnings
                .push("no public key supplied; signature not verified".to_string());
        }
    }

    // Chain: the recorded predecessor must match any supplied prior hash,
    // and the link commitment must recompute to the stored value.
    let mut chain_error: Option<String> = None;
    if let Some(previous) = previous_chain_hash {
        if previous != receipt.chain.previous_hash {
            chain_error = Some(format!(
                "previous_hash {} does not match supplied prior chain hash {}",
                receipt.chain.previous_hash, previous
            ));
        }
    }
    if chain_error.is_none() {
        match receipt.compute_chain_hash() {
            Ok(expected) if expected == receipt.chain.chain_hash => {}
            Ok(expected) => {
                chain_error = Some(format!(
                    "stored chain_hash {} does not match recomputed {}",
                    receipt.chain.chain_hash, expected
                ));
            }
            Err(e) => chain_error = Some(e.to_string()),
        }
    }
    match chain_error {
        None => report.chain_valid = true,
        Some(reason) => report.errors.push(format!("chain: {}", reason)),
    }

    report.valid = report.schema_valid
        && report.identity_valid
        && report.signature_valid
        && report.chain_valid;
    report
}

/// Aggregate result of verifying an ordered receipt list as one chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainVerificationReport {
    /// Every receipt passed all checks and every link lines up.
    pub valid: bool,
    pub receipt_count: usize,
    /// Errors prefixed with the failing receipt's position.
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Verify an ordered list of receipts as one chain, first link anchored at
/// genesis. Convenience over [`verify_receipt`]: each receipt is checked
/// against its predecessor's chain hash, and `chain_length` must advance by
/// one per link. An empty list is trivially valid.
pub fn verify_chain(
    receipts: &[TrustReceipt],
    public_key: Option<&PublicKey>,
) -> ChainVerificationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let mut prior = GENESIS_HASH.to_string();
    for (i, receipt) in receipts.iter().enumerate() {
        let report = verify_receipt(receipt, public_key, Some(&prior));
        errors.extend(report.errors.into_iter().map(|e| format!("receipt {}: {}", i, e)));
        warnings.extend(report.warnings.into_iter().map(|w| format!("receipt {}: {}", i, w)));

        let expected_length = (i + 1) as u64;
        if report.schema_valid && receipt.chain.chain_length != expected_length {
            errors.push(format!(
                "receipt {}: chain: chain_length {} does not match position {}",
                i, receipt.chain.chain_length, expected_length
            ));
        }

        prior = receipt.chain.chain_hash.clone();
    }

    ChainVerificationReport {
        valid: errors.is_empty(),
        receipt_count: receipts.len(),
        errors,
        warnings,
    }
}

fn check_signature(receipt: &TrustReceipt, key: &PublicKey) -> Result<(), String> {
    let message = receipt
        .signing_bytes()
        .map_err(|e| format!("cannot rebuild signed payload: {}", e))?;
    let signature = SignatureBytes::from_hex(&receipt.signature.value)
        .map_err(|_| "signature value is not valid hex".to_string())?;
    key.verify(&message, &signature)
        .map_err(|_| "verification failed under supplied public key".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{ChainState, GeneratorConfig, InteractionRecord, ReceiptGenerator};
    use trustledger_core::{SigningKeypair, GENESIS_HASH};
    use trustledger_store::MemoryStore;

    async fn generate_pair() -> (Vec<TrustReceipt>, PublicKey) {
        let keypair = SigningKeypair::from_seed(&[0x42; 32]);
        let public_key = keypair.public_key();
        let generator = ReceiptGenerator::with_chain_state(
            keypair,
            MemoryStore::new(),
            GeneratorConfig::default(),
            ChainState::genesis(),
        );

        let mut receipts = Vec::new();
        for i in 0..2 {
            let record = InteractionRecord {
                session_id: format!("session-{}", i),
                agent_did: "did:example:agent".to_string(),
                human_did: "did:example:human".to_string(),
                policy_version: "policy-7".to_string(),
                mode: "advisory".to_string(),
                model: "test-model".to_string(),
                provider: "test-provider".to_string(),
                prompt: format!("prompt {}", i),
                response: format!("response {}", i),
                telemetry: Some(serde_json::json!({"trust_score": 0.8, "latency_ms": 120})),
                policy_state: None,
                metadata: None,
            };
            receipts.push(generator.generate(record).await.unwrap());
        }
        (receipts, public_key)
    }

    #[tokio::test]
    async fn test_round_trip_all_checks_pass() {
        let (receipts, public_key) = generate_pair().await;

        let report = verify_receipt(&receipts[0], Some(&public_key), Some(GENESIS_HASH));
        assert!(report.valid, "errors: {:?}", report.errors);
        assert!(report.schema_valid);
        assert!(report.identity_valid);
        assert!(report.signature_valid);
        assert!(report.chain_valid);
        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_chain_cross_check() {
        let (receipts, public_key) = generate_pair().await;

        let report = verify_receipt(
            &receipts[1],
            Some(&public_key),
            Some(&receipts[0].chain.chain_hash),
        );
        assert!(report.chain_valid);

        let report = verify_receipt(&receipts[1], Some(&public_key), Some("0".repeat(64).as_str()));
        assert!(!report.chain_valid);
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);
        // Other checks are still reported independently.
        assert!(report.identity_valid);
        assert!(report.signature_valid);
    }

    #[tokio::test]
    async fn test_missing_public_key_is_warning() {
        let (receipts, _) = generate_pair().await;

        let report = verify_receipt(&receipts[0], None, None);
        assert!(report.valid);
        assert!(report.signature_valid);
        assert_eq!(report.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_tampered_body_fails_identity_and_signature() {
        let (receipts, public_key) = generate_pair().await;

        let mut tampered = receipts[0].clone();
        tampered.session_id = "forged-session".to_string();

        let report = verify_receipt(&tampered, Some(&public_key), None);
        assert!(!report.valid);
        assert!(report.schema_valid);
        assert!(!report.identity_valid);
        assert!(!report.signature_valid);
        assert!(!report.chain_valid);
    }

    #[tokio::test]
    async fn test_tampered_telemetry_detected() {
        let (receipts, public_key) = generate_pair().await;

        let mut tampered = receipts[0].clone();
        tampered.telemetry = Some(serde_json::json!({"trust_score": 0.99, "latency_ms": 120}));

        let report = verify_receipt(&tampered, Some(&public_key), None);
        assert!(!report.valid);
        assert!(!report.identity_valid);
    }

    #[tokio::test]
    async fn test_wrong_public_key_fails_signature_only() {
        let (receipts, _) = generate_pair().await;
        let other_key = SigningKeypair::from_seed(&[0x99; 32]).public_key();

        let report = verify_receipt(&receipts[0], Some(&other_key), None);
        assert!(!report.valid);
        assert!(report.identity_valid);
        assert!(!report.signature_valid);
        assert!(report.chain_valid);
        assert_eq!(report.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_receipt_gates_other_checks() {
        let (receipts, public_key) = generate_pair().await;

        let mut malformed = receipts[0].clone();
        malformed.id = "short".to_string();

        let report = verify_receipt(&malformed, Some(&public_key), None);
        assert!(!report.valid);
        assert!(!report.schema_valid);
        assert!(!report.identity_valid);
        assert!(!report.signature_valid);
        assert!(!report.chain_valid);
        assert_eq!(report.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_verify_chain_accepts_honest_chain() {
        let (receipts, public_key) = generate_pair().await;

        let report = verify_chain(&receipts, Some(&public_key));
        assert!(report.valid, "errors: {:?}", report.errors);
        assert_eq!(report.receipt_count, 2);
        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_verify_chain_rejects_reordered_receipts() {
        let (mut receipts, public_key) = generate_pair().await;
        receipts.swap(0, 1);

        let report = verify_chain(&receipts, Some(&public_key));
        assert!(!report.valid);
        // Both links break: the first no longer anchors at genesis and the
        // second no longer follows its predecessor.
        assert!(report.errors.iter().any(|e| e.starts_with("receipt 0: chain:")));
        assert!(report.errors.iter().any(|e| e.starts_with("receipt 1: chain:")));
        assert!(report
            .errors
            .iter()
            .any(|e| e.contains("chain_length") && e.contains("position")));
    }

    #[tokio::test]
    async fn test_verify_chain_flags_tampered_link() {
        let (mut receipts, public_key) = generate_pair().await;
        receipts[1].mode = "enforcing".to_string();

        let report = verify_chain(&receipts, Some(&public_key));
        assert!(!report.valid);
        assert!(report.errors.iter().all(|e| e.starts_with("receipt 1:")));
    }

    #[tokio::test]
    async fn test_verify_chain_without_key_warns_per_receipt() {
        let (receipts, _) = generate_pair().await;

        let report = verify_chain(&receipts, None);
        assert!(report.valid);
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn test_verify_chain_empty_is_valid() {
        let report = verify_chain(&[], None);
        assert!(report.valid);
        assert_eq!(report.receipt_count, 0);
    }

    #[tokio::test]
    async fn test_swapped_chain_hash_fails_chain_and_signature() {
        let (receipts, public_key) = generate_pair().await;

        let mut tampered = receipts[0].clone();
        tampered.chain.chain_hash = receipts[1].chain.chain_hash.clone();

        let report = verify_receipt(&tampered, Some(&public_key), None);
        assert!(!report.valid);
        // Identity masks chain_hash, so it still passes; chain and
        // signature catch the reorder.
        assert!(report.identity_valid);
        assert!(!report.chain_valid);
        assert!(!report.signature_valid);
    }
}
