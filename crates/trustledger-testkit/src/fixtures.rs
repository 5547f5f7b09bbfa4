//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use trustledger::{ChainState, GeneratorConfig, InteractionRecord, ReceiptGenerator};
use trustledger_core::{PublicKey, SigningKeypair};
use trustledger_store::MemoryStore;

/// A test fixture with a keypair and generator configuration.
pub struct TestFixture {
    pub keypair: SigningKeypair,
    pub config: GeneratorConfig,
}

impl TestFixture {
    /// Create a new test fixture with a random keypair.
    pub fn new() -> Self {
        Self {
            keypair: SigningKeypair::generate(),
            config: GeneratorConfig::default(),
        }
    }

    /// Create with a deterministic keypair from seed.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self {
            keypair: SigningKeypair::from_seed(&seed),
            config: GeneratorConfig::default(),
        }
    }

    /// Get the keypair's public key.
    pub fn public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }

    /// Build a fresh generator over an empty in-memory store.
    pub fn generator(&self) -> ReceiptGenerator<MemoryStore> {
        ReceiptGenerator::with_chain_state(
            self.keypair.clone(),
            MemoryStore::new(),
            self.config.clone(),
            ChainState::genesis(),
        )
    }

    /// A minimal well-formed interaction record.
    pub fn record(&self, session_id: &str) -> InteractionRecord {
        InteractionRecord {
            session_id: session_id.to_string(),
            agent_did: "did:example:agent".to_string(),
            human_did: "did:example:human".to_string(),
            policy_version: "policy-1".to_string(),
            mode: "advisory".to_string(),
            model: "fixture-model".to_string(),
            provider: "fixture-provider".to_string(),
            prompt: "fixture prompt".to_string(),
            response: "fixture response".to_string(),
            telemetry: None,
            policy_state: None,
            metadata: None,
        }
    }

    /// A record carrying every optional payload, for export and filter tests.
    pub fn rich_record(&self, session_id: &str, trust_score: f64) -> InteractionRecord {
        InteractionRecord {
            telemetry: Some(serde_json::json!({
                "trust_score": trust_score,
                "cost_debt": 0.05,
                "latency_ms": 42,
            })),
            policy_state: Some(serde_json::json!({"violations": []})),
            metadata: Some(serde_json::json!({
                "consent_verified": true,
                "tags": ["fixture"],
            })),
            ..self.record(session_id)
        }
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create multiple test fixtures for multi-signer tests.
pub fn multi_signer_fixtures(count: usize) -> Vec<TestFixture> {
    (0..count)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[0] = i as u8;
            TestFixture::with_seed(seed)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use trustledger::verify_receipt;

    #[tokio::test]
    async fn test_fixture_round_trip() {
        let fixture = TestFixture::with_seed([1; 32]);
        let generator = fixture.generator();
        let receipt = generator.generate(fixture.record("s1")).await.unwrap();

        let report = verify_receipt(&receipt, Some(&fixture.public_key()), None);
        assert!(report.valid, "errors: {:?}", report.errors);
    }

    #[test]
    fn test_multi_signer_fixtures_have_distinct_keys() {
        let fixtures = multi_signer_fixtures(3);
        assert_ne!(
            fixtures[0].public_key().to_hex(),
            fixtures[1].public_key().to_hex()
        );
        assert_ne!(
            fixtures[1].public_key().to_hex(),
            fixtures[2].public_key().to_hex()
        );
    }
}
