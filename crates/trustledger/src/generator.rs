//! Receipt generation: canonicalize, derive identity, link, sign.
//!
//! The generator owns one chain. Its tip state is explicit and injectable
//! (never a module-level default) and is reloaded from the store's last
//! durable receipt on restart — losing the tip silently starts a new,
//! disconnected chain, so recovery is part of the contract.
//!
//! The derivation order in [`ReceiptGenerator::generate`] is load-bearing:
//! changing it breaks every historical signature.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use trustledger_core::{
    hash_content, validate_schema, ChainLink, Interaction, PublicKey, ReceiptSignature,
    SigningKeypair, TrustReceipt, GENESIS_HASH, RECEIPT_VERSION, SIGNATURE_ALGORITHM,
};
use trustledger_store::{CreateResult, ReceiptStore};

use crate::error::{LedgerError, Result};

/// Configuration for the generator.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Label recorded in every signature, identifying the signing key.
    pub key_version: String,
    /// When true, raw prompt/response text is embedded alongside the
    /// hashes. Privacy-preserving mode (the default) stores hashes only.
    pub include_content: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            key_version: "v1".to_string(),
            include_content: false,
        }
    }
}

/// One AI interaction plus its context, as supplied by the upstream
/// evaluation service. The generator embeds these payloads; it never
/// computes them.
#[derive(Debug, Clone)]
pub struct InteractionRecord {
    pub session_id: String,
    pub agent_did: String,
    pub human_did: String,
    pub policy_version: String,
    pub mode: String,
    pub model: String,
    pub provider: String,
    pub prompt: String,
    pub response: String,
    pub telemetry: Option<Value>,
    pub policy_state: Option<Value>,
    pub metadata: Option<Value>,
}

/// The mutable chain tip: previous hash and running length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainState {
    pub previous_hash: String,
    pub length: u64,
}

impl ChainState {
    /// A fresh chain with no predecessor.
    pub fn genesis() -> Self {
        Self {
            previous_hash: GENESIS_HASH.to_string(),
            length: 0,
        }
    }

    /// Reload the tip from the store's last durable receipt.
    ///
    /// An empty store starts at genesis.
    pub async fn recover<S: ReceiptStore>(store: &S) -> Result<Self> {
        match store.latest().await? {
            Some(tip) => {
                debug!(
                    chain_length = tip.chain.chain_length,
                    chain_hash = %tip.chain.chain_hash,
                    "recovered chain tip from store"
                );
                Ok(Self {
                    previous_hash: tip.chain.chain_hash,
                    length: tip.chain.chain_length,
                })
            }
            None => Ok(Self::genesis()),
        }
    }
}

/// Produces fully-formed, signed receipts for one chain.
///
/// Single writer per chain: the tip is advanced under a mutex, one
/// generation in flight at a time.
pub struct ReceiptGenerator<S: ReceiptStore> {
    keypair: SigningKeypair,
    config: GeneratorConfig,
    store: Arc<S>,
    chain: Mutex<ChainState>,
}

impl<S: ReceiptStore> ReceiptGenerator<S> {
    /// Create a generator for a fresh chain starting at genesis.
    pub fn new(keypair: SigningKeypair, store: S, config: GeneratorConfig) -> Self {
        Self::with_chain_state(keypair, store, config, ChainState::genesis())
    }

    /// Create a generator with an explicit chain state.
    pub fn with_chain_state(
        keypair: SigningKeypair,
        store: S,
        config: GeneratorConfig,
        chain: ChainState,
    ) -> Self {
        Self {
            keypair,
            config,
            store: Arc::new(store),
            chain: Mutex::new(chain),
        }
    }

    /// Create a generator, recovering the chain tip from the store.
    pub async fn recover(
        keypair: SigningKeypair,
        store: S,
        config: GeneratorConfig,
    ) -> Result<Self> {
        let chain = ChainState::recover(&store).await?;
        Ok(Self::with_chain_state(keypair, store, config, chain))
    }

    /// Create a generator from an externally supplied hex signing key.
    ///
    /// A malformed key is a fatal configuration error.
    pub fn from_hex_key(key: &str, store: S, config: GeneratorConfig) -> Result<Self> {
        let keypair = SigningKeypair::from_hex(key)
            .map_err(|_| LedgerError::Config("malformed signing key".to_string()))?;
        Ok(Self::with_chain_state(
            keypair,
            store,
            config,
            ChainState::genesis(),
        ))
    }

    /// The public key matching this generator's signing key.
    pub fn public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }

    /// A snapshot of the current chain tip.
    pub async fn chain_state(&self) -> ChainState {
        self.chain.lock().await.clone()
    }

    /// The store this generator writes through.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Generate one signed receipt.
    ///
    /// The sequence either completes and returns a receipt, or raises
    /// before the chain tip advances. A failed durable write does not fail
    /// generation: the signed receipt is valid and returned regardless,
    /// with the degradation logged.
    pub async fn generate(&self, record: InteractionRecord) -> Result<TrustReceipt> {
        let mut chain = self.chain.lock().await;

        // 1. Interaction payload: hashes always, raw text only when
        //    privacy-preserving mode is off.
        let (prompt, response) = if self.config.include_content {
            (Some(record.prompt.clone()), Some(record.response.clone()))
        } else {
            (None, None)
        };
        let interaction = Interaction {
            model: record.model,
            provider: record.provider,
            prompt,
            response,
            prompt_hash: hash_content(&record.prompt),
            response_hash: hash_content(&record.response),
        };

        // 2. Body without id, without signature, chain_hash empty.
        let mut receipt = TrustReceipt {
            id: String::new(),
            version: RECEIPT_VERSION.to_string(),
            timestamp: now_rfc3339(),
            session_id: record.session_id,
            agent_did: record.agent_did,
            human_did: record.human_did,
            policy_version: record.policy_version,
            mode: record.mode,
            interaction,
            telemetry: record.telemetry,
            policy_state: record.policy_state,
            metadata: record.metadata,
            chain: ChainLink {
                previous_hash: chain.previous_hash.clone(),
                chain_hash: String::new(),
                chain_length: chain.length + 1,
            },
            signature: ReceiptSignature::empty(),
        };

        // 3. Content identity over the body.
        receipt.id = receipt.compute_id()?;

        // 4-5. Link commitment over body + id, then set it.
        let chain_hash = receipt.compute_chain_hash()?;
        receipt.chain.chain_hash = chain_hash.clone();

        // 6. Sign the complete receipt minus the signature field.
        let message = receipt.signing_bytes()?;
        let signature = self.keypair.sign(&message);
        receipt.signature = ReceiptSignature {
            algorithm: SIGNATURE_ALGORITHM.to_string(),
            value: signature.to_hex(),
            key_version: self.config.key_version.clone(),
            timestamp_signed: now_rfc3339(),
        };

        // 7. Fail closed on a malformed result before any side effect.
        validate_schema(&receipt).map_err(LedgerError::Invariant)?;

        // Best-effort durable write. The receipt is correct whether or not
        // it lands; a missing write is an operational gap to monitor.
        match self.store.create(&receipt).await {
            Ok(CreateResult::Rejected) => {
                warn!(id = %receipt.id, "receipt rejected at persistence boundary");
            }
            Ok(_) => {}
            Err(e) => {
                warn!(id = %receipt.id, error = %e, "durable write failed, receipt still valid");
            }
        }

        chain.previous_hash = chain_hash;
        chain.length = receipt.chain.chain_length;

        Ok(receipt)
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use trustledger_store::MemoryStore;

    fn record(session: &str) -> InteractionRecord {
        InteractionRecord {
            session_id: session.to_string(),
            agent_did: "did:example:agent".to_string(),
            human_did: "did:example:human".to_string(),
            policy_version: "policy-7".to_string(),
            mode: "advisory".to_string(),
            model: "test-model".to_string(),
            provider: "test-provider".to_string(),
            prompt: "What is the policy?".to_string(),
            response: "The policy is X.".to_string(),
            telemetry: Some(serde_json::json!({"trust_score": 0.92})),
            policy_state: None,
            metadata: None,
        }
    }

    fn generator(include_content: bool) -> ReceiptGenerator<MemoryStore> {
        ReceiptGenerator::with_chain_state(
            SigningKeypair::from_seed(&[0x42; 32]),
            MemoryStore::new(),
            GeneratorConfig {
                key_version: "k1".to_string(),
                include_content,
            },
            ChainState::genesis(),
        )
    }

    #[tokio::test]
    async fn test_generate_passes_own_schema() {
        let generator = generator(false);
        let receipt = generator.generate(record("s1")).await.unwrap();

        assert!(validate_schema(&receipt).is_ok());
        assert_eq!(receipt.id, receipt.compute_id().unwrap());
        assert_eq!(receipt.chain.chain_hash, receipt.compute_chain_hash().unwrap());
    }

    #[tokio::test]
    async fn test_chain_linkage() {
        let generator = generator(false);

        let r1 = generator.generate(record("s1")).await.unwrap();
        let r2 = generator.generate(record("s1")).await.unwrap();
        let r3 = generator.generate(record("s1")).await.unwrap();

        assert_eq!(r1.chain.previous_hash, GENESIS_HASH);
        assert_eq!(r1.chain.chain_length, 1);
        assert_eq!(r2.chain.previous_hash, r1.chain.chain_hash);
        assert_eq!(r2.chain.chain_length, 2);
        assert_eq!(r3.chain.previous_hash, r2.chain.chain_hash);
        assert_eq!(r3.chain.chain_length, 3);
    }

    #[tokio::test]
    async fn test_privacy_mode_excludes_content() {
        let generator = generator(false);
        let receipt = generator.generate(record("s1")).await.unwrap();

        assert!(receipt.interaction.prompt.is_none());
        assert!(receipt.interaction.response.is_none());
        assert_eq!(receipt.interaction.prompt_hash, hash_content("What is the policy?"));
        assert_eq!(receipt.interaction.response_hash, hash_content("The policy is X."));
    }

    #[tokio::test]
    async fn test_content_mode_includes_content() {
        let generator = generator(true);
        let receipt = generator.generate(record("s1")).await.unwrap();

        assert_eq!(receipt.interaction.prompt.as_deref(), Some("What is the policy?"));
        assert_eq!(receipt.interaction.response.as_deref(), Some("The policy is X."));
        // Hashes present in both modes
        assert_eq!(receipt.interaction.prompt_hash, hash_content("What is the policy?"));
    }

    #[tokio::test]
    async fn test_receipts_are_persisted() {
        let generator = generator(false);
        let receipt = generator.generate(record("s1")).await.unwrap();

        let stored = generator
            .store()
            .find(&trustledger_store::ReceiptQuery::by_id(&receipt.id))
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0], receipt);
    }

    #[tokio::test]
    async fn test_malformed_key_is_config_error() {
        let result = ReceiptGenerator::from_hex_key(
            "not a key",
            MemoryStore::new(),
            GeneratorConfig::default(),
        );
        assert!(matches!(result, Err(LedgerError::Config(_))));
    }

    #[tokio::test]
    async fn test_recover_continues_chain() {
        let store = MemoryStore::new();
        let keypair = SigningKeypair::from_seed(&[0x42; 32]);

        let generator = ReceiptGenerator::with_chain_state(
            keypair.clone(),
            store,
            GeneratorConfig::default(),
            ChainState::genesis(),
        );
        let r1 = generator.generate(record("s1")).await.unwrap();
        let r2 = generator.generate(record("s1")).await.unwrap();

        // Simulate restart: a new generator over the same receipts.
        let restarted_store = MemoryStore::new();
        for r in [&r1, &r2] {
            restarted_store.create(r).await.unwrap();
        }
        let restarted = ReceiptGenerator::recover(
            keypair,
            restarted_store,
            GeneratorConfig::default(),
        )
        .await
        .unwrap();

        let r3 = restarted.generate(record("s1")).await.unwrap();
        assert_eq!(r3.chain.previous_hash, r2.chain.chain_hash);
        assert_eq!(r3.chain.chain_length, 3);
    }

    #[tokio::test]
    async fn test_chain_state_recover_empty_store() {
        let store = MemoryStore::new();
        let state = ChainState::recover(&store).await.unwrap();
        assert_eq!(state, ChainState::genesis());
    }
}
