//! Reward token gated by a composed proof.
//!
//! `reward_recursive_proof` is the privileged transition: it mints
//! [`REWARD_AMOUNT`] to the caller once per `(public_key, signature)` pair,
//! and only if the caller owns the proof chain and knows the shared secret.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use rollup_core::Field;
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use zk::{ProofArtifact, Prover, PublicKey, Signature, Stage, verify_signature};

use crate::api::{Result, RuntimeError};
use crate::events::{ContractEvent, Event, EventBus};
use crate::ledger::{TokenId, TokenLedger};
use crate::repository::RepositoryError;

pub const REWARD_AMOUNT: u64 = 88_888_888;

/// Secret the reward token and its callers sign over.
pub const SHARED_SECRET: Field = Field::new(1111);

const SECRET_DOMAIN: &[u8] = b"runtime/reward/secret";

/// Commitment passed between contracts instead of the secret itself.
pub fn secret_commitment(secret: Field) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(SECRET_DOMAIN);
    hasher.update(secret.to_le_bytes());
    hasher.finalize().into()
}

pub struct RewardToken {
    address: PublicKey,
    secret: Field,
    verifier: Arc<dyn Prover>,
    tokens: Arc<dyn TokenLedger>,
    events: EventBus,
    /// `(public_key, signature)` pairs whose proof chain already minted.
    consumed: Mutex<HashSet<(PublicKey, Signature)>>,
}

impl RewardToken {
    pub fn new(
        address: PublicKey,
        verifier: Arc<dyn Prover>,
        tokens: Arc<dyn TokenLedger>,
        events: EventBus,
    ) -> Self {
        Self {
            address,
            secret: SHARED_SECRET,
            verifier,
            tokens,
            events,
            consumed: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_secret(mut self, secret: Field) -> Self {
        self.secret = secret;
        self
    }

    pub fn address(&self) -> PublicKey {
        self.address
    }

    pub fn token_id(&self) -> TokenId {
        TokenId::issued_by(self.address)
    }

    pub fn balance_of(&self, owner: &PublicKey) -> Result<u64> {
        self.tokens.balance_of(self.token_id(), owner)
    }

    /// Mints [`REWARD_AMOUNT`] to `caller` for a verified merge proof.
    ///
    /// Checks, in order: the certificate verifies, the proof names `caller`,
    /// the embedded signature is `caller`'s over the shared secret, and the
    /// proof chain has not minted before. Returns the caller's new balance.
    pub fn reward_recursive_proof(
        &self,
        caller: PublicKey,
        artifact: &ProofArtifact,
    ) -> Result<u64> {
        match self.authorize_and_mint(caller, artifact) {
            Ok(balance) => {
                info!(recipient = %caller, amount = REWARD_AMOUNT, "reward minted");
                self.events
                    .publish(Event::Contract(ContractEvent::RewardMinted {
                        recipient: caller,
                        amount: REWARD_AMOUNT,
                    }));
                Ok(balance)
            }
            Err(e) => {
                warn!(caller = %caller, error = %e, "reward transition rejected");
                Err(e)
            }
        }
    }

    fn authorize_and_mint(&self, caller: PublicKey, artifact: &ProofArtifact) -> Result<u64> {
        match self.verifier.verify(artifact) {
            Ok(true) => {}
            Ok(false) => {
                return Err(RuntimeError::ProofVerification(
                    "certificate does not verify".to_string(),
                ));
            }
            Err(e) => return Err(RuntimeError::ProofVerification(e.to_string())),
        }
        if artifact.stage() != Stage::Merge {
            return Err(RuntimeError::ProofVerification(format!(
                "expected a merge proof, got {}",
                artifact.stage()
            )));
        }

        let public_input = &artifact.public_input;
        if public_input.public_key != caller {
            return Err(RuntimeError::UnauthorizedTransition {
                caller,
                expected: public_input.public_key,
            });
        }

        if !verify_signature(&public_input.signature, &caller, &[self.secret]) {
            return Err(RuntimeError::SignatureMismatch);
        }

        let mut consumed = self
            .consumed
            .lock()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let key = (caller, public_input.signature);
        if consumed.contains(&key) {
            return Err(RuntimeError::ArtifactReplayed);
        }

        let balance = self.tokens.mint(self.token_id(), &caller, REWARD_AMOUNT)?;
        consumed.insert(key);
        Ok(balance)
    }

    /// Mints `amount` to `sender` if it presents the secret commitment.
    pub fn mint_new_tokens(
        &self,
        sender: PublicKey,
        commitment: [u8; 32],
        amount: u64,
    ) -> Result<u64> {
        if commitment != secret_commitment(self.secret) {
            warn!(sender = %sender, "secret commitment rejected");
            return Err(RuntimeError::SecretMismatch);
        }

        let balance = self.tokens.mint(self.token_id(), &sender, amount)?;
        self.events
            .publish(Event::Contract(ContractEvent::TokensMinted {
                issuer: self.address,
                recipient: sender,
                amount,
            }));
        Ok(balance)
    }

    /// Burns a share minted by `mint_new_tokens` whose enclosing transition failed.
    pub(crate) fn revoke(&self, holder: PublicKey, amount: u64) -> Result<u64> {
        warn!(holder = %holder, amount, "revoking minted share");
        self.tokens.burn(self.token_id(), &holder, amount)
    }
}
