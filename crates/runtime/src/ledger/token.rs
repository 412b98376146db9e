//! Token balances per issuing contract.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use zk::PublicKey;

use crate::api::{Result, RuntimeError};
use crate::repository::RepositoryError;

/// Identifies a token by the address of the contract that issues it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenId(PublicKey);

impl TokenId {
    pub const fn issued_by(contract: PublicKey) -> Self {
        Self(contract)
    }

    pub const fn issuer(&self) -> PublicKey {
        self.0
    }
}

/// Token/balance collaborator.
///
/// Every operation is atomic: a failed debit or overflowing credit leaves
/// all balances unchanged.
pub trait TokenLedger: Send + Sync {
    fn balance_of(&self, token: TokenId, owner: &PublicKey) -> Result<u64>;

    /// Credits `amount` to `to`; returns the new balance.
    fn mint(&self, token: TokenId, to: &PublicKey, amount: u64) -> Result<u64>;

    /// Debits `amount` from `from`; returns the new balance.
    fn burn(&self, token: TokenId, from: &PublicKey, amount: u64) -> Result<u64>;

    fn transfer(
        &self,
        token: TokenId,
        from: &PublicKey,
        to: &PublicKey,
        amount: u64,
    ) -> Result<()>;
}

/// In-memory implementation of [`TokenLedger`].
#[derive(Default)]
pub struct InMemoryTokenLedger {
    balances: RwLock<Balances>,
}

impl InMemoryTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

type Balances = HashMap<(TokenId, PublicKey), u64>;

fn debit(balances: &Balances, token: TokenId, owner: &PublicKey, amount: u64) -> Result<u64> {
    let balance = balances.get(&(token, *owner)).copied().unwrap_or(0);
    balance
        .checked_sub(amount)
        .ok_or(RuntimeError::InsufficientBalance {
            owner: *owner,
            balance,
            requested: amount,
        })
}

fn credit(balances: &Balances, token: TokenId, owner: &PublicKey, amount: u64) -> Result<u64> {
    let balance = balances.get(&(token, *owner)).copied().unwrap_or(0);
    balance
        .checked_add(amount)
        .ok_or(RuntimeError::BalanceOverflow { owner: *owner })
}

impl TokenLedger for InMemoryTokenLedger {
    fn balance_of(&self, token: TokenId, owner: &PublicKey) -> Result<u64> {
        let balances = self
            .balances
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(balances.get(&(token, *owner)).copied().unwrap_or(0))
    }

    fn mint(&self, token: TokenId, to: &PublicKey, amount: u64) -> Result<u64> {
        let mut balances = self
            .balances
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let balance = credit(&balances, token, to, amount)?;
        balances.insert((token, *to), balance);
        Ok(balance)
    }

    fn burn(&self, token: TokenId, from: &PublicKey, amount: u64) -> Result<u64> {
        let mut balances = self
            .balances
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let balance = debit(&balances, token, from, amount)?;
        balances.insert((token, *from), balance);
        Ok(balance)
    }

    fn transfer(
        &self,
        token: TokenId,
        from: &PublicKey,
        to: &PublicKey,
        amount: u64,
    ) -> Result<()> {
        let mut balances = self
            .balances
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        if from == to {
            debit(&balances, token, from, amount)?;
            return Ok(());
        }

        let sender = debit(&balances, token, from, amount)?;
        let receiver = credit(&balances, token, to, amount)?;
        balances.insert((token, *from), sender);
        balances.insert((token, *to), receiver);
        Ok(())
    }
}
