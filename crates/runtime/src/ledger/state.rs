//! Named state fields with optimistic preconditions.
//!
//! A [`StateTransaction`] bundles preconditions (`field == expected`, or
//! `field` unset) with writes. The ledger checks every precondition and
//! applies every write under one write lock, so a transaction either lands
//! whole or not at all.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use rollup_core::{ChainPointer, Field};
use serde::{Deserialize, Serialize};
use zk::PublicKey;

use crate::api::{Result, RuntimeError};
use crate::repository::RepositoryError;

/// Committed account layout of the counter contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateField {
    Counter,
    ActionsHash,
    Num,
    Deployer,
    RewardToken,
    BlockHeight,
}

impl StateField {
    pub const fn as_str(self) -> &'static str {
        match self {
            StateField::Counter => "counter",
            StateField::ActionsHash => "actions_hash",
            StateField::Num => "num",
            StateField::Deployer => "deployer",
            StateField::RewardToken => "reward_token",
            StateField::BlockHeight => "block_height",
        }
    }
}

impl fmt::Display for StateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateValue {
    Field(Field),
    Pointer(ChainPointer),
    Key(PublicKey),
    Height(u32),
}

impl StateValue {
    pub const fn kind(&self) -> &'static str {
        match self {
            StateValue::Field(_) => "field",
            StateValue::Pointer(_) => "pointer",
            StateValue::Key(_) => "key",
            StateValue::Height(_) => "height",
        }
    }
}

impl From<Field> for StateValue {
    fn from(value: Field) -> Self {
        StateValue::Field(value)
    }
}

impl From<ChainPointer> for StateValue {
    fn from(value: ChainPointer) -> Self {
        StateValue::Pointer(value)
    }
}

impl From<PublicKey> for StateValue {
    fn from(value: PublicKey) -> Self {
        StateValue::Key(value)
    }
}

/// All-or-nothing update guarded by preconditions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateTransaction {
    preconditions: Vec<(StateField, Option<StateValue>)>,
    writes: Vec<(StateField, StateValue)>,
}

impl StateTransaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires `field` to hold `value` at commit time.
    pub fn require(mut self, field: StateField, value: impl Into<StateValue>) -> Self {
        self.preconditions.push((field, Some(value.into())));
        self
    }

    /// Requires `field` to be unset at commit time.
    pub fn require_unset(mut self, field: StateField) -> Self {
        self.preconditions.push((field, None));
        self
    }

    pub fn set(mut self, field: StateField, value: impl Into<StateValue>) -> Self {
        self.writes.push((field, value.into()));
        self
    }

    pub fn preconditions(&self) -> &[(StateField, Option<StateValue>)] {
        &self.preconditions
    }

    pub fn writes(&self) -> &[(StateField, StateValue)] {
        &self.writes
    }
}

/// Ledger collaborator holding the committed state fields.
pub trait StateLedger: Send + Sync {
    fn read(&self, field: StateField) -> Result<Option<StateValue>>;

    /// Applies `transaction` if every precondition holds.
    ///
    /// Fails with `PreconditionFailed` naming the first field that does not
    /// match; nothing is written in that case.
    fn commit(&self, transaction: StateTransaction) -> Result<()>;

    fn read_field(&self, field: StateField) -> Result<Field> {
        match self.read(field)? {
            Some(StateValue::Field(value)) => Ok(value),
            Some(other) => Err(mismatch(field, &other)),
            None => Err(RuntimeError::MissingField(field)),
        }
    }

    fn read_pointer(&self, field: StateField) -> Result<ChainPointer> {
        match self.read(field)? {
            Some(StateValue::Pointer(value)) => Ok(value),
            Some(other) => Err(mismatch(field, &other)),
            None => Err(RuntimeError::MissingField(field)),
        }
    }

    fn read_key(&self, field: StateField) -> Result<PublicKey> {
        match self.read(field)? {
            Some(StateValue::Key(value)) => Ok(value),
            Some(other) => Err(mismatch(field, &other)),
            None => Err(RuntimeError::MissingField(field)),
        }
    }
}

fn mismatch(field: StateField, found: &StateValue) -> RuntimeError {
    RuntimeError::FieldTypeMismatch {
        field,
        found: found.kind(),
    }
}

/// In-memory implementation of [`StateLedger`].
pub struct InMemoryLedger {
    fields: RwLock<HashMap<StateField, StateValue>>,
}

impl InMemoryLedger {
    /// Create an empty ledger (no contract deployed).
    pub fn new() -> Self {
        Self {
            fields: RwLock::new(HashMap::new()),
        }
    }

    /// Copy of every set field.
    pub fn snapshot(&self) -> Result<HashMap<StateField, StateValue>> {
        let fields = self
            .fields
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(fields.clone())
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl StateLedger for InMemoryLedger {
    fn read(&self, field: StateField) -> Result<Option<StateValue>> {
        let fields = self
            .fields
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(fields.get(&field).copied())
    }

    fn commit(&self, transaction: StateTransaction) -> Result<()> {
        let mut fields = self
            .fields
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;

        for (field, expected) in transaction.preconditions() {
            if fields.get(field) != expected.as_ref() {
                tracing::debug!(%field, "precondition failed");
                return Err(RuntimeError::PreconditionFailed { field: *field });
            }
        }

        for (field, value) in transaction.writes {
            fields.insert(field, value);
        }
        Ok(())
    }
}
