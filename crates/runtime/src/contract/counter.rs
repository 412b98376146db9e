//! Counter contract: a rolled-up counter plus a contract-issued token.
//!
//! Counter updates are dispatched as actions and only reach the committed
//! state through [`CounterContract::rollup`]. Everything else (`num`, the
//! deployer, the reward token address) is written directly through guarded
//! ledger transactions.

use std::sync::Arc;

use rollup_core::{AdditiveFold, ChainPointer, Checkpoint, ClampedCounter, Field, ReducePolicy};
use tracing::{debug, info};
use zk::PublicKey;

use super::reward::{RewardToken, SHARED_SECRET, secret_commitment};
use crate::api::{Result, RuntimeError};
use crate::events::{ContractEvent, Event, EventBus, RollupEvent};
use crate::ledger::{StateField, StateLedger, StateTransaction, StateValue, TokenId, TokenLedger};
use crate::repository::ActionRepository;
use crate::rollup::RollupReducer;

/// Value of `num` right after deployment.
pub const NUM_GENESIS: Field = Field::ONE;

/// Contract tokens minted per `mint_new_tokens` call.
pub const MINT_AMOUNT: u64 = 10_000;

/// The reward token receives `MINT_AMOUNT / REWARD_SHARE_DIVISOR`.
pub const REWARD_SHARE_DIVISOR: u64 = 100;

const DEFAULT_RETRY_LIMIT: u32 = 3;

pub struct CounterContract<P: ReducePolicy> {
    address: PublicKey,
    reducer: RollupReducer<P>,
    ledger: Arc<dyn StateLedger>,
    tokens: Arc<dyn TokenLedger>,
    events: EventBus,
    secret: Field,
    retry_limit: u32,
}

impl<P> CounterContract<P>
where
    P: ReducePolicy<State = Field>,
{
    pub fn new(
        address: PublicKey,
        policy: P,
        log: Arc<dyn ActionRepository<P::Action>>,
        ledger: Arc<dyn StateLedger>,
        tokens: Arc<dyn TokenLedger>,
        events: EventBus,
    ) -> Self {
        let reducer = RollupReducer::new(policy, log, ledger.clone(), events.clone());
        Self {
            address,
            reducer,
            ledger,
            tokens,
            events,
            secret: SHARED_SECRET,
            retry_limit: DEFAULT_RETRY_LIMIT,
        }
    }

    /// Attempts allowed for operations that retry lost races.
    pub fn with_retry_limit(mut self, retry_limit: u32) -> Self {
        self.retry_limit = retry_limit.max(1);
        self
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

    pub fn reducer(&self) -> &RollupReducer<P> {
        &self.reducer
    }

    /// Initializes every state field. Fails if already deployed.
    pub fn deploy(&self, deployer: PublicKey, block_height: u32) -> Result<()> {
        let transaction = StateTransaction::new()
            .require_unset(StateField::Deployer)
            .set(StateField::Num, NUM_GENESIS)
            .set(StateField::Counter, self.reducer.policy().genesis())
            .set(StateField::ActionsHash, ChainPointer::INITIAL)
            .set(StateField::Deployer, deployer)
            .set(StateField::BlockHeight, StateValue::Height(block_height));

        match self.ledger.commit(transaction) {
            Ok(()) => {}
            Err(RuntimeError::PreconditionFailed { .. }) => {
                return Err(RuntimeError::AlreadyInitialized);
            }
            Err(e) => return Err(e),
        }

        info!(
            deployer = %deployer,
            block_height,
            policy = self.reducer.policy().name(),
            "counter contract deployed"
        );
        self.events
            .publish(Event::Contract(ContractEvent::DeployedBy {
                deployer,
                block_height,
            }));
        Ok(())
    }

    /// Appends `action` to the pending log. Committed state is untouched.
    pub fn dispatch(&self, action: P::Action) -> Result<ChainPointer> {
        let pointer = self.reducer.log().dispatch(action)?;
        self.events
            .publish(Event::Rollup(RollupEvent::ActionDispatched { pointer }));
        Ok(pointer)
    }

    pub fn committed(&self) -> Result<Checkpoint<Field>> {
        self.reducer.committed()
    }

    pub fn counter(&self) -> Result<Field> {
        self.ledger.read_field(StateField::Counter)
    }

    pub fn num(&self) -> Result<Field> {
        self.ledger.read_field(StateField::Num)
    }

    pub fn deployer(&self) -> Result<PublicKey> {
        self.ledger.read_key(StateField::Deployer)
    }

    pub fn rollup(&self, checkpoint: &Checkpoint<Field>) -> Result<Checkpoint<Field>> {
        self.reducer.rollup(checkpoint)
    }

    /// Rolls up from the committed checkpoint, retrying lost races.
    pub fn rollup_latest(&self) -> Result<Checkpoint<Field>> {
        self.reducer.rollup_latest(self.retry_limit)
    }

    /// Records the reward token address. Deployer only.
    pub fn set_reward_token(&self, sender: PublicKey, address: PublicKey) -> Result<()> {
        let deployer = self.deployer()?;
        if sender != deployer {
            return Err(RuntimeError::NotDeployer { sender });
        }

        self.ledger.commit(
            StateTransaction::new()
                .require(StateField::Deployer, deployer)
                .set(StateField::RewardToken, address),
        )?;
        self.events
            .publish(Event::Contract(ContractEvent::RewardTokenSet { address }));
        Ok(())
    }

    /// Adds `by` to `num` directly, outside the action log.
    pub fn update_num(&self, by: Field) -> Result<Field> {
        let mut attempt = 1;
        loop {
            let current = self.num()?;
            let next = current + by;
            let transaction = StateTransaction::new()
                .require(StateField::Num, current)
                .set(StateField::Num, next);

            match self.ledger.commit(transaction) {
                Ok(()) => {
                    self.events
                        .publish(Event::Contract(ContractEvent::UpdatedNum { num: next }));
                    return Ok(next);
                }
                Err(e) if e.is_recoverable() && attempt < self.retry_limit => {
                    debug!(attempt, "num changed underneath update, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub fn veteran_update(&self) -> Result<Field> {
        self.update_num(Field::new(2))
    }

    pub fn regular_update(&self) -> Result<Field> {
        self.update_num(Field::ONE)
    }

    /// Mints contract tokens to `receiver` and a share of reward tokens to
    /// this contract.
    ///
    /// `reward` must be the token recorded by `set_reward_token`. The reward
    /// share is minted first, so a rejected commitment mints nothing.
    pub fn mint_new_tokens(&self, receiver: PublicKey, reward: &RewardToken) -> Result<u64> {
        let configured = self.ledger.read_key(StateField::RewardToken)?;
        if configured != reward.address() {
            return Err(RuntimeError::UnauthorizedTransition {
                caller: reward.address(),
                expected: configured,
            });
        }

        let share = MINT_AMOUNT / REWARD_SHARE_DIVISOR;
        reward.mint_new_tokens(self.address, secret_commitment(self.secret), share)?;

        // The contract's reward balance has no spender, so the revoke cannot
        // be front-run.
        let balance = match self.tokens.mint(self.token_id(), &receiver, MINT_AMOUNT) {
            Ok(balance) => balance,
            Err(e) => {
                if let Err(revoke) = reward.revoke(self.address, share) {
                    tracing::error!(error = %revoke, "failed to revoke reward share");
                }
                return Err(e);
            }
        };

        self.events
            .publish(Event::Contract(ContractEvent::TokensMinted {
                issuer: self.address,
                recipient: receiver,
                amount: MINT_AMOUNT,
            }));
        Ok(balance)
    }

    pub fn send_tokens(&self, sender: PublicKey, receiver: PublicKey, amount: u64) -> Result<()> {
        self.tokens
            .transfer(self.token_id(), &sender, &receiver, amount)
    }

    pub fn burn_tokens(&self, owner: PublicKey, amount: u64) -> Result<u64> {
        self.tokens.burn(self.token_id(), &owner, amount)
    }

    pub fn balance_of(&self, owner: &PublicKey) -> Result<u64> {
        self.tokens.balance_of(self.token_id(), owner)
    }
}

impl CounterContract<AdditiveFold> {
    pub fn increment_counter(&self) -> Result<ChainPointer> {
        self.dispatch(Field::ONE)
    }

    pub fn increment_counter_by_2(&self) -> Result<ChainPointer> {
        self.dispatch(Field::new(2))
    }
}

impl CounterContract<ClampedCounter> {
    pub fn increment_counter(&self) -> Result<ChainPointer> {
        self.dispatch(true)
    }

    pub fn decrease_counter(&self) -> Result<ChainPointer> {
        self.dispatch(false)
    }
}
