//! Ledger submission.
//!
//! [`LedgerClient`] is the interface a deployment's RPC transport implements.
//! [`LocalCluster`] applies transactions directly to an in-process
//! [`Ledger`], which is what tests and local tooling run against.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use shaga_core::{Instruction, Keypair, Pubkey, Signature};
use shaga_program::{Account, Clock, Ledger, ProgramConfig, ProgramEvent, ScheduleFiring};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::Result;
use crate::config::{ClusterConfig, Commitment};
use crate::error::ClientError;
use crate::transaction::{MAX_TRANSACTION_AGE_SECS, Message, Transaction};

/// Outcome of an applied transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    /// Transaction id.
    pub id: Signature,
    /// Events emitted while applying.
    pub events: Vec<ProgramEvent>,
    /// Commitment reached before returning; `None` if the caller did not wait.
    pub commitment: Option<Commitment>,
}

/// Submission interface to the account ledger.
pub trait LedgerClient: Send + Sync {
    /// Reads the account at `address`.
    fn get_account(
        &self,
        address: &Pubkey,
    ) -> impl Future<Output = Result<Option<Account>>> + Send;

    /// Submits `transaction`; with `confirm`, waits for the configured commitment.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Rejected`] with the program reason code if the
    /// ledger refuses it.
    fn send_transaction(
        &self,
        transaction: &Transaction,
        confirm: bool,
    ) -> impl Future<Output = Result<TransactionReceipt>> + Send;

    /// Current ledger time.
    fn clock(&self) -> impl Future<Output = Result<Clock>> + Send;
}

/// Signs `instructions` and submits them as one transaction stamped with
/// the current ledger time.
pub async fn sign_and_send(
    client: &impl LedgerClient,
    signers: &[&Keypair],
    fee_payer: &Pubkey,
    instructions: Vec<Instruction>,
    confirm: bool,
) -> Result<TransactionReceipt> {
    let recent_timestamp = client.clock().await?.unix_timestamp;
    let message = Message::new(*fee_payer, recent_timestamp, instructions);
    let transaction = Transaction::new_signed(message, signers)?;
    client.send_transaction(&transaction, confirm).await
}

#[derive(Debug)]
struct ClusterState {
    ledger: Ledger,
    /// Applied ids still inside the acceptance window, with their recent timestamps.
    processed: HashMap<Signature, i64>,
}

/// An in-process cluster over a [`Ledger`].
///
/// Clones share the same ledger.
#[derive(Debug, Clone)]
pub struct LocalCluster {
    state: Arc<Mutex<ClusterState>>,
    config: ClusterConfig,
}

impl LocalCluster {
    /// A cluster over an empty ledger with `config` program parameters.
    #[must_use]
    pub fn new(config: ProgramConfig) -> Self {
        Self::from_ledger(Ledger::with_clock(config, Clock::now()))
    }

    /// A cluster over an existing ledger.
    #[must_use]
    pub fn from_ledger(ledger: Ledger) -> Self {
        Self {
            state: Arc::new(Mutex::new(ClusterState {
                ledger,
                processed: HashMap::new(),
            })),
            config: ClusterConfig::default(),
        }
    }

    /// Replaces the client configuration.
    #[must_use]
    pub fn with_config(mut self, config: ClusterConfig) -> Self {
        self.config = config;
        self
    }

    /// Client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Credits `lamports` to `address`.
    pub async fn airdrop(&self, address: &Pubkey, lamports: u64) -> Result<u64> {
        Ok(self.state.lock().await.ledger.airdrop(address, lamports)?)
    }

    /// Balance at `address`.
    pub async fn balance(&self, address: &Pubkey) -> u64 {
        self.state.lock().await.ledger.balance(address)
    }

    /// Sets ledger time.
    pub async fn set_clock(&self, clock: Clock) {
        self.state.lock().await.ledger.set_clock(clock);
    }

    /// Moves ledger time forward.
    pub async fn advance_clock(&self, seconds: i64) {
        self.state.lock().await.ledger.advance_clock(seconds);
    }

    /// A copy of the current ledger.
    pub async fn snapshot(&self) -> Ledger {
        self.state.lock().await.ledger.clone()
    }

    /// Delivers a schedule's stored instruction, signed as the schedule.
    ///
    /// Delivery is at-least-once, so this may be called for a schedule that
    /// already fired or was cancelled.
    pub async fn deliver_scheduled(
        &self,
        thread: &Pubkey,
        instruction: &Instruction,
    ) -> Result<Vec<ProgramEvent>> {
        Ok(self
            .state
            .lock()
            .await
            .ledger
            .process_scheduled(thread, instruction)?)
    }

    /// Fires every schedule whose trigger time has passed.
    pub async fn run_due_schedules(&self) -> Vec<ScheduleFiring> {
        let firings = self.state.lock().await.ledger.fire_due_schedules();
        for firing in &firings {
            match &firing.outcome {
                Ok(events) => {
                    info!(thread = %firing.thread, target = %firing.target, events = events.len(), "schedule fired");
                }
                Err(error) => {
                    warn!(thread = %firing.thread, target = %firing.target, code = error.code(), error = %error, "schedule rejected");
                }
            }
        }
        firings
    }
}

impl LedgerClient for LocalCluster {
    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>> {
        Ok(self.state.lock().await.ledger.account(address).cloned())
    }

    async fn send_transaction(
        &self,
        transaction: &Transaction,
        confirm: bool,
    ) -> Result<TransactionReceipt> {
        let signers = transaction.verify()?;
        let id = transaction
            .id()
            .ok_or_else(|| ClientError::Signing("transaction has no signatures".to_string()))?;

        let mut state = self.state.lock().await;
        let now = state.ledger.clock().unix_timestamp;
        let oldest = now.saturating_sub(MAX_TRANSACTION_AGE_SECS);
        state.processed.retain(|_, built| *built >= oldest);
        let recent_timestamp = transaction.message.recent_timestamp;
        if !transaction.message.is_valid_at(now) {
            return Err(ClientError::Expired {
                recent_timestamp,
                now,
            });
        }
        if state.processed.contains_key(&id) {
            return Err(ClientError::AlreadyProcessed { id });
        }
        debug!(
            id = %id,
            fee_payer = %transaction.message.fee_payer,
            instructions = transaction.message.instructions.len(),
            "submitting transaction"
        );
        let events = state
            .ledger
            .process_transaction(&transaction.message.instructions, &signers)?;
        state.processed.insert(id, recent_timestamp);
        drop(state);

        Ok(TransactionReceipt {
            id,
            events,
            commitment: confirm.then_some(self.config.commitment),
        })
    }

    async fn clock(&self) -> Result<Clock> {
        Ok(self.state.lock().await.ledger.clock())
    }
}
