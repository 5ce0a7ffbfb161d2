//! The account ledger.
//!
//! Holds every account and applies transactions atomically: each instruction
//! runs against committed state plus the writes of the instructions before
//! it, and the combined overlay is committed only if all of them succeed.
//!
//! The ledger also plays the scheduler's executor. [`Ledger::fire_due_schedules`]
//! submits the stored instruction of every schedule whose trigger has passed,
//! signed as that schedule.

use std::collections::{HashMap, HashSet};

use shaga_core::{Instruction, Pubkey, SHAGA_PROGRAM_ID};
use tracing::{debug, info, warn};

use crate::Result;
use crate::account::Account;
use crate::clock::Clock;
use crate::config::ProgramConfig;
use crate::context::{ChangeSet, InstructionContext};
use crate::error::ShagaError;
use crate::events::ProgramEvent;
use crate::processor;
use crate::scheduler::Thread;

/// Outcome of firing one due schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleFiring {
    /// Schedule execution address.
    pub thread: Pubkey,
    /// Affair or rental the schedule guards.
    pub target: Pubkey,
    /// Trigger time.
    pub fire_at: i64,
    /// Events on success, or the rejection.
    pub outcome: std::result::Result<Vec<ProgramEvent>, ShagaError>,
}

/// The authoritative key-addressed account store.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    accounts: HashMap<Pubkey, Account>,
    clock: Clock,
    config: ProgramConfig,
}

impl Ledger {
    /// An empty ledger with the given parameters, at time zero.
    #[must_use]
    pub fn new(config: ProgramConfig) -> Self {
        Self {
            accounts: HashMap::new(),
            clock: Clock::default(),
            config,
        }
    }

    /// An empty ledger at the given time.
    #[must_use]
    pub fn with_clock(config: ProgramConfig, clock: Clock) -> Self {
        Self {
            clock,
            ..Self::new(config)
        }
    }

    /// Program parameters.
    #[must_use]
    pub const fn config(&self) -> &ProgramConfig {
        &self.config
    }

    /// Current ledger time.
    #[must_use]
    pub const fn clock(&self) -> Clock {
        self.clock
    }

    /// Sets ledger time.
    pub const fn set_clock(&mut self, clock: Clock) {
        self.clock = clock;
    }

    /// Moves ledger time forward.
    pub fn advance_clock(&mut self, seconds: i64) {
        self.clock.advance(seconds);
    }

    /// Credits `lamports` to `key`, creating a wallet if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ShagaError::NumericalOverflow`] if the balance would overflow.
    pub fn airdrop(&mut self, key: &Pubkey, lamports: u64) -> Result<u64> {
        let account = self
            .accounts
            .entry(*key)
            .or_insert_with(|| Account::system(0));
        account.lamports = account
            .lamports
            .checked_add(lamports)
            .ok_or(ShagaError::NumericalOverflow)?;
        debug!(account = %key, lamports, balance = account.lamports, "airdrop");
        Ok(account.lamports)
    }

    /// The account at `key`.
    #[must_use]
    pub fn account(&self, key: &Pubkey) -> Option<&Account> {
        self.accounts.get(key)
    }

    /// Balance at `key`, zero if absent.
    #[must_use]
    pub fn balance(&self, key: &Pubkey) -> u64 {
        self.accounts.get(key).map_or(0, |account| account.lamports)
    }

    /// All accounts.
    pub fn accounts(&self) -> impl Iterator<Item = (&Pubkey, &Account)> {
        self.accounts.iter()
    }

    /// Sum of every balance. Only airdrops change it.
    #[must_use]
    pub fn total_lamports(&self) -> u128 {
        self.accounts
            .values()
            .map(|account| u128::from(account.lamports))
            .sum()
    }

    /// Applies `instructions` atomically.
    ///
    /// `signers` are the identities whose signatures the caller has verified.
    ///
    /// # Errors
    ///
    /// Returns the first rejection; no account is modified in that case.
    pub fn process_transaction(
        &mut self,
        instructions: &[Instruction],
        signers: &HashSet<Pubkey>,
    ) -> Result<Vec<ProgramEvent>> {
        for instruction in instructions {
            if instruction.program_id != SHAGA_PROGRAM_ID {
                return Err(ShagaError::InvalidInstructionData {
                    reason: format!("unknown program {}", instruction.program_id),
                });
            }
            if let Some(missing) = instruction
                .signer_keys()
                .find(|key| !signers.contains(*key))
            {
                return Err(ShagaError::MissingRequiredSignature { key: *missing });
            }
        }

        let mut changes = ChangeSet::new();
        let mut events = Vec::new();
        for instruction in instructions {
            let mut ctx = InstructionContext::new(
                &self.accounts,
                &mut changes,
                &instruction.accounts,
                signers,
                self.clock,
                &self.config,
                &mut events,
            );
            if let Err(error) = processor::process_instruction(&mut ctx, &instruction.data) {
                warn!(code = error.code(), kind = %error.kind(), error = %error, "transaction rejected");
                return Err(error);
            }
        }

        let touched = changes.len();
        for (key, change) in changes {
            match change {
                Some(account) => {
                    self.accounts.insert(key, account);
                }
                None => {
                    self.accounts.remove(&key);
                }
            }
        }
        info!(
            instructions = instructions.len(),
            accounts = touched,
            events = events.len(),
            "transaction applied"
        );
        Ok(events)
    }

    /// Schedules whose trigger time has passed, earliest first.
    #[must_use]
    pub fn due_schedules(&self) -> Vec<(Pubkey, Thread)> {
        let now = self.clock.unix_timestamp;
        let mut due: Vec<(Pubkey, Thread)> = self
            .accounts
            .iter()
            .filter_map(|(key, account)| {
                account
                    .record::<Thread>()
                    .filter(|thread| thread.trigger.is_due(now))
                    .map(|thread| (*key, thread.clone()))
            })
            .collect();
        due.sort_by_key(|(key, thread)| (thread.trigger.fire_at(), *key));
        due
    }

    /// Submits `instruction` signed as the schedule at `thread`.
    ///
    /// This is the scheduler's delivery path. It does not require the
    /// schedule to still exist, so a redelivered firing reaches its handler,
    /// which treats an already-settled target as a no-op.
    ///
    /// # Errors
    ///
    /// Returns the handler's rejection.
    pub fn process_scheduled(
        &mut self,
        thread: &Pubkey,
        instruction: &Instruction,
    ) -> Result<Vec<ProgramEvent>> {
        let signers: HashSet<Pubkey> = [*thread].into_iter().collect();
        debug!(thread = %thread, "delivering scheduled instruction");
        self.process_transaction(std::slice::from_ref(instruction), &signers)
    }

    /// Fires every due schedule once.
    pub fn fire_due_schedules(&mut self) -> Vec<ScheduleFiring> {
        self.due_schedules()
            .into_iter()
            .map(|(key, thread)| {
                let outcome = self.process_scheduled(&key, &thread.instruction);
                ScheduleFiring {
                    thread: key,
                    target: thread.target,
                    fire_at: thread.trigger.fire_at(),
                    outcome,
                }
            })
            .collect()
    }
}
