//! Per-instruction view of the ledger.
//!
//! Handlers read through the context and write into a change overlay. The
//! ledger commits the overlay only when every instruction in the transaction
//! succeeded, so a rejected transaction leaves no trace.

use std::collections::{HashMap, HashSet};

use shaga_core::{AccountMeta, Pubkey};

use crate::Result;
use crate::account::{Account, AccountData, AccountRecord};
use crate::clock::Clock;
use crate::config::ProgramConfig;
use crate::error::ShagaError;
use crate::events::ProgramEvent;

/// Pending account changes; `None` marks a closed account.
pub type ChangeSet = HashMap<Pubkey, Option<Account>>;

/// Everything a handler may touch while applying one instruction.
pub struct InstructionContext<'a> {
    base: &'a HashMap<Pubkey, Account>,
    changes: &'a mut ChangeSet,
    metas: &'a [AccountMeta],
    signers: &'a HashSet<Pubkey>,
    clock: Clock,
    config: &'a ProgramConfig,
    events: &'a mut Vec<ProgramEvent>,
}

impl<'a> InstructionContext<'a> {
    /// Creates a context over committed state plus pending changes.
    #[must_use]
    pub const fn new(
        base: &'a HashMap<Pubkey, Account>,
        changes: &'a mut ChangeSet,
        metas: &'a [AccountMeta],
        signers: &'a HashSet<Pubkey>,
        clock: Clock,
        config: &'a ProgramConfig,
        events: &'a mut Vec<ProgramEvent>,
    ) -> Self {
        Self {
            base,
            changes,
            metas,
            signers,
            clock,
            config,
            events,
        }
    }

    /// Ledger time in record units.
    #[must_use]
    pub fn now(&self) -> u64 {
        self.clock.unix_seconds()
    }

    /// The ledger clock.
    #[must_use]
    pub const fn clock(&self) -> Clock {
        self.clock
    }

    /// Program parameters.
    #[must_use]
    pub const fn config(&self) -> &ProgramConfig {
        self.config
    }

    /// The instruction's account list.
    #[must_use]
    pub const fn metas(&self) -> &'a [AccountMeta] {
        self.metas
    }

    /// Records an event for the transaction receipt.
    pub fn emit(&mut self, event: ProgramEvent) {
        self.events.push(event);
    }

    fn meta(&self, key: &Pubkey) -> Result<&AccountMeta> {
        self.metas
            .iter()
            .find(|meta| meta.pubkey == *key)
            .ok_or(ShagaError::MissingAccount { key: *key })
    }

    fn current(&self, key: &Pubkey) -> Option<&Account> {
        match self.changes.get(key) {
            Some(pending) => pending.as_ref(),
            None => self.base.get(key),
        }
    }

    fn require_writable(&self, key: &Pubkey) -> Result<()> {
        if self.meta(key)?.is_writable {
            Ok(())
        } else {
            Err(ShagaError::AccountNotWritable { key: *key })
        }
    }

    /// Returns true if `key` is listed as a signer and signed the transaction.
    #[must_use]
    pub fn is_signer(&self, key: &Pubkey) -> bool {
        self.signers.contains(key)
            && self
                .metas
                .iter()
                .any(|meta| meta.pubkey == *key && meta.is_signer)
    }

    /// Requires `key` to have signed.
    ///
    /// # Errors
    ///
    /// Returns [`ShagaError::MissingRequiredSignature`] otherwise.
    pub fn require_signer(&self, key: &Pubkey) -> Result<()> {
        if self.is_signer(key) {
            Ok(())
        } else {
            Err(ShagaError::MissingRequiredSignature { key: *key })
        }
    }

    /// The account at `key`, if it exists.
    ///
    /// # Errors
    ///
    /// Returns [`ShagaError::MissingAccount`] if the instruction does not list `key`.
    pub fn get(&self, key: &Pubkey) -> Result<Option<&Account>> {
        self.meta(key)?;
        Ok(self.current(key))
    }

    /// Returns true if an account exists at `key`.
    pub fn exists(&self, key: &Pubkey) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Balance at `key`; zero if the account does not exist.
    pub fn lamports(&self, key: &Pubkey) -> Result<u64> {
        Ok(self.get(key)?.map_or(0, |account| account.lamports))
    }

    /// Loads the record at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ShagaError::InvalidAccountData`] if the account holds a
    /// different record type.
    pub fn load<T: AccountRecord>(&self, key: &Pubkey) -> Result<Option<T>> {
        match self.get(key)? {
            None => Ok(None),
            Some(account) => T::from_data(&account.data).cloned().map(Some).ok_or(
                ShagaError::InvalidAccountData {
                    key: *key,
                    expected: T::NAME,
                },
            ),
        }
    }

    /// Overwrites the record at an existing account.
    pub fn store<T: AccountRecord>(&mut self, key: &Pubkey, record: T) -> Result<()> {
        self.require_writable(key)?;
        let mut account = self
            .current(key)
            .cloned()
            .ok_or(ShagaError::InvalidAccountData {
                key: *key,
                expected: T::NAME,
            })?;
        account.data = record.into_data();
        self.changes.insert(*key, Some(account));
        Ok(())
    }

    /// Creates an empty-balance account holding `data`.
    ///
    /// # Errors
    ///
    /// Returns `already` if an account exists at `key`.
    pub fn init(
        &mut self,
        key: &Pubkey,
        owner: Pubkey,
        data: AccountData,
        already: ShagaError,
    ) -> Result<()> {
        self.require_writable(key)?;
        if self.current(key).is_some() {
            return Err(already);
        }
        self.changes.insert(
            *key,
            Some(Account {
                lamports: 0,
                owner,
                data,
            }),
        );
        Ok(())
    }

    /// Moves lamports between accounts. A missing destination is created as a wallet.
    ///
    /// # Errors
    ///
    /// Returns [`ShagaError::InsufficientFunds`] if `from` holds less than `amount`.
    pub fn transfer(&mut self, from: &Pubkey, to: &Pubkey, amount: u64) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        self.require_writable(from)?;
        self.require_writable(to)?;

        let mut source = self.current(from).cloned().ok_or(ShagaError::InsufficientFunds {
            required: amount,
            available: 0,
        })?;
        source.lamports =
            source
                .lamports
                .checked_sub(amount)
                .ok_or(ShagaError::InsufficientFunds {
                    required: amount,
                    available: source.lamports,
                })?;
        self.changes.insert(*from, Some(source));

        let mut destination = self
            .current(to)
            .cloned()
            .unwrap_or_else(|| Account::system(0));
        destination.lamports = destination
            .lamports
            .checked_add(amount)
            .ok_or(ShagaError::NumericalOverflow)?;
        self.changes.insert(*to, Some(destination));
        Ok(())
    }

    /// Closes the account at `key`, moving its balance to `recipient`.
    ///
    /// Returns the lamports moved. Closing a missing account moves nothing.
    pub fn close(&mut self, key: &Pubkey, recipient: &Pubkey) -> Result<u64> {
        self.require_writable(key)?;
        let Some(lamports) = self.current(key).map(|account| account.lamports) else {
            return Ok(0);
        };
        self.transfer(key, recipient, lamports)?;
        self.changes.insert(*key, None);
        Ok(lamports)
    }
}
