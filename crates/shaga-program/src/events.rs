//! Structured events returned with every applied transaction.

use serde::{Deserialize, Serialize};
use shaga_core::Pubkey;

use crate::instruction::RentalTerminationAuthority;

/// Something an applied transition did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgramEvent {
    /// The registry, vault, and thread authority were created.
    RegistryInitialized {
        /// Registry address.
        registry: Pubkey,
        /// Vault address.
        vault: Pubkey,
        /// Thread authority address.
        thread_authority: Pubkey,
    },
    /// A lender record was created.
    LenderRegistered {
        /// Lender record address.
        lender: Pubkey,
        /// Owning wallet.
        authority: Pubkey,
    },
    /// An affair was listed.
    AffairCreated {
        /// Affair address.
        affair: Pubkey,
        /// Owning wallet.
        authority: Pubkey,
        /// Hourly price in lamports.
        sol_per_hour: u64,
        /// Listing deadline.
        affair_termination_time: u64,
    },
    /// A client started a rental.
    RentalStarted {
        /// Affair address.
        affair: Pubkey,
        /// Rental address.
        rental: Pubkey,
        /// Renting wallet.
        client: Pubkey,
        /// Rent locked in escrow.
        rent_amount: u64,
        /// Marketplace fee paid to the vault.
        fee_amount: u64,
        /// Rental deadline.
        rental_termination_time: u64,
    },
    /// A rental ended and its escrow was disbursed.
    RentalSettled {
        /// Affair address.
        affair: Pubkey,
        /// Rental address.
        rental: Pubkey,
        /// Lender record address.
        lender: Pubkey,
        /// Renting wallet.
        client: Pubkey,
        /// Who ended the rental.
        termination_by: RentalTerminationAuthority,
        /// Lamports credited to the lender record.
        paid_to_lender: u64,
        /// Lamports returned to the client.
        refunded_to_client: u64,
    },
    /// An affair was closed.
    AffairTerminated {
        /// Affair address.
        affair: Pubkey,
        /// Owning wallet.
        authority: Pubkey,
        /// Lender record balance returned to the authority.
        swept_to_authority: u64,
    },
    /// A schedule was created.
    ScheduleCreated {
        /// Schedule execution address.
        thread: Pubkey,
        /// Affair or rental the schedule guards.
        target: Pubkey,
        /// Trigger time.
        fire_at: i64,
    },
    /// A schedule was cancelled or retired.
    ScheduleDeleted {
        /// Schedule execution address.
        thread: Pubkey,
    },
    /// A fired schedule found nothing left to do.
    AutomationNoOp {
        /// Schedule execution address.
        thread: Pubkey,
        /// Why nothing happened.
        reason: String,
    },
}
