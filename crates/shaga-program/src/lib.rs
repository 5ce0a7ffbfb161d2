//! # shaga-program
//!
//! The rental marketplace state machine.
//!
//! This crate provides:
//!
//! - Entity records ([`Registry`], [`Lender`], [`Affair`], [`Rental`], [`Escrow`])
//! - An account [`Ledger`] that applies each transaction atomically
//! - The scheduled-task facility ([`scheduler`]) used for automatic expiry
//! - Per-operation handlers validating every transition
//! - Settlement math for escrow disbursement
//!
//! Every handler re-derives the addresses it is given and rejects mismatches,
//! so a request builder can never bind an escrow or rental to the wrong
//! `(lender, client)` pair.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod account;
pub mod checks;
pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod instruction;
pub mod instructions;
pub mod ledger;
pub mod processor;
pub mod scheduler;
pub mod settlement;
pub mod states;

#[cfg(test)]
mod test_utils;

pub use account::{Account, AccountData, AccountRecord};
pub use clock::Clock;
pub use config::ProgramConfig;
pub use context::InstructionContext;
pub use error::{ConfigError, ErrorKind, ShagaError};
pub use events::ProgramEvent;
pub use instruction::{RentalTerminationAuthority, ShagaInstruction};
pub use ledger::{Ledger, ScheduleFiring};
pub use scheduler::{Thread, Trigger};
pub use settlement::{RentQuote, Settlement, SettlementInput, calculate_payment, settle_rental};
pub use states::{Affair, AffairPayload, AffairState, Escrow, Lender, Registry, Rental};

/// Result type alias for program operations.
pub type Result<T> = std::result::Result<T, ShagaError>;
