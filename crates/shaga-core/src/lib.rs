//! # shaga-core
//!
//! Primitives shared by the Shaga marketplace program and its client.
//!
//! This crate provides:
//!
//! - [`Pubkey`]: 32-byte account address with base58 display
//! - [`Keypair`] / [`Signature`]: Ed25519 signing identities
//! - [`Instruction`] / [`AccountMeta`]: a transition request as submitted to the ledger
//! - [`pda`]: deterministic program-derived addresses for every record namespace
//! - [`seeds`]: namespace tags and well-known program ids

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod instruction;
pub mod keypair;
pub mod pda;
pub mod pubkey;
pub mod seeds;

pub use error::{CoreError, Result};
pub use instruction::{AccountMeta, Instruction};
pub use keypair::{Keypair, Signature};
pub use pubkey::Pubkey;
pub use seeds::{SCHEDULER_PROGRAM_ID, SHAGA_PROGRAM_ID, SYSTEM_PROGRAM_ID};

/// Base units in one SOL.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;
