//! # shaga-client
//!
//! Builds and submits Shaga marketplace transactions.
//!
//! This crate provides:
//!
//! - [`builder`]: one request builder per marketplace operation, deriving
//!   every account address the program expects
//! - [`Transaction`]: signed instruction batches
//! - [`LedgerClient`]: the submission interface, with [`LocalCluster`] as an
//!   in-process implementation over the program's ledger
//! - [`ClusterConfig`]: endpoint and commitment settings
//!
//! Builders that need on-ledger data (the client recorded on an affair) read
//! it once before building. The program re-validates everything at apply
//! time, so a stale read fails cleanly rather than misapplying.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod builder;
pub mod cluster;
pub mod config;
pub mod error;
pub mod transaction;

pub use cluster::{LedgerClient, LocalCluster, TransactionReceipt, sign_and_send};
pub use config::{ClusterConfig, Commitment, Network};
pub use error::ClientError;
pub use transaction::{MAX_TRANSACTION_AGE_SECS, Message, Transaction};

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
