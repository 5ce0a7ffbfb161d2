//! Error types for shaga-client.

use shaga_core::{CoreError, Pubkey, Signature};
use shaga_program::{ErrorKind, ShagaError};
use thiserror::Error;

/// Errors raised while building, signing or submitting transactions.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A builder looked up an account that does not exist.
    #[error("account not found: {address}")]
    AccountNotFound {
        /// The missing address.
        address: Pubkey,
    },

    /// A builder found an account holding a different record type.
    #[error("account {address} is not a {expected}")]
    UnexpectedAccountType {
        /// The account read.
        address: Pubkey,
        /// Expected record type.
        expected: &'static str,
    },

    /// The affair has no client to build a rental request for.
    #[error("affair {affair} has no active rental")]
    NoActiveRental {
        /// The vacant affair.
        affair: Pubkey,
    },

    /// The ledger rejected the transaction.
    #[error("transaction rejected ({kind}, code {code}): {message}")]
    Rejected {
        /// Program reason code.
        code: u32,
        /// Category of the rejection.
        kind: ErrorKind,
        /// Human-readable reason.
        message: String,
    },

    /// A transaction with this id was already applied.
    #[error("transaction {id} already processed")]
    AlreadyProcessed {
        /// The replayed transaction id.
        id: Signature,
    },

    /// The message was built outside the ledger's acceptance window.
    #[error("transaction built at {recent_timestamp} is not valid at ledger time {now}")]
    Expired {
        /// The message's recent timestamp.
        recent_timestamp: i64,
        /// Ledger time at submission.
        now: i64,
    },

    /// A required signature is absent or invalid.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Request construction failed.
    #[error("request build failed: {0}")]
    Build(String),

    /// Configuration failed to load or validate.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization failure.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// The program reason code, if the ledger rejected the transaction.
    #[must_use]
    pub const fn code(&self) -> Option<u32> {
        match self {
            Self::Rejected { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Returns true if the ledger rejected the transaction with `error`.
    #[must_use]
    pub fn is_rejection(&self, error: &ShagaError) -> bool {
        self.code() == Some(error.code())
    }
}

impl From<ShagaError> for ClientError {
    fn from(error: ShagaError) -> Self {
        Self::Rejected {
            code: error.code(),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

impl From<CoreError> for ClientError {
    fn from(error: CoreError) -> Self {
        Self::Build(error.to_string())
    }
}

impl From<shaga_program::ConfigError> for ClientError {
    fn from(error: shaga_program::ConfigError) -> Self {
        Self::Config(error.to_string())
    }
}
