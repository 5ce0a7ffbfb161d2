//! Error types for shaga-program.
//!
//! Every rejection carries a stable numeric code (`6000 + ordinal`) and
//! belongs to exactly one [`ErrorKind`].

use serde::{Deserialize, Serialize};
use shaga_core::{CoreError, Pubkey};
use thiserror::Error;

/// First custom error code.
pub const ERROR_CODE_OFFSET: u32 = 6000;

/// Broad classification of a rejected transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Entity is in the wrong lifecycle state for the operation.
    PreconditionViolation,
    /// Caller lacks the required ownership or identity.
    AuthorizationFailure,
    /// Referenced entity does not exist at the derived address.
    NotFound,
    /// Malformed payload or account list.
    InvalidParameters,
    /// Caller cannot cover the required amount.
    InsufficientFunds,
    /// Ledger-level fault (overflow, corrupt record).
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PreconditionViolation => write!(f, "precondition_violation"),
            Self::AuthorizationFailure => write!(f, "authorization_failure"),
            Self::NotFound => write!(f, "not_found"),
            Self::InvalidParameters => write!(f, "invalid_parameters"),
            Self::InsufficientFunds => write!(f, "insufficient_funds"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// Errors returned by the marketplace program.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShagaError {
    /// Affair payload failed validation.
    #[error("invalid payload: {reason}")]
    InvalidPayload {
        /// What was wrong.
        reason: String,
    },

    /// Registry listing is at capacity.
    #[error("affairs list full")]
    AffairListFull,

    /// Client already holds the rental on this affair.
    #[error("client already in affair")]
    ClientAlreadyInAffair,

    /// Payer cannot cover the amount.
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        /// Lamports required.
        required: u64,
        /// Lamports available.
        available: u64,
    },

    /// Rental deadline is not in the future or beyond the allowed horizon.
    #[error("invalid rental termination time")]
    InvalidRentalTerminationTime,

    /// Affair deadline is not in the future.
    #[error("invalid termination time")]
    InvalidTerminationTime,

    /// Affair is already rented.
    #[error("affair occupied")]
    AffairAlreadyJoined,

    /// A schedule already exists at the derived address.
    #[error("schedule already exists: {thread}")]
    ScheduleAlreadyExists {
        /// Schedule execution address.
        thread: Pubkey,
    },

    /// No rental exists for the given (lender, client) pair.
    #[error("missing rental context for termination")]
    MissingRentalContext,

    /// Rental, escrow, and affair records do not reference each other.
    #[error("wrong rental context for termination")]
    InvalidRentalContext,

    /// Caller is not a registered lender.
    #[error("only registered lenders can create affairs")]
    UnauthorizedAffairCreation,

    /// Signer is neither the expected party nor the expected schedule.
    #[error("invalid signer: {signer}")]
    InvalidSigner {
        /// The rejected signer.
        signer: Pubkey,
    },

    /// Operation does not match the entity's occupancy.
    #[error("invalid termination instruction: {reason}")]
    InvalidTerminationInstruction {
        /// Why the termination path does not apply.
        reason: String,
    },

    /// Supplied rental schedule does not match its derivation.
    #[error("rental schedule key mismatch: expected {expected}, found {found}")]
    InvalidRentalClockworkKey {
        /// Derived address.
        expected: Pubkey,
        /// Supplied address.
        found: Pubkey,
    },

    /// Supplied affair schedule does not match its derivation.
    #[error("affair schedule key mismatch: expected {expected}, found {found}")]
    InvalidAffairClockworkKey {
        /// Derived address.
        expected: Pubkey,
        /// Supplied address.
        found: Pubkey,
    },

    /// Arithmetic overflow.
    #[error("numerical overflow")]
    NumericalOverflow,

    /// Registry was already created.
    #[error("registry already initialized")]
    RegistryAlreadyInitialized,

    /// Registry has not been created yet.
    #[error("registry not initialized")]
    RegistryNotInitialized,

    /// Authority already owns a lender record.
    #[error("lender already registered: {authority}")]
    LenderAlreadyRegistered {
        /// The authority.
        authority: Pubkey,
    },

    /// No lender record at the derived address.
    #[error("lender not found: {lender}")]
    LenderNotFound {
        /// Lender record address.
        lender: Pubkey,
    },

    /// Authority already lists an affair.
    #[error("affair already exists: {affair}")]
    AffairAlreadyExists {
        /// Affair address.
        affair: Pubkey,
    },

    /// No affair at the derived address.
    #[error("affair not found: {affair}")]
    AffairNotFound {
        /// Affair address.
        affair: Pubkey,
    },

    /// Caller does not own the affair.
    #[error("unauthorized termination by {caller}")]
    UnauthorizedTermination {
        /// The caller.
        caller: Pubkey,
    },

    /// Schedule fired before its trigger time.
    #[error("schedule fired early: fires at {fire_at}, now {now}")]
    ScheduleFiredEarly {
        /// Deadline the schedule guards.
        fire_at: u64,
        /// Ledger time of the attempt.
        now: u64,
    },

    /// Lender tried to rent their own affair.
    #[error("cannot rent own affair")]
    CannotRentOwnAffair,

    /// Supplied account does not match its derivation.
    #[error("invalid {account} address: expected {expected}, found {found}")]
    InvalidAccountAddress {
        /// Role of the account in the instruction.
        account: &'static str,
        /// Derived address.
        expected: Pubkey,
        /// Supplied address.
        found: Pubkey,
    },

    /// Handler touched an account the instruction did not list.
    #[error("account not provided: {key}")]
    MissingAccount {
        /// The account.
        key: Pubkey,
    },

    /// Handler wrote an account the instruction listed as read-only.
    #[error("account not writable: {key}")]
    AccountNotWritable {
        /// The account.
        key: Pubkey,
    },

    /// A required signature is absent.
    #[error("missing required signature: {key}")]
    MissingRequiredSignature {
        /// The account.
        key: Pubkey,
    },

    /// Account holds a different record type.
    #[error("account {key} does not hold a {expected} record")]
    InvalidAccountData {
        /// The account.
        key: Pubkey,
        /// Expected record type.
        expected: &'static str,
    },

    /// Instruction data or account list could not be decoded.
    #[error("invalid instruction data: {reason}")]
    InvalidInstructionData {
        /// Decode failure.
        reason: String,
    },

    /// Lifecycle transition not allowed.
    #[error("invalid state transition: {from} -> {to}")]
    InvalidStateTransition {
        /// Current state.
        from: String,
        /// Attempted state.
        to: String,
    },

    /// Address derivation failed.
    #[error("address derivation failed: {0}")]
    AddressDerivation(#[from] CoreError),
}

impl ShagaError {
    /// Stable numeric reason code.
    #[must_use]
    pub const fn code(&self) -> u32 {
        let ordinal = match self {
            Self::InvalidPayload { .. } => 0,
            Self::AffairListFull => 1,
            Self::ClientAlreadyInAffair => 2,
            Self::InsufficientFunds { .. } => 3,
            Self::InvalidRentalTerminationTime => 4,
            Self::InvalidTerminationTime => 5,
            Self::AffairAlreadyJoined => 6,
            Self::ScheduleAlreadyExists { .. } => 7,
            Self::MissingRentalContext => 8,
            Self::InvalidRentalContext => 9,
            Self::UnauthorizedAffairCreation => 10,
            Self::InvalidSigner { .. } => 11,
            Self::InvalidTerminationInstruction { .. } => 12,
            Self::InvalidRentalClockworkKey { .. } => 13,
            Self::InvalidAffairClockworkKey { .. } => 14,
            Self::NumericalOverflow => 15,
            Self::RegistryAlreadyInitialized => 16,
            Self::RegistryNotInitialized => 17,
            Self::LenderAlreadyRegistered { .. } => 18,
            Self::LenderNotFound { .. } => 19,
            Self::AffairAlreadyExists { .. } => 20,
            Self::AffairNotFound { .. } => 21,
            Self::UnauthorizedTermination { .. } => 22,
            Self::ScheduleFiredEarly { .. } => 23,
            Self::CannotRentOwnAffair => 24,
            Self::InvalidAccountAddress { .. } => 25,
            Self::MissingAccount { .. } => 26,
            Self::AccountNotWritable { .. } => 27,
            Self::MissingRequiredSignature { .. } => 28,
            Self::InvalidAccountData { .. } => 29,
            Self::InvalidInstructionData { .. } => 30,
            Self::InvalidStateTransition { .. } => 31,
            Self::AddressDerivation(_) => 32,
        };
        ERROR_CODE_OFFSET + ordinal
    }

    /// Classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::AffairListFull
            | Self::ClientAlreadyInAffair
            | Self::AffairAlreadyJoined
            | Self::ScheduleAlreadyExists { .. }
            | Self::InvalidRentalContext
            | Self::InvalidTerminationInstruction { .. }
            | Self::RegistryAlreadyInitialized
            | Self::LenderAlreadyRegistered { .. }
            | Self::AffairAlreadyExists { .. }
            | Self::CannotRentOwnAffair
            | Self::InvalidStateTransition { .. } => ErrorKind::PreconditionViolation,

            Self::UnauthorizedAffairCreation
            | Self::InvalidSigner { .. }
            | Self::UnauthorizedTermination { .. }
            | Self::ScheduleFiredEarly { .. }
            | Self::MissingRequiredSignature { .. } => ErrorKind::AuthorizationFailure,

            Self::MissingRentalContext
            | Self::RegistryNotInitialized
            | Self::LenderNotFound { .. }
            | Self::AffairNotFound { .. } => ErrorKind::NotFound,

            Self::InvalidPayload { .. }
            | Self::InvalidRentalTerminationTime
            | Self::InvalidTerminationTime
            | Self::InvalidRentalClockworkKey { .. }
            | Self::InvalidAffairClockworkKey { .. }
            | Self::InvalidAccountAddress { .. }
            | Self::MissingAccount { .. }
            | Self::AccountNotWritable { .. }
            | Self::InvalidInstructionData { .. } => ErrorKind::InvalidParameters,

            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,

            Self::NumericalOverflow
            | Self::InvalidAccountData { .. }
            | Self::AddressDerivation(_) => ErrorKind::Internal,
        }
    }

    /// Create an invalid payload error.
    #[must_use]
    pub fn invalid_payload(reason: impl Into<String>) -> Self {
        Self::InvalidPayload {
            reason: reason.into(),
        }
    }

    /// Create an invalid termination instruction error.
    #[must_use]
    pub fn invalid_termination(reason: impl Into<String>) -> Self {
        Self::InvalidTerminationInstruction {
            reason: reason.into(),
        }
    }
}

/// Errors loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("failed to read config file '{path}': {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// TOML did not parse.
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
