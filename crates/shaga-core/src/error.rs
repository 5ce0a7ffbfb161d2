//! Error types for shaga-core.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur in core primitive operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Invalid address encoding or length.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// More seeds than a derivation accepts.
    #[error("too many seeds: {count} (max {max})")]
    TooManySeeds {
        /// Number of seeds supplied.
        count: usize,
        /// Maximum allowed.
        max: usize,
    },

    /// A single seed exceeds the allowed length.
    #[error("seed {index} is {len} bytes (max {max})")]
    SeedTooLong {
        /// Position of the offending seed.
        index: usize,
        /// Its length.
        len: usize,
        /// Maximum allowed.
        max: usize,
    },

    /// The derived address lies on the ed25519 curve.
    #[error("derived address is on the ed25519 curve")]
    OnCurve,

    /// No bump seed yields an off-curve address.
    #[error("unable to find a viable bump seed")]
    NoViableBump,

    /// Secret key material is malformed.
    #[error("invalid secret key: {0}")]
    InvalidSecretKey(String),

    /// Signature failed to parse or verify.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),
}
