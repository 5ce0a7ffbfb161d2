use serde::{Deserialize, Serialize};

/// Funds locked by the marketplace.
///
/// Used for the vault (accumulated fees) and for each per-rental escrow
/// (the rent for the booked duration).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Escrow {
    /// Lamports held on behalf of the marketplace or a rental.
    pub locked_amount: u64,
}

impl Escrow {
    /// An escrow holding `locked_amount`.
    #[must_use]
    pub const fn new(locked_amount: u64) -> Self {
        Self { locked_amount }
    }
}
