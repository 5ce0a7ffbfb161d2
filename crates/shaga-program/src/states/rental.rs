use serde::{Deserialize, Serialize};
use shaga_core::Pubkey;

/// An active rental between a lender record and a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rental {
    /// The renting wallet.
    pub client: Pubkey,
    /// The rented affair.
    pub affair: Pubkey,
    /// Rent locked in escrow for the booked duration.
    pub rent_amount: u64,
    /// When the rental started.
    pub rental_start_time: u64,
    /// When the rental expires.
    pub rental_termination_time: u64,
    /// Execution address of the schedule that expires this rental.
    pub rental_clockwork_thread: Pubkey,
}

impl Rental {
    /// Booked duration in seconds.
    #[must_use]
    pub const fn duration(&self) -> u64 {
        self.rental_termination_time
            .saturating_sub(self.rental_start_time)
    }

    /// Returns true once the deadline is reached.
    #[must_use]
    pub const fn is_expired(&self, now: u64) -> bool {
        now >= self.rental_termination_time
    }
}
