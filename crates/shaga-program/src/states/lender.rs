use serde::{Deserialize, Serialize};
use shaga_core::Pubkey;

/// A registered lender: the authorization anchor for listing affairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lender {
    /// The owning wallet.
    pub authority: Pubkey,
    /// Rentals started against this lender's affairs.
    pub affairs: u32,
    /// Reputation: one point per settled rental, whichever path settled it.
    pub karma: i32,
}

impl Lender {
    /// A fresh lender record.
    #[must_use]
    pub const fn new(authority: Pubkey) -> Self {
        Self {
            authority,
            affairs: 0,
            karma: 0,
        }
    }

    /// Counts a started rental.
    pub const fn increment_affairs(&mut self) {
        self.affairs = self.affairs.saturating_add(1);
    }

    /// Credits a settled rental.
    pub const fn give_thumbs_up(&mut self) {
        self.karma = self.karma.saturating_add(1);
    }
}
