use serde::{Deserialize, Serialize};
use shaga_core::Pubkey;

use crate::Result;
use crate::error::ShagaError;

/// The singleton marketplace registry and its listing of live affairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    /// The marketplace vault.
    pub vault: Pubkey,
    /// Authority that owns every marketplace schedule.
    pub thread_authority: Pubkey,
    /// Affairs currently listed or rented.
    pub active_affairs: Vec<Pubkey>,
}

impl Registry {
    /// An empty registry.
    #[must_use]
    pub const fn new(vault: Pubkey, thread_authority: Pubkey) -> Self {
        Self {
            vault,
            thread_authority,
            active_affairs: Vec::new(),
        }
    }

    /// Adds an affair to the listing.
    ///
    /// # Errors
    ///
    /// Returns [`ShagaError::AffairListFull`] when the listing holds
    /// `capacity` entries.
    pub fn register_affair(&mut self, affair: Pubkey, capacity: usize) -> Result<()> {
        if self.active_affairs.contains(&affair) {
            return Ok(());
        }
        if self.active_affairs.len() >= capacity {
            return Err(ShagaError::AffairListFull);
        }
        self.active_affairs.push(affair);
        Ok(())
    }

    /// Removes an affair from the listing. Absent entries are ignored.
    pub fn remove_affair(&mut self, affair: &Pubkey) {
        self.active_affairs.retain(|listed| listed != affair);
    }

    /// Returns true if the affair is listed.
    #[must_use]
    pub fn contains(&self, affair: &Pubkey) -> bool {
        self.active_affairs.contains(affair)
    }

    /// Returns true if another affair would not fit.
    #[must_use]
    pub fn is_full(&self, capacity: usize) -> bool {
        self.active_affairs.len() >= capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Registry {
        Registry::new(Pubkey::new_unique(), Pubkey::new_unique())
    }

    #[test]
    fn register_and_remove() {
        let mut registry = registry();
        let affair = Pubkey::new_unique();
        registry.register_affair(affair, 10).unwrap();
        assert!(registry.contains(&affair));
        registry.remove_affair(&affair);
        assert!(!registry.contains(&affair));
    }

    #[test]
    fn full_listing_rejects() {
        let mut registry = registry();
        registry.register_affair(Pubkey::new_unique(), 2).unwrap();
        registry.register_affair(Pubkey::new_unique(), 2).unwrap();
        assert!(registry.is_full(2));
        let err = registry.register_affair(Pubkey::new_unique(), 2).unwrap_err();
        assert_eq!(err, ShagaError::AffairListFull);
    }

    #[test]
    fn register_is_idempotent() {
        let mut registry = registry();
        let affair = Pubkey::new_unique();
        registry.register_affair(affair, 1).unwrap();
        registry.register_affair(affair, 1).unwrap();
        assert_eq!(registry.active_affairs.len(), 1);
    }

    #[test]
    fn remove_absent_is_noop() {
        let mut registry = registry();
        registry.remove_affair(&Pubkey::new_unique());
        assert!(registry.active_affairs.is_empty());
    }
}
