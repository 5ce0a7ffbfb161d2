//! Transition requests.
//!
//! An [`Instruction`] names the program that validates it, the ordered list
//! of accounts it touches, and an opaque data payload (operation tag plus
//! parameters).

use serde::{Deserialize, Serialize};

use crate::pubkey::Pubkey;

/// A reference to an account taking part in an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountMeta {
    /// The account address.
    pub pubkey: Pubkey,
    /// Whether the instruction requires this account's signature.
    pub is_signer: bool,
    /// Whether the instruction may modify this account.
    pub is_writable: bool,
}

impl AccountMeta {
    /// A writable account reference.
    #[must_use]
    pub const fn new(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: true,
        }
    }

    /// A read-only account reference.
    #[must_use]
    pub const fn new_readonly(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: false,
        }
    }
}

/// A single transition request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    /// Program that validates and applies the request.
    pub program_id: Pubkey,
    /// Ordered account references.
    pub accounts: Vec<AccountMeta>,
    /// Operation tag and parameters.
    pub data: Vec<u8>,
}

impl Instruction {
    /// Creates an instruction.
    #[must_use]
    pub const fn new(program_id: Pubkey, accounts: Vec<AccountMeta>, data: Vec<u8>) -> Self {
        Self {
            program_id,
            accounts,
            data,
        }
    }

    /// Addresses that must sign, in account order.
    pub fn signer_keys(&self) -> impl Iterator<Item = &Pubkey> {
        self.accounts
            .iter()
            .filter(|meta| meta.is_signer)
            .map(|meta| &meta.pubkey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signer_keys_in_order() {
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        let c = Pubkey::new_unique();
        let ix = Instruction::new(
            Pubkey::new_unique(),
            vec![
                AccountMeta::new(a, true),
                AccountMeta::new_readonly(b, false),
                AccountMeta::new_readonly(c, true),
            ],
            vec![],
        );
        let signers: Vec<_> = ix.signer_keys().copied().collect();
        assert_eq!(signers, vec![a, c]);
    }

    #[test]
    fn account_meta_writability() {
        let key = Pubkey::new_unique();
        assert!(AccountMeta::new(key, false).is_writable);
        assert!(!AccountMeta::new_readonly(key, false).is_writable);
    }
}
