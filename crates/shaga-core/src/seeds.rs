//! Namespace tags and well-known program ids.

use crate::pubkey::Pubkey;

/// Registry (active affair listing) namespace.
pub const SEED_AFFAIR_LIST: &[u8] = b"affair_list";
/// Vault and per-rental escrow namespace.
pub const SEED_ESCROW: &[u8] = b"escrow";
/// Per-authority lender namespace.
pub const SEED_LENDER: &[u8] = b"lender";
/// Per-authority affair namespace.
pub const SEED_AFFAIR: &[u8] = b"affair";
/// Per-(lender, client) rental namespace.
pub const SEED_RENTAL: &[u8] = b"rental";
/// Schedule id and schedule execution namespace.
pub const SEED_THREAD: &[u8] = b"thread";
/// Thread authority namespace.
pub const SEED_AUTHORITY_THREAD: &[u8] = b"authority_thread";

/// The marketplace program (`9SwYZxTQUYruFSHYeTqrtB5pTtuGJEGksh7ufpNS1YK5`).
pub const SHAGA_PROGRAM_ID: Pubkey = Pubkey::new_from_array([
    125, 130, 176, 101, 167, 60, 157, 140, 49, 241, 83, 40, 120, 4, 181, 19, 194, 233, 180, 224,
    81, 188, 51, 129, 245, 13, 38, 203, 59, 14, 12, 228,
]);

/// The scheduled-task program (`CLoCKyJ6DXBJqqu2VWx9RLbgnwwR6BMHHuyasVmfMzBh`).
pub const SCHEDULER_PROGRAM_ID: Pubkey = Pubkey::new_from_array([
    168, 130, 211, 34, 180, 16, 11, 91, 210, 107, 238, 73, 114, 36, 220, 100, 86, 253, 186, 23,
    29, 123, 105, 187, 8, 124, 106, 153, 176, 24, 159, 112,
]);

/// The system program (`11111111111111111111111111111111`).
pub const SYSTEM_PROGRAM_ID: Pubkey = Pubkey::new_from_array([0; 32]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_ids_match_base58() {
        assert_eq!(
            SHAGA_PROGRAM_ID.to_string(),
            "9SwYZxTQUYruFSHYeTqrtB5pTtuGJEGksh7ufpNS1YK5"
        );
        assert_eq!(
            SCHEDULER_PROGRAM_ID.to_string(),
            "CLoCKyJ6DXBJqqu2VWx9RLbgnwwR6BMHHuyasVmfMzBh"
        );
        assert_eq!(
            SYSTEM_PROGRAM_ID.to_string(),
            "11111111111111111111111111111111"
        );
    }
}
