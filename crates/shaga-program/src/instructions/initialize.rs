//! Registry initialization.

use shaga_core::SHAGA_PROGRAM_ID;
use tracing::info;

use crate::Result;
use crate::account::{AccountData, AccountRecord};
use crate::checks;
use crate::context::InstructionContext;
use crate::error::ShagaError;
use crate::events::ProgramEvent;
use crate::instruction::InitializeAccounts;
use crate::states::{Escrow, Registry};

/// Creates the registry, the vault, and the thread authority. Runs once.
pub fn handle(ctx: &mut InstructionContext<'_>, accounts: &InitializeAccounts) -> Result<()> {
    ctx.require_signer(&accounts.payer)?;
    checks::verify_system_program(&accounts.system_program)?;
    checks::verify_singletons(
        &accounts.affairs_list,
        &accounts.vault,
        &accounts.thread_authority,
    )?;
    for key in [
        &accounts.affairs_list,
        &accounts.vault,
        &accounts.thread_authority,
    ] {
        if ctx.exists(key)? {
            return Err(ShagaError::RegistryAlreadyInitialized);
        }
    }

    let registry = Registry::new(accounts.vault, accounts.thread_authority);
    ctx.init(
        &accounts.affairs_list,
        SHAGA_PROGRAM_ID,
        registry.into_data(),
        ShagaError::RegistryAlreadyInitialized,
    )?;
    ctx.init(
        &accounts.vault,
        SHAGA_PROGRAM_ID,
        Escrow::default().into_data(),
        ShagaError::RegistryAlreadyInitialized,
    )?;
    ctx.init(
        &accounts.thread_authority,
        SHAGA_PROGRAM_ID,
        AccountData::ThreadAuthority,
        ShagaError::RegistryAlreadyInitialized,
    )?;

    info!(registry = %accounts.affairs_list, vault = %accounts.vault, "registry initialized");
    ctx.emit(ProgramEvent::RegistryInitialized {
        registry: accounts.affairs_list,
        vault: accounts.vault,
        thread_authority: accounts.thread_authority,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::error::ShagaError;
    use crate::states::{Escrow, Registry};
    use crate::test_utils::{Harness, SOL};

    #[test]
    fn initialize_creates_singletons() {
        let harness = Harness::initialized();
        let registry = harness.record::<Registry>(&harness.affairs_list).unwrap();
        assert_eq!(registry.vault, harness.vault);
        assert_eq!(registry.thread_authority, harness.thread_authority);
        assert!(registry.active_affairs.is_empty());
        assert_eq!(harness.record::<Escrow>(&harness.vault), Some(Escrow::new(0)));
        assert!(harness.ledger.account(&harness.thread_authority).is_some());
    }

    #[test]
    fn initialize_twice_rejected() {
        let mut harness = Harness::initialized();
        let payer = harness.funded(SOL);
        let err = harness
            .send(&payer, &harness.initialize_ix(&payer))
            .unwrap_err();
        assert_eq!(err, ShagaError::RegistryAlreadyInitialized);
    }

    #[test]
    fn initialize_with_foreign_vault_rejected() {
        let mut harness = Harness::new();
        let payer = harness.funded(SOL);
        harness.vault = shaga_core::Pubkey::new_unique();
        let err = harness
            .send(&payer, &harness.initialize_ix(&payer))
            .unwrap_err();
        assert!(matches!(
            err,
            ShagaError::InvalidAccountAddress {
                account: "vault",
                ..
            }
        ));
    }
}
