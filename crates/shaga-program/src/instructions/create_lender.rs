//! Lender registration.

use shaga_core::{SHAGA_PROGRAM_ID, pda};
use tracing::info;

use crate::Result;
use crate::account::AccountRecord;
use crate::checks;
use crate::context::InstructionContext;
use crate::error::ShagaError;
use crate::events::ProgramEvent;
use crate::instruction::InitializeLenderAccounts;
use crate::states::Lender;

/// Creates the lender record for the signing wallet.
pub fn handle(ctx: &mut InstructionContext<'_>, accounts: &InitializeLenderAccounts) -> Result<()> {
    ctx.require_signer(&accounts.payer)?;
    checks::verify_system_program(&accounts.system_program)?;
    checks::verify_address("lender", &accounts.lender, pda::find_lender(&accounts.payer)?)?;

    let already = ShagaError::LenderAlreadyRegistered {
        authority: accounts.payer,
    };
    if ctx.exists(&accounts.lender)? {
        return Err(already);
    }
    ctx.init(
        &accounts.lender,
        SHAGA_PROGRAM_ID,
        Lender::new(accounts.payer).into_data(),
        already,
    )?;

    info!(lender = %accounts.lender, authority = %accounts.payer, "lender registered");
    ctx.emit(ProgramEvent::LenderRegistered {
        lender: accounts.lender,
        authority: accounts.payer,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use shaga_core::{Pubkey, SYSTEM_PROGRAM_ID};

    use crate::error::ShagaError;
    use crate::instruction::{self, InitializeLenderAccounts};
    use crate::states::Lender;
    use crate::test_utils::{Harness, SOL, lender_of};

    #[test]
    fn register_lender() {
        let mut harness = Harness::initialized();
        let authority = harness.funded(SOL);
        harness.send(&authority, &harness.lender_ix(&authority)).unwrap();
        let lender = harness.record::<Lender>(&lender_of(&authority)).unwrap();
        assert_eq!(lender, Lender::new(authority));
    }

    #[test]
    fn register_twice_rejected() {
        let mut harness = Harness::initialized();
        let authority = harness.funded(SOL);
        harness.send(&authority, &harness.lender_ix(&authority)).unwrap();
        let err = harness
            .send(&authority, &harness.lender_ix(&authority))
            .unwrap_err();
        assert_eq!(err, ShagaError::LenderAlreadyRegistered { authority });
    }

    #[test]
    fn register_at_foreign_address_rejected() {
        let mut harness = Harness::initialized();
        let authority = harness.funded(SOL);
        let ix = instruction::initialize_lender(&InitializeLenderAccounts {
            payer: authority,
            lender: lender_of(&Pubkey::new_unique()),
            system_program: SYSTEM_PROGRAM_ID,
        })
        .unwrap();
        let err = harness.send(&authority, &ix).unwrap_err();
        assert!(matches!(
            err,
            ShagaError::InvalidAccountAddress {
                account: "lender",
                ..
            }
        ));
    }
}
