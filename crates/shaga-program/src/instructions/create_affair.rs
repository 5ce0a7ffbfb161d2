//! Listing an affair.

use shaga_core::{SHAGA_PROGRAM_ID, pda};
use tracing::info;

use super::Marketplace;
use crate::Result;
use crate::account::AccountRecord;
use crate::checks;
use crate::context::InstructionContext;
use crate::error::ShagaError;
use crate::events::ProgramEvent;
use crate::instruction::CreateAffairAccounts;
use crate::states::{Affair, AffairPayload, Lender};

/// Lists an affair for a registered lender and schedules its expiry.
pub fn handle(
    ctx: &mut InstructionContext<'_>,
    accounts: &CreateAffairAccounts,
    payload: AffairPayload,
) -> Result<()> {
    let authority = accounts.authority;
    ctx.require_signer(&authority)?;
    checks::verify_programs(&accounts.system_program, &accounts.clockwork_program)?;
    checks::verify_singletons(
        &accounts.affairs_list,
        &accounts.vault,
        &accounts.thread_authority,
    )?;
    checks::verify_address("lender", &accounts.lender, pda::find_lender(&authority)?)?;
    checks::verify_address("affair", &accounts.affair, pda::find_affair(&authority)?)?;
    let schedule = checks::affair_schedule(
        &accounts.thread_authority,
        &accounts.affair,
        &accounts.affair_clockwork_thread,
    )?;

    let mut registry = checks::load_registry(ctx, &accounts.affairs_list)?;
    ctx.load::<Lender>(&accounts.lender)?
        .filter(|lender| lender.authority == authority)
        .ok_or(ShagaError::UnauthorizedAffairCreation)?;
    let already = ShagaError::AffairAlreadyExists {
        affair: accounts.affair,
    };
    if ctx.exists(&accounts.affair)? {
        return Err(already);
    }
    payload.validate(ctx.now())?;
    let deadline = payload.affair_termination_time;
    let sol_per_hour = payload.sol_per_hour;
    registry.register_affair(accounts.affair, ctx.config().max_affairs)?;
    let required = ctx.config().thread_fee;
    let available = ctx.lamports(&authority)?;
    if available < required {
        return Err(ShagaError::InsufficientFunds {
            required,
            available,
        });
    }

    ctx.init(
        &accounts.affair,
        SHAGA_PROGRAM_ID,
        Affair::new(authority, payload).into_data(),
        already,
    )?;
    ctx.store(&accounts.affairs_list, registry)?;
    let market = Marketplace {
        affairs_list: accounts.affairs_list,
        vault: accounts.vault,
        thread_authority: accounts.thread_authority,
    };
    super::schedule_affair_expiry(
        ctx,
        &market,
        &authority,
        &authority,
        &accounts.lender,
        &accounts.affair,
        schedule,
        deadline,
    )?;

    info!(
        affair = %accounts.affair,
        authority = %authority,
        sol_per_hour,
        affair_termination_time = deadline,
        "affair created"
    );
    ctx.emit(ProgramEvent::AffairCreated {
        affair: accounts.affair,
        authority,
        sol_per_hour,
        affair_termination_time: deadline,
    });
    Ok(())
}
