//! Closing an occupied affair.
//!
//! Settles the active rental on the lender's behalf and closes the affair in
//! the same transition, so the two can never be observed half-applied.

use shaga_core::pda;
use tracing::info;

use super::{Marketplace, RentalKeys};
use crate::Result;
use crate::checks;
use crate::context::InstructionContext;
use crate::error::ShagaError;
use crate::events::ProgramEvent;
use crate::instruction::{RentalTerminationAuthority, TerminateAffairAccounts};
use crate::scheduler;
use crate::settlement::{SettlementInput, settle_rental};
use crate::states::{Affair, Escrow, Lender, Rental};

/// Settles the active rental, then closes the affair.
pub fn handle(ctx: &mut InstructionContext<'_>, accounts: &TerminateAffairAccounts) -> Result<()> {
    let authority = accounts.authority;
    let client = accounts.client;
    ctx.require_signer(&authority)?;
    checks::verify_programs(&accounts.system_program, &accounts.clockwork_program)?;
    checks::verify_singletons(
        &accounts.affairs_list,
        &accounts.vault,
        &accounts.thread_authority,
    )?;
    checks::verify_address("affair", &accounts.affair, pda::find_affair(&authority)?)?;
    checks::verify_address("lender", &accounts.lender, pda::find_lender(&authority)?)?;

    let mut affair = ctx
        .load::<Affair>(&accounts.affair)?
        .ok_or(ShagaError::AffairNotFound {
            affair: accounts.affair,
        })?;
    if affair.authority != authority {
        return Err(ShagaError::UnauthorizedTermination { caller: authority });
    }
    if !affair.is_rented() {
        return Err(ShagaError::invalid_termination(
            "affair has no active rental, terminate it as vacant",
        ));
    }
    if affair.client != Some(client) {
        return Err(ShagaError::InvalidRentalContext);
    }
    checks::verify_address(
        "escrow",
        &accounts.escrow,
        pda::find_rent_escrow(&accounts.lender, &client)?,
    )?;
    checks::verify_address(
        "rental",
        &accounts.rental,
        pda::find_rental(&accounts.lender, &client)?,
    )?;
    let rental = ctx
        .load::<Rental>(&accounts.rental)?
        .ok_or(ShagaError::MissingRentalContext)?;
    if affair.rental != Some(accounts.rental)
        || rental.affair != accounts.affair
        || rental.client != client
    {
        return Err(ShagaError::InvalidRentalContext);
    }
    let rental_schedule = checks::rental_schedule(
        &accounts.thread_authority,
        &accounts.rental,
        &accounts.rental_clockwork_thread,
    )?;
    let affair_schedule = checks::affair_schedule(
        &accounts.thread_authority,
        &accounts.affair,
        &accounts.affair_clockwork_thread,
    )?;

    let escrow = ctx
        .load::<Escrow>(&accounts.escrow)?
        .ok_or(ShagaError::InvalidRentalContext)?;
    let mut lender = ctx
        .load::<Lender>(&accounts.lender)?
        .ok_or(ShagaError::LenderNotFound {
            lender: accounts.lender,
        })?;
    let mut registry = checks::load_registry(ctx, &accounts.affairs_list)?;
    let now = ctx.now();
    let settlement = settle_rental(&SettlementInput {
        rental_start_time: rental.rental_start_time,
        rental_termination_time: rental.rental_termination_time,
        now,
        sol_per_hour: affair.sol_per_hour,
        escrow_amount: escrow.locked_amount,
    });

    scheduler::thread_delete(
        ctx,
        &accounts.thread_authority,
        &client,
        &rental_schedule.thread,
    )?;
    scheduler::thread_delete(
        ctx,
        &accounts.thread_authority,
        &authority,
        &affair_schedule.thread,
    )?;
    let market = Marketplace {
        affairs_list: accounts.affairs_list,
        vault: accounts.vault,
        thread_authority: accounts.thread_authority,
    };
    let keys = RentalKeys {
        client,
        lender: accounts.lender,
        affair: accounts.affair,
        escrow: accounts.escrow,
        rental: accounts.rental,
    };
    super::disburse(ctx, &market, &keys, &settlement)?;

    lender.give_thumbs_up();
    ctx.store(&accounts.lender, lender)?;

    affair.terminate()?;
    ctx.close(&accounts.affair, &accounts.vault)?;
    registry.remove_affair(&accounts.affair);
    ctx.store(&accounts.affairs_list, registry)?;
    let swept = super::sweep_lender(ctx, &accounts.lender, &authority)?;

    info!(
        affair = %accounts.affair,
        rental = %accounts.rental,
        paid_to_lender = settlement.paid_to_lender,
        refunded_to_client = settlement.refunded_to_client,
        swept_to_authority = swept,
        "occupied affair terminated"
    );
    ctx.emit(ProgramEvent::RentalSettled {
        affair: accounts.affair,
        rental: accounts.rental,
        lender: accounts.lender,
        client,
        termination_by: RentalTerminationAuthority::Lender,
        paid_to_lender: settlement.paid_to_lender,
        refunded_to_client: settlement.refunded_to_client,
    });
    ctx.emit(ProgramEvent::AffairTerminated {
        affair: accounts.affair,
        authority,
        swept_to_authority: swept,
    });
    Ok(())
}
