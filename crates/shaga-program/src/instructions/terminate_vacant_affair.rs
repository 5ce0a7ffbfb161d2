//! Closing a vacant affair, by its lender or by its expiry schedule.

use shaga_core::pda;
use tracing::{info, warn};

use crate::Result;
use crate::checks;
use crate::context::InstructionContext;
use crate::error::ShagaError;
use crate::events::ProgramEvent;
use crate::instruction::TerminateVacantAffairAccounts;
use crate::scheduler;
use crate::states::Affair;

/// Closes a listed affair and returns the lender record's balance to its owner.
///
/// When the expiry schedule fires and the affair is already closed, or is
/// rented (so the rental's schedule has taken over), nothing happens.
pub fn handle(
    ctx: &mut InstructionContext<'_>,
    accounts: &TerminateVacantAffairAccounts,
) -> Result<()> {
    let signer = accounts.signer;
    let authority = accounts.authority;
    ctx.require_signer(&signer)?;
    checks::verify_programs(&accounts.system_program, &accounts.clockwork_program)?;
    checks::verify_singletons(
        &accounts.affairs_list,
        &accounts.vault,
        &accounts.thread_authority,
    )?;
    checks::verify_address("affair", &accounts.affair, pda::find_affair(&authority)?)?;
    checks::verify_address("lender", &accounts.lender, pda::find_lender(&authority)?)?;
    let schedule = checks::affair_schedule(
        &accounts.thread_authority,
        &accounts.affair,
        &accounts.affair_clockwork_thread,
    )?;

    let automated = signer == schedule.thread;
    let record = ctx.load::<Affair>(&accounts.affair)?;
    let mut affair = if automated {
        let noop = match &record {
            None => Some("affair already terminated"),
            Some(affair) if affair.is_rented() => Some("affair is rented"),
            Some(_) => None,
        };
        if let Some(reason) = noop {
            warn!(thread = %signer, affair = %accounts.affair, reason, "affair expiry skipped");
            ctx.emit(ProgramEvent::AutomationNoOp {
                thread: signer,
                reason: reason.to_string(),
            });
            return Ok(());
        }
        let affair = record.ok_or(ShagaError::AffairNotFound {
            affair: accounts.affair,
        })?;
        let now = ctx.now();
        if now < affair.affair_termination_time {
            return Err(ShagaError::ScheduleFiredEarly {
                fire_at: affair.affair_termination_time,
                now,
            });
        }
        affair
    } else {
        if signer != authority {
            return Err(ShagaError::UnauthorizedTermination { caller: signer });
        }
        let affair = record.ok_or(ShagaError::AffairNotFound {
            affair: accounts.affair,
        })?;
        if affair.is_rented() {
            return Err(ShagaError::invalid_termination(
                "affair has an active rental, terminate it as occupied",
            ));
        }
        affair
    };
    if affair.authority != authority {
        return Err(ShagaError::UnauthorizedTermination { caller: authority });
    }
    let mut registry = checks::load_registry(ctx, &accounts.affairs_list)?;

    scheduler::thread_delete(
        ctx,
        &accounts.thread_authority,
        &authority,
        &schedule.thread,
    )?;
    registry.remove_affair(&accounts.affair);
    ctx.store(&accounts.affairs_list, registry)?;
    affair.terminate()?;
    ctx.close(&accounts.affair, &accounts.vault)?;
    let swept = super::sweep_lender(ctx, &accounts.lender, &authority)?;

    info!(
        affair = %accounts.affair,
        automated,
        swept_to_authority = swept,
        "vacant affair terminated"
    );
    ctx.emit(ProgramEvent::AffairTerminated {
        affair: accounts.affair,
        authority,
        swept_to_authority: swept,
    });
    Ok(())
}
