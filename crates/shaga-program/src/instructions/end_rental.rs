//! Ending a rental, by its client or by its expiry schedule.

use shaga_core::pda;
use tracing::{info, warn};

use super::{Marketplace, RentalKeys};
use crate::Result;
use crate::checks;
use crate::context::InstructionContext;
use crate::error::ShagaError;
use crate::events::ProgramEvent;
use crate::instruction::{EndRentalAccounts, RentalTerminationAuthority};
use crate::scheduler;
use crate::settlement::{SettlementInput, settle_rental};
use crate::states::{Affair, Escrow, Lender, Rental};

/// Settles a rental and relists its affair.
///
/// A fired schedule that finds the rental already gone is accepted as a
/// no-op, since schedules may be delivered more than once.
pub fn handle(
    ctx: &mut InstructionContext<'_>,
    accounts: &EndRentalAccounts,
    termination_by: RentalTerminationAuthority,
) -> Result<()> {
    let signer = accounts.signer;
    let client = accounts.client;
    ctx.require_signer(&signer)?;
    checks::verify_programs(&accounts.system_program, &accounts.clockwork_program)?;
    checks::verify_singletons(
        &accounts.affairs_list,
        &accounts.vault,
        &accounts.thread_authority,
    )?;
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
    let rental_schedule = checks::rental_schedule(
        &accounts.thread_authority,
        &accounts.rental,
        &accounts.rental_clockwork_thread,
    )?;

    match termination_by {
        RentalTerminationAuthority::Client if signer != client => {
            return Err(ShagaError::InvalidSigner { signer });
        }
        RentalTerminationAuthority::Clockwork if signer != rental_schedule.thread => {
            return Err(ShagaError::InvalidSigner { signer });
        }
        RentalTerminationAuthority::Lender => {
            return Err(ShagaError::invalid_termination(
                "lenders end rentals by terminating the affair",
            ));
        }
        RentalTerminationAuthority::Client | RentalTerminationAuthority::Clockwork => {}
    }

    let Some(rental) = ctx.load::<Rental>(&accounts.rental)? else {
        if termination_by == RentalTerminationAuthority::Clockwork {
            warn!(thread = %signer, rental = %accounts.rental, "rental already settled");
            ctx.emit(ProgramEvent::AutomationNoOp {
                thread: signer,
                reason: "rental already settled".to_string(),
            });
            return Ok(());
        }
        return Err(ShagaError::MissingRentalContext);
    };

    let mut affair = ctx
        .load::<Affair>(&accounts.affair)?
        .ok_or(ShagaError::InvalidRentalContext)?;
    let (expected_lender, _) = pda::find_lender(&affair.authority)?;
    if rental.affair != accounts.affair
        || rental.client != client
        || expected_lender != accounts.lender
        || affair.rental != Some(accounts.rental)
        || affair.client != Some(client)
    {
        return Err(ShagaError::InvalidRentalContext);
    }
    let affair_schedule = checks::affair_schedule(
        &accounts.thread_authority,
        &accounts.affair,
        &accounts.affair_clockwork_thread,
    )?;

    let now = ctx.now();
    if termination_by == RentalTerminationAuthority::Clockwork && !rental.is_expired(now) {
        return Err(ShagaError::ScheduleFiredEarly {
            fire_at: rental.rental_termination_time,
            now,
        });
    }

    let escrow = ctx
        .load::<Escrow>(&accounts.escrow)?
        .ok_or(ShagaError::InvalidRentalContext)?;
    let mut lender = ctx
        .load::<Lender>(&accounts.lender)?
        .ok_or(ShagaError::LenderNotFound {
            lender: accounts.lender,
        })?;
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

    let authority = affair.authority;
    let fire_at = affair.affair_termination_time.max(now);
    affair.leave()?;
    ctx.store(&accounts.affair, affair)?;
    super::schedule_affair_expiry(
        ctx,
        &market,
        &accounts.lender,
        &authority,
        &accounts.lender,
        &accounts.affair,
        affair_schedule,
        fire_at,
    )?;

    info!(
        affair = %accounts.affair,
        rental = %accounts.rental,
        termination_by = %termination_by,
        paid_to_lender = settlement.paid_to_lender,
        refunded_to_client = settlement.refunded_to_client,
        "rental settled"
    );
    ctx.emit(ProgramEvent::RentalSettled {
        affair: accounts.affair,
        rental: accounts.rental,
        lender: accounts.lender,
        client,
        termination_by,
        paid_to_lender: settlement.paid_to_lender,
        refunded_to_client: settlement.refunded_to_client,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::error::ShagaError;
    use crate::events::ProgramEvent;
    use crate::instruction::RentalTerminationAuthority;
    use crate::scheduler::Thread;
    use crate::states::{Affair, AffairState, Lender, Registry};
    use crate::test_utils::{Harness, SOL, START, affair_of, escrow_of, lender_of, rental_of};

    fn settled(events: &[ProgramEvent]) -> Option<(RentalTerminationAuthority, u64, u64)> {
        events.iter().find_map(|event| match event {
            ProgramEvent::RentalSettled {
                termination_by,
                paid_to_lender,
                refunded_to_client,
                ..
            } => Some((*termination_by, *paid_to_lender, *refunded_to_client)),
            _ => None,
        })
    }

    #[test]
    fn client_ends_halfway() {
        let mut harness = Harness::initialized();
        let (authority, client) = harness.rented_affair(SOL, 1800);
        let lender = lender_of(&authority);
        let affair_key = affair_of(&authority);
        let fee = SOL / 200;
        harness.ledger.advance_clock(900);

        let ix = harness.end_rental_ix(&client, &client, &authority, RentalTerminationAuthority::Client);
        let events = harness.send(&client, &ix).unwrap();
        assert_eq!(
            settled(&events),
            Some((RentalTerminationAuthority::Client, SOL / 4, SOL / 4))
        );

        // the rental schedule's fee comes back with the refund
        assert_eq!(harness.ledger.balance(&client), 10 * SOL - SOL / 4 - fee);
        assert_eq!(harness.ledger.balance(&lender), SOL / 4);
        assert_eq!(harness.ledger.balance(&harness.vault), fee);
        assert!(harness.ledger.account(&rental_of(&lender, &client)).is_none());
        assert!(harness.ledger.account(&escrow_of(&lender, &client)).is_none());

        let affair = harness.record::<Affair>(&affair_key).unwrap();
        assert_eq!(affair.affair_state, AffairState::Listed);
        assert_eq!(affair.client, None);
        assert_eq!(affair.rental, None);
        assert_eq!(harness.record::<Lender>(&lender).unwrap().karma, 1);

        let registry = harness.record::<Registry>(&harness.affairs_list).unwrap();
        assert!(registry.contains(&affair_key));

        let thread = harness.record::<Thread>(&harness.schedule(&affair_key)).unwrap();
        assert_eq!(thread.trigger.fire_at(), START + 5400);
    }

    #[test]
    fn client_ends_after_deadline_pays_in_full() {
        let mut harness = Harness::initialized();
        let (authority, client) = harness.rented_affair(SOL, 1800);
        harness.ledger.advance_clock(2000);
        let ix = harness.end_rental_ix(&client, &client, &authority, RentalTerminationAuthority::Client);
        let events = harness.send(&client, &ix).unwrap();
        assert_eq!(
            settled(&events),
            Some((RentalTerminationAuthority::Client, SOL / 2, 0))
        );
    }

    #[test]
    fn relisting_past_affair_deadline_expires_immediately() {
        let mut harness = Harness::initialized();
        let (authority, client) = harness.rented_affair(SOL, 1800);
        let affair_key = affair_of(&authority);
        harness.ledger.advance_clock(6000);
        let ix = harness.end_rental_ix(&client, &client, &authority, RentalTerminationAuthority::Client);
        harness.send(&client, &ix).unwrap();

        let firings = harness.ledger.fire_due_schedules();
        assert_eq!(firings.len(), 1);
        assert_eq!(firings[0].target, affair_key);
        assert!(firings[0].outcome.is_ok());
        assert!(harness.ledger.account(&affair_key).is_none());
    }

    #[test]
    fn stranger_cannot_end_rental() {
        let mut harness = Harness::initialized();
        let (authority, client) = harness.rented_affair(SOL, 1800);
        let stranger = harness.funded(SOL);
        let ix = harness.end_rental_ix(&stranger, &client, &authority, RentalTerminationAuthority::Client);
        let err = harness.send(&stranger, &ix).unwrap_err();
        assert_eq!(err, ShagaError::InvalidSigner { signer: stranger });
    }

    #[test]
    fn client_cannot_impersonate_scheduler() {
        let mut harness = Harness::initialized();
        let (authority, client) = harness.rented_affair(SOL, 1800);
        harness.ledger.advance_clock(1800);
        let ix = harness.end_rental_ix(&client, &client, &authority, RentalTerminationAuthority::Clockwork);
        let err = harness.send(&client, &ix).unwrap_err();
        assert_eq!(err, ShagaError::InvalidSigner { signer: client });
    }

    #[test]
    fn lender_path_rejected() {
        let mut harness = Harness::initialized();
        let (authority, client) = harness.rented_affair(SOL, 1800);
        let ix = harness.end_rental_ix(&authority, &client, &authority, RentalTerminationAuthority::Lender);
        let err = harness.send(&authority, &ix).unwrap_err();
        assert!(matches!(err, ShagaError::InvalidTerminationInstruction { .. }));
    }

    #[test]
    fn ending_twice_by_client_rejected() {
        let mut harness = Harness::initialized();
        let (authority, client) = harness.rented_affair(SOL, 1800);
        let ix = harness.end_rental_ix(&client, &client, &authority, RentalTerminationAuthority::Client);
        harness.send(&client, &ix).unwrap();
        let err = harness.send(&client, &ix).unwrap_err();
        assert_eq!(err, ShagaError::MissingRentalContext);
    }

    #[test]
    fn schedule_fired_early_rejected() {
        let mut harness = Harness::initialized();
        let (authority, client) = harness.rented_affair(SOL, 1800);
        let rental = rental_of(&lender_of(&authority), &client);
        let schedule = harness.schedule(&rental);
        let thread = harness.record::<Thread>(&schedule).unwrap();
        harness.ledger.advance_clock(100);

        let err = harness
            .ledger
            .process_scheduled(&schedule, &thread.instruction)
            .unwrap_err();
        assert_eq!(
            err,
            ShagaError::ScheduleFiredEarly {
                fire_at: START as u64 + 1800,
                now: START as u64 + 100,
            }
        );
        assert!(harness.ledger.account(&rental).is_some());
    }

    #[test]
    fn schedule_settles_and_redelivery_is_noop() {
        let mut harness = Harness::initialized();
        let (authority, client) = harness.rented_affair(SOL, 1800);
        let rental = rental_of(&lender_of(&authority), &client);
        let schedule = harness.schedule(&rental);
        let thread = harness.record::<Thread>(&schedule).unwrap();
        harness.ledger.advance_clock(1800);

        let firings = harness.ledger.fire_due_schedules();
        assert_eq!(firings.len(), 1);
        let events = firings[0].outcome.clone().unwrap();
        assert_eq!(
            settled(&events),
            Some((RentalTerminationAuthority::Clockwork, SOL / 2, 0))
        );
        let before = harness.ledger.clone();

        let events = harness
            .ledger
            .process_scheduled(&schedule, &thread.instruction)
            .unwrap();
        assert!(matches!(
            events.as_slice(),
            [ProgramEvent::AutomationNoOp { .. }]
        ));
        assert_eq!(harness.ledger.balance(&client), before.balance(&client));
        assert_eq!(harness.ledger.total_lamports(), before.total_lamports());
    }
}
