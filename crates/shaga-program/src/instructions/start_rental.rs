//! Starting a rental.

use shaga_core::{SHAGA_PROGRAM_ID, pda};
use tracing::info;

use super::{Marketplace, RentalKeys};
use crate::Result;
use crate::account::AccountRecord;
use crate::checks;
use crate::context::InstructionContext;
use crate::error::ShagaError;
use crate::events::ProgramEvent;
use crate::instruction::StartRentalAccounts;
use crate::scheduler;
use crate::settlement::quote_rental;
use crate::states::{Affair, Escrow, Lender, Rental};

/// Rents a listed affair until `rental_termination_time`.
///
/// Funds the escrow with the rent, pays the marketplace fee to the vault,
/// cancels the affair's own expiry schedule, and schedules the rental's
/// expiry in its place.
pub fn handle(
    ctx: &mut InstructionContext<'_>,
    accounts: &StartRentalAccounts,
    rental_termination_time: u64,
) -> Result<()> {
    let client = accounts.client;
    ctx.require_signer(&client)?;
    checks::verify_programs(&accounts.system_program, &accounts.clockwork_program)?;
    checks::verify_singletons(
        &accounts.affairs_list,
        &accounts.vault,
        &accounts.thread_authority,
    )?;
    checks::load_registry(ctx, &accounts.affairs_list)?;

    let mut affair = ctx
        .load::<Affair>(&accounts.affair)?
        .ok_or(ShagaError::AffairNotFound {
            affair: accounts.affair,
        })?;
    checks::verify_address("affair", &accounts.affair, pda::find_affair(&affair.authority)?)?;
    checks::verify_address("lender", &accounts.lender, pda::find_lender(&affair.authority)?)?;
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
    let affair_schedule = checks::affair_schedule(
        &accounts.thread_authority,
        &accounts.affair,
        &accounts.affair_clockwork_thread,
    )?;

    let mut lender = ctx
        .load::<Lender>(&accounts.lender)?
        .ok_or(ShagaError::LenderNotFound {
            lender: accounts.lender,
        })?;
    let mut vault = ctx
        .load::<Escrow>(&accounts.vault)?
        .ok_or(ShagaError::RegistryNotInitialized)?;

    if affair.client == Some(client) {
        return Err(ShagaError::ClientAlreadyInAffair);
    }
    if !affair.can_join() {
        return Err(ShagaError::AffairAlreadyJoined);
    }
    if client == affair.authority {
        return Err(ShagaError::CannotRentOwnAffair);
    }

    let now = ctx.now();
    if rental_termination_time <= now
        || rental_termination_time > affair.affair_termination_time
        || rental_termination_time - now > ctx.config().max_rental_duration_secs
    {
        return Err(ShagaError::InvalidRentalTerminationTime);
    }
    let quote = quote_rental(rental_termination_time - now, affair.sol_per_hour, ctx.config())?;
    let available = ctx.lamports(&client)?;
    if available < quote.total {
        return Err(ShagaError::InsufficientFunds {
            required: quote.total,
            available,
        });
    }
    if ctx.exists(&accounts.escrow)? || ctx.exists(&accounts.rental)? {
        return Err(ShagaError::InvalidRentalContext);
    }
    vault.locked_amount = vault
        .locked_amount
        .checked_add(quote.fee_amount)
        .ok_or(ShagaError::NumericalOverflow)?;

    ctx.init(
        &accounts.escrow,
        SHAGA_PROGRAM_ID,
        Escrow::new(quote.rent_amount).into_data(),
        ShagaError::InvalidRentalContext,
    )?;
    ctx.transfer(&client, &accounts.escrow, quote.rent_amount)?;
    ctx.transfer(&client, &accounts.vault, quote.fee_amount)?;
    ctx.store(&accounts.vault, vault)?;

    let rental = Rental {
        client,
        affair: accounts.affair,
        rent_amount: quote.rent_amount,
        rental_start_time: now,
        rental_termination_time,
        rental_clockwork_thread: rental_schedule.thread,
    };
    ctx.init(
        &accounts.rental,
        SHAGA_PROGRAM_ID,
        rental.into_data(),
        ShagaError::InvalidRentalContext,
    )?;

    affair.join(client, accounts.rental, now, quote.rent_amount)?;
    ctx.store(&accounts.affair, affair)?;

    // the rental deadline supersedes the affair's own expiry
    scheduler::thread_delete(
        ctx,
        &accounts.thread_authority,
        &accounts.lender,
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
    super::schedule_rental_expiry(
        ctx,
        &market,
        &keys,
        rental_schedule,
        &affair_schedule.thread,
        rental_termination_time,
    )?;

    lender.increment_affairs();
    ctx.store(&accounts.lender, lender)?;

    info!(
        affair = %accounts.affair,
        rental = %accounts.rental,
        client = %client,
        rent_amount = quote.rent_amount,
        fee_amount = quote.fee_amount,
        rental_termination_time,
        "rental started"
    );
    ctx.emit(ProgramEvent::RentalStarted {
        affair: accounts.affair,
        rental: accounts.rental,
        client,
        rent_amount: quote.rent_amount,
        fee_amount: quote.fee_amount,
        rental_termination_time,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use crate::error::ShagaError;
    use crate::scheduler::Thread;
    use crate::states::{Affair, AffairState, Escrow, Lender, Rental};
    use crate::test_utils::{Harness, SOL, START, affair_of, escrow_of, lender_of, rental_of};

    const DAY: u64 = 24 * 3600;

    #[test]
    fn rental_funds_escrow_and_swaps_schedules() {
        let mut harness = Harness::initialized();
        let (authority, client) = harness.rented_affair(SOL, 1800);
        let lender = lender_of(&authority);
        let affair_key = affair_of(&authority);
        let rental_key = rental_of(&lender, &client);
        let escrow_key = escrow_of(&lender, &client);
        let thread_fee = harness.ledger.config().thread_fee;
        let fee = SOL / 200;

        let affair = harness.record::<Affair>(&affair_key).unwrap();
        assert_eq!(affair.affair_state, AffairState::Rented);
        assert_eq!(affair.client, Some(client));
        assert_eq!(affair.rental, Some(rental_key));
        assert_eq!(affair.active_rental_start_time, START as u64);
        assert_eq!(affair.due_rent_amount, SOL / 2);

        let rental = harness.record::<Rental>(&rental_key).unwrap();
        assert_eq!(rental.rent_amount, SOL / 2);
        assert_eq!(rental.rental_termination_time, START as u64 + 1800);
        assert_eq!(harness.record::<Escrow>(&escrow_key), Some(Escrow::new(SOL / 2)));
        assert_eq!(harness.ledger.balance(&escrow_key), SOL / 2);

        assert_eq!(harness.record::<Escrow>(&harness.vault), Some(Escrow::new(fee)));
        assert_eq!(harness.ledger.balance(&harness.vault), fee);
        assert_eq!(
            harness.ledger.balance(&client),
            10 * SOL - SOL / 2 - fee - thread_fee
        );

        // the affair's own expiry is refunded to the lender record
        assert!(harness.ledger.account(&harness.schedule(&affair_key)).is_none());
        assert_eq!(harness.ledger.balance(&lender), thread_fee);
        assert_eq!(harness.record::<Lender>(&lender).unwrap().affairs, 1);

        let thread = harness.record::<Thread>(&harness.schedule(&rental_key)).unwrap();
        assert_eq!(thread.target, rental_key);
        assert_eq!(thread.trigger.fire_at(), START + 1800);
    }

    #[test]
    fn second_client_rejected() {
        let mut harness = Harness::initialized();
        let (authority, _) = harness.rented_affair(SOL, 1800);
        let other = harness.funded(10 * SOL);
        let until = harness.now() + 600;
        let err = harness
            .send(&other, &harness.start_rental_ix(&other, &authority, until))
            .unwrap_err();
        assert_eq!(err, ShagaError::AffairAlreadyJoined);
    }

    #[test]
    fn same_client_rejected() {
        let mut harness = Harness::initialized();
        let (authority, client) = harness.rented_affair(SOL, 1800);
        let until = harness.now() + 600;
        let err = harness
            .send(&client, &harness.start_rental_ix(&client, &authority, until))
            .unwrap_err();
        assert_eq!(err, ShagaError::ClientAlreadyInAffair);
    }

    #[test]
    fn lender_cannot_rent_own_affair() {
        let mut harness = Harness::initialized();
        let authority = harness.listed_affair(SOL, 3600);
        let until = harness.now() + 600;
        let err = harness
            .send(&authority, &harness.start_rental_ix(&authority, &authority, until))
            .unwrap_err();
        assert_eq!(err, ShagaError::CannotRentOwnAffair);
    }

    #[test_case(0 ; "ends now")]
    #[test_case(8 * DAY + 1 ; "outlives affair")]
    #[test_case(7 * DAY + 1 ; "exceeds max duration")]
    fn invalid_termination_time(offset: u64) {
        let mut harness = Harness::initialized();
        let authority = harness.listed_affair(1, 8 * DAY);
        let client = harness.funded(10 * SOL);
        let until = harness.now() + offset;
        let err = harness
            .send(&client, &harness.start_rental_ix(&client, &authority, until))
            .unwrap_err();
        assert_eq!(err, ShagaError::InvalidRentalTerminationTime);
    }

    #[test]
    fn insufficient_funds_rejected() {
        let mut harness = Harness::initialized();
        let authority = harness.listed_affair(SOL, 3600);
        let client = harness.funded(SOL / 10);
        let until = harness.now() + 1800;
        let err = harness
            .send(&client, &harness.start_rental_ix(&client, &authority, until))
            .unwrap_err();
        let thread_fee = harness.ledger.config().thread_fee;
        assert_eq!(
            err,
            ShagaError::InsufficientFunds {
                required: SOL / 2 + SOL / 200 + thread_fee,
                available: SOL / 10,
            }
        );
        let affair = harness.record::<Affair>(&affair_of(&authority)).unwrap();
        assert_eq!(affair.affair_state, AffairState::Listed);
    }

    #[test]
    fn terminated_affair_cannot_be_rented() {
        let mut harness = Harness::initialized();
        let authority = harness.listed_affair(SOL, 3600);
        harness
            .send(&authority, &harness.terminate_vacant_ix(&authority, &authority))
            .unwrap();
        let client = harness.funded(10 * SOL);
        let until = harness.now() + 600;
        let err = harness
            .send(&client, &harness.start_rental_ix(&client, &authority, until))
            .unwrap_err();
        assert_eq!(
            err,
            ShagaError::AffairNotFound {
                affair: affair_of(&authority)
            }
        );
    }
}
