//! Per-operation transition handlers.
//!
//! Every handler validates all of its preconditions before its first write.

pub mod create_affair;
pub mod create_lender;
pub mod end_rental;
pub mod initialize;
pub mod start_rental;
pub mod terminate_affair;
pub mod terminate_vacant_affair;

use shaga_core::pda::ScheduleAddress;
use shaga_core::{Pubkey, SCHEDULER_PROGRAM_ID, SYSTEM_PROGRAM_ID};

use crate::Result;
use crate::context::InstructionContext;
use crate::instruction::{
    self, EndRentalAccounts, RentalTerminationAuthority, TerminateVacantAffairAccounts,
};
use crate::scheduler::{self, ThreadCreate, Trigger};
use crate::settlement::Settlement;

/// The three singleton addresses every marketplace operation references.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Marketplace {
    pub affairs_list: Pubkey,
    pub vault: Pubkey,
    pub thread_authority: Pubkey,
}

/// Schedules `TerminateVacantAffair` for `affair` at `fire_at`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn schedule_affair_expiry(
    ctx: &mut InstructionContext<'_>,
    market: &Marketplace,
    payer: &Pubkey,
    authority: &Pubkey,
    lender: &Pubkey,
    affair: &Pubkey,
    schedule: ScheduleAddress,
    fire_at: u64,
) -> Result<()> {
    let expiry = instruction::terminate_vacant_affair(&TerminateVacantAffairAccounts {
        signer: schedule.thread,
        authority: *authority,
        lender: *lender,
        affair: *affair,
        affairs_list: market.affairs_list,
        vault: market.vault,
        affair_clockwork_thread: schedule.thread,
        thread_authority: market.thread_authority,
        system_program: SYSTEM_PROGRAM_ID,
        clockwork_program: SCHEDULER_PROGRAM_ID,
    })?;
    scheduler::thread_create(
        ctx,
        ThreadCreate {
            payer: *payer,
            authority: market.thread_authority,
            target: *affair,
            address: schedule,
            instruction: expiry,
            trigger: Trigger::at(fire_at),
        },
    )
}

/// Accounts identifying one active rental.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RentalKeys {
    pub client: Pubkey,
    pub lender: Pubkey,
    pub affair: Pubkey,
    pub escrow: Pubkey,
    pub rental: Pubkey,
}

/// Schedules `EndRental` by the scheduler for `rental` at `fire_at`.
pub(crate) fn schedule_rental_expiry(
    ctx: &mut InstructionContext<'_>,
    market: &Marketplace,
    keys: &RentalKeys,
    rental_schedule: ScheduleAddress,
    affair_schedule: &Pubkey,
    fire_at: u64,
) -> Result<()> {
    let expiry = instruction::end_rental(
        &EndRentalAccounts {
            signer: rental_schedule.thread,
            client: keys.client,
            thread_authority: market.thread_authority,
            lender: keys.lender,
            affair: keys.affair,
            affairs_list: market.affairs_list,
            escrow: keys.escrow,
            rental: keys.rental,
            vault: market.vault,
            rental_clockwork_thread: rental_schedule.thread,
            affair_clockwork_thread: *affair_schedule,
            system_program: SYSTEM_PROGRAM_ID,
            clockwork_program: SCHEDULER_PROGRAM_ID,
        },
        RentalTerminationAuthority::Clockwork,
    )?;
    scheduler::thread_create(
        ctx,
        ThreadCreate {
            payer: keys.client,
            authority: market.thread_authority,
            target: keys.rental,
            address: rental_schedule,
            instruction: expiry,
            trigger: Trigger::at(fire_at),
        },
    )
}

/// Pays out a settled escrow and closes the escrow and rental to the vault.
pub(crate) fn disburse(
    ctx: &mut InstructionContext<'_>,
    market: &Marketplace,
    keys: &RentalKeys,
    settlement: &Settlement,
) -> Result<()> {
    ctx.transfer(&keys.escrow, &keys.lender, settlement.paid_to_lender)?;
    ctx.transfer(&keys.escrow, &keys.client, settlement.refunded_to_client)?;
    ctx.close(&keys.escrow, &market.vault)?;
    ctx.close(&keys.rental, &market.vault)?;
    Ok(())
}

/// Moves the lender record's whole balance to its authority.
pub(crate) fn sweep_lender(
    ctx: &mut InstructionContext<'_>,
    lender: &Pubkey,
    authority: &Pubkey,
) -> Result<u64> {
    let balance = ctx.lamports(lender)?;
    ctx.transfer(lender, authority, balance)?;
    Ok(balance)
}
