//! Program-derived addresses for every marketplace record.
//!
//! Escrow and rental addresses are keyed by the **lender record address**, not
//! the lender's authority. Schedules are derived in two steps: a schedule id
//! under the marketplace program, then the execution address under the
//! scheduler program.

use crate::error::Result;
use crate::pubkey::Pubkey;
use crate::seeds::{
    SCHEDULER_PROGRAM_ID, SEED_AFFAIR, SEED_AFFAIR_LIST, SEED_AUTHORITY_THREAD, SEED_ESCROW,
    SEED_LENDER, SEED_RENTAL, SEED_THREAD, SHAGA_PROGRAM_ID,
};

/// The registry (active affair listing).
pub fn find_affair_list() -> Result<(Pubkey, u8)> {
    Pubkey::try_find_program_address(&[SEED_AFFAIR_LIST], &SHAGA_PROGRAM_ID)
}

/// The marketplace vault.
pub fn find_vault() -> Result<(Pubkey, u8)> {
    Pubkey::try_find_program_address(&[SEED_ESCROW], &SHAGA_PROGRAM_ID)
}

/// The authority that owns every schedule the marketplace creates.
pub fn find_thread_authority() -> Result<(Pubkey, u8)> {
    Pubkey::try_find_program_address(&[SEED_AUTHORITY_THREAD], &SHAGA_PROGRAM_ID)
}

/// The lender record of `authority`.
pub fn find_lender(authority: &Pubkey) -> Result<(Pubkey, u8)> {
    Pubkey::try_find_program_address(&[SEED_LENDER, authority.as_ref()], &SHAGA_PROGRAM_ID)
}

/// The affair listed by `authority`.
pub fn find_affair(authority: &Pubkey) -> Result<(Pubkey, u8)> {
    Pubkey::try_find_program_address(&[SEED_AFFAIR, authority.as_ref()], &SHAGA_PROGRAM_ID)
}

/// The escrow between a lender record and a client.
pub fn find_rent_escrow(lender: &Pubkey, client: &Pubkey) -> Result<(Pubkey, u8)> {
    Pubkey::try_find_program_address(
        &[SEED_ESCROW, lender.as_ref(), client.as_ref()],
        &SHAGA_PROGRAM_ID,
    )
}

/// The rental between a lender record and a client.
pub fn find_rental(lender: &Pubkey, client: &Pubkey) -> Result<(Pubkey, u8)> {
    Pubkey::try_find_program_address(
        &[SEED_RENTAL, lender.as_ref(), client.as_ref()],
        &SHAGA_PROGRAM_ID,
    )
}

/// The schedule id guarding `target` (an affair or a rental address).
pub fn find_thread_id(thread_authority: &Pubkey, target: &Pubkey) -> Result<(Pubkey, u8)> {
    Pubkey::try_find_program_address(
        &[SEED_THREAD, thread_authority.as_ref(), target.as_ref()],
        &SHAGA_PROGRAM_ID,
    )
}

/// The execution address of a schedule, under the scheduler program.
pub fn find_schedule_thread(thread_authority: &Pubkey, thread_id: &Pubkey) -> Result<(Pubkey, u8)> {
    Pubkey::try_find_program_address(
        &[SEED_THREAD, thread_authority.as_ref(), thread_id.as_ref()],
        &SCHEDULER_PROGRAM_ID,
    )
}

/// Schedule id and execution address for the schedule guarding `target`.
pub fn schedule_for(thread_authority: &Pubkey, target: &Pubkey) -> Result<ScheduleAddress> {
    let (id, _) = find_thread_id(thread_authority, target)?;
    let (thread, _) = find_schedule_thread(thread_authority, &id)?;
    Ok(ScheduleAddress { id, thread })
}

/// Both addresses that identify a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleAddress {
    /// Schedule id (marketplace namespace).
    pub id: Pubkey,
    /// Execution address (scheduler namespace); the identity a fired schedule signs as.
    pub thread: Pubkey,
}
