//! Address re-derivation checks shared by the handlers.
//!
//! A request builder supplies every account address. None of them is trusted:
//! each is re-derived from the identities it claims to belong to and compared.

use shaga_core::pda::{self, ScheduleAddress};
use shaga_core::{Pubkey, SCHEDULER_PROGRAM_ID, SYSTEM_PROGRAM_ID};

use crate::Result;
use crate::context::InstructionContext;
use crate::error::ShagaError;
use crate::states::Registry;

/// Fails unless `found` equals the derived address.
pub fn verify_address(account: &'static str, found: &Pubkey, derived: (Pubkey, u8)) -> Result<()> {
    let (expected, _) = derived;
    if expected == *found {
        Ok(())
    } else {
        Err(ShagaError::InvalidAccountAddress {
            account,
            expected,
            found: *found,
        })
    }
}

/// Fails unless `found` is the system program.
pub fn verify_system_program(found: &Pubkey) -> Result<()> {
    verify_address("system program", found, (SYSTEM_PROGRAM_ID, 0))
}

/// Fails unless the system and scheduler programs are the well-known ids.
pub fn verify_programs(system_program: &Pubkey, clockwork_program: &Pubkey) -> Result<()> {
    verify_system_program(system_program)?;
    verify_address("scheduler program", clockwork_program, (SCHEDULER_PROGRAM_ID, 0))
}

/// Fails unless the registry, vault, and thread authority are the singletons.
pub fn verify_singletons(
    affairs_list: &Pubkey,
    vault: &Pubkey,
    thread_authority: &Pubkey,
) -> Result<()> {
    verify_address("affairs list", affairs_list, pda::find_affair_list()?)?;
    verify_address("vault", vault, pda::find_vault()?)?;
    verify_address(
        "thread authority",
        thread_authority,
        pda::find_thread_authority()?,
    )
}

/// Derives the rental schedule for `rental` and compares it to `found`.
pub fn rental_schedule(
    thread_authority: &Pubkey,
    rental: &Pubkey,
    found: &Pubkey,
) -> Result<ScheduleAddress> {
    let schedule = pda::schedule_for(thread_authority, rental)?;
    if schedule.thread != *found {
        return Err(ShagaError::InvalidRentalClockworkKey {
            expected: schedule.thread,
            found: *found,
        });
    }
    Ok(schedule)
}

/// Derives the affair schedule for `affair` and compares it to `found`.
pub fn affair_schedule(
    thread_authority: &Pubkey,
    affair: &Pubkey,
    found: &Pubkey,
) -> Result<ScheduleAddress> {
    let schedule = pda::schedule_for(thread_authority, affair)?;
    if schedule.thread != *found {
        return Err(ShagaError::InvalidAffairClockworkKey {
            expected: schedule.thread,
            found: *found,
        });
    }
    Ok(schedule)
}

/// Loads the registry, failing if it was never initialized.
pub fn load_registry(ctx: &InstructionContext<'_>, affairs_list: &Pubkey) -> Result<Registry> {
    ctx.load::<Registry>(affairs_list)?
        .ok_or(ShagaError::RegistryNotInitialized)
}
