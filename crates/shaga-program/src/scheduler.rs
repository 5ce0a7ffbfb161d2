//! The scheduled-task facility.
//!
//! A [`Thread`] lives at an address derived under the scheduler program and
//! carries exactly one instruction. When its trigger time passes, the ledger
//! submits that instruction with the thread's address as the sole extra
//! signer. Handlers authorise automation by comparing the signer against the
//! schedule address they derive themselves.

use serde::{Deserialize, Serialize};
use shaga_core::pda::{self, ScheduleAddress};
use shaga_core::{Instruction, Pubkey, SCHEDULER_PROGRAM_ID};
use tracing::debug;

use crate::Result;
use crate::account::AccountRecord;
use crate::context::InstructionContext;
use crate::error::ShagaError;
use crate::events::ProgramEvent;

/// When a schedule fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trigger {
    /// At or after the given Unix timestamp.
    Timestamp {
        /// Trigger time in seconds.
        unix_ts: i64,
    },
}

impl Trigger {
    /// Trigger for a record deadline.
    #[must_use]
    pub fn at(deadline: u64) -> Self {
        Self::Timestamp {
            unix_ts: i64::try_from(deadline).unwrap_or(i64::MAX),
        }
    }

    /// Trigger time in seconds.
    #[must_use]
    pub const fn fire_at(&self) -> i64 {
        match self {
            Self::Timestamp { unix_ts } => *unix_ts,
        }
    }

    /// Returns true once the trigger time has passed.
    #[must_use]
    pub const fn is_due(&self, unix_timestamp: i64) -> bool {
        unix_timestamp >= self.fire_at()
    }
}

/// A scheduled task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    /// Authority that may delete the schedule.
    pub authority: Pubkey,
    /// Schedule id under the marketplace program.
    pub id: Pubkey,
    /// Affair or rental the schedule guards.
    pub target: Pubkey,
    /// When to fire.
    pub trigger: Trigger,
    /// The one instruction this schedule may submit.
    pub instruction: Instruction,
    /// Lamports deposited at creation.
    pub fee: u64,
}

/// Everything needed to create a schedule.
#[derive(Debug, Clone)]
pub struct ThreadCreate {
    /// Account paying the schedule fee.
    pub payer: Pubkey,
    /// Authority that will own the schedule.
    pub authority: Pubkey,
    /// Affair or rental the schedule guards.
    pub target: Pubkey,
    /// Derived schedule id and execution address.
    pub address: ScheduleAddress,
    /// Instruction to submit when fired.
    pub instruction: Instruction,
    /// When to fire.
    pub trigger: Trigger,
}

/// Creates a schedule, funding it with the configured fee from `payer`.
///
/// # Errors
///
/// Returns [`ShagaError::InvalidAccountAddress`] if the execution address
/// does not match its derivation, and [`ShagaError::ScheduleAlreadyExists`]
/// if a schedule already lives there.
pub fn thread_create(ctx: &mut InstructionContext<'_>, request: ThreadCreate) -> Result<()> {
    let ThreadCreate {
        payer,
        authority,
        target,
        address,
        instruction,
        trigger,
    } = request;

    let (expected, _) = pda::find_schedule_thread(&authority, &address.id)?;
    if expected != address.thread {
        return Err(ShagaError::InvalidAccountAddress {
            account: "schedule",
            expected,
            found: address.thread,
        });
    }

    let fee = ctx.config().thread_fee;
    let thread = Thread {
        authority,
        id: address.id,
        target,
        trigger,
        instruction,
        fee,
    };
    ctx.init(
        &address.thread,
        SCHEDULER_PROGRAM_ID,
        thread.into_data(),
        ShagaError::ScheduleAlreadyExists {
            thread: address.thread,
        },
    )?;
    ctx.transfer(&payer, &address.thread, fee)?;

    debug!(thread = %address.thread, target = %target, fire_at = trigger.fire_at(), "schedule created");
    ctx.emit(ProgramEvent::ScheduleCreated {
        thread: address.thread,
        target,
        fire_at: trigger.fire_at(),
    });
    Ok(())
}

/// Deletes a schedule, returning its balance to `close_to`.
///
/// Returns `false` if no schedule exists at `thread`, which happens when a
/// fired schedule is redelivered after its target already retired it.
///
/// # Errors
///
/// Returns [`ShagaError::InvalidAccountAddress`] if the schedule belongs to
/// another authority.
pub fn thread_delete(
    ctx: &mut InstructionContext<'_>,
    authority: &Pubkey,
    close_to: &Pubkey,
    thread: &Pubkey,
) -> Result<bool> {
    let Some(existing) = ctx.load::<Thread>(thread)? else {
        return Ok(false);
    };
    if existing.authority != *authority {
        return Err(ShagaError::InvalidAccountAddress {
            account: "schedule authority",
            expected: existing.authority,
            found: *authority,
        });
    }
    let refunded = ctx.close(thread, close_to)?;

    debug!(thread = %thread, close_to = %close_to, refunded, "schedule deleted");
    ctx.emit(ProgramEvent::ScheduleDeleted { thread: *thread });
    Ok(true)
}
