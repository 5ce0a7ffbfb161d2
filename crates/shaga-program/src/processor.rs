//! Instruction dispatch.

use tracing::debug;

use crate::Result;
use crate::context::InstructionContext;
use crate::instruction::{
    CreateAffairAccounts, EndRentalAccounts, InitializeAccounts, InitializeLenderAccounts,
    ShagaInstruction, StartRentalAccounts, TerminateAffairAccounts,
    TerminateVacantAffairAccounts,
};
use crate::instructions::{
    create_affair, create_lender, end_rental, initialize, start_rental, terminate_affair,
    terminate_vacant_affair,
};

/// Decodes `data` and applies the operation through `ctx`.
///
/// # Errors
///
/// Returns the handler's rejection, or [`crate::ShagaError::InvalidInstructionData`]
/// if the data or account list cannot be decoded.
pub fn process_instruction(ctx: &mut InstructionContext<'_>, data: &[u8]) -> Result<()> {
    let instruction = ShagaInstruction::unpack(data)?;
    let metas = ctx.metas();
    debug!(instruction = instruction.name(), accounts = metas.len(), "processing instruction");

    match instruction {
        ShagaInstruction::Initialize => {
            initialize::handle(ctx, &InitializeAccounts::from_account_metas(metas)?)
        }
        ShagaInstruction::InitializeLender => {
            create_lender::handle(ctx, &InitializeLenderAccounts::from_account_metas(metas)?)
        }
        ShagaInstruction::CreateAffair { payload } => create_affair::handle(
            ctx,
            &CreateAffairAccounts::from_account_metas(metas)?,
            payload,
        ),
        ShagaInstruction::StartRental {
            rental_termination_time,
        } => start_rental::handle(
            ctx,
            &StartRentalAccounts::from_account_metas(metas)?,
            rental_termination_time,
        ),
        ShagaInstruction::EndRental { termination_by } => end_rental::handle(
            ctx,
            &EndRentalAccounts::from_account_metas(metas)?,
            termination_by,
        ),
        ShagaInstruction::TerminateAffair => {
            terminate_affair::handle(ctx, &TerminateAffairAccounts::from_account_metas(metas)?)
        }
        ShagaInstruction::TerminateVacantAffair => terminate_vacant_affair::handle(
            ctx,
            &TerminateVacantAffairAccounts::from_account_metas(metas)?,
        ),
    }
}
