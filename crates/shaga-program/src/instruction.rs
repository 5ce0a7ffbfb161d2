//! Instruction data and account layouts.
//!
//! Each operation has a fixed positional account layout, declared once with
//! `instruction_accounts!` and shared by the request builder (to emit
//! account metas) and the processor (to decode them back).

use std::fmt;

use serde::{Deserialize, Serialize};
use shaga_core::{AccountMeta, Instruction, Pubkey, SHAGA_PROGRAM_ID};

use crate::Result;
use crate::error::ShagaError;
use crate::states::AffairPayload;

/// Who ended a rental.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RentalTerminationAuthority {
    /// The rental's expiry schedule.
    Clockwork,
    /// The renting client.
    Client,
    /// The affair's lender.
    Lender,
}

impl fmt::Display for RentalTerminationAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clockwork => write!(f, "clockwork"),
            Self::Client => write!(f, "client"),
            Self::Lender => write!(f, "lender"),
        }
    }
}

/// Operation tag and parameters carried in [`Instruction::data`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShagaInstruction {
    /// Create the registry, vault, and thread authority.
    Initialize,
    /// Register the payer as a lender.
    InitializeLender,
    /// List an affair.
    CreateAffair {
        /// Listing parameters.
        payload: AffairPayload,
    },
    /// Rent a listed affair until the given deadline.
    StartRental {
        /// Absolute rental deadline.
        rental_termination_time: u64,
    },
    /// End a rental and disburse its escrow.
    EndRental {
        /// Who is ending the rental.
        termination_by: RentalTerminationAuthority,
    },
    /// Close an occupied affair, settling its rental first.
    TerminateAffair,
    /// Close a vacant affair.
    TerminateVacantAffair,
}

impl ShagaInstruction {
    /// Encodes the instruction data.
    pub fn pack(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| ShagaError::InvalidInstructionData {
            reason: e.to_string(),
        })
    }

    /// Decodes instruction data.
    ///
    /// # Errors
    ///
    /// Returns [`ShagaError::InvalidInstructionData`] if the bytes do not
    /// decode to a known operation.
    pub fn unpack(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).map_err(|e| ShagaError::InvalidInstructionData {
            reason: e.to_string(),
        })
    }

    /// Operation name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::InitializeLender => "initialize_lender",
            Self::CreateAffair { .. } => "create_affair",
            Self::StartRental { .. } => "start_rental",
            Self::EndRental { .. } => "end_rental",
            Self::TerminateAffair => "terminate_affair",
            Self::TerminateVacantAffair => "terminate_vacant_affair",
        }
    }
}

/// Declares a positional account layout.
///
/// Each field is `name: signer, writable;` and becomes a `Pubkey` field.
macro_rules! instruction_accounts {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$field_meta:meta])* $field:ident: $signer:literal, $writable:literal;)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name {
            $($(#[$field_meta])* pub $field: Pubkey,)+
        }

        impl $name {
            /// Number of accounts in the layout.
            pub const LEN: usize = [$(stringify!($field)),+].len();

            /// Account metas in layout order.
            #[must_use]
            pub fn to_account_metas(&self) -> Vec<AccountMeta> {
                vec![$(AccountMeta {
                    pubkey: self.$field,
                    is_signer: $signer,
                    is_writable: $writable,
                }),+]
            }

            /// Decodes the layout from positional metas.
            ///
            /// # Errors
            ///
            /// Returns [`ShagaError::InvalidInstructionData`] if too few
            /// accounts are supplied.
            pub fn from_account_metas(metas: &[AccountMeta]) -> Result<Self> {
                if metas.len() < Self::LEN {
                    return Err(ShagaError::InvalidInstructionData {
                        reason: format!(
                            "{} expects {} accounts, got {}",
                            stringify!($name),
                            Self::LEN,
                            metas.len()
                        ),
                    });
                }
                let mut metas = metas.iter();
                Ok(Self {
                    $($field: metas
                        .next()
                        .map(|meta| meta.pubkey)
                        .ok_or_else(|| ShagaError::InvalidInstructionData {
                            reason: format!("missing {}", stringify!($field)),
                        })?,)+
                })
            }
        }
    };
}

instruction_accounts! {
    /// Accounts for [`ShagaInstruction::Initialize`].
    InitializeAccounts {
        /// Funds and signs.
        payer: true, true;
        /// Registry address.
        affairs_list: false, true;
        /// Vault address.
        vault: false, true;
        /// Thread authority address.
        thread_authority: false, true;
        /// System program.
        system_program: false, false;
    }
}

instruction_accounts! {
    /// Accounts for [`ShagaInstruction::InitializeLender`].
    InitializeLenderAccounts {
        /// The registering wallet.
        payer: true, true;
        /// Lender record address.
        lender: false, true;
        /// System program.
        system_program: false, false;
    }
}

instruction_accounts! {
    /// Accounts for [`ShagaInstruction::CreateAffair`].
    CreateAffairAccounts {
        /// The lender wallet.
        authority: true, true;
        /// Affair address.
        affair: false, true;
        /// Lender record address.
        lender: false, true;
        /// Registry address.
        affairs_list: false, true;
        /// Affair expiry schedule.
        affair_clockwork_thread: false, true;
        /// Vault address.
        vault: false, false;
        /// Thread authority address.
        thread_authority: false, false;
        /// System program.
        system_program: false, false;
        /// Scheduler program.
        clockwork_program: false, false;
    }
}

instruction_accounts! {
    /// Accounts for [`ShagaInstruction::StartRental`].
    StartRentalAccounts {
        /// The renting wallet.
        client: true, true;
        /// Lender record address.
        lender: false, true;
        /// Affair address.
        affair: false, true;
        /// Registry address.
        affairs_list: false, true;
        /// Escrow for this (lender, client) pair.
        escrow: false, true;
        /// Rental for this (lender, client) pair.
        rental: false, true;
        /// Vault address.
        vault: false, true;
        /// Rental expiry schedule.
        rental_clockwork_thread: false, true;
        /// Affair expiry schedule, cancelled by the rental.
        affair_clockwork_thread: false, true;
        /// Thread authority address.
        thread_authority: false, false;
        /// System program.
        system_program: false, false;
        /// Scheduler program.
        clockwork_program: false, false;
    }
}

instruction_accounts! {
    /// Accounts for [`ShagaInstruction::EndRental`].
    EndRentalAccounts {
        /// The client, or the rental schedule when fired.
        signer: true, true;
        /// The renting wallet.
        client: false, true;
        /// Thread authority address.
        thread_authority: false, false;
        /// Lender record address.
        lender: false, true;
        /// Affair address.
        affair: false, true;
        /// Registry address.
        affairs_list: false, true;
        /// Escrow for this (lender, client) pair.
        escrow: false, true;
        /// Rental for this (lender, client) pair.
        rental: false, true;
        /// Vault address.
        vault: false, true;
        /// Rental expiry schedule.
        rental_clockwork_thread: false, true;
        /// Affair expiry schedule, recreated by settlement.
        affair_clockwork_thread: false, true;
        /// System program.
        system_program: false, false;
        /// Scheduler program.
        clockwork_program: false, false;
    }
}

instruction_accounts! {
    /// Accounts for [`ShagaInstruction::TerminateAffair`].
    TerminateAffairAccounts {
        /// The lender wallet.
        authority: true, true;
        /// The renting wallet.
        client: false, true;
        /// Lender record address.
        lender: false, true;
        /// Affair address.
        affair: false, true;
        /// Registry address.
        affairs_list: false, true;
        /// Escrow for this (lender, client) pair.
        escrow: false, true;
        /// Rental for this (lender, client) pair.
        rental: false, true;
        /// Vault address.
        vault: false, true;
        /// Affair expiry schedule.
        affair_clockwork_thread: false, true;
        /// Rental expiry schedule.
        rental_clockwork_thread: false, true;
        /// Thread authority address.
        thread_authority: false, false;
        /// System program.
        system_program: false, false;
        /// Scheduler program.
        clockwork_program: false, false;
    }
}

instruction_accounts! {
    /// Accounts for [`ShagaInstruction::TerminateVacantAffair`].
    TerminateVacantAffairAccounts {
        /// The lender wallet, or the affair schedule when fired.
        signer: true, true;
        /// The lender wallet.
        authority: false, true;
        /// Lender record address.
        lender: false, true;
        /// Affair address.
        affair: false, true;
        /// Registry address.
        affairs_list: false, true;
        /// Vault address.
        vault: false, true;
        /// Affair expiry schedule.
        affair_clockwork_thread: false, true;
        /// Thread authority address.
        thread_authority: false, false;
        /// System program.
        system_program: false, false;
        /// Scheduler program.
        clockwork_program: false, false;
    }
}

fn build(accounts: Vec<AccountMeta>, instruction: &ShagaInstruction) -> Result<Instruction> {
    Ok(Instruction::new(
        SHAGA_PROGRAM_ID,
        accounts,
        instruction.pack()?,
    ))
}

/// Builds [`ShagaInstruction::Initialize`].
pub fn initialize(accounts: &InitializeAccounts) -> Result<Instruction> {
    build(accounts.to_account_metas(), &ShagaInstruction::Initialize)
}

/// Builds [`ShagaInstruction::InitializeLender`].
pub fn initialize_lender(accounts: &InitializeLenderAccounts) -> Result<Instruction> {
    build(accounts.to_account_metas(), &ShagaInstruction::InitializeLender)
}

/// Builds [`ShagaInstruction::CreateAffair`].
pub fn create_affair(accounts: &CreateAffairAccounts, payload: AffairPayload) -> Result<Instruction> {
    build(
        accounts.to_account_metas(),
        &ShagaInstruction::CreateAffair { payload },
    )
}

/// Builds [`ShagaInstruction::StartRental`].
pub fn start_rental(
    accounts: &StartRentalAccounts,
    rental_termination_time: u64,
) -> Result<Instruction> {
    build(
        accounts.to_account_metas(),
        &ShagaInstruction::StartRental {
            rental_termination_time,
        },
    )
}

/// Builds [`ShagaInstruction::EndRental`].
pub fn end_rental(
    accounts: &EndRentalAccounts,
    termination_by: RentalTerminationAuthority,
) -> Result<Instruction> {
    build(
        accounts.to_account_metas(),
        &ShagaInstruction::EndRental { termination_by },
    )
}

/// Builds [`ShagaInstruction::TerminateAffair`].
pub fn terminate_affair(accounts: &TerminateAffairAccounts) -> Result<Instruction> {
    build(accounts.to_account_metas(), &ShagaInstruction::TerminateAffair)
}

/// Builds [`ShagaInstruction::TerminateVacantAffair`].
pub fn terminate_vacant_affair(accounts: &TerminateVacantAffairAccounts) -> Result<Instruction> {
    build(
        accounts.to_account_metas(),
        &ShagaInstruction::TerminateVacantAffair,
    )
}
