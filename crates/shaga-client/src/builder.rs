//! Request builders, one per marketplace operation.
//!
//! Each builder derives the full account list the program expects. Builders
//! for operations on an existing affair read it first to learn its lender and
//! current client; that read is not transactional with the submission, and
//! the program rejects the request if the affair changed in between.

use shaga_core::pda::{self, ScheduleAddress};
use shaga_core::{Instruction, Pubkey, SCHEDULER_PROGRAM_ID, SYSTEM_PROGRAM_ID};
use shaga_program::instruction::{
    self, CreateAffairAccounts, EndRentalAccounts, InitializeAccounts, InitializeLenderAccounts,
    StartRentalAccounts, TerminateAffairAccounts, TerminateVacantAffairAccounts,
};
use shaga_program::{AccountRecord, Affair, AffairPayload, RentalTerminationAuthority};
use tracing::debug;

use crate::Result;
use crate::cluster::LedgerClient;
use crate::error::ClientError;

/// The marketplace singletons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketplaceAddresses {
    /// Registry record holding the affair listing.
    pub affairs_list: Pubkey,
    /// Fee vault.
    pub vault: Pubkey,
    /// Authority owning every schedule.
    pub thread_authority: Pubkey,
}

impl MarketplaceAddresses {
    /// Derives the singleton addresses.
    pub fn derive() -> Result<Self> {
        Ok(Self {
            affairs_list: pda::find_affair_list()?.0,
            vault: pda::find_vault()?.0,
            thread_authority: pda::find_thread_authority()?.0,
        })
    }

    fn schedule(&self, target: &Pubkey) -> Result<ScheduleAddress> {
        Ok(pda::schedule_for(&self.thread_authority, target)?)
    }
}

/// Addresses bound to one `(lender, client)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RentalAddresses {
    /// Lender record of the affair's authority.
    pub lender: Pubkey,
    /// Escrow holding the rent.
    pub escrow: Pubkey,
    /// Rental record.
    pub rental: Pubkey,
}

impl RentalAddresses {
    /// Derives the rental addresses for `client` renting from `authority`.
    pub fn derive(authority: &Pubkey, client: &Pubkey) -> Result<Self> {
        let (lender, _) = pda::find_lender(authority)?;
        Ok(Self {
            lender,
            escrow: pda::find_rent_escrow(&lender, client)?.0,
            rental: pda::find_rental(&lender, client)?.0,
        })
    }
}

fn built(result: shaga_program::Result<Instruction>) -> Result<Instruction> {
    result.map_err(|e| ClientError::Build(e.to_string()))
}

/// Reads the record of type `T` at `address`.
///
/// # Errors
///
/// Returns [`ClientError::AccountNotFound`] if nothing exists there, or
/// [`ClientError::UnexpectedAccountType`] if it holds another record type.
pub async fn fetch_record<T: AccountRecord>(
    ledger: &impl LedgerClient,
    address: &Pubkey,
) -> Result<T> {
    let account = ledger
        .get_account(address)
        .await?
        .ok_or(ClientError::AccountNotFound { address: *address })?;
    account
        .record::<T>()
        .cloned()
        .ok_or(ClientError::UnexpectedAccountType {
            address: *address,
            expected: T::NAME,
        })
}

/// Builds the one-time registry initialization.
pub fn initialize(payer: &Pubkey) -> Result<Instruction> {
    let market = MarketplaceAddresses::derive()?;
    built(instruction::initialize(&InitializeAccounts {
        payer: *payer,
        affairs_list: market.affairs_list,
        vault: market.vault,
        thread_authority: market.thread_authority,
        system_program: SYSTEM_PROGRAM_ID,
    }))
}

/// Builds the lender registration for `payer`.
pub fn create_lender(payer: &Pubkey) -> Result<Instruction> {
    built(instruction::initialize_lender(&InitializeLenderAccounts {
        payer: *payer,
        lender: pda::find_lender(payer)?.0,
        system_program: SYSTEM_PROGRAM_ID,
    }))
}

/// Builds an affair listing for `authority`.
pub fn create_affair(authority: &Pubkey, payload: AffairPayload) -> Result<Instruction> {
    let market = MarketplaceAddresses::derive()?;
    let (affair, _) = pda::find_affair(authority)?;
    built(instruction::create_affair(
        &CreateAffairAccounts {
            authority: *authority,
            affair,
            lender: pda::find_lender(authority)?.0,
            affairs_list: market.affairs_list,
            affair_clockwork_thread: market.schedule(&affair)?.thread,
            vault: market.vault,
            thread_authority: market.thread_authority,
            system_program: SYSTEM_PROGRAM_ID,
            clockwork_program: SCHEDULER_PROGRAM_ID,
        },
        payload,
    ))
}

/// Builds a rental of `affair` by `client` until `rental_termination_time`.
///
/// Reads the affair to learn its lender.
pub async fn start_rental(
    ledger: &impl LedgerClient,
    client: &Pubkey,
    affair: &Pubkey,
    rental_termination_time: u64,
) -> Result<Instruction> {
    let record = fetch_record::<Affair>(ledger, affair).await?;
    let market = MarketplaceAddresses::derive()?;
    let rental = RentalAddresses::derive(&record.authority, client)?;
    debug!(affair = %affair, lender = %rental.lender, client = %client, "building start_rental");
    built(instruction::start_rental(
        &StartRentalAccounts {
            client: *client,
            lender: rental.lender,
            affair: *affair,
            affairs_list: market.affairs_list,
            escrow: rental.escrow,
            rental: rental.rental,
            vault: market.vault,
            rental_clockwork_thread: market.schedule(&rental.rental)?.thread,
            affair_clockwork_thread: market.schedule(affair)?.thread,
            thread_authority: market.thread_authority,
            system_program: SYSTEM_PROGRAM_ID,
            clockwork_program: SCHEDULER_PROGRAM_ID,
        },
        rental_termination_time,
    ))
}

/// Builds the end of the rental currently active on `affair`.
///
/// Reads the affair to learn its client and lender.
///
/// # Errors
///
/// Returns [`ClientError::NoActiveRental`] if the affair has no client.
pub async fn end_rental(
    ledger: &impl LedgerClient,
    signer: &Pubkey,
    affair: &Pubkey,
    termination_by: RentalTerminationAuthority,
) -> Result<Instruction> {
    let record = fetch_record::<Affair>(ledger, affair).await?;
    let client = record
        .client
        .ok_or(ClientError::NoActiveRental { affair: *affair })?;
    let market = MarketplaceAddresses::derive()?;
    let rental = RentalAddresses::derive(&record.authority, &client)?;
    debug!(affair = %affair, client = %client, termination_by = %termination_by, "building end_rental");
    built(instruction::end_rental(
        &EndRentalAccounts {
            signer: *signer,
            client,
            thread_authority: market.thread_authority,
            lender: rental.lender,
            affair: *affair,
            affairs_list: market.affairs_list,
            escrow: rental.escrow,
            rental: rental.rental,
            vault: market.vault,
            rental_clockwork_thread: market.schedule(&rental.rental)?.thread,
            affair_clockwork_thread: market.schedule(affair)?.thread,
            system_program: SYSTEM_PROGRAM_ID,
            clockwork_program: SCHEDULER_PROGRAM_ID,
        },
        termination_by,
    ))
}

/// Builds termination of `authority`'s affair.
///
/// Reads the affair: an occupied affair gets the settling variant bound to
/// its current client, a vacant one the plain variant.
pub async fn terminate_affair(ledger: &impl LedgerClient, authority: &Pubkey) -> Result<Instruction> {
    let (affair, _) = pda::find_affair(authority)?;
    let record = fetch_record::<Affair>(ledger, &affair).await?;
    let Some(client) = record.client else {
        debug!(affair = %affair, "affair is vacant");
        return terminate_vacant_affair(authority, authority);
    };
    let market = MarketplaceAddresses::derive()?;
    let rental = RentalAddresses::derive(authority, &client)?;
    debug!(affair = %affair, client = %client, "building terminate_affair");
    built(instruction::terminate_affair(&TerminateAffairAccounts {
        authority: *authority,
        client,
        lender: rental.lender,
        affair,
        affairs_list: market.affairs_list,
        escrow: rental.escrow,
        rental: rental.rental,
        vault: market.vault,
        affair_clockwork_thread: market.schedule(&affair)?.thread,
        rental_clockwork_thread: market.schedule(&rental.rental)?.thread,
        thread_authority: market.thread_authority,
        system_program: SYSTEM_PROGRAM_ID,
        clockwork_program: SCHEDULER_PROGRAM_ID,
    }))
}

/// Builds termination of `authority`'s vacant affair, signed by `signer`.
pub fn terminate_vacant_affair(signer: &Pubkey, authority: &Pubkey) -> Result<Instruction> {
    let market = MarketplaceAddresses::derive()?;
    let (affair, _) = pda::find_affair(authority)?;
    built(instruction::terminate_vacant_affair(
        &TerminateVacantAffairAccounts {
            signer: *signer,
            authority: *authority,
            lender: pda::find_lender(authority)?.0,
            affair,
            affairs_list: market.affairs_list,
            vault: market.vault,
            affair_clockwork_thread: market.schedule(&affair)?.thread,
            thread_authority: market.thread_authority,
            system_program: SYSTEM_PROGRAM_ID,
            clockwork_program: SCHEDULER_PROGRAM_ID,
        },
    ))
}

#[cfg(test)]
mod tests {
    use shaga_core::{Keypair, LAMPORTS_PER_SOL};
    use shaga_program::{Clock, Ledger, ProgramConfig, ShagaInstruction};

    use super::*;
    use crate::cluster::{LocalCluster, sign_and_send};

    const START: i64 = 1_700_000_000;

    fn payload(rate: u64, deadline: u64) -> AffairPayload {
        AffairPayload {
            ip_address: "10.1.2.3".to_string(),
            cpu_name: "Ryzen 9 7950X".to_string(),
            gpu_name: "RTX 4090".to_string(),
            total_ram_mb: 65_536,
            sol_per_hour: rate,
            affair_termination_time: deadline,
        }
    }

    async fn listed() -> (LocalCluster, Keypair, Pubkey) {
        let cluster = LocalCluster::from_ledger(Ledger::with_clock(
            ProgramConfig::default(),
            Clock::at(START),
        ));
        let lender = Keypair::generate();
        cluster
            .airdrop(&lender.pubkey(), 10 * LAMPORTS_PER_SOL)
            .await
            .unwrap();
        let instructions = vec![
            initialize(&lender.pubkey()).unwrap(),
            create_lender(&lender.pubkey()).unwrap(),
            create_affair(&lender.pubkey(), payload(LAMPORTS_PER_SOL, START as u64 + 3600)).unwrap(),
        ];
        sign_and_send(&cluster, &[&lender], &lender.pubkey(), instructions, true)
            .await
            .unwrap();
        let (affair, _) = pda::find_affair(&lender.pubkey()).unwrap();
        (cluster, lender, affair)
    }

    fn operation(ix: &Instruction) -> &'static str {
        ShagaInstruction::unpack(&ix.data).unwrap().name()
    }

    #[test]
    fn rental_addresses_bind_to_lender_record() {
        let authority = Pubkey::new_unique();
        let client = Pubkey::new_unique();
        let addresses = RentalAddresses::derive(&authority, &client).unwrap();
        assert_eq!(addresses.lender, pda::find_lender(&authority).unwrap().0);
        assert_eq!(
            addresses.rental,
            pda::find_rental(&addresses.lender, &client).unwrap().0
        );
        assert_ne!(
            addresses.rental,
            pda::find_rental(&authority, &client).unwrap().0
        );
    }

    #[tokio::test]
    async fn missing_affair_reported_before_submission() {
        let cluster = LocalCluster::new(ProgramConfig::default());
        let affair = Pubkey::new_unique();
        let result = start_rental(&cluster, &Pubkey::new_unique(), &affair, 10).await;
        assert!(matches!(
            result,
            Err(ClientError::AccountNotFound { address }) if address == affair
        ));
    }

    #[tokio::test]
    async fn wrong_record_type_reported() {
        let (cluster, _, _) = listed().await;
        let market = MarketplaceAddresses::derive().unwrap();
        let result = fetch_record::<Affair>(&cluster, &market.affairs_list).await;
        assert!(matches!(
            result,
            Err(ClientError::UnexpectedAccountType {
                expected: "affair",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn end_rental_on_vacant_affair() {
        let (cluster, lender, affair) = listed().await;
        let result = end_rental(
            &cluster,
            &lender.pubkey(),
            &affair,
            RentalTerminationAuthority::Client,
        )
        .await;
        assert!(matches!(result, Err(ClientError::NoActiveRental { .. })));
    }

    #[tokio::test]
    async fn terminate_picks_variant_from_affair_state() {
        let (cluster, lender, affair) = listed().await;
        let vacant = terminate_affair(&cluster, &lender.pubkey()).await.unwrap();
        assert_eq!(operation(&vacant), "terminate_vacant_affair");

        let client = Keypair::generate();
        cluster
            .airdrop(&client.pubkey(), 10 * LAMPORTS_PER_SOL)
            .await
            .unwrap();
        let ix = start_rental(&cluster, &client.pubkey(), &affair, START as u64 + 1800)
            .await
            .unwrap();
        sign_and_send(&cluster, &[&client], &client.pubkey(), vec![ix], true)
            .await
            .unwrap();

        let occupied = terminate_affair(&cluster, &lender.pubkey()).await.unwrap();
        assert_eq!(operation(&occupied), "terminate_affair");
        let rental = RentalAddresses::derive(&lender.pubkey(), &client.pubkey()).unwrap();
        assert!(occupied.accounts.iter().any(|meta| meta.pubkey == rental.escrow));
    }
}
