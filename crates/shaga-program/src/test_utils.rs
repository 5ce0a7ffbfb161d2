//! Fixtures for handler tests.

use std::collections::HashSet;

use shaga_core::pda;
use shaga_core::{Instruction, Pubkey, SCHEDULER_PROGRAM_ID, SYSTEM_PROGRAM_ID};

use crate::clock::Clock;
use crate::config::ProgramConfig;
use crate::events::ProgramEvent;
use crate::instruction::{
    self, CreateAffairAccounts, EndRentalAccounts, InitializeAccounts, InitializeLenderAccounts,
    RentalTerminationAuthority, StartRentalAccounts, TerminateAffairAccounts,
    TerminateVacantAffairAccounts,
};
use crate::ledger::Ledger;
use crate::Result;
use crate::account::AccountRecord;
use crate::states::AffairPayload;

pub const START: i64 = 1_700_000_000;
pub const SOL: u64 = shaga_core::LAMPORTS_PER_SOL;

pub struct Harness {
    pub ledger: Ledger,
    pub affairs_list: Pubkey,
    pub vault: Pubkey,
    pub thread_authority: Pubkey,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(ProgramConfig::default())
    }

    pub fn with_config(config: ProgramConfig) -> Self {
        let (affairs_list, _) = pda::find_affair_list().unwrap();
        let (vault, _) = pda::find_vault().unwrap();
        let (thread_authority, _) = pda::find_thread_authority().unwrap();
        Self {
            ledger: Ledger::with_clock(config, Clock::at(START)),
            affairs_list,
            vault,
            thread_authority,
        }
    }

    /// Initialized registry.
    pub fn initialized() -> Self {
        let mut harness = Self::new();
        let payer = harness.funded(SOL);
        harness.send(&payer, &harness.initialize_ix(&payer)).unwrap();
        harness
    }

    pub fn now(&self) -> u64 {
        self.ledger.clock().unix_seconds()
    }

    pub fn funded(&mut self, lamports: u64) -> Pubkey {
        let key = Pubkey::new_unique();
        self.ledger.airdrop(&key, lamports).unwrap();
        key
    }

    pub fn send(&mut self, signer: &Pubkey, ix: &Instruction) -> Result<Vec<ProgramEvent>> {
        let signers: HashSet<Pubkey> = [*signer].into_iter().collect();
        self.ledger.process_transaction(std::slice::from_ref(ix), &signers)
    }

    pub fn record<T: AccountRecord>(&self, key: &Pubkey) -> Option<T> {
        self.ledger
            .account(key)
            .and_then(|account| account.record::<T>().cloned())
    }

    pub fn initialize_ix(&self, payer: &Pubkey) -> Instruction {
        instruction::initialize(&InitializeAccounts {
            payer: *payer,
            affairs_list: self.affairs_list,
            vault: self.vault,
            thread_authority: self.thread_authority,
            system_program: SYSTEM_PROGRAM_ID,
        })
        .unwrap()
    }

    pub fn lender_ix(&self, authority: &Pubkey) -> Instruction {
        instruction::initialize_lender(&InitializeLenderAccounts {
            payer: *authority,
            lender: lender_of(authority),
            system_program: SYSTEM_PROGRAM_ID,
        })
        .unwrap()
    }

    pub fn payload(&self, sol_per_hour: u64, lifetime: u64) -> AffairPayload {
        AffairPayload {
            ip_address: "192.168.1.20".to_string(),
            cpu_name: "AMD EPYC 7763".to_string(),
            gpu_name: "NVIDIA A100".to_string(),
            total_ram_mb: 131_072,
            sol_per_hour,
            affair_termination_time: self.now() + lifetime,
        }
    }

    pub fn create_affair_ix(&self, authority: &Pubkey, payload: AffairPayload) -> Instruction {
        let affair = affair_of(authority);
        instruction::create_affair(
            &CreateAffairAccounts {
                authority: *authority,
                affair,
                lender: lender_of(authority),
                affairs_list: self.affairs_list,
                affair_clockwork_thread: self.schedule(&affair),
                vault: self.vault,
                thread_authority: self.thread_authority,
                system_program: SYSTEM_PROGRAM_ID,
                clockwork_program: SCHEDULER_PROGRAM_ID,
            },
            payload,
        )
        .unwrap()
    }

    pub fn schedule(&self, target: &Pubkey) -> Pubkey {
        pda::schedule_for(&self.thread_authority, target)
            .unwrap()
            .thread
    }

    pub fn start_rental_ix(&self, client: &Pubkey, lender_authority: &Pubkey, until: u64) -> Instruction {
        let lender = lender_of(lender_authority);
        let affair = affair_of(lender_authority);
        let rental = rental_of(&lender, client);
        instruction::start_rental(
            &StartRentalAccounts {
                client: *client,
                lender,
                affair,
                affairs_list: self.affairs_list,
                escrow: escrow_of(&lender, client),
                rental,
                vault: self.vault,
                rental_clockwork_thread: self.schedule(&rental),
                affair_clockwork_thread: self.schedule(&affair),
                thread_authority: self.thread_authority,
                system_program: SYSTEM_PROGRAM_ID,
                clockwork_program: SCHEDULER_PROGRAM_ID,
            },
            until,
        )
        .unwrap()
    }

    pub fn end_rental_ix(
        &self,
        signer: &Pubkey,
        client: &Pubkey,
        lender_authority: &Pubkey,
        by: RentalTerminationAuthority,
    ) -> Instruction {
        let lender = lender_of(lender_authority);
        let affair = affair_of(lender_authority);
        let rental = rental_of(&lender, client);
        instruction::end_rental(
            &EndRentalAccounts {
                signer: *signer,
                client: *client,
                thread_authority: self.thread_authority,
                lender,
                affair,
                affairs_list: self.affairs_list,
                escrow: escrow_of(&lender, client),
                rental,
                vault: self.vault,
                rental_clockwork_thread: self.schedule(&rental),
                affair_clockwork_thread: self.schedule(&affair),
                system_program: SYSTEM_PROGRAM_ID,
                clockwork_program: SCHEDULER_PROGRAM_ID,
            },
            by,
        )
        .unwrap()
    }

    pub fn terminate_affair_ix(&self, authority: &Pubkey, client: &Pubkey) -> Instruction {
        let lender = lender_of(authority);
        let affair = affair_of(authority);
        let rental = rental_of(&lender, client);
        instruction::terminate_affair(&TerminateAffairAccounts {
            authority: *authority,
            client: *client,
            lender,
            affair,
            affairs_list: self.affairs_list,
            escrow: escrow_of(&lender, client),
            rental,
            vault: self.vault,
            affair_clockwork_thread: self.schedule(&affair),
            rental_clockwork_thread: self.schedule(&rental),
            thread_authority: self.thread_authority,
            system_program: SYSTEM_PROGRAM_ID,
            clockwork_program: SCHEDULER_PROGRAM_ID,
        })
        .unwrap()
    }

    pub fn terminate_vacant_ix(&self, signer: &Pubkey, authority: &Pubkey) -> Instruction {
        let affair = affair_of(authority);
        instruction::terminate_vacant_affair(&TerminateVacantAffairAccounts {
            signer: *signer,
            authority: *authority,
            lender: lender_of(authority),
            affair,
            affairs_list: self.affairs_list,
            vault: self.vault,
            affair_clockwork_thread: self.schedule(&affair),
            thread_authority: self.thread_authority,
            system_program: SYSTEM_PROGRAM_ID,
            clockwork_program: SCHEDULER_PROGRAM_ID,
        })
        .unwrap()
    }

    /// Registers a funded lender with a listed affair.
    pub fn listed_affair(&mut self, sol_per_hour: u64, lifetime: u64) -> Pubkey {
        let authority = self.funded(10 * SOL);
        self.send(&authority, &self.lender_ix(&authority)).unwrap();
        let payload = self.payload(sol_per_hour, lifetime);
        self.send(&authority, &self.create_affair_ix(&authority, payload))
            .unwrap();
        authority
    }

    /// A listed affair plus a client renting it for `duration` seconds.
    pub fn rented_affair(&mut self, sol_per_hour: u64, duration: u64) -> (Pubkey, Pubkey) {
        let authority = self.listed_affair(sol_per_hour, 3 * duration);
        let client = self.funded(10 * SOL);
        let until = self.now() + duration;
        self.send(&client, &self.start_rental_ix(&client, &authority, until))
            .unwrap();
        (authority, client)
    }
}

pub fn lender_of(authority: &Pubkey) -> Pubkey {
    pda::find_lender(authority).unwrap().0
}

pub fn affair_of(authority: &Pubkey) -> Pubkey {
    pda::find_affair(authority).unwrap().0
}

pub fn rental_of(lender: &Pubkey, client: &Pubkey) -> Pubkey {
    pda::find_rental(lender, client).unwrap().0
}

pub fn escrow_of(lender: &Pubkey, client: &Pubkey) -> Pubkey {
    pda::find_rent_escrow(lender, client).unwrap().0
}
