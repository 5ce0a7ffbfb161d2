//! Integration test harness for the Shaga marketplace.
//!
//! Drives the program through the client crate against a [`LocalCluster`]
//! started at a fixed time. Scenarios live under `tests/`.

#![forbid(unsafe_code)]

use shaga_client::{ClientError, LocalCluster, TransactionReceipt, builder, sign_and_send};
use shaga_core::{Instruction, Keypair, LAMPORTS_PER_SOL, Pubkey, pda};
use shaga_program::{AccountRecord, AffairPayload, Clock, Ledger, ProgramConfig, Thread};
use tracing_subscriber::EnvFilter;

/// Ledger time at which every market starts.
pub const START: i64 = 1_700_000_000;

/// Lamports in one SOL.
pub const SOL: u64 = LAMPORTS_PER_SOL;

/// Installs a test-friendly subscriber honouring `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// An initialized marketplace on a local cluster.
pub struct Market {
    /// The cluster under test.
    pub cluster: LocalCluster,
}

impl Market {
    /// A market with default program parameters.
    pub async fn new() -> Result<Self, ClientError> {
        Self::with_config(ProgramConfig::default()).await
    }

    /// A market with custom program parameters.
    pub async fn with_config(config: ProgramConfig) -> Result<Self, ClientError> {
        init_tracing();
        let market = Self {
            cluster: LocalCluster::from_ledger(Ledger::with_clock(config, Clock::at(START))),
        };
        let admin = market.wallet(SOL).await?;
        market
            .send(&admin, builder::initialize(&admin.pubkey())?)
            .await?;
        Ok(market)
    }

    /// A fresh funded wallet.
    pub async fn wallet(&self, lamports: u64) -> Result<Keypair, ClientError> {
        let keypair = Keypair::generate();
        self.cluster.airdrop(&keypair.pubkey(), lamports).await?;
        Ok(keypair)
    }

    /// Submits `instruction` signed and paid for by `signer`.
    pub async fn send(
        &self,
        signer: &Keypair,
        instruction: Instruction,
    ) -> Result<TransactionReceipt, ClientError> {
        sign_and_send(&self.cluster, &[signer], &signer.pubkey(), vec![instruction], true).await
    }

    /// Current ledger time in seconds.
    pub async fn now(&self) -> u64 {
        self.cluster.snapshot().await.clock().unix_seconds()
    }

    /// The record of type `T` at `key`, if present.
    pub async fn record<T: AccountRecord>(&self, key: &Pubkey) -> Option<T> {
        self.cluster
            .snapshot()
            .await
            .account(key)
            .and_then(|account| account.record::<T>().cloned())
    }

    /// The schedule guarding `target`, if live.
    pub async fn schedule(&self, target: &Pubkey) -> Option<(Pubkey, Thread)> {
        let (thread_authority, _) = pda::find_thread_authority().ok()?;
        let address = pda::schedule_for(&thread_authority, target).ok()?.thread;
        self.record::<Thread>(&address)
            .await
            .map(|thread| (address, thread))
    }

    /// Registers a lender with 10 SOL and lists an affair for `lifetime` seconds.
    ///
    /// Returns the lender's wallet and the affair address.
    pub async fn list_affair(
        &self,
        sol_per_hour: u64,
        lifetime: u64,
    ) -> Result<(Keypair, Pubkey), ClientError> {
        let lender = self.wallet(10 * SOL).await?;
        let payload = AffairPayload {
            ip_address: "172.16.0.10".to_string(),
            cpu_name: "Intel Xeon w9-3495X".to_string(),
            gpu_name: "NVIDIA H100".to_string(),
            total_ram_mb: 262_144,
            sol_per_hour,
            affair_termination_time: self.now().await + lifetime,
        };
        let instructions = vec![
            builder::create_lender(&lender.pubkey())?,
            builder::create_affair(&lender.pubkey(), payload)?,
        ];
        sign_and_send(&self.cluster, &[&lender], &lender.pubkey(), instructions, true).await?;
        let (affair, _) = pda::find_affair(&lender.pubkey())?;
        Ok((lender, affair))
    }

    /// A client with 10 SOL renting `affair` for `duration` seconds.
    pub async fn rent(&self, affair: &Pubkey, duration: u64) -> Result<Keypair, ClientError> {
        let client = self.wallet(10 * SOL).await?;
        let until = self.now().await + duration;
        let ix = builder::start_rental(&self.cluster, &client.pubkey(), affair, until).await?;
        self.send(&client, ix).await?;
        Ok(client)
    }
}
