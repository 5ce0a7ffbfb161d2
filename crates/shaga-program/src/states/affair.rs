use serde::{Deserialize, Serialize};
use shaga_core::Pubkey;

use crate::Result;
use crate::error::ShagaError;

/// Longest accepted network address.
pub const MAX_IP_ADDRESS_LEN: usize = 15;
/// Longest accepted CPU description.
pub const MAX_CPU_NAME_LEN: usize = 64;
/// Longest accepted GPU description.
pub const MAX_GPU_NAME_LEN: usize = 64;

/// Lifecycle of an affair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AffairState {
    /// Open for rental.
    #[default]
    Listed,
    /// Held by exactly one client.
    Rented,
    /// Closed by its lender or by expiry.
    Terminated,
}

impl AffairState {
    /// Checks if a transition to the target state is valid.
    #[must_use]
    pub const fn can_transition_to(&self, target: &Self) -> bool {
        use AffairState::{Listed, Rented, Terminated};

        matches!(
            (self, target),
            (Listed, Rented) | (Rented, Listed) | (Listed | Rented, Terminated)
        )
    }
}

impl std::fmt::Display for AffairState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Listed => write!(f, "Listed"),
            Self::Rented => write!(f, "Rented"),
            Self::Terminated => write!(f, "Terminated"),
        }
    }
}

/// Parameters a lender supplies when listing a machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffairPayload {
    /// Network address clients connect to.
    pub ip_address: String,
    /// CPU description.
    pub cpu_name: String,
    /// GPU description.
    pub gpu_name: String,
    /// Memory capacity in megabytes.
    pub total_ram_mb: u32,
    /// Hourly price in lamports.
    pub sol_per_hour: u64,
    /// When the listing expires on its own.
    pub affair_termination_time: u64,
}

impl AffairPayload {
    /// Validates the payload against ledger time `now`.
    ///
    /// # Errors
    ///
    /// Returns [`ShagaError::InvalidPayload`] for a zero price or memory size
    /// or an over-long string, and [`ShagaError::InvalidTerminationTime`] if
    /// the deadline is not in the future.
    pub fn validate(&self, now: u64) -> Result<()> {
        if self.sol_per_hour == 0 {
            return Err(ShagaError::invalid_payload("sol_per_hour must be positive"));
        }
        if self.total_ram_mb == 0 {
            return Err(ShagaError::invalid_payload("total_ram_mb must be positive"));
        }
        check_len("ip_address", &self.ip_address, MAX_IP_ADDRESS_LEN)?;
        check_len("cpu_name", &self.cpu_name, MAX_CPU_NAME_LEN)?;
        check_len("gpu_name", &self.gpu_name, MAX_GPU_NAME_LEN)?;
        if self.affair_termination_time <= now {
            return Err(ShagaError::InvalidTerminationTime);
        }
        Ok(())
    }
}

fn check_len(field: &str, value: &str, max: usize) -> Result<()> {
    if value.len() > max {
        return Err(ShagaError::invalid_payload(format!(
            "{field} exceeds {max} bytes ({})",
            value.len()
        )));
    }
    Ok(())
}

/// A lender's advertised machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affair {
    /// The lender wallet that owns the listing.
    pub authority: Pubkey,
    /// Client of the active rental.
    pub client: Option<Pubkey>,
    /// Address of the active rental.
    pub rental: Option<Pubkey>,
    /// Network address clients connect to.
    pub ip_address: String,
    /// CPU description.
    pub cpu_name: String,
    /// GPU description.
    pub gpu_name: String,
    /// Memory capacity in megabytes.
    pub total_ram_mb: u32,
    /// Hourly price in lamports.
    pub sol_per_hour: u64,
    /// Current lifecycle state.
    pub affair_state: AffairState,
    /// When the listing expires on its own.
    pub affair_termination_time: u64,
    /// Start of the active rental, zero when vacant.
    pub active_rental_start_time: u64,
    /// Rent locked for the active rental, zero when vacant.
    pub due_rent_amount: u64,
}

impl Affair {
    /// A freshly listed affair.
    #[must_use]
    pub fn new(authority: Pubkey, payload: AffairPayload) -> Self {
        Self {
            authority,
            client: None,
            rental: None,
            ip_address: payload.ip_address,
            cpu_name: payload.cpu_name,
            gpu_name: payload.gpu_name,
            total_ram_mb: payload.total_ram_mb,
            sol_per_hour: payload.sol_per_hour,
            affair_state: AffairState::Listed,
            affair_termination_time: payload.affair_termination_time,
            active_rental_start_time: 0,
            due_rent_amount: 0,
        }
    }

    /// Returns true if a client may start a rental.
    #[must_use]
    pub fn can_join(&self) -> bool {
        self.affair_state == AffairState::Listed
    }

    /// Returns true if a rental is active.
    #[must_use]
    pub fn is_rented(&self) -> bool {
        self.affair_state == AffairState::Rented
    }

    fn transition_to(&mut self, target: AffairState) -> Result<()> {
        if self.affair_state.can_transition_to(&target) {
            self.affair_state = target;
            Ok(())
        } else {
            Err(ShagaError::InvalidStateTransition {
                from: self.affair_state.to_string(),
                to: target.to_string(),
            })
        }
    }

    /// Records a started rental.
    ///
    /// # Errors
    ///
    /// Returns [`ShagaError::AffairAlreadyJoined`] unless the affair is listed.
    pub fn join(
        &mut self,
        client: Pubkey,
        rental: Pubkey,
        start_time: u64,
        rent_amount: u64,
    ) -> Result<()> {
        if !self.can_join() {
            return Err(ShagaError::AffairAlreadyJoined);
        }
        self.transition_to(AffairState::Rented)?;
        self.client = Some(client);
        self.rental = Some(rental);
        self.active_rental_start_time = start_time;
        self.due_rent_amount = rent_amount;
        Ok(())
    }

    /// Clears the active rental and relists the affair.
    ///
    /// # Errors
    ///
    /// Returns [`ShagaError::InvalidStateTransition`] unless the affair is rented.
    pub fn leave(&mut self) -> Result<()> {
        self.transition_to(AffairState::Listed)?;
        self.client = None;
        self.rental = None;
        self.active_rental_start_time = 0;
        self.due_rent_amount = 0;
        Ok(())
    }

    /// Marks the affair terminated.
    ///
    /// # Errors
    ///
    /// Returns [`ShagaError::InvalidStateTransition`] if already terminated.
    pub fn terminate(&mut self) -> Result<()> {
        self.transition_to(AffairState::Terminated)?;
        self.client = None;
        self.rental = None;
        Ok(())
    }
}
