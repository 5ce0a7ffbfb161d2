//! Rent pricing and escrow disbursement.
//!
//! Rent is charged per second at an hourly rate with ceiling rounding
//! (provider-friendly). A rental ended before its deadline pays the lender
//! for elapsed time only and refunds the remainder; a rental that reached its
//! deadline pays the lender the whole escrow.

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::config::{MAX_BASIS_POINTS, ProgramConfig, SECONDS_PER_HOUR};
use crate::error::ShagaError;

/// Cost of booking a rental.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentQuote {
    /// Rent locked in escrow.
    pub rent_amount: u64,
    /// Marketplace fee paid to the vault.
    pub fee_amount: u64,
    /// Deposit for the expiry schedule.
    pub schedule_fee: u64,
    /// Everything the client must hold.
    pub total: u64,
}

/// Inputs for disbursing an escrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementInput {
    /// When the rental started.
    pub rental_start_time: u64,
    /// The rental deadline.
    pub rental_termination_time: u64,
    /// Ledger time of settlement.
    pub now: u64,
    /// Hourly price in lamports.
    pub sol_per_hour: u64,
    /// Lamports locked in the escrow.
    pub escrow_amount: u64,
}

/// How an escrow is split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// Lamports owed to the lender.
    pub paid_to_lender: u64,
    /// Lamports returned to the client.
    pub refunded_to_client: u64,
    /// Seconds the machine was in use.
    pub elapsed_seconds: u64,
    /// True if the rental reached its deadline.
    pub completed: bool,
}

/// Calculates rent owed for a duration at an hourly rate.
///
/// Uses ceiling division so partial seconds favor the provider. Saturates at
/// `u64::MAX`.
#[must_use]
pub const fn calculate_payment(duration_seconds: u64, rate_per_hour: u64) -> u64 {
    if duration_seconds == 0 || rate_per_hour == 0 {
        return 0;
    }

    let numerator = duration_seconds as u128 * rate_per_hour as u128;
    let hour = SECONDS_PER_HOUR as u128;
    let payment = numerator.div_ceil(hour);

    if payment > u64::MAX as u128 {
        u64::MAX
    } else {
        payment as u64
    }
}

/// Marketplace fee on `rent_amount` at `fee_bps` basis points, rounded down.
#[must_use]
pub const fn marketplace_fee(rent_amount: u64, fee_bps: u16) -> u64 {
    (rent_amount as u128 * fee_bps as u128 / MAX_BASIS_POINTS as u128) as u64
}

/// Quotes a rental of `duration_seconds` at `sol_per_hour`.
///
/// # Errors
///
/// Returns [`ShagaError::NumericalOverflow`] if the total does not fit in `u64`.
pub fn quote_rental(
    duration_seconds: u64,
    sol_per_hour: u64,
    config: &ProgramConfig,
) -> Result<RentQuote> {
    let rent_amount = calculate_payment(duration_seconds, sol_per_hour);
    let fee_amount = marketplace_fee(rent_amount, config.fee_bps);
    let schedule_fee = config.thread_fee;
    let total = rent_amount
        .checked_add(fee_amount)
        .and_then(|sum| sum.checked_add(schedule_fee))
        .ok_or(ShagaError::NumericalOverflow)?;
    Ok(RentQuote {
        rent_amount,
        fee_amount,
        schedule_fee,
        total,
    })
}

/// Splits an escrow between lender and client.
///
/// The two shares always sum to `escrow_amount`.
#[must_use]
pub fn settle_rental(input: &SettlementInput) -> Settlement {
    let elapsed_seconds = input.now.saturating_sub(input.rental_start_time);

    if input.now >= input.rental_termination_time {
        return Settlement {
            paid_to_lender: input.escrow_amount,
            refunded_to_client: 0,
            elapsed_seconds,
            completed: true,
        };
    }

    let owed = calculate_payment(elapsed_seconds, input.sol_per_hour).min(input.escrow_amount);
    Settlement {
        paid_to_lender: owed,
        refunded_to_client: input.escrow_amount - owed,
        elapsed_seconds,
        completed: false,
    }
}
