//! Entity records stored in ledger accounts.

mod affair;
mod escrow;
mod lender;
mod registry;
mod rental;

pub use affair::{
    Affair, AffairPayload, AffairState, MAX_CPU_NAME_LEN, MAX_GPU_NAME_LEN, MAX_IP_ADDRESS_LEN,
};
pub use escrow::Escrow;
pub use lender::Lender;
pub use registry::Registry;
pub use rental::Rental;
