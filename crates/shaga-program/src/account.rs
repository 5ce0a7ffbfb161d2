//! Ledger accounts and the records they hold.

use serde::{Deserialize, Serialize};
use shaga_core::Pubkey;

use crate::scheduler::Thread;
use crate::states::{Affair, Escrow, Lender, Registry, Rental};

/// A key-addressed ledger entry: a lamport balance, an owning program, and a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Balance in lamports.
    pub lamports: u64,
    /// Program allowed to modify the record.
    pub owner: Pubkey,
    /// The stored record.
    pub data: AccountData,
}

impl Account {
    /// A wallet account holding only lamports.
    #[must_use]
    pub fn system(lamports: u64) -> Self {
        Self {
            lamports,
            owner: shaga_core::SYSTEM_PROGRAM_ID,
            data: AccountData::System,
        }
    }

    /// Typed view of the record, if it holds a `T`.
    #[must_use]
    pub fn record<T: AccountRecord>(&self) -> Option<&T> {
        T::from_data(&self.data)
    }
}

/// Record stored in an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "record", rename_all = "snake_case")]
pub enum AccountData {
    /// Plain wallet, no record.
    System,
    /// The marketplace registry.
    Registry(Registry),
    /// The schedule authority marker.
    ThreadAuthority,
    /// A lender record.
    Lender(Lender),
    /// A listed machine.
    Affair(Affair),
    /// An active rental.
    Rental(Rental),
    /// The vault or a per-rental escrow.
    Escrow(Escrow),
    /// A scheduled task.
    Thread(Thread),
}

impl AccountData {
    /// Name of the record type, for diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Registry(_) => Registry::NAME,
            Self::ThreadAuthority => "thread_authority",
            Self::Lender(_) => Lender::NAME,
            Self::Affair(_) => Affair::NAME,
            Self::Rental(_) => Rental::NAME,
            Self::Escrow(_) => Escrow::NAME,
            Self::Thread(_) => Thread::NAME,
        }
    }
}

/// A record type storable in an [`Account`].
pub trait AccountRecord: Clone + Sized {
    /// Record type name, used in error messages.
    const NAME: &'static str;

    /// Borrows the record out of account data, if the variant matches.
    fn from_data(data: &AccountData) -> Option<&Self>;

    /// Wraps the record as account data.
    fn into_data(self) -> AccountData;
}

macro_rules! account_record {
    ($($ty:ident => $variant:ident, $name:literal;)+) => {
        $(
            impl AccountRecord for $ty {
                const NAME: &'static str = $name;

                fn from_data(data: &AccountData) -> Option<&Self> {
                    match data {
                        AccountData::$variant(record) => Some(record),
                        _ => None,
                    }
                }

                fn into_data(self) -> AccountData {
                    AccountData::$variant(self)
                }
            }
        )+
    };
}

account_record! {
    Registry => Registry, "registry";
    Lender => Lender, "lender";
    Affair => Affair, "affair";
    Rental => Rental, "rental";
    Escrow => Escrow, "escrow";
    Thread => Thread, "thread";
}
