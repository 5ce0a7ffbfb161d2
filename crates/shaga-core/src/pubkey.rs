//! Account addresses.
//!
//! A [`Pubkey`] is either an ed25519 public key (a wallet that can sign) or a
//! program-derived address that is guaranteed to lie off the curve, so that no
//! private key exists for it and only its owning program can act for it.

use std::fmt;
use std::str::FromStr;

use ed25519_dalek::VerifyingKey;
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::{CoreError, Result};

/// Length of an address in bytes.
pub const PUBKEY_BYTES: usize = 32;

/// Maximum number of seeds in a single derivation (bump included).
pub const MAX_SEEDS: usize = 16;

/// Maximum length of a single seed in bytes.
pub const MAX_SEED_LEN: usize = 32;

const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// A 32-byte account address.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pubkey([u8; PUBKEY_BYTES]);

impl Pubkey {
    /// Creates an address from raw bytes.
    #[must_use]
    pub const fn new_from_array(bytes: [u8; PUBKEY_BYTES]) -> Self {
        Self(bytes)
    }

    /// Creates an address from a byte slice.
    ///
    /// # Errors
    ///
    /// Returns error if the slice is not exactly 32 bytes.
    pub fn try_from_slice(bytes: &[u8]) -> Result<Self> {
        let array: [u8; PUBKEY_BYTES] = bytes.try_into().map_err(|_| {
            CoreError::InvalidAddress(format!(
                "address must be {PUBKEY_BYTES} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }

    /// Generates a random address, for fixtures and throwaway identities.
    #[must_use]
    pub fn new_unique() -> Self {
        let mut bytes = [0u8; PUBKEY_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; PUBKEY_BYTES] {
        self.0
    }

    /// Returns the raw bytes by reference.
    #[must_use]
    pub const fn as_array(&self) -> &[u8; PUBKEY_BYTES] {
        &self.0
    }

    /// Returns true if the bytes decode to a point on the ed25519 curve.
    #[must_use]
    pub fn is_on_curve(&self) -> bool {
        VerifyingKey::from_bytes(&self.0).is_ok()
    }

    /// Derives an address from `seeds` under `program_id`.
    ///
    /// The address is `sha256(seeds.. || program_id || "ProgramDerivedAddress")`
    /// and is rejected when it lands on the curve.
    ///
    /// # Errors
    ///
    /// Returns error if the seeds exceed the allowed count or length, or the
    /// result lies on the curve.
    pub fn create_program_address(seeds: &[&[u8]], program_id: &Self) -> Result<Self> {
        if seeds.len() > MAX_SEEDS {
            return Err(CoreError::TooManySeeds {
                count: seeds.len(),
                max: MAX_SEEDS,
            });
        }
        for (index, seed) in seeds.iter().enumerate() {
            if seed.len() > MAX_SEED_LEN {
                return Err(CoreError::SeedTooLong {
                    index,
                    len: seed.len(),
                    max: MAX_SEED_LEN,
                });
            }
        }

        let mut hasher = Sha256::new();
        for seed in seeds {
            hasher.update(seed);
        }
        hasher.update(program_id.as_ref());
        hasher.update(PDA_MARKER);
        let candidate = Self(hasher.finalize().into());

        if candidate.is_on_curve() {
            return Err(CoreError::OnCurve);
        }
        Ok(candidate)
    }

    /// Finds the first off-curve address for `seeds`, trying bump seeds from
    /// 255 downwards.
    ///
    /// # Errors
    ///
    /// Returns error if the seeds are malformed or no bump yields an
    /// off-curve address.
    pub fn try_find_program_address(seeds: &[&[u8]], program_id: &Self) -> Result<(Self, u8)> {
        if seeds.len() >= MAX_SEEDS {
            return Err(CoreError::TooManySeeds {
                count: seeds.len() + 1,
                max: MAX_SEEDS,
            });
        }

        for bump in (0..=u8::MAX).rev() {
            let bump_seed = [bump];
            let mut with_bump: Vec<&[u8]> = Vec::with_capacity(seeds.len() + 1);
            with_bump.extend_from_slice(seeds);
            with_bump.push(&bump_seed);
            match Self::create_program_address(&with_bump, program_id) {
                Ok(address) => return Ok((address, bump)),
                Err(CoreError::OnCurve) => {}
                Err(e) => return Err(e),
            }
        }

        Err(CoreError::NoViableBump)
    }
}

impl AsRef<[u8]> for Pubkey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; PUBKEY_BYTES]> for Pubkey {
    fn from(bytes: [u8; PUBKEY_BYTES]) -> Self {
        Self(bytes)
    }
}

impl FromStr for Pubkey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| CoreError::InvalidAddress(format!("invalid base58: {e}")))?;
        Self::try_from_slice(&bytes)
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pubkey({self})")
    }
}

impl Serialize for Pubkey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Pubkey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}
