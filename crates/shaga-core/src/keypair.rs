//! Ed25519 signing identities.

use std::fmt;
use std::str::FromStr;

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CoreError, Result};
use crate::pubkey::Pubkey;

/// Length of a signature in bytes.
pub const SIGNATURE_BYTES: usize = 64;

/// An Ed25519 keypair whose public half is a wallet [`Pubkey`].
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generates a new random keypair from the OS CSPRNG.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Restores a keypair from its 32-byte secret.
    ///
    /// # Errors
    ///
    /// Returns error if the secret is not 32 bytes.
    pub fn from_secret_key(secret: &[u8]) -> Result<Self> {
        let bytes: [u8; 32] = secret.try_into().map_err(|_| {
            CoreError::InvalidSecretKey(format!("expected 32 bytes, got {}", secret.len()))
        })?;
        Ok(Self {
            signing_key: SigningKey::from_bytes(&bytes),
        })
    }

    /// Returns the wallet address.
    #[must_use]
    pub fn pubkey(&self) -> Pubkey {
        Pubkey::new_from_array(self.signing_key.verifying_key().to_bytes())
    }

    /// Signs a message.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.signing_key.sign(message).to_bytes())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("pubkey", &self.pubkey())
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// A detached Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; SIGNATURE_BYTES]);

impl Signature {
    /// Creates a signature from raw bytes.
    #[must_use]
    pub const fn new_from_array(bytes: [u8; SIGNATURE_BYTES]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; SIGNATURE_BYTES] {
        self.0
    }

    /// Verifies this signature over `message` for the given signer.
    ///
    /// # Errors
    ///
    /// Returns error if the signer is not a curve point or the signature does
    /// not match.
    pub fn verify(&self, signer: &Pubkey, message: &[u8]) -> Result<()> {
        let key = VerifyingKey::from_bytes(signer.as_array())
            .map_err(|e| CoreError::InvalidSignature(format!("signer {signer}: {e}")))?;
        let signature = ed25519_dalek::Signature::from_bytes(&self.0);
        key.verify(message, &signature)
            .map_err(|e| CoreError::InvalidSignature(e.to_string()))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({self})")
    }
}

impl FromStr for Signature {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| CoreError::InvalidSignature(format!("invalid base58: {e}")))?;
        let array: [u8; SIGNATURE_BYTES] = bytes.as_slice().try_into().map_err(|_| {
            CoreError::InvalidSignature(format!(
                "signature must be {SIGNATURE_BYTES} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify() {
        let keypair = Keypair::generate();
        let signature = keypair.sign(b"start rental");
        assert!(signature.verify(&keypair.pubkey(), b"start rental").is_ok());
    }

    #[test]
    fn verify_rejects_tampered_message() {
        let keypair = Keypair::generate();
        let signature = keypair.sign(b"original");
        assert!(signature.verify(&keypair.pubkey(), b"tampered").is_err());
    }

    #[test]
    fn verify_rejects_wrong_signer() {
        let keypair = Keypair::generate();
        let other = Keypair::generate();
        let signature = keypair.sign(b"message");
        assert!(signature.verify(&other.pubkey(), b"message").is_err());
    }

    #[test]
    fn secret_key_roundtrip() {
        let keypair = Keypair::generate();
        let restored = Keypair::from_secret_key(&keypair.signing_key.to_bytes()).unwrap();
        assert_eq!(keypair.pubkey(), restored.pubkey());
    }

    #[test]
    fn secret_key_wrong_length() {
        assert!(Keypair::from_secret_key(&[1u8; 16]).is_err());
    }

    #[test]
    fn debug_redacts_secret() {
        let keypair = Keypair::generate();
        let debug = format!("{keypair:?}");
        assert!(debug.contains("REDACTED"));
        assert!(debug.contains(&keypair.pubkey().to_string()));
    }

    #[test]
    fn signature_base58_roundtrip() {
        let signature = Keypair::generate().sign(b"x");
        let parsed: Signature = signature.to_string().parse().unwrap();
        assert_eq!(signature, parsed);
    }
}
