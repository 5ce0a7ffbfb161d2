//! Signed transactions.
//!
//! A [`Message`] is the fee payer, the ledger time it was built at, a random
//! nonce and an ordered instruction list. It is accepted only within
//! [`MAX_TRANSACTION_AGE_SECS`] of that time. Its required signers are the fee payer followed by every instruction signer,
//! deduplicated in first-seen order; a [`Transaction`] carries one ed25519
//! signature per required signer over the serialized message.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use shaga_core::{Instruction, Keypair, Pubkey, Signature};

use crate::Result;
use crate::error::ClientError;

/// How long after its recent timestamp a message may still be submitted.
pub const MAX_TRANSACTION_AGE_SECS: i64 = 120;

/// The signed payload of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Account paying for submission.
    pub fee_payer: Pubkey,
    /// Ledger time the message was built at.
    pub recent_timestamp: i64,
    /// Sets apart messages that are otherwise identical.
    pub nonce: u64,
    /// Instructions, applied in order and atomically.
    pub instructions: Vec<Instruction>,
}

impl Message {
    /// Creates a message with a random nonce.
    #[must_use]
    pub fn new(fee_payer: Pubkey, recent_timestamp: i64, instructions: Vec<Instruction>) -> Self {
        Self {
            fee_payer,
            recent_timestamp,
            nonce: rand::random(),
            instructions,
        }
    }

    /// Replaces the nonce.
    #[must_use]
    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    /// Whether the ledger accepts this message at time `now`.
    #[must_use]
    pub const fn is_valid_at(&self, now: i64) -> bool {
        self.recent_timestamp <= now
            && self.recent_timestamp >= now.saturating_sub(MAX_TRANSACTION_AGE_SECS)
    }

    /// Identities that must sign, fee payer first.
    #[must_use]
    pub fn required_signers(&self) -> Vec<Pubkey> {
        let mut seen = HashSet::new();
        std::iter::once(&self.fee_payer)
            .chain(self.instructions.iter().flat_map(Instruction::signer_keys))
            .filter(|key| seen.insert(**key))
            .copied()
            .collect()
    }

    /// Bytes covered by the signatures.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be serialized.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// A message with its signatures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// The signed payload.
    pub message: Message,
    /// One signature per required signer, in the same order.
    pub signatures: Vec<Signature>,
}

impl Transaction {
    /// Signs `message` with the matching keypairs.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Signing`] if a required signer has no keypair.
    pub fn new_signed(message: Message, keypairs: &[&Keypair]) -> Result<Self> {
        let bytes = message.to_bytes()?;
        let signatures = message
            .required_signers()
            .iter()
            .map(|signer| {
                keypairs
                    .iter()
                    .find(|keypair| keypair.pubkey() == *signer)
                    .map(|keypair| keypair.sign(&bytes))
                    .ok_or_else(|| ClientError::Signing(format!("no keypair for signer {signer}")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            message,
            signatures,
        })
    }

    /// Transaction id: the fee payer's signature.
    #[must_use]
    pub fn id(&self) -> Option<Signature> {
        self.signatures.first().copied()
    }

    /// Checks every signature and returns the verified signer set.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Signing`] if a signature is missing or invalid.
    pub fn verify(&self) -> Result<HashSet<Pubkey>> {
        let signers = self.message.required_signers();
        if signers.len() != self.signatures.len() {
            return Err(ClientError::Signing(format!(
                "expected {} signatures, got {}",
                signers.len(),
                self.signatures.len()
            )));
        }
        let bytes = self.message.to_bytes()?;
        for (signer, signature) in signers.iter().zip(&self.signatures) {
            signature
                .verify(signer, &bytes)
                .map_err(|e| ClientError::Signing(e.to_string()))?;
        }
        Ok(signers.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use shaga_core::{AccountMeta, SHAGA_PROGRAM_ID};

    use test_case::test_case;

    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn instruction(signers: &[Pubkey]) -> Instruction {
        let accounts = signers
            .iter()
            .map(|key| AccountMeta::new(*key, true))
            .chain(std::iter::once(AccountMeta::new(Pubkey::new_unique(), false)))
            .collect();
        Instruction::new(SHAGA_PROGRAM_ID, accounts, vec![1, 2, 3])
    }

    #[test]
    fn required_signers_dedup_fee_payer_first() {
        let payer = Pubkey::new_unique();
        let other = Pubkey::new_unique();
        let message = Message::new(
            payer,
            NOW,
            vec![instruction(&[other, payer]), instruction(&[other])],
        );
        assert_eq!(message.required_signers(), vec![payer, other]);
    }

    #[test]
    fn sign_and_verify() {
        let payer = Keypair::generate();
        let client = Keypair::generate();
        let message = Message::new(payer.pubkey(), NOW, vec![instruction(&[client.pubkey()])]);
        let tx = Transaction::new_signed(message, &[&client, &payer]).unwrap();
        assert_eq!(tx.signatures.len(), 2);
        let signers = tx.verify().unwrap();
        assert!(signers.contains(&payer.pubkey()));
        assert!(signers.contains(&client.pubkey()));
        assert_eq!(tx.id(), tx.signatures.first().copied());
    }

    #[test]
    fn missing_keypair() {
        let payer = Keypair::generate();
        let message = Message::new(
            payer.pubkey(),
            NOW,
            vec![instruction(&[Pubkey::new_unique()])],
        );
        let result = Transaction::new_signed(message, &[&payer]);
        assert!(matches!(result, Err(ClientError::Signing(_))));
    }

    #[test]
    fn tampered_message_fails_verification() {
        let payer = Keypair::generate();
        let message = Message::new(payer.pubkey(), NOW, vec![instruction(&[])]);
        let mut tx = Transaction::new_signed(message, &[&payer]).unwrap();
        tx.message.instructions[0].data = vec![9];
        assert!(matches!(tx.verify(), Err(ClientError::Signing(_))));
    }

    #[test]
    fn forged_signature_list_rejected() {
        let payer = Keypair::generate();
        let impostor = Keypair::generate();
        let message = Message::new(payer.pubkey(), NOW, vec![]);
        let bytes = message.to_bytes().unwrap();
        let tx = Transaction {
            message,
            signatures: vec![impostor.sign(&bytes)],
        };
        assert!(tx.verify().is_err());
    }

    #[test]
    fn identical_operations_get_distinct_ids() {
        let payer = Keypair::generate();
        let ix = instruction(&[]);
        let build = || {
            let message = Message::new(payer.pubkey(), NOW, vec![ix.clone()]);
            Transaction::new_signed(message, &[&payer]).unwrap()
        };
        assert_ne!(build().id(), build().id());
    }

    #[test]
    fn same_nonce_gives_same_id() {
        let payer = Keypair::generate();
        let build = || {
            let message = Message::new(payer.pubkey(), NOW, vec![]).with_nonce(7);
            Transaction::new_signed(message, &[&payer]).unwrap()
        };
        assert_eq!(build().id(), build().id());
    }

    #[test_case(NOW, true; "built now")]
    #[test_case(NOW - MAX_TRANSACTION_AGE_SECS, true; "oldest accepted")]
    #[test_case(NOW - MAX_TRANSACTION_AGE_SECS - 1, false; "expired")]
    #[test_case(NOW + 1, false; "from the future")]
    fn validity_window(recent_timestamp: i64, valid: bool) {
        let message = Message::new(Pubkey::new_unique(), recent_timestamp, vec![]);
        assert_eq!(message.is_valid_at(NOW), valid);
    }
}
