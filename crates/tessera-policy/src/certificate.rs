//! Calendar signing certificates
use ed25519_dalek::{Signature as Ed25519Signature, SignatureError, VerifyingKey};

/// An Ed25519 public key trusted to sign calendar roots within a time window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    /// Matches `CalendarAuthRecord::signer_id`
    pub id: Vec<u8>,
    pub key: VerifyingKey,
    /// First second (inclusive) the certificate may sign for
    pub valid_from: u64,
    /// Last second (inclusive), `None` if open-ended
    pub valid_until: Option<u64>,
}

impl Certificate {
    pub fn new(id: impl Into<Vec<u8>>, key: VerifyingKey) -> Self {
        Self {
            id: id.into(),
            key,
            valid_from: 0,
            valid_until: None,
        }
    }

    pub fn with_validity(mut self, valid_from: u64, valid_until: Option<u64>) -> Self {
        self.valid_from = valid_from;
        self.valid_until = valid_until;
        self
    }

    pub fn is_valid_at(&self, time: u64) -> bool {
        time >= self.valid_from && self.valid_until.map_or(true, |until| time <= until)
    }

    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), SignatureError> {
        let signature = Ed25519Signature::from_slice(signature)?;
        self.key.verify_strict(message, &signature)
    }
}
