//! Data hashes and digest algorithms
//!
//! A `DataHash` is an algorithm tag plus a fixed-length digest. Its binary
//! form, the imprint, is the one-byte algorithm id followed by the digest.
use crate::error::{Result, TesseraError};
use crate::hasher::DataHasher;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Supported digest algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HashAlgorithm {
    #[serde(rename = "SHA-256")]
    Sha256,
    #[serde(rename = "SHA-384")]
    Sha384,
    #[serde(rename = "SHA-512")]
    Sha512,
    #[serde(rename = "BLAKE3")]
    Blake3,
}

impl HashAlgorithm {
    pub const ALL: [HashAlgorithm; 4] = [
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha384,
        HashAlgorithm::Sha512,
        HashAlgorithm::Blake3,
    ];

    /// Imprint id byte
    pub const fn id(self) -> u8 {
        match self {
            HashAlgorithm::Sha256 => 0x01,
            HashAlgorithm::Sha384 => 0x04,
            HashAlgorithm::Sha512 => 0x05,
            HashAlgorithm::Blake3 => 0x09,
        }
    }

    pub fn from_id(id: u8) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|alg| alg.id() == id)
            .ok_or_else(|| TesseraError::format(format!("unknown hash algorithm id 0x{id:02x}")))
    }

    /// Digest length in bytes
    pub const fn length(self) -> usize {
        match self {
            HashAlgorithm::Sha256 | HashAlgorithm::Blake3 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "SHA-256",
            HashAlgorithm::Sha384 => "SHA-384",
            HashAlgorithm::Sha512 => "SHA-512",
            HashAlgorithm::Blake3 => "BLAKE3",
        }
    }

    /// One-shot digest of an in-memory buffer
    pub fn digest(self, data: &[u8]) -> DataHash {
        DataHasher::digest(self, data)
    }
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        HashAlgorithm::Sha256
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = TesseraError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|alg| alg.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| TesseraError::format(format!("unknown hash algorithm `{s}`")))
    }
}

/// An immutable (algorithm, digest) pair.
///
/// Equality is exact: two hashes with different algorithms are never equal,
/// even when their digest bytes coincide.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DataHash {
    algorithm: HashAlgorithm,
    value: Vec<u8>,
}

impl DataHash {
    /// Wrap a digest value, checking its length against the algorithm
    pub fn new(algorithm: HashAlgorithm, value: impl Into<Vec<u8>>) -> Result<Self> {
        let value = value.into();
        if value.len() != algorithm.length() {
            return Err(TesseraError::format(format!(
                "{} digest must be {} bytes, got {}",
                algorithm,
                algorithm.length(),
                value.len()
            )));
        }
        Ok(Self { algorithm, value })
    }

    /// Digest output straight from a hash engine, whose length is fixed by the algorithm
    pub(crate) fn from_digest(algorithm: HashAlgorithm, value: Vec<u8>) -> Self {
        debug_assert_eq!(value.len(), algorithm.length());
        Self { algorithm, value }
    }

    /// Parse an imprint (`id || digest`)
    pub fn from_imprint(imprint: &[u8]) -> Result<Self> {
        let (&id, value) = imprint
            .split_first()
            .ok_or_else(|| TesseraError::format("empty imprint"))?;
        Self::new(HashAlgorithm::from_id(id)?, value)
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn imprint(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + self.value.len());
        out.push(self.algorithm.id());
        out.extend_from_slice(&self.value);
        out
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.value)
    }
}

impl fmt::Display for DataHash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}

impl fmt::Debug for DataHash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DataHash({self})")
    }
}

impl FromStr for DataHash {
    type Err = TesseraError;

    /// Parse the `ALG:hex` display form
    fn from_str(s: &str) -> Result<Self> {
        let (alg, digest) = s
            .split_once(':')
            .ok_or_else(|| TesseraError::format(format!("expected ALG:hex, got `{s}`")))?;
        let value = hex::decode(digest)
            .map_err(|e| TesseraError::format(format!("invalid hex digest: {e}")))?;
        Self::new(alg.parse()?, value)
    }
}

impl Serialize for DataHash {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DataHash {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
