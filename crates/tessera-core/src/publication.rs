//! Publications: trust-anchor codes and publication records
//!
//! A publication code is the base32 form of
//! `time_be64 || imprint || crc32_be(time_be64 || imprint)`, split into
//! dash-separated groups of six characters.

use crate::encoding::{base32_decode, base32_encode, crc32};
use crate::error::{Result, TesseraError};
use crate::hash::DataHash;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const GROUP_LEN: usize = 6;
const TIME_LEN: usize = 8;
const CRC_LEN: usize = 4;

/// A (time, calendar root) pair published out of band
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicationData {
    publication_time: u64,
    publication_hash: DataHash,
}

impl PublicationData {
    pub fn new(publication_time: u64, publication_hash: DataHash) -> Self {
        Self {
            publication_time,
            publication_hash,
        }
    }

    /// Parse a publication code, rejecting any layout, alphabet or checksum
    /// deviation with `FORMAT`
    pub fn parse(code: &str) -> Result<Self> {
        let groups: Vec<&str> = code.split('-').collect();
        let last = groups.len() - 1;
        for (i, group) in groups.iter().enumerate() {
            let ok = if i == last {
                !group.is_empty() && group.len() <= GROUP_LEN
            } else {
                group.len() == GROUP_LEN
            };
            if !ok {
                return Err(TesseraError::format(format!(
                    "publication code group {} has length {}",
                    i + 1,
                    group.len()
                )));
            }
        }

        let bytes = base32_decode(&groups.concat())?;
        if bytes.len() < TIME_LEN + 1 + CRC_LEN {
            return Err(TesseraError::format(format!(
                "publication code payload too short ({} bytes)",
                bytes.len()
            )));
        }
        let (body, crc) = bytes.split_at(bytes.len() - CRC_LEN);
        let expected = u32::from_be_bytes([crc[0], crc[1], crc[2], crc[3]]);
        let actual = crc32(body);
        if expected != actual {
            return Err(TesseraError::format(format!(
                "publication code checksum mismatch: expected {expected:08x}, computed {actual:08x}"
            )));
        }

        let (time, imprint) = body.split_at(TIME_LEN);
        let mut time_be = [0u8; TIME_LEN];
        time_be.copy_from_slice(time);
        Ok(Self {
            publication_time: u64::from_be_bytes(time_be),
            publication_hash: DataHash::from_imprint(imprint)?,
        })
    }

    /// Render as a publication code
    pub fn format(&self) -> String {
        let mut bytes = self.canonical_bytes();
        let crc = crc32(&bytes);
        bytes.extend_from_slice(&crc.to_be_bytes());
        let encoded = base32_encode(&bytes);

        let mut code = String::with_capacity(encoded.len() + encoded.len() / GROUP_LEN);
        for (i, c) in encoded.chars().enumerate() {
            if i > 0 && i % GROUP_LEN == 0 {
                code.push('-');
            }
            code.push(c);
        }
        code
    }

    /// `time_be64 || imprint`, the bytes covered by the checksum and by
    /// calendar authentication signatures
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = self.publication_time.to_be_bytes().to_vec();
        out.extend_from_slice(&self.publication_hash.imprint());
        out
    }

    pub fn publication_time(&self) -> u64 {
        self.publication_time
    }

    pub fn publication_hash(&self) -> &DataHash {
        &self.publication_hash
    }

    /// Publication time as a UTC timestamp, `None` if out of chrono's range
    pub fn publication_datetime(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.publication_time)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

impl fmt::Display for PublicationData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.publication_datetime() {
            Some(at) => write!(f, "{} {}", at.to_rfc3339(), self.publication_hash),
            None => write!(f, "{} {}", self.publication_time, self.publication_hash),
        }
    }
}

impl FromStr for PublicationData {
    type Err = TesseraError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A publication together with where it was printed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationRecord {
    pub publication_data: PublicationData,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
}

impl PublicationRecord {
    pub fn new(publication_data: PublicationData) -> Self {
        Self {
            publication_data,
            references: Vec::new(),
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.references.push(reference.into());
        self
    }

    pub fn publication_time(&self) -> u64 {
        self.publication_data.publication_time()
    }

    pub fn publication_hash(&self) -> &DataHash {
        self.publication_data.publication_hash()
    }
}
