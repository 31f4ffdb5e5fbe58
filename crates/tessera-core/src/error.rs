//! Unified Error Model
//!
//! `ErrorCode` is the taxonomy reported through verification results.
//! `TesseraError` is the fault type of the core value objects; every variant
//! maps onto exactly one code.
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Verification and construction error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed publication code or signature container
    Format,
    /// Document hash differs from the signature input hash
    HashMismatch,
    /// A recomputed chain root disagrees with the recorded root
    ChainInconsistent,
    /// No applicable trust material for the selected policy
    NoTrustAnchor,
    /// Extension was requested and failed
    ExtensionError,
    /// Extension did not complete within the configured timeout
    ExtensionTimeout,
    /// Component misuse, e.g. reusing a finalized hasher
    InvalidState,
    /// Calendar authentication record signature does not verify
    AuthRecordInvalid,
    /// Signing certificate is not valid at the aggregation time
    CertificateInvalid,
    /// Reading document data failed
    Io,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Format => "FORMAT",
            ErrorCode::HashMismatch => "HASH_MISMATCH",
            ErrorCode::ChainInconsistent => "CHAIN_INCONSISTENT",
            ErrorCode::NoTrustAnchor => "NO_TRUST_ANCHOR",
            ErrorCode::ExtensionError => "EXTENSION_ERROR",
            ErrorCode::ExtensionTimeout => "EXTENSION_TIMEOUT",
            ErrorCode::InvalidState => "INVALID_STATE",
            ErrorCode::AuthRecordInvalid => "AUTH_RECORD_INVALID",
            ErrorCode::CertificateInvalid => "CERTIFICATE_INVALID",
            ErrorCode::Io => "IO",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum TesseraError {
    #[error("FORMAT/{0}")]
    Format(String),

    #[error("STATE/{0}")]
    InvalidState(String),

    #[error("CHAIN/{0}")]
    ChainInconsistent(String),

    #[error("IO/{0}")]
    Io(#[from] std::io::Error),
}

impl TesseraError {
    pub fn format(msg: impl Into<String>) -> Self {
        TesseraError::Format(msg.into())
    }

    pub fn chain(msg: impl Into<String>) -> Self {
        TesseraError::ChainInconsistent(msg.into())
    }

    /// The taxonomy code this fault is reported as
    pub fn code(&self) -> ErrorCode {
        match self {
            TesseraError::Format(_) => ErrorCode::Format,
            TesseraError::InvalidState(_) => ErrorCode::InvalidState,
            TesseraError::ChainInconsistent(_) => ErrorCode::ChainInconsistent,
            TesseraError::Io(_) => ErrorCode::Io,
        }
    }
}

pub type Result<T> = std::result::Result<T, TesseraError>;
