//! Collaborator capabilities consumed by verification
//!
//! Implementations are shared across concurrent verifications, hence the
//! `Send + Sync` bounds.

use crate::certificate::Certificate;
use std::time::Duration;
use tessera_core::{CalendarChain, ErrorCode, PublicationRecord};
use thiserror::Error;

/// Failure reported by an [`Extender`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtenderError {
    #[error("EXTEND/network: {0}")]
    Network(String),

    #[error("EXTEND/rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("EXTEND/timeout after {0:?}")]
    Timeout(Duration),
}

impl ExtenderError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        ExtenderError::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Code surfaced in the verification result
    pub fn code(&self) -> ErrorCode {
        match self {
            ExtenderError::Timeout(_) => ErrorCode::ExtensionTimeout,
            ExtenderError::Network(_) | ExtenderError::Rejected { .. } => ErrorCode::ExtensionError,
        }
    }
}

/// Failure reported by a publications catalog or certificate store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("CATALOG/unavailable: {0}")]
    Unavailable(String),

    #[error("CATALOG/corrupt: {0}")]
    Corrupt(String),
}

/// Fetches calendar chains reaching a later calendar root
pub trait Extender: Send + Sync {
    /// Calendar chain from the root at `aggregation_time` to the root at
    /// `publication_time`
    fn fetch_calendar_chain(
        &self,
        aggregation_time: u64,
        publication_time: u64,
    ) -> Result<CalendarChain, ExtenderError>;
}

/// Trusted set of publications
pub trait PublicationsCatalog: Send + Sync {
    /// Earliest publication at or after `time`
    fn lookup(&self, time: u64) -> Result<Option<PublicationRecord>, CatalogError>;

    /// Publication made exactly at `publication_time`
    fn find(&self, publication_time: u64) -> Result<Option<PublicationRecord>, CatalogError> {
        Ok(self
            .lookup(publication_time)?
            .filter(|record| record.publication_time() == publication_time))
    }
}

/// Trusted calendar signing certificates
pub trait CertificateStore: Send + Sync {
    fn find_certificate(&self, id: &[u8]) -> Result<Option<Certificate>, CatalogError>;
}
