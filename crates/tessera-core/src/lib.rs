//! Tessera core: hashes, hash chains, publications and keyless signatures
//!
//! Value objects only. Verification lives in `tessera-policy`.

pub mod chain;
pub mod codec;
pub mod error;
pub mod hash;
pub mod hasher;
pub mod publication;
pub mod signature;

mod encoding;

pub use chain::{AggregationChain, CalendarChain, ChainLink, LinkDirection, CALENDAR_LEVEL};
pub use error::{ErrorCode, Result, TesseraError};
pub use hash::{DataHash, HashAlgorithm};
pub use hasher::DataHasher;
pub use publication::{PublicationData, PublicationRecord};
pub use signature::{CalendarAuthRecord, Signature};

/// Version of the tessera-core crate
pub const TESSERA_VERSION: &str = env!("CARGO_PKG_VERSION");
