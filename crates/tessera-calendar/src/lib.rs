//! Tessera Calendar: an in-memory reference calendar
//!
//! Aggregates document hashes into rounds, links rounds into a calendar,
//! signs round roots with Ed25519 and publishes calendar roots. The
//! [`Calendar`] doubles as extender, publications catalog and certificate
//! store for `tessera-policy`.

pub mod aggregator;
pub mod calendar;
pub mod catalog;
pub mod error;
pub mod tree;

pub use aggregator::{AggregatedBatch, Aggregator};
pub use calendar::Calendar;
pub use catalog::PublicationsFile;
pub use error::CalendarError;
pub use tree::MerkleTree;
