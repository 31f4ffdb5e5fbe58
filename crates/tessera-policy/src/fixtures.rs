//! Hand-built signatures and collaborators for unit tests
use crate::certificate::Certificate;
use crate::services::{
    CatalogError, CertificateStore, Extender, ExtenderError, PublicationsCatalog,
};
use ed25519_dalek::{Signer, SigningKey};
use tessera_core::{
    AggregationChain, CalendarAuthRecord, CalendarChain, ChainLink, DataHash, HashAlgorithm,
    PublicationData, PublicationRecord, Signature,
};

pub const AGGREGATION_TIME: u64 = 1_458_000_000;
pub const LATER_TIME: u64 = AGGREGATION_TIME + 30 * 86_400;
pub const SIGNER_ID: &[u8] = b"fixture-calendar";

pub struct Fixture {
    pub document: DataHash,
    /// Calendar chain to its own round plus an authentication record
    pub signature: Signature,
    pub later_publication: PublicationRecord,
}

fn h(tag: &[u8]) -> DataHash {
    HashAlgorithm::Sha256.digest(tag)
}

pub fn signing_key() -> SigningKey {
    SigningKey::from_bytes(&[42u8; 32])
}

pub fn certificate() -> Certificate {
    Certificate::new(SIGNER_ID.to_vec(), signing_key().verifying_key())
        .with_validity(AGGREGATION_TIME - 86_400, Some(LATER_TIME + 86_400))
}

fn aggregation_chain() -> AggregationChain {
    AggregationChain::new(
        AGGREGATION_TIME,
        HashAlgorithm::Sha256,
        h(b"This is my document"),
    )
    .with_link(ChainLink::left(h(b"mask")))
    .with_link(ChainLink::right(h(b"neighbour")).with_level_correction(1))
}

fn later_chain() -> CalendarChain {
    let root = aggregation_chain().root().unwrap();
    CalendarChain::new(LATER_TIME, AGGREGATION_TIME, HashAlgorithm::Sha256, root)
        .with_link(ChainLink::left(h(b"later-rounds")))
        .with_link(ChainLink::right(h(b"previous-rounds")))
}

fn later_publication() -> PublicationRecord {
    PublicationRecord::new(PublicationData::new(LATER_TIME, later_chain().root().unwrap()))
        .with_reference("Tessera Gazette")
}

pub fn signed() -> Fixture {
    let aggregation = aggregation_chain();
    let root = aggregation.root().unwrap();
    let calendar = CalendarChain::new(AGGREGATION_TIME, AGGREGATION_TIME, HashAlgorithm::Sha256, root)
        .with_link(ChainLink::right(h(b"previous-rounds")));
    let published = PublicationData::new(AGGREGATION_TIME, calendar.root().unwrap());
    let signature = signing_key().sign(&published.canonical_bytes());
    let auth = CalendarAuthRecord::new(published, SIGNER_ID.to_vec(), signature.to_bytes().to_vec());

    Fixture {
        document: h(b"This is my document"),
        signature: Signature::new(aggregation)
            .with_calendar_chain(calendar)
            .with_calendar_auth_record(auth),
        later_publication: later_publication(),
    }
}

/// Aggregation chain only
pub fn unanchored() -> Signature {
    Signature::new(aggregation_chain())
}

/// Already anchored to the later publication
pub fn extended() -> Signature {
    signed()
        .signature
        .extend(later_chain(), later_publication())
        .unwrap()
}

/// Knows the single round from `AGGREGATION_TIME` to `LATER_TIME`
pub struct FixtureExtender;

impl Extender for FixtureExtender {
    fn fetch_calendar_chain(&self, from: u64, to: u64) -> Result<CalendarChain, ExtenderError> {
        if from == AGGREGATION_TIME && to == LATER_TIME {
            Ok(later_chain())
        } else {
            Err(ExtenderError::rejected(404, format!("no calendar path {from}..{to}")))
        }
    }
}

pub struct FailingExtender(pub ExtenderError);

impl Extender for FailingExtender {
    fn fetch_calendar_chain(&self, _from: u64, _to: u64) -> Result<CalendarChain, ExtenderError> {
        Err(self.0.clone())
    }
}

#[derive(Default)]
pub struct FixtureCatalog(pub Vec<PublicationRecord>);

impl FixtureCatalog {
    pub fn with_later() -> Self {
        Self(vec![later_publication()])
    }
}

impl PublicationsCatalog for FixtureCatalog {
    fn lookup(&self, time: u64) -> Result<Option<PublicationRecord>, CatalogError> {
        Ok(self
            .0
            .iter()
            .filter(|record| record.publication_time() >= time)
            .min_by_key(|record| record.publication_time())
            .cloned())
    }
}

pub struct BrokenCatalog;

impl PublicationsCatalog for BrokenCatalog {
    fn lookup(&self, _time: u64) -> Result<Option<PublicationRecord>, CatalogError> {
        Err(CatalogError::Unavailable("publications file not loaded".into()))
    }
}

#[derive(Default)]
pub struct FixtureStore(pub Vec<Certificate>);

impl FixtureStore {
    pub fn trusted() -> Self {
        Self(vec![certificate()])
    }
}

impl CertificateStore for FixtureStore {
    fn find_certificate(&self, id: &[u8]) -> Result<Option<Certificate>, CatalogError> {
        Ok(self.0.iter().find(|cert| cert.id == id).cloned())
    }
}
