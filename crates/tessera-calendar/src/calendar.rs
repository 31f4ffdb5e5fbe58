//! In-memory calendar service
//!
//! One round per aggregation time. The calendar root at time `t` is the root
//! of the calendar tree over every round at or before `t`.

use crate::aggregator::Aggregator;
use crate::error::CalendarError;
use crate::tree::MerkleTree;
use ed25519_dalek::{Signer, SigningKey};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tessera_core::{
    CalendarAuthRecord, CalendarChain, DataHash, HashAlgorithm, PublicationData,
    PublicationRecord, Signature,
};
use tessera_policy::{
    CatalogError, Certificate, CertificateStore, Extender, ExtenderError, PublicationsCatalog,
};
use tracing::{debug, info};

#[derive(Debug, Default)]
struct CalendarState {
    rounds: BTreeMap<u64, DataHash>,
    publications: BTreeMap<u64, PublicationRecord>,
}

impl CalendarState {
    fn chain(
        &self,
        algorithm: HashAlgorithm,
        aggregation_time: u64,
        publication_time: u64,
    ) -> Result<CalendarChain, CalendarError> {
        if publication_time < aggregation_time {
            return Err(CalendarError::PublicationBeforeRound {
                aggregation_time,
                publication_time,
            });
        }
        let input = self
            .rounds
            .get(&aggregation_time)
            .cloned()
            .ok_or(CalendarError::UnknownRound(aggregation_time))?;

        let mut position = 0;
        let mut leaves = Vec::new();
        for (i, (time, root)) in self.rounds.range(..=publication_time).enumerate() {
            if *time == aggregation_time {
                position = i;
            }
            leaves.push(root.clone());
        }
        let tree = MerkleTree::calendar(algorithm, leaves)?;

        let mut chain = CalendarChain::new(publication_time, aggregation_time, algorithm, input);
        chain.links = tree.path(position).unwrap_or_default().to_vec();
        Ok(chain)
    }

    fn root_at(&self, algorithm: HashAlgorithm, time: u64) -> Result<DataHash, CalendarError> {
        let leaves: Vec<DataHash> = self.rounds.range(..=time).map(|(_, root)| root.clone()).collect();
        if leaves.is_empty() {
            return Err(CalendarError::NothingToPublish(time));
        }
        Ok(MerkleTree::calendar(algorithm, leaves)?.root().clone())
    }
}

/// Aggregates documents, keeps the calendar and signs its roots
pub struct Calendar {
    aggregator: Aggregator,
    signing_key: SigningKey,
    signer_id: Vec<u8>,
    state: RwLock<CalendarState>,
}

impl Calendar {
    pub fn new(algorithm: HashAlgorithm, signing_key: SigningKey, signer_id: impl Into<Vec<u8>>) -> Self {
        Self {
            aggregator: Aggregator::new(algorithm),
            signing_key,
            signer_id: signer_id.into(),
            state: RwLock::new(CalendarState::default()),
        }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.aggregator.algorithm()
    }

    pub fn signer_id(&self) -> &[u8] {
        &self.signer_id
    }

    /// Certificate for the calendar's signing key
    pub fn certificate(&self) -> Certificate {
        Certificate::new(self.signer_id.clone(), self.signing_key.verifying_key())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, CalendarState>, CalendarError> {
        self.state.read().map_err(|_| CalendarError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, CalendarState>, CalendarError> {
        self.state.write().map_err(|_| CalendarError::Poisoned)
    }

    pub fn sign(&self, time: u64, document: DataHash) -> Result<Signature, CalendarError> {
        self.sign_batch(time, &[document])?
            .pop()
            .ok_or(CalendarError::EmptyBatch)
    }

    /// Aggregate one round at `time`, which must be after every existing round
    /// and every publication
    pub fn sign_batch(&self, time: u64, documents: &[DataHash]) -> Result<Vec<Signature>, CalendarError> {
        let batch = self.aggregator.aggregate(time, documents)?;

        let mut state = self.write()?;
        if let Some((&latest, _)) = state.rounds.last_key_value() {
            if time <= latest {
                return Err(CalendarError::RoundOutOfOrder { time, latest });
            }
        }
        // a published root covers every round at or before its time
        if let Some((&published, _)) = state.publications.last_key_value() {
            if time <= published {
                return Err(CalendarError::RoundAlreadyPublished { time, published });
            }
        }
        state.rounds.insert(time, batch.root.clone());
        let calendar_chain = state.chain(self.algorithm(), time, time)?;
        drop(state);

        let published = PublicationData::new(time, calendar_chain.root()?);
        let auth_record = CalendarAuthRecord::new(
            published.clone(),
            self.signer_id.clone(),
            self.signing_key.sign(&published.canonical_bytes()).to_bytes().to_vec(),
        );
        info!(time, documents = documents.len(), root = %batch.root, "calendar round signed");

        Ok(batch
            .chains
            .into_iter()
            .map(|chain| {
                Signature::new(chain)
                    .with_calendar_chain(calendar_chain.clone())
                    .with_calendar_auth_record(auth_record.clone())
            })
            .collect())
    }

    /// Calendar chain from the round at `aggregation_time` to the root at `publication_time`
    pub fn calendar_chain(
        &self,
        aggregation_time: u64,
        publication_time: u64,
    ) -> Result<CalendarChain, CalendarError> {
        self.read()?
            .chain(self.algorithm(), aggregation_time, publication_time)
    }

    /// Publish the calendar root at `time`
    pub fn publish(&self, time: u64) -> Result<PublicationRecord, CalendarError> {
        let mut state = self.write()?;
        let root = state.root_at(self.algorithm(), time)?;
        let record = PublicationRecord::new(PublicationData::new(time, root))
            .with_reference(format!("tessera calendar publication {time}"));
        state.publications.insert(time, record.clone());
        info!(time, code = %record.publication_data.format(), "calendar root published");
        Ok(record)
    }

    pub fn publications(&self) -> Result<Vec<PublicationRecord>, CalendarError> {
        Ok(self.read()?.publications.values().cloned().collect())
    }

    pub fn latest_round(&self) -> Result<Option<u64>, CalendarError> {
        Ok(self.read()?.rounds.keys().next_back().copied())
    }
}

impl std::fmt::Debug for Calendar {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Calendar")
            .field("algorithm", &self.algorithm())
            .field("signer_id", &String::from_utf8_lossy(&self.signer_id))
            .finish_non_exhaustive()
    }
}

impl Extender for Calendar {
    fn fetch_calendar_chain(
        &self,
        aggregation_time: u64,
        publication_time: u64,
    ) -> Result<CalendarChain, ExtenderError> {
        debug!(aggregation_time, publication_time, "extension request");
        self.calendar_chain(aggregation_time, publication_time)
            .map_err(|e| match e {
                CalendarError::Poisoned => ExtenderError::Network(e.to_string()),
                other => ExtenderError::rejected(404, other.to_string()),
            })
    }
}

impl PublicationsCatalog for Calendar {
    fn lookup(&self, time: u64) -> Result<Option<PublicationRecord>, CatalogError> {
        let state = self
            .read()
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;
        Ok(state.publications.range(time..).next().map(|(_, r)| r.clone()))
    }
}

impl CertificateStore for Calendar {
    fn find_certificate(&self, id: &[u8]) -> Result<Option<Certificate>, CatalogError> {
        Ok((id == self.signer_id.as_slice()).then(|| self.certificate()))
    }
}
