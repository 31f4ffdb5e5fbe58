//! Batch aggregation
//!
//! Every document hash is first combined with a per-position mask so that
//! siblings in the tree reveal nothing about neighbouring documents.

use crate::error::CalendarError;
use crate::tree::MerkleTree;
use tessera_core::chain::hash_step;
use tessera_core::{AggregationChain, ChainLink, DataHash, HashAlgorithm, LinkDirection};

/// Level of a masked leaf
const LEAF_LEVEL: u8 = 1;

/// One aggregation round
#[derive(Debug, Clone)]
pub struct AggregatedBatch {
    pub aggregation_time: u64,
    pub root: DataHash,
    /// One chain per input, in input order
    pub chains: Vec<AggregationChain>,
}

#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    algorithm: HashAlgorithm,
}

impl Aggregator {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    fn mask(&self, aggregation_time: u64, index: usize) -> DataHash {
        let mut seed = b"tessera-mask".to_vec();
        seed.extend_from_slice(&aggregation_time.to_be_bytes());
        seed.extend_from_slice(&(index as u64).to_be_bytes());
        self.algorithm.digest(&seed)
    }

    pub fn aggregate(
        &self,
        aggregation_time: u64,
        documents: &[DataHash],
    ) -> Result<AggregatedBatch, CalendarError> {
        if documents.is_empty() {
            return Err(CalendarError::EmptyBatch);
        }
        let masks: Vec<DataHash> = (0..documents.len())
            .map(|i| self.mask(aggregation_time, i))
            .collect();
        let leaves = documents
            .iter()
            .zip(&masks)
            .map(|(doc, mask)| {
                let leaf = hash_step(self.algorithm, LinkDirection::Left, doc, mask, LEAF_LEVEL);
                (leaf, LEAF_LEVEL)
            })
            .collect();
        let tree = MerkleTree::aggregation(self.algorithm, leaves)?;

        let chains = documents
            .iter()
            .zip(masks)
            .enumerate()
            .map(|(i, (doc, mask))| {
                let mut chain = AggregationChain::new(aggregation_time, self.algorithm, doc.clone())
                    .with_link(ChainLink::left(mask));
                chain
                    .links
                    .extend_from_slice(tree.path(i).unwrap_or_default());
                chain
            })
            .collect();

        Ok(AggregatedBatch {
            aggregation_time,
            root: tree.root().clone(),
            chains,
        })
    }
}
