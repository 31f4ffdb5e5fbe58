//! Hash chains: aggregation chains and calendar chains
//!
//! Both chains fold a sequence of links over an input hash. Each step hashes
//! `left.imprint || right.imprint || level` with the chain's algorithm.
//! Aggregation steps carry the running tree level; calendar steps always use
//! [`CALENDAR_LEVEL`].

use crate::error::{Result, TesseraError};
use crate::hash::{DataHash, HashAlgorithm};
use crate::hasher::DataHasher;
use serde::{Deserialize, Serialize};

/// Level byte used by every calendar chain step
pub const CALENDAR_LEVEL: u8 = 0xFF;

/// Which operand the running value is in a chain step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkDirection {
    /// Running value is the left operand, sibling on the right
    Left,
    /// Running value is the right operand, sibling on the left
    Right,
}

/// One step of a hash chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainLink {
    pub direction: LinkDirection,
    pub sibling: DataHash,
    /// Tree levels skipped below this step (aggregation chains only)
    #[serde(default)]
    pub level_correction: u8,
}

impl ChainLink {
    pub fn left(sibling: DataHash) -> Self {
        Self {
            direction: LinkDirection::Left,
            sibling,
            level_correction: 0,
        }
    }

    pub fn right(sibling: DataHash) -> Self {
        Self {
            direction: LinkDirection::Right,
            sibling,
            level_correction: 0,
        }
    }

    pub fn with_level_correction(mut self, correction: u8) -> Self {
        self.level_correction = correction;
        self
    }
}

/// Hash a single chain step
pub fn hash_step(
    algorithm: HashAlgorithm,
    direction: LinkDirection,
    current: &DataHash,
    sibling: &DataHash,
    level: u8,
) -> DataHash {
    let (left, right) = match direction {
        LinkDirection::Left => (current, sibling),
        LinkDirection::Right => (sibling, current),
    };
    let mut data = left.imprint();
    data.extend_from_slice(&right.imprint());
    data.push(level);
    DataHasher::digest(algorithm, &data)
}

/// Path from a document's input hash to the aggregation root of its batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationChain {
    /// Seconds since the Unix epoch
    pub aggregation_time: u64,
    pub algorithm: HashAlgorithm,
    pub input_hash: DataHash,
    pub links: Vec<ChainLink>,
}

impl AggregationChain {
    pub fn new(aggregation_time: u64, algorithm: HashAlgorithm, input_hash: DataHash) -> Self {
        Self {
            aggregation_time,
            algorithm,
            input_hash,
            links: Vec::new(),
        }
    }

    pub fn with_link(mut self, link: ChainLink) -> Self {
        self.links.push(link);
        self
    }

    /// Recompute the aggregation root.
    ///
    /// The level starts at zero and grows by `level_correction + 1` per link;
    /// it must stay below [`CALENDAR_LEVEL`].
    pub fn root(&self) -> Result<DataHash> {
        let mut level: u8 = 0;
        let mut current = self.input_hash.clone();
        for (i, link) in self.links.iter().enumerate() {
            level = level
                .checked_add(link.level_correction)
                .and_then(|l| l.checked_add(1))
                .filter(|l| *l < CALENDAR_LEVEL)
                .ok_or_else(|| {
                    TesseraError::chain(format!("aggregation level overflow at link {i}"))
                })?;
            current = hash_step(self.algorithm, link.direction, &current, &link.sibling, level);
        }
        Ok(current)
    }
}

/// Path from an aggregation root to the calendar root at `publication_time`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarChain {
    pub publication_time: u64,
    pub aggregation_time: u64,
    pub algorithm: HashAlgorithm,
    pub input_hash: DataHash,
    pub links: Vec<ChainLink>,
}

impl CalendarChain {
    pub fn new(
        publication_time: u64,
        aggregation_time: u64,
        algorithm: HashAlgorithm,
        input_hash: DataHash,
    ) -> Self {
        Self {
            publication_time,
            aggregation_time,
            algorithm,
            input_hash,
            links: Vec::new(),
        }
    }

    pub fn with_link(mut self, link: ChainLink) -> Self {
        self.links.push(link);
        self
    }

    /// Recompute the calendar root
    pub fn root(&self) -> Result<DataHash> {
        if self.publication_time < self.aggregation_time {
            return Err(TesseraError::chain(format!(
                "calendar chain publication time {} precedes aggregation time {}",
                self.publication_time, self.aggregation_time
            )));
        }
        let mut current = self.input_hash.clone();
        for (i, link) in self.links.iter().enumerate() {
            if link.level_correction != 0 {
                return Err(TesseraError::chain(format!(
                    "calendar link {i} carries a level correction"
                )));
            }
            current = hash_step(
                self.algorithm,
                link.direction,
                &current,
                &link.sibling,
                CALENDAR_LEVEL,
            );
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(tag: &[u8]) -> DataHash {
        HashAlgorithm::Sha256.digest(tag)
    }

    #[test]
    fn test_single_step_matches_manual_hash() {
        let input = leaf(b"doc");
        let sibling = leaf(b"mask");
        let chain = AggregationChain::new(10, HashAlgorithm::Sha256, input.clone())
            .with_link(ChainLink::left(sibling.clone()));

        let mut data = input.imprint();
        data.extend_from_slice(&sibling.imprint());
        data.push(1);
        assert_eq!(chain.root().unwrap(), HashAlgorithm::Sha256.digest(&data));
    }

    #[test]
    fn test_direction_matters() {
        let input = leaf(b"doc");
        let sibling = leaf(b"other");
        let left = AggregationChain::new(1, HashAlgorithm::Sha256, input.clone())
            .with_link(ChainLink::left(sibling.clone()));
        let right = AggregationChain::new(1, HashAlgorithm::Sha256, input)
            .with_link(ChainLink::right(sibling));
        assert_ne!(left.root().unwrap(), right.root().unwrap());
    }

    #[test]
    fn test_level_correction_changes_root() {
        let input = leaf(b"doc");
        let plain = AggregationChain::new(1, HashAlgorithm::Sha256, input.clone())
            .with_link(ChainLink::left(leaf(b"a")));
        let corrected = AggregationChain::new(1, HashAlgorithm::Sha256, input)
            .with_link(ChainLink::left(leaf(b"a")).with_level_correction(2));
        assert_ne!(plain.root().unwrap(), corrected.root().unwrap());
    }

    #[test]
    fn test_level_overflow() {
        let chain = AggregationChain::new(1, HashAlgorithm::Sha256, leaf(b"doc"))
            .with_link(ChainLink::left(leaf(b"a")).with_level_correction(200))
            .with_link(ChainLink::left(leaf(b"b")).with_level_correction(60));
        let err = chain.root().unwrap_err();
        assert!(matches!(err, TesseraError::ChainInconsistent(_)));
    }

    #[test]
    fn test_empty_chain_root_is_input() {
        let input = leaf(b"only");
        let chain = AggregationChain::new(1, HashAlgorithm::Sha256, input.clone());
        assert_eq!(chain.root().unwrap(), input);
    }

    #[test]
    fn test_calendar_chain_rules() {
        let input = leaf(b"root");
        let chain = CalendarChain::new(20, 10, HashAlgorithm::Sha256, input.clone())
            .with_link(ChainLink::right(leaf(b"older")));
        let expected = hash_step(
            HashAlgorithm::Sha256,
            LinkDirection::Right,
            &input,
            &leaf(b"older"),
            CALENDAR_LEVEL,
        );
        assert_eq!(chain.root().unwrap(), expected);

        let backwards = CalendarChain::new(5, 10, HashAlgorithm::Sha256, input.clone());
        assert!(backwards.root().is_err());

        let corrected = CalendarChain::new(20, 10, HashAlgorithm::Sha256, input)
            .with_link(ChainLink::left(leaf(b"x")).with_level_correction(1));
        assert!(corrected.root().is_err());
    }
}
