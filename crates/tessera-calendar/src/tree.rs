//! Merkle tree construction with per-leaf hash chains
//!
//! Nodes are paired left to right; an unpaired node moves up unchanged.
//! Aggregation trees track node levels and emit level corrections, calendar
//! trees hash every step at [`CALENDAR_LEVEL`].

use crate::error::CalendarError;
use tessera_core::chain::hash_step;
use tessera_core::{ChainLink, DataHash, HashAlgorithm, LinkDirection, CALENDAR_LEVEL};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Aggregation,
    Calendar,
}

struct Node {
    hash: DataHash,
    level: u8,
    leaves: Vec<usize>,
}

/// Root plus the chain from every leaf to it
#[derive(Debug, Clone)]
pub struct MerkleTree {
    root: DataHash,
    level: u8,
    paths: Vec<Vec<ChainLink>>,
}

impl MerkleTree {
    /// Aggregation tree over `(hash, level)` leaves
    pub fn aggregation(
        algorithm: HashAlgorithm,
        leaves: Vec<(DataHash, u8)>,
    ) -> Result<Self, CalendarError> {
        Self::build(algorithm, leaves, Mode::Aggregation)
    }

    /// Calendar tree over round roots in time order
    pub fn calendar(algorithm: HashAlgorithm, leaves: Vec<DataHash>) -> Result<Self, CalendarError> {
        let leaves = leaves.into_iter().map(|hash| (hash, 0)).collect();
        Self::build(algorithm, leaves, Mode::Calendar)
    }

    fn build(
        algorithm: HashAlgorithm,
        leaves: Vec<(DataHash, u8)>,
        mode: Mode,
    ) -> Result<Self, CalendarError> {
        if leaves.is_empty() {
            return Err(CalendarError::EmptyBatch);
        }
        let mut paths = vec![Vec::new(); leaves.len()];
        let mut nodes: Vec<Node> = leaves
            .into_iter()
            .enumerate()
            .map(|(i, (hash, level))| Node {
                hash,
                level,
                leaves: vec![i],
            })
            .collect();

        while nodes.len() > 1 {
            let mut next = Vec::with_capacity(nodes.len().div_ceil(2));
            let mut iter = nodes.into_iter();
            while let Some(left) = iter.next() {
                let Some(right) = iter.next() else {
                    next.push(left);
                    break;
                };
                next.push(join(algorithm, mode, left, right, &mut paths)?);
            }
            nodes = next;
        }

        let Some(top) = nodes.pop() else {
            return Err(CalendarError::EmptyBatch);
        };
        Ok(Self {
            root: top.hash,
            level: top.level,
            paths,
        })
    }

    pub fn root(&self) -> &DataHash {
        &self.root
    }

    /// Level of the root node (aggregation trees)
    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn path(&self, leaf: usize) -> Option<&[ChainLink]> {
        self.paths.get(leaf).map(Vec::as_slice)
    }
}

fn join(
    algorithm: HashAlgorithm,
    mode: Mode,
    left: Node,
    right: Node,
    paths: &mut [Vec<ChainLink>],
) -> Result<Node, CalendarError> {
    let (level, step_level) = match mode {
        Mode::Calendar => (0, CALENDAR_LEVEL),
        Mode::Aggregation => {
            let level = left
                .level
                .max(right.level)
                .checked_add(1)
                .filter(|l| *l < CALENDAR_LEVEL)
                .ok_or(CalendarError::TreeTooDeep)?;
            (level, level)
        }
    };
    let correction = |child: u8| match mode {
        Mode::Calendar => 0,
        Mode::Aggregation => level - child - 1,
    };

    let hash = hash_step(algorithm, LinkDirection::Left, &left.hash, &right.hash, step_level);
    for &i in &left.leaves {
        paths[i].push(ChainLink::left(right.hash.clone()).with_level_correction(correction(left.level)));
    }
    for &i in &right.leaves {
        paths[i].push(ChainLink::right(left.hash.clone()).with_level_correction(correction(right.level)));
    }

    let mut leaves = left.leaves;
    leaves.extend(right.leaves);
    Ok(Node { hash, level, leaves })
}
